// Dweve CSV Stream - Streaming CSV Reader
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for the streaming CSV reader.
//!
//! All syntax errors carry a position: `line` is 1-based and counts every
//! physical line observed so far (including line separators inside quoted
//! cells), `character` is the 1-based byte offset within the current line.
//!
//! # Error Handling Examples
//!
//! ```rust
//! use csv_stream::{CsvError, CsvParser};
//! use std::io::Cursor;
//!
//! let mut parser = CsvParser::new(Cursor::new("1,\"2")).unwrap();
//! let err = loop {
//!     match parser.next_token() {
//!         Ok(Some(_)) => continue,
//!         Ok(None) => panic!("expected a syntax error"),
//!         Err(e) => break e,
//!     }
//! };
//!
//! assert!(matches!(err, CsvError::UnterminatedQuote { .. }));
//! assert_eq!(err.line(), Some(1));
//! assert_eq!(err.character(), Some(5));
//! ```

use thiserror::Error;

/// Errors produced while configuring or running the CSV reader.
///
/// Parse errors are terminal: once one has been returned, the parser emits no
/// further cells and its adapters permanently report end of stream.
#[derive(Error, Debug)]
pub enum CsvError {
    /// IO error from the underlying byte source.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid reader configuration, rejected before any byte is consumed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The stream ended inside a quoted cell.
    #[error("unterminated quoted cell (line {line}, character {character})")]
    UnterminatedQuote { line: u64, character: u64 },

    /// A closing quote was followed by a byte that begins neither a column
    /// separator nor a line separator.
    #[error("unexpected character {found} after closing quote (line {line}, character {character}){hint}")]
    UnexpectedAfterQuote {
        line: u64,
        character: u64,
        /// Rendering of the offending byte.
        found: String,
        /// Extra guidance, currently only for stray carriage returns.
        hint: String,
    },

    /// A quote sequence appeared in the middle of an unquoted cell.
    #[error("unexpected quote inside an unquoted cell (line {line}, character {character})")]
    UnexpectedQuoteInUnquoted { line: u64, character: u64 },

    /// The parser reached a state its rules do not cover. Always a defect.
    #[error("unexpected parser state (line {line}, character {character}); this is a bug in csv-stream")]
    Unexpected { line: u64, character: u64 },
}

impl CsvError {
    /// Create a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an after-quote error for the given offending byte.
    ///
    /// A `0x0D` byte renders as `"\r"` and carries a hint that the input
    /// probably uses `"\r\n"` line endings.
    pub(crate) fn unexpected_after_quote(line: u64, character: u64, byte: u8) -> Self {
        let (found, hint) = match byte {
            0x0D => (
                "\"\\r\"".to_string(),
                "; if the input uses \"\\r\\n\" line endings, set line_separator to \"\\r\\n\"".to_string(),
            ),
            b if b.is_ascii_graphic() || b == b' ' => {
                (format!("\"{}\"", b as char), String::new())
            }
            b => (format!("0x{b:02X}"), String::new()),
        };
        Self::UnexpectedAfterQuote {
            line,
            character,
            found,
            hint,
        }
    }

    /// Get the 1-based line number, if this error carries a position.
    #[inline]
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::UnterminatedQuote { line, .. }
            | Self::UnexpectedAfterQuote { line, .. }
            | Self::UnexpectedQuoteInUnquoted { line, .. }
            | Self::Unexpected { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Get the 1-based byte offset within the line, if available.
    #[inline]
    pub fn character(&self) -> Option<u64> {
        match self {
            Self::UnterminatedQuote { character, .. }
            | Self::UnexpectedAfterQuote { character, .. }
            | Self::UnexpectedQuoteInUnquoted { character, .. }
            | Self::Unexpected { character, .. } => Some(*character),
            _ => None,
        }
    }
}

/// Result type for reader operations.
pub type CsvResult<T> = Result<T, CsvError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    // ==================== Display tests ====================

    #[test]
    fn test_io_display() {
        let err = CsvError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let display = format!("{}", err);
        assert!(display.contains("IO error"));
        assert!(display.contains("gone"));
    }

    #[test]
    fn test_config_display() {
        let err = CsvError::config("quote must not be empty");
        assert_eq!(
            format!("{}", err),
            "invalid configuration: quote must not be empty"
        );
    }

    #[test]
    fn test_unterminated_quote_display() {
        let err = CsvError::UnterminatedQuote {
            line: 1,
            character: 5,
        };
        assert_eq!(
            format!("{}", err),
            "unterminated quoted cell (line 1, character 5)"
        );
    }

    #[test]
    fn test_unexpected_after_quote_display() {
        let err = CsvError::unexpected_after_quote(1, 6, b'3');
        let display = format!("{}", err);
        assert!(display.contains("\"3\""));
        assert!(display.contains("(line 1, character 6)"));
        assert!(!display.contains("line_separator"));
    }

    #[test]
    fn test_unexpected_after_quote_carriage_return_hint() {
        let err = CsvError::unexpected_after_quote(3, 8, 0x0D);
        let display = format!("{}", err);
        assert!(display.contains("\"\\r\""));
        assert!(display.contains("set line_separator to \"\\r\\n\""));
    }

    #[test]
    fn test_unexpected_after_quote_unprintable() {
        let err = CsvError::unexpected_after_quote(1, 2, 0x07);
        assert!(format!("{}", err).contains("0x07"));
    }

    #[test]
    fn test_unexpected_quote_in_unquoted_display() {
        let err = CsvError::UnexpectedQuoteInUnquoted {
            line: 1,
            character: 5,
        };
        assert_eq!(
            format!("{}", err),
            "unexpected quote inside an unquoted cell (line 1, character 5)"
        );
    }

    #[test]
    fn test_unexpected_display() {
        let err = CsvError::Unexpected {
            line: 2,
            character: 9,
        };
        let display = format!("{}", err);
        assert!(display.contains("bug"));
        assert!(display.contains("(line 2, character 9)"));
    }

    // ==================== Accessor tests ====================

    #[test]
    fn test_position_accessors() {
        let err = CsvError::UnterminatedQuote {
            line: 7,
            character: 42,
        };
        assert_eq!(err.line(), Some(7));
        assert_eq!(err.character(), Some(42));
    }

    #[test]
    fn test_position_accessors_none_for_io() {
        let err = CsvError::Io(io::Error::other("boom"));
        assert_eq!(err.line(), None);
        assert_eq!(err.character(), None);
    }

    #[test]
    fn test_position_accessors_none_for_config() {
        let err = CsvError::config("bad");
        assert_eq!(err.line(), None);
        assert_eq!(err.character(), None);
    }

    // ==================== Conversion tests ====================

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: CsvError = io_err.into();
        assert!(matches!(err, CsvError::Io(_)));
    }
}
