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

//! Reader configuration.
//!
//! All knobs live on [`ReadOptions`], a plain struct with public fields and
//! sensible defaults. Delimiters are arbitrary non-empty byte sequences; a
//! configuration where one delimiter is a strict prefix of another is
//! ambiguous and rejected when the reader is constructed.
//!
//! # Examples
//!
//! ## Defaults
//!
//! ```rust
//! use csv_stream::ReadOptions;
//!
//! let options = ReadOptions::default();
//! assert_eq!(options.column_separator, b",");
//! assert_eq!(options.line_separator, b"\n");
//! assert_eq!(options.quote, b"\"");
//! assert_eq!(options.from_line, 0);
//! assert_eq!(options.to_line, None);
//! ```
//!
//! ## Tab-separated input with CRLF line endings
//!
//! ```rust
//! use csv_stream::ReadOptions;
//!
//! let options = ReadOptions {
//!     column_separator: b"\t".to_vec(),
//!     line_separator: b"\r\n".to_vec(),
//!     quote: b"$".to_vec(),
//!     ..Default::default()
//! };
//! ```

use crate::error::{CsvError, CsvResult};

/// Character encoding applied to completed cell bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8 with U+FFFD replacement for invalid sequences.
    #[default]
    Utf8,
    /// ISO-8859-1: each byte maps to the code point of the same value.
    Latin1,
}

impl Encoding {
    /// Decode one cell's bytes to text. Total: never fails.
    pub(crate) fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

/// Configuration for a CSV reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Byte sequence separating cells within a row. Default: `,`.
    pub column_separator: Vec<u8>,
    /// Byte sequence separating rows. Default: `\n`.
    pub line_separator: Vec<u8>,
    /// Byte sequence opening and closing quoted cells. Doubled inside a
    /// quoted cell, it stands for one literal occurrence. Default: `"`.
    pub quote: Vec<u8>,
    /// Encoding used to decode completed cell bytes. Default: UTF-8.
    pub encoding: Encoding,
    /// First physical line to emit, 0-based inclusive. Default: 0.
    pub from_line: usize,
    /// First physical line NOT to emit, 0-based exclusive. Default: `None`
    /// (read to the end of the stream).
    pub to_line: Option<usize>,
    /// Chunk size requested from the byte source. Default: 1024.
    pub chunk_size: usize,
    /// Minimum growth increment of the column buffer. Default: 1024.
    pub column_buffer_min_step_size: usize,
    /// Consumed-prefix length at which the input buffer is compacted.
    /// Default: 1024.
    pub input_buffer_index_limit: usize,
    /// Free tail kept available in the column buffer before appending.
    /// Default: 64.
    pub column_buffer_reserve: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            column_separator: b",".to_vec(),
            line_separator: b"\n".to_vec(),
            quote: b"\"".to_vec(),
            encoding: Encoding::Utf8,
            from_line: 0,
            to_line: None,
            chunk_size: 1024,
            column_buffer_min_step_size: 1024,
            input_buffer_index_limit: 1024,
            column_buffer_reserve: 64,
        }
    }
}

impl ReadOptions {
    /// Validate the options and derive the delimiter set the parser core
    /// works with.
    pub(crate) fn delimiters(&self) -> CsvResult<Delimiters> {
        Delimiters::from_options(self)
    }
}

/// Validated delimiter set plus derived constants.
#[derive(Debug, Clone)]
pub(crate) struct Delimiters {
    pub(crate) column: Vec<u8>,
    pub(crate) line: Vec<u8>,
    pub(crate) quote: Vec<u8>,
    pub(crate) double_quote: Vec<u8>,
    /// Look-ahead required to decide whether the current position begins any
    /// delimiter: the longest of the three patterns and the doubled quote.
    pub(crate) min_reserve: usize,
}

impl Delimiters {
    fn from_options(options: &ReadOptions) -> CsvResult<Self> {
        for (name, value) in [
            ("column_separator", &options.column_separator),
            ("line_separator", &options.line_separator),
            ("quote", &options.quote),
        ] {
            if value.is_empty() {
                return Err(CsvError::config(format!("{name} must not be empty")));
            }
        }
        for (size, name) in [
            (options.chunk_size, "chunk_size"),
            (options.column_buffer_min_step_size, "column_buffer_min_step_size"),
            (options.input_buffer_index_limit, "input_buffer_index_limit"),
            (options.column_buffer_reserve, "column_buffer_reserve"),
        ] {
            if size == 0 {
                return Err(CsvError::config(format!("{name} must be at least 1")));
            }
        }

        // Prefix-sharing delimiters make boundary recognition ambiguous;
        // covers separators beginning with the quote as well.
        let named = [
            ("column_separator", &options.column_separator),
            ("line_separator", &options.line_separator),
            ("quote", &options.quote),
        ];
        for (i, (a_name, a)) in named.iter().enumerate() {
            for (b_name, b) in named.iter().skip(i + 1) {
                if a == b {
                    return Err(CsvError::config(format!(
                        "{a_name} and {b_name} must differ"
                    )));
                }
                if b.starts_with(a.as_slice()) || a.starts_with(b.as_slice()) {
                    return Err(CsvError::config(format!(
                        "{a_name} and {b_name} must not share a prefix"
                    )));
                }
            }
        }

        let mut double_quote = Vec::with_capacity(options.quote.len() * 2);
        double_quote.extend_from_slice(&options.quote);
        double_quote.extend_from_slice(&options.quote);

        let min_reserve = options
            .column_separator
            .len()
            .max(options.line_separator.len())
            .max(double_quote.len())
            .max(1);

        Ok(Self {
            column: options.column_separator.clone(),
            line: options.line_separator.clone(),
            quote: options.quote.clone(),
            double_quote,
            min_reserve,
        })
    }
}
