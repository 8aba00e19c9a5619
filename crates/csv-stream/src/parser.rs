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

//! Synchronous CSV reader.
//!
//! [`CsvParser`] pulls tokens from any [`std::io::Read`] source; [`Rows`] and
//! [`Records`] shape the token stream into rows and header-keyed records.
//! For non-blocking IO see the async mirror in
//! [`AsyncCsvParser`](crate::AsyncCsvParser).
//!
//! # Basic Usage
//!
//! ```rust
//! use csv_stream::Rows;
//! use std::io::Cursor;
//!
//! let mut rows = Rows::new(Cursor::new("a,b\n1,2")).unwrap();
//! assert_eq!(
//!     rows.next_row().unwrap(),
//!     Some(vec!["a".to_string(), "b".to_string()])
//! );
//! assert_eq!(
//!     rows.next_row().unwrap(),
//!     Some(vec!["1".to_string(), "2".to_string()])
//! );
//! assert_eq!(rows.next_row().unwrap(), None);
//! ```

use std::collections::BTreeMap;
use std::io::Read;

use crate::core::{CsvCore, Step};
use crate::error::CsvResult;
use crate::options::ReadOptions;
use crate::reader::ChunkReader;
use crate::token::{ReadStats, Token};

/// Flow control returned by [`CsvHandler`] callbacks.
///
/// Returning [`Pace::Pause`] makes the driving `read` call return after the
/// current emission; parsing resumes with the next `read` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// Keep parsing.
    Continue,
    /// Return control to the caller after this emission.
    Pause,
}

/// Callback surface for push-style consumption.
///
/// An alternative to the pull iterators for integrations that want to be
/// driven: [`CsvParser::read`] and
/// [`AsyncCsvParser::read`](crate::AsyncCsvParser::read) route every emission
/// through these hooks.
pub trait CsvHandler {
    /// A cell completed.
    fn on_cell(&mut self, cell: String) -> Pace;

    /// A row completed.
    fn on_row_end(&mut self) -> Pace {
        Pace::Continue
    }

    /// The stream completed. Called at most once.
    fn on_end(&mut self) {}

    /// A terminal error occurred. The error is also returned from `read`.
    fn on_error(&mut self, _error: &crate::CsvError) {}
}

/// Synchronous streaming CSV parser: the token-level surface.
///
/// Yields [`Token::Cell`] and [`Token::NewLine`] in input order; end of input
/// is an ordinary end of iteration. Single-use: after the end or an error it
/// permanently reports done.
///
/// # Examples
///
/// ```rust
/// use csv_stream::{CsvParser, Token};
/// use std::io::Cursor;
///
/// let parser = CsvParser::new(Cursor::new("a,b\n1,2")).unwrap();
/// let tokens: Vec<Token> = parser.collect::<Result<_, _>>().unwrap();
///
/// assert_eq!(
///     tokens,
///     vec![
///         Token::Cell("a".to_string()),
///         Token::Cell("b".to_string()),
///         Token::NewLine,
///         Token::Cell("1".to_string()),
///         Token::Cell("2".to_string()),
///         Token::NewLine,
///     ]
/// );
/// ```
pub struct CsvParser<R: Read> {
    source: ChunkReader<R>,
    core: CsvCore,
    done: bool,
}

impl<R: Read> CsvParser<R> {
    /// Create a parser with default options.
    pub fn new(reader: R) -> CsvResult<Self> {
        Self::with_options(reader, ReadOptions::default())
    }

    /// Create a parser with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`CsvError::Config`](crate::CsvError::Config) for an invalid
    /// delimiter set or zero-sized buffer knobs.
    pub fn with_options(reader: R, options: ReadOptions) -> CsvResult<Self> {
        let core = CsvCore::new(&options)?;
        Ok(Self {
            source: ChunkReader::new(reader, options.chunk_size),
            core,
            done: false,
        })
    }

    /// Pull the next token. `Ok(None)` means the stream is done.
    pub fn next_token(&mut self) -> CsvResult<Option<Token>> {
        if self.done {
            return Ok(None);
        }
        loop {
            match self.core.step() {
                Ok(Step::NeedInput) => match self.source.next_chunk() {
                    Ok(Some(chunk)) => self.core.push_chunk(chunk),
                    Ok(None) => self.core.finish(),
                    Err(e) => {
                        self.done = true;
                        return Err(e.into());
                    }
                },
                Ok(Step::Cell(cell)) => return Ok(Some(Token::Cell(cell))),
                Ok(Step::NewLine) => return Ok(Some(Token::NewLine)),
                Ok(Step::End) => {
                    self.done = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            }
        }
    }

    /// Drive the parser through a [`CsvHandler`].
    ///
    /// Runs until the handler pauses (`Ok(false)`), the stream ends
    /// (`Ok(true)`), or an error occurs. A paused parse resumes by calling
    /// `read` again.
    pub fn read<H: CsvHandler>(&mut self, handler: &mut H) -> CsvResult<bool> {
        if self.done {
            return Ok(true);
        }
        loop {
            match self.next_token() {
                Ok(Some(Token::Cell(cell))) => {
                    if handler.on_cell(cell) == Pace::Pause {
                        return Ok(false);
                    }
                }
                Ok(Some(Token::NewLine)) => {
                    if handler.on_row_end() == Pace::Pause {
                        return Ok(false);
                    }
                }
                Ok(None) => {
                    handler.on_end();
                    return Ok(true);
                }
                Err(e) => {
                    handler.on_error(&e);
                    return Err(e);
                }
            }
        }
    }

    /// Work counters for this parser.
    pub fn stats(&self) -> ReadStats {
        self.core.stats()
    }

    /// Convert into a row-level reader.
    pub fn rows(self) -> Rows<R> {
        Rows {
            parser: self,
            done: false,
        }
    }

    /// Convert into a header-keyed record reader.
    pub fn records(self) -> Records<R> {
        Records {
            rows: self.rows(),
            header: None,
        }
    }
}

impl<R: Read> Iterator for CsvParser<R> {
    type Item = CsvResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// Synchronous row reader: each item is one row of decoded cells.
pub struct Rows<R: Read> {
    parser: CsvParser<R>,
    done: bool,
}

impl<R: Read> Rows<R> {
    /// Create a row reader with default options.
    pub fn new(reader: R) -> CsvResult<Self> {
        Ok(CsvParser::new(reader)?.rows())
    }

    /// Create a row reader with the given options.
    pub fn with_options(reader: R, options: ReadOptions) -> CsvResult<Self> {
        Ok(CsvParser::with_options(reader, options)?.rows())
    }

    /// Pull the next row. `Ok(None)` means the stream is done.
    pub fn next_row(&mut self) -> CsvResult<Option<Vec<String>>> {
        if self.done {
            return Ok(None);
        }
        let mut row = Vec::new();
        loop {
            match self.parser.next_token() {
                Ok(Some(Token::Cell(cell))) => row.push(cell),
                Ok(Some(Token::NewLine)) => return Ok(Some(row)),
                Ok(None) => {
                    self.done = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            }
        }
    }

    /// Work counters for the underlying parser.
    pub fn stats(&self) -> ReadStats {
        self.parser.stats()
    }
}

impl<R: Read> Iterator for Rows<R> {
    type Item = CsvResult<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Synchronous record reader: the first row names the columns, every later
/// row is paired with those names positionally.
pub struct Records<R: Read> {
    rows: Rows<R>,
    header: Option<Vec<String>>,
}

impl<R: Read> Records<R> {
    /// Create a record reader with default options.
    pub fn new(reader: R) -> CsvResult<Self> {
        Ok(CsvParser::new(reader)?.records())
    }

    /// Create a record reader with the given options.
    pub fn with_options(reader: R, options: ReadOptions) -> CsvResult<Self> {
        Ok(CsvParser::with_options(reader, options)?.records())
    }

    /// Pull the next record. `Ok(None)` means the stream is done.
    pub fn next_record(&mut self) -> CsvResult<Option<BTreeMap<String, String>>> {
        if self.header.is_none() {
            match self.rows.next_row()? {
                Some(header) => self.header = Some(header),
                None => return Ok(None),
            }
        }
        match self.rows.next_row()? {
            Some(row) => {
                let header = self.header.as_deref().unwrap_or_default();
                let record = header
                    .iter()
                    .cloned()
                    .zip(row)
                    .collect::<BTreeMap<_, _>>();
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

impl<R: Read> Iterator for Records<R> {
    type Item = CsvResult<BTreeMap<String, String>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
