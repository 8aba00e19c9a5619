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

//! Asynchronous CSV reader and its view adapters.
//!
//! This module mirrors the synchronous surface in
//! [`parser`](crate::CsvParser) over tokio's async IO and adds the two view
//! shapes that only make sense on the primary surface: lazy per-row cell
//! iteration and header-keyed records. All four adapters pull from the same
//! core one emission at a time, so none of them buffers more than a single
//! token ahead of the consumer.
//!
//! # Choosing an adapter
//!
//! - [`AsyncCsvParser`] — cells and row boundaries as [`Token`]s
//! - [`AsyncRows`] — one `Vec<String>` per row
//! - [`AsyncCellRows`] — one lazy cell iterator per row
//! - [`AsyncRecords`] — one header-keyed map per row
//!
//! # Examples
//!
//! ## Row streaming
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use csv_stream::AsyncRows;
//! use tokio::fs::File;
//!
//! let file = File::open("data.csv").await?;
//! let mut rows = AsyncRows::new(file)?;
//!
//! while let Some(row) = rows.next_row().await? {
//!     println!("{} cells", row.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Records
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use csv_stream::AsyncRecords;
//! use tokio::fs::File;
//!
//! let file = File::open("people.csv").await?;
//! let mut records = AsyncRecords::new(file)?;
//!
//! while let Some(record) = records.next_record().await? {
//!     if let Some(name) = record.get("name") {
//!         println!("{name}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use tokio::io::AsyncRead;

use crate::async_reader::AsyncChunkReader;
use crate::core::{CsvCore, Step};
use crate::error::CsvResult;
use crate::options::ReadOptions;
use crate::parser::{CsvHandler, Pace};
use crate::token::{ReadStats, Token};

/// Asynchronous streaming CSV parser: the token-level surface.
///
/// The async twin of [`CsvParser`](crate::CsvParser). Awaits only when
/// pulling a chunk from the byte source; everything else is synchronous work
/// over owned buffers. Single-use: after the end or an error it permanently
/// reports done.
pub struct AsyncCsvParser<R: AsyncRead + Unpin> {
    source: AsyncChunkReader<R>,
    core: CsvCore,
    done: bool,
}

impl<R: AsyncRead + Unpin> AsyncCsvParser<R> {
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
            source: AsyncChunkReader::new(reader, options.chunk_size),
            core,
            done: false,
        })
    }

    /// Pull the next token. `Ok(None)` means the stream is done.
    pub async fn next_token(&mut self) -> CsvResult<Option<Token>> {
        if self.done {
            return Ok(None);
        }
        loop {
            match self.core.step() {
                Ok(Step::NeedInput) => match self.source.next_chunk().await {
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
    pub async fn read<H: CsvHandler>(&mut self, handler: &mut H) -> CsvResult<bool> {
        if self.done {
            return Ok(true);
        }
        loop {
            match self.next_token().await {
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
    pub fn rows(self) -> AsyncRows<R> {
        AsyncRows {
            parser: self,
            done: false,
        }
    }

    /// Convert into a lazy row-of-cells reader.
    pub fn cell_rows(self) -> AsyncCellRows<R> {
        AsyncCellRows {
            parser: self,
            pending: None,
            row_open: false,
            done: false,
        }
    }

    /// Convert into a header-keyed record reader.
    pub fn records(self) -> AsyncRecords<R> {
        AsyncRecords {
            rows: self.rows(),
            header: None,
        }
    }
}

/// Asynchronous row reader: each item is one row of decoded cells.
pub struct AsyncRows<R: AsyncRead + Unpin> {
    parser: AsyncCsvParser<R>,
    done: bool,
}

impl<R: AsyncRead + Unpin> AsyncRows<R> {
    /// Create a row reader with default options.
    pub fn new(reader: R) -> CsvResult<Self> {
        Ok(AsyncCsvParser::new(reader)?.rows())
    }

    /// Create a row reader with the given options.
    pub fn with_options(reader: R, options: ReadOptions) -> CsvResult<Self> {
        Ok(AsyncCsvParser::with_options(reader, options)?.rows())
    }

    /// Pull the next row. `Ok(None)` means the stream is done.
    pub async fn next_row(&mut self) -> CsvResult<Option<Vec<String>>> {
        if self.done {
            return Ok(None);
        }
        let mut row = Vec::new();
        loop {
            match self.parser.next_token().await {
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

/// Asynchronous reader yielding one lazy cell iterator per row.
///
/// The outer [`next_row`](Self::next_row) peeks one token ahead so a
/// terminated stream is reported as `None` rather than as an empty final
/// row, and it drains any cells left unconsumed on the previous row before
/// advancing — abandoning an inner iterator early never stalls the parse.
///
/// ```rust,no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use csv_stream::AsyncCellRows;
/// use tokio::fs::File;
///
/// let file = File::open("wide.csv").await?;
/// let mut rows = AsyncCellRows::new(file)?;
///
/// while let Some(mut cells) = rows.next_row().await? {
///     // inspect only the first cell of each row; the rest is drained
///     // automatically when the next row is requested
///     if let Some(first) = cells.next_cell().await? {
///         println!("{first}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct AsyncCellRows<R: AsyncRead + Unpin> {
    parser: AsyncCsvParser<R>,
    pending: Option<Token>,
    row_open: bool,
    done: bool,
}

impl<R: AsyncRead + Unpin> AsyncCellRows<R> {
    /// Create a lazy row reader with default options.
    pub fn new(reader: R) -> CsvResult<Self> {
        Ok(AsyncCsvParser::new(reader)?.cell_rows())
    }

    /// Create a lazy row reader with the given options.
    pub fn with_options(reader: R, options: ReadOptions) -> CsvResult<Self> {
        Ok(AsyncCsvParser::with_options(reader, options)?.cell_rows())
    }

    /// Advance to the next row, draining the current one if needed.
    pub async fn next_row(&mut self) -> CsvResult<Option<RowCells<'_, R>>> {
        if self.done {
            return Ok(None);
        }
        while self.row_open {
            match self.take_token().await? {
                Some(Token::Cell(_)) => continue,
                Some(Token::NewLine) => self.row_open = false,
                None => {
                    self.row_open = false;
                    self.done = true;
                    return Ok(None);
                }
            }
        }
        match self.take_token().await? {
            Some(token) => {
                self.pending = Some(token);
                self.row_open = true;
                Ok(Some(RowCells { rows: self }))
            }
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }

    async fn take_token(&mut self) -> CsvResult<Option<Token>> {
        if let Some(token) = self.pending.take() {
            return Ok(Some(token));
        }
        match self.parser.next_token().await {
            Ok(token) => Ok(token),
            Err(e) => {
                self.row_open = false;
                self.done = true;
                Err(e)
            }
        }
    }
}

/// Lazy view of one row's cells. Ends at the row boundary.
pub struct RowCells<'a, R: AsyncRead + Unpin> {
    rows: &'a mut AsyncCellRows<R>,
}

impl<R: AsyncRead + Unpin> RowCells<'_, R> {
    /// Pull the next cell of this row. `Ok(None)` at the row boundary.
    pub async fn next_cell(&mut self) -> CsvResult<Option<String>> {
        if !self.rows.row_open {
            return Ok(None);
        }
        match self.rows.take_token().await? {
            Some(Token::Cell(cell)) => Ok(Some(cell)),
            Some(Token::NewLine) => {
                self.rows.row_open = false;
                Ok(None)
            }
            None => {
                self.rows.row_open = false;
                self.rows.done = true;
                Ok(None)
            }
        }
    }
}

/// Asynchronous record reader: the first row names the columns, every later
/// row is paired with those names positionally.
pub struct AsyncRecords<R: AsyncRead + Unpin> {
    rows: AsyncRows<R>,
    header: Option<Vec<String>>,
}

impl<R: AsyncRead + Unpin> AsyncRecords<R> {
    /// Create a record reader with default options.
    pub fn new(reader: R) -> CsvResult<Self> {
        Ok(AsyncCsvParser::new(reader)?.records())
    }

    /// Create a record reader with the given options.
    pub fn with_options(reader: R, options: ReadOptions) -> CsvResult<Self> {
        Ok(AsyncCsvParser::with_options(reader, options)?.records())
    }

    /// The header row, once the first row has been read.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Pull the next record. `Ok(None)` means the stream is done.
    pub async fn next_record(&mut self) -> CsvResult<Option<BTreeMap<String, String>>> {
        if self.header.is_none() {
            match self.rows.next_row().await? {
                Some(header) => self.header = Some(header),
                None => return Ok(None),
            }
        }
        match self.rows.next_row().await? {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn owned(row: &[&str]) -> Vec<String> {
        row.iter().map(|cell| cell.to_string()).collect()
    }

    // ==================== Token surface tests ====================

    #[tokio::test]
    async fn test_token_sequence() {
        let mut parser = AsyncCsvParser::new(Cursor::new("a,b\n1,2")).unwrap();
        let mut tokens = Vec::new();
        while let Some(token) = parser.next_token().await.unwrap() {
            tokens.push(token);
        }
        assert_eq!(
            tokens,
            vec![
                Token::Cell("a".to_string()),
                Token::Cell("b".to_string()),
                Token::NewLine,
                Token::Cell("1".to_string()),
                Token::Cell("2".to_string()),
                Token::NewLine,
            ]
        );
    }

    #[tokio::test]
    async fn test_single_use_after_end() {
        let mut parser = AsyncCsvParser::new(Cursor::new("x")).unwrap();
        while parser.next_token().await.unwrap().is_some() {}
        assert_eq!(parser.next_token().await.unwrap(), None);
    }

    // ==================== AsyncRows tests ====================

    #[tokio::test]
    async fn test_rows() {
        let mut rows = AsyncRows::new(Cursor::new("a,b\n1,2")).unwrap();
        assert_eq!(rows.next_row().await.unwrap(), Some(owned(&["a", "b"])));
        assert_eq!(rows.next_row().await.unwrap(), Some(owned(&["1", "2"])));
        assert_eq!(rows.next_row().await.unwrap(), None);
        assert_eq!(rows.next_row().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rows_error_is_terminal() {
        let mut rows = AsyncRows::new(Cursor::new("a,\"b")).unwrap();
        assert!(rows.next_row().await.is_err());
        assert_eq!(rows.next_row().await.unwrap(), None);
    }

    // ==================== AsyncCellRows tests ====================

    #[tokio::test]
    async fn test_cell_rows_full_consumption() {
        let mut rows = AsyncCellRows::new(Cursor::new("a,b\nc,d")).unwrap();

        let mut collected = Vec::new();
        while let Some(mut cells) = rows.next_row().await.unwrap() {
            let mut row = Vec::new();
            while let Some(cell) = cells.next_cell().await.unwrap() {
                row.push(cell);
            }
            collected.push(row);
        }

        assert_eq!(collected, vec![owned(&["a", "b"]), owned(&["c", "d"])]);
    }

    #[tokio::test]
    async fn test_cell_rows_abandoned_inner_is_drained() {
        let mut rows = AsyncCellRows::new(Cursor::new("a,b,c\nd,e,f\ng,h,i")).unwrap();

        // consume only the first cell of the first row
        let mut cells = rows.next_row().await.unwrap().unwrap();
        assert_eq!(cells.next_cell().await.unwrap(), Some("a".to_string()));

        // the second row still starts at "d"
        let mut cells = rows.next_row().await.unwrap().unwrap();
        assert_eq!(cells.next_cell().await.unwrap(), Some("d".to_string()));
        drop(cells);

        let mut cells = rows.next_row().await.unwrap().unwrap();
        assert_eq!(cells.next_cell().await.unwrap(), Some("g".to_string()));

        assert!(rows.next_row().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cell_rows_no_phantom_final_row() {
        let mut rows = AsyncCellRows::new(Cursor::new("a,b\n")).unwrap();
        assert!(rows.next_row().await.unwrap().is_some());
        assert!(rows.next_row().await.unwrap().is_none());
        assert!(rows.next_row().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cell_rows_inner_exhaustion_is_stable() {
        let mut rows = AsyncCellRows::new(Cursor::new("a,b")).unwrap();
        let mut cells = rows.next_row().await.unwrap().unwrap();
        assert_eq!(cells.next_cell().await.unwrap(), Some("a".to_string()));
        assert_eq!(cells.next_cell().await.unwrap(), Some("b".to_string()));
        assert_eq!(cells.next_cell().await.unwrap(), None);
        assert_eq!(cells.next_cell().await.unwrap(), None);
    }

    // ==================== AsyncRecords tests ====================

    #[tokio::test]
    async fn test_records() {
        let mut records =
            AsyncRecords::new(Cursor::new("name,city\nalice,utrecht\nbob,delft")).unwrap();

        let first = records.next_record().await.unwrap().unwrap();
        assert_eq!(first.get("name").map(String::as_str), Some("alice"));
        assert_eq!(first.get("city").map(String::as_str), Some("utrecht"));
        assert_eq!(records.header(), Some(&owned(&["name", "city"])[..]));

        let second = records.next_record().await.unwrap().unwrap();
        assert_eq!(second.get("city").map(String::as_str), Some("delft"));

        assert_eq!(records.next_record().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_records_empty_input() {
        let mut records = AsyncRecords::new(Cursor::new("")).unwrap();
        assert_eq!(records.next_record().await.unwrap(), None);
    }

    // ==================== Option plumbing tests ====================

    #[tokio::test]
    async fn test_adapters_share_options() {
        let options = ReadOptions {
            column_separator: b";".to_vec(),
            from_line: 1,
            ..Default::default()
        };
        let mut rows =
            AsyncRows::with_options(Cursor::new("skip;me\na;b\nc;d"), options).unwrap();
        assert_eq!(rows.next_row().await.unwrap(), Some(owned(&["a", "b"])));
        assert_eq!(rows.next_row().await.unwrap(), Some(owned(&["c", "d"])));
        assert_eq!(rows.next_row().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_single_byte_chunks_match_default() {
        let input = "a,\"b\n\"\"x\",c\nd,e,f";
        let mut expected = Vec::new();
        let mut rows = AsyncRows::new(Cursor::new(input)).unwrap();
        while let Some(row) = rows.next_row().await.unwrap() {
            expected.push(row);
        }

        let options = ReadOptions {
            chunk_size: 1,
            ..Default::default()
        };
        let mut tiny = AsyncRows::with_options(Cursor::new(input), options).unwrap();
        let mut collected = Vec::new();
        while let Some(row) = tiny.next_row().await.unwrap() {
            collected.push(row);
        }

        assert_eq!(collected, expected);
        assert!(tiny.stats().reads > expected.len() as u64);
    }
}
