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

//! Streaming CSV Reader
//!
//! This crate provides a pull-based CSV parser that reads from a byte stream
//! with bounded memory: input slides through a compacting window, cells are
//! assembled in a reusable buffer, and rows are emitted as soon as they
//! complete. It is suitable for inputs far larger than available RAM.
//!
//! # Features
//!
//! - **Bounded Memory**: steady-state usage is the chunk size plus the
//!   longest cell, independent of file size
//! - **Configurable Delimiters**: column, line, and quote markers are
//!   arbitrary non-empty byte sequences, multi-byte included
//! - **RFC-4180 Quoting**: doubled quotes inside quoted cells decode to one
//!   literal quote; quoted cells may contain separators and line breaks
//! - **Positioned Errors**: syntax errors report 1-based line and character
//! - **Line Ranges**: `from_line`/`to_line` select a window of the input
//! - **Four Views**: tokens, rows, lazy per-row cells, header-keyed records
//! - **Sync and Async**: the same core drives `std::io::Read` and tokio's
//!   `AsyncRead` (feature `async`, enabled by default)
//!
//! # Sync vs Async
//!
//! ## Synchronous API
//!
//! ```rust
//! use csv_stream::Rows;
//! use std::io::Cursor;
//!
//! let input = "name,qty\nwidget,4\ngadget,7";
//!
//! let rows = Rows::new(Cursor::new(input)).unwrap();
//! for row in rows {
//!     let row = row.unwrap();
//!     println!("{} -> {}", row[0], row[1]);
//! }
//! ```
//!
//! ## Asynchronous API (feature = "async")
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use csv_stream::AsyncRows;
//! use tokio::fs::File;
//!
//! let file = File::open("large.csv").await?;
//! let mut rows = AsyncRows::new(file)?;
//!
//! while let Some(row) = rows.next_row().await? {
//!     println!("{row:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Custom Delimiters
//!
//! ```rust
//! use csv_stream::{ReadOptions, Rows};
//! use std::io::Cursor;
//!
//! let options = ReadOptions {
//!     column_separator: b"\t".to_vec(),
//!     line_separator: b"\r\n".to_vec(),
//!     quote: b"$".to_vec(),
//!     ..Default::default()
//! };
//!
//! let mut rows = Rows::with_options(Cursor::new("a\tb\r\n1\t$2$"), options).unwrap();
//! assert_eq!(rows.next_row().unwrap(), Some(vec!["a".into(), "b".into()]));
//! assert_eq!(rows.next_row().unwrap(), Some(vec!["1".into(), "2".into()]));
//! ```
//!
//! # Error Positions
//!
//! ```rust
//! use csv_stream::Rows;
//! use std::io::Cursor;
//!
//! let mut rows = Rows::new(Cursor::new("1,\"2")).unwrap();
//! let err = rows.next_row().unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "unterminated quoted cell (line 1, character 5)"
//! );
//! ```

mod buffer;
mod core;
mod error;
mod options;
mod parser;
mod reader;
mod scan;
mod token;

#[cfg(feature = "async")]
mod async_parser;
#[cfg(feature = "async")]
mod async_reader;

pub use error::{CsvError, CsvResult};
pub use options::{Encoding, ReadOptions};
pub use parser::{CsvHandler, CsvParser, Pace, Records, Rows};
pub use reader::ChunkReader;
pub use token::{ReadStats, Token};

#[cfg(feature = "async")]
pub use async_parser::{AsyncCellRows, AsyncCsvParser, AsyncRecords, AsyncRows, RowCells};
#[cfg(feature = "async")]
pub use async_reader::AsyncChunkReader;
