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

//! The resumable parser core.
//!
//! [`CsvCore`] is a state machine over two owned buffers. It performs no IO:
//! callers push chunks with [`CsvCore::push_chunk`], signal end of stream
//! with [`CsvCore::finish`], and advance the machine one emission at a time
//! with [`CsvCore::step`], which returns a coarse result:
//!
//! - `NeedInput` — the look-ahead window ran dry and the stream may continue
//! - `Cell(text)` — a cell boundary was reached
//! - `NewLine` — a row boundary was reached
//! - `End` — the stream is exhausted or the selected line range is complete
//!
//! Both the sync and async front ends drive the same core, so parse results
//! are identical between them and independent of how the input is chunked.
//!
//! Each call evaluates a fixed priority ladder of rules: refill, input
//! compaction, column-buffer growth, skip-ahead to the first selected line,
//! end of the selected range, BOM, EOF, delimiter recognition, quote
//! handling, bulk content copy, and the terminal error states. Returning
//! from `step` after a single emission is what makes the machine
//! cooperatively pausable.

use std::collections::VecDeque;

use crate::buffer::{ColumnBuffer, InputBuffer};
use crate::error::{CsvError, CsvResult};
use crate::options::{Delimiters, Encoding, ReadOptions};
use crate::scan::{self, ScanHit};
use crate::token::ReadStats;

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Coarse result of one [`CsvCore::step`] call.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// More input is required before the next boundary can be decided.
    NeedInput,
    /// A cell completed.
    Cell(String),
    /// A row completed.
    NewLine,
    /// The stream is done. Terminal: repeated calls keep returning `End`.
    End,
}

/// The parser state machine. Owns its buffers; single-use.
pub(crate) struct CsvCore {
    delims: Delimiters,
    encoding: Encoding,
    from_line: usize,
    to_line: Option<usize>,
    input_index_limit: usize,
    column_reserve: usize,

    input: InputBuffer,
    column: ColumnBuffer,
    pending: VecDeque<Step>,

    in_column: bool,
    in_quote: bool,
    empty_line: bool,
    reader_empty: bool,
    /// Set after a closing quote until the following byte is confirmed to
    /// begin a separator (or the stream ends). Deferred so that a chunk
    /// boundary between the quote and the separator cannot change the parse.
    expect_separator: bool,
    terminal: bool,

    /// Absolute byte offset consumed since the start of the stream.
    current_pos: u64,
    /// Physical line separators consumed, including those inside quoted
    /// cells.
    lines_processed: usize,
    last_line_start_pos: u64,

    stats: ReadStats,
}

impl CsvCore {
    pub(crate) fn new(options: &ReadOptions) -> CsvResult<Self> {
        let delims = options.delimiters()?;
        Ok(Self {
            delims,
            encoding: options.encoding,
            from_line: options.from_line,
            to_line: options.to_line,
            input_index_limit: options.input_buffer_index_limit,
            column_reserve: options.column_buffer_reserve,
            input: InputBuffer::new(),
            column: ColumnBuffer::new(options.column_buffer_min_step_size),
            pending: VecDeque::new(),
            in_column: false,
            in_quote: false,
            empty_line: true,
            reader_empty: false,
            expect_separator: false,
            terminal: false,
            current_pos: 0,
            lines_processed: 0,
            last_line_start_pos: 0,
            stats: ReadStats::default(),
        })
    }

    /// Append one chunk from the byte source.
    pub(crate) fn push_chunk(&mut self, chunk: &[u8]) {
        self.stats.reads += 1;
        self.input.append(chunk);
        tracing::trace!(len = chunk.len(), reads = self.stats.reads, "buffered chunk");
    }

    /// Mark the byte source as exhausted. Monotonic.
    pub(crate) fn finish(&mut self) {
        self.reader_empty = true;
    }

    pub(crate) fn stats(&self) -> ReadStats {
        self.stats
    }

    /// Run the rule ladder until one emission, a request for input, or the
    /// end of the stream.
    pub(crate) fn step(&mut self) -> CsvResult<Step> {
        if let Some(step) = self.pending.pop_front() {
            if step == Step::End {
                self.terminal = true;
            }
            return Ok(step);
        }
        if self.terminal {
            return Ok(Step::End);
        }

        loop {
            // Refill: keep the look-ahead window at min_reserve while the
            // stream may continue.
            if !self.reader_empty && self.input.unprocessed() < self.delims.min_reserve {
                return Ok(Step::NeedInput);
            }

            // Reclaim the consumed input prefix once it passes the limit.
            if self.input.read_index() >= self.input_index_limit {
                self.input.compact();
                self.stats.input_buffer_shrinks += 1;
                tracing::trace!(
                    shrinks = self.stats.input_buffer_shrinks,
                    "compacted input buffer"
                );
                continue;
            }

            // Keep the column buffer's free tail at the reserve.
            if self.column.free() < self.column_reserve {
                self.column.grow();
                self.stats.column_buffer_expands += 1;
                continue;
            }

            // Discard whole lines until from_line.
            if !self.in_column && self.lines_processed < self.from_line {
                if self.input.unprocessed() == 0 {
                    self.terminal = true;
                    return Ok(Step::End);
                }
                self.skip_toward_start_line();
                continue;
            }

            // Stop at to_line.
            if !self.in_column {
                if let Some(to_line) = self.to_line {
                    if self.lines_processed >= to_line {
                        self.terminal = true;
                        return Ok(Step::End);
                    }
                }
            }

            // A UTF-8 BOM at the very start of the stream is consumed
            // silently.
            if !self.in_column && self.current_pos == 0 {
                let slice = self.input.as_slice();
                if slice.len() >= BOM.len() {
                    if slice[..BOM.len()] == BOM {
                        self.advance(BOM.len());
                        continue;
                    }
                } else if !self.reader_empty && !slice.is_empty() && BOM.starts_with(slice) {
                    return Ok(Step::NeedInput);
                }
            }

            // End of stream outside a column.
            if !self.in_column && self.input.unprocessed() == 0 {
                return Ok(self.finish_stream());
            }

            // Deferred look-ahead after a closing quote: the next byte must
            // begin a separator, unless the stream ends here.
            if self.expect_separator {
                if self.input.unprocessed() == 0
                    || self.starts_with(&self.delims.line)
                    || self.starts_with(&self.delims.column)
                {
                    self.expect_separator = false;
                    continue;
                }
                let byte = self.input.as_slice()[0];
                self.terminal = true;
                return Err(CsvError::unexpected_after_quote(
                    self.line_number(),
                    self.character_number(),
                    byte,
                ));
            }

            // Row boundary.
            if !self.in_column && self.starts_with(&self.delims.line) {
                let mut first = None;
                if !self.empty_line {
                    let cell = self.take_cell();
                    self.pending.push_back(Step::NewLine);
                    first = Some(Step::Cell(cell));
                }
                self.advance(self.delims.line.len());
                self.lines_processed += 1;
                self.last_line_start_pos = self.current_pos;
                self.empty_line = true;
                match first {
                    Some(step) => return Ok(step),
                    None => continue,
                }
            }

            // Cell boundary.
            if !self.in_column && self.starts_with(&self.delims.column) {
                self.empty_line = false;
                let cell = self.take_cell();
                self.advance(self.delims.column.len());
                return Ok(Step::Cell(cell));
            }

            // Start a cell, consuming an opening quote if present.
            if !self.in_column {
                self.in_column = true;
                self.empty_line = false;
                if self.starts_with(&self.delims.quote) {
                    self.in_quote = true;
                    self.advance(self.delims.quote.len());
                }
                continue;
            }

            // A doubled quote inside a quoted cell is one literal quote.
            if self.in_quote && self.starts_with(&self.delims.double_quote) {
                self.column.push(&self.delims.quote);
                self.advance(self.delims.double_quote.len());
                continue;
            }

            // Closing quote.
            if self.in_quote && self.starts_with(&self.delims.quote) {
                self.in_quote = false;
                self.in_column = false;
                self.advance(self.delims.quote.len());
                self.expect_separator = true;
                continue;
            }

            // An unquoted cell ends at EOF or in front of a separator.
            if self.in_column
                && !self.in_quote
                && (self.input.unprocessed() == 0
                    || self.starts_with(&self.delims.line)
                    || self.starts_with(&self.delims.column))
            {
                self.in_column = false;
                continue;
            }

            // Bulk copy of cell content up to the next significant byte.
            if self.in_column && self.input.unprocessed() > 0 {
                match self.read_cell_body() {
                    Ok(()) => continue,
                    Err(e) => {
                        self.terminal = true;
                        return Err(e);
                    }
                }
            }

            // The stream ended inside a quoted cell.
            if self.in_quote && self.input.unprocessed() == 0 && self.reader_empty {
                self.terminal = true;
                return Err(CsvError::UnterminatedQuote {
                    line: self.line_number(),
                    character: self.character_number(),
                });
            }

            // Unreachable by construction.
            self.terminal = true;
            return Err(CsvError::Unexpected {
                line: self.line_number(),
                character: self.character_number(),
            });
        }
    }

    /// EOF handling: flush a pending cell and row, then end.
    fn finish_stream(&mut self) -> Step {
        if !self.empty_line {
            let cell = self.take_cell();
            self.pending.push_back(Step::NewLine);
            self.pending.push_back(Step::End);
            return Step::Cell(cell);
        }
        self.terminal = true;
        Step::End
    }

    /// Advance past one discarded line, or as far as the current window
    /// allows. Skipped bytes are written nowhere.
    fn skip_toward_start_line(&mut self) {
        let sep_len = self.delims.line.len();
        match scan::scan_line_separator(self.input.as_slice(), &self.delims.line) {
            Some(index) => {
                self.advance(index + sep_len);
                self.lines_processed += 1;
                self.last_line_start_pos = self.current_pos;
                self.empty_line = true;
            }
            None => {
                // keep a partial-separator tail so a match straddling the
                // chunk boundary is not lost
                let keep = if self.reader_empty { 0 } else { sep_len - 1 };
                let skip = self.input.unprocessed().saturating_sub(keep);
                self.advance(skip);
            }
        }
    }

    /// Copy cell content in bulk, bounded by the look-ahead reserve and the
    /// column buffer's free tail.
    fn read_cell_body(&mut self) -> CsvResult<()> {
        let limit = self
            .input
            .unprocessed()
            .saturating_sub(self.delims.min_reserve)
            .min(self.column.free());
        if limit <= 1 {
            return self.read_cell_byte();
        }

        if self.in_quote {
            let scan = scan::scan_quoted(
                self.input.as_slice(),
                limit,
                &self.delims.quote,
                &self.delims.line,
            );
            if scan.index == 0 {
                // a line separator at the head would be split by the copy
                // bound; consume it whole instead
                return self.read_cell_byte();
            }
            self.column.push(&self.input.as_slice()[..scan.index]);
            if scan.newlines > 0 {
                self.lines_processed += scan.newlines;
                self.last_line_start_pos = self.current_pos + scan.last_line_end as u64;
            }
            self.advance(scan.index);
        } else {
            let scan = scan::scan_unquoted(
                self.input.as_slice(),
                limit,
                &self.delims.line,
                &self.delims.column,
                &self.delims.quote,
            );
            if scan.hit == ScanHit::Quote && scan.index == 0 {
                return Err(self.unexpected_quote_in_cell());
            }
            self.column.push(&self.input.as_slice()[..scan.index]);
            self.advance(scan.index);
        }
        Ok(())
    }

    /// Slow path taken near the end of the window: move a single byte, or a
    /// whole line separator inside a quoted cell so line accounting stays
    /// exact.
    fn read_cell_byte(&mut self) -> CsvResult<()> {
        if self.in_quote {
            if self.starts_with(&self.delims.line) {
                let sep_len = self.delims.line.len();
                self.column.push(&self.input.as_slice()[..sep_len]);
                self.advance(sep_len);
                self.lines_processed += 1;
                self.last_line_start_pos = self.current_pos;
                return Ok(());
            }
        } else if self.starts_with(&self.delims.quote) {
            return Err(self.unexpected_quote_in_cell());
        }
        self.column.push(&self.input.as_slice()[..1]);
        self.advance(1);
        Ok(())
    }

    fn take_cell(&mut self) -> String {
        let bytes = self.column.take();
        self.encoding.decode(&bytes)
    }

    #[inline]
    fn starts_with(&self, pattern: &[u8]) -> bool {
        self.input.as_slice().starts_with(pattern)
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        self.input.advance(n);
        self.current_pos += n as u64;
    }

    #[inline]
    fn line_number(&self) -> u64 {
        self.lines_processed as u64 + 1
    }

    #[inline]
    fn character_number(&self) -> u64 {
        self.current_pos - self.last_line_start_pos + 1
    }

    fn unexpected_quote_in_cell(&self) -> CsvError {
        CsvError::UnexpectedQuoteInUnquoted {
            line: self.line_number(),
            character: self.character_number(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive a core over `input` delivered in `chunk_size`-byte pieces and
    /// collect the rows.
    fn run(input: &[u8], options: ReadOptions, chunk_size: usize) -> CsvResult<Vec<Vec<String>>> {
        let mut core = CsvCore::new(&options)?;
        let mut offset = 0;
        let mut rows = Vec::new();
        let mut row = Vec::new();
        loop {
            match core.step()? {
                Step::NeedInput => {
                    if offset < input.len() {
                        let end = (offset + chunk_size).min(input.len());
                        core.push_chunk(&input[offset..end]);
                        offset = end;
                    } else {
                        core.finish();
                    }
                }
                Step::Cell(cell) => row.push(cell),
                Step::NewLine => rows.push(std::mem::take(&mut row)),
                Step::End => return Ok(rows),
            }
        }
    }

    fn rows(input: &str) -> Vec<Vec<String>> {
        run(input.as_bytes(), ReadOptions::default(), 1024).unwrap()
    }

    fn owned(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    // ==================== Basic parsing tests ====================

    #[test]
    fn test_plain_rows() {
        assert_eq!(rows("a,b,c\n1,2,3"), owned(&[&["a", "b", "c"], &["1", "2", "3"]]));
    }

    #[test]
    fn test_trailing_line_separator_adds_no_row() {
        assert_eq!(rows("a,b\n"), owned(&[&["a", "b"]]));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(rows("a\n\n\nb"), owned(&[&["a"], &["b"]]));
    }

    #[test]
    fn test_empty_input_yields_no_rows() {
        assert_eq!(rows(""), Vec::<Vec<String>>::new());
    }

    #[test]
    fn test_separator_only_line_is_preserved() {
        // a line of column separators is a row of empty cells, not a blank
        // line
        assert_eq!(rows(",,\nx,y,z"), owned(&[&["", "", ""], &["x", "y", "z"]]));
    }

    #[test]
    fn test_trailing_column_separator_yields_empty_cell() {
        assert_eq!(rows("a,"), owned(&[&["a", ""]]));
    }

    #[test]
    fn test_bom_is_consumed() {
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(b"\"1\",\"2\"");
        assert_eq!(
            run(&input, ReadOptions::default(), 1024).unwrap(),
            owned(&[&["1", "2"]])
        );
    }

    #[test]
    fn test_bom_split_across_chunks() {
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(b"a,b");
        assert_eq!(
            run(&input, ReadOptions::default(), 1).unwrap(),
            owned(&[&["a", "b"]])
        );
    }

    #[test]
    fn test_bom_only_stream() {
        let input = [0xEF, 0xBB, 0xBF];
        assert_eq!(
            run(&input, ReadOptions::default(), 1024).unwrap(),
            Vec::<Vec<String>>::new()
        );
    }

    // ==================== Quoting tests ====================

    #[test]
    fn test_quoted_cells() {
        assert_eq!(rows("1,\"2\",3"), owned(&[&["1", "2", "3"]]));
    }

    #[test]
    fn test_doubled_quote_escape() {
        assert_eq!(
            rows("1,\"2\",3\na,\"b\n\"\"1\",c"),
            owned(&[&["1", "2", "3"], &["a", "b\n\"1", "c"]])
        );
    }

    #[test]
    fn test_quoted_cell_containing_separators() {
        assert_eq!(rows("\"a,b\",c"), owned(&[&["a,b", "c"]]));
    }

    #[test]
    fn test_quoted_empty_cell() {
        assert_eq!(rows("\"\",x"), owned(&[&["", "x"]]));
    }

    #[test]
    fn test_quoted_cell_at_eof() {
        assert_eq!(rows("a,\"b\""), owned(&[&["a", "b"]]));
    }

    #[test]
    fn test_custom_delimiters() {
        let options = ReadOptions {
            column_separator: b"\t".to_vec(),
            line_separator: b"\r\n".to_vec(),
            quote: b"$".to_vec(),
            ..Default::default()
        };
        assert_eq!(
            run(b"a\tb\tc\r\n1\t2\t$$$3$", options, 1024).unwrap(),
            owned(&[&["a", "b", "c"], &["1", "2", "$3"]])
        );
    }

    #[test]
    fn test_multibyte_delimiters() {
        let options = ReadOptions {
            column_separator: b"||".to_vec(),
            line_separator: b"%%".to_vec(),
            quote: b"##".to_vec(),
            ..Default::default()
        };
        assert_eq!(
            run(b"a||##b%%c##||d", options, 1024).unwrap(),
            owned(&[&["a", "b%%c", "d"]])
        );
    }

    // ==================== Line range tests ====================

    #[test]
    fn test_from_line_and_to_line() {
        let options = ReadOptions {
            from_line: 1,
            to_line: Some(3),
            ..Default::default()
        };
        assert_eq!(
            run(b"a,b\nc,d\ne,f\ng,h", options, 1024).unwrap(),
            owned(&[&["c", "d"], &["e", "f"]])
        );
    }

    #[test]
    fn test_from_line_past_end() {
        let options = ReadOptions {
            from_line: 10,
            ..Default::default()
        };
        assert_eq!(
            run(b"a,b\nc,d", options, 1024).unwrap(),
            Vec::<Vec<String>>::new()
        );
    }

    #[test]
    fn test_empty_selection() {
        let options = ReadOptions {
            from_line: 2,
            to_line: Some(2),
            ..Default::default()
        };
        assert_eq!(
            run(b"a\nb\nc\nd", options, 1024).unwrap(),
            Vec::<Vec<String>>::new()
        );
    }

    #[test]
    fn test_skip_with_crlf_separator_and_single_byte_chunks() {
        let options = ReadOptions {
            line_separator: b"\r\n".to_vec(),
            from_line: 2,
            ..Default::default()
        };
        assert_eq!(
            run(b"a\r\nb\r\nc,d", options, 1).unwrap(),
            owned(&[&["c", "d"]])
        );
    }

    #[test]
    fn test_quoted_newlines_count_as_physical_lines() {
        // the embedded separator advances the line counter, so line 2 begins
        // inside the stream's second physical line
        let options = ReadOptions {
            from_line: 2,
            ..Default::default()
        };
        assert_eq!(
            run(b"\"a\nb\",x\nc,d", options, 1024).unwrap(),
            owned(&[&["c", "d"]])
        );
    }

    // ==================== Error tests ====================

    #[test]
    fn test_unterminated_quote() {
        let err = run(b"1,\"2", ReadOptions::default(), 1024).unwrap_err();
        match err {
            CsvError::UnterminatedQuote { line, character } => {
                assert_eq!(line, 1);
                assert_eq!(character, 5);
            }
            other => panic!("expected UnterminatedQuote, got {other:?}"),
        }
    }

    #[test]
    fn test_unexpected_after_quote() {
        let err = run(b"1,\"2\"3", ReadOptions::default(), 1024).unwrap_err();
        match err {
            CsvError::UnexpectedAfterQuote {
                line,
                character,
                ref found,
                ..
            } => {
                assert_eq!(line, 1);
                assert_eq!(character, 6);
                assert_eq!(found, "\"3\"");
            }
            other => panic!("expected UnexpectedAfterQuote, got {other:?}"),
        }
    }

    #[test]
    fn test_unexpected_after_quote_reports_carriage_return() {
        let err = run(b"\"a\"\r\nb", ReadOptions::default(), 1024).unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("\"\\r\""));
        assert!(message.contains("set line_separator to \"\\r\\n\""));
    }

    #[test]
    fn test_unexpected_quote_in_unquoted_cell() {
        let err = run(b"1,2 \"3\",4", ReadOptions::default(), 1024).unwrap_err();
        match err {
            CsvError::UnexpectedQuoteInUnquoted { line, character } => {
                assert_eq!(line, 1);
                assert_eq!(character, 5);
            }
            other => panic!("expected UnexpectedQuoteInUnquoted, got {other:?}"),
        }
    }

    #[test]
    fn test_error_position_on_later_line() {
        let err = run(b"a,b\nc,\"d", ReadOptions::default(), 1024).unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.character(), Some(5));
    }

    #[test]
    fn test_terminal_after_error() {
        let mut core = CsvCore::new(&ReadOptions::default()).unwrap();
        core.push_chunk(b"\"x");
        core.finish();
        let mut saw_error = false;
        loop {
            match core.step() {
                Ok(Step::End) => break,
                Ok(_) => continue,
                Err(_) => {
                    assert!(!saw_error, "error must be delivered once");
                    saw_error = true;
                }
            }
        }
        assert!(saw_error);
        assert_eq!(core.step().unwrap(), Step::End);
    }

    // ==================== Chunking independence tests ====================

    #[test]
    fn test_chunk_size_does_not_change_results() {
        let input = "a,\"b\n\"\"x\",c\n,,\nlast,\"row\"";
        let expected = rows(input);
        for chunk_size in [1, 2, 3, 5, 7, 64] {
            assert_eq!(
                run(input.as_bytes(), ReadOptions::default(), chunk_size).unwrap(),
                expected,
                "chunk size {chunk_size}"
            );
        }
    }

    #[test]
    fn test_crlf_quoted_content_single_byte_chunks() {
        let options = ReadOptions {
            line_separator: b"\r\n".to_vec(),
            ..Default::default()
        };
        let expected = owned(&[&["a\r\nb", "c"], &["d", "e"]]);
        for chunk_size in [1, 2, 1024] {
            let options = options.clone();
            assert_eq!(
                run(b"\"a\r\nb\",c\r\nd,e", options, chunk_size).unwrap(),
                expected,
                "chunk size {chunk_size}"
            );
        }
    }

    #[test]
    fn test_tiny_buffers_track_stats() {
        let options = ReadOptions {
            input_buffer_index_limit: 1,
            column_buffer_min_step_size: 1,
            column_buffer_reserve: 1,
            ..Default::default()
        };
        let mut core = CsvCore::new(&options).unwrap();
        core.push_chunk(b"hello,world\nfoo,bar");
        core.finish();
        let mut cells = Vec::new();
        loop {
            match core.step().unwrap() {
                Step::Cell(cell) => cells.push(cell),
                Step::NewLine => continue,
                Step::End => break,
                Step::NeedInput => unreachable!("input fully buffered"),
            }
        }
        assert_eq!(cells, vec!["hello", "world", "foo", "bar"]);
        let stats = core.stats();
        assert!(stats.input_buffer_shrinks > 0);
        assert!(stats.column_buffer_expands > 0);
        assert_eq!(stats.reads, 1);
    }
}
