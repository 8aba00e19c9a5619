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

//! The two buffers the parser core operates on.
//!
//! [`InputBuffer`] is a sliding window over the byte stream: chunks are
//! appended at the tail, the parser consumes from a read index, and the
//! consumed prefix is reclaimed by copy-forward compaction once it passes a
//! threshold. [`ColumnBuffer`] accumulates the raw bytes of the cell being
//! assembled and keeps a guaranteed free tail so bulk copies never have to
//! interleave with reallocation checks.

/// Sliding window over the incoming byte stream.
#[derive(Debug)]
pub(crate) struct InputBuffer {
    bytes: Vec<u8>,
    read_index: usize,
}

impl InputBuffer {
    pub(crate) fn new() -> Self {
        Self {
            bytes: Vec::new(),
            read_index: 0,
        }
    }

    /// Bytes appended but not yet consumed.
    #[inline]
    pub(crate) fn unprocessed(&self) -> usize {
        self.bytes.len() - self.read_index
    }

    /// Length of the consumed prefix.
    #[inline]
    pub(crate) fn read_index(&self) -> usize {
        self.read_index
    }

    /// The unconsumed bytes.
    #[inline]
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.bytes[self.read_index..]
    }

    /// Append one chunk from the byte source.
    #[inline]
    pub(crate) fn append(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Consume `n` bytes.
    #[inline]
    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.unprocessed());
        self.read_index += n;
    }

    /// Drop the consumed prefix, moving the unconsumed tail to the front.
    pub(crate) fn compact(&mut self) {
        self.bytes.drain(..self.read_index);
        self.read_index = 0;
    }
}

/// Accumulator for the raw bytes of the cell currently being assembled.
///
/// Grows geometrically with increments of at least `min_step`. When the cell
/// is emitted the backing storage is replaced by a fresh small allocation so
/// memory spent on an unusually large cell is returned promptly.
#[derive(Debug)]
pub(crate) struct ColumnBuffer {
    bytes: Vec<u8>,
    min_step: usize,
}

impl ColumnBuffer {
    pub(crate) fn new(min_step: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(min_step),
            min_step,
        }
    }

    /// Free space between the write position and the current capacity.
    #[inline]
    pub(crate) fn free(&self) -> usize {
        self.bytes.capacity() - self.bytes.len()
    }

    /// Grow capacity by at least `max(min_step, capacity)`.
    pub(crate) fn grow(&mut self) {
        let step = self.min_step.max(self.bytes.capacity()).max(1);
        let additional = self.free() + step;
        self.bytes.reserve_exact(additional);
    }

    /// Append cell content.
    #[inline]
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Take the accumulated bytes, leaving a fresh buffer behind.
    pub(crate) fn take(&mut self) -> Vec<u8> {
        std::mem::replace(&mut self.bytes, Vec::with_capacity(self.min_step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== InputBuffer tests ====================

    #[test]
    fn test_input_append_and_advance() {
        let mut input = InputBuffer::new();
        input.append(b"abc");
        input.append(b"def");
        assert_eq!(input.unprocessed(), 6);
        assert_eq!(input.as_slice(), b"abcdef");

        input.advance(2);
        assert_eq!(input.read_index(), 2);
        assert_eq!(input.unprocessed(), 4);
        assert_eq!(input.as_slice(), b"cdef");
    }

    #[test]
    fn test_input_compact() {
        let mut input = InputBuffer::new();
        input.append(b"abcdef");
        input.advance(4);
        input.compact();
        assert_eq!(input.read_index(), 0);
        assert_eq!(input.as_slice(), b"ef");

        input.append(b"gh");
        assert_eq!(input.as_slice(), b"efgh");
    }

    #[test]
    fn test_input_compact_fully_consumed() {
        let mut input = InputBuffer::new();
        input.append(b"abc");
        input.advance(3);
        input.compact();
        assert_eq!(input.unprocessed(), 0);
        assert_eq!(input.as_slice(), b"");
    }

    // ==================== ColumnBuffer tests ====================

    #[test]
    fn test_column_push_and_take() {
        let mut column = ColumnBuffer::new(16);
        column.push(b"hello");
        column.push(b" world");
        assert_eq!(column.take(), b"hello world");
        assert_eq!(column.take(), b"");
    }

    #[test]
    fn test_column_grow_raises_free() {
        let mut column = ColumnBuffer::new(4);
        column.push(b"abcd");
        let before = column.free();
        column.grow();
        assert!(column.free() >= before + 4);
    }

    #[test]
    fn test_column_take_resets_capacity() {
        let mut column = ColumnBuffer::new(8);
        column.push(&[b'x'; 4096]);
        let taken = column.take();
        assert_eq!(taken.len(), 4096);
        // the replacement buffer starts small again
        assert!(column.bytes.capacity() < 4096);
    }

    #[test]
    fn test_column_grow_is_geometric() {
        let mut column = ColumnBuffer::new(1);
        column.grow();
        let first = column.bytes.capacity();
        column.grow();
        assert!(column.bytes.capacity() >= first * 2);
    }
}
