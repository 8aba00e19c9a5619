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

//! Bounded delimiter scanners using memchr (SIMD-accelerated).
//!
//! Each scanner considers match *starts* in `[0, limit)` only, but verifies
//! the full multi-byte pattern against the slice, which carries look-ahead
//! beyond `limit` whenever more input may still arrive. Candidate positions
//! are located by first byte; a candidate that does not complete its pattern
//! is ordinary content.

use memchr::{memchr, memchr2, memchr3};

/// What ended an unquoted scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanHit {
    /// No delimiter starts before `limit`.
    Limit,
    /// A line separator starts at `index`.
    Line,
    /// A column separator starts at `index`.
    Column,
    /// A quote starts at `index`.
    Quote,
}

/// Result of [`scan_unquoted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScanMatch {
    pub(crate) index: usize,
    pub(crate) hit: ScanHit,
}

/// Find the first position in `[0, limit)` where a line separator, column
/// separator, or quote begins. Returns `limit` with [`ScanHit::Limit`] when
/// none does.
pub(crate) fn scan_unquoted(
    slice: &[u8],
    limit: usize,
    line_sep: &[u8],
    col_sep: &[u8],
    quote: &[u8],
) -> ScanMatch {
    let limit = limit.min(slice.len());
    let mut pos = 0;
    while pos < limit {
        match memchr3(line_sep[0], col_sep[0], quote[0], &slice[pos..limit]) {
            None => break,
            Some(offset) => {
                let at = pos + offset;
                let rest = &slice[at..];
                if rest.starts_with(line_sep) {
                    return ScanMatch {
                        index: at,
                        hit: ScanHit::Line,
                    };
                }
                if rest.starts_with(col_sep) {
                    return ScanMatch {
                        index: at,
                        hit: ScanHit::Column,
                    };
                }
                if rest.starts_with(quote) {
                    return ScanMatch {
                        index: at,
                        hit: ScanHit::Quote,
                    };
                }
                pos = at + 1;
            }
        }
    }
    ScanMatch {
        index: limit,
        hit: ScanHit::Limit,
    }
}

/// Result of [`scan_quoted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QuotedScan {
    /// First position where a quote begins, or the stop bound.
    pub(crate) index: usize,
    /// Line separators wholly contained in `[0, index)`.
    pub(crate) newlines: usize,
    /// Offset just past the last counted line separator.
    pub(crate) last_line_end: usize,
}

/// Scan quoted-cell content for the next quote, counting the line separators
/// traversed on the way (they are cell content but affect position
/// reporting).
///
/// Never returns an `index` that splits a line separator: a separator that
/// begins before `limit` but would end past it stops the scan at its first
/// byte, uncounted, so the caller can consume it whole on the next pass.
pub(crate) fn scan_quoted(
    slice: &[u8],
    limit: usize,
    quote: &[u8],
    line_sep: &[u8],
) -> QuotedScan {
    let limit = limit.min(slice.len());
    let mut newlines = 0;
    let mut last_line_end = 0;
    let mut pos = 0;
    while pos < limit {
        match memchr2(quote[0], line_sep[0], &slice[pos..limit]) {
            None => break,
            Some(offset) => {
                let at = pos + offset;
                let rest = &slice[at..];
                if rest.starts_with(quote) {
                    return QuotedScan {
                        index: at,
                        newlines,
                        last_line_end,
                    };
                }
                if rest.starts_with(line_sep) {
                    let end = at + line_sep.len();
                    if end > limit {
                        return QuotedScan {
                            index: at,
                            newlines,
                            last_line_end,
                        };
                    }
                    newlines += 1;
                    last_line_end = end;
                    pos = end;
                } else {
                    pos = at + 1;
                }
            }
        }
    }
    QuotedScan {
        index: limit,
        newlines,
        last_line_end,
    }
}

/// Find the start of the first complete line separator, or `None`.
///
/// Used only by the skip-ahead path that discards lines before `from_line`.
pub(crate) fn scan_line_separator(slice: &[u8], line_sep: &[u8]) -> Option<usize> {
    let mut pos = 0;
    while pos < slice.len() {
        match memchr(line_sep[0], &slice[pos..]) {
            None => return None,
            Some(offset) => {
                let at = pos + offset;
                if slice[at..].starts_with(line_sep) {
                    return Some(at);
                }
                pos = at + 1;
            }
        }
    }
    None
}
