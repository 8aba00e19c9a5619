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

//! Chunked byte-source adapter over [`tokio::io::AsyncRead`].
//!
//! Async mirror of [`ChunkReader`](crate::ChunkReader); pulling a chunk is
//! the parser's only suspension point.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Pulls chunks of at most `chunk_size` bytes from an async reader.
pub struct AsyncChunkReader<R: AsyncRead + Unpin> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> AsyncChunkReader<R> {
    /// Create an adapter requesting chunks of `chunk_size` bytes.
    pub fn new(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            buf: vec![0; chunk_size.max(1)],
        }
    }

    /// Pull one chunk. `None` means end of stream.
    pub async fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        loop {
            match self.inner.read(&mut self.buf).await {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(&self.buf[..n])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Give the underlying reader back.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
