// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lookahead byte cursor
//!
//! The cursor wraps any [`BufRead`] and offers the handful of primitives the
//! dump rewriter is written against: bounded peeking, single byte pushback
//! and chunked line reads. Bytes that were peeked or pushed back live in a
//! small pending queue in front of the underlying reader.

use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Longest chunk returned by a single [`Cursor::read_line`] call.
pub const DEFAULT_LINE_CAPACITY: usize = 4096;

/// A piece of a line returned by [`Cursor::read_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChunk {
    /// Raw bytes, including the terminating `\n` when one was reached.
    pub bytes: Vec<u8>,
    /// The chunk hit the line capacity before a newline was found.
    pub truncated: bool,
}

impl LineChunk {
    /// Whether this chunk finishes its line with a `\n`.
    pub fn ends_line(&self) -> bool {
        self.bytes.last() == Some(&b'\n')
    }
}

/// Byte cursor with lookahead and one byte of pushback.
pub struct Cursor<R> {
    inner: R,
    pending: VecDeque<u8>,
    last: Option<u8>,
    line_capacity: usize,
    line: u64,
    offset: u64,
}

impl<R: BufRead> Cursor<R> {
    pub fn new(inner: R) -> Self {
        Cursor::with_line_capacity(inner, DEFAULT_LINE_CAPACITY)
    }

    pub fn with_line_capacity(inner: R, line_capacity: usize) -> Self {
        Cursor {
            inner,
            pending: VecDeque::new(),
            last: None,
            line_capacity: line_capacity.max(1),
            line: 1,
            offset: 0,
        }
    }

    /// Current 1-based line number.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Return up to `n` upcoming bytes without consuming them.
    ///
    /// A slice shorter than `n` means the stream ends before `n` bytes.
    pub fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
        while self.pending.len() < n {
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }
            let take = available.len().min(n - self.pending.len());
            self.pending.extend(&available[..take]);
            self.inner.consume(take);
        }
        let len = self.pending.len().min(n);
        Ok(&self.pending.make_contiguous()[..len])
    }

    /// Consume up to `n` bytes, returning how many were actually consumed.
    pub fn discard(&mut self, n: usize) -> io::Result<usize> {
        let mut discarded = 0;
        while discarded < n && self.next()?.is_some() {
            discarded += 1;
        }
        self.last = None;
        Ok(discarded)
    }

    /// Consume one byte. `None` means end of stream.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.next()?;
        self.last = byte;
        Ok(byte)
    }

    /// Push back the byte returned by the previous [`Cursor::read_byte`].
    pub fn unread_byte(&mut self) -> io::Result<()> {
        let byte = self.last.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no byte available to unread")
        })?;
        self.pending.push_front(byte);
        self.offset -= 1;
        if byte == b'\n' {
            self.line -= 1;
        }
        Ok(())
    }

    /// Read the next line, or the next `line_capacity` bytes of it.
    ///
    /// Callers loop while [`LineChunk::truncated`] is set to assemble a full
    /// line. A final line without `\n` comes back untruncated and without a
    /// newline; `None` is returned once the stream is exhausted.
    pub fn read_line(&mut self) -> io::Result<Option<LineChunk>> {
        self.last = None;
        let mut bytes = Vec::new();
        loop {
            if bytes.len() >= self.line_capacity {
                return Ok(Some(LineChunk {
                    bytes,
                    truncated: true,
                }));
            }

            if let Some(byte) = self.pending.pop_front() {
                self.advance(byte);
                bytes.push(byte);
                if byte == b'\n' {
                    return Ok(Some(LineChunk {
                        bytes,
                        truncated: false,
                    }));
                }
                continue;
            }

            let room = self.line_capacity - bytes.len();
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                if bytes.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(LineChunk {
                    bytes,
                    truncated: false,
                }));
            }

            let window = &available[..available.len().min(room)];
            let (take, newline) = match window.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (window.len(), false),
            };
            bytes.extend_from_slice(&window[..take]);
            self.inner.consume(take);
            self.offset += take as u64;
            if newline {
                self.line += 1;
                return Ok(Some(LineChunk {
                    bytes,
                    truncated: false,
                }));
            }
        }
    }

    fn next(&mut self) -> io::Result<Option<u8>> {
        if self.peek(1)?.is_empty() {
            return Ok(None);
        }
        let byte = self.pending.pop_front();
        if let Some(byte) = byte {
            self.advance(byte);
        }
        Ok(byte)
    }

    fn advance(&mut self, byte: u8) {
        self.offset += 1;
        if byte == b'\n' {
            self.line += 1;
        }
    }
}
