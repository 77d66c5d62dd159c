//! Growable byte window over an optional backing stream.
//!
//! The reader lexes directly over `buffer`. Bytes are appended at
//! `offset_max` by reading from the stream; the reader consumes them by
//! advancing `offset`. Consumption is bounded by `window_max`, which the
//! reader re-anchors at every node boundary with [`ByteWindow::set_window`],
//! so a single node can never span more than one window. Re-anchoring in
//! place only moves the ceiling; the unread tail is moved to the front of the
//! buffer once the cursor is past [`COMPACT_AFTER`].
//!
//! Invariants
//! - `offset <= offset_max <= buffer.len()` and `offset <= window_max`.
//! - Bytes in `[0, offset_max)` never move while the window is anchored;
//!   growth preserves them. Handles stay valid until a `set_window` that
//!   moves the tail.

use std::{
    fmt,
    io::{ErrorKind, Read},
    time::Instant,
};

use bstr::BStr;
use tracing::trace;

use crate::error::{ErrorSource, QuotaError, ReaderError, SyntaxError};

const INITIAL_CAPACITY: usize = 256;
const READ_CHUNK: usize = 4096;
/// Cursor offset past which re-anchoring compacts the buffer.
pub(crate) const COMPACT_AFTER: usize = READ_CHUNK / 2;
/// Buffers that grew past this size are released on close.
pub(crate) const RETAINED_CAPACITY: usize = 4096;

/// Outcome of an optional look-ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fill {
    /// The requested bytes are buffered.
    Ready,
    /// The stream ended first.
    Eof,
    /// The request reaches past the window ceiling.
    WindowFull,
}

pub(crate) struct ByteWindow<R> {
    buffer: Vec<u8>,
    offset: usize,
    offset_max: usize,
    window_max: usize,
    stream: Option<R>,
    exhausted: bool,
    /// Length of the current window, reported by quota errors.
    window_len: usize,
    /// Absolute stream position of `buffer[0]`.
    base: u64,
    deadline: Option<Instant>,
}

impl<R> fmt::Debug for ByteWindow<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unread = &self.buffer[self.offset..self.offset_max];
        let shown = &unread[..unread.len().min(32)];
        f.debug_struct("ByteWindow")
            .field("position", &self.position())
            .field("window_left", &self.window_max.saturating_sub(self.offset))
            .field("unread", &BStr::new(shown))
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl<R> ByteWindow<R> {
    pub(crate) fn new(stream: R, window_len: usize, deadline: Option<Instant>) -> Self {
        Self {
            buffer: Vec::new(),
            offset: 0,
            offset_max: 0,
            window_max: window_len,
            stream: Some(stream),
            exhausted: false,
            window_len,
            base: 0,
            deadline,
        }
    }

    /// Absolute position of the cursor in the input stream.
    pub(crate) fn position(&self) -> u64 {
        self.base + self.offset as u64
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn past_compaction_point(&self) -> bool {
        self.offset >= COMPACT_AFTER
    }

    /// The whole buffer; handles index into it.
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.buffer[..self.offset_max]
    }

    pub(crate) fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.buffer[offset..offset + len]
    }

    /// Buffered bytes the reader may consume without crossing the ceiling.
    pub(crate) fn available(&self) -> &[u8] {
        let end = self.offset_max.min(self.window_max);
        &self.buffer[self.offset..end.max(self.offset)]
    }

    pub(crate) fn skip(&mut self, n: usize) {
        debug_assert!(self.offset + n <= self.offset_max.min(self.window_max));
        self.offset += n;
    }

    /// Steps the cursor back over bytes consumed in the current window.
    pub(crate) fn unread(&mut self, n: usize) {
        debug_assert!(n <= self.offset);
        self.offset -= n;
    }

    fn grow(&mut self, required: usize) {
        let new_len = (self.buffer.len() * 2)
            .max(required)
            .max(INITIAL_CAPACITY);
        trace!(from = self.buffer.len(), to = new_len, "growing byte window");
        self.buffer.resize(new_len, 0);
    }

    /// Moves the unread bytes to `offset` and sets the ceiling to
    /// `offset + length`.
    pub(crate) fn set_window(&mut self, offset: usize, length: usize) {
        if self.offset != offset {
            let unread = self.offset_max - self.offset;
            if offset + unread > self.buffer.len() {
                self.grow(offset + unread);
            }
            let position = self.position();
            self.buffer.copy_within(self.offset..self.offset_max, offset);
            self.base = position - offset as u64;
            self.offset = offset;
            self.offset_max = offset + unread;
        }
        self.window_max = offset.saturating_add(length);
        self.window_len = length;
    }

    pub(crate) fn reset(&mut self, stream: R) {
        self.offset = 0;
        self.offset_max = 0;
        self.base = 0;
        self.stream = Some(stream);
        self.exhausted = false;
    }

    /// Releases the stream and any oversized buffer.
    pub(crate) fn close(&mut self) {
        self.stream = None;
        self.exhausted = true;
        self.offset = 0;
        self.offset_max = 0;
        if self.buffer.len() > RETAINED_CAPACITY {
            trace!(from = self.buffer.len(), "shrinking byte window on close");
            self.buffer.truncate(RETAINED_CAPACITY);
            self.buffer.shrink_to(RETAINED_CAPACITY);
        }
    }

    pub(crate) fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    /// The quota error for a request that reaches past the ceiling.
    pub(crate) fn window_error(&self) -> ReaderError {
        ReaderError::new(
            QuotaError::MaxBytesPerReadExceeded(self.window_len),
            self.position(),
        )
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

impl<R: Read> ByteWindow<R> {
    pub(crate) fn peek_byte(&mut self) -> Result<Option<u8>, ReaderError> {
        self.peek_at(0)
    }

    /// Looks `index` bytes past the cursor. A look-ahead that hits the
    /// window ceiling is a quota error.
    pub(crate) fn peek_at(&mut self, index: usize) -> Result<Option<u8>, ReaderError> {
        match self.try_ensure(index + 1)? {
            Fill::Ready => Ok(Some(self.buffer[self.offset + index])),
            Fill::Eof => Ok(None),
            Fill::WindowFull => Err(self.window_error()),
        }
    }

    pub(crate) fn advance_and_get(&mut self, n: usize) -> Result<&[u8], ReaderError> {
        self.ensure(n)?;
        let start = self.offset;
        self.offset += n;
        Ok(&self.buffer[start..start + n])
    }

    /// Makes `n` bytes past the cursor available or fails.
    pub(crate) fn ensure(&mut self, n: usize) -> Result<(), ReaderError> {
        match self.try_ensure(n)? {
            Fill::Ready => Ok(()),
            Fill::Eof => Err(ReaderError::new(
                SyntaxError::UnexpectedEndOfFile,
                self.position(),
            )),
            Fill::WindowFull => Err(self.window_error()),
        }
    }

    /// Makes `n` bytes past the cursor available if the stream and the
    /// window allow it.
    pub(crate) fn try_ensure(&mut self, n: usize) -> Result<Fill, ReaderError> {
        let needed = self.offset.saturating_add(n);
        if needed <= self.offset_max && needed <= self.window_max {
            return Ok(Fill::Ready);
        }
        if needed > self.window_max {
            return Ok(Fill::WindowFull);
        }
        while self.offset_max < needed {
            if !self.fill(needed)? {
                return Ok(Fill::Eof);
            }
        }
        Ok(Fill::Ready)
    }

    /// Issues one read on the stream. Returns `false` once it is exhausted.
    fn fill(&mut self, needed: usize) -> Result<bool, ReaderError> {
        if self.exhausted {
            return Ok(false);
        }
        let position = self.position();
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ReaderError::new(ErrorSource::DeadlineExceeded, position));
        }
        let want = (needed - self.offset_max).max(READ_CHUNK);
        let required = self.offset_max + want;
        if required > self.buffer.len() {
            self.grow(required);
        }

        let Self {
            buffer,
            offset_max,
            stream,
            exhausted,
            ..
        } = self;
        let Some(stream) = stream.as_mut() else {
            *exhausted = true;
            return Ok(false);
        };
        let target = &mut buffer[*offset_max..*offset_max + want];
        loop {
            match stream.read(target) {
                Ok(0) => {
                    trace!("input stream exhausted");
                    *exhausted = true;
                    return Ok(false);
                }
                Ok(n) => {
                    *offset_max += n;
                    trace!(bytes = n, buffered = *offset_max, "refilled byte window");
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(ReaderError::new(e, position)),
            }
        }
    }
}
