//! Snapshot and result types handed out by the pipe.

use bytes::Bytes;

use crate::error::PipeError;
use crate::util;

/// A position in the stream of bytes flowing through one pipe.
///
/// Cursors are opaque and totally ordered, but only cursors derived from
/// the same pipe are comparable in any meaningful way; mixing cursors from
/// two pipes compares unrelated stream offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor {
    pos: u64,
}

impl Cursor {
    pub(crate) fn at(pos: u64) -> Self {
        Self { pos }
    }

    pub(crate) fn pos(self) -> u64 {
        self.pos
    }
}

/// An immutable view of the currently unconsumed bytes in a pipe.
///
/// A `ReadBuf` is a zero-copy snapshot over one or more buffered segments.
/// It is returned by [`PipeReader::read`](crate::PipeReader::read) and must
/// be given back, by value, to
/// [`PipeReader::advance_to`](crate::PipeReader::advance_to); ownership
/// transfer is what makes use-after-advance impossible to express.
///
/// # Example
///
/// ```no_run
/// # async fn demo(reader: &mut bytepipe::PipeReader) -> Result<(), bytepipe::PipeError> {
/// let result = reader.read().await?;
/// let buf = result.into_buffer();
/// let bytes = buf.to_bytes();
/// let consumed = buf.cursor(bytes.len())?;
/// reader.advance_to(buf, consumed, consumed)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReadBuf {
    segments: Vec<Bytes>,
    start: u64,
    len: usize,
    generation: u64,
}

impl ReadBuf {
    pub(crate) fn new(segments: Vec<Bytes>, start: u64, len: usize, generation: u64) -> Self {
        Self {
            segments,
            start,
            len,
            generation,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the number of bytes in the snapshot.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the snapshot holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cursor at the first byte of the snapshot.
    pub fn start(&self) -> Cursor {
        Cursor::at(self.start)
    }

    /// Cursor just past the last byte of the snapshot.
    pub fn end(&self) -> Cursor {
        Cursor::at(self.start + self.len as u64)
    }

    /// Cursor `offset` bytes past the start of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidCursor`] if `offset` is past the end of
    /// the snapshot.
    pub fn cursor(&self, offset: usize) -> Result<Cursor, PipeError> {
        if offset > self.len {
            return Err(PipeError::InvalidCursor {
                message: "cursor offset past the end of the snapshot",
            });
        }
        Ok(Cursor::at(self.start + offset as u64))
    }

    /// The underlying segments, in stream order.
    pub fn segments(&self) -> &[Bytes] {
        &self.segments
    }

    /// Returns the snapshot as one contiguous `Bytes`.
    ///
    /// Zero-copy when the snapshot spans a single segment; otherwise the
    /// segments are gathered into a fresh allocation.
    pub fn to_bytes(&self) -> Bytes {
        match self.segments.len() {
            0 => Bytes::new(),
            1 => self.segments[0].clone(),
            _ => util::gather(&self.segments),
        }
    }

    /// Copies as many bytes as fit into `dst`, starting at the beginning
    /// of the snapshot, and returns the number copied.
    pub fn copy_to_slice(&self, dst: &mut [u8]) -> usize {
        let mut copied = 0;
        for segment in &self.segments {
            if copied == dst.len() {
                break;
            }
            let n = segment.len().min(dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&segment[..n]);
            copied += n;
        }
        copied
    }
}

/// The outcome of a [`PipeReader::read`](crate::PipeReader::read) call.
#[derive(Debug)]
pub struct ReadResult {
    buf: ReadBuf,
    is_completed: bool,
    is_cancelled: bool,
}

impl ReadResult {
    pub(crate) fn new(buf: ReadBuf, is_completed: bool, is_cancelled: bool) -> Self {
        Self {
            buf,
            is_completed,
            is_cancelled,
        }
    }

    /// The snapshot of unconsumed bytes.
    pub fn buffer(&self) -> &ReadBuf {
        &self.buf
    }

    /// Consumes the result, returning the snapshot for `advance_to`.
    pub fn into_buffer(self) -> ReadBuf {
        self.buf
    }

    /// True if the writer has completed. Bytes still in the buffer remain
    /// readable; once they are consumed the stream is at its end.
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// True if this read was unblocked by
    /// [`ReadCanceller::cancel`](crate::ReadCanceller::cancel).
    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }
}

/// The outcome of a [`PipeWriter::flush`](crate::PipeWriter::flush) call.
#[derive(Debug, Clone, Copy)]
pub struct FlushResult {
    is_completed: bool,
    is_cancelled: bool,
}

impl FlushResult {
    pub(crate) fn new(is_completed: bool, is_cancelled: bool) -> Self {
        Self {
            is_completed,
            is_cancelled,
        }
    }

    /// True if the reader has completed; further writes will never be
    /// observed and the writer should stop.
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// True if this flush was unblocked by
    /// [`FlushCanceller::cancel`](crate::FlushCanceller::cancel).
    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }
}
