//! The writer endpoint of a pipe.

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::BytesMut;

use crate::error::PipeError;
use crate::pipe::buf::FlushResult;
use crate::pipe::state::PipeCore;

/// The writing end of a pipe.
///
/// A writer fills memory obtained with [`get_buffer`](PipeWriter::get_buffer),
/// commits it with [`advance`](PipeWriter::advance), and publishes it to the
/// reader with [`flush`](PipeWriter::flush). When the amount of buffered,
/// unconsumed data reaches the pause threshold, `flush` suspends until the
/// reader drains the pipe below the resume threshold; this is how a fast
/// producer is slowed to match a slow consumer.
///
/// Dropping the writer completes it, so the reader always observes
/// end-of-stream.
///
/// # Example
///
/// ```no_run
/// # async fn demo(writer: &mut bytepipe::PipeWriter) -> Result<(), bytepipe::PipeError> {
/// let buf = writer.get_buffer(5)?;
/// buf[..5].copy_from_slice(b"hello");
/// writer.advance(5)?;
/// let result = writer.flush().await?;
/// if result.is_completed() {
///     // The reader is gone; stop producing.
/// }
/// # Ok(())
/// # }
/// ```
pub struct PipeWriter {
    core: Arc<PipeCore>,
    /// Writable tail block; `tail[..pending]` holds advanced-but-unflushed
    /// bytes.
    tail: BytesMut,
    pending: usize,
    /// Size of the region handed out by the last `get_buffer`; zero when no
    /// grant is outstanding.
    granted: usize,
    completed: bool,
}

impl PipeWriter {
    pub(crate) fn new(core: Arc<PipeCore>) -> Self {
        Self {
            core,
            tail: BytesMut::new(),
            pending: 0,
            granted: 0,
            completed: false,
        }
    }

    /// Returns a writable region of at least `size_hint` bytes (the
    /// configured minimum segment size if zero), renting a fresh segment
    /// from the pool when the current one is out of space.
    ///
    /// Calling `get_buffer` again without an intervening
    /// [`advance`](PipeWriter::advance) discards the previous grant.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidOperation`] if the writer has completed.
    pub fn get_buffer(&mut self, size_hint: usize) -> Result<&mut [u8], PipeError> {
        if self.completed {
            return Err(PipeError::InvalidOperation {
                message: "write after writer completed",
            });
        }

        let need = if size_hint == 0 {
            self.core.min_segment_size()
        } else {
            size_hint
        };

        if self.tail.capacity() - self.pending < need {
            if self.pending == 0 {
                self.tail = self.core.rent(need);
            } else {
                self.tail.truncate(self.pending);
                self.tail.reserve(need);
            }
        }

        // Grant the whole spare region; callers may write less.
        let grant = self.tail.capacity() - self.pending;
        self.tail.resize(self.pending + grant, 0);
        self.granted = grant;
        Ok(&mut self.tail[self.pending..])
    }

    /// Commits the first `n` bytes of the region returned by the last
    /// [`get_buffer`](PipeWriter::get_buffer). Committed bytes are not
    /// visible to the reader until the next [`flush`](PipeWriter::flush).
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidOperation`] if no grant is outstanding
    /// or `n` exceeds the granted region.
    pub fn advance(&mut self, n: usize) -> Result<(), PipeError> {
        if self.completed {
            return Err(PipeError::InvalidOperation {
                message: "write after writer completed",
            });
        }
        if self.granted == 0 {
            return Err(PipeError::InvalidOperation {
                message: "advance without a prior get_buffer",
            });
        }
        if n > self.granted {
            return Err(PipeError::InvalidOperation {
                message: "advance beyond the granted region",
            });
        }

        self.tail.truncate(self.pending + n);
        self.pending += n;
        self.granted = 0;
        Ok(())
    }

    /// Publishes all advanced bytes to the reader and applies flow control.
    ///
    /// Resolves immediately while the pipe is below the pause threshold.
    /// Once buffered, unconsumed bytes reach it, the future stays pending
    /// until the reader drains the pipe to the resume threshold, the reader
    /// completes, or the flush is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidOperation`] if the writer has completed,
    /// or [`PipeError::Faulted`] if the reader completed with an error.
    pub async fn flush(&mut self) -> Result<FlushResult, PipeError> {
        if self.completed {
            return Err(PipeError::InvalidOperation {
                message: "flush after writer completed",
            });
        }
        self.commit();
        let core = Arc::clone(&self.core);
        std::future::poll_fn(move |cx| core.poll_flush(cx)).await
    }

    /// Marks the writer finished and publishes any advanced bytes.
    ///
    /// The reader can still drain everything already flushed; its next
    /// read past the buffered data reports completion. Calling `complete`
    /// more than once is a no-op.
    pub fn complete(&mut self) {
        if self.completed {
            return;
        }
        self.commit();
        self.completed = true;
        self.core.complete_writer(None);
    }

    /// Marks the writer finished with an error.
    ///
    /// Advanced-but-unflushed bytes are discarded; the reader's next read
    /// fails with [`PipeError::Faulted`] carrying `message`. A no-op if the
    /// writer already completed.
    pub fn complete_with_error(&mut self, message: impl Into<String>) {
        if self.completed {
            return;
        }
        self.tail.clear();
        self.pending = 0;
        self.granted = 0;
        self.completed = true;
        self.core.complete_writer(Some(message.into()));
    }

    /// Returns a handle that can unblock a pending
    /// [`flush`](PipeWriter::flush) from another task.
    pub fn canceller(&self) -> FlushCanceller {
        FlushCanceller {
            core: Arc::clone(&self.core),
        }
    }

    /// Publishes advanced bytes without waiting on flow control.
    pub(crate) fn commit(&mut self) {
        if self.granted > 0 {
            self.tail.truncate(self.pending);
            self.granted = 0;
        }
        if self.pending > 0 {
            let segment = self.tail.split_to(self.pending).freeze();
            self.pending = 0;
            self.core.commit(segment);
        }
    }

    pub(crate) fn poll_flush(&mut self, cx: &mut Context<'_>) -> Poll<Result<FlushResult, PipeError>> {
        self.core.poll_flush(cx)
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.complete();
    }
}

impl fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeWriter")
            .field("pending", &self.pending)
            .field("granted", &self.granted)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

/// Unblocks a pending [`PipeWriter::flush`] without completing the writer.
///
/// Obtained from [`PipeWriter::canceller`]; cheap to clone and safe to use
/// from any thread. Cancellation is sticky: if no flush is pending, the
/// next one resolves immediately with
/// [`is_cancelled`](FlushResult::is_cancelled) set.
#[derive(Clone)]
pub struct FlushCanceller {
    core: Arc<PipeCore>,
}

impl FlushCanceller {
    /// Cancels the pending (or next) flush.
    pub fn cancel(&self) {
        self.core.cancel_pending_flush();
    }
}

impl fmt::Debug for FlushCanceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlushCanceller").finish_non_exhaustive()
    }
}
