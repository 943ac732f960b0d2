//! The reader endpoint of a pipe.

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::error::PipeError;
use crate::pipe::buf::{Cursor, ReadBuf, ReadResult};
use crate::pipe::state::PipeCore;

/// The reading end of a pipe.
///
/// [`read`](PipeReader::read) hands out a zero-copy snapshot of everything
/// buffered and unconsumed; [`advance_to`](PipeReader::advance_to) gives
/// the snapshot back together with two cursors:
///
/// - *consumed* - bytes the caller is finished with; their segments become
///   eligible for reuse
/// - *examined* - bytes the caller has looked at; the next `read` suspends
///   until bytes beyond the examined position arrive
///
/// Examining to the snapshot's end means "wait for more data"; examining
/// only to the consumed cursor means "wake me again immediately if anything
/// is left". This is what lets a parser sit on an incomplete frame without
/// busy-spinning and without copying it out.
///
/// Dropping the reader completes it, so a producer flushing into an
/// abandoned pipe is never left suspended.
///
/// # Example
///
/// ```no_run
/// # async fn demo(reader: &mut bytepipe::PipeReader) -> Result<(), bytepipe::PipeError> {
/// loop {
///     let result = reader.read().await?;
///     let completed = result.is_completed();
///     let buf = result.into_buffer();
///     let data = buf.to_bytes();
///     // ... parse `data`, deciding how much was consumed ...
///     let consumed = buf.cursor(data.len())?;
///     reader.advance_to(buf, consumed, consumed)?;
///     if completed {
///         break;
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct PipeReader {
    core: Arc<PipeCore>,
    completed: bool,
}

impl PipeReader {
    pub(crate) fn new(core: Arc<PipeCore>) -> Self {
        Self {
            core,
            completed: false,
        }
    }

    /// Waits for unconsumed data and returns a snapshot of it.
    ///
    /// Resolves immediately when unexamined data is already buffered or
    /// the writer has completed; otherwise stays pending until the next
    /// flush, completion, or cancellation. Every successful read must be
    /// paired with an [`advance_to`](PipeReader::advance_to) before the
    /// next read.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidOperation`] if the previous snapshot was
    /// not returned with `advance_to`, or [`PipeError::Faulted`] if the
    /// writer completed with an error.
    pub async fn read(&mut self) -> Result<ReadResult, PipeError> {
        let core = Arc::clone(&self.core);
        std::future::poll_fn(move |cx| core.poll_read(cx)).await
    }

    /// Returns the snapshot and reports how much of it was consumed and
    /// examined.
    ///
    /// The snapshot is taken by value: once advanced, it can no longer be
    /// used, which is exactly the guarantee the segment pool needs before
    /// recycling consumed memory.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidCursor`] if the snapshot is stale or the
    /// cursors violate `start <= consumed <= examined <= end`.
    pub fn advance_to(
        &mut self,
        buf: ReadBuf,
        consumed: Cursor,
        examined: Cursor,
    ) -> Result<(), PipeError> {
        self.core.advance_to(&buf, consumed, examined)
    }

    /// Marks the reader finished.
    ///
    /// Buffered segments are recycled and any suspended flush resolves
    /// immediately, reporting completion to the writer. Calling `complete`
    /// more than once is a no-op.
    pub fn complete(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.core.complete_reader(None);
    }

    /// Marks the reader finished with an error.
    ///
    /// The writer's next flush fails with [`PipeError::Faulted`] carrying
    /// `message`. A no-op if the reader already completed.
    pub fn complete_with_error(&mut self, message: impl Into<String>) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.core.complete_reader(Some(message.into()));
    }

    /// Returns a handle that can unblock a pending
    /// [`read`](PipeReader::read) from another task.
    pub fn canceller(&self) -> ReadCanceller {
        ReadCanceller {
            core: Arc::clone(&self.core),
        }
    }

    pub(crate) fn poll_read(&mut self, cx: &mut Context<'_>) -> Poll<Result<ReadResult, PipeError>> {
        self.core.poll_read(cx)
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.complete();
    }
}

impl fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeReader")
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

/// Unblocks a pending [`PipeReader::read`] without completing the reader.
///
/// Obtained from [`PipeReader::canceller`]; cheap to clone and safe to use
/// from any thread. Cancellation is sticky: if no read is pending, the next
/// one resolves immediately with
/// [`is_cancelled`](crate::ReadResult::is_cancelled) set.
#[derive(Clone)]
pub struct ReadCanceller {
    core: Arc<PipeCore>,
}

impl ReadCanceller {
    /// Cancels the pending (or next) read.
    pub fn cancel(&self) {
        self.core.cancel_pending_read();
    }
}

impl fmt::Debug for ReadCanceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadCanceller").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::PipeError;
    use crate::pipe::pipe;

    #[test]
    fn test_read_returns_flushed_bytes() {
        let (mut writer, mut reader) = pipe();
        tokio_test::block_on(async {
            let buf = writer.get_buffer(5).unwrap();
            buf[..5].copy_from_slice(b"hello");
            writer.advance(5).unwrap();
            writer.flush().await.unwrap();

            let result = reader.read().await.unwrap();
            let buf = result.into_buffer();
            assert_eq!(&buf.to_bytes()[..], b"hello");
            let end = buf.end();
            reader.advance_to(buf, end, end).unwrap();
        });
    }

    #[test]
    fn test_double_read_without_advance() {
        let (mut writer, mut reader) = pipe();
        tokio_test::block_on(async {
            let buf = writer.get_buffer(1).unwrap();
            buf[0] = b'x';
            writer.advance(1).unwrap();
            writer.flush().await.unwrap();

            let result = reader.read().await.unwrap();
            assert!(matches!(
                reader.read().await,
                Err(PipeError::InvalidOperation { .. })
            ));
            drop(result);
        });
    }

    #[test]
    fn test_stale_snapshot_rejected() {
        let (mut writer, mut reader) = pipe();
        tokio_test::block_on(async {
            let buf = writer.get_buffer(2).unwrap();
            buf[..2].copy_from_slice(b"ab");
            writer.advance(2).unwrap();
            writer.flush().await.unwrap();

            let first = reader.read().await.unwrap().into_buffer();
            let stale = first.clone();
            let start = first.start();
            reader.advance_to(first, start, start).unwrap();

            // The clone survived the advance but its generation is stale.
            let (c, e) = (stale.start(), stale.end());
            assert!(matches!(
                reader.advance_to(stale, c, e),
                Err(PipeError::InvalidCursor { .. })
            ));
        });
    }
}
