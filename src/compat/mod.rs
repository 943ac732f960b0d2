//! futures-io compatibility adapters.
//!
//! These wrappers expose the two pipe endpoints as ordinary sequential
//! byte streams (`futures_io::AsyncRead` / `futures_io::AsyncWrite`),
//! keeping the consumed/examined contract and the flow-control thresholds
//! internal. They are runtime-agnostic; tokio users can bridge with
//! `tokio_util::compat`.
//!
//! - [`CompatReader`] - `AsyncRead` over a [`PipeReader`](crate::PipeReader)
//! - [`CompatWriter`] - `AsyncWrite` over a [`PipeWriter`](crate::PipeWriter)
//!
//! This module requires the `async-io` feature to be enabled.
//!
//! # Example
//!
//! ```ignore
//! use futures_util::io::{AsyncReadExt, AsyncWriteExt};
//!
//! async fn demo() -> std::io::Result<()> {
//!     let (writer, reader) = bytepipe::pipe();
//!     let mut writer = writer.into_async_write();
//!     let mut reader = reader.into_async_read();
//!
//!     writer.write_all(b"hello").await?;
//!     writer.close().await?;
//!
//!     let mut out = Vec::new();
//!     reader.read_to_end(&mut out).await?;
//!     assert_eq!(out, b"hello");
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_io::{AsyncRead, AsyncWrite};

use crate::pipe::{PipeReader, PipeWriter};

impl PipeReader {
    /// Wraps the reader in a `futures_io::AsyncRead` adapter.
    pub fn into_async_read(self) -> CompatReader {
        CompatReader { reader: self }
    }
}

impl PipeWriter {
    /// Wraps the writer in a `futures_io::AsyncWrite` adapter.
    pub fn into_async_write(self) -> CompatWriter {
        CompatWriter { writer: self }
    }
}

/// `futures_io::AsyncRead` over a pipe reader.
///
/// Each `poll_read` takes a snapshot, copies as much as fits into the
/// caller's buffer and consumes exactly that much, so unread bytes stay in
/// the pipe. An observed read cancellation surfaces as
/// `io::ErrorKind::Interrupted` (retryable). Dropping the adapter
/// completes the reader.
pub struct CompatReader {
    reader: PipeReader,
}

impl CompatReader {
    /// Gives the reader endpoint back.
    pub fn into_inner(self) -> PipeReader {
        self.reader
    }
}

impl AsyncRead for CompatReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        out: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if out.is_empty() {
            return Poll::Ready(Ok(0));
        }

        let result = match ready!(this.reader.poll_read(cx)) {
            Ok(result) => result,
            Err(e) => return Poll::Ready(Err(e.into())),
        };
        let cancelled = result.is_cancelled();
        let buf = result.into_buffer();

        if cancelled {
            let start = buf.start();
            if let Err(e) = this.reader.advance_to(buf, start, start) {
                return Poll::Ready(Err(e.into()));
            }
            return Poll::Ready(Err(io::ErrorKind::Interrupted.into()));
        }

        if buf.is_empty() {
            // Writer completed and everything is drained.
            let end = buf.end();
            if let Err(e) = this.reader.advance_to(buf, end, end) {
                return Poll::Ready(Err(e.into()));
            }
            return Poll::Ready(Ok(0));
        }

        let n = buf.copy_to_slice(out);
        let consumed = match buf.cursor(n) {
            Ok(cursor) => cursor,
            Err(e) => return Poll::Ready(Err(e.into())),
        };
        if let Err(e) = this.reader.advance_to(buf, consumed, consumed) {
            return Poll::Ready(Err(e.into()));
        }
        Poll::Ready(Ok(n))
    }
}

impl fmt::Debug for CompatReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompatReader").finish_non_exhaustive()
    }
}

/// `futures_io::AsyncWrite` over a pipe writer.
///
/// `poll_write` waits for the pipe to be below the pause threshold before
/// accepting bytes, then copies and publishes them in one step; a datum is
/// never half-accepted across a pending poll. Writing after the reader has
/// completed fails with `io::ErrorKind::BrokenPipe`; an observed flush
/// cancellation surfaces as `Interrupted`. `poll_close` completes the
/// writer.
pub struct CompatWriter {
    writer: PipeWriter,
}

impl CompatWriter {
    /// Gives the writer endpoint back.
    pub fn into_inner(self) -> PipeWriter {
        self.writer
    }
}

impl AsyncWrite for CompatWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if data.is_empty() {
            return Poll::Ready(Ok(0));
        }

        // Apply backpressure before accepting the bytes.
        let flush = match ready!(this.writer.poll_flush(cx)) {
            Ok(flush) => flush,
            Err(e) => return Poll::Ready(Err(e.into())),
        };
        if flush.is_completed() {
            return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
        }
        if flush.is_cancelled() {
            return Poll::Ready(Err(io::ErrorKind::Interrupted.into()));
        }

        let step = match this.writer.get_buffer(data.len()) {
            Ok(region) => {
                region[..data.len()].copy_from_slice(data);
                data.len()
            }
            Err(e) => return Poll::Ready(Err(e.into())),
        };
        if let Err(e) = this.writer.advance(step) {
            return Poll::Ready(Err(e.into()));
        }
        this.writer.commit();
        Poll::Ready(Ok(step))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match ready!(this.writer.poll_flush(cx)) {
            Ok(_) => Poll::Ready(Ok(())),
            Err(e) => Poll::Ready(Err(e.into())),
        }
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().writer.complete();
        Poll::Ready(Ok(()))
    }
}

impl fmt::Debug for CompatWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompatWriter").finish_non_exhaustive()
    }
}
