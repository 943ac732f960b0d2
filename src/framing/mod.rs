//! Message framing on top of a pipe.
//!
//! The pipe itself has no notion of message boundaries; this module
//! provides the consumer contract for layering one on:
//!
//! - [`FrameDecoder`] - a parser that either finds a complete frame or
//!   reports that it needs more data
//! - [`FrameReader`] - drives a [`PipeReader`](crate::PipeReader) with the
//!   consumed/examined contract, enforcing a maximum frame size and
//!   turning end-of-stream leftovers into an error
//! - [`LineDecoder`] - newline-delimited frames
//!
//! # Example
//!
//! ```no_run
//! use bytepipe::{FrameReader, LineDecoder};
//!
//! # async fn demo(reader: bytepipe::PipeReader) -> Result<(), bytepipe::PipeError> {
//! let mut frames = FrameReader::new(reader, LineDecoder::new());
//! while let Some(line) = frames.next_frame().await? {
//!     println!("{} bytes", line.len());
//! }
//! # Ok(())
//! # }
//! ```

mod line;

use std::fmt;

pub use line::LineDecoder;

use crate::error::PipeError;
use crate::pipe::{PipeReader, ReadBuf, ReadResult};

/// Default maximum frame size (1 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// A parser that recognizes frame boundaries in buffered bytes.
///
/// `try_parse` is handed the full unconsumed buffer. It must either return
/// a complete frame together with the number of bytes it occupied
/// (including any delimiter), or `None` to request more data. A decoder
/// must not retain any reference to the input beyond the call: if it needs
/// payload bytes later, it must copy them out.
///
/// A returned frame must consume at least one byte; a zero-byte "frame"
/// would never make progress and is rejected by the driving loop.
pub trait FrameDecoder {
    /// The decoded frame type.
    type Frame;

    /// Attempts to parse one complete frame from the front of `buf`.
    fn try_parse(&mut self, buf: &[u8]) -> Result<Option<(Self::Frame, usize)>, PipeError>;
}

/// Pulls complete frames out of a pipe.
///
/// `FrameReader` owns the pipe's reader endpoint and applies the
/// consumed/examined contract on the caller's behalf: a parsed frame is
/// consumed exactly, an incomplete buffer is examined to its end so the
/// next read waits for more data, and remaining bytes after a frame are
/// re-offered immediately.
///
/// Two failure policies are built in, because every consumer of a
/// boundary-less pipe needs them: end-of-stream with leftover bytes is
/// [`PipeError::IncompleteMessage`], and a buffer growing past
/// [`max frame size`](FrameReader::with_max_frame_size) without a boundary
/// is [`PipeError::FrameTooLarge`]. The pipe cannot cap a frame it knows
/// nothing about, so the cap lives here and is always on.
pub struct FrameReader<D> {
    reader: PipeReader,
    decoder: D,
    max_frame_size: usize,
}

impl<D: FrameDecoder> FrameReader<D> {
    /// Creates a frame reader with the default maximum frame size.
    pub fn new(reader: PipeReader, decoder: D) -> Self {
        Self {
            reader,
            decoder,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Sets the maximum number of bytes buffered while looking for a
    /// frame boundary.
    pub fn with_max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = bytes;
        self
    }

    /// Returns the next complete frame, or `None` at a clean end of
    /// stream.
    ///
    /// # Errors
    ///
    /// - [`PipeError::IncompleteMessage`] if the writer completed with
    ///   unparsed bytes left over
    /// - [`PipeError::FrameTooLarge`] if the buffer exceeds the maximum
    ///   frame size without a boundary
    /// - [`PipeError::Cancelled`] if the pending read was cancelled
    /// - [`PipeError::Faulted`] if the writer completed with an error
    pub async fn next_frame(&mut self) -> Result<Option<D::Frame>, PipeError> {
        loop {
            let result = self.reader.read().await?;
            match self.process(result)? {
                Step::Frame(frame) => return Ok(Some(frame)),
                Step::Finished => return Ok(None),
                Step::NeedMore => {}
            }
        }
    }

    /// Gives the reader endpoint back, dropping the decoder.
    pub fn into_inner(self) -> PipeReader {
        self.reader
    }

    #[cfg(feature = "async-io")]
    pub(crate) fn poll_read(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<ReadResult, PipeError>> {
        self.reader.poll_read(cx)
    }

    /// Handles one read result: parse, advance, classify.
    pub(crate) fn process(&mut self, result: ReadResult) -> Result<Step<D::Frame>, PipeError> {
        let completed = result.is_completed();
        let cancelled = result.is_cancelled();
        let buf = result.into_buffer();

        if cancelled {
            let start = buf.start();
            self.reader.advance_to(buf, start, start)?;
            return Err(PipeError::Cancelled);
        }

        let bytes = buf.to_bytes();
        match self.decoder.try_parse(&bytes)? {
            Some((frame, used)) => {
                if used == 0 || used > bytes.len() {
                    self.give_back(buf)?;
                    return Err(PipeError::InvalidOperation {
                        message: "decoder reported a frame length outside the buffer",
                    });
                }
                let consumed = buf.cursor(used)?;
                // Examined == consumed: if bytes remain, the next read
                // must return immediately so they can be parsed.
                self.reader.advance_to(buf, consumed, consumed)?;
                Ok(Step::Frame(frame))
            }
            None => {
                if completed {
                    let end = buf.end();
                    let start = buf.start();
                    self.reader.advance_to(buf, start, end)?;
                    if bytes.is_empty() {
                        Ok(Step::Finished)
                    } else {
                        Err(PipeError::IncompleteMessage {
                            unconsumed: bytes.len(),
                        })
                    }
                } else if bytes.len() > self.max_frame_size {
                    self.give_back(buf)?;
                    Err(PipeError::FrameTooLarge {
                        actual: bytes.len(),
                        max: self.max_frame_size,
                    })
                } else {
                    // Nothing new found; wait for more data.
                    self.give_back(buf)?;
                    Ok(Step::NeedMore)
                }
            }
        }
    }

    /// Consumes nothing, examines everything.
    fn give_back(&mut self, buf: ReadBuf) -> Result<(), PipeError> {
        let start = buf.start();
        let end = buf.end();
        self.reader.advance_to(buf, start, end)
    }
}

impl<D: fmt::Debug> fmt::Debug for FrameReader<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameReader")
            .field("decoder", &self.decoder)
            .field("max_frame_size", &self.max_frame_size)
            .finish_non_exhaustive()
    }
}

/// Outcome of processing one read result.
pub(crate) enum Step<F> {
    Frame(F),
    NeedMore,
    Finished,
}
