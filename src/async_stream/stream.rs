//! Stream adapter for frame decoding.
//!
//! This wraps a [`FrameReader`] in a `futures_core::Stream`, which is
//! runtime-agnostic and works with tokio, async-std, smol, or any
//! futures-compatible runtime.
//!
//! # Example
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use bytepipe::{frames, LineDecoder};
//!
//! async fn demo(reader: bytepipe::PipeReader) -> Result<(), bytepipe::PipeError> {
//!     let mut stream = frames(reader, LineDecoder::new());
//!
//!     while let Some(frame) = stream.next().await {
//!         let frame = frame?;
//!         println!("frame: {} bytes", frame.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_core::Stream;
use pin_project_lite::pin_project;

use crate::error::PipeError;
use crate::framing::{FrameDecoder, FrameReader, Step};
use crate::pipe::PipeReader;

pin_project! {
    /// A stream that yields decoded frames from a pipe.
    ///
    /// Ends after the first error or after a clean end of stream; later
    /// polls return `None`.
    pub struct FrameStream<D> {
        inner: FrameReader<D>,
        done: bool,
    }
}

impl<D: FrameDecoder> FrameStream<D> {
    /// Creates a frame stream with the default maximum frame size.
    pub fn new(reader: PipeReader, decoder: D) -> Self {
        Self {
            inner: FrameReader::new(reader, decoder),
            done: false,
        }
    }

    /// Sets the maximum number of bytes buffered while looking for a
    /// frame boundary.
    pub fn with_max_frame_size(mut self, bytes: usize) -> Self {
        self.inner = self.inner.with_max_frame_size(bytes);
        self
    }
}

impl<D: FrameDecoder> Stream for FrameStream<D> {
    type Item = Result<D::Frame, PipeError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        loop {
            let result = match ready!(this.inner.poll_read(cx)) {
                Ok(result) => result,
                Err(e) => {
                    *this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
            };

            match this.inner.process(result) {
                Ok(Step::Frame(frame)) => return Poll::Ready(Some(Ok(frame))),
                Ok(Step::NeedMore) => {}
                Ok(Step::Finished) => {
                    *this.done = true;
                    return Poll::Ready(None);
                }
                Err(e) => {
                    *this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
            }
        }
    }
}

/// Creates a stream of decoded frames from a pipe reader.
///
/// Equivalent to [`FrameReader`] driven as a `Stream`; see
/// [`FrameStream::with_max_frame_size`] for the buffering cap.
///
/// # Example
///
/// ```ignore
/// use futures_util::StreamExt;
/// use bytepipe::{frames, LineDecoder};
///
/// async fn demo(reader: bytepipe::PipeReader) -> Result<(), bytepipe::PipeError> {
///     let mut stream = frames(reader, LineDecoder::new());
///     while let Some(frame) = stream.next().await {
///         println!("frame {}", frame?.len());
///     }
///     Ok(())
/// }
/// ```
pub fn frames<D: FrameDecoder>(reader: PipeReader, decoder: D) -> FrameStream<D> {
    FrameStream::new(reader, decoder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::LineDecoder;
    use crate::pipe::pipe;
    use bytes::Bytes;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_frame_stream_empty() {
        let (writer, reader) = pipe();
        drop(writer);

        let stream = frames(reader, LineDecoder::new());
        let got: Vec<_> = stream.collect().await;
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn test_frame_stream_yields_lines() {
        let (mut writer, reader) = pipe();

        let buf = writer.get_buffer(8).unwrap();
        buf[..8].copy_from_slice(b"a\nbb\nc\n\n");
        writer.advance(8).unwrap();
        writer.flush().await.unwrap();
        writer.complete();

        let stream = frames(reader, LineDecoder::new());
        let got: Vec<Bytes> = stream.map(|f| f.unwrap()).collect().await;
        assert_eq!(
            got,
            vec![
                Bytes::from_static(b"a"),
                Bytes::from_static(b"bb"),
                Bytes::from_static(b"c"),
                Bytes::new(),
            ]
        );
    }

    #[tokio::test]
    async fn test_frame_stream_surfaces_incomplete_message() {
        let (mut writer, reader) = pipe();

        let buf = writer.get_buffer(3).unwrap();
        buf[..3].copy_from_slice(b"abc");
        writer.advance(3).unwrap();
        writer.flush().await.unwrap();
        writer.complete();

        let mut stream = frames(reader, LineDecoder::new());
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err, PipeError::IncompleteMessage { unconsumed: 3 });
        assert!(stream.next().await.is_none());
    }
}
