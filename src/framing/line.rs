//! Newline-delimited frame decoder.

use bytes::Bytes;

use crate::error::PipeError;
use crate::framing::FrameDecoder;

/// Frames delimited by `\n`, with an optional `\r` before it.
///
/// The delimiter is consumed but not included in the frame. Payload bytes
/// are copied out of the input, so the decoder never holds a reference to
/// pipe memory past the call.
///
/// # Example
///
/// ```
/// use bytepipe::{FrameDecoder, LineDecoder};
///
/// let mut decoder = LineDecoder::new();
/// let (frame, used) = decoder.try_parse(b"hello\nworld")?.unwrap();
/// assert_eq!(&frame[..], b"hello");
/// assert_eq!(used, 6);
///
/// // No delimiter yet: ask for more data.
/// assert!(decoder.try_parse(b"world")?.is_none());
/// # Ok::<(), bytepipe::PipeError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDecoder {
    _private: (),
}

impl LineDecoder {
    /// Creates a line decoder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameDecoder for LineDecoder {
    type Frame = Bytes;

    fn try_parse(&mut self, buf: &[u8]) -> Result<Option<(Bytes, usize)>, PipeError> {
        let Some(newline) = buf.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };

        let mut line = &buf[..newline];
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        Ok(Some((Bytes::copy_from_slice(line), newline + 1)))
    }
}
