//! Error types for bytepipe.

use std::fmt;
use std::io;

/// Errors that can occur while operating a pipe or a framing layer on top
/// of one.
///
/// Contract violations ([`PipeError::InvalidOperation`],
/// [`PipeError::InvalidCursor`], [`PipeError::InvalidConfig`]) indicate a
/// programming error and are returned by the offending call itself.
/// [`PipeError::Cancelled`], [`PipeError::Faulted`] and
/// [`PipeError::IncompleteMessage`] are expected runtime conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeError {
    /// An operation was called in a state that does not permit it, e.g.
    /// `advance` without a prior `get_buffer`, or reading again before the
    /// previous snapshot was returned with `advance_to`.
    InvalidOperation {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// A cursor or snapshot passed to `advance_to` was stale or out of
    /// order (consumed beyond examined, or examined beyond the snapshot).
    InvalidCursor {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// Invalid configuration parameter.
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// A pending read or flush was cancelled via a canceller handle.
    ///
    /// The pipe itself reports cancellation through flags on
    /// [`ReadResult`](crate::ReadResult) / [`FlushResult`](crate::FlushResult);
    /// this variant is used by layers (framing, I/O adapters) that have no
    /// flag to carry it on.
    Cancelled,

    /// The writer completed while unparsed bytes remained in the pipe.
    IncompleteMessage {
        /// Number of bytes left without a complete frame.
        unconsumed: usize,
    },

    /// Buffered bytes exceeded the framing layer's maximum frame size
    /// without a frame boundary being found.
    FrameTooLarge {
        /// The number of bytes buffered so far.
        actual: usize,
        /// The configured maximum frame size.
        max: usize,
    },

    /// The other side completed with an error, which is propagated to this
    /// side on its next operation.
    Faulted {
        /// The error message carried by the completing side.
        message: String,
    },
}

impl fmt::Display for PipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeError::InvalidOperation { message } => {
                write!(f, "invalid operation: {}", message)
            }
            PipeError::InvalidCursor { message } => {
                write!(f, "invalid cursor: {}", message)
            }
            PipeError::InvalidConfig { message } => {
                write!(f, "invalid config: {}", message)
            }
            PipeError::Cancelled => write!(f, "operation cancelled"),
            PipeError::IncompleteMessage { unconsumed } => {
                write!(
                    f,
                    "stream ended with {} unparsed bytes and no frame boundary",
                    unconsumed
                )
            }
            PipeError::FrameTooLarge { actual, max } => {
                write!(f, "frame too large: {} bytes buffered (max {})", actual, max)
            }
            PipeError::Faulted { message } => {
                write!(f, "pipe faulted: {}", message)
            }
        }
    }
}

impl std::error::Error for PipeError {}

impl From<PipeError> for io::Error {
    fn from(e: PipeError) -> Self {
        let kind = match &e {
            PipeError::Cancelled => io::ErrorKind::Interrupted,
            PipeError::IncompleteMessage { .. } => io::ErrorKind::UnexpectedEof,
            PipeError::Faulted { .. } => io::ErrorKind::BrokenPipe,
            PipeError::InvalidOperation { .. }
            | PipeError::InvalidCursor { .. }
            | PipeError::InvalidConfig { .. } => io::ErrorKind::InvalidInput,
            PipeError::FrameTooLarge { .. } => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PipeError::FrameTooLarge {
            actual: 100,
            max: 50,
        };
        assert!(err.to_string().contains("frame too large"));

        let err = PipeError::IncompleteMessage { unconsumed: 3 };
        assert!(err.to_string().contains("3 unparsed bytes"));
    }

    #[test]
    fn test_io_error_conversion() {
        let err: io::Error = PipeError::Cancelled.into();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);

        let err: io::Error = PipeError::Faulted {
            message: "boom".into(),
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_equality() {
        assert_eq!(PipeError::Cancelled, PipeError::Cancelled);
        assert_ne!(
            PipeError::InvalidOperation { message: "a" },
            PipeError::InvalidCursor { message: "a" }
        );
    }
}
