//! The pipe core and its two endpoints.
//!
//! - [`pipe`] / [`pipe_with`] - construct a connected writer/reader pair
//! - [`PipeWriter`] - get-memory/advance/flush endpoint with backpressure
//! - [`PipeReader`] - read/advance-to endpoint with consumed/examined
//!   cursors
//! - [`ReadBuf`] / [`Cursor`] - zero-copy snapshot of buffered bytes

mod buf;
mod reader;
mod state;
mod writer;

use std::sync::Arc;

pub use buf::{Cursor, FlushResult, ReadBuf, ReadResult};
pub use reader::{PipeReader, ReadCanceller};
pub use writer::{FlushCanceller, PipeWriter};

use crate::config::PipeConfig;
use crate::error::PipeError;
use state::PipeCore;

/// Creates a pipe with the default configuration.
///
/// # Example
///
/// ```
/// let (writer, reader) = bytepipe::pipe();
/// # drop((writer, reader));
/// ```
pub fn pipe() -> (PipeWriter, PipeReader) {
    build(PipeConfig::default())
}

/// Creates a pipe with an explicit configuration.
///
/// # Errors
///
/// Returns [`PipeError::InvalidConfig`] if the configuration does not
/// validate (see [`PipeConfig::validate`]).
///
/// # Example
///
/// ```
/// use bytepipe::{PipeConfig, pipe_with};
///
/// let config = PipeConfig::new(8 * 1024, 2 * 1024)?;
/// let (writer, reader) = pipe_with(config)?;
/// # drop((writer, reader));
/// # Ok::<(), bytepipe::PipeError>(())
/// ```
pub fn pipe_with(config: PipeConfig) -> Result<(PipeWriter, PipeReader), PipeError> {
    config.validate()?;
    Ok(build(config))
}

fn build(config: PipeConfig) -> (PipeWriter, PipeReader) {
    let core = Arc::new(PipeCore::new(&config));
    (PipeWriter::new(Arc::clone(&core)), PipeReader::new(core))
}
