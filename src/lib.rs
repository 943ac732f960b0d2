//! bytepipe
//!
//! A buffered, backpressure-aware in-memory byte pipe for Rust.
//!
//! `bytepipe` connects one producer and one consumer through a pooled
//! segment chain. The writer borrows memory, fills it in place and
//! publishes it with an awaitable flush; the reader inspects buffered
//! bytes without copying and reports separately how much it consumed and
//! how much it examined. Flow control is built in: flushes pause once the
//! unconsumed backlog crosses a threshold and resume after the reader
//! drains below a lower one.
//!
//! It is designed as a small, composable primitive for:
//!
//! - protocol parsers that read more than they consume
//! - producer/consumer stages inside one process
//! - message framing over a boundary-less byte stream
//!
//! The crate intentionally:
//! - does NOT touch files, sockets or any I/O device
//! - does NOT spawn tasks or bind to a runtime
//! - does NOT support multiple writers or multiple readers
//!
//! It only does one thing: **write bytes → buffer → read bytes**
//!
//! # Pipe
//!
//! ```no_run
//! use bytepipe::pipe;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bytepipe::PipeError> {
//!     let (mut writer, mut reader) = pipe();
//!
//!     let data = b"hello";
//!     let buf = writer.get_buffer(data.len())?;
//!     buf[..data.len()].copy_from_slice(data);
//!     writer.advance(data.len())?;
//!     writer.flush().await?;
//!     writer.complete();
//!
//!     let result = reader.read().await?;
//!     let buf = result.into_buffer();
//!     let end = buf.end();
//!     println!("{} bytes buffered", buf.len());
//!     reader.advance_to(buf, end, end)?;
//!     Ok(())
//! }
//! ```
//!
//! # Framing (feature = "async-io")
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use bytepipe::{frames, LineDecoder};
//!
//! async fn demo(reader: bytepipe::PipeReader) -> Result<(), bytepipe::PipeError> {
//!     let mut lines = frames(reader, LineDecoder::new());
//!
//!     while let Some(line) = lines.next().await {
//!         let line = line?;
//!         println!("line {} bytes", line.len());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod framing;
mod pipe;
mod scheduler;

mod buffer; // internal (segment reuse)
mod util; // internal (segment gathering)

#[cfg(feature = "async-io")]
mod async_stream;
#[cfg(feature = "async-io")]
mod compat;

//
// Public surface (intentionally tiny)
//

pub use config::{
    DEFAULT_MAX_POOLED_SEGMENTS, DEFAULT_MIN_SEGMENT_SIZE, DEFAULT_PAUSE_THRESHOLD,
    DEFAULT_RESUME_THRESHOLD, PipeConfig,
};
pub use error::PipeError;
pub use framing::{DEFAULT_MAX_FRAME_SIZE, FrameDecoder, FrameReader, LineDecoder};
pub use pipe::{
    Cursor, FlushCanceller, FlushResult, PipeReader, PipeWriter, ReadBuf, ReadCanceller,
    ReadResult, pipe, pipe_with,
};
pub use scheduler::{InlineScheduler, Scheduler, Task, ThreadScheduler};

#[cfg(feature = "async-io")]
pub use async_stream::{FrameStream, frames};
#[cfg(feature = "async-io")]
pub use compat::{CompatReader, CompatWriter};
