//! Async stream support for framing.
//!
//! This module exposes decoded frames as a `futures_core::Stream`, making
//! frame consumption compose with any futures-compatible runtime (tokio,
//! async-std, smol, ...).
//!
//! - [`frames`] - Creates a stream of decoded frames from a pipe reader
//!
//! This module requires the `async-io` feature to be enabled.

mod stream;

pub use stream::{FrameStream, frames};
