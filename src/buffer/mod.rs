//! Internal segment management.
//!
//! This module provides the bounded pool that recycles segment memory
//! between writer allocations. It is an implementation detail and not part
//! of the public API.

mod pool;

pub(crate) use pool::SegmentPool;
