//! Bounded segment pool for memory reuse between writer allocations.

use bytes::{Bytes, BytesMut};

/// Blocks larger than this multiple of the minimum segment size are never
/// retained; a single oversized write would otherwise pin its allocation
/// for the lifetime of the pipe.
const MAX_RETAIN_FACTOR: usize = 8;

/// A bounded free list of segment blocks.
///
/// The writer rents blocks here and the core releases consumed segments
/// back. A released segment is reclaimed only when its allocation is
/// uniquely owned (no snapshot still references it); otherwise it is freed
/// normally. The pool never retains more than `max_segments` blocks.
pub(crate) struct SegmentPool {
    free: Vec<BytesMut>,
    max_segments: usize,
    min_segment_size: usize,
}

impl SegmentPool {
    pub(crate) fn new(max_segments: usize, min_segment_size: usize) -> Self {
        Self {
            free: Vec::with_capacity(max_segments),
            max_segments,
            min_segment_size,
        }
    }

    /// Rents a writable block with at least `min` bytes of capacity,
    /// preferring a previously released block over a fresh allocation.
    pub(crate) fn rent(&mut self, min: usize) -> BytesMut {
        if let Some(i) = self.free.iter().position(|b| b.capacity() >= min) {
            return self.free.swap_remove(i);
        }
        BytesMut::with_capacity(min.max(self.min_segment_size))
    }

    /// Releases a consumed segment.
    ///
    /// Reclaims the allocation when this was the last reference to it and
    /// it fits the retention rules.
    pub(crate) fn release(&mut self, segment: Bytes) {
        if self.free.len() >= self.max_segments {
            return;
        }
        if let Ok(mut block) = segment.try_into_mut() {
            if block.capacity() == 0
                || block.capacity() > self.min_segment_size * MAX_RETAIN_FACTOR
            {
                return;
            }
            block.clear();
            self.free.push(block);
        }
    }

    /// Number of blocks currently retained.
    #[cfg(test)]
    pub(crate) fn retained(&self) -> usize {
        self.free.len()
    }
}
