//! Internal utility functions and helpers.
//!
//! This module contains small helper functions used throughout the crate.
//! It is an implementation detail and not part of the public API.

use bytes::Bytes;

/// Gathers a list of segments into one contiguous Bytes object.
///
/// This is used when a multi-segment snapshot needs to be presented to a
/// parser as a single slice.
pub(crate) fn gather(segments: &[Bytes]) -> Bytes {
    let total: usize = segments.iter().map(|s| s.len()).sum();
    let mut combined = Vec::with_capacity(total);
    for segment in segments {
        combined.extend_from_slice(segment);
    }
    Bytes::from(combined)
}
