//! Configuration for pipe behavior.
//!
//! - [`PipeConfig`] - Flow-control thresholds, segment sizing, pooling and
//!   wake-up scheduling
//!
//! # Example
//!
//! ```
//! use bytepipe::PipeConfig;
//!
//! // Custom thresholds: pause the writer at 8 KiB buffered, resume it
//! // once the reader has drained down to 2 KiB.
//! let config = PipeConfig::new(8 * 1024, 2 * 1024)?;
//!
//! // Builder pattern
//! let config = PipeConfig::default()
//!     .with_min_segment_size(16 * 1024)
//!     .with_max_pooled_segments(8);
//!
//! # Ok::<(), bytepipe::PipeError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::PipeError;
use crate::scheduler::{InlineScheduler, Scheduler};

/// Default pause threshold (64 KiB buffered pauses the writer).
pub const DEFAULT_PAUSE_THRESHOLD: usize = 64 * 1024;

/// Default resume threshold (32 KiB buffered resumes the writer).
pub const DEFAULT_RESUME_THRESHOLD: usize = 32 * 1024;

/// Default minimum segment size (4 KiB).
pub const DEFAULT_MIN_SEGMENT_SIZE: usize = 4 * 1024;

/// Default maximum number of segments retained by the pool.
pub const DEFAULT_MAX_POOLED_SEGMENTS: usize = 4;

/// Configuration for a pipe.
///
/// `PipeConfig` controls flow control, segment allocation and wake-up
/// dispatch:
///
/// - `pause_threshold` - a flush suspends once this many unconsumed bytes
///   are buffered
/// - `resume_threshold` - a suspended flush resumes once the reader drains
///   the buffer to at most this many bytes
/// - `min_segment_size` - smallest memory block handed to the writer
/// - `max_pooled_segments` - upper bound on blocks retained for reuse
/// - `scheduler` - strategy used to dispatch reader/writer wake-ups
///
/// # Constraints
///
/// `pause_threshold`, `resume_threshold` and `min_segment_size` must be
/// non-zero, and `resume_threshold` must be strictly less than
/// `pause_threshold`. The two-threshold hysteresis is what prevents
/// suspend/resume thrashing when the consumer hovers near the boundary;
/// equal or inverted thresholds are a configuration error.
#[derive(Clone)]
pub struct PipeConfig {
    /// Buffered-byte watermark that pauses the writer.
    pause_threshold: usize,

    /// Buffered-byte watermark that resumes a paused writer.
    resume_threshold: usize,

    /// Minimum size of a rented segment in bytes.
    min_segment_size: usize,

    /// Maximum number of free segments the pool retains.
    max_pooled_segments: usize,

    /// Wake-up dispatch strategy.
    scheduler: Arc<dyn Scheduler>,
}

impl PipeConfig {
    /// Creates a configuration with the given flow-control thresholds and
    /// defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidConfig`] if either threshold is zero or
    /// if `resume_threshold >= pause_threshold`.
    ///
    /// # Example
    ///
    /// ```
    /// use bytepipe::PipeConfig;
    ///
    /// let config = PipeConfig::new(8192, 4096)?;
    /// assert_eq!(config.pause_threshold(), 8192);
    /// # Ok::<(), bytepipe::PipeError>(())
    /// ```
    pub fn new(pause_threshold: usize, resume_threshold: usize) -> Result<Self, PipeError> {
        let config = Self {
            pause_threshold,
            resume_threshold,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the pause threshold.
    ///
    /// Note: This does not validate the configuration. Use
    /// [`PipeConfig::validate`] to check if the configuration is valid.
    pub fn with_pause_threshold(mut self, bytes: usize) -> Self {
        self.pause_threshold = bytes;
        self
    }

    /// Sets the resume threshold.
    ///
    /// Note: This does not validate the configuration. Use
    /// [`PipeConfig::validate`] to check if the configuration is valid.
    pub fn with_resume_threshold(mut self, bytes: usize) -> Self {
        self.resume_threshold = bytes;
        self
    }

    /// Sets the minimum segment size.
    ///
    /// Note: This does not validate the configuration. Use
    /// [`PipeConfig::validate`] to check if the configuration is valid.
    pub fn with_min_segment_size(mut self, bytes: usize) -> Self {
        self.min_segment_size = bytes;
        self
    }

    /// Sets the maximum number of segments retained by the pool.
    ///
    /// Zero disables pooling entirely; every consumed segment is freed.
    pub fn with_max_pooled_segments(mut self, segments: usize) -> Self {
        self.max_pooled_segments = segments;
        self
    }

    /// Sets the wake-up scheduler.
    ///
    /// # Example
    ///
    /// ```
    /// use bytepipe::{PipeConfig, ThreadScheduler};
    /// use std::sync::Arc;
    ///
    /// let config = PipeConfig::default()
    ///     .with_scheduler(Arc::new(ThreadScheduler::new()));
    /// ```
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Returns the pause threshold.
    pub fn pause_threshold(&self) -> usize {
        self.pause_threshold
    }

    /// Returns the resume threshold.
    pub fn resume_threshold(&self) -> usize {
        self.resume_threshold
    }

    /// Returns the minimum segment size.
    pub fn min_segment_size(&self) -> usize {
        self.min_segment_size
    }

    /// Returns the maximum number of pooled segments.
    pub fn max_pooled_segments(&self) -> usize {
        self.max_pooled_segments
    }

    /// Returns the wake-up scheduler.
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    /// Validates the current configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use bytepipe::PipeConfig;
    ///
    /// let config = PipeConfig::default().with_resume_threshold(usize::MAX);
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), PipeError> {
        if self.pause_threshold == 0 || self.resume_threshold == 0 {
            return Err(PipeError::InvalidConfig {
                message: "flow-control thresholds must be non-zero",
            });
        }

        if self.resume_threshold >= self.pause_threshold {
            return Err(PipeError::InvalidConfig {
                message: "resume_threshold must be strictly less than pause_threshold",
            });
        }

        if self.min_segment_size == 0 {
            return Err(PipeError::InvalidConfig {
                message: "min_segment_size must be non-zero",
            });
        }

        Ok(())
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            pause_threshold: DEFAULT_PAUSE_THRESHOLD,
            resume_threshold: DEFAULT_RESUME_THRESHOLD,
            min_segment_size: DEFAULT_MIN_SEGMENT_SIZE,
            max_pooled_segments: DEFAULT_MAX_POOLED_SEGMENTS,
            scheduler: Arc::new(InlineScheduler),
        }
    }
}

impl fmt::Debug for PipeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeConfig")
            .field("pause_threshold", &self.pause_threshold)
            .field("resume_threshold", &self.resume_threshold)
            .field("min_segment_size", &self.min_segment_size)
            .field("max_pooled_segments", &self.max_pooled_segments)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipeConfig::default();
        assert_eq!(config.pause_threshold(), DEFAULT_PAUSE_THRESHOLD);
        assert_eq!(config.resume_threshold(), DEFAULT_RESUME_THRESHOLD);
        assert_eq!(config.min_segment_size(), DEFAULT_MIN_SEGMENT_SIZE);
        assert_eq!(config.max_pooled_segments(), DEFAULT_MAX_POOLED_SEGMENTS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = PipeConfig::default()
            .with_pause_threshold(1024)
            .with_resume_threshold(512)
            .with_min_segment_size(128)
            .with_max_pooled_segments(2);

        assert_eq!(config.pause_threshold(), 1024);
        assert_eq!(config.resume_threshold(), 512);
        assert_eq!(config.min_segment_size(), 128);
        assert_eq!(config.max_pooled_segments(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_zero_thresholds() {
        assert!(PipeConfig::new(0, 0).is_err());
        assert!(PipeConfig::new(1024, 0).is_err());
    }

    #[test]
    fn test_invalid_resume_not_below_pause() {
        assert!(PipeConfig::new(1024, 1024).is_err());
        assert!(PipeConfig::new(1024, 2048).is_err());
    }

    #[test]
    fn test_invalid_zero_segment_size() {
        let config = PipeConfig::default().with_min_segment_size(0);
        assert!(config.validate().is_err());
    }
}
