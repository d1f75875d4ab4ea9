use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, MetricsResult};

/// Retention policy selection, fixed for the lifetime of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetentionConfig {
    /// Keep exactly the last `capacity` samples.
    RingBuffer { capacity: usize },
    /// Keep samples in fixed-duration, non-overlapping buckets.
    Tumbling { bucket_duration_ms: u64 },
    /// Keep samples no older than `window_duration_ms` from the reference
    /// instant, evicted lazily.
    Sliding { window_duration_ms: u64 },
}

impl RetentionConfig {
    /// Reject degenerate configurations before a strategy is built.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidConfig`] when the capacity or duration
    /// is zero.
    pub fn validate(self) -> MetricsResult<()> {
        match self {
            RetentionConfig::RingBuffer { capacity } => {
                if capacity == 0 {
                    return Err(MetricsError::InvalidConfig(
                        "ring buffer capacity must be > 0".to_owned(),
                    ));
                }
            }
            RetentionConfig::Tumbling { bucket_duration_ms } => {
                if bucket_duration_ms == 0 {
                    return Err(MetricsError::InvalidConfig(
                        "tumbling bucket duration must be > 0 ms".to_owned(),
                    ));
                }
            }
            RetentionConfig::Sliding { window_duration_ms } => {
                if window_duration_ms == 0 {
                    return Err(MetricsError::InvalidConfig(
                        "sliding window duration must be > 0 ms".to_owned(),
                    ));
                }
            }
        }
        Ok(())
    }
}
