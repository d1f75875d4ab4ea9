use std::collections::VecDeque;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::RetentionConfig;
use crate::error::{MetricsError, MetricsResult};
use crate::math;
use crate::types::{AggregateResult, MetricKind, Sample, StatBundle, WindowKind, WindowSnapshot};

use super::{RetentionStrategy, assemble_aggregate, origin_bundle};

/// Continuous time window: retains every sample whose timestamp is within
/// `window_duration_ms` of a reference instant.
///
/// Eviction is lazy. No background sweep runs; stale samples are removed
/// only as a side effect of `ingest` (reference = the incoming sample's
/// timestamp) and of every query (reference = the current instant). An
/// instance that receives no further calls retains stale samples
/// indefinitely until the next call, and a query after a long idle period
/// pays one O(stale count) batch eviction. This is documented behavior,
/// not a defect.
#[derive(Debug)]
pub struct SlidingWindow {
    window_duration_ms: u64,
    samples: VecDeque<Sample>,
    total_ingested: u64,
    total_evicted: u64,
    clock: Arc<dyn Clock>,
}

impl SlidingWindow {
    /// Create a sliding window spanning `window_duration_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidConfig`] when the duration is zero.
    pub fn new(window_duration_ms: u64) -> MetricsResult<Self> {
        Self::with_clock(window_duration_ms, Arc::new(SystemClock))
    }

    /// Same as [`SlidingWindow::new`] with an injected clock used as the
    /// query-side eviction reference.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidConfig`] when the duration is zero.
    pub fn with_clock(window_duration_ms: u64, clock: Arc<dyn Clock>) -> MetricsResult<Self> {
        if window_duration_ms == 0 {
            return Err(MetricsError::InvalidConfig(
                "sliding window duration must be > 0 ms".to_owned(),
            ));
        }
        Ok(Self {
            window_duration_ms,
            samples: VecDeque::new(),
            total_ingested: 0,
            total_evicted: 0,
            clock,
        })
    }

    /// Drop every sample strictly older than `reference - window_duration_ms`.
    /// Remaining samples keep their relative order.
    fn evict_older_than(&mut self, reference_ms: u64) {
        let cutoff = reference_ms.saturating_sub(self.window_duration_ms);
        let mut removed = 0_u64;
        while self
            .samples
            .front()
            .is_some_and(|sample| sample.timestamp_ms < cutoff)
        {
            self.samples.pop_front();
            removed = removed.saturating_add(1);
        }
        if removed > 0 {
            self.total_evicted = self.total_evicted.saturating_add(removed);
            tracing::debug!(removed, cutoff, "sliding window evicted stale samples");
        }
    }

    fn retained(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }
}

impl RetentionStrategy for SlidingWindow {
    fn ingest(&mut self, sample: Sample) {
        if !sample.is_valid() {
            tracing::debug!(origin = %sample.origin, "skipping malformed sample");
            return;
        }
        self.evict_older_than(sample.timestamp_ms);
        self.samples.push_back(sample);
        self.total_ingested = self.total_ingested.saturating_add(1);
    }

    fn stats_of(&mut self, kind: MetricKind) -> StatBundle {
        self.evict_older_than(self.clock.now_ms());
        math::stat_bundle_of(&self.retained(), kind)
    }

    fn origin_stats_of(&mut self, origin: &str, kind: MetricKind) -> StatBundle {
        self.evict_older_than(self.clock.now_ms());
        origin_bundle(&self.retained(), origin, kind)
    }

    fn snapshot(&mut self) -> WindowSnapshot {
        let now_ms = self.clock.now_ms();
        self.evict_older_than(now_ms);
        let samples = self.retained();
        WindowSnapshot {
            size: samples.len() as u64,
            samples,
            start_ms: now_ms.saturating_sub(self.window_duration_ms),
            end_ms: now_ms,
            total_ingested: self.total_ingested,
            total_evicted: self.total_evicted,
        }
    }

    fn aggregate(&mut self) -> AggregateResult {
        let now_ms = self.clock.now_ms();
        self.evict_older_than(now_ms);
        assemble_aggregate(
            &self.retained(),
            WindowKind::Sliding,
            now_ms.saturating_sub(self.window_duration_ms),
            now_ms,
            now_ms,
        )
    }

    fn clear(&mut self) {
        self.samples.clear();
        self.total_ingested = 0;
        self.total_evicted = 0;
    }

    fn config(&self) -> RetentionConfig {
        RetentionConfig::Sliding {
            window_duration_ms: self.window_duration_ms,
        }
    }
}
