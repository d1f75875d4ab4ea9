use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::RetentionConfig;
use crate::error::{MetricsError, MetricsResult};
use crate::math;
use crate::types::{AggregateResult, MetricKind, Sample, StatBundle, WindowKind, WindowSnapshot};

use super::{RetentionStrategy, assemble_aggregate, origin_bundle};

/// Fixed-capacity circular store: exactly `capacity` slots, oldest sample
/// overwritten once the buffer has filled.
#[derive(Debug)]
pub struct RingBuffer {
    slots: Vec<Option<Sample>>,
    cursor: usize,
    len: usize,
    total_ingested: u64,
    total_evicted: u64,
    clock: Arc<dyn Clock>,
}

impl RingBuffer {
    /// Create a ring buffer holding at most `capacity` samples.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidConfig`] when `capacity` is zero.
    pub fn new(capacity: usize) -> MetricsResult<Self> {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    /// Same as [`RingBuffer::new`] with an injected clock for `computed_at`
    /// stamps.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidConfig`] when `capacity` is zero.
    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> MetricsResult<Self> {
        if capacity == 0 {
            return Err(MetricsError::InvalidConfig(
                "ring buffer capacity must be > 0".to_owned(),
            ));
        }
        Ok(Self {
            slots: vec![None; capacity],
            cursor: 0,
            len: 0,
            total_ingested: 0,
            total_evicted: 0,
            clock,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Retained samples in logical chronological order. Before the buffer
    /// fills this is slot order; once full, the walk starts at the cursor
    /// (the oldest live slot) and wraps around to just behind it.
    fn chronological(&self) -> Vec<Sample> {
        if self.len < self.slots.len() {
            self.slots
                .iter()
                .take(self.len)
                .filter_map(Clone::clone)
                .collect()
        } else {
            let (behind, ahead) = self.slots.split_at(self.cursor);
            ahead
                .iter()
                .chain(behind.iter())
                .filter_map(Clone::clone)
                .collect()
        }
    }

    fn time_span(samples: &[Sample]) -> (u64, u64) {
        let start_ms = samples.first().map_or(0, |sample| sample.timestamp_ms);
        let end_ms = samples.last().map_or(0, |sample| sample.timestamp_ms);
        (start_ms, end_ms)
    }
}

impl RetentionStrategy for RingBuffer {
    fn ingest(&mut self, sample: Sample) {
        if !sample.is_valid() {
            tracing::debug!(origin = %sample.origin, "skipping malformed sample");
            return;
        }
        if self.len == self.slots.len() {
            self.total_evicted = self.total_evicted.saturating_add(1);
        }
        if let Some(slot) = self.slots.get_mut(self.cursor) {
            *slot = Some(sample);
        }
        self.cursor = self
            .cursor
            .saturating_add(1)
            .checked_rem(self.slots.len())
            .unwrap_or(0);
        self.len = self.len.saturating_add(1).min(self.slots.len());
        self.total_ingested = self.total_ingested.saturating_add(1);
    }

    fn stats_of(&mut self, kind: MetricKind) -> StatBundle {
        math::stat_bundle_of(&self.chronological(), kind)
    }

    fn origin_stats_of(&mut self, origin: &str, kind: MetricKind) -> StatBundle {
        origin_bundle(&self.chronological(), origin, kind)
    }

    fn snapshot(&mut self) -> WindowSnapshot {
        let samples = self.chronological();
        let (start_ms, end_ms) = Self::time_span(&samples);
        WindowSnapshot {
            size: samples.len() as u64,
            samples,
            start_ms,
            end_ms,
            total_ingested: self.total_ingested,
            total_evicted: self.total_evicted,
        }
    }

    fn aggregate(&mut self) -> AggregateResult {
        let samples = self.chronological();
        let (start_ms, end_ms) = Self::time_span(&samples);
        assemble_aggregate(
            &samples,
            WindowKind::RingBuffer,
            start_ms,
            end_ms,
            self.clock.now_ms(),
        )
    }

    fn clear(&mut self) {
        let capacity = self.slots.len();
        self.slots = vec![None; capacity];
        self.cursor = 0;
        self.len = 0;
        self.total_ingested = 0;
        self.total_evicted = 0;
    }

    fn config(&self) -> RetentionConfig {
        RetentionConfig::RingBuffer {
            capacity: self.slots.len(),
        }
    }
}
