use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::config::RetentionConfig;
use crate::error::{MetricsError, MetricsResult};
use crate::math;
use crate::types::{AggregateResult, MetricKind, Sample, StatBundle, WindowKind, WindowSnapshot};

use super::{RetentionStrategy, assemble_aggregate, origin_bundle};

/// Archived buckets retained by default before the oldest is evicted.
pub const DEFAULT_MAX_ARCHIVED: usize = 64;

/// A closed bucket with its latency statistics precomputed at archival time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedBucket {
    pub start_ms: u64,
    pub end_ms: u64,
    pub samples: Vec<Sample>,
    pub latency: StatBundle,
}

impl ArchivedBucket {
    #[must_use]
    pub fn sample_count(&self) -> u64 {
        self.samples.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Fixed-duration, non-overlapping buckets: one active bucket accepting
/// samples plus a bounded FIFO of archived (closed) buckets.
///
/// Queries read only the active bucket; archived history is exposed via
/// [`TumblingWindow::archived`]. Bucket boundaries are contiguous: a sample
/// that skips whole bucket durations first archives each skipped duration
/// as an explicitly empty bucket, so downstream consumers always see
/// gap-free time coverage.
#[derive(Debug)]
pub struct TumblingWindow {
    bucket_duration_ms: u64,
    max_archived: usize,
    active: Vec<Sample>,
    active_start_ms: u64,
    archived: VecDeque<ArchivedBucket>,
    total_ingested: u64,
    total_evicted: u64,
    clock: Arc<dyn Clock>,
}

impl TumblingWindow {
    /// Create a tumbling window with `bucket_duration_ms` buckets. The
    /// active bucket opens at the current instant.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidConfig`] when the duration is zero.
    pub fn new(bucket_duration_ms: u64) -> MetricsResult<Self> {
        Self::with_clock(bucket_duration_ms, Arc::new(SystemClock))
    }

    /// Same as [`TumblingWindow::new`] with an injected clock driving the
    /// initial boundary, `flush`, and `clear`.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidConfig`] when the duration is zero.
    pub fn with_clock(bucket_duration_ms: u64, clock: Arc<dyn Clock>) -> MetricsResult<Self> {
        if bucket_duration_ms == 0 {
            return Err(MetricsError::InvalidConfig(
                "tumbling bucket duration must be > 0 ms".to_owned(),
            ));
        }
        let active_start_ms = clock.now_ms();
        Ok(Self {
            bucket_duration_ms,
            max_archived: DEFAULT_MAX_ARCHIVED,
            active: Vec::new(),
            active_start_ms,
            archived: VecDeque::new(),
            total_ingested: 0,
            total_evicted: 0,
            clock,
        })
    }

    /// Override the archived-bucket retention count.
    #[must_use]
    pub fn with_max_archived(mut self, max_archived: usize) -> Self {
        self.max_archived = max_archived;
        self.enforce_archive_cap();
        self
    }

    /// Archived buckets, oldest first.
    #[must_use]
    pub fn archived(&self) -> &VecDeque<ArchivedBucket> {
        &self.archived
    }

    /// Forcibly close the active bucket at the current instant regardless
    /// of elapsed duration, for shutdown/drain scenarios. A fresh active
    /// bucket opens at that instant.
    pub fn flush(&mut self) {
        let now_ms = self.clock.now_ms().max(self.active_start_ms);
        self.archive_active(now_ms);
        self.active_start_ms = now_ms;
    }

    /// Close the active bucket at `end_ms` and append it to the archive,
    /// even when empty (an empty bucket archives with the zero bundle).
    fn archive_active(&mut self, end_ms: u64) {
        let samples = std::mem::take(&mut self.active);
        let latency = math::stat_bundle_of(&samples, MetricKind::Latency);
        tracing::debug!(
            start_ms = self.active_start_ms,
            end_ms,
            samples = samples.len(),
            "archiving tumbling bucket"
        );
        self.archived.push_back(ArchivedBucket {
            start_ms: self.active_start_ms,
            end_ms,
            samples,
            latency,
        });
        self.enforce_archive_cap();
    }

    fn enforce_archive_cap(&mut self) {
        while self.archived.len() > self.max_archived {
            if let Some(evicted) = self.archived.pop_front() {
                self.total_evicted = self
                    .total_evicted
                    .saturating_add(evicted.sample_count());
                tracing::debug!(
                    start_ms = evicted.start_ms,
                    samples = evicted.sample_count(),
                    "evicted oldest archived bucket"
                );
            }
        }
    }

    /// Archive every whole bucket duration that `timestamp_ms` has passed,
    /// including skipped (empty) ones, so boundaries never jump.
    fn roll_to(&mut self, timestamp_ms: u64) {
        loop {
            let boundary = self.active_start_ms.saturating_add(self.bucket_duration_ms);
            if timestamp_ms < boundary {
                break;
            }
            self.archive_active(boundary);
            self.active_start_ms = boundary;
        }
    }
}

impl RetentionStrategy for TumblingWindow {
    fn ingest(&mut self, sample: Sample) {
        if !sample.is_valid() {
            tracing::debug!(origin = %sample.origin, "skipping malformed sample");
            return;
        }
        self.roll_to(sample.timestamp_ms);
        self.active.push(sample);
        self.total_ingested = self.total_ingested.saturating_add(1);
    }

    fn stats_of(&mut self, kind: MetricKind) -> StatBundle {
        math::stat_bundle_of(&self.active, kind)
    }

    fn origin_stats_of(&mut self, origin: &str, kind: MetricKind) -> StatBundle {
        origin_bundle(&self.active, origin, kind)
    }

    fn snapshot(&mut self) -> WindowSnapshot {
        WindowSnapshot {
            samples: self.active.clone(),
            start_ms: self.active_start_ms,
            end_ms: self.clock.now_ms().max(self.active_start_ms),
            size: self.active.len() as u64,
            total_ingested: self.total_ingested,
            total_evicted: self.total_evicted,
        }
    }

    fn aggregate(&mut self) -> AggregateResult {
        let now_ms = self.clock.now_ms();
        assemble_aggregate(
            &self.active,
            WindowKind::Tumbling,
            self.active_start_ms,
            now_ms.max(self.active_start_ms),
            now_ms,
        )
    }

    fn clear(&mut self) {
        self.active.clear();
        self.archived.clear();
        self.total_ingested = 0;
        self.total_evicted = 0;
        self.active_start_ms = self.clock.now_ms();
    }

    fn config(&self) -> RetentionConfig {
        RetentionConfig::Tumbling {
            bucket_duration_ms: self.bucket_duration_ms,
        }
    }
}
