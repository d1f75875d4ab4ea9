//! Retention strategies: interchangeable bounded-memory sample stores.
//!
//! All three strategies honor one contract so consumers can swap retention
//! policies without changing query code. Query methods take `&mut self`
//! because the sliding strategy evicts lazily as a side effect of every
//! query.
mod ring;
mod sliding;
mod tumbling;


pub use ring::RingBuffer;
pub use sliding::SlidingWindow;
pub use tumbling::{ArchivedBucket, TumblingWindow};

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::RetentionConfig;
use crate::error::MetricsResult;
use crate::math;
use crate::types::{AggregateResult, MetricKind, Sample, StatBundle, WindowInfo, WindowKind};

/// Common contract over the three retention policies.
pub trait RetentionStrategy: Send {
    /// Accept one sample into the retained set, evicting per policy.
    /// Malformed samples (empty origin, non-finite value) are skipped.
    fn ingest(&mut self, sample: Sample);

    /// Statistics over all currently retained samples of `kind`.
    fn stats_of(&mut self, kind: MetricKind) -> StatBundle;

    /// Statistics over the retained samples of `kind` from one origin.
    fn origin_stats_of(&mut self, origin: &str, kind: MetricKind) -> StatBundle;

    /// Chronological view of the retained set plus cumulative counters.
    fn snapshot(&mut self) -> crate::types::WindowSnapshot;

    /// Full aggregate over the retained set, recomputed fresh per call.
    fn aggregate(&mut self) -> AggregateResult;

    /// Reset to the empty state without changing configuration.
    fn clear(&mut self);

    /// The configuration the strategy was built with.
    fn config(&self) -> RetentionConfig;
}

/// Build the strategy selected by `config`, using the system clock.
///
/// # Errors
///
/// Returns [`crate::error::MetricsError::InvalidConfig`] when the capacity
/// or duration is zero.
pub fn build_strategy(config: RetentionConfig) -> MetricsResult<Box<dyn RetentionStrategy>> {
    build_strategy_with_clock(config, Arc::new(SystemClock))
}

/// Build the strategy selected by `config` with an injected clock.
///
/// # Errors
///
/// Returns [`crate::error::MetricsError::InvalidConfig`] when the capacity
/// or duration is zero.
pub fn build_strategy_with_clock(
    config: RetentionConfig,
    clock: Arc<dyn Clock>,
) -> MetricsResult<Box<dyn RetentionStrategy>> {
    config.validate()?;
    let strategy: Box<dyn RetentionStrategy> = match config {
        RetentionConfig::RingBuffer { capacity } => {
            Box::new(RingBuffer::with_clock(capacity, clock)?)
        }
        RetentionConfig::Tumbling { bucket_duration_ms } => {
            Box::new(TumblingWindow::with_clock(bucket_duration_ms, clock)?)
        }
        RetentionConfig::Sliding { window_duration_ms } => {
            Box::new(SlidingWindow::with_clock(window_duration_ms, clock)?)
        }
    };
    Ok(strategy)
}

/// Assemble the full aggregate from one pass over the retained samples.
pub(crate) fn assemble_aggregate(
    samples: &[Sample],
    kind: WindowKind,
    start_ms: u64,
    end_ms: u64,
    computed_at_ms: u64,
) -> AggregateResult {
    let per_origin_errors = math::per_origin_error_counts_of(samples);
    let total_errors = per_origin_errors
        .values()
        .fold(0_u64, |total, count| total.saturating_add(*count));

    AggregateResult {
        overall_latency: math::stat_bundle_of(samples, MetricKind::Latency),
        per_origin_latency: math::per_origin_stats_of(samples, MetricKind::Latency),
        total_errors,
        per_origin_errors,
        total_invocations: math::invocation_count_of(samples),
        window: WindowInfo {
            kind,
            start_ms,
            end_ms,
            sample_count: samples.len() as u64,
        },
        computed_at_ms,
    }
}

/// Statistics over the samples of `kind` from one origin.
pub(crate) fn origin_bundle(samples: &[Sample], origin: &str, kind: MetricKind) -> StatBundle {
    let filtered: Vec<Sample> = samples
        .iter()
        .filter(|sample| sample.origin == origin)
        .cloned()
        .collect();
    math::stat_bundle_of(&filtered, kind)
}
