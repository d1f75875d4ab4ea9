use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Category of measurement carried by a [`Sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Latency,
    ErrorCount,
    ReadCount,
    WriteCount,
    CommitCount,
    Invocation,
    Custom,
}

/// A single timestamped measurement, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Identifier of the execution stage that produced the measurement.
    pub origin: String,
    pub kind: MetricKind,
    pub value: f64,
    /// Wall-clock milliseconds.
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl Sample {
    #[must_use]
    pub fn new(origin: impl Into<String>, kind: MetricKind, value: f64, timestamp_ms: u64) -> Self {
        Self {
            origin: origin.into(),
            kind,
            value,
            timestamp_ms,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// A sample is ingestible only with a non-empty origin and a finite value.
    /// Malformed samples are silently skipped at every ingestion boundary and
    /// excluded from ingested-count totals.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.origin.is_empty() && self.value.is_finite()
    }
}

/// Percentile/latency statistics over one set of values.
///
/// All fields are zero when `count == 0`. When `count > 0` the fields honor
/// `min <= p50 <= p95 <= p99 <= max`; interpolation may yield `p95 == p99`
/// for small counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBundle {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub count: u64,
}

/// Which retention strategy produced an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    RingBuffer,
    Tumbling,
    Sliding,
}

/// Time coverage of the retained set at aggregation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub kind: WindowKind,
    pub start_ms: u64,
    pub end_ms: u64,
    pub sample_count: u64,
}

/// Full statistic bundle over the retained samples, recomputed fresh on
/// every query and never cached across mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub overall_latency: StatBundle,
    pub per_origin_latency: HashMap<String, StatBundle>,
    pub total_errors: u64,
    pub per_origin_errors: HashMap<String, u64>,
    pub total_invocations: u64,
    pub window: WindowInfo,
    pub computed_at_ms: u64,
}

/// Read-only view of a strategy's retained samples in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub samples: Vec<Sample>,
    pub start_ms: u64,
    pub end_ms: u64,
    pub size: u64,
    /// Valid samples accepted since construction or the last `clear()`.
    pub total_ingested: u64,
    /// Samples removed by the retention policy since construction or the
    /// last `clear()`.
    pub total_evicted: u64,
}
