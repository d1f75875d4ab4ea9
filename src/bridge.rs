//! Bridges execution-lifecycle events into samples for an injected
//! retention strategy.
//!
//! The bridge also tracks cumulative counters (errors, invocations,
//! distinct origins observed) that are independent of retention: they keep
//! growing while the strategy evicts.
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{MetricKind, Sample};
use crate::window::RetentionStrategy;

/// Origin-start, read, write, and commit notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEvent {
    pub origin: String,
    pub timestamp_ms: u64,
}

/// Origin-end notification, optionally carrying a precomputed duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEnd {
    pub origin: String,
    pub timestamp_ms: u64,
    /// When absent, the duration is derived from the pending start
    /// timestamp recorded by the matching origin-start event.
    pub duration_ms: Option<u64>,
}

/// Error notification with optional context fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub origin: String,
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Per-category toggles for operation tracking. A disabled category's
/// events are accepted without error but produce no sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeOptions {
    pub track_reads: bool,
    pub track_writes: bool,
    pub track_commits: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            track_reads: true,
            track_writes: true,
            track_commits: true,
        }
    }
}

/// Per-sample callback invoked before the strategy ingests. A returned
/// error is counted and logged, never propagated.
pub type SampleHook = Box<dyn FnMut(&Sample) -> Result<(), String> + Send>;

/// Adapts lifecycle events into samples pushed to an injected strategy.
pub struct EventBridge {
    strategy: Box<dyn RetentionStrategy>,
    options: BridgeOptions,
    hook: Option<SampleHook>,
    pending_starts: HashMap<String, u64>,
    origins_seen: HashSet<String>,
    total_errors: u64,
    total_invocations: u64,
    hook_failures: u64,
}

impl EventBridge {
    #[must_use]
    pub fn new(strategy: Box<dyn RetentionStrategy>) -> Self {
        Self::with_options(strategy, BridgeOptions::default())
    }

    #[must_use]
    pub fn with_options(strategy: Box<dyn RetentionStrategy>, options: BridgeOptions) -> Self {
        Self {
            strategy,
            options,
            hook: None,
            pending_starts: HashMap::new(),
            origins_seen: HashSet::new(),
            total_errors: 0,
            total_invocations: 0,
            hook_failures: 0,
        }
    }

    /// Install a per-sample hook, replacing any previous one.
    #[must_use]
    pub fn with_hook(mut self, hook: SampleHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Records the pending start timestamp and counts an invocation. Emits
    /// no sample; the latency sample is produced by the matching end event.
    pub fn on_stage_start(&mut self, event: StageEvent) {
        self.origins_seen.insert(event.origin.clone());
        self.total_invocations = self.total_invocations.saturating_add(1);
        self.pending_starts.insert(event.origin, event.timestamp_ms);
    }

    /// Emits one latency sample: the explicit duration when supplied,
    /// otherwise end minus the pending start timestamp. The pending entry
    /// is consumed either way; without either source no sample is emitted.
    pub fn on_stage_end(&mut self, event: StageEnd) {
        self.origins_seen.insert(event.origin.clone());
        let started_ms = self.pending_starts.remove(&event.origin);
        let duration_ms = event
            .duration_ms
            .or_else(|| started_ms.map(|start| event.timestamp_ms.saturating_sub(start)));
        if let Some(duration) = duration_ms {
            let sample = Sample::new(
                event.origin,
                MetricKind::Latency,
                duration as f64,
                event.timestamp_ms,
            );
            self.emit(sample);
        } else {
            tracing::debug!("stage end without duration or pending start; no sample");
        }
    }

    /// Counts the error and emits a value-1 error sample carrying the
    /// event's context fields as metadata.
    pub fn on_error(&mut self, event: StageError) {
        self.origins_seen.insert(event.origin.clone());
        self.total_errors = self.total_errors.saturating_add(1);

        let mut metadata = BTreeMap::new();
        if let Some(error) = event.error {
            metadata.insert("error".to_owned(), error);
        }
        if let Some(operation) = event.operation {
            metadata.insert("operation".to_owned(), operation);
        }
        if let Some(path) = event.path {
            metadata.insert("path".to_owned(), path);
        }
        if let Some(key) = event.key {
            metadata.insert("key".to_owned(), key);
        }

        let mut sample = Sample::new(event.origin, MetricKind::ErrorCount, 1.0, event.timestamp_ms);
        if !metadata.is_empty() {
            sample = sample.with_metadata(metadata);
        }
        self.emit(sample);
    }

    pub fn on_read(&mut self, event: StageEvent) {
        let enabled = self.options.track_reads;
        self.on_operation(event, MetricKind::ReadCount, enabled);
    }

    pub fn on_write(&mut self, event: StageEvent) {
        let enabled = self.options.track_writes;
        self.on_operation(event, MetricKind::WriteCount, enabled);
    }

    pub fn on_commit(&mut self, event: StageEvent) {
        let enabled = self.options.track_commits;
        self.on_operation(event, MetricKind::CommitCount, enabled);
    }

    /// Clear the injected strategy and every bridge-local counter and map.
    pub fn reset_all(&mut self) {
        self.strategy.clear();
        self.pending_starts.clear();
        self.origins_seen.clear();
        self.total_errors = 0;
        self.total_invocations = 0;
        self.hook_failures = 0;
    }

    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.total_errors
    }

    #[must_use]
    pub fn total_invocations(&self) -> u64 {
        self.total_invocations
    }

    /// Hook invocations that returned an error since construction or the
    /// last `reset_all`.
    #[must_use]
    pub fn hook_failures(&self) -> u64 {
        self.hook_failures
    }

    #[must_use]
    pub fn origins_seen(&self) -> &HashSet<String> {
        &self.origins_seen
    }

    #[must_use]
    pub fn has_pending_start(&self, origin: &str) -> bool {
        self.pending_starts.contains_key(origin)
    }

    /// Access the injected strategy for queries.
    pub fn strategy_mut(&mut self) -> &mut dyn RetentionStrategy {
        &mut *self.strategy
    }

    fn on_operation(&mut self, event: StageEvent, kind: MetricKind, enabled: bool) {
        self.origins_seen.insert(event.origin.clone());
        if !enabled {
            return;
        }
        let sample = Sample::new(event.origin, kind, 1.0, event.timestamp_ms);
        self.emit(sample);
    }

    fn emit(&mut self, sample: Sample) {
        if let Some(hook) = self.hook.as_mut()
            && let Err(err) = hook(&sample)
        {
            self.hook_failures = self.hook_failures.saturating_add(1);
            tracing::warn!(error = %err, "sample hook failed; sample still ingested");
        }
        self.strategy.ingest(sample);
    }
}
