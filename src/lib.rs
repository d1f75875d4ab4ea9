//! Bounded-memory metric windowing and aggregation.
//!
//! This crate ingests timestamped numeric samples tagged by origin stage and
//! metric kind, retains a bounded subset under one of three interchangeable
//! retention strategies (fixed-count ring buffer, fixed-duration tumbling
//! buckets, continuous sliding time window), and computes interpolated
//! percentile statistics, error counts, and invocation counts over the
//! retained subset on demand. An event bridge adapts execution-lifecycle
//! notifications into samples for an injected strategy.
//!
//! All operations are synchronous and non-blocking. Each strategy or bridge
//! instance assumes a single logical caller at a time; sharing one instance
//! across threads requires external mutual exclusion (e.g. one mutex around
//! ingest and query, or one instance per producer merged downstream).
pub mod bridge;
pub mod clock;
pub mod config;
pub mod error;
pub mod logger;
pub mod math;
pub mod types;
pub mod window;

pub use bridge::{BridgeOptions, EventBridge, StageEnd, StageError, StageEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RetentionConfig;
pub use error::{MetricsError, MetricsResult};
pub use types::{
    AggregateResult, MetricKind, Sample, StatBundle, WindowInfo, WindowKind, WindowSnapshot,
};
pub use window::{
    ArchivedBucket, RetentionStrategy, RingBuffer, SlidingWindow, TumblingWindow, build_strategy,
    build_strategy_with_clock,
};
