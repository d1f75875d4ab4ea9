//! Property-based tests for aggregate math and retention invariants:
//! percentile bounds, stat-bundle ordering, ring-buffer retention counts,
//! and sliding-window eviction.
use std::sync::Arc;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use winstats::{
    ManualClock, MetricKind, RetentionConfig, RetentionStrategy, Sample, SlidingWindow,
    build_strategy, math,
};

const EPSILON: f64 = 1e-9;

fn arb_sorted_values(min_len: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(0.0_f64..1_000_000.0, min_len..64).prop_map(|mut values| {
        values.sort_by(f64::total_cmp);
        values
    })
}

proptest! {
    #[test]
    fn percentile_stays_within_min_and_max(sorted in arb_sorted_values(2), p in 0.0_f64..=100.0) {
        let min = sorted.first().copied().unwrap_or(0.0);
        let max = sorted.last().copied().unwrap_or(0.0);

        let value = math::percentile_of(&sorted, p);
        prop_assert!(value >= min - EPSILON, "p{} = {} below min {}", p, value, min);
        prop_assert!(value <= max + EPSILON, "p{} = {} above max {}", p, value, max);

        prop_assert!((math::percentile_of(&sorted, 0.0) - min).abs() < EPSILON);
        prop_assert!((math::percentile_of(&sorted, 100.0) - max).abs() < EPSILON);
    }

    #[test]
    fn stat_bundle_percentiles_are_ordered(values in proptest::collection::vec(0.0_f64..1_000_000.0, 1..64)) {
        let samples: Vec<Sample> = values
            .iter()
            .enumerate()
            .map(|(index, value)| Sample::new("stage", MetricKind::Latency, *value, index as u64))
            .collect();

        let bundle = math::stat_bundle_of(&samples, MetricKind::Latency);
        prop_assert_eq!(bundle.count, values.len() as u64);
        prop_assert!(bundle.min <= bundle.p50 + EPSILON);
        prop_assert!(bundle.p50 <= bundle.p95 + EPSILON);
        prop_assert!(bundle.p95 <= bundle.p99 + EPSILON);
        prop_assert!(bundle.p99 <= bundle.max + EPSILON);
        prop_assert!(bundle.mean >= bundle.min - EPSILON && bundle.mean <= bundle.max + EPSILON);
    }

    #[test]
    fn ring_retains_exactly_the_last_capacity_samples(capacity in 1_usize..32, extra in 1_usize..32) {
        let mut strategy = match build_strategy(RetentionConfig::RingBuffer { capacity }) {
            Ok(strategy) => strategy,
            Err(err) => return Err(TestCaseError::fail(err.to_string())),
        };

        let total = capacity.saturating_add(extra);
        for index in 0..total {
            strategy.ingest(Sample::new(
                "stage",
                MetricKind::Latency,
                index as f64,
                index as u64,
            ));
        }

        let snapshot = strategy.snapshot();
        prop_assert_eq!(snapshot.size, capacity as u64);
        prop_assert_eq!(snapshot.total_evicted, extra as u64);
        prop_assert_eq!(snapshot.total_ingested, total as u64);

        // Chronological order: the oldest survivor is the first overwritten-past
        // sample, values strictly ascending to the newest.
        for (offset, sample) in snapshot.samples.iter().enumerate() {
            let expected = total.saturating_sub(capacity).saturating_add(offset) as f64;
            prop_assert!(
                (sample.value - expected).abs() < EPSILON,
                "slot {}: expected {}, got {}",
                offset,
                expected,
                sample.value
            );
        }
    }

    #[test]
    fn sliding_ingest_evicts_everything_older_than_the_window(
        window_ms in 1_u64..10_000,
        gap in 1_u64..1_000,
    ) {
        let clock = Arc::new(ManualClock::new(0));
        let mut window = match SlidingWindow::with_clock(window_ms, clock.clone()) {
            Ok(window) => window,
            Err(err) => return Err(TestCaseError::fail(err.to_string())),
        };

        window.ingest(Sample::new("stage", MetricKind::Latency, 1.0, 0));
        let newer_ts = window_ms.saturating_add(gap);
        window.ingest(Sample::new("stage", MetricKind::Latency, 2.0, newer_ts));
        clock.set(newer_ts);

        let snapshot = window.snapshot();
        prop_assert_eq!(snapshot.samples.len(), 1);
        prop_assert_eq!(snapshot.total_evicted, 1);
        let survivor = snapshot.samples.first().map_or(0.0, |sample| sample.value);
        prop_assert!((survivor - 2.0).abs() < EPSILON);
    }
}
