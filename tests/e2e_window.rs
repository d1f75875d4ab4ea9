//! End-to-end scenarios over the public API: strategy construction from
//! config, retention semantics, bridge adaptation, and aggregate export.
use std::sync::Arc;

use winstats::{
    Clock, EventBridge, ManualClock, MetricKind, MetricsError, MetricsResult, RetentionConfig,
    RetentionStrategy, Sample, StageEnd, StageEvent, WindowKind, build_strategy,
    build_strategy_with_clock,
};

fn latency(origin: &str, value: f64, timestamp_ms: u64) -> Sample {
    Sample::new(origin, MetricKind::Latency, value, timestamp_ms)
}

fn close(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}

#[test]
fn ring_capacity_three_keeps_last_three_latencies() -> MetricsResult<()> {
    let mut strategy = build_strategy(RetentionConfig::RingBuffer { capacity: 3 })?;
    for (index, value) in [10.0, 20.0, 30.0, 40.0].iter().enumerate() {
        strategy.ingest(latency("A", *value, index as u64));
    }

    let bundle = strategy.stats_of(MetricKind::Latency);
    if bundle.count != 3 {
        return Err(MetricsError::Message(format!(
            "expected count 3, got {}",
            bundle.count
        )));
    }
    if close(bundle.min, 20.0) && close(bundle.max, 40.0) && close(bundle.p50, 30.0) {
        Ok(())
    } else {
        Err(MetricsError::Message(format!(
            "unexpected bundle: {:?}",
            bundle
        )))
    }
}

#[test]
fn bridge_start_end_derives_single_latency_sample() -> MetricsResult<()> {
    let strategy = build_strategy(RetentionConfig::RingBuffer { capacity: 16 })?;
    let mut bridge = EventBridge::new(strategy);

    bridge.on_stage_start(StageEvent {
        origin: "transform".to_owned(),
        timestamp_ms: 100,
    });
    bridge.on_stage_end(StageEnd {
        origin: "transform".to_owned(),
        timestamp_ms: 150,
        duration_ms: None,
    });

    if bridge.has_pending_start("transform") {
        return Err(MetricsError::Message(
            "pending start must be consumed".to_owned(),
        ));
    }
    if bridge.total_invocations() != 1 {
        return Err(MetricsError::Message(format!(
            "expected 1 invocation, got {}",
            bridge.total_invocations()
        )));
    }
    let bundle = bridge
        .strategy_mut()
        .origin_stats_of("transform", MetricKind::Latency);
    if bundle.count == 1 && close(bundle.min, 50.0) && close(bundle.max, 50.0) {
        Ok(())
    } else {
        Err(MetricsError::Message(format!(
            "expected one 50ms latency sample, got {:?}",
            bundle
        )))
    }
}

/// The retention contract is uniform: a consumer written against the trait
/// works unchanged across all three strategies.
#[test]
fn strategies_are_interchangeable_behind_the_contract() -> MetricsResult<()> {
    let clock = Arc::new(ManualClock::new(0));
    let configs = [
        RetentionConfig::RingBuffer { capacity: 8 },
        RetentionConfig::Tumbling {
            bucket_duration_ms: 60_000,
        },
        RetentionConfig::Sliding {
            window_duration_ms: 60_000,
        },
    ];

    for config in configs {
        let mut strategy =
            build_strategy_with_clock(config, Arc::clone(&clock) as Arc<dyn Clock>)?;
        strategy.ingest(latency("A", 10.0, 100));
        strategy.ingest(latency("A", 30.0, 200));
        clock.set(300);

        let bundle = strategy.stats_of(MetricKind::Latency);
        if bundle.count != 2 || !close(bundle.mean, 20.0) {
            return Err(MetricsError::Message(format!(
                "strategy {:?} broke the contract: {:?}",
                config, bundle
            )));
        }
        if strategy.config() != config {
            return Err(MetricsError::Message(format!(
                "config round-trip failed for {:?}",
                config
            )));
        }
        strategy.clear();
        if strategy.snapshot().size != 0 {
            return Err(MetricsError::Message(format!(
                "clear failed for {:?}",
                config
            )));
        }
    }
    Ok(())
}

#[test]
fn aggregate_is_idempotent_and_json_exportable() -> MetricsResult<()> {
    let clock = Arc::new(ManualClock::new(1_000));
    let mut strategy = build_strategy_with_clock(
        RetentionConfig::Sliding {
            window_duration_ms: 10_000,
        },
        Arc::clone(&clock) as Arc<dyn Clock>,
    )?;
    strategy.ingest(latency("A", 12.0, 500));
    strategy.ingest(Sample::new("A", MetricKind::ErrorCount, 1.0, 600));

    let first = strategy.aggregate();
    let second = strategy.aggregate();
    if first != second {
        return Err(MetricsError::Message(
            "aggregate must be idempotent with no intervening ingest".to_owned(),
        ));
    }
    if first.window.kind != WindowKind::Sliding || first.total_errors != 1 {
        return Err(MetricsError::Message(format!(
            "unexpected aggregate: {:?}",
            first
        )));
    }

    let json = serde_json::to_string(&first)
        .map_err(|err| MetricsError::Message(format!("serialize failed: {}", err)))?;
    if json.contains("\"overall_latency\"") && json.contains("\"total_errors\":1") {
        Ok(())
    } else {
        Err(MetricsError::Message(format!("unexpected json: {}", json)))
    }
}

#[test]
fn sliding_window_drops_sample_outside_duration() -> MetricsResult<()> {
    let clock = Arc::new(ManualClock::new(0));
    let mut strategy = build_strategy_with_clock(
        RetentionConfig::Sliding {
            window_duration_ms: 1_000,
        },
        Arc::clone(&clock) as Arc<dyn Clock>,
    )?;
    strategy.ingest(latency("A", 1.0, 0));
    strategy.ingest(latency("A", 2.0, 1_001));
    clock.set(1_001);

    let snapshot = strategy.snapshot();
    if snapshot.samples.len() != 1 {
        return Err(MetricsError::Message(format!(
            "expected the first sample evicted, held {}",
            snapshot.samples.len()
        )));
    }
    let survivor = snapshot
        .samples
        .first()
        .ok_or_else(|| MetricsError::Message("missing survivor".to_owned()))?;
    if close(survivor.value, 2.0) && snapshot.total_evicted == 1 {
        Ok(())
    } else {
        Err(MetricsError::Message(format!(
            "unexpected survivor {:?}, evicted {}",
            survivor, snapshot.total_evicted
        )))
    }
}
