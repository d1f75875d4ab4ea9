//! Pure aggregate math shared by every retention strategy.
//!
//! Percentiles use fractional-rank linear interpolation over the ascending
//! sort of the matching values, so results between two samples are
//! interpolated rather than snapped to the nearest rank.
use std::collections::HashMap;

use crate::types::{MetricKind, Sample, StatBundle};

/// Interpolated percentile of an ascending-sorted sequence.
///
/// Returns 0 for empty input and the sole element for length 1. `p` is
/// clamped to `[0, 100]`; `p = 0` yields the minimum and `p = 100` the
/// maximum.
#[must_use]
pub fn percentile_of(sorted: &[f64], p: f64) -> f64 {
    let len = sorted.len();
    if len == 0 {
        return 0.0;
    }
    if len == 1 {
        return sorted.first().copied().unwrap_or(0.0);
    }

    let clamped = p.clamp(0.0, 100.0);
    let rank = clamped / 100.0 * (len.saturating_sub(1) as f64);
    let lo_rank = rank.floor();
    let lo = sorted.get(lo_rank as usize).copied().unwrap_or(0.0);
    let hi = sorted.get(rank.ceil() as usize).copied().unwrap_or(lo);
    lo + (hi - lo) * (rank - lo_rank)
}

/// Full statistic bundle over the samples matching `kind`.
///
/// Non-finite values are skipped; the all-zero bundle is returned when no
/// sample matches.
#[must_use]
pub fn stat_bundle_of(samples: &[Sample], kind: MetricKind) -> StatBundle {
    let values: Vec<f64> = samples
        .iter()
        .filter(|sample| sample.kind == kind && sample.value.is_finite())
        .map(|sample| sample.value)
        .collect();
    bundle_from_values(values)
}

/// Per-origin statistic bundles over the samples matching `kind`.
///
/// The result is an unordered mapping keyed by the distinct origins that
/// contributed at least one matching sample.
#[must_use]
pub fn per_origin_stats_of(samples: &[Sample], kind: MetricKind) -> HashMap<String, StatBundle> {
    let mut grouped: HashMap<String, Vec<f64>> = HashMap::new();
    for sample in samples {
        if sample.kind == kind && sample.value.is_finite() {
            grouped
                .entry(sample.origin.clone())
                .or_default()
                .push(sample.value);
        }
    }
    grouped
        .into_iter()
        .map(|(origin, values)| (origin, bundle_from_values(values)))
        .collect()
}

/// Per-origin sums of `ErrorCount` sample values.
#[must_use]
pub fn per_origin_error_counts_of(samples: &[Sample]) -> HashMap<String, u64> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for sample in samples {
        if sample.kind == MetricKind::ErrorCount {
            let entry = counts.entry(sample.origin.clone()).or_insert(0);
            *entry = entry.saturating_add(counted_value(sample.value));
        }
    }
    counts
}

/// Sum of `Invocation` sample values across all origins.
#[must_use]
pub fn invocation_count_of(samples: &[Sample]) -> u64 {
    samples
        .iter()
        .filter(|sample| sample.kind == MetricKind::Invocation)
        .fold(0_u64, |total, sample| {
            total.saturating_add(counted_value(sample.value))
        })
}

fn bundle_from_values(mut values: Vec<f64>) -> StatBundle {
    if values.is_empty() {
        return StatBundle::default();
    }
    values.sort_by(f64::total_cmp);

    let sum: f64 = values.iter().sum();
    let count = values.len() as u64;
    StatBundle {
        min: values.first().copied().unwrap_or(0.0),
        max: values.last().copied().unwrap_or(0.0),
        mean: sum / values.len() as f64,
        p50: percentile_of(&values, 50.0),
        p95: percentile_of(&values, 95.0),
        p99: percentile_of(&values, 99.0),
        count,
    }
}

/// Count-style sample values are rounded, with negatives clamped to zero.
fn counted_value(value: f64) -> u64 {
    if value.is_finite() { value.round().max(0.0) as u64 } else { 0 }
}
