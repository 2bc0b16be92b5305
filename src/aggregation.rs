// Time-bucketed aggregation: pure functions over an immutable sample set.
// One output row per (bucket start, metric type) with at least one sample,
// ordered by bucket start, then metric type declaration order.
//
// Percentiles use nearest rank: sort ascending, take the value at 1-indexed
// rank ceil(p * n / 100), clamped to [1, n]. For [100, 200] that gives p50 = 100.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{AggregatedMetric, BucketGranularity, MetricFilter, MetricSample, MetricType};

/// Aggregated rows plus the number of in-window samples dropped as malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationReport {
    pub metrics: Vec<AggregatedMetric>,
    pub skipped: usize,
}

/// Aggregates `samples` with `recorded_at` in `[from, to)` matching `filter`.
/// Fails with `InvalidRange` when `from > to`; an empty window yields an empty list.
pub fn aggregate(
    samples: &[MetricSample],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    granularity: BucketGranularity,
    filter: &MetricFilter,
) -> Result<Vec<AggregatedMetric>> {
    aggregate_with_report(samples, from, to, granularity, filter).map(|r| r.metrics)
}

/// Same as `aggregate`, also reporting how many samples were excluded.
/// Samples with a negative or non-finite value are logged and skipped; they never abort the batch.
pub fn aggregate_with_report(
    samples: &[MetricSample],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    granularity: BucketGranularity,
    filter: &MetricFilter,
) -> Result<AggregationReport> {
    if from > to {
        return Err(Error::InvalidRange { from, to });
    }

    let mut buckets: BTreeMap<(DateTime<Utc>, MetricType), Vec<f64>> = BTreeMap::new();
    let mut skipped = 0usize;

    for s in samples {
        if s.recorded_at < from || s.recorded_at >= to || !filter.matches(s) {
            continue;
        }
        if !s.value.is_finite() || s.value < 0.0 {
            warn!(
                service_id = %s.service_id,
                metric_type = %s.metric_type,
                value = s.value,
                operation = "aggregate",
                "skipping malformed sample"
            );
            skipped += 1;
            continue;
        }
        buckets
            .entry((bucket_start(s.recorded_at, granularity), s.metric_type))
            .or_default()
            .push(s.value);
    }

    let metrics = buckets
        .into_iter()
        .filter_map(|((time, metric_type), mut values)| {
            summarize(&mut values, time, metric_type)
        })
        .collect();

    Ok(AggregationReport { metrics, skipped })
}

/// Floors `at` to the start of its minute, hour or day (UTC epoch based).
pub fn bucket_start(at: DateTime<Utc>, granularity: BucketGranularity) -> DateTime<Utc> {
    let width = granularity.width_ms();
    let floored = at.timestamp_millis().div_euclid(width) * width;
    DateTime::from_timestamp_millis(floored).unwrap_or(at)
}

/// Nearest-rank percentile of an ascending slice. `pct` is in 0..=100. `None` when empty.
pub fn percentile(sorted: &[f64], pct: u32) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len() as u64;
    let rank = (u64::from(pct.min(100)) * n).div_ceil(100).clamp(1, n);
    sorted.get((rank - 1) as usize).copied()
}

/// Builds one row from a bucket's values. Sorts in place; `None` for an empty bucket.
fn summarize(
    values: &mut [f64],
    time: DateTime<Utc>,
    metric_type: MetricType,
) -> Option<AggregatedMetric> {
    values.sort_by(f64::total_cmp);
    let min = *values.first()?;
    let max = *values.last()?;
    // Summing the sorted values keeps the mean independent of input order.
    let avg = mean_f64(values).clamp(min, max);

    Some(AggregatedMetric {
        time,
        metric_type,
        count: values.len() as u64,
        min,
        max,
        avg,
        p50: percentile(values, 50)?,
        p95: percentile(values, 95)?,
        p99: percentile(values, 99)?,
    })
}

fn mean_f64(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / (v.len() as f64)
}
