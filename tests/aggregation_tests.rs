// Aggregation tests: bucket statistics, window/filter semantics, ordering, invariants

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{at, latency, raw_sample, sample};
use proptest::prelude::*;
use tracely::Error;
use tracely::aggregation::{aggregate, aggregate_with_report, bucket_start};
use tracely::models::{BucketGranularity, MetricFilter, MetricSample, MetricType};

fn all() -> MetricFilter {
    MetricFilter::default()
}

#[test]
fn two_samples_in_one_hour_bucket() {
    let samples = vec![latency(100.0, at(10, 0, 0)), latency(200.0, at(10, 30, 0))];
    let out = aggregate(
        &samples,
        at(9, 0, 0),
        at(12, 0, 0),
        BucketGranularity::Hour,
        &all(),
    )
    .unwrap();

    assert_eq!(out.len(), 1);
    let m = &out[0];
    assert_eq!(m.time, at(10, 0, 0));
    assert_eq!(m.metric_type, MetricType::LatencyMs);
    assert_eq!(m.count, 2);
    assert_eq!(m.min, 100.0);
    assert_eq!(m.max, 200.0);
    assert_eq!(m.avg, 150.0);
    assert_eq!(m.p50, 100.0);
    assert_eq!(m.p95, 200.0);
    assert_eq!(m.p99, 200.0);
}

#[test]
fn single_sample_bucket_has_equal_statistics() {
    let samples = vec![sample("S3", MetricType::ErrorRate, 4.25, at(10, 15, 0))];
    let out = aggregate(
        &samples,
        at(10, 0, 0),
        at(11, 0, 0),
        BucketGranularity::Minute,
        &all(),
    )
    .unwrap();

    assert_eq!(out.len(), 1);
    let m = &out[0];
    assert_eq!(m.time, at(10, 15, 0));
    assert_eq!(m.count, 1);
    for v in [m.min, m.max, m.avg, m.p50, m.p95, m.p99] {
        assert_eq!(v, 4.25);
    }
}

#[test]
fn from_after_to_is_invalid_range() {
    let samples = vec![latency(100.0, at(10, 0, 0))];
    let err = aggregate(
        &samples,
        at(12, 0, 0),
        at(10, 0, 0),
        BucketGranularity::Hour,
        &all(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
    assert!(err.is_client_error());
}

#[test]
fn empty_window_returns_empty_list() {
    let samples = vec![latency(100.0, at(10, 0, 0))];
    let out = aggregate(
        &samples,
        at(11, 0, 0),
        at(12, 0, 0),
        BucketGranularity::Hour,
        &all(),
    )
    .unwrap();
    assert!(out.is_empty());

    let out = aggregate(&[], at(0, 0, 0), at(23, 0, 0), BucketGranularity::Day, &all()).unwrap();
    assert!(out.is_empty());
}

#[test]
fn from_equal_to_is_empty_not_error() {
    let samples = vec![latency(100.0, at(10, 0, 0))];
    let out = aggregate(
        &samples,
        at(10, 0, 0),
        at(10, 0, 0),
        BucketGranularity::Hour,
        &all(),
    )
    .unwrap();
    assert!(out.is_empty());
}

#[test]
fn window_is_half_open() {
    let samples = vec![
        latency(1.0, at(10, 0, 0)),
        latency(2.0, at(10, 59, 59)),
        latency(3.0, at(11, 0, 0)),
    ];
    let out = aggregate(
        &samples,
        at(10, 0, 0),
        at(11, 0, 0),
        BucketGranularity::Hour,
        &all(),
    )
    .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].count, 2);
    assert_eq!(out[0].max, 2.0);
}

#[test]
fn metric_types_in_same_bucket_are_separate_rows() {
    let samples = vec![
        sample("S1", MetricType::BufferRatio, 80.0, at(10, 5, 0)),
        sample("S1", MetricType::LatencyMs, 120.0, at(10, 10, 0)),
        sample("S2", MetricType::PacketLoss, 2.0, at(10, 20, 0)),
        sample("S2", MetricType::LatencyMs, 180.0, at(10, 40, 0)),
    ];
    let out = aggregate(
        &samples,
        at(10, 0, 0),
        at(11, 0, 0),
        BucketGranularity::Hour,
        &all(),
    )
    .unwrap();

    let types: Vec<_> = out.iter().map(|m| m.metric_type).collect();
    assert_eq!(
        types,
        vec![
            MetricType::LatencyMs,
            MetricType::PacketLoss,
            MetricType::BufferRatio
        ]
    );
    assert_eq!(out[0].count, 2);
    assert_eq!(out[0].avg, 150.0);
}

#[test]
fn output_is_ordered_by_time_then_type() {
    let samples = vec![
        sample("S1", MetricType::ErrorRate, 1.0, at(12, 0, 0)),
        sample("S1", MetricType::LatencyMs, 50.0, at(12, 30, 0)),
        sample("S1", MetricType::ErrorRate, 2.0, at(10, 0, 0)),
        sample("S1", MetricType::LatencyMs, 60.0, at(11, 0, 0)),
    ];
    let out = aggregate(
        &samples,
        at(0, 0, 0),
        at(23, 0, 0),
        BucketGranularity::Hour,
        &all(),
    )
    .unwrap();

    let keys: Vec<_> = out.iter().map(|m| (m.time, m.metric_type)).collect();
    assert_eq!(
        keys,
        vec![
            (at(10, 0, 0), MetricType::ErrorRate),
            (at(11, 0, 0), MetricType::LatencyMs),
            (at(12, 0, 0), MetricType::LatencyMs),
            (at(12, 0, 0), MetricType::ErrorRate),
        ]
    );
}

#[test]
fn filters_narrow_by_service_and_type() {
    let samples = vec![
        sample("S1", MetricType::LatencyMs, 100.0, at(10, 0, 0)),
        sample("S2", MetricType::LatencyMs, 300.0, at(10, 1, 0)),
        sample("S2", MetricType::ErrorRate, 5.0, at(10, 2, 0)),
    ];

    let by_service = MetricFilter {
        service_id: Some("S2".into()),
        metric_type: None,
    };
    let out = aggregate(
        &samples,
        at(10, 0, 0),
        at(11, 0, 0),
        BucketGranularity::Hour,
        &by_service,
    )
    .unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out.iter().map(|m| m.count).sum::<u64>(), 2);

    let both = MetricFilter {
        service_id: Some("S2".into()),
        metric_type: Some(MetricType::LatencyMs),
    };
    let out = aggregate(
        &samples,
        at(10, 0, 0),
        at(11, 0, 0),
        BucketGranularity::Hour,
        &both,
    )
    .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].min, 300.0);

    let none = MetricFilter {
        service_id: Some("S9".into()),
        metric_type: None,
    };
    let out = aggregate(
        &samples,
        at(10, 0, 0),
        at(11, 0, 0),
        BucketGranularity::Hour,
        &none,
    )
    .unwrap();
    assert!(out.is_empty());
}

#[test]
fn malformed_samples_are_skipped_and_counted() {
    let samples = vec![
        latency(100.0, at(10, 0, 0)),
        raw_sample("S1", MetricType::LatencyMs, f64::NAN, at(10, 1, 0)),
        raw_sample("S1", MetricType::LatencyMs, -5.0, at(10, 2, 0)),
        raw_sample("S1", MetricType::LatencyMs, f64::INFINITY, at(10, 3, 0)),
        latency(200.0, at(10, 4, 0)),
        // out of window, not counted as skipped
        raw_sample("S1", MetricType::LatencyMs, f64::NAN, at(15, 0, 0)),
    ];
    let report = aggregate_with_report(
        &samples,
        at(10, 0, 0),
        at(11, 0, 0),
        BucketGranularity::Hour,
        &all(),
    )
    .unwrap();

    assert_eq!(report.skipped, 3);
    assert_eq!(report.metrics.len(), 1);
    let m = &report.metrics[0];
    assert_eq!(m.count, 2);
    assert!(m.avg.is_finite());
    assert_eq!(m.avg, 150.0);
}

#[test]
fn day_and_minute_buckets_floor_in_utc() {
    let t = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap();
    assert_eq!(
        bucket_start(t, BucketGranularity::Day),
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(
        bucket_start(t, BucketGranularity::Hour),
        Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap()
    );
    assert_eq!(
        bucket_start(t, BucketGranularity::Minute),
        Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap()
    );

    let pre_epoch = Utc.with_ymd_and_hms(1969, 12, 31, 12, 30, 0).unwrap();
    assert_eq!(
        bucket_start(pre_epoch, BucketGranularity::Day),
        Utc.with_ymd_and_hms(1969, 12, 31, 0, 0, 0).unwrap()
    );
}

#[test]
fn day_buckets_span_multiple_days() {
    let samples: Vec<MetricSample> = (0..72i32)
        .map(|h| latency(f64::from(h), at(0, 0, 0) + Duration::hours(h.into())))
        .collect();
    let out = aggregate(
        &samples,
        at(0, 0, 0),
        at(0, 0, 0) + Duration::days(3),
        BucketGranularity::Day,
        &all(),
    )
    .unwrap();
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|m| m.count == 24));
    assert_eq!(out[1].min, 24.0);
    assert_eq!(out[1].max, 47.0);
}

#[test]
fn granularity_for_window() {
    assert_eq!(
        BucketGranularity::for_window(Duration::hours(1)),
        BucketGranularity::Minute
    );
    assert_eq!(
        BucketGranularity::for_window(Duration::hours(4)),
        BucketGranularity::Minute
    );
    assert_eq!(
        BucketGranularity::for_window(Duration::hours(24)),
        BucketGranularity::Hour
    );
    assert_eq!(
        BucketGranularity::for_window(Duration::days(7)),
        BucketGranularity::Hour
    );
    assert_eq!(
        BucketGranularity::for_window(Duration::days(30)),
        BucketGranularity::Day
    );
}

#[test]
fn ties_keep_percentile_order() {
    let samples: Vec<MetricSample> = [5.0, 5.0, 5.0, 5.0, 9.0]
        .into_iter()
        .enumerate()
        .map(|(i, v)| latency(v, at(10, i as u32, 0)))
        .collect();
    let out = aggregate(
        &samples,
        at(10, 0, 0),
        at(11, 0, 0),
        BucketGranularity::Hour,
        &all(),
    )
    .unwrap();
    let m = &out[0];
    assert_eq!(m.p50, 5.0);
    assert_eq!(m.p95, 9.0);
    assert_eq!(m.p99, 9.0);
}

fn arb_samples() -> impl Strategy<Value = Vec<MetricSample>> {
    let one = (
        0usize..4,
        0usize..3,
        0.0f64..1_000.0,
        0i64..(3 * 86_400_000),
    )
        .prop_map(|(t, s, value, offset_ms)| MetricSample {
            service_id: format!("S{}", s + 1),
            metric_type: MetricType::ALL[t],
            value,
            recorded_at: at(0, 0, 0) + Duration::milliseconds(offset_ms),
        });
    prop::collection::vec(one, 0..200)
}

fn arb_granularity() -> impl Strategy<Value = BucketGranularity> {
    prop_oneof![
        Just(BucketGranularity::Minute),
        Just(BucketGranularity::Hour),
        Just(BucketGranularity::Day),
    ]
}

proptest! {
    #[test]
    fn statistics_are_ordered(samples in arb_samples(), g in arb_granularity()) {
        let out = aggregate(&samples, at(0, 0, 0), at(0, 0, 0) + Duration::days(3), g, &all()).unwrap();
        for m in &out {
            prop_assert!(m.count >= 1);
            prop_assert!(m.min <= m.p50 && m.p50 <= m.p95 && m.p95 <= m.p99 && m.p99 <= m.max);
            prop_assert!(m.min <= m.avg && m.avg <= m.max);
        }
    }

    #[test]
    fn every_sample_in_window_counted_once(
        samples in arb_samples(),
        g in arb_granularity(),
        from_h in 0i64..36,
        span_h in 0i64..48,
    ) {
        let from = at(0, 0, 0) + Duration::hours(from_h);
        let to = from + Duration::hours(span_h);
        let filter = MetricFilter { service_id: Some("S2".into()), metric_type: None };
        let out = aggregate(&samples, from, to, g, &filter).unwrap();

        let expected = samples
            .iter()
            .filter(|s| s.recorded_at >= from && s.recorded_at < to && s.service_id == "S2")
            .count() as u64;
        prop_assert_eq!(out.iter().map(|m| m.count).sum::<u64>(), expected);
    }

    #[test]
    fn repeated_calls_are_identical(samples in arb_samples(), g in arb_granularity()) {
        let to = at(0, 0, 0) + Duration::days(3);
        let a = aggregate(&samples, at(0, 0, 0), to, g, &all()).unwrap();
        let b = aggregate(&samples, at(0, 0, 0), to, g, &all()).unwrap();
        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            prop_assert_eq!(x.avg.to_bits(), y.avg.to_bits());
            prop_assert_eq!(x, y);
        }
    }

    #[test]
    fn input_order_does_not_change_output(samples in arb_samples()) {
        let to = at(0, 0, 0) + Duration::days(3);
        let mut reversed = samples.clone();
        reversed.reverse();
        let a = aggregate(&samples, at(0, 0, 0), to, BucketGranularity::Hour, &all()).unwrap();
        let b = aggregate(&reversed, at(0, 0, 0), to, BucketGranularity::Hour, &all()).unwrap();
        prop_assert_eq!(a, b);
    }
}
