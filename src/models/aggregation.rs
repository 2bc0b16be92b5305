// Aggregated row: one per (bucket start, metric type) with at least one sample.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{MetricSample, MetricType};

/// Statistical summary of one bucket. `count >= 1`; empty buckets are never built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetric {
    pub time: DateTime<Utc>,
    pub metric_type: MetricType,
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 86_400_000;

/// Bucket width used to floor sample timestamps (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketGranularity {
    Minute,
    Hour,
    Day,
}

impl BucketGranularity {
    pub fn width_ms(&self) -> i64 {
        match self {
            BucketGranularity::Minute => MS_PER_MINUTE,
            BucketGranularity::Hour => MS_PER_HOUR,
            BucketGranularity::Day => MS_PER_DAY,
        }
    }

    /// `minute`, `hour` or `day`; anything else is `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "minute" => Some(BucketGranularity::Minute),
            "hour" => Some(BucketGranularity::Hour),
            "day" => Some(BucketGranularity::Day),
            _ => None,
        }
    }

    /// Default granularity for a query window: minute up to 4h, hour up to 7 days, day beyond.
    pub fn for_window(span: Duration) -> Self {
        if span > Duration::days(7) {
            BucketGranularity::Day
        } else if span > Duration::hours(4) {
            BucketGranularity::Hour
        } else {
            BucketGranularity::Minute
        }
    }
}

/// Optional narrowing of an aggregation or list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricFilter {
    pub service_id: Option<String>,
    pub metric_type: Option<MetricType>,
}

impl MetricFilter {
    pub fn matches(&self, sample: &MetricSample) -> bool {
        self.service_id
            .as_deref()
            .is_none_or(|id| id == sample.service_id)
            && self.metric_type.is_none_or(|t| t == sample.metric_type)
    }
}
