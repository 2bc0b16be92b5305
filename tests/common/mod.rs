// Shared test helpers
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use tracely::config::AppConfig;
use tracely::models::{MetricSample, MetricType};

pub const TEST_CONFIG: &str = r#"
[server]
port = 8080
host = "0.0.0.0"
chart_timeout_ms = 5000

[database]
path = "data/test.db"
max_pool_size = 2
retention_days = 30

[maintenance]
prune_interval_secs = 3600
vacuum_interval_secs = 86400
"#;

pub fn test_app_config() -> AppConfig {
    AppConfig::load_from_str(TEST_CONFIG).unwrap()
}

/// 2024-03-01 at `h:m:s` UTC.
pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
}

pub fn sample(
    service_id: &str,
    metric_type: MetricType,
    value: f64,
    recorded_at: DateTime<Utc>,
) -> MetricSample {
    MetricSample::new(service_id, metric_type, value, recorded_at).unwrap()
}

/// Bypasses validation, for feeding malformed values to the aggregator.
pub fn raw_sample(
    service_id: &str,
    metric_type: MetricType,
    value: f64,
    recorded_at: DateTime<Utc>,
) -> MetricSample {
    MetricSample {
        service_id: service_id.into(),
        metric_type,
        value,
        recorded_at,
    }
}

pub fn latency(value: f64, recorded_at: DateTime<Utc>) -> MetricSample {
    sample("S1", MetricType::LatencyMs, value, recorded_at)
}
