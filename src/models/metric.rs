// Metric type enumeration and raw samples

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fixed set of metric types. Declaration order is the output order of aggregation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    LatencyMs,
    PacketLoss,
    ErrorRate,
    BufferRatio,
}

impl MetricType {
    pub const ALL: [MetricType; 4] = [
        MetricType::LatencyMs,
        MetricType::PacketLoss,
        MetricType::ErrorRate,
        MetricType::BufferRatio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::LatencyMs => "LATENCY_MS",
            MetricType::PacketLoss => "PACKET_LOSS",
            MetricType::ErrorRate => "ERROR_RATE",
            MetricType::BufferRatio => "BUFFER_RATIO",
        }
    }

    /// Display unit: milliseconds for latency, percent for the ratios.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricType::LatencyMs => "ms",
            _ => "%",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MetricType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidMetricType(s.to_string()))
    }
}

/// One observation. `value` is finite and non-negative for any sample built through `new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub service_id: String,
    pub metric_type: MetricType,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(
        service_id: impl Into<String>,
        metric_type: MetricType,
        value: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self> {
        let sample = Self {
            service_id: service_id.into(),
            metric_type,
            value,
            recorded_at,
        };
        sample.validate()?;
        Ok(sample)
    }

    pub fn validate(&self) -> Result<()> {
        if self.service_id.is_empty() {
            return Err(Error::InvalidSample("service_id is required".into()));
        }
        if !self.value.is_finite() {
            return Err(Error::InvalidSample(format!(
                "value must be finite, got {}",
                self.value
            )));
        }
        if self.value < 0.0 {
            return Err(Error::InvalidSample(format!(
                "value must be >= 0, got {}",
                self.value
            )));
        }
        Ok(())
    }
}

/// A persisted sample as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMetric {
    pub id: i64,
    pub service_id: String,
    pub metric_type: MetricType,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl StoredMetric {
    pub fn to_sample(&self) -> MetricSample {
        MetricSample {
            service_id: self.service_id.clone(),
            metric_type: self.metric_type,
            value: self.value,
            recorded_at: self.recorded_at,
        }
    }
}

/// Body of `POST /api/metrics`. Fields default so validation can name what is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMetricRequest {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub metric_type: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default, rename = "timestamp", skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl CreateMetricRequest {
    /// Validates the request; a missing timestamp becomes `now`.
    /// Timestamps are truncated to milliseconds, the precision the store keeps.
    pub fn into_sample(self, now: DateTime<Utc>) -> Result<MetricSample> {
        if self.service_id.is_empty() {
            return Err(Error::InvalidSample("service_id is required".into()));
        }
        if self.metric_type.is_empty() {
            return Err(Error::InvalidSample("metric_type is required".into()));
        }
        let metric_type: MetricType = self.metric_type.parse()?;
        MetricSample::new(
            self.service_id,
            metric_type,
            self.value,
            self.recorded_at.unwrap_or(now).trunc_subsecs(3),
        )
    }
}
