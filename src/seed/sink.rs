// Destinations for generated samples.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CreateMetricRequest, MetricSample};

#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn send(&self, req: &CreateMetricRequest) -> Result<()>;
}

/// Posts samples to `{base_url}/api/metrics`.
pub struct HttpSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSink {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::version::USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /health; fails unless the service answers 2xx.
    pub async fn check_connectivity(&self) -> Result<()> {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl MetricSink for HttpSink {
    async fn send(&self, req: &CreateMetricRequest) -> Result<()> {
        self.client
            .post(format!("{}/api/metrics", self.base_url))
            .json(req)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Wire request for a sample, value rounded to 2 decimals.
/// `with_timestamp` is false for live sends so the service stamps them.
pub fn to_request(sample: &MetricSample, with_timestamp: bool) -> CreateMetricRequest {
    CreateMetricRequest {
        service_id: sample.service_id.clone(),
        metric_type: sample.metric_type.as_str().to_string(),
        value: (sample.value * 100.0).round() / 100.0,
        recorded_at: with_timestamp.then_some(sample.recorded_at),
    }
}
