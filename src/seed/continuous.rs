// Live seeding: one sample or a burst, then a random pause; repeat until shutdown.
// Bursts run to completion before shutdown is observed.

use std::time::Duration;

use chrono::{Local, Utc};
use rand::Rng;
use tokio::sync::oneshot;
use tokio::time::{MissedTickBehavior, interval};

use super::sink::{MetricSink, to_request};
use super::stats::SeedStats;
use crate::error::{Error, Result};
use crate::generator::MetricGenerator;

#[derive(Debug, Clone)]
pub struct ContinuousConfig {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    /// Probability that a step is a burst instead of a single sample.
    pub burst_chance: f64,
    pub stats_log_interval: Duration,
    /// Stop after this many send attempts.
    pub limit: Option<u64>,
}

impl Default for ContinuousConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 100,
            max_interval_ms: 3000,
            burst_chance: 0.1,
            stats_log_interval: Duration::from_secs(10),
            limit: None,
        }
    }
}

impl ContinuousConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_interval_ms > self.max_interval_ms {
            return Err(Error::Config(format!(
                "interval must satisfy min <= max, got {}..={}",
                self.min_interval_ms, self.max_interval_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.burst_chance) {
            return Err(Error::Config(format!(
                "burst_chance must be in [0, 1], got {}",
                self.burst_chance
            )));
        }
        if self.stats_log_interval.is_zero() {
            return Err(Error::Config("stats_log_interval must be > 0".into()));
        }
        Ok(())
    }
}

pub async fn run_continuous<S, R>(
    sink: &S,
    generator: &mut MetricGenerator<R>,
    config: &ContinuousConfig,
    stats: &mut SeedStats,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> Result<()>
where
    S: MetricSink + ?Sized,
    R: Rng + Send,
{
    config.validate()?;
    let mut stats_tick = interval(config.stats_log_interval);
    stats_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let limit_reached =
        |stats: &SeedStats| config.limit.is_some_and(|limit| stats.total() >= limit);

    loop {
        if limit_reached(stats) {
            tracing::info!(%stats, "send limit reached");
            return Ok(());
        }
        if generator.rng().gen_bool(config.burst_chance) {
            send_burst(sink, generator, stats, config.limit).await?;
        } else {
            send_one(sink, generator, stats).await?;
        }
        if limit_reached(stats) {
            tracing::info!(%stats, "send limit reached");
            return Ok(());
        }

        let delay = Duration::from_millis(
            generator
                .rng()
                .gen_range(config.min_interval_ms..=config.max_interval_ms),
        );
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                _ = stats_tick.tick() => {
                    tracing::info!(%stats, "seeder stats");
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Seeder shutting down");
                    return Ok(());
                }
            }
        }
    }
}

/// One live sample from a random service and metric type.
pub async fn send_one<S, R>(
    sink: &S,
    generator: &mut MetricGenerator<R>,
    stats: &mut SeedStats,
) -> Result<()>
where
    S: MetricSink + ?Sized,
    R: Rng + Send,
{
    let service_id = generator.choose_service()?;
    let metric_type = generator.choose_metric_type()?;
    let sample =
        generator.generate_sample(metric_type, &service_id, Utc::now(), &Local::now())?;
    let ok = deliver(sink, &to_request(&sample, false)).await;
    stats.record(ok);
    Ok(())
}

/// N samples from one service with short random gaps. Stops early once `limit` attempts are reached.
pub async fn send_burst<S, R>(
    sink: &S,
    generator: &mut MetricGenerator<R>,
    stats: &mut SeedStats,
    limit: Option<u64>,
) -> Result<()>
where
    S: MetricSink + ?Sized,
    R: Rng + Send,
{
    let burst = generator.plan_burst()?;
    tracing::info!(count = burst.count, service_id = %burst.service_id, "burst");

    for _ in 0..burst.count {
        if limit.is_some_and(|limit| stats.total() >= limit) {
            break;
        }
        let metric_type = generator.choose_metric_type()?;
        let sample = generator.generate_sample(
            metric_type,
            &burst.service_id,
            Utc::now(),
            &Local::now(),
        )?;
        let ok = deliver(sink, &to_request(&sample, false)).await;
        stats.record(ok);

        tokio::time::sleep(generator.burst_gap()).await;
    }
    Ok(())
}

async fn deliver<S: MetricSink + ?Sized>(sink: &S, req: &crate::models::CreateMetricRequest) -> bool {
    match sink.send(req).await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(
                error = %e,
                service_id = %req.service_id,
                metric_type = %req.metric_type,
                "send failed"
            );
            false
        }
    }
}
