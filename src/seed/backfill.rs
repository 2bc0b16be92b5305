// One-shot seeding: historical samples spread over a window or laid out as a regular
// time series, generated with the batch profile and sent with explicit timestamps.

use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, Utc};
use rand::Rng;

use super::sink::{MetricSink, to_request};
use super::stats::SeedStats;
use crate::error::{Error, Result};
use crate::generator::MetricGenerator;
use crate::models::MetricSample;

/// What to backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPlan {
    /// `count` samples at random points within the last `hours` (plus up to 59m59s).
    Spread { count: u32, hours: u32 },
    /// For every service, `per_hour` samples in each of the last `days * 24` hours.
    TimeSeries { days: u32, per_hour: u32 },
}

impl SeedPlan {
    pub const QUICK: SeedPlan = SeedPlan::Spread { count: 100, hours: 2 };
    pub const MEDIUM: SeedPlan = SeedPlan::Spread { count: 500, hours: 12 };
    pub const LARGE: SeedPlan = SeedPlan::Spread { count: 2000, hours: 48 };
    pub const DAY: SeedPlan = SeedPlan::TimeSeries { days: 1, per_hour: 10 };
    pub const WEEK: SeedPlan = SeedPlan::TimeSeries { days: 7, per_hour: 4 };

    pub fn samples<R: Rng>(
        &self,
        generator: &mut MetricGenerator<R>,
        now: DateTime<Local>,
    ) -> Result<Vec<MetricSample>> {
        match *self {
            SeedPlan::Spread { count, hours } => spread_samples(generator, count, hours, now),
            SeedPlan::TimeSeries { days, per_hour } => {
                time_series_samples(generator, days, per_hour, now)
            }
        }
    }
}

pub fn spread_samples<R: Rng>(
    generator: &mut MetricGenerator<R>,
    count: u32,
    hours: u32,
    now: DateTime<Local>,
) -> Result<Vec<MetricSample>> {
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let service_id = generator.choose_service()?;
        let metric_type = generator.choose_metric_type()?;

        let rng = generator.rng();
        let hours_ago = if hours > 0 {
            rng.gen_range(0.0..f64::from(hours))
        } else {
            0.0
        };
        let minutes: i64 = rng.gen_range(0..=59);
        let seconds: i64 = rng.gen_range(0..=59);
        let offset_ms = (hours_ago * 3_600_000.0) as i64 + minutes * 60_000 + seconds * 1000;
        let ts = now - TimeDelta::milliseconds(offset_ms);

        out.push(generator.generate_sample(
            metric_type,
            &service_id,
            ts.with_timezone(&Utc),
            &ts,
        )?);
    }
    Ok(out)
}

pub fn time_series_samples<R: Rng>(
    generator: &mut MetricGenerator<R>,
    days: u32,
    per_hour: u32,
    now: DateTime<Local>,
) -> Result<Vec<MetricSample>> {
    if per_hour == 0 || per_hour > 60 {
        return Err(Error::Config(format!(
            "per_hour must be in 1..=60, got {per_hour}"
        )));
    }
    let total_hours = i64::from(days) * 24;
    let services = generator.profile().services.clone();
    let mut out = Vec::with_capacity((total_hours * i64::from(per_hour)) as usize * services.len());

    for service_id in &services {
        for hour in 0..total_hours {
            let base = now - TimeDelta::hours(total_hours - hour);
            for i in 0..i64::from(per_hour) {
                let jitter: i64 = generator.rng().gen_range(0..=5);
                let ts = base + TimeDelta::minutes(60 * i / i64::from(per_hour) + jitter);
                let metric_type = generator.choose_metric_type()?;
                // Peak or off-peak follows the slot's hour, even when jitter crosses into the next.
                out.push(generator.generate_sample(
                    metric_type,
                    service_id,
                    ts.with_timezone(&Utc),
                    &base,
                )?);
            }
        }
    }
    Ok(out)
}

/// Sends `samples` with their timestamps, pausing `pace` between requests.
pub async fn send_all<S: MetricSink + ?Sized>(
    sink: &S,
    samples: &[MetricSample],
    stats: &mut SeedStats,
    pace: Duration,
) {
    let total = samples.len();
    for (i, sample) in samples.iter().enumerate() {
        let ok = match sink.send(&to_request(sample, true)).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, service_id = %sample.service_id, "failed to create metric");
                false
            }
        };
        stats.record(ok);

        if (i + 1) % 100 == 0 || i + 1 == total {
            tracing::info!(sent = i + 1, total, created = stats.created, "progress");
        }
        if !pace.is_zero() {
            tokio::time::sleep(pace).await;
        }
    }
}
