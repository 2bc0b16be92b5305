// Synthetic metric values: base draw, service bias, peak-hour load, random spikes.
// All constants come from GeneratorProfile; the RNG is injected so tests can seed it.

mod profile;

pub use profile::{
    BurstProfile, GenerationMode, GeneratorProfile, ModeProfile, SpikeRule, TypeModifiers,
    ValueRange, default_ranges, default_services,
};

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::models::{MetricSample, MetricType};

/// A correlated run of samples from one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Burst {
    pub service_id: String,
    pub count: u32,
}

pub struct MetricGenerator<R = StdRng> {
    profile: GeneratorProfile,
    metric_types: Vec<MetricType>,
    rng: R,
}

impl MetricGenerator<StdRng> {
    pub fn from_entropy(profile: GeneratorProfile) -> Result<Self> {
        Self::with_rng(profile, StdRng::from_entropy())
    }

    pub fn seeded(profile: GeneratorProfile, seed: u64) -> Result<Self> {
        Self::with_rng(profile, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MetricGenerator<R> {
    pub fn with_rng(profile: GeneratorProfile, rng: R) -> Result<Self> {
        profile.validate()?;
        let metric_types = profile.metric_types();
        Ok(Self {
            profile,
            metric_types,
            rng,
        })
    }

    pub fn profile(&self) -> &GeneratorProfile {
        &self.profile
    }

    pub fn rng(&mut self) -> &mut R {
        &mut self.rng
    }

    /// One value for `(metric_type, service_id)`; the hour of `now` selects peak or off-peak.
    /// Result is in `[0, ceiling_factor * range.max]`.
    pub fn generate_value<T: Timelike>(
        &mut self,
        metric_type: MetricType,
        service_id: &str,
        now: &T,
    ) -> Result<f64> {
        let range = self.profile.range(metric_type)?;
        let mods = self.profile.modifiers(metric_type)?;
        let ceiling = self.profile.ceiling(metric_type)?;

        let base = if range.min < range.max {
            self.rng.gen_range(range.min..range.max)
        } else {
            range.min
        };

        let bias =
            1.0 + mods.service_bias_step * self.profile.service_index(service_id) as f64;
        let peak = if self.profile.is_peak_hour(now.hour()) {
            mods.peak_multiplier
        } else {
            mods.off_peak_multiplier
        };

        let mode = &self.profile.mode;
        let has_spike = self.rng.gen_bool(mode.spike_probability);
        let spike = if has_spike {
            self.rng.gen_range(mode.spike_min..=mode.spike_max)
        } else {
            1.0
        };

        let factor = match mods.spike {
            SpikeRule::Multiply => bias * peak * spike,
            SpikeRule::Replace => bias * if has_spike { spike } else { peak },
            SpikeRule::Ignore => bias * peak,
        };

        Ok((base * factor).clamp(0.0, ceiling))
    }

    /// Like `generate_value` for an unparsed type name; unknown names fail with `InvalidMetricType`.
    pub fn generate_named<T: Timelike>(
        &mut self,
        metric_type: &str,
        service_id: &str,
        now: &T,
    ) -> Result<f64> {
        let metric_type: MetricType = metric_type.parse()?;
        self.generate_value(metric_type, service_id, now)
    }

    /// A validated sample. `local` supplies the hour of day (callers pass local time).
    pub fn generate_sample<T: Timelike>(
        &mut self,
        metric_type: MetricType,
        service_id: &str,
        recorded_at: DateTime<Utc>,
        local: &T,
    ) -> Result<MetricSample> {
        let value = self.generate_value(metric_type, service_id, local)?;
        MetricSample::new(service_id, metric_type, value, recorded_at)
    }

    pub fn choose_service(&mut self) -> Result<String> {
        self.profile
            .services
            .choose(&mut self.rng)
            .cloned()
            .ok_or_else(|| Error::Config("generator has no services".into()))
    }

    pub fn choose_metric_type(&mut self) -> Result<MetricType> {
        self.metric_types
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| Error::InvalidMetricType("no metric types configured".into()))
    }

    /// Picks the burst size and the single service emitting it.
    pub fn plan_burst(&mut self) -> Result<Burst> {
        let b = self.profile.burst;
        let count = self.rng.gen_range(b.min_count..=b.max_count);
        let service_id = self.choose_service()?;
        Ok(Burst { service_id, count })
    }

    /// Delay between two samples of a burst.
    pub fn burst_gap(&mut self) -> Duration {
        let b = self.profile.burst;
        Duration::from_millis(self.rng.gen_range(b.min_gap_ms..=b.max_gap_ms))
    }
}
