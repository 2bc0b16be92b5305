// Generator configuration: base ranges, per-type modifier tables, spike and burst policy.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::MetricType;

/// Uniform draw range for one metric type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// How a spike combines with the peak-hour multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpikeRule {
    /// bias * peak * spike
    Multiply,
    /// bias * (spike if spiking, else peak)
    Replace,
    /// bias * peak, spikes ignored
    Ignore,
}

/// Per metric type modifiers applied after the base draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeModifiers {
    /// Bias is `1 + step * service index`.
    pub service_bias_step: f64,
    pub peak_multiplier: f64,
    pub off_peak_multiplier: f64,
    pub spike: SpikeRule,
}

impl TypeModifiers {
    /// Base draw only.
    pub const NONE: TypeModifiers = TypeModifiers {
        service_bias_step: 0.0,
        peak_multiplier: 1.0,
        off_peak_multiplier: 1.0,
        spike: SpikeRule::Ignore,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Live streaming: 10% spikes up to 3x, ceiling 3x max.
    Continuous,
    /// Backfill: 5% spikes up to 2.5x, ceiling 2x max.
    Batch,
}

/// Spike, ceiling and peak-window policy plus the per-type modifier table.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeProfile {
    pub mode: GenerationMode,
    pub spike_probability: f64,
    pub spike_min: f64,
    pub spike_max: f64,
    /// Values are capped at `ceiling_factor * range.max`.
    pub ceiling_factor: f64,
    /// Inclusive hour-of-day window considered peak.
    pub peak_start_hour: u32,
    pub peak_end_hour: u32,
    pub modifiers: BTreeMap<MetricType, TypeModifiers>,
}

/// Burst sequencing: sample count range and inter-sample gap range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstProfile {
    pub min_count: u32,
    pub max_count: u32,
    pub min_gap_ms: u64,
    pub max_gap_ms: u64,
}

impl Default for BurstProfile {
    fn default() -> Self {
        Self {
            min_count: 5,
            max_count: 20,
            min_gap_ms: 10,
            max_gap_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorProfile {
    /// Known services; position drives the service bias.
    pub services: Vec<String>,
    pub ranges: BTreeMap<MetricType, ValueRange>,
    pub mode: ModeProfile,
    pub burst: BurstProfile,
}

/// `S1`..`S7`.
pub fn default_services() -> Vec<String> {
    (1..=7).map(|i| format!("S{i}")).collect()
}

pub fn default_ranges() -> BTreeMap<MetricType, ValueRange> {
    BTreeMap::from([
        (MetricType::LatencyMs, ValueRange::new(10.0, 500.0)),
        (MetricType::PacketLoss, ValueRange::new(0.0, 15.0)),
        (MetricType::ErrorRate, ValueRange::new(0.0, 10.0)),
        (MetricType::BufferRatio, ValueRange::new(20.0, 100.0)),
    ])
}

impl GeneratorProfile {
    /// Live-streaming profile.
    pub fn continuous(services: Vec<String>) -> Self {
        let error_like = TypeModifiers {
            service_bias_step: 0.0,
            peak_multiplier: 1.0,
            off_peak_multiplier: 1.0,
            spike: SpikeRule::Replace,
        };
        Self {
            services,
            ranges: default_ranges(),
            mode: ModeProfile {
                mode: GenerationMode::Continuous,
                spike_probability: 0.10,
                spike_min: 1.5,
                spike_max: 3.0,
                ceiling_factor: 3.0,
                peak_start_hour: 9,
                peak_end_hour: 18,
                modifiers: BTreeMap::from([
                    (
                        MetricType::LatencyMs,
                        TypeModifiers {
                            service_bias_step: 0.05,
                            peak_multiplier: 1.2,
                            off_peak_multiplier: 1.0,
                            spike: SpikeRule::Multiply,
                        },
                    ),
                    (MetricType::PacketLoss, error_like),
                    (MetricType::ErrorRate, error_like),
                    (MetricType::BufferRatio, TypeModifiers::NONE),
                ]),
            },
            burst: BurstProfile::default(),
        }
    }

    /// Backfill profile.
    pub fn batch(services: Vec<String>) -> Self {
        let error_like = TypeModifiers {
            service_bias_step: 0.0,
            peak_multiplier: 1.1,
            off_peak_multiplier: 0.8,
            spike: SpikeRule::Replace,
        };
        Self {
            services,
            ranges: default_ranges(),
            mode: ModeProfile {
                mode: GenerationMode::Batch,
                spike_probability: 0.05,
                spike_min: 1.5,
                spike_max: 2.5,
                ceiling_factor: 2.0,
                peak_start_hour: 9,
                peak_end_hour: 18,
                modifiers: BTreeMap::from([
                    (
                        MetricType::LatencyMs,
                        TypeModifiers {
                            service_bias_step: 0.05,
                            peak_multiplier: 1.2,
                            off_peak_multiplier: 0.9,
                            spike: SpikeRule::Multiply,
                        },
                    ),
                    (MetricType::PacketLoss, error_like),
                    (MetricType::ErrorRate, error_like),
                    (MetricType::BufferRatio, TypeModifiers::NONE),
                ]),
            },
            burst: BurstProfile::default(),
        }
    }

    pub fn for_mode(mode: GenerationMode, services: Vec<String>) -> Self {
        match mode {
            GenerationMode::Continuous => Self::continuous(services),
            GenerationMode::Batch => Self::batch(services),
        }
    }

    pub fn range(&self, metric_type: MetricType) -> Result<ValueRange> {
        self.ranges
            .get(&metric_type)
            .copied()
            .ok_or_else(|| Error::InvalidMetricType(metric_type.to_string()))
    }

    pub fn modifiers(&self, metric_type: MetricType) -> Result<TypeModifiers> {
        self.mode
            .modifiers
            .get(&metric_type)
            .copied()
            .ok_or_else(|| Error::InvalidMetricType(metric_type.to_string()))
    }

    /// Upper bound for generated values of `metric_type`.
    pub fn ceiling(&self, metric_type: MetricType) -> Result<f64> {
        Ok(self.range(metric_type)?.max * self.mode.ceiling_factor)
    }

    /// Position of `service_id` in the known list; unknown services count as index 0.
    pub fn service_index(&self, service_id: &str) -> usize {
        self.services
            .iter()
            .position(|s| s == service_id)
            .unwrap_or(0)
    }

    pub fn is_peak_hour(&self, hour: u32) -> bool {
        (self.mode.peak_start_hour..=self.mode.peak_end_hour).contains(&hour)
    }

    /// Metric types the generator can produce (present in both tables).
    pub fn metric_types(&self) -> Vec<MetricType> {
        self.ranges
            .keys()
            .filter(|t| self.mode.modifiers.contains_key(t))
            .copied()
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            return Err(Error::Config("generator needs at least one service".into()));
        }
        if self.metric_types().is_empty() {
            return Err(Error::Config("generator needs at least one metric type".into()));
        }
        for (t, r) in &self.ranges {
            if !(r.min.is_finite() && r.max.is_finite()) || r.min < 0.0 || r.min > r.max {
                return Err(Error::Config(format!(
                    "range for {t} must satisfy 0 <= min <= max, got [{}, {}]",
                    r.min, r.max
                )));
            }
        }
        for (t, m) in &self.mode.modifiers {
            let factors = [
                m.service_bias_step,
                m.peak_multiplier,
                m.off_peak_multiplier,
            ];
            if factors.iter().any(|f| !f.is_finite() || *f < 0.0) {
                return Err(Error::Config(format!(
                    "modifiers for {t} must be finite and >= 0"
                )));
            }
        }
        let mode = &self.mode;
        if !(0.0..=1.0).contains(&mode.spike_probability) {
            return Err(Error::Config(format!(
                "spike_probability must be in [0, 1], got {}",
                mode.spike_probability
            )));
        }
        if !(mode.spike_min.is_finite() && mode.spike_max.is_finite())
            || mode.spike_min < 0.0
            || mode.spike_min > mode.spike_max
        {
            return Err(Error::Config(format!(
                "spike range must satisfy 0 <= min <= max, got [{}, {}]",
                mode.spike_min, mode.spike_max
            )));
        }
        if !mode.ceiling_factor.is_finite() || mode.ceiling_factor <= 0.0 {
            return Err(Error::Config(format!(
                "ceiling_factor must be > 0, got {}",
                mode.ceiling_factor
            )));
        }
        if mode.peak_start_hour > mode.peak_end_hour || mode.peak_end_hour > 23 {
            return Err(Error::Config(format!(
                "peak window must be within 0..=23, got {}..={}",
                mode.peak_start_hour, mode.peak_end_hour
            )));
        }
        let burst = &self.burst;
        if burst.min_count == 0 || burst.min_count > burst.max_count {
            return Err(Error::Config(format!(
                "burst count must satisfy 1 <= min <= max, got {}..={}",
                burst.min_count, burst.max_count
            )));
        }
        if burst.min_gap_ms > burst.max_gap_ms {
            return Err(Error::Config(format!(
                "burst gap must satisfy min <= max, got {}..={}",
                burst.min_gap_ms, burst.max_gap_ms
            )));
        }
        Ok(())
    }
}
