// Seeder counters, threaded explicitly through every send.

use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SeedStats {
    pub created: u64,
    pub failed: u64,
    started_at: Instant,
}

impl Default for SeedStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedStats {
    pub fn new() -> Self {
        Self {
            created: 0,
            failed: 0,
            started_at: Instant::now(),
        }
    }

    pub fn record(&mut self, ok: bool) {
        if ok {
            self.created += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.created + self.failed
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Created per second of uptime (uptime under one second counts as one).
    pub fn rate(&self) -> f64 {
        let secs = self.uptime().as_secs().max(1);
        self.created as f64 / secs as f64
    }

    /// Percentage of successful sends; `None` before the first attempt.
    pub fn success_rate(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.created as f64 * 100.0 / total as f64)
    }
}

impl fmt::Display for SeedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created: {} | failed: {} | rate: {:.1}/sec | uptime: {}",
            self.created,
            self.failed,
            self.rate(),
            format_duration(self.uptime().as_secs())
        )
    }
}

/// `1h 2m 3s`, `2m 3s` or `3s`.
pub fn format_duration(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}
