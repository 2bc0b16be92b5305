// Synthetic load for the metrics service: live streaming with bursts, or one-shot backfill.

pub mod backfill;
pub mod continuous;
mod sink;
mod stats;

pub use backfill::{SeedPlan, send_all};
pub use continuous::{ContinuousConfig, run_continuous};
pub use sink::{HttpSink, MetricSink, to_request};
pub use stats::{SeedStats, format_duration};
