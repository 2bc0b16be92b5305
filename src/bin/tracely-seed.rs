//! Tracely seeder
//!
//! Drives the metrics service with synthetic samples, either live or as a one-shot backfill.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracely::generator::{GenerationMode, GeneratorProfile, MetricGenerator, default_services};
use tracely::seed::{ContinuousConfig, HttpSink, SeedPlan, SeedStats, format_duration};

/// Tracely seeder - synthetic metrics for the dashboard
#[derive(Parser)]
#[command(name = "tracely-seed")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Base URL of the metrics service
    #[arg(long, global = true, env = "API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Comma-separated service ids; position drives the latency bias
    #[arg(long, global = true, value_delimiter = ',')]
    services: Option<Vec<String>>,

    /// Seed the RNG for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true, default_value = "5000")]
    timeout_ms: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream samples at random intervals with occasional bursts until Ctrl+C
    Continuous {
        /// Minimum pause between steps in milliseconds
        #[arg(long, default_value = "100")]
        min_interval_ms: u64,

        /// Maximum pause between steps in milliseconds
        #[arg(long, default_value = "3000")]
        max_interval_ms: u64,

        /// Probability that a step is a burst
        #[arg(long, default_value = "0.1")]
        burst_chance: f64,

        /// Seconds between stats log lines
        #[arg(long, default_value = "10")]
        stats_interval_secs: u64,

        /// Stop after this many sends
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Backfill historical samples once and exit
    Once {
        #[arg(value_enum, default_value = "quick")]
        mode: OnceMode,

        /// Pause between requests in milliseconds
        #[arg(long, default_value = "5")]
        pace_ms: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OnceMode {
    /// 100 samples spread over 2 hours
    Quick,
    /// 500 samples spread over 12 hours
    Medium,
    /// 2000 samples spread over 48 hours
    Large,
    /// 1 day of time series, 10 samples/hour/service
    Day,
    /// 7 days of time series, 4 samples/hour/service
    Timeseries,
}

impl OnceMode {
    fn plan(self) -> SeedPlan {
        match self {
            OnceMode::Quick => SeedPlan::QUICK,
            OnceMode::Medium => SeedPlan::MEDIUM,
            OnceMode::Large => SeedPlan::LARGE,
            OnceMode::Day => SeedPlan::DAY,
            OnceMode::Timeseries => SeedPlan::WEEK,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    tracely::logging::init(if cli.verbose { "debug" } else { "info" });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "seeder failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let sink = HttpSink::new(&cli.api_url, Duration::from_millis(cli.timeout_ms))?;
    if let Err(e) = sink.check_connectivity().await {
        anyhow::bail!("cannot connect to API at {}: {}", sink.base_url(), e);
    }
    tracing::info!(api = %sink.base_url(), "API connection OK");

    let services = cli.services.unwrap_or_else(default_services);
    let mode = match cli.command {
        Commands::Continuous { .. } => GenerationMode::Continuous,
        Commands::Once { .. } => GenerationMode::Batch,
    };
    let profile = GeneratorProfile::for_mode(mode, services);
    let mut generator = match cli.seed {
        Some(seed) => MetricGenerator::seeded(profile, seed)?,
        None => MetricGenerator::from_entropy(profile)?,
    };
    let mut stats = SeedStats::new();

    match cli.command {
        Commands::Continuous {
            min_interval_ms,
            max_interval_ms,
            burst_chance,
            stats_interval_secs,
            limit,
        } => {
            let config = ContinuousConfig {
                min_interval_ms,
                max_interval_ms,
                burst_chance,
                stats_log_interval: Duration::from_secs(stats_interval_secs.max(1)),
                limit,
            };
            tracing::info!(
                min_interval_ms,
                max_interval_ms,
                burst_chance,
                "streaming metrics; press Ctrl+C to stop"
            );

            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                let _ = shutdown_tx.send(());
            });
            tracely::seed::run_continuous(&sink, &mut generator, &config, &mut stats, shutdown_rx)
                .await?;
        }
        Commands::Once { mode, pace_ms } => {
            let plan = mode.plan();
            let samples = plan.samples(&mut generator, chrono::Local::now())?;
            tracing::info!(?plan, samples = samples.len(), "seeding");
            tracely::seed::send_all(&sink, &samples, &mut stats, Duration::from_millis(pace_ms))
                .await;
        }
    }

    tracing::info!(
        created = stats.created,
        failed = stats.failed,
        success_rate = %format!("{:.1}%", stats.success_rate().unwrap_or(0.0)),
        uptime = %format_duration(stats.uptime().as_secs()),
        avg_rate = %format!("{:.1}/sec", stats.rate()),
        "final stats"
    );
    Ok(())
}
