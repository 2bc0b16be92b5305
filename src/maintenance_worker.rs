// Background maintenance: prune samples past retention every prune_interval_secs,
// VACUUM on a configurable schedule (cron expression or fixed interval).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::config::MaintenanceConfig;
use crate::metric_repo::MetricRepo;

/// Spawns the maintenance worker. Stops when `shutdown_rx` fires or its sender is dropped.
pub fn spawn(
    repo: Arc<MetricRepo>,
    config: MaintenanceConfig,
    shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(repo, config, shutdown_rx).await;
    })
}

#[instrument(skip(repo, shutdown_rx), fields(interval_secs = config.prune_interval_secs))]
async fn run(repo: Arc<MetricRepo>, config: MaintenanceConfig, mut shutdown_rx: oneshot::Receiver<()>) {
    let mut prune_interval = tokio::time::interval(Duration::from_secs(config.prune_interval_secs));
    prune_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (vacuum_tx, mut vacuum_rx) = tokio::sync::mpsc::channel::<()>(1);
    let scheduler = tokio::spawn(vacuum_scheduler(config.clone(), vacuum_tx));

    let mut pruned_total: u64 = 0;

    loop {
        tokio::select! {
            _ = prune_interval.tick() => {
                match run_one_tick(&repo).await {
                    Ok(n) => pruned_total += n,
                    Err(e) => warn!(error = %e, operation = "prune_old_data", "prune failed"),
                }
            }
            Some(()) = vacuum_rx.recv() => {
                if let Err(e) = repo.vacuum().await {
                    warn!(error = %e, "vacuum failed");
                } else {
                    info!(pruned_total, "vacuum complete");
                }
            }
            _ = &mut shutdown_rx => {
                debug!("Maintenance worker shutting down");
                break;
            }
        }
    }
    scheduler.abort();
}

/// One prune pass. Returns the number of samples deleted.
pub async fn run_one_tick(repo: &MetricRepo) -> anyhow::Result<u64> {
    let n = repo.prune_old_data().await?;
    if n > 0 {
        info!(pruned = n, "pruned samples past retention");
    }
    Ok(n)
}

/// Sends a message on `tx` at each VACUUM time (cron or fixed interval). Uses local time for cron.
async fn vacuum_scheduler(config: MaintenanceConfig, tx: tokio::sync::mpsc::Sender<()>) {
    if let Some(ref cron_str) = config.vacuum_schedule {
        let Ok(schedule) = cron::Schedule::from_str(cron_str) else {
            warn!(cron = %cron_str, "invalid vacuum_schedule; VACUUM will not run");
            return;
        };
        loop {
            let now = chrono::Local::now();
            let next = schedule.after(&now).next();
            if let Some(next) = next {
                let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(delay).await;
                if tx.send(()).await.is_err() {
                    break;
                }
            } else {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    } else {
        let interval = Duration::from_secs(config.vacuum_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}
