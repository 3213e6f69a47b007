//! Periodic harvesting
//!
//! `HarvestJob::run_once` is the zero-argument entry point: harvest, export,
//! summarize. `run_scheduled` calls it on a fixed interval until shutdown and
//! survives failed runs.

#![allow(clippy::uninlined_format_args)]

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use super::harvester::{HarvestReport, Harvester};
use crate::infrastructure::config::{AppConfig, OutputConfig, ScheduleConfig};
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::snapshot_store::SnapshotStore;

/// Outcome of one scheduled run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub captured_at: DateTime<Utc>,
    pub report: HarvestReport,
    pub json_path: Option<PathBuf>,
    pub csv_path: Option<PathBuf>,
}

impl RunSummary {
    pub fn total_records(&self) -> usize {
        self.report.total_records()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Harvest captured at {}", self.captured_at.to_rfc3339())?;
        writeln!(f, "{}", self.report)?;
        for path in [&self.json_path, &self.csv_path].into_iter().flatten() {
            writeln!(f, "saved {}", path.display())?;
        }
        Ok(())
    }
}

/// Harvest plus export, as one unit of scheduled work
pub struct HarvestJob {
    harvester: Harvester,
    store: SnapshotStore,
    output: OutputConfig,
}

impl HarvestJob {
    pub fn new(harvester: Harvester, store: SnapshotStore, output: OutputConfig) -> Self {
        Self {
            harvester,
            store,
            output,
        }
    }

    /// Job against the live storefront
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport = HttpClient::new(config.transport.clone())?;
        let harvester = Harvester::from_config(config, Arc::new(transport))?;
        Ok(Self::new(
            harvester,
            SnapshotStore::from_config(&config.output),
            config.output.clone(),
        ))
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Harvest every configured collection and write the enabled exports.
    ///
    /// Harvesting itself never fails; only the exports can.
    pub async fn run_once(&self) -> Result<RunSummary> {
        let (snapshot, report) = self.harvester.harvest(self.harvester.collections()).await;

        let json_path = if self.output.write_json {
            Some(
                self.store
                    .write_json(&snapshot)
                    .context("Failed to write JSON snapshot")?,
            )
        } else {
            None
        };

        let csv_path = if self.output.write_csv {
            self.store
                .write_csv(&snapshot)
                .context("Failed to write CSV snapshot")?
        } else {
            None
        };

        Ok(RunSummary {
            captured_at: snapshot.captured_at,
            report,
            json_path,
            csv_path,
        })
    }
}

/// Run `job` every `schedule.interval()` until `shutdown` resolves.
///
/// Returns the number of runs started. Missed ticks are delayed, not bursted.
/// A run in progress is not interrupted by shutdown.
pub async fn run_scheduled<F>(job: &HarvestJob, schedule: &ScheduleConfig, shutdown: F) -> u64
where
    F: Future<Output = ()>,
{
    let period = schedule.interval();
    let mut ticker = if schedule.run_on_startup {
        interval(period)
    } else {
        interval_at(Instant::now() + period, period)
    };
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "⏰ Scheduler started: every {} (run on startup: {})",
        format_period(period),
        schedule.run_on_startup
    );

    tokio::pin!(shutdown);
    let mut runs = 0;
    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("🛑 Shutdown requested, stopping scheduler after {} runs", runs);
                break;
            }
            _ = ticker.tick() => {}
        }

        runs += 1;
        info!("▶️ Scheduled run #{}", runs);
        match job.run_once().await {
            Ok(summary) => info!(
                "Run #{} done: {} records captured at {}",
                runs,
                summary.total_records(),
                summary.captured_at.to_rfc3339()
            ),
            Err(e) => error!("❌ Run #{} failed: {:#}", runs, e),
        }
    }

    runs
}

fn format_period(period: Duration) -> String {
    let secs = period.as_secs();
    if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
