#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use catalog_harvester_lib::application::{run_scheduled, HarvestJob};
use catalog_harvester_lib::domain::{latest_per_product, price_history};
use catalog_harvester_lib::infrastructure::logging::{init_logging_with_config, log_system_info};
use catalog_harvester_lib::infrastructure::{AppConfig, SnapshotStore};

#[derive(Parser, Debug)]
#[command(
    name = "catalog-harvester",
    version,
    about = "Harvest catalog listings into timestamped price snapshots"
)]
struct Cli {
    /// Config file (TOML/JSON); defaults to ./harvester.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest every collection once and write the exports
    Once,
    /// Harvest on the configured interval until Ctrl-C
    Schedule,
    /// Print the latest observation of every product from stored snapshots
    Latest,
    /// Print the price history of one product as JSON
    History {
        /// Exact product name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging_with_config(&config.logging)?;
    info!("Loaded configuration: {}", config.summary());

    match cli.command {
        Command::Once => {
            log_system_info();
            let job = HarvestJob::from_config(&config)?;
            let summary = job.run_once().await?;
            println!("{}", summary);
        }
        Command::Schedule => {
            log_system_info();
            let job = HarvestJob::from_config(&config)?;
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            let runs = run_scheduled(&job, &config.schedule, shutdown).await;
            info!("Scheduler stopped after {} runs", runs);
        }
        Command::Latest => {
            let snapshots = SnapshotStore::from_config(&config.output).load_all()?;
            let latest = latest_per_product(&snapshots);
            for record in &latest {
                let price = record.price.map_or_else(|| "-".to_string(), |p| p.to_string());
                println!(
                    "{:<10} {:<60} {:>10}  {}",
                    record.collection_id,
                    record.name,
                    price,
                    record.link.as_deref().unwrap_or("")
                );
            }
            println!("{} products from {} snapshots", latest.len(), snapshots.len());
        }
        Command::History { name } => {
            let snapshots = SnapshotStore::from_config(&config.output).load_all()?;
            let history = price_history(&snapshots, &name);
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
    }

    Ok(())
}
