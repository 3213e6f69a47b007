//! Harvester: one pass over every collection
//!
//! Collections are walked strictly one after another so the transport's
//! throttling applies to the whole run. A collection that fails, fully or
//! partially, only affects its own entry in the snapshot.

#![allow(clippy::uninlined_format_args)]

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use super::paginator::{CollectionHarvest, CollectionPaginator, StopReason};
use crate::domain::{Collection, Snapshot};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::Transport;
use crate::infrastructure::parsing::ProductListParser;

/// Per-collection line of a run report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub collection_id: String,
    pub records: usize,
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
}

impl From<&CollectionHarvest> for CollectionReport {
    fn from(harvest: &CollectionHarvest) -> Self {
        Self {
            collection_id: harvest.collection_id.clone(),
            records: harvest.records.len(),
            pages_fetched: harvest.pages_fetched,
            stop_reason: harvest.stop_reason,
        }
    }
}

/// Diagnostics of one harvest run
#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    pub collections: Vec<CollectionReport>,
    pub elapsed: Duration,
}

impl HarvestReport {
    pub fn total_records(&self) -> usize {
        self.collections.iter().map(|c| c.records).sum()
    }

    /// Collections cut short by a fetch failure
    pub fn failed_collections(&self) -> Vec<&str> {
        self.collections
            .iter()
            .filter(|c| c.stop_reason.is_failure())
            .map(|c| c.collection_id.as_str())
            .collect()
    }

    /// Collections that produced no records at all
    pub fn empty_collections(&self) -> Vec<&str> {
        self.collections
            .iter()
            .filter(|c| c.records == 0)
            .map(|c| c.collection_id.as_str())
            .collect()
    }

    fn log(&self) {
        for c in &self.collections {
            info!(
                "  {}: {} records from {} pages ({})",
                c.collection_id, c.records, c.pages_fetched, c.stop_reason
            );
        }
        let failed = self.failed_collections();
        if !failed.is_empty() {
            warn!("⚠️ Collections cut short by fetch failures: {}", failed.join(", "));
        }
        info!(
            "✅ Harvest finished: {} records from {} collections in {:.1}s",
            self.total_records(),
            self.collections.len(),
            self.elapsed.as_secs_f64()
        );
    }
}

impl fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.collections {
            writeln!(
                f,
                "{:<12} {:>5} records  {:>2} pages  {}",
                c.collection_id, c.records, c.pages_fetched, c.stop_reason
            )?;
        }
        write!(
            f,
            "total        {:>5} records  ({} collections, {:.1}s)",
            self.total_records(),
            self.collections.len(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Sequential harvester over a fixed collection set
pub struct Harvester {
    paginator: CollectionPaginator,
    collections: Vec<Collection>,
}

impl Harvester {
    pub fn new(paginator: CollectionPaginator, collections: Vec<Collection>) -> Self {
        Self {
            paginator,
            collections,
        }
    }

    /// Build the harvester for the configured site on top of `transport`
    pub fn from_config(config: &AppConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let base_url = config.base_url()?;
        let parser = ProductListParser::with_config(&config.extraction, base_url)
            .context("Failed to build the listing parser")?;
        let paginator = CollectionPaginator::new(transport, Arc::new(parser), config.pagination.clone());
        Ok(Self::new(paginator, config.collections()?))
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// Harvest the given collections into one snapshot.
    ///
    /// Always returns a snapshot, with an entry (possibly empty) per collection.
    pub async fn run(&self, collections: &[Collection]) -> Snapshot {
        self.harvest(collections).await.0
    }

    /// Harvest the configured collections
    pub async fn run_configured(&self) -> Snapshot {
        self.run(&self.collections).await
    }

    /// Harvest and return the run diagnostics alongside the snapshot
    pub async fn harvest(&self, collections: &[Collection]) -> (Snapshot, HarvestReport) {
        let started = Instant::now();
        let mut snapshot = Snapshot::new(Utc::now());
        let mut report = HarvestReport::default();

        info!("🚀 Harvesting {} collections", collections.len());
        for (index, collection) in collections.iter().enumerate() {
            info!("📦 [{}/{}] {}", index + 1, collections.len(), collection.id);

            let harvest = self.paginator.collect(collection).await;
            if harvest.records.is_empty() {
                warn!("{} yielded no records ({})", harvest.collection_id, harvest.stop_reason);
            }
            if snapshot.collections.contains_key(&harvest.collection_id) {
                warn!("{} was already harvested in this run, appending its records", harvest.collection_id);
            }
            report.collections.push(CollectionReport::from(&harvest));
            snapshot.insert(harvest.collection_id, harvest.records);
        }

        report.elapsed = started.elapsed();
        report.log();
        (snapshot, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::PaginationConfig;
    use crate::test_utils::{numbered_listing_page, ScriptedTransport};
    use url::Url;

    fn collection(id: &str) -> Collection {
        Collection::new(id, Url::parse(&format!("https://www.ligaswu.com.br/?view=cards&card={id}")).unwrap())
    }

    fn harvester(transport: ScriptedTransport, collections: Vec<Collection>) -> Harvester {
        let parser = ProductListParser::new(Url::parse("https://www.ligaswu.com.br").unwrap()).unwrap();
        let paginator = CollectionPaginator::new(Arc::new(transport), Arc::new(parser), PaginationConfig::default());
        Harvester::new(paginator, collections)
    }

    #[tokio::test]
    async fn total_failure_still_returns_a_snapshot() {
        let collections = vec![collection("marca_79"), collection("marca_2")];
        let harvester = harvester(ScriptedTransport::new(), collections.clone());

        let (snapshot, report) = harvester.harvest(&collections).await;
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.collections.len(), 2);
        assert_eq!(report.failed_collections(), vec!["marca_79", "marca_2"]);
        assert_eq!(report.empty_collections().len(), 2);
    }

    #[tokio::test]
    async fn run_configured_uses_configured_collections() {
        let marca = collection("marca_9");
        let transport = ScriptedTransport::new().with_page(marca.page_url(0, "page").to_string(), numbered_listing_page("m9", 3, false));
        let harvester = harvester(transport, vec![marca]);

        let snapshot = harvester.run_configured().await;
        assert_eq!(snapshot.total_records(), 3);
        assert!(snapshot.collections["marca_9"].iter().all(|r| r.collection_id == "marca_9"));
    }

    #[tokio::test]
    async fn collections_sharing_an_id_keep_both_record_sets() {
        let first = collection("marca_2");
        let second = Collection::new("marca_2", Url::parse("https://www.ligaswu.com.br/?view=cards&card=marca_2_extra").unwrap());
        let transport = ScriptedTransport::new()
            .with_page(first.page_url(0, "page").to_string(), numbered_listing_page("a", 2, false))
            .with_page(second.page_url(0, "page").to_string(), numbered_listing_page("b", 3, false));
        let harvester = harvester(transport, Vec::new());

        let (snapshot, report) = harvester.harvest(&[first, second]).await;
        assert_eq!(snapshot.collections.len(), 1);
        assert_eq!(snapshot.collections["marca_2"].len(), 5);
        assert_eq!(report.collections.len(), 2);
    }

    #[test]
    fn from_config_builds_default_collections() {
        let config = AppConfig::default();
        let harvester = Harvester::from_config(&config, Arc::new(ScriptedTransport::new())).unwrap();
        assert_eq!(harvester.collections().len(), 5);
    }

    #[test]
    fn report_renders_one_line_per_collection() {
        let report = HarvestReport {
            collections: vec![CollectionReport {
                collection_id: "marca_2".to_string(),
                records: 80,
                pages_fetched: 3,
                stop_reason: StopReason::NoLoadMore,
            }],
            elapsed: Duration::from_secs(2),
        };
        let text = report.to_string();
        assert!(text.contains("marca_2"));
        assert!(text.contains("80 records"));
        assert_eq!(report.total_records(), 80);
    }
}
