//! Catalog Harvester - periodic product listing harvester
//!
//! Fetches the paginated brand collections of a catalog storefront, extracts
//! product cards into records and persists one snapshot per run for
//! price-history tracking.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Shared by unit and integration tests
pub mod test_utils;

// Re-export the main entry points
pub use application::{run_scheduled, CollectionPaginator, HarvestJob, Harvester, StopReason};
pub use domain::{Collection, Price, ProductRecord, Snapshot};
pub use infrastructure::{AppConfig, HttpClient, SnapshotStore, Transport};
