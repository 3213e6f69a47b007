//! Application layer - harvesting workflows
//!
//! Coordinates transport, parsing and persistence: paginating one collection,
//! harvesting all of them, and running harvests on a schedule.

pub mod harvester;
pub mod paginator;
pub mod scheduler;

// Re-export commonly used items
pub use harvester::{CollectionReport, HarvestReport, Harvester};
pub use paginator::{CollectionHarvest, CollectionPaginator, StopReason};
pub use scheduler::{run_scheduled, HarvestJob, RunSummary};
