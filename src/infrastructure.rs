//! Infrastructure layer: network transport, HTML parsing, configuration,
//! logging and snapshot persistence.

pub mod config; // Layered configuration and defaults
pub mod http_client; // Transport with jitter, retry and cooldown
pub mod logging;
pub mod parsing; // Listing-page extraction
pub mod snapshot_store; // JSON/CSV exports

// Re-export commonly used items
pub use config::{AppConfig, CollectionEntry, ConfigError, LoggingConfig, OutputConfig, PaginationConfig, ScheduleConfig, TransportConfig};
pub use http_client::{HttpClient, Transport};
pub use logging::{init_logging, init_logging_with_config};
pub use parsing::{ParseContext, ParsedPage, ParsingError, ParsingResult, ProductListParser, ProductListSelectors};
pub use snapshot_store::{SnapshotStore, StoreError};
