//! Domain module - core entities and value objects
//!
//! Product records, prices, collections, fetch outcomes, snapshots and the
//! price-history fold. Nothing in here performs I/O.

pub mod collection;
pub mod fetch;
pub mod price;
pub mod price_history;
pub mod product;
pub mod snapshot;

// Re-export commonly used items
pub use collection::Collection;
pub use fetch::{FetchOutcome, NetworkError};
pub use price::Price;
pub use price_history::{latest_per_product, price_histories, price_history, PricePoint};
pub use product::{FieldOutcome, ProductRecord};
pub use snapshot::{PersistedRecord, PersistedSnapshot, Snapshot, TabularRow};
