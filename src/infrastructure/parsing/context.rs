//! Parsing context for listing-page extraction

use chrono::{DateTime, Utc};

/// Context information for parsing one fetched listing page
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Collection the page belongs to
    pub collection_id: String,

    /// Zero-based page index within the collection
    pub page: u32,

    /// Capture time stamped on every record of the page
    pub observed_at: DateTime<Utc>,
}

impl ParseContext {
    /// Create new parse context captured now
    pub fn new(collection_id: impl Into<String>, page: u32) -> Self {
        Self {
            collection_id: collection_id.into(),
            page,
            observed_at: Utc::now(),
        }
    }

    /// Override the capture time
    pub fn observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = observed_at;
        self
    }
}
