//! HTML parsing infrastructure for listing pages
//!
//! Trait-based parsing with a prioritized selector fallback chain and
//! per-card error containment.

pub mod config;
pub mod context;
pub mod error;
pub mod product_list_parser;
pub mod url_resolver;

// Re-export public types
pub use config::ProductListSelectors;
pub use context::ParseContext;
pub use error::{ParsingError, ParsingResult};
pub use product_list_parser::{ParsedPage, ProductListParser};

use scraper::Html;

/// Parser working on an already parsed document with contextual information
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse HTML with contextual information
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> Self::Output;
}
