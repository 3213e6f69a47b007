//! Collection paginator
//!
//! Walks the listing pages of one collection in order, fetching and extracting
//! each page before deciding whether another page exists. There is no total
//! page count to rely on, so termination comes from two page-level signals
//! (the "load more" affordance and the page fill) plus a hard page ceiling.

#![allow(clippy::uninlined_format_args)]

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{Collection, FetchOutcome, ProductRecord};
use crate::infrastructure::config::PaginationConfig;
use crate::infrastructure::http_client::Transport;
use crate::infrastructure::parsing::{ParseContext, ProductListParser};

/// Why a collection stopped paginating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last page had no "load more" affordance
    NoLoadMore,
    /// The last page held fewer records than a full page
    UnderFilled { count: usize },
    /// The last page fetched fine but yielded no records
    EmptyPage,
    /// The page ceiling was reached with both signals still favorable
    PageCeiling,
    /// A page could not be fetched; earlier pages are kept
    FetchFailed { page: u32, attempts: u32 },
}

impl StopReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed { .. })
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLoadMore => write!(f, "no load-more affordance"),
            Self::UnderFilled { count } => write!(f, "under-filled page ({} records)", count),
            Self::EmptyPage => write!(f, "empty page"),
            Self::PageCeiling => write!(f, "page ceiling reached"),
            Self::FetchFailed { page, attempts } => {
                write!(f, "page {} failed after {} attempts", page, attempts)
            }
        }
    }
}

/// Result of paginating one collection
#[derive(Debug, Clone)]
pub struct CollectionHarvest {
    pub collection_id: String,
    /// Records of every page in fetch order, duplicates included
    pub records: Vec<ProductRecord>,
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
}

/// Drives transport and parser across the pages of a collection
pub struct CollectionPaginator {
    transport: Arc<dyn Transport>,
    parser: Arc<ProductListParser>,
    config: PaginationConfig,
}

impl CollectionPaginator {
    pub fn new(transport: Arc<dyn Transport>, parser: Arc<ProductListParser>, config: PaginationConfig) -> Self {
        Self {
            transport,
            parser,
            config,
        }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Collect every reachable record of a collection.
    ///
    /// Never fails: a fetch failure ends the walk and keeps what was gathered.
    pub async fn collect(&self, collection: &Collection) -> CollectionHarvest {
        let mut records = Vec::new();
        let mut pages_fetched = 0;

        for page in 0..self.config.max_pages {
            let url = collection.page_url(page, &self.config.page_param);
            debug!("Fetching page {} of {}: {}", page, collection.id, url);

            let body = match self.transport.fetch(url.as_str()).await {
                FetchOutcome::Success(body) => body,
                FetchOutcome::Failure { error, attempts } => {
                    warn!(
                        "⚠️ {} page {} failed after {} attempts ({}); keeping {} records",
                        collection.id,
                        page,
                        attempts,
                        error,
                        records.len()
                    );
                    return CollectionHarvest {
                        collection_id: collection.id.clone(),
                        records,
                        pages_fetched,
                        stop_reason: StopReason::FetchFailed { page, attempts },
                    };
                }
            };
            pages_fetched += 1;

            let context = ParseContext::new(collection.id.clone(), page);
            let parsed = self.parser.parse(&body, &context);
            let count = parsed.records.len();
            info!(
                "📄 {} page {}: {} records (load more: {}, skipped cards: {})",
                collection.id, page, count, parsed.load_more_present, parsed.skipped_cards
            );
            records.extend(parsed.records);

            if let Some(stop_reason) = self.stop_signal(count, parsed.load_more_present) {
                return CollectionHarvest {
                    collection_id: collection.id.clone(),
                    records,
                    pages_fetched,
                    stop_reason,
                };
            }
        }

        debug!("{} reached the {} page ceiling", collection.id, self.config.max_pages);
        CollectionHarvest {
            collection_id: collection.id.clone(),
            records,
            pages_fetched,
            stop_reason: StopReason::PageCeiling,
        }
    }

    /// Continue only while the page is full and offers more
    fn stop_signal(&self, count: usize, load_more_present: bool) -> Option<StopReason> {
        if count == 0 {
            Some(StopReason::EmptyPage)
        } else if count < self.config.full_page_threshold {
            Some(StopReason::UnderFilled { count })
        } else if !load_more_present {
            Some(StopReason::NoLoadMore)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{numbered_listing_page, ScriptedTransport};
    use url::Url;

    fn collection() -> Collection {
        Collection::new(
            "marca_2",
            Url::parse("https://www.ligaswu.com.br/?view=cards%2Fsearch&card=marca%3D2").unwrap(),
        )
    }

    fn page_url(page: u32) -> String {
        collection().page_url(page, "page").to_string()
    }

    fn paginator(transport: ScriptedTransport) -> CollectionPaginator {
        let parser = ProductListParser::new(Url::parse("https://www.ligaswu.com.br").unwrap()).unwrap();
        CollectionPaginator::new(Arc::new(transport), Arc::new(parser), PaginationConfig::default())
    }

    #[test]
    fn stop_signals() {
        let paginator = paginator(ScriptedTransport::new());
        assert_eq!(paginator.stop_signal(0, true), Some(StopReason::EmptyPage));
        assert_eq!(paginator.stop_signal(39, true), Some(StopReason::UnderFilled { count: 39 }));
        assert_eq!(paginator.stop_signal(40, false), Some(StopReason::NoLoadMore));
        assert_eq!(paginator.stop_signal(40, true), None);
    }

    #[tokio::test]
    async fn single_short_page() {
        let transport = ScriptedTransport::new().with_page(page_url(0), numbered_listing_page("p0", 12, false));
        let harvest = paginator(transport).collect(&collection()).await;

        assert_eq!(harvest.records.len(), 12);
        assert_eq!(harvest.pages_fetched, 1);
        assert_eq!(harvest.stop_reason, StopReason::UnderFilled { count: 12 });
    }

    #[tokio::test]
    async fn empty_page_stops() {
        let transport = ScriptedTransport::new()
            .with_page(page_url(0), numbered_listing_page("p0", 40, true))
            .with_page(page_url(1), numbered_listing_page("p1", 0, true));
        let harvest = paginator(transport).collect(&collection()).await;

        assert_eq!(harvest.records.len(), 40);
        assert_eq!(harvest.pages_fetched, 2);
        assert_eq!(harvest.stop_reason, StopReason::EmptyPage);
    }

    #[tokio::test]
    async fn failure_on_first_page_yields_nothing() {
        let transport = ScriptedTransport::new().with_failure(page_url(0), 3);
        let harvest = paginator(transport).collect(&collection()).await;

        assert!(harvest.records.is_empty());
        assert_eq!(harvest.pages_fetched, 0);
        assert_eq!(harvest.stop_reason, StopReason::FetchFailed { page: 0, attempts: 3 });
        assert!(harvest.stop_reason.is_failure());
    }

    #[tokio::test]
    async fn pages_are_requested_in_order() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_page(page_url(0), numbered_listing_page("p0", 40, true))
                .with_page(page_url(1), numbered_listing_page("p1", 40, true))
                .with_page(page_url(2), numbered_listing_page("p2", 5, true)),
        );
        let parser = ProductListParser::new(Url::parse("https://www.ligaswu.com.br").unwrap()).unwrap();
        let paginator = CollectionPaginator::new(transport.clone(), Arc::new(parser), PaginationConfig::default());

        let harvest = paginator.collect(&collection()).await;
        assert_eq!(harvest.records.len(), 85);
        assert_eq!(transport.requests(), vec![page_url(0), page_url(1), page_url(2)]);
        assert_eq!(harvest.records[0].name, "p0 0");
        assert_eq!(harvest.records[84].name, "p2 4");
    }
}
