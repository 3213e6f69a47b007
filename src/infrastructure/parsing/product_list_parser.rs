//! Product list parser
//!
//! Structural HTML extraction for listing pages with a prioritized fallback
//! chain of card selectors. The chain commits to the first card pattern that
//! yields at least one card carrying a product title; results are never merged
//! across patterns. Individual cards that cannot be read are skipped without
//! affecting the rest of the page.

#![allow(clippy::uninlined_format_args)]

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::config::ProductListSelectors;
use super::context::ParseContext;
use super::error::{ParsingError, ParsingResult};
use super::url_resolver::{resolve_image, resolve_link};
use super::ContextualParser;
use crate::domain::{FieldOutcome, Price, ProductRecord};

/// One card pattern of the fallback chain
struct CardStrategy {
    label: String,
    cards: Selector,
}

/// Everything the paginator needs from one listing page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub records: Vec<ProductRecord>,
    /// Whether a "load more" affordance is present
    pub load_more_present: bool,
    /// Card pattern the chain committed to, if any
    pub matched_strategy: Option<String>,
    /// Cards matched by the committed pattern but not turned into records
    pub skipped_cards: usize,
}

/// Parser for extracting product records from listing pages
pub struct ProductListParser {
    base_url: Url,
    card_strategies: Vec<CardStrategy>,
    title_selectors: Vec<Selector>,
    price_selectors: Vec<Selector>,
    image_selectors: Vec<Selector>,
    lazy_image_attributes: Vec<String>,
    load_more_selectors: Vec<Selector>,
    anchor_selector: Selector,
}

impl ProductListParser {
    /// Create a new product list parser with default selectors
    pub fn new(base_url: Url) -> ParsingResult<Self> {
        Self::with_config(&ProductListSelectors::default(), base_url)
    }

    /// Create parser with custom selector configuration
    pub fn with_config(selectors: &ProductListSelectors, base_url: Url) -> ParsingResult<Self> {
        let card_strategies = Self::compile_selectors(&selectors.card_selectors)
            .into_iter()
            .map(|(label, cards)| CardStrategy { label, cards })
            .collect::<Vec<_>>();
        if card_strategies.is_empty() {
            return Err(ParsingError::invalid_selector(
                &selectors.card_selectors.join(", "),
                "no card selector compiled",
            ));
        }

        let title_selectors = Self::compiled_only(&selectors.title_selectors);
        if title_selectors.is_empty() {
            return Err(ParsingError::invalid_selector(
                &selectors.title_selectors.join(", "),
                "no title selector compiled",
            ));
        }

        let anchor_selector =
            Selector::parse("a[href]").map_err(|e| ParsingError::invalid_selector("a[href]", e))?;

        Ok(Self {
            base_url,
            card_strategies,
            title_selectors,
            price_selectors: Self::compiled_only(&selectors.price_selectors),
            image_selectors: Self::compiled_only(&selectors.image_selectors),
            lazy_image_attributes: selectors.lazy_image_attributes.clone(),
            load_more_selectors: Self::compiled_only(&selectors.load_more_selectors),
            anchor_selector,
        })
    }

    /// Compile selector strings, dropping (and logging) the ones that fail
    fn compile_selectors(selector_strings: &[String]) -> Vec<(String, Selector)> {
        selector_strings
            .iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(selector) => Some((s.clone(), selector)),
                Err(e) => {
                    warn!("Failed to compile selector '{}': {}", s, e);
                    None
                }
            })
            .collect()
    }

    fn compiled_only(selector_strings: &[String]) -> Vec<Selector> {
        Self::compile_selectors(selector_strings)
            .into_iter()
            .map(|(_, selector)| selector)
            .collect()
    }

    /// Parse raw listing markup
    pub fn parse(&self, html: &str, context: &ParseContext) -> ParsedPage {
        let document = Html::parse_document(html);
        self.parse_with_context(&document, context)
    }

    /// Walk the fallback chain and return the first pattern with qualifying cards
    fn select_cards<'a>(&self, html: &'a Html) -> Option<(&CardStrategy, Vec<ElementRef<'a>>, usize)> {
        for strategy in &self.card_strategies {
            let candidates: Vec<ElementRef> = html.select(&strategy.cards).collect();
            if candidates.is_empty() {
                continue;
            }

            let total = candidates.len();
            let qualifying: Vec<ElementRef> = candidates
                .into_iter()
                .filter(|card| self.find_title(card).is_some())
                .collect();

            if qualifying.is_empty() {
                debug!("Selector '{}' matched {} cards, none with a title", strategy.label, total);
                continue;
            }

            let skipped = total - qualifying.len();
            return Some((strategy, qualifying, skipped));
        }
        None
    }

    fn find_title<'a>(&self, card: &ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.title_selectors
            .iter()
            .find_map(|selector| card.select(selector).next())
    }

    /// Extract one record; an error means the card is skipped
    fn extract_product_from_element(
        &self,
        card: &ElementRef,
        index: usize,
        context: &ParseContext,
    ) -> ParsingResult<ProductRecord> {
        let title = self
            .find_title(card)
            .ok_or(ParsingError::TitleMissing { index })?;

        let name = collapse_whitespace(&title.text().collect::<String>());
        if name.is_empty() {
            return Err(ParsingError::TitleMissing { index });
        }

        let price = self.extract_price(card);
        let link = self.extract_link(&title);
        let image = self.extract_image(card);

        if let FieldOutcome::Unparsable { raw, reason } = &price {
            let error = ParsingError::PriceUnparsable {
                raw: raw.clone(),
                reason: reason.clone(),
            };
            debug!("Card {} ('{}') on page {}: {}", index, name, context.page, error);
        }
        for (field, unparsable) in [("link", link.is_unparsable()), ("image", image.is_unparsable())] {
            if unparsable {
                debug!("Card {} ('{}') on page {}: {} could not be parsed", index, name, context.page, field);
            }
        }

        Ok(ProductRecord {
            name,
            price: price.into_option(),
            link: link.into_option(),
            image: image.into_option(),
            collection_id: context.collection_id.clone(),
            observed_at: context.observed_at,
        })
    }

    fn extract_price(&self, card: &ElementRef) -> FieldOutcome<Price> {
        let Some(element) = self
            .price_selectors
            .iter()
            .find_map(|selector| card.select(selector).next())
        else {
            return FieldOutcome::Absent;
        };

        Price::from_listing_text(&element.text().collect::<String>())
    }

    /// Link of the title: its own href when it is an anchor, else the first
    /// anchor inside it
    fn extract_link(&self, title: &ElementRef) -> FieldOutcome<String> {
        let href = if title.value().name() == "a" {
            title.value().attr("href")
        } else {
            title
                .select(&self.anchor_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
        };

        let Some(href) = href else {
            return FieldOutcome::Absent;
        };

        match resolve_link(href, &self.base_url) {
            Ok(url) => FieldOutcome::Present(url),
            Err(e) => FieldOutcome::Unparsable {
                raw: href.to_string(),
                reason: e.to_string(),
            },
        }
    }

    /// Image source, preferring deferred-source attributes over `src`
    fn extract_image(&self, card: &ElementRef) -> FieldOutcome<String> {
        let Some(img) = self
            .image_selectors
            .iter()
            .find_map(|selector| card.select(selector).next())
        else {
            return FieldOutcome::Absent;
        };

        let element = img.value();
        let source = self
            .lazy_image_attributes
            .iter()
            .filter_map(|attr| element.attr(attr))
            .chain(element.attr("src"))
            .find(|value| !value.trim().is_empty() && !value.trim_start().starts_with("data:"));

        let Some(source) = source else {
            return FieldOutcome::Absent;
        };

        match resolve_image(source, &self.base_url) {
            Ok(url) => url.into(),
            Err(e) => FieldOutcome::Unparsable {
                raw: source.to_string(),
                reason: e.to_string(),
            },
        }
    }

    /// Check for the "load more" affordance
    pub fn has_load_more(&self, html: &Html) -> bool {
        self.load_more_selectors
            .iter()
            .any(|selector| html.select(selector).next().is_some())
    }
}

impl ContextualParser for ProductListParser {
    type Output = ParsedPage;
    type Context = ParseContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> Self::Output {
        let load_more_present = self.has_load_more(html);

        let Some((strategy, cards, mut skipped_cards)) = self.select_cards(html) else {
            debug!(
                "No product cards on page {} of {} (tried {} selectors)",
                context.page,
                context.collection_id,
                self.card_strategies.len()
            );
            return ParsedPage {
                load_more_present,
                ..ParsedPage::default()
            };
        };

        debug!("Found {} product cards using selector '{}'", cards.len(), strategy.label);

        let mut records = Vec::with_capacity(cards.len());
        for (index, card) in cards.iter().enumerate() {
            match self.extract_product_from_element(card, index, context) {
                Ok(record) => records.push(record),
                Err(e) => {
                    debug!("Skipping card {} on page {}: {}", index, context.page, e);
                    skipped_cards += 1;
                }
            }
        }

        ParsedPage {
            records,
            load_more_present,
            matched_strategy: Some(strategy.label.clone()),
            skipped_cards,
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
