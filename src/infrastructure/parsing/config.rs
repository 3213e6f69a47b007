//! Parsing configuration for listing-page extraction
//!
//! Centralized CSS selectors. Every field holds an ordered fallback list, most
//! specific first.

use serde::{Deserialize, Serialize};

/// CSS selectors for product listing pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductListSelectors {
    /// Card patterns tried in order; the first one with a qualifying card wins
    pub card_selectors: Vec<String>,

    /// Title sub-element of a card; a card without one is not a product
    pub title_selectors: Vec<String>,

    /// Price text inside a card
    pub price_selectors: Vec<String>,

    /// Product image inside a card
    pub image_selectors: Vec<String>,

    /// Deferred-source attributes checked before `src`
    pub lazy_image_attributes: Vec<String>,

    /// "Load more" affordance anywhere on the page
    pub load_more_selectors: Vec<String>,
}

impl Default for ProductListSelectors {
    fn default() -> Self {
        Self {
            card_selectors: vec![
                "div.categoria div.card".to_string(),
                ".categoria .card".to_string(),
                "div.card".to_string(),
                ".card".to_string(),
            ],
            title_selectors: vec![
                "h5.card-title a".to_string(),
                ".card-title".to_string(),
            ],
            price_selectors: vec![
                ".smallest-price".to_string(),
                ".price".to_string(),
            ],
            image_selectors: vec![
                "img.lazy".to_string(),
                "img".to_string(),
            ],
            lazy_image_attributes: vec![
                "data-src".to_string(),
                "data-lazy".to_string(),
                "data-original".to_string(),
            ],
            load_more_selectors: vec![
                "#exibir_mais_cards input".to_string(),
                ".exibir-mais".to_string(),
            ],
        }
    }
}
