//! Test utilities for the harvester
//!
//! A scripted transport that serves canned listing pages without touching the
//! network, plus builders for storefront-shaped listing markup.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{FetchOutcome, NetworkError};
use crate::infrastructure::http_client::Transport;

/// Transport answering from a fixed URL -> outcome table.
///
/// Unknown URLs fail with a connection error after one attempt.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: HashMap<String, FetchOutcome>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses
            .insert(url.into(), FetchOutcome::Success(body.into()));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, attempts: u32) -> Self {
        let url = url.into();
        let error = NetworkError::HttpStatus {
            url: url.clone(),
            status: 503,
        };
        self.responses
            .insert(url, FetchOutcome::Failure { error, attempts });
        self
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        self.responses.get(url).cloned().unwrap_or_else(|| FetchOutcome::Failure {
            error: NetworkError::Connection {
                url: url.to_string(),
                message: "no scripted response".to_string(),
            },
            attempts: 1,
        })
    }
}

/// One product card of a listing page
#[derive(Debug, Clone, Default)]
pub struct CardFixture {
    pub name: String,
    pub price: Option<String>,
    pub link: Option<String>,
    pub data_src: Option<String>,
    pub src: Option<String>,
}

impl CardFixture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn price(mut self, text: impl Into<String>) -> Self {
        self.price = Some(text.into());
        self
    }

    pub fn link(mut self, href: impl Into<String>) -> Self {
        self.link = Some(href.into());
        self
    }

    pub fn lazy_image(mut self, data_src: impl Into<String>, src: impl Into<String>) -> Self {
        self.data_src = Some(data_src.into());
        self.src = Some(src.into());
        self
    }

    fn render(&self) -> String {
        let attr = |name: &str, value: &Option<String>| {
            value
                .as_ref()
                .map(|v| format!(r#" {name}="{v}""#))
                .unwrap_or_default()
        };

        let image = if self.data_src.is_some() || self.src.is_some() {
            format!(
                r#"<img class="lazy"{}{}>"#,
                attr("data-src", &self.data_src),
                attr("src", &self.src)
            )
        } else {
            String::new()
        };
        let price = self
            .price
            .as_ref()
            .map(|p| format!(r#"<div class="smallest-price">{p}</div>"#))
            .unwrap_or_default();

        format!(
            r#"<div class="card">{image}<div class="card-body"><h5 class="card-title"><a{}>{}</a></h5>{price}</div></div>"#,
            attr("href", &self.link),
            self.name
        )
    }
}

/// Listing page with the given cards inside the category container
pub fn listing_page(cards: &[CardFixture], load_more: bool) -> String {
    let cards: String = cards.iter().map(CardFixture::render).collect();
    let load_more = if load_more {
        r#"<div id="exibir_mais_cards"><input type="button" value="Exibir mais"></div>"#
    } else {
        ""
    };
    format!(
        r#"<!DOCTYPE html><html><head><title>Liga SWU</title></head><body><div class="categoria">{cards}</div>{load_more}</body></html>"#
    )
}

/// Listing page with `count` priced cards named `<prefix> <n>`
pub fn numbered_listing_page(prefix: &str, count: usize, load_more: bool) -> String {
    let cards: Vec<CardFixture> = (0..count)
        .map(|i| {
            CardFixture::new(format!("{prefix} {i}"))
                .price(format!("R$ {},90", i + 1))
                .link(format!("/?view=cards/card&card={prefix}+{i}"))
        })
        .collect();
    listing_page(&cards, load_more)
}
