//! Brand collections and their paginated listing URLs

use url::Url;

/// One brand/category listing, identified by a stable key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub base_url: Url,
}

impl Collection {
    pub fn new(id: impl Into<String>, base_url: Url) -> Self {
        Self {
            id: id.into(),
            base_url,
        }
    }

    /// URL of a listing page. Page 0 is the bare collection URL; later pages
    /// append `<page_param>=<page>` to the existing query.
    pub fn page_url(&self, page: u32, page_param: &str) -> Url {
        let mut url = self.base_url.clone();
        if page > 0 {
            url.query_pairs_mut()
                .append_pair(page_param, &page.to_string());
        }
        url
    }
}
