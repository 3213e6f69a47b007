//! Link and image URL normalization against the storefront origin

use url::Url;

use super::error::{ParsingError, ParsingResult};

/// Resolve a product link. Absolute URLs are kept, anything else is joined
/// onto the storefront origin.
pub fn resolve_link(href: &str, base: &Url) -> ParsingResult<String> {
    let href = href.trim();
    if href.is_empty() {
        return Err(ParsingError::UrlResolutionFailed {
            url: href.to_string(),
            reason: "empty href".to_string(),
        });
    }

    join(href, base)
}

/// Resolve an image source. Protocol-relative references get an explicit
/// `https:` scheme; inline `data:` placeholders are not images.
pub fn resolve_image(src: &str, base: &Url) -> ParsingResult<Option<String>> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return Ok(None);
    }

    if let Some(rest) = src.strip_prefix("//") {
        let absolute = format!("https://{rest}");
        return Url::parse(&absolute)
            .map(|u| Some(u.to_string()))
            .map_err(|e| ParsingError::UrlResolutionFailed {
                url: src.to_string(),
                reason: e.to_string(),
            });
    }

    join(src, base).map(Some)
}

fn join(reference: &str, base: &Url) -> ParsingResult<String> {
    base.join(reference)
        .map(|u| u.to_string())
        .map_err(|e| ParsingError::UrlResolutionFailed {
            url: reference.to_string(),
            reason: format!("Failed to join with {base}: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn base() -> Url {
        Url::parse("https://www.ligaswu.com.br").unwrap()
    }

    #[rstest]
    #[case("/produto/123", "https://www.ligaswu.com.br/produto/123")]
    #[case("produto/123", "https://www.ligaswu.com.br/produto/123")]
    #[case("?view=cards/card&card=Vader", "https://www.ligaswu.com.br/?view=cards/card&card=Vader")]
    #[case("https://other.com/test", "https://other.com/test")]
    fn links_resolve_against_origin(#[case] href: &str, #[case] expected: &str) {
        assert_eq!(resolve_link(href, &base()).unwrap(), expected);
    }

    #[rstest]
    #[case("//cdn.site.com/x.jpg", Some("https://cdn.site.com/x.jpg"))]
    #[case("/img/cards/1.png", Some("https://www.ligaswu.com.br/img/cards/1.png"))]
    #[case("http://cdn.site.com/y.jpg", Some("http://cdn.site.com/y.jpg"))]
    #[case("data:image/gif;base64,R0lGOD", None)]
    #[case("   ", None)]
    fn images_are_normalized(#[case] src: &str, #[case] expected: Option<&str>) {
        assert_eq!(resolve_image(src, &base()).unwrap().as_deref(), expected);
    }

    #[test]
    fn empty_link_is_an_error() {
        assert!(matches!(
            resolve_link("  ", &base()),
            Err(ParsingError::UrlResolutionFailed { .. })
        ));
    }
}
