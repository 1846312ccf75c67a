//! Page retrieval and hyperlink extraction.
//!
//! The page is fetched once with a plain GET; any transport error or non-2xx
//! status is fatal for the ranking run. Links are read from every `<a href>`
//! element, resolved against the final (post-redirect) page URL.

use std::sync::LazyLock;

use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::matcher::Link;

/// Anchors that carry an href.
#[allow(clippy::expect_used)]
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid")); // Static selector, safe to panic

/// Errors fetching the page to rank.
#[derive(Debug, Error)]
pub enum PageError {
    /// The page URL could not be parsed.
    #[error("invalid page URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// Connection, DNS, TLS or body read failure.
    #[error("failed to fetch page {url}: {source}")]
    Network {
        /// The page URL.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching page {url}")]
    HttpStatus {
        /// The page URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

/// Fetches `url` and returns the final page URL with the body text.
///
/// # Errors
///
/// Returns [`PageError::InvalidUrl`] for an unparsable URL,
/// [`PageError::HttpStatus`] for a non-2xx response and
/// [`PageError::Network`] for transport failures.
#[instrument(skip(client))]
pub async fn fetch_page(client: &Client, url: &str) -> Result<(Url, String), PageError> {
    let parsed = Url::parse(url).map_err(|_| PageError::InvalidUrl {
        url: url.to_string(),
    })?;

    let network = |source| PageError::Network {
        url: url.to_string(),
        source,
    };
    let response = client.get(parsed).send().await.map_err(network)?;

    let status = response.status();
    if !status.is_success() {
        return Err(PageError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();
    let body = response.text().await.map_err(network)?;
    debug!(final_url = %final_url, bytes = body.len(), "fetched page");
    Ok((final_url, body))
}

/// Extracts every `<a href>` of `html` in document order.
///
/// Hrefs are resolved against `base`; ones that cannot be resolved are skipped.
/// The link text is the element's text pieces, each trimmed, concatenated.
#[must_use]
pub fn extract_links(html: &str, base: &Url) -> Vec<Link> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for element in document.select(&ANCHOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            trace!(href, "skipping unresolvable href");
            continue;
        };
        let text: String = element.text().map(str::trim).collect();
        links.push(Link::new(resolved.as_str(), text));
    }

    debug!(count = links.len(), "extracted links");
    links
}
