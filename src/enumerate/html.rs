//! HTML index page enumeration.
//!
//! Scans anchors on the index page, keeps the ones that look like post links,
//! then follows the "next page" reference until none is found, a page repeats,
//! or the page cap is reached.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::heuristics::{
    anchor_text_qualifies, collapsed_text, find_next_page, is_likely_post_url,
};
use super::{
    Enumerate, EnumerateError, EnumerateOptions, Enumeration, PostList, PostReference,
    VisitedPages,
};
use crate::config::Heuristics;
use crate::extract::scoring::within_page_chrome;
use crate::fetch::PageClient;
use crate::source::{BlogSource, PaginationCursor};

#[allow(clippy::expect_used)]
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// What one index page contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexScan {
    /// Post links in document order, possibly with repeats.
    pub links: Vec<PostReference>,
    /// Next index page, if any.
    pub next: Option<Url>,
}

/// Scans one index page. Pure: no network access.
#[must_use]
pub fn scan_index_page(body: &str, page_url: &Url, base_url: &Url, heuristics: &Heuristics) -> IndexScan {
    let document = Html::parse_document(body);
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty()
            || href.starts_with('#')
            || ["mailto:", "tel:", "javascript:"]
                .iter()
                .any(|scheme| href.to_ascii_lowercase().starts_with(scheme))
        {
            continue;
        }
        let Ok(url) = page_url.join(href) else {
            continue;
        };
        if !is_likely_post_url(&url, base_url, page_url, heuristics) {
            continue;
        }
        if within_page_chrome(anchor, heuristics) {
            continue;
        }
        if !anchor_text_qualifies(anchor, heuristics) {
            continue;
        }

        let text = collapsed_text(anchor);
        let title = if text.is_empty() {
            anchor.value().attr("title").unwrap_or_default().to_string()
        } else {
            text
        };
        links.push(PostReference::new(url).with_title_hint(title));
    }

    IndexScan {
        links,
        next: find_next_page(&document, page_url, heuristics),
    }
}

/// Enumerates posts by scraping index pages.
#[derive(Debug, Clone)]
pub struct HtmlEnumerator {
    client: PageClient,
    options: EnumerateOptions,
    heuristics: Arc<Heuristics>,
}

impl HtmlEnumerator {
    /// Creates the enumerator.
    #[must_use]
    pub fn new(client: PageClient, options: EnumerateOptions, heuristics: Arc<Heuristics>) -> Self {
        Self {
            client,
            options,
            heuristics,
        }
    }
}

#[async_trait]
impl Enumerate for HtmlEnumerator {
    fn name(&self) -> &'static str {
        "html"
    }

    #[instrument(skip(self, source), fields(base_url = %source.base_url()))]
    async fn enumerate(&self, source: &BlogSource) -> Enumeration {
        let mut result = Enumeration::default();
        let PaginationCursor::Document(first) = source.cursor() else {
            warn!("HTML enumerator given a non-document source");
            return result;
        };

        let mut posts = PostList::new();
        let mut visited = VisitedPages::new();
        let mut next = Some(first.clone());

        while let Some(url) = next.take() {
            if result.pages_visited >= self.options.max_pages {
                info!(pages = result.pages_visited, "page cap reached");
                break;
            }
            if !visited.insert(&url) {
                info!(url = %url, "index page already visited, stopping");
                break;
            }

            result.pages_visited += 1;
            let page = match self.client.get(&url).await {
                Ok(page) => page,
                Err(error) => {
                    warn!(url = %url, error = %error, "index page failed, keeping posts found so far");
                    result.truncated = Some(EnumerateError::truncated(
                        result.pages_visited,
                        url.as_str(),
                        error,
                    ));
                    break;
                }
            };

            let scan = scan_index_page(&page.body, &page.url, source.base_url(), &self.heuristics);
            let found = scan.links.len();
            let mut added = 0_usize;
            for reference in scan.links {
                if posts.push(reference) {
                    added += 1;
                }
            }
            info!(url = %url, found, added, total = posts.len(), "index page enumerated");
            if let Some(next_url) = &scan.next {
                debug!(next = %next_url, "following next index page");
            }

            next = scan.next;
        }

        result.posts = posts;
        result
    }
}
