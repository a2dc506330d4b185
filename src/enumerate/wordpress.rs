//! WordPress REST API enumeration.
//!
//! Requests `{endpoint}?page=N&per_page=P&_fields=link,title,lang` for
//! N = 1, 2, ... until the API answers with an empty array, an HTTP 400 (page
//! out of range), the page count advertised in `X-WP-TotalPages` is reached,
//! a page after the first brings no URL not already seen (servers that ignore
//! `page`), or the page cap is hit.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{
    Enumerate, EnumerateError, EnumerateOptions, Enumeration, PostList, PostReference,
    decode_html_text,
};
use crate::fetch::{FetchError, PageClient};
use crate::language::LanguageVerdict;
use crate::source::{BlogSource, PaginationCursor};

/// Response header carrying the number of listing pages.
const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

/// Enumerates posts through the WordPress posts collection endpoint.
#[derive(Debug, Clone)]
pub struct WordPressEnumerator {
    client: PageClient,
    options: EnumerateOptions,
}

impl WordPressEnumerator {
    /// Creates the enumerator.
    #[must_use]
    pub fn new(client: PageClient, options: EnumerateOptions) -> Self {
        Self { client, options }
    }

    fn listing_url(&self, endpoint: &Url, page: u32) -> Url {
        let mut url = endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &self.options.per_page.to_string())
                .append_pair("_fields", "link,title,lang");
            if let Some(lang) = self.options.language.requested_primary() {
                query.append_pair("lang", &lang);
            }
        }
        url
    }
}

/// One listing entry reduced to what enumeration needs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ApiEntry {
    link: String,
    title: Option<String>,
    lang: Option<String>,
}

/// Reads `link`, `title.rendered` (or a plain string title) and `lang`.
///
/// Entries without a usable link are skipped.
fn parse_entries(listing: &[Value]) -> Vec<ApiEntry> {
    listing
        .iter()
        .filter_map(|entry| {
            let link = entry.get("link")?.as_str()?.trim();
            if !(link.starts_with("http://") || link.starts_with("https://")) {
                return None;
            }
            let title = entry
                .get("title")
                .and_then(|t| t.get("rendered").or(Some(t)))
                .and_then(Value::as_str)
                .map(decode_html_text);
            let lang = entry
                .get("lang")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(ApiEntry {
                link: link.to_string(),
                title,
                lang,
            })
        })
        .collect()
}

#[async_trait]
impl Enumerate for WordPressEnumerator {
    fn name(&self) -> &'static str {
        "wordpress_api"
    }

    #[instrument(skip(self, source), fields(base_url = %source.base_url()))]
    async fn enumerate(&self, source: &BlogSource) -> Enumeration {
        let mut result = Enumeration::default();
        let PaginationCursor::ApiPage {
            endpoint,
            page: first_page,
        } = source.cursor()
        else {
            warn!("WordPress enumerator given a non-API source");
            return result;
        };

        if let Some(lang) = self.options.language.requested() {
            info!(lang, "applying API language filter");
        }

        // URLs dropped for their language still count as seen for the
        // no-progress check below.
        let mut rejected: HashSet<Url> = HashSet::new();

        let mut posts = PostList::new();
        let mut total_pages: Option<u32> = None;
        let mut page = *first_page;

        loop {
            if result.pages_visited >= self.options.max_pages {
                info!(pages = result.pages_visited, "page cap reached");
                break;
            }
            if let Some(total) = total_pages
                && page > total
            {
                debug!(total, "advertised last page reached");
                break;
            }

            let url = self.listing_url(endpoint, page);
            result.pages_visited += 1;
            let listing = match self.client.get(&url).await {
                Ok(response) => {
                    if total_pages.is_none() {
                        total_pages = response
                            .header(TOTAL_PAGES_HEADER)
                            .and_then(|v| v.trim().parse().ok());
                    }
                    response.json::<Vec<Value>>()
                }
                Err(error) => Err(error),
            };

            let listing = match listing {
                Ok(listing) => listing,
                Err(FetchError::HttpStatus { status: 400, .. }) => {
                    debug!(page, "API rejected page index, end of results");
                    break;
                }
                Err(error) => {
                    warn!(page, error = %error, "API listing failed, keeping posts found so far");
                    result.truncated = Some(EnumerateError::truncated(
                        result.pages_visited,
                        url.as_str(),
                        error,
                    ));
                    break;
                }
            };

            if listing.is_empty() {
                debug!(page, "empty API page, end of results");
                break;
            }

            let mut added = 0_usize;
            let mut fresh = 0_usize;
            for entry in parse_entries(&listing) {
                let Ok(link) = Url::parse(&entry.link) else {
                    continue;
                };
                if self.options.language.verdict(entry.lang.as_deref()) == LanguageVerdict::Reject
                {
                    if rejected.insert(link) {
                        debug!(link = %entry.link, lang = ?entry.lang, "language differs, dropped before fetch");
                        result.rejected_by_language += 1;
                        fresh += 1;
                    }
                    continue;
                }
                let mut reference = PostReference::new(link).with_language(entry.lang);
                if let Some(title) = entry.title {
                    reference = reference.with_title_hint(title);
                }
                if posts.push(reference) {
                    added += 1;
                    fresh += 1;
                }
            }
            info!(page, added, total = posts.len(), "API page enumerated");

            if fresh == 0 && page > *first_page {
                info!(page, "API page repeated earlier results, stopping");
                break;
            }

            page = page.saturating_add(1);
        }

        result.posts = posts;
        result
    }
}
