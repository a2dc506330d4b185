//! Source classification: how does this blog expose its list of posts?
//!
//! [`classify`] probes, in order of preference, a WordPress REST API, a
//! syndication feed, and finally the base page itself as an HTML index. The
//! first probe that succeeds decides the [`BlogSource`]; strategies are never
//! merged. A failing probe only demotes to the next one.
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::fetch::{ClientSettings, PageClient};
//! use harvester_core::source::classify;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PageClient::new(ClientSettings::default())?;
//! let source = classify(&client, &Url::parse("https://blog.example.com/")?).await?;
//! println!("{} via {}", source.base_url(), source.kind());
//! # Ok(())
//! # }
//! ```

mod error;
mod probe;

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, instrument};
use url::Url;

pub use error::ClassifyError;

use crate::enumerate::feed::is_feed_document;
use crate::fetch::{FetchError, PageClient};

/// Strategy used to enumerate a blog's posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// WordPress REST API listing (`/wp-json/wp/v2/posts`).
    WordPressApi,
    /// RSS, Atom or RDF feed.
    Feed,
    /// Plain HTML index page.
    Html,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WordPressApi => "wordpress_api",
            Self::Feed => "feed",
            Self::Html => "html",
        };
        f.write_str(name)
    }
}

/// Where enumeration starts; the shape depends on the [`SourceKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationCursor {
    /// Posts collection endpoint and first page index.
    ApiPage {
        /// `.../wp/v2/posts` endpoint without listing parameters.
        endpoint: Url,
        /// First page to request (1-based).
        page: u32,
    },
    /// First feed or index document.
    Document(Url),
}

/// A classified blog. Built once by [`classify`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogSource {
    base_url: Url,
    kind: SourceKind,
    cursor: PaginationCursor,
}

impl BlogSource {
    /// A blog enumerated through its WordPress posts endpoint.
    #[must_use]
    pub fn wordpress(base_url: Url, endpoint: Url) -> Self {
        Self {
            base_url,
            kind: SourceKind::WordPressApi,
            cursor: PaginationCursor::ApiPage { endpoint, page: 1 },
        }
    }

    /// A blog enumerated through a feed starting at `feed_url`.
    #[must_use]
    pub fn feed(base_url: Url, feed_url: Url) -> Self {
        Self {
            base_url,
            kind: SourceKind::Feed,
            cursor: PaginationCursor::Document(feed_url),
        }
    }

    /// A blog enumerated by scraping the index page at `index_url`.
    #[must_use]
    pub fn html(base_url: Url, index_url: Url) -> Self {
        Self {
            base_url,
            kind: SourceKind::Html,
            cursor: PaginationCursor::Document(index_url),
        }
    }

    /// Base URL the user asked for.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Chosen strategy.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Starting point of enumeration.
    #[must_use]
    pub fn cursor(&self) -> &PaginationCursor {
        &self.cursor
    }
}

/// Tracks failed probes so the terminal error can say what happened.
#[derive(Debug, Default)]
struct ProbeLog {
    attempts: usize,
    last_error: Option<String>,
}

impl ProbeLog {
    fn attempt(&mut self) {
        self.attempts += 1;
    }

    fn failed(&mut self, probe: &str, reason: impl fmt::Display) {
        debug!(probe, reason = %reason, "probe failed");
        self.last_error = Some(reason.to_string());
    }

    fn into_error(self, base_url: &Url) -> ClassifyError {
        ClassifyError::unreachable(
            base_url.as_str(),
            self.attempts,
            self.last_error.unwrap_or_else(|| "no probe succeeded".to_string()),
        )
    }
}

/// Classifies `base_url` into a [`BlogSource`].
///
/// # Errors
///
/// Returns [`ClassifyError::SourceUnreachable`] when no API, no feed and not
/// even the base page could be fetched.
#[instrument(skip(client), fields(base_url = %base_url))]
pub async fn classify(client: &PageClient, base_url: &Url) -> Result<BlogSource, ClassifyError> {
    let mut log = ProbeLog::default();

    let origin_root = base_url.join("/wp-json/").ok();
    if let Some(root) = &origin_root
        && let Some(endpoint) = probe_wordpress(client, root, &mut log).await
    {
        info!(endpoint = %endpoint, "classified as WordPress API");
        return Ok(BlogSource::wordpress(base_url.clone(), endpoint));
    }

    log.attempt();
    let base_page = match client.get(base_url).await {
        Ok(page) => Some(page),
        Err(error) => {
            log.failed("base page", &error);
            None
        }
    };

    let mut probed_feeds: HashSet<Url> = HashSet::new();

    if let Some(page) = &base_page {
        let hints = probe::inspect_base_page(page);

        if let Some(root) = hints
            .api_root
            .filter(|root| Some(root) != origin_root.as_ref())
            && let Some(endpoint) = probe_wordpress(client, &root, &mut log).await
        {
            info!(endpoint = %endpoint, "classified as WordPress API (advertised root)");
            return Ok(BlogSource::wordpress(base_url.clone(), endpoint));
        }

        if is_feed_document(&page.body) {
            info!(feed = %page.url, "base URL is itself a feed");
            return Ok(BlogSource::feed(base_url.clone(), page.url.clone()));
        }

        for feed_url in hints.feed_links {
            probed_feeds.insert(feed_url.clone());
            if let Some(found) = probe_feed(client, &feed_url, &mut log).await {
                info!(feed = %found, "classified as feed (advertised)");
                return Ok(BlogSource::feed(base_url.clone(), found));
            }
        }
    }

    for feed_url in probe::conventional_feed_urls(base_url) {
        if !probed_feeds.insert(feed_url.clone()) {
            continue;
        }
        if let Some(found) = probe_feed(client, &feed_url, &mut log).await {
            info!(feed = %found, "classified as feed (conventional path)");
            return Ok(BlogSource::feed(base_url.clone(), found));
        }
    }

    if let Some(page) = base_page {
        info!(index = %page.url, "classified as HTML index");
        return Ok(BlogSource::html(base_url.clone(), page.url));
    }

    Err(log.into_error(base_url))
}

async fn probe_wordpress(client: &PageClient, root: &Url, log: &mut ProbeLog) -> Option<Url> {
    let endpoint = probe::posts_endpoint(root)?;
    let probe_url = probe::posts_probe_url(&endpoint);

    log.attempt();
    let listing = client
        .get(&probe_url)
        .await
        .and_then(|page| page.json::<Vec<serde_json::Value>>());
    match listing {
        Ok(_) => Some(endpoint),
        Err(error) => {
            log.failed("wordpress api", &error);
            None
        }
    }
}

async fn probe_feed(client: &PageClient, feed_url: &Url, log: &mut ProbeLog) -> Option<Url> {
    log.attempt();
    let page = match client.get(feed_url).await {
        Ok(page) => page,
        Err(error) => {
            log.failed("feed", &error);
            return None;
        }
    };
    if !probe::may_hold_feed(&page) {
        log.failed(
            "feed",
            FetchError::decode(
                feed_url.as_str(),
                format!("unexpected media type {}", page.media_type().unwrap_or_default()),
            ),
        );
        return None;
    }
    if is_feed_document(&page.body) {
        Some(page.url)
    } else {
        log.failed(
            "feed",
            FetchError::decode(feed_url.as_str(), "not an RSS, Atom or RDF document"),
        );
        None
    }
}
