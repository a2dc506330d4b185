//! Link enumeration: turn a classified [`BlogSource`] into an ordered,
//! duplicate-free list of post references.
//!
//! # Architecture
//!
//! - [`Enumerate`] - async trait with one implementation per [`SourceKind`]
//! - [`enumerator_for`] - picks the implementation by matching the closed enum
//! - [`PostList`] - insertion-ordered set keyed by post URL
//! - [`VisitedPages`] - cycle guard checked before following any "next" link
//!
//! Every strategy stops on an explicit end signal, a revisited page, or the
//! page cap, so enumeration always halts.

pub mod error;
pub mod feed;
pub mod heuristics;
pub mod html;
pub mod wordpress;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use scraper::Html;
use url::Url;

pub use error::EnumerateError;
pub use feed::FeedEnumerator;
pub use html::HtmlEnumerator;
pub use wordpress::WordPressEnumerator;

use crate::config::Heuristics;
use crate::fetch::PageClient;
use crate::language::LanguageFilter;
use crate::source::{BlogSource, SourceKind};

/// Default cap on listing pages followed per run.
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Posts requested per WordPress API listing page (the API maximum).
pub const DEFAULT_API_PER_PAGE: u32 = 100;

/// A post discovered on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    /// Absolute post URL; unique within one enumeration.
    pub url: Url,
    /// Title seen on the listing, if any.
    pub title_hint: Option<String>,
    /// Language declared by the listing, if any.
    pub language_code: Option<String>,
}

impl PostReference {
    /// A reference with no listing metadata.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            title_hint: None,
            language_code: None,
        }
    }

    /// Sets the listing title, ignoring blank values.
    #[must_use]
    pub fn with_title_hint(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.title_hint = (!title.trim().is_empty()).then(|| title.trim().to_string());
        self
    }

    /// Sets the declared language, ignoring blank values.
    #[must_use]
    pub fn with_language(mut self, code: Option<String>) -> Self {
        self.language_code = code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self
    }
}

/// Post references in discovery order, unique on URL.
#[derive(Debug, Clone, Default)]
pub struct PostList {
    posts: IndexMap<Url, PostReference>,
}

impl PostList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `reference` unless its URL is already present.
    ///
    /// Returns `true` when the reference was added.
    pub fn push(&mut self, reference: PostReference) -> bool {
        if self.posts.contains_key(&reference.url) {
            return false;
        }
        self.posts.insert(reference.url.clone(), reference);
        true
    }

    /// Whether a post with this URL was already discovered.
    #[must_use]
    pub fn contains(&self, url: &Url) -> bool {
        self.posts.contains_key(url)
    }

    /// Number of unique posts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Whether no post was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Iterates in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &PostReference> {
        self.posts.values()
    }

    /// Consumes the list, keeping discovery order.
    #[must_use]
    pub fn into_vec(self) -> Vec<PostReference> {
        self.posts.into_values().collect()
    }
}

/// Listing pages already requested during one enumeration.
#[derive(Debug, Clone, Default)]
pub struct VisitedPages {
    seen: HashSet<Url>,
}

impl VisitedPages {
    /// Creates an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url`; returns `false` when it was already visited.
    ///
    /// Fragments are ignored, so `/page/2/#main` and `/page/2/` are one page.
    pub fn insert(&mut self, url: &Url) -> bool {
        let mut key = url.clone();
        key.set_fragment(None);
        self.seen.insert(key)
    }

    /// Number of distinct pages visited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing was visited yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Result of walking one source.
#[derive(Debug, Default)]
pub struct Enumeration {
    /// Posts found, in discovery order.
    pub posts: PostList,
    /// Set when pagination stopped on a failure instead of an end signal.
    pub truncated: Option<EnumerateError>,
    /// Listing pages requested.
    pub pages_visited: usize,
    /// Entries dropped before fetching because their declared language differed.
    pub rejected_by_language: usize,
}

/// Runtime knobs shared by every strategy.
#[derive(Debug, Clone)]
pub struct EnumerateOptions {
    /// Requested language, sent to the API and used for pre-fetch rejection.
    pub language: LanguageFilter,
    /// Maximum listing pages to request.
    pub max_pages: usize,
    /// Posts per WordPress API page.
    pub per_page: u32,
}

impl Default for EnumerateOptions {
    fn default() -> Self {
        Self {
            language: LanguageFilter::none(),
            max_pages: DEFAULT_MAX_PAGES,
            per_page: DEFAULT_API_PER_PAGE,
        }
    }
}

/// One enumeration strategy.
///
/// Uses `async_trait` so strategies can be returned as `Box<dyn Enumerate>`.
#[async_trait]
pub trait Enumerate: Send + Sync {
    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Walks the source's listing pages and collects post references.
    async fn enumerate(&self, source: &BlogSource) -> Enumeration;
}

/// Returns the strategy matching `source.kind()`.
#[must_use]
pub fn enumerator_for(
    source: &BlogSource,
    client: PageClient,
    options: EnumerateOptions,
    heuristics: Arc<Heuristics>,
) -> Box<dyn Enumerate> {
    match source.kind() {
        SourceKind::WordPressApi => Box::new(WordPressEnumerator::new(client, options)),
        SourceKind::Feed => Box::new(FeedEnumerator::new(client, options)),
        SourceKind::Html => Box::new(HtmlEnumerator::new(client, options, heuristics)),
    }
}

/// Decodes entities and strips markup from a listing title, collapsing whitespace.
///
/// ```
/// use harvester_core::enumerate::decode_html_text;
///
/// assert_eq!(decode_html_text("Tom &amp; Jerry&#8217;s <em>day</em>"), "Tom & Jerry\u{2019}s day");
/// ```
#[must_use]
pub fn decode_html_text(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let text: String = parsed.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
