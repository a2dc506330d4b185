//! Content extraction: fetch one post and isolate its readable text.
//!
//! [`extract_post`] is pure and works on an already-fetched page;
//! [`ContentExtractor`] adds the network fetch around it.
//!
//! - the main container is the best-scoring candidate from
//!   [`scoring::best_candidate`], or `<body>` when it holds too little text
//! - the title comes from heading selectors, then `og:title`, then `<title>`,
//!   then the listing's title hint
//! - the language is the listing's code, else what the page declares
//! - the date comes from date selectors, else a date pattern near the title

mod error;
pub mod scoring;
pub mod text;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

pub use error::ExtractError;

use crate::config::{Heuristics, compile_selectors};
use crate::enumerate::PostReference;
use crate::fetch::PageClient;
use text::{collapse_whitespace, render_text};

/// Characters of text searched for a date around the title.
const DATE_SEARCH_CHARS: usize = 500;

#[allow(clippy::expect_used)]
static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("body selector is valid"));

#[allow(clippy::expect_used)]
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head title, title").expect("title selector is valid"));

#[allow(clippy::expect_used)]
static OG_TITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:title"][content]"#).expect("og:title selector is valid")
});

#[allow(clippy::expect_used)]
static OG_LOCALE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:locale"][content]"#).expect("og:locale selector is valid")
});

#[allow(clippy::expect_used)]
static HTTP_EQUIV: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[http-equiv][content]").expect("http-equiv selector is valid")
});

/// Text and metadata of one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPost {
    /// URL of the [`PostReference`] this post came from.
    pub source_url: Url,
    /// Post title; empty when nothing usable was found.
    pub title: String,
    /// Whitespace-normalised plain text.
    pub body_text: String,
    /// Listing or page-declared language.
    pub language_code: Option<String>,
    /// Publication date as written on the page.
    pub published: Option<String>,
}

/// Extracts a post from its HTML.
///
/// # Errors
///
/// Returns [`ExtractError::PostParseFailed`] when the page has no readable text.
pub fn extract_post(
    html: &str,
    reference: &PostReference,
    heuristics: &Heuristics,
) -> Result<ExtractedPost, ExtractError> {
    let document = Html::parse_document(html);
    let body = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    let hints = compile_selectors(&heuristics.content_hints);
    let mut body_text = String::new();
    if let Some(candidate) = scoring::best_candidate(body, heuristics, &hints) {
        let text = render_text(candidate, heuristics);
        if text.chars().count() >= heuristics.min_content_chars {
            body_text = text;
        } else {
            debug!(
                chars = text.chars().count(),
                min = heuristics.min_content_chars,
                "best candidate too short, falling back to body"
            );
        }
    }
    if body_text.is_empty() {
        body_text = render_text(body, heuristics);
    }
    if body_text.is_empty() {
        return Err(ExtractError::parse_failed(
            reference.url.as_str(),
            "page has no readable text",
        ));
    }

    let heading = find_title_heading(&document, heuristics);
    let title = heading
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .or_else(|| meta_title(&document))
        .or_else(|| reference.title_hint.clone())
        .unwrap_or_default();

    let language_code = reference
        .language_code
        .clone()
        .or_else(|| declared_language(&document));

    let published = find_date(&document, heuristics, heading.unwrap_or(body));

    Ok(ExtractedPost {
        source_url: reference.url.clone(),
        title,
        body_text,
        language_code,
        published,
    })
}

fn find_title_heading<'a>(document: &'a Html, heuristics: &Heuristics) -> Option<ElementRef<'a>> {
    compile_selectors(&heuristics.title_selectors)
        .iter()
        .find_map(|selector| {
            document
                .select(selector)
                .find(|el| !collapse_whitespace(&el.text().collect::<String>()).is_empty())
        })
}

fn meta_title(document: &Html) -> Option<String> {
    let og = document
        .select(&OG_TITLE)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|t| !t.is_empty());
    og.or_else(|| {
        document
            .select(&TITLE)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .find(|t| !t.is_empty())
    })
}

/// Language the page declares: `<html lang>`, a `content-language` meta, or `og:locale`.
fn declared_language(document: &Html) -> Option<String> {
    let non_empty = |value: &str| {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    };

    document
        .root_element()
        .value()
        .attr("lang")
        .and_then(non_empty)
        .or_else(|| {
            document
                .select(&HTTP_EQUIV)
                .filter(|el| {
                    el.value()
                        .attr("http-equiv")
                        .is_some_and(|v| v.eq_ignore_ascii_case("content-language"))
                })
                .filter_map(|el| el.value().attr("content"))
                .find_map(|v| v.split(',').next().and_then(non_empty))
        })
        .or_else(|| {
            document
                .select(&OG_LOCALE)
                .filter_map(|el| el.value().attr("content"))
                .find_map(non_empty)
        })
}

fn find_date(document: &Html, heuristics: &Heuristics, anchor: ElementRef<'_>) -> Option<String> {
    let pattern = Regex::new(&heuristics.date_pattern).ok();

    for selector in compile_selectors(&heuristics.date_selectors) {
        let Some(element) = document.select(&selector).next() else {
            continue;
        };
        let value = element
            .value()
            .attr("datetime")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or_else(
                || collapse_whitespace(&element.text().collect::<String>()),
                str::to_string,
            );
        if !value.is_empty() && pattern.as_ref().is_none_or(|p| p.is_match(&value)) {
            return Some(value);
        }
    }

    let pattern = pattern?;
    let area = anchor
        .parent()
        .and_then(ElementRef::wrap)
        .unwrap_or(anchor);
    let nearby: String = collapse_whitespace(&area.text().collect::<Vec<_>>().join(" "))
        .chars()
        .take(DATE_SEARCH_CHARS)
        .collect();
    pattern.find(&nearby).map(|m| m.as_str().to_string())
}

/// Fetches posts and extracts them with shared heuristics.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    client: PageClient,
    heuristics: Arc<Heuristics>,
}

impl ContentExtractor {
    /// Creates an extractor.
    #[must_use]
    pub fn new(client: PageClient, heuristics: Arc<Heuristics>) -> Self {
        Self { client, heuristics }
    }

    /// Fetches and extracts one post.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::PostFetchFailed`] when the page cannot be
    /// fetched and [`ExtractError::PostParseFailed`] when it has no text.
    #[instrument(skip(self, reference), fields(url = %reference.url))]
    pub async fn extract(&self, reference: &PostReference) -> Result<ExtractedPost, ExtractError> {
        let page = self
            .client
            .get(&reference.url)
            .await
            .map_err(|e| ExtractError::fetch_failed(reference.url.as_str(), e))?;
        let post = extract_post(&page.body, reference, &self.heuristics)?;
        debug!(
            title = %post.title,
            chars = post.body_text.chars().count(),
            language = ?post.language_code,
            "post extracted"
        );
        Ok(post)
    }
}
