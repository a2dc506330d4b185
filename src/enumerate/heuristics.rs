//! Link-likelihood and pagination heuristics for HTML index pages.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::{Heuristics, compile_selectors};

/// Strips a leading `www.` so `www.blog.example` and `blog.example` compare equal.
fn bare_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map_or(host.clone(), str::to_string))
}

/// Same scheme family, same host ignoring `www.`, same port.
#[must_use]
pub fn same_site(a: &Url, b: &Url) -> bool {
    bare_host(a).is_some() && bare_host(a) == bare_host(b) && a.port_or_known_default() == b.port_or_known_default()
}

/// Path prefix under which posts of this blog live: `/` or `/{first segment}/`.
///
/// A first segment that looks like a file (`/index.html`) means the blog
/// lives at the site root.
#[must_use]
pub fn blog_root(base: &Url) -> String {
    match base.path_segments().and_then(|mut s| s.next()) {
        Some(first) if !first.is_empty() && !first.contains('.') => format!("/{first}/"),
        _ => "/".to_string(),
    }
}

fn without_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

fn same_page(a: &Url, b: &Url) -> bool {
    same_site(a, b)
        && without_trailing_slash(a.path()) == without_trailing_slash(b.path())
        && a.query() == b.query()
}

/// Decides whether an absolute link found on an index page leads to a post.
///
/// `index` is the page being scanned and `base` the URL the user gave; a link
/// back to either is never a post.
#[must_use]
pub fn is_likely_post_url(candidate: &Url, base: &Url, index: &Url, heuristics: &Heuristics) -> bool {
    if !matches!(candidate.scheme(), "http" | "https") {
        return false;
    }
    if candidate.fragment().is_some() {
        return false;
    }
    if !same_site(candidate, base) {
        return false;
    }
    if same_page(candidate, base) || same_page(candidate, index) {
        return false;
    }

    let path = candidate.path();
    let root = blog_root(base);
    if !path.starts_with(&root) || path.len() <= root.len() {
        return false;
    }

    let lower_path = path.to_ascii_lowercase();
    if heuristics
        .excluded_path_segments
        .iter()
        .any(|segment| lower_path.contains(&segment.to_ascii_lowercase()))
    {
        return false;
    }
    if candidate.query_pairs().any(|(key, _)| {
        heuristics
            .excluded_query_params
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(&key))
    }) {
        return false;
    }
    if heuristics
        .excluded_extensions
        .iter()
        .any(|ext| lower_path.ends_with(&ext.to_ascii_lowercase()))
    {
        return false;
    }
    true
}

/// Collapsed visible text of an element.
pub(crate) fn collapsed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether an anchor wraps an image with non-empty alt text.
pub(crate) fn has_image_with_alt(anchor: ElementRef<'_>) -> bool {
    anchor.descendants().filter_map(ElementRef::wrap).any(|el| {
        el.value().name() == "img" && el.value().attr("alt").is_some_and(|alt| !alt.trim().is_empty())
    })
}

/// Whether an anchor's text is long enough to be a post title.
#[must_use]
pub fn anchor_text_qualifies(anchor: ElementRef<'_>, heuristics: &Heuristics) -> bool {
    collapsed_text(anchor).chars().count() >= heuristics.min_link_text_chars || has_image_with_alt(anchor)
}

fn normalized_label(text: &str) -> String {
    text.trim().to_lowercase()
}

fn label_without_arrows(label: &str) -> String {
    label
        .trim_matches(|c: char| c.is_whitespace() || "»›«‹→←<>".contains(c))
        .to_string()
}

fn is_next_label(text: &str, heuristics: &Heuristics) -> bool {
    let label = normalized_label(text);
    if label.is_empty() {
        return false;
    }
    let bare = label_without_arrows(&label);
    heuristics
        .next_page_texts
        .iter()
        .map(|t| normalized_label(t))
        .any(|known| known == label || (!bare.is_empty() && known == bare))
}

/// Finds the next index page: configured selectors first, then anchor texts.
///
/// Only same-site links that differ from the current page qualify.
#[must_use]
pub fn find_next_page(document: &Html, page_url: &Url, heuristics: &Heuristics) -> Option<Url> {
    let resolve = |href: &str| -> Option<Url> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        let mut url = page_url.join(href).ok()?;
        url.set_fragment(None);
        (same_site(&url, page_url) && !same_page(&url, page_url)).then_some(url)
    };

    for selector in compile_selectors(&heuristics.next_page_selectors) {
        if let Some(url) = document
            .select(&selector)
            .filter_map(|el| el.value().attr("href"))
            .find_map(resolve)
        {
            return Some(url);
        }
    }

    let anchors = Selector::parse("a[href]").ok()?;
    document
        .select(&anchors)
        .filter(|anchor| {
            is_next_label(&collapsed_text(*anchor), heuristics)
                || anchor
                    .value()
                    .attr("aria-label")
                    .is_some_and(|label| is_next_label(label, heuristics))
        })
        .filter_map(|anchor| anchor.value().attr("href"))
        .find_map(resolve)
}
