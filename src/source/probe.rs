//! Pure helpers for the classifier probes.
//!
//! Everything here works on already-fetched data so the parsed document never
//! lives across an `.await`.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::fetch::FetchedPage;

/// Link relation WordPress uses to advertise its REST API root.
pub(crate) const WP_API_REL: &str = "https://api.w.org/";

#[allow(clippy::expect_used)]
static API_LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"link[rel="https://api.w.org/"][href]"#).expect("API link selector is valid")
});

#[allow(clippy::expect_used)]
static FEED_LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"link[rel~="alternate"][type="application/rss+xml"][href], link[rel~="alternate"][type="application/atom+xml"][href], link[rel~="alternate"][type="application/rdf+xml"][href]"#,
    )
    .expect("feed link selector is valid")
});

/// Discovery hints found on the base page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct BasePageHints {
    /// API root advertised through a `Link` header or `<link>` element.
    pub api_root: Option<Url>,
    /// Feeds advertised through `<link rel="alternate">`, in document order.
    pub feed_links: Vec<Url>,
}

pub(crate) fn inspect_base_page(page: &FetchedPage) -> BasePageHints {
    let header_root = page
        .headers
        .get_all("link")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| api_root_from_link_header(value, &page.url));

    let document = Html::parse_document(&page.body);
    let api_root = header_root.or_else(|| {
        document
            .select(&API_LINK_SELECTOR)
            .filter_map(|link| link.value().attr("href"))
            .find_map(|href| page.url.join(href.trim()).ok())
    });

    let mut feed_links: Vec<Url> = Vec::new();
    for href in document
        .select(&FEED_LINK_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
    {
        let Ok(url) = page.url.join(href.trim()) else {
            continue;
        };
        // comment feeds list comments, not posts
        if url.path().contains("/comments/") || feed_links.contains(&url) {
            continue;
        }
        feed_links.push(url);
    }

    BasePageHints {
        api_root,
        feed_links,
    }
}

/// Extracts the WordPress API root from one `Link` header value.
///
/// A header may carry several comma-separated links:
/// `<https://blog.example/wp-json/>; rel="https://api.w.org/", <...>; rel="alternate"`.
pub(crate) fn api_root_from_link_header(value: &str, base: &Url) -> Option<Url> {
    value.split(',').find_map(|part| {
        let (target, params) = part.trim().split_once(';')?;
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        let advertised = params.split(';').any(|param| {
            param
                .trim()
                .strip_prefix("rel=")
                .is_some_and(|rel| rel.trim_matches('"') == WP_API_REL)
        });
        if advertised {
            base.join(target).ok()
        } else {
            None
        }
    })
}

/// Builds the posts collection endpoint for an API root.
///
/// Sites without pretty permalinks advertise `/?rest_route=/`; for those the
/// route goes into the query instead of the path.
pub(crate) fn posts_endpoint(root: &Url) -> Option<Url> {
    if root.query_pairs().any(|(key, _)| key == "rest_route") {
        let mut endpoint = root.clone();
        endpoint
            .query_pairs_mut()
            .clear()
            .append_pair("rest_route", "/wp/v2/posts");
        return Some(endpoint);
    }

    let mut root = root.clone();
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    root.set_query(None);
    root.join("wp/v2/posts").ok()
}

/// Cheapest listing request proving the endpoint serves posts.
pub(crate) fn posts_probe_url(endpoint: &Url) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("per_page", "1")
        .append_pair("_fields", "link");
    url
}

/// Whether the response's media type leaves room for a feed body.
///
/// Feeds are served as `*xml*`, `*rss*`, `*atom*` or some `text/*` type, and
/// sometimes without any content type at all. Anything else (JSON, images,
/// archives) is skipped without parsing the body.
pub(crate) fn may_hold_feed(page: &FetchedPage) -> bool {
    page.media_type().is_none_or(|media| {
        media.starts_with("text/")
            || ["xml", "rss", "atom"].iter().any(|hint| media.contains(hint))
    })
}

/// Conventional feed locations, most specific first, without duplicates.
pub(crate) fn conventional_feed_urls(base: &Url) -> Vec<Url> {
    let mut base_dir = base.clone();
    base_dir.set_query(None);
    base_dir.set_fragment(None);
    if !base_dir.path().ends_with('/') {
        let path = format!("{}/", base_dir.path());
        base_dir.set_path(&path);
    }

    let mut urls: Vec<Url> = Vec::new();
    let candidates = [
        base_dir.join("feed/"),
        base.join("/feed/"),
        base.join("/rss.xml"),
        base.join("/atom.xml"),
        base.join("/index.xml"),
        base.join("/feed.xml"),
    ];
    for candidate in candidates.into_iter().flatten() {
        if !urls.contains(&candidate) {
            urls.push(candidate);
        }
    }
    urls
}
