//! RSS 2.0, Atom and RSS 1.0 (RDF) enumeration.
//!
//! Entry links and titles are read with a streaming XML reader. Paging feeds
//! (RFC 5005) advertise the next document with `<link rel="next">`, which is
//! followed until it disappears, repeats, or the page cap is reached.

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{
    Enumerate, EnumerateError, EnumerateOptions, Enumeration, PostList, PostReference,
    VisitedPages, decode_html_text,
};
use crate::fetch::{FetchError, PageClient};
use crate::source::{BlogSource, PaginationCursor};

/// Why a document could not be read as a feed.
#[derive(Debug, Error)]
pub enum FeedParseError {
    /// The root element is not `rss`, `feed` or `RDF`.
    #[error("not a feed document (root element <{0}>)")]
    NotAFeed(String),
    /// The document has no root element.
    #[error("empty document")]
    Empty,
    /// The XML is malformed.
    #[error("malformed XML at byte {position}: {reason}")]
    Xml {
        /// Byte offset where reading failed.
        position: u64,
        /// Reader message.
        reason: String,
    },
}

/// One feed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Absolute entry link.
    pub link: Url,
    /// Decoded entry title.
    pub title: Option<String>,
    /// Entry language (`xml:lang` on the entry or a `dc:language` child).
    pub language: Option<String>,
}

/// A parsed feed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDocument {
    /// Entries in document order.
    pub entries: Vec<FeedEntry>,
    /// Feed-wide language.
    pub language: Option<String>,
    /// Next document in a paged feed.
    pub next: Option<Url>,
}

fn is_feed_root(name: &str) -> bool {
    matches!(name.to_ascii_lowercase().as_str(), "rss" | "feed" | "rdf")
}

/// Returns whether `text` is an RSS, Atom or RDF document, judging by its root element.
///
/// ```
/// use harvester_core::enumerate::feed::is_feed_document;
///
/// assert!(is_feed_document(r#"<?xml version="1.0"?><rss version="2.0"><channel/></rss>"#));
/// assert!(!is_feed_document("<!DOCTYPE html><html><body>hi</body></html>"));
/// ```
#[must_use]
pub fn is_feed_document(text: &str) -> bool {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                return is_feed_root(&local_name(&e));
            }
            Ok(Event::Eof) | Err(_) => return false,
            Ok(_) => {}
        }
    }
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).to_ascii_lowercase()
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.trim().to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Guid,
    Language,
}

impl Field {
    fn element(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Link => "link",
            Self::Guid => "guid",
            Self::Language => "language",
        }
    }
}

#[derive(Debug, Default)]
struct EntryDraft {
    link: Option<String>,
    guid: Option<String>,
    title: String,
    language: Option<String>,
}

/// Parses a feed document; relative links resolve against `document_url`.
///
/// # Errors
///
/// Returns [`FeedParseError`] when the root element is not a feed or the XML
/// is malformed.
pub fn parse_feed(text: &str, document_url: &Url) -> Result<FeedDocument, FeedParseError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut document = FeedDocument::default();
    let mut seen_root = false;
    let mut entry: Option<EntryDraft> = None;
    // Nesting level of open elements, and the level of the open item/entry.
    let mut depth = 0_usize;
    let mut entry_level: Option<usize> = None;
    let mut capture: Option<Field> = None;
    let mut buffer = String::new();

    loop {
        let event = reader.read_event().map_err(|e| FeedParseError::Xml {
            position: reader.buffer_position(),
            reason: e.to_string(),
        })?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = local_name(e);
                let level = depth + 1;
                if !is_empty {
                    depth = level;
                }
                // only direct children of an item/entry describe it
                let entry_child = entry_level.is_some_and(|open| level == open + 1);

                if !seen_root {
                    if !is_feed_root(&name) {
                        return Err(FeedParseError::NotAFeed(name));
                    }
                    seen_root = true;
                    document.language = attribute(e, b"xml:lang").filter(|l| !l.is_empty());
                    continue;
                }

                match name.as_str() {
                    "item" | "entry" if !is_empty && entry.is_none() => {
                        entry_level = Some(level);
                        entry = Some(EntryDraft {
                            language: attribute(e, b"xml:lang").filter(|l| !l.is_empty()),
                            ..EntryDraft::default()
                        });
                    }
                    "link" => {
                        let href = attribute(e, b"href");
                        let rel = attribute(e, b"rel").map(|r| r.to_ascii_lowercase());
                        let outside_entry = entry.is_none();
                        match (entry.as_mut().filter(|_| entry_child), href) {
                            (Some(draft), Some(href)) => {
                                if draft.link.is_none()
                                    && rel.as_deref().is_none_or(|r| r == "alternate")
                                {
                                    draft.link = Some(href);
                                }
                            }
                            (Some(_), None) if !is_empty => {
                                capture = Some(Field::Link);
                                buffer.clear();
                            }
                            (None, Some(href))
                                if outside_entry && rel.as_deref() == Some("next") =>
                            {
                                document.next = document_url.join(&href).ok();
                            }
                            _ => {}
                        }
                    }
                    "title" if entry_child && !is_empty && e.name().prefix().is_none() => {
                        capture = Some(Field::Title);
                        buffer.clear();
                    }
                    "guid" if entry_child && !is_empty => {
                        let permalink = attribute(e, b"isPermaLink")
                            .is_none_or(|v| !v.eq_ignore_ascii_case("false"));
                        if permalink {
                            capture = Some(Field::Guid);
                            buffer.clear();
                        }
                    }
                    "language" if !is_empty && (entry.is_none() || entry_child) => {
                        capture = Some(Field::Language);
                        buffer.clear();
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                if capture.is_some() {
                    match e.unescape() {
                        Ok(text) => buffer.push_str(&text),
                        // HTML entities such as &nbsp; are not XML entities
                        Err(_) => buffer.push_str(&String::from_utf8_lossy(&e)),
                    }
                }
            }
            Event::CData(e) => {
                if capture.is_some() {
                    buffer.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
                let level = depth;
                depth = depth.saturating_sub(1);

                if let Some(field) = capture
                    && field.element() == name
                {
                    let value = buffer.trim().to_string();
                    buffer.clear();
                    capture = None;
                    match (field, &mut entry) {
                        (Field::Title, Some(draft)) => draft.title = value,
                        (Field::Link, Some(draft)) if draft.link.is_none() => {
                            draft.link = Some(value);
                        }
                        (Field::Guid, Some(draft)) => draft.guid = Some(value),
                        (Field::Language, Some(draft)) if !value.is_empty() => {
                            draft.language = Some(value);
                        }
                        (Field::Language, None) if !value.is_empty() => {
                            document.language = Some(value);
                        }
                        _ => {}
                    }
                    continue;
                }

                if matches!(name.as_str(), "item" | "entry")
                    && entry_level == Some(level)
                    && let Some(draft) = entry.take()
                    && let Some(parsed) = finish_entry(draft, document_url)
                {
                    document.entries.push(parsed);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if seen_root {
        Ok(document)
    } else {
        Err(FeedParseError::Empty)
    }
}

fn finish_entry(draft: EntryDraft, document_url: &Url) -> Option<FeedEntry> {
    let candidate = draft
        .link
        .filter(|l| !l.is_empty())
        .or_else(|| draft.guid.filter(|g| g.starts_with("http")))?;
    let link = document_url.join(&candidate).ok()?;
    if !matches!(link.scheme(), "http" | "https") {
        return None;
    }
    let title = decode_html_text(&draft.title);
    Some(FeedEntry {
        link,
        title: (!title.is_empty()).then_some(title),
        language: draft.language,
    })
}

/// Enumerates posts from a (possibly paged) feed.
#[derive(Debug, Clone)]
pub struct FeedEnumerator {
    client: PageClient,
    options: EnumerateOptions,
}

impl FeedEnumerator {
    /// Creates the enumerator.
    #[must_use]
    pub fn new(client: PageClient, options: EnumerateOptions) -> Self {
        Self { client, options }
    }
}

#[async_trait]
impl Enumerate for FeedEnumerator {
    fn name(&self) -> &'static str {
        "feed"
    }

    #[instrument(skip(self, source), fields(base_url = %source.base_url()))]
    async fn enumerate(&self, source: &BlogSource) -> Enumeration {
        let mut result = Enumeration::default();
        let PaginationCursor::Document(first) = source.cursor() else {
            warn!("feed enumerator given a non-document source");
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
                info!(url = %url, "feed page already visited, stopping");
                break;
            }

            result.pages_visited += 1;
            let parsed = match self.client.get(&url).await {
                Ok(page) => parse_feed(&page.body, &page.url)
                    .map_err(|e| FetchError::decode(page.url.as_str(), e.to_string())),
                Err(error) => Err(error),
            };
            let document = match parsed {
                Ok(document) => document,
                Err(error) => {
                    warn!(url = %url, error = %error, "feed page failed, keeping posts found so far");
                    result.truncated = Some(EnumerateError::truncated(
                        result.pages_visited,
                        url.as_str(),
                        error,
                    ));
                    break;
                }
            };

            let mut added = 0_usize;
            for entry in document.entries {
                let language = entry.language.or_else(|| document.language.clone());
                let mut reference = PostReference::new(entry.link).with_language(language);
                if let Some(title) = entry.title {
                    reference = reference.with_title_hint(title);
                }
                if posts.push(reference) {
                    added += 1;
                }
            }
            info!(url = %url, added, total = posts.len(), "feed page enumerated");

            next = document.next;
        }

        result.posts = posts;
        result
    }
}
