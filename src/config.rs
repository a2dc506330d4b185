//! Heuristic data driving link discovery and content extraction.
//!
//! Blog templates vary too much for one hard-coded rule set, so every list the
//! enumerators and the extractor consult lives in [`Heuristics`]. The defaults
//! cover common WordPress, Blogger, Ghost and static-site themes; a TOML file
//! passed with `--heuristics` overrides any subset of fields.
//!
//! ```toml
//! version = 1
//! boilerplate_class_segments = ["sidebar", "widget", "promo-box"]
//! min_content_chars = 120
//! ```

use std::path::{Path, PathBuf};

use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Heuristics format version understood by this build.
pub const HEURISTICS_VERSION: u32 = 1;

/// Errors raised while loading or validating a heuristics file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The heuristics file could not be read.
    #[error("cannot read heuristics file {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The heuristics file is not valid TOML for [`Heuristics`].
    #[error("cannot parse heuristics: {reason}")]
    Parse {
        /// Parser message, including the offending line.
        reason: String,
    },

    /// The file declares a version this build does not understand.
    #[error("unsupported heuristics version {found} (supported: {HEURISTICS_VERSION})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
    },

    /// A CSS selector in the file does not parse.
    #[error("invalid selector {selector:?} in {field}: {reason}")]
    InvalidSelector {
        /// Field holding the selector.
        field: &'static str,
        /// The selector text.
        selector: String,
        /// Parser message.
        reason: String,
    },

    /// The date pattern is not a valid regular expression.
    #[error("invalid date_pattern: {reason}")]
    InvalidPattern {
        /// Regex compiler message.
        reason: String,
    },
}

/// Versioned, overridable heuristic data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Heuristics {
    /// Format version, must equal [`HEURISTICS_VERSION`].
    pub version: u32,

    /// Element names that are never content (`nav`, `footer`, ...).
    pub boilerplate_tags: Vec<String>,
    /// ARIA roles marking page chrome.
    pub boilerplate_roles: Vec<String>,
    /// `class`/`id` segments (split on `-` and `_`) marking page chrome.
    pub boilerplate_class_segments: Vec<String>,

    /// Selectors that usually wrap the article body; matches get a score bonus.
    pub content_hints: Vec<String>,
    /// Score multiplier applied to content hint matches.
    pub content_hint_bonus: f64,
    /// Candidate text shorter than this falls back to `<body>`.
    pub min_content_chars: usize,

    /// Title selectors in priority order.
    pub title_selectors: Vec<String>,
    /// Date selectors in priority order.
    pub date_selectors: Vec<String>,
    /// Regex used when no date selector matches.
    pub date_pattern: String,

    /// Path segments of index links that never lead to a post.
    pub excluded_path_segments: Vec<String>,
    /// Query parameters of index links that never lead to a post.
    pub excluded_query_params: Vec<String>,
    /// File extensions of index links that never lead to a post.
    pub excluded_extensions: Vec<String>,
    /// Anchor text shorter than this is ignored unless it wraps an image with alt text.
    pub min_link_text_chars: usize,

    /// Selectors locating a "next page" reference on an index page.
    pub next_page_selectors: Vec<String>,
    /// Anchor texts (case-insensitive) that denote the next index page.
    pub next_page_texts: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            version: HEURISTICS_VERSION,
            boilerplate_tags: strings(&["nav", "header", "footer", "aside", "form"]),
            boilerplate_roles: strings(&[
                "navigation",
                "banner",
                "contentinfo",
                "complementary",
                "search",
            ]),
            boilerplate_class_segments: strings(&[
                "nav",
                "navbar",
                "navigation",
                "menu",
                "sidebar",
                "widget",
                "footer",
                "header",
                "masthead",
                "comment",
                "comments",
                "respond",
                "share",
                "sharing",
                "social",
                "related",
                "breadcrumb",
                "breadcrumbs",
                "cookie",
                "newsletter",
                "subscribe",
                "advert",
                "ads",
                "ad",
                "sponsor",
                "promo",
                "pagination",
            ]),
            content_hints: strings(&[
                ".entry-content",
                ".post-content",
                ".post-body",
                ".article-content",
                ".blog-content",
                "[itemprop=\"articleBody\"]",
                "article",
                "[role=\"main\"]",
                "main",
            ]),
            content_hint_bonus: 1.5,
            min_content_chars: 200,
            title_selectors: strings(&[
                "h1.entry-title",
                "h1.post-title",
                "h1[itemprop=\"headline\"]",
                "article h1",
                "h1",
            ]),
            date_selectors: strings(&[
                "time[datetime]",
                "time.published",
                ".published",
                ".entry-date",
                "span.date",
                "div.post-date",
                "p.date",
            ]),
            date_pattern: r"\b(\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}|\w+ \d{1,2},? \d{4})\b".to_string(),
            excluded_path_segments: strings(&[
                "/page/",
                "/category/",
                "/tag/",
                "/author/",
                "/feed/",
                "/wp-content/",
                "/wp-includes/",
                "/comments/",
                "/search/",
            ]),
            excluded_query_params: strings(&["replytocom", "share"]),
            excluded_extensions: strings(&[
                ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".zip", ".rar", ".mp3", ".mp4",
            ]),
            min_link_text_chars: 5,
            next_page_selectors: strings(&[
                "link[rel=\"next\"]",
                "a[rel~=\"next\"]",
                ".pagination a.next",
                ".nav-links a.next",
                "a.next.page-numbers",
                ".nav-previous a",
                "a.older-posts",
                "a.blog-pager-older-link",
            ]),
            next_page_texts: strings(&[
                "next",
                "next page",
                "older posts",
                "older entries",
                "»",
                "›",
            ]),
        }
    }
}

impl Heuristics {
    /// Parses heuristics from TOML text and validates them.
    ///
    /// Fields missing from the text keep their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown fields, and
    /// any error [`Heuristics::validate`] reports.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let heuristics: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        heuristics.validate()?;
        Ok(heuristics)
    }

    /// Loads heuristics from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise as
    /// [`Heuristics::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let heuristics = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "loaded heuristics file");
        Ok(heuristics)
    }

    /// Checks the version, every selector and the date pattern.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != HEURISTICS_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
            });
        }

        let selector_fields: [(&'static str, &[String]); 4] = [
            ("content_hints", &self.content_hints),
            ("title_selectors", &self.title_selectors),
            ("date_selectors", &self.date_selectors),
            ("next_page_selectors", &self.next_page_selectors),
        ];
        for (field, selectors) in selector_fields {
            for selector in selectors {
                Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
                    field,
                    selector: selector.clone(),
                    reason: e.to_string(),
                })?;
            }
        }

        Regex::new(&self.date_pattern).map_err(|e| ConfigError::InvalidPattern {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Returns whether a `class` or `id` value names page chrome.
    ///
    /// Each whitespace-separated token is split on `-` and `_`; one matching
    /// segment is enough (`site-sidebar` matches `sidebar`, `sidebars` does not).
    #[must_use]
    pub fn is_boilerplate_token(&self, value: &str) -> bool {
        value
            .split_whitespace()
            .flat_map(|token| token.split(['-', '_']))
            .any(|segment| {
                self.boilerplate_class_segments
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(segment))
            })
    }
}

/// Compiles a list of validated selectors, skipping any that fail to parse.
pub(crate) fn compile_selectors(selectors: &[String]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}
