//! Blog harvester core library.
//!
//! Turns a blog's base URL into the readable text of its posts.
//!
//! # Architecture
//!
//! - [`source`] - classifies the URL as WordPress API, feed or HTML index
//! - [`enumerate`] - walks listing pages and collects post references
//! - [`extract`] - fetches a post and isolates its title, body and metadata
//! - [`language`] - optional filter on declared language codes
//! - [`output`] - writes posts to one file or one file per post
//! - [`pipeline`] - runs the stages above for one blog
//! - [`fetch`] - shared HTTP client with timeouts and per-domain delay
//! - [`config`] - heuristic tables, loadable from TOML

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod enumerate;
pub mod extract;
pub mod fetch;
pub mod language;
pub mod output;
pub mod pipeline;
pub mod source;
mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{ConfigError, HEURISTICS_VERSION, Heuristics};
pub use enumerate::{Enumerate, EnumerateError, Enumeration, PostReference};
pub use extract::{ContentExtractor, ExtractError, ExtractedPost, extract_post};
pub use fetch::{ClientSettings, FetchError, FetchedPage, PageClient, RateLimiter};
pub use language::{LanguageFilter, LanguageVerdict};
pub use output::{OutputError, OutputMode, OutputWriter};
pub use pipeline::{
    DEFAULT_CONCURRENCY, HarvestOptions, HarvestReport, Harvester, MAX_CONCURRENCY, SkippedPost,
};
pub use source::{BlogSource, ClassifyError, PaginationCursor, SourceKind, classify};
