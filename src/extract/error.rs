//! Error types for content extraction.
//!
//! Both variants are per-post: the pipeline records them and moves on.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that skip a single post.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The post page could not be fetched (network, timeout, HTTP status).
    #[error("could not fetch post {url}: {source}")]
    PostFetchFailed {
        /// Post URL.
        url: String,
        /// Underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// The page was fetched but yielded no readable text.
    #[error("could not extract text from {url}: {reason}")]
    PostParseFailed {
        /// Post URL.
        url: String,
        /// What was missing.
        reason: String,
    },
}

impl ExtractError {
    /// Creates a fetch failure.
    pub fn fetch_failed(url: impl Into<String>, source: FetchError) -> Self {
        Self::PostFetchFailed {
            url: url.into(),
            source,
        }
    }

    /// Creates a parse failure.
    pub fn parse_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PostParseFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-friendly label for summaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PostFetchFailed { .. } => "fetch_failed",
            Self::PostParseFailed { .. } => "parse_failed",
        }
    }
}
