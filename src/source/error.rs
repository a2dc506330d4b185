//! Error types for source classification.

use thiserror::Error;

/// Errors raised while deciding how a blog exposes its posts.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Every probe failed: no API, no feed and the base page itself is unreachable.
    #[error("source unreachable: {url} ({probes} probes failed; last error: {last_error})")]
    SourceUnreachable {
        /// Base URL that was classified.
        url: String,
        /// Number of probes attempted.
        probes: usize,
        /// Message of the last probe failure.
        last_error: String,
    },
}

impl ClassifyError {
    /// Creates a source-unreachable error.
    pub fn unreachable(url: impl Into<String>, probes: usize, last_error: impl Into<String>) -> Self {
        Self::SourceUnreachable {
            url: url.into(),
            probes,
            last_error: last_error.into(),
        }
    }
}
