//! Error types for link enumeration.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that stop pagination early.
///
/// Enumeration never fails outright: posts collected before the failure are
/// kept and this error travels alongside them as a warning.
#[derive(Debug, Error)]
pub enum EnumerateError {
    /// A listing page could not be fetched or parsed.
    #[error("enumeration truncated at listing page {page} ({url}): {source}")]
    Truncated {
        /// 1-based index of the page that failed.
        page: usize,
        /// URL of the page that failed.
        url: String,
        /// What went wrong.
        #[source]
        source: FetchError,
    },
}

impl EnumerateError {
    /// Creates a truncation error for listing page `page`.
    pub fn truncated(page: usize, url: impl Into<String>, source: FetchError) -> Self {
        Self::Truncated {
            page,
            url: url.into(),
            source,
        }
    }
}
