//! End-to-end harvest of one blog: classify, enumerate, filter, extract.
//!
//! Only classification can fail the run. Enumeration truncation and per-post
//! failures are collected into the [`HarvestReport`].

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::Heuristics;
use crate::enumerate::{
    DEFAULT_API_PER_PAGE, DEFAULT_MAX_PAGES, EnumerateError, EnumerateOptions, PostReference,
    enumerator_for,
};
use crate::extract::{ContentExtractor, ExtractError, ExtractedPost};
use crate::fetch::PageClient;
use crate::language::{LanguageFilter, LanguageVerdict};
use crate::source::{ClassifyError, SourceKind, classify};

/// Default number of posts fetched at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Upper bound accepted for `concurrency`.
pub const MAX_CONCURRENCY: usize = 16;

/// Run-level knobs.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Language restriction.
    pub language: LanguageFilter,
    /// Posts fetched concurrently, clamped to `1..=MAX_CONCURRENCY`.
    pub concurrency: usize,
    /// Listing page cap.
    pub max_pages: usize,
    /// Posts per WordPress API page.
    pub per_page: u32,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            language: LanguageFilter::none(),
            concurrency: DEFAULT_CONCURRENCY,
            max_pages: DEFAULT_MAX_PAGES,
            per_page: DEFAULT_API_PER_PAGE,
        }
    }
}

/// A post that was discovered but could not be extracted.
#[derive(Debug)]
pub struct SkippedPost {
    /// Post URL.
    pub url: Url,
    /// Why it was skipped.
    pub error: ExtractError,
}

/// Outcome of one harvest.
#[derive(Debug)]
pub struct HarvestReport {
    /// How the source was classified.
    pub source_kind: SourceKind,
    /// Listing pages requested.
    pub pages_visited: usize,
    /// Distinct post references discovered, including ones rejected by language.
    pub enumerated: usize,
    /// Extracted posts in discovery order.
    pub posts: Vec<ExtractedPost>,
    /// Posts that failed to fetch or parse.
    pub skipped: Vec<SkippedPost>,
    /// Posts whose declared language differs from the requested one.
    pub filtered_out: usize,
    /// Posts excluded because they declare no language while a filter is active.
    pub undetermined: usize,
    /// Set when enumeration stopped early on an error.
    pub truncated: Option<EnumerateError>,
}

impl HarvestReport {
    /// Logs the run summary.
    pub fn log_summary(&self) {
        for skipped in &self.skipped {
            warn!(url = %skipped.url, kind = skipped.error.kind(), error = %skipped.error, "post skipped");
        }
        if let Some(truncated) = &self.truncated {
            warn!(error = %truncated, "enumeration was truncated");
        }
        info!(
            source = %self.source_kind,
            pages = self.pages_visited,
            enumerated = self.enumerated,
            written = self.posts.len(),
            skipped = self.skipped.len(),
            filtered_out = self.filtered_out,
            undetermined = self.undetermined,
            "harvest complete"
        );
    }
}

/// Runs harvests with one client and one heuristics set.
#[derive(Debug, Clone)]
pub struct Harvester {
    client: PageClient,
    heuristics: Arc<Heuristics>,
    options: HarvestOptions,
    progress: Option<ProgressBar>,
}

impl Harvester {
    /// Creates a harvester.
    #[must_use]
    pub fn new(client: PageClient, heuristics: Arc<Heuristics>, options: HarvestOptions) -> Self {
        Self {
            client,
            heuristics,
            options,
            progress: None,
        }
    }

    /// Reports extraction progress on `bar`; its length is set once posts are known.
    #[must_use]
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Harvests the blog at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError`] when the source cannot be reached at all.
    #[instrument(skip(self), fields(base_url = %base_url, language = %self.options.language))]
    pub async fn run(&self, base_url: &Url) -> Result<HarvestReport, ClassifyError> {
        let source = classify(&self.client, base_url).await?;

        let enumerator = enumerator_for(
            &source,
            self.client.clone(),
            EnumerateOptions {
                language: self.options.language.clone(),
                max_pages: self.options.max_pages,
                per_page: self.options.per_page,
            },
            Arc::clone(&self.heuristics),
        );
        let enumeration = enumerator.enumerate(&source).await;
        if let Some(truncated) = &enumeration.truncated {
            warn!(strategy = enumerator.name(), error = %truncated, "enumeration stopped early");
        }

        let enumerated = enumeration.posts.len() + enumeration.rejected_by_language;
        let mut filtered_out = enumeration.rejected_by_language;
        let mut candidates: Vec<PostReference> = Vec::with_capacity(enumeration.posts.len());
        for reference in enumeration.posts.into_vec() {
            if reference.language_code.is_some()
                && self.options.language.verdict(reference.language_code.as_deref())
                    == LanguageVerdict::Reject
            {
                filtered_out += 1;
                continue;
            }
            candidates.push(reference);
        }
        info!(
            strategy = enumerator.name(),
            enumerated,
            to_fetch = candidates.len(),
            "posts enumerated"
        );

        if let Some(bar) = &self.progress {
            bar.set_length(candidates.len() as u64);
            bar.set_position(0);
        }

        let extractor = ContentExtractor::new(self.client.clone(), Arc::clone(&self.heuristics));
        let extractor = &extractor;
        let progress = self.progress.as_ref();
        let outcomes: Vec<(PostReference, Result<ExtractedPost, ExtractError>)> =
            stream::iter(candidates)
                .map(move |reference| async move {
                    let outcome = extractor.extract(&reference).await;
                    if let Some(bar) = progress {
                        bar.inc(1);
                    }
                    (reference, outcome)
                })
                .buffered(self.options.concurrency.clamp(1, MAX_CONCURRENCY))
                .collect()
                .await;

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }

        let mut posts = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        let mut undetermined = 0_usize;
        for (reference, outcome) in outcomes {
            match outcome {
                Ok(post) => match self.options.language.verdict(post.language_code.as_deref()) {
                    LanguageVerdict::Admit => posts.push(post),
                    LanguageVerdict::Reject => {
                        info!(url = %post.source_url, language = ?post.language_code, "post filtered out by language");
                        filtered_out += 1;
                    }
                    LanguageVerdict::Undetermined => {
                        info!(url = %post.source_url, "post language undetermined, excluded");
                        undetermined += 1;
                    }
                },
                Err(error) => {
                    warn!(url = %reference.url, error = %error, "post skipped");
                    skipped.push(SkippedPost {
                        url: reference.url,
                        error,
                    });
                }
            }
        }

        Ok(HarvestReport {
            source_kind: source.kind(),
            pages_visited: enumeration.pages_visited,
            enumerated,
            posts,
            skipped,
            filtered_out,
            undetermined,
            truncated: enumeration.truncated,
        })
    }
}
