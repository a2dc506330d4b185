//! Progress bar for post extraction.

use indicatif::{ProgressBar, ProgressStyle};

/// Returns a bar drawn on stderr when `visible`, otherwise a hidden one.
///
/// The harvester sets its length once enumeration has finished.
pub(crate) fn extraction_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] extracting posts {wide_bar}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}
