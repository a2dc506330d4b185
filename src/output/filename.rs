//! Output file and directory naming.

use std::path::{Path, PathBuf};

use url::Url;

use crate::extract::ExtractedPost;

/// Output name used when the base URL has no usable host.
pub const FALLBACK_OUTPUT_NAME: &str = "blog_posts_output.txt";

/// Longest slug kept in per-post file names, in characters.
const MAX_SLUG_CHARS: usize = 60;

/// Replaces anything but letters, digits, `-`, `_` and `.` with `_`,
/// collapsing runs and trimming `_` from both ends.
pub(crate) fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in value.chars() {
        let mapped = match ch {
            c if c.is_alphanumeric() || matches!(c, '-' | '.') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    out.trim_matches('_').to_string()
}

/// Default output file name derived from the blog's domain.
///
/// ```
/// use harvester_core::output::default_output_name;
/// use url::Url;
///
/// let url = Url::parse("https://www.example-blog.com/archive/").unwrap();
/// assert_eq!(default_output_name(&url), "example-blog.com_blog_posts.txt");
/// ```
#[must_use]
pub fn default_output_name(base_url: &Url) -> String {
    let host = base_url.host_str().unwrap_or_default().to_ascii_lowercase();
    let domain = host.strip_prefix("www.").unwrap_or(&host);
    let safe = sanitize_filename_component(domain);
    if safe.is_empty() {
        FALLBACK_OUTPUT_NAME.to_string()
    } else {
        format!("{safe}_blog_posts.txt")
    }
}

/// Appends `.txt` unless the name already ends with it (any case).
#[must_use]
pub fn ensure_txt_extension(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(".txt") {
        name.to_string()
    } else {
        format!("{name}.txt")
    }
}

/// Directory used by per-post mode: the output path without its extension.
#[must_use]
pub fn collection_dir(output: &Path) -> PathBuf {
    output.with_extension("")
}

/// Slug for a post: its last URL path segment, else its title, else `post`.
pub(crate) fn post_slug(post: &ExtractedPost) -> String {
    let from_url = post
        .source_url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map_or_else(|_| segment.to_string(), |d| d.into_owned());
            let stem = decoded
                .strip_suffix(".html")
                .or_else(|| decoded.strip_suffix(".htm"))
                .or_else(|| decoded.strip_suffix(".php"))
                .unwrap_or(&decoded)
                .to_string();
            sanitize_filename_component(&stem)
        })
        .filter(|slug| !slug.is_empty());

    let slug = from_url
        .or_else(|| {
            let from_title = sanitize_filename_component(&post.title);
            (!from_title.is_empty()).then_some(from_title)
        })
        .unwrap_or_else(|| "post".to_string());

    slug.chars().take(MAX_SLUG_CHARS).collect::<String>().trim_end_matches(['_', '.']).to_string()
}

/// `NNN_slug.txt`, numbered from 1 in discovery order.
#[must_use]
pub fn post_file_name(index: usize, post: &ExtractedPost) -> String {
    format!("{:03}_{}.txt", index + 1, post_slug(post))
}
