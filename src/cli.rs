//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::sync::LazyLock;

use clap::Parser;
use regex::Regex;
use url::Url;

use harvester_core::fetch::{DEFAULT_DELAY_MS, DEFAULT_REQUEST_TIMEOUT_SECS};
use harvester_core::enumerate::DEFAULT_MAX_PAGES;
use harvester_core::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY};

#[allow(clippy::expect_used)]
static LANGUAGE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{2,3}([-_][A-Za-z0-9]{2,8})*$").expect("language code pattern is valid")
});

/// Harvest the readable text of a blog's posts.
///
/// Finds the posts of the blog at BASE_URL through its WordPress REST API,
/// its RSS/Atom feed or its HTML index pages, and saves each post's title
/// and body as plain text.
#[derive(Parser, Debug)]
#[command(name = "blog-harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Base URL of the blog (http or https)
    #[arg(value_parser = parse_base_url)]
    pub base_url: Url,

    /// Output file name (default: {domain}_blog_posts.txt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep only posts declaring this language (e.g. fi, en-US)
    #[arg(short, long, value_parser = parse_language)]
    pub lang: Option<String>,

    /// Write every post into the output file instead of one file per post
    #[arg(long)]
    pub one_file: bool,

    /// Posts fetched concurrently (1-16)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=MAX_CONCURRENCY as i64))]
    pub concurrency: u8,

    /// Minimum delay between requests to the same domain in milliseconds (0 to disable, max 60000)
    #[arg(short = 'd', long, default_value_t = DEFAULT_DELAY_MS, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay_ms: u64,

    /// Per-request timeout in seconds (1-300)
    #[arg(short = 't', long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout: u64,

    /// Maximum listing pages to walk (1-1000)
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES, value_parser = parse_max_pages)]
    pub max_pages: usize,

    /// TOML file overriding the built-in extraction heuristics
    #[arg(long, value_name = "FILE")]
    pub heuristics: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_base_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value.trim()).map_err(|e| format!("not a valid URL: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}', expected http or https", url.scheme()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err("URL has no host".to_string());
    }
    Ok(url)
}

fn parse_language(value: &str) -> Result<String, String> {
    let value = value.trim();
    if LANGUAGE_CODE.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(format!("'{value}' is not a language code such as 'fi' or 'en-US'"))
    }
}

fn parse_max_pages(value: &str) -> Result<usize, String> {
    let pages: usize = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (1..=1000).contains(&pages) {
        Ok(pages)
    } else {
        Err("must be between 1 and 1000".to_string())
    }
}
