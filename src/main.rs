//! CLI entry point for the blog harvester.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use harvester_core::enumerate::DEFAULT_API_PER_PAGE;
use harvester_core::fetch::DEFAULT_CONNECT_TIMEOUT_SECS;
use harvester_core::output::{default_output_name, ensure_txt_extension};
use harvester_core::{
    ClientSettings, HarvestOptions, Harvester, Heuristics, LanguageFilter, OutputMode,
    OutputWriter, PageClient,
};
use tracing::{debug, info, warn};

mod cli;
mod progress;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");
    info!(base_url = %args.base_url, "Blog harvester starting");

    let heuristics = match &args.heuristics {
        Some(path) => Heuristics::load(path)
            .with_context(|| format!("loading heuristics from {}", path.display()))?,
        None => Heuristics::default(),
    };

    let request_timeout = Duration::from_secs(args.timeout);
    let client = PageClient::new(ClientSettings {
        connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS).min(request_timeout),
        request_timeout,
        delay: Duration::from_millis(args.delay_ms),
    })?;
    if args.delay_ms == 0 {
        debug!("politeness delay disabled");
    }

    let language = LanguageFilter::new(args.lang.as_deref());
    let options = HarvestOptions {
        language: language.clone(),
        concurrency: usize::from(args.concurrency),
        max_pages: args.max_pages,
        per_page: DEFAULT_API_PER_PAGE,
    };
    let show_progress = !args.quiet && io::stderr().is_terminal();
    let harvester = Harvester::new(client, Arc::new(heuristics), options)
        .with_progress(progress::extraction_bar(show_progress));

    let report = harvester
        .run(&args.base_url)
        .await
        .context("no posts could be discovered")?;
    report.log_summary();

    if report.posts.is_empty() {
        warn!("No posts extracted, nothing written");
        return Ok(());
    }

    let output = args.output.as_ref().map_or_else(
        || PathBuf::from(default_output_name(&args.base_url)),
        |path| PathBuf::from(ensure_txt_extension(&path.to_string_lossy())),
    );
    let mode = if args.one_file {
        OutputMode::OneFile
    } else {
        OutputMode::PerPost
    };
    let destination = OutputWriter::new(output, mode, args.base_url.clone(), language)
        .write(&report.posts)?;

    info!(
        path = %destination.display(),
        written = report.posts.len(),
        skipped = report.skipped.len(),
        "Harvest finished"
    );

    Ok(())
}
