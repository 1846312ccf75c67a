//! CLI entry point for linkdl.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use linkdl_core::config::{self, FileConfig};
use linkdl_core::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use linkdl_core::download::{
    DownloadCoordinator, HttpClient, ProgressReporter, RetryPolicy, RetryingFetcher,
};
use linkdl_core::matcher::Matcher;
use linkdl_core::page;
use linkdl_core::report::{self, ErrorLog};
use tracing::{debug, info};

mod cli;

use cli::{Args, Mode};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let (args, sources) = cli::parse_cli_with_sources();

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

    let file_config = load_config(&args)?;
    let args = cli::apply_config_defaults(args, sources, &file_config);
    debug!(?args, "CLI arguments resolved");

    let mode = args.mode()?;
    if mode == Mode::None {
        println!("Nothing to do. Rank a page with -u URL -k KEYWORD_FILE, or download with -d -l LINK_FILE.");
        println!("Run `linkdl --help` for all options.");
        return Ok(());
    }

    let client = match (file_config.connect_timeout_secs, file_config.read_timeout_secs) {
        (None, None) => HttpClient::new(),
        (connect, read) => HttpClient::new_with_timeouts(
            connect.unwrap_or(CONNECT_TIMEOUT_SECS),
            read.unwrap_or(READ_TIMEOUT_SECS),
        ),
    };
    let show_bars = !args.no_progress && !args.quiet && io::stderr().is_terminal();
    let progress = ProgressReporter::console(show_bars);

    match mode {
        Mode::None => {}
        Mode::Rank { url, keyword_file } => {
            run_ranking(&args, &client, &progress, &url, &keyword_file).await?;
        }
        Mode::Download { links_file } => {
            run_downloads(&args, client, progress, &links_file).await?;
        }
        Mode::Both {
            url,
            keyword_file,
            links_file,
        } => {
            run_ranking(&args, &client, &progress, &url, &keyword_file).await?;
            run_downloads(&args, client, progress, &links_file).await?;
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<FileConfig> {
    match &args.config {
        Some(path) => config::load_file_config(path)
            .with_context(|| format!("Failed to load config file '{}'", path.display())),
        None => config::load_default_file_config().context("Failed to load default config file"),
    }
}

async fn run_ranking(
    args: &Args,
    client: &HttpClient,
    progress: &ProgressReporter,
    url: &str,
    keyword_file: &Path,
) -> Result<()> {
    let keywords = report::read_keywords(keyword_file).await?;
    info!(keywords = keywords.len(), "loaded keywords");

    let (page_url, html) = page::fetch_page(client.inner(), url).await?;
    let links = page::extract_links(&html, &page_url);
    info!(links = links.len(), page = %page_url, "extracted links");

    let top_n = args
        .top_n
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX));
    let matcher = Matcher::new()
        .with_top_n(top_n)
        .with_min_score(args.min_score);
    let results = matcher.rank_keywords(&links, &keywords);

    report::write_keyword_results(&results, &args.output).await?;
    progress.println(format!("Links saved to {}", args.output.display()));
    Ok(())
}

async fn run_downloads(
    args: &Args,
    client: HttpClient,
    progress: ProgressReporter,
    links_file: &Path,
) -> Result<()> {
    let urls = report::read_link_file(links_file).await?;
    info!(urls = urls.len(), "loaded download links");

    let policy = RetryPolicy::new(
        u32::from(args.max_attempts),
        Duration::from_millis(args.retry_delay_ms),
    );
    let error_log = Arc::new(ErrorLog::new(&args.error_log));
    let fetcher = RetryingFetcher::new(client, policy, error_log).with_progress(progress.clone());
    let coordinator =
        DownloadCoordinator::new(usize::from(args.concurrency))?.with_progress(progress.clone());

    let (_outcomes, stats) = coordinator
        .download_all_with_stats(Arc::new(fetcher), &urls, &args.download_dir)
        .await?;

    if !args.quiet {
        progress.println(format!(
            "Finished: {} of {} files downloaded ({} failed, {} retries)",
            stats.completed(),
            stats.total(),
            stats.failed(),
            stats.retried()
        ));
    }
    Ok(())
}
