//! # ShareX article scraper
//!
//! Scrapes web articles from user-supplied URLs, normalizes them into
//! shareable records and saves them as JSON under a per-user namespace.
//!
//! ## Usage
//!
//! ```sh
//! sharex_scraper -o ./articles -n alice https://example.com/post
//! ```
//!
//! ## Architecture
//!
//! Each URL goes through the same pipeline:
//! 1. **Fetch**: one GET with a browser identity and a hard timeout
//! 2. **Extract**: strip page noise, pick title/content/author/date/description
//! 3. **Sanitize & slug**: make content safe to render, derive a URL-safe slug
//! 4. **Save**: attach marketing data, write JSON, update the namespace index
//!
//! Several URLs are scraped concurrently; a failed URL is logged and skipped.

use clap::Parser;
use futures::stream::{self, StreamExt};
use std::error::Error;
use std::io::Write;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod utils;

use cli::Cli;
use config::ScraperConfig;
use error::ScrapeError;
use models::{ArticleData, MarketingData};
use outputs::{indexes, json};
use pipeline::fetch::{FetchHtml, HttpFetcher};
use pipeline::{ScrapeOptions, scrape_article};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("sharex_scraper starting up");

    let args = Cli::parse();
    debug!(?args.urls, ?args.output_dir, namespace = %args.namespace, "Parsed CLI arguments");

    let config = config::load_config(args.config.as_deref())
        .await?
        .merge_cli(&args);
    config.validate()?;

    let marketing = match args.marketing.as_deref() {
        Some(path) => Some(load_marketing(path).await?),
        None => None,
    };

    // Fail before any network traffic if results could not be saved.
    if let Some(ref dir) = args.output_dir {
        json::validate_namespace(&args.namespace)?;
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let fetcher = HttpFetcher::new(&config)?;
    let articles = run_batch(
        &fetcher,
        &args,
        &config,
        marketing.as_ref(),
        &mut std::io::stdout(),
    )
    .await?;

    let elapsed = start_time.elapsed();
    info!(
        saved = articles.len(),
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Scrape every URL in `args`, `config.concurrency` at a time, then save each
/// article (or print it to `out` when no output directory is set).
///
/// Results are handled in input order. A URL that fails to scrape or save is
/// logged and skipped.
///
/// # Returns
///
/// The articles that were handled successfully, in input order.
///
/// # Errors
///
/// Fails when no URL succeeded, or when writing to `out` fails.
#[instrument(level = "info", skip_all, fields(total = args.urls.len(), concurrency = config.concurrency))]
async fn run_batch<F: FetchHtml, W: Write>(
    fetcher: &F,
    args: &Cli,
    config: &ScraperConfig,
    marketing: Option<&MarketingData>,
    out: &mut W,
) -> Result<Vec<ArticleData>, Box<dyn Error>> {
    let options = ScrapeOptions::from(config);
    let total = args.urls.len();
    info!("Starting scrapes");

    let results: Vec<(String, Result<ArticleData, ScrapeError>)> = {
        let options = &options;
        stream::iter(args.urls.iter().cloned())
            .map(|url| async move {
                let result = scrape_article(fetcher, &url, options).await;
                (url, result)
            })
            .buffered(config.concurrency)
            .collect()
            .await
    };

    // ---- Save or print ----
    let mut handled = Vec::with_capacity(total);
    for (url, result) in results {
        let mut article = match result {
            Ok(article) => article,
            Err(e) => {
                error!(%url, error = %e, "Scrape failed; skipping URL");
                continue;
            }
        };
        article.marketing_data = marketing.cloned();
        match args.output_dir.as_deref() {
            Some(dir) => {
                if let Err(e) = save(&mut article, dir, &args.namespace).await {
                    error!(%url, error = %e, "Failed to save article");
                    continue;
                }
            }
            None => writeln!(out, "{}", serde_json::to_string_pretty(&article)?)?,
        }
        handled.push(article);
    }

    let failed = total - handled.len();
    info!(total, succeeded = handled.len(), failed, "Batch finished");
    if handled.is_empty() {
        return Err(format!("all {total} scrape(s) failed").into());
    }
    if failed > 0 {
        warn!(failed, "Some URLs could not be scraped");
    }
    Ok(handled)
}

/// Save one article and refresh its namespace index.
#[instrument(level = "info", skip_all, fields(url = %article.url))]
async fn save(article: &mut ArticleData, dir: &str, namespace: &str) -> Result<(), Box<dyn Error>> {
    let path = json::save_article(article, dir, namespace).await?;
    indexes::update_namespace_index(&json::namespace_dir(dir, namespace), article).await?;
    info!(path = %path.display(), "Article saved");
    Ok(())
}

/// Read the marketing data attached to every saved article.
#[instrument(level = "info")]
async fn load_marketing(path: &str) -> Result<MarketingData, Box<dyn Error>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let data: MarketingData = serde_json::from_str(&raw)?;
    info!(brand = ?data.brand_name, "Loaded marketing data");
    Ok(data)
}
