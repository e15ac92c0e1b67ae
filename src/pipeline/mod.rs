//! Article scraping pipeline.
//!
//! Three stages run in order, each consuming only the previous stage's output:
//!
//! 1. **Fetch** ([`fetch`]): one GET with a browser identity and a timeout
//! 2. **Extract** ([`extract`]): strip noise, run per-field selector cascades
//! 3. **Sanitize / slug** ([`sanitize`], [`slug`]): make content safe to
//!    render and derive a URL-safe identifier
//!
//! Only the fetch stage can fail; the failure is wrapped as
//! [`ScrapeError::Fetch`] and no partial article is returned. Invocations
//! share no mutable state and can run concurrently.

pub mod extract;
pub mod fetch;
pub mod sanitize;
pub mod slug;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::models::{ArticleData, ExtractionReport};
use extract::extract_fields;
use fetch::FetchHtml;
use slug::{FallbackSuffix, slugify};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Per-invocation knobs that do not belong to the fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub fallback_suffix: FallbackSuffix,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            fallback_suffix: FallbackSuffix::TimestampRandom,
        }
    }
}

impl From<&ScraperConfig> for ScrapeOptions {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            fallback_suffix: FallbackSuffix::from_config(config.random_slug_suffix),
        }
    }
}

/// Scrape `url` into an [`ArticleData`].
///
/// # Errors
///
/// Returns [`ScrapeError::Fetch`] ("Failed to scrape article: ...") when the
/// page cannot be retrieved. Extraction problems never error; they show up
/// as placeholders and in [`ArticleData::extraction`].
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn scrape_article<F: FetchHtml>(
    fetcher: &F,
    url: &str,
    options: &ScrapeOptions,
) -> Result<ArticleData, ScrapeError> {
    let t0 = Instant::now();

    let page = match fetcher.fetch(url).await {
        Ok(page) => page,
        Err(e) => {
            error!(error = %e, elapsed_ms = t0.elapsed().as_millis() as u64, "Fetch failed");
            return Err(ScrapeError::Fetch(e));
        }
    };

    let article = build_article(url, &page.body, options);
    if article.extraction.is_degraded() {
        warn!(
            status = page.status,
            title_source = ?article.extraction.title,
            content_source = ?article.extraction.content,
            "Extraction fell back to placeholders"
        );
    }
    info!(
        slug = %article.slug,
        fallback_fields = article.extraction.fallback_count(),
        content_bytes = article.content.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Scraped article"
    );
    Ok(article)
}

/// Run the extraction and slug stages over already-fetched HTML.
pub fn build_article(url: &str, html: &str, options: &ScrapeOptions) -> ArticleData {
    let fields = extract_fields(html);
    let slug = slugify(fields.slug_basis(), options.fallback_suffix);

    let extraction = ExtractionReport {
        title: fields.title.source,
        content: fields.content.source,
        author: fields.author.source,
        publish_date: fields.publish_date.source,
        description: fields.description.source,
    };

    ArticleData {
        title: fields.title.value,
        content: fields.content.value,
        author: fields.author.value,
        publish_date: fields.publish_date.value,
        description: fields.description.value,
        url: url.to_string(),
        slug,
        marketing_data: None,
        final_slug: None,
        extraction,
    }
}
