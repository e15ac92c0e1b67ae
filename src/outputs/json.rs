//! JSON persistence of scraped articles under a namespace.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── alice/
//!     ├── index.md
//!     ├── real-title.json
//!     └── real-title-2.json   # same title, different URL
//! ```
//!
//! A slug is claimed by creating its file with `create_new`, so two writers
//! never end up sharing one. Saving the same URL again reuses its file.

use crate::error::SaveError;
use crate::models::ArticleData;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

static NAMESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// A slug reserved for one save.
#[derive(Debug)]
struct Claim {
    slug: String,
    path: PathBuf,
    /// The file was created by this claim, not reused for the same URL.
    fresh: bool,
}

/// Only the key needed to recognize an existing file's article.
#[derive(Deserialize)]
struct StoredUrl {
    url: String,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SaveError + '_ {
    move |source| SaveError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Reject namespaces that could escape the output directory.
pub fn validate_namespace(namespace: &str) -> Result<(), SaveError> {
    if NAMESPACE.is_match(namespace) {
        Ok(())
    } else {
        Err(SaveError::InvalidNamespace(namespace.to_string()))
    }
}

/// Directory holding one namespace's articles.
pub fn namespace_dir(output_dir: &str, namespace: &str) -> PathBuf {
    Path::new(output_dir).join(namespace)
}

/// Write `article` to `{output_dir}/{namespace}/{final_slug}.json`.
///
/// Picks the first free slug among `slug`, `slug-2`, `slug-3`, ..., or the
/// slug already holding this URL, and records it in
/// [`ArticleData::final_slug`].
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(%output_dir, %namespace, slug = %article.slug))]
pub async fn save_article(
    article: &mut ArticleData,
    output_dir: &str,
    namespace: &str,
) -> Result<PathBuf, SaveError> {
    validate_namespace(namespace)?;
    let dir = namespace_dir(output_dir, namespace);
    fs::create_dir_all(&dir).await.map_err(io_error(&dir))?;

    let claim = claim_slug(&dir, &article.slug, &article.url).await?;
    article.final_slug = Some(claim.slug.clone());

    let written = write_article(&claim.path, article).await;
    if written.is_err() {
        article.final_slug = None;
    }
    settle_claim(&claim, written).await?;
    info!(path = %claim.path.display(), final_slug = article.effective_slug(), "Saved article");
    Ok(claim.path)
}

async fn write_article(path: &Path, article: &ArticleData) -> Result<(), SaveError> {
    let json = serde_json::to_string_pretty(article)?;
    fs::write(path, json).await.map_err(io_error(path))
}

/// Pass `outcome` through, removing a freshly claimed file when it failed so
/// the slug is free for the next save.
async fn settle_claim<T>(claim: &Claim, outcome: Result<T, SaveError>) -> Result<T, SaveError> {
    if outcome.is_err() && claim.fresh {
        if let Err(e) = fs::remove_file(&claim.path).await {
            warn!(path = %claim.path.display(), error = %e, "Could not release claimed slug");
        }
    }
    outcome
}

async fn claim_slug(dir: &Path, slug: &str, url: &str) -> Result<Claim, SaveError> {
    let mut n = 1u32;
    loop {
        let candidate = if n == 1 {
            slug.to_string()
        } else {
            format!("{slug}-{n}")
        };
        let path = dir.join(format!("{candidate}.json"));

        match fs::read_to_string(&path).await {
            Ok(existing) => {
                let same_url = serde_json::from_str::<StoredUrl>(&existing)
                    .map(|stored| stored.url == url)
                    .unwrap_or(false);
                if same_url {
                    debug!(%candidate, "Reusing slug of previously saved URL");
                    return Ok(Claim {
                        slug: candidate,
                        path,
                        fresh: false,
                    });
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                match fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&path)
                    .await
                {
                    Ok(_) => {
                        return Ok(Claim {
                            slug: candidate,
                            path,
                            fresh: true,
                        });
                    }
                    // Lost a race for this name; try the next one.
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                    Err(e) => return Err(io_error(&path)(e)),
                }
            }
            Err(e) => return Err(io_error(&path)(e)),
        }
        n += 1;
    }
}
