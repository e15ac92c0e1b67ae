//! Per-namespace Markdown index of saved articles.
//!
//! `index.md` lists every saved article, newest first:
//!
//! ```text
//! # Saved articles
//!
//! - [Real Title](./real-title.json) <small>`example`</small>
//! - [Older Post](./older-post.json)
//! ```
//!
//! Saving an article again replaces its line instead of adding a new one.

use crate::error::SaveError;
use crate::models::ArticleData;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const INDEX_HEADER: &str = "# Saved articles";

fn escape_link_text(title: &str) -> String {
    title.replace('[', "\\[").replace(']', "\\]")
}

/// Markdown list entry for `article`.
pub fn index_entry(article: &ArticleData) -> String {
    let source_tag = article
        .source_tag()
        .map(|tag| format!(" <small>`{}`</small>", tag))
        .unwrap_or_default();
    format!(
        "- [{}](./{}.json){}",
        escape_link_text(&article.title),
        article.effective_slug(),
        source_tag
    )
}

/// Insert or replace `article`'s entry in `{namespace_dir}/index.md`.
#[instrument(level = "info", skip_all, fields(dir = %namespace_dir.display(), slug = %article.effective_slug()))]
pub async fn update_namespace_index(
    namespace_dir: &Path,
    article: &ArticleData,
) -> Result<(), SaveError> {
    let index_path = namespace_dir.join("index.md");
    let content = if index_path.exists() {
        fs::read_to_string(&index_path)
            .await
            .map_err(|source| SaveError::Io {
                path: index_path.display().to_string(),
                source,
            })?
    } else {
        format!("{INDEX_HEADER}\n")
    };

    let updated = upsert_entry(&content, article);
    fs::write(&index_path, updated)
        .await
        .map_err(|source| SaveError::Io {
            path: index_path.display().to_string(),
            source,
        })?;
    info!(path = %index_path.display(), "Updated namespace index");
    Ok(())
}

fn upsert_entry(content: &str, article: &ArticleData) -> String {
    let entry = index_entry(article);
    let link = format!("](./{}.json)", article.effective_slug());
    let mut lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();

    if let Some(existing) = lines
        .iter()
        .position(|l| l.starts_with("- [") && l.contains(&link))
    {
        lines[existing] = entry;
    } else if let Some(pos) = lines.iter().position(|l| l.starts_with(INDEX_HEADER)) {
        let mut insert_at = pos + 1;
        // Keep one blank line under the header.
        if lines.get(insert_at).is_none_or(|l| !l.is_empty()) {
            lines.insert(insert_at, String::new());
        }
        insert_at += 1;
        lines.insert(insert_at, entry);
    } else {
        lines.push(entry);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
