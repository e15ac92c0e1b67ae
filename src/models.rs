//! Data models for scraped articles.
//!
//! - [`ArticleData`]: the record produced by one pipeline invocation
//! - [`MarketingData`]: optional branding the caller attaches before saving
//! - [`ExtractionReport`] / [`FieldSource`]: where each field came from
//!
//! Serialized field names are camelCase, matching the records the web
//! front end reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder title used when no selector yields text.
pub const UNTITLED_ARTICLE: &str = "Untitled Article";

/// Placeholder content used when neither containers, paragraphs nor body
/// text are usable.
pub const NO_CONTENT_FOUND: &str = "No content found";

/// A normalized article, ready to be saved and shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleData {
    /// Never empty; [`UNTITLED_ARTICLE`] when nothing was found.
    pub title: String,
    /// Sanitized HTML fragment; never empty; [`NO_CONTENT_FOUND`] when nothing was found.
    pub content: String,
    pub author: Option<String>,
    /// Raw date string exactly as found on the page.
    pub publish_date: Option<String>,
    pub description: Option<String>,
    /// The URL that was scraped, verbatim.
    pub url: String,
    /// URL-safe identifier derived from the title.
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_data: Option<MarketingData>,
    /// Slug actually used when saved; may carry a `-N` suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_slug: Option<String>,
    #[serde(default)]
    pub extraction: ExtractionReport,
}

impl ArticleData {
    /// Extract the domain name (before .com/.org/etc) from the source URL.
    /// For example: "https://blog.example.com/post" -> "example"
    pub fn source_tag(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.url).ok()?;
        let host = parsed.host_str()?;
        let parts: Vec<&str> = host.split('.').collect();
        if parts.len() >= 2 {
            return Some(parts[parts.len() - 2].to_string());
        }
        None
    }

    /// The slug this article is stored under, falling back to the derived one.
    pub fn effective_slug(&self) -> &str {
        self.final_slug.as_deref().unwrap_or(&self.slug)
    }
}

/// Branding attached to a shared article.
///
/// Unknown keys are kept as-is so the front end can add fields without a
/// change here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How a single field was obtained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum FieldSource {
    /// Matched a CSS selector from the field's rule list.
    Selector(String),
    /// Read from a `<meta>` tag.
    Meta(String),
    /// Content rebuilt from standalone paragraphs.
    Paragraphs,
    /// Content taken from the page's visible text.
    BodyText,
    /// Description taken from the first paragraph.
    FirstParagraph,
    /// A fixed placeholder literal was substituted.
    Placeholder,
    /// Optional field not found.
    #[default]
    Missing,
}

impl FieldSource {
    /// True when nothing on the page supplied the value.
    pub fn is_fallback(&self) -> bool {
        matches!(self, FieldSource::Placeholder | FieldSource::Missing)
    }
}

/// Per-field provenance for one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub title: FieldSource,
    pub content: FieldSource,
    pub author: FieldSource,
    pub publish_date: FieldSource,
    pub description: FieldSource,
}

impl ExtractionReport {
    /// Title or content fell back to a placeholder.
    pub fn is_degraded(&self) -> bool {
        self.title == FieldSource::Placeholder || self.content == FieldSource::Placeholder
    }

    /// How many of the five fields were not supplied by the page.
    pub fn fallback_count(&self) -> usize {
        [
            &self.title,
            &self.content,
            &self.author,
            &self.publish_date,
            &self.description,
        ]
        .iter()
        .filter(|source| source.is_fallback())
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn article(url: &str) -> ArticleData {
        ArticleData {
            title: "Test".to_string(),
            content: "<p>Body</p>".to_string(),
            author: None,
            publish_date: None,
            description: None,
            url: url.to_string(),
            slug: "test".to_string(),
            marketing_data: None,
            final_slug: None,
            extraction: ExtractionReport::default(),
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut a = article("https://example.com/a");
        a.publish_date = Some("2025-05-06".to_string());
        let json = serde_json::to_value(&a).unwrap();

        assert_eq!(json["publishDate"], "2025-05-06");
        assert!(json.get("marketingData").is_none());
        assert!(json.get("finalSlug").is_none());
        assert_eq!(json["extraction"]["title"]["kind"], "missing");
    }

    #[test]
    fn test_field_source_tagging() {
        let json = serde_json::to_value(FieldSource::Selector("h1".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "selector", "detail": "h1"}));

        let json = serde_json::to_value(FieldSource::Placeholder).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "placeholder"}));
    }

    #[test]
    fn test_marketing_data_keeps_unknown_keys() {
        let raw = r#"{"brandName":"Acme","ctaUrl":"https://acme.test","theme":"dark"}"#;
        let data: MarketingData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.brand_name.as_deref(), Some("Acme"));
        assert_eq!(data.extra.get("theme"), Some(&Value::from("dark")));

        let back = serde_json::to_value(&data).unwrap();
        assert_eq!(back["theme"], "dark");
        assert_eq!(back["ctaUrl"], "https://acme.test");
    }

    #[test]
    fn test_source_tag() {
        assert_eq!(
            article("https://blog.example.com/post").source_tag(),
            Some("example".to_string())
        );
        assert_eq!(article("not a url").source_tag(), None);
        assert_eq!(article("http://localhost:8080/a").source_tag(), None);
    }

    #[test]
    fn test_effective_slug() {
        let mut a = article("https://example.com/a");
        assert_eq!(a.effective_slug(), "test");
        a.final_slug = Some("test-2".to_string());
        assert_eq!(a.effective_slug(), "test-2");
    }

    #[test]
    fn test_degraded_report() {
        let mut report = ExtractionReport::default();
        assert!(!report.is_degraded());
        report.content = FieldSource::Placeholder;
        assert!(report.is_degraded());
        // content placeholder plus four defaulted `Missing` fields
        assert_eq!(report.fallback_count(), 5);
        report.title = FieldSource::Selector("h1".into());
        assert_eq!(report.fallback_count(), 4);
        assert!(FieldSource::Missing.is_fallback());
        assert!(!FieldSource::BodyText.is_fallback());
    }
}
