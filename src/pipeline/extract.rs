//! Heuristic field extraction from an article page.
//!
//! The page is parsed once and noise subtrees (scripts, navigation, headers,
//! footers, sidebars, ads, share widgets) are detached once. Every field is
//! then read from that same stripped tree by walking an ordered rule list:
//! the first rule whose element yields an acceptable value wins.
//!
//! # Fields
//!
//! | Field | Rules | Fallback |
//! |-------|-------|----------|
//! | title | `h1`, `.title`, `.article-title`, `.post-title`, test id, `<title>` | `"Untitled Article"` |
//! | content | 13 container selectors, text > 100 chars | paragraphs > 20 chars, then body text, then `"No content found"` |
//! | author | `.author`, `.byline`, test id, `.article-author`, `.post-author`, `rel=author` | `<meta name="author">` |
//! | publish date | `.date` ... `<time>`, `datetime` preferred | `article:published_time`, `<meta name="date">` |
//! | description | `<meta name="description">`, `og:description` | first `<p>` over 50 chars |
//!
//! Extraction never fails. Each value carries a [`FieldSource`] so callers
//! can tell a real match from a placeholder.

use crate::models::{FieldSource, NO_CONTENT_FOUND, UNTITLED_ARTICLE};
use crate::pipeline::sanitize::sanitize_html;
use crate::utils::{char_len, collapse_whitespace, escape_text, truncate_with_ellipsis};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// A container must hold more text than this to count as the article body.
pub const CONTENT_MIN_CHARS: usize = 100;
/// Paragraphs at or below this length are treated as boilerplate.
pub const PARAGRAPH_MIN_CHARS: usize = 20;
/// Body text shorter than this is not worth returning.
pub const BODY_TEXT_MIN_CHARS: usize = 200;
pub const BODY_TEXT_MAX_CHARS: usize = 2000;
/// The first paragraph must be longer than this to serve as a description.
pub const DESCRIPTION_PARAGRAPH_MIN_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// Subtrees removed before any field is read.
const NOISE_SELECTOR: &str = "script, style, noscript, nav, header, footer, aside, \
    .sidebar, .menu, .navigation, .nav, .advertisement, .ads, .ad, \
    .social-share, .share-buttons, .social";

/// How a rule turns a matched element into a value.
#[derive(Debug, Clone, Copy)]
enum Read {
    /// Trimmed, whitespace-collapsed text content.
    Text,
    /// Value of the named attribute.
    Attr(&'static str),
    /// The named attribute if present and non-blank, else the text.
    AttrOrText(&'static str),
}

struct Rule {
    css: &'static str,
    selector: Selector,
    read: Read,
}

impl Rule {
    fn new(css: &'static str, read: Read) -> Self {
        Rule {
            css,
            selector: Selector::parse(css).expect("invalid built-in selector"),
            read,
        }
    }

    fn read(&self, element: ElementRef<'_>) -> Option<String> {
        let value = match self.read {
            Read::Text => element_text(element),
            Read::Attr(name) => element.value().attr(name).map(collapse_whitespace)?,
            Read::AttrOrText(name) => match element.value().attr(name).map(collapse_whitespace) {
                Some(v) if !v.is_empty() => v,
                _ => element_text(element),
            },
        };
        (!value.is_empty()).then_some(value)
    }
}

fn rule_list(specs: &[(&'static str, Read)]) -> Vec<Rule> {
    specs.iter().map(|&(css, read)| Rule::new(css, read)).collect()
}

static NOISE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(NOISE_SELECTOR).expect("invalid built-in selector"));
static PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("invalid built-in selector"));
static BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("invalid built-in selector"));

static TITLE_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    rule_list(&[
        ("h1", Read::Text),
        (".title", Read::Text),
        (".article-title", Read::Text),
        (".post-title", Read::Text),
        (r#"[data-testid="headline"]"#, Read::Text),
        ("title", Read::Text),
    ])
});

static CONTENT_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    rule_list(&[
        (".content", Read::Text),
        (".post-content", Read::Text),
        (".entry-content", Read::Text),
        (".article-content", Read::Text),
        (".article-body", Read::Text),
        (".post-body", Read::Text),
        (".story-body", Read::Text),
        (r#"[data-testid="article-body"]"#, Read::Text),
        ("main article", Read::Text),
        ("main", Read::Text),
        ("article", Read::Text),
        (".post", Read::Text),
        (".entry", Read::Text),
    ])
});

static AUTHOR_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    rule_list(&[
        (".author", Read::Text),
        (".byline", Read::Text),
        (r#"[data-testid="author-name"]"#, Read::Text),
        (".article-author", Read::Text),
        (".post-author", Read::Text),
        (r#"[rel="author"]"#, Read::Text),
    ])
});

static AUTHOR_META_RULES: Lazy<Vec<Rule>> =
    Lazy::new(|| rule_list(&[(r#"meta[name="author"]"#, Read::Attr("content"))]));

static DATE_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    rule_list(&[
        (".date", Read::AttrOrText("datetime")),
        (".publish-date", Read::AttrOrText("datetime")),
        (".article-date", Read::AttrOrText("datetime")),
        (".post-date", Read::AttrOrText("datetime")),
        (r#"[data-testid="timestamp"]"#, Read::AttrOrText("datetime")),
        ("time", Read::AttrOrText("datetime")),
    ])
});

static DATE_META_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    rule_list(&[
        (r#"meta[property="article:published_time"]"#, Read::Attr("content")),
        (r#"meta[name="date"]"#, Read::Attr("content")),
    ])
});

static DESCRIPTION_META_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    rule_list(&[
        (r#"meta[name="description"]"#, Read::Attr("content")),
        (r#"meta[property="og:description"]"#, Read::Attr("content")),
    ])
});

/// A value together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<T> {
    pub value: T,
    pub source: FieldSource,
}

impl<T> Extracted<T> {
    fn new(value: T, source: FieldSource) -> Self {
        Extracted { value, source }
    }
}

impl Extracted<Option<String>> {
    fn missing() -> Self {
        Extracted::new(None, FieldSource::Missing)
    }
}

/// Every field of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFields {
    pub title: Extracted<String>,
    pub content: Extracted<String>,
    pub author: Extracted<Option<String>>,
    pub publish_date: Extracted<Option<String>>,
    pub description: Extracted<Option<String>>,
}

impl ExtractedFields {
    /// Text the slug should be derived from: empty when the title is the
    /// placeholder, so the slug falls back instead of becoming
    /// `untitled-article`.
    pub fn slug_basis(&self) -> &str {
        if self.title.source == FieldSource::Placeholder {
            ""
        } else {
            &self.title.value
        }
    }
}

/// Parse `html`, strip noise once, and extract every field.
#[instrument(level = "debug", skip_all, fields(bytes = html.len()))]
pub fn extract_fields(html: &str) -> ExtractedFields {
    let mut document = Html::parse_document(html);
    let stripped = strip_noise(&mut document);

    let fields = ExtractedFields {
        title: extract_title(&document),
        content: extract_content(&document),
        author: extract_author(&document),
        publish_date: extract_publish_date(&document),
        description: extract_description(&document),
    };

    debug!(
        stripped,
        title_source = ?fields.title.source,
        content_source = ?fields.content.source,
        author_source = ?fields.author.source,
        date_source = ?fields.publish_date.source,
        description_source = ?fields.description.source,
        "Extracted fields"
    );
    fields
}

/// Detach every noise subtree from the document. Returns how many matched.
fn strip_noise(document: &mut Html) -> usize {
    let ids: Vec<_> = document.select(&NOISE).map(|el| el.id()).collect();
    let count = ids.len();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    count
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// First value any rule yields that passes `accept`, with the winning selector.
fn first_match<'r>(
    document: &Html,
    rules: &'r [Rule],
    accept: impl Fn(&str) -> bool,
) -> Option<(String, &'r str)> {
    rules.iter().find_map(|rule| {
        document
            .select(&rule.selector)
            .find_map(|el| rule.read(el).filter(|v| accept(v)))
            .map(|v| (v, rule.css))
    })
}

fn extract_title(document: &Html) -> Extracted<String> {
    match first_match(document, &TITLE_RULES, |_| true) {
        Some((title, css)) => Extracted::new(title, FieldSource::Selector(css.to_string())),
        None => Extracted::new(UNTITLED_ARTICLE.to_string(), FieldSource::Placeholder),
    }
}

fn extract_content(document: &Html) -> Extracted<String> {
    for rule in CONTENT_RULES.iter() {
        for element in document.select(&rule.selector) {
            if char_len(&element_text(element)) <= CONTENT_MIN_CHARS {
                continue;
            }
            let html = sanitize_html(&element.inner_html());
            // Text only inside hidden or executable elements does not count.
            if !html.trim().is_empty() {
                return Extracted::new(html, FieldSource::Selector(rule.css.to_string()));
            }
        }
    }

    let paragraphs: String = document
        .select(&PARAGRAPH)
        .map(element_text)
        .filter(|text| char_len(text) > PARAGRAPH_MIN_CHARS)
        .map(|text| format!("<p>{}</p>", escape_text(&text)))
        .collect();
    if !paragraphs.is_empty() {
        return Extracted::new(sanitize_html(&paragraphs), FieldSource::Paragraphs);
    }

    let body_text = document
        .select(&BODY)
        .next()
        .map(element_text)
        .unwrap_or_default();
    if char_len(&body_text) >= BODY_TEXT_MIN_CHARS {
        let text = truncate_with_ellipsis(&body_text, BODY_TEXT_MAX_CHARS);
        return Extracted::new(sanitize_html(&escape_text(&text)), FieldSource::BodyText);
    }

    Extracted::new(NO_CONTENT_FOUND.to_string(), FieldSource::Placeholder)
}

fn extract_author(document: &Html) -> Extracted<Option<String>> {
    if let Some((author, css)) = first_match(document, &AUTHOR_RULES, |_| true) {
        return Extracted::new(Some(author), FieldSource::Selector(css.to_string()));
    }
    if let Some((author, css)) = first_match(document, &AUTHOR_META_RULES, |_| true) {
        return Extracted::new(Some(author), FieldSource::Meta(css.to_string()));
    }
    Extracted::missing()
}

fn extract_publish_date(document: &Html) -> Extracted<Option<String>> {
    if let Some((date, css)) = first_match(document, &DATE_RULES, |_| true) {
        return Extracted::new(Some(date), FieldSource::Selector(css.to_string()));
    }
    if let Some((date, css)) = first_match(document, &DATE_META_RULES, |_| true) {
        return Extracted::new(Some(date), FieldSource::Meta(css.to_string()));
    }
    Extracted::missing()
}

fn extract_description(document: &Html) -> Extracted<Option<String>> {
    if let Some((description, css)) = first_match(document, &DESCRIPTION_META_RULES, |_| true) {
        return Extracted::new(
            Some(truncate_with_ellipsis(&description, DESCRIPTION_MAX_CHARS)),
            FieldSource::Meta(css.to_string()),
        );
    }

    let first_paragraph = document.select(&PARAGRAPH).next().map(element_text);
    match first_paragraph {
        Some(text) if char_len(&text) > DESCRIPTION_PARAGRAPH_MIN_CHARS => Extracted::new(
            Some(truncate_with_ellipsis(&text, DESCRIPTION_MAX_CHARS)),
            FieldSource::FirstParagraph,
        ),
        _ => Extracted::missing(),
    }
}
