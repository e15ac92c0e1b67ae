//! HTML sanitizer for extracted article content.
//!
//! The fragment is parsed once and serialized back while skipping executable
//! or hidden elements and every attribute outside a small allow-list.
//! Serializing a parsed tree means the output is already in the parser's
//! normal form, so sanitizing twice gives the same string.

use crate::utils::escape_text;
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html};

/// Elements removed together with their whole subtree. `base` would rebase
/// every relative link wherever the content is rendered; `plaintext` can
/// never be closed.
const DROPPED_ELEMENTS: &[&str] = &[
    "script",
    "style",
    "iframe",
    "object",
    "embed",
    "noscript",
    "base",
    "plaintext",
];

/// The only attributes that survive.
const ALLOWED_ATTRIBUTES: &[&str] = &["alt", "href", "src", "title"];

/// URL-bearing attributes whose value is checked for script schemes.
const URL_ATTRIBUTES: &[&str] = &["href", "src"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are not entity-decoded by the parser.
const RAW_TEXT_ELEMENTS: &[&str] = &["xmp", "noembed", "noframes"];

/// The parser eats one newline right after these start tags.
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// Sanitize an HTML fragment.
///
/// Removes `script`, `style`, `iframe`, `object`, `embed`, `noscript`,
/// `base` and `plaintext` elements, comments, and any element hidden with
/// an inline `display: none`. Keeps only `alt`, `href`, `src` and `title`
/// attributes (sorted, one per name) and drops `href`/`src` values with a
/// script scheme.
///
/// Never fails: malformed markup is repaired by the parser, empty input gives
/// an empty string.
pub fn sanitize_html(fragment: &str) -> String {
    if fragment.trim().is_empty() {
        return String::new();
    }
    let parsed = Html::parse_fragment(fragment);
    let mut out = String::with_capacity(fragment.len());
    write_children(parsed.root_element(), &mut out);
    out
}

fn write_children(parent: ElementRef<'_>, out: &mut String) {
    let raw = RAW_TEXT_ELEMENTS.contains(&parent.value().name());
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => {
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
            }
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    write_element(element, out);
                }
            }
            // Comments, doctypes and processing instructions are dropped.
            _ => {}
        }
    }
}

/// Whether `node` produces any output at all.
fn is_emitted(node: &Node) -> bool {
    match node {
        Node::Text(_) => true,
        Node::Element(element) => !is_dropped(element),
        _ => false,
    }
}

fn is_dropped(element: &Element) -> bool {
    DROPPED_ELEMENTS.contains(&element.name()) || is_hidden(element)
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let value = element.value();
    let name = value.name();
    if is_dropped(value) {
        return;
    }

    out.push('<');
    out.push_str(name);

    let mut attrs: Vec<(&str, &str)> = value
        .attrs()
        .filter(|(attr, val)| is_allowed_attribute(attr, val))
        .collect();
    // Foreign elements can carry `href` and `xlink:href`, both named `href`
    // here. The stable sort keeps the first of them.
    attrs.sort_by_key(|(attr, _)| *attr);
    attrs.dedup_by_key(|(attr, _)| *attr);
    for (attr, val) in attrs {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&escape_attribute(val));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    if LEADING_NEWLINE_ELEMENTS.contains(&name) {
        // Dropped children vanish, so look at the first one actually written.
        let starts_with_newline = element
            .children()
            .find(|child| is_emitted(child.value()))
            .and_then(|first| first.value().as_text().map(|t| t.starts_with('\n')))
            .unwrap_or(false);
        if starts_with_newline {
            out.push('\n');
        }
    }

    write_children(element, out);

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn is_hidden(element: &Element) -> bool {
    element.attr("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.contains("display:none")
    })
}

fn is_allowed_attribute(name: &str, value: &str) -> bool {
    if !ALLOWED_ATTRIBUTES.contains(&name) {
        return false;
    }
    !(URL_ATTRIBUTES.contains(&name) && has_script_scheme(value))
}

fn has_script_scheme(value: &str) -> bool {
    // Browsers ignore ASCII whitespace and control characters inside the scheme.
    let compact: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("javascript:")
        || compact.starts_with("vbscript:")
        || compact.starts_with("data:text/html")
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_allow_list_keeps_href_only() {
        let out = sanitize_html(r#"<div onclick="x()" data-foo="bar" href="/a">t</div>"#);
        assert_eq!(out, r#"<div href="/a">t</div>"#);
    }

    #[test]
    fn test_drops_executable_elements() {
        let out = sanitize_html(
            "<p>keep</p><script>alert(1)</script><style>p{}</style>\
             <iframe src=\"https://x.test\"></iframe><object data=\"x\"></object>\
             <embed src=\"x.swf\"><noscript>no</noscript>",
        );
        assert_eq!(out, "<p>keep</p>");
    }

    #[test]
    fn test_drops_hidden_elements() {
        let out = sanitize_html(
            r#"<p>shown</p><div style="color: red; DISPLAY : None">secret</div><span style="display:block">ok</span>"#,
        );
        assert_eq!(out, "<p>shown</p><span>ok</span>");
    }

    #[test]
    fn test_keeps_image_attributes_sorted() {
        let out = sanitize_html(r#"<img title="T" width="10" src="/i.png" alt="A" onerror="x()">"#);
        assert_eq!(out, r#"<img alt="A" src="/i.png" title="T">"#);
    }

    #[test]
    fn test_drops_script_urls() {
        let out = sanitize_html(
            r#"<a href="java&#x09;script:alert(1)">x</a><a href=" JAVASCRIPT:alert(1)">y</a><a href="https://ok.test">z</a>"#,
        );
        assert_eq!(out, r#"<a>x</a><a>y</a><a href="https://ok.test">z</a>"#);
    }

    #[test]
    fn test_escapes_text_and_attributes() {
        let out = sanitize_html(r#"<p title="a &quot;b&quot; &amp; c">1 &lt; 2 &amp;&amp; 3 &gt; 2</p>"#);
        assert_eq!(out, r#"<p title="a &quot;b&quot; &amp; c">1 &lt; 2 &amp;&amp; 3 &gt; 2</p>"#);
    }

    #[test]
    fn test_drops_comments() {
        assert_eq!(sanitize_html("<p>a<!-- hidden -->b</p>"), "<p>ab</p>");
    }

    #[test]
    fn test_empty_and_plain_text() {
        assert_eq!(sanitize_html(""), "");
        assert_eq!(sanitize_html("   "), "");
        assert_eq!(sanitize_html("No content found"), "No content found");
    }

    #[test]
    fn test_repairs_malformed_markup() {
        let out = sanitize_html("<p><b>unclosed");
        assert_eq!(out, "<p><b>unclosed</b></p>");
    }

    #[test]
    fn test_pre_newline_after_dropped_first_child() {
        assert_eq!(sanitize_html("<pre><!--c-->\nfoo</pre>"), "<pre>\n\nfoo</pre>");
        assert_eq!(
            sanitize_html("<pre><script>x()</script>\nfoo</pre>"),
            "<pre>\n\nfoo</pre>"
        );
        // An emitted element first: nothing to protect.
        assert_eq!(sanitize_html("<pre><b>x</b>\nfoo</pre>"), "<pre><b>x</b>\nfoo</pre>");
    }

    #[test]
    fn test_drops_plaintext_and_base() {
        assert_eq!(sanitize_html("<p>a</p><plaintext>b"), "<p>a</p>");
        assert_eq!(
            sanitize_html(r#"<base href="https://evil.test/"><a href="/x">x</a>"#),
            r#"<a href="/x">x</a>"#
        );
    }

    #[test]
    fn test_foreign_href_attributes_are_deduplicated() {
        let out = sanitize_html(r#"<svg><a href="/one" xlink:href="/two">t</a></svg>"#);
        assert_eq!(out.matches("href=").count(), 1, "{out}");
        assert!(out.starts_with("<svg><a href=\"/"), "{out}");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            r#"<div onclick="x()" data-foo="bar" href="/a">t</div>"#,
            "<p>a &amp; b</p><pre>\n\nindented</pre><table><tr><td>1</td></tr></table>",
            r#"<ul><li>one<li>two</ul><img src="/x.png" alt='say "hi"'><br>"#,
            "<p>nbsp\u{a0}here</p><xmp><b>raw</b></xmp><textarea>\nx &lt; y</textarea>",
            "text <b>bold <i>both</b> italic</i> tail",
            "<pre><!--c-->\nfoo</pre>",
            r#"<pre><span style="display:none">x</span>
foo</pre>"#,
            "<p>a</p><plaintext>b",
            r#"<svg><a href="/one" xlink:href="/two">t</a></svg>"#,
        ];
        for input in inputs {
            let once = sanitize_html(input);
            let twice = sanitize_html(&once);
            assert_eq!(once, twice, "not a fixed point for {input:?}");
        }
    }
}
