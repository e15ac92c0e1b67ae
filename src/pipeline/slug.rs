//! Title-to-slug conversion.
//!
//! Slugs contain only ASCII word characters, hyphens and CJK ideographs
//! (U+4E00..=U+9FFF), never start or end with a hyphen, and are never empty.
//! Uniqueness is best effort: blank or fully stripped titles fall back to
//! `untitled-<unix millis>`, optionally followed by a random suffix. Real
//! uniqueness within a namespace is decided when the article is saved.

use chrono::Utc;
use once_cell::sync::Lazy;
use rand::Rng;
use rand::distr::Alphanumeric;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Stripped before slugging; they carry no meaning in a URL.
const STRIPPED_CHARS: &[char] = &['*', '+', '~', '.', '(', ')', '\'', '"', '!', ':', '@'];

/// Symbols spelled out instead of dropped.
const CHAR_MAP: &[(char, &str)] = &[
    ('&', " and "),
    ('$', " dollar "),
    ('%', " percent "),
    ('<', " less "),
    ('>', " greater "),
    ('|', " or "),
    ('€', " euro "),
    ('£', " pound "),
    ('¥', " yen "),
    ('©', " c "),
    ('®', " r "),
    ('™', " tm "),
    ('ß', "ss"),
    ('æ', "ae"),
    ('Æ', "AE"),
    ('œ', "oe"),
    ('Œ', "OE"),
    ('ø', "o"),
    ('Ø', "O"),
    ('đ', "d"),
    ('Đ', "D"),
    ('ð', "d"),
    ('Ð', "D"),
    ('þ', "th"),
    ('Þ', "TH"),
    ('ł', "l"),
    ('Ł', "L"),
    ('ı', "i"),
];

const SUFFIX_LEN: usize = 6;

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-\x{4e00}-\x{9fff}]").unwrap());
static HYPHEN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// How the `untitled-` fallback slug is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSuffix {
    /// `untitled-<millis>`. Two fallbacks in the same millisecond collide.
    Timestamp,
    /// `untitled-<millis>-<6 random lowercase alphanumerics>`.
    TimestampRandom,
}

impl FallbackSuffix {
    pub fn from_config(random_slug_suffix: bool) -> Self {
        if random_slug_suffix {
            FallbackSuffix::TimestampRandom
        } else {
            FallbackSuffix::Timestamp
        }
    }
}

/// Derive a URL-safe slug from `title`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("Real Title", FallbackSuffix::Timestamp), "real-title");
/// assert_eq!(slugify("Crème Brûlée: a guide", FallbackSuffix::Timestamp), "creme-brulee-a-guide");
/// assert!(slugify("🎉🎉", FallbackSuffix::Timestamp).starts_with("untitled-"));
/// ```
pub fn slugify(title: &str, fallback: FallbackSuffix) -> String {
    if title.trim().is_empty() {
        return fallback_slug(fallback);
    }

    let slug = clean(&transliterate(title));
    if slug.is_empty() {
        fallback_slug(fallback)
    } else {
        slug
    }
}

/// Fold diacritics, spell out symbols, drop the stripped set, turn path
/// separators and whitespace into hyphens, lowercase.
fn transliterate(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.nfkd() {
        if is_combining_mark(c) || STRIPPED_CHARS.contains(&c) {
            continue;
        }
        if c == '/' || c == '\\' {
            out.push('-');
            continue;
        }
        match CHAR_MAP.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    let trimmed = out.trim();
    WHITESPACE_RUN.replace_all(trimmed, "-").to_lowercase()
}

/// Keep only the slug alphabet, collapse hyphens, trim them from the ends.
fn clean(s: &str) -> String {
    let kept = DISALLOWED.replace_all(s, "");
    let collapsed = HYPHEN_RUN.replace_all(&kept, "-");
    collapsed.trim_matches('-').to_string()
}

fn fallback_slug(suffix: FallbackSuffix) -> String {
    let millis = Utc::now().timestamp_millis();
    match suffix {
        FallbackSuffix::Timestamp => format!("untitled-{millis}"),
        FallbackSuffix::TimestampRandom => {
            let tail: String = rand::rng()
                .sample_iter(&Alphanumeric)
                .take(SUFFIX_LEN)
                .map(|b| char::from(b).to_ascii_lowercase())
                .collect();
            format!("untitled-{millis}-{tail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    static SLUG_ALPHABET: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-\x{4e00}-\x{9fff}]+$").unwrap());
    static LEGACY_FALLBACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^untitled-\d+$").unwrap());
    static RANDOM_FALLBACK: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^untitled-\d+-[a-z0-9]{6}$").unwrap());

    fn slug(title: &str) -> String {
        slugify(title, FallbackSuffix::Timestamp)
    }

    fn assert_safe(s: &str) {
        assert!(SLUG_ALPHABET.is_match(s), "bad alphabet: {s:?}");
        assert!(!s.starts_with('-') && !s.ends_with('-'), "edge hyphen: {s:?}");
        assert!(!s.contains('/') && !s.contains('\\'), "separator: {s:?}");
    }

    #[test]
    fn test_basic_titles() {
        assert_eq!(slug("Real Title"), "real-title");
        assert_eq!(slug("  Hello   World  "), "hello-world");
        assert_eq!(slug("Trump-Xi 'situationship'"), "trump-xi-situationship");
        assert_eq!(slug("What's new in Rust 1.80?"), "whats-new-in-rust-180");
    }

    #[test]
    fn test_diacritics_are_folded() {
        assert_eq!(slug("Crème Brûlée: a guide"), "creme-brulee-a-guide");
        assert_eq!(slug("Ångström über Straße"), "angstrom-uber-strasse");
        assert_eq!(slug("Łódź"), "lodz");
    }

    #[test]
    fn test_symbols_are_spelled_out() {
        assert_eq!(slug("Salt & Pepper"), "salt-and-pepper");
        assert_eq!(slug("100% pure"), "100-percent-pure");
    }

    #[test]
    fn test_path_separators_become_hyphens() {
        assert_eq!(slug("AC/DC \\ live"), "ac-dc-live");
        assert_eq!(slug("../../etc/passwd"), "etc-passwd");
    }

    #[test]
    fn test_cjk_is_kept() {
        assert_eq!(slug("中文 标题"), "中文-标题");
        assert_eq!(slug("Rust 入门"), "rust-入门");
    }

    #[test]
    fn test_fallback_for_blank_titles() {
        assert!(LEGACY_FALLBACK.is_match(&slug("")));
        assert!(LEGACY_FALLBACK.is_match(&slug("   \n")));
    }

    #[test]
    fn test_fallback_when_everything_is_stripped() {
        assert!(LEGACY_FALLBACK.is_match(&slug("🎉🎉🎉")));
        assert!(LEGACY_FALLBACK.is_match(&slug("*+~.()'\":!@")));
        assert!(LEGACY_FALLBACK.is_match(&slug("---")));
        assert!(LEGACY_FALLBACK.is_match(&slug("///")));
    }

    #[test]
    fn test_random_suffix_fallback() {
        let a = slugify("", FallbackSuffix::TimestampRandom);
        let b = slugify("", FallbackSuffix::TimestampRandom);
        assert!(RANDOM_FALLBACK.is_match(&a), "{a}");
        assert!(RANDOM_FALLBACK.is_match(&b), "{b}");
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_config() {
        assert_eq!(FallbackSuffix::from_config(true), FallbackSuffix::TimestampRandom);
        assert_eq!(FallbackSuffix::from_config(false), FallbackSuffix::Timestamp);
    }

    proptest! {
        #[test]
        fn prop_slug_is_always_safe(title in any::<String>()) {
            assert_safe(&slugify(&title, FallbackSuffix::Timestamp));
            assert_safe(&slugify(&title, FallbackSuffix::TimestampRandom));
        }

        #[test]
        fn prop_separator_heavy_titles_are_safe(title in r"[/\\ a-z.\-]{0,40}") {
            assert_safe(&slug(&title));
        }
    }
}
