// src/normalize.rs
//! URL canonicalization and text cleanup shared by every stage.

use once_cell::sync::OnceCell;
use regex::Regex;
use url::Url;

/// Default cap for stored text.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 20_000;

/// Canonical form of a URL, used as the dedup key.
///
/// Drops the fragment, sorts query parameters (blank values kept) and strips
/// trailing slashes. Anything that does not parse as an absolute URL comes
/// back trimmed but otherwise untouched. Applying it twice is a no-op.
pub fn canonicalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(u) => u,
        Err(_) => return trimmed.to_string(),
    };

    parsed.set_fragment(None);

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        pairs.sort();
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter())
            .finish();
        parsed.set_query(Some(&query));
    }

    let out: String = parsed.into();
    // "https://a.b/" re-parses with its slash restored, so stripping every
    // trailing slash keeps the function idempotent.
    out.trim_end_matches('/').to_string()
}

/// Collapse runs of whitespace into one space and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text content of an HTML fragment: script/style bodies dropped, tags
/// replaced by spaces, entities decoded.
pub fn strip_html(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    static RE_BLOCKS: OnceCell<Regex> = OnceCell::new();
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_blocks = RE_BLOCKS.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<noscript\b[^>]*>.*?</noscript\s*>")
            .unwrap()
    });
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap());

    let out = re_blocks.replace_all(s, " ");
    let out = re_tags.replace_all(&out, " ");
    html_escape::decode_html_entities(&out).into_owned()
}

/// Clean a free-text field: strip markup, collapse whitespace and cap the
/// length at `max_len` characters (an ellipsis marks the cut).
pub fn safe_text(s: &str, max_len: usize) -> String {
    let out = normalize_whitespace(&strip_html(s));
    if out.chars().count() > max_len {
        let mut cut: String = out.chars().take(max_len).collect();
        cut.push('…');
        cut
    } else {
        out
    }
}

/// `safe_text` with the default cap.
pub fn clean_text(s: &str) -> String {
    safe_text(s, DEFAULT_MAX_TEXT_CHARS)
}
