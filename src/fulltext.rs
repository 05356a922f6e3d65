// src/fulltext.rs
//! Article body extraction for feeds that only ship a summary.
//!
//! Strategies run from most to least selective; the first one producing
//! at least `STRATEGY_MIN_CHARS` characters wins:
//! 1. `density`: paragraph-scored content block (link-heavy blocks penalized)
//! 2. `readability`: reader-mode containers (`main`, `article`, `[role=main]`...)
//! 3. `markup`: whole body minus navigation chrome
//! 4. `regex`: raw tag strip

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::ingest::types::FullTextPolicy;
use crate::normalize::normalize_whitespace;

pub const USER_AGENT: &str = "AI-News-Radar/1.0 (+internal monitoring)";
const STRATEGY_MIN_CHARS: usize = 200;
const MAX_BODY_BYTES: usize = 2_000_000;

static SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "header", "footer", "nav", "aside", "form", "iframe",
];

static SEL_BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static SEL_P: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static SEL_A: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static READER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        "main",
        r#"[role="main"]"#,
        ".post-content",
        ".entry-content",
        ".article-body",
        ".content",
        "#content",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

/// Result of one extraction attempt. Empty text means "keep the summary";
/// `method` records what happened either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub method: String,
}

impl Extraction {
    fn failed(method: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            method: method.into(),
        }
    }
}

#[async_trait]
pub trait FullTextFetcher: Send + Sync {
    async fn extract(&self, url: &str, policy: &FullTextPolicy) -> Extraction;
}

/// Fetches pages over HTTP with `reqwest`.
#[derive(Clone)]
pub struct HttpExtractor {
    client: reqwest::Client,
}

impl HttpExtractor {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_html(&self, url: &str, timeout: Duration) -> Result<String, String> {
        let mut resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|_| "error".to_string())?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("http_{}", status.as_u16()));
        }
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(|_| "error".to_string())? {
            let room = MAX_BODY_BYTES - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl FullTextFetcher for HttpExtractor {
    async fn extract(&self, url: &str, policy: &FullTextPolicy) -> Extraction {
        if url.is_empty() {
            return Extraction::failed("empty_url");
        }
        if !policy.politeness_delay.is_zero() {
            tokio::time::sleep(policy.politeness_delay).await;
        }

        let html = match self.fetch_html(url, policy.timeout).await {
            Ok(h) if !h.trim().is_empty() => h,
            Ok(_) => return Extraction::failed("error"),
            Err(method) => return Extraction::failed(method),
        };

        let (text, strategy) = extract_main_text(&html);
        finish(text, strategy, policy)
    }
}

fn finish(text: String, strategy: &str, policy: &FullTextPolicy) -> Extraction {
    if text.chars().count() < policy.min_chars {
        return Extraction::failed(format!("reqwest+{strategy}+too_short"));
    }
    Extraction {
        text: text.chars().take(policy.max_chars).collect(),
        method: format!("reqwest+{strategy}"),
    }
}

/// Main readable text of an HTML page plus the strategy that produced it.
pub fn extract_main_text(html: &str) -> (String, &'static str) {
    if html.trim().is_empty() {
        return (String::new(), "empty");
    }

    // `Html` is not Send; keep the parsed document inside this sync scope.
    let doc = Html::parse_document(html);
    let strategies: [(&'static str, fn(&Html) -> String); 3] = [
        ("density", density_text),
        ("readability", reader_text),
        ("markup", markup_text),
    ];
    for (name, strategy) in strategies {
        let txt = strategy(&doc);
        if txt.chars().count() >= STRATEGY_MIN_CHARS {
            return (txt, name);
        }
    }

    (strip_tags_basic(html), "regex")
}

/// Visible text under `el`, skipping script/style and page chrome.
fn visible_text(el: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIP_TAGS.contains(&e.name()))
        });
        if !hidden {
            parts.push(text);
        }
    }
    normalize_whitespace(&parts.join(" "))
}

fn density_text(doc: &Html) -> String {
    // Insertion-ordered so ties resolve to the first block in the document.
    let mut scores: Vec<(_, f64)> = Vec::new();

    for p in doc.select(&SEL_P) {
        let text = normalize_whitespace(&p.text().collect::<Vec<_>>().join(" "));
        let len = text.chars().count();
        if len < 25 {
            continue;
        }
        let score = 1.0 + text.matches(',').count() as f64 + (len as f64 / 100.0).min(3.0);

        let Some(parent) = p.parent() else { continue };
        bump(&mut scores, parent.id(), score);
        if let Some(grand) = parent.parent() {
            bump(&mut scores, grand.id(), score / 2.0);
        }
    }

    let mut best: Option<(ElementRef<'_>, f64)> = None;
    for (id, score) in scores {
        let Some(el) = doc.tree.get(id).and_then(ElementRef::wrap) else {
            continue;
        };
        if SKIP_TAGS.contains(&el.value().name()) {
            continue;
        }
        let adjusted = score * (1.0 - link_density(el));
        match best {
            Some((_, b)) if b >= adjusted => {}
            _ => best = Some((el, adjusted)),
        }
    }

    let Some((top, _)) = best else {
        return String::new();
    };
    let paragraphs: Vec<String> = top
        .select(&SEL_P)
        .map(visible_text)
        .filter(|t| !t.is_empty())
        .collect();
    paragraphs.join(" ")
}

fn bump<K: PartialEq>(scores: &mut Vec<(K, f64)>, id: K, score: f64) {
    match scores.iter_mut().find(|(k, _)| *k == id) {
        Some(entry) => entry.1 += score,
        None => scores.push((id, score)),
    }
}

fn link_density(el: ElementRef<'_>) -> f64 {
    let total = el.text().map(|t| t.chars().count()).sum::<usize>();
    if total == 0 {
        return 1.0;
    }
    let linked: usize = el
        .select(&SEL_A)
        .map(|a| a.text().map(|t| t.chars().count()).sum::<usize>())
        .sum();
    (linked as f64 / total as f64).clamp(0.0, 1.0)
}

fn reader_text(doc: &Html) -> String {
    for sel in READER_SELECTORS.iter() {
        if let Some(el) = doc.select(sel).next() {
            let txt = visible_text(el);
            if txt.chars().count() >= STRATEGY_MIN_CHARS {
                return txt;
            }
        }
    }
    String::new()
}

fn markup_text(doc: &Html) -> String {
    match doc.select(&SEL_BODY).next() {
        Some(body) => visible_text(body),
        None => visible_text(doc.root_element()),
    }
}

/// Last resort: regex tag strip over the raw page.
pub fn strip_tags_basic(html: &str) -> String {
    static RE_BLOCKS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>").unwrap());
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

    let x = RE_BLOCKS.replace_all(html, " ");
    let x = RE_TAGS.replace_all(&x, " ");
    normalize_whitespace(&html_escape::decode_html_entities(&x))
}
