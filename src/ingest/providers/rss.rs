// src/ingest/providers/rss.rs
//! RSS 2.0 / Atom collector.
//!
//! Elements are matched by local name, so `dc:creator` and
//! `content:encoded` need no namespace handling. Text nodes are entity
//! decoded here; markup removal happens in `clean_text`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::histogram;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::config::FeedSpec;
use crate::ingest::types::{CandidateRecord, Collector};
use crate::item::SourceKind;
use crate::normalize::{canonicalize_url, clean_text};

pub const SOURCE_TYPE: &str = "rss";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: String,
    pub summary: String,
    pub content: String,
    pub author: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: String,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    FeedTitle,
    Title,
    Link,
    Published,
    Summary,
    Content,
    Author,
    AuthorName,
}

impl Field {
    fn for_entry_tag(tag: &[u8]) -> Option<Field> {
        Some(match tag {
            b"title" => Field::Title,
            b"link" => Field::Link,
            b"pubDate" | b"published" | b"updated" | b"date" => Field::Published,
            b"description" | b"summary" => Field::Summary,
            b"encoded" | b"content" => Field::Content,
            b"author" | b"creator" => Field::Author,
            b"name" => Field::AuthorName,
            _ => return None,
        })
    }

    fn closes_on(self, tag: &[u8]) -> bool {
        match self {
            Field::FeedTitle | Field::Title => tag == b"title",
            Field::Link => tag == b"link",
            Field::Published => matches!(tag, b"pubDate" | b"published" | b"updated" | b"date"),
            Field::Summary => matches!(tag, b"description" | b"summary"),
            Field::Content => matches!(tag, b"encoded" | b"content"),
            Field::Author => matches!(tag, b"author" | b"creator"),
            Field::AuthorName => tag == b"name",
        }
    }
}

fn set_once(slot: &mut String, value: &str) {
    let v = value.trim();
    if slot.is_empty() && !v.is_empty() {
        *slot = v.to_string();
    }
}

fn apply(entry: &mut FeedEntry, field: Field, text: &str) {
    match field {
        Field::Title => set_once(&mut entry.title, text),
        Field::Link => set_once(&mut entry.link, text),
        Field::Published => set_once(&mut entry.published, text),
        Field::Summary => set_once(&mut entry.summary, text),
        Field::Content => set_once(&mut entry.content, text),
        Field::Author | Field::AuthorName => set_once(&mut entry.author, text),
        Field::FeedTitle => {}
    }
}

/// Atom `<link href=".."/>`; only alternate (or rel-less) links count.
fn atom_href(e: &BytesStart<'_>) -> Result<Option<String>> {
    let rel = e
        .try_get_attribute("rel")?
        .map(|a| a.unescape_value().map(|v| v.into_owned()))
        .transpose()?;
    if rel.as_deref().is_some_and(|r| r != "alternate") {
        return Ok(None);
    }
    Ok(e.try_get_attribute("href")?
        .map(|a| a.unescape_value().map(|v| v.into_owned()))
        .transpose()?)
}

pub fn parse_feed(xml: &str) -> Result<ParsedFeed> {
    let mut reader = Reader::from_str(xml);
    let mut feed = ParsedFeed::default();
    let mut entry: Option<FeedEntry> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event().context("reading feed xml")? {
            Event::Start(e) => {
                let local = e.local_name();
                let tag = local.as_ref();
                if matches!(tag, b"item" | b"entry") {
                    entry = Some(FeedEntry::default());
                    field = None;
                    text.clear();
                } else if let Some(current) = entry.as_mut() {
                    if tag == b"link" {
                        if let Some(href) = atom_href(&e)? {
                            set_once(&mut current.link, &href);
                        }
                    }
                    // Unknown nested tags keep collecting into the open field.
                    if let Some(f) = Field::for_entry_tag(tag) {
                        field = Some(f);
                        text.clear();
                    }
                } else if tag == b"title" && feed.title.is_empty() {
                    field = Some(Field::FeedTitle);
                    text.clear();
                }
            }
            Event::Empty(e) => {
                if let Some(current) = entry.as_mut() {
                    if e.local_name().as_ref() == b"link" {
                        if let Some(href) = atom_href(&e)? {
                            set_once(&mut current.link, &href);
                        }
                    }
                }
            }
            Event::Text(t) => {
                if field.is_some() {
                    let raw = t.into_inner();
                    text.push_str(&html_escape::decode_html_entities(&String::from_utf8_lossy(&raw)));
                }
            }
            Event::CData(c) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => {
                let local = e.local_name();
                let tag = local.as_ref();
                if matches!(tag, b"item" | b"entry") {
                    if let Some(done) = entry.take() {
                        feed.entries.push(done);
                    }
                    field = None;
                    text.clear();
                } else if let Some(f) = field.filter(|f| f.closes_on(tag)) {
                    match (f, entry.as_mut()) {
                        (Field::FeedTitle, _) => set_once(&mut feed.title, &text),
                        (_, Some(current)) => apply(current, f, &text),
                        _ => {}
                    }
                    field = None;
                    text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(feed)
}

/// RFC 3339 (Atom) or RFC 2822 (RSS `pubDate`).
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let odt = OffsetDateTime::parse(s, &Rfc2822).ok()?;
    DateTime::from_timestamp(odt.unix_timestamp(), odt.nanosecond())
}

enum Mode {
    Fixture(String),
    Http(reqwest::Client),
}

/// One configured feed.
pub struct RssCollector {
    spec: FeedSpec,
    include: Vec<String>,
    exclude: Vec<String>,
    mode: Mode,
}

fn lowered(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

impl RssCollector {
    pub fn http(spec: FeedSpec, client: reqwest::Client) -> Self {
        Self {
            spec,
            include: Vec::new(),
            exclude: Vec::new(),
            mode: Mode::Http(client),
        }
    }

    /// Parses `xml` instead of fetching `spec.url`.
    pub fn from_fixture(spec: FeedSpec, xml: impl Into<String>) -> Self {
        Self {
            spec,
            include: Vec::new(),
            exclude: Vec::new(),
            mode: Mode::Fixture(xml.into()),
        }
    }

    /// Case-insensitive substring filters over title and content. An empty
    /// include list admits everything.
    pub fn with_filters(mut self, include: &[String], exclude: &[String]) -> Self {
        self.include = lowered(include);
        self.exclude = lowered(exclude);
        self
    }

    pub fn spec(&self) -> &FeedSpec {
        &self.spec
    }

    fn admits(&self, title: &str, content: &str) -> bool {
        let blob = format!("{title} {content}").to_lowercase();
        if !self.include.is_empty() && !self.include.iter().any(|k| blob.contains(k.as_str())) {
            return false;
        }
        !self.exclude.iter().any(|k| blob.contains(k.as_str()))
    }

    fn records(&self, feed: ParsedFeed) -> Vec<CandidateRecord> {
        let spec = &self.spec;
        let feed_title = clean_text(&feed.title);
        let creator_name = clean_text(&spec.creator_name);
        let fetched_at = Utc::now();

        feed.entries
            .into_iter()
            .filter_map(|e| {
                let title = clean_text(&e.title);
                let summary = clean_text(&e.summary);
                let full = clean_text(&e.content);
                let body = if full.chars().count() > summary.chars().count() {
                    full
                } else {
                    summary
                };
                let content_text = clean_text(&format!("{title}. {body}"));
                if !self.admits(&title, &content_text) {
                    return None;
                }

                let entry_author = clean_text(&e.author);
                let author_org = if spec.source_kind == SourceKind::Creator && !creator_name.is_empty() {
                    creator_name.clone()
                } else if !entry_author.is_empty() {
                    entry_author
                } else if !feed_title.is_empty() {
                    feed_title.clone()
                } else {
                    spec.name.clone()
                };

                Some(CandidateRecord {
                    source: spec.name.clone(),
                    source_type: SOURCE_TYPE.to_string(),
                    author_org,
                    creator_name: creator_name.clone(),
                    source_kind: spec.source_kind,
                    source_weight: spec.source_weight,
                    url: canonicalize_url(&e.link),
                    title,
                    content_text,
                    published_at: parse_feed_date(&e.published),
                    fetched_at,
                    content_type_hint: spec.content_type_hint.clone(),
                    fulltext: spec.fulltext.clone(),
                    lane_hint: spec.lane_hint,
                })
            })
            .collect()
    }

    fn parse(&self, xml: &str) -> Result<Vec<CandidateRecord>> {
        let t0 = std::time::Instant::now();
        let feed = parse_feed(xml).with_context(|| format!("parsing feed {}", self.spec.name))?;
        let out = self.records(feed);
        histogram!("radar_feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }
}

#[async_trait]
impl Collector for RssCollector {
    async fn collect(&self) -> Result<Vec<CandidateRecord>> {
        match &self.mode {
            Mode::Fixture(xml) => self.parse(xml),
            Mode::Http(client) => {
                let body = client
                    .get(&self.spec.url)
                    .send()
                    .await
                    .with_context(|| format!("feed {} get()", self.spec.name))?
                    .error_for_status()
                    .with_context(|| format!("feed {} status", self.spec.name))?
                    .text()
                    .await
                    .with_context(|| format!("feed {} .text()", self.spec.name))?;
                self.parse(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.spec.name
    }
}
