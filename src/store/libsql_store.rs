// src/store/libsql_store.rs
//! libSQL (SQLite-compatible) store. One `news_items` row per canonical URL.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, Row, Value};

use super::{migrations, ItemStore};
use crate::error::{RadarError, Result};
use crate::item::{ContentType, EnrichedItem, Lane, SourceKind};

/// SQLite's default host-parameter limit is 999; stay well below it.
const IN_CLAUSE_CHUNK: usize = 500;

const COLUMNS: &str = "url, id, source, source_type, author_org, creator_name, source_kind, \
    source_weight, title, content_text, published_at, fetched_at, content_type_hint, lane_hint, \
    lang, lang_confidence, lang_method, fulltext_method, topic, relevance_score, content_type, \
    content_type_confidence, quality_score, quality_flags, suggested_tags, source_trust_score, \
    recency_score, actionability_score, source_mix_score, novelty_score, breakout_signal, \
    priority_score, lane, status, tag_reasons";

const N_COLUMNS: usize = 35;

pub struct LibsqlStore {
    _db: Database,
    conn: Connection,
}

impl std::fmt::Debug for LibsqlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibsqlStore").finish_non_exhaustive()
    }
}

impl LibsqlStore {
    /// Open (or create) a local database file and bring the schema up to date.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RadarError::Store(format!("create database directory: {e}")))?;
        }
        let db = libsql::Builder::new_local(path).build().await?;
        let store = Self::init(db).await?;
        tracing::info!(target: "radar", path = %path.display(), "database opened");
        Ok(store)
    }

    pub async fn open_in_memory() -> Result<Self> {
        let db = libsql::Builder::new_local(":memory:").build().await?;
        Self::init(db).await
    }

    async fn init(db: Database) -> Result<Self> {
        let conn = db.connect()?;
        migrations::run_migrations(&conn).await?;
        Ok(Self { _db: db, conn })
    }

    pub async fn get(&self, url: &str) -> Result<Option<EnrichedItem>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {COLUMNS} FROM news_items WHERE url = ?1"),
                libsql::params![url],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_item(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn count(&self) -> Result<u64> {
        let mut rows = self.conn.query("SELECT COUNT(*) FROM news_items", ()).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?.max(0) as u64),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl ItemStore for LibsqlStore {
    async fn existing_urls(&self, urls: &[String]) -> Result<HashSet<String>> {
        let mut found = HashSet::new();
        for chunk in urls.chunks(IN_CLAUSE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let params: Vec<Value> = chunk.iter().map(|u| Value::Text(u.clone())).collect();
            let mut rows = self
                .conn
                .query(
                    &format!("SELECT url FROM news_items WHERE url IN ({placeholders})"),
                    params,
                )
                .await?;
            while let Some(row) = rows.next().await? {
                found.insert(row.get::<String>(0)?);
            }
        }
        Ok(found)
    }

    async fn upsert(&self, item: &EnrichedItem) -> Result<()> {
        let placeholders = (1..=N_COLUMNS)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let tags = serde_json::to_string(&item.suggested_tags)
            .map_err(|e| RadarError::Store(format!("encode suggested_tags: {e}")))?;
        let reasons = serde_json::to_string(&item.tag_reasons)
            .map_err(|e| RadarError::Store(format!("encode tag_reasons: {e}")))?;
        let params: Vec<Value> = vec![
            text(&item.url),
            text(&item.id),
            text(&item.source),
            text(&item.source_type),
            text(&item.author_org),
            text(&item.creator_name),
            text(item.source_kind.as_str()),
            Value::Real(item.source_weight),
            text(&item.title),
            text(&item.content_text),
            opt_text(item.published_at.map(fmt_ts)),
            Value::Text(fmt_ts(item.fetched_at)),
            opt_text(item.content_type_hint.clone()),
            text(item.lane_hint.as_str()),
            text(&item.lang),
            Value::Real(item.lang_confidence),
            text(&item.lang_method),
            opt_text(item.fulltext_method.clone()),
            text(&item.topic),
            Value::Real(item.relevance_score),
            text(item.content_type.as_str()),
            Value::Real(item.content_type_confidence),
            Value::Real(item.quality_score),
            text(&item.quality_flags),
            Value::Text(tags),
            Value::Real(item.source_trust_score),
            Value::Real(item.recency_score),
            Value::Real(item.actionability_score),
            Value::Real(item.source_mix_score),
            Value::Real(item.novelty_score),
            Value::Real(item.breakout_signal),
            Value::Real(item.priority_score),
            text(item.lane.as_str()),
            text(&item.status),
            Value::Text(reasons),
        ];
        self.conn
            .execute(
                &format!("INSERT OR REPLACE INTO news_items ({COLUMNS}) VALUES ({placeholders})"),
                params,
            )
            .await?;
        Ok(())
    }

    async fn recent_texts(&self, limit: usize) -> Result<Vec<String>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = self
            .conn
            .query(
                "SELECT content_text FROM news_items \
                 ORDER BY published_at DESC NULLS LAST, fetched_at DESC LIMIT ?1",
                libsql::params![limit],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row.get::<String>(0)?);
        }
        Ok(out)
    }
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn opt_text(s: Option<String>) -> Value {
    match s {
        Some(s) => Value::Text(s),
        None => Value::Null,
    }
}

/// Fixed-width UTC timestamps so that text ordering matches time ordering.
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn get_opt_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Text(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn get_real(row: &Row, idx: i32) -> Result<f64> {
    match row.get_value(idx)? {
        Value::Real(f) => Ok(f),
        Value::Integer(i) => Ok(i as f64),
        _ => Ok(0.0),
    }
}

fn row_to_item(row: &Row) -> Result<EnrichedItem> {
    let s = |i: i32| -> Result<String> { Ok(get_opt_text(row, i)?.unwrap_or_default()) };

    let fetched_raw = s(11)?;
    let fetched_at = parse_ts(&fetched_raw)
        .ok_or_else(|| RadarError::Store(format!("bad fetched_at: {fetched_raw}")))?;
    let suggested_tags: Vec<String> = serde_json::from_str(&s(24)?).unwrap_or_default();
    let tag_reasons: Vec<String> = serde_json::from_str(&s(34)?).unwrap_or_default();

    Ok(EnrichedItem {
        url: s(0)?,
        id: s(1)?,
        source: s(2)?,
        source_type: s(3)?,
        author_org: s(4)?,
        creator_name: s(5)?,
        source_kind: SourceKind::parse(&s(6)?),
        source_weight: get_real(row, 7)?,
        title: s(8)?,
        content_text: s(9)?,
        published_at: get_opt_text(row, 10)?.as_deref().and_then(parse_ts),
        fetched_at,
        content_type_hint: get_opt_text(row, 12)?,
        lane_hint: Lane::parse(&s(13)?),
        lang: s(14)?,
        lang_confidence: get_real(row, 15)?,
        lang_method: s(16)?,
        fulltext_method: get_opt_text(row, 17)?,
        topic: s(18)?,
        relevance_score: get_real(row, 19)?,
        content_type: ContentType::parse(&s(20)?).unwrap_or_default(),
        content_type_confidence: get_real(row, 21)?,
        quality_score: get_real(row, 22)?,
        quality_flags: s(23)?,
        suggested_tags,
        tag_reasons,
        source_trust_score: get_real(row, 25)?,
        recency_score: get_real(row, 26)?,
        actionability_score: get_real(row, 27)?,
        source_mix_score: get_real(row, 28)?,
        novelty_score: get_real(row, 29)?,
        breakout_signal: get_real(row, 30)?,
        priority_score: get_real(row, 31)?,
        lane: Lane::parse(&s(32)?),
        status: s(33)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::ingest::types::CandidateRecord;

    #[test]
    fn column_list_matches_count() {
        assert_eq!(COLUMNS.split(',').count(), N_COLUMNS);
    }

    #[tokio::test]
    async fn in_memory_roundtrip_keeps_optional_fields() {
        let store = LibsqlStore::open_in_memory().await.unwrap();
        let mut rec = CandidateRecord::new("lab", "https://lab.example/a", "Title", "Body");
        rec.fetched_at = Utc.with_ymd_and_hms(2026, 2, 1, 8, 30, 0).unwrap();
        let mut item = EnrichedItem::from_candidate(rec);
        item.suggested_tags = vec!["agents".into()];
        item.tag_reasons = vec!["match(2): agent, tool calling".into()];
        item.content_type = ContentType::Tool;
        item.lane = Lane::Scout;

        store.upsert(&item).await.unwrap();
        let back = store.get("https://lab.example/a").await.unwrap().unwrap();
        assert_eq!(back, item);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
