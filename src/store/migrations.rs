// src/store/migrations.rs
//! Versioned schema for the libSQL store. Append new versions at the end.

use libsql::Connection;

use crate::error::{RadarError, Result};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "news_items",
        sql: r#"
            CREATE TABLE IF NOT EXISTS news_items (
                url TEXT PRIMARY KEY,
                id TEXT NOT NULL,
                source TEXT NOT NULL,
                source_type TEXT NOT NULL DEFAULT '',
                author_org TEXT NOT NULL DEFAULT '',
                creator_name TEXT NOT NULL DEFAULT '',
                source_kind TEXT NOT NULL DEFAULT 'institutional',
                source_weight REAL NOT NULL DEFAULT 1.0,
                title TEXT NOT NULL,
                content_text TEXT NOT NULL DEFAULT '',
                published_at TEXT,
                fetched_at TEXT NOT NULL,
                content_type_hint TEXT,
                lane_hint TEXT NOT NULL DEFAULT 'reliable',
                lang TEXT NOT NULL DEFAULT 'unknown',
                lang_confidence REAL NOT NULL DEFAULT 0,
                lang_method TEXT NOT NULL DEFAULT '',
                fulltext_method TEXT,
                topic TEXT NOT NULL DEFAULT 'Other',
                relevance_score REAL NOT NULL DEFAULT 0,
                content_type TEXT NOT NULL DEFAULT 'news',
                content_type_confidence REAL NOT NULL DEFAULT 0,
                quality_score REAL NOT NULL DEFAULT 0,
                quality_flags TEXT NOT NULL DEFAULT '',
                suggested_tags TEXT NOT NULL DEFAULT '[]',
                source_trust_score REAL NOT NULL DEFAULT 0,
                recency_score REAL NOT NULL DEFAULT 0,
                actionability_score REAL NOT NULL DEFAULT 0,
                source_mix_score REAL NOT NULL DEFAULT 0,
                novelty_score REAL NOT NULL DEFAULT 0,
                breakout_signal REAL NOT NULL DEFAULT 0,
                priority_score REAL NOT NULL DEFAULT 0,
                lane TEXT NOT NULL DEFAULT 'reliable',
                status TEXT NOT NULL DEFAULT 'new'
            );
            CREATE INDEX IF NOT EXISTS idx_news_items_recency
                ON news_items(published_at DESC, fetched_at DESC);
            CREATE INDEX IF NOT EXISTS idx_news_items_priority ON news_items(priority_score DESC);
        "#,
    },
    Migration {
        version: 2,
        name: "tag_reasons",
        sql: "ALTER TABLE news_items ADD COLUMN tag_reasons TEXT NOT NULL DEFAULT '[]';",
    },
];

pub async fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| RadarError::Store(format!("create _migrations: {e}")))?;

    let current = current_version(conn).await?;
    for m in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!(target: "radar", version = m.version, name = m.name, "applying migration");
        conn.execute_batch(m.sql).await.map_err(|e| {
            RadarError::Store(format!("migration V{} ({}) failed: {e}", m.version, m.name))
        })?;
        conn.execute(
            "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
            libsql::params![m.version, m.name],
        )
        .await
        .map_err(|e| RadarError::Store(format!("record migration V{}: {e}", m.version)))?;
    }
    Ok(())
}

async fn current_version(conn: &Connection) -> Result<i64> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get::<i64>(0)?),
        None => Ok(0),
    }
}
