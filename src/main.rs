//! AI news radar: batch entrypoint.
//! Loads the TOML configs, runs every collector once through the enrichment
//! pipeline and persists the survivors to the local libSQL database.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ai_news_radar::config::{DEFAULT_CONFIG_DIR, ENV_CONFIG_DIR};
use ai_news_radar::fulltext::HttpExtractor;
use ai_news_radar::ingest::providers::collectors_from_config;
use ai_news_radar::metrics::Metrics;
use ai_news_radar::{LibsqlStore, Pipeline, RadarConfig, RunStats};

const FEED_USER_AGENT: &str = concat!("ai-news-radar/", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding sources/trust/taxonomy/ranking .toml files
    #[arg(long, env = ENV_CONFIG_DIR, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// SQLite/libSQL database file
    #[arg(long, env = "RADAR_DB_PATH", default_value = "data/news.db")]
    db: PathBuf,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Print the Prometheus exposition after the run
    #[arg(long)]
    print_metrics: bool,

    /// Never fetch article pages, even for feeds that ask for it
    #[arg(long)]
    no_fulltext: bool,

    /// Feed request timeout in seconds
    #[arg(long, default_value_t = 20)]
    feed_timeout_s: u64,
}

/// Compact logs by default; `RADAR_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ai_news_radar=info,radar=info,warn"));
    let json = std::env::var("RADAR_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing();

    let metrics = match Metrics::install() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = ?e, "metrics recorder not installed");
            None
        }
    };

    let cfg = RadarConfig::load(&cli.config_dir)
        .with_context(|| format!("loading config from {}", cli.config_dir.display()))?;

    let client = reqwest::Client::builder()
        .user_agent(FEED_USER_AGENT)
        .timeout(Duration::from_secs(cli.feed_timeout_s.max(1)))
        .build()
        .context("building feed HTTP client")?;
    let collectors = collectors_from_config(&cfg.sources, &client);
    tracing::info!(collectors = collectors.len(), "collectors ready");

    let store = LibsqlStore::open(&cli.db)
        .await
        .with_context(|| format!("opening database {}", cli.db.display()))?;

    let mut pipeline = Pipeline::new(cfg);
    if !cli.no_fulltext {
        pipeline = pipeline.with_fulltext(Arc::new(HttpExtractor::new()?));
    }
    #[cfg(feature = "embeddings")]
    {
        match ai_news_radar::novelty::BertEncoder::shared() {
            Ok(encoder) => pipeline = pipeline.with_encoder(Arc::new(encoder)),
            Err(e) => tracing::warn!(error = ?e, "embedding model unavailable; using hashed features"),
        }
    }
    #[cfg(not(feature = "embeddings"))]
    tracing::warn!("built without `embeddings`; novelty uses hashed features");

    let stats = pipeline.run_once(&collectors, &store).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_summary(&stats);
    }
    if cli.print_metrics {
        if let Some(m) = &metrics {
            print!("{}", m.render());
        }
    }
    Ok(())
}

fn print_summary(stats: &RunStats) {
    println!(
        "fetched={} new={} stored={} fulltext={}",
        stats.fetched, stats.new_items, stats.stored, stats.fulltext_fetched
    );
    println!(
        "skipped: existing={} language={} trust={} type_confidence={} quality={}",
        stats.skipped_existing,
        stats.skipped_language,
        stats.skipped_trust,
        stats.skipped_type_confidence,
        stats.skipped_quality
    );
    for (lane, n) in &stats.lane_counts {
        println!("lane {lane}: {n}");
    }
    for (ct, n) in &stats.content_type_counts {
        println!("type {ct}: {n}");
    }
    for c in stats.collectors.iter().filter(|c| c.error.is_some()) {
        println!("collector {} failed: {}", c.name, c.error.as_deref().unwrap_or(""));
    }
}
