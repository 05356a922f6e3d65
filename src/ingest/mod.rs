// src/ingest/mod.rs
//! Batch enrichment pipeline.
//!
//! Stages run strictly in order over the whole batch:
//! collect → normalize → dedup → per-source cap → language → full text →
//! classify + trust gate → type-confidence gate → source mix → novelty,
//! breakout, lane and priority → quality gate → persist.
//!
//! Every stage that empties the batch ends the run early with the counters
//! gathered so far. Collector and full-text failures are absorbed; only
//! store errors propagate.

pub mod providers;
pub mod stats;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::analyze::autotag::{suggest_tags, DEFAULT_MAX_TAGS};
use crate::analyze::classify::{classify_item, ClassifyInput, Taxonomy};
use crate::analyze::scoring::{base_priority, final_priority, ScoreInputs};
use crate::analyze::signals::{
    actionability_score, breakout_signal, creator_ratio_penalty, recency_score, source_mix_score,
    SourceShares,
};
use crate::config::RadarConfig;
use crate::error::Result;
use crate::fulltext::FullTextFetcher;
use crate::item::{anon_hash, source_key, ContentType, EnrichedItem, Lane, SourceKind, DEFAULT_STATUS};
use crate::lang::{self, LanguageClassifier};
use crate::normalize::{canonicalize_url, clean_text};
use crate::novelty::{novelty_score, HashingEncoder, TextEncoder, EMPTY_HISTORY_NOVELTY};
use crate::store::ItemStore;

pub use stats::{CollectorOutcome, RunStats};
pub use types::{CandidateRecord, Collector, FullTextPolicy};

/// Extracted text must beat the feed summary by this many chars.
const FULLTEXT_MIN_GAIN: usize = 300;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("radar_records_fetched_total", "Raw records returned by collectors.");
        describe_counter!("radar_items_stored_total", "Items persisted after every gate.");
        describe_counter!(
            "radar_items_skipped_total",
            "Items dropped, labelled by the stage that dropped them."
        );
        describe_counter!("radar_collector_errors_total", "Collector fetch/parse errors.");
        describe_counter!(
            "radar_fulltext_fetched_total",
            "Feed summaries replaced by extracted article text."
        );
        describe_histogram!("radar_run_ms", "Pipeline run time in milliseconds.");
        describe_histogram!("radar_feed_parse_ms", "Feed XML parse time in milliseconds.");
        describe_gauge!("radar_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

fn record_metrics(stats: &RunStats, elapsed_ms: f64, now: DateTime<Utc>) {
    counter!("radar_records_fetched_total").increment(stats.fetched as u64);
    counter!("radar_items_stored_total").increment(stats.stored as u64);
    for (reason, n) in [
        ("existing", stats.skipped_existing),
        ("language", stats.skipped_language),
        ("trust", stats.skipped_trust),
        ("type_confidence", stats.skipped_type_confidence),
        ("quality", stats.skipped_quality),
    ] {
        counter!("radar_items_skipped_total", "reason" => reason).increment(n as u64);
    }
    counter!("radar_fulltext_fetched_total").increment(stats.fulltext_fetched as u64);
    histogram!("radar_run_ms").record(elapsed_ms);
    gauge!("radar_last_run_ts").set(now.timestamp().max(0) as f64);
}

/// Run every collector in turn. A failing collector contributes nothing and
/// is reported in its outcome; the others still run.
pub async fn collect_all(
    collectors: &[Box<dyn Collector>],
) -> (Vec<CandidateRecord>, Vec<CollectorOutcome>) {
    let mut raw = Vec::new();
    let mut outcomes = Vec::with_capacity(collectors.len());
    for c in collectors {
        match c.collect().await {
            Ok(mut batch) => {
                tracing::debug!(target: "radar", collector = c.name(), items = batch.len(), "collected");
                outcomes.push(CollectorOutcome {
                    name: c.name().to_string(),
                    items: batch.len(),
                    error: None,
                });
                raw.append(&mut batch);
            }
            Err(e) => {
                tracing::warn!(target: "radar", error = ?e, collector = c.name(), "collector error");
                counter!("radar_collector_errors_total").increment(1);
                outcomes.push(CollectorOutcome {
                    name: c.name().to_string(),
                    items: 0,
                    error: Some(format!("{e:#}")),
                });
            }
        }
    }
    (raw, outcomes)
}

/// Canonicalize URLs and clean text fields; drop records left without a
/// URL or a title.
pub fn normalize_batch(raw: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    raw.into_iter()
        .filter_map(|mut rec| {
            rec.url = canonicalize_url(&rec.url);
            rec.title = clean_text(&rec.title);
            rec.content_text = clean_text(&rec.content_text);
            if rec.url.is_empty() || rec.title.is_empty() {
                return None;
            }
            Some(rec)
        })
        .collect()
}

/// Keep at most `max` records per source, in arrival order.
pub fn cap_per_source(items: Vec<CandidateRecord>, max: usize) -> Vec<CandidateRecord> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    items
        .into_iter()
        .filter(|rec| {
            let n = seen.entry(source_key(&rec.source)).or_insert(0);
            if *n >= max {
                false
            } else {
                *n += 1;
                true
            }
        })
        .collect()
}

/// Enrichment and ranking over a configuration snapshot. Holds the compiled
/// taxonomy and the collaborators, so build it once per run.
pub struct Pipeline {
    cfg: RadarConfig,
    taxonomy: Taxonomy,
    lang: LanguageClassifier,
    encoder: Arc<dyn TextEncoder>,
    fulltext: Option<Arc<dyn FullTextFetcher>>,
}

impl Pipeline {
    /// Lingua language detection, hashing encoder, no full-text fetching.
    /// Use [`Pipeline::with_encoder`] to plug in the sentence model.
    pub fn new(cfg: RadarConfig) -> Self {
        let taxonomy = cfg.taxonomy.compile();
        Self {
            cfg,
            taxonomy,
            lang: LanguageClassifier::default(),
            encoder: Arc::new(HashingEncoder::default()),
            fulltext: None,
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn TextEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_fulltext(mut self, fetcher: Arc<dyn FullTextFetcher>) -> Self {
        self.fulltext = Some(fetcher);
        self
    }

    pub fn with_language_classifier(mut self, classifier: LanguageClassifier) -> Self {
        self.lang = classifier;
        self
    }

    pub fn config(&self) -> &RadarConfig {
        &self.cfg
    }

    pub async fn run_once(
        &self,
        collectors: &[Box<dyn Collector>],
        store: &dyn ItemStore,
    ) -> Result<RunStats> {
        self.run_once_at(Utc::now(), collectors, store).await
    }

    /// One full run with an explicit clock (recency is computed against `now`).
    pub async fn run_once_at(
        &self,
        now: DateTime<Utc>,
        collectors: &[Box<dyn Collector>],
        store: &dyn ItemStore,
    ) -> Result<RunStats> {
        let (raw, outcomes) = collect_all(collectors).await;
        let mut stats = self.enrich_and_store(raw, store, now).await?;
        stats.collectors = outcomes;
        Ok(stats)
    }

    /// Every stage after collection.
    pub async fn enrich_and_store(
        &self,
        raw: Vec<CandidateRecord>,
        store: &dyn ItemStore,
        now: DateTime<Utc>,
    ) -> Result<RunStats> {
        ensure_metrics_described();
        let started = Instant::now();

        let mut stats = RunStats {
            fetched: raw.len(),
            ..Default::default()
        };
        self.process(raw, store, now, &mut stats).await?;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        record_metrics(&stats, elapsed_ms, now);
        tracing::info!(
            target: "radar",
            fetched = stats.fetched,
            new_items = stats.new_items,
            skipped_existing = stats.skipped_existing,
            skipped_language = stats.skipped_language,
            skipped_trust = stats.skipped_trust,
            skipped_type_confidence = stats.skipped_type_confidence,
            skipped_quality = stats.skipped_quality,
            stored = stats.stored,
            elapsed_ms = elapsed_ms as u64,
            "run complete"
        );
        Ok(stats)
    }

    async fn process(
        &self,
        raw: Vec<CandidateRecord>,
        store: &dyn ItemStore,
        now: DateTime<Utc>,
        stats: &mut RunStats,
    ) -> Result<()> {
        let ranking = &self.cfg.ranking;

        let cleaned = normalize_batch(raw);
        if cleaned.is_empty() {
            return Ok(());
        }

        let urls: Vec<String> = cleaned.iter().map(|r| r.url.clone()).collect();
        let existing = store.existing_urls(&urls).await?;
        let total = cleaned.len();
        let deduped: Vec<CandidateRecord> = cleaned
            .into_iter()
            .filter(|r| !existing.contains(&r.url))
            .collect();
        stats.skipped_existing = total - deduped.len();
        if deduped.is_empty() {
            return Ok(());
        }

        let capped = cap_per_source(deduped, ranking.max_items_per_source_per_run);
        stats.new_items = capped.len();

        let mut prepped = self.language_stage(capped, stats);
        if prepped.is_empty() {
            return Ok(());
        }

        self.fulltext_stage(&mut prepped, stats).await;

        let mut enriched = self.classify_stage(prepped, now, stats);
        if enriched.is_empty() {
            return Ok(());
        }

        let shares = SourceShares::from_items(
            enriched.iter().map(|i| (i.source.as_str(), i.source_kind)),
        );
        let creator_penalty = creator_ratio_penalty(shares.creator_share(), ranking.creator_target_ratio);
        for item in enriched.iter_mut() {
            item.source_mix_score = source_mix_score(
                shares.share(&item.source),
                item.source_kind,
                item.source_weight,
                item.source_trust_score,
                creator_penalty,
            );
        }

        let novelty = self.novelty_stage(&enriched, store).await?;

        for (item, novelty) in enriched.into_iter().zip(novelty) {
            self.rank_and_store(item, novelty, store, stats).await?;
        }
        Ok(())
    }

    fn language_stage(
        &self,
        records: Vec<CandidateRecord>,
        stats: &mut RunStats,
    ) -> Vec<(EnrichedItem, FullTextPolicy)> {
        let policy = &self.cfg.sources.language_policy;
        let mut out = Vec::with_capacity(records.len());
        for mut rec in records {
            let blob = format!("{} {}", rec.title, rec.content_text);
            let det = self.lang.detect(&blob, &policy.allowed, policy.min_confidence);

            let mut code = det.lang;
            if det.confidence < policy.min_confidence && code != lang::UNKNOWN && code != lang::OTHER {
                code = lang::UNKNOWN.to_string();
            }
            if policy.drop_disallowed && code == lang::OTHER {
                stats.skipped_language += 1;
                tracing::debug!(target: "radar", item = %anon_hash(&rec.url), "dropped: language");
                continue;
            }

            let fulltext = std::mem::take(&mut rec.fulltext);
            let mut item = EnrichedItem::from_candidate(rec);
            item.lang = code;
            item.lang_confidence = det.confidence;
            item.lang_method = det.method;
            out.push((item, fulltext));
        }
        out
    }

    async fn fulltext_stage(&self, batch: &mut [(EnrichedItem, FullTextPolicy)], stats: &mut RunStats) {
        let Some(fetcher) = &self.fulltext else {
            return;
        };
        let cap = self.cfg.ranking.fulltext_max_fetch_per_run;
        for (item, policy) in batch.iter_mut() {
            if stats.fulltext_fetched >= cap {
                break;
            }
            if item.source_type != "rss" || !policy.fetch {
                continue;
            }
            let extraction = fetcher.extract(&item.url, policy).await;
            let gain_floor = item.content_text.chars().count() + FULLTEXT_MIN_GAIN;
            if !extraction.text.is_empty() && extraction.text.chars().count() > gain_floor {
                item.content_text = clean_text(&format!("{}. {}", item.title, extraction.text));
                item.fulltext_method = Some(extraction.method);
                stats.fulltext_fetched += 1;
            } else {
                tracing::debug!(
                    target: "radar",
                    item = %anon_hash(&item.url),
                    method = %extraction.method,
                    "full text not used"
                );
            }
        }
    }

    fn classify_stage(
        &self,
        batch: Vec<(EnrichedItem, FullTextPolicy)>,
        now: DateTime<Utc>,
        stats: &mut RunStats,
    ) -> Vec<EnrichedItem> {
        let ranking = &self.cfg.ranking;
        let mut out = Vec::with_capacity(batch.len());

        for (mut item, _) in batch {
            let blob = item.text_blob();
            let c = classify_item(
                &ClassifyInput {
                    text: &blob,
                    source: &item.source,
                    source_type: &item.source_type,
                    url: &item.url,
                    content_type_hint: item.content_type_hint.as_deref(),
                    lang: &item.lang,
                },
                &self.taxonomy,
            );
            item.topic = c.topic;
            item.relevance_score = c.relevance_score;
            item.content_type = c.content_type;
            item.content_type_confidence = c.content_type_confidence;
            item.quality_score = c.quality_score;
            item.quality_flags = c.quality_flags;
            let (tags, reasons): (Vec<String>, Vec<String>) =
                suggest_tags(&blob, &self.taxonomy.tag_rules, DEFAULT_MAX_TAGS)
                    .into_iter()
                    .map(|t| (t.tag, t.reason))
                    .unzip();
            item.suggested_tags = tags;
            item.tag_reasons = reasons;

            item.actionability_score = actionability_score(&item.content_text, &item.url);
            item.source_trust_score =
                self.cfg
                    .trust
                    .source_trust(&item.author_org, &item.creator_name, item.source_kind);
            item.recency_score =
                recency_score(item.published_at, now, ranking.recency_half_life_days);

            let scout = item.lane_hint == Lane::Scout;
            let mut trust_min = if scout {
                ranking.min_trust_scout
            } else {
                ranking.min_trust_core
            };
            if item.source_kind == SourceKind::Creator {
                trust_min = trust_min.max(ranking.min_creator_trust);
            }
            if item.source_trust_score < trust_min {
                stats.skipped_trust += 1;
                tracing::debug!(
                    target: "radar",
                    item = %anon_hash(&item.url),
                    trust = item.source_trust_score,
                    "dropped: trust"
                );
                continue;
            }

            // Only a weak "news" classification is noise; other types survive.
            let type_min = if scout {
                ranking.min_type_confidence_scout
            } else {
                ranking.min_type_confidence_core
            };
            if item.content_type == ContentType::News && item.content_type_confidence < type_min {
                stats.skipped_type_confidence += 1;
                tracing::debug!(target: "radar", item = %anon_hash(&item.url), "dropped: type confidence");
                continue;
            }

            out.push(item);
        }
        out
    }

    /// Novelty per item. Encoder failures fall back to the empty-history
    /// value; store failures propagate.
    async fn novelty_stage(&self, items: &[EnrichedItem], store: &dyn ItemStore) -> Result<Vec<f64>> {
        let limit = self.cfg.ranking.novelty_compare_last_n;
        let recent: Vec<String> = store
            .recent_texts(limit)
            .await?
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect();

        let history = if recent.is_empty() {
            Vec::new()
        } else {
            match self.encoder.encode(&recent).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(target: "radar", error = ?e, encoder = self.encoder.name(), "history encoding failed");
                    Vec::new()
                }
            }
        };

        let texts: Vec<String> = items.iter().map(EnrichedItem::embedding_text).collect();
        let vectors = match self.encoder.encode(&texts).await {
            Ok(rows) if rows.len() == texts.len() => rows,
            Ok(rows) => {
                tracing::warn!(
                    target: "radar",
                    expected = texts.len(),
                    got = rows.len(),
                    "encoder returned wrong row count"
                );
                return Ok(vec![EMPTY_HISTORY_NOVELTY; items.len()]);
            }
            Err(e) => {
                tracing::warn!(target: "radar", error = ?e, encoder = self.encoder.name(), "batch encoding failed");
                return Ok(vec![EMPTY_HISTORY_NOVELTY; items.len()]);
            }
        };

        Ok(vectors.iter().map(|v| novelty_score(v, &history)).collect())
    }

    async fn rank_and_store(
        &self,
        mut item: EnrichedItem,
        novelty: f64,
        store: &dyn ItemStore,
        stats: &mut RunStats,
    ) -> Result<()> {
        let ranking = &self.cfg.ranking;
        item.novelty_score = novelty;

        let inputs = ScoreInputs::new(
            item.source_trust_score,
            item.novelty_score,
            item.relevance_score,
            item.actionability_score,
            item.recency_score,
            item.source_mix_score,
        );
        let base = base_priority(&inputs, &ranking.weights);

        let breakout = breakout_signal(
            &item.text_blob(),
            &item.source,
            &ranking.discovery_sources,
            item.novelty_score,
            item.recency_score,
            item.actionability_score,
        );
        let lane = item
            .lane_hint
            .escalate(breakout >= ranking.breakout_promote_threshold);
        item.lane = lane;
        item.breakout_signal = breakout;
        item.priority_score =
            final_priority(base, lane, item.source_trust_score, breakout, item.novelty_score);

        let quality_min = match lane {
            Lane::Scout => ranking.min_quality_scout,
            Lane::Reliable => ranking.min_quality_core,
        };
        if item.quality_score < quality_min {
            stats.skipped_quality += 1;
            tracing::debug!(
                target: "radar",
                item = %anon_hash(&item.url),
                quality = item.quality_score,
                lane = lane.as_str(),
                "dropped: quality"
            );
            return Ok(());
        }

        item.status = DEFAULT_STATUS.to_string();
        store.upsert(&item).await?;
        stats.record_stored(lane, item.content_type);
        tracing::debug!(
            target: "radar",
            item = %anon_hash(&item.url),
            lane = lane.as_str(),
            content_type = item.content_type.as_str(),
            priority = item.priority_score,
            "stored"
        );
        Ok(())
    }
}
