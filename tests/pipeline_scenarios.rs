// tests/pipeline_scenarios.rs
use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use ai_news_radar::config::taxonomy::TagRuleConfig;
use ai_news_radar::lang::{LanguageClassifier, LanguageModel};
use ai_news_radar::{
    CandidateRecord, Collector, ContentType, Lane, MemoryStore, Pipeline, RadarConfig, SourceKind,
};

struct FixedModel(&'static str);

impl LanguageModel for FixedModel {
    fn predict(&self, _text: &str) -> Option<(String, f64)> {
        Some((self.0.to_string(), 0.99))
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

fn config() -> RadarConfig {
    let mut cfg = RadarConfig::default();
    cfg.trust.org_trust = HashMap::from([
        ("acme ai".to_string(), 0.95),
        ("github".to_string(), 0.80),
    ]);
    cfg.trust.creator_trust = HashMap::from([("ada lovelace".to_string(), 0.90)]);
    cfg
}

fn pipeline(cfg: RadarConfig) -> Pipeline {
    Pipeline::new(cfg).with_language_classifier(LanguageClassifier::with_model(FixedModel("en")))
}

fn release_record() -> CandidateRecord {
    let mut rec = CandidateRecord::new(
        "acme_releases",
        "https://github.com/acme/orca/releases/tag/v2.0#changelog",
        "Acme releases the Orca 2 checkpoint",
        "The team released the Orca 2 checkpoint with open weights and a model card. \
         This version is the largest launch of the year.",
    );
    rec.source_type = "rss".into();
    rec.author_org = "Acme AI".into();
    rec.content_type_hint = Some("release".into());
    rec.published_at = Some(now() - Duration::days(1));
    rec
}

fn discovery_record() -> CandidateRecord {
    let mut rec = CandidateRecord::new(
        "github_discovery",
        "https://github.com/acme/copilot-browser",
        "Acme Copilot: an agentic browser assistant",
        "An agentic browser assistant for automation. Open source sdk and cli, \
         pip install acme-copilot, with a framework, a library and a plugin for your workspace.",
    );
    rec.source_type = "rss".into();
    rec.author_org = "GitHub".into();
    rec.published_at = Some(now() - Duration::days(1));
    rec
}

#[tokio::test]
async fn curated_release_is_stored_reliable() {
    let store = MemoryStore::new();
    let stats = pipeline(config())
        .enrich_and_store(vec![release_record()], &store, now())
        .await
        .unwrap();

    assert_eq!(stats.fetched, 1);
    assert_eq!(stats.stored, 1);
    assert_eq!(stats.lane_count(Lane::Reliable), 1);

    let item = store
        .get("https://github.com/acme/orca/releases/tag/v2.0")
        .expect("stored under canonical url");
    assert_eq!(item.content_type, ContentType::Release);
    assert_eq!(item.lane, Lane::Reliable);
    assert_eq!(item.lang, "en");
    assert!(item.actionability_score >= 0.40);
    assert!((item.recency_score - (-(std::f64::consts::LN_2) / 7.0).exp()).abs() < 1e-6);
    assert!((item.novelty_score - 0.90).abs() < 1e-9);
    assert!((item.source_trust_score - 0.95).abs() < 1e-9);
    assert!(item.priority_score > 0.40);
    assert_eq!(item.status, "new");
    assert_eq!(item.id.len(), 32);
}

#[tokio::test]
async fn rerun_skips_everything_already_stored() {
    let store = MemoryStore::new();
    let p = pipeline(config());
    let batch = vec![release_record(), discovery_record()];

    let first = p.enrich_and_store(batch.clone(), &store, now()).await.unwrap();
    assert_eq!(first.stored, 2);

    let second = p.enrich_and_store(batch, &store, now()).await.unwrap();
    assert_eq!(second.fetched, 2);
    assert_eq!(second.skipped_existing, 2);
    assert_eq!(second.new_items, 0);
    assert_eq!(second.stored, 0);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn discovery_breakout_promotes_to_scout() {
    let store = MemoryStore::new();
    let stats = pipeline(config())
        .enrich_and_store(vec![discovery_record()], &store, now())
        .await
        .unwrap();
    assert_eq!(stats.stored, 1);

    let item = store.get("https://github.com/acme/copilot-browser").unwrap();
    assert_eq!(item.lane_hint, Lane::Reliable);
    assert!(item.breakout_signal >= 0.68);
    assert_eq!(item.lane, Lane::Scout);
    assert_eq!(item.content_type, ContentType::Tool);
    // trust 0.80 earns the scout boost on top of the base priority
    assert!(item.priority_score > 0.0 && item.priority_score <= 1.0);
}

#[tokio::test]
async fn scout_hint_is_never_demoted() {
    let store = MemoryStore::new();
    let mut rec = release_record();
    rec.lane_hint = Lane::Scout;
    pipeline(config())
        .enrich_and_store(vec![rec], &store, now())
        .await
        .unwrap();
    let item = store.items().pop().unwrap();
    assert_eq!(item.lane, Lane::Scout);
}

#[tokio::test]
async fn strict_whitelist_drops_unknown_creator() {
    let mut cfg = config();
    cfg.trust.strict_creator_whitelist = Some(true);

    let mut known = release_record();
    known.url = "https://ada.example/posts/orca".into();
    known.source = "ada_blog".into();
    known.source_kind = SourceKind::Creator;
    known.creator_name = "Ada Lovelace".into();

    let mut unknown = known.clone();
    unknown.url = "https://nobody.example/posts/orca".into();
    unknown.source = "nobody_blog".into();
    unknown.creator_name = "Nobody In Particular".into();

    let store = MemoryStore::new();
    let stats = pipeline(cfg)
        .enrich_and_store(vec![known, unknown], &store, now())
        .await
        .unwrap();

    assert_eq!(stats.skipped_trust, 1);
    assert_eq!(stats.stored, 1);
    assert!(store.get("https://ada.example/posts/orca").is_some());
    assert!(store.get("https://nobody.example/posts/orca").is_none());
}

#[tokio::test]
async fn disallowed_language_is_dropped() {
    let store = MemoryStore::new();
    let p = Pipeline::new(config())
        .with_language_classifier(LanguageClassifier::with_model(FixedModel("de")));
    let stats = p
        .enrich_and_store(vec![release_record()], &store, now())
        .await
        .unwrap();
    assert_eq!(stats.skipped_language, 1);
    assert_eq!(stats.stored, 0);
    assert!(store.is_empty());
}

fn weak_news_record() -> CandidateRecord {
    let mut rec = CandidateRecord::new(
        "misc_blog",
        "https://misc.example/post",
        "Thoughts",
        "Some words about the weather.",
    );
    rec.author_org = "Acme AI".into();
    rec
}

#[tokio::test]
async fn weak_news_is_dropped_by_type_gate() {
    let store = MemoryStore::new();
    let stats = pipeline(config())
        .enrich_and_store(vec![weak_news_record()], &store, now())
        .await
        .unwrap();
    assert_eq!(stats.stored, 0);
    assert_eq!(stats.skipped_type_confidence, 1);
    assert_eq!(stats.skipped_quality, 0);
}

#[tokio::test]
async fn type_gate_only_applies_to_news() {
    let mut cfg = config();
    cfg.ranking.min_quality_core = 0.0;

    // one keyword for every type: argmax is Tool at confidence 0.2
    let mut spread = CandidateRecord::new(
        "misc_blog",
        "https://misc.example/roundup",
        "Interview: framework and dataset notes",
        "An enterprise team talks about the next version of their framework and dataset.",
    );
    spread.author_org = "Acme AI".into();

    let store = MemoryStore::new();
    let stats = pipeline(cfg.clone())
        .enrich_and_store(vec![weak_news_record(), spread], &store, now())
        .await
        .unwrap();

    assert_eq!(stats.skipped_type_confidence, 1);
    assert_eq!(stats.stored, 1);
    let item = store.get("https://misc.example/roundup").unwrap();
    assert_eq!(item.content_type, ContentType::Tool);
    assert!(item.content_type_confidence < cfg.ranking.min_type_confidence_core);
}

#[tokio::test]
async fn scout_lane_accepts_lower_trust() {
    let mut reliable = release_record();
    reliable.author_org = "Unlisted Lab".into();
    let mut scout = reliable.clone();
    scout.url = "https://github.com/acme/orca/releases/tag/v2.1".into();
    scout.lane_hint = Lane::Scout;

    let store = MemoryStore::new();
    let stats = pipeline(config())
        .enrich_and_store(vec![reliable, scout], &store, now())
        .await
        .unwrap();

    assert_eq!(stats.skipped_trust, 1);
    assert_eq!(stats.stored, 1);
    let item = store
        .get("https://github.com/acme/orca/releases/tag/v2.1")
        .expect("scout item stored");
    assert_eq!(item.lane, Lane::Scout);
    assert!((item.source_trust_score - 0.55).abs() < 1e-9);
    assert!(store.get("https://github.com/acme/orca/releases/tag/v2.0").is_none());
}

#[tokio::test]
async fn creator_minimum_applies_on_scout_lane() {
    let mut unknown = release_record();
    unknown.url = "https://writer.example/posts/orca".into();
    unknown.source = "writer_blog".into();
    unknown.source_kind = SourceKind::Creator;
    unknown.creator_name = "Unknown Writer".into();
    unknown.lane_hint = Lane::Scout;

    let mut ada = unknown.clone();
    ada.url = "https://ada.example/posts/orca".into();
    ada.source = "ada_blog".into();
    ada.creator_name = "Ada Lovelace".into();

    let store = MemoryStore::new();
    let stats = pipeline(config())
        .enrich_and_store(vec![unknown, ada], &store, now())
        .await
        .unwrap();

    // 0.70 clears the scout org floor but not the creator floor
    assert_eq!(stats.skipped_trust, 1);
    assert_eq!(stats.stored, 1);
    assert!(store.get("https://writer.example/posts/orca").is_none());
    assert!(store.get("https://ada.example/posts/orca").is_some());
}

#[tokio::test]
async fn quality_floor_is_higher_on_scout_lane() {
    // hint-only research item: quality lands between the two floors
    let mut reliable = CandidateRecord::new(
        "lab_notes",
        "https://lab.example/notes/1",
        "Notes on sparse attention",
        "Sparse attention lowers memory use for long inputs in our internal experiments.",
    );
    reliable.author_org = "Acme AI".into();
    reliable.content_type_hint = Some("research".into());
    let mut scout = reliable.clone();
    scout.url = "https://lab.example/notes/2".into();
    scout.lane_hint = Lane::Scout;

    let cfg = config();
    let store = MemoryStore::new();
    let stats = pipeline(cfg.clone())
        .enrich_and_store(vec![reliable, scout], &store, now())
        .await
        .unwrap();

    assert_eq!(stats.skipped_quality, 1);
    assert_eq!(stats.stored, 1);
    let item = store.get("https://lab.example/notes/1").expect("reliable item stored");
    assert_eq!(item.lane, Lane::Reliable);
    assert_eq!(item.content_type, ContentType::Research);
    assert!(item.quality_score >= cfg.ranking.min_quality_core);
    assert!(item.quality_score < cfg.ranking.min_quality_scout);
    assert!(store.get("https://lab.example/notes/2").is_none());
}

#[tokio::test]
async fn default_detector_drops_unlisted_languages() {
    let mut rec = release_record();
    rec.title = "Команда выпустила новую версию модели".into();
    rec.content_text = "Подробности об обучении и оценке опубликованы в техническом отчёте, \
        а исходный код доступен на github вместе с checkpoint release."
        .into();

    let store = MemoryStore::new();
    let stats = Pipeline::new(config())
        .enrich_and_store(vec![rec], &store, now())
        .await
        .unwrap();
    assert_eq!(stats.skipped_language, 1);
    assert_eq!(stats.stored, 0);
}

#[tokio::test]
async fn tag_reasons_are_stored_with_tags() {
    let mut cfg = config();
    cfg.taxonomy.tag_rules = vec![TagRuleConfig {
        tag: "open-weights".into(),
        keywords: vec!["open weights".into(), "model card".into()],
        min_hits: 1,
    }];

    let store = MemoryStore::new();
    pipeline(cfg)
        .enrich_and_store(vec![release_record()], &store, now())
        .await
        .unwrap();

    let item = store.items().pop().unwrap();
    assert_eq!(item.suggested_tags, vec!["open-weights"]);
    assert_eq!(item.tag_reasons, vec!["match(2): open weights, model card"]);
}

#[tokio::test]
async fn same_url_in_one_batch_keeps_last_upsert() {
    let mut a = release_record();
    a.fetched_at = now() - Duration::minutes(5);
    let mut b = release_record();
    b.title = "Acme releases the Orca 2 checkpoint (updated)".into();
    b.fetched_at = now();

    let store = MemoryStore::new();
    pipeline(config())
        .enrich_and_store(vec![a, b], &store, now())
        .await
        .unwrap();

    assert_eq!(store.len(), 1);
    let item = store.items().pop().unwrap();
    assert!(item.title.ends_with("(updated)"));
    assert_eq!(item.fetched_at, now());
}

#[tokio::test]
async fn repeated_text_is_not_novel() {
    let store = MemoryStore::new();
    let p = pipeline(config());
    p.enrich_and_store(vec![release_record()], &store, now())
        .await
        .unwrap();

    let mut mirror = release_record();
    mirror.url = "https://mirror.example/orca-2".into();
    p.enrich_and_store(vec![mirror], &store, now()).await.unwrap();

    let item = store.get("https://mirror.example/orca-2").unwrap();
    assert!(item.novelty_score < 0.30, "novelty was {}", item.novelty_score);
}

#[tokio::test]
async fn scores_stay_in_unit_interval() {
    let store = MemoryStore::new();
    let mut batch = vec![release_record(), discovery_record()];
    let mut undated = release_record();
    undated.url = "https://acme.example/undated".into();
    undated.published_at = None;
    batch.push(undated);

    pipeline(config())
        .enrich_and_store(batch, &store, now())
        .await
        .unwrap();

    for item in store.items() {
        for v in [
            item.relevance_score,
            item.content_type_confidence,
            item.quality_score,
            item.source_trust_score,
            item.recency_score,
            item.actionability_score,
            item.source_mix_score,
            item.novelty_score,
            item.breakout_signal,
            item.priority_score,
        ] {
            assert!((0.0..=1.0).contains(&v), "{} out of range: {v}", item.url);
        }
    }
    let undated = store.get("https://acme.example/undated").unwrap();
    assert!((undated.recency_score - 0.4).abs() < 1e-9);
}

#[tokio::test]
async fn per_source_cap_limits_new_items() {
    let mut cfg = config();
    cfg.ranking.max_items_per_source_per_run = 2;
    let batch: Vec<CandidateRecord> = (0..5)
        .map(|i| {
            let mut r = release_record();
            r.url = format!("https://acme.example/p/{i}");
            r
        })
        .collect();

    let store = MemoryStore::new();
    let stats = pipeline(cfg)
        .enrich_and_store(batch, &store, now())
        .await
        .unwrap();
    assert_eq!(stats.new_items, 2);
    assert_eq!(store.len(), 2);
}

struct Broken;

#[async_trait]
impl Collector for Broken {
    async fn collect(&self) -> Result<Vec<CandidateRecord>> {
        anyhow::bail!("feed unreachable")
    }
    fn name(&self) -> &str {
        "broken"
    }
}

struct Fixed(Vec<CandidateRecord>);

#[async_trait]
impl Collector for Fixed {
    async fn collect(&self) -> Result<Vec<CandidateRecord>> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &str {
        "fixed"
    }
}

#[tokio::test]
async fn failing_collector_does_not_abort_run() {
    let collectors: Vec<Box<dyn Collector>> =
        vec![Box::new(Broken), Box::new(Fixed(vec![release_record()]))];
    let store = MemoryStore::new();
    let stats = pipeline(config())
        .run_once_at(now(), &collectors, &store)
        .await
        .unwrap();

    assert_eq!(stats.stored, 1);
    assert_eq!(stats.collector_errors(), 1);
    assert_eq!(stats.collectors[0].name, "broken");
    assert_eq!(stats.collectors[1].items, 1);
}

#[tokio::test]
async fn empty_batch_reports_zeroes() {
    let store = MemoryStore::new();
    let stats = pipeline(config())
        .enrich_and_store(Vec::new(), &store, now())
        .await
        .unwrap();
    assert_eq!(stats, Default::default());
}
