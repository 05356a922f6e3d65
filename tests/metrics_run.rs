// tests/metrics_run.rs
use ai_news_radar::config::SourcesConfig;
use ai_news_radar::ingest::providers::RssCollector;
use ai_news_radar::metrics::Metrics;
use ai_news_radar::{Collector, MemoryStore, Pipeline, RadarConfig};

const LAB_XML: &str = include_str!("fixtures/lab_blog.xml");

#[tokio::test]
async fn run_series_are_rendered() {
    // Only one recorder per process: keep this the single test in the file.
    let metrics = Metrics::install().expect("recorder");

    let sources: SourcesConfig = toml::from_str(
        r#"
        [[rss.feeds]]
        name = "acme_blog"
        url = "https://blog.acme.example/rss"
        "#,
    )
    .unwrap();
    let spec = sources.feed_specs().remove(0);
    let collectors: Vec<Box<dyn Collector>> =
        vec![Box::new(RssCollector::from_fixture(spec, LAB_XML))];

    let store = MemoryStore::new();
    let stats = Pipeline::new(RadarConfig::default())
        .run_once(&collectors, &store)
        .await
        .unwrap();
    assert_eq!(stats.fetched, 3);

    let out = metrics.render();
    for series in [
        "radar_build_info",
        "radar_records_fetched_total",
        "radar_items_stored_total",
        "radar_items_skipped_total",
        "radar_feed_parse_ms",
        "radar_run_ms",
        "radar_last_run_ts",
    ] {
        assert!(out.contains(series), "missing {series}");
    }
}
