// src/config/taxonomy.rs
//! Topic, content-type and tag vocabulary (`taxonomy.toml`).
//!
//! `content_types` entries may be a plain keyword list or a table with a
//! `keywords` key:
//!
//! ```toml
//! [content_types]
//! tool = ["sdk", "cli"]
//! research = { keywords = ["paper", "benchmark"] }
//! ```
//!
//! When no recognized type is configured the built-in lists are used.

use std::collections::HashMap;

use serde::Deserialize;

use crate::analyze::classify::{TagRule, Taxonomy, Topic};
use crate::analyze::keywords::KeywordSet;
use crate::item::ContentType;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyConfig {
    #[serde(default)]
    pub topics: Vec<TopicConfig>,
    #[serde(default)]
    pub content_types: HashMap<String, KeywordList>,
    #[serde(default)]
    pub tag_rules: Vec<TagRuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicConfig {
    #[serde(default = "default_topic_name")]
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_topic_name() -> String {
    crate::analyze::classify::OTHER_TOPIC.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagRuleConfig {
    pub tag: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_min_hits")]
    pub min_hits: usize,
}

fn default_min_hits() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeywordList {
    Plain(Vec<String>),
    Table {
        #[serde(default)]
        keywords: Vec<String>,
    },
}

impl KeywordList {
    fn keywords(&self) -> &[String] {
        match self {
            KeywordList::Plain(k) => k,
            KeywordList::Table { keywords } => keywords,
        }
    }
}

fn builtin_keywords(ct: ContentType) -> &'static [&'static str] {
    match ct {
        ContentType::Tool => &[
            "framework", "sdk", "library", "package", "tool", "plugin", "api", "cli",
            "demo app", "assistant", "copilot", "workspace", "notebook", "ollama", "vllm",
            "langchain", "llama_index", "transformers", "strumento", "libreria", "pacchetto",
            "applicazione",
        ],
        ContentType::Research => &[
            "paper", "arxiv", "preprint", "state of the art", "sota", "benchmark", "dataset",
            "method", "evaluation", "ablation", "ricerca", "studio", "metodo", "valutazione",
        ],
        ContentType::Release => &[
            "release", "released", "launch", "launched", "announced", "announcement",
            "new model", "checkpoint", "weights", "model card", "version", "v1.", "v2.",
            "rilascio", "annuncio", "nuovo modello",
        ],
        ContentType::Industry => &[
            "case study", "customer story", "enterprise", "deployment", "pilot", "roi", "kpi",
            "cost saving", "time reduction", "operations", "manufacturing", "supply chain",
            "compliance", "contact center", "fraud", "caso studio", "caso d'uso", "adozione",
            "produzione", "industriale", "risparmio", "efficienza",
        ],
        ContentType::News => &[
            "news", "update", "trend", "event", "interview", "notizia", "aggiornamento",
            "tendenza", "intervista",
        ],
    }
}

impl TaxonomyConfig {
    /// Keyword sets per content type, indexed like `ContentType::ALL`.
    fn content_type_sets(&self) -> [KeywordSet; 5] {
        let mut configured: [Option<&[String]>; 5] = [None; 5];
        for (name, list) in &self.content_types {
            if let Some(ct) = ContentType::parse(name.trim()) {
                configured[ct.index()] = Some(list.keywords());
            }
        }
        let any = configured.iter().any(Option::is_some);

        ContentType::ALL.map(|ct| {
            if any {
                KeywordSet::new(configured[ct.index()].unwrap_or_default())
            } else {
                KeywordSet::new(builtin_keywords(ct))
            }
        })
    }

    pub fn compile(&self) -> Taxonomy {
        let topics = self
            .topics
            .iter()
            .map(|t| Topic {
                name: t.name.clone(),
                keywords: KeywordSet::new(&t.keywords),
            })
            .collect();

        let tag_rules = self
            .tag_rules
            .iter()
            .filter_map(|r| {
                let tag = r.tag.trim().to_lowercase();
                if tag.is_empty() {
                    return None;
                }
                Some(TagRule {
                    tag,
                    keywords: KeywordSet::new(&r.keywords),
                    min_hits: r.min_hits,
                })
            })
            .collect();

        Taxonomy {
            topics,
            content_types: self.content_type_sets(),
            tag_rules,
        }
    }
}
