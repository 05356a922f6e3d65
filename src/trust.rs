//! # Source Trust
//!
//! Maps an item's organization or creator to a trust score in `[0.0, 1.0]`.
//!
//! - Loaded from `trust.toml` (tables + aliases), optionally merged with an
//!   editorial whitelist.
//! - Case-insensitive lookup; whitespace is collapsed before matching.
//! - Lookup order: alias → exact match → well-known platform → default.
//! - Creators can be gated by a strict whitelist: unknown creators get the
//!   block trust, which no lane threshold accepts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::item::SourceKind;

/// Platforms trusted moderately even without an explicit table entry.
const KNOWN_PLATFORMS: &[&str] = &["arxiv", "github", "huggingface"];
const KNOWN_PLATFORM_TRUST: f64 = 0.75;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Institutional fallback.
    #[serde(default = "default_trust")]
    pub default_trust: f64,
    /// Creator fallback when the whitelist is not strict.
    #[serde(default = "default_creator_trust")]
    pub creator_default_trust: f64,
    /// Trust assigned to unknown creators under a strict whitelist.
    #[serde(default = "default_creator_block_trust")]
    pub creator_block_trust: f64,
    /// `None` means "not set"; an editorial whitelist then turns it on.
    #[serde(default)]
    pub strict_creator_whitelist: Option<bool>,
    #[serde(default)]
    pub org_trust: HashMap<String, f64>,
    #[serde(default)]
    pub creator_trust: HashMap<String, f64>,
    #[serde(default, alias = "org_aliases")]
    pub org_alias: HashMap<String, String>,
    #[serde(default, alias = "creator_aliases")]
    pub creator_alias: HashMap<String, String>,
}

fn default_trust() -> f64 {
    0.55
}
fn default_creator_trust() -> f64 {
    0.70
}
fn default_creator_block_trust() -> f64 {
    0.05
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            default_trust: default_trust(),
            creator_default_trust: default_creator_trust(),
            creator_block_trust: default_creator_block_trust(),
            strict_creator_whitelist: None,
            org_trust: HashMap::new(),
            creator_trust: HashMap::new(),
            org_alias: HashMap::new(),
            creator_alias: HashMap::new(),
        }
    }
}

/// Editorial whitelist file (`editorial_whitelist.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorialWhitelist {
    #[serde(default)]
    pub strict_creator_whitelist: Option<bool>,
    #[serde(default)]
    pub creators: Vec<EditorialEntry>,
    #[serde(default)]
    pub orgs: Vec<EditorialEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorialEntry {
    pub name: String,
    #[serde(default)]
    pub trust: Option<f64>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl TrustConfig {
    pub fn is_strict(&self) -> bool {
        self.strict_creator_whitelist.unwrap_or(false)
    }

    /// Normalize table keys and alias targets, clamp values. Run once at load.
    pub fn sanitize(&mut self) {
        fn tables(m: &mut HashMap<String, f64>) {
            *m = m
                .drain()
                .map(|(k, v)| (normalize(&k), clamp01(v)))
                .filter(|(k, _)| !k.is_empty())
                .collect();
        }
        fn aliases(m: &mut HashMap<String, String>) {
            *m = m
                .drain()
                .map(|(k, v)| (normalize(&k), normalize(&v)))
                .filter(|(k, v)| !k.is_empty() && !v.is_empty())
                .collect();
        }
        tables(&mut self.org_trust);
        tables(&mut self.creator_trust);
        aliases(&mut self.org_alias);
        aliases(&mut self.creator_alias);
        self.default_trust = clamp01(self.default_trust);
        self.creator_default_trust = clamp01(self.creator_default_trust);
        self.creator_block_trust = clamp01(self.creator_block_trust);
    }

    /// Fold an editorial whitelist into the tables. The whitelist's presence
    /// makes the creator gate strict unless either file says otherwise.
    pub fn merge_editorial(&mut self, editorial: &EditorialWhitelist) {
        match editorial.strict_creator_whitelist {
            Some(strict) => self.strict_creator_whitelist = Some(strict),
            None => {
                self.strict_creator_whitelist.get_or_insert(true);
            }
        }

        let merge = |entries: &[EditorialEntry],
                     table: &mut HashMap<String, f64>,
                     alias: &mut HashMap<String, String>| {
            for e in entries {
                let name = normalize(&e.name);
                if name.is_empty() {
                    continue;
                }
                if let Some(t) = e.trust {
                    table.insert(name.clone(), clamp01(t));
                }
                for a in &e.aliases {
                    let ak = normalize(a);
                    if !ak.is_empty() {
                        alias.insert(ak, name.clone());
                    }
                }
            }
        };
        merge(&editorial.creators, &mut self.creator_trust, &mut self.creator_alias);
        merge(&editorial.orgs, &mut self.org_trust, &mut self.org_alias);
    }

    /// Trust for an item. Creators resolve by `creator_name`, falling back to
    /// `author_org` when the name is blank.
    pub fn source_trust(&self, author_org: &str, creator_name: &str, kind: SourceKind) -> f64 {
        match kind {
            SourceKind::Creator => {
                let raw = if creator_name.trim().is_empty() {
                    author_org
                } else {
                    creator_name
                };
                let key = resolve(&self.creator_alias, raw);
                if let Some(&t) = self.creator_trust.get(&key) {
                    return clamp01(t);
                }
                if self.is_strict() && !key.is_empty() {
                    return clamp01(self.creator_block_trust);
                }
                clamp01(self.creator_default_trust)
            }
            SourceKind::Institutional => {
                let key = resolve(&self.org_alias, author_org);
                if let Some(&t) = self.org_trust.get(&key) {
                    return clamp01(t);
                }
                if KNOWN_PLATFORMS.contains(&key.as_str()) {
                    return KNOWN_PLATFORM_TRUST;
                }
                clamp01(self.default_trust)
            }
        }
    }
}

fn resolve(aliases: &HashMap<String, String>, raw: &str) -> String {
    let key = normalize(raw);
    match aliases.get(&key) {
        Some(canon) => canon.clone(),
        None => key,
    }
}

/// Trim, lowercase, collapse whitespace.
fn normalize(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> TrustConfig {
        let mut c: TrustConfig = toml::from_str(
            r#"
            default_trust = 0.55
            [org_trust]
            "OpenAI" = 0.95
            "Google  DeepMind" = 0.93
            "Shady" = 1.7
            [org_aliases]
            "openai news" = "openai"
            [creator_trust]
            "Simone Rizzo" = 0.82
            "#,
        )
        .expect("parse trust toml");
        c.sanitize();
        c
    }

    #[test]
    fn exact_and_alias_match() {
        let c = cfg();
        assert!((c.source_trust("openai", "", SourceKind::Institutional) - 0.95).abs() < 1e-9);
        assert!((c.source_trust(" OpenAI   News ", "", SourceKind::Institutional) - 0.95).abs() < 1e-9);
        assert!((c.source_trust("google deepmind", "", SourceKind::Institutional) - 0.93).abs() < 1e-9);
    }

    #[test]
    fn values_are_clamped() {
        assert_eq!(cfg().source_trust("shady", "", SourceKind::Institutional), 1.0);
    }

    #[test]
    fn platforms_and_default() {
        let c = cfg();
        assert_eq!(c.source_trust("arXiv", "", SourceKind::Institutional), 0.75);
        assert!((c.source_trust("random blog", "", SourceKind::Institutional) - 0.55).abs() < 1e-9);
    }

    #[test]
    fn creator_falls_back_to_author_org() {
        let c = cfg();
        assert!((c.source_trust("Simone Rizzo", "", SourceKind::Creator) - 0.82).abs() < 1e-9);
        assert!((c.source_trust("", "unknown vlogger", SourceKind::Creator) - 0.70).abs() < 1e-9);
    }

    #[test]
    fn strict_whitelist_blocks_unknown_creators() {
        let mut c = cfg();
        c.merge_editorial(&EditorialWhitelist {
            strict_creator_whitelist: None,
            creators: vec![EditorialEntry {
                name: "Ada Lovelace".into(),
                trust: Some(0.9),
                aliases: vec!["ada-l".into()],
            }],
            orgs: vec![],
        });
        assert!(c.is_strict());
        assert!((c.source_trust("", "unknown vlogger", SourceKind::Creator) - 0.05).abs() < 1e-9);
        assert!((c.source_trust("", "ADA-L", SourceKind::Creator) - 0.9).abs() < 1e-9);
        assert!((c.source_trust("", "simone rizzo", SourceKind::Creator) - 0.82).abs() < 1e-9);
    }

    #[test]
    fn explicit_strict_flag_wins() {
        let mut c = cfg();
        c.strict_creator_whitelist = Some(false);
        c.merge_editorial(&EditorialWhitelist::default());
        assert!(!c.is_strict());

        c.merge_editorial(&EditorialWhitelist {
            strict_creator_whitelist: Some(true),
            ..Default::default()
        });
        assert!(c.is_strict());
    }
}
