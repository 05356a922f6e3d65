// src/analyze/keywords.rs
//! Keyword matching shared by the topic, content-type and tag classifiers.
//!
//! Short keywords (3 chars or fewer) only match on word boundaries so that
//! "api" does not fire inside "capital"; longer ones match as substrings.

use regex::Regex;

const BOUNDARY_MAX_CHARS: usize = 3;

#[derive(Debug, Clone)]
struct Keyword {
    text: String,
    boundary: Option<Regex>,
}

impl Keyword {
    fn compile(raw: &str) -> Option<Self> {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        let boundary = if text.chars().count() <= BOUNDARY_MAX_CHARS {
            Regex::new(&format!(r"\b{}\b", regex::escape(&text))).ok()
        } else {
            None
        };
        Some(Self { text, boundary })
    }

    fn matches(&self, prepared: &str) -> bool {
        match &self.boundary {
            Some(re) => re.is_match(prepared),
            None => prepared.contains(&self.text),
        }
    }
}

/// A compiled keyword list. Matching expects text run through [`prepare`].
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    keywords: Vec<Keyword>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .filter_map(|k| Keyword::compile(k.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Number of distinct keywords present in `prepared`.
    pub fn hits(&self, prepared: &str) -> usize {
        self.keywords.iter().filter(|k| k.matches(prepared)).count()
    }

    /// Keywords present in `prepared`, in configuration order.
    pub fn matched<'a>(&'a self, prepared: &str) -> Vec<&'a str> {
        self.keywords
            .iter()
            .filter(|k| k.matches(prepared))
            .map(|k| k.text.as_str())
            .collect()
    }
}

/// Lowercase and collapse whitespace.
pub fn prepare(text: &str) -> String {
    crate::normalize::normalize_whitespace(&text.to_lowercase())
}

/// Plain substring hits over already-lowercased text.
pub(crate) fn substring_hits(lowered: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| lowered.contains(**k)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_keywords_need_word_boundaries() {
        let set = KeywordSet::new(["api", "cli"]);
        assert_eq!(set.hits(&prepare("Capital clinic")), 0);
        assert_eq!(set.hits(&prepare("New API and a CLI")), 2);
    }

    #[test]
    fn long_keywords_match_as_substrings() {
        let set = KeywordSet::new(["release", "model card"]);
        assert_eq!(set.hits(&prepare("Released with a MODEL   CARD")), 2);
    }

    #[test]
    fn blank_keywords_are_ignored() {
        let set = KeywordSet::new(["", "   ", "agent"]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.matched("agentic workflows"), vec!["agent"]);
    }

    #[test]
    fn dotted_short_keyword_matches_versions() {
        let set = KeywordSet::new(["v2."]);
        assert_eq!(set.hits("vision kit v2.0 is out"), 1);
        assert_eq!(set.hits("kv2.0"), 0);
    }
}
