// src/lang.rs
//! Language identification: a statistical model when available, a stopword
//! heuristic otherwise, with the allow-list applied after detection.

use lingua::{LanguageDetector, LanguageDetectorBuilder};
use once_cell::sync::Lazy;
use regex::Regex;

pub const UNKNOWN: &str = "unknown";
pub const OTHER: &str = "other";

const MAX_DETECT_CHARS: usize = 8_000;
const MIN_HEURISTIC_TOKENS: usize = 4;

static STOPWORDS: &[(&str, &[&str])] = &[
    (
        "it",
        &[
            "il", "lo", "la", "gli", "le", "un", "una", "di", "che", "per", "con", "nel", "nella",
            "della", "delle", "dei", "ai", "allo",
        ],
    ),
    (
        "en",
        &[
            "the", "and", "for", "with", "new", "from", "on", "in", "to", "of", "is", "are",
            "release", "paper",
        ],
    ),
    (
        "fr",
        &[
            "le", "la", "les", "de", "des", "et", "dans", "pour", "une", "un", "avec", "sur", "du",
        ],
    ),
    (
        "es",
        &["el", "la", "los", "las", "de", "del", "y", "con", "para", "una", "un", "en"],
    ),
    (
        "de",
        &["der", "die", "das", "und", "mit", "für", "ein", "eine", "im", "von", "zu"],
    ),
];

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zàèéìòùçñäöüß]{2,}").unwrap());

static DETECTOR: Lazy<LanguageDetector> =
    Lazy::new(|| LanguageDetectorBuilder::from_all_languages().build());

#[derive(Debug, Clone, PartialEq)]
pub struct LangDetection {
    /// ISO 639-1 code, `other` (outside the allow-list) or `unknown`.
    pub lang: String,
    pub confidence: f64,
    pub method: String,
}

impl LangDetection {
    fn new(lang: impl Into<String>, confidence: f64, method: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            confidence: confidence.clamp(0.0, 1.0),
            method: method.into(),
        }
    }
}

/// A statistical language identifier. Returns the top code and its
/// confidence, or `None` when it cannot decide.
pub trait LanguageModel: Send + Sync {
    fn predict(&self, text: &str) -> Option<(String, f64)>;
    fn name(&self) -> &'static str;
}

/// `lingua` detector over every language it knows; the allow-list is applied
/// afterwards by [`LanguageClassifier`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LinguaModel;

impl LanguageModel for LinguaModel {
    fn predict(&self, text: &str) -> Option<(String, f64)> {
        let lang = DETECTOR.detect_language_of(text)?;
        let conf = DETECTOR
            .compute_language_confidence_values(text)
            .iter()
            .find(|(l, _)| *l == lang)
            .map_or(0.0, |(_, c)| *c);
        if conf <= 0.0 {
            return None;
        }
        Some((lang.iso_code_639_1().to_string().to_lowercase(), conf))
    }

    fn name(&self) -> &'static str {
        "lingua"
    }
}

pub struct LanguageClassifier {
    model: Option<Box<dyn LanguageModel>>,
}

impl Default for LanguageClassifier {
    fn default() -> Self {
        Self::with_model(LinguaModel)
    }
}

impl LanguageClassifier {
    pub fn with_model(model: impl LanguageModel + 'static) -> Self {
        Self {
            model: Some(Box::new(model)),
        }
    }

    pub fn heuristic_only() -> Self {
        Self { model: None }
    }

    pub fn detect(&self, text: &str, allowed: &[String], min_confidence: f64) -> LangDetection {
        let clean: String = text
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(MAX_DETECT_CHARS)
            .collect();
        if clean.is_empty() {
            return LangDetection::new(UNKNOWN, 0.0, "empty");
        }

        let allowed_set: Vec<String> = allowed
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        let outside = |lang: &str| {
            !allowed_set.is_empty() && lang != UNKNOWN && !allowed_set.iter().any(|a| a == lang)
        };

        if let Some(model) = &self.model {
            if let Some((mut lang, mut conf)) = model.predict(&clean) {
                if conf < min_confidence {
                    let (h_lang, h_conf) = score_by_stopwords(&clean);
                    if h_conf > conf {
                        lang = h_lang.to_string();
                        conf = h_conf;
                    }
                }
                if outside(&lang) {
                    return LangDetection::new(OTHER, conf, format!("{}+allowed", model.name()));
                }
                return LangDetection::new(lang, conf, model.name());
            }
        }

        let (lang, conf) = score_by_stopwords(&clean);
        if outside(lang) {
            return LangDetection::new(OTHER, conf, "heuristic+allowed");
        }
        LangDetection::new(lang, conf, "heuristic")
    }
}

/// Stopword vote. Confidence grows with the gap between the two best
/// languages, scaled by text length.
pub fn score_by_stopwords(text: &str) -> (&'static str, f64) {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = RE_TOKEN.find_iter(&lowered).map(|m| m.as_str()).collect();
    if tokens.len() < MIN_HEURISTIC_TOKENS {
        return (UNKNOWN, 0.0);
    }

    let counts: Vec<(&'static str, usize)> = STOPWORDS
        .iter()
        .map(|(lang, words)| (*lang, tokens.iter().filter(|t| words.contains(*t)).count()))
        .collect();

    let mut best = counts[0];
    for c in &counts[1..] {
        if c.1 > best.1 {
            best = *c;
        }
    }
    if best.1 == 0 {
        return (UNKNOWN, 0.0);
    }

    let mut ordered: Vec<usize> = counts.iter().map(|c| c.1).collect();
    ordered.sort_unstable_by(|a, b| b.cmp(a));
    let second = ordered.get(1).copied().unwrap_or(0);

    let denom = (tokens.len() as f64 * 0.18).max(3.0);
    let conf = ((best.1 - second) as f64 + 1.0) / denom;
    (best.0, conf.min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(&'static str, f64);

    impl LanguageModel for FixedModel {
        fn predict(&self, _text: &str) -> Option<(String, f64)> {
            Some((self.0.to_string(), self.1))
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn allowed() -> Vec<String> {
        vec!["it".into(), "en".into()]
    }

    #[test]
    fn empty_text_is_unknown() {
        let d = LanguageClassifier::heuristic_only().detect("   ", &allowed(), 0.6);
        assert_eq!(d, LangDetection::new(UNKNOWN, 0.0, "empty"));
    }

    #[test]
    fn short_text_is_unknown() {
        let (lang, conf) = score_by_stopwords("the model");
        assert_eq!(lang, UNKNOWN);
        assert_eq!(conf, 0.0);
    }

    #[test]
    fn heuristic_detects_english() {
        let d = LanguageClassifier::heuristic_only().detect(
            "The team released the new model with weights and code for the community",
            &allowed(),
            0.6,
        );
        assert_eq!(d.lang, "en");
        assert_eq!(d.method, "heuristic");
        assert!(d.confidence > 0.9);
    }

    #[test]
    fn heuristic_detects_italian() {
        let (lang, _) = score_by_stopwords("il modello della settimana per la ricerca con gli agenti");
        assert_eq!(lang, "it");
    }

    #[test]
    fn disallowed_language_becomes_other() {
        let d = LanguageClassifier::heuristic_only().detect(
            "der neue Ansatz und die Methode mit einer Evaluierung von Modellen",
            &allowed(),
            0.6,
        );
        assert_eq!(d.lang, OTHER);
        assert_eq!(d.method, "heuristic+allowed");
    }

    #[test]
    fn confident_model_wins() {
        let c = LanguageClassifier::with_model(FixedModel("en", 0.95));
        let d = c.detect("whatever text here for sure", &allowed(), 0.6);
        assert_eq!(d.lang, "en");
        assert_eq!(d.method, "fixed");
        assert!((d.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn weak_model_falls_back_to_heuristic_when_better() {
        let c = LanguageClassifier::with_model(FixedModel("fr", 0.2));
        let d = c.detect(
            "the release of the new paper and the code for the model",
            &allowed(),
            0.6,
        );
        assert_eq!(d.lang, "en");
        assert_eq!(d.method, "fixed");
    }

    #[test]
    fn model_language_outside_allow_list_is_other() {
        let c = LanguageClassifier::with_model(FixedModel("pt", 0.9));
        let d = c.detect("um novo modelo foi lançado hoje", &allowed(), 0.6);
        assert_eq!(d.lang, OTHER);
        assert_eq!(d.method, "fixed+allowed");
    }

    const RUSSIAN: &str = "Команда выпустила новую версию модели с открытыми весами. \
        Подробности об обучении и оценке опубликованы в техническом отчёте, \
        а исходный код доступен на github вместе с checkpoint release.";

    #[test]
    fn lingua_identifies_languages_outside_allow_list() {
        let (lang, conf) = LinguaModel.predict(&RUSSIAN.to_lowercase()).expect("detected");
        assert_eq!(lang, "ru");
        assert!(conf > 0.0);

        let d = LanguageClassifier::default().detect(RUSSIAN, &allowed(), 0.6);
        assert_eq!(d.lang, OTHER);
        assert_eq!(d.method, "lingua+allowed");
    }

    #[test]
    fn lingua_declines_text_without_letters() {
        assert_eq!(LinguaModel.predict("12345 %%% 678"), None);
    }

    #[test]
    fn empty_allow_list_accepts_everything() {
        let c = LanguageClassifier::with_model(FixedModel("pt", 0.9));
        let d = c.detect("um novo modelo foi lançado hoje", &[], 0.6);
        assert_eq!(d.lang, "pt");
    }
}
