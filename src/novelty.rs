// src/novelty.rs
//! Semantic novelty against recently persisted items.
//!
//! Novelty of a vector is `1 - max cosine` against the history matrix. Any
//! encoder producing comparable unit vectors satisfies [`TextEncoder`].

use anyhow::Result;
use async_trait::async_trait;
use xxhash_rust::xxh3::xxh3_64;

/// Novelty assigned when there is nothing to compare against.
pub const EMPTY_HISTORY_NOVELTY: f64 = 0.90;

#[async_trait]
pub trait TextEncoder: Send + Sync {
    /// One unit-norm row per input text, all of the same dimension.
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    fn name(&self) -> &'static str;
}

/// Dot product of two rows; equals cosine for unit vectors.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

pub fn novelty_score(v: &[f32], history: &[Vec<f32>]) -> f64 {
    if history.is_empty() {
        return EMPTY_HISTORY_NOVELTY;
    }
    let max_sim = history
        .iter()
        .map(|h| cosine(v, h))
        .fold(f64::NEG_INFINITY, f64::max)
        .clamp(-1.0, 1.0);
    (1.0 - max_sim).clamp(0.0, 1.0)
}

pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Feature-hashed character trigrams, L2-normalized. Lexical, so it does not
/// match the same story across languages: used when the sentence model cannot
/// be loaded and in tests.
#[derive(Debug, Clone, Copy)]
pub struct HashingEncoder {
    dim: usize,
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self { dim: 1024 }
    }
}

impl HashingEncoder {
    pub fn with_dim(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn encode_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        let chars: Vec<char> = crate::normalize::normalize_whitespace(&text.to_lowercase())
            .chars()
            .collect();
        let mut buf = String::with_capacity(12);
        for w in chars.windows(3) {
            buf.clear();
            buf.extend(w.iter());
            let h = xxh3_64(buf.as_bytes());
            let idx = (h % self.dim as u64) as usize;
            // high bit is the sign
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        l2_normalize(&mut v);
        v
    }
}

#[async_trait]
impl TextEncoder for HashingEncoder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.encode_one(t)).collect())
    }

    fn name(&self) -> &'static str {
        "hashing"
    }
}

#[cfg(feature = "embeddings")]
pub use bert::BertEncoder;

#[cfg(feature = "embeddings")]
mod bert {
    use std::sync::{Arc, Mutex};

    use anyhow::{Context, Result};
    use async_trait::async_trait;
    use once_cell::sync::OnceCell;
    use rust_bert::pipelines::sentence_embeddings::{
        SentenceEmbeddingsBuilder, SentenceEmbeddingsModel, SentenceEmbeddingsModelType,
    };

    use super::{l2_normalize, TextEncoder};

    /// Multilingual sentence encoder. The model is loaded once per process
    /// and shared by every `BertEncoder` handle.
    #[derive(Clone)]
    pub struct BertEncoder {
        model: Arc<Mutex<SentenceEmbeddingsModel>>,
    }

    impl std::fmt::Debug for BertEncoder {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("BertEncoder")
                .field("model", &"<SentenceEmbeddingsModel>")
                .finish()
        }
    }

    static SHARED: OnceCell<BertEncoder> = OnceCell::new();

    impl BertEncoder {
        /// Process-wide instance; the first call downloads/loads the model.
        pub fn shared() -> Result<Self> {
            SHARED.get_or_try_init(Self::load).cloned()
        }

        fn load() -> Result<Self> {
            // Model construction blocks; keep it off any async worker.
            let model = std::thread::spawn(|| {
                SentenceEmbeddingsBuilder::remote(
                    SentenceEmbeddingsModelType::DistiluseBaseMultilingualCased,
                )
                .create_model()
            })
            .join()
            .map_err(|_| anyhow::anyhow!("embedding model loader thread panicked"))??;
            tracing::info!(target: "radar", "sentence embedding model loaded");
            Ok(Self {
                model: Arc::new(Mutex::new(model)),
            })
        }
    }

    #[async_trait]
    impl TextEncoder for BertEncoder {
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let model = self.model.clone();
            let texts = texts.to_vec();
            let mut rows = tokio::task::spawn_blocking(move || {
                let model = model
                    .lock()
                    .map_err(|_| anyhow::anyhow!("embedding model mutex poisoned"))?;
                model.encode(&texts).context("encoding texts")
            })
            .await
            .context("embedding task join")??;
            for row in rows.iter_mut() {
                l2_normalize(row);
            }
            Ok(rows)
        }

        fn name(&self) -> &'static str {
            "distiluse-multilingual"
        }
    }
}
