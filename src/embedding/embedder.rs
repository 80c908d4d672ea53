//! Embedding backends
//!
//! Uses a trait-based backend (`Embedder`) so production code can use
//! fastembed-rs while tests and offline runs use the deterministic
//! `HashingEmbedder`. The random seed configured for a run is consumed here
//! and nowhere else in the pipeline.

use super::vector::EmbeddingVector;
use crate::error::{ConceptError, ConceptResult};
use dashmap::DashMap;
use thiserror::Error;

/// Error type for embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The embedding model returned no results
    #[error("embedding returned no results")]
    EmptyResult,
    /// The model returned a different number of vectors than texts
    #[error("embedding batch mismatch: expected {expected} vectors, got {found}")]
    BatchMismatch { expected: usize, found: usize },
    /// Model loading or inference failed
    #[error("embedding model error: {0}")]
    ModelError(String),
}

/// Trait for embedding text into vectors.
///
/// Implementations handle model loading and inference.
/// fastembed-rs for production, hashing or mocks for tests.
pub trait Embedder: Send + Sync {
    /// Identifier recorded in hierarchy provenance
    fn model_id(&self) -> &str;

    /// Dimensionality of every returned vector
    fn dimension(&self) -> usize;

    /// Seed the model embeds with, if it takes one
    fn seed(&self) -> Option<u64> {
        None
    }

    /// Embed a batch of texts, returning one vector per text.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Embed texts and wrap them as validated `EmbeddingVector`s.
pub fn embed_all(embedder: &dyn Embedder, texts: &[&str]) -> ConceptResult<Vec<EmbeddingVector>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let raw = embedder.embed_batch(texts)?;
    if raw.len() != texts.len() {
        return Err(EmbeddingError::BatchMismatch {
            expected: texts.len(),
            found: raw.len(),
        }
        .into());
    }

    let expected = embedder.dimension();
    raw.into_iter()
        .map(|values| {
            if values.len() != expected {
                return Err(ConceptError::DimensionMismatch {
                    expected,
                    found: values.len(),
                });
            }
            EmbeddingVector::new(values)
        })
        .collect()
}

/// Embed a single text.
pub fn embed_one(embedder: &dyn Embedder, text: &str) -> ConceptResult<EmbeddingVector> {
    embed_all(embedder, &[text])?
        .pop()
        .ok_or(ConceptError::Embedding(EmbeddingError::EmptyResult))
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// FNV-1a 64-bit hash, stable across platforms and toolchains.
pub(crate) fn fnv1a64(seed: u64, bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for b in seed.to_le_bytes().iter().chain(bytes.iter()) {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministic feature-hashing embedder.
///
/// Each word contributes a whole-word feature and its padded character
/// trigrams; every feature is hashed (with the seed) to a bucket and a sign.
/// The result is L2-normalized. Identical seed and text always give an
/// identical vector, and surface variants ("network" / "networks") land
/// close together through shared trigrams.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    seed: u64,
    model_id: String,
}

impl HashingEmbedder {
    pub const DEFAULT_DIMENSION: usize = 256;

    const WORD_WEIGHT: f32 = 1.0;
    const TRIGRAM_WEIGHT: f32 = 0.5;

    pub fn new(dimension: usize, seed: u64) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            seed,
            model_id: format!("hashing-{}", dimension),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(Self::DEFAULT_DIMENSION, seed)
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let lowered: String = text
            .chars()
            .map(|c| {
                if c.is_alphanumeric() {
                    c.to_lowercase().next().unwrap_or(c)
                } else {
                    ' '
                }
            })
            .collect();

        for word in lowered.split_whitespace() {
            self.add_feature(&mut vector, "w", word, Self::WORD_WEIGHT);

            let padded: Vec<char> = format!("#{}#", word).chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut vector, "t", &gram, Self::TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vector.iter_mut() {
                *x /= norm;
            }
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], kind: &str, feature: &str, weight: f32) {
        let key = format!("{}:{}", kind, feature);
        let hash = fnv1a64(self.seed, key.as_bytes());
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn seed(&self) -> Option<u64> {
        Some(self.seed)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Memoizing wrapper so each distinct text is embedded once per run.
///
/// Only used by the single-threaded stages after extraction.
pub struct CachingEmbedder<'a> {
    inner: &'a dyn Embedder,
    cache: DashMap<String, Vec<f32>>,
}

impl<'a> CachingEmbedder<'a> {
    pub fn new(inner: &'a dyn Embedder) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Number of distinct texts embedded so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl Embedder for CachingEmbedder<'_> {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn seed(&self) -> Option<u64> {
        self.inner.seed()
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut missing: Vec<&str> = Vec::new();
        for text in texts {
            if !self.cache.contains_key(*text) && !missing.contains(text) {
                missing.push(*text);
            }
        }

        if !missing.is_empty() {
            let fresh = self.inner.embed_batch(&missing)?;
            if fresh.len() != missing.len() {
                return Err(EmbeddingError::BatchMismatch {
                    expected: missing.len(),
                    found: fresh.len(),
                });
            }
            for (text, vector) in missing.iter().zip(fresh) {
                self.cache.insert((*text).to_string(), vector);
            }
        }

        texts
            .iter()
            .map(|t| {
                self.cache
                    .get(*t)
                    .map(|v| v.value().clone())
                    .ok_or(EmbeddingError::EmptyResult)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// FastEmbedEmbedder: production embedder behind the `embeddings` feature
// ---------------------------------------------------------------------------

#[cfg(feature = "embeddings")]
mod fastembed_impl {
    use super::{Embedder, EmbeddingError};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::Mutex;

    /// Production embedder backed by fastembed (ONNX Runtime).
    ///
    /// Wraps `fastembed::TextEmbedding` in a `Mutex` because its `embed`
    /// method requires `&mut self`, while the `Embedder` trait uses `&self`.
    pub struct FastEmbedEmbedder {
        model: Mutex<TextEmbedding>,
        model_id: String,
        dimension: usize,
    }

    impl FastEmbedEmbedder {
        pub fn new(
            model: EmbeddingModel,
            model_id: &str,
            dimension: usize,
        ) -> Result<Self, EmbeddingError> {
            let options = InitOptions::new(model).with_show_download_progress(false);
            let embedding = TextEmbedding::try_new(options)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            Ok(Self {
                model: Mutex::new(embedding),
                model_id: model_id.to_string(),
                dimension,
            })
        }

        /// all-MiniLM-L6-v2, 384 dimensions
        pub fn default_model() -> Result<Self, EmbeddingError> {
            Self::new(EmbeddingModel::AllMiniLML6V2, "all-minilm-l6-v2", 384)
        }
    }

    impl Embedder for FastEmbedEmbedder {
        fn model_id(&self) -> &str {
            &self.model_id
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let mut model = self
                .model
                .lock()
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            let embeddings = model
                .embed(texts.to_vec(), None)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            if embeddings.is_empty() {
                return Err(EmbeddingError::EmptyResult);
            }
            Ok(embeddings)
        }
    }
}

#[cfg(feature = "embeddings")]
pub use fastembed_impl::FastEmbedEmbedder;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts inner calls and texts to verify memoization.
    struct CountingEmbedder {
        inner: HashingEmbedder,
        texts_seen: Arc<AtomicUsize>,
    }

    impl Embedder for CountingEmbedder {
        fn model_id(&self) -> &str {
            "counting"
        }
        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.texts_seen.fetch_add(texts.len(), Ordering::Relaxed);
            self.inner.embed_batch(texts)
        }
    }

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn model_id(&self) -> &str {
            "short"
        }
        fn dimension(&self) -> usize {
            3
        }
        fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(vec![vec![1.0, 0.0, 0.0]])
        }
    }

    #[test]
    fn hashing_is_deterministic_per_seed() {
        let a = HashingEmbedder::with_seed(7);
        let b = HashingEmbedder::with_seed(7);
        let c = HashingEmbedder::with_seed(8);
        let text = "lattice-based cryptography";
        assert_eq!(a.embed_batch(&[text]).unwrap(), b.embed_batch(&[text]).unwrap());
        assert_ne!(a.embed_batch(&[text]).unwrap(), c.embed_batch(&[text]).unwrap());
    }

    #[test]
    fn hashing_vectors_are_unit_length() {
        let e = HashingEmbedder::with_seed(1);
        let v = embed_one(&e, "graph neural networks").unwrap();
        assert!((v.magnitude() - 1.0).abs() < 1e-5);
        assert_eq!(v.dimension(), HashingEmbedder::DEFAULT_DIMENSION);
    }

    #[test]
    fn surface_variants_are_closer_than_unrelated_phrases() {
        let e = HashingEmbedder::with_seed(42);
        let vs = embed_all(&e, &["neural network", "neural networks", "protein folding"]).unwrap();
        let variant = vs[0].cosine_similarity(&vs[1]).unwrap();
        let unrelated = vs[0].cosine_similarity(&vs[2]).unwrap();
        assert!(variant > 0.6, "variant similarity {}", variant);
        assert!(unrelated < 0.5, "unrelated similarity {}", unrelated);
        assert!(variant > unrelated);
    }

    #[test]
    fn text_without_words_is_rejected() {
        let e = HashingEmbedder::with_seed(1);
        assert!(matches!(
            embed_one(&e, "-- ..."),
            Err(ConceptError::InvalidVector(_))
        ));
    }

    #[test]
    fn batch_length_mismatch_is_reported() {
        let err = embed_all(&ShortEmbedder, &["a", "b"]).unwrap_err();
        assert!(matches!(
            err,
            ConceptError::Embedding(EmbeddingError::BatchMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn caching_embeds_each_text_once() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counting = CountingEmbedder {
            inner: HashingEmbedder::with_seed(3),
            texts_seen: seen.clone(),
        };
        let cache = CachingEmbedder::new(&counting);

        let first = cache.embed_batch(&["alpha", "beta", "alpha"]).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[0], first[2]);
        assert_eq!(seen.load(Ordering::Relaxed), 2);

        cache.embed_batch(&["beta", "gamma"]).unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 3);
        assert_eq!(cache.cached(), 3);
    }

    #[test]
    fn fnv_is_stable() {
        let h1 = fnv1a64(0, b"a");
        let h2 = fnv1a64(0, b"a");
        assert_eq!(h1, h2);
        assert_ne!(fnv1a64(0, b"a"), fnv1a64(1, b"a"));
    }

    #[cfg(feature = "embeddings")]
    #[test]
    #[ignore] // requires model download
    fn fastembed_default_model_embeds_text() {
        let embedder = super::FastEmbedEmbedder::default_model().expect("model should load");
        let result = embedder.embed_batch(&["hello world"]).expect("should embed");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), embedder.dimension());
    }
}
