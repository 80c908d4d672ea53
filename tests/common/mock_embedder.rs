//! Mock embedders

use conceptmap::{Embedder, EmbeddingError};

/// Embedder whose every call fails
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn model_id(&self) -> &str {
        "failing"
    }

    fn dimension(&self) -> usize {
        8
    }

    fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::ModelError("model unavailable".to_string()))
    }
}
