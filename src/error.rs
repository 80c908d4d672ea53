//! Error types shared across the concept pipeline

use crate::config::ConfigError;
use crate::embedding::EmbeddingError;
use thiserror::Error;

/// Errors that can fail a pipeline run or a value construction
#[derive(Debug, Error)]
pub enum ConceptError {
    /// No processable papers, or no evidence-validated candidates
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Two embeddings of different dimensionality were compared
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// An embedding with zero magnitude or non-finite components
    #[error("invalid vector: {0}")]
    InvalidVector(String),

    /// Evidence text too short or confidence not a number
    #[error("invalid evidence: {0}")]
    InvalidEvidence(String),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Run was cancelled at the checkpoint following `stage`
    #[error("pipeline cancelled after stage '{stage}'")]
    Cancelled { stage: &'static str },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for concept pipeline operations
pub type ConceptResult<T> = Result<T, ConceptError>;
