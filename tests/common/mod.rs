//! Common test utilities for conceptmap integration tests
//!
//! Builders for small paper corpora with known structure, and mock
//! embedders with fully predictable behavior.

#![allow(dead_code)]

pub mod corpus;
pub mod mock_embedder;

pub use corpus::{disjoint_corpus, hyponymy_corpus, lattice_corpus, paper, LATTICE_SENTENCE};
pub use mock_embedder::FailingEmbedder;

use conceptmap::{ConceptPipeline, HashingEmbedder, PipelineConfig};
use std::sync::Arc;

/// Pipeline over the hashing embedder with a pinned timestamp
pub fn pipeline(config: PipelineConfig) -> ConceptPipeline {
    let embedder = Arc::new(HashingEmbedder::with_seed(config.random_seed));
    ConceptPipeline::new(config, embedder)
        .expect("test config is valid")
        .with_generated_at(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH)
}
