//! Conceptmap: Evidence-Grounded Concept Hierarchies
//!
//! Turns a corpus of academic papers into a tree of research concepts. Every
//! concept is traceable to literal sentences in the papers it came from.
//!
//! # Stages
//!
//! - **Corpus**: eligibility checks and sentence segmentation
//! - **Extraction**: rule-based, statistical and embedding-based candidate
//!   phrases, run concurrently
//! - **Merge**: consolidation of near-duplicate candidates across strategies
//! - **Evidence**: supporting sentences and confidence; ungrounded candidates
//!   are rejected
//! - **Clustering**: average-linkage dendrogram cut at its largest gaps
//! - **Assembly**: the immutable `ConceptHierarchy`
//!
//! # Example
//!
//! ```no_run
//! use conceptmap::{ConceptPipeline, HashingEmbedder, Paper, PipelineConfig};
//! use std::sync::Arc;
//!
//! # async fn build(papers: Vec<Paper>) -> conceptmap::ConceptResult<()> {
//! let pipeline = ConceptPipeline::new(
//!     PipelineConfig::default(),
//!     Arc::new(HashingEmbedder::with_seed(42)),
//! )?;
//! let hierarchy = pipeline.run(&papers).await?;
//! println!("{} concepts", hierarchy.len());
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod config;
pub mod corpus;
pub mod embedding;
mod error;
pub mod evidence;
pub mod extract;
pub mod hierarchy;
pub mod merge;
pub mod pipeline;

pub use config::{ClusteringConfig, ConfidenceWeights, ConfigError, ExtractionConfig, PipelineConfig};
pub use corpus::{Corpus, Paper, PaperId, SkippedPaper};
pub use embedding::{CachingEmbedder, Embedder, EmbeddingError, EmbeddingVector, HashingEmbedder};
#[cfg(feature = "embeddings")]
pub use embedding::FastEmbedEmbedder;
pub use error::{ConceptError, ConceptResult};
pub use evidence::{EvidenceSentence, LinkedConcept};
pub use extract::{
    CandidateExtractor, ConceptCandidate, ExtractionMethod, ExtractionOutput, ExtractorRegistry,
    HyponymPair,
};
pub use hierarchy::{
    ConceptHierarchy, ConceptId, ConceptNode, EvidenceId, HierarchyDocument, HierarchyMetadata,
    HierarchyViolation,
};
pub use merge::{CandidateMerger, MergedCandidate};
pub use pipeline::{CancellationToken, ConceptPipeline};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
