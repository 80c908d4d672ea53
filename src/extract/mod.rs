//! Candidate extraction
//!
//! Three strategies implement `CandidateExtractor`. Each reads the shared
//! corpus and returns its own `ExtractionOutput`; extractors never share
//! mutable state, so the pipeline runs them concurrently. The merger only
//! ever sees the common `ConceptCandidate` shape plus a method tag.

pub mod chunk;
mod embedding_based;
mod rule_based;
mod statistical;

pub use embedding_based::EmbeddingExtractor;
pub use rule_based::RuleBasedExtractor;
pub use statistical::StatisticalExtractor;

use crate::config::PipelineConfig;
use crate::corpus::{Corpus, PaperId, SkippedPaper};
use crate::embedding::Embedder;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Which strategy proposed a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    RuleBased,
    Statistical,
    EmbeddingBased,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::RuleBased => "rule-based",
            ExtractionMethod::Statistical => "statistical",
            ExtractionMethod::EmbeddingBased => "embedding-based",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A provisional concept phrase from one strategy
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptCandidate {
    /// Literal phrase as found in the text
    pub surface: String,
    pub method: ExtractionMethod,
    pub papers: BTreeSet<PaperId>,
    /// Raw score, normalized per paper to (0, 1]
    pub score: f64,
    /// Times this surface form occurs in its paper
    pub occurrences: usize,
    /// Near-duplicate surface forms grouped by the embedding strategy
    pub synonyms: Vec<String>,
}

impl ConceptCandidate {
    pub fn new(
        surface: impl Into<String>,
        method: ExtractionMethod,
        paper: PaperId,
        score: f64,
        occurrences: usize,
    ) -> Self {
        Self {
            surface: surface.into(),
            method,
            papers: BTreeSet::from([paper]),
            score,
            occurrences,
            synonyms: Vec::new(),
        }
    }

    pub fn with_synonyms(mut self, synonyms: Vec<String>) -> Self {
        self.synonyms = synonyms;
        self
    }
}

/// An explicit "X such as Y" assertion: `parent` is a hypernym of `child`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HyponymPair {
    pub parent: String,
    pub child: String,
    pub paper: PaperId,
}

/// Everything one extractor produced over the corpus
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutput {
    pub candidates: Vec<ConceptCandidate>,
    pub hyponyms: Vec<HyponymPair>,
    pub skipped: Vec<SkippedPaper>,
}

impl ExtractionOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append another output, keeping order
    pub fn extend(&mut self, other: ExtractionOutput) {
        self.candidates.extend(other.candidates);
        self.hyponyms.extend(other.hyponyms);
        self.skipped.extend(other.skipped);
    }
}

/// A candidate extraction strategy.
///
/// Implementations must be deterministic for a fixed corpus and must not
/// keep state between calls.
pub trait CandidateExtractor: Send + Sync {
    /// Tag attached to every candidate this extractor emits
    fn method(&self) -> ExtractionMethod;

    /// Name used in logs and skip records
    fn name(&self) -> &str;

    fn extract(&self, corpus: &Corpus) -> ExtractionOutput;
}

/// Registry of extraction strategies, in registration order
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn CandidateExtractor>>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Registry holding the rule-based, statistical and embedding-based
    /// strategies
    pub fn with_defaults(config: &PipelineConfig, embedder: Arc<dyn Embedder>) -> Self {
        let mut registry = Self::new();
        registry.register(RuleBasedExtractor::new(config.extraction.clone()));
        registry.register(StatisticalExtractor::new(config.extraction.clone()));
        registry.register(EmbeddingExtractor::new(
            config.extraction.clone(),
            config.similarity_threshold,
            embedder,
        ));
        registry
    }

    pub fn register<E: CandidateExtractor + 'static>(&mut self, extractor: E) {
        self.extractors.push(Arc::new(extractor));
    }

    pub fn extractors(&self) -> &[Arc<dyn CandidateExtractor>] {
        &self.extractors
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

/// Divide every score by the largest, mapping a paper's scores into (0, 1].
pub(crate) fn normalize_scores(scores: &mut [f64]) {
    let max = scores.iter().copied().fold(0.0f64, f64::max);
    if max > 0.0 {
        for s in scores.iter_mut() {
            *s = (*s / max).max(f64::EPSILON);
        }
    }
}
