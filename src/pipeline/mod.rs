//! Pipeline orchestrator
//!
//! Runs one corpus through every stage:
//! corpus preparation, extraction (extractors in parallel), merge, evidence
//! linking, clustering and assembly. Each stage hands its output to the next
//! by value; the run is checked for cancellation after every stage.

mod cancel;

pub use cancel::CancellationToken;

use crate::cluster::{resolve_hyponyms, ClusterBuilder};
use crate::config::PipelineConfig;
use crate::corpus::{Corpus, Paper};
use crate::embedding::{CachingEmbedder, Embedder, HashingEmbedder};
use crate::error::{ConceptError, ConceptResult};
use crate::evidence::EvidenceLinker;
use crate::extract::{CandidateExtractor, ExtractionOutput, ExtractorRegistry};
use crate::hierarchy::{CandidateCounts, ConceptHierarchy, HierarchyAssembler, PaperCounts, RunSummary};
use crate::merge::CandidateMerger;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Builds concept hierarchies from paper corpora
pub struct ConceptPipeline {
    config: PipelineConfig,
    embedder: Arc<dyn Embedder>,
    registry: ExtractorRegistry,
    cancellation: CancellationToken,
    generated_at: Option<DateTime<Utc>>,
}

impl ConceptPipeline {
    /// Pipeline with the three built-in extractors.
    ///
    /// The configuration is validated here, before any stage runs.
    pub fn new(config: PipelineConfig, embedder: Arc<dyn Embedder>) -> ConceptResult<Self> {
        config.validate()?;
        if let Some(seed) = embedder.seed().filter(|&s| s != config.random_seed) {
            tracing::warn!(
                configured = config.random_seed,
                embedder = seed,
                "embedder seed differs from randomSeed; recording the embedder's"
            );
        }
        let registry = ExtractorRegistry::with_defaults(&config, Arc::clone(&embedder));
        Ok(Self {
            config,
            embedder,
            registry,
            cancellation: CancellationToken::new(),
            generated_at: None,
        })
    }

    /// Pipeline over a `HashingEmbedder` seeded with `config.random_seed`
    pub fn from_config(config: PipelineConfig) -> ConceptResult<Self> {
        let embedder = Arc::new(HashingEmbedder::with_seed(config.random_seed));
        Self::new(config, embedder)
    }

    /// Register an additional extractor after the built-ins
    pub fn with_extractor<E: CandidateExtractor + 'static>(mut self, extractor: E) -> Self {
        self.registry.register(extractor);
        self
    }

    /// Replace the extractor set entirely
    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Pin the metadata timestamp so repeated runs serialize identically
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Token that cancels runs of this pipeline
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Run the full pipeline over `papers`.
    ///
    /// Returns the finished hierarchy or a single error; a failed or
    /// cancelled run never yields a partial hierarchy.
    pub async fn run(&self, papers: &[Paper]) -> ConceptResult<ConceptHierarchy> {
        let cancel = &self.cancellation;
        tracing::info!(papers = papers.len(), extractors = self.registry.len(), "pipeline started");

        let corpus = Arc::new(Corpus::prepare(papers, &self.config.extraction)?);
        cancel.checkpoint("corpus")?;

        let extracted = self.extract(Arc::clone(&corpus)).await?;
        cancel.checkpoint("extraction")?;

        let embedder = CachingEmbedder::new(self.embedder.as_ref());
        let extracted_count = extracted.candidates.len();
        let merged = CandidateMerger::new(self.config.similarity_threshold, &embedder)
            .merge(extracted.candidates)?;
        let merged_count = merged.len();
        cancel.checkpoint("merge")?;

        let outcome = EvidenceLinker::new(&self.config, &embedder).link(&corpus, merged)?;
        cancel.checkpoint("evidence")?;
        if outcome.linked.is_empty() {
            return Err(ConceptError::InsufficientData(format!(
                "none of {} candidates has supporting evidence",
                merged_count
            )));
        }

        let concepts = outcome.linked;
        let embeddings: Vec<_> = concepts.iter().map(|c| c.candidate.embedding.clone()).collect();
        let keys: Vec<BTreeSet<String>> = concepts.iter().map(|c| c.candidate.member_keys.clone()).collect();
        let hyponyms = resolve_hyponyms(&extracted.hyponyms, &keys);
        let tree = ClusterBuilder::new(&self.config).build(&embeddings, &hyponyms)?;
        cancel.checkpoint("clustering")?;

        let mut skipped = corpus.skipped().to_vec();
        skipped.extend(extracted.skipped);
        let summary = RunSummary {
            papers: PaperCounts {
                submitted: corpus.submitted(),
                processed: corpus.len(),
                skipped: corpus.skipped().len(),
            },
            skipped,
            candidates: CandidateCounts {
                extracted: extracted_count,
                merged: merged_count,
                linked: concepts.len(),
                rejected: outcome.rejected.len(),
            },
            embedding_model: self.embedder.model_id().to_string(),
            random_seed: self.embedder.seed(),
            generated_at: self.generated_at.unwrap_or_else(Utc::now),
        };
        let hierarchy = HierarchyAssembler::new(&self.config).assemble(concepts, &tree, summary)?;
        cancel.checkpoint("assembly")?;

        tracing::info!(
            concepts = hierarchy.len(),
            levels = hierarchy.depth(),
            embedded = embedder.cached(),
            "pipeline finished"
        );
        Ok(hierarchy)
    }

    /// Run every extractor on its own blocking task and join the outputs in
    /// registration order.
    async fn extract(&self, corpus: Arc<Corpus>) -> ConceptResult<ExtractionOutput> {
        let handles: Vec<_> = self
            .registry
            .extractors()
            .iter()
            .map(|extractor| {
                let extractor = Arc::clone(extractor);
                let corpus = Arc::clone(&corpus);
                tokio::task::spawn_blocking(move || extractor.extract(&corpus))
            })
            .collect();

        let mut output = ExtractionOutput::new();
        for (handle, extractor) in handles.into_iter().zip(self.registry.extractors()) {
            let part = handle.await.map_err(|e| {
                ConceptError::Internal(format!("extractor '{}' failed: {}", extractor.name(), e))
            })?;
            tracing::debug!(
                extractor = extractor.name(),
                candidates = part.candidates.len(),
                hyponyms = part.hyponyms.len(),
                skipped = part.skipped.len(),
                "extractor finished"
            );
            output.extend(part);
        }

        tracing::info!(
            candidates = output.candidates.len(),
            hyponyms = output.hyponyms.len(),
            "candidates extracted"
        );
        Ok(output)
    }
}
