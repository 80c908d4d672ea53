//! Embedding-based extraction: salient windows grouped into synonym sets
//!
//! Every head-final n-gram window of a chunk is embedded alongside the paper's
//! document text. Windows are ranked by cosine similarity to the paper and
//! grouped greedily: a window joins the first group whose leader it matches
//! at or above the consolidation threshold. Leaders become candidates and
//! their group members become synonyms, so this strategy adds synonym sets
//! rather than new phrases.

use super::chunk::ngram_phrases;
use super::{normalize_scores, CandidateExtractor, ConceptCandidate, ExtractionMethod, ExtractionOutput};
use crate::config::ExtractionConfig;
use crate::corpus::{Corpus, PreparedPaper, SkippedPaper};
use crate::embedding::{embed_all, Embedder, EmbeddingError};
use crate::error::{ConceptError, ConceptResult};
use std::sync::Arc;

pub struct EmbeddingExtractor {
    config: ExtractionConfig,
    similarity_threshold: f64,
    embedder: Arc<dyn Embedder>,
}

struct Group {
    leader: usize,
    members: Vec<usize>,
}

impl EmbeddingExtractor {
    pub fn new(config: ExtractionConfig, similarity_threshold: f64, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            config,
            similarity_threshold,
            embedder,
        }
    }

    fn extract_paper(&self, paper: &PreparedPaper) -> ConceptResult<Vec<ConceptCandidate>> {
        let phrases = ngram_phrases(paper, self.config.max_phrase_tokens);
        if phrases.is_empty() {
            return Ok(Vec::new());
        }

        let mut texts: Vec<&str> = Vec::with_capacity(phrases.len() + 1);
        texts.push(paper.text.as_str());
        texts.extend(phrases.iter().map(|p| p.key.as_str()));
        let vectors = embed_all(self.embedder.as_ref(), &texts)?;
        let (document, windows) = vectors
            .split_first()
            .ok_or(ConceptError::Embedding(EmbeddingError::EmptyResult))?;

        let similarity = windows
            .iter()
            .map(|w| w.cosine_similarity(document))
            .collect::<ConceptResult<Vec<f64>>>()?;

        let mut order: Vec<usize> = (0..phrases.len()).collect();
        order.sort_by(|&a, &b| {
            similarity[b]
                .total_cmp(&similarity[a])
                .then_with(|| phrases[a].key.cmp(&phrases[b].key))
        });

        let mut groups: Vec<Group> = Vec::new();
        'windows: for i in order {
            for group in groups.iter_mut() {
                if windows[i].cosine_similarity(&windows[group.leader])? >= self.similarity_threshold {
                    group.members.push(i);
                    continue 'windows;
                }
            }
            if groups.len() < self.config.max_candidates_per_paper {
                groups.push(Group {
                    leader: i,
                    members: Vec::new(),
                });
            }
        }

        // Shift cosine from [-1, 1] into [0, 1] before normalizing
        let mut scores: Vec<f64> = groups
            .iter()
            .map(|g| (similarity[g.leader] + 1.0) / 2.0)
            .collect();
        normalize_scores(&mut scores);

        Ok(groups
            .iter()
            .zip(scores)
            .map(|(group, score)| {
                let leader = &phrases[group.leader];
                ConceptCandidate::new(
                    leader.surface.clone(),
                    ExtractionMethod::EmbeddingBased,
                    paper.id.clone(),
                    score,
                    leader.count,
                )
                .with_synonyms(
                    group
                        .members
                        .iter()
                        .map(|&m| phrases[m].surface.clone())
                        .collect(),
                )
            })
            .collect())
    }
}

impl CandidateExtractor for EmbeddingExtractor {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::EmbeddingBased
    }

    fn name(&self) -> &str {
        "embedding-based"
    }

    fn extract(&self, corpus: &Corpus) -> ExtractionOutput {
        let mut output = ExtractionOutput::new();
        for paper in corpus.papers() {
            match self.extract_paper(paper) {
                Ok(candidates) => output.candidates.extend(candidates),
                Err(e) => output
                    .skipped
                    .push(SkippedPaper::record(&paper.id, self.name(), e.to_string())),
            }
        }

        tracing::debug!(
            extractor = self.name(),
            candidates = output.candidates.len(),
            synonyms = output.candidates.iter().map(|c| c.synonyms.len()).sum::<usize>(),
            "extraction finished"
        );
        output
    }
}
