//! Evidence linker
//!
//! Grounds each merged candidate in sentences of its source papers. A
//! literal occurrence of the label (or another surface form) is the floor;
//! otherwise a sentence qualifies when one of its word windows is close
//! enough to the label embedding. Candidates with no evidence are rejected.

use super::scoring::{score_confidence, MatchKind};
use super::sentence::EvidenceSentence;
use crate::config::PipelineConfig;
use crate::corpus::segment::tokenize;
use crate::corpus::{Corpus, Sentence};
use crate::embedding::{embed_all, Embedder};
use crate::error::ConceptResult;
use crate::merge::MergedCandidate;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A candidate with its supporting evidence
#[derive(Debug, Clone)]
pub struct LinkedConcept {
    pub candidate: MergedCandidate,
    /// Highest confidence first
    pub evidence: Vec<EvidenceSentence>,
    /// Mean evidence confidence scaled to [0, 1]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LinkOutcome {
    pub linked: Vec<LinkedConcept>,
    /// Labels of candidates rejected for lack of evidence
    pub rejected: Vec<String>,
}

pub struct EvidenceLinker<'a> {
    config: &'a PipelineConfig,
    embedder: &'a dyn Embedder,
}

impl<'a> EvidenceLinker<'a> {
    pub fn new(config: &'a PipelineConfig, embedder: &'a dyn Embedder) -> Self {
        Self { config, embedder }
    }

    pub fn link(&self, corpus: &Corpus, candidates: Vec<MergedCandidate>) -> ConceptResult<LinkOutcome> {
        let paper_order: HashMap<_, _> = corpus
            .papers()
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        let mut outcome = LinkOutcome::default();
        for candidate in candidates {
            let mut found: Vec<(usize, EvidenceSentence)> = Vec::new();

            for paper_id in &candidate.papers {
                let Some(paper) = corpus.get(paper_id) else {
                    continue;
                };
                let order = paper_order.get(paper_id).copied().unwrap_or(usize::MAX);
                for sentence in &paper.sentences {
                    if let Some(kind) = self.match_sentence(&candidate, sentence)? {
                        let strength = kind.strength(&self.config.scoring);
                        let confidence = score_confidence(
                            strength,
                            candidate.strategy_count(),
                            &self.config.scoring,
                        );
                        let evidence = EvidenceSentence::new(
                            &sentence.text,
                            confidence,
                            paper.id.clone(),
                            sentence.offset,
                        )?;
                        found.push((order, evidence));
                    }
                }
            }

            if found.is_empty() {
                tracing::debug!(label = %candidate.label, "rejected: no evidence");
                outcome.rejected.push(candidate.label);
                continue;
            }

            found.sort_by(|(pa, a), (pb, b)| {
                b.confidence()
                    .partial_cmp(&a.confidence())
                    .unwrap_or(Ordering::Equal)
                    .then(pa.cmp(pb))
                    .then(a.offset().cmp(&b.offset()))
            });
            found.truncate(self.config.scoring.max_evidence_per_concept);
            let evidence: Vec<EvidenceSentence> = found.into_iter().map(|(_, e)| e).collect();
            let confidence = concept_confidence(&evidence);

            outcome.linked.push(LinkedConcept {
                candidate,
                evidence,
                confidence,
            });
        }

        tracing::info!(
            linked = outcome.linked.len(),
            rejected = outcome.rejected.len(),
            "evidence linked"
        );
        Ok(outcome)
    }

    /// Exact match first, then the best paraphrase window
    fn match_sentence(&self, candidate: &MergedCandidate, sentence: &Sentence) -> ConceptResult<Option<MatchKind>> {
        let tokens: Vec<&str> = sentence.tokens.iter().map(|t| t.lower.as_str()).collect();
        for form in candidate.surface_forms() {
            let needle: Vec<String> = tokenize(form).into_iter().map(|t| t.lower).collect();
            if contains_run(&tokens, &needle) {
                return Ok(Some(MatchKind::Exact));
            }
        }

        let words: Vec<&str> = sentence.words().map(|t| t.lower.as_str()).collect();
        let n = candidate.key.split_whitespace().count().max(1);
        let mut windows: Vec<String> = Vec::new();
        for size in n.saturating_sub(1).max(1)..=n + 1 {
            for window in words.windows(size) {
                windows.push(window.join(" "));
            }
        }
        if windows.is_empty() {
            return Ok(None);
        }

        let texts: Vec<&str> = windows.iter().map(String::as_str).collect();
        let vectors = embed_all(self.embedder, &texts)?;
        let mut best = f64::NEG_INFINITY;
        for v in &vectors {
            best = best.max(candidate.embedding.cosine_similarity(v)?);
        }

        if best >= self.config.evidence_threshold {
            Ok(Some(MatchKind::Paraphrase { similarity: best }))
        } else {
            Ok(None)
        }
    }
}

/// Word-bounded, case-insensitive occurrence of `needle` in `haystack`
fn contains_run(haystack: &[&str], needle: &[String]) -> bool {
    !needle.is_empty()
        && haystack
            .windows(needle.len())
            .any(|w| w.iter().zip(needle).all(|(a, b)| *a == b.as_str()))
}

/// Mean evidence confidence mapped from [0, 100] to [0, 1]
pub fn concept_confidence(evidence: &[EvidenceSentence]) -> f64 {
    if evidence.is_empty() {
        return 0.0;
    }
    let mean = evidence.iter().map(|e| e.confidence()).sum::<f64>() / evidence.len() as f64;
    (mean / 100.0).clamp(0.0, 1.0)
}
