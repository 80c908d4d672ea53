//! Read-only paper corpus shared by every stage
//!
//! `Corpus::prepare` is the first stage of a run: it checks eligibility,
//! builds each paper's document text and segments it into sentences.
//! Papers that cannot be processed are skipped and recorded, never fatal on
//! their own.

pub mod lexicon;
mod paper;
pub mod segment;

pub use paper::{Paper, PaperId};
pub use segment::{Sentence, Token, TokenKind};

use crate::config::ExtractionConfig;
use crate::error::{ConceptError, ConceptResult};
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::HashSet;

/// A paper excluded from (part of) a run
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkippedPaper {
    pub paper_id: PaperId,
    /// Stage or extractor that skipped it
    pub stage: String,
    pub reason: String,
}

impl SkippedPaper {
    /// Create the record and emit the `extraction skipped` event.
    pub fn record(paper_id: &PaperId, stage: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::warn!(paper = %paper_id, stage, reason = %reason, "extraction skipped");
        Self {
            paper_id: paper_id.clone(),
            stage: stage.to_string(),
            reason,
        }
    }
}

/// A paper ready for extraction
#[derive(Debug, Clone)]
pub struct PreparedPaper {
    pub id: PaperId,
    pub title: String,
    /// Abstract and full text; evidence offsets index into this
    pub text: String,
    pub sentences: Vec<Sentence>,
}

/// The processable papers of one run, in input order
#[derive(Debug, Clone)]
pub struct Corpus {
    papers: Vec<PreparedPaper>,
    skipped: Vec<SkippedPaper>,
    submitted: usize,
}

impl Corpus {
    /// Prepare papers for extraction.
    ///
    /// Fails with `InsufficientData` when no paper is supplied or every paper
    /// is skipped.
    pub fn prepare(papers: &[Paper], config: &ExtractionConfig) -> ConceptResult<Self> {
        if papers.is_empty() {
            return Err(ConceptError::InsufficientData(
                "no papers supplied".to_string(),
            ));
        }

        let mut prepared = Vec::with_capacity(papers.len());
        let mut skipped = Vec::new();
        let mut seen: HashSet<&PaperId> = HashSet::new();

        for paper in papers {
            if !seen.insert(&paper.id) {
                skipped.push(SkippedPaper::record(&paper.id, "corpus", "duplicate paper id"));
                continue;
            }
            if !paper.is_eligible(config.min_document_chars) {
                skipped.push(SkippedPaper::record(
                    &paper.id,
                    "corpus",
                    format!(
                        "no abstract or full text with at least {} characters",
                        config.min_document_chars
                    ),
                ));
                continue;
            }

            let text = paper.document_text();
            let located = paper
                .sentences
                .as_deref()
                .and_then(|provided| segment::locate_sentences(&text, provided));
            let sentences = match located {
                Some(s) if !s.is_empty() => s,
                _ => {
                    if paper.sentences.is_some() {
                        tracing::debug!(paper = %paper.id, "provided sentences not found in text, re-segmenting");
                    }
                    segment::split_sentences(&text)
                }
            };
            if sentences.is_empty() {
                skipped.push(SkippedPaper::record(
                    &paper.id,
                    "corpus",
                    "segmentation produced no sentences",
                ));
                continue;
            }

            prepared.push(PreparedPaper {
                id: paper.id.clone(),
                title: paper.title.clone(),
                text,
                sentences,
            });
        }

        if prepared.is_empty() {
            return Err(ConceptError::InsufficientData(format!(
                "all {} papers were skipped",
                papers.len()
            )));
        }

        tracing::info!(
            papers = prepared.len(),
            skipped = skipped.len(),
            "corpus prepared"
        );

        Ok(Self {
            papers: prepared,
            skipped,
            submitted: papers.len(),
        })
    }

    pub fn papers(&self) -> &[PreparedPaper] {
        &self.papers
    }

    pub fn get(&self, id: &PaperId) -> Option<&PreparedPaper> {
        self.papers.iter().find(|p| &p.id == id)
    }

    /// Papers skipped during preparation
    pub fn skipped(&self) -> &[SkippedPaper] {
        &self.skipped
    }

    /// Papers supplied to the run, including skipped ones
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(seed: &str) -> String {
        format!(
            "{0} is studied in depth throughout this paper and its appendix. \
             We evaluate {0} on several public benchmarks drawn from prior work. \
             The results show that {0} performs well across many different settings, \
             workloads and threat models in practice.",
            seed
        )
    }

    fn config() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    #[test]
    fn test_prepares_eligible_papers() {
        let papers = vec![
            Paper::new("p1", "One").with_abstract(long_text("Lattice cryptography")),
            Paper::new("p2", "Two").with_full_text(long_text("Code-based cryptography")),
        ];
        let corpus = Corpus::prepare(&papers, &config()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.submitted(), 2);
        assert!(corpus.skipped().is_empty());
        assert_eq!(corpus.papers()[0].sentences.len(), 3);
    }

    #[test]
    fn test_skips_short_and_duplicate_papers() {
        let papers = vec![
            Paper::new("p1", "One").with_abstract(long_text("Hash signatures")),
            Paper::new("p2", "Short").with_abstract("Too short to use."),
            Paper::new("p1", "Dup").with_abstract(long_text("Isogenies")),
        ];
        let corpus = Corpus::prepare(&papers, &config()).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.skipped().len(), 2);
        assert_eq!(corpus.skipped()[0].paper_id.as_str(), "p2");
        assert_eq!(corpus.skipped()[1].reason, "duplicate paper id");
    }

    #[test]
    fn test_all_skipped_is_insufficient_data() {
        let papers = vec![Paper::new("p1", "One").with_abstract("short")];
        assert!(matches!(
            Corpus::prepare(&papers, &config()),
            Err(ConceptError::InsufficientData(_))
        ));
        assert!(matches!(
            Corpus::prepare(&[], &config()),
            Err(ConceptError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_uses_provided_sentences_when_locatable() {
        let text = long_text("Multivariate cryptography");
        let first =
            "Multivariate cryptography is studied in depth throughout this paper and its appendix."
                .to_string();
        let paper = Paper::new("p1", "One")
            .with_abstract(text.clone())
            .with_sentences(vec![first.clone()]);
        let corpus = Corpus::prepare(&[paper], &config()).unwrap();
        let prepared = &corpus.papers()[0];
        assert_eq!(prepared.sentences.len(), 1);
        assert_eq!(prepared.sentences[0].text, first);

        let stray = Paper::new("p2", "Two")
            .with_abstract(text)
            .with_sentences(vec!["This sentence is nowhere in the text.".into()]);
        let corpus = Corpus::prepare(&[stray], &config()).unwrap();
        assert_eq!(corpus.papers()[0].sentences.len(), 3);
    }
}
