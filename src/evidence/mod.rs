//! Evidence grounding: sentences, confidence scoring and linking

mod linker;
mod scoring;
mod sentence;

pub use linker::{concept_confidence, EvidenceLinker, LinkOutcome, LinkedConcept};
pub use scoring::{score_confidence, MatchKind};
pub use sentence::EvidenceSentence;
