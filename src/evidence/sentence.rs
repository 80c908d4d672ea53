//! Evidence sentences

use crate::corpus::segment::MIN_SENTENCE_CHARS;
use crate::corpus::PaperId;
use crate::error::{ConceptError, ConceptResult};
use serde::Serialize;

/// A literal source sentence supporting a concept.
///
/// Immutable once built. Equality compares text, confidence and offset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSentence {
    text: String,
    confidence: f64,
    paper_id: PaperId,
    offset: usize,
}

impl EvidenceSentence {
    /// Build evidence, trimming the text and clamping confidence to [0, 100].
    pub fn new(
        text: &str,
        confidence: f64,
        paper_id: PaperId,
        offset: usize,
    ) -> ConceptResult<Self> {
        let text = text.trim();
        if text.chars().count() < MIN_SENTENCE_CHARS {
            return Err(ConceptError::InvalidEvidence(format!(
                "text shorter than {} characters: {:?}",
                MIN_SENTENCE_CHARS, text
            )));
        }
        if confidence.is_nan() {
            return Err(ConceptError::InvalidEvidence(
                "confidence is not a number".to_string(),
            ));
        }
        Ok(Self {
            text: text.to_string(),
            confidence: confidence.clamp(0.0, 100.0),
            paper_id,
            offset,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// In [0, 100]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn paper_id(&self) -> &PaperId {
        &self.paper_id
    }

    /// Character offset into the paper's document text
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl PartialEq for EvidenceSentence {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.confidence == other.confidence && self.offset == other.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_clamps() {
        let e = EvidenceSentence::new("  A sentence of evidence.  ", 140.0, PaperId::new("p"), 3).unwrap();
        assert_eq!(e.text(), "A sentence of evidence.");
        assert_eq!(e.confidence(), 100.0);

        let e = EvidenceSentence::new("A sentence of evidence.", -2.0, PaperId::new("p"), 3).unwrap();
        assert_eq!(e.confidence(), 0.0);
    }

    #[test]
    fn test_rejects_short_text_and_nan() {
        assert!(matches!(
            EvidenceSentence::new("   tiny   ", 50.0, PaperId::new("p"), 0),
            Err(ConceptError::InvalidEvidence(_))
        ));
        assert!(EvidenceSentence::new("Long enough sentence.", f64::NAN, PaperId::new("p"), 0).is_err());
    }

    #[test]
    fn test_equality_ignores_paper() {
        let a = EvidenceSentence::new("Shared sentence text.", 90.0, PaperId::new("p1"), 10).unwrap();
        let b = EvidenceSentence::new("Shared sentence text.", 90.0, PaperId::new("p2"), 10).unwrap();
        let c = EvidenceSentence::new("Shared sentence text.", 90.0, PaperId::new("p1"), 11).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
