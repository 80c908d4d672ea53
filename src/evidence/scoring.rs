//! Evidence confidence scoring

use crate::config::ConfidenceWeights;

/// How a sentence matched a concept label
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    /// Case-insensitive, word-bounded literal occurrence
    Exact,
    /// Embedding similarity of a sentence window to the label
    Paraphrase { similarity: f64 },
}

impl MatchKind {
    /// Lexical match strength in [0, 1]
    pub fn strength(&self, weights: &ConfidenceWeights) -> f64 {
        match self {
            MatchKind::Exact => 1.0,
            MatchKind::Paraphrase { similarity } => {
                (weights.paraphrase_scale * similarity).clamp(0.0, 1.0)
            }
        }
    }
}

/// Blend match strength with corroborating-strategy count into [0, 100].
///
/// `100 * (lw * strength + cw * min(s, sat) / sat) / (lw + cw)`
pub fn score_confidence(strength: f64, strategies: usize, weights: &ConfidenceWeights) -> f64 {
    let saturation = weights.saturation_strategies.max(1);
    let corroboration = strategies.min(saturation) as f64 / saturation as f64;
    let total = weights.lexical_weight + weights.corroboration_weight;
    if total <= 0.0 {
        return 0.0;
    }
    let blended = (weights.lexical_weight * strength.clamp(0.0, 1.0)
        + weights.corroboration_weight * corroboration)
        / total;
    (100.0 * blended).clamp(0.0, 100.0)
}
