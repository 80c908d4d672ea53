//! Rule-based extraction: noun-phrase chunks and Hearst patterns
//!
//! Deterministic and free of randomness. Besides candidates it proposes
//! explicit hypernym/hyponym pairs from cue phrases:
//!
//! - `X(,) such as Y1, Y2 and Yn`
//! - `X(,) including …`, `X(,) especially …`, `X(,) particularly …`
//! - `Y1, Y2 and/or other X`

use super::chunk::{chunk_phrases, chunk_ranges, head_final, is_viable, phrase_surface};
use super::{normalize_scores, CandidateExtractor, ConceptCandidate, ExtractionMethod, ExtractionOutput, HyponymPair};
use crate::config::ExtractionConfig;
use crate::corpus::{Corpus, Sentence, Token};
use std::collections::HashSet;
use std::ops::Range;

pub struct RuleBasedExtractor {
    config: ExtractionConfig,
}

impl RuleBasedExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Hypernym/hyponym surface pairs asserted in one sentence
    pub fn hearst_pairs(&self, sentence: &Sentence) -> Vec<(String, String)> {
        let cues = Cues {
            tokens: &sentence.tokens,
            ranges: chunk_ranges(sentence),
            max_tokens: self.config.max_phrase_tokens,
        };
        let mut pairs = Vec::new();

        for i in 0..cues.tokens.len() {
            let cue_end = match cues.lower(i) {
                Some("such") if cues.lower(i + 1) == Some("as") => Some(i + 2),
                Some("including") | Some("especially") | Some("particularly") => Some(i + 1),
                _ => None,
            };
            if let Some(cue_end) = cue_end {
                let before = if i > 0 && cues.lower(i - 1) == Some(",") {
                    i - 1
                } else {
                    i
                };
                if let Some(parent) = cues.ending_at(before).and_then(|r| cues.phrase(r)) {
                    for child in cues.list_forward(cue_end) {
                        pairs.push((parent.clone(), child));
                    }
                }
            }

            if cues.lower(i) == Some("other")
                && i > 0
                && matches!(cues.lower(i - 1), Some("and") | Some("or"))
            {
                if let Some(parent) = cues.starting_at(i + 1).and_then(|r| cues.phrase(r)) {
                    for child in cues.list_backward(i - 1) {
                        pairs.push((parent.clone(), child));
                    }
                }
            }
        }

        pairs.retain(|(parent, child)| parent.to_lowercase() != child.to_lowercase());
        pairs
    }
}

struct Cues<'a> {
    tokens: &'a [Token],
    ranges: Vec<Range<usize>>,
    max_tokens: usize,
}

impl Cues<'_> {
    fn lower(&self, i: usize) -> Option<&str> {
        self.tokens.get(i).map(|t| t.lower.as_str())
    }

    fn ending_at(&self, end: usize) -> Option<Range<usize>> {
        self.ranges.iter().find(|r| r.end == end).cloned()
    }

    fn starting_at(&self, start: usize) -> Option<Range<usize>> {
        self.ranges.iter().find(|r| r.start == start).cloned()
    }

    fn phrase(&self, range: Range<usize>) -> Option<String> {
        let tokens = &self.tokens[head_final(range, self.max_tokens)];
        is_viable(tokens).then(|| phrase_surface(tokens))
    }

    /// `Y1, Y2, and Yn` starting at token `k`
    fn list_forward(&self, mut k: usize) -> Vec<String> {
        let mut items = Vec::new();
        while let Some(range) = self.starting_at(k) {
            k = range.end;
            items.extend(self.phrase(range));

            let mut next = k;
            if self.lower(next) == Some(",") {
                next += 1;
            }
            match self.lower(next) {
                Some("and") | Some("or") => {
                    if let Some(last) = self.starting_at(next + 1) {
                        items.extend(self.phrase(last));
                    }
                    break;
                }
                _ if next > k => k = next,
                _ => break,
            }
        }
        items
    }

    /// `Y1, Y2(,)` ending just before the conjunction at `conj`
    fn list_backward(&self, conj: usize) -> Vec<String> {
        let mut items = Vec::new();
        let mut end = conj;
        if end > 0 && self.lower(end - 1) == Some(",") {
            end -= 1;
        }
        while let Some(range) = self.ending_at(end) {
            let start = range.start;
            items.extend(self.phrase(range));
            if start > 0 && self.lower(start - 1) == Some(",") {
                end = start - 1;
            } else {
                break;
            }
        }
        items.reverse();
        items
    }
}

impl CandidateExtractor for RuleBasedExtractor {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::RuleBased
    }

    fn name(&self) -> &str {
        "rule-based"
    }

    fn extract(&self, corpus: &Corpus) -> ExtractionOutput {
        let mut output = ExtractionOutput::new();

        for paper in corpus.papers() {
            let phrases = chunk_phrases(paper, self.config.max_phrase_tokens);

            let mut asserted: HashSet<String> = HashSet::new();
            for sentence in &paper.sentences {
                for (parent, child) in self.hearst_pairs(sentence) {
                    asserted.insert(parent.to_lowercase());
                    asserted.insert(child.to_lowercase());
                    output.hyponyms.push(HyponymPair {
                        parent,
                        child,
                        paper: paper.id.clone(),
                    });
                }
            }

            // Most frequent chunks, plus every phrase named in a pair
            let mut ranked: Vec<usize> = (0..phrases.len()).collect();
            ranked.sort_by(|&a, &b| phrases[b].count.cmp(&phrases[a].count).then(a.cmp(&b)));
            let mut keep: Vec<usize> = ranked
                .into_iter()
                .enumerate()
                .filter(|(rank, i)| {
                    *rank < self.config.max_candidates_per_paper
                        || asserted.contains(&phrases[*i].key)
                })
                .map(|(_, i)| i)
                .collect();
            keep.sort_unstable();

            let mut scores: Vec<f64> = keep.iter().map(|&i| phrases[i].count as f64).collect();
            normalize_scores(&mut scores);

            for (&i, score) in keep.iter().zip(scores) {
                output.candidates.push(ConceptCandidate::new(
                    phrases[i].surface.clone(),
                    ExtractionMethod::RuleBased,
                    paper.id.clone(),
                    score,
                    phrases[i].count,
                ));
            }
        }

        tracing::debug!(
            extractor = self.name(),
            candidates = output.candidates.len(),
            hyponyms = output.hyponyms.len(),
            "extraction finished"
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Paper;

    fn extractor() -> RuleBasedExtractor {
        RuleBasedExtractor::new(ExtractionConfig::default())
    }

    fn pairs(text: &str) -> Vec<(String, String)> {
        extractor().hearst_pairs(&Sentence::new(text.to_string(), 0))
    }

    fn pair(parent: &str, child: &str) -> (String, String) {
        (parent.to_string(), child.to_string())
    }

    #[test]
    fn test_such_as_pattern() {
        assert_eq!(
            pairs("Post-quantum cryptography, such as lattice-based cryptography and code-based cryptography, is studied."),
            vec![
                pair("post-quantum cryptography", "lattice-based cryptography"),
                pair("post-quantum cryptography", "code-based cryptography"),
            ]
        );
    }

    #[test]
    fn test_including_with_serial_list() {
        assert_eq!(
            pairs("We compare signature schemes including Falcon, Dilithium, and SPHINCS."),
            vec![
                pair("signature schemes", "Falcon"),
                pair("signature schemes", "Dilithium"),
                pair("signature schemes", "SPHINCS"),
            ]
        );
    }

    #[test]
    fn test_and_other_pattern() {
        assert_eq!(
            pairs("Hash functions, block ciphers and other primitives are standard."),
            vec![
                pair("primitives", "hash functions"),
                pair("primitives", "block ciphers"),
            ]
        );
    }

    #[test]
    fn test_no_cue_no_pairs() {
        assert!(pairs("Lattice-based cryptography resists quantum attacks.").is_empty());
    }

    #[test]
    fn test_extract_emits_candidates_and_pairs() {
        let text = "Neural networks, such as convolutional networks and recurrent networks, are widely used. \
                    Convolutional networks dominate image tasks in many benchmarks. \
                    Recurrent networks model sequences and remain popular for speech recognition.";
        let corpus = Corpus::prepare(
            &[Paper::new("p1", "Nets").with_abstract(text)],
            &ExtractionConfig::default(),
        )
        .unwrap();

        let output = extractor().extract(&corpus);
        assert_eq!(output.hyponyms.len(), 2);
        assert_eq!(output.hyponyms[0].parent, "neural networks");

        let surfaces: Vec<&str> = output.candidates.iter().map(|c| c.surface.as_str()).collect();
        assert!(surfaces.contains(&"neural networks"));
        assert!(surfaces.contains(&"convolutional networks"));
        assert!(output
            .candidates
            .iter()
            .all(|c| c.method == ExtractionMethod::RuleBased && c.score > 0.0 && c.score <= 1.0));
    }
}
