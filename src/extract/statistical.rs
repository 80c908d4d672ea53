//! Statistical extraction: TF-IDF across the corpus blended with TextRank
//!
//! Candidate phrases are the n-grams inside noun-phrase chunks. TF-IDF uses
//! the smoothed idf `ln((1 + N) / (1 + df)) + 1`; TextRank runs over a petgraph
//! word co-occurrence graph per paper and a phrase ranks as the mean of its
//! words. Both signals are normalized per paper before blending.

use super::chunk::{chunk_ranges, is_content_word, ngram_phrases, Phrase};
use super::{normalize_scores, CandidateExtractor, ConceptCandidate, ExtractionMethod, ExtractionOutput};
use crate::config::ExtractionConfig;
use crate::corpus::{Corpus, PreparedPaper};
use rustworkx_core::centrality::katz_centrality;
use rustworkx_core::petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;

const RANK_TOLERANCE: f64 = 1e-6;

pub struct StatisticalExtractor {
    config: ExtractionConfig,
}

impl StatisticalExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// TextRank score per content word, normalized so the best word is 1.0.
    ///
    /// Each co-occurrence edge is weighted by its share of the source word's
    /// total weight. Katz centrality with `alpha = damping` and
    /// `beta = 1 - damping` over that graph is the weighted TextRank
    /// recurrence.
    pub fn word_ranks(&self, paper: &PreparedPaper) -> HashMap<String, f64> {
        let window = self.config.textrank_window.max(2);
        let mut edges: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();

        for sentence in &paper.sentences {
            let words: Vec<&str> = chunk_ranges(sentence)
                .into_iter()
                .flat_map(|r| sentence.tokens[r].iter())
                .filter(|t| is_content_word(t))
                .map(|t| t.lower.as_str())
                .collect();
            for (i, a) in words.iter().enumerate() {
                edges.entry(*a).or_default();
                for b in words.iter().skip(i + 1).take(window - 1) {
                    if a == b {
                        continue;
                    }
                    *edges.entry(*a).or_default().entry(*b).or_insert(0.0) += 1.0;
                    *edges.entry(*b).or_default().entry(*a).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut graph: DiGraph<&str, f64> = DiGraph::with_capacity(edges.len(), 0);
        let index: HashMap<&str, NodeIndex> = edges.keys().map(|w| (*w, graph.add_node(*w))).collect();
        for (word, adjacent) in &edges {
            let total: f64 = adjacent.values().sum();
            for (other, weight) in adjacent {
                graph.add_edge(index[word], index[other], weight / total);
            }
        }

        let damping = self.config.textrank_damping;
        let centrality = katz_centrality(
            &graph,
            |e| Ok::<f64, Infallible>(*e.weight()),
            Some(damping),
            None,
            Some(1.0 - damping),
            Some(self.config.textrank_iterations),
            Some(RANK_TOLERANCE),
        )
        .unwrap_or(None);

        let mut scores: Vec<f64> = match centrality {
            Some(scores) => scores,
            None => {
                tracing::debug!(words = graph.node_count(), "textrank did not converge, using degree");
                graph
                    .node_indices()
                    .map(|n| graph.edges(n).count() as f64)
                    .collect()
            }
        };
        normalize_scores(&mut scores);

        graph
            .node_indices()
            .map(|n| (graph[n].to_string(), scores[n.index()]))
            .collect()
    }

    fn score_paper(
        &self,
        phrases: &[Phrase],
        ranks: &HashMap<String, f64>,
        df: &HashMap<String, usize>,
        papers: usize,
    ) -> Vec<f64> {
        let mut tfidf: Vec<f64> = phrases
            .iter()
            .map(|p| {
                let df = df.get(&p.key).copied().unwrap_or(1) as f64;
                let idf = ((1.0 + papers as f64) / (1.0 + df)).ln() + 1.0;
                p.count as f64 * idf
            })
            .collect();
        normalize_scores(&mut tfidf);

        let weight = self.config.tfidf_weight;
        phrases
            .iter()
            .zip(tfidf)
            .map(|(p, tfidf)| {
                let rank = p
                    .words
                    .iter()
                    .map(|w| ranks.get(w).copied().unwrap_or(0.0))
                    .sum::<f64>()
                    / p.words.len().max(1) as f64;
                weight * tfidf + (1.0 - weight) * rank
            })
            .collect()
    }
}

impl CandidateExtractor for StatisticalExtractor {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Statistical
    }

    fn name(&self) -> &str {
        "statistical"
    }

    fn extract(&self, corpus: &Corpus) -> ExtractionOutput {
        let mut output = ExtractionOutput::new();
        let per_paper: Vec<Vec<Phrase>> = corpus
            .papers()
            .iter()
            .map(|p| ngram_phrases(p, self.config.max_phrase_tokens))
            .collect();

        let mut df: HashMap<String, usize> = HashMap::new();
        for phrases in &per_paper {
            for p in phrases {
                *df.entry(p.key.clone()).or_insert(0) += 1;
            }
        }

        for (paper, phrases) in corpus.papers().iter().zip(&per_paper) {
            let ranks = self.word_ranks(paper);
            let scores = self.score_paper(phrases, &ranks, &df, corpus.len());

            let mut order: Vec<usize> = (0..phrases.len()).collect();
            order.sort_by(|&a, &b| {
                scores[b]
                    .total_cmp(&scores[a])
                    .then_with(|| phrases[a].key.cmp(&phrases[b].key))
            });
            order.truncate(self.config.max_candidates_per_paper);

            let mut top: Vec<f64> = order.iter().map(|&i| scores[i]).collect();
            normalize_scores(&mut top);

            for (&i, score) in order.iter().zip(top) {
                output.candidates.push(ConceptCandidate::new(
                    phrases[i].surface.clone(),
                    ExtractionMethod::Statistical,
                    paper.id.clone(),
                    score,
                    phrases[i].count,
                ));
            }
        }

        tracing::debug!(
            extractor = self.name(),
            candidates = output.candidates.len(),
            "extraction finished"
        );
        output
    }
}
