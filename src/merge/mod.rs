//! Candidate merger and deduplicator
//!
//! Consolidates the concatenated output of every extractor into unique
//! concept candidates. Candidates are keyed by their normalized label; keys
//! are then unioned when the embedding strategy named one a synonym of
//! another, or when their embeddings reach the consolidation threshold.
//! Provenance (methods, papers, surface forms) survives the merge because
//! evidence confidence depends on it.

use crate::corpus::lexicon;
use crate::corpus::PaperId;
use crate::embedding::{embed_all, Embedder, EmbeddingVector};
use crate::error::ConceptResult;
use crate::extract::{ConceptCandidate, ExtractionMethod};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Lowercase, trim non-word characters from each word's edges, collapse
/// whitespace and drop leading determiners.
pub fn normalize_label(surface: &str) -> String {
    let lowered = surface.to_lowercase();
    let mut words: Vec<&str> = lowered
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect();
    let leading = words
        .iter()
        .take_while(|w| lexicon::is_determiner(w))
        .count();
    words.drain(..leading);
    words.join(" ")
}

/// A deduplicated concept candidate with multi-strategy provenance
#[derive(Debug, Clone)]
pub struct MergedCandidate {
    /// Canonical surface form
    pub label: String,
    /// Normalized key of `label`
    pub key: String,
    pub methods: BTreeSet<ExtractionMethod>,
    pub papers: BTreeSet<PaperId>,
    /// Maximum raw score across contributing candidates
    pub score: f64,
    /// Occurrence totals per surface form
    pub surface_counts: BTreeMap<String, usize>,
    pub synonyms: BTreeSet<String>,
    /// Every normalized key folded into this candidate
    pub member_keys: BTreeSet<String>,
    /// Embedding of the canonical label
    pub embedding: EmbeddingVector,
}

impl MergedCandidate {
    /// Independent strategies that proposed this candidate
    pub fn strategy_count(&self) -> usize {
        self.methods.len()
    }

    /// The label, every other surface form, and every synonym
    pub fn surface_forms(&self) -> Vec<&str> {
        let mut forms: Vec<&str> = vec![self.label.as_str()];
        for form in self.surface_counts.keys().chain(self.synonyms.iter()) {
            if !forms.contains(&form.as_str()) {
                forms.push(form);
            }
        }
        forms
    }
}

/// Candidates sharing one normalized key
struct KeyGroup {
    key: String,
    surface_counts: BTreeMap<String, usize>,
    methods: BTreeSet<ExtractionMethod>,
    papers: BTreeSet<PaperId>,
    score: f64,
    synonyms: BTreeSet<String>,
}

/// Disjoint sets where the lowest index is always the root
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[child] = root;
        true
    }
}

pub struct CandidateMerger<'a> {
    similarity_threshold: f64,
    embedder: &'a dyn Embedder,
}

impl<'a> CandidateMerger<'a> {
    pub fn new(similarity_threshold: f64, embedder: &'a dyn Embedder) -> Self {
        Self {
            similarity_threshold,
            embedder,
        }
    }

    /// Merge candidates; output order follows first appearance.
    pub fn merge(&self, candidates: Vec<ConceptCandidate>) -> ConceptResult<Vec<MergedCandidate>> {
        let received = candidates.len();
        let mut groups: Vec<KeyGroup> = Vec::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();

        for candidate in candidates {
            let key = normalize_label(&candidate.surface);
            if key.is_empty() {
                tracing::debug!(surface = %candidate.surface, "dropping candidate with empty label");
                continue;
            }
            let index = *by_key.entry(key.clone()).or_insert_with(|| {
                groups.push(KeyGroup {
                    key,
                    surface_counts: BTreeMap::new(),
                    methods: BTreeSet::new(),
                    papers: BTreeSet::new(),
                    score: 0.0,
                    synonyms: BTreeSet::new(),
                });
                groups.len() - 1
            });
            let group = &mut groups[index];
            *group
                .surface_counts
                .entry(candidate.surface.clone())
                .or_insert(0) += candidate.occurrences.max(1);
            group.methods.insert(candidate.method);
            group.papers.extend(candidate.papers);
            group.score = group.score.max(candidate.score);
            group.synonyms.extend(candidate.synonyms);
        }

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        let vectors = embed_all(self.embedder, &keys)?;
        let mut sets = UnionFind::new(groups.len());

        for (i, group) in groups.iter().enumerate() {
            for synonym in &group.synonyms {
                if let Some(&j) = by_key.get(&normalize_label(synonym)) {
                    if sets.union(i, j) {
                        tracing::debug!(a = %group.key, b = %groups[j].key, "merged as synonyms");
                    }
                }
            }
        }
        for i in 0..groups.len() {
            for j in i + 1..groups.len() {
                if vectors[i].cosine_similarity(&vectors[j])? >= self.similarity_threshold
                    && sets.union(i, j)
                {
                    tracing::debug!(a = %groups[i].key, b = %groups[j].key, "merged by embedding similarity");
                }
            }
        }

        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..groups.len() {
            members.entry(sets.find(i)).or_default().push(i);
        }

        let merged: Vec<MergedCandidate> = members
            .into_values()
            .map(|indices| self.combine(&groups, &vectors, &indices))
            .collect();

        tracing::info!(received, merged = merged.len(), "candidates merged");
        Ok(merged)
    }

    fn combine(&self, groups: &[KeyGroup], vectors: &[EmbeddingVector], indices: &[usize]) -> MergedCandidate {
        let mut surface_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut methods = BTreeSet::new();
        let mut papers = BTreeSet::new();
        let mut synonyms = BTreeSet::new();
        let mut member_keys = BTreeSet::new();
        let mut score = 0.0f64;

        for &i in indices {
            let group = &groups[i];
            for (surface, count) in &group.surface_counts {
                *surface_counts.entry(surface.clone()).or_insert(0) += count;
            }
            methods.extend(group.methods.iter().copied());
            papers.extend(group.papers.iter().cloned());
            synonyms.extend(group.synonyms.iter().cloned());
            member_keys.insert(group.key.clone());
            score = score.max(group.score);
        }

        let label = canonical_label(&surface_counts);
        let key = normalize_label(&label);
        synonyms.retain(|s| !surface_counts.contains_key(s));

        // The label's own key is always one of the members
        let embedding = indices
            .iter()
            .find(|&&i| groups[i].key == key)
            .map(|&i| vectors[i].clone())
            .unwrap_or_else(|| vectors[indices[0]].clone());

        MergedCandidate {
            label,
            key,
            methods,
            papers,
            score,
            surface_counts,
            synonyms,
            member_keys,
            embedding,
        }
    }
}

/// Most frequent surface form; ties go to the shortest, then the
/// lexicographically smallest.
fn canonical_label(surface_counts: &BTreeMap<String, usize>) -> String {
    surface_counts
        .iter()
        .min_by(|(a, ca), (b, cb)| {
            cb.cmp(ca)
                .then_with(|| a.chars().count().cmp(&b.chars().count()))
                .then_with(|| a.cmp(b))
        })
        .map(|(s, _)| s.clone())
        .unwrap_or_default()
}
