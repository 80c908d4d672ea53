//! Concept hierarchy assembler
//!
//! Materializes the cluster tree into `ConceptNode`s. The walk is top-down
//! and adds each edge once, so parent levels are always assigned before
//! their children.

use super::node::{ConceptId, ConceptNode, EvidenceId};
use super::tree::{CandidateCounts, ConceptHierarchy, HierarchyMetadata, PaperCounts};
use crate::cluster::ClusterTree;
use crate::config::PipelineConfig;
use crate::corpus::SkippedPaper;
use crate::error::{ConceptError, ConceptResult};
use crate::evidence::LinkedConcept;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};

/// Run-level provenance recorded in the hierarchy metadata
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub papers: PaperCounts,
    pub skipped: Vec<SkippedPaper>,
    pub candidates: CandidateCounts,
    pub embedding_model: String,
    pub random_seed: Option<u64>,
    pub generated_at: DateTime<Utc>,
}

pub struct HierarchyAssembler<'a> {
    config: &'a PipelineConfig,
}

impl<'a> HierarchyAssembler<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Build the hierarchy; item `i` of `tree` is `concepts[i]`.
    pub fn assemble(
        &self,
        concepts: Vec<LinkedConcept>,
        tree: &ClusterTree,
        summary: RunSummary,
    ) -> ConceptResult<ConceptHierarchy> {
        if concepts.len() != tree.len() {
            return Err(ConceptError::Internal(format!(
                "cluster tree has {} items for {} concepts",
                tree.len(),
                concepts.len()
            )));
        }

        let ids: Vec<ConceptId> = concepts
            .iter()
            .map(|c| ConceptId::from_key(&c.candidate.key))
            .collect();
        let mut slots: Vec<Option<LinkedConcept>> = concepts.into_iter().map(Some).collect();

        let mut nodes = BTreeMap::new();
        let mut evidence = BTreeMap::new();
        let mut level_counts: Vec<usize> = Vec::new();

        let mut queue: VecDeque<(usize, usize)> = tree.roots().iter().map(|&r| (r, 0)).collect();
        while let Some((item, level)) = queue.pop_front() {
            let concept = slots[item].take().ok_or_else(|| {
                ConceptError::Internal(format!("item {} placed twice in the cluster tree", item))
            })?;

            let mut node_evidence = BTreeMap::new();
            for sentence in concept.evidence {
                let evidence_id = EvidenceId::for_sentence(&sentence);
                node_evidence.insert(evidence_id.clone(), sentence.confidence() / 100.0);
                evidence.entry(evidence_id).or_insert(sentence);
            }

            if level_counts.len() <= level {
                level_counts.resize(level + 1, 0);
            }
            level_counts[level] += 1;

            let candidate = concept.candidate;
            let node = ConceptNode {
                id: ids[item].clone(),
                label: candidate.label,
                embedding: candidate.embedding,
                parent: tree.parent(item).map(|p| ids[p].clone()),
                level,
                children: tree.children(item).iter().map(|&c| ids[c].clone()).collect(),
                evidence: node_evidence,
                confidence: concept.confidence,
                methods: candidate.methods,
                papers: candidate.papers,
                synonyms: candidate.synonyms,
            };
            nodes.insert(node.id.clone(), node);
            queue.extend(tree.children(item).iter().map(|&c| (c, level + 1)));
        }

        if let Some(missing) = slots.iter().position(Option::is_some) {
            return Err(ConceptError::Internal(format!(
                "item {} is not reachable in the cluster tree",
                missing
            )));
        }

        let hierarchy = ConceptHierarchy {
            roots: tree.roots().iter().map(|&r| ids[r].clone()).collect(),
            nodes,
            evidence,
            metadata: HierarchyMetadata {
                algorithm: "agglomerative".to_string(),
                linkage: "average".to_string(),
                distance: "cosine".to_string(),
                similarity_threshold: self.config.similarity_threshold,
                evidence_threshold: self.config.evidence_threshold,
                max_levels: self.config.max_hierarchy_levels,
                min_cluster_size: self.config.min_cluster_size,
                cutoff_depth: tree.cutoff.cuts.len(),
                cut_distances: tree.cutoff.distances.clone(),
                embedding_model: summary.embedding_model,
                random_seed: summary.random_seed,
                level_counts,
                papers: summary.papers,
                skipped: summary.skipped,
                candidates: summary.candidates,
                generated_at: summary.generated_at,
            },
        };

        let violations = hierarchy.validate();
        if !violations.is_empty() {
            let messages: Vec<String> = violations.iter().map(ToString::to_string).collect();
            tracing::error!(violations = violations.len(), "assembled hierarchy is malformed");
            return Err(ConceptError::Internal(messages.join("; ")));
        }

        tracing::info!(
            nodes = hierarchy.len(),
            roots = hierarchy.roots().len(),
            levels = hierarchy.depth(),
            "hierarchy assembled"
        );
        Ok(hierarchy)
    }
}
