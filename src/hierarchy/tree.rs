//! The concept hierarchy aggregate and its output document

use super::node::{ConceptId, ConceptNode, EvidenceId};
use super::validate::{check, HierarchyViolation};
use crate::corpus::SkippedPaper;
use crate::evidence::EvidenceSentence;
use crate::extract::ExtractionMethod;
use crate::merge::normalize_label;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;

/// Paper totals for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaperCounts {
    pub submitted: usize,
    pub processed: usize,
    pub skipped: usize,
}

/// Candidate totals after each stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCounts {
    /// Raw candidates across every extractor
    pub extracted: usize,
    pub merged: usize,
    /// Candidates with at least one evidence sentence
    pub linked: usize,
    pub rejected: usize,
}

/// Parameters and provenance of the run that built a hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyMetadata {
    pub algorithm: String,
    pub linkage: String,
    pub distance: String,
    pub similarity_threshold: f64,
    pub evidence_threshold: f64,
    pub max_levels: usize,
    pub min_cluster_size: usize,
    /// Number of dendrogram cuts applied (0 for a flat hierarchy)
    pub cutoff_depth: usize,
    /// Linkage distance of each cut, loosest first
    pub cut_distances: Vec<f64>,
    pub embedding_model: String,
    /// Seed the embedder ran with; null for models that take none
    pub random_seed: Option<u64>,
    /// Node count per level, root level first
    pub level_counts: Vec<usize>,
    pub papers: PaperCounts,
    pub skipped: Vec<SkippedPaper>,
    pub candidates: CandidateCounts,
    pub generated_at: DateTime<Utc>,
}

/// Evidence as it appears under a node in the output document
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceDocument {
    pub id: String,
    pub text: String,
    /// In [0, 100]
    pub confidence: f64,
    pub paper_id: String,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    pub label: String,
    pub level: usize,
    pub parent_id: Option<String>,
    pub child_ids: Vec<String>,
    pub evidence: Vec<EvidenceDocument>,
    /// In [0, 1]
    pub confidence_score: f64,
    pub methods: Vec<ExtractionMethod>,
    pub synonyms: Vec<String>,
}

/// Serializable form of a `ConceptHierarchy`
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyDocument {
    pub roots: Vec<String>,
    pub nodes: BTreeMap<String, NodeDocument>,
    pub metadata: HierarchyMetadata,
}

/// Immutable tree of evidence-grounded concepts.
///
/// Owns every node in a flat id map; parent and child links are ids.
#[derive(Debug, Clone)]
pub struct ConceptHierarchy {
    pub(super) roots: Vec<ConceptId>,
    pub(super) nodes: BTreeMap<ConceptId, ConceptNode>,
    pub(super) evidence: BTreeMap<EvidenceId, EvidenceSentence>,
    pub(super) metadata: HierarchyMetadata,
}

impl ConceptHierarchy {
    pub fn roots(&self) -> &[ConceptId] {
        &self.roots
    }

    pub fn nodes(&self) -> &BTreeMap<ConceptId, ConceptNode> {
        &self.nodes
    }

    pub fn metadata(&self) -> &HierarchyMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of populated levels
    pub fn depth(&self) -> usize {
        self.metadata.level_counts.len()
    }

    pub fn node(&self, id: &ConceptId) -> Option<&ConceptNode> {
        self.nodes.get(id)
    }

    /// Node whose label normalizes to the same key as `label`
    pub fn node_by_label(&self, label: &str) -> Option<&ConceptNode> {
        let key = normalize_label(label);
        self.walk()
            .into_iter()
            .find(|node| normalize_label(&node.label) == key)
    }

    pub fn children(&self, id: &ConceptId) -> Vec<&ConceptNode> {
        self.node(id)
            .map(|node| node.children.iter().filter_map(|c| self.nodes.get(c)).collect())
            .unwrap_or_default()
    }

    /// Parent chain of `id`, nearest first
    pub fn ancestors(&self, id: &ConceptId) -> Vec<&ConceptNode> {
        let mut chain = Vec::new();
        let mut current = self.node(id).and_then(|n| n.parent.as_ref());
        while let Some(parent_id) = current {
            let Some(parent) = self.nodes.get(parent_id) else {
                break;
            };
            // Stop on a malformed chain rather than loop
            if chain.len() > self.nodes.len() {
                break;
            }
            chain.push(parent);
            current = parent.parent.as_ref();
        }
        chain
    }

    pub fn is_ancestor(&self, ancestor: &ConceptId, id: &ConceptId) -> bool {
        self.ancestors(id).iter().any(|n| &n.id == ancestor)
    }

    /// Nodes at `level` in walk order
    pub fn nodes_at_level(&self, level: usize) -> Vec<&ConceptNode> {
        self.walk().into_iter().filter(|n| n.level == level).collect()
    }

    /// Breadth-first from the roots
    pub fn walk(&self) -> Vec<&ConceptNode> {
        let mut order: Vec<&ConceptNode> = self.roots.iter().filter_map(|r| self.nodes.get(r)).collect();
        let mut i = 0;
        while i < order.len() && order.len() <= self.nodes.len() {
            let children = order[i].children.iter().filter_map(|c| self.nodes.get(c));
            order.extend(children);
            i += 1;
        }
        order
    }

    /// Evidence of `id` with that concept's confidence in [0, 1].
    ///
    /// Ordered by confidence (highest first), then paper and offset.
    pub fn evidence_for(&self, id: &ConceptId) -> Vec<(&EvidenceSentence, f64)> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let mut found: Vec<(&EvidenceSentence, f64)> = node
            .evidence
            .iter()
            .filter_map(|(eid, &conf)| self.evidence.get(eid).map(|e| (e, conf)))
            .collect();
        found.sort_by(|(a, ca), (b, cb)| {
            cb.total_cmp(ca)
                .then_with(|| a.paper_id().cmp(b.paper_id()))
                .then(a.offset().cmp(&b.offset()))
        });
        found
    }

    /// Every structural invariant violated by this hierarchy
    pub fn validate(&self) -> Vec<HierarchyViolation> {
        check(self)
    }

    pub fn to_document(&self) -> HierarchyDocument {
        let nodes = self
            .nodes
            .values()
            .map(|node| {
                let evidence = self
                    .evidence_for(&node.id)
                    .into_iter()
                    .map(|(e, conf)| EvidenceDocument {
                        id: EvidenceId::for_sentence(e).to_string(),
                        text: e.text().to_string(),
                        confidence: conf * 100.0,
                        paper_id: e.paper_id().to_string(),
                        offset: e.offset(),
                    })
                    .collect();
                let doc = NodeDocument {
                    label: node.label.clone(),
                    level: node.level,
                    parent_id: node.parent.as_ref().map(ConceptId::to_string),
                    child_ids: node.children.iter().map(ConceptId::to_string).collect(),
                    evidence,
                    confidence_score: node.confidence,
                    methods: node.methods.iter().copied().collect(),
                    synonyms: node.synonyms.iter().cloned().collect(),
                };
                (node.id.to_string(), doc)
            })
            .collect();

        HierarchyDocument {
            roots: self.roots.iter().map(ConceptId::to_string).collect(),
            nodes,
            metadata: self.metadata.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_document())
    }
}
