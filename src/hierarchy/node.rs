//! Concept nodes and their stable identifiers

use crate::corpus::PaperId;
use crate::embedding::EmbeddingVector;
use crate::evidence::EvidenceSentence;
use crate::extract::ExtractionMethod;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

// UUID v5 namespace for concept and evidence ids
const CONCEPT_NS: Uuid = Uuid::from_bytes([
    0x3d, 0x1f, 0x62, 0xa4, 0x8c, 0x0b, 0x4e, 0x57,
    0x9a, 0x21, 0x5e, 0x8f, 0xc4, 0x17, 0x6b, 0xd3,
]);

/// Stable concept identifier derived from the normalized label
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptId(String);

impl ConceptId {
    pub fn from_key(key: &str) -> Self {
        let uuid = Uuid::new_v5(&CONCEPT_NS, key.as_bytes());
        Self(format!("concept:{}", uuid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConceptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a source sentence, shared by every concept it supports
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceId(String);

impl EvidenceId {
    pub fn for_sentence(evidence: &EvidenceSentence) -> Self {
        let input = format!(
            "{}|{}|{}",
            evidence.paper_id(),
            evidence.offset(),
            evidence.text()
        );
        let uuid = Uuid::new_v5(&CONCEPT_NS, input.as_bytes());
        Self(format!("evidence:{}", uuid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A concept in the hierarchy.
///
/// Nodes reference each other by id only; the owning `ConceptHierarchy`
/// holds every node in one flat map.
#[derive(Debug, Clone)]
pub struct ConceptNode {
    pub(super) id: ConceptId,
    pub(super) label: String,
    pub(super) embedding: EmbeddingVector,
    pub(super) parent: Option<ConceptId>,
    pub(super) level: usize,
    pub(super) children: Vec<ConceptId>,
    /// Evidence id to confidence in [0, 1]
    pub(super) evidence: BTreeMap<EvidenceId, f64>,
    pub(super) confidence: f64,
    pub(super) methods: BTreeSet<ExtractionMethod>,
    pub(super) papers: BTreeSet<PaperId>,
    pub(super) synonyms: BTreeSet<String>,
}

impl ConceptNode {
    pub fn id(&self) -> &ConceptId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn embedding(&self) -> &EmbeddingVector {
        &self.embedding
    }

    pub fn parent(&self) -> Option<&ConceptId> {
        self.parent.as_ref()
    }

    /// 0 for roots
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn children(&self) -> &[ConceptId] {
        &self.children
    }

    pub fn evidence(&self) -> &BTreeMap<EvidenceId, f64> {
        &self.evidence
    }

    /// Mean evidence confidence in [0, 1]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Strategies that proposed this concept
    pub fn methods(&self) -> &BTreeSet<ExtractionMethod> {
        &self.methods
    }

    pub fn papers(&self) -> &BTreeSet<PaperId> {
        &self.papers
    }

    pub fn synonyms(&self) -> &BTreeSet<String> {
        &self.synonyms
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
