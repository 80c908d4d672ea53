//! Structural invariant checks for a finished hierarchy
//!
//! Acyclicity and level consistency hold by construction; these checks
//! exist so a defect in assembly surfaces as an error instead of a
//! malformed document.

use super::node::{ConceptId, EvidenceId};
use super::tree::ConceptHierarchy;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// A violated hierarchy invariant
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HierarchyViolation {
    #[error("node {0} is its own parent")]
    SelfParent(ConceptId),

    #[error("node {0} lists itself as a child")]
    SelfChild(ConceptId),

    #[error("node {node} references missing node {missing}")]
    DanglingId { node: ConceptId, missing: ConceptId },

    #[error("node {child} is not linked back from its parent {parent}")]
    BrokenLink { parent: ConceptId, child: ConceptId },

    #[error("root {0} has a parent")]
    RootWithParent(ConceptId),

    #[error("node {node} is at level {found}, expected {expected}")]
    LevelMismatch {
        node: ConceptId,
        expected: usize,
        found: usize,
    },

    #[error("node {node} at level {level} exceeds {max_levels} levels")]
    TooDeep {
        node: ConceptId,
        level: usize,
        max_levels: usize,
    },

    #[error("node {0} is reached more than once from the roots")]
    Cycle(ConceptId),

    #[error("node {0} is not reachable from any root")]
    Unreachable(ConceptId),

    #[error("node {0} has no evidence")]
    MissingEvidence(ConceptId),

    #[error("node {node} references missing evidence {evidence}")]
    DanglingEvidence { node: ConceptId, evidence: EvidenceId },

    #[error("node {node} has confidence {confidence} outside [0, 1]")]
    ConfidenceOutOfRange { node: ConceptId, confidence: f64 },
}

pub(super) fn check(hierarchy: &ConceptHierarchy) -> Vec<HierarchyViolation> {
    let mut violations = Vec::new();
    let max_levels = hierarchy.metadata.max_levels;

    for (id, node) in &hierarchy.nodes {
        if node.parent.as_ref() == Some(id) {
            violations.push(HierarchyViolation::SelfParent(id.clone()));
        }
        if node.children.contains(id) {
            violations.push(HierarchyViolation::SelfChild(id.clone()));
        }

        match node.parent.as_ref().map(|p| (p, hierarchy.nodes.get(p))) {
            Some((parent_id, None)) => violations.push(HierarchyViolation::DanglingId {
                node: id.clone(),
                missing: parent_id.clone(),
            }),
            Some((parent_id, Some(parent))) => {
                if !parent.children.contains(id) {
                    violations.push(HierarchyViolation::BrokenLink {
                        parent: parent_id.clone(),
                        child: id.clone(),
                    });
                }
                if node.level != parent.level + 1 {
                    violations.push(HierarchyViolation::LevelMismatch {
                        node: id.clone(),
                        expected: parent.level + 1,
                        found: node.level,
                    });
                }
            }
            None => {
                if node.level != 0 {
                    violations.push(HierarchyViolation::LevelMismatch {
                        node: id.clone(),
                        expected: 0,
                        found: node.level,
                    });
                }
            }
        }

        for child_id in &node.children {
            match hierarchy.nodes.get(child_id) {
                None => violations.push(HierarchyViolation::DanglingId {
                    node: id.clone(),
                    missing: child_id.clone(),
                }),
                Some(child) if child.parent.as_ref() != Some(id) => {
                    violations.push(HierarchyViolation::BrokenLink {
                        parent: id.clone(),
                        child: child_id.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        if node.level >= max_levels {
            violations.push(HierarchyViolation::TooDeep {
                node: id.clone(),
                level: node.level,
                max_levels,
            });
        }

        if node.evidence.is_empty() {
            violations.push(HierarchyViolation::MissingEvidence(id.clone()));
        }
        for (evidence_id, &confidence) in &node.evidence {
            if !hierarchy.evidence.contains_key(evidence_id) {
                violations.push(HierarchyViolation::DanglingEvidence {
                    node: id.clone(),
                    evidence: evidence_id.clone(),
                });
            }
            if !(0.0..=1.0).contains(&confidence) {
                violations.push(HierarchyViolation::ConfidenceOutOfRange {
                    node: id.clone(),
                    confidence,
                });
            }
        }
        if !(0.0..=1.0).contains(&node.confidence) {
            violations.push(HierarchyViolation::ConfidenceOutOfRange {
                node: id.clone(),
                confidence: node.confidence,
            });
        }
    }

    // Every node must be reached exactly once from the roots
    let mut seen: HashSet<&ConceptId> = HashSet::new();
    let mut queue: VecDeque<&ConceptId> = VecDeque::new();
    for root in &hierarchy.roots {
        match hierarchy.nodes.get(root) {
            Some(node) if node.parent.is_some() => {
                violations.push(HierarchyViolation::RootWithParent(root.clone()))
            }
            Some(_) => {}
            None => {
                violations.push(HierarchyViolation::DanglingId {
                    node: root.clone(),
                    missing: root.clone(),
                });
                continue;
            }
        }
        queue.push_back(root);
    }
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            violations.push(HierarchyViolation::Cycle(id.clone()));
            continue;
        }
        if let Some(node) = hierarchy.nodes.get(id) {
            queue.extend(node.children.iter().filter(|c| hierarchy.nodes.contains_key(*c)));
        }
    }
    for id in hierarchy.nodes.keys() {
        if !seen.contains(id) {
            violations.push(HierarchyViolation::Unreachable(id.clone()));
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::super::node::ConceptNode;
    use super::super::tree::{CandidateCounts, HierarchyMetadata, PaperCounts};
    use super::*;
    use crate::corpus::PaperId;
    use crate::embedding::EmbeddingVector;
    use crate::evidence::EvidenceSentence;
    use std::collections::{BTreeMap, BTreeSet};

    fn node(key: &str, parent: Option<&str>, level: usize, children: &[&str], evidence: &EvidenceId) -> ConceptNode {
        ConceptNode {
            id: ConceptId::from_key(key),
            label: key.to_string(),
            embedding: EmbeddingVector::new(vec![1.0, 0.0]).unwrap(),
            parent: parent.map(ConceptId::from_key),
            level,
            children: children.iter().map(|c| ConceptId::from_key(c)).collect(),
            evidence: BTreeMap::from([(evidence.clone(), 0.9)]),
            confidence: 0.9,
            methods: BTreeSet::new(),
            papers: BTreeSet::new(),
            synonyms: BTreeSet::new(),
        }
    }

    fn hierarchy(nodes: Vec<ConceptNode>, roots: &[&str]) -> ConceptHierarchy {
        let sentence = EvidenceSentence::new(
            "Neural networks such as transformers dominate.",
            90.0,
            PaperId::new("p1"),
            0,
        )
        .unwrap();
        ConceptHierarchy {
            roots: roots.iter().map(|r| ConceptId::from_key(r)).collect(),
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            evidence: BTreeMap::from([(EvidenceId::for_sentence(&sentence), sentence)]),
            metadata: HierarchyMetadata {
                algorithm: "agglomerative".to_string(),
                linkage: "average".to_string(),
                distance: "cosine".to_string(),
                similarity_threshold: 0.9,
                evidence_threshold: 0.8,
                max_levels: 3,
                min_cluster_size: 2,
                cutoff_depth: 0,
                cut_distances: Vec::new(),
                embedding_model: "test".to_string(),
                random_seed: Some(42),
                level_counts: Vec::new(),
                papers: PaperCounts::default(),
                skipped: Vec::new(),
                candidates: CandidateCounts::default(),
                generated_at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            },
        }
    }

    fn evidence_id() -> EvidenceId {
        let sentence = EvidenceSentence::new(
            "Neural networks such as transformers dominate.",
            90.0,
            PaperId::new("p1"),
            0,
        )
        .unwrap();
        EvidenceId::for_sentence(&sentence)
    }

    #[test]
    fn test_valid_tree_passes() {
        let e = evidence_id();
        let h = hierarchy(
            vec![
                node("a", None, 0, &["b"], &e),
                node("b", Some("a"), 1, &["c"], &e),
                node("c", Some("b"), 2, &[], &e),
            ],
            &["a"],
        );
        assert!(check(&h).is_empty());
    }

    #[test]
    fn test_detects_self_parent_and_cycle() {
        let e = evidence_id();
        let h = hierarchy(
            vec![
                node("a", None, 0, &["b"], &e),
                node("b", Some("b"), 1, &["b"], &e),
            ],
            &["a"],
        );
        let violations = check(&h);
        let b = ConceptId::from_key("b");
        assert!(violations.contains(&HierarchyViolation::SelfParent(b.clone())));
        assert!(violations.contains(&HierarchyViolation::SelfChild(b.clone())));
        assert!(violations.contains(&HierarchyViolation::Cycle(b)));
    }

    #[test]
    fn test_detects_level_mismatch_and_depth() {
        let e = evidence_id();
        let h = hierarchy(
            vec![
                node("a", None, 0, &["b"], &e),
                node("b", Some("a"), 2, &["c"], &e),
                node("c", Some("b"), 3, &[], &e),
            ],
            &["a"],
        );
        let violations = check(&h);
        assert!(violations.contains(&HierarchyViolation::LevelMismatch {
            node: ConceptId::from_key("b"),
            expected: 1,
            found: 2,
        }));
        assert!(violations.iter().any(|v| matches!(v, HierarchyViolation::TooDeep { level: 3, .. })));
    }

    #[test]
    fn test_detects_unreachable_and_dangling() {
        let e = evidence_id();
        let h = hierarchy(
            vec![
                node("a", None, 0, &["ghost"], &e),
                node("b", None, 0, &[], &e),
            ],
            &["a"],
        );
        let violations = check(&h);
        assert!(violations.contains(&HierarchyViolation::Unreachable(ConceptId::from_key("b"))));
        assert!(violations.contains(&HierarchyViolation::DanglingId {
            node: ConceptId::from_key("a"),
            missing: ConceptId::from_key("ghost"),
        }));
    }

    #[test]
    fn test_detects_evidence_problems() {
        let e = evidence_id();
        let mut bare = node("a", None, 0, &[], &e);
        bare.evidence.clear();
        let mut overconfident = node("b", None, 0, &[], &e);
        overconfident.confidence = 1.5;
        let mut dangling = node("c", None, 0, &[], &e);
        let ghost = EvidenceId::for_sentence(
            &EvidenceSentence::new("Some other sentence entirely.", 50.0, PaperId::new("p2"), 4).unwrap(),
        );
        dangling.evidence.insert(ghost.clone(), 0.5);

        let h = hierarchy(vec![bare, overconfident, dangling], &["a", "b", "c"]);
        let violations = check(&h);
        assert!(violations.contains(&HierarchyViolation::MissingEvidence(ConceptId::from_key("a"))));
        assert!(violations.contains(&HierarchyViolation::ConfidenceOutOfRange {
            node: ConceptId::from_key("b"),
            confidence: 1.5,
        }));
        assert!(violations.contains(&HierarchyViolation::DanglingEvidence {
            node: ConceptId::from_key("c"),
            evidence: ghost,
        }));
    }
}
