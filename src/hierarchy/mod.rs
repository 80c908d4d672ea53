//! Concept hierarchy: nodes, the owning aggregate, assembly and validation

mod assembler;
mod node;
mod tree;
mod validate;

pub use assembler::{HierarchyAssembler, RunSummary};
pub use node::{ConceptId, ConceptNode, EvidenceId};
pub use tree::{
    CandidateCounts, ConceptHierarchy, EvidenceDocument, HierarchyDocument, HierarchyMetadata,
    NodeDocument, PaperCounts,
};
pub use validate::HierarchyViolation;
