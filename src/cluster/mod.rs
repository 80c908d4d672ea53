//! Agglomerative clustering of evidence-validated concepts

mod builder;
mod cutoff;
mod dendrogram;

pub use builder::{resolve_hyponyms, ClusterBuilder, ClusterTree};
pub use cutoff::{select_cutoff, Cutoff};
pub use dendrogram::{Dendrogram, Merge};
