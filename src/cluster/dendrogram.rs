//! Average-linkage dendrogram over cosine distance
//!
//! Merges are recorded SciPy-style: leaves are `0..n` and merge `i` creates
//! cluster `n + i`. Average linkage never produces inversions, so merge
//! distances are non-decreasing.

use crate::embedding::EmbeddingVector;
use crate::error::ConceptResult;
use kodama::{linkage as kodama_linkage, Method as KodamaMethod};

/// A single merge operation in the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// Lower cluster id being merged
    pub cluster_a: usize,
    /// Higher cluster id being merged
    pub cluster_b: usize,
    /// Average cosine distance at which the merge occurred
    pub distance: f64,
    /// Size of the resulting cluster
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct Dendrogram {
    merges: Vec<Merge>,
    n_items: usize,
}

impl Dendrogram {
    /// Cluster `vectors` bottom-up with average linkage.
    ///
    /// Leaves keep the order of `vectors`; among equally close pairs the
    /// one reached first in that order merges first.
    pub fn average_linkage(vectors: &[EmbeddingVector]) -> ConceptResult<Self> {
        let n = vectors.len();
        if n < 2 {
            return Ok(Self { merges: Vec::new(), n_items: n });
        }

        // Condensed upper triangle, row-major: N-choose-2 entries
        let mut condensed = Vec::with_capacity(n * (n - 1) / 2);
        for row in 0..n - 1 {
            for col in row + 1..n {
                condensed.push(vectors[row].cosine_distance(&vectors[col])?.max(0.0));
            }
        }

        let dend = kodama_linkage(&mut condensed, n, KodamaMethod::Average);
        let merges = dend
            .steps()
            .iter()
            .map(|step| Merge {
                cluster_a: step.cluster1.min(step.cluster2),
                cluster_b: step.cluster1.max(step.cluster2),
                distance: step.dissimilarity,
                size: step.size,
            })
            .collect();

        Ok(Self { merges, n_items: n })
    }

    pub fn n_items(&self) -> usize {
        self.n_items
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Merge distances in merge order
    pub fn distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }

    /// Item clusters after applying the first `applied` merges.
    ///
    /// Each cluster lists item indices ascending; clusters are ordered by
    /// their smallest item.
    pub fn clusters(&self, applied: usize) -> Vec<Vec<usize>> {
        let n = self.n_items;
        let mut parent: Vec<usize> = (0..n + self.merges.len()).collect();
        for (i, merge) in self.merges.iter().take(applied).enumerate() {
            parent[merge.cluster_a] = n + i;
            parent[merge.cluster_b] = n + i;
        }

        let mut by_root: Vec<(usize, Vec<usize>)> = Vec::new();
        for item in 0..n {
            let mut root = item;
            while parent[root] != root {
                root = parent[root];
            }
            match by_root.iter_mut().find(|(r, _)| *r == root) {
                Some((_, members)) => members.push(item),
                None => by_root.push((root, vec![item])),
            }
        }
        by_root.into_iter().map(|(_, members)| members).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(values: &[f32]) -> EmbeddingVector {
        EmbeddingVector::new(values.to_vec()).unwrap()
    }

    #[test]
    fn test_merges_closest_first() {
        let data = vec![v(&[1.0, 0.0]), v(&[0.0, 1.0]), v(&[0.99, 0.1]), v(&[0.1, 0.99])];
        let d = Dendrogram::average_linkage(&data).unwrap();

        assert_eq!(d.n_items(), 4);
        assert_eq!(d.merges().len(), 3);
        let first = d.merges()[0];
        assert!(matches!((first.cluster_a, first.cluster_b), (0, 2) | (1, 3)));
        assert_eq!(d.merges()[2].size, 4);

        let distances = d.distances();
        assert!(distances.windows(2).all(|w| w[0] <= w[1] + 1e-12));
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        // Three identical vectors: every pair is at distance 0
        let data = vec![v(&[1.0, 1.0]), v(&[1.0, 1.0]), v(&[1.0, 1.0])];
        let d = Dendrogram::average_linkage(&data).unwrap();
        assert_eq!((d.merges()[0].cluster_a, d.merges()[0].cluster_b), (0, 1));
        assert_eq!((d.merges()[1].cluster_a, d.merges()[1].cluster_b), (2, 3));
    }

    #[test]
    fn test_clusters_after_merges() {
        let data = vec![v(&[1.0, 0.0]), v(&[0.0, 1.0]), v(&[0.99, 0.1]), v(&[0.1, 0.99])];
        let d = Dendrogram::average_linkage(&data).unwrap();

        assert_eq!(d.clusters(0), vec![vec![0], vec![1], vec![2], vec![3]]);
        assert_eq!(d.clusters(2), vec![vec![0, 2], vec![1, 3]]);
        assert_eq!(d.clusters(3), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_many_items_merge_into_one() {
        let data: Vec<EmbeddingVector> = (0..300)
            .map(|i| {
                let angle = i as f32 * 0.01;
                v(&[angle.cos(), angle.sin(), (i % 7) as f32 * 0.05])
            })
            .collect();
        let d = Dendrogram::average_linkage(&data).unwrap();

        assert_eq!(d.merges().len(), 299);
        assert_eq!(d.merges().last().unwrap().size, 300);
        assert!(d.merges().iter().all(|m| m.cluster_a < m.cluster_b));
        assert!(d.distances().windows(2).all(|w| w[0] <= w[1] + 1e-12));
        assert_eq!(d.clusters(299).len(), 1);
    }

    #[test]
    fn test_trivial_inputs() {
        let d = Dendrogram::average_linkage(&[]).unwrap();
        assert!(d.merges().is_empty());
        let d = Dendrogram::average_linkage(&[v(&[1.0])]).unwrap();
        assert!(d.merges().is_empty());
        assert_eq!(d.clusters(0), vec![vec![0]]);
    }
}
