//! Draft concept tree from the dendrogram
//!
//! The loosest cut partitions every item into top-level groups. Each group
//! is represented by one of its members; the rest are partitioned by the
//! next tighter cut beneath it, and past the last cut they become leaves.
//! Every item therefore appears exactly once. Asserted hyponymy then
//! re-parents items, and depth is clamped to the configured level count.

use super::cutoff::{select_cutoff, Cutoff};
use super::dendrogram::Dendrogram;
use crate::config::PipelineConfig;
use crate::embedding::EmbeddingVector;
use crate::error::{ConceptError, ConceptResult};
use crate::extract::HyponymPair;
use crate::merge::normalize_label;
use std::collections::{BTreeSet, HashMap};

/// Parent/child structure over item indices
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterTree {
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    /// Cut selection used for the draft
    pub cutoff: Cutoff,
}

impl ClusterTree {
    fn new(n: usize) -> Self {
        Self {
            parent: vec![None; n],
            children: vec![Vec::new(); n],
            roots: Vec::new(),
            cutoff: Cutoff::default(),
        }
    }

    /// Every item as a root, in item order
    pub fn flat(n: usize) -> Self {
        let mut tree = Self::new(n);
        tree.roots = (0..n).collect();
        tree
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn parent(&self, item: usize) -> Option<usize> {
        self.parent[item]
    }

    pub fn children(&self, item: usize) -> &[usize] {
        &self.children[item]
    }

    /// Distance from a root (roots are 0)
    pub fn depth(&self, item: usize) -> usize {
        let mut depth = 0;
        let mut current = item;
        while let Some(p) = self.parent[current] {
            depth += 1;
            current = p;
        }
        depth
    }

    /// Whether `ancestor` lies on the parent chain of `item`
    pub fn is_ancestor(&self, ancestor: usize, item: usize) -> bool {
        let mut current = self.parent[item];
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent[p];
        }
        false
    }

    /// Ancestor of `item` at exactly `depth`, if `item` is deeper
    fn ancestor_at(&self, item: usize, depth: usize) -> Option<usize> {
        let mut chain = vec![item];
        let mut current = item;
        while let Some(p) = self.parent[current] {
            chain.push(p);
            current = p;
        }
        chain.reverse();
        chain.get(depth).copied().filter(|&a| a != item)
    }

    /// Items in breadth-first order from the roots
    pub fn walk(&self) -> Vec<usize> {
        let mut order: Vec<usize> = self.roots.clone();
        let mut i = 0;
        while i < order.len() {
            order.extend(self.children[order[i]].iter().copied());
            i += 1;
        }
        order
    }

    fn attach(&mut self, item: usize, parent: Option<usize>) {
        self.parent[item] = parent;
        match parent {
            Some(p) => self.children[p].push(item),
            None => self.roots.push(item),
        }
    }

    fn detach(&mut self, item: usize) {
        match self.parent[item].take() {
            Some(p) => self.children[p].retain(|&c| c != item),
            None => self.roots.retain(|&r| r != item),
        }
    }

    fn move_to(&mut self, item: usize, parent: Option<usize>) {
        self.detach(item);
        self.attach(item, parent);
    }
}

/// Map hyponym surface pairs onto item indices via normalized keys.
///
/// `keys[i]` holds every normalized key folded into item `i`. Pairs naming
/// an unknown phrase, or the same item twice, are dropped. The result is
/// sorted and free of duplicates.
pub fn resolve_hyponyms(pairs: &[HyponymPair], keys: &[BTreeSet<String>]) -> Vec<(usize, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, item_keys) in keys.iter().enumerate() {
        for key in item_keys {
            index.entry(key.as_str()).or_insert(i);
        }
    }
    let resolved: BTreeSet<(usize, usize)> = pairs
        .iter()
        .filter_map(|pair| {
            let parent = *index.get(normalize_label(&pair.parent).as_str())?;
            let child = *index.get(normalize_label(&pair.child).as_str())?;
            (parent != child).then_some((parent, child))
        })
        .collect();
    resolved.into_iter().collect()
}

pub struct ClusterBuilder<'a> {
    config: &'a PipelineConfig,
}

impl<'a> ClusterBuilder<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Build the draft tree over `embeddings` (one per item).
    ///
    /// `hyponyms` are `(hypernym, hyponym)` item pairs. Fewer than two items
    /// yield a flat tree; zero items is `InsufficientData`.
    pub fn build(&self, embeddings: &[EmbeddingVector], hyponyms: &[(usize, usize)]) -> ConceptResult<ClusterTree> {
        let n = embeddings.len();
        if n == 0 {
            return Err(ConceptError::InsufficientData(
                "no evidence-validated candidates to cluster".to_string(),
            ));
        }
        if n < 2 {
            tracing::info!(items = n, "clustering skipped, flat hierarchy");
            return Ok(ClusterTree::flat(n));
        }

        let dendrogram = Dendrogram::average_linkage(embeddings)?;
        let cutoff = select_cutoff(
            &dendrogram.distances(),
            self.config.max_hierarchy_levels,
            &self.config.clustering,
        );
        let partitions: Vec<Vec<usize>> = cutoff
            .cuts
            .iter()
            .map(|&cut| cluster_labels(&dendrogram.clusters(cut + 1), n))
            .collect();

        let mut tree = ClusterTree::new(n);
        let draft = Draft {
            embeddings,
            partitions: &partitions,
            hyponyms,
            min_size: self.config.min_cluster_size,
        };
        draft.place(&mut tree, (0..n).collect(), 0, None)?;
        tree.cutoff = cutoff;

        if self.config.max_hierarchy_levels >= 2 {
            self.apply_hyponymy(&mut tree, hyponyms);
        }
        self.clamp_depth(&mut tree);
        if self.config.max_hierarchy_levels >= 2 {
            for (hypernym, hyponym) in overridden(&tree, hyponyms) {
                tracing::debug!(hypernym, hyponym, "asserted hyponymy overridden by a later pair");
            }
        }

        tracing::info!(
            items = n,
            roots = tree.roots.len(),
            cuts = tree.cutoff.cuts.len(),
            "cluster tree built"
        );
        Ok(tree)
    }

    /// Re-parent each hyponym under its hypernym.
    fn apply_hyponymy(&self, tree: &mut ClusterTree, hyponyms: &[(usize, usize)]) {
        let deepest_parent = self.config.max_hierarchy_levels - 2;
        for &(hypernym, hyponym) in hyponyms {
            if tree.parent(hyponym) == Some(hypernym) {
                continue;
            }
            if tree.is_ancestor(hyponym, hypernym) {
                let lifted = tree.parent(hyponym);
                tree.move_to(hypernym, lifted);
            }
            if tree.depth(hypernym) > deepest_parent {
                let lifted = deepest_parent
                    .checked_sub(1)
                    .and_then(|d| tree.ancestor_at(hypernym, d));
                tree.move_to(hypernym, lifted);
            }
            tree.move_to(hyponym, Some(hypernym));
            tracing::debug!(hypernym, hyponym, "re-parented by asserted hyponymy");
        }
    }

    /// Re-attach anything deeper than the last level to its ancestor at the
    /// deepest level that may still have children.
    fn clamp_depth(&self, tree: &mut ClusterTree) {
        let max_depth = self.config.max_hierarchy_levels.saturating_sub(1);
        loop {
            let Some(item) = tree.walk().into_iter().find(|&i| tree.depth(i) > max_depth) else {
                break;
            };
            let new_parent = max_depth
                .checked_sub(1)
                .and_then(|d| tree.ancestor_at(item, d));
            tracing::debug!(item, ?new_parent, "clamped to maximum depth");
            tree.move_to(item, new_parent);
        }
    }
}

/// Asserted pairs whose hypernym did not end up above its hyponym
fn overridden(tree: &ClusterTree, hyponyms: &[(usize, usize)]) -> Vec<(usize, usize)> {
    hyponyms
        .iter()
        .copied()
        .filter(|&(hypernym, hyponym)| !tree.is_ancestor(hypernym, hyponym))
        .collect()
}

/// Cluster index per item
fn cluster_labels(clusters: &[Vec<usize>], n: usize) -> Vec<usize> {
    let mut labels = vec![0; n];
    for (label, members) in clusters.iter().enumerate() {
        for &item in members {
            labels[item] = label;
        }
    }
    labels
}

struct Draft<'a> {
    embeddings: &'a [EmbeddingVector],
    partitions: &'a [Vec<usize>],
    hyponyms: &'a [(usize, usize)],
    min_size: usize,
}

impl Draft<'_> {
    fn place(&self, tree: &mut ClusterTree, members: Vec<usize>, depth: usize, parent: Option<usize>) -> ConceptResult<()> {
        let Some(labels) = self.partitions.get(depth) else {
            for item in members {
                tree.attach(item, parent);
            }
            return Ok(());
        };

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut seen: Vec<usize> = Vec::new();
        for item in members {
            match seen.iter().position(|&l| l == labels[item]) {
                Some(g) => groups[g].push(item),
                None => {
                    seen.push(labels[item]);
                    groups.push(vec![item]);
                }
            }
        }
        let groups = self.fold_undersized(groups)?;

        for group in groups {
            let rep = self.representative(&group)?;
            tree.attach(rep, parent);
            let rest: Vec<usize> = group.into_iter().filter(|&i| i != rep).collect();
            if !rest.is_empty() {
                self.place(tree, rest, depth + 1, Some(rep))?;
            }
        }
        Ok(())
    }

    /// Fold groups below the minimum size into the nearest valid sibling
    fn fold_undersized(&self, groups: Vec<Vec<usize>>) -> ConceptResult<Vec<Vec<usize>>> {
        let valid: Vec<usize> = (0..groups.len())
            .filter(|&g| groups[g].len() >= self.min_size)
            .collect();
        if valid.is_empty() || valid.len() == groups.len() {
            return Ok(groups);
        }

        let centroids = groups
            .iter()
            .map(|g| EmbeddingVector::centroid(g.iter().map(|&i| &self.embeddings[i])))
            .collect::<ConceptResult<Vec<_>>>()?;

        let mut folded: Vec<Vec<usize>> = groups.clone();
        for (g, group) in groups.iter().enumerate() {
            if group.len() >= self.min_size {
                continue;
            }
            let mut best: Option<(f64, usize)> = None;
            for &v in &valid {
                let sim = centroids[g].cosine_similarity(&centroids[v])?;
                if best.map_or(true, |(s, _)| sim > s) {
                    best = Some((sim, v));
                }
            }
            if let Some((_, target)) = best {
                folded[target].extend(group.iter().copied());
                folded[g].clear();
            }
        }

        Ok(folded
            .into_iter()
            .filter(|g| !g.is_empty())
            .map(|mut g| {
                g.sort_unstable();
                g
            })
            .collect())
    }

    /// Asserted hypernym with the most hyponyms in the group, else the
    /// member nearest the centroid. Ties go to the lower index.
    fn representative(&self, group: &[usize]) -> ConceptResult<usize> {
        let mut best_asserted: Option<(usize, usize)> = None;
        for &m in group {
            let count = self
                .hyponyms
                .iter()
                .filter(|(p, c)| *p == m && group.contains(c))
                .count();
            if count > 0 && best_asserted.map_or(true, |(bc, _)| count > bc) {
                best_asserted = Some((count, m));
            }
        }
        if let Some((_, m)) = best_asserted {
            return Ok(m);
        }

        let centroid = EmbeddingVector::centroid(group.iter().map(|&i| &self.embeddings[i]))?;
        let mut best: Option<(f64, usize)> = None;
        for &m in group {
            let sim = self.embeddings[m].cosine_similarity(&centroid)?;
            if best.map_or(true, |(s, _)| sim > s) {
                best = Some((sim, m));
            }
        }
        best.map(|(_, m)| m)
            .ok_or_else(|| ConceptError::Internal("representative of an empty group".to_string()))
    }
}
