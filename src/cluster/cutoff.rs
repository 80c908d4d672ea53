//! Elbow-based dendrogram cutoff selection

use crate::config::ClusteringConfig;

/// Where to cut the dendrogram.
///
/// Each cut is a merge index `i`: cutting there applies merges `0..=i`.
/// Cuts are ordered loosest (fewest clusters) first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cutoff {
    pub cuts: Vec<usize>,
    /// Linkage distance of each cut (midpoint of its gap)
    pub distances: Vec<f64>,
}

impl Cutoff {
    pub fn levels(&self) -> usize {
        self.cuts.len() + 1
    }
}

/// Choose cuts at the largest gaps between consecutive merge distances.
///
/// Gaps at least `gap_significance` times the mean gap are taken largest
/// first (ties to the lower index), up to `max_levels - 1` cuts; when fewer
/// than `min_levels - 1` qualify, the next largest positive gaps fill in.
pub fn select_cutoff(distances: &[f64], max_levels: usize, clustering: &ClusteringConfig) -> Cutoff {
    let max_cuts = max_levels.saturating_sub(1);
    let min_cuts = clustering.min_hierarchy_levels.saturating_sub(1).min(max_cuts);
    if distances.len() < 2 || max_cuts == 0 {
        return Cutoff::default();
    }

    let gaps: Vec<f64> = distances.windows(2).map(|w| w[1] - w[0]).collect();
    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;

    let mut ranked: Vec<usize> = (0..gaps.len()).filter(|&i| gaps[i] > 0.0).collect();
    ranked.sort_by(|&a, &b| gaps[b].total_cmp(&gaps[a]).then(a.cmp(&b)));

    let significant = ranked
        .iter()
        .take_while(|&&i| gaps[i] >= clustering.gap_significance * mean)
        .count();
    let take = significant.max(min_cuts).min(max_cuts).min(ranked.len());

    let mut cuts: Vec<usize> = ranked.into_iter().take(take).collect();
    cuts.sort_unstable_by(|a, b| b.cmp(a));
    let cut_distances = cuts
        .iter()
        .map(|&i| (distances[i] + distances[i + 1]) / 2.0)
        .collect();

    tracing::debug!(?cuts, significant, "dendrogram cuts selected");
    Cutoff {
        cuts,
        distances: cut_distances,
    }
}
