// cluster.rs - Consensus by average-linkage clustering of rank distances

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::tree::{RankedTree, TaxonSet};

/// Summed rank of the node separating each taxon pair, over all trees.
pub fn rank_distances(trees: &[RankedTree]) -> Result<Vec<Vec<f64>>> {
    let first = trees
        .first()
        .ok_or_else(|| Error::input("cannot summarise an empty tree sample"))?;
    let n = first.leaf_count();
    let mut dist = vec![vec![0.0; n]; n];

    for tree in trees {
        if !tree.same_taxa(first) {
            return Err(Error::input("sample trees are over different taxa"));
        }
        let clusters = tree.clusters();
        let leaves_below = |id: usize| -> Vec<usize> {
            if tree.is_leaf(id) {
                vec![id]
            } else {
                clusters[tree.rank(id) - 1].clone()
            }
        };

        for rank in 1..n {
            let Some([left, right]) = tree.children(tree.node_id(rank)) else {
                continue;
            };
            let weight = rank as f64;
            let right = leaves_below(right);
            for a in leaves_below(left) {
                for &b in &right {
                    dist[a][b] += weight;
                    dist[b][a] += weight;
                }
            }
        }
    }
    Ok(dist)
}

/// Average linkage (UPGMA) over a full symmetric matrix. Returns per-rank
/// children and heights in merge order.
pub fn upgma(dist: &[Vec<f64>]) -> (Vec<[usize; 2]>, Vec<f64>) {
    let n = dist.len();
    let mut dist: Vec<Vec<f64>> = dist.to_vec();
    let mut active: Vec<usize> = (0..n).collect();
    let mut sizes: Vec<usize> = vec![1; n];
    let mut children = Vec::with_capacity(n.saturating_sub(1));
    let mut heights: Vec<f64> = Vec::with_capacity(n.saturating_sub(1));

    while active.len() > 1 {
        // Find the pair with minimum distance
        let (mut min_i, mut min_j) = (0, 1);
        let mut min_dist = dist[0][1];
        for i in 0..active.len() {
            for j in (i + 1)..active.len() {
                if dist[i][j] < min_dist {
                    min_dist = dist[i][j];
                    min_i = i;
                    min_j = j;
                }
            }
        }

        let last = heights.last().copied().unwrap_or(0.0);
        let height = (min_dist / 2.0).max(last);
        let new_id = n + children.len();
        children.push([active[min_i], active[min_j]]);
        heights.push(height);

        // Merged cluster replaces min_i, min_j is removed
        let (size_i, size_j) = (sizes[min_i], sizes[min_j]);
        for k in 0..active.len() {
            if k == min_i || k == min_j {
                continue;
            }
            let d = (dist[min_i][k] * size_i as f64 + dist[min_j][k] * size_j as f64)
                / (size_i + size_j) as f64;
            dist[min_i][k] = d;
            dist[k][min_i] = d;
        }
        active[min_i] = new_id;
        sizes[min_i] = size_i + size_j;

        active.remove(min_j);
        sizes.remove(min_j);
        dist.remove(min_j);
        for row in dist.iter_mut() {
            row.remove(min_j);
        }
    }

    (children, heights)
}

/// UPGMA tree of the rank distances, heights scaled by the sample size.
pub fn cluster_mean(trees: &[RankedTree]) -> Result<RankedTree> {
    let dist = rank_distances(trees)?;
    let (children, heights) = upgma(&dist);
    let scale = trees.len() as f64;
    let heights = heights.into_iter().map(|h| h / scale).collect();
    let taxa: Arc<TaxonSet> = Arc::clone(trees[0].taxa());
    RankedTree::from_parts(taxa, children, heights)
}
