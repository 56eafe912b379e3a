// mcc.rs - Maximum clade credibility tree

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::tree::RankedTree;

/// Fraction of the sample containing each clade (leaf set of an internal node).
pub fn clade_frequencies(trees: &[RankedTree]) -> HashMap<Vec<usize>, f64> {
    let mut counts: HashMap<Vec<usize>, usize> = HashMap::new();
    for tree in trees {
        for clade in tree.clusters() {
            *counts.entry(clade).or_insert(0) += 1;
        }
    }
    let total = trees.len() as f64;
    counts
        .into_iter()
        .map(|(clade, count)| (clade, count as f64 / total))
        .collect()
}

/// Sample tree with the largest product of clade credibilities; the first
/// one wins ties.
pub fn max_clade_credibility(trees: &[RankedTree]) -> Result<RankedTree> {
    if trees.is_empty() {
        return Err(Error::input("cannot summarise an empty tree sample"));
    }
    let frequencies = clade_frequencies(trees);

    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, tree) in trees.iter().enumerate() {
        let score: f64 = tree
            .clusters()
            .iter()
            .map(|clade| frequencies.get(clade).copied().unwrap_or(0.0).ln())
            .sum();
        if score > best_score {
            best = i;
            best_score = score;
        }
    }
    Ok(trees[best].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::centroid::test_trees::{caterpillar, taxa};

    #[test]
    fn test_majority_topology_wins() {
        let taxa = taxa(4);
        let common = caterpillar(&taxa, &[0, 1, 2, 3]);
        let rare = caterpillar(&taxa, &[3, 2, 1, 0]);
        let trees = vec![rare.clone(), common.clone(), common.clone()];
        assert_eq!(max_clade_credibility(&trees).unwrap(), common);
    }

    #[test]
    fn test_clade_frequencies() {
        let taxa = taxa(3);
        let a = caterpillar(&taxa, &[0, 1, 2]);
        let b = caterpillar(&taxa, &[0, 2, 1]);
        let freqs = clade_frequencies(&[a, b]);
        assert_eq!(freqs[&vec![0, 1]], 0.5);
        assert_eq!(freqs[&vec![0, 1, 2]], 1.0);
    }
}
