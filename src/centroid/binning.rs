// binning.rs - Halfway mean over spread-out bins

use log::debug;
use rand::Rng;

use super::halfway::halfway_mean;
use super::TreeMetric;
use crate::error::{Error, Result};
use crate::tree::RankedTree;

pub const BIN_COUNT: usize = 8;
/// Random candidates drawn per additional seed
pub const SEED_DRAWS: usize = 8;

/// Seed `BIN_COUNT` bins far apart, send every other tree to its nearest
/// seed, then take the halfway mean of the per-bin halfway means. Samples
/// smaller than `BIN_COUNT` fall back to a plain halfway mean.
pub fn binned_mean<R: Rng + ?Sized>(
    trees: &[RankedTree],
    metric: &dyn TreeMetric,
    rng: &mut R,
) -> Result<RankedTree> {
    if trees.is_empty() {
        return Err(Error::input("cannot summarise an empty tree sample"));
    }
    if trees.len() < BIN_COUNT {
        return halfway_mean(trees, metric);
    }

    let seeds = choose_seeds(trees, metric, rng)?;
    let mut bins: Vec<Vec<RankedTree>> = seeds.iter().map(|&s| vec![trees[s].clone()]).collect();

    for (i, tree) in trees.iter().enumerate() {
        if seeds.contains(&i) {
            continue;
        }
        let mut nearest = 0;
        let mut nearest_distance = f64::INFINITY;
        for (bin, &seed) in seeds.iter().enumerate() {
            let d = metric.distance(tree, &trees[seed])?;
            if d < nearest_distance {
                nearest = bin;
                nearest_distance = d;
            }
        }
        bins[nearest].push(tree.clone());
    }
    debug!(
        "bin sizes: {:?}",
        bins.iter().map(Vec::len).collect::<Vec<_>>()
    );

    let means = bins
        .iter()
        .map(|bin| halfway_mean(bin, metric))
        .collect::<Result<Vec<_>>>()?;
    halfway_mean(&means, metric)
}

/// Indices of the bin seeds. The first is uniform; each further seed is the
/// best of `SEED_DRAWS` random non-seeds by summed squared distance to the
/// seeds chosen so far.
pub fn choose_seeds<R: Rng + ?Sized>(
    trees: &[RankedTree],
    metric: &dyn TreeMetric,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let mut seeds = vec![rng.gen_range(0..trees.len())];

    while seeds.len() < BIN_COUNT.min(trees.len()) {
        let candidates: Vec<usize> = (0..trees.len()).filter(|i| !seeds.contains(i)).collect();
        let mut best = candidates[0];
        let mut best_score = f64::NEG_INFINITY;
        for _ in 0..SEED_DRAWS {
            let candidate = candidates[rng.gen_range(0..candidates.len())];
            let mut score = 0.0;
            for &seed in &seeds {
                let d = metric.distance(&trees[candidate], &trees[seed])?;
                score += d * d;
            }
            if score > best_score {
                best = candidate;
                best_score = score;
            }
        }
        seeds.push(best);
    }
    Ok(seeds)
}
