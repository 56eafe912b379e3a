// search.rs - Randomised trial search for the best centroid

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use super::{CentroidAlgorithm, TreeMetric};
use crate::error::{Error, Result};
use crate::tree::RankedTree;

/// Best candidate found by a search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub centroid: RankedTree,
    pub sum_of_squares: f64,
    /// Trials run after the initial candidate
    pub trials: usize,
    /// Trials that improved on the best candidate
    pub improvements: usize,
}

/// Computes one centroid, then re-runs the algorithm on `trials` shuffled
/// copies of the sample and keeps the candidate with the lowest sum of
/// squared distances to the sample.
pub struct CentroidSearch<M> {
    metric: M,
    algorithm: CentroidAlgorithm,
    trials: usize,
    rng: StdRng,
    show_progress: bool,
}

impl<M: TreeMetric + Clone> CentroidSearch<M> {
    pub fn new(metric: M, algorithm: CentroidAlgorithm) -> Self {
        Self {
            metric,
            algorithm,
            trials: 0,
            rng: StdRng::from_entropy(),
            show_progress: false,
        }
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn algorithm(&self) -> CentroidAlgorithm {
        self.algorithm
    }

    pub fn run(&mut self, trees: &[RankedTree]) -> Result<SearchOutcome> {
        if trees.is_empty() {
            return Err(Error::input("cannot summarise an empty tree sample"));
        }

        let mut best = self.algorithm.compute(trees, &self.metric, &mut self.rng)?;
        let mut best_ssd = sum_of_squared_distances(&self.metric, &best, trees)?;
        info!(
            "🎯 Initial {} centroid: sum of squared distances {}",
            self.algorithm, best_ssd
        );

        if self.trials == 0 {
            return Ok(SearchOutcome {
                centroid: best,
                sum_of_squares: best_ssd,
                trials: 0,
                improvements: 0,
            });
        }

        let pb = if self.show_progress {
            ProgressBar::new(self.trials as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar().template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }

        let tick = std::cmp::max(1, self.trials / 100);
        let milestone = std::cmp::max(1, self.trials / 10);
        let mut order: Vec<RankedTree> = trees.to_vec();
        let mut improvements = 0;

        for trial in 1..=self.trials {
            order.shuffle(&mut self.rng);
            let candidate = self.algorithm.compute(&order, &self.metric, &mut self.rng)?;
            let ssd = sum_of_squared_distances(&self.metric, &candidate, trees)?;
            if ssd < best_ssd {
                debug!("trial {}: sum of squares {} -> {}", trial, best_ssd, ssd);
                best = candidate;
                best_ssd = ssd;
                improvements += 1;
            }

            if trial % tick == 0 || trial == self.trials {
                pb.set_position(trial as u64);
                pb.set_message(format!("best {}", best_ssd));
            }
            if trial % milestone == 0 {
                info!(
                    "🔄 Trial {}/{} ({}%): best sum of squares {}",
                    trial,
                    self.trials,
                    trial * 100 / self.trials,
                    best_ssd
                );
            }
        }
        pb.finish_and_clear();

        Ok(SearchOutcome {
            centroid: best,
            sum_of_squares: best_ssd,
            trials: self.trials,
            improvements,
        })
    }
}

/// Sum over the sample of the squared distance to `candidate`. Each sample
/// tree is compared with its own copy of the metric.
pub fn sum_of_squared_distances<M: TreeMetric + Clone>(
    metric: &M,
    candidate: &RankedTree,
    trees: &[RankedTree],
) -> Result<f64> {
    let distances = trees
        .par_iter()
        .map(|tree| metric.clone().distance(candidate, tree))
        .collect::<Result<Vec<f64>>>()?;
    Ok(distances.iter().map(|d| d * d).sum())
}

/// Sum of squared distances from each focal tree to the sample.
pub fn focal_sums_of_squares<M: TreeMetric + Clone>(
    metric: &M,
    focal: &[RankedTree],
    trees: &[RankedTree],
) -> Result<Vec<f64>> {
    focal
        .iter()
        .map(|f| sum_of_squared_distances(metric, f, trees))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::centroid::test_trees::{caterpillar, taxa};
    use crate::centroid::RnniMetric;

    fn sample() -> Vec<RankedTree> {
        let taxa = taxa(6);
        [
            [0, 1, 2, 3, 4, 5],
            [1, 0, 2, 3, 5, 4],
            [5, 4, 3, 2, 1, 0],
            [0, 2, 1, 3, 4, 5],
            [2, 0, 4, 1, 5, 3],
            [0, 1, 3, 2, 4, 5],
        ]
        .iter()
        .map(|order| caterpillar(&taxa, order))
        .collect()
    }

    #[test]
    fn test_sum_of_squares() {
        let trees = sample();
        let ssd = sum_of_squared_distances(&RnniMetric, &trees[0], &trees).unwrap();
        let expected: f64 = trees
            .iter()
            .map(|t| RnniMetric.distance(&trees[0], t).unwrap().powi(2))
            .sum();
        assert_eq!(ssd, expected);
        let identical = vec![trees[0].clone(); 3];
        assert_eq!(sum_of_squared_distances(&RnniMetric, &trees[0], &identical).unwrap(), 0.0);
    }

    #[test]
    fn test_trials_never_worsen_the_result() {
        let trees = sample();
        let base = CentroidSearch::new(RnniMetric, CentroidAlgorithm::Frechet)
            .with_seed(42)
            .run(&trees)
            .unwrap();
        let searched = CentroidSearch::new(RnniMetric, CentroidAlgorithm::Frechet)
            .with_seed(42)
            .with_trials(20)
            .run(&trees)
            .unwrap();
        assert_eq!(searched.trials, 20);
        assert!(searched.sum_of_squares <= base.sum_of_squares);
        assert!(searched.improvements <= 20);
    }

    #[test]
    fn test_seeded_search_is_reproducible() {
        let trees = sample();
        let run = || {
            CentroidSearch::new(RnniMetric, CentroidAlgorithm::Halfway)
                .with_seed(9)
                .with_trials(10)
                .run(&trees)
                .unwrap()
        };
        let (a, b) = (run(), run());
        assert_eq!(a.centroid, b.centroid);
        assert_eq!(a.sum_of_squares, b.sum_of_squares);
    }

    #[test]
    fn test_reported_sum_matches_centroid() {
        let trees = sample();
        let outcome = CentroidSearch::new(RnniMetric, CentroidAlgorithm::Cluster)
            .with_seed(1)
            .with_trials(3)
            .run(&trees)
            .unwrap();
        let recomputed = sum_of_squared_distances(&RnniMetric, &outcome.centroid, &trees).unwrap();
        assert_eq!(outcome.sum_of_squares, recomputed);
    }

    #[test]
    fn test_focal_sums() {
        let trees = sample();
        let focal = vec![trees[0].clone(), trees[2].clone()];
        let sums = focal_sums_of_squares(&RnniMetric, &focal, &trees).unwrap();
        assert_eq!(sums.len(), 2);
        assert_eq!(sums[0], sum_of_squared_distances(&RnniMetric, &trees[0], &trees).unwrap());
    }

    #[test]
    fn test_empty_sample() {
        let mut search = CentroidSearch::new(RnniMetric, CentroidAlgorithm::Mcc);
        assert!(search.run(&[]).is_err());
    }
}
