// mod.rs - Tree-space centroids over a rearrangement metric

//! Summary trees for a posterior sample. Every strategy is written against
//! [`TreeMetric`], which only has to provide a distance and a way to step
//! along a shortest path between two trees.

pub mod binning;
pub mod cluster;
pub mod frechet;
pub mod halfway;
pub mod mcc;
pub mod rnni;
pub mod search;

pub use rnni::RnniMetric;
pub use search::{sum_of_squared_distances, CentroidSearch, SearchOutcome};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::tree::RankedTree;

/// Distance between ranked trees plus shortest-path stepping.
pub trait TreeMetric: Send + Sync {
    fn distance(&self, a: &RankedTree, b: &RankedTree) -> Result<f64>;

    /// Tree `step` moves along a shortest path from `a` to `b`:
    /// `step == 0` gives `a`, `step >= distance(a, b)` gives `b`'s topology.
    fn path_element(&self, a: &RankedTree, b: &RankedTree, step: usize) -> Result<RankedTree>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CentroidAlgorithm {
    #[default]
    Frechet,
    Halfway,
    Binning,
    Cluster,
    Mcc,
}

impl CentroidAlgorithm {
    pub fn description(&self) -> &'static str {
        match self {
            CentroidAlgorithm::Frechet => "Running Frechet mean along shortest paths",
            CentroidAlgorithm::Halfway => "Recursive halfway mean of the two sample halves",
            CentroidAlgorithm::Binning => "Halfway means of 8 spread-out bins, then of the bin means",
            CentroidAlgorithm::Cluster => "UPGMA over rank-weighted taxon distances",
            CentroidAlgorithm::Mcc => "Maximum clade credibility tree from the sample",
        }
    }

    /// True when the result depends on the order of the sample.
    pub fn is_order_sensitive(&self) -> bool {
        matches!(
            self,
            CentroidAlgorithm::Frechet | CentroidAlgorithm::Halfway | CentroidAlgorithm::Binning
        )
    }

    pub fn compute<R: Rng + ?Sized>(
        &self,
        trees: &[RankedTree],
        metric: &dyn TreeMetric,
        rng: &mut R,
    ) -> Result<RankedTree> {
        if trees.is_empty() {
            return Err(Error::input("cannot summarise an empty tree sample"));
        }
        match self {
            CentroidAlgorithm::Frechet => frechet::frechet_mean(trees, metric),
            CentroidAlgorithm::Halfway => halfway::halfway_mean(trees, metric),
            CentroidAlgorithm::Binning => binning::binned_mean(trees, metric, rng),
            CentroidAlgorithm::Cluster => cluster::cluster_mean(trees),
            CentroidAlgorithm::Mcc => mcc::max_clade_credibility(trees),
        }
    }
}

impl FromStr for CentroidAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "frechet" => Ok(CentroidAlgorithm::Frechet),
            "halfway" => Ok(CentroidAlgorithm::Halfway),
            "binning" | "binned" => Ok(CentroidAlgorithm::Binning),
            "cluster" => Ok(CentroidAlgorithm::Cluster),
            "mcc" => Ok(CentroidAlgorithm::Mcc),
            _ => Err(format!(
                "Unknown algorithm '{}'. Use: frechet, halfway, binning, cluster, mcc",
                s
            )),
        }
    }
}

impl fmt::Display for CentroidAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CentroidAlgorithm::Frechet => "frechet",
            CentroidAlgorithm::Halfway => "halfway",
            CentroidAlgorithm::Binning => "binning",
            CentroidAlgorithm::Cluster => "cluster",
            CentroidAlgorithm::Mcc => "mcc",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
pub(crate) mod test_trees {
    use crate::tree::{RankedTree, TaxonSet};
    use std::sync::Arc;

    pub fn taxa(n: usize) -> Arc<TaxonSet> {
        Arc::new(TaxonSet::new((0..n).map(|i| format!("t{}", i)).collect()).unwrap())
    }

    /// Parse a list of Newick strings over a shared taxon set.
    pub fn parse(taxa: &Arc<TaxonSet>, newicks: &[&str]) -> Vec<RankedTree> {
        newicks
            .iter()
            .map(|s| RankedTree::from_newick_in(s, taxa, None).unwrap())
            .collect()
    }

    /// Caterpillar `(((t0,t1),t2),...)` with unit rank heights.
    pub fn caterpillar(taxa: &Arc<TaxonSet>, order: &[usize]) -> RankedTree {
        let n = taxa.len();
        let mut children = vec![[order[0], order[1]]];
        for (r, &leaf) in order.iter().enumerate().skip(2) {
            children.push([n + r - 2, leaf]);
        }
        let heights = (1..n).map(|h| h as f64).collect();
        RankedTree::from_parts(Arc::clone(taxa), children, heights).unwrap()
    }
}
