// halfway.rs - Recursive halfway mean

use super::TreeMetric;
use crate::error::{Error, Result};
use crate::tree::RankedTree;

/// Split the sample at its midpoint, take the mean of each half, and meet
/// halfway between the two.
pub fn halfway_mean(trees: &[RankedTree], metric: &dyn TreeMetric) -> Result<RankedTree> {
    match trees.len() {
        0 => Err(Error::input("cannot summarise an empty tree sample")),
        1 => Ok(trees[0].clone()),
        2 => midpoint(&trees[0], &trees[1], metric),
        n => {
            let (left, right) = trees.split_at(n / 2);
            let left = halfway_mean(left, metric)?;
            let right = halfway_mean(right, metric)?;
            midpoint(&left, &right, metric)
        }
    }
}

/// Tree `floor(d / 2)` moves from `a` towards `b`.
pub fn midpoint(a: &RankedTree, b: &RankedTree, metric: &dyn TreeMetric) -> Result<RankedTree> {
    let distance = metric.distance(a, b)?;
    metric.path_element(a, b, (distance / 2.0).floor() as usize)
}
