// frechet.rs - Running Frechet mean

use log::trace;

use super::TreeMetric;
use crate::error::{Error, Result};
use crate::tree::RankedTree;

/// Online mean: the estimate after `i + 1` trees moves `1 / (i + 1)` of the
/// way towards tree `i` (rounded down to whole moves).
pub fn frechet_mean(trees: &[RankedTree], metric: &dyn TreeMetric) -> Result<RankedTree> {
    let (first, rest) = trees
        .split_first()
        .ok_or_else(|| Error::input("cannot summarise an empty tree sample"))?;

    let mut current = first.clone();
    for (offset, tree) in rest.iter().enumerate() {
        let index = offset + 1;
        let distance = metric.distance(&current, tree)?;
        let step = (distance / (index + 1) as f64).floor() as usize;
        if step > 0 {
            trace!("frechet: tree {} at distance {}, stepping {}", index, distance, step);
            current = metric.path_element(&current, tree, step)?;
        }
    }
    Ok(current)
}
