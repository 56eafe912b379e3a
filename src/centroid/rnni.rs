// rnni.rs - Ranked nearest neighbour interchange distance (FindPath)

use super::TreeMetric;
use crate::error::{Error, Result};
use crate::tree::RankedTree;

/// RNNI metric on ranked trees.
///
/// One move is either an NNI on an edge joining nodes of consecutive
/// ranks, or a swap of two consecutive ranks whose nodes are not adjacent.
/// The shortest path is built bottom-up: for each rank `k` of the target,
/// the MRCA of the target's rank-`k` cluster is pushed down one rank at a
/// time until it sits at rank `k`. Heights stay attached to ranks, so every
/// tree on the path keeps the starting tree's heights.
#[derive(Debug, Clone, Copy, Default)]
pub struct RnniMetric;

impl RnniMetric {
    /// Follow the path from `from` to `to`, stopping after `limit` moves.
    /// Returns the tree reached and the number of moves made.
    pub fn walk(
        &self,
        from: &RankedTree,
        to: &RankedTree,
        limit: Option<usize>,
    ) -> Result<(RankedTree, usize)> {
        if !from.same_taxa(to) {
            return Err(Error::input(
                "RNNI distance needs trees over the same taxa",
            ));
        }

        let mut current = from.clone();
        let mut moves = 0;
        let n = from.leaf_count();

        for k in 1..n.saturating_sub(1) {
            // Ranks below k already agree, so the target's children ids are
            // valid node ids in `current` too.
            let Some([c1, c2]) = to.children(to.node_id(k)) else {
                continue;
            };
            let mut m = current.rank(current.mrca(c1, c2));

            while m > k {
                if limit == Some(moves) {
                    return Ok((current, moves));
                }
                let upper = current.node_id(m);
                let lower = upper - 1;
                if current.parent(lower) == Some(upper) {
                    let keep = current
                        .child_towards(lower, c1)
                        .or_else(|| current.child_towards(lower, c2))
                        .ok_or_else(|| {
                            Error::numerical(format!("inconsistent ranking at rank {}", m))
                        })?;
                    current.interchange(m, keep);
                } else {
                    current.swap_ranks(m - 1);
                }
                moves += 1;
                m -= 1;
            }
        }

        Ok((current, moves))
    }
}

impl TreeMetric for RnniMetric {
    fn distance(&self, a: &RankedTree, b: &RankedTree) -> Result<f64> {
        Ok(self.walk(a, b, None)?.1 as f64)
    }

    fn path_element(&self, a: &RankedTree, b: &RankedTree, step: usize) -> Result<RankedTree> {
        Ok(self.walk(a, b, Some(step))?.0)
    }
}
