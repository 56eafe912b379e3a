// mod.rs - Ranked rooted binary trees over a shared taxon set

//! A ranked tree on `n` taxa has `n` leaves (node ids `0..n`, one per taxon
//! in sorted name order) and `n - 1` internal nodes ranked `1..=n-1` by
//! height. The internal node of rank `r` has id `n + r - 1`, so the root is
//! always `2n - 2`, and every child has a strictly lower id than its parent.

pub mod newick;
pub mod source;

pub use source::{TreeFile, TreeSource};

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Sorted, duplicate-free taxon names shared by all trees of a sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonSet {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl TaxonSet {
    pub fn new(mut names: Vec<String>) -> Result<Self> {
        names.sort();
        if let Some(w) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::input(format!("duplicate taxon '{}'", w[0])));
        }
        if names.len() < 2 {
            return Err(Error::input("a tree needs at least two taxa"));
        }
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Ok(Self { names, index })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, i: usize) -> &str {
        &self.names[i]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// Read-only view of one node during iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: usize,
    /// 0 for leaves
    pub rank: usize,
    pub height: f64,
    pub parent: Option<usize>,
    pub children: Option<[usize; 2]>,
}

#[derive(Debug, Clone)]
pub struct RankedTree {
    taxa: Arc<TaxonSet>,
    /// Children of the internal node of rank `r`, at `r - 1`
    children: Vec<[usize; 2]>,
    /// Parent of every node id
    parents: Vec<Option<usize>>,
    /// Height of the internal node of rank `r`, at `r - 1`
    heights: Vec<f64>,
}

impl RankedTree {
    /// Build from per-rank children and heights, validating the ranking.
    pub fn from_parts(
        taxa: Arc<TaxonSet>,
        children: Vec<[usize; 2]>,
        heights: Vec<f64>,
    ) -> Result<Self> {
        let n = taxa.len();
        if children.len() != n - 1 || heights.len() != n - 1 {
            return Err(Error::input(format!(
                "{} taxa need {} internal nodes, got {}",
                n,
                n - 1,
                children.len()
            )));
        }

        let mut parents = vec![None; 2 * n - 1];
        for (r, pair) in children.iter().enumerate() {
            let id = n + r;
            for &c in pair {
                if c >= id {
                    return Err(Error::input(format!(
                        "node {} at rank {} is not below its parent",
                        c,
                        r + 1
                    )));
                }
                if parents[c].replace(id).is_some() {
                    return Err(Error::input(format!("node {} has two parents", c)));
                }
            }
        }
        if let Some(r) = heights.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::input(format!(
                "height of rank {} is below rank {}",
                r + 2,
                r + 1
            )));
        }

        Ok(Self {
            taxa,
            children,
            parents,
            heights,
        })
    }

    /// Parse a Newick string, using its own leaves as the taxon set.
    pub fn from_newick(input: &str) -> Result<Self> {
        let nodes = newick::parse(input)?;
        let names = nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.name.clone().unwrap_or_default())
            .collect();
        let taxa = Arc::new(TaxonSet::new(names)?);
        Self::from_raw(nodes, &taxa, None)
    }

    /// Parse a Newick string whose leaves must cover `taxa` exactly. Leaf
    /// labels are looked up in `translate` first when one is given.
    pub fn from_newick_in(
        input: &str,
        taxa: &Arc<TaxonSet>,
        translate: Option<&HashMap<String, String>>,
    ) -> Result<Self> {
        Self::from_raw(newick::parse(input)?, taxa, translate)
    }

    fn from_raw(
        nodes: Vec<newick::RawNode>,
        taxa: &Arc<TaxonSet>,
        translate: Option<&HashMap<String, String>>,
    ) -> Result<Self> {
        let n = taxa.len();
        let leaves = nodes.iter().filter(|n| n.is_leaf()).count();
        if leaves != n {
            return Err(Error::input(format!(
                "tree has {} leaves, expected {}",
                leaves, n
            )));
        }
        if let Some(node) = nodes.iter().find(|n| !n.is_leaf() && n.children.len() != 2) {
            return Err(Error::input(format!(
                "tree is not binary: node with {} children",
                node.children.len()
            )));
        }

        // Heights from branch lengths when every edge has one, else from
        // the number of edges to the deepest leaf.
        let timed = nodes.iter().skip(1).all(|n| n.length.is_some());
        let mut raw_heights = vec![0.0; nodes.len()];
        if timed {
            let mut depth = vec![0.0; nodes.len()];
            for (i, node) in nodes.iter().enumerate().skip(1) {
                let length = node.length.unwrap_or(0.0);
                if length < 0.0 {
                    return Err(Error::input(format!("negative branch length {}", length)));
                }
                depth[i] = node.parent.map_or(0.0, |p| depth[p]) + length;
            }
            let max = depth.iter().cloned().fold(0.0, f64::max);
            for (i, node) in nodes.iter().enumerate() {
                if !node.is_leaf() {
                    raw_heights[i] = max - depth[i];
                }
            }
        } else {
            for i in (0..nodes.len()).rev() {
                let h = nodes[i]
                    .children
                    .iter()
                    .map(|&c| raw_heights[c] + 1.0)
                    .fold(0.0, f64::max);
                raw_heights[i] = h;
            }
        }

        // Rank by height; ties go to the later-allocated node, which is
        // never an ancestor of the earlier one.
        let mut internal: Vec<usize> = (0..nodes.len()).filter(|&i| !nodes[i].is_leaf()).collect();
        internal.sort_by(|&a, &b| {
            raw_heights[a]
                .total_cmp(&raw_heights[b])
                .then_with(|| b.cmp(&a))
        });

        let mut id_of = vec![0; nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            if node.is_leaf() {
                let label = node
                    .name
                    .as_deref()
                    .ok_or_else(|| Error::input("unnamed leaf"))?;
                let name = translate
                    .and_then(|t| t.get(label))
                    .map(String::as_str)
                    .unwrap_or(label);
                id_of[i] = taxa
                    .index_of(name)
                    .ok_or_else(|| Error::input(format!("unknown taxon '{}'", name)))?;
            }
        }
        for (r, &i) in internal.iter().enumerate() {
            id_of[i] = n + r;
        }

        let children = internal
            .iter()
            .map(|&i| [id_of[nodes[i].children[0]], id_of[nodes[i].children[1]]])
            .collect();
        let heights = internal.iter().map(|&i| raw_heights[i]).collect();
        Self::from_parts(Arc::clone(taxa), children, heights)
    }

    pub fn taxa(&self) -> &Arc<TaxonSet> {
        &self.taxa
    }

    pub fn leaf_count(&self) -> usize {
        self.taxa.len()
    }

    pub fn node_count(&self) -> usize {
        2 * self.leaf_count() - 1
    }

    pub fn root(&self) -> usize {
        self.node_count() - 1
    }

    pub fn node_id(&self, rank: usize) -> usize {
        self.leaf_count() + rank - 1
    }

    pub fn rank(&self, id: usize) -> usize {
        let n = self.leaf_count();
        if id < n {
            0
        } else {
            id - n + 1
        }
    }

    pub fn is_leaf(&self, id: usize) -> bool {
        id < self.leaf_count()
    }

    pub fn children(&self, id: usize) -> Option<[usize; 2]> {
        if self.is_leaf(id) {
            None
        } else {
            Some(self.children[self.rank(id) - 1])
        }
    }

    pub fn parent(&self, id: usize) -> Option<usize> {
        self.parents[id]
    }

    pub fn height(&self, id: usize) -> f64 {
        if self.is_leaf(id) {
            0.0
        } else {
            self.heights[self.rank(id) - 1]
        }
    }

    /// Heights of internal nodes in rank order.
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Leaves first, then internal nodes by increasing rank.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        (0..self.node_count()).map(move |id| Node {
            id,
            rank: self.rank(id),
            height: self.height(id),
            parent: self.parent(id),
            children: self.children(id),
        })
    }

    /// Copy `other`'s topology and heights into this tree.
    pub fn assign_from(&mut self, other: &RankedTree) -> Result<()> {
        if !self.same_taxa(other) {
            return Err(Error::input("cannot assign a tree over different taxa"));
        }
        self.children.clone_from(&other.children);
        self.parents.clone_from(&other.parents);
        self.heights.clone_from(&other.heights);
        Ok(())
    }

    pub fn same_taxa(&self, other: &RankedTree) -> bool {
        Arc::ptr_eq(&self.taxa, &other.taxa) || self.taxa == other.taxa
    }

    /// Equal ranked topologies, ignoring heights.
    pub fn same_topology(&self, other: &RankedTree) -> bool {
        self.same_taxa(other)
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| sorted_pair(*a) == sorted_pair(*b))
    }

    /// Sorted leaf set below each internal node, by rank.
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let n = self.leaf_count();
        let mut clusters: Vec<Vec<usize>> = Vec::with_capacity(n - 1);
        for pair in &self.children {
            let mut cluster = Vec::new();
            for &c in pair {
                if c < n {
                    cluster.push(c);
                } else {
                    cluster.extend_from_slice(&clusters[c - n]);
                }
            }
            cluster.sort_unstable();
            clusters.push(cluster);
        }
        clusters
    }

    /// Most recent common ancestor of two nodes.
    pub fn mrca(&self, a: usize, b: usize) -> usize {
        let (mut a, mut b) = (a, b);
        while a != b {
            if a < b {
                a = self.parents[a].unwrap_or(a);
            } else {
                b = self.parents[b].unwrap_or(b);
            }
        }
        a
    }

    /// Child of `ancestor` on the path up from `node`, if `node` lies strictly
    /// below `ancestor`.
    pub fn child_towards(&self, ancestor: usize, node: usize) -> Option<usize> {
        let mut current = node;
        while current < ancestor {
            let parent = self.parents[current]?;
            if parent == ancestor {
                return Some(current);
            }
            current = parent;
        }
        None
    }

    /// Exchange the nodes at ranks `rank` and `rank + 1`. The upper node
    /// must not be the parent of the lower one.
    pub(crate) fn swap_ranks(&mut self, rank: usize) {
        let lower = self.node_id(rank);
        let upper = lower + 1;
        debug_assert!(self.parents[lower] != Some(upper));

        let lower_parent = self.parents[lower];
        let upper_parent = self.parents[upper];
        self.children.swap(rank - 1, rank);

        for &c in &self.children[rank - 1] {
            self.parents[c] = Some(lower);
        }
        for &c in &self.children[rank] {
            self.parents[c] = Some(upper);
        }

        let mut touched = vec![lower_parent];
        if upper_parent != lower_parent {
            touched.push(upper_parent);
        }
        for p in touched.into_iter().flatten() {
            let r = self.rank(p);
            for slot in self.children[r - 1].iter_mut() {
                if *slot == lower {
                    *slot = upper;
                } else if *slot == upper {
                    *slot = lower;
                }
            }
        }
        self.parents[lower] = upper_parent;
        self.parents[upper] = lower_parent;
    }

    /// Nearest neighbour interchange on the edge between the node at `rank`
    /// and its child at `rank - 1`: `keep` (a child of the lower node) stays,
    /// its sibling trades places with the upper node's other child.
    pub(crate) fn interchange(&mut self, rank: usize, keep: usize) {
        let upper = self.node_id(rank);
        let lower = upper - 1;
        let [a, b] = self.children[rank - 2];
        let moved_down = if a == keep { b } else { a };
        let [c, d] = self.children[rank - 1];
        let moved_up_from = if c == lower { d } else { c };

        self.children[rank - 2] = [keep, moved_up_from];
        self.children[rank - 1] = [lower, moved_down];
        self.parents[moved_up_from] = Some(lower);
        self.parents[moved_down] = Some(upper);
    }

    pub fn to_newick(&self) -> String {
        self.to_newick_with(&|leaf| newick::quote_name(self.taxa.name(leaf)))
    }

    /// Newick string with leaves written by `label`.
    pub fn to_newick_with(&self, label: &dyn Fn(usize) -> String) -> String {
        let mut buf = String::new();
        self.write_subtree(self.root(), label, &mut buf);
        buf.push(';');
        buf
    }

    fn write_subtree(&self, id: usize, label: &dyn Fn(usize) -> String, buf: &mut String) {
        match self.children(id) {
            Some([l, r]) => {
                buf.push('(');
                self.write_subtree(l, label, buf);
                buf.push(',');
                self.write_subtree(r, label, buf);
                buf.push(')');
            }
            None => buf.push_str(&label(id)),
        }
        if let Some(p) = self.parent(id) {
            buf.push(':');
            buf.push_str(&newick::format_length(self.height(p) - self.height(id)));
        }
    }
}

impl PartialEq for RankedTree {
    fn eq(&self, other: &Self) -> bool {
        self.same_topology(other) && self.heights == other.heights
    }
}

fn sorted_pair([a, b]: [usize; 2]) -> [usize; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_newick_ranks_by_height() {
        let tree = RankedTree::from_newick("((A:1,B:1):2,(C:2,D:2):1);").unwrap();
        assert_eq!(tree.leaf_count(), 4);
        assert_eq!(tree.node_count(), 7);
        // (A,B) at height 1 is rank 1, (C,D) at height 2 is rank 2
        assert_eq!(tree.children(4), Some([0, 1]));
        assert_eq!(tree.children(5), Some([2, 3]));
        assert_eq!(tree.heights(), &[1.0, 2.0, 3.0]);
        assert_eq!(tree.parent(0), Some(4));
        assert_eq!(tree.parent(6), None);
    }

    #[test]
    fn test_untimed_tree_uses_edge_depth() {
        let tree = RankedTree::from_newick("(((A,B),C),D);").unwrap();
        assert_eq!(tree.clusters()[0], vec![0, 1]);
        assert_eq!(tree.clusters()[1], vec![0, 1, 2]);
        assert_eq!(tree.heights(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_non_binary_rejected() {
        assert!(matches!(
            RankedTree::from_newick("(A,B,C);"),
            Err(Error::InputFormat(_))
        ));
        assert!(RankedTree::from_newick("(A,A);").is_err());
    }

    #[test]
    fn test_newick_round_trip_keeps_topology_and_heights() {
        let tree = RankedTree::from_newick("((A:1,B:1):2,(C:2,D:2):1);").unwrap();
        let text = tree.to_newick();
        assert_eq!(text, "((A:1,B:1):2,(C:2,D:2):1);");
        let again = RankedTree::from_newick_in(&text, tree.taxa(), None).unwrap();
        assert_eq!(again, tree);
    }

    #[test]
    fn test_translate_table() {
        let taxa = Arc::new(TaxonSet::new(vec!["X".into(), "Y".into(), "Z".into()]).unwrap());
        let translate: HashMap<String, String> = [("1", "X"), ("2", "Y"), ("3", "Z")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let tree = RankedTree::from_newick_in("((1:1,3:1):1,2:2);", &taxa, Some(&translate)).unwrap();
        assert_eq!(tree.clusters()[0], vec![0, 2]);
        assert!(RankedTree::from_newick_in("((1,4),2);", &taxa, Some(&translate)).is_err());
    }

    #[test]
    fn test_swap_ranks_keeps_clusters() {
        let mut tree = RankedTree::from_newick("((A:1,B:1):2,(C:2,D:2):1);").unwrap();
        tree.swap_ranks(1);
        let clusters = tree.clusters();
        assert_eq!(clusters[0], vec![2, 3]);
        assert_eq!(clusters[1], vec![0, 1]);
        assert_eq!(tree.parent(0), Some(5));
        assert_eq!(tree.parent(2), Some(4));
        assert_eq!(tree.children(6).map(sorted_pair), Some([4, 5]));
        assert_eq!(tree.heights(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_interchange() {
        // rank 2 = ((A,B),C), rank 3 = root with D
        let mut tree = RankedTree::from_newick("(((A,B),C),D);").unwrap();
        tree.interchange(3, 2);
        // (A,B) at rank 1 moved up to the root, D joined C
        assert_eq!(tree.clusters()[1], vec![2, 3]);
        assert_eq!(tree.parent(3), Some(5));
        assert_eq!(tree.parent(4), Some(6));
    }

    #[test]
    fn test_mrca_and_child_towards() {
        let tree = RankedTree::from_newick("((A:1,B:1):2,(C:2,D:2):1);").unwrap();
        assert_eq!(tree.mrca(0, 1), 4);
        assert_eq!(tree.mrca(0, 3), 6);
        assert_eq!(tree.child_towards(6, 0), Some(4));
        assert_eq!(tree.child_towards(5, 0), None);
    }

    #[test]
    fn test_assign_from_requires_same_taxa() {
        let a = RankedTree::from_newick("((A:1,B:1):1,C:2);").unwrap();
        let b = RankedTree::from_newick_in("((A:1,C:1):1,B:2);", a.taxa(), None).unwrap();
        let mut target = a.clone();
        target.assign_from(&b).unwrap();
        assert_eq!(target, b);

        let other = RankedTree::from_newick("((X:1,Y:1):1,Z:2);").unwrap();
        assert!(target.assign_from(&other).is_err());
    }

    #[test]
    fn test_nodes_iteration() {
        let tree = RankedTree::from_newick("((A:1,B:1):1,C:2);").unwrap();
        let nodes: Vec<Node> = tree.nodes().collect();
        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes.iter().filter(|n| n.children.is_none()).count(), 3);
        assert_eq!(nodes[4].rank, 2);
        assert_eq!(nodes[4].height, 2.0);
    }

    #[test]
    fn test_from_parts_validation() {
        let taxa = Arc::new(TaxonSet::new(vec!["A".into(), "B".into(), "C".into()]).unwrap());
        assert!(RankedTree::from_parts(Arc::clone(&taxa), vec![[0, 1], [3, 2]], vec![1.0, 2.0]).is_ok());
        // child above parent
        assert!(RankedTree::from_parts(Arc::clone(&taxa), vec![[0, 4], [3, 2]], vec![1.0, 2.0]).is_err());
        // heights out of order
        assert!(RankedTree::from_parts(Arc::clone(&taxa), vec![[0, 1], [3, 2]], vec![2.0, 1.0]).is_err());
        // shared child
        assert!(RankedTree::from_parts(taxa, vec![[0, 1], [3, 1]], vec![1.0, 2.0]).is_err());
    }
}
