use rand::{seq::{IndexedRandom, SliceRandom}, Rng};
use tracing::trace;

use crate::{chain::ProposalError, partition::Partition};

/// Balance requirements and retry limits for splitting a merged region in two.
#[derive(Clone, Debug)]
pub struct SplitParams<'a> {
    pub pop_series: &'a str,
    /// Inclusive population bounds each side of the split must satisfy.
    pub min_pop: f64,
    pub max_pop: f64,
    /// Spanning trees drawn from one root before a new root is chosen.
    pub node_repeats: usize,
    /// Spanning trees drawn before giving up.
    pub max_attempts: usize,
}

/// Rooted spanning tree with subtrees laid out contiguously in preorder.
#[derive(Debug)]
struct SpanningTree {
    parent: Vec<Option<usize>>, // parent[root] = root; None if node not in tree.
    order: Vec<usize>,          // preorder over nodes in the tree
    index: Vec<Option<usize>>,  // preorder entry index, or None if node not in tree.
    size: Vec<Option<usize>>,   // subtree sizes, or None if node not in tree.
}

impl SpanningTree {
    /// Subtree of `node` as a slice of the preorder.
    #[inline]
    fn subtree_slice(&self, node: usize) -> Option<&[usize]> {
        let index = self.index[node]?;
        let size = self.size[node]?;
        Some(&self.order[index .. index + size])
    }
}

impl Partition {
    /// Merge parts `a` and `b` and re-split the region along a random balanced
    /// spanning-tree cut. The cut-off subtree becomes `a` and the rest `b`.
    /// On failure the partition is left unchanged.
    pub fn recombine_parts(&mut self, a: u32, b: u32, params: &SplitParams, rng: &mut impl Rng) -> Result<(), ProposalError> {
        assert!(a != b && a < self.num_parts() && b < self.num_parts(),
            "a and b must be distinct parts in range [0, {})", self.num_parts());
        assert!(self.graph().node_weights().contains(params.pop_series),
            "unknown node weight series {:?}", params.pop_series);

        let mut region = self.part(a).to_vec();
        region.extend_from_slice(self.part(b));
        let mut in_region = vec![false; self.num_nodes()];
        region.iter().for_each(|&u| in_region[u] = true);

        if !self.is_connected(&region, &in_region) { return Err(ProposalError::DisconnectedRegion { a, b }) }

        let mut pop = vec![0.0; self.num_nodes()];
        for &u in &region {
            pop[u] = self.graph().node_weights().get_as_f64(params.pop_series, u).unwrap_or_default();
        }

        let node_repeats = params.node_repeats.max(1);
        let mut root = region[0];
        for attempt in 0..params.max_attempts {
            if attempt % node_repeats == 0 {
                root = region.choose(rng).copied().unwrap_or(root);
            }

            let tree = self.random_spanning_tree(&region, &in_region, root, rng);
            let cuts = balanced_cuts(&tree, &pop, params.min_pop, params.max_pop);
            let Some(&cut) = cuts.choose(rng) else { continue };

            let mut in_subtree = vec![false; self.num_nodes()];
            let subtree = tree.subtree_slice(cut).unwrap_or_default().to_vec();
            subtree.iter().for_each(|&u| in_subtree[u] = true);
            let rest = region.iter().copied().filter(|&u| !in_subtree[u]).collect::<Vec<_>>();

            self.move_subgraph(&subtree, a);
            self.move_subgraph(&rest, b);

            trace!(a, b, attempt, candidates = cuts.len(), "recombined districts");
            return Ok(())
        }

        Err(ProposalError::BipartitionFailed { a, b, attempts: params.max_attempts })
    }

    /// Random neighbor of `node` inside the region, or None if it has none.
    fn random_region_neighbor(&self, node: usize, in_region: &[bool], rng: &mut impl Rng) -> Option<usize> {
        let count = self.graph().edges(node).filter(|&v| in_region[v]).count();
        if count == 0 { return None }
        let k = rng.random_range(0..count);
        self.graph().edges(node).filter(|&v| in_region[v]).nth(k)
    }

    /// Uniform random spanning tree of a connected region, using Wilson's algorithm.
    fn random_spanning_tree(&self, region: &[usize], in_region: &[bool], root: usize, rng: &mut impl Rng) -> SpanningTree {
        let mut nodes = region.to_vec();
        nodes.shuffle(rng);

        let mut parent = vec![None; self.num_nodes()];
        parent[root] = Some(root);

        // Loop-erased random walks
        let mut walk_start = vec![usize::MAX; self.num_nodes()];
        let mut walk_position = vec![0; self.num_nodes()];

        for &start in &nodes {
            if parent[start].is_some() { continue } // already in the tree

            let mut walk = vec![start];
            walk_start[start] = start;
            walk_position[start] = 0;

            // Walk until we hit the tree
            let mut current = start;
            while parent[current].is_none() {
                let Some(next) = self.random_region_neighbor(current, in_region, rng) else { break };
                current = next;

                if walk_start[current] == start && walk.get(walk_position[current]) == Some(&current) {
                    walk.truncate(walk_position[current] + 1);
                } else {
                    walk_start[current] = start;
                    walk_position[current] = walk.len();
                    walk.push(current);
                }
            }

            // Stitch the loop-erased path into the tree, from the tree back to `start`.
            while let Some(node) = walk.pop() {
                if parent[node].is_some() { continue }
                parent[node] = Some(current);
                current = node;
            }
        }

        // Preorder with contiguous subtrees
        let mut children = vec![Vec::new(); self.num_nodes()];
        for &u in region {
            if let Some(p) = parent[u] {
                if p != u { children[p].push(u) }
            }
        }

        let mut order = Vec::with_capacity(region.len());
        let mut index = vec![None; self.num_nodes()];
        let mut size = vec![None; self.num_nodes()];

        let mut stack = vec![(root, false)];
        while let Some((i, entered)) = stack.pop() {
            if !entered {
                index[i] = Some(order.len());
                order.push(i);
                stack.push((i, true));
                for &u in children[i].iter().rev() { stack.push((u, false)) }
            } else {
                size[i] = Some(1 + children[i].iter().filter_map(|&u| size[u]).sum::<usize>());
            }
        }

        SpanningTree { parent, order, index, size }
    }
}

/// Non-root nodes `u` such that cutting (parent[u], u) leaves both sides within [min, max].
fn balanced_cuts(tree: &SpanningTree, pop: &[f64], min: f64, max: f64) -> Vec<usize> {
    let mut prefix = Vec::with_capacity(tree.order.len() + 1);
    prefix.push(0.0);
    for &u in &tree.order { prefix.push(prefix[prefix.len() - 1] + pop[u]) }
    let total = prefix[prefix.len() - 1];

    tree.order.iter().skip(1)
        .copied()
        .filter(|&u| tree.parent[u].is_some())
        .filter(|&u| {
            let (Some(index), Some(size)) = (tree.index[u], tree.size[u]) else { return false };
            let inside = prefix[index + size] - prefix[index];
            let outside = total - inside;
            (min..=max).contains(&inside) && (min..=max).contains(&outside)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{graph::grid_graph, partition::partition::tests::assert_consistent};

    fn halves(width: usize, height: usize) -> Partition {
        let assignments = (0..width * height).map(|i| if i % width < width / 2 { 1 } else { 2 }).collect();
        Partition::with_assignments(2, grid_graph(width, height, |_| 1), assignments)
    }

    fn params(min_pop: f64, max_pop: f64) -> SplitParams<'static> {
        SplitParams { pop_series: "POP", min_pop, max_pop, node_repeats: 1, max_attempts: 1000 }
    }

    #[test]
    fn spanning_tree_covers_region() {
        let partition = halves(4, 4);
        let region = (0..16).collect::<Vec<_>>();
        let in_region = vec![true; 16];
        let mut rng = StdRng::seed_from_u64(1);

        let tree = partition.random_spanning_tree(&region, &in_region, 5, &mut rng);
        assert_eq!(tree.order.len(), 16);
        assert_eq!(tree.order[0], 5);
        assert_eq!(tree.subtree_slice(5).map(<[usize]>::len), Some(16));
        // Every tree edge is a graph edge.
        for &u in &tree.order[1..] {
            let p = tree.parent[u].unwrap();
            assert!(partition.graph().edges(u).any(|v| v == p));
        }
    }

    #[test]
    fn recombination_is_balanced_and_contiguous() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..25 {
            let mut partition = halves(6, 4);
            partition.recombine_parts(1, 2, &params(10.0, 14.0), &mut rng).unwrap();

            for pop in partition.part_totals("POP") { assert!((10.0..=14.0).contains(&pop), "pop = {pop}") }
            assert!(partition.all_contiguous());
            assert_eq!(partition.total("POP"), 24.0);
            assert_consistent(&partition);
        }
    }

    #[test]
    fn impossible_balance_fails_without_changes() {
        let mut partition = halves(4, 4);
        let before = partition.assignments();
        let mut rng = StdRng::seed_from_u64(3);

        let result = partition.recombine_parts(1, 2, &SplitParams { max_attempts: 5, ..params(7.25, 7.75) }, &mut rng);
        assert!(matches!(result, Err(ProposalError::BipartitionFailed { attempts: 5, .. })));
        assert_eq!(partition.assignments(), before);
    }

    #[test]
    fn non_adjacent_districts_are_rejected() {
        let mut partition = Partition::with_assignments(3, grid_graph(3, 1, |_| 1), vec![1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(0);
        let result = partition.recombine_parts(1, 3, &params(0.0, 10.0), &mut rng);
        assert!(matches!(result, Err(ProposalError::DisconnectedRegion { a: 1, b: 3 })));
    }

    #[test]
    fn balanced_cuts_use_subtree_populations() {
        // Path 0 - 1 - 2 - 3 rooted at 0, populations 1, 2, 3, 4.
        let tree = SpanningTree {
            parent: vec![Some(0), Some(0), Some(1), Some(2)],
            order: vec![0, 1, 2, 3],
            index: vec![Some(0), Some(1), Some(2), Some(3)],
            size: vec![Some(4), Some(3), Some(2), Some(1)],
        };
        let pop = [1.0, 2.0, 3.0, 4.0];
        // Cutting above 2 gives {2, 3} = 7 vs {0, 1} = 3; above 3 gives 4 vs 6.
        assert_eq!(balanced_cuts(&tree, &pop, 4.0, 6.0), vec![3]);
        assert_eq!(balanced_cuts(&tree, &pop, 3.0, 7.0), vec![2, 3]);
        assert!(balanced_cuts(&tree, &pop, 5.0, 5.0).is_empty());
    }
}
