use std::collections::VecDeque;

use crate::partition::Partition;

impl Partition {
    /// Check whether a set of nodes induces a connected subgraph.
    /// `in_set` must flag exactly the nodes in `nodes`. The empty set is not connected.
    pub(super) fn is_connected(&self, nodes: &[usize], in_set: &[bool]) -> bool {
        let Some(&start) = nodes.first() else { return false };

        let mut visited = vec![false; self.num_nodes()];
        visited[start] = true;
        let mut seen = 1;
        let mut queue = VecDeque::from([start]);
        while let Some(u) = queue.pop_front() {
            for v in self.graph().edges(u) {
                if in_set[v] && !visited[v] {
                    visited[v] = true;
                    seen += 1;
                    queue.push_back(v);
                }
            }
        }

        seen == nodes.len()
    }

    /// Check if a part is non-empty and connected.
    pub fn is_contiguous(&self, part: u32) -> bool {
        assert!(part < self.num_parts(), "part must be in range [0, {})", self.num_parts());

        let nodes = self.part(part);
        let mut in_part = vec![false; self.num_nodes()];
        nodes.iter().for_each(|&u| in_part[u] = true);
        self.is_connected(nodes, &in_part)
    }

    /// Check that every district is non-empty and connected.
    pub fn all_contiguous(&self) -> bool {
        (1..self.num_parts()).all(|part| self.is_contiguous(part))
    }
}

#[cfg(test)]
mod tests {
    use crate::{graph::grid_graph, partition::Partition};

    #[test]
    fn detects_split_districts() {
        // 3x3 grid; district 1 is the left column plus the right column.
        let assignments = (0..9).map(|i| if i % 3 == 1 { 2 } else { 1 }).collect();
        let partition = Partition::with_assignments(2, grid_graph(3, 3, |_| 1), assignments);

        assert!(!partition.is_contiguous(1));
        assert!(partition.is_contiguous(2));
        assert!(!partition.all_contiguous());
    }

    #[test]
    fn empty_district_is_not_contiguous() {
        let partition = Partition::with_assignments(2, grid_graph(2, 2, |_| 1), vec![1; 4]);
        assert!(partition.is_contiguous(1));
        assert!(!partition.is_contiguous(2));
    }
}
