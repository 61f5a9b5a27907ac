use std::sync::Arc;

use ahash::AHashMap;
use anyhow::{bail, ensure, Context, Result};
use polars::prelude::DataType;
use rand::{seq::IndexedRandom, Rng};

use crate::{
    graph::{Graph, WeightMatrix},
    layer::Layer,
    partition::{MultiSet, PartitionSet},
};

/// An assignment of graph nodes to parts (districts), with cached aggregates.
/// Part 0 holds unassigned nodes; districts are numbered 1..num_parts.
#[derive(Clone, Debug)]
pub struct Partition {
    pub(super) parts: PartitionSet,  // Sets of nodes in each part (including unassigned 0)
    pub(super) frontiers: MultiSet,  // Nodes on the boundary of each part
    pub(super) cut_edges: MultiSet,  // Undirected edge indices whose endpoints differ (single set)
    part_weights: WeightMatrix,      // Per-part totals of every node weight series
    graph: Arc<Graph>,
}

impl Partition {
    /// Construct a partition with every node unassigned.
    pub fn new(num_parts: usize, graph: impl Into<Arc<Graph>>) -> Self {
        assert!(num_parts > 0, "num_parts must be at least 1");
        let graph: Arc<Graph> = graph.into();

        let mut part_weights = graph.node_weights().copy_of_size(num_parts);
        part_weights.set_row_to_sum_of(0, graph.node_weights());

        Self {
            parts: PartitionSet::new(num_parts, graph.node_count()),
            frontiers: MultiSet::new(num_parts, graph.node_count()),
            cut_edges: MultiSet::new(1, graph.edge_count()),
            part_weights,
            graph,
        }
    }

    /// Construct a partition into `num_districts` districts from per-node labels in 1..=num_districts.
    pub fn with_assignments(num_districts: u32, graph: impl Into<Arc<Graph>>, assignments: Vec<u32>) -> Self {
        let mut partition = Self::new(num_districts as usize + 1, graph);
        partition.set_assignments(assignments);
        partition
    }

    /// Construct a partition from a layer column of district labels (integers or numeric strings).
    /// Every label must lie in 1..=num_districts.
    pub fn from_layer_column(graph: impl Into<Arc<Graph>>, layer: &Layer, column: &str, num_districts: u32) -> Result<Self> {
        let graph: Arc<Graph> = graph.into();
        ensure!(layer.len() == graph.node_count(),
            "[partition::from_layer_column] layer has {} units but graph has {} nodes", layer.len(), graph.node_count());

        let labels = layer.data().column(column)
            .with_context(|| format!("[partition::from_layer_column] Missing assignment column {column:?}"))?;

        let assignments = match labels.dtype() {
            DataType::String => labels.str()?.into_iter().enumerate()
                .map(|(node, label)| {
                    let label = label.with_context(|| format!("node {node} has no district label"))?;
                    label.trim().parse::<u32>()
                        .with_context(|| format!("node {node} has non-numeric district label {label:?}"))
                })
                .collect::<Result<Vec<_>>>()?,
            dtype if dtype.is_primitive_numeric() => labels.cast(&DataType::Float64)?.f64()?.into_iter().enumerate()
                .map(|(node, label)| match label {
                    Some(label) if label.fract() == 0.0 && label >= 0.0 => Ok(label as u32),
                    _ => bail!("node {node} has invalid district label {label:?}"),
                })
                .collect::<Result<Vec<_>>>()?,
            dtype => bail!("[partition::from_layer_column] Column {column:?} has unsupported type {dtype}"),
        };

        if let Some((node, label)) = assignments.iter().enumerate().find(|&(_, &p)| p == 0 || p > num_districts) {
            bail!("[partition::from_layer_column] node {node} has district {label}, expected 1..={num_districts}");
        }

        Ok(Self::with_assignments(num_districts, graph, assignments))
    }

    /// Number of parts, including unassigned 0.
    #[inline] pub fn num_parts(&self) -> u32 { self.parts.num_sets() as u32 }

    /// Number of districts (parts other than 0).
    #[inline] pub fn num_districts(&self) -> u32 { self.num_parts() - 1 }

    #[inline] pub fn num_nodes(&self) -> usize { self.graph.node_count() }

    #[inline] pub fn graph(&self) -> &Graph { &self.graph }

    /// Part of a given node.
    #[inline] pub fn assignment(&self, node: usize) -> u32 { self.parts.find(node) as u32 }

    /// Part of every node.
    #[inline]
    pub fn assignments(&self) -> Vec<u32> {
        self.parts.assignments().iter().map(|&p| p as u32).collect()
    }

    /// Nodes in a given part.
    #[inline] pub fn part(&self, part: u32) -> &[usize] { self.parts.get(part as usize) }

    /// Nodes of a part with at least one neighbor in another part.
    #[inline] pub fn frontier(&self, part: u32) -> &[usize] { self.frontiers.get(part as usize) }

    /// Whether a node has a neighbor in another part.
    #[inline] pub fn is_frontier_node(&self, node: usize) -> bool { self.frontiers.contains(node) }

    /// Replace all assignments and recompute every cache.
    pub fn set_assignments(&mut self, assignments: Vec<u32>) {
        assert!(assignments.len() == self.num_nodes(), "assignments.len() must equal number of nodes");
        assert!(assignments.iter().all(|&p| p < self.num_parts()), "all assignments must be in range [0, {})", self.num_parts());

        self.parts.rebuild(&assignments.iter().map(|&p| p as usize).collect::<Vec<_>>());

        let owned = Arc::clone(&self.graph);
        let graph: &Graph = &owned;
        let num_nodes = graph.node_count();

        self.frontiers.rebuild_from((0..num_nodes)
            .filter(|&u| graph.edges(u).any(|v| assignments[v] != assignments[u]))
            .map(|u| (u, assignments[u] as usize)));

        self.cut_edges.rebuild_from((0..num_nodes)
            .flat_map(|u| graph.edges(u).enumerate().map(move |(i, v)| (u, v, graph.offset(u) + i)))
            .filter(|&(u, v, _)| u < v && assignments[u] != assignments[v])
            .map(|(_, _, edge)| (edge, 0)));

        self.part_weights.clear_all_rows();
        for (node, &part) in assignments.iter().enumerate() {
            self.part_weights.add_row_from(part as usize, graph.node_weights(), node);
        }
    }

    /// Sum of a given series over a part. Panics if the series is not a node weight.
    pub fn part_total(&self, series: &str, part: u32) -> f64 {
        self.part_weights.get_as_f64(series, part as usize)
            .unwrap_or_else(|| panic!("unknown node weight series {series:?}"))
    }

    /// Sum of a given series for each district 1..=num_districts.
    pub fn part_totals(&self, series: &str) -> Vec<f64> {
        (1..self.num_parts()).map(|part| self.part_total(series, part)).collect()
    }

    /// Sum of a given series over every node.
    pub fn total(&self, series: &str) -> f64 {
        (0..self.num_parts()).map(|part| self.part_total(series, part)).sum()
    }

    /// Number of edges whose endpoints lie in different parts.
    #[inline] pub fn cut_edge_count(&self) -> usize { self.cut_edges.get(0).len() }

    /// Cut edges as `(u, v)` pairs with `u < v`, sorted.
    pub fn cut_edges(&self) -> Vec<(usize, usize)> {
        let mut edges = self.cut_edges.get(0).iter()
            .map(|&edge| self.graph.edge_endpoints(edge))
            .collect::<Vec<_>>();
        edges.sort_unstable();
        edges
    }

    /// A uniformly random cut edge, or None if every node is in one part.
    pub fn random_cut_edge(&self, rng: &mut impl Rng) -> Option<(usize, usize)> {
        self.cut_edges.get(0).choose(rng).map(|&edge| self.graph.edge_endpoints(edge))
    }

    /// Move a set of nodes to `part`, updating frontiers, cut edges and totals.
    /// Nodes may come from different parts; contiguity is not checked.
    pub fn move_subgraph(&mut self, nodes: &[usize], part: u32) {
        assert!(part < self.num_parts(), "part {} out of range [0, {})", part, self.num_parts());

        let graph = Arc::clone(&self.graph);
        let mut by_prev = AHashMap::<u32, Vec<usize>>::new();
        for &u in nodes {
            assert!(u < self.num_nodes(), "node {u} out of range");
            let prev = self.assignment(u);
            if prev == part { continue }
            self.parts.move_to(u, part as usize);
            by_prev.entry(prev).or_default().push(u);
        }
        if by_prev.is_empty() { return }

        // Cut status only changes on edges touching a moved node.
        let mut touched = Vec::new();
        for &u in by_prev.values().flatten() {
            touched.push(u);
            for (i, v) in graph.edges(u).enumerate() {
                touched.push(v);
                let edge = if u < v { graph.offset(u) + i } else {
                    graph.edge_index(v, u).unwrap_or_else(|| panic!("graph is not symmetric at ({u}, {v})"))
                };
                if self.assignment(u) != self.assignment(v) { self.cut_edges.insert(edge, 0) } else { self.cut_edges.remove(edge) }
            }
        }

        for u in touched {
            if graph.edges(u).any(|v| self.assignment(v) != self.assignment(u)) {
                self.frontiers.insert(u, self.assignment(u) as usize);
            } else {
                self.frontiers.remove(u);
            }
        }

        for (prev, moved) in by_prev {
            self.part_weights.subtract_rows_from(prev as usize, graph.node_weights(), &moved);
            self.part_weights.add_rows_from(part as usize, graph.node_weights(), &moved);
        }
    }
}
