use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use polars::prelude::DataType;
use tracing::{debug, warn};

use crate::{geom::AdjacencyMethod, graph::WeightMatrix, layer::Layer};

/// Snapping grid for shared-boundary detection, in vertices per coordinate unit.
const ADJACENCY_SCALE: f64 = 1e6;

/// A weighted, undirected graph in compressed sparse row format.
#[derive(Debug, Default)]
pub struct Graph {
    size: usize,
    offsets: Vec<u32>,
    edges: Vec<u32>,
    edge_weights: Vec<f64>,
    node_weights: WeightMatrix,
}

impl Graph {
    /// Construct a graph from adjacency lists and node weights.
    pub fn new(num_nodes: usize, edges: &[Vec<u32>], edge_weights: &[Vec<f64>],
        weights_i64: HashMap<String, Vec<i64>>,
        weights_f64: HashMap<String, Vec<f64>>,
    ) -> Self {
        assert!(edges.len() == num_nodes, "edges.len() must equal num_nodes");
        assert!(edge_weights.len() == num_nodes, "edge_weights.len() must equal num_nodes");
        edges.iter().zip(edge_weights.iter()).enumerate().for_each(|(i, (edges, weights))| {
            assert!(edges.len() == weights.len(), "edges[{i}].len() must equal edge_weights[{i}].len()");
        });

        Self {
            size: num_nodes,
            offsets: std::iter::once(0u32).chain(
                edges.iter()
                    .map(|v| v.len() as u32)
                    .scan(0u32, |acc, len| {*acc += len; Some(*acc)})
            ).collect::<Vec<u32>>(),
            edges: edges.iter().flatten().copied().collect(),
            edge_weights: edge_weights.iter().flatten().copied().collect(),
            node_weights: WeightMatrix::new(num_nodes, weights_i64, weights_f64),
        }
    }

    /// Build the dual graph of a layer: one node per row, rook adjacency between
    /// shapes, and the named numeric columns as node weights.
    /// Columns holding only whole numbers are stored as integers.
    pub fn from_layer(layer: &Layer, series: &[&str], method: AdjacencyMethod) -> Result<Self> {
        let adjacencies = layer.geoms().rook_adjacencies(method, ADJACENCY_SCALE)
            .context("[graph::from_layer] Failed to compute adjacencies")?;

        let mut weights_i64 = HashMap::new();
        let mut weights_f64 = HashMap::new();
        for &name in series {
            let column = layer.data().column(name)
                .with_context(|| format!("[graph::from_layer] Missing node weight column {name:?}"))?;
            if !column.dtype().is_primitive_numeric() {
                bail!("[graph::from_layer] Column {name:?} is not numeric ({})", column.dtype());
            }

            let nulls = column.null_count();
            if nulls > 0 {
                warn!(column = name, nulls, "null node weights counted as 0");
            }

            let values = column.cast(&DataType::Float64)?.f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect::<Vec<_>>();

            if values.iter().all(|v| v.fract() == 0.0) {
                weights_i64.insert(name.to_string(), values.into_iter().map(|v| v as i64).collect());
            } else {
                weights_f64.insert(name.to_string(), values);
            }
        }

        let graph = Self::new(layer.len(), &adjacencies.neighbors, &adjacencies.shared_lengths, weights_i64, weights_f64);
        debug!(nodes = graph.node_count(), edges = graph.edge_count() / 2, "built dual graph");

        Ok(graph)
    }

    /// Get the number of nodes in the graph.
    #[inline] pub fn node_count(&self) -> usize { self.size }

    /// Get the number of directed edge entries (twice the undirected edge count).
    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Get a reference to the node weights matrix.
    #[inline] pub fn node_weights(&self) -> &WeightMatrix { &self.node_weights }

    /// Get the range of edges for a given node.
    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Index of the first edge entry of `node` in the flattened edge list.
    #[inline] pub fn offset(&self, node: usize) -> usize { self.offsets[node] as usize }

    /// Get the degree (number of neighbors) of a given node.
    #[inline] pub fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Get an iterator over the neighbors of a given node.
    #[inline]
    pub fn edges(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.range(node).map(move |v| self.edges[v] as usize)
    }

    /// Get an iterator over the neighbors and edge weights of a given node.
    #[inline]
    pub fn edges_with_weights(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.range(node).map(move |v| (self.edges[v] as usize, self.edge_weights[v]))
    }

    /// Flattened index of the entry `u -> v`, if the edge exists.
    #[inline]
    pub fn edge_index(&self, u: usize, v: usize) -> Option<usize> {
        self.range(u).find(|&e| self.edges[e] as usize == v)
    }

    /// Endpoints `(u, v)` of the flattened entry `index`.
    pub fn edge_endpoints(&self, index: usize) -> (usize, usize) {
        assert!(index < self.edges.len(), "edge index {index} out of range");
        let source = self.offsets.partition_point(|&offset| offset as usize <= index) - 1;
        (source, self.edges[index] as usize)
    }
}
