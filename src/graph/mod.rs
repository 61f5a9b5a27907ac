mod graph;
mod weights;

pub use graph::Graph;
pub use weights::{WeightMatrix, WeightType};

#[cfg(test)]
pub(crate) use graph::tests::grid_graph;
