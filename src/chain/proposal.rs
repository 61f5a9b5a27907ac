use rand::Rng;
use thiserror::Error;

use crate::partition::{Partition, SplitParams};

/// Spanning trees drawn per proposal before a bipartition is abandoned.
const DEFAULT_MAX_ATTEMPTS: usize = 100_000;

/// Ways a single proposal can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalError {
    #[error("partition has no cut edges")]
    NoCutEdges,

    #[error("districts {a} and {b} do not form a connected region")]
    DisconnectedRegion { a: u32, b: u32 },

    #[error("no balanced cut of districts {a} and {b} found in {attempts} spanning trees")]
    BipartitionFailed { a: u32, b: u32, attempts: usize },
}

impl ProposalError {
    /// Whether the chain may discard this proposal and draw another.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProposalError::DisconnectedRegion { .. })
    }
}

/// Something that draws a candidate next state from the current one.
pub trait Proposal {
    fn propose<R: Rng>(&self, partition: &Partition, rng: &mut R) -> Result<Partition, ProposalError>;
}

/// ReCom: merge the two districts on either side of a random cut edge and
/// re-split them along a balanced spanning-tree cut.
#[derive(Clone, Debug)]
pub struct Recom {
    pop_series: String,
    pop_target: f64,
    epsilon: f64,
    node_repeats: usize,
    max_attempts: usize,
}

impl Recom {
    /// Both halves of every split land within `pop_target * (1 ± epsilon)`.
    pub fn new(pop_series: &str, pop_target: f64, epsilon: f64, node_repeats: usize) -> Self {
        assert!(epsilon >= 0.0, "epsilon must be non-negative");
        Self {
            pop_series: pop_series.to_string(),
            pop_target,
            epsilon,
            node_repeats: node_repeats.max(1),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// ReCom targeting the ideal district population of `partition`.
    pub fn for_partition(partition: &Partition, pop_series: &str, epsilon: f64, node_repeats: usize) -> Self {
        let ideal = partition.total(pop_series) / partition.num_districts() as f64;
        Self::new(pop_series, ideal, epsilon, node_repeats)
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[inline] pub fn pop_target(&self) -> f64 { self.pop_target }

    #[inline] pub fn epsilon(&self) -> f64 { self.epsilon }

    fn split_params(&self) -> SplitParams<'_> {
        SplitParams {
            pop_series: &self.pop_series,
            min_pop: self.pop_target * (1.0 - self.epsilon),
            max_pop: self.pop_target * (1.0 + self.epsilon),
            node_repeats: self.node_repeats,
            max_attempts: self.max_attempts,
        }
    }
}

impl Proposal for Recom {
    fn propose<R: Rng>(&self, partition: &Partition, rng: &mut R) -> Result<Partition, ProposalError> {
        let (u, v) = partition.random_cut_edge(rng).ok_or(ProposalError::NoCutEdges)?;
        let (a, b) = (partition.assignment(u), partition.assignment(v));

        let mut next = partition.clone();
        next.recombine_parts(a, b, &self.split_params(), rng)?;
        Ok(next)
    }
}
