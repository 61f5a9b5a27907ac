#![doc = "Ensemble analysis of Illinois redistricting plans"]
mod analysis;
mod chain;
mod common;
mod config;
mod election;
mod ensemble;
mod geom;
mod graph;
mod layer;
mod merge;
mod partition;
mod plot;

#[doc(inline)]
pub use analysis::{
    build_chain, constraints, load_initial_partition, run_ensemble,
    write_histograms, write_sorted_share_boxplot, RecomChain,
};

#[doc(inline)]
pub use chain::{always_accept, Constraint, MarkovChain, Proposal, ProposalError, Recom};

#[doc(inline)]
pub use config::{load_toml, ChainConfig, ElectionConfig, MergeConfig};

#[doc(inline)]
pub use election::{Election, ElectionResults, Party};

#[doc(inline)]
pub use ensemble::Ensemble;

#[doc(inline)]
pub use geom::{Adjacencies, AdjacencyMethod, Geometries, UtmZone};

#[doc(inline)]
pub use graph::{Graph, WeightMatrix, WeightType};

#[doc(inline)]
pub use layer::Layer;

#[doc(inline)]
pub use merge::{run_merge, MergeOutputs};

#[doc(inline)]
pub use partition::{Partition, SplitParams};

#[doc(inline)]
pub use plot::{BoxPlot, BoxStats, Histogram};
