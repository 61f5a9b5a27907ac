mod accept;
mod chain;
mod constraint;
mod proposal;

pub use accept::always_accept;
pub use chain::MarkovChain;
pub use constraint::Constraint;
pub use proposal::{Proposal, ProposalError, Recom};
