mod election;
mod results;

pub use election::{Election, Party};
pub use results::ElectionResults;
