mod contiguity;
mod multiset;
mod partition;
mod partition_set;
mod recombine;

use multiset::MultiSet;
use partition_set::PartitionSet;

pub use partition::Partition;
pub use recombine::SplitParams;

#[cfg(test)]
pub(crate) use partition::tests::assert_consistent;
