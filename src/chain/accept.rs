use crate::partition::Partition;

/// Accept every proposal that passes the chain's constraints.
#[inline]
pub fn always_accept(_: &Partition) -> bool { true }
