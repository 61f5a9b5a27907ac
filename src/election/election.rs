use std::fmt;

use crate::partition::Partition;

use super::ElectionResults;

/// The two parties whose tallies are compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Party { Democratic, Republican }

impl Party {
    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            Party::Democratic => Party::Republican,
            Party::Republican => Party::Democratic,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Party::Democratic => "Democratic",
            Party::Republican => "Republican",
        })
    }
}

/// A two-party election: the node weight series holding each party's votes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Election {
    name: String,
    alias: String,
    dem: String,
    rep: String,
}

impl Election {
    /// `alias` is the short name used in ensemble column names (e.g. `pres`).
    pub fn new(name: &str, alias: &str, dem: &str, rep: &str) -> Self {
        Self { name: name.into(), alias: alias.into(), dem: dem.into(), rep: rep.into() }
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn alias(&self) -> &str { &self.alias }

    /// Series holding a party's votes.
    #[inline]
    pub fn series(&self, party: Party) -> &str {
        match party {
            Party::Democratic => &self.dem,
            Party::Republican => &self.rep,
        }
    }

    /// Per-district tallies of this election under a partition.
    pub fn results(&self, partition: &Partition) -> ElectionResults {
        ElectionResults::new(partition.part_totals(&self.dem), partition.part_totals(&self.rep))
    }
}

impl fmt::Display for Election {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}: {} vs {})", self.name, self.alias, self.dem, self.rep)
    }
}
