use crate::election::Party;

/// Democratic and Republican tallies for districts 1..=N, in district order.
#[derive(Clone, Debug, PartialEq)]
pub struct ElectionResults {
    dem: Vec<f64>,
    rep: Vec<f64>,
}

impl ElectionResults {
    pub fn new(dem: Vec<f64>, rep: Vec<f64>) -> Self {
        assert!(dem.len() == rep.len(), "dem and rep tallies must cover the same districts");
        Self { dem, rep }
    }

    #[inline] pub fn num_districts(&self) -> usize { self.dem.len() }

    /// A party's votes in each district.
    #[inline]
    pub fn votes(&self, party: Party) -> &[f64] {
        match party {
            Party::Democratic => &self.dem,
            Party::Republican => &self.rep,
        }
    }

    /// Districts where `party` strictly out-polls the other. Exact ties count for neither.
    pub fn seats(&self, party: Party) -> usize {
        self.votes(party).iter().zip(self.votes(party.opponent()))
            .filter(|(ours, theirs)| ours > theirs)
            .count()
    }

    /// A party's two-party vote share in each district; districts with no votes report 0.
    pub fn percents(&self, party: Party) -> Vec<f64> {
        self.votes(party).iter().zip(self.votes(party.opponent()))
            .map(|(&ours, &theirs)| if ours + theirs > 0.0 { ours / (ours + theirs) } else { 0.0 })
            .collect()
    }

    /// Median minus mean of the Democratic two-party share, over districts with votes.
    /// None if no district has any votes.
    pub fn mean_median(&self) -> Option<f64> {
        let mut shares = self.dem.iter().zip(&self.rep)
            .filter(|&(&d, &r)| d + r > 0.0)
            .map(|(&d, &r)| d / (d + r))
            .collect::<Vec<_>>();
        if shares.is_empty() { return None }

        shares.sort_unstable_by(f64::total_cmp);
        let n = shares.len();
        let median = if n % 2 == 1 { shares[n / 2] } else { (shares[n / 2 - 1] + shares[n / 2]) / 2.0 };
        let mean = shares.iter().sum::<f64>() / n as f64;

        Some(median - mean)
    }

    /// `(wasted_R - wasted_D) / total votes`; positive favors Democrats.
    /// The winner wastes votes beyond half the district total and the loser wastes all of
    /// theirs. A tied district is scored as a Republican win. None if there are no votes.
    pub fn efficiency_gap(&self) -> Option<f64> {
        let total = self.dem.iter().sum::<f64>() + self.rep.iter().sum::<f64>();
        if total == 0.0 { return None }

        let (wasted_d, wasted_r) = self.dem.iter().zip(&self.rep)
            .fold((0.0, 0.0), |(wasted_d, wasted_r), (&d, &r)| {
                let half = (d + r) / 2.0;
                if d > r { (wasted_d + d - half, wasted_r + r) } else { (wasted_d + d, wasted_r + r - half) }
            });

        Some((wasted_r - wasted_d) / total)
    }
}
