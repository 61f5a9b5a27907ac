use anyhow::{bail, Result};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info};

use crate::{chain::{Constraint, Proposal, ProposalError}, partition::Partition};

/// Steps between progress log lines.
const DEFAULT_PROGRESS_INTERVAL: usize = 1000;

/// A seeded random walk over valid partitions.
///
/// Yields the initial state first, then one state per step until `total_steps`
/// states have been produced. Proposals that fail a constraint, or that merge a
/// disconnected region, are discarded and redrawn. A valid proposal that the
/// acceptance function rejects re-yields the current state.
pub struct MarkovChain<P, A> {
    proposal: P,
    constraints: Vec<Constraint>,
    accept: A,
    state: Partition,
    total_steps: usize,
    step: usize,
    rng: StdRng,
    progress_interval: usize,
    invalid: usize,
    rejected: usize,
}

impl<P, A> MarkovChain<P, A>
where
    P: Proposal,
    A: Fn(&Partition) -> bool,
{
    /// Fails if `initial` violates any constraint.
    pub fn new(proposal: P, constraints: Vec<Constraint>, accept: A, initial: Partition, total_steps: usize, seed: u64) -> Result<Self> {
        if let Some(violated) = constraints.iter().find(|c| !c.is_satisfied(&initial)) {
            bail!("[chain::new] Initial partition violates constraint: {violated}");
        }

        Ok(Self {
            proposal,
            constraints,
            accept,
            state: initial,
            total_steps,
            step: 0,
            rng: StdRng::seed_from_u64(seed),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            invalid: 0,
            rejected: 0,
        })
    }

    /// Log progress every `interval` steps (0 disables).
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    #[inline] pub fn state(&self) -> &Partition { &self.state }

    /// Number of states yielded so far.
    #[inline] pub fn step(&self) -> usize { self.step }

    #[inline] pub fn total_steps(&self) -> usize { self.total_steps }

    /// Proposals discarded for breaking a constraint or merging a disconnected region.
    #[inline] pub fn invalid_proposals(&self) -> usize { self.invalid }

    /// Valid proposals refused by the acceptance function.
    #[inline] pub fn rejected_proposals(&self) -> usize { self.rejected }

    /// Advance the chain and return the next state, or None once it has run its course.
    pub fn next_state(&mut self) -> Option<Result<&Partition, ProposalError>> {
        if self.step >= self.total_steps { return None }

        if self.step > 0 {
            if let Err(e) = self.advance() { return Some(Err(e)) }
        }
        self.step += 1;

        if self.progress_interval > 0 && self.step % self.progress_interval == 0 {
            info!(
                step = self.step,
                total = self.total_steps,
                cut_edges = self.state.cut_edge_count(),
                invalid = self.invalid,
                "[chain] progress"
            );
        }

        Some(Ok(&self.state))
    }

    /// Draw proposals until one passes every constraint, then apply the acceptance test.
    fn advance(&mut self) -> Result<(), ProposalError> {
        let candidate = loop {
            match self.proposal.propose(&self.state, &mut self.rng) {
                Ok(candidate) if self.constraints.iter().all(|c| c.is_satisfied(&candidate)) => break candidate,
                Ok(_) => self.invalid += 1,
                Err(e) if e.is_recoverable() => {
                    debug!(step = self.step, error = %e, "[chain] discarding proposal");
                    self.invalid += 1;
                },
                Err(e) => return Err(e),
            }
        };

        if (self.accept)(&candidate) { self.state = candidate } else { self.rejected += 1 }
        Ok(())
    }
}

impl<P, A> Iterator for MarkovChain<P, A>
where
    P: Proposal,
    A: Fn(&Partition) -> bool,
{
    type Item = Result<Partition, ProposalError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_state().map(|state| state.cloned())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_steps - self.step;
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chain::{always_accept, Recom}, graph::grid_graph, partition::assert_consistent};

    /// 6x6 grid in three vertical stripes.
    fn stripes() -> Partition {
        let assignments = (0..36).map(|i| (i % 6 / 2 + 1) as u32).collect();
        Partition::with_assignments(3, grid_graph(6, 6, |_| 1), assignments)
    }

    fn chain(initial: Partition, steps: usize, seed: u64) -> MarkovChain<Recom, fn(&Partition) -> bool> {
        let recom = Recom::for_partition(&initial, "POP", 0.1, 1);
        let constraints = vec![
            Constraint::within_percent_of_ideal_population(&initial, 0.1, "POP"),
            Constraint::contiguous(),
        ];
        MarkovChain::new(recom, constraints, always_accept as fn(&Partition) -> bool, initial, steps, seed).unwrap()
    }

    #[test]
    fn yields_initial_state_then_total_steps_states() {
        let initial = stripes();
        let states = chain(initial.clone(), 10, 1).collect::<Result<Vec<_>, _>>().unwrap();

        assert_eq!(states.len(), 10);
        assert_eq!(states[0].assignments(), initial.assignments());
        for state in &states {
            assert_consistent(state);
            assert!(state.all_contiguous());
            for pop in state.part_totals("POP") { assert!((10.8..=13.2).contains(&pop)) }
        }
    }

    #[test]
    fn same_seed_same_trajectory() {
        let first = chain(stripes(), 15, 42).map(|s| s.unwrap().assignments()).collect::<Vec<_>>();
        let second = chain(stripes(), 15, 42).map(|s| s.unwrap().assignments()).collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_invalid_initial_state() {
        let lopsided = (0..36).map(|i| if i < 30 { 1 } else { (i % 2 + 2) as u32 }).collect();
        let initial = Partition::with_assignments(3, grid_graph(6, 6, |_| 1), lopsided);
        let recom = Recom::for_partition(&initial, "POP", 0.1, 1);
        let constraints = vec![Constraint::within_percent_of_ideal_population(&initial, 0.1, "POP")];

        let error = MarkovChain::new(recom, constraints, always_accept, initial, 5, 0).err().unwrap();
        assert!(error.to_string().contains("violates constraint"));
    }

    #[test]
    fn refused_proposals_repeat_the_current_state() {
        let initial = stripes();
        let recom = Recom::for_partition(&initial, "POP", 0.1, 1);
        let mut chain = MarkovChain::new(recom, vec![], |_: &Partition| false, initial.clone(), 4, 3).unwrap();

        while let Some(state) = chain.next_state() {
            assert_eq!(state.unwrap().assignments(), initial.assignments());
        }
        assert_eq!(chain.step(), 4);
        assert_eq!(chain.rejected_proposals(), 3);
    }

    #[test]
    fn zero_steps_yields_nothing() {
        assert!(chain(stripes(), 0, 0).next().is_none());
    }
}
