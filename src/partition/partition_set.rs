/// Total assignment of elements to sets, with O(1) find and move.
#[derive(Debug, Clone)]
pub(super) struct PartitionSet {
    sets: Vec<Vec<usize>>,  // sets[s] = elements currently in set s
    index: Vec<usize>,      // index[e] = s when e is in sets[s]
    position: Vec<usize>,   // position[e] = i when sets[s][i] is e
}

impl PartitionSet {
    /// Create `num_sets` sets over `num_elems` elements, all starting in set 0.
    pub(super) fn new(num_sets: usize, num_elems: usize) -> Self {
        assert!(num_sets > 0, "must have at least one set");
        let mut sets = vec![Vec::new(); num_sets];
        sets[0] = (0..num_elems).collect();

        Self { sets, index: vec![0; num_elems], position: (0..num_elems).collect() }
    }

    #[inline] pub(super) fn num_sets(&self) -> usize { self.sets.len() }

    #[inline] pub(super) fn num_elems(&self) -> usize { self.index.len() }

    /// Set that `elem` is currently in.
    #[inline]
    pub(super) fn find(&self, elem: usize) -> usize {
        debug_assert!(elem < self.index.len(), "element out of range");
        self.index[elem]
    }

    /// Elements currently in `set`, in no particular order.
    #[inline]
    pub(super) fn get(&self, set: usize) -> &[usize] {
        debug_assert!(set < self.sets.len(), "set out of range");
        &self.sets[set]
    }

    /// Set of every element, indexed by element.
    #[inline] pub(super) fn assignments(&self) -> &[usize] { &self.index }

    /// Rebuild from a complete slice of assignments.
    pub(super) fn rebuild(&mut self, assignments: &[usize]) {
        assert!(assignments.len() == self.num_elems(), "assignments length mismatch");

        self.sets.iter_mut().for_each(|v| v.clear());
        for (elem, &set) in assignments.iter().enumerate() {
            assert!(set < self.num_sets(), "set out of range");
            self.index[elem] = set;
            self.position[elem] = self.sets[set].len();
            self.sets[set].push(elem);
        }
    }

    /// Move `elem` to `set`, swapping the last element of its old set into its slot.
    pub(super) fn move_to(&mut self, elem: usize, set: usize) {
        debug_assert!(set < self.sets.len(), "set out of range");

        let (prev, pos) = (self.index[elem], self.position[elem]);
        if prev == set { return }

        self.sets[prev].swap_remove(pos);
        if let Some(&moved) = self.sets[prev].get(pos) { self.position[moved] = pos }

        self.index[elem] = set;
        self.position[elem] = self.sets[set].len();
        self.sets[set].push(elem);
    }
}

#[cfg(test)]
mod tests {
    use super::PartitionSet;

    #[test]
    fn new_fills_first_set() {
        let ps = PartitionSet::new(3, 5);
        assert_eq!(ps.num_sets(), 3);
        assert_eq!(ps.get(0), &[0, 1, 2, 3, 4]);
        assert!(ps.get(1).is_empty() && ps.get(2).is_empty());
        assert!((0..5).all(|elem| ps.find(elem) == 0));
    }

    #[test]
    #[should_panic(expected = "must have at least one set")]
    fn new_panics_on_zero_sets() {
        PartitionSet::new(0, 4);
    }

    #[test]
    fn rebuild_basic_assignment() {
        let mut ps = PartitionSet::new(3, 6);
        ps.rebuild(&[0, 1, 2, 0, 2, 1]);

        assert_eq!(ps.get(0), &[0, 3]);
        assert_eq!(ps.get(1), &[1, 5]);
        assert_eq!(ps.get(2), &[2, 4]);
        assert_eq!(ps.assignments(), &[0, 1, 2, 0, 2, 1]);
    }

    #[test]
    #[should_panic(expected = "set out of range")]
    fn rebuild_panics_on_set_oob() {
        let mut ps = PartitionSet::new(2, 3);
        ps.rebuild(&[0, 1, 2]);
    }

    #[test]
    fn moves_keep_positions_consistent() {
        let mut ps = PartitionSet::new(3, 6);
        for (elem, set) in [(0, 1), (1, 2), (2, 1), (3, 2), (4, 1), (5, 2), (0, 2), (4, 0)] {
            ps.move_to(elem, set);
        }

        for elem in 0..6 {
            let set = ps.find(elem);
            assert!(ps.get(set).contains(&elem));
        }
        let mut all = (0..3).flat_map(|s| ps.get(s).to_vec()).collect::<Vec<_>>();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(ps.get(0), &[4]);
    }

    #[test]
    fn move_to_same_set_is_noop() {
        let mut ps = PartitionSet::new(2, 3);
        ps.move_to(2, 0);
        assert_eq!(ps.get(0), &[0, 1, 2]);
    }
}
