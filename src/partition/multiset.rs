/// Elements per set with O(1) insert/remove/contains; an element is in at most one set.
#[derive(Debug, Clone)]
pub(super) struct MultiSet {
    sets: Vec<Vec<usize>>,
    index: Vec<Option<(usize, usize)>>, // index[i] = Some((set, pos)) if i is in sets[set] @ pos
}

impl MultiSet {
    /// Create `num_sets` empty sets over a universe of `num_elems` elements.
    pub(super) fn new(num_sets: usize, num_elems: usize) -> Self {
        Self { sets: vec![Vec::new(); num_sets], index: vec![None; num_elems] }
    }

    /// Remove all elements from all sets.
    pub(super) fn clear(&mut self) {
        self.sets.iter_mut().for_each(Vec::clear);
        self.index.fill(None);
    }

    /// Rebuild from (elem, set) pairs. Elements not mentioned end up in no set.
    pub(super) fn rebuild_from(&mut self, iter: impl IntoIterator<Item = (usize, usize)>) {
        self.clear();
        for (elem, set) in iter {
            debug_assert!(self.index[elem].is_none(), "element listed multiple times in rebuild");
            self.insert_unchecked(elem, set);
        }
    }

    #[inline] pub(super) fn contains(&self, elem: usize) -> bool { self.index[elem].is_some() }

    #[inline] pub(super) fn get(&self, set: usize) -> &[usize] { &self.sets[set] }

    /// Insert `elem` into `set`, moving it out of any other set.
    pub(super) fn insert(&mut self, elem: usize, set: usize) {
        match self.index[elem] {
            Some((current, _)) if current == set => {}
            Some(_) => { self.remove(elem); self.insert_unchecked(elem, set) }
            None => self.insert_unchecked(elem, set),
        }
    }

    /// Remove `elem` from whichever set it is in (no-op if absent).
    pub(super) fn remove(&mut self, elem: usize) {
        let Some((set, pos)) = self.index[elem].take() else { return };
        self.sets[set].swap_remove(pos);
        if let Some(&moved) = self.sets[set].get(pos) { self.index[moved] = Some((set, pos)) }
    }

    #[inline]
    fn insert_unchecked(&mut self, elem: usize, set: usize) {
        self.index[elem] = Some((set, self.sets[set].len()));
        self.sets[set].push(elem);
    }
}

#[cfg(test)]
mod tests {
    use super::MultiSet;

    #[test]
    fn insert_and_move() {
        let mut ms = MultiSet::new(3, 10);
        ms.insert(4, 1);
        ms.insert(7, 1);
        ms.insert(2, 2);
        ms.insert(7, 1); // no-op

        assert!(ms.get(1).contains(&4));
        assert_eq!(ms.get(1).len(), 2);
        assert!(!ms.contains(0));

        ms.insert(4, 2);
        assert_eq!(ms.get(1), &[7]);
        assert!(ms.get(2).contains(&4));
    }

    #[test]
    fn remove_updates_swapped_index() {
        let mut ms = MultiSet::new(2, 4);
        ms.insert(0, 0);
        ms.insert(1, 0);
        ms.insert(2, 0);
        ms.remove(0);
        ms.remove(3); // absent

        assert!(!ms.contains(0));
        assert_eq!(ms.get(0), &[2, 1]);
        assert!(ms.contains(2));

        ms.remove(2);
        assert_eq!(ms.get(0), &[1]);
    }

    #[test]
    fn rebuild_from_and_clear() {
        let mut ms = MultiSet::new(3, 8);
        ms.insert(1, 0);
        ms.rebuild_from([(0, 0), (2, 1), (5, 1), (7, 2)]);

        assert!(!ms.contains(1));
        assert_eq!(ms.get(1), &[2, 5]);
        assert_eq!(ms.get(2), &[7]);

        ms.clear();
        assert!((0..8).all(|elem| !ms.contains(elem)));
    }
}
