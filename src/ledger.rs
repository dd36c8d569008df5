/// A single divergence between the reference (base call) and the editable
/// index space.
///
/// A positive `shift_change` of `k` at `reference_index = r` means `k`
/// editable columns were inserted directly before the image of `r`. A
/// negative `shift_change` of `-k` means the reference positions
/// `[r, r + k)` have no column of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShiftEntry {
    pub reference_index: isize,
    pub shift_change: isize,
}

impl ShiftEntry {
    pub fn new(reference_index: isize, shift_change: isize) -> Self {
        Self {
            reference_index,
            shift_change,
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.shift_change > 0
    }

    pub fn is_collapse(&self) -> bool {
        self.shift_change < 0
    }

    /// Exclusive end of the collapsed reference span. Insertions don't
    /// cover any reference position, so this is `reference_index` for them.
    pub fn span_end(&self) -> isize {
        self.reference_index + (-self.shift_change).max(0)
    }

    fn combines_with(&self, right: &ShiftEntry) -> bool {
        // two insertions are anchored independently and never merge
        self.is_collapse() && right.reference_index <= self.span_end()
    }
}

/// Sparse, ordered list of [`ShiftEntry`]s.
///
/// Entries are sorted by reference index, each index occurs at most once,
/// no entry has a zero magnitude, and contiguous combinable neighbours are
/// always merged.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShiftLedger {
    entries: Vec<ShiftEntry>,
}

impl ShiftLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ShiftEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShiftEntry> + '_ {
        self.entries.iter()
    }

    /// An owned copy of the current entries; stays valid across later
    /// mutations of the ledger.
    pub fn snapshot(&self) -> Vec<ShiftEntry> {
        self.entries.clone()
    }

    /// Index of the first entry at or after `reference_index`.
    pub fn position_of(&self, reference_index: isize) -> usize {
        self.entries
            .partition_point(|e| e.reference_index < reference_index)
    }

    pub fn get(&self, reference_index: isize) -> Option<isize> {
        let ix = self.position_of(reference_index);
        self.entries
            .get(ix)
            .filter(|e| e.reference_index == reference_index)
            .map(|e| e.shift_change)
    }

    pub fn total_shift(&self) -> isize {
        self.entries.iter().map(|e| e.shift_change).sum()
    }

    /// Sum of the magnitudes of all entries at or before `reference_index`.
    pub fn shift_at(&self, reference_index: isize) -> isize {
        self.entries
            .iter()
            .take_while(|e| e.reference_index <= reference_index)
            .map(|e| e.shift_change)
            .sum()
    }

    pub fn set_shift_change(&mut self, reference_index: isize, shift_change: isize) {
        let ix = self.position_of(reference_index);
        let exists = self
            .entries
            .get(ix)
            .is_some_and(|e| e.reference_index == reference_index);

        if shift_change == 0 {
            if exists {
                self.entries.remove(ix);
            }
            return;
        }

        if exists {
            self.entries[ix].shift_change = shift_change;
        } else {
            self.entries
                .insert(ix, ShiftEntry::new(reference_index, shift_change));
        }

        self.combine_around(ix);
    }

    pub fn add_shift_change(&mut self, reference_index: isize, delta: isize) {
        let current = self.get(reference_index).unwrap_or_default();
        self.set_shift_change(reference_index, current + delta);
    }

    // merges the entry at `ix` with its left neighbour, then keeps
    // absorbing right neighbours for as long as they are contiguous
    fn combine_around(&mut self, mut ix: usize) {
        if ix > 0 && self.entries[ix - 1].combines_with(&self.entries[ix]) {
            match self.merge_pair(ix - 1) {
                Some(left) => ix = left,
                None => return,
            }
        }

        while ix + 1 < self.entries.len() && self.entries[ix].combines_with(&self.entries[ix + 1])
        {
            match self.merge_pair(ix) {
                Some(left) => ix = left,
                None => return,
            }
        }
    }

    // returns the index of the surviving entry, or `None` if the pair
    // cancelled out
    fn merge_pair(&mut self, left: usize) -> Option<usize> {
        let right = self.entries.remove(left + 1);
        let sum = self.entries[left].shift_change + right.shift_change;

        log::debug!(
            "combining shift changes at {} and {} into {sum}",
            self.entries[left].reference_index,
            right.reference_index
        );

        if sum == 0 {
            self.entries.remove(left);
            None
        } else {
            self.entries[left].shift_change = sum;
            Some(left)
        }
    }

    /// Restricts the ledger to `[lo, hi)` and returns the net shift of
    /// everything that was cut off on the left.
    ///
    /// A collapse straddling `lo` is moved to `lo` and keeps only its
    /// in-window part; the cut-off part goes into the returned shift. A
    /// collapse running past `hi` is shortened to end at `hi`. Insertions at
    /// exactly `hi` sit behind the last window position and are kept.
    pub fn clip(&mut self, lo: isize, hi: isize) -> isize {
        let mut prefix = 0;
        let mut kept = Vec::with_capacity(self.entries.len());

        for mut entry in self.entries.drain(..) {
            if entry.reference_index < lo {
                if entry.span_end() > lo {
                    let overlap = lo - entry.reference_index;
                    prefix -= overlap;
                    entry = ShiftEntry::new(lo, entry.shift_change + overlap);
                } else {
                    prefix += entry.shift_change;
                    continue;
                }
            }

            if entry.reference_index > hi || (entry.reference_index == hi && entry.is_collapse())
            {
                continue;
            }

            if entry.span_end() > hi {
                entry.shift_change = -(hi - entry.reference_index);
            }

            if entry.shift_change != 0 {
                kept.push(entry);
            }
        }

        if !kept.is_empty() || prefix != 0 {
            log::debug!(
                "clipped shift changes to [{lo}, {hi}), {} kept, prefix shift {prefix}",
                kept.len()
            );
        }

        self.entries = kept;
        prefix
    }

    /// Mirrors all entries into the reverse complemented reference space of
    /// length `reference_len`.
    pub fn mirror(&mut self, reference_len: isize) {
        self.entries = self
            .entries
            .iter()
            .rev()
            .map(|e| {
                ShiftEntry::new(
                    reference_len - e.reference_index + e.shift_change.min(0),
                    e.shift_change,
                )
            })
            .collect();

        debug_assert!(self
            .entries
            .windows(2)
            .all(|w| w[0].reference_index < w[1].reference_index));
    }
}

impl<'a> IntoIterator for &'a ShiftLedger {
    type Item = &'a ShiftEntry;
    type IntoIter = std::slice::Iter<'a, ShiftEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ledger_from(entries: &[(isize, isize)]) -> ShiftLedger {
        let mut ledger = ShiftLedger::new();
        for &(r, s) in entries {
            ledger.set_shift_change(r, s);
        }
        ledger
    }

    fn pairs(ledger: &ShiftLedger) -> Vec<(isize, isize)> {
        ledger
            .iter()
            .map(|e| (e.reference_index, e.shift_change))
            .collect()
    }

    fn assert_consistent(ledger: &ShiftLedger) {
        for e in ledger.iter() {
            assert_ne!(e.shift_change, 0, "zero entry at {}", e.reference_index);
        }
        for w in ledger.entries().windows(2) {
            assert!(w[0].reference_index < w[1].reference_index);
            // spans neither overlap nor touch a combinable neighbour
            if w[0].is_collapse() {
                assert!(w[0].span_end() < w[1].reference_index, "{w:?}");
            }
        }
    }

    #[test]
    fn insertion_then_deletion_cancels() {
        let mut ledger = ShiftLedger::new();
        ledger.add_shift_change(4, 3);
        ledger.add_shift_change(4, -3);
        assert!(ledger.is_empty());
    }

    #[test]
    fn zero_magnitude_removes_entry() {
        let mut ledger = ledger_from(&[(2, 1), (8, -1)]);
        ledger.set_shift_change(2, 0);
        assert_eq!(pairs(&ledger), vec![(8, -1)]);

        // removing something that isn't there is a no-op
        ledger.set_shift_change(3, 0);
        assert_eq!(pairs(&ledger), vec![(8, -1)]);
    }

    #[test]
    fn insertions_never_merge() {
        let ledger = ledger_from(&[(3, 2), (4, 1), (5, 5)]);
        assert_eq!(pairs(&ledger), vec![(3, 2), (4, 1), (5, 5)]);
    }

    #[test]
    fn adjacent_collapses_merge() {
        let mut ledger = ledger_from(&[(3, -2)]);
        ledger.add_shift_change(5, -1);
        assert_eq!(pairs(&ledger), vec![(3, -3)]);

        // left neighbour of an existing collapse
        ledger.add_shift_change(1, -2);
        assert_eq!(pairs(&ledger), vec![(1, -5)]);
        assert_consistent(&ledger);
    }

    #[test]
    fn insertion_after_collapse_combines() {
        let mut ledger = ledger_from(&[(10, -4)]);
        ledger.add_shift_change(14, 1);
        assert_eq!(pairs(&ledger), vec![(10, -3)]);

        ledger.add_shift_change(13, 5);
        assert_eq!(pairs(&ledger), vec![(10, 2)]);

        // the combined entry is now an insertion and leaves 13 alone
        ledger.add_shift_change(13, 1);
        assert_eq!(pairs(&ledger), vec![(10, 2), (13, 1)]);
    }

    #[test]
    fn opposite_neighbours_annihilate() {
        let mut ledger = ledger_from(&[(6, -2), (20, 1)]);
        ledger.add_shift_change(8, 2);
        assert_eq!(pairs(&ledger), vec![(20, 1)]);
    }

    #[test]
    fn growing_collapse_swallows_right_neighbours() {
        let mut ledger = ledger_from(&[(10, 2), (12, -1), (20, 3)]);
        ledger.set_shift_change(5, -8);
        // 5..13 reaches 10 (+2), the combined span 5..11 stops short of 12
        assert_eq!(pairs(&ledger), vec![(5, -6), (12, -1), (20, 3)]);

        ledger.set_shift_change(5, -7);
        assert_eq!(pairs(&ledger), vec![(5, -8), (20, 3)]);
        assert_consistent(&ledger);
    }

    #[test]
    fn shift_at_includes_entry_at_index() {
        let ledger = ledger_from(&[(2, 3), (6, -1), (9, 2)]);
        assert_eq!(ledger.shift_at(1), 0);
        assert_eq!(ledger.shift_at(2), 3);
        assert_eq!(ledger.shift_at(8), 2);
        assert_eq!(ledger.shift_at(100), 4);
        assert_eq!(ledger.total_shift(), 4);
    }

    #[test]
    fn clip_folds_prefix() {
        let mut ledger = ledger_from(&[(5, 2), (10, -3)]);
        let prefix = ledger.clip(7, 20);
        assert_eq!(prefix, 2);
        assert_eq!(pairs(&ledger), vec![(10, -3)]);
    }

    #[test]
    fn clip_splits_collapse_on_left_boundary() {
        let mut ledger = ledger_from(&[(1, 1), (4, -5)]);
        let prefix = ledger.clip(6, 20);
        // +1 folded, 4..6 cut off the collapse
        assert_eq!(prefix, 1 - 2);
        assert_eq!(pairs(&ledger), vec![(6, -3)]);
    }

    #[test]
    fn clip_right_boundary() {
        let mut ledger = ledger_from(&[(2, -1), (6, -4), (12, 2), (15, 1), (16, -1)]);
        let prefix = ledger.clip(0, 8);
        assert_eq!(prefix, 0);
        assert_eq!(pairs(&ledger), vec![(2, -1), (6, -2)]);

        let mut ledger = ledger_from(&[(3, 1), (8, 2)]);
        ledger.clip(0, 8);
        assert_eq!(pairs(&ledger), vec![(3, 1), (8, 2)]);
    }

    #[test]
    fn clip_to_empty_window() {
        let mut ledger = ledger_from(&[(2, 1), (5, -3)]);
        let prefix = ledger.clip(6, 6);
        assert_eq!(prefix, 1 - 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn mirror_reverses_spans() {
        let mut ledger = ledger_from(&[(2, 1), (5, -3), (12, 4)]);
        ledger.mirror(20);
        assert_eq!(pairs(&ledger), vec![(8, 4), (12, -3), (18, 1)]);
        ledger.mirror(20);
        assert_eq!(pairs(&ledger), vec![(2, 1), (5, -3), (12, 4)]);
    }

    #[test]
    fn snapshot_survives_mutation() {
        let mut ledger = ledger_from(&[(2, 1)]);
        let snapshot = ledger.snapshot();
        ledger.add_shift_change(2, -1);
        assert!(ledger.is_empty());
        assert_eq!(snapshot, vec![ShiftEntry::new(2, 1)]);
        assert_eq!(ledger_from(&[(2, 1), (9, 1)]).position_of(3), 1);
    }

    proptest! {
        #[test]
        fn random_edits_keep_ledger_consistent(
            ops in prop::collection::vec((0isize..40, -6isize..=6), 0..60)
        ) {
            let mut ledger = ShiftLedger::new();
            for (r, d) in ops {
                ledger.add_shift_change(r, d);
                assert_consistent(&ledger);
            }
        }

        #[test]
        fn mirror_is_an_involution(
            ops in prop::collection::vec((0isize..40, -6isize..=6), 0..30)
        ) {
            let mut ledger = ShiftLedger::new();
            for (r, d) in ops {
                ledger.add_shift_change(r, d);
            }
            let len = 40 + ledger.entries().last().map(|e| e.span_end()).unwrap_or(0);
            let original = ledger.clone();
            ledger.mirror(len);
            assert_consistent(&ledger);
            ledger.mirror(len);
            prop_assert_eq!(ledger, original);
        }
    }
}
