use crate::provider::ReferenceProvider;
use crate::relation::{Coordinate, IndexRelation};

use super::{Attachment, PherogramMapping};

impl<P: ReferenceProvider> PherogramMapping<P> {
    /// The editable column(s) of the reference position `reference_index`.
    ///
    /// Positions inside a collapsed span map to [`Coordinate::Gap`] with the
    /// flanking columns as `before`/`after`. Positions before the start or
    /// past the end of the trace map to [`Coordinate::OutOfRange`].
    pub fn editable_index_by_reference_index(&self, reference_index: isize) -> IndexRelation {
        let relation = self.editable_relation(reference_index);
        log::trace!("reference {reference_index} -> {relation}");

        let Attachment::AttachedToRow { row, .. } = &self.attachment else {
            return relation;
        };

        match relation.corresponding {
            Coordinate::At(column) if row_is_gap(row.as_ref(), column) => IndexRelation::gap(
                Coordinate::At(column - 1),
                Coordinate::At(column + 1),
                relation.ledger_index,
            ),
            _ => relation,
        }
    }

    /// The reference position of the editable column `editable_index`.
    ///
    /// Inserted columns map to [`Coordinate::Gap`] with the surrounding
    /// reference positions as `before`/`after`.
    pub fn reference_index_by_editable_index(&self, editable_index: isize) -> IndexRelation {
        let relation = self.reference_relation(editable_index);
        log::trace!("editable {editable_index} -> {relation}");

        let Attachment::AttachedToRow { row, .. } = &self.attachment else {
            return relation;
        };

        match relation.corresponding {
            Coordinate::At(ix) if row_is_gap(row.as_ref(), editable_index) => {
                let len = self.reference_len();
                IndexRelation::gap(
                    Coordinate::bounded(ix - 1, len),
                    Coordinate::bounded(ix + 1, len),
                    relation.ledger_index,
                )
            }
            _ => relation,
        }
    }

    pub fn shift_at_reference_index(&self, reference_index: isize) -> isize {
        self.ledger.shift_at(reference_index)
    }

    // translation from the ledger, window and anchor alone
    pub(super) fn editable_relation(&self, reference_index: isize) -> IndexRelation {
        let len = self.reference_len();

        if reference_index < 0 {
            return IndexRelation::new(
                Coordinate::OutOfRange,
                Coordinate::OutOfRange,
                Coordinate::At(self.first_seq_pos - self.left_cut + 1),
                0,
            );
        }

        if reference_index >= len {
            let last = self.editable_relation(len - 1);
            let before = match last.corresponding {
                Coordinate::At(_) => last.corresponding,
                _ => last.before,
            };
            return IndexRelation::new(
                before,
                Coordinate::OutOfRange,
                Coordinate::OutOfRange,
                self.ledger.len(),
            );
        }

        let mut pos = reference_index - self.left_cut + self.first_seq_pos;

        for (ix, entry) in self.ledger.iter().enumerate() {
            if entry.reference_index > reference_index {
                return IndexRelation::exact(pos, ix);
            }

            if entry.is_collapse() && reference_index < entry.span_end() {
                // the column the first position after the span lands on
                let base = pos - (reference_index - entry.reference_index);
                return IndexRelation::gap(
                    Coordinate::At(base - 1),
                    Coordinate::At(base),
                    ix,
                );
            }

            if entry.reference_index == reference_index {
                // inserted block right in front of the position
                let shifted = pos + entry.shift_change;
                return IndexRelation::new(
                    Coordinate::At(pos),
                    Coordinate::At(shifted),
                    Coordinate::At(shifted),
                    ix,
                );
            }

            pos += entry.shift_change;
        }

        IndexRelation::exact(pos, self.ledger.len())
    }

    pub(super) fn reference_relation(&self, editable_index: isize) -> IndexRelation {
        let len = self.reference_len();

        let mut shift = 0;
        let mut ledger_index = self.ledger.len();
        let mut collapsed_from = None;

        for (ix, entry) in self.ledger.iter().enumerate() {
            // column the entry's position would land on without the entry
            let start = entry.reference_index - self.left_cut + self.first_seq_pos + shift;

            if editable_index < start {
                ledger_index = ix;
                break;
            }

            if entry.is_insertion() {
                if editable_index < start + entry.shift_change {
                    return IndexRelation::gap(
                        Coordinate::bounded(entry.reference_index - 1, len),
                        Coordinate::bounded(entry.reference_index, len),
                        ix,
                    );
                }
            } else if editable_index == start {
                collapsed_from = Some(entry.reference_index);
            }

            shift += entry.shift_change;
        }

        let reference_index = editable_index - self.first_seq_pos + self.left_cut - shift;

        if reference_index < 0 {
            return IndexRelation::new(
                Coordinate::OutOfRange,
                Coordinate::OutOfRange,
                Coordinate::bounded(0, len),
                ledger_index,
            );
        }

        if reference_index >= len {
            return IndexRelation::new(
                Coordinate::bounded(len - 1, len),
                Coordinate::OutOfRange,
                Coordinate::OutOfRange,
                ledger_index,
            );
        }

        match collapsed_from {
            Some(from) => IndexRelation::new(
                Coordinate::At(from),
                Coordinate::At(reference_index),
                Coordinate::At(reference_index),
                ledger_index,
            ),
            None => IndexRelation::exact(reference_index, ledger_index),
        }
    }
}

fn row_is_gap(row: &dyn crate::row::EditableRow, column: isize) -> bool {
    column >= 0 && (column as usize) < row.len() && row.is_gap(column as usize)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::provider::TraceData;
    use crate::row::{RowId, TokenRow};

    use crate::relation::Coordinate::{At, Gap, OutOfRange};

    fn trace(len: usize) -> TraceData {
        let calls = b"ACGT".iter().cycle().take(len).copied().collect::<Vec<_>>();
        TraceData::from_base_calls(&calls, 4)
    }

    fn relation(before: Coordinate, corresponding: Coordinate, after: Coordinate) -> [Coordinate; 3] {
        [before, corresponding, after]
    }

    fn parts(rel: IndexRelation) -> [Coordinate; 3] {
        [rel.before, rel.corresponding, rel.after]
    }

    #[test]
    fn identity_without_shifts() {
        let mapping = PherogramMapping::new(trace(20));
        let rel = mapping.editable_index_by_reference_index(5);
        assert_eq!(rel.corresponding, At(5));
        assert_eq!(
            mapping.reference_index_by_editable_index(5).corresponding,
            At(5)
        );
    }

    #[test]
    fn collapsed_positions_are_gaps() {
        let mut mapping = PherogramMapping::new(trace(20));
        mapping.add_shift_change(5, -2).unwrap();

        assert_eq!(
            parts(mapping.editable_index_by_reference_index(4)),
            relation(At(4), At(4), At(4))
        );
        assert_eq!(
            parts(mapping.editable_index_by_reference_index(5)),
            relation(At(4), Gap, At(5))
        );
        assert_eq!(
            parts(mapping.editable_index_by_reference_index(6)),
            relation(At(4), Gap, At(5))
        );
        // 7 takes the column right after the collapse point: the whole span
        // of 2 is skipped, so it lands on 5 and not on 6
        assert_eq!(mapping.editable_index_by_reference_index(7).corresponding, At(5));
        assert_eq!(mapping.editable_index_by_reference_index(19).corresponding, At(17));

        // the column after the collapse remembers where the span began
        assert_eq!(
            parts(mapping.reference_index_by_editable_index(5)),
            relation(At(5), At(7), At(7))
        );
        assert_eq!(mapping.reference_index_by_editable_index(4).corresponding, At(4));
    }

    #[test]
    fn inserted_columns_are_gaps() {
        let mut mapping = PherogramMapping::new(trace(20));
        mapping.add_shift_change(5, 3).unwrap();

        assert_eq!(
            parts(mapping.editable_index_by_reference_index(5)),
            relation(At(5), At(8), At(8))
        );
        assert_eq!(mapping.editable_index_by_reference_index(4).corresponding, At(4));
        assert_eq!(mapping.editable_index_by_reference_index(6).corresponding, At(9));

        for column in 5..8 {
            assert_eq!(
                parts(mapping.reference_index_by_editable_index(column)),
                relation(At(4), Gap, At(5))
            );
        }
        assert_eq!(mapping.reference_index_by_editable_index(8).corresponding, At(5));
        assert_eq!(mapping.shift_at_reference_index(5), 3);
    }

    #[test]
    fn insertion_at_trace_start() {
        let mut mapping = PherogramMapping::new(trace(10));
        mapping.add_shift_change(0, 2).unwrap();

        assert_eq!(
            parts(mapping.reference_index_by_editable_index(0)),
            relation(OutOfRange, Gap, At(0))
        );
        assert_eq!(mapping.reference_index_by_editable_index(2).corresponding, At(0));
    }

    #[test]
    fn outside_of_the_trace() {
        let mut mapping = PherogramMapping::new(trace(10));
        mapping.set_first_seq_pos_and_cuts(4, 2, 10).unwrap();

        assert_eq!(
            parts(mapping.editable_index_by_reference_index(-1)),
            relation(OutOfRange, OutOfRange, At(4 - 2 + 1))
        );
        assert_eq!(
            parts(mapping.editable_index_by_reference_index(10)),
            relation(At(11), OutOfRange, OutOfRange)
        );
        assert_eq!(
            parts(mapping.reference_index_by_editable_index(1)),
            relation(OutOfRange, OutOfRange, At(0))
        );
        assert_eq!(
            parts(mapping.reference_index_by_editable_index(12)),
            relation(At(9), OutOfRange, OutOfRange)
        );

        // positions cut off on the left extend the anchor linearly
        assert_eq!(mapping.editable_index_by_reference_index(0).corresponding, At(2));
        assert_eq!(mapping.reference_index_by_editable_index(2).corresponding, At(0));
    }

    #[test]
    fn end_of_trace_inside_collapse() {
        let mut mapping = PherogramMapping::new(trace(10));
        mapping.add_shift_change(8, -2).unwrap();

        assert_eq!(
            parts(mapping.editable_index_by_reference_index(9)),
            relation(At(7), Gap, At(8))
        );
        assert_eq!(
            parts(mapping.editable_index_by_reference_index(10)),
            relation(At(7), OutOfRange, OutOfRange)
        );
    }

    #[test]
    fn empty_trace() {
        let mapping = PherogramMapping::new(trace(0));
        assert_eq!(
            parts(mapping.editable_index_by_reference_index(0)),
            relation(OutOfRange, OutOfRange, OutOfRange)
        );
        assert_eq!(
            parts(mapping.reference_index_by_editable_index(0)),
            relation(OutOfRange, OutOfRange, OutOfRange)
        );
    }

    #[test]
    fn ledger_index_points_into_snapshot() {
        let mut mapping = PherogramMapping::new(trace(30));
        mapping.add_shift_change(4, 1).unwrap();
        mapping.add_shift_change(10, -2).unwrap();
        mapping.add_shift_change(20, 1).unwrap();

        let snapshot = mapping.ledger().snapshot();
        let rel = mapping.editable_index_by_reference_index(15);
        assert_eq!(rel.ledger_index, 2);
        assert_eq!(snapshot[rel.ledger_index].reference_index, 20);

        let rel = mapping.editable_index_by_reference_index(11);
        assert_eq!(rel.ledger_index, 1);
        assert!(rel.corresponding.is_gap());
    }

    #[test]
    fn attached_gap_tokens() {
        // row: ACG-TACGTA, column 3 replaced by a gap but still counted 1:1
        let row = TokenRow::new(RowId(0), "ACG-TACGTA", b'-');
        let mapping = PherogramMapping::attached(trace(10), RowId(0), row, 0).unwrap();

        assert_eq!(
            parts(mapping.editable_index_by_reference_index(3)),
            relation(At(2), Gap, At(4))
        );
        assert_eq!(
            parts(mapping.reference_index_by_editable_index(3)),
            relation(At(2), Gap, At(4))
        );
        assert_eq!(mapping.editable_index_by_reference_index(4).corresponding, At(4));
    }

    fn arb_ledger() -> impl Strategy<Value = Vec<(isize, isize)>> {
        prop::collection::vec((0isize..60, -4isize..=4), 0..20)
    }

    proptest! {
        #[test]
        fn round_trip_and_monotonic(
            ops in arb_ledger(),
            anchor in 0isize..10,
            left in 0isize..20,
            width in 0isize..50,
        ) {
            let mut mapping = PherogramMapping::new(trace(80));
            let right = (left + width).min(80);
            mapping.set_first_seq_pos_and_cuts(anchor, left, right).unwrap();
            for (r, d) in ops {
                // entries that don't fit are rejected, the rest is kept
                let _ = mapping.add_shift_change(left + r, d);
            }

            let mut last = None;
            for r in left..right {
                let rel = mapping.editable_index_by_reference_index(r);
                let Coordinate::At(column) = rel.corresponding else {
                    prop_assert!(rel.corresponding.is_gap());
                    continue;
                };
                let back = mapping.reference_index_by_editable_index(column);
                prop_assert_eq!(back.corresponding, At(r));
                if let Some(last) = last {
                    prop_assert!(last < column);
                }
                last = Some(column);
            }
        }

        #[test]
        fn every_window_column_maps_back(
            ops in arb_ledger(),
            left in 0isize..20,
        ) {
            let mut mapping = PherogramMapping::new(trace(80));
            mapping.set_first_seq_pos_and_cuts(3, left, 80).unwrap();
            for (r, d) in ops {
                let _ = mapping.add_shift_change(left + r, d);
            }

            for column in mapping.editable_window() {
                let rel = mapping.reference_index_by_editable_index(column);
                match rel.corresponding {
                    Coordinate::At(r) => {
                        let forward = mapping.editable_index_by_reference_index(r);
                        prop_assert_eq!(forward.corresponding, At(column));
                    }
                    Coordinate::Gap => {
                        // inserted column: the position after it lies behind
                        let after = rel.after.index().unwrap();
                        let forward = mapping.editable_index_by_reference_index(after);
                        prop_assert!(forward.corresponding.index().unwrap() > column);
                    }
                    Coordinate::OutOfRange => prop_assert!(false, "{column} out of range"),
                }
            }
        }
    }
}
