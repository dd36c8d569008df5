/// One side of an index relation: either a concrete index or a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coordinate {
    At(isize),
    /// The position has no counterpart; it lies inside a collapsed span or
    /// an inserted block.
    Gap,
    /// The position lies outside of the other index space.
    OutOfRange,
}

impl Coordinate {
    pub fn index(self) -> Option<isize> {
        match self {
            Coordinate::At(ix) => Some(ix),
            _ => None,
        }
    }

    pub fn is_gap(self) -> bool {
        self == Coordinate::Gap
    }

    pub fn is_out_of_range(self) -> bool {
        self == Coordinate::OutOfRange
    }

    // reference indices below zero or past the end don't exist
    pub(crate) fn bounded(ix: isize, len: isize) -> Self {
        if (0..len).contains(&ix) {
            Coordinate::At(ix)
        } else {
            Coordinate::OutOfRange
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coordinate::At(ix) => write!(f, "{ix}"),
            Coordinate::Gap => write!(f, "gap"),
            Coordinate::OutOfRange => write!(f, "-"),
        }
    }
}

/// Result of a coordinate query.
///
/// `before` and `after` are the closest concrete positions on either side
/// when `corresponding` is a sentinel; for a concrete hit they usually equal
/// `corresponding`, except next to an insertion or collapse where `before`
/// holds the unshifted position.
///
/// `ledger_index` is the number of shift entries located before the queried
/// position at query time. It is a plain index into
/// [`ShiftLedger::snapshot`](crate::ShiftLedger::snapshot), not a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRelation {
    pub before: Coordinate,
    pub corresponding: Coordinate,
    pub after: Coordinate,
    pub ledger_index: usize,
}

impl IndexRelation {
    pub fn new(
        before: Coordinate,
        corresponding: Coordinate,
        after: Coordinate,
        ledger_index: usize,
    ) -> Self {
        Self {
            before,
            corresponding,
            after,
            ledger_index,
        }
    }

    pub fn exact(ix: isize, ledger_index: usize) -> Self {
        let at = Coordinate::At(ix);
        Self::new(at, at, at, ledger_index)
    }

    pub fn gap(before: Coordinate, after: Coordinate, ledger_index: usize) -> Self {
        Self::new(before, Coordinate::Gap, after, ledger_index)
    }

    pub fn corresponding_index(&self) -> Option<isize> {
        self.corresponding.index()
    }
}

impl std::fmt::Display for IndexRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} < {} < {}", self.before, self.corresponding, self.after)
    }
}
