use thiserror::Error;

use crate::row::RowId;

pub type Result<T> = std::result::Result<T, MappingError>;

/// Precondition failures of mapping mutations. Returned before any state
/// is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("cut position {value} outside of reference range [0, {reference_len}]")]
    CutOutOfRange { value: isize, reference_len: usize },

    #[error("left cut {left} lies beyond right cut {right}")]
    WindowInverted { left: isize, right: isize },

    #[error("anchor {value} outside of editable range [0, {editable_len})")]
    AnchorOutOfRange { value: isize, editable_len: usize },

    #[error("row reports id {found:?} but is attached as {expected:?}")]
    RowMismatch { expected: RowId, found: RowId },

    #[error("shift change at {reference_index} does not fit into the window [{left_cut}, {right_cut})")]
    ShiftOutsideWindow {
        reference_index: isize,
        left_cut: isize,
        right_cut: isize,
    },

    #[error("trace with {base_calls} base calls has {positions} positions/qualities and {trace_len} samples")]
    InconsistentTrace {
        base_calls: usize,
        positions: usize,
        trace_len: usize,
    },
}
