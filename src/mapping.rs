use crate::error::{MappingError, Result};
use crate::events::{ListenerId, ListenerSet, MappingChange, MappingEvent, Subscription};
use crate::ledger::ShiftLedger;
use crate::provider::ReferenceProvider;
use crate::row::{EditableRow, RowId};

mod edits;
mod translate;

/// Whether a mapping is bound to an alignment row.
pub enum Attachment {
    /// Translation uses the ledger, the cut window and the anchor only.
    Detached,
    /// Token changes of `row_id` are translated into the mapping, the anchor
    /// is validated against the row length and the row's gap tokens show up
    /// in query results.
    AttachedToRow {
        row_id: RowId,
        row: Box<dyn EditableRow>,
    },
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attachment::Detached => write!(f, "Detached"),
            Attachment::AttachedToRow { row_id, row } => f
                .debug_struct("AttachedToRow")
                .field("row_id", row_id)
                .field("row_len", &row.len())
                .finish(),
        }
    }
}

/// Keeps the base call index space of a trace and the editable index space
/// of one alignment row in correspondence.
#[derive(Debug)]
pub struct PherogramMapping<P> {
    provider: P,
    ledger: ShiftLedger,

    // editable index of the first column of the mapped window
    first_seq_pos: isize,
    left_cut: isize,
    right_cut: isize,

    attachment: Attachment,
    listeners: ListenerSet,
}

impl<P: ReferenceProvider> PherogramMapping<P> {
    /// A detached mapping showing the whole trace, starting at editable
    /// index 0.
    pub fn new(provider: P) -> Self {
        let right_cut = provider.sequence_len() as isize;
        Self {
            provider,
            ledger: ShiftLedger::new(),
            first_seq_pos: 0,
            left_cut: 0,
            right_cut,
            attachment: Attachment::Detached,
            listeners: ListenerSet::default(),
        }
    }

    pub fn attached(
        provider: P,
        row_id: RowId,
        row: impl EditableRow + 'static,
        first_seq_pos: isize,
    ) -> Result<Self> {
        let mut mapping = Self::new(provider);
        mapping.attach(row_id, row, first_seq_pos)?;
        Ok(mapping)
    }

    pub fn attach(
        &mut self,
        row_id: RowId,
        row: impl EditableRow + 'static,
        first_seq_pos: isize,
    ) -> Result<()> {
        if let Some(found) = row.row_id().filter(|&id| id != row_id) {
            return Err(MappingError::RowMismatch {
                expected: row_id,
                found,
            });
        }
        check_anchor_in_row(first_seq_pos, &row)?;

        log::debug!("attaching mapping to row {row_id:?} at {first_seq_pos}");

        self.attachment = Attachment::AttachedToRow {
            row_id,
            row: Box::new(row),
        };

        let old = std::mem::replace(&mut self.first_seq_pos, first_seq_pos);
        if old != first_seq_pos {
            self.listeners.dispatch(&[MappingChange::Anchor {
                old,
                new: first_seq_pos,
            }]);
        }
        Ok(())
    }

    pub fn detach(&mut self) -> Attachment {
        std::mem::replace(&mut self.attachment, Attachment::Detached)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn ledger(&self) -> &ShiftLedger {
        &self.ledger
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    pub fn row_id(&self) -> Option<RowId> {
        match &self.attachment {
            Attachment::Detached => None,
            Attachment::AttachedToRow { row_id, .. } => Some(*row_id),
        }
    }

    pub fn reference_len(&self) -> isize {
        self.provider.sequence_len() as isize
    }

    pub fn first_seq_pos(&self) -> isize {
        self.first_seq_pos
    }

    pub fn left_cut(&self) -> isize {
        self.left_cut
    }

    pub fn right_cut(&self) -> isize {
        self.right_cut
    }

    /// The visible reference positions.
    pub fn reference_window(&self) -> std::ops::Range<isize> {
        self.left_cut..self.right_cut
    }

    /// The editable columns covered by the visible reference positions,
    /// inserted columns included.
    pub fn editable_window(&self) -> std::ops::Range<isize> {
        let start = self.first_seq_pos;
        let end = start + (self.right_cut - self.left_cut) + self.ledger.total_shift();
        start..end.max(start)
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&MappingEvent) -> Subscription + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn check_anchor(&self, value: isize) -> Result<()> {
        match &self.attachment {
            Attachment::Detached => Ok(()),
            Attachment::AttachedToRow { row, .. } => check_anchor_in_row(value, row.as_ref()),
        }
    }

    fn check_cut(&self, value: isize) -> Result<()> {
        let reference_len = self.provider.sequence_len();
        if value < 0 || value > reference_len as isize {
            return Err(MappingError::CutOutOfRange {
                value,
                reference_len,
            });
        }
        Ok(())
    }

    /// Moves the left cut. The anchor follows, so the remaining visible
    /// positions keep their editable columns. A left cut beyond the right cut
    /// pushes the right cut along.
    pub fn set_left_cut(&mut self, value: isize) -> Result<()> {
        self.check_cut(value)?;
        let right = self.right_cut.max(value);
        self.update_cuts(value, right)
    }

    /// Moves the right cut. The anchor only moves if the left cut has to be
    /// pulled along.
    pub fn set_right_cut(&mut self, value: isize) -> Result<()> {
        self.check_cut(value)?;
        let left = self.left_cut.min(value);
        self.update_cuts(left, value)
    }

    pub fn set_first_seq_pos(&mut self, value: isize) -> Result<()> {
        self.check_anchor(value)?;
        let old = std::mem::replace(&mut self.first_seq_pos, value);
        if old != value {
            self.listeners
                .dispatch(&[MappingChange::Anchor { old, new: value }]);
        }
        Ok(())
    }

    /// Sets anchor and both cuts at once without re-anchoring, e.g. when
    /// restoring a stored state.
    pub fn set_first_seq_pos_and_cuts(
        &mut self,
        first_seq_pos: isize,
        left_cut: isize,
        right_cut: isize,
    ) -> Result<()> {
        self.check_cut(left_cut)?;
        self.check_cut(right_cut)?;
        if left_cut > right_cut {
            return Err(MappingError::WindowInverted {
                left: left_cut,
                right: right_cut,
            });
        }
        self.check_anchor(first_seq_pos)?;

        let anchor_old = std::mem::replace(&mut self.first_seq_pos, first_seq_pos);
        let mut changes = Vec::new();
        if anchor_old != first_seq_pos {
            changes.push(MappingChange::Anchor {
                old: anchor_old,
                new: first_seq_pos,
            });
        }

        // anchor is already final; the prefix shift of the clip is dropped
        let cut_changes = self.commit_cuts(left_cut, right_cut, None);
        changes.extend(cut_changes);

        self.listeners.dispatch(&changes);
        Ok(())
    }

    // both cuts are validated; a cascade is resolved by the callers, so the
    // ledger is clipped exactly once per change
    fn update_cuts(&mut self, left: isize, right: isize) -> Result<()> {
        let mut ledger = self.ledger.clone();
        let prefix = ledger.clip(left, right);

        let anchor = self.first_seq_pos + (left - self.left_cut) + prefix;
        self.check_anchor(anchor)?;

        let mut changes = self.commit_cuts(left, right, Some(ledger));

        if anchor != self.first_seq_pos {
            changes.push(MappingChange::Anchor {
                old: self.first_seq_pos,
                new: anchor,
            });
            self.first_seq_pos = anchor;
        }

        self.listeners.dispatch(&changes);
        Ok(())
    }

    fn commit_cuts(
        &mut self,
        left: isize,
        right: isize,
        clipped: Option<ShiftLedger>,
    ) -> Vec<MappingChange> {
        let clipped = clipped.unwrap_or_else(|| {
            let mut ledger = self.ledger.clone();
            ledger.clip(left, right);
            ledger
        });

        let mut changes = Vec::new();

        if left != self.left_cut {
            changes.push(MappingChange::LeftCut {
                old: self.left_cut,
                new: left,
            });
            self.left_cut = left;
        }
        if right != self.right_cut {
            changes.push(MappingChange::RightCut {
                old: self.right_cut,
                new: right,
            });
            self.right_cut = right;
        }
        if clipped != self.ledger {
            self.ledger = clipped;
            changes.push(MappingChange::ShiftChanges);
        }

        changes
    }

    /// Records an explicit distortion. The entry has to lie within the
    /// window: insertions in `[left_cut, right_cut]`, collapsed spans within
    /// `[left_cut, right_cut)`.
    pub fn set_shift_change(&mut self, reference_index: isize, shift_change: isize) -> Result<()> {
        self.check_shift_fits(reference_index, shift_change)?;
        self.ledger.set_shift_change(reference_index, shift_change);
        self.listeners.dispatch(&[MappingChange::ShiftChanges]);
        Ok(())
    }

    pub fn add_shift_change(&mut self, reference_index: isize, delta: isize) -> Result<()> {
        let current = self.ledger.get(reference_index).unwrap_or_default();
        self.set_shift_change(reference_index, current + delta)
    }

    fn check_shift_fits(&self, reference_index: isize, shift_change: isize) -> Result<()> {
        let end = reference_index + (-shift_change).max(0);
        let fits = reference_index >= self.left_cut
            && if shift_change < 0 {
                end <= self.right_cut
            } else {
                reference_index <= self.right_cut
            };

        if !fits {
            return Err(MappingError::ShiftOutsideWindow {
                reference_index,
                left_cut: self.left_cut,
                right_cut: self.right_cut,
            });
        }
        Ok(())
    }

    /// Replaces the trace by its reverse complement. The ledger and the cut
    /// window are mirrored, the anchor stays. Listeners see the provider
    /// change first, then the left and the right cut.
    pub fn reverse_complement(&mut self) {
        let len = self.reference_len();

        self.provider = self.provider.reverse_complement();
        self.ledger.mirror(len);

        let left_old = self.left_cut;
        let right_old = self.right_cut;
        self.left_cut = len - right_old;
        self.right_cut = len - left_old;

        log::debug!(
            "reverse complemented trace, window [{left_old}, {right_old}) -> [{}, {})",
            self.left_cut,
            self.right_cut
        );

        self.listeners.dispatch(&[
            MappingChange::ProviderReplaced,
            MappingChange::LeftCut {
                old: left_old,
                new: self.left_cut,
            },
            MappingChange::RightCut {
                old: right_old,
                new: self.right_cut,
            },
        ]);
    }

    /// Replaces the whole trace. The window is reset to the full trace and
    /// all shift changes are dropped.
    pub fn set_provider(&mut self, provider: P) {
        self.provider = provider;
        self.ledger.clear();

        let left_old = self.left_cut;
        let right_old = self.right_cut;
        self.left_cut = 0;
        self.right_cut = self.reference_len();

        self.listeners.dispatch(&[
            MappingChange::ProviderReplaced,
            MappingChange::LeftCut {
                old: left_old,
                new: self.left_cut,
            },
            MappingChange::RightCut {
                old: right_old,
                new: self.right_cut,
            },
            MappingChange::ShiftChanges,
        ]);
    }
}

fn check_anchor_in_row(value: isize, row: &(impl EditableRow + ?Sized)) -> Result<()> {
    let editable_len = row.len();
    if value < 0 || value >= editable_len as isize {
        return Err(MappingError::AnchorOutOfRange {
            value,
            editable_len,
        });
    }
    Ok(())
}
