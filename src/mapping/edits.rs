use crate::error::Result;
use crate::events::MappingChange;
use crate::provider::ReferenceProvider;
use crate::row::{ChangeKind, TokenChange};

use super::{check_anchor_in_row, Attachment, PherogramMapping};

impl<P: ReferenceProvider> PherogramMapping<P> {
    /// Updates the anchor and the shift changes after a token change of the
    /// attached row. The row must already reflect the change.
    ///
    /// Returns whether the mapping changed. Changes of other rows, and all
    /// changes while detached, are ignored. Replacements keep the row length
    /// and don't touch the mapping; gap tokens written by a replacement show
    /// up through the row's gap predicate.
    pub fn apply_token_change(&mut self, change: &TokenChange) -> Result<bool> {
        let Attachment::AttachedToRow { row_id, row } = &self.attachment else {
            log::debug!("ignoring token change of row {:?}, mapping is detached", change.row_id);
            return Ok(false);
        };
        if *row_id != change.row_id {
            return Ok(false);
        }

        let start = change.start as isize;
        let count = change.count as isize;
        if count == 0 {
            return Ok(false);
        }

        let anchor = self.first_seq_pos;
        let window_end = self.editable_window().end;

        // (anchor shift, shift change and the reference index it applies to)
        let (anchor_shift, shift) = match change.kind {
            ChangeKind::Replace => {
                log::debug!("replacement of {count} tokens at {start} leaves the mapping as is");
                return Ok(false);
            }
            ChangeKind::Insert => {
                if start < anchor || (start == anchor && change.left_bound) {
                    (count, None)
                } else if start < window_end || (start == window_end && change.left_bound) {
                    (0, Some((self.reference_at_column(start), count)))
                } else {
                    return Ok(false);
                }
            }
            ChangeKind::Delete => {
                let end = start + count;
                let before = (end.min(anchor) - start).max(0);
                let after = (end - start.max(window_end)).max(0);
                let inside = count - before - after;

                let shift = (inside > 0)
                    .then(|| (self.reference_at_column(start.max(anchor)), -inside));
                (-before, shift)
            }
        };

        if anchor_shift == 0 && shift.is_none() {
            return Ok(false);
        }

        let new_anchor = anchor + anchor_shift;
        if let Err(err) = check_anchor_in_row(new_anchor, row.as_ref()) {
            log::warn!("Rejected {:?} of {count} tokens at {start}: {err}", change.kind);
            return Err(err);
        }

        log::debug!(
            "{:?} of {count} tokens at {start}: anchor {anchor} -> {new_anchor}, shift change {shift:?}",
            change.kind
        );

        let mut changes = Vec::new();

        if new_anchor != anchor {
            self.first_seq_pos = new_anchor;
            changes.push(MappingChange::Anchor {
                old: anchor,
                new: new_anchor,
            });
        }
        if let Some((reference_index, delta)) = shift {
            self.ledger.add_shift_change(reference_index, delta);
            changes.push(MappingChange::ShiftChanges);
        }

        self.listeners.dispatch(&changes);
        Ok(true)
    }

    // the reference index an edit at `column` is recorded at: the position
    // at the column, or the one following an inserted block, or the right
    // cut past the last mapped position
    fn reference_at_column(&self, column: isize) -> isize {
        if column >= self.editable_window().end {
            return self.right_cut;
        }
        let relation = self.reference_relation(column);
        relation
            .corresponding
            .index()
            .or(relation.after.index())
            .unwrap_or(self.right_cut)
    }
}
