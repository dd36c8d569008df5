use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::mapping::PherogramMapping;
use crate::provider::ReferenceProvider;
use crate::relation::IndexRelation;
use crate::row::{EditableRow, TokenRow};

/// A single step of an edit script. Scripts are RON lists of steps, e.g.
///
/// ```text
/// [
///     Insert(start: 4, tokens: "--"),
///     Delete(start: 10, count: 2),
///     SetLeftCut(3),
///     Query(12),
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditStep {
    Insert {
        start: usize,
        tokens: String,
        #[serde(default)]
        left_bound: bool,
    },
    Delete {
        start: usize,
        count: usize,
    },
    Replace {
        start: usize,
        tokens: String,
    },
    SetLeftCut(isize),
    SetRightCut(isize),
    SetAnchor(isize),
    ReverseComplement,
    /// Editable column of a reference index.
    Query(isize),
    /// Reference index of an editable column.
    QueryColumn(isize),
}

pub fn parse_script(source: &str) -> anyhow::Result<Vec<EditStep>> {
    let steps = ron::de::from_str(source)?;
    Ok(steps)
}

pub fn load_script(path: impl AsRef<Path>) -> anyhow::Result<Vec<EditStep>> {
    let source = std::fs::read_to_string(path.as_ref())?;
    parse_script(&source)
}

/// Applies a step to the row and the mapping attached to it. Queries return
/// their result, everything else `None`.
pub fn run_step<P: ReferenceProvider>(
    step: &EditStep,
    row: &Rc<RefCell<TokenRow>>,
    mapping: &mut PherogramMapping<P>,
) -> anyhow::Result<Option<IndexRelation>> {
    let row_len = row.borrow().len();

    match step {
        EditStep::Insert {
            start,
            tokens,
            left_bound,
        } => {
            let change = row
                .borrow_mut()
                .insert(*start, tokens.as_bytes(), *left_bound);
            let Some(change) = change else {
                anyhow::bail!("Cannot insert `{tokens}` at {start}, the row has {row_len} tokens");
            };
            mapping.apply_token_change(&change)?;
        }
        EditStep::Delete { start, count } => {
            let change = row.borrow_mut().delete(*start, *count);
            let Some(change) = change else {
                anyhow::bail!(
                    "Cannot delete {count} tokens at {start}, the row has {row_len} tokens"
                );
            };
            mapping.apply_token_change(&change)?;
        }
        EditStep::Replace { start, tokens } => {
            let change = row.borrow_mut().replace(*start, tokens.as_bytes());
            let Some(change) = change else {
                anyhow::bail!("Cannot replace {start}.. with `{tokens}`, the row has {row_len} tokens");
            };
            mapping.apply_token_change(&change)?;
        }
        EditStep::SetLeftCut(value) => mapping.set_left_cut(*value)?,
        EditStep::SetRightCut(value) => mapping.set_right_cut(*value)?,
        EditStep::SetAnchor(value) => mapping.set_first_seq_pos(*value)?,
        EditStep::ReverseComplement => mapping.reverse_complement(),
        EditStep::Query(reference_index) => {
            return Ok(Some(
                mapping.editable_index_by_reference_index(*reference_index),
            ));
        }
        EditStep::QueryColumn(editable_index) => {
            return Ok(Some(
                mapping.reference_index_by_editable_index(*editable_index),
            ));
        }
    }

    Ok(None)
}

/// Runs all steps in order, stopping at the first failing one. Returns the
/// query results along with the index of the step that produced them.
pub fn run_script<P: ReferenceProvider>(
    steps: &[EditStep],
    row: &Rc<RefCell<TokenRow>>,
    mapping: &mut PherogramMapping<P>,
) -> anyhow::Result<Vec<(usize, IndexRelation)>> {
    let mut results = Vec::new();

    for (i, step) in steps.iter().enumerate() {
        log::debug!("step {i}: {step:?}");
        let result = run_step(step, row, mapping)
            .map_err(|err| err.context(format!("Step {i} ({step:?}) failed")))?;

        if let Some(relation) = result {
            results.push((i, relation));
        }
    }

    log::info!(
        "Ran {} steps, {} shift changes recorded",
        steps.len(),
        mapping.ledger().len()
    );

    Ok(results)
}
