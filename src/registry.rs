use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::mapping::PherogramMapping;
use crate::provider::ReferenceProvider;
use crate::row::{EditableRow, RowId, TokenChange};

/// The mappings of an alignment, one per row that has a trace.
///
/// Rows are registered by name; a row keeps its id for as long as it is
/// registered. Removing a row drops its mapping.
pub struct RowMappings<P> {
    row_names: bimap::BiMap<String, RowId>,
    next_id: usize,

    mappings: FxHashMap<RowId, PherogramMapping<P>>,
}

impl<P> Default for RowMappings<P> {
    fn default() -> Self {
        Self {
            row_names: bimap::BiMap::new(),
            next_id: 0,
            mappings: FxHashMap::default(),
        }
    }
}

impl<P: ReferenceProvider> RowMappings<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_row(&mut self, name: &str) -> RowId {
        if let Some(id) = self.row_names.get_by_left(name) {
            return *id;
        }
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.row_names.insert(name.to_string(), id);
        id
    }

    pub fn row_id(&self, name: &str) -> Option<RowId> {
        self.row_names.get_by_left(name).copied()
    }

    pub fn row_name(&self, id: RowId) -> Option<&str> {
        self.row_names.get_by_right(&id).map(|s| s.as_str())
    }

    /// Registers `name` if needed and attaches a new mapping of `provider`
    /// to its row, replacing any previous mapping of that row. A row that
    /// knows its id has to carry the one registered for `name`.
    pub fn attach(
        &mut self,
        name: &str,
        provider: P,
        row: impl EditableRow + 'static,
        first_seq_pos: isize,
    ) -> Result<RowId> {
        let id = self.register_row(name);
        let mapping = PherogramMapping::attached(provider, id, row, first_seq_pos)?;

        if self.mappings.insert(id, mapping).is_some() {
            log::warn!("Replaced existing trace mapping of row `{name}`");
        }
        Ok(id)
    }

    pub fn get(&self, id: RowId) -> Option<&PherogramMapping<P>> {
        self.mappings.get(&id)
    }

    pub fn get_mut(&mut self, id: RowId) -> Option<&mut PherogramMapping<P>> {
        self.mappings.get_mut(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&PherogramMapping<P>> {
        self.get(self.row_id(name)?)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Hands a token change to the mapping of the changed row, if any.
    pub fn dispatch(&mut self, change: &TokenChange) -> Result<bool> {
        match self.mappings.get_mut(&change.row_id) {
            Some(mapping) => mapping.apply_token_change(change),
            None => Ok(false),
        }
    }

    /// Unregisters a row, returning its mapping.
    pub fn remove_row(&mut self, id: RowId) -> Option<PherogramMapping<P>> {
        if let Some((name, _)) = self.row_names.remove_by_right(&id) {
            log::debug!("removed row `{name}`");
        }
        self.mappings.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowId, &PherogramMapping<P>)> + '_ {
        self.mappings.iter().map(|(id, mapping)| (*id, mapping))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TraceData;
    use crate::relation::Coordinate;
    use crate::row::TokenRow;

    #[test]
    fn routes_changes_to_their_row() {
        let mut rows = RowMappings::new();
        let trace = || TraceData::from_base_calls(b"ACGTACGT", 4);

        let first = TokenRow::new(RowId(0), "ACGTACGT", b'-').into_shared();
        let id = rows.attach("read_1", trace(), first.clone(), 0).unwrap();
        assert_eq!(id, RowId(0));

        let other = rows.register_row("consensus");
        assert_eq!(rows.register_row("read_1"), id);
        assert_eq!(rows.row_name(other), Some("consensus"));
        assert_eq!(rows.len(), 1);

        let change = first.borrow_mut().insert(2, b"--", false).unwrap();
        assert!(rows.dispatch(&change).unwrap());

        let mut unmapped = TokenRow::new(other, "ACGT", b'-');
        let change = unmapped.delete(0, 1).unwrap();
        assert!(!rows.dispatch(&change).unwrap());

        let mapping = rows.get_by_name("read_1").unwrap();
        assert_eq!(
            mapping.editable_index_by_reference_index(2).corresponding,
            Coordinate::At(4)
        );
    }

    #[test]
    fn removing_a_row_drops_its_mapping() {
        let mut rows = RowMappings::new();
        let row = TokenRow::new(RowId(0), "ACGT", b'-');
        let id = rows
            .attach("read", TraceData::from_base_calls(b"ACGT", 2), row, 0)
            .unwrap();

        assert!(rows.remove_row(id).is_some());
        assert!(rows.get(id).is_none());
        assert_eq!(rows.row_id("read"), None);
        assert!(rows.is_empty());

        // ids are not reused
        assert_eq!(rows.register_row("read"), RowId(1));
    }

    #[test]
    fn row_with_foreign_id_is_refused() {
        let mut rows = RowMappings::new();
        rows.register_row("consensus");

        // built before registering, so it carries id 0 while "read" gets 1
        let row = TokenRow::new(RowId(0), "ACGT", b'-').into_shared();
        let err = rows
            .attach("read", TraceData::from_base_calls(b"ACGT", 2), row.clone(), 0)
            .unwrap_err();
        assert_eq!(
            err,
            crate::MappingError::RowMismatch {
                expected: RowId(1),
                found: RowId(0)
            }
        );
        assert!(rows.get_by_name("read").is_none());

        // a change of that row reaches no mapping
        let change = row.borrow_mut().insert(0, b"-", false).unwrap();
        assert!(!rows.dispatch(&change).unwrap());
    }

    #[test]
    fn invalid_anchor_is_not_registered() {
        let mut rows = RowMappings::new();
        let row = TokenRow::new(RowId(0), "ACGT", b'-');
        assert!(rows
            .attach("read", TraceData::from_base_calls(b"ACGT", 2), row, 4)
            .is_err());
        assert!(rows.is_empty());
    }
}
