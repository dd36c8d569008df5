use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub usize);

/// The parts of an alignment row the mapping needs to see.
pub trait EditableRow {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_gap(&self, index: usize) -> bool;

    /// The id the row stamps on its token changes, if it knows it.
    fn row_id(&self) -> Option<RowId> {
        None
    }
}

impl<R: EditableRow + ?Sized> EditableRow for Rc<RefCell<R>> {
    fn len(&self) -> usize {
        self.borrow().len()
    }

    fn is_gap(&self, index: usize) -> bool {
        self.borrow().is_gap(index)
    }

    fn row_id(&self) -> Option<RowId> {
        self.borrow().row_id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Insert,
    Delete,
    Replace,
}

/// Notification about a token-level change of a row, delivered after the
/// row was modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenChange {
    pub row_id: RowId,
    pub kind: ChangeKind,
    pub start: usize,
    pub count: usize,
    /// Inserted tokens are bound to the token on their left rather than the
    /// one on their right. Only matters at the edges of a mapped window.
    pub left_bound: bool,
}

/// A plain row of tokens, one byte per token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRow {
    id: RowId,
    tokens: Vec<u8>,
    gap_token: u8,
}

impl TokenRow {
    pub fn new(id: RowId, tokens: impl Into<Vec<u8>>, gap_token: u8) -> Self {
        Self {
            id,
            tokens: tokens.into(),
            gap_token,
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn tokens(&self) -> &[u8] {
        &self.tokens
    }

    pub fn gap_token(&self) -> u8 {
        self.gap_token
    }

    pub fn into_shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub fn insert(&mut self, start: usize, tokens: &[u8], left_bound: bool) -> Option<TokenChange> {
        if start > self.tokens.len() || tokens.is_empty() {
            return None;
        }
        self.tokens.splice(start..start, tokens.iter().copied());
        Some(self.change(ChangeKind::Insert, start, tokens.len(), left_bound))
    }

    pub fn delete(&mut self, start: usize, count: usize) -> Option<TokenChange> {
        let end = start.checked_add(count)?;
        if end > self.tokens.len() || count == 0 {
            return None;
        }
        self.tokens.drain(start..end);
        Some(self.change(ChangeKind::Delete, start, count, false))
    }

    /// Overwrites tokens in place; the row keeps its length.
    pub fn replace(&mut self, start: usize, tokens: &[u8]) -> Option<TokenChange> {
        let end = start.checked_add(tokens.len())?;
        if end > self.tokens.len() || tokens.is_empty() {
            return None;
        }
        self.tokens[start..end].copy_from_slice(tokens);
        Some(self.change(ChangeKind::Replace, start, tokens.len(), false))
    }

    fn change(&self, kind: ChangeKind, start: usize, count: usize, left_bound: bool) -> TokenChange {
        TokenChange {
            row_id: self.id,
            kind,
            start,
            count,
            left_bound,
        }
    }
}

impl EditableRow for TokenRow {
    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn is_gap(&self, index: usize) -> bool {
        self.tokens.get(index) == Some(&self.gap_token)
    }

    fn row_id(&self) -> Option<RowId> {
        Some(self.id)
    }
}
