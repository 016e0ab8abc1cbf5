//! Ordered, rowId-indexed set of allocation rows.
//!
//! Invariants:
//! - rowIds are unique and positive.
//! - rowIds are never reused: new rows take one past the highest id ever
//!   assigned in this collection.
//! - After `initialize` the collection is never observed empty; a delete that
//!   removes the last row appends a fresh blank row before returning.

use std::collections::BTreeSet;

use crate::types::{AllocationRow, RowId};

/// Errors produced by collection mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionError {
    /// No row carries this id.
    UnknownRow(RowId),
    /// Two input rows claimed the same id.
    DuplicateRowId(RowId),
    /// Every rowId up to `u32::MAX` has been handed out.
    IdsExhausted,
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownRow(id) => write!(f, "no row with rowId {id}"),
            Self::DuplicateRowId(id) => write!(f, "duplicate rowId {id}"),
            Self::IdsExhausted => write!(f, "no rowIds left to assign"),
        }
    }
}

impl std::error::Error for CollectionError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowCollection {
    rows: Vec<AllocationRow>,
    /// Highest id ever handed out.
    high_water: u32,
}

impl Default for RowCollection {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl RowCollection {
    /// A collection holding a single blank row.
    pub fn placeholder() -> Self {
        let id = RowId::new(1);
        Self {
            rows: vec![AllocationRow::blank(id)],
            high_water: id.raw(),
        }
    }

    /// Load rows in order. Rows with [`RowId::UNASSIGNED`] get sequential ids
    /// starting at 1, skipping ids that other input rows already claim.
    pub fn initialize<I>(rows: I) -> Result<Self, CollectionError>
    where
        I: IntoIterator<Item = AllocationRow>,
    {
        let rows: Vec<AllocationRow> = rows.into_iter().collect();

        let mut claimed = BTreeSet::new();
        for row in rows.iter().filter(|r| r.row_id.is_assigned()) {
            if !claimed.insert(row.row_id) {
                return Err(CollectionError::DuplicateRowId(row.row_id));
            }
        }

        let mut next = 1u32;
        let mut out = Vec::with_capacity(rows.len());
        for mut row in rows {
            if !row.row_id.is_assigned() {
                while claimed.contains(&RowId::new(next)) {
                    next = next.checked_add(1).ok_or(CollectionError::IdsExhausted)?;
                }
                row.row_id = RowId::new(next);
                claimed.insert(row.row_id);
            }
            out.push(row);
        }

        let high_water = claimed.iter().next_back().map_or(0, |id| id.raw());
        let mut c = Self {
            rows: out,
            high_water,
        };
        c.pad_empty()?;
        Ok(c)
    }

    fn next_id(&self) -> Result<RowId, CollectionError> {
        self.high_water
            .checked_add(1)
            .map(RowId::new)
            .ok_or(CollectionError::IdsExhausted)
    }

    fn push_blank(&mut self, id: RowId) {
        self.high_water = id.raw();
        self.rows.push(AllocationRow::blank(id));
    }

    /// Append a blank row and return its id.
    pub fn add_row(&mut self) -> Result<RowId, CollectionError> {
        let id = self.next_id()?;
        self.push_blank(id);
        Ok(id)
    }

    /// Replace the stored row with the same rowId.
    pub fn apply_update(&mut self, row: AllocationRow) -> Result<(), CollectionError> {
        let slot = self
            .rows
            .iter_mut()
            .find(|r| r.row_id == row.row_id)
            .ok_or(CollectionError::UnknownRow(row.row_id))?;
        *slot = row;
        Ok(())
    }

    /// Remove the row with this id, then pad if nothing is left.
    ///
    /// Deleting the last row fails with `IdsExhausted`, and removes nothing,
    /// when no fresh id is left for the pad row.
    pub fn apply_delete(&mut self, row_id: RowId) -> Result<AllocationRow, CollectionError> {
        let idx = self
            .rows
            .iter()
            .position(|r| r.row_id == row_id)
            .ok_or(CollectionError::UnknownRow(row_id))?;
        let pad = if self.rows.len() == 1 {
            Some(self.next_id()?)
        } else {
            None
        };
        let removed = self.rows.remove(idx);
        if let Some(id) = pad {
            self.push_blank(id);
        }
        Ok(removed)
    }

    /// Append a blank row if the collection holds none.
    pub fn pad_empty(&mut self) -> Result<(), CollectionError> {
        if self.rows.is_empty() {
            self.add_row()?;
        }
        Ok(())
    }

    /// Rows in insertion order. Call again to restart.
    pub fn all(&self) -> std::slice::Iter<'_, AllocationRow> {
        self.rows.iter()
    }

    pub fn get(&self, row_id: RowId) -> Option<&AllocationRow> {
        self.rows.iter().find(|r| r.row_id == row_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false` once constructed; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `true` when the only row is the blank placeholder, meaning no
    /// allocations are configured.
    pub fn is_placeholder_only(&self) -> bool {
        self.rows.len() == 1 && self.rows[0].is_blank()
    }

    pub fn row_ids(&self) -> Vec<RowId> {
        self.rows.iter().map(|r| r.row_id).collect()
    }
}
