//! Row reconciler: keeps one row's amount and percent consistent.
//!
//! Editing one side derives the other against the disbursement total and
//! locks the derived side. Every effective edit yields a [`RowEvent::Update`]
//! carrying the full row; the reconciler never removes itself; deletion is
//! requested with [`RowEvent::Delete`] and performed by the collection owner.

use rust_decimal::Decimal;

use crate::numeric::{amount_of, coerce_non_negative, percent_of};
use crate::types::{AllocationRow, CategorySelection, LockedField, RowEvent, RowId};

/// Errors produced by a row edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowEditError {
    /// The row's category is inactive; only deletion is permitted.
    Disabled { row_id: RowId },
}

impl std::fmt::Display for RowEditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled { row_id } => {
                write!(f, "row {row_id} is disabled (inactive category)")
            }
        }
    }
}

impl std::error::Error for RowEditError {}

/// Edit surface for a single allocation row.
#[derive(Clone, Debug)]
pub struct RowReconciler {
    row: AllocationRow,
    total_amount: Decimal,
}

impl RowReconciler {
    pub fn new(row: AllocationRow, total_amount: Decimal) -> Self {
        Self { row, total_amount }
    }

    /// Build a row from stored data: an existing amount derives its percent
    /// up front and locks the percent side.
    pub fn prefill(mut row: AllocationRow, total_amount: Decimal) -> Self {
        if let Some(amount) = row.amount {
            row.percent = Some(percent_of(amount, total_amount));
            row.locked_field = LockedField::Percent;
        }
        Self { row, total_amount }
    }

    pub fn row(&self) -> &AllocationRow {
        &self.row
    }

    pub fn into_row(self) -> AllocationRow {
        self.row
    }

    pub fn is_disabled(&self) -> bool {
        !self.row.gau_is_active
    }

    /// Set the amount from raw input and derive the percent.
    ///
    /// Returns `Ok(None)` when the coerced value equals the stored amount.
    /// Blank input stores zero and releases the lock.
    pub fn set_amount(&mut self, raw: Option<&str>) -> Result<Option<RowEvent>, RowEditError> {
        self.ensure_enabled()?;
        let c = coerce_non_negative(raw);
        let lock = if c.cleared {
            LockedField::None
        } else {
            LockedField::Percent
        };
        if self.row.amount == Some(c.value) && (!c.cleared || self.row.locked_field == lock) {
            return Ok(None);
        }

        self.row.amount = Some(c.value);
        self.row.percent = Some(percent_of(c.value, self.total_amount));
        self.row.locked_field = lock;
        Ok(Some(self.update()))
    }

    /// Set the percent from raw input and derive the amount.
    pub fn set_percent(&mut self, raw: Option<&str>) -> Result<Option<RowEvent>, RowEditError> {
        self.ensure_enabled()?;
        let c = coerce_non_negative(raw);
        let lock = if c.cleared {
            LockedField::None
        } else {
            LockedField::Amount
        };
        if self.row.percent == Some(c.value) && (!c.cleared || self.row.locked_field == lock) {
            return Ok(None);
        }

        self.row.percent = Some(c.value);
        self.row.amount = Some(amount_of(c.value, self.total_amount));
        self.row.locked_field = lock;
        Ok(Some(self.update()))
    }

    /// Apply the lookup selection. Only the first entry counts; an empty
    /// selection clears the category.
    pub fn set_category(&mut self, selection: &[CategorySelection]) -> Result<RowEvent, RowEditError> {
        self.ensure_enabled()?;
        self.row.gau_id = selection.first().and_then(|s| s.id.clone());
        // Prefill name is only meaningful until the user chooses.
        self.row.gau_display_name = None;
        Ok(self.update())
    }

    pub fn request_delete(&self) -> RowEvent {
        RowEvent::Delete(self.row.clone())
    }

    /// Amount present and non-negative. Category is checked at save time.
    pub fn is_valid(&self) -> bool {
        row_is_valid(&self.row)
    }

    fn ensure_enabled(&self) -> Result<(), RowEditError> {
        if self.is_disabled() {
            return Err(RowEditError::Disabled {
                row_id: self.row.row_id,
            });
        }
        Ok(())
    }

    fn update(&self) -> RowEvent {
        RowEvent::Update(self.row.clone())
    }
}

/// Row-level validity shared by the reconciler and the aggregate.
pub fn row_is_valid(row: &AllocationRow) -> bool {
    row.amount.is_some_and(|a| !a.is_sign_negative())
}
