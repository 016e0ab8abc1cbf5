use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Icon shown in the lookup for a category carried over from a stored row.
pub const PREFILL_ICON: &str = "custom:custom87";

/// Lifecycle status of a disbursement as reported by the store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisbursementStatus {
    Open,
    Paid,
    Cancelled,
}

impl DisbursementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisbursementStatus::Open => "Open",
            DisbursementStatus::Paid => "Paid",
            DisbursementStatus::Cancelled => "Cancelled",
        }
    }
}

/// The parent transaction whose total is split across rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disbursement {
    pub id: String,
    pub name: String,
    /// Non-negative total to allocate.
    pub total_amount: Decimal,
    pub status: DisbursementStatus,
}

/// Client-side row identifier.
///
/// Positive within a collection. `RowId::UNASSIGNED` marks a row that has not
/// been placed in a collection yet; [`crate::RowCollection::initialize`]
/// assigns it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(u32);

impl RowId {
    pub const UNASSIGNED: RowId = RowId(0);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        RowId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_assigned(self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of amount/percent is currently derived (read-only) on a row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockedField {
    #[default]
    None,
    Amount,
    Percent,
}

/// One allocation line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRow {
    pub row_id: RowId,
    /// Chosen category; `None` until a selection is made.
    pub gau_id: Option<String>,
    /// Name carried from the store for prefill only. Dropped once a
    /// selection sets `gau_id`.
    pub gau_display_name: Option<String>,
    /// Rows whose category has been deactivated load disabled.
    pub gau_is_active: bool,
    pub amount: Option<Decimal>,
    pub percent: Option<Decimal>,
    pub locked_field: LockedField,
}

impl AllocationRow {
    /// A fresh row with nothing chosen.
    pub fn blank(row_id: RowId) -> Self {
        Self {
            row_id,
            gau_id: None,
            gau_display_name: None,
            gau_is_active: true,
            amount: None,
            percent: None,
            locked_field: LockedField::None,
        }
    }

    /// `true` when neither a category nor a non-zero amount has been entered.
    pub fn is_blank(&self) -> bool {
        self.gau_id.is_none() && self.amount.map_or(true, |a| a.is_zero())
    }

    /// `true` when both a category and an amount are present.
    pub fn is_complete(&self) -> bool {
        self.gau_id.is_some() && self.amount.is_some()
    }

    /// Selection to show in the category lookup before the user touches it.
    pub fn prefill_selection(&self) -> Vec<CategorySelection> {
        match (&self.gau_id, &self.gau_display_name) {
            (_, Some(title)) => vec![CategorySelection {
                id: self.gau_id.clone(),
                title: title.clone(),
                icon: PREFILL_ICON.to_string(),
            }],
            _ => Vec::new(),
        }
    }
}

/// A category picked in the lookup widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySelection {
    /// `None` for a prefill entry that only carries a display name.
    pub id: Option<String>,
    pub title: String,
    pub icon: String,
}

/// Message raised by a row surface toward the collection owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowEvent {
    Update(AllocationRow),
    Delete(AllocationRow),
}

impl RowEvent {
    pub fn row(&self) -> &AllocationRow {
        match self {
            RowEvent::Update(row) | RowEvent::Delete(row) => row,
        }
    }
}
