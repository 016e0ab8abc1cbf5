//! Boundary contracts consumed by the session: the allocation store, the
//! category search service and the notifier.
//!
//! Wire shapes use camelCase field names so stored documents and HTTP bodies
//! match what the record pages already exchange.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AllocationRow, Disbursement, DisbursementStatus, RowId};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One stored allocation as returned by [`AllocationStore::get`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<u32>,
    #[serde(default)]
    pub gau_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gau_name: Option<String>,
    #[serde(default = "default_true")]
    pub gau_is_active: bool,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

fn default_true() -> bool {
    true
}

impl StoredRow {
    /// Convert into a collection row. An absent row id stays unassigned so
    /// the collection numbers it.
    pub fn into_row(self) -> AllocationRow {
        let mut row = AllocationRow::blank(RowId::new(self.row_id.unwrap_or(0)));
        row.gau_id = self.gau_id.filter(|id| !id.is_empty());
        row.gau_display_name = self.gau_name;
        row.gau_is_active = self.gau_is_active;
        row.amount = self.amount;
        row
    }
}

/// Disbursement plus its allocations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisbursementRecord {
    pub id: String,
    pub name: String,
    pub amount: Decimal,
    pub status: DisbursementStatus,
    #[serde(default)]
    pub rows: Vec<StoredRow>,
}

impl DisbursementRecord {
    pub fn disbursement(&self) -> Disbursement {
        Disbursement {
            id: self.id.clone(),
            name: self.name.clone(),
            total_amount: self.amount.abs(),
            status: self.status,
        }
    }
}

/// One allocation submitted by [`AllocationStore::save`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSubmission {
    pub gau_id: String,
    pub amount: Decimal,
}

/// A search hit from [`CategorySearch::search`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Failures reported by an [`AllocationStore`].
///
/// `Validation` and `Server` carry a message that is shown to the user
/// verbatim, so their `Display` is exactly that message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    NotFound { disbursement_id: String },
    AccessDenied { disbursement_id: String },
    Validation(String),
    Server(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { disbursement_id } => {
                write!(f, "disbursement '{disbursement_id}' was not found")
            }
            Self::AccessDenied { disbursement_id } => {
                write!(f, "access to disbursement '{disbursement_id}' was denied")
            }
            Self::Validation(msg) | Self::Server(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Record fetch/save transport for disbursements and their allocations.
///
/// `save` replaces the full allocation set; an empty slice clears it.
#[async_trait::async_trait]
pub trait AllocationStore: Send + Sync {
    async fn get(&self, disbursement_id: &str) -> Result<DisbursementRecord, StoreError>;

    async fn save(&self, disbursement_id: &str, rows: &[RowSubmission]) -> Result<(), StoreError>;
}

/// Category lookup backend.
#[async_trait::async_trait]
pub trait CategorySearch: Send + Sync {
    async fn search(
        &self,
        term: &str,
        excluded_ids: &[String],
    ) -> anyhow::Result<Vec<CategoryResult>>;
}

/// User-facing notices. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
}

/// Notifier that writes notices to the tracing log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, message: &str) {
        tracing::info!(notice = "success", "{message}");
    }

    fn notify_error(&self, message: &str) {
        tracing::error!(notice = "error", "{message}");
    }
}
