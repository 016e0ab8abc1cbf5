//! gau-testkit
//!
//! Deterministic in-process doubles for driving an `AllocationSession`
//! without a record service:
//! - [`InMemoryStore`]: records every call, fails on demand
//! - [`RecordingNotifier`]: keeps every notice in order
//! - [`StubCategorySearch`]: fixed catalogue with substring matching

mod memory_store;
mod notifier;
mod search;

pub use memory_store::InMemoryStore;
pub use notifier::{Notice, RecordingNotifier};
pub use search::StubCategorySearch;

use std::sync::{Mutex, MutexGuard, PoisonError};

use gau_alloc::{DisbursementRecord, DisbursementStatus, StoredRow};
use rust_decimal::Decimal;

/// Disbursement record fixture.
pub fn record(
    id: &str,
    amount: Decimal,
    status: DisbursementStatus,
    rows: Vec<StoredRow>,
) -> DisbursementRecord {
    DisbursementRecord {
        id: id.to_string(),
        name: format!("Disbursement {id}"),
        amount,
        status,
        rows,
    }
}

/// Stored allocation fixture with a display name derived from the GAU id.
pub fn stored(gau_id: &str, amount: Decimal) -> StoredRow {
    StoredRow {
        row_id: None,
        gau_id: Some(gau_id.to_string()),
        gau_name: Some(format!("{gau_id} fund")),
        gau_is_active: true,
        amount: Some(amount),
    }
}

// Doubles stay usable after a panicking test thread.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
