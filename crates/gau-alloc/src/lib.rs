//! gau-alloc
//!
//! Allocation reconciliation engine: split a disbursement total across GAU
//! rows while keeping each row's amount and percent consistent.
//!
//! - Per-row amount/percent derivation with a locked (derived) side
//! - Ordered, never-empty row collection with stable rowIds
//! - Aggregate remainder and save eligibility after every mutation
//! - Load → edit → validate → save session over an external store
//!
//! Engine logic is pure and synchronous. The only async surface is the
//! store/search boundary declared in [`store`].

mod aggregate;
mod collection;
mod row;
mod session;
mod types;

pub mod lookup;
pub mod numeric;
pub mod store;

pub use aggregate::{recompute, AggregateState};
pub use collection::{CollectionError, RowCollection};
pub use lookup::{clean_search_term, CategoryLookup, LookupSettings};
pub use row::{row_is_valid, RowEditError, RowReconciler};
pub use session::{
    AllocationSession, SessionError, SessionMessages, SessionState, ValidationFailure,
};
pub use store::{
    AllocationStore, CategoryResult, CategorySearch, DisbursementRecord, Notifier, RowSubmission,
    StoreError, StoredRow, TracingNotifier,
};
pub use types::{
    AllocationRow, CategorySelection, Disbursement, DisbursementStatus, LockedField, RowEvent,
    RowId, PREFILL_ICON,
};

pub use rust_decimal::Decimal;
