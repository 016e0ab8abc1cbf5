//! gau-store
//!
//! Concrete [`gau_alloc::AllocationStore`] / [`gau_alloc::CategorySearch`]
//! adapters:
//! - [`JsonFileStore`]: one JSON document on disk, for local runs and fixtures
//! - [`HttpAllocationStore`]: a remote record service over HTTP
//!
//! Both enforce the same server-side rules on save: every GAU must exist and
//! be active, and the rows may not exceed the disbursement total.

mod file;
mod http;

pub use file::{CategoryEntry, JsonFileStore, StoreDocument};
pub use http::HttpAllocationStore;

/// Default cap on search hits returned by an adapter.
pub const SEARCH_LIMIT: usize = 10;
