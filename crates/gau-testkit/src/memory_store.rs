use std::collections::HashMap;
use std::sync::Mutex;

use gau_alloc::{AllocationStore, DisbursementRecord, RowSubmission, StoreError, StoredRow};

use crate::lock;

/// In-memory [`AllocationStore`].
///
/// A successful save replaces the record's rows with the submission,
/// numbered from 1. Injected failures are consumed by the next matching call.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, DisbursementRecord>>,
    saves: Mutex<Vec<(String, Vec<RowSubmission>)>>,
    get_calls: Mutex<Vec<String>>,
    fail_next_get: Mutex<Option<StoreError>>,
    fail_next_save: Mutex<Option<StoreError>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: DisbursementRecord) -> Self {
        self.insert(record);
        self
    }

    pub fn insert(&self, record: DisbursementRecord) {
        lock(&self.records).insert(record.id.clone(), record);
    }

    pub fn fail_next_get(&self, err: StoreError) {
        *lock(&self.fail_next_get) = Some(err);
    }

    pub fn fail_next_save(&self, err: StoreError) {
        *lock(&self.fail_next_save) = Some(err);
    }

    /// Every save call in order, including failed ones.
    pub fn saves(&self) -> Vec<(String, Vec<RowSubmission>)> {
        lock(&self.saves).clone()
    }

    pub fn save_count(&self) -> usize {
        lock(&self.saves).len()
    }

    pub fn get_count(&self) -> usize {
        lock(&self.get_calls).len()
    }

    pub fn current(&self, id: &str) -> Option<DisbursementRecord> {
        lock(&self.records).get(id).cloned()
    }
}

#[async_trait::async_trait]
impl AllocationStore for InMemoryStore {
    async fn get(&self, disbursement_id: &str) -> Result<DisbursementRecord, StoreError> {
        lock(&self.get_calls).push(disbursement_id.to_string());
        if let Some(err) = lock(&self.fail_next_get).take() {
            return Err(err);
        }
        lock(&self.records)
            .get(disbursement_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                disbursement_id: disbursement_id.to_string(),
            })
    }

    async fn save(&self, disbursement_id: &str, rows: &[RowSubmission]) -> Result<(), StoreError> {
        lock(&self.saves).push((disbursement_id.to_string(), rows.to_vec()));
        if let Some(err) = lock(&self.fail_next_save).take() {
            return Err(err);
        }
        let mut records = lock(&self.records);
        let Some(record) = records.get_mut(disbursement_id) else {
            return Err(StoreError::NotFound {
                disbursement_id: disbursement_id.to_string(),
            });
        };
        record.rows = rows
            .iter()
            .zip(1u32..)
            .map(|(r, n)| StoredRow {
                row_id: Some(n),
                gau_id: Some(r.gau_id.clone()),
                gau_name: Some(format!("{} fund", r.gau_id)),
                gau_is_active: true,
                amount: Some(r.amount),
            })
            .collect();
        Ok(())
    }
}
