use std::path::{Path, PathBuf};

use anyhow::Context;
use gau_alloc::{
    AllocationStore, CategoryResult, CategorySearch, DisbursementRecord, RowSubmission,
    StoreError, StoredRow,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::SEARCH_LIMIT;

/// One selectable GAU in the store document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// On-disk layout of a [`JsonFileStore`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub disbursements: Vec<DisbursementRecord>,
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

impl StoreDocument {
    fn category(&self, id: &str) -> Option<&CategoryEntry> {
        self.categories.iter().find(|c| c.id == id)
    }
}

/// Store backed by a single JSON file.
///
/// Every call re-reads the file; `save` rewrites it through a temp file and
/// rename. Saves are serialised within one process.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read_document(&self) -> anyhow::Result<StoreDocument> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read store file: {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid store file: {}", self.path.display()))
    }

    pub async fn write_document(&self, doc: &StoreDocument) -> anyhow::Result<()> {
        let body = serde_json::to_string_pretty(doc).context("store document serialize failed")?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

fn server(e: anyhow::Error) -> StoreError {
    StoreError::Server(format!("{e:#}"))
}

/// Rows as presented to a reader: names and active flags come from the
/// category table when the GAU is known there.
fn resolve_rows(doc: &StoreDocument, rows: &[StoredRow]) -> Vec<StoredRow> {
    rows.iter()
        .map(|r| {
            let mut out = r.clone();
            if let Some(c) = r.gau_id.as_deref().and_then(|id| doc.category(id)) {
                out.gau_name = Some(c.title.clone());
                out.gau_is_active = c.active;
            }
            out
        })
        .collect()
}

/// Server-side checks applied to a submitted allocation set.
///
/// An inactive GAU is accepted only for a row the record already holds with
/// the same amount. Each stored row covers one submitted row.
fn check_submission(
    doc: &StoreDocument,
    record: &DisbursementRecord,
    rows: &[RowSubmission],
) -> Result<(), StoreError> {
    let mut unchanged: Vec<(&str, Decimal)> = record
        .rows
        .iter()
        .filter_map(|r| Some((r.gau_id.as_deref()?, r.amount?)))
        .collect();

    let mut total = Decimal::ZERO;
    for r in rows {
        match doc.category(&r.gau_id) {
            None => {
                return Err(StoreError::Validation(format!(
                    "GAU '{}' does not exist",
                    r.gau_id
                )))
            }
            Some(c) if !c.active => {
                let kept = unchanged
                    .iter()
                    .position(|(gau, amount)| *gau == r.gau_id && *amount == r.amount);
                match kept {
                    Some(i) => {
                        unchanged.swap_remove(i);
                    }
                    None => {
                        return Err(StoreError::Validation(format!(
                            "GAU '{}' is inactive and cannot receive allocations",
                            c.title
                        )))
                    }
                }
            }
            Some(_) => {}
        }
        if r.amount.is_sign_negative() {
            return Err(StoreError::Validation(format!(
                "allocation amount for '{}' must not be negative",
                r.gau_id
            )));
        }
        total = total.checked_add(r.amount).unwrap_or(Decimal::MAX);
    }
    let limit = record.amount.abs();
    if total > limit {
        return Err(StoreError::Validation(format!(
            "allocations total {total} exceeds disbursement amount {limit}"
        )));
    }
    Ok(())
}

#[async_trait::async_trait]
impl AllocationStore for JsonFileStore {
    async fn get(&self, disbursement_id: &str) -> Result<DisbursementRecord, StoreError> {
        let doc = self.read_document().await.map_err(server)?;
        let Some(record) = doc.disbursements.iter().find(|d| d.id == disbursement_id) else {
            return Err(StoreError::NotFound {
                disbursement_id: disbursement_id.to_string(),
            });
        };
        let mut out = record.clone();
        out.rows = resolve_rows(&doc, &record.rows);
        debug!(disbursement_id, rows = out.rows.len(), "file store get");
        Ok(out)
    }

    async fn save(&self, disbursement_id: &str, rows: &[RowSubmission]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.read_document().await.map_err(server)?;

        let Some(idx) = doc.disbursements.iter().position(|d| d.id == disbursement_id) else {
            return Err(StoreError::NotFound {
                disbursement_id: disbursement_id.to_string(),
            });
        };
        check_submission(&doc, &doc.disbursements[idx], rows)?;

        let stored: Vec<StoredRow> = rows
            .iter()
            .zip(1u32..)
            .map(|(r, n)| {
                let category = doc.category(&r.gau_id);
                StoredRow {
                    row_id: Some(n),
                    gau_id: Some(r.gau_id.clone()),
                    gau_name: category.map(|c| c.title.clone()),
                    gau_is_active: category.map_or(true, |c| c.active),
                    amount: Some(r.amount),
                }
            })
            .collect();
        doc.disbursements[idx].rows = stored;

        self.write_document(&doc).await.map_err(server)?;
        info!(disbursement_id, rows = rows.len(), "file store save");
        Ok(())
    }
}

#[async_trait::async_trait]
impl CategorySearch for JsonFileStore {
    async fn search(
        &self,
        term: &str,
        excluded_ids: &[String],
    ) -> anyhow::Result<Vec<CategoryResult>> {
        let doc = self.read_document().await?;
        let needle = term.to_lowercase();
        let hits = doc
            .categories
            .iter()
            .filter(|c| c.active && !excluded_ids.contains(&c.id))
            .filter(|c| {
                c.title.to_lowercase().contains(&needle)
                    || c
                        .subtitle
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
            .take(SEARCH_LIMIT)
            .map(|c| CategoryResult {
                id: c.id.clone(),
                title: c.title.clone(),
                subtitle: c.subtitle.clone(),
                icon: None,
            })
            .collect();
        Ok(hits)
    }
}
