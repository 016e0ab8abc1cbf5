use gau_alloc::{AllocationStore, CategorySearch, DisbursementStatus, RowSubmission, StoreError};
use gau_store::JsonFileStore;
use rust_decimal_macros::dec;

const DOC: &str = r#"{
  "disbursements": [
    { "id": "d1", "name": "Grant", "amount": "1000", "status": "Open",
      "rows": [ { "rowId": 1, "gauId": "g1", "gauName": "stale name", "amount": "600" } ] }
  ],
  "categories": [
    { "id": "g1", "title": "General Fund", "subtitle": "Unrestricted" },
    { "id": "g2", "title": "Library Fund", "subtitle": "Restricted" },
    { "id": "g3", "title": "Legacy", "active": false }
  ]
}"#;

fn store_in(dir: &tempfile::TempDir) -> JsonFileStore {
    let path = dir.path().join("store.json");
    std::fs::write(&path, DOC).unwrap();
    JsonFileStore::new(path)
}

#[tokio::test]
async fn get_resolves_names_from_category_table() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let rec = store.get("d1").await.unwrap();
    assert_eq!(rec.status, DisbursementStatus::Open);
    assert_eq!(rec.amount, dec!(1000));
    assert_eq!(rec.rows[0].gau_name.as_deref(), Some("General Fund"));
}

#[tokio::test]
async fn save_replaces_rows_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store
        .save(
            "d1",
            &[
                RowSubmission { gau_id: "g1".into(), amount: dec!(400) },
                RowSubmission { gau_id: "g2".into(), amount: dec!(300) },
            ],
        )
        .await
        .unwrap();

    let reopened = JsonFileStore::new(store.path().to_path_buf());
    let rec = reopened.get("d1").await.unwrap();
    let got: Vec<_> = rec
        .rows
        .iter()
        .map(|r| (r.row_id, r.gau_id.clone(), r.amount))
        .collect();
    assert_eq!(
        got,
        vec![
            (Some(1), Some("g1".to_string()), Some(dec!(400))),
            (Some(2), Some("g2".to_string()), Some(dec!(300))),
        ]
    );
    assert!(!dir.path().join("store.json.tmp").exists());
}

#[tokio::test]
async fn empty_save_clears_allocations() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store.save("d1", &[]).await.unwrap();
    assert!(store.get("d1").await.unwrap().rows.is_empty());
}

#[tokio::test]
async fn rejected_save_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let err = store
        .save("d1", &[RowSubmission { gau_id: "g3".into(), amount: dec!(1) }])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "{err:?}");

    let err = store
        .save("d1", &[RowSubmission { gau_id: "g1".into(), amount: dec!(1000.01) }])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "{err:?}");

    assert_eq!(store.get("d1").await.unwrap().rows.len(), 1);
}

#[tokio::test]
async fn unknown_disbursement_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    assert_eq!(
        store.get("nope").await.unwrap_err(),
        StoreError::NotFound { disbursement_id: "nope".into() }
    );
}

#[tokio::test]
async fn search_matches_title_or_subtitle_and_skips_excluded_and_inactive() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let hits = store.search("fund", &["g1".to_string()]).await.unwrap();
    assert_eq!(hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), vec!["g2"]);

    let hits = store.search("unrestricted", &[]).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "g1");

    assert!(store.search("legacy", &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_file_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("absent.json"));
    assert!(matches!(store.get("d1").await, Err(StoreError::Server(_))));
}
