//! Scenario: a record still holding an allocation to a deactivated GAU.
//!
//! # Invariant under test
//! The read-only legacy row rides along unchanged on every save, so edits to
//! the other rows still go through. New money on the inactive GAU is refused.

use std::sync::Arc;

use gau_alloc::{AllocationSession, SessionError, StoreError};
use gau_store::JsonFileStore;
use gau_testkit::RecordingNotifier;
use rust_decimal_macros::dec;

const DOC: &str = r#"{
  "disbursements": [
    { "id": "d1", "name": "Grant", "amount": "100", "status": "Open",
      "rows": [
        { "rowId": 1, "gauId": "old", "amount": "10" },
        { "rowId": 2, "gauId": "g1", "amount": "20" }
      ] }
  ],
  "categories": [
    { "id": "g1", "title": "General Fund" },
    { "id": "old", "title": "Old", "active": false }
  ]
}"#;

fn store_in(dir: &tempfile::TempDir) -> Arc<JsonFileStore> {
    let path = dir.path().join("store.json");
    std::fs::write(&path, DOC).unwrap();
    Arc::new(JsonFileStore::new(path))
}

#[tokio::test]
async fn editing_another_row_saves_with_legacy_row_kept() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let notes = Arc::new(RecordingNotifier::new());
    let mut session = AllocationSession::new(store.clone(), notes.clone());
    session.load("d1").await.unwrap();

    let ids = session.rows().row_ids();
    assert!(!session.rows().get(ids[0]).unwrap().gau_is_active);

    session.set_amount(ids[1], Some("30")).unwrap();
    session.save().await.unwrap();

    assert!(notes.errors().is_empty(), "{:?}", notes.errors());
    let amounts: Vec<_> = session
        .rows()
        .all()
        .map(|r| (r.gau_id.clone(), r.amount, r.gau_is_active))
        .collect();
    assert_eq!(
        amounts,
        vec![
            (Some("old".to_string()), Some(dec!(10)), false),
            (Some("g1".to_string()), Some(dec!(30)), true),
        ]
    );
    assert_eq!(session.aggregate().remaining_amount, dec!(60));
}

#[tokio::test]
async fn new_row_on_inactive_gau_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let mut session = AllocationSession::new(store.clone(), Arc::new(RecordingNotifier::new()));
    session.load("d1").await.unwrap();

    let row = session.add_row().unwrap();
    session
        .set_category(row, &[gau_alloc::CategorySelection {
            id: Some("old".into()),
            title: "Old".into(),
            icon: "standard:default".into(),
        }])
        .unwrap();
    session.set_amount(row, Some("5")).unwrap();

    let err = session.save().await.unwrap_err();
    assert!(matches!(err, SessionError::Save(StoreError::Validation(_))), "{err:?}");
    assert_eq!(session.rows().len(), 3);
}
