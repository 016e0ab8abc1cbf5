//! Scenario: in-flight store calls gate every mutation.
//!
//! # Invariant under test
//! While a load or save is pending, row edits, reloads and saves are
//! rejected with `Busy` and leave state untouched. A completion that arrives
//! when nothing is pending moves the session to `Error` until recovered.

use std::sync::Arc;

use gau_alloc::{
    AllocationSession, DisbursementStatus, SessionError, SessionState, StoreError,
};
use gau_testkit::{record, stored, InMemoryStore, RecordingNotifier};
use rust_decimal_macros::dec;

fn fixture() -> gau_alloc::DisbursementRecord {
    record("d1", dec!(100), DisbursementStatus::Open, vec![stored("g1", dec!(40))])
}

fn session() -> AllocationSession {
    AllocationSession::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
    )
}

#[test]
fn pending_load_rejects_everything() {
    let mut s = session();
    s.begin_load("d1").unwrap();
    let busy = SessionError::Busy { state: SessionState::Loading };

    assert_eq!(s.begin_load("d1").unwrap_err(), busy);
    assert_eq!(s.add_row().unwrap_err(), busy);
    assert_eq!(s.begin_save().unwrap_err(), busy);

    s.finish_load(Ok(fixture())).unwrap();
    assert_eq!(s.state(), SessionState::Ready);
    assert_eq!(s.rows().len(), 1);
}

#[test]
fn pending_save_rejects_edits_and_failure_returns_to_ready() {
    let mut s = session();
    s.begin_load("d1").unwrap();
    s.finish_load(Ok(fixture())).unwrap();
    let id = s.rows().row_ids()[0];

    let payload = s.begin_save().unwrap();
    assert_eq!(payload.len(), 1);
    assert_eq!(s.state(), SessionState::Saving);

    let busy = SessionError::Busy { state: SessionState::Saving };
    assert_eq!(s.set_amount(id, Some("10")).unwrap_err(), busy);
    assert_eq!(s.delete_row(id).unwrap_err(), busy);

    let err = s.finish_save(Err(StoreError::Server("timeout".into()))).unwrap_err();
    assert_eq!(err, SessionError::Save(StoreError::Server("timeout".into())));
    assert_eq!(s.state(), SessionState::Ready);
    assert_eq!(s.rows().get(id).unwrap().amount, Some(dec!(40)));
}

#[test]
fn successful_save_hands_back_id_to_reload() {
    let mut s = session();
    s.begin_load("d1").unwrap();
    s.finish_load(Ok(fixture())).unwrap();

    s.begin_save().unwrap();
    assert_eq!(s.finish_save(Ok(())).unwrap(), "d1");
    assert_eq!(s.state(), SessionState::Loading);
    s.finish_load(Ok(fixture())).unwrap();
    assert_eq!(s.state(), SessionState::Ready);
}

#[test]
fn stray_completion_enters_error_until_recovered() {
    let mut s = session();
    s.begin_load("d1").unwrap();
    s.finish_load(Ok(fixture())).unwrap();
    let id = s.rows().row_ids()[0];

    assert_eq!(
        s.finish_save(Ok(())).unwrap_err(),
        SessionError::UnexpectedCompletion { state: SessionState::Ready }
    );
    assert_eq!(s.state(), SessionState::Error);
    assert_eq!(
        s.set_amount(id, Some("5")).unwrap_err(),
        SessionError::NotReady { state: SessionState::Error }
    );

    s.recover();
    assert_eq!(s.state(), SessionState::Ready);
    s.set_amount(id, Some("5")).unwrap();
    assert_eq!(s.aggregate().remaining_amount, dec!(95));
}
