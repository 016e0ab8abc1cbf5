//! Any sequence of deletes leaves at least one row behind.

use gau_alloc::*;

#[test]
fn scenario_delete_sequences_never_empty_the_collection() {
    let mut c = RowCollection::placeholder();
    for _ in 0..4 {
        c.add_row().unwrap();
    }

    // Delete front-to-back, then keep deleting whatever is left.
    for _ in 0..12 {
        let first = c.row_ids()[0];
        c.apply_delete(first).unwrap();
        assert!(c.len() >= 1);
    }
    assert_eq!(c.len(), 1);
    assert!(c.is_placeholder_only());
}

#[test]
fn scenario_pad_rows_never_reuse_ids() {
    let mut c = RowCollection::placeholder();
    for _ in 0..3 {
        c.add_row().unwrap();
    }
    let mut seen: Vec<RowId> = c.row_ids();

    for _ in 0..6 {
        let last = *c.row_ids().last().unwrap();
        c.apply_delete(last).unwrap();
        assert!(!c.is_empty());
        for id in c.row_ids() {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
    }

    // Four initial ids, then a fresh pad id for each of the last three
    // deletes.
    assert_eq!(seen.len(), 7, "ids seen: {seen:?}");
    assert_eq!(c.row_ids(), vec![RowId::new(7)]);
}

#[test]
fn scenario_delete_unknown_row_leaves_collection_intact() {
    let mut c = RowCollection::placeholder();
    assert_eq!(
        c.apply_delete(RowId::new(42)),
        Err(CollectionError::UnknownRow(RowId::new(42)))
    );
    assert_eq!(c.len(), 1);
}
