use kvdoc::{Change, ChangeHash, Document};

use crate::helpers::{sync_both, sync_into};

#[test]
fn change_from_one_replica_applies_on_another() {
    let mut one = Document::new();
    let change = one.put_text("a.t", "x").unwrap();

    let mut two = Document::new();
    let bytes = change.bytes().to_vec();
    assert!(two.apply_change(Change::from_bytes(bytes).unwrap()).unwrap());
    assert_eq!(two.get_text("a.t").unwrap().as_deref(), Some("x"));
    assert_eq!(two.num_changes(), 1);
}

#[test]
fn applying_twice_is_a_no_op() {
    let mut one = Document::new();
    let change = one.put_int("n", 1).unwrap();

    let mut two = Document::new();
    let report = two.apply([change.clone(), change.clone()]);
    assert_eq!(report.applied, vec![change.hash()]);
    assert_eq!(report.duplicates, 1);
    assert!(report.is_complete());
    assert!(!two.apply_change(change).unwrap());
    assert_eq!(two.num_changes(), 1);
}

#[test]
fn missing_dependency_is_rejected_without_damage() {
    let mut one = Document::new();
    let first = one.put_int("n", 1).unwrap();
    let second = one.put_int("n", 2).unwrap();

    let mut two = Document::new();
    two.put_text("mine", "kept").unwrap();
    let err = two.apply_change(second.clone()).unwrap_err();
    assert!(err.is_missing_dependency());
    assert_eq!(two.num_changes(), 1);
    assert_eq!(two.get_int("n").unwrap(), None);

    // The same batch succeeds once the dependency comes first.
    let report = two.apply([first, second]);
    assert!(report.is_complete());
    assert_eq!(two.get_int("n").unwrap(), Some(2));
}

#[test]
fn batch_keeps_good_records_when_one_is_bad() {
    let mut one = Document::new();
    let first = one.put_int("a", 1).unwrap();
    let second = one.put_int("b", 2).unwrap();
    let mut other = Document::new();
    let unrelated = other.put_int("c", 3).unwrap();

    let mut two = Document::new();
    let report = two.apply_encoded([
        second.bytes().to_vec(),
        b"garbage".to_vec(),
        first.bytes().to_vec(),
        unrelated.bytes().to_vec(),
    ]);
    assert_eq!(report.applied, vec![first.hash(), unrelated.hash()]);
    assert_eq!(
        report.rejected.iter().map(|(index, _)| *index).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert!(report.rejected[0].1.is_missing_dependency());
    assert_eq!(two.get_int("a").unwrap(), Some(1));
    assert_eq!(two.get_int("b").unwrap(), None);
    assert_eq!(two.get_int("c").unwrap(), Some(3));
}

#[test]
fn changes_since_returns_only_unseen() {
    let mut doc = Document::new();
    let first = doc.put_int("a", 1).unwrap();
    let second = doc.put_int("b", 2).unwrap();
    let third = doc.put_int("c", 3).unwrap();

    let all: Vec<ChangeHash> = doc.changes(&[]).unwrap().iter().map(|c| c.hash()).collect();
    assert_eq!(all, vec![first.hash(), second.hash(), third.hash()]);

    let since: Vec<ChangeHash> = doc
        .changes(&[first.hash()])
        .unwrap()
        .iter()
        .map(|c| c.hash())
        .collect();
    assert_eq!(since, vec![second.hash(), third.hash()]);
    assert!(doc.changes(&[third.hash()]).unwrap().is_empty());

    let unknown = ChangeHash::from_bytes([7; 32]);
    assert!(doc.changes(&[unknown]).unwrap_err().is_not_found());
}

#[test]
fn incremental_sync_with_heads() {
    let mut a = Document::new();
    a.put_text("title", "draft").unwrap();
    let mut b = Document::new();
    sync_both(&mut a, &mut b);

    let seen = b.heads();
    a.put_text("title", "final").unwrap();
    a.put_int("rev", 2).unwrap();

    let fresh: Vec<Change> = a.changes(&seen).unwrap().into_iter().cloned().collect();
    assert_eq!(fresh.len(), 2);
    assert!(b.apply(fresh).is_complete());
    assert_eq!(b.get_text("title").unwrap().as_deref(), Some("final"));
    assert_eq!(b.heads(), a.heads());
}

#[test]
fn concurrent_counter_increments_sum() {
    let mut a = Document::new();
    a.put_counter("hits", 10).unwrap();
    let mut b = Document::new();
    let mut c = Document::new();
    sync_both(&mut a, &mut b);
    sync_both(&mut a, &mut c);

    a.inc_counter("hits", 5).unwrap();
    b.inc_counter("hits", -3).unwrap();
    c.inc_counter("hits", 7).unwrap();
    c.inc_counter("hits", 1).unwrap();

    sync_both(&mut a, &mut b);
    sync_both(&mut b, &mut c);
    sync_both(&mut a, &mut c);

    for doc in [&a, &b, &c] {
        assert_eq!(doc.get_counter("hits").unwrap(), Some(20));
    }
}

#[test]
fn concurrent_writes_to_one_key_converge() {
    let mut a = Document::new();
    let mut b = Document::new();
    a.put_int("x", 1).unwrap();
    b.put_int("x", 2).unwrap();
    sync_both(&mut a, &mut b);

    let winner = a.get_int("x").unwrap();
    assert!(winner == Some(1) || winner == Some(2));
    assert_eq!(b.get_int("x").unwrap(), winner);
    assert_eq!(a.heads(), b.heads());
    assert_eq!(a.heads().len(), 2);
}

#[test]
fn concurrent_edits_to_different_keys_merge() {
    let mut a = Document::new();
    a.put_text("user.name", "Lin").unwrap();
    let mut b = Document::new();
    sync_both(&mut a, &mut b);

    a.put_int("user.age", 30).unwrap();
    b.put_text("user.city", "Oslo").unwrap();
    sync_both(&mut a, &mut b);

    for doc in [&a, &b] {
        assert_eq!(doc.map_len("user").unwrap(), Some(3));
        assert_eq!(doc.get_int("user.age").unwrap(), Some(30));
        assert_eq!(doc.get_text("user.city").unwrap().as_deref(), Some("Oslo"));
    }
}

#[test]
fn concurrent_list_appends_keep_both() {
    let mut a = Document::new();
    a.create_list("items").unwrap();
    let mut b = Document::new();
    sync_both(&mut a, &mut b);

    a.append_text("items", "from a").unwrap();
    b.append_text("items", "from b").unwrap();
    sync_both(&mut a, &mut b);

    assert_eq!(a.list_len("items").unwrap(), Some(2));
    assert_eq!(a.get_text("items[0]").unwrap(), b.get_text("items[0]").unwrap());
    assert_eq!(a.get_text("items[1]").unwrap(), b.get_text("items[1]").unwrap());
}

#[test]
fn sync_into_reports_nothing_when_up_to_date() {
    let mut a = Document::new();
    a.put_int("n", 1).unwrap();
    let mut b = Document::new();
    sync_both(&mut a, &mut b);
    let report = sync_into(&a, &mut b);
    assert!(report.applied.is_empty());
    assert!(report.is_complete());
}
