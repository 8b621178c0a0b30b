use std::sync::Arc;

use kvdoc::{
    ApplyReport, Document, FixedClock,
    commands::{Keyspace, MemoryHost, Reply},
};

/// A document whose change timestamps come from a controllable clock.
pub fn doc_with_clock() -> (Document, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::default());
    let doc = Document::new().with_clock(clock.clone());
    (doc, clock)
}

/// Apply every change `from` has that `to` lacks, in `from`'s history order.
pub fn sync_into(from: &Document, to: &mut Document) -> ApplyReport {
    let missing: Vec<_> = from
        .all_changes()
        .filter(|change| to.get_change(&change.hash()).is_none())
        .cloned()
        .collect();
    to.apply(missing)
}

/// Bring two replicas to the same state.
pub fn sync_both(a: &mut Document, b: &mut Document) {
    let report = sync_into(a, b);
    assert!(report.is_complete(), "a -> b rejected: {:?}", report.rejected);
    let report = sync_into(b, a);
    assert!(report.is_complete(), "b -> a rejected: {:?}", report.rejected);
}

/// Execute a command that must succeed.
pub fn run(keyspace: &mut Keyspace, host: &mut MemoryHost, argv: &[&str]) -> Reply {
    match keyspace.execute(host, argv) {
        Ok(reply) => reply,
        Err(err) => panic!("{argv:?} failed: {err}"),
    }
}

pub fn bulk(text: &str) -> Reply {
    Reply::Bulk(text.to_string())
}
