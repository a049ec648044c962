use serde::{Deserialize, Serialize};
use std::cell::RefCell;

///
/// IndexCounters
/// Ephemeral, per-thread counters for index construction and queries.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexCounters {
    // Insertion
    pub runs_added: u64,
    pub lumis_added: u64,
    pub events_added: u64,
    pub inserts_rejected: u64,

    // Derived structures
    pub projection_builds: u64,
    pub projected_records: u64,
    pub projected_slots: u64,

    // Reconciliation
    pub chain_merges: u64,
    pub chains_appended: u64,

    pub lookups: LookupCounters,
}

///
/// LookupCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct LookupCounters {
    pub run: u64,
    pub lumi: u64,
    pub event: u64,
    pub event_at_entry: u64,
    pub lumi_missing_scans: u64,
    pub hits: u64,
    pub misses: u64,
}

thread_local! {
    static COUNTERS: RefCell<IndexCounters> = RefCell::new(IndexCounters::default());
}

/// Borrow counters immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&IndexCounters) -> R) -> R {
    COUNTERS.with(|m| f(&m.borrow()))
}

/// Borrow counters mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut IndexCounters) -> R) -> R {
    COUNTERS.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub(crate) fn reset() {
    with_state_mut(|m| *m = IndexCounters::default());
}

pub(crate) const fn bump(counter: &mut u64, by: u64) {
    *counter = counter.saturating_add(by);
}
