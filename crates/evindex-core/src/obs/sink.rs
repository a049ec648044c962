//! Metrics sink boundary.
//!
//! This module is the only bridge between index logic and the thread-local
//! counter state.

use crate::obs::metrics::{self, IndexCounters, bump};
use evindex_primitives::EntryKind;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// LookupKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LookupKind {
    Run,
    Lumi,
    Event,
    EventAtEntry,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    EntryAdded {
        kind: EntryKind,
    },
    InsertRejected,
    ProjectionBuilt {
        records: u64,
        slots: u64,
    },
    ChainTablesMerged {
        appended: u64,
    },
    Lookup {
        kind: LookupKind,
        lumi_missing: bool,
        hit: bool,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink writing into the thread-local counters.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::EntryAdded { kind } => match kind {
                EntryKind::Run => bump(&mut m.runs_added, 1),
                EntryKind::Lumi => bump(&mut m.lumis_added, 1),
                EntryKind::Event => bump(&mut m.events_added, 1),
                EntryKind::End => {}
            },

            MetricsEvent::InsertRejected => bump(&mut m.inserts_rejected, 1),

            MetricsEvent::ProjectionBuilt { records, slots } => {
                bump(&mut m.projection_builds, 1);
                bump(&mut m.projected_records, records);
                bump(&mut m.projected_slots, slots);
            }

            MetricsEvent::ChainTablesMerged { appended } => {
                bump(&mut m.chain_merges, 1);
                bump(&mut m.chains_appended, appended);
            }

            MetricsEvent::Lookup {
                kind,
                lumi_missing,
                hit,
            } => {
                let lookups = &mut m.lookups;
                match kind {
                    LookupKind::Run => bump(&mut lookups.run, 1),
                    LookupKind::Lumi => bump(&mut lookups.lumi, 1),
                    LookupKind::Event => bump(&mut lookups.event, 1),
                    LookupKind::EventAtEntry => bump(&mut lookups.event_at_entry, 1),
                }
                if lumi_missing {
                    bump(&mut lookups.lumi_missing_scans, 1);
                }
                if hit {
                    bump(&mut lookups.hits, 1);
                } else {
                    bump(&mut lookups.misses, 1);
                }
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current thread's counters.
#[must_use]
pub fn metrics_report() -> IndexCounters {
    metrics::with_state(Clone::clone)
}

/// Reset all counters on the current thread.
pub fn metrics_reset_all() {
    metrics::reset();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
