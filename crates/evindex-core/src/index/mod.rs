//! Module: index
//! Responsibility: the owned index state (chain table, record log,
//! insertion-order event slots) and its derived transients.
//! Does not own: traversal (see `cursor`) or searching (see `lookup`).

mod chain;
mod display;
mod insert;
mod persist;
mod record;
mod sorted;

#[cfg(test)]
mod tests;

pub use chain::{ChainRemap, ChainTable};
pub(crate) use record::RecordKey;
pub use record::{EventSlot, RunOrLumiEntry};
pub use sorted::{SortedIndexEntry, SortedProjection};

use crate::{config::IndexConfig, error::IndexError};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

///
/// IndexOrder
///
/// Which traversal engine a cursor walks.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IndexOrder {
    /// The record log as stored.
    #[default]
    Original,

    /// The sorted projection: (chain index, run, lumi, event).
    Sorted,
}

///
/// EventIndex
///
/// Logical (chain, run, lumi, event) index over a physical event store.
/// Only the chain table, record log, and event slots are persistent; the
/// sorted projection and memoized flags are rebuilt on demand. Loading
/// rejects a log that does not fit its chain table or event slots.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(try_from = "persist::PersistedIndex")]
pub struct EventIndex {
    chains: ChainTable,
    records: Vec<RunOrLumiEntry>,
    events: Vec<EventSlot>,

    #[serde(skip)]
    transients: Transients,
}

///
/// Transients
///

#[derive(Clone, Debug, Default)]
struct Transients {
    config: IndexConfig,

    // Chain index used by the previous insertion.
    previous_chain: Option<usize>,

    // Record whose event range may still be extended.
    open_range: Option<usize>,

    sorted: Option<SortedProjection>,
    entry_order: OnceLock<bool>,
}

impl EventIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: &IndexConfig) -> Self {
        Self {
            chains: ChainTable::new(),
            records: Vec::with_capacity(config.record_capacity),
            events: Vec::with_capacity(config.event_capacity),
            transients: Transients {
                config: config.clone(),
                ..Transients::default()
            },
        }
    }

    #[must_use]
    pub const fn config(&self) -> &IndexConfig {
        &self.transients.config
    }

    #[must_use]
    pub const fn chain_table(&self) -> &ChainTable {
        &self.chains
    }

    #[must_use]
    pub fn records(&self) -> &[RunOrLumiEntry] {
        &self.records
    }

    /// Insertion-order event slots backing the record log.
    #[must_use]
    pub fn event_slots(&self) -> &[EventSlot] {
        &self.events
    }

    /// Number of records in the log.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub const fn event_count(&self) -> usize {
        self.events.len()
    }

    /// The current sorted projection, or `None` when it is stale.
    #[must_use]
    pub const fn sorted_projection(&self) -> Option<&SortedProjection> {
        self.transients.sorted.as_ref()
    }

    pub(crate) fn projection(&self) -> Result<&SortedProjection, IndexError> {
        self.sorted_projection().ok_or(IndexError::ProjectionStale)
    }

    /// Whether event offsets never decrease when walking the record log in
    /// order. Computed once per index state behind a write-once barrier.
    #[must_use]
    pub fn all_events_in_entry_order(&self) -> bool {
        *self.transients.entry_order.get_or_init(|| {
            let mut max_entry = None;
            for record in &self.records {
                for slot in self.events.get(record.slots()).unwrap_or_default() {
                    if max_entry.is_some_and(|max| slot.entry < max) {
                        return false;
                    }
                    max_entry = Some(slot.entry);
                }
            }

            true
        })
    }

    // Every mutation of the log goes through here.
    fn invalidate(&mut self) {
        self.transients.sorted = None;
        self.transients.entry_order = OnceLock::new();
    }
}
