//! Module: index::sorted
//! Responsibility: deriving the (chain, run, lumi)-sorted projection of the
//! record log and its per-lumi event slices.
//! Boundary: lookups and the sorted traversal engine read this projection;
//! nothing mutates it after the build.

use crate::{
    index::{EventIndex, EventSlot, RecordKey, RunOrLumiEntry},
    obs::sink::{self, MetricsEvent},
};
use evindex_primitives::{INVALID_LUMI, LumiNumber, RunNumber};
use std::ops::Range;
use tracing::debug;

///
/// SortedIndexEntry
///
/// One record of the log, seen through the sorted projection. Every entry
/// of the same lumi group shares the group's `slots` slice.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortedIndexEntry {
    pub chain_index: usize,
    pub run: RunNumber,
    pub lumi: LumiNumber,

    /// Position of the source record in the record log.
    pub record: usize,

    /// Slice of `SortedProjection::slots`, sorted by event number.
    pub slots: Range<usize>,
}

impl SortedIndexEntry {
    pub(crate) const fn key(&self) -> RecordKey {
        (self.chain_index, self.run, self.lumi)
    }

    #[must_use]
    pub const fn is_run(&self) -> bool {
        self.lumi == INVALID_LUMI
    }
}

///
/// SortedProjection
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SortedProjection {
    entries: Vec<SortedIndexEntry>,
    slots: Vec<EventSlot>,
}

impl SortedProjection {
    pub(crate) const fn empty() -> Self {
        Self {
            entries: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Stable-sort `records` by (chain, run, lumi) and gather each lumi
    /// group's events into one slice ordered by event number. Duplicate
    /// event numbers keep their log order.
    #[must_use]
    pub fn build(records: &[RunOrLumiEntry], events: &[EventSlot]) -> Self {
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by_key(|&position| records[position].key());

        let mut entries = Vec::with_capacity(order.len());
        let mut slots = Vec::with_capacity(events.len());

        let mut start = 0;
        while start < order.len() {
            let key = records[order[start]].key();
            let end = start
                + order[start..]
                    .iter()
                    .take_while(|&&position| records[position].key() == key)
                    .count();
            let group = &order[start..end];

            let begin_slot = slots.len();
            if key.2 != INVALID_LUMI {
                for &position in group {
                    let own = events.get(records[position].slots()).unwrap_or_default();
                    slots.extend_from_slice(own);
                }
                slots[begin_slot..].sort_by_key(|slot: &EventSlot| slot.event);
            }
            let slice = begin_slot..slots.len();

            entries.extend(group.iter().map(|&record| SortedIndexEntry {
                chain_index: key.0,
                run: key.1,
                lumi: key.2,
                record,
                slots: slice.clone(),
            }));
            start = end;
        }

        Self { entries, slots }
    }

    #[must_use]
    pub fn entries(&self) -> &[SortedIndexEntry] {
        &self.entries
    }

    #[must_use]
    pub fn slots(&self) -> &[EventSlot] {
        &self.slots
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EventIndex {
    /// Rebuild the sorted projection from the current record log.
    ///
    /// Must run before any lookup or sorted traversal, and again after any
    /// mutation. Rebuilding an unchanged log yields an identical projection.
    pub fn build_sorted_projection(&mut self) {
        if self.transients.config.group_on_build {
            self.group_by_first_appearance();
        }

        let projection = SortedProjection::build(&self.records, &self.events);
        debug!(
            records = projection.len(),
            slots = projection.slots.len(),
            chains = self.chains.len(),
            "built sorted projection"
        );
        sink::record(MetricsEvent::ProjectionBuilt {
            records: projection.len() as u64,
            slots: projection.slots.len() as u64,
        });

        self.transients.sorted = Some(projection);
        if self.transients.config.eager_order_flags {
            let _ = self.all_events_in_entry_order();
        }
    }
}
