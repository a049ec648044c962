//! Module: index::record
//! Responsibility: the record-log entry and event-slot value types.
//! Does not own: insertion ordering rules (see `index::insert`).

use crate::error::LoadError;
use evindex_primitives::{
    EntryKind, EntryNumber, EventNumber, INVALID_ENTRY, INVALID_LUMI, LumiNumber, RunNumber,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Grouping key shared by the record log and the sorted projection.
pub(crate) type RecordKey = (usize, RunNumber, LumiNumber);

///
/// RunOrLumiEntry
///
/// One Run boundary (`lumi == 0`) or one LuminosityBlock boundary. A lumi
/// record may carry a contiguous physical span of events, mirrored by the
/// same number of insertion-order event slots starting at `first_slot`.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RunOrLumiEntry {
    chain_index: usize,
    run: RunNumber,
    lumi: LumiNumber,
    entry: EntryNumber,
    begin_events: EntryNumber,
    end_events: EntryNumber,
    first_slot: usize,
}

impl RunOrLumiEntry {
    pub(crate) const fn run_record(
        chain_index: usize,
        run: RunNumber,
        entry: EntryNumber,
        first_slot: usize,
    ) -> Self {
        Self {
            chain_index,
            run,
            lumi: INVALID_LUMI,
            entry,
            begin_events: INVALID_ENTRY,
            end_events: INVALID_ENTRY,
            first_slot,
        }
    }

    pub(crate) const fn lumi_record(
        chain_index: usize,
        run: RunNumber,
        lumi: LumiNumber,
        entry: EntryNumber,
        first_slot: usize,
    ) -> Self {
        Self {
            chain_index,
            run,
            lumi,
            entry,
            begin_events: INVALID_ENTRY,
            end_events: INVALID_ENTRY,
            first_slot,
        }
    }

    /// Lumi record opened implicitly by its first event; its own offset
    /// arrives later, if at all.
    pub(crate) const fn from_first_event(
        chain_index: usize,
        run: RunNumber,
        lumi: LumiNumber,
        event_entry: EntryNumber,
        first_slot: usize,
    ) -> Self {
        Self {
            chain_index,
            run,
            lumi,
            entry: INVALID_ENTRY,
            begin_events: event_entry,
            end_events: event_entry + 1,
            first_slot,
        }
    }

    #[must_use]
    pub const fn chain_index(&self) -> usize {
        self.chain_index
    }

    #[must_use]
    pub const fn run(&self) -> RunNumber {
        self.run
    }

    #[must_use]
    pub const fn lumi(&self) -> LumiNumber {
        self.lumi
    }

    /// Physical offset of the boundary record itself.
    #[must_use]
    pub const fn entry(&self) -> EntryNumber {
        self.entry
    }

    #[must_use]
    pub const fn begin_events(&self) -> EntryNumber {
        self.begin_events
    }

    #[must_use]
    pub const fn end_events(&self) -> EntryNumber {
        self.end_events
    }

    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        if self.is_run() {
            EntryKind::Run
        } else {
            EntryKind::Lumi
        }
    }

    #[must_use]
    pub const fn is_run(&self) -> bool {
        self.lumi == INVALID_LUMI
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        if self.begin_events == INVALID_ENTRY {
            return 0;
        }

        usize::try_from(self.end_events - self.begin_events).unwrap_or(0)
    }

    /// Physical event span, if any.
    #[must_use]
    pub fn event_range(&self) -> Option<Range<EntryNumber>> {
        (self.event_count() > 0).then_some(self.begin_events..self.end_events)
    }

    /// Indices of this record's events in the insertion-order slot array.
    #[must_use]
    pub fn slots(&self) -> Range<usize> {
        self.first_slot..self.first_slot + self.event_count()
    }

    /// Reject a loaded record that does not fit the surrounding tables.
    pub(crate) fn check(&self, record: usize, chains: usize, slots: usize) -> Result<(), LoadError> {
        if self.chain_index >= chains {
            return Err(LoadError::UnknownChain {
                record,
                chain_index: self.chain_index,
                chains,
            });
        }

        let (begin, end) = (self.begin_events, self.end_events);
        let empty = begin == INVALID_ENTRY && end == INVALID_ENTRY;
        if !empty && !(0 <= begin && begin <= end) {
            return Err(LoadError::InvalidEventRange { record, begin, end });
        }
        if self.is_run() && self.event_count() > 0 {
            return Err(LoadError::RunWithEvents { record });
        }

        match self.first_slot.checked_add(self.event_count()) {
            Some(last) if last <= slots => Ok(()),
            _ => Err(LoadError::SlotsOutOfBounds {
                record,
                slots: self.first_slot..self.first_slot.saturating_add(self.event_count()),
                available: slots,
            }),
        }
    }

    pub(crate) const fn key(&self) -> RecordKey {
        (self.chain_index, self.run, self.lumi)
    }

    // A lumi boundary arriving right after its own events attaches to them.
    pub(crate) const fn accepts_boundary(
        &self,
        chain_index: usize,
        run: RunNumber,
        lumi: LumiNumber,
    ) -> bool {
        self.chain_index == chain_index
            && self.run == run
            && self.lumi == lumi
            && self.entry == INVALID_ENTRY
    }

    pub(crate) const fn set_entry(&mut self, entry: EntryNumber) {
        self.entry = entry;
    }

    pub(crate) const fn extend_events(&mut self) {
        self.end_events += 1;
    }

    pub(crate) const fn set_chain_index(&mut self, chain_index: usize) {
        self.chain_index = chain_index;
    }
}

///
/// EventSlot
///
/// One event's number and physical offset.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct EventSlot {
    pub event: EventNumber,
    pub entry: EntryNumber,
}

impl EventSlot {
    #[must_use]
    pub const fn new(event: EventNumber, entry: EntryNumber) -> Self {
        Self { event, entry }
    }
}
