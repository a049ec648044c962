//! Module: cursor::source
//! Responsibility: the two sequences of boundary records a traversal can walk.
//! Does not own: transition rules (see `cursor::traversal`).

use crate::index::{EventIndex, EventSlot, RecordKey, RunOrLumiEntry, SortedProjection};
use std::ops::Range;

///
/// TraversalSource
///
/// Positions are plain indices in `0..len()`. Each position names one
/// boundary record and the event slots it contributes.
///

pub(crate) trait TraversalSource<'a>: Copy {
    fn index(self) -> &'a EventIndex;

    fn len(self) -> usize;

    fn key(self, position: usize) -> RecordKey;

    fn record(self, position: usize) -> &'a RunOrLumiEntry;

    fn events(self, position: usize) -> Range<usize>;

    fn slot(self, slot: usize) -> EventSlot;
}

///
/// OriginalOrder
///
/// The record log exactly as stored, with insertion-order event slots.
///

#[derive(Clone, Copy, Debug)]
pub(crate) struct OriginalOrder<'a> {
    index: &'a EventIndex,
}

impl<'a> OriginalOrder<'a> {
    pub(crate) const fn new(index: &'a EventIndex) -> Self {
        Self { index }
    }
}

impl<'a> TraversalSource<'a> for OriginalOrder<'a> {
    fn index(self) -> &'a EventIndex {
        self.index
    }

    fn len(self) -> usize {
        self.index.records().len()
    }

    fn key(self, position: usize) -> RecordKey {
        self.index.records()[position].key()
    }

    fn record(self, position: usize) -> &'a RunOrLumiEntry {
        &self.index.records()[position]
    }

    fn events(self, position: usize) -> Range<usize> {
        self.index.records()[position].slots()
    }

    fn slot(self, slot: usize) -> EventSlot {
        self.index.event_slots()[slot]
    }
}

///
/// SortedOrder
///
/// The sorted projection, with one event slice per lumi group.
///

#[derive(Clone, Copy, Debug)]
pub(crate) struct SortedOrder<'a> {
    index: &'a EventIndex,
    projection: &'a SortedProjection,
}

impl<'a> SortedOrder<'a> {
    pub(crate) const fn new(index: &'a EventIndex, projection: &'a SortedProjection) -> Self {
        Self { index, projection }
    }
}

impl<'a> TraversalSource<'a> for SortedOrder<'a> {
    fn index(self) -> &'a EventIndex {
        self.index
    }

    fn len(self) -> usize {
        self.projection.len()
    }

    fn key(self, position: usize) -> RecordKey {
        self.projection.entries()[position].key()
    }

    fn record(self, position: usize) -> &'a RunOrLumiEntry {
        &self.index.records()[self.projection.entries()[position].record]
    }

    fn events(self, position: usize) -> Range<usize> {
        self.projection.entries()[position].slots.clone()
    }

    fn slot(self, slot: usize) -> EventSlot {
        self.projection.slots()[slot]
    }
}
