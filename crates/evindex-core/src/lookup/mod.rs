//! Module: lookup
//! Responsibility: locating runs, lumis, and events in the sorted projection.
//! Does not own: building the projection or walking past the located position.
//! Boundary: every lookup needs a current projection; absence is an `End` cursor.


use crate::{
    cursor::{IndexCursor, Position},
    error::IndexError,
    index::{EventIndex, IndexOrder, SortedIndexEntry, SortedProjection},
    obs::sink::{self, LookupKind, MetricsEvent},
};
use evindex_primitives::{
    EntryNumber, EventNumber, INVALID_EVENT, INVALID_LUMI, INVALID_RUN, LumiNumber, RunNumber,
};
use std::ops::Range;

///
/// Search
///
/// One borrowed view of the projection, scoped to a single lookup.
///

struct Search<'a> {
    entries: &'a [SortedIndexEntry],
    projection: &'a SortedProjection,
}

impl<'a> Search<'a> {
    fn new(projection: &'a SortedProjection) -> Self {
        Self {
            entries: projection.entries(),
            projection,
        }
    }

    // Each chain's contiguous block, in chain-table order.
    fn chain_groups(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        let mut start = 0;
        std::iter::from_fn(move || {
            let chain = self.entries.get(start)?.chain_index;
            let end = start
                + self.entries[start..].partition_point(|entry| entry.chain_index == chain);
            let group = start..end;
            start = end;

            Some(group)
        })
    }

    fn lower_bound(&self, group: &Range<usize>, run: RunNumber, lumi: LumiNumber) -> usize {
        group.start
            + self.entries[group.clone()].partition_point(|entry| (entry.run, entry.lumi) < (run, lumi))
    }

    fn run_start(&self, group: &Range<usize>, run: RunNumber) -> Option<usize> {
        let position = self.lower_bound(group, run, INVALID_LUMI);
        (position < group.end && self.entries[position].run == run).then_some(position)
    }

    fn lumi_start(&self, group: &Range<usize>, run: RunNumber, lumi: LumiNumber) -> Option<usize> {
        let position = self.lower_bound(group, run, lumi);
        (position < group.end
            && self.entries[position].run == run
            && self.entries[position].lumi == lumi)
            .then_some(position)
    }

    // First position of every lumi group of `run`.
    fn lumi_starts(&self, group: &Range<usize>, run: RunNumber) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut position = self.lower_bound(group, run, INVALID_LUMI + 1);
        while position < group.end && self.entries[position].run == run {
            starts.push(position);
            let key = self.entries[position].key();
            while position < group.end && self.entries[position].key() == key {
                position += 1;
            }
        }

        starts
    }

    // Slot holding `event` in the lumi group at `lumi`, optionally pinned to
    // an exact physical offset among duplicates.
    fn event_slot(&self, lumi: usize, event: EventNumber, entry: Option<EntryNumber>) -> Option<usize> {
        let slice = self.entries[lumi].slots.clone();
        let slots = &self.projection.slots()[slice.clone()];
        let first = slots.partition_point(|slot| slot.event < event);

        slots[first..]
            .iter()
            .take_while(|slot| slot.event == event)
            .position(|slot| entry.is_none_or(|entry| slot.entry == entry))
            .map(|offset| slice.start + first + offset)
    }

    fn find_event(
        &self,
        run: RunNumber,
        lumi: LumiNumber,
        event: EventNumber,
        entry: Option<EntryNumber>,
    ) -> Option<Position> {
        self.chain_groups().find_map(|group| {
            let lumis = if lumi == INVALID_LUMI {
                self.lumi_starts(&group, run)
            } else {
                self.lumi_start(&group, run, lumi).into_iter().collect()
            };

            lumis.into_iter().find_map(|start| {
                self.event_slot(start, event, entry)
                    .map(|slot| Position::Event {
                        lumi: start,
                        range: start,
                        slot,
                    })
            })
        })
    }
}

impl EventIndex {
    /// First record of `run`: its run record, or its first lumi when the
    /// run has no record of its own.
    pub fn find_run(&self, run: RunNumber) -> Result<IndexCursor<'_>, IndexError> {
        let projection = self.projection()?;
        let search = Search::new(projection);

        let found = if run == INVALID_RUN {
            None
        } else {
            search
                .chain_groups()
                .find_map(|group| search.run_start(&group, run))
        };
        let position = match found {
            Some(position) if search.entries[position].is_run() => Position::Run { run: position },
            Some(position) => Position::Lumi { lumi: position },
            None => Position::End,
        };

        Ok(self.located(projection, position, LookupKind::Run, false))
    }

    pub fn find_lumi(
        &self,
        run: RunNumber,
        lumi: LumiNumber,
    ) -> Result<IndexCursor<'_>, IndexError> {
        let projection = self.projection()?;
        let search = Search::new(projection);

        let found = if run == INVALID_RUN || lumi == INVALID_LUMI {
            None
        } else {
            search
                .chain_groups()
                .find_map(|group| search.lumi_start(&group, run, lumi))
        };
        let position = found.map_or(Position::End, |start| Position::Lumi { lumi: start });

        Ok(self.located(projection, position, LookupKind::Lumi, false))
    }

    /// Locate `event`. With `lumi == 0` every lumi of `run` is searched in
    /// sorted order and the first match wins.
    pub fn find_event(
        &self,
        run: RunNumber,
        lumi: LumiNumber,
        event: EventNumber,
    ) -> Result<IndexCursor<'_>, IndexError> {
        self.find_event_with(run, lumi, event, None, LookupKind::Event)
    }

    /// As [`EventIndex::find_event`], but among duplicate event numbers only
    /// the one stored at `entry` matches.
    pub fn find_event_at_entry(
        &self,
        run: RunNumber,
        lumi: LumiNumber,
        event: EventNumber,
        entry: EntryNumber,
    ) -> Result<IndexCursor<'_>, IndexError> {
        self.find_event_with(run, lumi, event, Some(entry), LookupKind::EventAtEntry)
    }

    fn find_event_with(
        &self,
        run: RunNumber,
        lumi: LumiNumber,
        event: EventNumber,
        entry: Option<EntryNumber>,
        kind: LookupKind,
    ) -> Result<IndexCursor<'_>, IndexError> {
        let projection = self.projection()?;

        let found = if run == INVALID_RUN || event == INVALID_EVENT {
            None
        } else {
            Search::new(projection).find_event(run, lumi, event, entry)
        };
        let position = found.unwrap_or(Position::End);

        Ok(self.located(projection, position, kind, lumi == INVALID_LUMI))
    }

    /// Dispatch on which levels are present: run only, run and lumi, or an
    /// event with or without its lumi.
    pub fn find_position(
        &self,
        run: RunNumber,
        lumi: LumiNumber,
        event: EventNumber,
    ) -> Result<IndexCursor<'_>, IndexError> {
        match (lumi, event) {
            (INVALID_LUMI, INVALID_EVENT) => self.find_run(run),
            (_, INVALID_EVENT) => self.find_lumi(run, lumi),
            _ => self.find_event(run, lumi, event),
        }
    }

    pub fn contains_run(&self, run: RunNumber) -> Result<bool, IndexError> {
        Ok(!self.find_run(run)?.is_end())
    }

    pub fn contains_lumi(&self, run: RunNumber, lumi: LumiNumber) -> Result<bool, IndexError> {
        Ok(!self.find_lumi(run, lumi)?.is_end())
    }

    pub fn contains_event(
        &self,
        run: RunNumber,
        lumi: LumiNumber,
        event: EventNumber,
    ) -> Result<bool, IndexError> {
        Ok(!self.find_event(run, lumi, event)?.is_end())
    }

    pub fn contains_item(
        &self,
        run: RunNumber,
        lumi: LumiNumber,
        event: EventNumber,
    ) -> Result<bool, IndexError> {
        Ok(!self.find_position(run, lumi, event)?.is_end())
    }

    fn located<'a>(
        &'a self,
        projection: &'a SortedProjection,
        position: Position,
        kind: LookupKind,
        lumi_missing: bool,
    ) -> IndexCursor<'a> {
        sink::record(MetricsEvent::Lookup {
            kind,
            lumi_missing,
            hit: position != Position::End,
        });

        if position == Position::End {
            self.end(IndexOrder::Sorted)
        } else {
            IndexCursor::sorted(self, projection, position)
        }
    }
}
