//! Module: index::insert
//! Responsibility: appending coordinates to the record log and the optional
//! first-appearance regrouping of that log.
//! Does not own: the sorted projection (rebuilt separately).

use crate::{
    error::InsertError,
    index::{EventIndex, EventSlot, RunOrLumiEntry},
    obs::sink::{self, MetricsEvent},
};
use evindex_primitives::{
    ChainId, EntryKind, EntryNumber, EventNumber, INVALID_EVENT, INVALID_LUMI, INVALID_RUN,
    LumiNumber, RunNumber,
};
use std::collections::HashMap;
use tracing::debug;

impl EventIndex {
    /// Append one logical coordinate.
    ///
    /// - `lumi == 0`: a Run record at `entry`.
    /// - `event == 0`: a LuminosityBlock record at `entry`; closes any open event range.
    /// - otherwise: one event at `entry`, which must directly follow the open
    ///   range of the same (chain, run, lumi), or start a new range.
    ///
    /// A rejected coordinate leaves the index untouched.
    pub fn add_entry(
        &mut self,
        chain: ChainId,
        run: RunNumber,
        lumi: LumiNumber,
        event: EventNumber,
        entry: EntryNumber,
    ) -> Result<(), InsertError> {
        match self.try_add_entry(chain, run, lumi, event, entry) {
            Ok(kind) => {
                sink::record(MetricsEvent::EntryAdded { kind });
                Ok(())
            }
            Err(err) => {
                sink::record(MetricsEvent::InsertRejected);
                Err(err)
            }
        }
    }

    fn try_add_entry(
        &mut self,
        chain: ChainId,
        run: RunNumber,
        lumi: LumiNumber,
        event: EventNumber,
        entry: EntryNumber,
    ) -> Result<EntryKind, InsertError> {
        if run == INVALID_RUN {
            return Err(InsertError::InvalidRun);
        }
        // The largest offset would leave no room for an exclusive range end.
        if !(0..EntryNumber::MAX).contains(&entry) {
            return Err(InsertError::InvalidEntry { entry });
        }
        if lumi == INVALID_LUMI && event != INVALID_EVENT {
            return Err(InsertError::EventWithoutLumi { run });
        }

        let known = self.find_chain(&chain);
        let kind = EntryKind::classify(lumi, event);
        let chain_index = match kind {
            EntryKind::Event => self.push_event(chain, known, run, lumi, event, entry)?,
            EntryKind::Lumi => {
                let chain_index = self.intern_chain(chain, known);
                let open = self
                    .transients
                    .open_range
                    .take()
                    .filter(|&open| self.records[open].accepts_boundary(chain_index, run, lumi));
                match open {
                    Some(open) => self.records[open].set_entry(entry),
                    None => self.records.push(RunOrLumiEntry::lumi_record(
                        chain_index,
                        run,
                        lumi,
                        entry,
                        self.events.len(),
                    )),
                }

                chain_index
            }
            EntryKind::Run | EntryKind::End => {
                let chain_index = self.intern_chain(chain, known);
                self.transients.open_range = None;
                self.records.push(RunOrLumiEntry::run_record(
                    chain_index,
                    run,
                    entry,
                    self.events.len(),
                ));

                chain_index
            }
        };

        self.transients.previous_chain = Some(chain_index);
        self.invalidate();

        Ok(kind)
    }

    fn push_event(
        &mut self,
        chain: ChainId,
        known: Option<usize>,
        run: RunNumber,
        lumi: LumiNumber,
        event: EventNumber,
        entry: EntryNumber,
    ) -> Result<usize, InsertError> {
        let Some(open) = self.transients.open_range else {
            let chain_index = self.intern_chain(chain, known);
            self.transients.open_range = Some(self.records.len());
            self.records.push(RunOrLumiEntry::from_first_event(
                chain_index,
                run,
                lumi,
                entry,
                self.events.len(),
            ));
            self.events.push(EventSlot::new(event, entry));

            return Ok(chain_index);
        };

        let record = &mut self.records[open];
        if record.run() != run || record.lumi() != lumi {
            return Err(InsertError::EventOutsideOpenLumi {
                run,
                lumi,
                open_run: record.run(),
                open_lumi: record.lumi(),
            });
        }
        if known != Some(record.chain_index()) {
            return Err(InsertError::ChainChangedInOpenLumi { run, lumi });
        }
        if entry != record.end_events() {
            return Err(InsertError::NonContiguousEvent {
                expected: record.end_events(),
                found: entry,
            });
        }
        record.extend_events();
        let chain_index = record.chain_index();
        self.events.push(EventSlot::new(event, entry));

        Ok(chain_index)
    }

    // O(1) when the chain repeats, which is the common case.
    fn find_chain(&self, chain: &ChainId) -> Option<usize> {
        self.transients
            .previous_chain
            .filter(|&previous| self.chains.get(previous) == Some(chain))
            .or_else(|| self.chains.position(chain))
    }

    // `known` is the result of `find_chain`, so a miss is already proven new.
    fn intern_chain(&mut self, chain: ChainId, known: Option<usize>) -> usize {
        known.unwrap_or_else(|| self.chains.push_new(chain))
    }

    /// Stable reorder of the record log so that every (chain, run) group is
    /// contiguous and ordered by first appearance. Run records lead their
    /// group, and lumi groups follow in order of first appearance.
    ///
    /// Closes any open event range and marks the sorted projection stale.
    pub fn group_by_first_appearance(&mut self) {
        let mut first_run = HashMap::new();
        let mut first_lumi = HashMap::new();
        for (position, record) in self.records.iter().enumerate() {
            first_run
                .entry((record.chain_index(), record.run()))
                .or_insert(position);
            if !record.is_run() {
                first_lumi.entry(record.key()).or_insert(position);
            }
        }

        let mut order: Vec<usize> = (0..self.records.len()).collect();
        order.sort_by_key(|&position| {
            let record = &self.records[position];
            let run_rank = first_run
                .get(&(record.chain_index(), record.run()))
                .copied()
                .unwrap_or(position);
            let lumi_rank = first_lumi.get(&record.key()).copied().unwrap_or(0);

            (run_rank, !record.is_run(), lumi_rank)
        });

        let moved = order
            .iter()
            .enumerate()
            .filter(|(to, from)| to != *from)
            .count();
        self.records = order.into_iter().map(|from| self.records[from]).collect();
        self.transients.open_range = None;
        self.invalidate();

        debug!(
            records = self.records.len(),
            moved, "regrouped record log by first appearance"
        );
    }
}
