//! Module: cursor::traversal
//! Responsibility: the Run → Lumi → Event → End state machine shared by
//! both traversal engines.
//! Does not own: where boundary records come from (see `cursor::source`).

use crate::cursor::{SkippedEvent, source::TraversalSource};
use evindex_primitives::{
    EntryKind, EntryNumber, EventNumber, INVALID_ENTRY, INVALID_EVENT, INVALID_LUMI, INVALID_RUN,
    LumiNumber, RunNumber,
};

///
/// Position
///
/// `lumi` is always the first position of its lumi group; `range` is the
/// position whose event slots are being walked.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Position {
    Run {
        run: usize,
    },
    Lumi {
        lumi: usize,
    },
    Event {
        lumi: usize,
        range: usize,
        slot: usize,
    },
    End,
}

impl Position {
    const fn kind(self) -> EntryKind {
        match self {
            Self::Run { .. } => EntryKind::Run,
            Self::Lumi { .. } => EntryKind::Lumi,
            Self::Event { .. } => EntryKind::Event,
            Self::End => EntryKind::End,
        }
    }

    // Record position the cursor is anchored on.
    const fn anchor(self) -> Option<usize> {
        match self {
            Self::Run { run: position }
            | Self::Lumi { lumi: position }
            | Self::Event { lumi: position, .. } => Some(position),
            Self::End => None,
        }
    }
}

///
/// Traversal
///

#[derive(Clone, Copy, Debug)]
pub(crate) struct Traversal<S> {
    source: S,
    position: Position,
}

impl<'a, S: TraversalSource<'a>> Traversal<S> {
    pub(crate) fn begin(source: S) -> Self {
        let mut traversal = Self::at(source, Position::End);
        traversal.position = traversal.enter(0);

        traversal
    }

    pub(crate) const fn at(source: S, position: Position) -> Self {
        Self { source, position }
    }

    pub(crate) const fn source(&self) -> S {
        self.source
    }

    pub(crate) const fn position(&self) -> Position {
        self.position
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub(crate) const fn kind(&self) -> EntryKind {
        self.position.kind()
    }

    pub(crate) fn chain_index(&self) -> Option<usize> {
        self.position
            .anchor()
            .map(|position| self.source.key(position).0)
    }

    pub(crate) fn run(&self) -> RunNumber {
        self.position
            .anchor()
            .map_or(INVALID_RUN, |position| self.source.key(position).1)
    }

    pub(crate) fn lumi(&self) -> LumiNumber {
        match self.position {
            Position::Lumi { lumi } | Position::Event { lumi, .. } => self.source.key(lumi).2,
            Position::Run { .. } | Position::End => INVALID_LUMI,
        }
    }

    pub(crate) fn event(&self) -> EventNumber {
        match self.position {
            Position::Event { slot, .. } => self.source.slot(slot).event,
            _ => INVALID_EVENT,
        }
    }

    /// Physical offset of the current run record, lumi record, or event.
    /// A lumi group known only through its events has none.
    pub(crate) fn entry(&self) -> Option<EntryNumber> {
        let entry = match self.position {
            Position::Run { run } => self.source.record(run).entry(),
            Position::Lumi { lumi } => (lumi..self.lumi_end(lumi))
                .map(|position| self.source.record(position).entry())
                .find(|&entry| entry != INVALID_ENTRY)
                .unwrap_or(INVALID_ENTRY),
            Position::Event { slot, .. } => self.source.slot(slot).entry,
            Position::End => INVALID_ENTRY,
        };

        (entry != INVALID_ENTRY).then_some(entry)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    pub(crate) fn advance(&mut self) {
        self.position = self.next_position();
    }

    pub(crate) fn advance_to_next_run(&mut self) {
        self.position = match self.position.anchor() {
            Some(position) => self.enter(self.run_end(position)),
            None => Position::End,
        };
    }

    /// Skip the remainder of the current lumi without visiting its events.
    pub(crate) fn advance_to_next_lumi_or_run(&mut self) {
        self.position = match self.position {
            Position::Run { .. } => self.next_position(),
            Position::Lumi { lumi } | Position::Event { lumi, .. } => {
                self.enter(self.lumi_end(lumi))
            }
            Position::End => Position::End,
        };
    }

    pub(crate) fn advance_to_event(&mut self) {
        while !matches!(self.position, Position::Event { .. } | Position::End) {
            self.advance();
        }
    }

    pub(crate) fn advance_to_lumi(&mut self) {
        while !matches!(self.position, Position::Lumi { .. } | Position::End) {
            self.advance();
        }
    }

    /// Step past exactly one event, reporting where it lived.
    pub(crate) fn skip_event_forward(&mut self) -> Option<SkippedEvent> {
        self.advance_to_event();
        let Position::Event { slot, .. } = self.position else {
            return None;
        };

        let event = self.source.slot(slot);
        let skipped = SkippedEvent {
            chain_index: self.chain_index().unwrap_or_default(),
            run: self.run(),
            lumi: self.lumi(),
            event: event.event,
            entry: event.entry,
        };
        self.advance();

        Some(skipped)
    }

    fn next_position(&self) -> Position {
        match self.position {
            Position::End => Position::End,

            // Duplicate run boundaries collapse into the first one.
            Position::Run { run } => {
                let mut position = run + 1;
                while position < self.source.len()
                    && self.is_run_record(position)
                    && self.same_run(run, position)
                {
                    position += 1;
                }

                self.enter(position)
            }

            Position::Lumi { lumi } => self
                .first_event(lumi)
                .unwrap_or_else(|| self.enter(self.lumi_end(lumi))),

            Position::Event { lumi, range, slot } => {
                if slot + 1 < self.source.events(range).end {
                    Position::Event {
                        lumi,
                        range,
                        slot: slot + 1,
                    }
                } else {
                    self.next_range(lumi, range)
                        .unwrap_or_else(|| self.enter(self.lumi_end(lumi)))
                }
            }
        }
    }

    // Land on whatever boundary record sits at `position`.
    fn enter(&self, position: usize) -> Position {
        if position >= self.source.len() {
            Position::End
        } else if self.is_run_record(position) {
            Position::Run { run: position }
        } else {
            Position::Lumi { lumi: position }
        }
    }

    fn first_event(&self, lumi: usize) -> Option<Position> {
        (lumi..self.lumi_end(lumi)).find_map(|range| {
            let events = self.source.events(range);
            (!events.is_empty()).then_some(Position::Event {
                lumi,
                range,
                slot: events.start,
            })
        })
    }

    // Another, distinct event range of the same lumi group. Sorted groups
    // share one slice, so this only ever fires in original order.
    fn next_range(&self, lumi: usize, range: usize) -> Option<Position> {
        let current = self.source.events(range);
        (range + 1..self.lumi_end(lumi)).find_map(|next| {
            let events = self.source.events(next);
            (!events.is_empty() && events != current).then_some(Position::Event {
                lumi,
                range: next,
                slot: events.start,
            })
        })
    }

    fn is_run_record(&self, position: usize) -> bool {
        self.source.key(position).2 == INVALID_LUMI
    }

    fn same_run(&self, a: usize, b: usize) -> bool {
        let (chain_a, run_a, _) = self.source.key(a);
        let (chain_b, run_b, _) = self.source.key(b);

        chain_a == chain_b && run_a == run_b
    }

    fn same_lumi(&self, a: usize, b: usize) -> bool {
        self.source.key(a) == self.source.key(b)
    }

    fn lumi_end(&self, lumi: usize) -> usize {
        self.group_end(lumi, Self::same_lumi)
    }

    fn run_end(&self, position: usize) -> usize {
        self.group_end(position, Self::same_run)
    }

    fn group_end(&self, start: usize, same: fn(&Self, usize, usize) -> bool) -> usize {
        let mut end = start + 1;
        while end < self.source.len() && same(self, start, end) {
            end += 1;
        }

        end
    }
}
