//! Module: cursor
//! Responsibility: the public cursor over either traversal engine.
//! Does not own: transition rules (`cursor::traversal`) or searching (`lookup`).
//! Boundary: a cursor is a `Copy` value borrowing its index; it never mutates it.

mod source;
mod traversal;


pub(crate) use traversal::Position;

use crate::{
    error::IndexError,
    index::{EventIndex, IndexOrder, SortedProjection},
};
use evindex_primitives::{EntryKind, EntryNumber, EventNumber, LumiNumber, RunNumber};
use source::{OriginalOrder, SortedOrder, TraversalSource};
use std::{fmt, ptr};
use traversal::Traversal;

// Backing projection for sorted `End` cursors of an index that has none.
static EMPTY_PROJECTION: SortedProjection = SortedProjection::empty();

///
/// SkippedEvent
///
/// Where an event stepped over by `IndexCursor::skip_event_forward` lives.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SkippedEvent {
    pub chain_index: usize,
    pub run: RunNumber,
    pub lumi: LumiNumber,
    pub event: EventNumber,
    pub entry: EntryNumber,
}

///
/// CursorItem
///
/// Snapshot of one cursor position.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CursorItem {
    pub kind: EntryKind,
    pub chain_index: Option<usize>,
    pub run: RunNumber,
    pub lumi: LumiNumber,
    pub event: EventNumber,
    pub entry: Option<EntryNumber>,
}

impl fmt::Display for CursorItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntryKind::Run => write!(f, "Run({})", self.run),
            EntryKind::Lumi => write!(f, "Lumi({}, {})", self.run, self.lumi),
            EntryKind::Event => write!(f, "Event({}, {}, {})", self.run, self.lumi, self.event),
            EntryKind::End => write!(f, "End"),
        }
    }
}

///
/// Engine
///

#[derive(Clone, Copy, Debug)]
enum Engine<'a> {
    Original(Traversal<OriginalOrder<'a>>),
    Sorted(Traversal<SortedOrder<'a>>),
}

macro_rules! dispatch {
    ($engine:expr, $traversal:ident => $body:expr) => {
        match $engine {
            Engine::Original($traversal) => $body,
            Engine::Sorted($traversal) => $body,
        }
    };
}

///
/// IndexCursor
///
/// Position in one of the two traversal engines of an `EventIndex`.
///

#[derive(Clone, Copy, Debug)]
pub struct IndexCursor<'a> {
    engine: Engine<'a>,
}

impl<'a> IndexCursor<'a> {
    pub(crate) const fn original(index: &'a EventIndex, position: Position) -> Self {
        Self {
            engine: Engine::Original(Traversal::at(OriginalOrder::new(index), position)),
        }
    }

    pub(crate) const fn sorted(
        index: &'a EventIndex,
        projection: &'a SortedProjection,
        position: Position,
    ) -> Self {
        Self {
            engine: Engine::Sorted(Traversal::at(
                SortedOrder::new(index, projection),
                position,
            )),
        }
    }

    fn index(&self) -> &'a EventIndex {
        dispatch!(&self.engine, t => t.source().index())
    }

    fn position(&self) -> Position {
        dispatch!(&self.engine, t => t.position())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn kind(&self) -> EntryKind {
        dispatch!(&self.engine, t => t.kind())
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        self.kind() == EntryKind::End
    }

    #[must_use]
    pub const fn is_sorted(&self) -> bool {
        matches!(self.engine, Engine::Sorted(_))
    }

    /// Chain-table index of the current position; `None` at `End`.
    #[must_use]
    pub fn chain_index(&self) -> Option<usize> {
        dispatch!(&self.engine, t => t.chain_index())
    }

    #[must_use]
    pub fn run(&self) -> RunNumber {
        dispatch!(&self.engine, t => t.run())
    }

    #[must_use]
    pub fn lumi(&self) -> LumiNumber {
        dispatch!(&self.engine, t => t.lumi())
    }

    #[must_use]
    pub fn event(&self) -> EventNumber {
        dispatch!(&self.engine, t => t.event())
    }

    /// Physical offset of the current position, when it has one.
    #[must_use]
    pub fn entry(&self) -> Option<EntryNumber> {
        dispatch!(&self.engine, t => t.entry())
    }

    #[must_use]
    pub fn item(&self) -> CursorItem {
        CursorItem {
            kind: self.kind(),
            chain_index: self.chain_index(),
            run: self.run(),
            lumi: self.lumi(),
            event: self.event(),
            entry: self.entry(),
        }
    }

    /// Iterate from the current position up to, not including, `End`.
    #[must_use]
    pub const fn items(self) -> CursorItems<'a> {
        CursorItems { cursor: self }
    }

    // ------------------------------------------------------------------
    // Movement
    // ------------------------------------------------------------------

    pub fn advance(&mut self) {
        dispatch!(&mut self.engine, t => t.advance());
    }

    pub fn advance_to_next_run(&mut self) {
        dispatch!(&mut self.engine, t => t.advance_to_next_run());
    }

    pub fn advance_to_next_lumi_or_run(&mut self) {
        dispatch!(&mut self.engine, t => t.advance_to_next_lumi_or_run());
    }

    pub fn advance_to_event(&mut self) {
        dispatch!(&mut self.engine, t => t.advance_to_event());
    }

    pub fn advance_to_lumi(&mut self) {
        dispatch!(&mut self.engine, t => t.advance_to_lumi());
    }

    /// Move past the next event, returning it; `None` once no event remains.
    pub fn skip_event_forward(&mut self) -> Option<SkippedEvent> {
        dispatch!(&mut self.engine, t => t.skip_event_forward())
    }
}

impl PartialEq for IndexCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        if !ptr::eq(self.index(), other.index()) {
            return false;
        }

        match (self.position(), other.position()) {
            (Position::End, Position::End) => true,
            (left, right) => self.is_sorted() == other.is_sorted() && left == right,
        }
    }
}

impl Eq for IndexCursor<'_> {}

///
/// CursorItems
///

#[derive(Clone, Copy, Debug)]
pub struct CursorItems<'a> {
    cursor: IndexCursor<'a>,
}

impl Iterator for CursorItems<'_> {
    type Item = CursorItem;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_end() {
            return None;
        }
        let item = self.cursor.item();
        self.cursor.advance();

        Some(item)
    }
}

impl std::iter::FusedIterator for CursorItems<'_> {}

impl EventIndex {
    /// First position of the chosen engine.
    ///
    /// Sorted traversal needs a current projection; see
    /// [`EventIndex::build_sorted_projection`].
    pub fn begin(&self, order: IndexOrder) -> Result<IndexCursor<'_>, IndexError> {
        Ok(match order {
            IndexOrder::Original => IndexCursor {
                engine: Engine::Original(Traversal::begin(OriginalOrder::new(self))),
            },
            IndexOrder::Sorted => IndexCursor {
                engine: Engine::Sorted(Traversal::begin(SortedOrder::new(
                    self,
                    self.projection()?,
                ))),
            },
        })
    }

    /// The terminal position of the chosen engine. Always available.
    #[must_use]
    pub fn end(&self, order: IndexOrder) -> IndexCursor<'_> {
        match order {
            IndexOrder::Original => IndexCursor::original(self, Position::End),
            IndexOrder::Sorted => IndexCursor::sorted(
                self,
                self.sorted_projection().unwrap_or(&EMPTY_PROJECTION),
                Position::End,
            ),
        }
    }
}
