use evindex_primitives::{EntryNumber, LumiNumber, RunNumber};
use std::ops::Range;
use thiserror::Error as ThisError;

///
/// InsertError
///
/// Insertion precondition failures. Each one is a caller bug: the coordinate
/// is rejected, the index is left as it was, and construction should stop.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum InsertError {
    #[error("run number 0 is reserved for 'no run'")]
    InvalidRun,

    #[error("physical entry {entry} is outside 0..{}", EntryNumber::MAX)]
    InvalidEntry { entry: EntryNumber },

    #[error("run record {run} carries an event number")]
    EventWithoutLumi { run: RunNumber },

    #[error(
        "event for ({run}, {lumi}) arrived while the event range of ({open_run}, {open_lumi}) is open"
    )]
    EventOutsideOpenLumi {
        run: RunNumber,
        lumi: LumiNumber,
        open_run: RunNumber,
        open_lumi: LumiNumber,
    },

    #[error("event for ({run}, {lumi}) comes from another chain than the open event range")]
    ChainChangedInOpenLumi { run: RunNumber, lumi: LumiNumber },

    #[error("event entry {found} is not contiguous with the open range (expected {expected})")]
    NonContiguousEvent {
        expected: EntryNumber,
        found: EntryNumber,
    },
}

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("index config is not valid toml: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("index config field '{field}' is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

///
/// LoadError
///
/// A deserialized index whose record log does not fit its chain table or
/// event slots. Positions are record-log indices.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum LoadError {
    #[error("record {record} names chain {chain_index}, but the table holds {chains}")]
    UnknownChain {
        record: usize,
        chain_index: usize,
        chains: usize,
    },

    #[error("record {record} has event range {begin}..{end}")]
    InvalidEventRange {
        record: usize,
        begin: EntryNumber,
        end: EntryNumber,
    },

    #[error("run record {record} carries events")]
    RunWithEvents { record: usize },

    #[error("record {record} needs event slots {slots:?}, but only {available} exist")]
    SlotsOutOfBounds {
        record: usize,
        slots: Range<usize>,
        available: usize,
    },

    #[error("chain table lists chain {chain_index} twice")]
    DuplicateChain { chain_index: usize },
}

///
/// IndexError
///
/// Crate-level error. Absence of a coordinate is never an error: lookups
/// report it as an `End` cursor.
///

#[derive(Debug, ThisError)]
pub enum IndexError {
    #[error("sorted projection is stale; call build_sorted_projection first")]
    ProjectionStale,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl IndexError {
    #[must_use]
    pub const fn is_stale_projection(&self) -> bool {
        matches!(self, Self::ProjectionStale)
    }
}
