//! Core runtime for evindex: the chain table, the record log, the sorted
//! projection, both traversal engines, lookups, and table reconciliation.
#![warn(unreachable_pub)]

pub mod config;
pub mod cursor;
pub mod error;
pub mod index;
pub mod lookup;
pub mod obs;

pub use config::IndexConfig;
pub use cursor::{CursorItem, CursorItems, IndexCursor, SkippedEvent};
pub use error::{ConfigError, IndexError, InsertError, LoadError};
pub use index::{
    ChainRemap, ChainTable, EventIndex, EventSlot, IndexOrder, RunOrLumiEntry, SortedIndexEntry,
    SortedProjection,
};

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sinks, or config loaders are re-exported here.
///

pub mod prelude {
    pub use crate::{
        cursor::IndexCursor,
        index::{EventIndex, IndexOrder},
    };
    pub use evindex_primitives::{
        ChainId, EntryKind, EntryNumber, EventNumber, LumiNumber, RunNumber,
    };
}
