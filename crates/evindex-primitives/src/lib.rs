//! Coordinate vocabulary shared by the evindex crates.
//!
//! Every level of the (run, lumi, event) hierarchy uses `0` as its "absent"
//! sentinel. Physical offsets use `-1`.

use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Numbers
///

pub type RunNumber = u32;
pub type LumiNumber = u32;
pub type EventNumber = u64;
pub type EntryNumber = i64;

pub const INVALID_RUN: RunNumber = 0;
pub const INVALID_LUMI: LumiNumber = 0;
pub const INVALID_EVENT: EventNumber = 0;
pub const INVALID_ENTRY: EntryNumber = -1;

///
/// ChainId
///
/// Opaque provenance-chain identity. The bytes are a content digest produced
/// elsewhere; this crate only ever compares them for equality.
///

#[derive(Clone, Copy, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ChainId([u8; Self::LEN]);

impl ChainId {
    pub const LEN: usize = 16;

    #[must_use]
    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// All-zero ids are never produced by a real digest.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0 != [0u8; Self::LEN]
    }
}

impl From<[u8; 16]> for ChainId {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl From<u128> for ChainId {
    fn from(value: u128) -> Self {
        Self(value.to_be_bytes())
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }

        Ok(())
    }
}

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainId({self})")
    }
}

///
/// EntryKind
///
/// Logical level a record or cursor position sits at.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum EntryKind {
    Run,
    Lumi,
    Event,
    End,
}

impl EntryKind {
    /// Classify a coordinate triple by the deepest level that is present.
    #[must_use]
    pub const fn classify(lumi: LumiNumber, event: EventNumber) -> Self {
        if lumi == INVALID_LUMI {
            Self::Run
        } else if event == INVALID_EVENT {
            Self::Lumi
        } else {
            Self::Event
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Lumi => "lumi",
            Self::Event => "event",
            Self::End => "end",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// TESTS
///
