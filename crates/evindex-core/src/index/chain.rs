//! Module: index::chain
//! Responsibility: the deduplicated provenance-chain table and reconciling
//! one index's chain indices against a foreign table.
//! Does not own: deciding whether two concatenated sources are compatible.

use crate::{
    index::EventIndex,
    obs::sink::{self, MetricsEvent},
};
use derive_more::{Deref, IntoIterator};
use evindex_primitives::ChainId;
use serde::{Deserialize, Serialize};
use tracing::debug;

///
/// ChainTable
///
/// Append-only list of distinct chain ids. Records store a position in this
/// table, never the id itself.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, Eq, IntoIterator, PartialEq, Serialize)]
#[into_iterator(owned, ref)]
pub struct ChainTable {
    ids: Vec<ChainId>,
}

impl ChainTable {
    #[must_use]
    pub const fn new() -> Self {
        Self { ids: Vec::new() }
    }

    #[must_use]
    pub fn position(&self, id: &ChainId) -> Option<usize> {
        self.ids.iter().position(|existing| existing == id)
    }

    /// Return the index of `id`, appending it first if it is new.
    pub fn intern(&mut self, id: ChainId) -> usize {
        self.position(&id).unwrap_or_else(|| self.push_new(id))
    }

    // Caller has already searched the table for `id`.
    pub(crate) fn push_new(&mut self, id: ChainId) -> usize {
        debug_assert!(self.position(&id).is_none(), "chain id already interned");
        self.ids.push(id);

        self.ids.len() - 1
    }

    // First position holding an id seen earlier in the table.
    pub(crate) fn first_duplicate(&self) -> Option<usize> {
        (1..self.ids.len()).find(|&index| self.ids[..index].contains(&self.ids[index]))
    }
}

impl FromIterator<ChainId> for ChainTable {
    fn from_iter<I: IntoIterator<Item = ChainId>>(iter: I) -> Self {
        let mut table = Self::new();
        for id in iter {
            table.intern(id);
        }

        table
    }
}

///
/// ChainRemap
///
/// Old local chain index → merged chain index, as produced by
/// `EventIndex::merge_chain_tables`.
///

#[derive(Clone, Debug, Default, Deref, Eq, PartialEq)]
pub struct ChainRemap {
    #[deref]
    map: Vec<usize>,
    appended: usize,
}

impl ChainRemap {
    #[must_use]
    pub fn apply(&self, old: usize) -> Option<usize> {
        self.map.get(old).copied()
    }

    /// Number of local ids that were missing from the foreign table.
    #[must_use]
    pub const fn appended(&self) -> usize {
        self.appended
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.map.iter().enumerate().all(|(old, new)| old == *new)
    }
}

impl EventIndex {
    /// Adopt `foreign` as the chain table, appending any local ids it lacks,
    /// and rewrite every record's chain index through the resulting remap.
    ///
    /// Record order and all run/lumi/event values and offsets are untouched.
    /// The sorted projection is stale afterwards.
    pub fn merge_chain_tables(&mut self, foreign: &ChainTable) -> ChainRemap {
        let mut merged = foreign.clone();
        let map: Vec<usize> = self.chains.iter().map(|id| merged.intern(*id)).collect();
        let appended = merged.len() - foreign.len();

        for record in &mut self.records {
            if let Some(&new) = map.get(record.chain_index()) {
                record.set_chain_index(new);
            }
        }
        self.transients.previous_chain = self
            .transients
            .previous_chain
            .and_then(|old| map.get(old).copied());
        self.chains = merged;
        self.invalidate();

        debug!(
            local = map.len(),
            foreign = foreign.len(),
            appended,
            "merged chain tables"
        );
        sink::record(MetricsEvent::ChainTablesMerged {
            appended: appended as u64,
        });

        ChainRemap { map, appended }
    }
}
