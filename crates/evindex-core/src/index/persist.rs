//! Module: index::persist
//! Responsibility: admitting a deserialized record log only when every record
//! fits the chain table and event slots loaded beside it.
//! Does not own: the serialized layout (derived on `EventIndex`).

use crate::{
    error::LoadError,
    index::{ChainTable, EventIndex, EventSlot, RunOrLumiEntry, Transients},
};
use serde::Deserialize;

///
/// PersistedIndex
///
/// The persistent fields of `EventIndex`, exactly as serialized.
///

#[derive(Deserialize)]
pub(crate) struct PersistedIndex {
    chains: ChainTable,
    records: Vec<RunOrLumiEntry>,
    events: Vec<EventSlot>,
}

impl TryFrom<PersistedIndex> for EventIndex {
    type Error = LoadError;

    fn try_from(persisted: PersistedIndex) -> Result<Self, Self::Error> {
        let PersistedIndex {
            chains,
            records,
            events,
        } = persisted;

        if let Some(chain_index) = chains.first_duplicate() {
            return Err(LoadError::DuplicateChain { chain_index });
        }
        for (position, record) in records.iter().enumerate() {
            record.check(position, chains.len(), events.len())?;
        }

        Ok(Self {
            chains,
            records,
            events,
            transients: Transients::default(),
        })
    }
}
