//! Module: config
//! Responsibility: typed index configuration and its TOML loader.
//! Does not own: where the TOML text comes from.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

///
/// Constants
///

/// Upper bound on pre-allocation hints; larger values are almost always typos.
pub const MAX_CAPACITY_HINT: usize = u32::MAX as usize;

///
/// IndexConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Pre-allocation hint for the record log.
    pub record_capacity: usize,

    /// Pre-allocation hint for the insertion-order event slots.
    pub event_capacity: usize,

    /// Fill the entry-order memo while building the sorted projection, so the
    /// index never computes it lazily once shared.
    pub eager_order_flags: bool,

    /// Regroup the record log by first appearance before every projection build.
    pub group_on_build: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            record_capacity: 0,
            event_capacity: 0,
            eager_order_flags: true,
            group_on_build: false,
        }
    }
}

// Accept both a bare table and an `[index]` section.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigDocument {
    Section(IndexSection),
    Bare(IndexConfig),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct IndexSection {
    index: IndexConfig,
}

impl IndexConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config = match toml::from_str::<ConfigDocument>(text)? {
            ConfigDocument::Section(IndexSection { index }) | ConfigDocument::Bare(index) => index,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_capacity("record_capacity", self.record_capacity)?;
        check_capacity("event_capacity", self.event_capacity)
    }
}

fn check_capacity(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value > MAX_CAPACITY_HINT {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("{value} exceeds the {MAX_CAPACITY_HINT} hint limit"),
        });
    }

    Ok(())
}

///
/// TESTS
///
