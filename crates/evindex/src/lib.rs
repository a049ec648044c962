//! ## Crate layout
//! - `core`: the index engine, cursors, lookups, config, and observability.
//! - `primitives`: run/lumi/event/entry numbers, sentinels, and `ChainId`.
//!
//! The `prelude` module carries the vocabulary needed to build and walk an
//! index; errors and metrics stay under `core`.

pub use evindex_core as core;
pub use evindex_primitives as primitives;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use evindex_core::{EventIndex, IndexConfig, IndexError as Error};

/// Build an empty index from a TOML configuration document.
pub fn index_from_toml(text: &str) -> Result<EventIndex, Error> {
    let config = IndexConfig::from_toml_str(text)?;

    Ok(EventIndex::with_config(&config))
}

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::prelude::*;
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::{index_from_toml, prelude::*};

    #[test]
    fn index_from_toml_applies_section() {
        let index = index_from_toml("[index]\ngroup_on_build = true\n").unwrap();

        assert!(index.config().group_on_build);
        assert!(index.is_empty());
    }

    #[test]
    fn index_from_toml_surfaces_config_errors() {
        let err = index_from_toml("unknown_knob = 1").unwrap_err();

        assert!(matches!(err, super::Error::Config(_)));
    }

    #[test]
    fn prelude_builds_and_walks() {
        let mut index = EventIndex::new();
        index.add_entry(ChainId::from(1u128), 1, 0, 0, 0).unwrap();
        index.build_sorted_projection();

        let cursor = index.begin(IndexOrder::Sorted).unwrap();
        assert_eq!(cursor.kind(), EntryKind::Run);
    }
}
