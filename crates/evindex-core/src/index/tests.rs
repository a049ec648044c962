use crate::{
    config::IndexConfig,
    error::{InsertError, LoadError},
    index::{ChainTable, EventIndex, EventSlot, IndexOrder},
};
use evindex_primitives::{ChainId, EntryNumber, INVALID_ENTRY};
use serde_json::{Value, json};

fn chain(n: u128) -> ChainId {
    ChainId::from(n)
}

fn keys(index: &EventIndex) -> Vec<(usize, u32, u32, i64)> {
    index
        .records()
        .iter()
        .map(|record| {
            (
                record.chain_index(),
                record.run(),
                record.lumi(),
                record.entry(),
            )
        })
        .collect()
}

fn scenario() -> EventIndex {
    let a = chain(0xA);
    let mut index = EventIndex::new();
    index.add_entry(a, 1, 1, 1, 10).unwrap();
    index.add_entry(a, 1, 1, 2, 11).unwrap();
    index.add_entry(a, 1, 2, 0, 12).unwrap();
    index.add_entry(a, 2, 0, 0, 13).unwrap();

    index
}

#[test]
fn events_without_open_range_start_an_implicit_lumi_record() {
    let index = scenario();

    assert_eq!(
        keys(&index),
        vec![(0, 1, 1, INVALID_ENTRY), (0, 1, 2, 12), (0, 2, 0, 13)]
    );
    assert_eq!(index.records()[0].event_range(), Some(10..12));
    assert_eq!(index.records()[0].slots(), 0..2);
    assert_eq!(index.records()[1].event_count(), 0);
    assert_eq!(
        index.event_slots(),
        &[EventSlot::new(1, 10), EventSlot::new(2, 11)]
    );
    assert_eq!(index.chain_table().len(), 1);
    assert_eq!(index.event_count(), 2);
}

#[test]
fn lumi_boundary_after_its_events_attaches_to_them() {
    let a = chain(1);
    let mut index = EventIndex::new();
    index.add_entry(a, 5, 3, 7, 0).unwrap();
    index.add_entry(a, 5, 3, 8, 1).unwrap();
    index.add_entry(a, 5, 3, 0, 2).unwrap();

    assert_eq!(keys(&index), vec![(0, 5, 3, 2)]);
    assert_eq!(index.records()[0].event_count(), 2);
}

#[test]
fn run_record_closes_open_range() {
    let a = chain(1);
    let mut index = EventIndex::new();
    index.add_entry(a, 1, 1, 1, 0).unwrap();
    index.add_entry(a, 1, 0, 0, 1).unwrap();

    // Same lumi again, but the range is closed: a fresh implicit record.
    index.add_entry(a, 1, 1, 2, 2).unwrap();

    assert_eq!(
        keys(&index),
        vec![
            (0, 1, 1, INVALID_ENTRY),
            (0, 1, 0, 1),
            (0, 1, 1, INVALID_ENTRY)
        ]
    );
}

#[test]
fn rejected_inserts_leave_index_untouched() {
    let a = chain(1);
    let b = chain(2);
    let mut index = EventIndex::new();
    index.add_entry(a, 1, 1, 1, 0).unwrap();
    let before = keys(&index);

    assert_eq!(index.add_entry(a, 0, 1, 1, 1), Err(InsertError::InvalidRun));
    assert_eq!(
        index.add_entry(a, 1, 1, 2, -4),
        Err(InsertError::InvalidEntry { entry: -4 })
    );
    assert_eq!(
        index.add_entry(a, 1, 0, 9, 1),
        Err(InsertError::EventWithoutLumi { run: 1 })
    );
    assert_eq!(
        index.add_entry(a, 1, 2, 1, 1),
        Err(InsertError::EventOutsideOpenLumi {
            run: 1,
            lumi: 2,
            open_run: 1,
            open_lumi: 1,
        })
    );
    assert_eq!(
        index.add_entry(a, 1, 1, 2, 5),
        Err(InsertError::NonContiguousEvent {
            expected: 1,
            found: 5,
        })
    );
    assert_eq!(
        index.add_entry(b, 1, 1, 2, 1),
        Err(InsertError::ChainChangedInOpenLumi { run: 1, lumi: 1 })
    );

    assert_eq!(keys(&index), before);
    assert_eq!(index.event_count(), 1);
    assert_eq!(index.chain_table().len(), 1, "rejected chain must not be interned");

    // The open range is still open after all those rejections.
    index.add_entry(a, 1, 1, 2, 1).unwrap();
    assert_eq!(index.records()[0].event_count(), 2);
}

#[test]
fn chains_are_interned_once_in_first_appearance_order() {
    let (a, b) = (chain(1), chain(2));
    let mut index = EventIndex::new();
    index.add_entry(a, 1, 0, 0, 0).unwrap();
    index.add_entry(b, 1, 0, 0, 1).unwrap();
    index.add_entry(a, 2, 0, 0, 2).unwrap();
    index.add_entry(b, 2, 0, 0, 3).unwrap();

    assert_eq!(index.chain_table().iter().copied().collect::<Vec<_>>(), vec![a, b]);
    assert_eq!(
        index
            .records()
            .iter()
            .map(|record| record.chain_index())
            .collect::<Vec<_>>(),
        vec![0, 1, 0, 1]
    );
}

#[test]
fn merge_chain_tables_adopts_foreign_order_and_appends_missing() {
    let (a, b, c) = (chain(1), chain(2), chain(3));
    let mut index = EventIndex::new();
    index.add_entry(a, 1, 0, 0, 0).unwrap();
    index.add_entry(b, 2, 0, 0, 1).unwrap();
    index.build_sorted_projection();

    let foreign: ChainTable = [b, c].into_iter().collect();
    let remap = index.merge_chain_tables(&foreign);

    assert_eq!(remap.to_vec(), vec![2, 0]);
    assert_eq!(remap.appended(), 1);
    assert_eq!(remap.apply(1), Some(0));
    assert_eq!(remap.apply(7), None);
    assert!(!remap.is_identity());
    assert_eq!(
        index.chain_table().iter().copied().collect::<Vec<_>>(),
        vec![b, c, a]
    );
    assert_eq!(keys(&index), vec![(2, 1, 0, 0), (0, 2, 0, 1)]);
    assert!(index.sorted_projection().is_none());

    // The previous-chain memo follows the remap.
    index.add_entry(b, 3, 0, 0, 2).unwrap();
    assert_eq!(index.records()[2].chain_index(), 0);
    assert_eq!(index.chain_table().len(), 3);
}

#[test]
fn merge_with_own_table_is_identity() {
    let mut index = scenario();
    let own = index.chain_table().clone();
    let before = keys(&index);

    let remap = index.merge_chain_tables(&own);

    assert!(remap.is_identity());
    assert_eq!(remap.appended(), 0);
    assert_eq!(keys(&index), before);
}

#[test]
fn group_by_first_appearance_makes_run_groups_contiguous() {
    let a = chain(1);
    let mut index = EventIndex::new();
    index.add_entry(a, 1, 0, 0, 0).unwrap();
    index.add_entry(a, 1, 1, 0, 1).unwrap();
    index.add_entry(a, 2, 0, 0, 2).unwrap();
    index.add_entry(a, 2, 1, 0, 3).unwrap();
    index.add_entry(a, 1, 2, 0, 4).unwrap();
    index.add_entry(a, 1, 0, 0, 5).unwrap();

    index.group_by_first_appearance();

    assert_eq!(
        keys(&index),
        vec![
            (0, 1, 0, 0),
            (0, 1, 0, 5),
            (0, 1, 1, 1),
            (0, 1, 2, 4),
            (0, 2, 0, 2),
            (0, 2, 1, 3),
        ]
    );
}

#[test]
fn group_on_build_regroups_before_projecting() {
    let a = chain(1);
    let config = IndexConfig {
        group_on_build: true,
        ..IndexConfig::default()
    };
    let mut index = EventIndex::with_config(&config);
    index.add_entry(a, 1, 1, 0, 0).unwrap();
    index.add_entry(a, 2, 1, 0, 1).unwrap();
    index.add_entry(a, 1, 2, 0, 2).unwrap();

    index.build_sorted_projection();

    assert_eq!(
        keys(&index),
        vec![(0, 1, 1, 0), (0, 1, 2, 2), (0, 2, 1, 1)]
    );
    assert!(index.sorted_projection().is_some());
}

#[test]
fn sorted_projection_groups_and_sorts_events_per_lumi() {
    let a = chain(1);
    let mut index = EventIndex::new();
    index.add_entry(a, 1, 1, 9, 0).unwrap();
    index.add_entry(a, 1, 1, 3, 1).unwrap();
    index.add_entry(a, 1, 0, 0, 2).unwrap();
    index.add_entry(a, 1, 1, 5, 3).unwrap();
    index.add_entry(a, 1, 1, 3, 4).unwrap();

    index.build_sorted_projection();
    let projection = index.sorted_projection().unwrap();

    let entries = projection.entries();
    assert_eq!(entries.len(), 3);
    assert!(entries[0].is_run());
    assert_eq!(entries[0].record, 1);
    assert_eq!(entries[0].slots, 0..0);
    assert_eq!((entries[1].record, entries[2].record), (0, 2));
    assert_eq!(entries[1].slots, 0..4);
    assert_eq!(entries[2].slots, 0..4);

    // Duplicate event numbers keep their offset order.
    assert_eq!(
        projection.slots(),
        &[
            EventSlot::new(3, 1),
            EventSlot::new(3, 4),
            EventSlot::new(5, 3),
            EventSlot::new(9, 0),
        ]
    );
}

#[test]
fn rebuilding_projection_is_idempotent_and_mutation_makes_it_stale() {
    let mut index = scenario();
    assert!(index.sorted_projection().is_none());

    index.build_sorted_projection();
    let first = index.sorted_projection().cloned().unwrap();
    index.build_sorted_projection();
    assert_eq!(index.sorted_projection(), Some(&first));

    index.add_entry(chain(0xA), 3, 0, 0, 14).unwrap();
    assert!(index.sorted_projection().is_none());
}

#[test]
fn all_events_in_entry_order_tracks_offsets() {
    let a = chain(1);
    let mut index = scenario();
    assert!(index.all_events_in_entry_order());

    index.add_entry(a, 3, 1, 1, 2).unwrap();
    assert!(!index.all_events_in_entry_order());

    let empty = EventIndex::new();
    assert!(empty.all_events_in_entry_order());
    assert!(empty.is_empty());
}

#[test]
fn display_lists_records_events_and_chains() {
    let index = scenario();
    let text = index.to_string();

    assert!(text.contains("(run)"));
    assert!(text.contains("(lumi)"));
    assert!(text.contains(&chain(0xA).to_string()));
    // The implicit lumi record of (1, 1) has no offset of its own.
    assert_eq!(text.matches("(lumi)").count(), 1);
    assert_eq!(text.matches("(run)").count(), 1);
}

#[test]
fn serde_round_trip_keeps_persistent_state_only() {
    let mut index = scenario();
    index.build_sorted_projection();

    let json = serde_json::to_string(&index).unwrap();
    let loaded: EventIndex = serde_json::from_str(&json).unwrap();

    assert_eq!(loaded.records(), index.records());
    assert_eq!(loaded.event_slots(), index.event_slots());
    assert_eq!(loaded.chain_table(), index.chain_table());
    assert!(loaded.sorted_projection().is_none());
    assert_eq!(loaded.config(), &IndexConfig::default());
}

#[test]
fn with_config_keeps_config() {
    let config = IndexConfig {
        record_capacity: 64,
        event_capacity: 1024,
        ..IndexConfig::default()
    };
    let index = EventIndex::with_config(&config);

    assert_eq!(index.config(), &config);
    assert_eq!(index.len(), 0);
}

#[test]
fn largest_offset_is_rejected_before_any_range_arithmetic() {
    let a = chain(1);
    let mut index = EventIndex::new();

    for (lumi, event) in [(1, 1), (1, 0), (0, 0)] {
        assert_eq!(
            index.add_entry(a, 1, lumi, event, EntryNumber::MAX),
            Err(InsertError::InvalidEntry {
                entry: EntryNumber::MAX
            })
        );
    }
    assert!(index.is_empty());
    assert_eq!(index.event_count(), 0);

    // One below is still a usable offset.
    index.add_entry(a, 1, 1, 1, EntryNumber::MAX - 1).unwrap();
    assert_eq!(index.records()[0].event_count(), 1);
    assert_eq!(index.event_count(), 1);
}

#[test]
fn new_chains_are_appended_after_a_single_search() {
    let ids: Vec<ChainId> = (1..=4).map(chain).collect();
    let mut index = EventIndex::new();
    for (position, &id) in ids.iter().cycle().take(12).enumerate() {
        let entry = EntryNumber::try_from(position).unwrap();
        index.add_entry(id, 1, 0, 0, entry).unwrap();
    }

    assert_eq!(index.chain_table().iter().copied().collect::<Vec<_>>(), ids);
    assert_eq!(
        index
            .records()
            .iter()
            .map(|record| record.chain_index())
            .collect::<Vec<_>>(),
        [0, 1, 2, 3].repeat(3)
    );

    let mut table = ChainTable::new();
    assert_eq!(table.intern(ids[0]), 0);
    assert_eq!(table.intern(ids[1]), 1);
    assert_eq!(table.intern(ids[0]), 0);
    assert_eq!(table.len(), 2);
}

fn persisted(index: &EventIndex) -> Value {
    serde_json::to_value(index).unwrap()
}

fn load(value: Value) -> Result<EventIndex, String> {
    serde_json::from_value(value).map_err(|err| err.to_string())
}

#[test]
fn loading_rejects_records_pointing_past_event_slots() {
    let mut value = persisted(&scenario());
    value["events"] = json!([]);

    let err = load(value).unwrap_err();
    assert!(err.contains("event slots"), "{err}");
}

#[test]
fn loading_rejects_unknown_chain_and_bad_ranges() {
    let mut unknown_chain = persisted(&scenario());
    unknown_chain["chains"] = json!([]);
    assert!(load(unknown_chain).unwrap_err().contains("names chain 0"));

    let mut inverted = persisted(&scenario());
    inverted["records"][0]["end_events"] = json!(5);
    assert!(load(inverted).unwrap_err().contains("event range 10..5"));

    let mut half_empty = persisted(&scenario());
    half_empty["records"][1]["end_events"] = json!(3);
    assert!(load(half_empty).unwrap_err().contains("event range -1..3"));

    let mut run_with_events = persisted(&scenario());
    run_with_events["records"][2]["begin_events"] = json!(0);
    run_with_events["records"][2]["end_events"] = json!(0);
    assert!(load(run_with_events).is_ok(), "an empty run range is harmless");

    let mut run_with_events = persisted(&scenario());
    run_with_events["records"][2]["begin_events"] = json!(0);
    run_with_events["records"][2]["end_events"] = json!(1);
    assert!(load(run_with_events).unwrap_err().contains("run record 2"));

    let mut huge_slot = persisted(&scenario());
    huge_slot["records"][0]["first_slot"] = json!(usize::MAX);
    assert!(load(huge_slot).unwrap_err().contains("event slots"));

    let mut duplicate = persisted(&scenario());
    let id = duplicate["chains"]["ids"][0].clone();
    duplicate["chains"]["ids"] = json!([id.clone(), id]);
    assert!(load(duplicate).unwrap_err().contains("twice"));
}

#[test]
fn loaded_index_is_fully_walkable() {
    let index = scenario();
    let loaded = load(persisted(&index)).unwrap();
    let walk = |index: &EventIndex| {
        index
            .begin(IndexOrder::Original)
            .unwrap()
            .items()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
    };

    assert_eq!(
        walk(&loaded),
        ["Lumi(1, 1)", "Event(1, 1, 1)", "Event(1, 1, 2)", "Lumi(1, 2)", "Run(2)"]
    );
    assert_eq!(walk(&loaded), walk(&index));
}

#[test]
fn load_errors_name_the_record() {
    let index = scenario();
    let record = index.records()[0];

    assert_eq!(
        record.check(0, 0, 2),
        Err(LoadError::UnknownChain {
            record: 0,
            chain_index: 0,
            chains: 0,
        })
    );
    assert_eq!(
        record.check(0, 1, 1),
        Err(LoadError::SlotsOutOfBounds {
            record: 0,
            slots: 0..2,
            available: 1,
        })
    );
    assert_eq!(record.check(0, 1, 2), Ok(()));
}
