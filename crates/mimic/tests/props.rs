//! Property tests for engine invariants: identifier assignment, filter
//! partitioning, pagination windows, and update idempotence.

use mimic::{Store, Value};
use proptest::prelude::*;

fn id_of(store: &Store, rec: mimic::RecordRef) -> i64 {
    match store.value_of(rec, "id") {
        Some(Value::Integer(id)) => id,
        other => panic!("expected integer id, got {other:?}"),
    }
}

proptest! {
    /// Identifiers assigned within one unbroken query lifetime are strictly
    /// increasing, hence unique.
    #[test]
    fn prop_assigned_ids_strictly_increase(count in 1_usize..40) {
        let store = Store::new();
        let mut cursor = store.cursor("artist");
        let mut previous = 0_i64;
        for n in 0..count {
            let rec = cursor.create([("n", Value::Integer(n as i64))]);
            let id = id_of(&store, rec);
            prop_assert!(id > previous, "id {id} did not advance past {previous}");
            previous = id;
        }
    }

    /// A filter and its negation partition the slice: nothing is lost,
    /// nothing matches both.
    #[test]
    fn prop_filter_and_exclude_partition(names in proptest::collection::vec("[ab]", 0..30)) {
        let store = Store::new();
        let mut cursor = store.cursor("artist");
        for name in &names {
            cursor.create([("name", Value::from(name.as_str()))]);
        }
        let matched = store
            .cursor("artist")
            .filter("name", "a")
            .count()
            .expect("filter should evaluate");
        let complement = store
            .cursor("artist")
            .exclude("name", "a")
            .count()
            .expect("exclusion should evaluate");
        prop_assert_eq!(matched + complement, names.len());
    }

    /// One pagination window equals the manual slice of the full result.
    #[test]
    fn prop_window_matches_manual_slice(
        total in 0_usize..30,
        low in 0_usize..35,
        high in 0_usize..35,
    ) {
        let store = Store::new();
        let mut cursor = store.cursor("item");
        for n in 0..total {
            cursor.create([("n", Value::Integer(n as i64))]);
        }
        let all: Vec<_> = store
            .cursor("item")
            .iterate()
            .expect("full scan")
            .collect();
        let windowed: Vec<_> = store
            .cursor("item")
            .set_limits(Some(low), Some(high))
            .iterate()
            .expect("windowed scan")
            .collect();

        // With no prior bounds the high mark lands at `high` and the low
        // mark is clamped against it.
        let lo = low.min(high).min(all.len());
        let hi = high.min(all.len()).max(lo);
        prop_assert_eq!(windowed, all[lo..hi].to_vec());
    }

    /// Applying the same update twice yields the same count and state.
    #[test]
    fn prop_update_idempotent(total in 1_usize..20, value in -100_i64..100) {
        let store = Store::new();
        let mut cursor = store.cursor("item");
        for n in 0..total {
            cursor.create([("n", Value::Integer(n as i64))]);
        }
        let first = store
            .cursor("item")
            .update([("n", Value::Integer(value))])
            .expect("first update");
        let second = store
            .cursor("item")
            .update([("n", Value::Integer(value))])
            .expect("second update");
        prop_assert_eq!(first, total);
        prop_assert_eq!(second, total);
        for rec in store.cursor("item").iterate().expect("scan") {
            prop_assert_eq!(store.value_of(rec, "n"), Some(Value::Integer(value)));
        }
    }
}
