use kvdoc::{Document, text::Splice};
use proptest::prelude::*;

use crate::helpers::sync_into;

fn key() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn path() -> impl Strategy<Value = String> {
    prop::collection::vec(key(), 1..4).prop_map(|keys| keys.join("."))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn put_then_get_returns_value(target in path(), int in any::<i64>(), text in ".{0,24}", flag in any::<bool>()) {
        let mut doc = Document::new();
        doc.put_int(&target, int).unwrap();
        prop_assert_eq!(doc.get_int(&target).unwrap(), Some(int));
        doc.put_text(&target, &text).unwrap();
        prop_assert_eq!(doc.get_text(&target).unwrap(), Some(text.clone()));
        doc.put_bool(&target, flag).unwrap();
        prop_assert_eq!(doc.get_bool(&target).unwrap(), Some(flag));
    }

    #[test]
    fn counter_deltas_commute(deltas in prop::collection::vec((0usize..3, -1000i64..1000), 0..24)) {
        let mut origin = Document::new();
        origin.put_counter("c", 0).unwrap();
        let mut replicas: Vec<Document> = (0..3).map(|_| Document::new()).collect();
        for replica in replicas.iter_mut() {
            prop_assert!(sync_into(&origin, replica).is_complete());
        }
        for (who, delta) in &deltas {
            replicas[*who].inc_counter("c", *delta).unwrap();
        }

        // Merge forwards into one replica and backwards into another.
        let (first, rest) = replicas.split_at_mut(1);
        let (second, third) = rest.split_at_mut(1);
        let (a, b, c) = (&mut first[0], &mut second[0], &mut third[0]);
        sync_into(b, a);
        sync_into(c, a);
        sync_into(b, c);
        sync_into(a, c);

        let expected: i64 = deltas.iter().map(|(_, delta)| delta).sum();
        prop_assert_eq!(a.get_counter("c").unwrap(), Some(expected));
        prop_assert_eq!(c.get_counter("c").unwrap(), Some(expected));
    }

    #[test]
    fn splice_then_inverse_restores(original in ".{0,32}", pos_seed in any::<usize>(), del_seed in any::<usize>(), insert in ".{0,8}") {
        let len = original.chars().count();
        let pos = pos_seed % (len + 1);
        let del = del_seed % (len - pos + 1);
        let splice = Splice::new(pos, del, insert);
        let removed: String = original.chars().skip(pos).take(del).collect();

        let mut doc = Document::new();
        doc.put_text("t", &original).unwrap();
        doc.splice_text("t", splice.pos, splice.del, &splice.insert).unwrap();
        let undo = splice.inverse(&removed);
        doc.splice_text("t", undo.pos, undo.del, &undo.insert).unwrap();
        prop_assert_eq!(doc.get_text("t").unwrap(), Some(original));
    }

    #[test]
    fn save_load_preserves_state(entries in prop::collection::btree_map(key(), any::<i32>(), 0..8)) {
        let mut doc = Document::new();
        for (key, value) in &entries {
            doc.put_int(key, i64::from(*value)).unwrap();
        }
        let loaded = Document::load(&doc.save().unwrap()).unwrap();
        prop_assert_eq!(loaded.num_changes(), doc.num_changes());
        for (key, value) in &entries {
            prop_assert_eq!(loaded.get_int(key).unwrap(), Some(i64::from(*value)));
        }
    }

    #[test]
    fn json_round_trip_preserves_scalars(entries in prop::collection::btree_map(key(), (any::<i64>(), "[ -~]{0,12}"), 0..8)) {
        let mut doc = Document::new();
        for (key, (number, text)) in &entries {
            doc.put_int(&format!("{key}.n"), *number).unwrap();
            doc.put_text(&format!("{key}.s"), text).unwrap();
        }
        let imported = Document::from_json(&doc.to_json(false).unwrap()).unwrap();
        prop_assert_eq!(imported.to_json_value(), doc.to_json_value());
    }
}
