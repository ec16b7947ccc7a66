use std::collections::BTreeMap;

use bptree_index::{BpTree, TreeConfig, TreeError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

fn key_strategy() -> impl Strategy<Value = i64> {
    // Smaller than TEST_SIZE so inserts collide and removals usually hit.
    -500i64..500i64
}

fn labelled(fanout: usize, keys: impl IntoIterator<Item = i32>) -> BpTree<i32, String> {
    let mut tree = BpTree::new(fanout);
    for key in keys {
        assert!(tree.insert(key, format!("v{key}")));
    }
    tree
}

fn labels(keys: impl IntoIterator<Item = i32>) -> Vec<String> {
    keys.into_iter().map(|key| format!("v{key}")).collect()
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Insert(i64, i64),
    Remove(i64),
    Find(i64),
    Contains(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        5 => (key_strategy(), any::<i64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        4 => key_strategy().prop_map(Op::Remove),
        2 => key_strategy().prop_map(Op::Find),
        1 => key_strategy().prop_map(Op::Contains),
    ]
}

// ─── Model comparison ────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays random operations on both `BpTree` and `BTreeMap` and asserts identical results.
    #[test]
    fn ops_match_btreemap(
        fanout in 2usize..10,
        ops in proptest::collection::vec(op_strategy(), TEST_SIZE),
    ) {
        let mut tree: BpTree<i64, i64> = BpTree::new(fanout);
        let mut model: BTreeMap<i64, i64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let fresh = !model.contains_key(&k);
                    if fresh {
                        model.insert(k, v);
                    }
                    prop_assert_eq!(tree.insert(k, v), fresh);
                }
                Op::Remove(k) => {
                    prop_assert_eq!(tree.remove(&k), model.remove(&k).is_some());
                }
                Op::Find(k) => {
                    prop_assert_eq!(tree.find(&k), model.get(&k));
                }
                Op::Contains(k) => {
                    prop_assert_eq!(tree.contains(&k), model.contains_key(&k));
                }
            }
            prop_assert_eq!(tree.len(), model.len());
        }

        prop_assert_eq!(tree.ordered_values(), model.values().copied().collect::<Vec<_>>());
        prop_assert!(tree.iter().eq(model.iter()));
        prop_assert_eq!(tree.first_key_value(), model.first_key_value());
        prop_assert_eq!(tree.last_key_value(), model.last_key_value());
    }

    /// Every level of the dump is sorted left to right and all leaves share one depth.
    #[test]
    fn level_dump_is_sorted_per_level(
        fanout in 2usize..8,
        keys in proptest::collection::vec(key_strategy(), 0..300),
        removals in proptest::collection::vec(key_strategy(), 0..300),
    ) {
        let mut tree = BpTree::new(fanout);
        tree.extend(keys.iter().map(|&k| (k, ())));
        for k in &removals {
            tree.remove(k);
        }

        let levels = tree.level_keys();
        prop_assert_eq!(levels.len(), tree.height());
        for level in &levels {
            let flat: Vec<i64> = level.iter().flatten().copied().collect();
            prop_assert!(flat.windows(2).all(|pair| pair[0] < pair[1]));
            for node in level {
                prop_assert!(node.len() <= fanout);
            }
        }
        if let Some(leaves) = levels.last() {
            let flat: Vec<i64> = leaves.iter().flatten().copied().collect();
            prop_assert_eq!(flat, tree.keys().copied().collect::<Vec<_>>());
        }
    }
}

// ─── Insert ──────────────────────────────────────────────────────────────────

#[test]
fn insert_splits_root_on_fourth_key_with_fanout_three() {
    let tree = labelled(3, 1..=3);
    assert_eq!(tree.height(), 1);

    let tree = labelled(3, 1..=4);
    assert_eq!(tree.height(), 2);
    assert_eq!(tree.level_keys(), vec![vec![vec![3]], vec![vec![1, 2], vec![3, 4]]]);
}

#[test]
fn insert_seven_keys_with_fanout_three() {
    let tree = labelled(3, 1..=7);
    assert_eq!(tree.level_keys(), vec![vec![vec![3, 5]], vec![vec![1, 2], vec![3, 4], vec![5, 6, 7]]]);
    assert_eq!(tree.ordered_values(), labels(1..=7));
}

#[test]
fn duplicate_insert_keeps_first_value() {
    let mut tree = labelled(3, 1..=7);
    assert!(!tree.insert(4, "other".to_string()));
    assert_eq!(tree.try_insert(4, "other".to_string()), Err(TreeError::DuplicateKey));
    assert_eq!(tree.find(&4).map(String::as_str), Some("v4"));
    assert_eq!(tree.len(), 7);
}

#[test]
fn string_keys_lookup_by_str() {
    let mut tree = BpTree::new(3);
    for word in ["pear", "apple", "fig", "kiwi", "date"] {
        tree.insert(word.to_string(), word.len());
    }
    assert_eq!(tree.find("kiwi"), Some(&4));
    assert!(tree.contains("date"));
    assert!(tree.remove("apple"));
    assert_eq!(tree.keys().map(String::as_str).collect::<Vec<_>>(), ["date", "fig", "kiwi", "pear"]);
}

// ─── Remove ──────────────────────────────────────────────────────────────────

#[test]
fn remove_from_seven_key_tree() {
    let mut tree = labelled(3, 1..=7);
    assert!(tree.remove(&4));
    assert_eq!(tree.find(&4), None);
    for key in [1, 2, 3, 5, 6, 7] {
        assert_eq!(tree.find(&key), Some(&format!("v{key}")));
    }
    assert_eq!(tree.ordered_values(), labels([1, 2, 3, 5, 6, 7]));

    // [3] fell below two keys and took 5 from its right sibling.
    assert_eq!(tree.level_keys(), vec![vec![vec![3, 6]], vec![vec![1, 2], vec![3, 5], vec![6, 7]]]);

    // Neither sibling of [5] can lend now, so it merges into [1, 2].
    assert!(tree.remove(&3));
    assert_eq!(tree.level_keys(), vec![vec![vec![6]], vec![vec![1, 2, 5], vec![6, 7]]]);
    assert_eq!(tree.ordered_values(), labels([1, 2, 5, 6, 7]));
}

#[test]
fn leaves_never_drop_below_half_full() {
    let mut tree = BpTree::new(3);
    tree.extend((0..60).map(|key| (key, key)));
    for key in (0..60).filter(|key| key % 4 != 0) {
        assert!(tree.remove(&key));
        let levels = tree.level_keys();
        if levels.len() > 1 {
            let leaves = levels.last().unwrap();
            assert!(leaves.iter().all(|leaf| leaf.len() >= 2), "underfull leaf in {leaves:?}");
        }
    }
    assert_eq!(tree.ordered_values(), (0..60).step_by(4).collect::<Vec<_>>());
}

#[test]
fn remove_absent_key_changes_nothing() {
    let mut tree = labelled(3, 1..=7);
    let before = tree.level_keys();
    assert!(!tree.remove(&42));
    assert_eq!(tree.try_remove(&42), Err(TreeError::KeyNotFound));
    assert_eq!(tree.level_keys(), before);
    assert_eq!(tree.ordered_values(), labels(1..=7));
}

#[test]
fn remove_all_ascending_empties_tree() {
    let mut tree = labelled(3, 1..=7);
    for key in 1..=7 {
        assert!(tree.remove(&key));
        assert_eq!(tree.ordered_values(), labels(key + 1..=7));
    }
    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
    assert!(tree.level_keys().is_empty());

    assert!(tree.insert(10, "v10".to_string()));
    assert_eq!(tree.level_keys(), vec![vec![vec![10]]]);
}

#[test]
fn remove_all_descending_empties_tree() {
    let mut tree = labelled(4, 1..=40);
    for key in (1..=40).rev() {
        assert_eq!(tree.try_remove(&key), Ok(format!("v{key}")));
    }
    assert!(tree.is_empty());
}

#[test]
fn single_insert_then_remove() {
    let mut tree = BpTree::new(3);
    assert!(tree.insert(1, "v1"));
    assert!(tree.remove(&1));
    assert!(tree.is_empty());
    assert!(tree.ordered_values().is_empty());
    assert_eq!(tree.try_remove(&1), Err(TreeError::EmptyTree));
    assert!(!tree.remove(&1));
}

// ─── Construction ────────────────────────────────────────────────────────────

#[test]
fn fanout_below_two_is_rejected() {
    assert_eq!(BpTree::<i32, i32>::try_new(0).err(), Some(TreeError::InvalidFanout(0)));
    assert_eq!(BpTree::<i32, i32>::try_new(1).err(), Some(TreeError::InvalidFanout(1)));
    assert!(BpTree::<i32, i32>::with_config(TreeConfig::default().with_fanout(2)).is_ok());
}

#[test]
fn fanout_two_handles_many_keys() {
    let mut tree = BpTree::new(2);
    tree.extend((0..500).map(|key| (key, key)));
    assert_eq!(tree.len(), 500);
    for key in (0..500).step_by(3) {
        assert!(tree.remove(&key));
    }
    let expected: Vec<i32> = (0..500).filter(|key| key % 3 != 0).collect();
    assert_eq!(tree.ordered_values(), expected);
}

// ─── Clone ───────────────────────────────────────────────────────────────────

#[test]
fn clone_does_not_share_nodes() {
    let mut tree = labelled(3, 1..=20);
    let copy = tree.clone();
    for key in 1..=10 {
        tree.remove(&key);
    }
    assert_eq!(copy.len(), 20);
    assert_eq!(copy.ordered_values(), labels(1..=20));
    assert_eq!(tree.ordered_values(), labels(11..=20));
}
