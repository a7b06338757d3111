#![cfg(test)]

// Property tests for ChainHashMap kept inside the crate so they can check
// bucket-level invariants that the public API does not expose.

use crate::chain_hash_map::{ChainHashMap, Handle, MAX_LOAD_FACTOR};
use crate::error::MapError;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fmt;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so failing cases shrink toward earlier keys.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    InsertWith(usize, i32),
    Erase(usize),
    At(usize),
    Contains(String),
    Mutate(usize, i32),
    Clear,
    Resize(usize),
    Iterate,
    Snapshot,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    (1usize..=4, proptest::collection::vec("[a-z]{0,5}", 1..=12)).prop_flat_map(
        |(capacity, pool)| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let contains_pool = proptest::sample::select(pool.clone());
            let op = prop_oneof![
                4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
                2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::InsertWith(i, v)),
                2 => idx.clone().prop_map(OpI::Erase),
                2 => idx.clone().prop_map(OpI::At),
                1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
                1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
                1 => Just(OpI::Clear),
                1 => (0usize..8).prop_map(OpI::Resize),
                1 => Just(OpI::Iterate),
                1 => Just(OpI::Snapshot),
            ];
            proptest::collection::vec(op, 1..80)
                .prop_map(move |ops| (capacity, pool.clone(), ops))
        },
    )
}

// Checks the growth rule for an insert that may or may not have added a key.
fn expected_capacity(len_after: usize, cap_before: usize, added: bool) -> usize {
    if added && len_after as f64 / cap_before as f64 > MAX_LOAD_FACTOR {
        cap_before * 2
    } else {
        cap_before
    }
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences, starting from
// tiny capacities so chains collide constantly:
// - Duplicate inserts are no-ops: no value overwrite, no size change, no growth.
// - Growth doubles capacity exactly when an insert crosses the load factor.
// - `at`/`erase` report `KeyNotFound` for absent keys and leave the map alone.
// - A full cursor traversal and `iter` both visit each live entry once.
// - Clones compare equal and share capacity.
// - After every op: chains are consistent with capacity, handles for live
//   entries resolve to the model's value, stale handles never resolve.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((capacity, pool, ops) in arb_scenario()) {
        let mut sut: ChainHashMap<Key, i32> = ChainHashMap::with_capacity(capacity).unwrap();
        let mut model: HashMap<Key, i32> = HashMap::new();
        let mut live: HashMap<Key, Handle> = HashMap::new();
        let mut stale: Vec<Handle> = Vec::new();

        for op in ops {
            match op {
                OpI::Insert(i, v) => {
                    let k = key_from(&pool, i);
                    let already = model.contains_key(&k);
                    let cap_before = sut.capacity();
                    let res = sut.insert(k.clone(), v);
                    prop_assert_eq!(res.is_some(), !already);
                    if let Some(h) = res {
                        live.insert(k.clone(), h);
                        model.insert(k, v);
                    }
                    prop_assert_eq!(
                        sut.capacity(),
                        expected_capacity(sut.len(), cap_before, !already)
                    );
                }
                OpI::InsertWith(i, v) => {
                    let k = key_from(&pool, i);
                    let already = model.contains_key(&k);
                    let mut ran = false;
                    let res = sut.insert_with(k.clone(), || { ran = true; v });
                    prop_assert_eq!(ran, !already, "default runs only for absent keys");
                    prop_assert_eq!(res.is_some(), !already);
                    if let Some(h) = res {
                        live.insert(k.clone(), h);
                        model.insert(k, v);
                    }
                }
                OpI::Erase(i) => {
                    let k = key_from(&pool, i);
                    match (sut.erase(&k), model.remove(&k)) {
                        (Ok(got), Some(want)) => {
                            prop_assert_eq!(got, want);
                            if let Some(h) = live.remove(&k) {
                                stale.push(h);
                            }
                        }
                        (Err(MapError::KeyNotFound), None) => {}
                        (got, want) => {
                            prop_assert!(false, "erase mismatch: {:?} vs {:?}", got, want);
                        }
                    }
                    prop_assert!(!sut.contains_key(&k));
                }
                OpI::At(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.at(&k).ok(), model.get(&k));
                    if !model.contains_key(&k) {
                        prop_assert_eq!(sut.at(&k), Err(MapError::KeyNotFound));
                    }
                }
                OpI::Contains(s) => {
                    let has = sut.contains_key(s.as_str());
                    let has_model = model.keys().any(|k| k.0 == s);
                    prop_assert_eq!(has, has_model);
                }
                OpI::Mutate(i, d) => {
                    let k = key_from(&pool, i);
                    let res = sut.update(&k, |x| *x = x.saturating_add(d));
                    match model.get_mut(&k) {
                        Some(mv) => {
                            prop_assert!(res.is_ok());
                            *mv = mv.saturating_add(d);
                        }
                        None => prop_assert_eq!(res, Err(MapError::KeyNotFound)),
                    }
                }
                OpI::Clear => {
                    let cap = sut.capacity();
                    sut.clear();
                    model.clear();
                    stale.extend(live.drain().map(|(_, h)| h));
                    prop_assert_eq!(sut.capacity(), cap);
                }
                OpI::Resize(c) => {
                    let cap = sut.capacity();
                    match sut.resize(c) {
                        Ok(()) => prop_assert_eq!(sut.capacity(), c),
                        Err(e) => {
                            prop_assert_eq!(c, 0);
                            prop_assert_eq!(e, MapError::InvalidCapacity);
                            prop_assert_eq!(sut.capacity(), cap);
                        }
                    }
                }
                OpI::Iterate => {
                    sut.begin();
                    let mut walked: Vec<(Key, i32)> = Vec::new();
                    while let Some((k, v)) = sut.next_entry() {
                        walked.push((k.clone(), *v));
                    }
                    prop_assert!(sut.next_entry().is_none());
                    prop_assert_eq!(walked.len(), model.len());
                    let distinct: HashSet<&Key> = walked.iter().map(|(k, _)| k).collect();
                    prop_assert_eq!(distinct.len(), walked.len());
                    for (k, v) in &walked {
                        prop_assert_eq!(model.get(k), Some(v));
                    }
                    let borrowed: Vec<(Key, i32)> =
                        sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    prop_assert_eq!(borrowed, walked);
                }
                OpI::Snapshot => {
                    let copy = sut.clone();
                    copy.assert_consistent();
                    prop_assert!(copy == sut);
                    prop_assert_eq!(copy.capacity(), sut.capacity());
                    prop_assert_eq!(copy.len(), sut.len());
                }
            }

            // Post-conditions after each op
            sut.assert_consistent();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            for (k, h) in &live {
                prop_assert_eq!(h.key(&sut), Some(k));
                prop_assert_eq!(h.value(&sut), model.get(k));
            }
            for h in &stale {
                prop_assert!(h.value(&sut).is_none());
            }
        }
    }
}
