#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can look
// at bucket layout through `bucket_lens`.

use crate::chained_hash_map::{ChainedHashMap, Growth};
use crate::error::Error;
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::rc::Rc;

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

#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    TryInsert(usize, i32),
    Remove(usize),
    RemoveEntry(usize),
    Get(usize),
    Update(usize, i32),
    Contains(String),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::TryInsert(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::RemoveEntry),
            2 => idx.clone().prop_map(OpI::Get),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Update(i, v)),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Model: per key, the values of its live entries oldest first.
type Model = BTreeMap<Key, VecDeque<i32>>;

fn model_len(model: &Model) -> usize {
    model.values().map(VecDeque::len).sum()
}

// Runs one scenario against a map built with `hasher`, checking:
// - Lookups answer with the oldest live entry for a key.
// - `remove` pops the oldest duplicate; `try_insert` fails iff the key is live.
// - `len` equals the model's entry count and the sum of chain lengths.
// - The threshold holds after every insert whenever growth is enabled.
// - Key disposers run exactly once for every removed or cleared entry.
fn run_scenario<S>(
    pool: &[String],
    ops: Vec<OpI>,
    hasher: S,
    growth: Growth,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut sut: ChainedHashMap<Key, i32, S> = ChainedHashMap::builder()
        .with_growth(growth)
        .with_hasher(hasher)
        .build()
        .expect("valid configuration");
    let freed = Rc::new(Cell::new(0usize));
    let f = freed.clone();
    sut.set_free_key(move |_k| f.set(f.get() + 1));
    let mut model: Model = BTreeMap::new();
    let mut expected_freed = 0usize;

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                sut.insert(k.clone(), v);
                model.entry(k).or_default().push_back(v);
                if growth != Growth::Fixed {
                    prop_assert!(sut.len() <= sut.threshold());
                }
            }
            OpI::TryInsert(i, v) => {
                let k = key_from(pool, i);
                let already = model.get(&k).map_or(false, |vs| !vs.is_empty());
                match sut.try_insert(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(!already, "try_insert must fail on a live key");
                        model.entry(k).or_default().push_back(v);
                    }
                    Err(e) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(e, Error::DuplicateKey);
                    }
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let expected = model.get_mut(&k).and_then(VecDeque::pop_front);
                prop_assert_eq!(sut.remove(k.0.as_str()), expected);
                if expected.is_some() {
                    expected_freed += 1;
                }
            }
            OpI::RemoveEntry(i) => {
                let k = key_from(pool, i);
                let expected = model.get_mut(&k).and_then(VecDeque::pop_front);
                prop_assert_eq!(sut.remove_entry(&k), expected.map(|v| (k.clone(), v)));
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                let expected = model.get(&k).and_then(|vs| vs.front());
                prop_assert_eq!(sut.get(&k), expected);
                prop_assert_eq!(sut.contains_key(&k), expected.is_some());
            }
            OpI::Update(i, v) => {
                let k = key_from(pool, i);
                match model.get_mut(&k).and_then(|vs| vs.front_mut()) {
                    Some(slot) => {
                        let old = std::mem::replace(slot, v);
                        prop_assert_eq!(sut.update(&k, v), Ok(old));
                    }
                    None => prop_assert_eq!(sut.update(&k, v), Err(Error::KeyNotFound)),
                }
            }
            OpI::Contains(s) => {
                let has_model = model.iter().any(|(k, vs)| k.0 == s && !vs.is_empty());
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Clear => {
                expected_freed += model_len(&model);
                model.clear();
                sut.clear();
                prop_assert_eq!(sut.capacity(), 17);
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model
                    .iter()
                    .filter(|(_, vs)| !vs.is_empty())
                    .map(|(k, _)| k.clone())
                    .collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().count(), model_len(&model));
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model_len(&model));
        prop_assert_eq!(sut.is_empty(), model_len(&model) == 0);
        prop_assert_eq!(sut.bucket_lens().iter().sum::<usize>(), sut.len());
        prop_assert_eq!(freed.get(), expected_freed);
    }

    let remaining = sut.len();
    drop(sut);
    prop_assert_eq!(freed.get(), expected_freed + remaining);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(&pool, ops, hashbrown::hash_map::DefaultHashBuilder::default(), Growth::default())?;
    }

    #[test]
    fn prop_state_machine_fixed_capacity((pool, ops) in arb_scenario()) {
        run_scenario(&pool, ops, hashbrown::hash_map::DefaultHashBuilder::default(), Growth::Fixed)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_collisions((pool, ops) in arb_scenario()) {
        run_scenario(&pool, ops, ConstBuildHasher, Growth::default())?;
    }
}

// Property: Growth never reorders entries that share a key.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_growth_keeps_duplicate_order(values in proptest::collection::vec(any::<i32>(), 1..8), filler in 10usize..80) {
        let mut sut: ChainedHashMap<String, i32> = ChainedHashMap::new();
        for &v in &values {
            sut.insert("dup".to_string(), v);
        }
        for i in 0..filler {
            sut.insert(format!("f{}", i), 0);
        }
        let mut seen = Vec::new();
        while let Some(v) = sut.remove("dup") {
            seen.push(v);
        }
        prop_assert_eq!(seen, values);
        prop_assert_eq!(sut.len(), filler);
        let fillers_intact = (0..filler).all(|i| sut.get(format!("f{}", i).as_str()) == Some(&0));
        prop_assert!(fillers_intact);
    }
}
