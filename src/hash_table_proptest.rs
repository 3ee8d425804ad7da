#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can inspect
// bucket chains.

use crate::hash_table::HashTable;
use crate::keys::{string_equal, string_hash};
use hashbrown::HashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

// Pool-indexed operations so shrinking walks toward earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, u32),
    Remove(usize),
    RemoveEntry(usize),
    Get(usize),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{1,5}", 1..=24).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<u32>()).prop_map(|(i, v)| Op::Put(i, v)),
            1 => idx.clone().prop_map(Op::Remove),
            1 => idx.clone().prop_map(Op::RemoveEntry),
            2 => idx.clone().prop_map(Op::Get),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against hashbrown::HashMap. After every op:
// - `len` equals the model's size and the number of keys `get` can see.
// - Destructor calls equal the number of displacements so far (overwrites
//   plus `remove` hits); `remove_entry` never reaches a destructor.
fn run(
    mut sut: HashTable<String, u32>,
    destroyed: Rc<Cell<usize>>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, u32> = HashMap::new();
    let mut displaced = 0usize;

    for op in ops {
        match op {
            Op::Put(i, v) => {
                let k = pool[i].clone();
                prop_assert!(sut.put(k.clone(), v).is_ok());
                if model.insert(k, v).is_some() {
                    displaced += 1;
                }
            }
            Op::Remove(i) => {
                let removed = sut.remove(&pool[i]);
                prop_assert_eq!(removed, model.remove(&pool[i]).is_some());
                if removed {
                    displaced += 1;
                }
                prop_assert!(sut.get(&pool[i]).is_none());
            }
            Op::RemoveEntry(i) => {
                let got = sut.remove_entry(&pool[i]);
                let want = model.remove_entry(&pool[i]);
                prop_assert_eq!(got, want);
            }
            Op::Get(i) => {
                prop_assert_eq!(sut.get(&pool[i]), model.get(&pool[i]));
                prop_assert_eq!(sut.contains_key(&pool[i]), model.contains_key(&pool[i]));
            }
            Op::Iterate => {
                let s: BTreeSet<_> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let m: BTreeSet<_> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s, m);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        let visible = pool
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|k| sut.get(k).is_some())
            .count();
        prop_assert_eq!(visible, sut.len());
        prop_assert_eq!(destroyed.get(), displaced);
        prop_assert!(sut.capacity().is_power_of_two());
    }

    let live = sut.len();
    drop(sut);
    prop_assert_eq!(destroyed.get(), displaced + live);
    Ok(())
}

fn counting_table(
    hash: impl Fn(&String) -> u32 + 'static,
    initial_capacity: usize,
) -> (HashTable<String, u32>, Rc<Cell<usize>>) {
    let destroyed = Rc::new(Cell::new(0));
    let counter = destroyed.clone();
    let table = HashTable::<String, u32>::builder()
        .hash_fn(hash)
        .eq_fn(string_equal)
        .value_destructor(move |_| counter.set(counter.get() + 1))
        .initial_capacity(initial_capacity)
        .build()
        .expect("construct table");
    (table, destroyed)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let (sut, destroyed) = counting_table(string_hash, 128);
        run(sut, destroyed, &pool, ops)?;
    }
}

// Small initial capacity so runs cross several growth thresholds.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_across_growth((pool, ops) in arb_scenario()) {
        let (sut, destroyed) = counting_table(string_hash, 2);
        run(sut, destroyed, &pool, ops)?;
    }
}

// Worst case: every key lands in bucket zero, so all resolution happens
// by walking and splicing a single chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let (sut, destroyed) = counting_table(|_| 0, 4);
        run(sut, destroyed, &pool, ops)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_chain_lengths_sum_to_len(keys in proptest::collection::btree_set(any::<u32>(), 0..300)) {
        let mut t: HashTable<u32, u32> = HashTable::new(|k: &u32| *k, |a: &u32, b: &u32| a == b)
            .expect("construct table");
        for &k in &keys {
            // Value 1 keeps (0, 1) from being the null pair.
            t.put(k, 1).unwrap();
        }
        let total: usize = (0..t.capacity()).map(|b| t.chain_len(b)).sum();
        prop_assert_eq!(total, keys.len());
        prop_assert_eq!(t.len(), keys.len());
        for &k in &keys {
            prop_assert_eq!(t.bucket_of_key(&k), k as usize & (t.capacity() - 1));
        }
    }
}
