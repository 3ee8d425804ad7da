// HashTable behavior when the allocator refuses memory.
//
// A failing global allocator is armed per thread with a budget of
// allocations that may still succeed. Core invariants exercised:
// - A put that needs a chain node it cannot get reports AllocationFailure.
// - A put that needs a growth it cannot complete reports AllocationFailure,
//   whether the bucket array or the node reservation is refused.
// - After any such failure, len, capacity and every stored entry are as
//   they were, no destructor has run, and a later put succeeds.
use chain_hashmap::{direct_equal, direct_hash, HashTable, PutError};
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::rc::Rc;

struct FailingAlloc;

thread_local! {
    // `None` allows everything; `Some(n)` lets n more allocations through.
    static BUDGET: Cell<Option<usize>> = const { Cell::new(None) };
}

fn permit() -> bool {
    BUDGET
        .try_with(|b| match b.get() {
            None => true,
            Some(0) => false,
            Some(n) => {
                b.set(Some(n - 1));
                true
            }
        })
        .unwrap_or(true)
}

unsafe impl GlobalAlloc for FailingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if permit() {
            System.alloc(layout)
        } else {
            std::ptr::null_mut()
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static ALLOC: FailingAlloc = FailingAlloc;

struct Disarm;

impl Drop for Disarm {
    fn drop(&mut self) {
        BUDGET.with(|b| b.set(None));
    }
}

fn with_alloc_budget<R>(allowed: usize, f: impl FnOnce() -> R) -> R {
    BUDGET.with(|b| b.set(Some(allowed)));
    let _disarm = Disarm;
    f()
}

fn counted(hash: fn(&usize) -> u32) -> (HashTable<usize, usize>, Rc<Cell<usize>>) {
    let destroyed = Rc::new(Cell::new(0));
    let c = destroyed.clone();
    let table = HashTable::<usize, usize>::builder()
        .hash_fn(hash)
        .eq_fn(direct_equal)
        .key_destructor(|_| {})
        .value_destructor(move |_| c.set(c.get() + 1))
        .build()
        .unwrap();
    (table, destroyed)
}

fn constant(_: &usize) -> u32 {
    7
}

// Fills the table up to one short of the 60% threshold at 128 buckets,
// with every key in its own root.
fn just_below_threshold() -> (HashTable<usize, usize>, Rc<Cell<usize>>) {
    let (mut m, destroyed) = counted(direct_hash);
    for k in 1..=75 {
        m.put(k, k * 10).unwrap();
    }
    assert_eq!(m.capacity(), 128);
    (m, destroyed)
}

fn assert_untouched(m: &HashTable<usize, usize>, destroyed: &Cell<usize>) {
    assert_eq!(m.len(), 75);
    assert_eq!(m.capacity(), 128);
    for k in 1..=75 {
        assert_eq!(m.get(&k), Some(&(k * 10)), "key {k} after failed growth");
    }
    assert_eq!(m.get(&76), None);
    assert_eq!(destroyed.get(), 0);
}

// Test: chain node refused.
// Assumes: a constant hash, so the second key must be chained off the root.
// Verifies: put fails and the table still holds exactly the first entry.
#[test]
fn refused_chain_node_leaves_table_unchanged() {
    let (mut m, destroyed) = counted(constant);
    m.put(1, 1).unwrap();

    let res = with_alloc_budget(0, || m.put(2, 2));
    assert_eq!(res, Err(PutError::AllocationFailure));
    assert_eq!(m.len(), 1);
    assert_eq!(m.capacity(), 128);
    assert_eq!(m.get(&1), Some(&1));
    assert_eq!(m.get(&2), None);
    assert_eq!(destroyed.get(), 0);

    m.put(2, 2).unwrap();
    assert_eq!(m.get(&2), Some(&2));
    assert_eq!(m.len(), 2);
}

// Test: a root insert needs no allocation.
// Verifies: put into a vacant bucket succeeds even with a zero budget.
#[test]
fn vacant_root_insert_needs_no_allocation() {
    let (mut m, _) = counted(direct_hash);
    m.put(1, 1).unwrap();
    assert_eq!(with_alloc_budget(0, || m.put(2, 2)), Ok(()));
    assert_eq!(m.get(&2), Some(&2));
}

// Test: the larger bucket array is refused.
// Verifies: the 76th insertion fails without growing or losing entries.
#[test]
fn refused_bucket_array_leaves_table_unchanged() {
    let (mut m, destroyed) = just_below_threshold();

    let res = with_alloc_budget(0, || m.put(76, 760));
    assert_eq!(res, Err(PutError::AllocationFailure));
    assert_untouched(&m, &destroyed);
}

// Test: the bucket array is granted but the node reservation is refused.
// Verifies: the half-built growth is abandoned and the old array stays.
#[test]
fn refused_node_reservation_leaves_table_unchanged() {
    let (mut m, destroyed) = just_below_threshold();

    let res = with_alloc_budget(1, || m.put(76, 760));
    assert_eq!(res, Err(PutError::AllocationFailure));
    assert_untouched(&m, &destroyed);
}

// Test: recovery after a failed growth.
// Verifies: once memory is available the same put grows the table and
// every entry, old and new, resolves.
#[test]
fn growth_succeeds_after_refusal() {
    let (mut m, destroyed) = just_below_threshold();
    assert!(with_alloc_budget(0, || m.put(76, 760)).is_err());

    m.put(76, 760).unwrap();
    assert_eq!(m.capacity(), 256);
    assert_eq!(m.len(), 76);
    for k in 1..=76 {
        assert_eq!(m.get(&k), Some(&(k * 10)));
    }
    assert_eq!(destroyed.get(), 0);
}

// Test: a growth with chained entries.
// Assumes: all keys collide at 128 buckets, so the rehash walks and moves
// chain nodes.
// Verifies: once both reservations succeed, the rehash and the pending
// insertion complete with no further allocation.
#[test]
fn rehash_of_chains_allocates_only_up_front() {
    let (mut m, destroyed) = counted(direct_hash);
    // Keys 128, 256, ... share bucket 0 at capacity 128.
    for i in 1..=75 {
        m.put(i * 128, i).unwrap();
    }
    assert_eq!(m.capacity(), 128);

    // At most one allocation for the bucket array and one for the node
    // reservation.
    let res = with_alloc_budget(2, || m.put(76 * 128, 76));
    assert_eq!(res, Ok(()));
    assert_eq!(m.capacity(), 256);
    for i in 1..=76 {
        assert_eq!(m.get(&(i * 128)), Some(&i));
    }
    assert_eq!(destroyed.get(), 0);
}
