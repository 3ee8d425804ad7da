//! HashTable: bucket array, chaining and growth.

use crate::chain::{self, Arena};
use crate::error::{ConstructionError, PutError};
use crate::keys::Opaque;
use crate::slot::{Bucket, Entry, HashTag};
use core::fmt;
use slotmap::SlotMap;
use std::collections::TryReserveError;

/// Caller-supplied key hash.
pub type HashFn<K> = Box<dyn Fn(&K) -> u32>;
/// Caller-supplied key equality.
pub type EqFn<K> = Box<dyn Fn(&K, &K) -> bool>;
/// Receives ownership of a displaced key or value.
pub type Destructor<T> = Box<dyn FnMut(T)>;

/// Bucket count of a freshly built table.
pub const INITIAL_CAPACITY: usize = 128;

/// Load, in percent of the bucket count, at which the table doubles.
pub const FILL_PERCENT: usize = 60;

#[inline]
fn growth_threshold(capacity: usize) -> usize {
    ((capacity as u128 * FILL_PERCENT as u128) / 100) as usize
}

fn alloc_buckets<K, V>(capacity: usize) -> Result<Vec<Bucket<K, V>>, TryReserveError> {
    let mut buckets = Vec::new();
    buckets.try_reserve_exact(capacity)?;
    buckets.resize_with(capacity, Bucket::vacant);
    Ok(buckets)
}

struct Destructors<K, V> {
    key: Option<Destructor<K>>,
    value: Option<Destructor<V>>,
}

impl<K, V> Destructors<K, V> {
    /// Release a displaced pair. Without a configured destructor the item
    /// is simply dropped.
    fn release(&mut self, key: K, value: V) {
        match self.key.as_mut() {
            Some(d) => d(key),
            None => drop(key),
        }
        match self.value.as_mut() {
            Some(d) => d(value),
            None => drop(value),
        }
    }
}

/// A separately chained hash map over caller-defined hashing and equality.
///
/// Buckets live in a power-of-two array indexed by `hash & mask`; colliding
/// entries hang off the bucket root in a singly linked chain. The table
/// doubles once its entry count reaches 60% of the bucket count and never
/// shrinks.
///
/// When destructors are configured they receive every key and value the
/// table displaces: on overwrite, on `remove`, and when the table is
/// dropped. They are never called anywhere else.
///
/// Not synchronized; the boxed collaborators keep the table `!Send` and
/// `!Sync`.
///
/// ```
/// use chain_hashmap::{string_equal, string_hash, HashTable};
///
/// let mut m: HashTable<&str, usize> = HashTable::new(string_hash, string_equal)?;
/// m.put("charlie", 12)?;
/// m.put("bob", 38)?;
/// assert_eq!(m.get(&"charlie"), Some(&12));
/// assert!(m.remove(&"bob"));
/// assert_eq!(m.len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct HashTable<K, V> {
    buckets: Vec<Bucket<K, V>>,
    nodes: Arena<K, V>,
    mask: usize,
    len: usize,
    threshold: usize,
    hash: HashFn<K>,
    eq: EqFn<K>,
    destructors: Destructors<K, V>,
}

/// Staged configuration for a `HashTable`.
///
/// `hash_fn` and `eq_fn` are required; `build` reports whichever is
/// missing.
pub struct Builder<K, V> {
    hash: Option<HashFn<K>>,
    eq: Option<EqFn<K>>,
    key_destructor: Option<Destructor<K>>,
    value_destructor: Option<Destructor<V>>,
    capacity: usize,
}

impl<K, V> Default for Builder<K, V> {
    fn default() -> Self {
        Self {
            hash: None,
            eq: None,
            key_destructor: None,
            value_destructor: None,
            capacity: INITIAL_CAPACITY,
        }
    }
}

impl<K, V> Builder<K, V> {
    pub fn hash_fn(mut self, hash: impl Fn(&K) -> u32 + 'static) -> Self {
        self.hash = Some(Box::new(hash));
        self
    }

    pub fn eq_fn(mut self, eq: impl Fn(&K, &K) -> bool + 'static) -> Self {
        self.eq = Some(Box::new(eq));
        self
    }

    pub fn key_destructor(mut self, destructor: impl FnMut(K) + 'static) -> Self {
        self.key_destructor = Some(Box::new(destructor));
        self
    }

    pub fn value_destructor(mut self, destructor: impl FnMut(V) + 'static) -> Self {
        self.value_destructor = Some(Box::new(destructor));
        self
    }

    /// Initial bucket count, rounded up to a power of two.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build(self) -> Result<HashTable<K, V>, ConstructionError> {
        let hash = self.hash.ok_or(ConstructionError::MissingHashFn)?;
        let eq = self.eq.ok_or(ConstructionError::MissingEqFn)?;
        let capacity = self
            .capacity
            .max(1)
            .checked_next_power_of_two()
            .ok_or(ConstructionError::AllocationFailure)?;
        let buckets = alloc_buckets(capacity).map_err(|e| {
            log::debug!("Failed to allocate {capacity} hash table buckets: {e}");
            ConstructionError::from(e)
        })?;

        Ok(HashTable {
            buckets,
            nodes: SlotMap::with_key(),
            mask: capacity - 1,
            len: 0,
            threshold: growth_threshold(capacity),
            hash,
            eq,
            destructors: Destructors {
                key: self.key_destructor,
                value: self.value_destructor,
            },
        })
    }
}

impl<K, V> HashTable<K, V> {
    /// Table without destructors: displaced keys and values are dropped.
    pub fn new(
        hash: impl Fn(&K) -> u32 + 'static,
        eq: impl Fn(&K, &K) -> bool + 'static,
    ) -> Result<Self, ConstructionError> {
        Self::builder().hash_fn(hash).eq_fn(eq).build()
    }

    /// Table that hands every displaced key and value to the given
    /// destructors, where present.
    pub fn with_destructors(
        hash: impl Fn(&K) -> u32 + 'static,
        eq: impl Fn(&K, &K) -> bool + 'static,
        key_destructor: Option<Destructor<K>>,
        value_destructor: Option<Destructor<V>>,
    ) -> Result<Self, ConstructionError> {
        let mut builder = Self::builder().hash_fn(hash).eq_fn(eq);
        builder.key_destructor = key_destructor;
        builder.value_destructor = value_destructor;
        builder.build()
    }

    pub fn builder() -> Builder<K, V> {
        Builder::default()
    }

    /// Number of stored entries, roots and chained nodes alike.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count; always a power of two.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_of(&self, key: &K) -> usize {
        (self.hash)(key) as usize & self.mask
    }

    fn position(&self, key: &K) -> Option<chain::Position> {
        let bucket = self.bucket_of(key);
        chain::find(&self.buckets, &self.nodes, bucket, |k| (self.eq)(k, key))
    }

    /// Store `value` under `key`, replacing any entry whose key is equal.
    ///
    /// A pair where both key and value are null carries nothing and is
    /// accepted without touching the table. On error the table is exactly
    /// as it was before the call.
    pub fn put(&mut self, key: K, value: V) -> Result<(), PutError>
    where
        K: Opaque,
        V: Opaque,
    {
        if key.is_null() && value.is_null() {
            return Ok(());
        }

        let hash = (self.hash)(&key);
        let tag = HashTag::new(hash);
        let bucket = hash as usize & self.mask;
        let found = chain::find(&self.buckets, &self.nodes, bucket, |k| (self.eq)(k, &key));

        let slot = match found {
            Some(pos) => chain::entry_mut(&mut self.buckets, &mut self.nodes, pos),
            None => None,
        };
        if let Some(slot) = slot {
            let old = core::mem::replace(slot, Entry { key, value, tag });
            self.destructors.release(old.key, old.value);
            return Ok(());
        }

        // Every allocation happens before the table is touched, so a
        // failure leaves it as it was.
        if self.len + 1 >= self.threshold {
            self.grow()?;
        }
        if !self.buckets[hash as usize & self.mask].is_vacant() {
            self.nodes.try_reserve(1).map_err(|e| {
                log::debug!("Failed to allocate a chain node: {e}");
                PutError::from(e)
            })?;
        }
        chain::place(
            &mut self.buckets,
            &mut self.nodes,
            self.mask,
            Entry { key, value, tag },
        );
        self.len += 1;
        Ok(())
    }

    /// Look up the value stored under an equal key.
    ///
    /// Only the bucket selected by the key's hash is scanned; within it,
    /// key equality alone decides the match.
    pub fn get(&self, key: &K) -> Option<&V> {
        let pos = self.position(key)?;
        chain::entry(&self.buckets, &self.nodes, pos).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let pos = self.position(key)?;
        chain::entry_mut(&mut self.buckets, &mut self.nodes, pos).map(|e| &mut e.value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.position(key).is_some()
    }

    /// Delete the entry stored under an equal key, passing the displaced
    /// key and value to the destructors. Returns whether anything was
    /// removed.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.remove_entry(key) {
            Some((k, v)) => {
                self.destructors.release(k, v);
                true
            }
            None => false,
        }
    }

    /// Like `remove`, but returns the stored pair to the caller instead of
    /// destroying it.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let pos = self.position(key)?;
        let entry = chain::unlink(&mut self.buckets, &mut self.nodes, pos)?;
        self.len -= 1;
        Some((entry.key, entry.value))
    }

    /// Double the bucket array and redistribute every entry.
    ///
    /// Entries move by their stored hash; neither the hash function nor the
    /// destructors run. The new array and enough node slots for every entry
    /// plus one more insertion are reserved before anything moves, so
    /// failure leaves the table as it was and the rehash itself never
    /// allocates.
    fn grow(&mut self) -> Result<(), PutError> {
        let old_capacity = self.capacity();
        let capacity = old_capacity
            .checked_mul(2)
            .ok_or(PutError::AllocationFailure)?;
        let buckets = alloc_buckets(capacity).map_err(|e| {
            log::debug!("Failed to grow hash table to {capacity} buckets: {e}");
            PutError::from(e)
        })?;
        self.nodes
            .try_reserve(self.len + 1 - self.nodes.len())
            .map_err(|e| {
                log::debug!("Failed to reserve chain nodes for {} entries: {e}", self.len + 1);
                PutError::from(e)
            })?;

        let mask = capacity - 1;
        let old_buckets = core::mem::replace(&mut self.buckets, buckets);
        for root in old_buckets {
            let mut cursor = root.next;
            if let Some(entry) = root.entry {
                chain::place(&mut self.buckets, &mut self.nodes, mask, entry);
            }
            while let Some(at) = cursor {
                cursor = chain::rechain(&mut self.buckets, &mut self.nodes, mask, at);
            }
        }

        self.mask = mask;
        self.threshold = growth_threshold(capacity);
        log::trace!(
            "Grew hash table from {old_capacity} to {capacity} buckets ({} entries)",
            self.len
        );
        Ok(())
    }

    /// Every stored pair, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.buckets
            .iter()
            .filter_map(|b| b.entry.as_ref())
            .chain(self.nodes.values().map(|n| &n.entry))
            .map(|e| (&e.key, &e.value))
    }

    #[cfg(test)]
    pub(crate) fn chain_len(&self, bucket: usize) -> usize {
        chain::len(&self.buckets, &self.nodes, bucket)
    }

    #[cfg(test)]
    pub(crate) fn bucket_of_key(&self, key: &K) -> usize {
        self.bucket_of(key)
    }
}

impl<K, V> Drop for HashTable<K, V> {
    fn drop(&mut self) {
        if self.destructors.key.is_none() && self.destructors.value.is_none() {
            return;
        }
        // Chained nodes first, then the roots they hung off.
        for (_, node) in self.nodes.drain() {
            self.destructors.release(node.entry.key, node.entry.value);
        }
        for bucket in self.buckets.iter_mut() {
            if let Some(entry) = bucket.entry.take() {
                self.destructors.release(entry.key, entry.value);
            }
        }
    }
}

impl<K, V> fmt::Debug for HashTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
