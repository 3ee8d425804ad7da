//! Storage cells: bucket roots, chain nodes and the occupancy-tagged hash.

use core::num::NonZeroU64;

slotmap::new_key_type! {
    /// Arena key of an overflow node in some bucket's chain.
    pub(crate) struct NodeKey;
}

const OCCUPIED: NonZeroU64 = match NonZeroU64::new(1 << 32) {
    Some(bit) => bit,
    None => unreachable!(),
};

/// The caller's 32-bit hash with an occupancy bit set above it.
///
/// The tag word is never zero, so `Option<Entry<K, V>>` keeps its `None`
/// in the zero niche: a vacant root is a zero tag word and needs no extra
/// field. The caller's hash is kept intact in the low 32 bits, which lets a
/// rehash place the entry without calling back into the hash function.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct HashTag(NonZeroU64);

impl HashTag {
    #[inline]
    pub(crate) fn new(hash: u32) -> Self {
        HashTag(OCCUPIED | u64::from(hash))
    }

    /// The hash as the caller's hash function produced it.
    #[inline]
    pub(crate) fn hash(self) -> u32 {
        self.0.get() as u32
    }

    #[inline]
    pub(crate) fn bucket(self, mask: usize) -> usize {
        self.hash() as usize & mask
    }
}

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) tag: HashTag,
}

/// Array-resident root of one bucket.
///
/// A vacant root never has a continuation: chained nodes always hold an
/// entry and removal at the root pulls the first node up.
#[derive(Debug)]
pub(crate) struct Bucket<K, V> {
    pub(crate) entry: Option<Entry<K, V>>,
    pub(crate) next: Option<NodeKey>,
}

impl<K, V> Bucket<K, V> {
    #[inline]
    pub(crate) const fn vacant() -> Self {
        Bucket {
            entry: None,
            next: None,
        }
    }

    #[inline]
    pub(crate) fn is_vacant(&self) -> bool {
        self.entry.is_none()
    }
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self::vacant()
    }
}

/// Overflow record linked after a bucket root.
#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) entry: Entry<K, V>,
    pub(crate) next: Option<NodeKey>,
}
