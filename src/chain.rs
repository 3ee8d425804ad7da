//! Chain walking: locating, placing and unlinking entries in one bucket.
//!
//! A bucket is its array-resident root followed by zero or more arena
//! nodes linked through `next`. Every routine here works on the split
//! borrows of the table's storage so the same code serves both the live
//! table and a rehash target under construction.

use crate::slot::{Bucket, Entry, Node, NodeKey};
use slotmap::SlotMap;

pub(crate) type Arena<K, V> = SlotMap<NodeKey, Node<K, V>>;

/// Where a matching entry sits within its bucket.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Position {
    Root(usize),
    /// A chained node, with the link that points at it.
    Node { at: NodeKey, prev: Link },
}

/// The owner of a `next` pointer: a bucket root or an earlier node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Link {
    Root(usize),
    Node(NodeKey),
}

/// Scan the bucket for the first entry whose key `eq` accepts.
///
/// Only key equality decides a match; the stored hash is not consulted.
pub(crate) fn find<K, V>(
    roots: &[Bucket<K, V>],
    nodes: &Arena<K, V>,
    bucket: usize,
    mut eq: impl FnMut(&K) -> bool,
) -> Option<Position> {
    let root = &roots[bucket];
    // A vacant root has no continuation.
    let entry = root.entry.as_ref()?;
    if eq(&entry.key) {
        return Some(Position::Root(bucket));
    }

    let mut prev = Link::Root(bucket);
    let mut cursor = root.next;
    while let Some(at) = cursor {
        let node = &nodes[at];
        if eq(&node.entry.key) {
            return Some(Position::Node { at, prev });
        }
        prev = Link::Node(at);
        cursor = node.next;
    }
    None
}

pub(crate) fn entry<'a, K, V>(
    roots: &'a [Bucket<K, V>],
    nodes: &'a Arena<K, V>,
    pos: Position,
) -> Option<&'a Entry<K, V>> {
    match pos {
        Position::Root(i) => roots[i].entry.as_ref(),
        Position::Node { at, .. } => nodes.get(at).map(|n| &n.entry),
    }
}

pub(crate) fn entry_mut<'a, K, V>(
    roots: &'a mut [Bucket<K, V>],
    nodes: &'a mut Arena<K, V>,
    pos: Position,
) -> Option<&'a mut Entry<K, V>> {
    match pos {
        Position::Root(i) => roots[i].entry.as_mut(),
        Position::Node { at, .. } => nodes.get_mut(at).map(|n| &mut n.entry),
    }
}

/// Store a key known to be absent from its bucket.
///
/// A vacant root takes the entry directly; otherwise a new node is linked
/// immediately after the root, ahead of older collisions.
pub(crate) fn place<K, V>(
    roots: &mut [Bucket<K, V>],
    nodes: &mut Arena<K, V>,
    mask: usize,
    entry: Entry<K, V>,
) {
    let root = &mut roots[entry.tag.bucket(mask)];
    if root.is_vacant() {
        debug_assert!(root.next.is_none(), "vacant root with a chain");
        root.entry = Some(entry);
        return;
    }
    let at = nodes.insert(Node {
        entry,
        next: root.next,
    });
    root.next = Some(at);
}

/// Move an existing node into its bucket of the rehash target `roots`,
/// returning the node's link in the chain it came from.
///
/// A vacant root takes the entry and the node is freed; otherwise the node
/// is spliced in right after the root. Never allocates.
pub(crate) fn rechain<K, V>(
    roots: &mut [Bucket<K, V>],
    nodes: &mut Arena<K, V>,
    mask: usize,
    at: NodeKey,
) -> Option<NodeKey> {
    let node = nodes.get_mut(at)?;
    let old_next = node.next;
    let root = &mut roots[node.entry.tag.bucket(mask)];
    if root.is_vacant() {
        if let Some(Node { entry, .. }) = nodes.remove(at) {
            root.entry = Some(entry);
        }
    } else {
        node.next = root.next;
        root.next = Some(at);
    }
    old_next
}

/// Detach the entry at `pos` and hand it back, keeping the rest of the
/// chain reachable.
///
/// Removing a root with a continuation pulls the first node's entry up
/// into the root and frees that node instead.
pub(crate) fn unlink<K, V>(
    roots: &mut [Bucket<K, V>],
    nodes: &mut Arena<K, V>,
    pos: Position,
) -> Option<Entry<K, V>> {
    match pos {
        Position::Root(i) => {
            let root = &mut roots[i];
            let taken = root.entry.take()?;
            match root.next.and_then(|first| nodes.remove(first)) {
                Some(Node { entry, next }) => {
                    root.entry = Some(entry);
                    root.next = next;
                }
                None => root.next = None,
            }
            Some(taken)
        }
        Position::Node { at, prev } => {
            let node = nodes.remove(at)?;
            match prev {
                Link::Root(i) => roots[i].next = node.next,
                Link::Node(k) => {
                    if let Some(p) = nodes.get_mut(k) {
                        p.next = node.next;
                    }
                }
            }
            Some(node.entry)
        }
    }
}

/// Number of entries in a bucket, root included.
#[cfg(test)]
pub(crate) fn len<K, V>(roots: &[Bucket<K, V>], nodes: &Arena<K, V>, bucket: usize) -> usize {
    let root = &roots[bucket];
    if root.is_vacant() {
        return 0;
    }
    let mut n = 1;
    let mut cursor = root.next;
    while let Some(at) = cursor {
        n += 1;
        cursor = nodes[at].next;
    }
    n
}
