//! chain-hashmap: a single-threaded, separately chained hash map with
//! caller-supplied hashing, equality and optional ownership of entries.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: amortized O(1) put/get/remove over opaque keys and values,
//!   where the caller decides how keys hash and compare, and optionally
//!   hands the table the job of destroying what it displaces.
//! - Layers:
//!   - `slot`: storage cells. A bucket root lives in the array; overflow
//!     nodes live in a `slotmap` arena and are linked by generational keys.
//!   - `chain`: the walker shared by every operation (find, place,
//!     unlink) working on split borrows of the storage.
//!   - `hash_table`: the public `HashTable`, its `Builder`, growth and
//!     destruction.
//!   - `keys`: the `Opaque` word view of keys/values and the stock
//!     identity and string collaborators.
//!
//! Occupancy
//! - Every stored entry carries a `HashTag`: the caller's 32-bit hash with
//!   an occupancy bit set above it. The tag word is never zero, so a vacant
//!   root (`None`) occupies the zero niche and costs no extra field. A hash
//!   of zero is therefore an ordinary, storable hash.
//!
//! Growth
//! - Bucket count starts at 128 and doubles when a fresh insertion would
//!   bring the entry count to 60% of it. The larger array and the node
//!   slots the rehash needs are reserved fallibly before anything moves;
//!   chain nodes are relinked in place and entries are redistributed by their
//!   stored hash, so the caller's hash function is never invoked during a
//!   rehash. The table never shrinks.
//!
//! Ownership
//! - Destructors, when configured, receive displaced keys and values on
//!   overwrite, on `remove`, and on drop of the table, each exactly once.
//!   `remove_entry` hands the pair back instead. Without destructors,
//!   displaced items are dropped normally.
//!
//! Notes and non-goals
//! - Not thread-safe: the boxed collaborators make the table `!Send` and
//!   `!Sync`; external synchronization is the caller's business.
//! - Iteration order is unspecified.
//! - Matching is by key equality alone once the bucket is chosen; a hash
//!   function that disagrees with the equality predicate loses entries.

mod chain;
pub mod error;
pub mod hash_table;
mod hash_table_proptest;
pub mod keys;
mod slot;

// Public surface
pub use error::{ConstructionError, PutError};
pub use hash_table::{
    Builder, Destructor, EqFn, HashFn, HashTable, FILL_PERCENT, INITIAL_CAPACITY,
};
pub use keys::{direct_equal, direct_hash, string_equal, string_hash, Opaque};
