//! chain-hashmap: a single-threaded hash map built on separate chaining,
//! with stable entry handles and a resumable table-owned cursor.
//!
//! Internal Design:
//!
//! Summary
//! - `Buckets<K, V>`: a `Vec` of chain heads plus a `slotmap` arena that
//!   owns every entry. Chains are singly linked through generational arena
//!   keys, so unlinking and rehashing rewrite links without moving or
//!   recreating entries.
//! - `Cursor`: a (bucket, entry) position. Drives both the
//!   `begin`/`next_entry` protocol on the map and the borrowing iterators.
//! - `ChainHashMap<K, V>`: public API. Hashing, the no-overwrite insert
//!   policy, load-factor growth, copy and equality semantics.
//!
//! Constraints
//! - Single-threaded; no internal synchronization.
//! - Keys are unique. Inserting a present key is a silent no-op that keeps
//!   the stored value.
//! - Capacity is never zero. An insert that pushes `len / capacity` above
//!   `MAX_LOAD_FACTOR` doubles it; nothing shrinks implicitly.
//! - Keys are immutable post-insert; there is no `key_mut`.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its `u64` hash, computed once with
//!   `BuildHasherDefault<DefaultHasher>`. Rehashing uses the stored hash and
//!   never calls `K: Hash`.
//! - Every entry in bucket `i` satisfies `hash % capacity == i`.
//!
//! Iteration
//! - Order is bucket index, then chain order (newest first). It depends on
//!   hashes and capacity, not on insertion order.
//! - The map's own cursor is rewound by erase, remove, clear, `clone_from`
//!   and rehashing; the next `next_entry` then starts from bucket 0. Stale
//!   positions can never read freed entries because arena keys are
//!   generational.
//!
//! Copies and equality
//! - `Clone` copies the arena wholesale: same capacity, same chain order,
//!   no shared entries. Each clone and each `clone_from` destination gets a
//!   fresh owner id, so handles never resolve across copies.
//! - `==` compares length and per-key values only; capacity and layout are
//!   irrelevant.

mod buckets;
pub mod chain_hash_map;
mod chain_hash_map_proptest;
mod cursor;
mod error;

// Public surface
pub use chain_hash_map::{ChainHashMap, Handle, DEFAULT_CAPACITY, MAX_LOAD_FACTOR};
pub use cursor::{Iter, IterMut, Keys, Values, ValuesMut};
pub use error::MapError;
