//! ChainHashMap: separately chained hash table over an entry arena.

use crate::buckets::Buckets;
use crate::cursor::{Cursor, Iter, IterMut, Keys, Values, ValuesMut};
use crate::error::MapError;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, BuildHasherDefault, Hash};
use core::sync::atomic::{AtomicU64, Ordering};
use slotmap::DefaultKey;
use std::collections::hash_map::DefaultHasher;

/// Bucket count used by `ChainHashMap::new`.
pub const DEFAULT_CAPACITY: usize = 10;

/// An insert that pushes `len / capacity` above this doubles the capacity.
pub const MAX_LOAD_FACTOR: f64 = 1.5;

type DefaultBuildHasher = BuildHasherDefault<DefaultHasher>;

// Owner ids are never reused, so a handle can only ever match the map
// incarnation that issued it.
static NEXT_OWNER: AtomicU64 = AtomicU64::new(0);

fn next_owner() -> u64 {
    NEXT_OWNER.fetch_add(1, Ordering::Relaxed)
}

/// Stable reference to one entry. Survives rehashes; stops resolving once the
/// entry is removed, and never aliases an entry inserted later.
///
/// A handle is stamped with the identity of the map that issued it. It
/// resolves to `None` against any other map, including clones of the issuer
/// and the issuer itself after `clone_from` replaced its contents.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle {
    owner: u64,
    key: DefaultKey,
}

impl Handle {
    pub(crate) fn new(owner: u64, key: DefaultKey) -> Self {
        Handle { owner, key }
    }

    pub fn key<'a, K, V>(&self, map: &'a ChainHashMap<K, V>) -> Option<&'a K> {
        let k = map.check_owner(*self)?;
        map.buckets.node(k).map(|n| &n.key)
    }

    pub fn value<'a, K, V>(&self, map: &'a ChainHashMap<K, V>) -> Option<&'a V> {
        let k = map.check_owner(*self)?;
        map.buckets.node(k).map(|n| &n.value)
    }

    pub fn value_mut<'a, K, V>(&self, map: &'a mut ChainHashMap<K, V>) -> Option<&'a mut V> {
        let k = map.check_owner(*self)?;
        map.buckets.node_mut(k).map(|n| &mut n.value)
    }
}

/// Hash map with separate chaining.
///
/// Inserting a key that is already present leaves the stored value alone; use
/// [`at_mut`](Self::at_mut), [`update`](Self::update) or
/// [`erase`](Self::erase) followed by [`insert`](Self::insert) to change it.
pub struct ChainHashMap<K, V> {
    buckets: Buckets<K, V>,
    hasher: DefaultBuildHasher,
    cursor: Cursor,
    owner: u64,
}

impl<K, V> ChainHashMap<K, V> {
    /// Empty map with [`DEFAULT_CAPACITY`] buckets.
    pub fn new() -> Self {
        Self::from_buckets(Buckets::new(DEFAULT_CAPACITY))
    }

    /// Empty map with `capacity` buckets. Fails with
    /// [`MapError::InvalidCapacity`] when `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, MapError> {
        if capacity == 0 {
            return Err(MapError::InvalidCapacity);
        }
        Ok(Self::from_buckets(Buckets::new(capacity)))
    }

    fn from_buckets(buckets: Buckets<K, V>) -> Self {
        Self {
            buckets,
            hasher: DefaultBuildHasher::default(),
            cursor: Cursor::new(),
            owner: next_owner(),
        }
    }

    /// Arena key behind `handle`, if this map issued it.
    #[inline]
    fn check_owner(&self, handle: Handle) -> Option<DefaultKey> {
        (handle.owner == self.owner).then_some(handle.key)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }
    pub fn is_empty(&self) -> bool {
        self.buckets.len() == 0
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    /// Drops every entry. Capacity is unchanged; the cursor restarts.
    pub fn clear(&mut self) {
        tracing::trace!(len = self.len(), "clearing map");
        self.buckets.clear();
        self.cursor.reset();
    }

    /// Rebuilds the bucket array with `new_capacity` buckets. May shrink.
    pub fn resize(&mut self, new_capacity: usize) -> Result<(), MapError> {
        if new_capacity == 0 {
            return Err(MapError::InvalidCapacity);
        }
        self.rehash(new_capacity);
        Ok(())
    }

    fn rehash(&mut self, new_capacity: usize) {
        if new_capacity == 0 || new_capacity == self.capacity() {
            return;
        }
        tracing::debug!(
            from = self.capacity(),
            to = new_capacity,
            len = self.len(),
            "rehashing buckets"
        );
        self.buckets.relink(new_capacity);
        self.cursor.reset();
    }

    fn grow_if_needed(&mut self) {
        if self.load_factor() > MAX_LOAD_FACTOR {
            let capacity = self.capacity();
            tracing::trace!(len = self.len(), capacity, "load factor exceeded");
            self.rehash(capacity * 2);
        }
    }

    /// Removes the entry behind `handle`, returning its key and value.
    pub fn remove(&mut self, handle: Handle) -> Option<(K, V)> {
        let node = self.buckets.unlink(self.check_owner(handle)?)?;
        self.cursor.reset();
        Some((node.key, node.value))
    }

    /// Rewinds the table's cursor to before the first bucket.
    pub fn begin(&mut self) {
        self.cursor.reset();
    }

    /// Advances the table's cursor and returns the entry it lands on, or
    /// `None` once every bucket has been visited (and on every call after).
    ///
    /// Erase, remove, clear, `clone_from` and any rehash rewind the cursor,
    /// so the next call after one of them starts again from bucket 0. An
    /// insert that does not rehash keeps the position; whether the new entry
    /// shows up in the ongoing traversal depends on where it was linked.
    pub fn next_entry(&mut self) -> Option<(&K, &V)> {
        let k = self.cursor.advance(&self.buckets)?;
        self.buckets.node(k).map(|n| (&n.key, &n.value))
    }

    /// Entries in bucket order, the same order `next_entry` uses.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.buckets)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Entries with mutable values, in arena order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.buckets.nodes_mut(),
        }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

impl<K, V> ChainHashMap<K, V>
where
    K: Eq + Hash,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Inserts `key` unless it is already present. Returns the new entry's
    /// handle, or `None` when the key existed (its value is not replaced).
    pub fn insert(&mut self, key: K, value: V) -> Option<Handle> {
        self.insert_with(key, || value)
    }

    /// Like `insert`, but only runs `default` when the key is absent.
    pub fn insert_with<F>(&mut self, key: K, default: F) -> Option<Handle>
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        if self.buckets.find(hash, &key).is_some() {
            return None;
        }
        let k = self.buckets.push_front(key, default(), hash);
        self.grow_if_needed();
        Some(Handle::new(self.owner, k))
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.buckets
            .find(self.make_hash(q), q)
            .map(|k| Handle::new(self.owner, k))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.buckets.find(self.make_hash(q), q)?;
        self.buckets.node(k).map(|n| &n.value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.buckets.find(self.make_hash(q), q)?;
        self.buckets.node_mut(k).map(|n| &mut n.value)
    }

    /// Value stored for `q`, or [`MapError::KeyNotFound`].
    pub fn at<Q>(&self, q: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(MapError::KeyNotFound)
    }

    /// Mutable access to the value stored for `q`, or
    /// [`MapError::KeyNotFound`].
    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<&mut V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_mut(q).ok_or(MapError::KeyNotFound)
    }

    /// Runs `f` on the value stored for `q` and returns its result.
    pub fn update<Q, F, R>(&mut self, q: &Q, f: F) -> Result<R, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&mut V) -> R,
    {
        self.at_mut(q).map(f)
    }

    /// Removes `q` and returns its value. Never shrinks the bucket array.
    pub fn erase<Q>(&mut self, q: &Q) -> Result<V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.find(q).ok_or(MapError::KeyNotFound)?;
        self.remove(h).map(|(_, v)| v).ok_or(MapError::KeyNotFound)
    }
}

impl<K, V> Default for ChainHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for ChainHashMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            hasher: self.hasher.clone(),
            cursor: Cursor::new(),
            owner: next_owner(),
        }
    }

    /// Replaces `self` with a deep copy of `source`, capacity included.
    /// Handles issued by `self` before the call stop resolving.
    fn clone_from(&mut self, source: &Self) {
        self.buckets.clone_from(&source.buckets);
        self.cursor.reset();
        self.owner = next_owner();
    }
}

impl<K, V> PartialEq for ChainHashMap<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V> Eq for ChainHashMap<K, V>
where
    K: Eq + Hash,
    V: Eq,
{
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ChainHashMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Extend<(K, V)> for ChainHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Keys already present keep their current value.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ChainHashMap<K, V>
where
    K: Eq + Hash,
{
    /// The first occurrence of a key wins.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V> IntoIterator for &'a ChainHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
impl<K, V> ChainHashMap<K, V> {
    pub(crate) fn assert_consistent(&self) {
        self.buckets.assert_consistent();
    }
}
