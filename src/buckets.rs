//! Buckets: the chain-head array plus the arena that owns every entry.
//!
//! Chains are singly linked through generational `slotmap` keys instead of
//! owned pointers. Unlinking or relinking an entry only rewrites `next`
//! fields and head slots; the entry itself never moves out of the arena
//! until it is removed.

use core::borrow::Borrow;
use slotmap::{DefaultKey, SlotMap};

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    next: Option<DefaultKey>,
}

#[derive(Debug)]
pub(crate) struct Buckets<K, V> {
    heads: Vec<Option<DefaultKey>>,
    nodes: SlotMap<DefaultKey, Node<K, V>>, // entry storage; chains link by key
}

/// Bucket selected by `hash` in a table of `capacity` buckets.
#[inline]
pub(crate) fn bucket_for(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}

/// Walks one chain from head to tail.
pub(crate) struct Chain<'a, K, V> {
    nodes: &'a SlotMap<DefaultKey, Node<K, V>>,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (DefaultKey, &'a Node<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let node = self.nodes.get(k)?;
        self.cur = node.next;
        Some((k, node))
    }
}

impl<K, V> Buckets<K, V> {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "bucket array must not be empty");
        Self {
            heads: vec![None; capacity],
            nodes: SlotMap::with_key(),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn head(&self, bucket: usize) -> Option<DefaultKey> {
        self.heads.get(bucket).copied().flatten()
    }

    #[inline]
    pub(crate) fn node(&self, k: DefaultKey) -> Option<&Node<K, V>> {
        self.nodes.get(k)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, k: DefaultKey) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(k)
    }

    #[inline]
    pub(crate) fn next_in_chain(&self, k: DefaultKey) -> Option<DefaultKey> {
        self.nodes.get(k).and_then(|n| n.next)
    }

    pub(crate) fn chain(&self, bucket: usize) -> Chain<'_, K, V> {
        Chain {
            nodes: &self.nodes,
            cur: self.head(bucket),
        }
    }

    /// Arena-order traversal with mutable values.
    pub(crate) fn nodes_mut(&mut self) -> slotmap::basic::IterMut<'_, DefaultKey, Node<K, V>> {
        self.nodes.iter_mut()
    }

    pub(crate) fn find<Q>(&self, hash: u64, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.chain(bucket_for(hash, self.capacity()))
            .find(|(_, n)| n.hash == hash && n.key.borrow() == q)
            .map(|(k, _)| k)
    }

    /// Stores a new entry as the head of its chain. The caller has already
    /// checked that the key is absent.
    pub(crate) fn push_front(&mut self, key: K, value: V, hash: u64) -> DefaultKey {
        let bucket = bucket_for(hash, self.capacity());
        let next = self.heads[bucket];
        let k = self.nodes.insert(Node {
            key,
            value,
            hash,
            next,
        });
        self.heads[bucket] = Some(k);
        k
    }

    /// Unlinks `target` from its chain and takes it out of the arena.
    pub(crate) fn unlink(&mut self, target: DefaultKey) -> Option<Node<K, V>> {
        let bucket = bucket_for(self.nodes.get(target)?.hash, self.capacity());
        let mut prev: Option<DefaultKey> = None;
        let mut cur = self.heads[bucket];
        while let Some(k) = cur {
            let next = self.nodes.get(k)?.next;
            if k == target {
                match prev {
                    Some(p) => {
                        if let Some(p) = self.nodes.get_mut(p) {
                            p.next = next;
                        }
                    }
                    None => self.heads[bucket] = next,
                }
                return self.nodes.remove(target);
            }
            prev = cur;
            cur = next;
        }
        None
    }

    /// Moves every entry into a fresh head array of `new_capacity` buckets.
    /// Entries keep their arena keys; only the links change.
    pub(crate) fn relink(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity > 0);
        let old = core::mem::replace(&mut self.heads, vec![None; new_capacity]);
        for head in old {
            let mut cur = head;
            while let Some(k) = cur {
                let Some(node) = self.nodes.get_mut(k) else {
                    break;
                };
                cur = node.next;
                let bucket = bucket_for(node.hash, new_capacity);
                node.next = self.heads[bucket];
                self.heads[bucket] = Some(k);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.heads.fill(None);
        self.nodes.clear();
    }

    /// Panics unless every chain entry sits in the bucket its hash selects and
    /// the chains together reach exactly the arena's entries.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut reached = 0usize;
        for bucket in 0..self.capacity() {
            for (_, node) in self.chain(bucket) {
                assert_eq!(bucket_for(node.hash, self.capacity()), bucket);
                reached += 1;
                assert!(reached <= self.len(), "chain cycle or foreign entry");
            }
        }
        assert_eq!(reached, self.len());
    }
}

impl<K: Clone, V: Clone> Clone for Buckets<K, V> {
    // Cloning the arena keeps every key and link, so chain order carries over.
    fn clone(&self) -> Self {
        Self {
            heads: self.heads.clone(),
            nodes: self.nodes.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.heads.clone_from(&source.heads);
        self.nodes.clone_from(&source.nodes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_keys<K: Copy, V>(b: &Buckets<K, V>, bucket: usize) -> Vec<K> {
        b.chain(bucket).map(|(_, n)| n.key).collect()
    }

    /// Invariant: New entries become the head of their chain.
    #[test]
    fn push_front_prepends() {
        let mut b: Buckets<u32, u32> = Buckets::new(4);
        b.push_front(1, 10, 1);
        b.push_front(5, 50, 5);
        b.push_front(9, 90, 9);
        assert_eq!(chain_keys(&b, 1), vec![9, 5, 1]);
        assert_eq!(b.len(), 3);
        b.assert_consistent();
    }

    /// Invariant: `find` matches both the stored hash and the key.
    #[test]
    fn find_requires_hash_and_key() {
        let mut b: Buckets<u32, u32> = Buckets::new(4);
        let k = b.push_front(1, 10, 1);
        assert_eq!(b.find(1, &1), Some(k));
        assert_eq!(b.find(5, &1), None);
        assert_eq!(b.find(1, &2), None);
    }

    /// Invariant: Unlinking handles head, interior and tail positions and keeps
    /// the remaining chain order.
    #[test]
    fn unlink_head_interior_tail() {
        let mut b: Buckets<u32, u32> = Buckets::new(2);
        let k1 = b.push_front(1, 10, 1);
        let k3 = b.push_front(3, 30, 3);
        let k5 = b.push_front(5, 50, 5);
        let k7 = b.push_front(7, 70, 7);
        assert_eq!(chain_keys(&b, 1), vec![7, 5, 3, 1]);

        assert_eq!(b.unlink(k5).map(|n| n.value), Some(50));
        assert_eq!(chain_keys(&b, 1), vec![7, 3, 1]);
        assert_eq!(b.unlink(k7).map(|n| n.value), Some(70));
        assert_eq!(chain_keys(&b, 1), vec![3, 1]);
        assert_eq!(b.unlink(k1).map(|n| n.value), Some(10));
        assert_eq!(chain_keys(&b, 1), vec![3]);
        b.assert_consistent();

        assert!(b.unlink(k1).is_none(), "stale key must not unlink anything");
        assert_eq!(b.unlink(k3).map(|n| n.key), Some(3));
        assert_eq!(b.head(1), None);
        assert_eq!(b.len(), 0);
    }

    /// Invariant: Relinking keeps every arena key and places each entry in the
    /// bucket selected by the new capacity.
    #[test]
    fn relink_moves_entries_without_recreating() {
        let mut b: Buckets<u64, u64> = Buckets::new(3);
        let keys: Vec<_> = (0..12u64).map(|h| (h, b.push_front(h, h * 10, h))).collect();
        b.relink(7);
        assert_eq!(b.capacity(), 7);
        b.assert_consistent();
        for (h, k) in keys {
            let node = b.node(k).expect("arena key survives relink");
            assert_eq!(node.key, h);
            assert_eq!(node.value, h * 10);
            assert_eq!(b.find(h, &h), Some(k));
        }
    }

    /// Invariant: A clone has the same capacity and identical chain order, and
    /// owns its entries independently of the source.
    #[test]
    fn clone_preserves_layout() {
        let mut b: Buckets<u32, String> = Buckets::new(2);
        for h in [0u32, 2, 4, 1, 3] {
            b.push_front(h, h.to_string(), u64::from(h));
        }
        let mut c = b.clone();
        assert_eq!(c.capacity(), 2);
        for bucket in 0..2 {
            assert_eq!(chain_keys(&c, bucket), chain_keys(&b, bucket));
        }
        let k = c.find(4, &4).expect("cloned entry");
        if let Some(n) = c.node_mut(k) {
            n.value.push('!');
        }
        let orig = b.find(4, &4).and_then(|k| b.node(k)).map(|n| n.value.clone());
        assert_eq!(orig.as_deref(), Some("4"));
    }

    /// Invariant: `clear` drops every entry but keeps the bucket count.
    #[test]
    fn clear_keeps_capacity() {
        let mut b: Buckets<u32, u32> = Buckets::new(5);
        for h in 0..20u32 {
            b.push_front(h, h, u64::from(h));
        }
        b.clear();
        assert_eq!(b.len(), 0);
        assert_eq!(b.capacity(), 5);
        assert!((0..5).all(|i| b.head(i).is_none()));
        b.assert_consistent();
    }
}
