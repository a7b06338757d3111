//! Bucket-order traversal.
//!
//! `Cursor` is the resumable position behind `ChainHashMap::begin` and
//! `ChainHashMap::next_entry`. The borrowing iterators reuse the same
//! stepping logic, so both visit entries in the same order: chain order
//! within a bucket, buckets by increasing index, empty buckets skipped.

use crate::buckets::{Buckets, Node};
use core::iter::FusedIterator;
use slotmap::DefaultKey;

/// Position of a bucket-order traversal. `node` is the entry returned last;
/// `None` means the next step scans forward from `bucket`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Cursor {
    bucket: usize,
    node: Option<DefaultKey>,
}

impl Cursor {
    pub(crate) const fn new() -> Self {
        Self {
            bucket: 0,
            node: None,
        }
    }

    /// Back to "before bucket 0".
    #[inline]
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    /// Steps to the next entry and returns its arena key, or `None` once the
    /// buckets are exhausted. Further calls keep returning `None`.
    ///
    /// A position left dangling by a mutation the owner did not report
    /// (entry gone) restarts from bucket 0 rather than reading stale links.
    pub(crate) fn advance<K, V>(&mut self, buckets: &Buckets<K, V>) -> Option<DefaultKey> {
        if let Some(cur) = self.node.take() {
            if buckets.node(cur).is_none() {
                self.reset();
            } else if let Some(next) = buckets.next_in_chain(cur) {
                self.node = Some(next);
                return Some(next);
            } else {
                self.bucket += 1;
            }
        }
        while self.bucket < buckets.capacity() {
            if let Some(head) = buckets.head(self.bucket) {
                self.node = Some(head);
                return Some(head);
            }
            self.bucket += 1;
        }
        None
    }
}

/// Iterator over `(&K, &V)` in bucket order.
pub struct Iter<'a, K, V> {
    buckets: &'a Buckets<K, V>,
    cursor: Cursor,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(buckets: &'a Buckets<K, V>) -> Self {
        Self {
            buckets,
            cursor: Cursor::new(),
            remaining: buckets.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets,
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cursor.advance(self.buckets)?;
        let node = self.buckets.node(k)?;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over keys in bucket order.
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over values in bucket order.
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Iterator over `(&K, &mut V)`. Follows arena order, not bucket order.
pub struct IterMut<'a, K, V> {
    pub(crate) it: slotmap::basic::IterMut<'a, DefaultKey, Node<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, n)| (&n.key, &mut n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over `&mut V`. Follows arena order, not bucket order.
pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
