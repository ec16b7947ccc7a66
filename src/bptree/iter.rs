use core::fmt;
use core::iter::FusedIterator;

use crate::raw::{Handle, RawBpTree};

/// An iterator over the entries of a [`BpTree`](super::BpTree), sorted by key.
///
/// This `struct` is created by the [`iter`](super::BpTree::iter) method. It walks the leaf chain
/// and never touches interior nodes after finding the first leaf.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    tree: &'a RawBpTree<K, V>,
    leaf: Option<Handle>,
    index: usize,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(super) fn new(tree: &'a RawBpTree<K, V>) -> Self {
        Self {
            tree,
            leaf: tree.first_leaf(),
            index: 0,
            remaining: tree.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let leaf = self.tree.node(self.leaf?).as_leaf();
        let key = leaf.key(self.index);
        let value = self.tree.value(leaf.cell(self.index));

        self.remaining -= 1;
        self.index += 1;
        if self.index >= leaf.key_count() {
            self.leaf = leaf.next();
            self.index = 0;
        }

        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a [`BpTree`](super::BpTree), in sorted order.
///
/// This `struct` is created by the [`keys`](super::BpTree::keys) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(super) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`BpTree`](super::BpTree), in order by key.
///
/// This `struct` is created by the [`values`](super::BpTree::values) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(super) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::BpTree;

    fn tree(fanout: usize, keys: impl IntoIterator<Item = i32>) -> BpTree<i32, i32> {
        let mut tree = BpTree::new(fanout);
        tree.extend(keys.into_iter().map(|key| (key, -key)));
        tree
    }

    #[test]
    fn empty_tree_yields_nothing() {
        let tree = tree(3, []);
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 0);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn walks_across_leaves_in_key_order() {
        let tree = tree(2, (0..50).rev());
        let keys: Vec<i32> = tree.keys().copied().collect();
        assert_eq!(keys, (0..50).collect::<Vec<_>>());
        let values: Vec<i32> = tree.values().copied().collect();
        assert_eq!(values, (0..50).map(|key| -key).collect::<Vec<_>>());
    }

    #[test]
    fn exact_size_counts_down() {
        let tree = tree(3, 0..10);
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 10);
        iter.next();
        iter.next();
        assert_eq!(iter.len(), 8);
        assert_eq!(iter.by_ref().count(), 8);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn clone_resumes_from_same_position() {
        let tree = tree(3, 0..10);
        let mut iter = tree.keys();
        iter.next();
        let rest: Vec<_> = iter.clone().collect();
        assert_eq!(rest.len(), 9);
        assert_eq!(iter.next(), Some(&1));
    }

    #[test]
    fn for_loop_over_reference() {
        let tree = tree(4, [3, 1, 2]);
        let mut seen = Vec::new();
        for (key, value) in &tree {
            seen.push((*key, *value));
        }
        assert_eq!(seen, [(1, -1), (2, -2), (3, -3)]);
    }

    #[test]
    fn debug_lists_remaining_items() {
        let tree = tree(3, 1..=3);
        assert_eq!(format!("{:?}", tree.keys()), "[1, 2, 3]");
        assert_eq!(format!("{:?}", tree.values()), "[-1, -2, -3]");
    }
}
