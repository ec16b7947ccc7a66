use core::borrow::Borrow;
use core::fmt;

use crate::config::{DEFAULT_FANOUT, TreeConfig};
use crate::error::{Result, TreeError};
use crate::raw::{Fanout, RawBpTree};

mod iter;

pub use iter::{Iter, Keys, Values};

/// An ordered index built on a [B+Tree] with a fanout chosen at construction.
///
/// Every entry lives in a leaf; interior nodes hold separator keys only, and each separator is
/// exactly the least key stored under the child to its right. Leaves are chained in key order,
/// so ordered traversal never revisits the interior levels.
///
/// Keys are unique. Inserting a key that is already present is rejected and leaves the stored
/// value untouched, unlike `BTreeMap::insert`.
///
/// It is a logic error for a key to be modified in such a way that the key's ordering relative to
/// any other key, as determined by the [`Ord`] trait, changes while it is in the tree.
///
/// # Examples
///
/// ```
/// use bptree_index::BpTree;
///
/// let mut index = BpTree::new(3);
/// for key in 1..=7 {
///     assert!(index.insert(key, format!("v{key}")));
/// }
///
/// assert!(!index.insert(4, "again".to_string()));
/// assert_eq!(index.find(&4).map(String::as_str), Some("v4"));
///
/// assert!(index.remove(&4));
/// assert!(!index.contains(&4));
/// assert_eq!(index.ordered_values(), ["v1", "v2", "v3", "v5", "v6", "v7"]);
/// ```
///
/// [B+Tree]: https://en.wikipedia.org/wiki/B%2B_tree
pub struct BpTree<K, V> {
    raw: RawBpTree<K, V>,
}

impl<K, V> BpTree<K, V> {
    /// Makes a new, empty tree whose nodes hold at most `fanout` keys.
    ///
    /// # Panics
    ///
    /// Panics if `fanout < 2`. Use [`BpTree::try_new`] to handle that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BpTree;
    ///
    /// let mut tree = BpTree::new(4);
    /// tree.insert(1, "a");
    /// assert_eq!(tree.fanout(), 4);
    /// ```
    #[must_use]
    pub fn new(fanout: usize) -> Self {
        match Self::try_new(fanout) {
            Ok(tree) => tree,
            Err(_) => panic!("`BpTree::new()` - `fanout` must be at least {}", Fanout::MIN),
        }
    }

    /// Makes a new, empty tree, rejecting a fanout below 2.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidFanout`] if `fanout < 2`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::{BpTree, TreeError};
    ///
    /// assert!(BpTree::<i32, i32>::try_new(2).is_ok());
    /// assert_eq!(BpTree::<i32, i32>::try_new(1).err(), Some(TreeError::InvalidFanout(1)));
    /// ```
    pub const fn try_new(fanout: usize) -> Result<Self> {
        match Fanout::new(fanout) {
            Ok(fanout) => Ok(Self {
                raw: RawBpTree::new(fanout),
            }),
            Err(error) => Err(error),
        }
    }

    /// Makes a new, empty tree from a [`TreeConfig`].
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidFanout`] if the configured fanout is below 2.
    pub const fn with_config(config: TreeConfig) -> Result<Self> {
        Self::try_new(config.fanout)
    }

    /// Maximum number of keys a node may hold.
    #[must_use]
    pub const fn fanout(&self) -> usize {
        self.raw.fanout().max_keys()
    }

    /// Returns the number of entries in the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BpTree;
    ///
    /// let mut tree = BpTree::new(3);
    /// assert_eq!(tree.len(), 0);
    /// tree.insert(1, "a");
    /// assert_eq!(tree.len(), 1);
    /// ```
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree contains no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Removes every entry. The fanout is kept.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Number of levels from the root down to the leaves, 0 when empty.
    ///
    /// Every leaf sits at this depth.
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns the keys of every node, level by level from the root, each level listed left to
    /// right.
    ///
    /// This is a diagnostic view of the tree's shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BpTree;
    ///
    /// let mut tree = BpTree::new(3);
    /// tree.extend((1..=4).map(|key| (key, ())));
    /// assert_eq!(tree.level_keys(), vec![vec![vec![3]], vec![vec![1, 2], vec![3, 4]]]);
    /// ```
    #[must_use]
    pub fn level_keys(&self) -> Vec<Vec<Vec<K>>>
    where
        K: Clone,
    {
        self.raw.level_keys()
    }

    /// Gets an iterator over the entries of the tree, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BpTree;
    ///
    /// let mut tree = BpTree::new(3);
    /// tree.insert(3, "c");
    /// tree.insert(1, "a");
    /// tree.insert(2, "b");
    ///
    /// let entries: Vec<_> = tree.iter().collect();
    /// assert_eq!(entries, [(&1, &"a"), (&2, &"b"), (&3, &"c")]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.raw)
    }

    /// Gets an iterator over the keys of the tree, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    /// Gets an iterator over the values of the tree, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    /// Collects every value in ascending key order.
    ///
    /// The result is rebuilt from the leaf chain on each call.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BpTree;
    ///
    /// let mut tree = BpTree::new(3);
    /// assert!(tree.ordered_values().is_empty());
    ///
    /// tree.insert(2, "b");
    /// tree.insert(1, "a");
    /// assert_eq!(tree.ordered_values(), ["a", "b"]);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n)
    #[must_use]
    pub fn ordered_values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.values().cloned().collect()
    }

    /// Returns the entry with the least key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BpTree;
    ///
    /// let mut tree = BpTree::new(3);
    /// assert_eq!(tree.first_key_value(), None);
    /// tree.insert(2, "b");
    /// tree.insert(1, "a");
    /// assert_eq!(tree.first_key_value(), Some((&1, &"a")));
    /// ```
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let leaf = self.raw.node(self.raw.first_leaf()?).as_leaf();
        Some((leaf.key(0), self.raw.value(leaf.cell(0))))
    }

    /// Returns the entry with the greatest key.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let leaf = self.raw.node(self.raw.last_leaf()?).as_leaf();
        let index = leaf.key_count() - 1;
        Some((leaf.key(index), self.raw.value(leaf.cell(index))))
    }
}

impl<K: Ord + Clone, V> BpTree<K, V> {
    /// Inserts a key-value pair.
    ///
    /// Returns `false` without changing anything if the key is already present; the original
    /// value is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BpTree;
    ///
    /// let mut tree = BpTree::new(3);
    /// assert!(tree.insert(37, "a"));
    /// assert!(!tree.insert(37, "b"));
    /// assert_eq!(tree.find(&37), Some(&"a"));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.try_insert(key, value).is_ok()
    }

    /// Inserts a key-value pair, reporting why it was rejected.
    ///
    /// # Errors
    ///
    /// [`TreeError::DuplicateKey`] if the key is already present. The tree is unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<()> {
        self.raw.insert(key, value)
    }

    /// Removes a key from the tree.
    ///
    /// Returns `true` if the key was present. Removing an absent key, or removing from an empty
    /// tree, returns `false` and changes nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BpTree;
    ///
    /// let mut tree = BpTree::new(3);
    /// tree.insert(1, "a");
    /// assert!(tree.remove(&1));
    /// assert!(!tree.remove(&1));
    /// assert!(tree.is_empty());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.try_remove(key).is_ok()
    }

    /// Removes a key from the tree, returning its value.
    ///
    /// # Errors
    ///
    /// [`TreeError::EmptyTree`] if the tree has no entries, [`TreeError::KeyNotFound`] if the key
    /// is absent. The tree is unchanged in both cases.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::{BpTree, TreeError};
    ///
    /// let mut tree = BpTree::new(3);
    /// assert_eq!(tree.try_remove(&1), Err(TreeError::EmptyTree));
    ///
    /// tree.insert(1, "a");
    /// assert_eq!(tree.try_remove(&2), Err(TreeError::KeyNotFound));
    /// assert_eq!(tree.try_remove(&1), Ok("a"));
    /// ```
    pub fn try_remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key)
    }

    /// Returns a reference to the value stored under the key.
    ///
    /// The key may be any borrowed form of the tree's key type, but the ordering on the borrowed
    /// form *must* match the ordering on the key type.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BpTree;
    ///
    /// let mut tree = BpTree::new(3);
    /// tree.insert("apple".to_string(), 3);
    /// assert_eq!(tree.find("apple"), Some(&3));
    /// assert_eq!(tree.find("pear"), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key)
    }

    /// Returns a mutable reference to the value stored under the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bptree_index::BpTree;
    ///
    /// let mut tree = BpTree::new(3);
    /// tree.insert(1, "a");
    /// if let Some(value) = tree.find_mut(&1) {
    ///     *value = "b";
    /// }
    /// assert_eq!(tree.find(&1), Some(&"b"));
    /// ```
    pub fn find_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key)
    }

    /// Returns `true` if the tree holds the key.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.contains_key(key)
    }
}

impl<K, V> Default for BpTree<K, V> {
    /// Makes an empty tree with [`DEFAULT_FANOUT`].
    fn default() -> Self {
        Self::new(DEFAULT_FANOUT)
    }
}

impl<K: Clone, V: Clone> Clone for BpTree<K, V> {
    /// Deep copy; the clone shares no nodes with `self`.
    fn clone(&self) -> Self {
        Self { raw: self.raw.clone() }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BpTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Keys already present are skipped, as with [`BpTree::insert`].
impl<K: Ord + Clone, V> Extend<(K, V)> for BpTree<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a BpTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
