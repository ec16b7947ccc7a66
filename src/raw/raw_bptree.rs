use core::borrow::Borrow;
use std::collections::VecDeque;

use tracing::trace;

use super::arena::Arena;
use super::fanout::Fanout;
use super::handle::Handle;
use super::node::{InteriorNode, LeafNode, Node, SearchResult};
use crate::error::{Result, TreeError};

/// The B+Tree engine backing `BpTree`.
pub(crate) struct RawBpTree<K, V> {
    /// Arena storing all tree nodes.
    pub(super) nodes: Arena<Node<K>>,
    /// Arena storing the value cells referenced from leaves.
    pub(super) values: Arena<V>,
    /// Handle to the root node, if the tree is non-empty.
    pub(super) root: Option<Handle>,
    /// Total number of key-value pairs in the tree.
    pub(super) len: usize,
    pub(super) fanout: Fanout,
}

impl<K, V> RawBpTree<K, V> {
    pub(crate) const fn new(fanout: Fanout) -> Self {
        Self {
            nodes: Arena::new(),
            values: Arena::new(),
            root: None,
            len: 0,
            fanout,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) const fn fanout(&self) -> Fanout {
        self.fanout
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.values.clear();
        self.root = None;
        self.len = 0;
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    pub(crate) fn value(&self, handle: Handle) -> &V {
        self.values.get(handle)
    }

    /// Leftmost leaf, where the leaf chain starts.
    pub(crate) fn first_leaf(&self) -> Option<Handle> {
        let mut current = self.root?;
        while let Node::Interior(interior) = self.nodes.get(current) {
            current = interior.child(0);
        }
        Some(current)
    }

    pub(crate) fn last_leaf(&self) -> Option<Handle> {
        let mut current = self.root?;
        while let Node::Interior(interior) = self.nodes.get(current) {
            current = interior.child(interior.child_count() - 1);
        }
        Some(current)
    }

    /// Number of levels; 0 for an empty tree, 1 for a single leaf.
    pub(crate) fn height(&self) -> usize {
        let Some(mut current) = self.root else {
            return 0;
        };
        let mut height = 1;
        while let Node::Interior(interior) = self.nodes.get(current) {
            current = interior.child(0);
            height += 1;
        }
        height
    }

    /// Least key stored under `handle`: the first key of its leftmost leaf.
    pub(crate) fn least_key(&self, handle: Handle) -> &K {
        let mut current = handle;
        loop {
            match self.nodes.get(current) {
                Node::Interior(interior) => current = interior.child(0),
                Node::Leaf(leaf) => return leaf.key(0),
            }
        }
    }

    /// The children adjacent to `handle` in its parent, if any.
    pub(crate) fn find_siblings(&self, handle: Handle) -> (Option<Handle>, Option<Handle>) {
        let Some(parent) = self.nodes.get(handle).parent() else {
            return (None, None);
        };
        let parent = self.nodes.get(parent).as_interior();
        let index = parent.child_index(handle).expect("node is missing from its parent");
        let left = index.checked_sub(1).map(|i| parent.child(i));
        let right = (index + 1 < parent.child_count()).then(|| parent.child(index + 1));
        (left, right)
    }

    /// Leaf whose `next` link points at `leaf`, found through the ancestors rather than the chain.
    pub(crate) fn predecessor_leaf(&self, leaf: Handle) -> Option<Handle> {
        let mut current = leaf;
        loop {
            let parent_handle = self.nodes.get(current).parent()?;
            let parent = self.nodes.get(parent_handle).as_interior();
            let index = parent.child_index(current).expect("node is missing from its parent");
            if index > 0 {
                let mut candidate = parent.child(index - 1);
                while let Node::Interior(interior) = self.nodes.get(candidate) {
                    candidate = interior.child(interior.child_count() - 1);
                }
                return Some(candidate);
            }
            current = parent_handle;
        }
    }

    /// Keys of every node, grouped by depth and listed left to right.
    pub(crate) fn level_keys(&self) -> Vec<Vec<Vec<K>>>
    where
        K: Clone,
    {
        let mut levels: Vec<Vec<Vec<K>>> = Vec::new();
        let mut queue: VecDeque<(Handle, usize)> = self.root.map(|root| (root, 0)).into_iter().collect();

        while let Some((handle, depth)) = queue.pop_front() {
            if levels.len() == depth {
                levels.push(Vec::new());
            }
            let keys = match self.nodes.get(handle) {
                Node::Interior(interior) => {
                    queue.extend(interior.children().iter().map(|&child| (child, depth + 1)));
                    interior.keys().to_vec()
                }
                Node::Leaf(leaf) => leaf.keys().to_vec(),
            };
            levels[depth].push(keys);
        }

        levels
    }
}

impl<K: Clone + Ord, V> RawBpTree<K, V> {
    /// Descends from the root to the leaf whose key range covers `key`.
    pub(crate) fn find_leaf<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root?;
        loop {
            match self.nodes.get(current) {
                Node::Interior(interior) => current = interior.child(interior.search_child(key)),
                Node::Leaf(_) => return Some(current),
            }
        }
    }

    /// Searches for a key and returns the leaf handle and index if found.
    pub(crate) fn search<Q>(&self, key: &Q) -> Option<(Handle, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf = self.find_leaf(key)?;
        let index = self.nodes.get(leaf).as_leaf().find_key_index(key)?;
        Some((leaf, index))
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf, index) = self.search(key)?;
        Some(self.values.get(self.nodes.get(leaf).as_leaf().cell(index)))
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf, index) = self.search(key)?;
        let cell = self.nodes.get(leaf).as_leaf().cell(index);
        Some(self.values.get_mut(cell))
    }

    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).is_some()
    }

    /// Inserts a new entry. An existing key is never overwritten.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<()> {
        let Some(leaf_handle) = self.find_leaf(&key) else {
            let cell = self.values.alloc(value);
            let mut leaf = LeafNode::new(None);
            leaf.push(key, cell);
            self.root = Some(self.nodes.alloc(Node::Leaf(leaf)));
            self.len = 1;
            trace!(root = ?self.root, "created leaf root");
            return Ok(());
        };

        let node = self.nodes.get(leaf_handle);
        let index = match node.as_leaf().search(&key) {
            SearchResult::Found(_) => return Err(TreeError::DuplicateKey),
            SearchResult::NotFound(index) => index,
        };
        let full = node.is_full(self.fanout);

        let cell = self.values.alloc(value);
        if full {
            self.split_leaf(leaf_handle, index, key, cell);
        } else {
            self.nodes.get_mut(leaf_handle).as_leaf_mut().insert(index, key, cell);
            trace!(leaf = ?leaf_handle, index, "inserted into leaf");
        }
        self.len += 1;
        Ok(())
    }

    /// Removes `key` and returns its value, rebalancing if the leaf underflows.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf_handle = self.find_leaf(key).ok_or(TreeError::EmptyTree)?;
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let index = leaf.find_key_index(key).ok_or(TreeError::KeyNotFound)?;

        let (_, cell) = leaf.remove(index);
        let value = self.values.take(cell);
        self.len -= 1;

        if self.len == 0 {
            trace!("removed last entry");
            self.clear();
            return Ok(value);
        }

        let survivor = self.rebalance(leaf_handle);
        self.repair_separators(survivor);
        Ok(value)
    }
}

impl<K: Clone, V: Clone> Clone for RawBpTree<K, V> {
    /// Deep copy: the clone owns fresh nodes and value cells.
    fn clone(&self) -> Self {
        fn clone_node<K: Clone, V: Clone>(
            source: &RawBpTree<K, V>,
            target: &mut RawBpTree<K, V>,
            handle: Handle,
            parent: Option<Handle>,
            leaves: &mut Vec<Handle>,
        ) -> Handle {
            match source.nodes.get(handle) {
                Node::Leaf(leaf) => {
                    let mut copy = LeafNode::new(parent);
                    for (key, &cell) in leaf.keys().iter().zip(leaf.cells()) {
                        let cell = target.values.alloc(source.values.get(cell).clone());
                        copy.push(key.clone(), cell);
                    }
                    let copy = target.nodes.alloc(Node::Leaf(copy));
                    leaves.push(copy);
                    copy
                }
                Node::Interior(interior) => {
                    // Reserve the slot first so children can point back at it.
                    let copy = target.nodes.alloc(Node::Interior(InteriorNode::new(parent)));
                    let first = clone_node(source, target, interior.child(0), Some(copy), leaves);
                    let mut node = InteriorNode::with_first_child(parent, first);
                    for (key, &child) in interior.keys().iter().zip(&interior.children()[1..]) {
                        let child = clone_node(source, target, child, Some(copy), leaves);
                        node.push_child(key.clone(), child);
                    }
                    *target.nodes.get_mut(copy) = Node::Interior(node);
                    copy
                }
            }
        }

        let mut target = RawBpTree::new(self.fanout);
        let Some(root) = self.root else {
            return target;
        };

        let mut leaves = Vec::new();
        target.root = Some(clone_node(self, &mut target, root, None, &mut leaves));
        for pair in leaves.windows(2) {
            target.nodes.get_mut(pair[0]).as_leaf_mut().set_next(Some(pair[1]));
        }
        target.len = self.len;
        target
    }
}
