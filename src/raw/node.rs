use core::borrow::Borrow;

use smallvec::SmallVec;

use super::fanout::Fanout;
use super::handle::Handle;

// Keys kept inline before a node spills to the heap. Small fanouts never allocate.
const INLINE_KEYS: usize = 8;

// +1 lets a full node hold the incoming entry while it is being split.
type Keys<K> = SmallVec<[K; INLINE_KEYS + 1]>;
type Children = SmallVec<[Handle; INLINE_KEYS + 2]>;
type Cells = SmallVec<[Handle; INLINE_KEYS + 1]>;

#[allow(clippy::large_enum_variant)]
pub(crate) enum Node<K> {
    Interior(InteriorNode<K>),
    Leaf(LeafNode<K>),
}

// B+Tree: interior nodes route by separator; keys[i] is the least key under children[i + 1].
pub(crate) struct InteriorNode<K> {
    parent: Option<Handle>,
    keys: Keys<K>,
    children: Children,
}

// B+Tree: leaves hold the entries. Values live in their own arena; a leaf stores the cell handle.
pub(crate) struct LeafNode<K> {
    parent: Option<Handle>,
    // Non-owning link to the next leaf in key order.
    next: Option<Handle>,
    keys: Keys<K>,
    cells: Cells,
}

/// Result of searching for a key in a leaf.
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted.
    NotFound(usize),
}

impl<K> Node<K> {
    /// Returns the leaf node, panicking if this is not a leaf.
    pub(crate) fn as_leaf(&self) -> &LeafNode<K> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Interior(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the leaf node mutably, panicking if this is not a leaf.
    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<K> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Interior(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the interior node, panicking if this is a leaf.
    pub(crate) fn as_interior(&self) -> &InteriorNode<K> {
        match self {
            Node::Interior(interior) => interior,
            Node::Leaf(_) => panic!("expected interior node"),
        }
    }

    /// Returns the interior node mutably, panicking if this is a leaf.
    pub(crate) fn as_interior_mut(&mut self) -> &mut InteriorNode<K> {
        match self {
            Node::Interior(interior) => interior,
            Node::Leaf(_) => panic!("expected interior node"),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        match self {
            Node::Interior(interior) => interior.keys.len(),
            Node::Leaf(leaf) => leaf.keys.len(),
        }
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        match self {
            Node::Interior(interior) => interior.parent,
            Node::Leaf(leaf) => leaf.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        match self {
            Node::Interior(interior) => interior.parent = parent,
            Node::Leaf(leaf) => leaf.parent = parent,
        }
    }

    /// True once the node holds `fanout` keys; the next insert must split.
    pub(crate) fn is_full(&self, fanout: Fanout) -> bool {
        self.key_count() >= fanout.max_keys()
    }

    /// Keys this node must keep when it is not the root. Leaves hold at least the smaller half of
    /// a leaf split, interior nodes may go one lower.
    pub(crate) fn min_keys(&self, fanout: Fanout) -> usize {
        match self {
            Node::Interior(_) => fanout.min_keys(),
            Node::Leaf(_) => fanout.min_leaf_keys(),
        }
    }

    /// True when a non-root node has dropped below minimum occupancy.
    pub(crate) fn is_underflowing(&self, fanout: Fanout) -> bool {
        self.key_count() < self.min_keys(fanout)
    }

    /// True if one entry can be given to a sibling without underflowing.
    pub(crate) fn can_lend(&self, fanout: Fanout) -> bool {
        self.key_count() > self.min_keys(fanout)
    }

    /// True if `other` can be coalesced into this node without overflowing it.
    pub(crate) fn can_absorb(&self, other: &Node<K>, fanout: Fanout) -> bool {
        let combined = match (self, other) {
            (Node::Leaf(a), Node::Leaf(b)) => a.keys.len() + b.keys.len(),
            // The separator between the two comes down from the parent.
            (Node::Interior(a), Node::Interior(b)) => a.keys.len() + b.keys.len() + 1,
            _ => panic!("siblings must be at the same depth"),
        };
        combined <= fanout.max_keys()
    }
}

impl<K> InteriorNode<K> {
    pub(crate) fn new(parent: Option<Handle>) -> Self {
        Self {
            parent,
            keys: SmallVec::new(),
            children: SmallVec::new(),
        }
    }

    /// Creates a node whose only child is `child`; separators are pushed after it.
    pub(crate) fn with_first_child(parent: Option<Handle>, child: Handle) -> Self {
        let mut node = Self::new(parent);
        node.children.push(child);
        node
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    pub(crate) fn set_key(&mut self, index: usize, key: K) {
        self.keys[index] = key;
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Position of `child` in this node's child list.
    pub(crate) fn child_index(&self, child: Handle) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    /// Index of the child to descend into: left of the first separator greater than `key`,
    /// otherwise the rightmost child.
    #[inline]
    pub(crate) fn search_child<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.keys.partition_point(|k| k.borrow() <= key)
    }

    /// Inserts `child` directly right of `children[index]`, with `key` as its separator.
    pub(crate) fn insert_child(&mut self, index: usize, key: K, child: Handle) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, child);
    }

    /// Removes `children[child_index]` together with `keys[key_index]`.
    pub(crate) fn remove_child(&mut self, child_index: usize, key_index: usize) -> (K, Handle) {
        let child = self.children.remove(child_index);
        let key = self.keys.remove(key_index);
        (key, child)
    }

    /// Appends `child` after the last child, separated by `key`.
    pub(crate) fn push_child(&mut self, key: K, child: Handle) {
        self.keys.push(key);
        self.children.push(child);
    }

    /// Prepends `child` before the first child; `key` separates it from the old first child.
    pub(crate) fn push_child_front(&mut self, key: K, child: Handle) {
        self.keys.insert(0, key);
        self.children.insert(0, child);
    }

    /// Removes the last child and the key identifying it.
    pub(crate) fn pop_child(&mut self) -> Option<(K, Handle)> {
        let key = self.keys.pop()?;
        let child = self.children.pop()?;
        Some((key, child))
    }

    /// Removes the first child and the key that followed it.
    pub(crate) fn pop_child_front(&mut self) -> Option<(K, Handle)> {
        if self.keys.is_empty() {
            return None;
        }
        let key = self.keys.remove(0);
        let child = self.children.remove(0);
        Some((key, child))
    }

    /// Splits an overflowing node at `mid`. Keys `[0, mid)` and children `[0, mid]` stay,
    /// `keys[mid]` is returned for promotion, everything after it moves to the new right node.
    pub(crate) fn split(&mut self, mid: usize) -> (K, InteriorNode<K>) {
        let mut right = InteriorNode::new(self.parent);
        right.keys = self.keys.drain(mid + 1..).collect();
        right.children = self.children.drain(mid + 1..).collect();
        let promoted = self.keys.pop().expect("`InteriorNode::split()` - `mid` out of range");
        (promoted, right)
    }

    /// Appends `right` after this node, pulling `separator` down between them.
    pub(crate) fn absorb_right(&mut self, separator: K, right: InteriorNode<K>) {
        self.keys.push(separator);
        self.keys.extend(right.keys);
        self.children.extend(right.children);
    }

    /// Prepends `left` before this node, pulling `separator` down between them.
    pub(crate) fn absorb_left(&mut self, separator: K, left: InteriorNode<K>) {
        let mut keys = left.keys;
        keys.push(separator);
        keys.extend(self.keys.drain(..));
        self.keys = keys;

        let mut children = left.children;
        children.extend(self.children.drain(..));
        self.children = children;
    }
}

impl<K> LeafNode<K> {
    pub(crate) fn new(parent: Option<Handle>) -> Self {
        Self {
            parent,
            next: None,
            keys: SmallVec::new(),
            cells: SmallVec::new(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Handle of the value cell stored at `index`.
    #[inline]
    pub(crate) fn cell(&self, index: usize) -> Handle {
        self.cells[index]
    }

    pub(crate) fn cells(&self) -> &[Handle] {
        &self.cells
    }

    #[inline]
    pub(crate) fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.keys.binary_search_by(|k| k.borrow().cmp(key)) {
            Ok(index) => SearchResult::Found(index),
            Err(index) => SearchResult::NotFound(index),
        }
    }

    /// Exact-match position of `key`.
    pub(crate) fn find_key_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.search(key) {
            SearchResult::Found(index) => Some(index),
            SearchResult::NotFound(_) => None,
        }
    }

    pub(crate) fn insert(&mut self, index: usize, key: K, cell: Handle) {
        self.keys.insert(index, key);
        self.cells.insert(index, cell);
    }

    /// Removes the entry at `index`, compacting the rest to the left.
    pub(crate) fn remove(&mut self, index: usize) -> (K, Handle) {
        (self.keys.remove(index), self.cells.remove(index))
    }

    pub(crate) fn push(&mut self, key: K, cell: Handle) {
        self.keys.push(key);
        self.cells.push(cell);
    }

    pub(crate) fn push_front(&mut self, key: K, cell: Handle) {
        self.insert(0, key, cell);
    }

    pub(crate) fn pop(&mut self) -> Option<(K, Handle)> {
        let key = self.keys.pop()?;
        let cell = self.cells.pop()?;
        Some((key, cell))
    }

    pub(crate) fn pop_front(&mut self) -> Option<(K, Handle)> {
        if self.keys.is_empty() {
            return None;
        }
        Some(self.remove(0))
    }

    /// Moves entries `[mid..]` into a new right sibling that takes over this leaf's `next` link.
    /// The caller links this leaf to the new sibling once it has a handle.
    pub(crate) fn split_off(&mut self, mid: usize) -> LeafNode<K> {
        LeafNode {
            parent: self.parent,
            next: self.next.take(),
            keys: self.keys.drain(mid..).collect(),
            cells: self.cells.drain(mid..).collect(),
        }
    }

    /// Appends every entry of `right`, inheriting its `next` link.
    pub(crate) fn absorb_right(&mut self, right: LeafNode<K>) {
        self.keys.extend(right.keys);
        self.cells.extend(right.cells);
        self.next = right.next;
    }

    /// Prepends every entry of `left`. Chain links are left to the caller.
    pub(crate) fn absorb_left(&mut self, left: LeafNode<K>) {
        let mut keys = left.keys;
        keys.extend(self.keys.drain(..));
        self.keys = keys;

        let mut cells = left.cells;
        cells.extend(self.cells.drain(..));
        self.cells = cells;
    }
}
