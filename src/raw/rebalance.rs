use smallvec::SmallVec;
use tracing::debug;

use super::handle::Handle;
use super::node::Node;
use super::raw_bptree::RawBpTree;

type Siblings = SmallVec<[Handle; 16]>;

impl<K: Clone + Ord, V> RawBpTree<K, V> {
    /// Restores minimum occupancy after an entry was removed from `leaf`.
    ///
    /// Tries, in order: borrowing from the left sibling, borrowing from the right sibling,
    /// coalescing into the left sibling, coalescing into the right sibling. Coalescing removes a
    /// child from the parent, so the parent is checked next. Returns a leaf that still holds the
    /// entries of `leaf`, which is where separator repair starts.
    pub(super) fn rebalance(&mut self, leaf: Handle) -> Handle {
        let fanout = self.fanout;
        let mut survivor = leaf;
        let mut current = leaf;

        loop {
            let node = self.nodes.get(current);
            let Some(parent) = node.parent() else {
                self.collapse_root();
                return survivor;
            };
            if !node.is_underflowing(fanout) {
                return survivor;
            }

            let (left, right) = self.find_siblings(current);
            if let Some(left) = left
                && self.nodes.get(left).can_lend(fanout)
            {
                self.borrow_from_left(current, left, parent);
                return survivor;
            }
            if let Some(right) = right
                && self.nodes.get(right).can_lend(fanout)
            {
                self.borrow_from_right(current, right, parent);
                return survivor;
            }

            let target = if let Some(left) = left
                && self.nodes.get(left).can_absorb(self.nodes.get(current), fanout)
            {
                self.coalesce_into_left(current, left, parent);
                left
            } else if let Some(right) = right
                && self.nodes.get(right).can_absorb(self.nodes.get(current), fanout)
            {
                self.coalesce_into_right(current, right, parent);
                right
            } else {
                unreachable!("underflowing node has no sibling to coalesce with");
            };

            if survivor == current {
                survivor = target;
            }
            current = parent;
        }
    }

    /// Replaces an interior root that is down to one child with that child.
    fn collapse_root(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        let Node::Interior(interior) = self.nodes.get(root) else {
            return;
        };
        if interior.child_count() != 1 {
            return;
        }

        let child = interior.child(0);
        self.nodes.free(root);
        self.nodes.get_mut(child).set_parent(None);
        self.root = Some(child);
        debug!(old = ?root, new = ?child, height = self.height(), "collapsed root");
    }

    fn position_in_parent(&self, parent: Handle, child: Handle) -> usize {
        self.nodes
            .get(parent)
            .as_interior()
            .child_index(child)
            .expect("node is missing from its parent")
    }

    /// Moves the left sibling's last entry to the front of `node`.
    fn borrow_from_left(&mut self, node: Handle, left: Handle, parent: Handle) {
        let index = self.position_in_parent(parent, node);

        let separator = if let Node::Leaf(_) = self.nodes.get(node) {
            let (key, cell) = self.nodes.get_mut(left).as_leaf_mut().pop().expect("lending leaf is empty");
            let separator = key.clone();
            self.nodes.get_mut(node).as_leaf_mut().push_front(key, cell);
            separator
        } else {
            let (_, child) = self.nodes.get_mut(left).as_interior_mut().pop_child().expect("lending node is empty");
            let old_least = self.least_key(node).clone();
            self.nodes.get_mut(node).as_interior_mut().push_child_front(old_least, child);
            self.nodes.get_mut(child).set_parent(Some(node));
            self.least_key(child).clone()
        };

        self.nodes.get_mut(parent).as_interior_mut().set_key(index - 1, separator);
        debug!(node = ?node, from = ?left, "borrowed from left sibling");
    }

    /// Moves the right sibling's first entry to the end of `node`.
    fn borrow_from_right(&mut self, node: Handle, right: Handle, parent: Handle) {
        let index = self.position_in_parent(parent, node);

        if let Node::Leaf(_) = self.nodes.get(node) {
            let (key, cell) = self.nodes.get_mut(right).as_leaf_mut().pop_front().expect("lending leaf is empty");
            self.nodes.get_mut(node).as_leaf_mut().push(key, cell);
        } else {
            let (_, child) =
                self.nodes.get_mut(right).as_interior_mut().pop_child_front().expect("lending node is empty");
            let separator = self.least_key(child).clone();
            self.nodes.get_mut(node).as_interior_mut().push_child(separator, child);
            self.nodes.get_mut(child).set_parent(Some(node));
        }

        let separator = self.least_key(right).clone();
        self.nodes.get_mut(parent).as_interior_mut().set_key(index, separator);
        debug!(node = ?node, from = ?right, "borrowed from right sibling");
    }

    /// Appends every entry of `node` to its left sibling and drops `node` from the parent.
    fn coalesce_into_left(&mut self, node: Handle, left: Handle, parent: Handle) {
        let index = self.position_in_parent(parent, node);

        match self.nodes.take(node) {
            Node::Leaf(leaf) => self.nodes.get_mut(left).as_leaf_mut().absorb_right(leaf),
            Node::Interior(interior) => {
                let separator = self.least_key(interior.child(0)).clone();
                let moved: Siblings = interior.children().iter().copied().collect();
                self.nodes.get_mut(left).as_interior_mut().absorb_right(separator, interior);
                for child in moved {
                    self.nodes.get_mut(child).set_parent(Some(left));
                }
            }
        }

        self.nodes.get_mut(parent).as_interior_mut().remove_child(index, index - 1);
        debug!(node = ?node, into = ?left, "coalesced into left sibling");
    }

    /// Prepends every entry of `node` to its right sibling and drops `node` from the parent.
    fn coalesce_into_right(&mut self, node: Handle, right: Handle, parent: Handle) {
        let index = self.position_in_parent(parent, node);
        let predecessor = match self.nodes.get(node) {
            Node::Leaf(_) => self.predecessor_leaf(node),
            Node::Interior(_) => None,
        };

        match self.nodes.take(node) {
            Node::Leaf(leaf) => {
                self.nodes.get_mut(right).as_leaf_mut().absorb_left(leaf);
                if let Some(predecessor) = predecessor {
                    self.nodes.get_mut(predecessor).as_leaf_mut().set_next(Some(right));
                }
            }
            Node::Interior(interior) => {
                let separator = self.least_key(right).clone();
                let moved: Siblings = interior.children().iter().copied().collect();
                self.nodes.get_mut(right).as_interior_mut().absorb_left(separator, interior);
                for child in moved {
                    self.nodes.get_mut(child).set_parent(Some(right));
                }
            }
        }

        self.nodes.get_mut(parent).as_interior_mut().remove_child(index, index);
        debug!(node = ?node, into = ?right, "coalesced into right sibling");
    }

    /// Recomputes every separator on the ancestor chain of `leaf` as the least key under the
    /// child it precedes.
    ///
    /// Borrowing and coalescing only touch siblings, and every touched sibling's parent lies on
    /// this chain, so no separator outside it can be stale. Running it twice changes nothing.
    pub(super) fn repair_separators(&mut self, leaf: Handle) {
        let mut current = self.nodes.get(leaf).parent();
        while let Some(handle) = current {
            let children: Siblings = self.nodes.get(handle).as_interior().children().iter().copied().collect();
            for (index, &child) in children.iter().enumerate().skip(1) {
                let least = self.least_key(child).clone();
                self.nodes.get_mut(handle).as_interior_mut().set_key(index - 1, least);
            }
            current = self.nodes.get(handle).parent();
        }
    }
}
