use tracing::debug;

use super::handle::Handle;
use super::node::{InteriorNode, Node};
use super::raw_bptree::RawBpTree;

impl<K: Clone + Ord, V> RawBpTree<K, V> {
    /// Inserts into a full leaf by splitting it.
    ///
    /// The entry goes in first, then the `fanout + 1` entries are divided at the split point:
    /// the lower part stays, the upper part moves to a new right sibling. The separator handed
    /// to the parent is the new sibling's least key.
    pub(super) fn split_leaf(&mut self, leaf_handle: Handle, index: usize, key: K, cell: Handle) {
        let mid = self.fanout.split_point();

        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        leaf.insert(index, key, cell);
        let right = leaf.split_off(mid);
        let separator = right.key(0).clone();
        let (left_count, right_count) = (leaf.key_count(), right.key_count());

        let right_handle = self.nodes.alloc(Node::Leaf(right));
        self.nodes.get_mut(leaf_handle).as_leaf_mut().set_next(Some(right_handle));

        debug!(left = ?leaf_handle, right = ?right_handle, left_count, right_count, "split leaf");
        self.add_child(leaf_handle, separator, right_handle);
    }

    /// Hands the right half of a split to the parent of `left`, splitting full ancestors on the
    /// way up. A split root is replaced by a new interior root over both halves.
    fn add_child(&mut self, mut left: Handle, mut separator: K, mut right: Handle) {
        let mid = self.fanout.split_point();

        loop {
            let Some(parent_handle) = self.nodes.get(left).parent() else {
                let root = self.nodes.alloc(Node::Interior(InteriorNode::with_first_child(None, left)));
                self.nodes.get_mut(root).as_interior_mut().push_child(separator, right);
                self.nodes.get_mut(left).set_parent(Some(root));
                self.nodes.get_mut(right).set_parent(Some(root));
                self.root = Some(root);
                debug!(root = ?root, height = self.height(), nodes = self.nodes.len(), "grew new root");
                return;
            };

            let full = self.nodes.get(parent_handle).is_full(self.fanout);
            let parent = self.nodes.get_mut(parent_handle).as_interior_mut();
            let position = parent.child_index(left).expect("split node is missing from its parent");
            parent.insert_child(position, separator, right);
            self.nodes.get_mut(right).set_parent(Some(parent_handle));

            if !full {
                return;
            }

            let (promoted, sibling) = self.nodes.get_mut(parent_handle).as_interior_mut().split(mid);
            let moved = sibling.children().to_vec();
            let sibling_handle = self.nodes.alloc(Node::Interior(sibling));
            for child in moved {
                self.nodes.get_mut(child).set_parent(Some(sibling_handle));
            }
            debug!(left = ?parent_handle, right = ?sibling_handle, "split interior node");

            left = parent_handle;
            separator = promoted;
            right = sibling_handle;
        }
    }
}
