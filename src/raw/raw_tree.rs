use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;

use smallvec::SmallVec;

use super::arena::Arena;
use super::cursor::{Epoch, NodeRef, RawCursor, TreeId};
use super::handle::Handle;
use super::node::{DELTA, GAMMA, Node, Side};
use super::size::Size;
use crate::error::Error;

/// Explicit stack for in-order walks; deep enough for any balanced tree the arena can hold.
type Stack = SmallVec<[Handle; 64]>;

/// The weight-balanced binary search tree backing `OrderedMap`.
///
/// Each entry lives in its own arena node and stays there until erased: rotations relink
/// nodes but never move keys or values between them. Node handles are therefore stable
/// cursors, invalidated only by erasing that node or clearing the tree.
pub(crate) struct RawTree<K, V> {
    id: TreeId,
    epoch: Epoch,
    nodes: Arena<Node<K, V>>,
    root: Option<Handle>,
}

impl<K, V> RawTree<K, V> {
    /// Creates a new, empty tree.
    pub(crate) fn new() -> Self {
        Self {
            id: TreeId::fresh(),
            epoch: Epoch::default(),
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Creates a new tree with room for `capacity` entries.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            id: TreeId::fresh(),
            epoch: Epoch::default(),
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Removes every entry and releases the arena's slots. Every cursor into the tree,
    /// past-the-end included, goes stale.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.epoch = self.epoch.next();
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, handle: Handle) -> &mut V {
        self.nodes.get_mut(handle).value_mut()
    }

    /// Cursor at `handle`, or past-the-end for `None`.
    pub(crate) fn cursor_at(&self, handle: Option<Handle>) -> RawCursor {
        match handle {
            Some(handle) => RawCursor::at(
                self.id,
                self.epoch,
                NodeRef {
                    handle,
                    generation: self.nodes.generation(handle),
                },
            ),
            None => RawCursor::end(self.id, self.epoch),
        }
    }

    /// Maps a cursor back to a live node of this tree (`None` is past-the-end).
    pub(crate) fn resolve(&self, cursor: RawCursor) -> Result<Option<Handle>, Error> {
        match cursor.tree() {
            None => Err(Error::UnsetPosition),
            Some(id) if id != self.id => Err(Error::ForeignPosition),
            Some(_) if cursor.epoch() != self.epoch => Err(Error::StalePosition),
            Some(_) => match cursor.node() {
                None => Ok(None),
                Some(node) if self.nodes.is_live(node.handle, node.generation) => Ok(Some(node.handle)),
                Some(_) => Err(Error::StalePosition),
            },
        }
    }

    /// The in-order first node.
    pub(crate) fn first(&self) -> Option<Handle> {
        self.root.map(|root| self.extreme(root, Side::Left))
    }

    /// The in-order last node.
    pub(crate) fn last(&self) -> Option<Handle> {
        self.root.map(|root| self.extreme(root, Side::Right))
    }

    /// The in-order successor of `handle`.
    pub(crate) fn successor(&self, handle: Handle) -> Option<Handle> {
        self.step(handle, Side::Right)
    }

    /// The in-order predecessor of `handle`.
    pub(crate) fn predecessor(&self, handle: Handle) -> Option<Handle> {
        self.step(handle, Side::Left)
    }

    // Follows `side` links from `handle` as far as they go.
    fn extreme(&self, mut handle: Handle, side: Side) -> Handle {
        while let Some(child) = self.nodes.get(handle).child(side) {
            handle = child;
        }
        handle
    }

    // Neighbour of `handle` in direction `side` (Right = successor).
    fn step(&self, handle: Handle, side: Side) -> Option<Handle> {
        if let Some(child) = self.nodes.get(handle).child(side) {
            return Some(self.extreme(child, side.opposite()));
        }

        // Climb until we arrive from the opposite side.
        let mut child = handle;
        let mut parent = self.nodes.get(handle).parent();
        while let Some(p) = parent {
            let node = self.nodes.get(p);
            if node.child(side.opposite()) == Some(child) {
                return Some(p);
            }
            child = p;
            parent = node.parent();
        }
        None
    }

    /// Drains all entries in key order. O(n); no rebalancing.
    pub(crate) fn drain_to_vec(&mut self) -> Vec<(K, V)> {
        let mut entries = Vec::with_capacity(self.len());
        let mut stack = Stack::new();
        let mut current = self.root.take();

        loop {
            while let Some(handle) = current {
                stack.push(handle);
                current = self.nodes.get(handle).left();
            }
            let Some(handle) = stack.pop() else {
                break;
            };
            let node = self.nodes.take(handle);
            current = node.right();
            entries.push(node.into_entry());
        }

        debug_assert!(self.nodes.is_empty(), "drain_to_vec: nodes left behind after drain");
        entries
    }

    #[inline]
    fn size_of(&self, handle: Option<Handle>) -> Size {
        handle.map_or(Size::ZERO, |h| self.nodes.get(h).size())
    }

    #[inline]
    fn weight_of(&self, handle: Option<Handle>) -> usize {
        self.size_of(handle).weight()
    }

    // Recomputes a node's size from its children.
    fn refresh_size(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        let size = Size::joining(self.size_of(node.left()), self.size_of(node.right()));
        self.nodes.get_mut(handle).set_size(size);
    }

    // Points whatever linked to `old` (its parent, or the root) at `new`.
    // Does not touch `new`'s own parent link.
    fn replace_child(&mut self, parent: Option<Handle>, old: Handle, new: Option<Handle>) {
        match parent {
            Some(parent) => {
                let side = self.nodes.get(parent).side_of(old);
                self.nodes.get_mut(parent).set_child(side, new);
            }
            None => self.root = new,
        }
    }

    /// Rotates `top` towards `direction`; its child on the other side takes its place.
    /// Returns the new subtree root.
    fn rotate(&mut self, top: Handle, direction: Side) -> Handle {
        let rising = direction.opposite();
        let pivot = self.nodes.get(top).child(rising).expect("`RawTree::rotate()` - no child to rotate up!");
        let inner = self.nodes.get(pivot).child(direction);
        let parent = self.nodes.get(top).parent();

        self.nodes.get_mut(top).set_child(rising, inner);
        if let Some(inner) = inner {
            self.nodes.get_mut(inner).set_parent(Some(top));
        }

        self.replace_child(parent, top, Some(pivot));
        let pivot_node = self.nodes.get_mut(pivot);
        pivot_node.set_parent(parent);
        pivot_node.set_child(direction, Some(top));
        self.nodes.get_mut(top).set_parent(Some(pivot));

        self.refresh_size(top);
        self.refresh_size(pivot);
        pivot
    }

    /// Restores the weight invariant at `handle`, assuming both subtrees are balanced and
    /// at most one entry away from a balanced state. Returns the subtree root afterwards.
    fn balance(&mut self, handle: Handle) -> Handle {
        let node = self.nodes.get(handle);
        let left_weight = self.weight_of(node.left());
        let right_weight = self.weight_of(node.right());

        let heavy = if right_weight > DELTA * left_weight {
            Side::Right
        } else if left_weight > DELTA * right_weight {
            Side::Left
        } else {
            return handle;
        };

        let child = node.child(heavy).expect("`RawTree::balance()` - heavy side is empty!");
        let child_node = self.nodes.get(child);
        let inner_weight = self.weight_of(child_node.child(heavy.opposite()));
        let outer_weight = self.weight_of(child_node.child(heavy));

        if inner_weight >= GAMMA * outer_weight {
            // Double rotation: lift the inner grandchild first.
            self.rotate(child, heavy);
        }
        self.rotate(handle, heavy.opposite())
    }

    /// Walks from `start` to the root, refreshing sizes and rebalancing.
    fn rebalance_from(&mut self, start: Option<Handle>) {
        let mut current = start;
        while let Some(handle) = current {
            self.refresh_size(handle);
            let top = self.balance(handle);
            current = self.nodes.get(top).parent();
        }
    }

    /// Removes the node at `handle`. Returns its in-order successor and the entry.
    ///
    /// With two children, the successor node itself is spliced into `handle`'s place,
    /// so no other entry changes node.
    pub(crate) fn erase(&mut self, handle: Handle) -> (Option<Handle>, (K, V)) {
        let next = self.successor(handle);
        let node = self.nodes.get(handle);
        let (left, right, parent) = (node.left(), node.right(), node.parent());

        let rebalance_start = match (left, right) {
            (Some(left), Some(right)) => {
                let heir = next.expect("`RawTree::erase()` - right subtree without successor!");
                let heir_parent = self.nodes.get(heir).parent();

                let start = if heir_parent == Some(handle) {
                    Some(heir)
                } else {
                    // The heir is the leftmost node of `right`: it has no left child.
                    let heir_right = self.nodes.get(heir).right();
                    if let Some(hp) = heir_parent {
                        self.nodes.get_mut(hp).set_child(Side::Left, heir_right);
                    }
                    if let Some(hr) = heir_right {
                        self.nodes.get_mut(hr).set_parent(heir_parent);
                    }
                    self.nodes.get_mut(heir).set_child(Side::Right, Some(right));
                    self.nodes.get_mut(right).set_parent(Some(heir));
                    heir_parent
                };

                self.nodes.get_mut(heir).set_child(Side::Left, Some(left));
                self.nodes.get_mut(left).set_parent(Some(heir));
                self.replace_child(parent, handle, Some(heir));
                self.nodes.get_mut(heir).set_parent(parent);
                start
            }
            _ => {
                let child = left.or(right);
                self.replace_child(parent, handle, child);
                if let Some(child) = child {
                    self.nodes.get_mut(child).set_parent(parent);
                }
                parent
            }
        };

        let entry = self.nodes.take(handle).into_entry();
        self.rebalance_from(rebalance_start);
        (next, entry)
    }
}

impl<K: Ord, V> RawTree<K, V> {
    /// Finds the node holding `key`.
    pub(crate) fn search<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            current = match Ord::cmp(key, node.key().borrow()) {
                Ordering::Less => node.left(),
                Ordering::Greater => node.right(),
                Ordering::Equal => return Some(handle),
            };
        }
        None
    }

    /// Inserts the entry unless its key is already present.
    ///
    /// Returns the node holding the key and whether it was newly created. A rejected
    /// entry is dropped; the stored value is left as it was.
    pub(crate) fn insert_unique(&mut self, key: K, value: V) -> (Handle, bool) {
        let Some(mut current) = self.root else {
            let handle = self.nodes.alloc(Node::new(key, value, None));
            self.root = Some(handle);
            return (handle, true);
        };

        loop {
            let node = self.nodes.get(current);
            let side = match key.cmp(node.key()) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return (current, false),
            };
            match node.child(side) {
                Some(child) => current = child,
                None => {
                    let handle = self.nodes.alloc(Node::new(key, value, Some(current)));
                    self.nodes.get_mut(current).set_child(side, Some(handle));
                    self.rebalance_from(Some(current));
                    return (handle, true);
                }
            }
        }
    }
}

impl<K: Clone, V: Clone> Clone for RawTree<K, V> {
    fn clone(&self) -> Self {
        Self {
            id: TreeId::fresh(),
            epoch: self.epoch,
            nodes: self.nodes.clone(),
            root: self.root,
        }
    }

    /// Copies `source` into this tree's existing storage. The result is a new tree as far
    /// as cursors are concerned.
    fn clone_from(&mut self, source: &Self) {
        self.id = TreeId::fresh();
        self.epoch = source.epoch;
        self.nodes.clone_from(&source.nodes);
        self.root = source.root;
    }
}

#[cfg(test)]
impl<K: Ord, V> RawTree<K, V> {
    /// Checks links, sizes, balance and key order of the whole tree.
    pub(crate) fn check_invariants(&self) {
        if let Some(root) = self.root {
            assert_eq!(self.nodes.get(root).parent(), None, "root has a parent");
            assert_eq!(self.check_subtree(root).to_usize(), self.len(), "root size != len");
        } else {
            assert_eq!(self.len(), 0, "empty root with live nodes");
        }

        let mut previous: Option<&K> = None;
        let mut current = self.first();
        while let Some(handle) = current {
            let key = self.nodes.get(handle).key();
            if let Some(previous) = previous {
                assert!(previous < key, "keys out of order");
            }
            previous = Some(key);
            current = self.successor(handle);
        }
    }

    fn check_subtree(&self, handle: Handle) -> Size {
        let node = self.nodes.get(handle);
        for child in [node.left(), node.right()].into_iter().flatten() {
            assert_eq!(self.nodes.get(child).parent(), Some(handle), "broken parent link");
        }
        let left = node.left().map_or(Size::ZERO, |h| self.check_subtree(h));
        let right = node.right().map_or(Size::ZERO, |h| self.check_subtree(h));
        assert_eq!(node.size(), Size::joining(left, right), "stale subtree size");
        assert!(left.weight() <= DELTA * right.weight(), "left side too heavy");
        assert!(right.weight() <= DELTA * left.weight(), "right side too heavy");
        node.size()
    }
}
