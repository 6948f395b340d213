use core::num::NonZero;
use core::sync::atomic::{AtomicUsize, Ordering};

use super::handle::{Generation, Handle};

static NEXT_TREE_ID: AtomicUsize = AtomicUsize::new(1);

/// Identifies one tree instance for the lifetime of its storage.
///
/// Clones get a new id; moving or swapping a tree carries its id along.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(crate) struct TreeId(NonZero<usize>);

impl TreeId {
    pub(crate) fn fresh() -> Self {
        let id = NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed);
        Self(NonZero::new(id).expect("`TreeId::fresh()` - tree ids exhausted!"))
    }
}

/// Number of times a tree has been cleared.
///
/// Clearing releases every arena slot, so slot generations start over; the epoch keeps
/// cursors from before the clear apart from cursors taken after it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub(crate) struct Epoch(u64);

impl Epoch {
    #[inline]
    #[must_use]
    pub(crate) fn next(self) -> Self {
        Self(self.0.checked_add(1).expect("`Epoch::next()` - clear epochs exhausted!"))
    }
}

/// A node stamped with the generation it was observed in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(crate) struct NodeRef {
    pub(crate) handle: Handle,
    pub(crate) generation: Generation,
}

/// Position inside a `RawTree`: unset, past-the-end, or on a node.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub(crate) struct RawCursor {
    tree: Option<TreeId>,
    epoch: Epoch,
    node: Option<NodeRef>,
}

impl RawCursor {
    pub(crate) const UNSET: Self = Self {
        tree: None,
        epoch: Epoch(0),
        node: None,
    };

    pub(crate) const fn end(tree: TreeId, epoch: Epoch) -> Self {
        Self {
            tree: Some(tree),
            epoch,
            node: None,
        }
    }

    pub(crate) const fn at(tree: TreeId, epoch: Epoch, node: NodeRef) -> Self {
        Self {
            tree: Some(tree),
            epoch,
            node: Some(node),
        }
    }

    #[inline]
    pub(crate) const fn tree(self) -> Option<TreeId> {
        self.tree
    }

    #[inline]
    pub(crate) const fn epoch(self) -> Epoch {
        self.epoch
    }

    #[inline]
    pub(crate) const fn node(self) -> Option<NodeRef> {
        self.node
    }
}
