//! Node storage.
//!
//! Nodes live in a slot vector and refer to each other by `NodeId`. Freed
//! slots go onto a free list and are reused with a bumped generation, so a
//! [`Handle`] taken before the free no longer resolves afterwards.

use std::fmt;

use crate::error::Result;

// =============================================================================
// Identities
// =============================================================================

/// Slot index of a node. Structural links only; never handed out.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stable reference to a live node.
///
/// A handle stays valid until its node is removed, the node's item is replaced
/// by a successor splice, or the tree is cleared. [`Handle::STOP`] means "no
/// node": it ends iteration and is what every traversal returns on failure.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// The "no node" handle.
    pub const STOP: Handle = Handle {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Whether this is [`Handle::STOP`].
    #[inline]
    pub fn is_stop(self) -> bool {
        self == Self::STOP
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_stop() {
            f.write_str("Handle(STOP)")
        } else {
            write!(f, "Handle({}v{})", self.index, self.generation)
        }
    }
}

// =============================================================================
// Nodes
// =============================================================================

#[derive(Clone)]
pub(crate) struct Node<T> {
    pub(crate) payload: T,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl<T> Node<T> {
    pub(crate) fn new(payload: T, parent: Option<NodeId>) -> Self {
        Self {
            payload,
            left: None,
            right: None,
            parent,
        }
    }
}

#[derive(Clone)]
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

// =============================================================================
// Arena
// =============================================================================

#[derive(Clone)]
pub(crate) struct NodeArena<T> {
    slots: Vec<Slot<T>>,
    /// Vacant slot indices, reserved alongside `slots`.
    free: Vec<u32>,
}

impl<T> NodeArena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
        }
    }

    /// Store `node` and return its id. On failure nothing is stored and the
    /// node is dropped.
    pub(crate) fn alloc(&mut self, node: Node<T>) -> Result<NodeId> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.node.is_none(), "free list entry must be vacant");
            slot.node = Some(node);
            return Ok(NodeId(index));
        }

        let index = self.slots.len();
        debug_assert!(index < u32::MAX as usize, "node arena exhausted");
        self.slots.try_reserve(1)?;
        self.free.try_reserve(index + 1 - self.free.len())?;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        Ok(NodeId(index as u32))
    }

    /// Vacate a slot, bumping its generation, and hand the node back.
    pub(crate) fn free(&mut self, id: NodeId) -> Node<T> {
        let slot = &mut self.slots[id.index()];
        let node = slot.node.take().expect("freeing a vacant slot");
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.0);
        node
    }

    /// Bump a live slot's generation so handles issued before now go stale.
    pub(crate) fn reissue(&mut self, id: NodeId) {
        let slot = &mut self.slots[id.index()];
        debug_assert!(slot.node.is_some());
        slot.generation = slot.generation.wrapping_add(1);
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<T> {
        self.slots[id.index()]
            .node
            .as_ref()
            .expect("link to a vacant slot")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.slots[id.index()]
            .node
            .as_mut()
            .expect("link to a vacant slot")
    }

    #[inline]
    pub(crate) fn handle(&self, id: NodeId) -> Handle {
        Handle {
            index: id.0,
            generation: self.slots[id.index()].generation,
        }
    }

    /// Map a handle back to its node if it is still current.
    pub(crate) fn resolve(&self, handle: Handle) -> Option<NodeId> {
        if handle.is_stop() {
            return None;
        }
        let slot = self.slots.get(handle.index as usize)?;
        (slot.generation == handle.generation && slot.node.is_some()).then_some(NodeId(handle.index))
    }

    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
