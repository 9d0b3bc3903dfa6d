//! The tree engine.
//!
//! An unbalanced binary search tree whose nodes carry parent links. Lookups
//! and inserts descend from the root under the tree's [`Compare`] order;
//! ordered traversal walks child links down and parent links up, so handles
//! can be stepped forward and backward without an auxiliary stack.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::mem;

use crate::arena::{Handle, Node, NodeArena, NodeId};
use crate::compare::{Compare, Natural};
use crate::error::Result;
use crate::iter::Iter;

// =============================================================================
// Items
// =============================================================================

/// A key and its value, owned by one node.
#[derive(Clone, PartialEq, Eq)]
pub struct Item<K, V> {
    key: K,
    value: V,
}

impl<K, V> Item<K, V> {
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Split into owned key and value.
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Item<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

/// Where a descent for a key ended.
#[derive(Clone, Copy)]
enum Probe {
    Empty,
    Found(NodeId),
    /// Key is absent; it would hang off `parent` on the given side.
    Vacant { parent: NodeId, left: bool },
}

// =============================================================================
// Tree
// =============================================================================

/// Ordered map on an unbalanced binary search tree.
///
/// Keys are ordered by `C` (their own [`Ord`] by default). The tree does no
/// rebalancing: inserting keys in sorted order builds a linked list, and every
/// operation is linear in the tree height.
pub struct Tree<K, V, C = Natural> {
    nodes: NodeArena<Item<K, V>>,
    root: Option<NodeId>,
    count: usize,
    pub(crate) compare: C,
}

impl<K: Ord, V> Tree<K, V> {
    /// Empty tree ordered by `K`'s [`Ord`].
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }

    /// Empty tree with room for `capacity` nodes before the arena grows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, Natural)
    }
}

impl<K: Ord, V> Default for Tree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C: Compare<K>> Tree<K, V, C> {
    /// Empty tree ordered by `compare`.
    pub fn with_comparator(compare: C) -> Self {
        Self {
            nodes: NodeArena::new(),
            root: None,
            count: 0,
            compare,
        }
    }

    /// Empty tree ordered by `compare` with room for `capacity` nodes.
    pub fn with_capacity_and_comparator(capacity: usize, compare: C) -> Self {
        Self {
            nodes: NodeArena::with_capacity(capacity),
            root: None,
            count: 0,
            compare,
        }
    }

    /// Number of live items.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the tree holds no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The ordering in use.
    pub fn comparator(&self) -> &C {
        &self.compare
    }

    // -------------------------------------------------------------------------
    // Reconfiguration
    // -------------------------------------------------------------------------

    /// Drop every item, then switch to a new ordering.
    ///
    /// `on_remove` sees each item once before it is dropped. The node storage
    /// is kept for reuse.
    pub fn init(&mut self, compare: C, on_remove: impl FnMut(&mut Item<K, V>)) -> &mut Self {
        self.clear_with(on_remove);
        self.compare = compare;
        self
    }

    /// Consume this tree and return an empty one over different key and value
    /// types.
    pub fn retype<K2, V2, C2: Compare<K2>>(
        self,
        compare: C2,
        on_remove: impl FnMut(&mut Item<K, V>),
    ) -> Tree<K2, V2, C2> {
        let capacity = self.nodes.live();
        self.destroy_with(on_remove);
        Tree::with_capacity_and_comparator(capacity, compare)
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.clear_with(|_| {});
    }

    /// Remove every item, children before parents, calling `on_remove` on each
    /// one before it is dropped. All outstanding handles go stale.
    pub fn clear_with(&mut self, mut on_remove: impl FnMut(&mut Item<K, V>)) {
        if self.count > 0 {
            tracing::debug!(count = self.count, "clearing tree");
        }

        // Post-order with an explicit stack: a node is revisited after each
        // child is detached and is only freed once it has none left.
        let mut stack: Vec<NodeId> = Vec::new();
        if let Some(root) = self.root.take() {
            stack.push(root);
        }
        while let Some(id) = stack.pop() {
            let node = self.nodes.get_mut(id);
            let child = node.left.take().or_else(|| node.right.take());
            if let Some(child) = child {
                stack.push(id);
                stack.push(child);
                continue;
            }
            let mut node = self.nodes.free(id);
            on_remove(&mut node.payload);
        }

        self.count = 0;
    }

    /// Remove every item with `on_remove`, then release the tree.
    pub fn destroy_with(mut self, on_remove: impl FnMut(&mut Item<K, V>)) {
        self.clear_with(on_remove);
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Descend from the root looking for `key`. Lookups may use any borrowed
    /// form of `K` the comparator also orders.
    fn probe<Q: ?Sized>(&self, key: &Q) -> Probe
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        let Some(mut current) = self.root else {
            return Probe::Empty;
        };
        loop {
            let node = self.nodes.get(current);
            let next = match self.compare.compare(key, node.payload.key.borrow()) {
                Ordering::Equal => return Probe::Found(current),
                Ordering::Less => node.left.ok_or(true),
                Ordering::Greater => node.right.ok_or(false),
            };
            match next {
                Ok(child) => current = child,
                Err(left) => {
                    return Probe::Vacant {
                        parent: current,
                        left,
                    }
                }
            }
        }
    }

    fn find_node<Q: ?Sized>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        match self.probe(key) {
            Probe::Found(id) => Some(id),
            Probe::Empty | Probe::Vacant { .. } => None,
        }
    }

    /// Value stored under `key`.
    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        self.find_node(key).map(|id| &self.nodes.get(id).payload.value)
    }

    /// Mutable value stored under `key`. The key itself stays fixed.
    pub fn get_mut<Q: ?Sized>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        let id = self.find_node(key)?;
        Some(&mut self.nodes.get_mut(id).payload.value)
    }

    /// Whether `key` is present.
    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        self.find_node(key).is_some()
    }

    /// Handle of the node holding `key`, or [`Handle::STOP`].
    pub fn find<Q: ?Sized>(&self, key: &Q) -> Handle
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        self.find_node(key)
            .map_or(Handle::STOP, |id| self.nodes.handle(id))
    }

    // -------------------------------------------------------------------------
    // Insert
    // -------------------------------------------------------------------------

    /// Get the value slot for `key`, creating it with `V::default()` if absent.
    ///
    /// The flag is `true` when the slot was created by this call. An existing
    /// value is returned untouched.
    pub fn insert(&mut self, key: K) -> Result<(&mut V, bool)>
    where
        V: Default,
    {
        self.insert_with(key, V::default)
    }

    /// Like [`Tree::insert`], building a new value with `make`.
    ///
    /// On allocation failure the tree is unchanged and `key` is dropped.
    pub fn insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> Result<(&mut V, bool)> {
        self.try_insert_with(key, || Ok(make()))
    }

    /// One descent for `key`; `make` runs only if the key is absent. If `make`
    /// or the node allocation fails, nothing is linked.
    pub(crate) fn try_insert_with(
        &mut self,
        key: K,
        make: impl FnOnce() -> Result<V>,
    ) -> Result<(&mut V, bool)> {
        let parent = match self.probe(&key) {
            Probe::Found(id) => return Ok((&mut self.nodes.get_mut(id).payload.value, false)),
            Probe::Empty => None,
            Probe::Vacant { parent, left } => Some((parent, left)),
        };

        let item = Item { key, value: make()? };
        let id = self
            .nodes
            .alloc(Node::new(item, parent.map(|(p, _)| p)))
            .inspect_err(|err| tracing::warn!(%err, "node allocation failed"))?;

        match parent {
            None => self.root = Some(id),
            Some((p, true)) => self.nodes.get_mut(p).left = Some(id),
            Some((p, false)) => self.nodes.get_mut(p).right = Some(id),
        }
        self.count += 1;
        Ok((&mut self.nodes.get_mut(id).payload.value, true))
    }

    // -------------------------------------------------------------------------
    // Remove
    // -------------------------------------------------------------------------

    /// Point whichever link of `parent` held `old` (or the root) at `new`.
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        let Some(parent) = parent else {
            self.root = new;
            return;
        };
        let parent = self.nodes.get_mut(parent);
        if parent.left == Some(old) {
            parent.left = new;
        } else {
            debug_assert_eq!(parent.right, Some(old), "parent does not link to child");
            parent.right = new;
        }
    }

    /// Take the item at `id` out of the tree structure.
    ///
    /// A node with at most one child is spliced out and freed. A node with two
    /// children stays: its in-order successor is spliced out instead and the
    /// successor's item moves in, displacing the returned item.
    fn unlink(&mut self, id: NodeId) -> Item<K, V> {
        let node = self.nodes.get(id);
        let (left, right, parent) = (node.left, node.right, node.parent);
        match (left, right) {
            (Some(_), Some(right)) => {
                let successor = self.leftmost(right);
                tracing::trace!(?id, ?successor, "splicing in-order successor");
                // Leftmost, so at most a right child: recursion ends here.
                let moved = self.unlink(successor);
                self.nodes.reissue(id);
                mem::replace(&mut self.nodes.get_mut(id).payload, moved)
            }
            (child, None) | (None, child) => {
                self.replace_child(parent, id, child);
                if let Some(child) = child {
                    self.nodes.get_mut(child).parent = parent;
                }
                self.nodes.free(id).payload
            }
        }
    }

    fn remove_node(&mut self, id: NodeId) -> Item<K, V> {
        let item = self.unlink(id);
        self.count -= 1;
        if self.count == 0 {
            self.root = None;
        }
        item
    }

    /// Remove `key` and hand back its item.
    pub fn remove<Q: ?Sized>(&mut self, key: &Q) -> Option<Item<K, V>>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        let id = self.find_node(key)?;
        Some(self.remove_node(id))
    }

    /// Remove `key`, letting `on_remove` see the item before it is dropped.
    /// Returns whether the key was present.
    pub fn remove_with<Q: ?Sized>(
        &mut self,
        key: &Q,
        on_remove: impl FnOnce(&mut Item<K, V>),
    ) -> bool
    where
        K: Borrow<Q>,
        C: Compare<Q>,
    {
        match self.remove(key) {
            Some(mut item) => {
                on_remove(&mut item);
                true
            }
            None => false,
        }
    }

    /// Remove the item `handle` refers to and return the handle of the item
    /// that followed it, or [`Handle::STOP`].
    ///
    /// A stale or `STOP` handle removes nothing.
    pub fn erase(&mut self, handle: Handle) -> Handle {
        self.erase_with(handle, |_| {})
    }

    /// Like [`Tree::erase`], letting `on_remove` see the item before it is
    /// dropped.
    pub fn erase_with(&mut self, handle: Handle, on_remove: impl FnOnce(&mut Item<K, V>)) -> Handle {
        let Some(id) = self.nodes.resolve(handle) else {
            return Handle::STOP;
        };
        let node = self.nodes.get(id);
        let splices = node.left.is_some() && node.right.is_some();
        // The successor of a two-child node moves into that node.
        let next = if splices { Handle::STOP } else { self.next(handle) };

        let mut item = self.remove_node(id);
        on_remove(&mut item);

        if splices {
            self.nodes.handle(id)
        } else {
            next
        }
    }

    // -------------------------------------------------------------------------
    // Traversal
    // -------------------------------------------------------------------------

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.nodes.get(id).left {
            id = left;
        }
        id
    }

    fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.nodes.get(id).right {
            id = right;
        }
        id
    }

    /// Nearest ancestor of `id` whose key orders `wanted` relative to `id`'s.
    fn ancestor(&self, id: NodeId, wanted: Ordering) -> Handle {
        let key = &self.nodes.get(id).payload.key;
        let mut current = self.nodes.get(id).parent;
        while let Some(parent) = current {
            let node = self.nodes.get(parent);
            if self.compare.compare(&node.payload.key, key) == wanted {
                return self.nodes.handle(parent);
            }
            current = node.parent;
        }
        Handle::STOP
    }

    /// Handle of the smallest key.
    pub fn first(&self) -> Handle {
        self.root
            .map_or(Handle::STOP, |root| self.nodes.handle(self.leftmost(root)))
    }

    /// Handle of the largest key.
    pub fn last(&self) -> Handle {
        self.root
            .map_or(Handle::STOP, |root| self.nodes.handle(self.rightmost(root)))
    }

    /// Handle of the next larger key.
    pub fn next(&self, handle: Handle) -> Handle {
        let Some(id) = self.nodes.resolve(handle) else {
            return Handle::STOP;
        };
        match self.nodes.get(id).right {
            Some(right) => self.nodes.handle(self.leftmost(right)),
            None => self.ancestor(id, Ordering::Greater),
        }
    }

    /// Handle of the next smaller key.
    pub fn prev(&self, handle: Handle) -> Handle {
        let Some(id) = self.nodes.resolve(handle) else {
            return Handle::STOP;
        };
        match self.nodes.get(id).left {
            Some(left) => self.nodes.handle(self.rightmost(left)),
            None => self.ancestor(id, Ordering::Less),
        }
    }

    /// Always [`Handle::STOP`].
    #[inline]
    pub fn stop(&self) -> Handle {
        Handle::STOP
    }

    /// Resolve a live handle, confirming its key still leads back to it.
    fn current_node(&self, handle: Handle) -> Option<NodeId> {
        let id = self.nodes.resolve(handle)?;
        (self.find_node(&self.nodes.get(id).payload.key) == Some(id)).then_some(id)
    }

    /// The item `handle` refers to, if it is still in the tree.
    pub fn current(&self, handle: Handle) -> Option<&Item<K, V>> {
        self.current_node(handle).map(|id| &self.nodes.get(id).payload)
    }

    /// Mutable value under `handle`, if it is still in the tree.
    pub fn current_mut(&mut self, handle: Handle) -> Option<&mut V> {
        let id = self.current_node(handle)?;
        Some(&mut self.nodes.get_mut(id).payload.value)
    }

    /// Item under `handle` without the key re-lookup [`Tree::current`] does.
    /// Handles taken while the tree stays borrowed cannot go stale.
    pub(crate) fn item_at(&self, handle: Handle) -> Option<&Item<K, V>> {
        self.nodes.resolve(handle).map(|id| &self.nodes.get(id).payload)
    }

    /// Items in ascending order.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter::new(self)
    }
}

// Raw access for the structural checks in `proptests`.
#[cfg(test)]
impl<K, V, C> Tree<K, V, C> {
    pub(crate) fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<Item<K, V>> {
        self.nodes.get(id)
    }

    pub(crate) fn live_nodes(&self) -> usize {
        self.nodes.live()
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for Tree<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            count: self.count,
            compare: self.compare.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C: Compare<K>> fmt::Debug for Tree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C: Compare<K>> IntoIterator for &'a Tree<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
