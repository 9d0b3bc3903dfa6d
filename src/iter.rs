use std::iter::FusedIterator;

use crate::arena::Handle;
use crate::compare::Compare;
use crate::tree::Tree;

/// Borrowing iterator over a [`Tree`] in comparator order.
///
/// Steps with [`Tree::next`] from the front and [`Tree::prev`] from the back;
/// `remaining` keeps the two ends from crossing.
pub struct Iter<'a, K, V, C> {
    tree: &'a Tree<K, V, C>,
    front: Handle,
    back: Handle,
    remaining: usize,
}

impl<'a, K, V, C: Compare<K>> Iter<'a, K, V, C> {
    pub(crate) fn new(tree: &'a Tree<K, V, C>) -> Self {
        Self {
            tree,
            front: tree.first(),
            back: tree.last(),
            remaining: tree.len(),
        }
    }
}

impl<'a, K, V, C: Compare<K>> Iterator for Iter<'a, K, V, C> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.tree.item_at(self.front)?;
        self.remaining -= 1;
        self.front = self.tree.next(self.front);
        Some((item.key(), item.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, C: Compare<K>> DoubleEndedIterator for Iter<'_, K, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.tree.item_at(self.back)?;
        self.remaining -= 1;
        self.back = self.tree.prev(self.back);
        Some((item.key(), item.value()))
    }
}

impl<K, V, C: Compare<K>> ExactSizeIterator for Iter<'_, K, V, C> {}

impl<K, V, C: Compare<K>> FusedIterator for Iter<'_, K, V, C> {}
