//! Fixed-size byte-blob container.
//!
//! [`RawTree`] stores keys of exactly `key_size` bytes and values of exactly
//! `value_size` bytes, ordered by a plain function over key bytes. Callers
//! that keep C-layout records in the tree overlay them on these blobs. The
//! container can be reconfigured in place for a different layout with
//! [`RawTree::init`].

use std::cmp::Ordering;
use std::fmt;

use crate::arena::Handle;
use crate::compare::Compare;
use crate::error::{Result, TreeError};
use crate::tree::{Item, Tree};

/// Ordering over raw key bytes.
pub type ByteOrder = fn(&[u8], &[u8]) -> Ordering;

/// Item stored in a [`RawTree`].
pub type RawItem = Item<Box<[u8]>, Box<[u8]>>;

/// Per-item hook run before a removed item is released.
pub type Destructor<'a> = &'a mut dyn FnMut(&mut RawItem);

#[derive(Clone, Copy)]
pub(crate) struct ByteCompare(ByteOrder);

impl Compare<[u8]> for ByteCompare {
    #[inline]
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        (self.0)(a, b)
    }
}

impl Compare<Box<[u8]>> for ByteCompare {
    #[inline]
    fn compare(&self, a: &Box<[u8]>, b: &Box<[u8]>) -> Ordering {
        (self.0)(a, b)
    }
}

/// Zero-filled buffer of `len` bytes, reporting allocation failure.
fn try_zeroed(len: usize) -> Result<Box<[u8]>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, 0);
    Ok(buf.into_boxed_slice())
}

fn try_copy(bytes: &[u8]) -> Result<Box<[u8]>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes.len())?;
    buf.extend_from_slice(bytes);
    Ok(buf.into_boxed_slice())
}

fn check_layout(key_size: usize, value_size: usize, compare: Option<ByteOrder>) -> Result<ByteOrder> {
    if key_size == 0 {
        return Err(TreeError::ZeroKeySize);
    }
    if value_size == 0 {
        return Err(TreeError::ZeroValueSize);
    }
    compare.ok_or(TreeError::MissingComparator)
}

/// Binary search tree over fixed-size byte keys and values.
#[derive(Clone)]
pub struct RawTree {
    key_size: usize,
    value_size: usize,
    tree: Tree<Box<[u8]>, Box<[u8]>, ByteCompare>,
}

impl RawTree {
    /// Empty tree for `key_size`-byte keys and `value_size`-byte values.
    ///
    /// Both sizes must be non-zero and `compare` must be present.
    pub fn create(key_size: usize, value_size: usize, compare: Option<ByteOrder>) -> Result<Self> {
        let compare = check_layout(key_size, value_size, compare)?;
        tracing::debug!(key_size, value_size, "created raw tree");
        Ok(Self {
            key_size,
            value_size,
            tree: Tree::with_comparator(ByteCompare(compare)),
        })
    }

    /// Discard every item and switch to a new layout and ordering.
    ///
    /// Arguments are validated first: on error the tree keeps its items,
    /// sizes and comparator.
    pub fn init(
        &mut self,
        key_size: usize,
        value_size: usize,
        compare: Option<ByteOrder>,
        destructor: Option<Destructor<'_>>,
    ) -> Result<&mut Self> {
        let compare = check_layout(key_size, value_size, compare)?;
        tracing::debug!(
            from_key = self.key_size,
            from_value = self.value_size,
            key_size,
            value_size,
            "reinitialising raw tree"
        );
        self.clear(destructor);
        self.key_size = key_size;
        self.value_size = value_size;
        self.tree.compare = ByteCompare(compare);
        Ok(self)
    }

    /// Remove every item, running `destructor` on each.
    pub fn clear(&mut self, destructor: Option<Destructor<'_>>) {
        match destructor {
            Some(destructor) => self.tree.clear_with(destructor),
            None => self.tree.clear(),
        }
    }

    /// Remove every item, running `destructor` on each, and release the tree.
    pub fn destroy(mut self, destructor: Option<Destructor<'_>>) {
        self.clear(destructor);
    }

    /// Length every key must have.
    pub fn key_size(&self) -> usize {
        self.key_size
    }

    /// Length of every stored value.
    pub fn value_size(&self) -> usize {
        self.value_size
    }

    /// Number of live items.
    pub fn count(&self) -> usize {
        self.tree.len()
    }

    /// Value bytes stored under `key`.
    pub fn item(&self, key: &[u8]) -> Option<&[u8]> {
        if key.len() != self.key_size {
            return None;
        }
        self.tree.get(key).map(|v| &**v)
    }

    /// Mutable value bytes stored under `key`.
    pub fn item_mut(&mut self, key: &[u8]) -> Option<&mut [u8]> {
        if key.len() != self.key_size {
            return None;
        }
        self.tree.get_mut(key).map(|v| &mut **v)
    }

    /// Value slot for `key`, created zero-filled if absent.
    ///
    /// The flag reports whether the slot is new. Fails if `key` is not
    /// `key_size` bytes or memory runs out; the tree is unchanged either way.
    pub fn insert(&mut self, key: &[u8]) -> Result<(&mut [u8], bool)> {
        if key.len() != self.key_size {
            return Err(TreeError::KeySize {
                expected: self.key_size,
                actual: key.len(),
            });
        }
        let value_size = self.value_size;
        let (value, created) = self
            .tree
            .try_insert_with(try_copy(key)?, || try_zeroed(value_size))?;
        Ok((&mut **value, created))
    }

    /// Remove `key`, running `destructor` on its item first.
    pub fn remove(&mut self, key: &[u8], destructor: Option<Destructor<'_>>) {
        if key.len() != self.key_size {
            return;
        }
        match destructor {
            Some(destructor) => {
                self.tree.remove_with(key, destructor);
            }
            None => {
                self.tree.remove(key);
            }
        }
    }

    /// Remove the item `handle` refers to. Returns the handle of the item
    /// after it, or [`Handle::STOP`].
    pub fn erase(&mut self, handle: Handle, destructor: Option<Destructor<'_>>) -> Handle {
        match destructor {
            Some(destructor) => self.tree.erase_with(handle, destructor),
            None => self.tree.erase(handle),
        }
    }

    /// Handle of the smallest key, or [`Handle::STOP`] when empty.
    pub fn first(&self) -> Handle {
        self.tree.first()
    }

    /// Handle of the largest key, or [`Handle::STOP`] when empty.
    pub fn last(&self) -> Handle {
        self.tree.last()
    }

    /// Handle of the next larger key. Stale handles step to [`Handle::STOP`].
    pub fn next(&self, handle: Handle) -> Handle {
        self.tree.next(handle)
    }

    /// Handle of the next smaller key.
    pub fn prev(&self, handle: Handle) -> Handle {
        self.tree.prev(handle)
    }

    /// Always [`Handle::STOP`].
    pub fn stop(&self) -> Handle {
        Handle::STOP
    }

    /// Item under `handle`, if it is still in the tree.
    pub fn current(&self, handle: Handle) -> Option<&RawItem> {
        self.tree.current(handle)
    }
}

impl fmt::Debug for RawTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTree")
            .field("key_size", &self.key_size)
            .field("value_size", &self.value_size)
            .field("count", &self.tree.len())
            .finish()
    }
}
