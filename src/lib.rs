//! # bst-rs
//!
//! An ordered map on a plain (unbalanced) binary search tree whose nodes keep
//! a link to their parent. Items are reached through stable [`Handle`]s that
//! step forward and backward in key order without any external stack.
//!
//! Two front ends share the engine:
//!
//! - [`Tree`]: typed keys and values, ordered by [`Ord`] or any
//!   [`Compare`] implementation (closures included).
//! - [`RawTree`]: fixed-size byte blobs for keys and values with a function
//!   ordering, reconfigurable in place for another layout.
//!
//! ## Example
//!
//! ```rust
//! use bst_rs::Tree;
//!
//! let mut tree: Tree<&str, u32> = Tree::new();
//! *tree.insert("key2").unwrap().0 = 2;
//! *tree.insert("key1").unwrap().0 = 1;
//!
//! let first = tree.first();
//! assert_eq!(tree.current(first).unwrap().key(), &"key1");
//! let second = tree.next(first);
//! assert_eq!(tree.current(second).unwrap().value(), &2);
//! assert_eq!(tree.next(second), tree.stop());
//! ```
//!
//! There is no rebalancing. Keys inserted in sorted order produce a chain and
//! every operation costs time proportional to the tree height.

#![deny(unsafe_code)]
#![warn(clippy::all)]

mod arena;
mod compare;
mod error;
mod iter;
pub mod raw;
mod tree;

pub use arena::Handle;
pub use compare::{Compare, Natural};
pub use error::{Result, TreeError};
pub use iter::Iter;
pub use raw::RawTree;
pub use tree::{Item, Tree};

#[cfg(test)]
mod proptests;
