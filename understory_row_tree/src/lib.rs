// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_row_tree --heading-base-level=0

//! Understory Row Tree: an augmented order-statistics row tree for
//! virtualized tree/list views.
//!
//! A [`RowForest`] stores the visible rows of a hierarchical list as a forest
//! of nested red-black trees: one tree per nesting level, with a row that is
//! expanded owning a nested tree of its child rows. Every node carries
//! incrementally maintained subtree aggregates, so the queries a virtualized
//! view needs are all O(log n):
//!
//! - [`RowForest::find_by_count`]: the row at a logical index.
//! - [`RowForest::find_by_offset`]: the row at a pixel position, descending
//!   into nested trees.
//! - [`RowForest::node_offset`] / [`RowForest::node_parity`]: a row's pixel
//!   position and alternating-stripe parity.
//!
//! Edits ([`RowForest::insert_after`], [`RowForest::remove_node`],
//! [`RowForest::set_height`], [`RowForest::reorder`], expanding and
//! collapsing via [`RowForest::create_children`] and
//! [`RowForest::remove_tree`]) keep every aggregate exact before returning.
//! Row counts are scoped to one tree; pixel offsets and parity roll through
//! every nesting level, so an edit deep in an expanded subtree is reflected
//! in the top-level total immediately.
//!
//! Rows whose measurements are pending carry validity flags
//! ([`RowFlags::INVALID`], [`RowFlags::COLUMN_INVALID`]); the derived
//! [`RowFlags::DESCENDANTS_INVALID`] flag lets a validation sweep skip clean
//! regions entirely. See [`RowForest::mark_invalid`],
//! [`RowForest::mark_valid`], and [`RowForest::set_fixed_height`].
//!
//! This crate does not render, lay out columns, or interpret selection; it
//! is the bookkeeping core a view widget builds on.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_row_tree::RowForest;
//!
//! let mut forest = RowForest::new();
//! let top = forest.top();
//! let a = forest.insert_after(top, None, 10, true);
//! let b = forest.insert_after(top, Some(a), 20, true);
//! let c = forest.insert_after(top, Some(b), 30, true);
//!
//! assert_eq!(forest.total_height(top), 60);
//! assert_eq!(forest.node_offset(top, c), 30);
//!
//! // Expand b: its children live in a nested tree.
//! let children = forest.create_children(top, b);
//! let _b1 = forest.insert_after(children, None, 5, true);
//! assert_eq!(forest.total_height(top), 65);
//! assert_eq!(forest.row_count(top), 3);
//! assert_eq!(forest.node_offset(top, c), 35);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod balance;
mod check;
mod edit;
mod forest;
mod query;
mod types;
mod validity;

pub use forest::RowForest;
pub use types::{NodeId, RowFlags, TreeId};
