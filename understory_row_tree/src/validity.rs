// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Validity tracking.
//!
//! A row is dirty when it carries [`RowFlags::INVALID`] (full re-measure
//! needed) or [`RowFlags::COLUMN_INVALID`] (only per-column data is stale).
//! [`RowFlags::DESCENDANTS_INVALID`] is derived: set on a row exactly when
//! that row or anything below it, nested trees included, is dirty. A
//! validation pass descends only into subtrees whose root carries the
//! derived flag, so clean regions cost nothing.

use smallvec::SmallVec;

use crate::RowForest;
use crate::types::{NodeId, RowFlags, TreeId};

impl RowForest {
    /// Recompute the derived `DESCENDANTS_INVALID` flag of one node from its
    /// own validity and its subtrees' derived flags. O(1); callers apply it
    /// bottom-up.
    pub(crate) fn fixup_validation(&mut self, node: NodeId) {
        let n = self.node(node);
        let dirty = n.flags.intersects(RowFlags::INVALID | RowFlags::COLUMN_INVALID)
            || self.desc_invalid(n.left)
            || self.desc_invalid(n.right)
            || self.nested_desc_invalid(node);
        if dirty {
            self.node_mut(node).flags.insert(RowFlags::DESCENDANTS_INVALID);
        } else {
            self.node_mut(node).flags.remove(RowFlags::DESCENDANTS_INVALID);
        }
    }

    /// Mark one row as needing a full re-measure.
    ///
    /// Ancestors through every enclosing tree gain `DESCENDANTS_INVALID`;
    /// the walk stops early at the first ancestor that already has it.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to `tree`.
    pub fn mark_invalid(&mut self, tree: TreeId, node: NodeId) {
        assert_eq!(self.node(node).tree, tree, "node does not belong to this tree");
        if self.node(node).flags.contains(RowFlags::INVALID) {
            return;
        }
        self.node_mut(node).flags.insert(RowFlags::INVALID);
        self.for_each_ancestor(tree, Some(node), |forest, n, _| {
            let flags = &mut forest.node_mut(n).flags;
            if flags.contains(RowFlags::DESCENDANTS_INVALID) {
                return false;
            }
            flags.insert(RowFlags::DESCENDANTS_INVALID);
            true
        });
    }

    /// Mark one row as fully measured again.
    ///
    /// Clears `INVALID` and `COLUMN_INVALID` on the row, then clears
    /// `DESCENDANTS_INVALID` upward until an ancestor is still dirty for
    /// another reason.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to `tree`.
    pub fn mark_valid(&mut self, tree: TreeId, node: NodeId) {
        assert_eq!(self.node(node).tree, tree, "node does not belong to this tree");
        if !self
            .node(node)
            .flags
            .intersects(RowFlags::INVALID | RowFlags::COLUMN_INVALID)
        {
            return;
        }
        self.node_mut(node)
            .flags
            .remove(RowFlags::INVALID | RowFlags::COLUMN_INVALID);
        self.for_each_ancestor(tree, Some(node), |forest, n, _| {
            let nd = forest.node(n);
            if nd.flags.intersects(RowFlags::INVALID | RowFlags::COLUMN_INVALID)
                || forest.desc_invalid(nd.left)
                || forest.desc_invalid(nd.right)
                || forest.nested_desc_invalid(n)
            {
                return false;
            }
            forest.node_mut(n).flags.remove(RowFlags::DESCENDANTS_INVALID);
            true
        });
    }

    /// Mark every row of `tree` and all its nested trees `INVALID`.
    ///
    /// Flags change only within `tree` and below; ancestors of `tree` are
    /// not updated, so this is normally called on the top-level tree.
    pub fn mark_invalid_subtree(&mut self, tree: TreeId) {
        self.sweep(tree, |forest, _tree, node| {
            forest
                .node_mut(node)
                .flags
                .insert(RowFlags::INVALID | RowFlags::DESCENDANTS_INVALID);
        });
    }

    /// Mark every row of `tree` and all its nested trees `COLUMN_INVALID`,
    /// unless the row is already fully `INVALID`.
    ///
    /// Like [`RowForest::mark_invalid_subtree`], ancestors of `tree` are not
    /// updated.
    pub fn mark_column_invalid_subtree(&mut self, tree: TreeId) {
        self.sweep(tree, |forest, _tree, node| {
            let flags = &mut forest.node_mut(node).flags;
            if !flags.contains(RowFlags::INVALID) {
                flags.insert(RowFlags::COLUMN_INVALID);
            }
            flags.insert(RowFlags::DESCENDANTS_INVALID);
        });
    }

    /// Give every `INVALID` row in `tree` and its nested trees the same
    /// fixed pixel height, optionally revalidating each as it is resized.
    ///
    /// Fixed-height views use this to validate the whole model in one sweep
    /// without per-row measurement.
    pub fn set_fixed_height(&mut self, tree: TreeId, height: i32, mark_valid: bool) {
        self.sweep(tree, |forest, tree, node| {
            if forest.node(node).flags.contains(RowFlags::INVALID) {
                forest.set_height(tree, node, height);
                if mark_valid {
                    forest.mark_valid(tree, node);
                }
            }
        });
    }

    /// Visit every row of `tree` and its nested trees in order. Uses an
    /// explicit stack: nesting depth is caller-controlled data.
    fn sweep<F>(&mut self, tree: TreeId, mut f: F)
    where
        F: FnMut(&mut Self, TreeId, NodeId),
    {
        let mut stack: SmallVec<[TreeId; 8]> = SmallVec::new();
        stack.push(tree);
        while let Some(t) = stack.pop() {
            let mut cur = self.first(t);
            while let Some(n) = cur {
                f(self, t, n);
                if let Some(ct) = self.node(n).children {
                    if !self.is_empty(ct) {
                        stack.push(ct);
                    }
                }
                cur = self.next(t, n);
            }
        }
    }
}
