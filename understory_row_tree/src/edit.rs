// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural edits: insertion, removal, height changes, and reordering.
//!
//! Every edit leaves all aggregates exact before it returns. Row counts
//! propagate only within the edited tree; offsets and parity propagate
//! through every enclosing tree, so a pixel edit deep inside a nested tree
//! is visible at the top level immediately.

use alloc::vec::Vec;

use crate::RowForest;
use crate::forest::Color;
use crate::types::{NodeId, RowFlags, TreeId};

impl RowForest {
    /// Insert a new row of the given pixel `height` directly after `current`.
    ///
    /// `current == None` requires an empty tree and inserts the first row.
    /// `valid == false` marks the new row invalid (its measurement is still
    /// pending), which also flags its ancestors as having invalid
    /// descendants.
    ///
    /// # Panics
    ///
    /// Panics if `current` does not belong to `tree`, or if `current` is
    /// `None` while `tree` is not empty.
    pub fn insert_after(
        &mut self,
        tree: TreeId,
        current: Option<NodeId>,
        height: i32,
        valid: bool,
    ) -> NodeId {
        let mut attach = current;
        let mut as_right = true;
        if let Some(c) = current {
            assert_eq!(self.node(c).tree, tree, "anchor does not belong to this tree");
            if let Some(r) = self.node(c).right {
                // The in-order successor inside the subtree has a free left
                // slot.
                let mut leftmost = r;
                while let Some(l) = self.node(leftmost).left {
                    leftmost = l;
                }
                attach = Some(leftmost);
                as_right = false;
            }
        }
        self.insert_at(tree, attach, as_right, height, valid)
    }

    /// Insert a new row of the given pixel `height` directly before
    /// `current`.
    ///
    /// `current == None` requires an empty tree and inserts the first row.
    ///
    /// # Panics
    ///
    /// Panics if `current` does not belong to `tree`, or if `current` is
    /// `None` while `tree` is not empty.
    pub fn insert_before(
        &mut self,
        tree: TreeId,
        current: Option<NodeId>,
        height: i32,
        valid: bool,
    ) -> NodeId {
        let mut attach = current;
        let mut as_right = false;
        if let Some(c) = current {
            assert_eq!(self.node(c).tree, tree, "anchor does not belong to this tree");
            if let Some(l) = self.node(c).left {
                let mut rightmost = l;
                while let Some(r) = self.node(rightmost).right {
                    rightmost = r;
                }
                attach = Some(rightmost);
                as_right = true;
            }
        }
        self.insert_at(tree, attach, as_right, height, valid)
    }

    fn insert_at(
        &mut self,
        tree: TreeId,
        attach: Option<NodeId>,
        as_right: bool,
        height: i32,
        valid: bool,
    ) -> NodeId {
        let node = self.alloc_node(tree, height);
        match attach {
            Some(a) => {
                self.node_mut(node).parent = Some(a);
                if as_right {
                    self.node_mut(a).right = Some(node);
                } else {
                    self.node_mut(a).left = Some(node);
                }
            }
            None => {
                assert!(
                    self.tree(tree).root.is_none(),
                    "an anchor row is required unless the tree is empty"
                );
                self.tree_mut(tree).root = Some(node);
            }
        }

        let start = self.node(node).parent;
        self.for_each_ancestor(tree, start, |forest, n, in_origin| {
            if in_origin {
                forest.node_mut(n).count += 1;
            }
            let n = forest.node_mut(n);
            n.parity ^= 1;
            n.offset += height;
            true
        });

        if valid {
            self.mark_valid(tree, node);
        } else {
            self.mark_invalid(tree, node);
        }
        self.insert_fixup(tree, node);
        node
    }

    /// Remove one row from `tree`.
    ///
    /// If the removed row owns a nested child tree and has at most one tree
    /// child, the nested tree is removed along with it. When both tree
    /// children exist the row's in-order successor takes over its position
    /// in the tree, so the successor's `NodeId` is the one that dies; the
    /// removed row must have been collapsed first.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to `tree`, or if a row with two tree
    /// children still owns a nested child tree.
    pub fn remove_node(&mut self, tree: TreeId, node: NodeId) {
        assert_eq!(self.node(node).tree, tree, "node does not belong to this tree");

        let y = if self.node(node).left.is_none() || self.node(node).right.is_none() {
            node
        } else {
            assert!(
                self.node(node).children.is_none(),
                "collapse a row's child tree before removing it"
            );
            let mut y = self.node(node).right.expect("two-child node has a right child");
            while let Some(l) = self.node(y).left {
                y = l;
            }
            y
        };

        // Counts change only within this tree.
        let mut cur = Some(y);
        while let Some(n) = cur {
            self.node_mut(n).count -= 1;
            cur = self.node(n).parent;
        }

        // Offsets and validity/parity change through every enclosing tree.
        let y_height = self.own_height(y);
        let removed = y_height + self.nested_offset(y);
        self.for_each_ancestor(tree, Some(y), |forest, n, _| {
            forest.node_mut(n).offset -= removed;
            forest.fixup_validation(n);
            forest.fixup_parity(n);
            true
        });

        // Splice y out; x is y's only child, if any.
        let x = self.node(y).left.or(self.node(y).right);
        let y_parent = self.node(y).parent;
        let y_color = self.node(y).color;
        if let Some(x) = x {
            self.node_mut(x).parent = y_parent;
        }
        match y_parent {
            Some(p) => {
                if self.node(p).left == Some(y) {
                    self.node_mut(p).left = x;
                } else {
                    self.node_mut(p).right = x;
                }
            }
            None => self.tree_mut(tree).root = x,
        }

        // The first walk ran with y still linked; repair from the splice
        // point now that it is gone.
        self.for_each_ancestor(tree, x.or(y_parent), |forest, n, _| {
            forest.fixup_validation(n);
            forest.fixup_parity(n);
            true
        });

        if y != node {
            // The successor's payload moves into the removed row's slot.
            let y_flags = self.node(y).flags;
            let y_children = self.node(y).children;
            {
                let n = self.node_mut(node);
                n.flags = y_flags;
                n.children = y_children;
            }
            if let Some(ct) = y_children {
                self.tree_mut(ct).parent_node = Some(node);
            }
            self.fixup_validation(node);
            self.fixup_parity(node);

            let diff = y_height - self.own_height(node);
            self.for_each_ancestor(tree, Some(node), |forest, n, _| {
                forest.node_mut(n).offset += diff;
                forest.fixup_validation(n);
                forest.fixup_parity(n);
                true
            });
        } else if let Some(ct) = self.node(y).children {
            self.free_tree_slots(ct);
        }

        if y_color == Color::Black {
            self.remove_fixup(tree, x, y_parent);
        }
        self.free_node_slot(y);
    }

    /// Remove a whole nested tree, rows and deeper nesting included,
    /// modeling the row that owns it being collapsed.
    ///
    /// The owning row stays; only its `children` link is severed. Offsets
    /// above shrink by the tree's total height, and ancestor parity flips
    /// once when the removed tree held an odd number of rows.
    ///
    /// # Panics
    ///
    /// Panics if `tree` is the top-level tree.
    pub fn remove_tree(&mut self, tree: TreeId) {
        assert_ne!(tree, self.top(), "cannot remove the top-level tree");
        let (parent_tree, parent_node) = self
            .tree_parent(tree)
            .expect("a non-top tree hangs under a parent row");

        let height = self.total_height(tree);
        let odd = self.parity_of(self.tree(tree).root) == 1;
        // The ancestor revalidation below must not see this tree as dirty.
        if let Some(root) = self.tree(tree).root {
            self.node_mut(root).flags.remove(RowFlags::DESCENDANTS_INVALID);
        }

        self.for_each_ancestor(parent_tree, Some(parent_node), |forest, n, _| {
            forest.fixup_validation(n);
            forest.node_mut(n).offset -= height;
            if odd {
                forest.node_mut(n).parity ^= 1;
            }
            true
        });

        self.node_mut(parent_node).children = None;
        self.free_tree_slots(tree);
    }

    /// Set the row's own pixel height, propagating the delta to every
    /// enclosing tree. A no-op when the height is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to `tree`.
    pub fn set_height(&mut self, tree: TreeId, node: NodeId, height: i32) {
        assert_eq!(self.node(node).tree, tree, "node does not belong to this tree");
        let diff = height - self.own_height(node);
        if diff == 0 {
            return;
        }
        self.for_each_ancestor(tree, Some(node), |forest, n, _| {
            forest.node_mut(n).offset += diff;
            true
        });
    }

    /// Permute the rows of `tree`: the row at position `i` afterwards is the
    /// row that was at position `new_order[i]`.
    ///
    /// The node structure and colors stay put; only the row payloads (nested
    /// child trees, flags, own heights) move, followed by one post-order
    /// aggregate rebuild. `NodeId`s therefore keep their position, not their
    /// row. Nested trees travel with their rows and are untouched inside.
    ///
    /// # Panics
    ///
    /// Panics if `new_order` is empty, its length differs from the row
    /// count, or it is not a permutation of `0..len`.
    pub fn reorder(&mut self, tree: TreeId, new_order: &[usize]) {
        assert!(!new_order.is_empty(), "reorder needs at least one row");
        assert_eq!(
            new_order.len(),
            self.row_count(tree),
            "permutation length must match the row count"
        );

        let mut rows: Vec<NodeId> = Vec::with_capacity(new_order.len());
        let mut cur = self.first(tree);
        while let Some(n) = cur {
            rows.push(n);
            cur = self.next(tree, n);
        }

        let payloads: Vec<(Option<TreeId>, RowFlags, i32)> = rows
            .iter()
            .map(|&n| (self.node(n).children, self.node(n).flags, self.own_height(n)))
            .collect();

        for (i, &n) in rows.iter().enumerate() {
            let (children, flags, height) = payloads[new_order[i]];
            {
                let node = self.node_mut(n);
                node.children = children;
                node.flags = flags;
                // Park the bare height; the fixup below rebuilds the
                // aggregate.
                node.offset = height;
            }
            if let Some(ct) = children {
                self.tree_mut(ct).parent_node = Some(n);
            }
        }

        let root = self.tree(tree).root.expect("non-empty tree has a root");
        self.reorder_fixup(root);
    }

    /// Rebuild offset, parity, and the derived validity flag bottom-up after
    /// [`RowForest::reorder`] parked bare heights in `offset`.
    fn reorder_fixup(&mut self, node: NodeId) {
        if let Some(l) = self.node(node).left {
            self.reorder_fixup(l);
        }
        if let Some(r) = self.node(node).right {
            self.reorder_fixup(r);
        }
        let own = self.node(node).offset;
        self.refresh_offset(node, own);
        self.fixup_parity(node);
        self.fixup_validation(node);
    }
}
