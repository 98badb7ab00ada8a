// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Red-black rebalancing: rotations and the insert/remove fixup loops.
//!
//! Rotations do more than relink: the `count`, `offset`, and `parity`
//! aggregates and the derived `DESCENDANTS_INVALID` flag are local functions
//! of a node's children, so both rotated nodes are recomputed before the
//! rotation returns. This keeps every aggregate exact at all times; no
//! deferred repair pass exists.

use crate::RowForest;
use crate::forest::Color;
use crate::types::{NodeId, TreeId};

impl RowForest {
    /// Rotate `node` left within `tree`. `node.right` must exist.
    pub(crate) fn rotate_left(&mut self, tree: TreeId, node: NodeId) {
        let right = self
            .node(node)
            .right
            .expect("rotate_left needs a right child");

        // Own heights must be read before the subtrees move.
        let node_height = self.own_height(node);
        let right_height = self.own_height(right);

        let inner = self.node(right).left;
        self.node_mut(node).right = inner;
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(node);
        }

        let parent = self.node(node).parent;
        self.node_mut(right).parent = parent;
        match parent {
            Some(p) => {
                if self.node(p).left == Some(node) {
                    self.node_mut(p).left = Some(right);
                } else {
                    self.node_mut(p).right = Some(right);
                }
            }
            None => self.tree_mut(tree).root = Some(right),
        }

        self.node_mut(right).left = Some(node);
        self.node_mut(node).parent = Some(right);

        // Bottom-up: `node` is now a child of `right`.
        self.refresh_count(node);
        self.refresh_offset(node, node_height);
        self.fixup_validation(node);
        self.fixup_parity(node);
        self.refresh_count(right);
        self.refresh_offset(right, right_height);
        self.fixup_validation(right);
        self.fixup_parity(right);
    }

    /// Rotate `node` right within `tree`. `node.left` must exist.
    pub(crate) fn rotate_right(&mut self, tree: TreeId, node: NodeId) {
        let left = self
            .node(node)
            .left
            .expect("rotate_right needs a left child");

        let node_height = self.own_height(node);
        let left_height = self.own_height(left);

        let inner = self.node(left).right;
        self.node_mut(node).left = inner;
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(node);
        }

        let parent = self.node(node).parent;
        self.node_mut(left).parent = parent;
        match parent {
            Some(p) => {
                if self.node(p).right == Some(node) {
                    self.node_mut(p).right = Some(left);
                } else {
                    self.node_mut(p).left = Some(left);
                }
            }
            None => self.tree_mut(tree).root = Some(left),
        }

        self.node_mut(left).right = Some(node);
        self.node_mut(node).parent = Some(left);

        self.refresh_count(node);
        self.refresh_offset(node, node_height);
        self.fixup_validation(node);
        self.fixup_parity(node);
        self.refresh_count(left);
        self.refresh_offset(left, left_height);
        self.fixup_validation(left);
        self.fixup_parity(left);
    }

    /// Restore the red-black properties after `node` was inserted red.
    pub(crate) fn insert_fixup(&mut self, tree: TreeId, mut node: NodeId) {
        while let Some(parent) = self
            .node(node)
            .parent
            .filter(|&p| self.node(p).color == Color::Red)
        {
            // A red parent is never the root, so the grandparent exists.
            let grand = self
                .node(parent)
                .parent
                .expect("red node cannot be the root");
            if Some(parent) == self.node(grand).left {
                let uncle = self.node(grand).right;
                if let Some(u) = uncle.filter(|&u| self.node(u).color == Color::Red) {
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(u).color = Color::Black;
                    self.node_mut(grand).color = Color::Red;
                    node = grand;
                } else {
                    if Some(node) == self.node(parent).right {
                        node = parent;
                        self.rotate_left(tree, node);
                    }
                    let parent = self.node(node).parent.expect("rotated node keeps a parent");
                    let grand = self
                        .node(parent)
                        .parent
                        .expect("red node cannot be the root");
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(grand).color = Color::Red;
                    self.rotate_right(tree, grand);
                }
            } else {
                let uncle = self.node(grand).left;
                if let Some(u) = uncle.filter(|&u| self.node(u).color == Color::Red) {
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(u).color = Color::Black;
                    self.node_mut(grand).color = Color::Red;
                    node = grand;
                } else {
                    if Some(node) == self.node(parent).left {
                        node = parent;
                        self.rotate_right(tree, node);
                    }
                    let parent = self.node(node).parent.expect("rotated node keeps a parent");
                    let grand = self
                        .node(parent)
                        .parent
                        .expect("red node cannot be the root");
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(grand).color = Color::Red;
                    self.rotate_left(tree, grand);
                }
            }
        }
        let root = self.tree(tree).root.expect("fixup runs on a non-empty tree");
        self.node_mut(root).color = Color::Black;
    }

    /// Restore the red-black properties after a black node was spliced out.
    ///
    /// `x` is the child that replaced the spliced node (possibly absent) and
    /// `parent` its parent. The pair is tracked explicitly because `x` may be
    /// `None`.
    pub(crate) fn remove_fixup(
        &mut self,
        tree: TreeId,
        mut x: Option<NodeId>,
        mut parent: Option<NodeId>,
    ) {
        while x != self.tree(tree).root && self.color_of(x) == Color::Black {
            let Some(p) = parent else { break };
            if x == self.node(p).left {
                let mut w = self
                    .node(p)
                    .right
                    .expect("black-deficient node has a sibling");
                if self.node(w).color == Color::Red {
                    self.node_mut(w).color = Color::Black;
                    self.node_mut(p).color = Color::Red;
                    self.rotate_left(tree, p);
                    w = self
                        .node(p)
                        .right
                        .expect("black-deficient node has a sibling");
                }
                if self.color_of(self.node(w).left) == Color::Black
                    && self.color_of(self.node(w).right) == Color::Black
                {
                    self.node_mut(w).color = Color::Red;
                    x = Some(p);
                    parent = self.node(p).parent;
                } else {
                    if self.color_of(self.node(w).right) == Color::Black {
                        if let Some(wl) = self.node(w).left {
                            self.node_mut(wl).color = Color::Black;
                        }
                        self.node_mut(w).color = Color::Red;
                        self.rotate_right(tree, w);
                        w = self
                            .node(p)
                            .right
                            .expect("black-deficient node has a sibling");
                    }
                    self.node_mut(w).color = self.node(p).color;
                    self.node_mut(p).color = Color::Black;
                    if let Some(wr) = self.node(w).right {
                        self.node_mut(wr).color = Color::Black;
                    }
                    self.rotate_left(tree, p);
                    x = self.tree(tree).root;
                    parent = None;
                }
            } else {
                let mut w = self
                    .node(p)
                    .left
                    .expect("black-deficient node has a sibling");
                if self.node(w).color == Color::Red {
                    self.node_mut(w).color = Color::Black;
                    self.node_mut(p).color = Color::Red;
                    self.rotate_right(tree, p);
                    w = self
                        .node(p)
                        .left
                        .expect("black-deficient node has a sibling");
                }
                if self.color_of(self.node(w).right) == Color::Black
                    && self.color_of(self.node(w).left) == Color::Black
                {
                    self.node_mut(w).color = Color::Red;
                    x = Some(p);
                    parent = self.node(p).parent;
                } else {
                    if self.color_of(self.node(w).left) == Color::Black {
                        if let Some(wr) = self.node(w).right {
                            self.node_mut(wr).color = Color::Black;
                        }
                        self.node_mut(w).color = Color::Red;
                        self.rotate_left(tree, w);
                        w = self
                            .node(p)
                            .left
                            .expect("black-deficient node has a sibling");
                    }
                    self.node_mut(w).color = self.node(p).color;
                    self.node_mut(p).color = Color::Black;
                    if let Some(wl) = self.node(w).left {
                        self.node_mut(wl).color = Color::Black;
                    }
                    self.rotate_right(tree, p);
                    x = self.tree(tree).root;
                    parent = None;
                }
            }
        }
        if let Some(x) = x {
            self.node_mut(x).color = Color::Black;
        }
    }
}
