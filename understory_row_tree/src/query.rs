// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only queries: order statistics, pixel-offset lookups, and in-order
//! traversal, both within one tree and across nesting.

use crate::RowForest;
use crate::types::{NodeId, TreeId};

impl RowForest {
    /// The first row of `tree` in order, or `None` when the tree is empty.
    #[must_use]
    pub fn first(&self, tree: TreeId) -> Option<NodeId> {
        let mut node = self.tree(tree).root?;
        while let Some(l) = self.node(node).left {
            node = l;
        }
        Some(node)
    }

    /// The last row of `tree` in order, or `None` when the tree is empty.
    #[must_use]
    pub fn last(&self, tree: TreeId) -> Option<NodeId> {
        let mut node = self.tree(tree).root?;
        while let Some(r) = self.node(node).right {
            node = r;
        }
        Some(node)
    }

    /// The row at 0-based position `index` within `tree`, ignoring nested
    /// trees. `None` when out of range. O(log n).
    #[must_use]
    pub fn find_by_count(&self, tree: TreeId, index: usize) -> Option<NodeId> {
        let mut node = self.tree(tree).root?;
        if index >= self.node(node).count {
            return None;
        }
        let mut index = index;
        loop {
            let left_count = self.count_of(self.node(node).left);
            if index < left_count {
                node = self.node(node).left.expect("count accounts for a left child");
            } else if index == left_count {
                return Some(node);
            } else {
                index -= left_count + 1;
                node = self.node(node).right.expect("count accounts for a right child");
            }
        }
    }

    /// The row containing pixel position `height`, descending into nested
    /// trees. Returns the owning tree, the row, and the remaining offset
    /// within the row. `None` when `height` is negative or at/past the end.
    /// O(log n) in the total row count.
    #[must_use]
    pub fn find_by_offset(&self, tree: TreeId, height: i32) -> Option<(TreeId, NodeId, i32)> {
        if height < 0 || height >= self.total_height(tree) {
            return None;
        }
        let mut tree = tree;
        let mut height = height;
        loop {
            let mut node = self.tree(tree).root?;
            loop {
                let left = self.offset_of(self.node(node).left);
                let below_right = self.node(node).offset - self.offset_of(self.node(node).right);
                // Bands are half-open: a boundary pixel belongs to the row
                // that starts there.
                if left > height {
                    node = self.node(node).left?;
                } else if below_right <= height {
                    height -= below_right;
                    node = self.node(node).right?;
                } else {
                    break;
                }
            }
            let left = self.offset_of(self.node(node).left);
            match self.node(node).children {
                Some(ct) => {
                    // The row's own band ends where its nested tree begins.
                    let own_end = self.node(node).offset
                        - self.offset_of(self.node(node).right)
                        - self.offset_of(self.tree(ct).root);
                    if own_end > height {
                        return Some((tree, node, height - left));
                    }
                    height -= left + self.own_height(node);
                    tree = ct;
                }
                None => return Some((tree, node, height - left)),
            }
        }
    }

    /// The pixel position of the top edge of `node`, measured from the top
    /// of the whole forest. O(log n).
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to `tree`.
    #[must_use]
    pub fn node_offset(&self, tree: TreeId, node: NodeId) -> i32 {
        assert_eq!(self.node(node).tree, tree, "node does not belong to this tree");
        let mut retval = self.offset_of(self.node(node).left);
        let mut cur_tree = tree;
        let mut cur = node;
        loop {
            match self.node(cur).parent {
                Some(p) => {
                    if self.node(p).right == Some(cur) {
                        // Everything under p except its right subtree comes
                        // before cur: p itself, its left subtree, and its
                        // nested children.
                        retval += self.node(p).offset - self.node(cur).offset;
                    }
                    cur = p;
                }
                None => match self.tree_parent(cur_tree) {
                    Some((pt, pn)) => {
                        retval += self.offset_of(self.node(pn).left) + self.own_height(pn);
                        cur_tree = pt;
                        cur = pn;
                    }
                    None => return retval,
                },
            }
        }
    }

    /// Parity (0 or 1) of the number of rows visually preceding `node`,
    /// through every nesting level; in other words the parity of the row's
    /// visual index. O(log n). Used for alternating row striping.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to `tree`.
    #[must_use]
    pub fn node_parity(&self, tree: TreeId, node: NodeId) -> u8 {
        assert_eq!(self.node(node).tree, tree, "node does not belong to this tree");
        let mut retval = self.parity_of(self.node(node).left);
        let mut cur_tree = tree;
        let mut cur = node;
        loop {
            match self.node(cur).parent {
                Some(p) => {
                    if self.node(p).right == Some(cur) {
                        retval ^= self.node(p).parity ^ self.node(cur).parity;
                    }
                    cur = p;
                }
                None => match self.tree_parent(cur_tree) {
                    Some((pt, pn)) => {
                        retval ^= self.parity_of(self.node(pn).left) ^ 1;
                        cur_tree = pt;
                        cur = pn;
                    }
                    None => return retval,
                },
            }
        }
    }

    /// The in-order successor of `node` within `tree`, ignoring nested
    /// trees.
    #[must_use]
    pub fn next(&self, tree: TreeId, node: NodeId) -> Option<NodeId> {
        debug_assert_eq!(self.node(node).tree, tree, "node does not belong to this tree");
        if let Some(r) = self.node(node).right {
            let mut n = r;
            while let Some(l) = self.node(n).left {
                n = l;
            }
            return Some(n);
        }
        let mut n = node;
        while let Some(p) = self.node(n).parent {
            if self.node(p).right == Some(n) {
                n = p;
            } else {
                return Some(p);
            }
        }
        None
    }

    /// The in-order predecessor of `node` within `tree`, ignoring nested
    /// trees.
    #[must_use]
    pub fn prev(&self, tree: TreeId, node: NodeId) -> Option<NodeId> {
        debug_assert_eq!(self.node(node).tree, tree, "node does not belong to this tree");
        if let Some(l) = self.node(node).left {
            let mut n = l;
            while let Some(r) = self.node(n).right {
                n = r;
            }
            return Some(n);
        }
        let mut n = node;
        while let Some(p) = self.node(n).parent {
            if self.node(p).left == Some(n) {
                n = p;
            } else {
                return Some(p);
            }
        }
        None
    }

    /// The next row in visual order, descending into the row's nested tree
    /// first and climbing out of exhausted trees. `None` after the last
    /// visible row of the forest.
    #[must_use]
    pub fn next_visual(&self, tree: TreeId, node: NodeId) -> Option<(TreeId, NodeId)> {
        if let Some(ct) = self.node(node).children {
            if let Some(first) = self.first(ct) {
                return Some((ct, first));
            }
        }
        let mut tree = tree;
        let mut next = self.next(tree, node);
        loop {
            if let Some(n) = next {
                return Some((tree, n));
            }
            let (pt, pn) = self.tree_parent(tree)?;
            tree = pt;
            next = self.next(pt, pn);
        }
    }

    /// The previous row in visual order: the predecessor's deepest last
    /// nested row, or the row this tree hangs under. `None` before the
    /// first row of the forest.
    #[must_use]
    pub fn prev_visual(&self, tree: TreeId, node: NodeId) -> Option<(TreeId, NodeId)> {
        match self.prev(tree, node) {
            None => self.tree_parent(tree),
            Some(mut n) => {
                let mut t = tree;
                while let Some(ct) = self.node(n).children {
                    match self.last(ct) {
                        Some(r) => {
                            t = ct;
                            n = r;
                        }
                        None => break,
                    }
                }
                Some((t, n))
            }
        }
    }
}
