// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Self-checking and debug output.
//!
//! [`RowForest::check_consistency`] re-derives every aggregate from scratch
//! and asserts it against the stored values, alongside the structural and
//! red-black properties. The test suite runs it after every mutation.

use alloc::string::String;
use core::fmt::Write as _;

use crate::RowForest;
use crate::forest::Color;
use crate::types::{NodeId, RowFlags, TreeId};

/// Bottom-up recomputation of one subtree, compared against stored state.
#[derive(Copy, Clone)]
struct Summary {
    count: usize,
    offset: i32,
    parity: u8,
    black_height: usize,
}

impl RowForest {
    /// Walk the whole forest containing `tree` and assert every structural,
    /// red-black, aggregate, and derived-flag invariant.
    ///
    /// Intended for tests and debugging; cost is linear in the forest size.
    ///
    /// # Panics
    ///
    /// Panics on the first violated invariant.
    pub fn check_consistency(&self, tree: TreeId) {
        let mut t = tree;
        while let Some((pt, _)) = self.tree_parent(t) {
            t = pt;
        }
        let _ = self.check_tree(t);
    }

    fn check_tree(&self, tree: TreeId) -> Summary {
        let Some(root) = self.tree(tree).root else {
            return Summary {
                count: 0,
                offset: 0,
                parity: 0,
                black_height: 1,
            };
        };
        assert!(self.node(root).parent.is_none(), "root has no parent");
        assert_eq!(self.node(root).color, Color::Black, "root is black");
        self.check_node(tree, root)
    }

    fn check_node(&self, tree: TreeId, node: NodeId) -> Summary {
        let n = self.node(node);
        assert_eq!(n.tree, tree, "node is linked into its owning tree");
        if n.color == Color::Red {
            assert_eq!(self.color_of(n.left), Color::Black, "red node has black children");
            assert_eq!(self.color_of(n.right), Color::Black, "red node has black children");
        }

        let left = match n.left {
            Some(l) => {
                assert_eq!(self.node(l).parent, Some(node), "left child links back to its parent");
                self.check_node(tree, l)
            }
            None => Summary {
                count: 0,
                offset: 0,
                parity: 0,
                black_height: 1,
            },
        };
        let right = match n.right {
            Some(r) => {
                assert_eq!(self.node(r).parent, Some(node), "right child links back to its parent");
                self.check_node(tree, r)
            }
            None => Summary {
                count: 0,
                offset: 0,
                parity: 0,
                black_height: 1,
            },
        };
        let nested = match n.children {
            Some(ct) => {
                let t = self.tree(ct);
                assert_eq!(t.parent_tree, Some(tree), "nested tree links back to its parent tree");
                assert_eq!(t.parent_node, Some(node), "nested tree links back to its owning row");
                self.check_tree(ct)
            }
            None => Summary {
                count: 0,
                offset: 0,
                parity: 0,
                black_height: 0,
            },
        };

        let own = self.own_height(node);
        assert!(own >= 0, "own height is non-negative");
        assert_eq!(n.count, left.count + right.count + 1, "count aggregate");
        assert_eq!(
            n.offset,
            own + left.offset + right.offset + nested.offset,
            "offset aggregate"
        );
        assert_eq!(
            n.parity,
            1 ^ left.parity ^ right.parity ^ nested.parity,
            "parity aggregate"
        );
        assert_eq!(
            left.black_height, right.black_height,
            "equal black count on every path"
        );

        let dirty = n.flags.intersects(RowFlags::INVALID | RowFlags::COLUMN_INVALID)
            || self.desc_invalid(n.left)
            || self.desc_invalid(n.right)
            || self.nested_desc_invalid(node);
        assert_eq!(
            n.flags.contains(RowFlags::DESCENDANTS_INVALID),
            dirty,
            "derived validity flag matches its definition"
        );

        Summary {
            count: n.count,
            offset: n.offset,
            parity: n.parity,
            black_height: left.black_height + usize::from(n.color == Color::Black),
        }
    }

    /// Render an indented dump of `tree` and its nested trees, one row per
    /// line in visual order with color, own height, aggregates, and validity
    /// flags (`D`/`I`/`C`).
    #[must_use]
    pub fn dump(&self, tree: TreeId) -> String {
        let mut out = String::new();
        self.dump_tree(tree, 0, &mut out);
        out
    }

    fn dump_tree(&self, tree: TreeId, indent: usize, out: &mut String) {
        match self.tree(tree).root {
            Some(root) => self.dump_node(tree, root, indent, out),
            None => {
                let _ = writeln!(out, "{:indent$}(empty tree)", "", indent = indent * 2);
            }
        }
    }

    fn dump_node(&self, tree: TreeId, node: NodeId, indent: usize, out: &mut String) {
        if let Some(l) = self.node(node).left {
            self.dump_node(tree, l, indent, out);
        }
        let n = self.node(node);
        let _ = writeln!(
            out,
            "{:indent$}{} height={} offset={} parity={} {}{}{}",
            "",
            if n.color == Color::Black { "black" } else { "red" },
            self.own_height(node),
            n.offset,
            n.parity,
            if n.flags.contains(RowFlags::DESCENDANTS_INVALID) { 'D' } else { '-' },
            if n.flags.contains(RowFlags::INVALID) { 'I' } else { '-' },
            if n.flags.contains(RowFlags::COLUMN_INVALID) { 'C' } else { '-' },
            indent = indent * 2,
        );
        if let Some(ct) = self.node(node).children {
            self.dump_tree(ct, indent + 1, out);
        }
        if let Some(r) = self.node(node).right {
            self.dump_node(tree, r, indent, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use crate::RowForest;

    #[test]
    fn dump_lists_rows_in_visual_order_with_nesting_indent() {
        let mut forest = RowForest::new();
        let top = forest.top();
        let a = forest.insert_after(top, None, 10, true);
        let child = forest.create_children(top, a);
        let _a1 = forest.insert_after(child, None, 5, false);

        let dump = forest.dump(top);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("height=10"));
        assert!(lines[1].starts_with("  "), "nested rows are indented");
        assert!(lines[1].contains('I'), "invalid nested row is flagged");
    }

    #[test]
    fn check_accepts_an_empty_forest() {
        let forest = RowForest::new();
        forest.check_consistency(forest.top());
    }
}
