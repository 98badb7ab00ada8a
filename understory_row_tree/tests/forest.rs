// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-module scenarios and a randomized exerciser for [`RowForest`].

use understory_row_tree::{NodeId, RowFlags, RowForest, TreeId};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        #[allow(clippy::cast_possible_truncation, reason = "keeping the high half is the point")]
        let high = (self.0 >> 32) as u32;
        high
    }

    fn gen_range_usize(&mut self, upper_exclusive: usize) -> usize {
        if upper_exclusive == 0 {
            return 0;
        }
        (self.next_u32() as usize) % upper_exclusive
    }

    fn gen_height(&mut self, upper_exclusive: u32) -> i32 {
        (self.next_u32() % upper_exclusive) as i32
    }
}

/// Every row of the forest in visual order.
fn visual_rows(forest: &RowForest, top: TreeId) -> Vec<(TreeId, NodeId)> {
    let mut rows = Vec::new();
    let mut cur = forest.first(top).map(|n| (top, n));
    while let Some((t, n)) = cur {
        rows.push((t, n));
        cur = forest.next_visual(t, n);
    }
    rows
}

#[test]
fn flat_list_offsets() {
    let mut forest = RowForest::new();
    let top = forest.top();
    let a = forest.insert_after(top, None, 10, true);
    let b = forest.insert_after(top, Some(a), 20, true);
    let c = forest.insert_after(top, Some(b), 30, true);

    assert_eq!(forest.total_height(top), 60);
    assert_eq!(forest.find_by_offset(top, 15), Some((top, b, 5)));
    assert_eq!(forest.find_by_offset(top, 59), Some((top, c, 29)));
    assert_eq!(forest.find_by_offset(top, 60), None);
    forest.check_consistency(top);
}

#[test]
fn expanding_a_row_grows_heights_but_not_counts() {
    let mut forest = RowForest::new();
    let top = forest.top();
    let a = forest.insert_after(top, None, 10, true);
    let b = forest.insert_after(top, Some(a), 20, true);
    let c = forest.insert_after(top, Some(b), 30, true);

    let children = forest.create_children(top, b);
    let _b1 = forest.insert_after(children, None, 5, true);

    assert_eq!(forest.total_height(top), 65);
    assert_eq!(forest.row_count(top), 3);
    assert_eq!(forest.node_offset(top, c), 35);
    forest.check_consistency(top);
}

#[test]
fn invalidating_a_nested_leaf_dirties_every_level() {
    let mut forest = RowForest::new();
    let top = forest.top();
    let a = forest.insert_after(top, None, 10, true);
    let inner = forest.create_children(top, a);
    let a1 = forest.insert_after(inner, None, 5, true);
    let innermost = forest.create_children(inner, a1);
    let a11 = forest.insert_after(innermost, None, 5, true);
    forest.check_consistency(top);

    forest.mark_invalid(innermost, a11);
    assert!(forest.flags(a11).contains(RowFlags::INVALID));
    assert!(forest.flags(a1).contains(RowFlags::DESCENDANTS_INVALID));
    assert!(forest.flags(a).contains(RowFlags::DESCENDANTS_INVALID));
    forest.check_consistency(top);

    forest.mark_valid(innermost, a11);
    assert!(!forest.flags(a11).contains(RowFlags::INVALID));
    assert!(!forest.flags(a1).contains(RowFlags::DESCENDANTS_INVALID));
    assert!(!forest.flags(a).contains(RowFlags::DESCENDANTS_INVALID));
    forest.check_consistency(top);
}

#[test]
fn visual_traversal_agrees_with_offset_queries() {
    let mut forest = RowForest::new();
    let top = forest.top();
    let mut rng = Lcg::new(42);
    let mut last = None;
    for _ in 0..40 {
        last = Some(forest.insert_after(top, last, 1 + rng.gen_height(30), true));
    }
    for i in (0..40).step_by(5) {
        let row = forest.find_by_count(top, i).unwrap();
        let child = forest.create_children(top, row);
        let mut inner_last = None;
        for _ in 0..3 {
            inner_last = Some(forest.insert_after(child, inner_last, 1 + rng.gen_height(10), true));
        }
    }
    forest.check_consistency(top);

    let rows = visual_rows(&forest, top);
    assert_eq!(rows.len(), 40 + 8 * 3);

    // node_offset is the prefix sum of the own heights of all visual
    // predecessors, and find_by_offset inverts it at every row edge.
    let mut offset = 0;
    for (i, &(t, n)) in rows.iter().enumerate() {
        assert_eq!(forest.node_offset(t, n), offset);
        assert_eq!(forest.node_parity(t, n), u8::from(i % 2 == 1));
        assert_eq!(forest.find_by_offset(top, offset), Some((t, n, 0)));
        offset += forest.height(n);
    }
    assert_eq!(offset, forest.total_height(top));
    assert_eq!(forest.find_by_offset(top, offset), None);

    // prev_visual walks the same sequence backwards.
    let mut backward = Vec::new();
    let mut cur = Some(*rows.last().unwrap());
    while let Some((t, n)) = cur {
        backward.push((t, n));
        cur = forest.prev_visual(t, n);
    }
    backward.reverse();
    assert_eq!(backward, rows);
}

#[test]
fn reorder_is_consistent_with_the_permutation() {
    let mut forest = RowForest::new();
    let top = forest.top();
    let heights = [10, 20, 30, 40, 50, 60, 70, 80];
    let mut last = None;
    for h in heights {
        last = Some(forest.insert_after(top, last, h, true));
    }

    let new_order = [3, 1, 7, 0, 5, 6, 2, 4];
    forest.reorder(top, &new_order);
    forest.check_consistency(top);

    for (i, &old) in new_order.iter().enumerate() {
        let row = forest.find_by_count(top, i).unwrap();
        assert_eq!(forest.height(row), heights[old]);
    }
}

/// Drives the whole public mutation surface with pseudo-random operations,
/// re-checking every invariant after each one.
#[test]
fn randomized_exerciser() {
    let mut forest = RowForest::new();
    let top = forest.top();
    let mut rng = Lcg::new(0x5EED_0001);
    let mut trees = vec![top];

    for step in 0..2000 {
        trees.retain(|&t| forest.is_tree_alive(t));
        let t = trees[rng.gen_range_usize(trees.len())];
        let len = forest.row_count(t);

        match rng.gen_range_usize(10) {
            // Insert before or after a random anchor.
            0..=3 => {
                let anchor = if len == 0 {
                    None
                } else {
                    forest.find_by_count(t, rng.gen_range_usize(len))
                };
                let height = rng.gen_height(40);
                let valid = rng.gen_range_usize(4) != 0;
                if rng.gen_range_usize(2) == 0 {
                    forest.insert_after(t, anchor, height, valid);
                } else {
                    forest.insert_before(t, anchor, height, valid);
                }
            }
            // Remove a random row, collapsing it first if needed.
            4..=5 => {
                if len > 0 {
                    let node = forest.find_by_count(t, rng.gen_range_usize(len)).unwrap();
                    if let Some(child) = forest.children(node) {
                        forest.remove_tree(child);
                    }
                    forest.remove_node(t, node);
                }
            }
            // Resize a random row.
            6 => {
                if len > 0 {
                    let node = forest.find_by_count(t, rng.gen_range_usize(len)).unwrap();
                    forest.set_height(t, node, rng.gen_height(40));
                }
            }
            // Expand a random row.
            7 => {
                if len > 0 {
                    let node = forest.find_by_count(t, rng.gen_range_usize(len)).unwrap();
                    if forest.children(node).is_none() {
                        let child = forest.create_children(t, node);
                        forest.insert_after(child, None, rng.gen_height(20), true);
                        trees.push(child);
                    }
                }
            }
            // Toggle validity of a random row.
            8 => {
                if len > 0 {
                    let node = forest.find_by_count(t, rng.gen_range_usize(len)).unwrap();
                    if rng.gen_range_usize(2) == 0 {
                        forest.mark_invalid(t, node);
                    } else {
                        forest.mark_valid(t, node);
                    }
                }
            }
            // Shuffle the rows of a tree.
            _ => {
                if len > 1 {
                    let mut order: Vec<usize> = (0..len).collect();
                    for i in (1..len).rev() {
                        order.swap(i, rng.gen_range_usize(i + 1));
                    }
                    forest.reorder(t, &order);
                }
            }
        }

        forest.check_consistency(top);
        if step % 250 == 0 {
            // Cross-check aggregates against a full traversal.
            let rows = visual_rows(&forest, top);
            let total: i32 = rows.iter().map(|&(_, n)| forest.height(n)).sum();
            assert_eq!(total, forest.total_height(top));
            for (i, &(rt, rn)) in rows.iter().enumerate() {
                assert_eq!(forest.node_parity(rt, rn), u8::from(i % 2 == 1));
            }
        }
    }

    // Sweep everything clean and verify no derived flag survives.
    forest.mark_invalid_subtree(top);
    forest.check_consistency(top);
    forest.set_fixed_height(top, 17, true);
    forest.check_consistency(top);
    for (_t, n) in visual_rows(&forest, top) {
        assert_eq!(forest.height(n), 17);
        assert!(!forest.flags(n).intersects(
            RowFlags::INVALID | RowFlags::COLUMN_INVALID | RowFlags::DESCENDANTS_INVALID
        ));
    }
}
