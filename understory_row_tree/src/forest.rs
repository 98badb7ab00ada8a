// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena storage for trees and nodes, aggregate accessors, and lifecycle
//! operations shared by the editing, query, and validity modules.

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::types::{NodeId, RowFlags, TreeId};

/// Red-black node color.
///
/// Kept separate from [`RowFlags`] so flag updates cannot corrupt the
/// balancing state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

#[derive(Debug)]
pub(crate) struct Node {
    generation: u32,
    /// The tree this node belongs to. Checked on mutating entry points.
    pub(crate) tree: TreeId,
    pub(crate) color: Color,
    pub(crate) flags: RowFlags,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    /// Nested tree of this row's expanded children, if any.
    pub(crate) children: Option<TreeId>,
    /// Nodes in this subtree, including this one. Scoped to the owning tree:
    /// nested child trees do not contribute.
    pub(crate) count: usize,
    /// Cumulative pixel height of this subtree, including any nested child
    /// trees.
    pub(crate) offset: i32,
    /// Mod-2 node count of this subtree, including nested child trees.
    /// Stored pre-reduced: always 0 or 1.
    pub(crate) parity: u8,
}

#[derive(Debug)]
pub(crate) struct Tree {
    generation: u32,
    pub(crate) root: Option<NodeId>,
    pub(crate) parent_tree: Option<TreeId>,
    pub(crate) parent_node: Option<NodeId>,
}

/// A forest of nested row trees backing a virtualized tree/list view.
///
/// Each tree is an order-statistics red-black tree over the rows at one
/// nesting level; a row that is expanded owns a nested tree of its child rows.
/// Every node carries three incrementally maintained aggregates:
///
/// - `count`: rows in the subtree, scoped to the owning tree only;
/// - `offset`: cumulative pixel height of the subtree, *including* nested
///   child trees, which makes pixel-position lookups O(log n);
/// - `parity`: mod-2 row count through nesting, used for alternating row
///   striping.
///
/// Rows whose measurements are stale carry [`RowFlags::INVALID`] (or
/// [`RowFlags::COLUMN_INVALID`]); the derived [`RowFlags::DESCENDANTS_INVALID`]
/// prunes re-validation sweeps to dirty regions only.
///
/// All access is single-threaded and synchronous; callers (typically the UI
/// event loop) serialize mutation. Out-of-range queries return `None`;
/// passing a node to an operation on a tree it does not belong to is a
/// contract violation and panics.
///
/// ## Example
///
/// ```rust
/// use understory_row_tree::RowForest;
///
/// let mut forest = RowForest::new();
/// let top = forest.top();
/// let a = forest.insert_after(top, None, 10, true);
/// let b = forest.insert_after(top, Some(a), 20, true);
/// let _c = forest.insert_after(top, Some(b), 30, true);
///
/// assert_eq!(forest.total_height(top), 60);
/// let (tree, node, within) = forest.find_by_offset(top, 15).unwrap();
/// assert_eq!((tree, node, within), (top, b, 5));
/// ```
#[derive(Debug)]
pub struct RowForest {
    /// slots
    trees: Vec<Option<Tree>>,
    /// last generation per tree slot (persists across frees)
    tree_generations: Vec<u32>,
    tree_free: Vec<usize>,
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per node slot (persists across frees)
    node_generations: Vec<u32>,
    node_free: Vec<usize>,
    top: TreeId,
}

impl Default for RowForest {
    fn default() -> Self {
        Self::new()
    }
}

impl RowForest {
    /// Create a forest holding a single empty top-level tree.
    #[must_use]
    pub fn new() -> Self {
        let mut forest = Self {
            trees: Vec::new(),
            tree_generations: Vec::new(),
            tree_free: Vec::new(),
            nodes: Vec::new(),
            node_generations: Vec::new(),
            node_free: Vec::new(),
            top: TreeId::new(0, 0),
        };
        forest.top = forest.alloc_tree(None, None);
        forest
    }

    /// The top-level tree of the view.
    #[must_use]
    pub fn top(&self) -> TreeId {
        self.top
    }

    /// Remove every row and nested tree, leaving a fresh empty top-level
    /// tree. Handles from before the clear stay dead: slot generations
    /// survive, so reuse cannot alias them.
    pub fn clear(&mut self) {
        for (idx, slot) in self.nodes.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.node_free.push(idx);
            }
        }
        for (idx, slot) in self.trees.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.tree_free.push(idx);
            }
        }
        self.top = self.alloc_tree(None, None);
    }

    /// Attach a fresh empty nested tree under `node`, modeling the row being
    /// expanded.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to `tree` or already owns a nested
    /// tree.
    pub fn create_children(&mut self, tree: TreeId, node: NodeId) -> TreeId {
        assert_eq!(self.node(node).tree, tree, "node does not belong to this tree");
        assert!(
            self.node(node).children.is_none(),
            "row already owns a nested child tree"
        );
        let child = self.alloc_tree(Some(tree), Some(node));
        self.node_mut(node).children = Some(child);
        child
    }

    /// Returns true if `id` refers to a live node.
    #[must_use]
    pub fn is_node_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Returns true if `id` refers to a live tree.
    #[must_use]
    pub fn is_tree_alive(&self, id: TreeId) -> bool {
        self.trees
            .get(id.idx())
            .and_then(|t| t.as_ref())
            .map(|t| t.generation == id.1)
            .unwrap_or(false)
    }

    // --- public accessors ---

    /// Number of rows in `tree` (nested child trees are not counted).
    #[must_use]
    pub fn row_count(&self, tree: TreeId) -> usize {
        self.count_of(self.tree(tree).root)
    }

    /// Whether `tree` holds no rows.
    #[must_use]
    pub fn is_empty(&self, tree: TreeId) -> bool {
        self.tree(tree).root.is_none()
    }

    /// Total pixel height of `tree`, including every nested child tree.
    #[must_use]
    pub fn total_height(&self, tree: TreeId) -> i32 {
        self.offset_of(self.tree(tree).root)
    }

    /// The row's own pixel height, excluding subtrees and nested children.
    #[must_use]
    pub fn height(&self, node: NodeId) -> i32 {
        self.own_height(node)
    }

    /// The semantic flags of a row.
    #[must_use]
    pub fn flags(&self, node: NodeId) -> RowFlags {
        self.node(node).flags
    }

    /// Replace the semantic flags of a row.
    ///
    /// Validity flags should normally go through
    /// [`RowForest::mark_invalid`]/[`RowForest::mark_valid`] so the derived
    /// [`RowFlags::DESCENDANTS_INVALID`] stays consistent on ancestors.
    pub fn set_flags(&mut self, node: NodeId, flags: RowFlags) {
        self.node_mut(node).flags = flags;
    }

    /// The nested tree of a row's expanded children, if any.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Option<TreeId> {
        self.node(node).children
    }

    /// The tree and node this tree hangs under, or `None` for the top-level
    /// tree.
    #[must_use]
    pub fn tree_parent(&self, tree: TreeId) -> Option<(TreeId, NodeId)> {
        let t = self.tree(tree);
        match (t.parent_tree, t.parent_node) {
            (Some(pt), Some(pn)) => Some((pt, pn)),
            _ => None,
        }
    }

    /// Nesting depth of `tree`: 0 for the top-level tree.
    #[must_use]
    pub fn depth(&self, tree: TreeId) -> usize {
        let mut depth = 0;
        let mut cur = self.tree(tree).parent_tree;
        while let Some(t) = cur {
            depth += 1;
            cur = self.tree(t).parent_tree;
        }
        depth
    }

    // --- internals: slot management ---

    pub(crate) fn alloc_tree(
        &mut self,
        parent_tree: Option<TreeId>,
        parent_node: Option<NodeId>,
    ) -> TreeId {
        let (idx, generation) = if let Some(idx) = self.tree_free.pop() {
            let generation = self.tree_generations[idx].saturating_add(1);
            self.tree_generations[idx] = generation;
            (idx, generation)
        } else {
            self.trees.push(None);
            self.tree_generations.push(1);
            (self.trees.len() - 1, 1)
        };
        self.trees[idx] = Some(Tree {
            generation,
            root: None,
            parent_tree,
            parent_node,
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "TreeId uses 32-bit indices by design."
        )]
        TreeId::new(idx as u32, generation)
    }

    pub(crate) fn alloc_node(&mut self, tree: TreeId, height: i32) -> NodeId {
        debug_assert!(height >= 0, "row heights are non-negative pixel sizes");
        let (idx, generation) = if let Some(idx) = self.node_free.pop() {
            let generation = self.node_generations[idx].saturating_add(1);
            self.node_generations[idx] = generation;
            (idx, generation)
        } else {
            self.nodes.push(None);
            self.node_generations.push(1);
            (self.nodes.len() - 1, 1)
        };
        self.nodes[idx] = Some(Node {
            generation,
            tree,
            color: Color::Red,
            flags: RowFlags::empty(),
            parent: None,
            left: None,
            right: None,
            children: None,
            count: 1,
            offset: height,
            parity: 1,
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        NodeId::new(idx as u32, generation)
    }

    pub(crate) fn free_node_slot(&mut self, id: NodeId) {
        debug_assert!(self.is_node_alive(id), "freeing a dangling NodeId");
        self.nodes[id.idx()] = None;
        self.node_free.push(id.idx());
    }

    /// Free every node slot of `tree` (recursing into nested child trees) and
    /// the tree slot itself. Pure deallocation: no aggregate propagation and
    /// no severing of the parent node's `children` link.
    pub(crate) fn free_tree_slots(&mut self, tree: TreeId) {
        let mut stack: SmallVec<[TreeId; 8]> = SmallVec::new();
        stack.push(tree);
        while let Some(t) = stack.pop() {
            let mut nodes: SmallVec<[NodeId; 32]> = SmallVec::new();
            if let Some(root) = self.tree(t).root {
                nodes.push(root);
            }
            while let Some(n) = nodes.pop() {
                if let Some(l) = self.node(n).left {
                    nodes.push(l);
                }
                if let Some(r) = self.node(n).right {
                    nodes.push(r);
                }
                if let Some(ct) = self.node(n).children {
                    stack.push(ct);
                }
                self.free_node_slot(n);
            }
            self.trees[t.idx()] = None;
            self.tree_free.push(t.idx());
        }
    }

    // --- internals: node/tree access ---

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        let node = self.nodes[id.idx()].as_ref().expect("dangling NodeId");
        debug_assert_eq!(node.generation, id.1, "dangling NodeId");
        node
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        let node = self.nodes[id.idx()].as_mut().expect("dangling NodeId");
        debug_assert_eq!(node.generation, id.1, "dangling NodeId");
        node
    }

    /// Access a tree; panics if `id` is stale.
    pub(crate) fn tree(&self, id: TreeId) -> &Tree {
        let tree = self.trees[id.idx()].as_ref().expect("dangling TreeId");
        debug_assert_eq!(tree.generation, id.1, "dangling TreeId");
        tree
    }

    /// Access a tree mutably; panics if `id` is stale.
    pub(crate) fn tree_mut(&mut self, id: TreeId) -> &mut Tree {
        let tree = self.trees[id.idx()].as_mut().expect("dangling TreeId");
        debug_assert_eq!(tree.generation, id.1, "dangling TreeId");
        tree
    }

    // --- internals: zero-default aggregate accessors ---
    //
    // Absent children read as zero-valued aggregates, which keeps the
    // recurrences branch-light without a shared sentinel node.

    pub(crate) fn count_of(&self, node: Option<NodeId>) -> usize {
        node.map_or(0, |n| self.node(n).count)
    }

    pub(crate) fn offset_of(&self, node: Option<NodeId>) -> i32 {
        node.map_or(0, |n| self.node(n).offset)
    }

    pub(crate) fn parity_of(&self, node: Option<NodeId>) -> u8 {
        node.map_or(0, |n| self.node(n).parity)
    }

    pub(crate) fn color_of(&self, node: Option<NodeId>) -> Color {
        // Absent children are black leaves.
        node.map_or(Color::Black, |n| self.node(n).color)
    }

    pub(crate) fn desc_invalid(&self, node: Option<NodeId>) -> bool {
        node.is_some_and(|n| self.node(n).flags.contains(RowFlags::DESCENDANTS_INVALID))
    }

    /// Aggregate height of the node's nested child tree, or 0.
    pub(crate) fn nested_offset(&self, node: NodeId) -> i32 {
        self.node(node)
            .children
            .map_or(0, |ct| self.offset_of(self.tree(ct).root))
    }

    /// Aggregate parity of the node's nested child tree, or 0.
    pub(crate) fn nested_parity(&self, node: NodeId) -> u8 {
        self.node(node)
            .children
            .map_or(0, |ct| self.parity_of(self.tree(ct).root))
    }

    /// Whether the node's nested child tree root carries
    /// `DESCENDANTS_INVALID`.
    pub(crate) fn nested_desc_invalid(&self, node: NodeId) -> bool {
        self.node(node)
            .children
            .is_some_and(|ct| self.desc_invalid(self.tree(ct).root))
    }

    /// The node's own pixel height, derived from the stored aggregates.
    pub(crate) fn own_height(&self, node: NodeId) -> i32 {
        let n = self.node(node);
        n.offset - self.offset_of(n.left) - self.offset_of(n.right) - self.nested_offset(node)
    }

    // --- internals: aggregate recomputation ---

    pub(crate) fn refresh_count(&mut self, node: NodeId) {
        let count = 1 + self.count_of(self.node(node).left) + self.count_of(self.node(node).right);
        self.node_mut(node).count = count;
    }

    pub(crate) fn refresh_offset(&mut self, node: NodeId, own_height: i32) {
        let offset = own_height
            + self.offset_of(self.node(node).left)
            + self.offset_of(self.node(node).right)
            + self.nested_offset(node);
        self.node_mut(node).offset = offset;
    }

    /// Recompute the node's parity from its children. XOR is addition mod 2,
    /// so pre-reduced operands stay pre-reduced.
    pub(crate) fn fixup_parity(&mut self, node: NodeId) {
        let parity = 1
            ^ self.parity_of(self.node(node).left)
            ^ self.parity_of(self.node(node).right)
            ^ self.nested_parity(node);
        self.node_mut(node).parity = parity;
    }

    // --- internals: ancestor walk ---

    /// Walk `start` and every ancestor above it, crossing from each tree root
    /// into the tree's parent node, until the top-level tree root is passed or
    /// `f` returns `false`.
    ///
    /// `start == None` begins the walk at `tree`'s parent node (used when the
    /// position of interest has no real node in `tree` anymore).
    ///
    /// `f` receives whether the visited node still lies in the originating
    /// `tree`: row counts only accumulate there, while offsets and parity
    /// accumulate across every enclosing tree.
    pub(crate) fn for_each_ancestor<F>(&mut self, tree: TreeId, start: Option<NodeId>, mut f: F)
    where
        F: FnMut(&mut Self, NodeId, bool) -> bool,
    {
        let mut cur_tree = tree;
        let mut cur = start;
        if cur.is_none() {
            let t = self.tree(cur_tree);
            cur = t.parent_node;
            match t.parent_tree {
                Some(pt) => cur_tree = pt,
                None => return,
            }
        }
        while let Some(n) = cur {
            if !f(self, n, cur_tree == tree) {
                return;
            }
            match self.node(n).parent {
                Some(p) => cur = Some(p),
                None => {
                    let t = self.tree(cur_tree);
                    cur = t.parent_node;
                    match t.parent_tree {
                        Some(pt) => cur_tree = pt,
                        None => return,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_forest_has_an_empty_top_tree() {
        let forest = RowForest::new();
        let top = forest.top();
        assert!(forest.is_tree_alive(top));
        assert!(forest.is_empty(top));
        assert_eq!(forest.row_count(top), 0);
        assert_eq!(forest.total_height(top), 0);
        assert_eq!(forest.depth(top), 0);
        assert!(forest.tree_parent(top).is_none());
    }

    #[test]
    fn create_children_wires_back_references() {
        let mut forest = RowForest::new();
        let top = forest.top();
        let row = forest.insert_after(top, None, 10, true);
        let child = forest.create_children(top, row);

        assert_eq!(forest.children(row), Some(child));
        assert_eq!(forest.tree_parent(child), Some((top, row)));
        assert_eq!(forest.depth(child), 1);
        // An empty nested tree adds no height.
        assert_eq!(forest.total_height(top), 10);
    }

    #[test]
    #[should_panic(expected = "row already owns a nested child tree")]
    fn create_children_twice_panics() {
        let mut forest = RowForest::new();
        let top = forest.top();
        let row = forest.insert_after(top, None, 10, true);
        let _ = forest.create_children(top, row);
        let _ = forest.create_children(top, row);
    }

    #[test]
    fn clear_invalidates_old_handles() {
        let mut forest = RowForest::new();
        let top = forest.top();
        let row = forest.insert_after(top, None, 10, true);
        forest.clear();
        assert!(!forest.is_node_alive(row));
        assert!(forest.is_empty(forest.top()));

        // A slot reused after the clear must not revive the old handle.
        let fresh = forest.insert_after(forest.top(), None, 5, true);
        assert!(!forest.is_node_alive(row));
        assert_ne!(fresh, row);
    }

    #[test]
    fn node_slots_are_reused_with_new_generations() {
        let mut forest = RowForest::new();
        let top = forest.top();
        let a = forest.insert_after(top, None, 10, true);
        forest.remove_node(top, a);
        assert!(!forest.is_node_alive(a));

        let b = forest.insert_after(top, None, 20, true);
        assert!(forest.is_node_alive(b));
        assert_ne!(a, b, "reused slot must carry a fresh generation");
    }
}
