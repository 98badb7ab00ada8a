// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the row tree: tree/node identifiers and row flags.

/// Identifier for a tree in a [`RowForest`](crate::RowForest) (generational).
///
/// The top-level tree is created with the forest; further trees are created by
/// [`RowForest::create_children`](crate::RowForest::create_children) when a row
/// is expanded.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TreeId(pub(crate) u32, pub(crate) u32);

impl TreeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Identifier for a row node in a [`RowForest`](crate::RowForest) (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Semantic flags stored on each row node.
    ///
    /// The engine stores most of these on behalf of the view and never
    /// interprets them. Only [`RowFlags::INVALID`], [`RowFlags::COLUMN_INVALID`],
    /// and the derived [`RowFlags::DESCENDANTS_INVALID`] participate in
    /// validity tracking; see [`RowForest::mark_invalid`](crate::RowForest::mark_invalid)
    /// and [`RowForest::mark_valid`](crate::RowForest::mark_valid).
    ///
    /// The red-black color lives in a separate internal field, so flag updates
    /// can never clobber the balancing state.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RowFlags: u8 {
        /// Row has (or may acquire) expandable children.
        const PARENT              = 0b0000_0001;
        /// Row is selected.
        const SELECTED            = 0b0000_0010;
        /// Row is prelit (hovered).
        const PRELIT              = 0b0000_0100;
        /// Transient marker while an expand animation is running.
        const SEMI_EXPANDED       = 0b0000_1000;
        /// Transient marker while a collapse animation is running.
        const SEMI_COLLAPSED      = 0b0001_0000;
        /// The row's cached measurement is stale.
        const INVALID             = 0b0010_0000;
        /// Only per-column data of the row is stale.
        const COLUMN_INVALID      = 0b0100_0000;
        /// Some row in this subtree (through nested trees) is invalid.
        ///
        /// Derived; maintained by the engine and kept consistent after every
        /// mutation. Do not set or clear it directly.
        const DESCENDANTS_INVALID = 0b1000_0000;
    }
}
