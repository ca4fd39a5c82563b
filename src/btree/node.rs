// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! B+-Tree node structures and arena storage.
//!
//! Two node shapes share a common header layout: internal nodes carry keys
//! plus child handles, leaf nodes carry keys plus values. Whether a handle
//! names a leaf or an internal node is decided by descent depth, never by a
//! tag on the node itself: an id reached after `height` hops from the root
//! is a leaf id.
//!
//! Nodes live in slot-recycling arenas ([`NodeArena`]); handles are plain
//! `u32` indexes and stay valid across unrelated allocations and frees.
//! Both shapes keep `prev`/`next` sibling links: leaves form the scan chain,
//! internal nodes use theirs to find redistribution partners at the same
//! level during rebalancing.
//!
//! Every vector is reserved to full node capacity at construction, so
//! in-node shifts never allocate; the only fallible allocation is node
//! creation itself.

use crate::btree::types::Order;
use crate::error::{ReedError, ReedResult};
use std::cmp::Ordering;

/// Handle to a node inside a [`NodeArena`].
pub type NodeId = u32;

/// Internal node: routing keys plus child handles.
///
/// ## Invariants
/// - `children.len() == keys.len() + 1`
/// - `keys` are strictly increasing under the tree's comparator
/// - `keys[i]` equals the minimum key of the subtree behind `children[i + 1]`
#[derive(Debug, Clone)]
pub struct InternalNode<K> {
    /// Sorted separator keys.
    pub keys: Vec<K>,

    /// Child handles; `children[0]` routes keys below `keys[0]`.
    pub children: Vec<NodeId>,

    /// Left sibling at the same level, if any.
    pub prev: Option<NodeId>,

    /// Right sibling at the same level, if any.
    pub next: Option<NodeId>,
}

impl<K> InternalNode<K> {
    /// Create an empty internal node with capacity for a full `order` load.
    ///
    /// ## Output
    /// - `Ok(InternalNode)`: Vectors reserved for `order` keys and
    ///   `order + 1` children
    /// - `Err(ReedError::AllocationFailed)`: Reservation failed
    pub fn with_capacity(
        order: Order,
        prev: Option<NodeId>,
        next: Option<NodeId>,
    ) -> ReedResult<Self> {
        let mut keys = Vec::new();
        let mut children = Vec::new();
        keys.try_reserve_exact(order.max_keys())
            .and_then(|_| children.try_reserve_exact(order.max_keys() + 1))
            .map_err(|e| ReedError::AllocationFailed {
                operation: "internal_node_new".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            keys,
            children,
            prev,
            next,
        })
    }

    /// Child slot chosen when descending with `key`.
    ///
    /// Returns the smallest `i` with `key < keys[i]`, or `keys.len()` when
    /// no key is larger. Keys equal to `keys[i]` route right of the
    /// separator, into the subtree whose minimum they are.
    pub fn child_slot<C>(&self, key: &K, cmp: &C) -> usize
    where
        C: Fn(&K, &K) -> Ordering,
    {
        match self.keys.binary_search_by(|probe| cmp(probe, key)) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }
}

/// Leaf node: data entries plus the scan-chain links.
///
/// ## Invariants
/// - `values.len() == keys.len()`
/// - `keys` are strictly increasing under the tree's comparator
/// - keys increase strictly across the whole `next` chain
#[derive(Debug, Clone)]
pub struct LeafNode<K, V> {
    /// Sorted entry keys.
    pub keys: Vec<K>,

    /// Entry values (parallel to `keys`).
    pub values: Vec<V>,

    /// Preceding leaf in the chain, if any.
    pub prev: Option<NodeId>,

    /// Following leaf in the chain, if any.
    pub next: Option<NodeId>,
}

impl<K, V> LeafNode<K, V> {
    /// Create an empty leaf with capacity for a full `order` load.
    ///
    /// ## Output
    /// - `Ok(LeafNode)`: Vectors reserved for `order` entries
    /// - `Err(ReedError::AllocationFailed)`: Reservation failed
    pub fn with_capacity(
        order: Order,
        prev: Option<NodeId>,
        next: Option<NodeId>,
    ) -> ReedResult<Self> {
        let mut keys = Vec::new();
        let mut values = Vec::new();
        keys.try_reserve_exact(order.max_keys())
            .and_then(|_| values.try_reserve_exact(order.max_keys()))
            .map_err(|e| ReedError::AllocationFailed {
                operation: "leaf_node_new".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            keys,
            values,
            prev,
            next,
        })
    }

    /// Locate `key` within this leaf.
    ///
    /// ## Output
    /// - `Ok(slot)`: Entry with an equal key sits at `slot`
    /// - `Err(slot)`: Key absent; `slot` is its insertion position
    pub fn slot_of<C>(&self, key: &K, cmp: &C) -> Result<usize, usize>
    where
        C: Fn(&K, &K) -> Ordering,
    {
        self.keys.binary_search_by(|probe| cmp(probe, key))
    }
}

// Freed arena slots are overwritten with an empty node; no entry storage
// survives there, whatever K and V are.
impl<K> Default for InternalNode<K> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            children: Vec::new(),
            prev: None,
            next: None,
        }
    }
}

impl<K, V> Default for LeafNode<K, V> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            prev: None,
            next: None,
        }
    }
}

/// Slot-recycling arena for one node shape.
///
/// Freed slots are reset to an empty node (releasing their entry storage)
/// and queued for reuse, so handles handed out earlier are never
/// invalidated by later allocations.
#[derive(Debug, Default)]
pub struct NodeArena<N> {
    nodes: Vec<N>,
    free: Vec<NodeId>,
}

impl<N> NodeArena<N> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store a node, reusing a freed slot when one is available.
    ///
    /// ## Output
    /// - `Ok(NodeId)`: Handle to the stored node
    /// - `Err(ReedError::AllocationFailed)`: Arena growth failed
    pub fn insert(&mut self, node: N) -> ReedResult<NodeId> {
        if let Some(id) = self.free.pop() {
            self.nodes[id as usize] = node;
            return Ok(id);
        }
        self.nodes
            .try_reserve(1)
            .map_err(|e| ReedError::AllocationFailed {
                operation: "arena_grow".to_string(),
                reason: e.to_string(),
            })?;
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        Ok(id)
    }

    /// Release a node slot for reuse, dropping its contents.
    pub fn remove(&mut self, id: NodeId)
    where
        N: Default,
    {
        self.nodes[id as usize] = N::default();
        self.free.push(id);
    }

    /// Borrow a node.
    pub fn get(&self, id: NodeId) -> &N {
        &self.nodes[id as usize]
    }

    /// Borrow a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> &mut N {
        &mut self.nodes[id as usize]
    }

    /// Borrow two distinct nodes mutably at once.
    ///
    /// Used for sibling redistribution and merges, where entries move
    /// between two nodes of the same level in one pass.
    pub fn two_mut(&mut self, a: NodeId, b: NodeId) -> (&mut N, &mut N) {
        debug_assert_ne!(a, b, "two_mut needs distinct handles");
        let (a_idx, b_idx) = (a as usize, b as usize);
        if a_idx < b_idx {
            let (low, high) = self.nodes.split_at_mut(b_idx);
            (&mut low[a_idx], &mut high[0])
        } else {
            let (low, high) = self.nodes.split_at_mut(a_idx);
            (&mut high[0], &mut low[b_idx])
        }
    }
}
