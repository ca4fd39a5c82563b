// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Core types for the B+-Tree index engine.
//!
//! Defines the validated tree order with its derived split and occupancy
//! arithmetic, the outcome types reported by keyed writes, and the stock
//! conflict predicates.

use crate::error::{ReedError, ReedResult};
use serde::{Deserialize, Serialize};

/// B+-Tree order (branching factor) configuration.
///
/// Defines the maximum number of keys per node; an internal node with `m`
/// keys routes to `m + 1` children. Higher orders reduce tree height but
/// increase per-node shift cost on insert and delete.
///
/// ## Constraints
/// - Minimum order: 3 (the rebalancing arithmetic degenerates below that)
///
/// ## Typical Values
/// - Point-lookup heavy workloads: 32-128
/// - Scan-heavy workloads: 128-512
///
/// ## Example
/// ```rust
/// use reedindex::btree::Order;
///
/// let order = Order::new(4)?;
/// assert_eq!(order.max_keys(), 4);
/// assert_eq!(order.leaf_split_keep(), 3);
/// assert_eq!(order.leaf_min_keys(), 2);
/// # Ok::<(), reedindex::ReedError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order(u16);

impl Order {
    /// Minimum supported order.
    pub const MIN: u16 = 3;

    /// Create new order with validation.
    ///
    /// ## Input
    /// - `order`: Desired tree order (must be >= 3)
    ///
    /// ## Output
    /// - `Ok(Order)`: Valid order created
    /// - `Err(ReedError::InvalidOrder)`: Order less than 3
    ///
    /// ## Performance
    /// - O(1) validation
    pub fn new(order: u16) -> ReedResult<Self> {
        if order < Self::MIN {
            return Err(ReedError::InvalidOrder {
                order,
                min: Self::MIN,
            });
        }
        Ok(Self(order))
    }

    /// Get maximum keys per node.
    pub fn max_keys(&self) -> usize {
        self.0 as usize
    }

    /// Keys kept by the left node when a full leaf splits.
    ///
    /// A splitting leaf holds `order + 1` entries (the overflowing insert
    /// included); the left node keeps this many and the right node takes
    /// the rest.
    pub fn leaf_split_keep(&self) -> usize {
        self.0 as usize / 2 + 1
    }

    /// Keys moved to the right node when a full leaf splits.
    ///
    /// Doubles as the occupancy floor for every non-root leaf.
    pub fn leaf_min_keys(&self) -> usize {
        self.0 as usize + 1 - self.leaf_split_keep()
    }

    /// Keys kept by the left node when a full internal node splits.
    ///
    /// The promoted separator is not counted on either side.
    pub fn internal_split_keep(&self) -> usize {
        let order = self.0 as usize;
        order - order / 2
    }

    /// Keys moved to the right node when a full internal node splits.
    ///
    /// Doubles as the occupancy floor for every non-root internal node.
    pub fn internal_min_keys(&self) -> usize {
        self.0 as usize / 2
    }

    /// Get raw order value.
    pub fn value(&self) -> u16 {
        self.0
    }
}

/// Result of a keyed insert.
///
/// A collision (an entry with an equal key already present) is decided by
/// the caller's conflict predicate; the tree itself never overwrites
/// silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOutcome {
    /// No entry with this key existed; the new entry was stored.
    Inserted,
    /// An entry existed and the predicate permitted replacing its value.
    Replaced,
    /// An entry existed and the predicate declined; the tree is unchanged.
    Kept,
}

/// Result of a guarded delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteOutcome {
    /// The entry existed and the guard permitted its removal.
    Removed,
    /// The entry existed but the guard declined; the tree is unchanged.
    Kept,
    /// No entry with this key existed.
    NotFound,
}

/// Stock conflict predicates for [`BPlusTree::insert`](crate::btree::BPlusTree::insert).
///
/// The predicate receives `(incoming, existing)` values on a key collision
/// and returns whether the existing value should be replaced.
pub mod pred {
    /// Always replace the existing value ("last write wins").
    pub fn always<A: ?Sized, B: ?Sized>(_incoming: &A, _existing: &B) -> bool {
        true
    }

    /// Never replace the existing value ("first write wins").
    pub fn never<A: ?Sized, B: ?Sized>(_incoming: &A, _existing: &B) -> bool {
        false
    }
}
