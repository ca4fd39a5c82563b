// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Generic bounded-growth LIFO container.
//!
//! Backs the traversal journal of the B+-Tree. Capacity starts at a
//! caller-chosen size and grows arithmetically (by the initial capacity, not
//! geometrically) whenever a push finds the stack full; a descent therefore
//! performs at most O(tree height) grow steps over its lifetime. All
//! allocating operations report failure instead of aborting, so the tree can
//! surface them to its caller.

use crate::error::{ReedError, ReedResult};

/// Fixed-element LIFO stack with arithmetic capacity growth.
///
/// ## Growth Policy
/// A push against a full stack extends capacity by the initial capacity.
/// Capacity never shrinks implicitly; [`shrink_to`](Self::shrink_to)
/// releases excess explicitly.
///
/// ## Error Handling
/// [`new`](Self::new), [`push`](Self::push) and
/// [`try_clone`](Self::try_clone) return
/// `ReedError::AllocationFailed` when the underlying reservation fails.
/// The stack contents are unchanged by a failed operation.
#[derive(Debug)]
pub struct BoundedStack<T> {
    items: Vec<T>,
    init_cap: usize,
    cap: usize,
}

impl<T> BoundedStack<T> {
    /// Create a new stack with the given initial capacity.
    ///
    /// ## Input
    /// - `init_cap`: Initial slot count; also the growth increment.
    ///   Clamped to at least 1.
    ///
    /// ## Output
    /// - `Ok(BoundedStack)`: Storage reserved
    /// - `Err(ReedError::AllocationFailed)`: Reservation failed
    pub fn new(init_cap: usize) -> ReedResult<Self> {
        let init_cap = init_cap.max(1);
        let mut items = Vec::new();
        items
            .try_reserve_exact(init_cap)
            .map_err(|e| ReedError::AllocationFailed {
                operation: "stack_init".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            items,
            init_cap,
            cap: init_cap,
        })
    }

    /// Push an item, growing by the initial capacity if full.
    ///
    /// ## Output
    /// - `Ok(())`: Item stored
    /// - `Err(ReedError::AllocationFailed)`: Growth failed; stack unchanged
    pub fn push(&mut self, item: T) -> ReedResult<()> {
        if self.items.len() == self.cap {
            let grown = self.cap + self.init_cap;
            self.items
                .try_reserve_exact(grown - self.items.len())
                .map_err(|e| ReedError::AllocationFailed {
                    operation: "stack_grow".to_string(),
                    reason: e.to_string(),
                })?;
            self.cap = grown;
        }
        self.items.push(item);
        Ok(())
    }

    /// Pop the most recently pushed item, if any.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Number of items currently held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the stack holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop all items, keeping the current capacity for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Release capacity down to `cap` slots, discarding items beyond it.
    pub fn shrink_to(&mut self, cap: usize) {
        let cap = cap.max(self.init_cap);
        self.items.truncate(cap);
        self.items.shrink_to(cap);
        self.cap = cap;
    }
}

impl<T: Clone> BoundedStack<T> {
    /// Deep copy with independent backing storage.
    ///
    /// The clone carries the same items, capacity and growth increment;
    /// mutating either stack never affects the other.
    ///
    /// ## Output
    /// - `Ok(BoundedStack)`: Independent copy
    /// - `Err(ReedError::AllocationFailed)`: Reservation failed
    pub fn try_clone(&self) -> ReedResult<Self> {
        let mut items = Vec::new();
        items
            .try_reserve_exact(self.cap)
            .map_err(|e| ReedError::AllocationFailed {
                operation: "stack_copy".to_string(),
                reason: e.to_string(),
            })?;
        items.extend_from_slice(&self.items);
        Ok(Self {
            items,
            init_cap: self.init_cap,
            cap: self.cap,
        })
    }
}
