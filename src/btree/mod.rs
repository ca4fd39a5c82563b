// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! B+-Tree in-memory index engine.
//!
//! Generic ordered index with a doubly-linked leaf chain for sequential
//! scans. Nodes live in slot-recycling arenas; there are no parent pointers.
//! Instead, every mutating operation records its root-to-leaf descent in a
//! caller-owned journal, and rebalancing consults that journal to find the
//! ancestors whose separator keys it must touch.
//!
//! ## Rebalancing Policy
//!
//! A full or underfull node first tries to trade entries with an adjacent
//! sibling at the same level; only when both siblings are unusable does it
//! split or merge. Redistribution keeps the node count stable and pushes the
//! bookkeeping into separator-key updates inside ancestors.
//!
//! ## Example Usage
//!
//! ```rust
//! use reedindex::btree::{BPlusTree, Journal, Order, pred};
//!
//! let mut tree = BPlusTree::new(Order::new(16)?)?;
//! let mut journal = Journal::new()?;
//!
//! tree.insert(42u32, "answer", &mut journal, pred::always)?;
//! assert_eq!(tree.get(&42), Some(&"answer"));
//!
//! tree.delete(&42, &mut journal, |_| true)?;
//! assert_eq!(tree.get(&42), None);
//! # Ok::<(), reedindex::ReedError>(())
//! ```

mod iter;
mod node;
mod stack;
mod tree;
mod types;


#[cfg(test)]
#[path = "stack_test.rs"]
mod stack_test;


// Re-export public API
pub use iter::{Iter, Range};
pub use stack::BoundedStack;
pub use tree::{BPlusTree, Journal};
pub use types::{pred, DeleteOutcome, InsertOutcome, Order};
