// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! ReedIndex: in-memory ordered key-value index for embedding in data systems.
//!
//! A single B+-Tree with a configurable branching factor, a caller-supplied
//! key comparator, and ordered traversal over a doubly-linked leaf chain.
//! Rebalancing prefers redistribution between siblings over splitting or
//! merging, which keeps nodes well filled under churn.
//!
//! ## Features
//!
//! - **Logarithmic operations**: insert, delete, and point lookup in O(log n)
//! - **Ordered scans**: leaf chain traversal via `iter()` and `range()`
//! - **Caller-supplied ordering**: natural `Ord` or any three-way comparator
//! - **Conflict predicates**: duplicate-key writes and guarded deletes decide
//!   per entry whether to act
//! - **No hidden allocation**: node capacity is reserved up front; the
//!   traversal journal is caller-owned and reused across calls
//!
//! ## Quick Start
//!
//! ```rust
//! use reedindex::{BPlusTree, Journal, Order, pred};
//!
//! let mut tree = BPlusTree::new(Order::new(64)?)?;
//! let mut journal = Journal::new()?;
//!
//! tree.insert("page.title".to_string(), 17u64, &mut journal, pred::always)?;
//! tree.insert("page.intro".to_string(), 23u64, &mut journal, pred::always)?;
//!
//! assert_eq!(tree.get(&"page.title".to_string()), Some(&17));
//!
//! for (key, value) in tree.iter() {
//!     println!("{key}: {value}");
//! }
//! # Ok::<(), reedindex::ReedError>(())
//! ```
//!
//! ## Scope
//!
//! The crate is deliberately small: no persistence, no concurrency (callers
//! serialise access per tree), no bulk loading. Values are opaque payloads;
//! the tree never inspects them beyond handing them to caller predicates.

pub mod btree;
pub mod error;

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

// Re-exports
pub use btree::{
    pred, BPlusTree, BoundedStack, DeleteOutcome, InsertOutcome, Iter, Journal, Order, Range,
};
pub use error::{ReedError, ReedResult};

/// ReedIndex version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
