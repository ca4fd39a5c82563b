// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error types for ReedIndex operations.
//!
//! Provides structured error handling with detailed context for debugging.

use std::fmt;

/// Standard Result type for all ReedIndex operations.
pub type ReedResult<T> = Result<T, ReedError>;

/// Error types for ReedIndex operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReedError {
    /// Invalid B+-Tree order.
    InvalidOrder { order: u16, min: u16 },

    /// Heap allocation failed during the named operation.
    ///
    /// The tree stays ordered and chain-linked, but the rebalancing step the
    /// failure interrupted may leave nodes on that path below their
    /// occupancy floor.
    AllocationFailed { operation: String, reason: String },
}

impl fmt::Display for ReedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOrder { order, min } => {
                write!(f, "Invalid B+-Tree order: {} (minimum: {})", order, min)
            }
            Self::AllocationFailed { operation, reason } => {
                write!(f, "Allocation failed during '{}': {}", operation, reason)
            }
        }
    }
}

impl std::error::Error for ReedError {}
