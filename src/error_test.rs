// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Tests for ReedIndex error types.

use super::error::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_order_display() {
        let err = ReedError::InvalidOrder { order: 2, min: 3 };
        assert_eq!(err.to_string(), "Invalid B+-Tree order: 2 (minimum: 3)");
    }

    #[test]
    fn test_allocation_failed_display() {
        let err = ReedError::AllocationFailed {
            operation: "grow_journal".to_string(),
            reason: "memory allocation failed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Allocation failed during 'grow_journal': memory allocation failed"
        );
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        let err = ReedError::InvalidOrder { order: 0, min: 3 };
        assert_error(&err);
    }
}
