// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Tests for the bounded-growth stack.

use super::stack::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_order() {
        let mut stack = BoundedStack::new(4).unwrap();
        for i in 0..3 {
            stack.push(i).unwrap();
        }
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), Some(0));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_growth_past_initial_capacity() {
        let mut stack = BoundedStack::new(2).unwrap();
        for i in 0..100 {
            stack.push(i).unwrap();
        }
        assert_eq!(stack.len(), 100);
        for i in (0..100).rev() {
            assert_eq!(stack.pop(), Some(i));
        }
    }

    #[test]
    fn test_zero_initial_capacity_clamped() {
        let mut stack = BoundedStack::new(0).unwrap();
        stack.push(1u8).unwrap();
        stack.push(2u8).unwrap();
        assert_eq!(stack.pop(), Some(2));
    }

    #[test]
    fn test_clear_keeps_capacity_for_reuse() {
        let mut stack = BoundedStack::new(4).unwrap();
        for i in 0..10 {
            stack.push(i).unwrap();
        }
        stack.clear();
        assert!(stack.is_empty());
        for i in 0..10 {
            stack.push(i).unwrap();
        }
        assert_eq!(stack.len(), 10);
    }

    #[test]
    fn test_try_clone_is_independent() {
        let mut stack = BoundedStack::new(4).unwrap();
        for i in 0..6 {
            stack.push(i).unwrap();
        }

        let mut copy = stack.try_clone().unwrap();
        assert_eq!(copy.len(), 6);

        // Draining the copy must not disturb the original.
        while copy.pop().is_some() {}
        assert!(copy.is_empty());
        assert_eq!(stack.len(), 6);
        assert_eq!(stack.pop(), Some(5));
    }

    #[test]
    fn test_shrink_to_discards_excess_items() {
        let mut stack = BoundedStack::new(2).unwrap();
        for i in 0..8 {
            stack.push(i).unwrap();
        }
        stack.shrink_to(4);
        assert_eq!(stack.len(), 4);
        assert_eq!(stack.pop(), Some(3));
    }
}
