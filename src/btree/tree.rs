// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! B+-Tree core: journaled descent, insert, delete, rebalancing.
//!
//! The tree has no parent pointers. Every mutating operation records its
//! root-to-leaf descent as `(node, child slot)` frames in a caller-owned
//! [`Journal`], and the rebalancing routines consume those frames to find
//! the ancestors whose separator keys they must rewrite. Mutating a node
//! without a fresh journal would corrupt separators; all writes go through
//! [`BPlusTree::insert`] and [`BPlusTree::delete`].
//!
//! ## Rebalancing Order
//!
//! - Insert into a full leaf: lend to the previous sibling, else lend to the
//!   next sibling, else split and propagate a separator upward.
//! - Delete from a minimal node: borrow from the previous sibling, else
//!   borrow from the next sibling, else merge and propagate the separator
//!   removal upward. Internal-level borrowing rotates entries through the
//!   ancestor separator.
//!
//! ## Thread Safety
//!
//! Not thread-safe. Callers serialise all access per tree, or guarantee
//! exclusive ownership. Operations run to completion synchronously.

use crate::btree::iter::{Iter, Range};
use crate::btree::node::{InternalNode, LeafNode, NodeArena, NodeId};
use crate::btree::stack::BoundedStack;
use crate::btree::types::{DeleteOutcome, InsertOutcome, Order};
use crate::error::ReedResult;
use log::{debug, trace};
use std::cmp::Ordering;

/// Initial journal capacity in frames; also its growth increment.
///
/// One frame per tree level: sixteen levels cover any realistic tree, so the
/// journal normally never regrows after construction.
const JOURNAL_CAP_INIT: usize = 16;

/// One step of a root-to-leaf descent: the internal node visited and the
/// child slot taken out of it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub(crate) node: NodeId,
    pub(crate) slot: usize,
}

/// Caller-owned traversal journal, reused across operations.
///
/// Holds the descent frames of the most recent journaled operation. Create
/// one journal per tree (or per call site) and pass it `&mut` to every
/// [`BPlusTree::insert`] / [`BPlusTree::delete`]; reusing it avoids a heap
/// allocation per call. The journal's lifetime is independent of the tree's.
///
/// ## Example
/// ```rust
/// use reedindex::btree::{BPlusTree, Journal, Order, pred};
///
/// let mut tree = BPlusTree::new(Order::new(8)?)?;
/// let mut journal = Journal::new()?;
/// for i in 0..100u32 {
///     tree.insert(i, i * 2, &mut journal, pred::always)?;
/// }
/// # Ok::<(), reedindex::ReedError>(())
/// ```
#[derive(Debug)]
pub struct Journal {
    pub(crate) frames: BoundedStack<Frame>,
}

impl Journal {
    /// Create a journal with the default initial capacity.
    ///
    /// ## Output
    /// - `Ok(Journal)`: Storage reserved
    /// - `Err(ReedError::AllocationFailed)`: Reservation failed
    pub fn new() -> ReedResult<Self> {
        Self::with_capacity(JOURNAL_CAP_INIT)
    }

    /// Create a journal sized for `capacity` descent frames.
    ///
    /// Capacity grows arithmetically by the initial amount if a descent ever
    /// runs deeper.
    pub fn with_capacity(capacity: usize) -> ReedResult<Self> {
        Ok(Self {
            frames: BoundedStack::new(capacity)?,
        })
    }

    /// Drop all recorded frames, keeping capacity for reuse.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Number of frames currently recorded.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the journal holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Deep copy with independent storage.
    fn try_clone(&self) -> ReedResult<Self> {
        Ok(Self {
            frames: self.frames.try_clone()?,
        })
    }
}

/// In-memory B+-Tree index.
///
/// Ordered map from `K` to `V` with a configurable branching factor and a
/// caller-supplied three-way comparator (defaulting to `K::cmp`). Leaves
/// form a doubly-linked chain for ordered scans; internal nodes keep
/// same-level sibling links used only during rebalancing.
///
/// ## Type Parameters
/// - `K`: Key type; cloned into ancestor separator slots
/// - `V`: Value type; opaque to the tree
/// - `C`: Comparator, `Fn(&K, &K) -> Ordering` defining a total order
///
/// ## Invariants (hold after every completed operation)
/// - Keys are strictly increasing within every node and across the whole
///   leaf chain
/// - Every internal key equals the minimum key of the subtree behind the
///   child to its right
/// - Every non-root node holds at least its occupancy floor
///   ([`Order::leaf_min_keys`] / [`Order::internal_min_keys`])
/// - All leaves sit at the same depth
///
/// ## Thread Safety
/// - Not thread-safe (caller must synchronise)
pub struct BPlusTree<K, V, C = fn(&K, &K) -> Ordering> {
    /// Arena holding every leaf node.
    pub(crate) leaves: NodeArena<LeafNode<K, V>>,

    /// Arena holding every internal node.
    pub(crate) internals: NodeArena<InternalNode<K>>,

    /// Root handle: a leaf id when `height == 0`, else an internal id.
    pub(crate) root: NodeId,

    /// Edge count from the root down to the leaf level.
    pub(crate) height: usize,

    /// Branching factor and derived split/occupancy bounds.
    pub(crate) order: Order,

    /// Three-way key comparator.
    pub(crate) cmp: C,
}

impl<K, V, C> std::fmt::Debug for BPlusTree<K, V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BPlusTree")
            .field("root", &self.root)
            .field("height", &self.height)
            .field("order", &self.order)
            .finish()
    }
}

impl<K: Clone + Ord, V> BPlusTree<K, V> {
    /// Create an empty tree ordered by `K`'s natural ordering.
    ///
    /// ## Input
    /// - `order`: Branching factor (validated, >= 3)
    ///
    /// ## Output
    /// - `Ok(BPlusTree)`: Tree with a single empty root leaf
    /// - `Err(ReedError::AllocationFailed)`: Root allocation failed
    ///
    /// ## Example
    /// ```rust
    /// use reedindex::btree::{BPlusTree, Order};
    ///
    /// let tree = BPlusTree::<u64, String>::new(Order::new(32)?)?;
    /// assert_eq!(tree.height(), 0);
    /// # Ok::<(), reedindex::ReedError>(())
    /// ```
    pub fn new(order: Order) -> ReedResult<Self> {
        Self::with_comparator(order, K::cmp)
    }
}

impl<K: Clone, V, C> BPlusTree<K, V, C>
where
    C: Fn(&K, &K) -> Ordering,
{
    /// Create an empty tree ordered by a caller-supplied comparator.
    ///
    /// The comparator must define a total order and must compare
    /// consistently for the lifetime of the tree; an inconsistent
    /// comparator corrupts the index.
    ///
    /// ## Example
    /// ```rust
    /// use reedindex::btree::{BPlusTree, Order};
    ///
    /// // Reverse ordering
    /// let tree: BPlusTree<u32, &str, _> =
    ///     BPlusTree::with_comparator(Order::new(16)?, |a: &u32, b| b.cmp(a))?;
    /// # Ok::<(), reedindex::ReedError>(())
    /// ```
    pub fn with_comparator(order: Order, cmp: C) -> ReedResult<Self> {
        let mut leaves = NodeArena::new();
        let root = leaves.insert(LeafNode::with_capacity(order, None, None)?)?;
        Ok(Self {
            leaves,
            internals: NodeArena::new(),
            root,
            height: 0,
            order,
            cmp,
        })
    }

    /// Configured branching factor.
    pub fn order(&self) -> Order {
        self.order
    }

    /// Edge count from the root to the leaves (0 while the root is a leaf).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Point lookup.
    ///
    /// ## Input
    /// - `key`: Key to look up
    ///
    /// ## Output
    /// - `Some(&V)`: Entry present
    /// - `None`: No entry with an equal key
    ///
    /// ## Performance
    /// - O(log n); no mutation, no allocation
    pub fn get(&self, key: &K) -> Option<&V> {
        self.locate(key)
            .map(|(leaf, slot)| &self.leaves.get(leaf).values[slot])
    }

    /// Whether an entry with an equal key is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.locate(key).is_some()
    }

    /// Ordered iteration over all entries via the leaf chain.
    pub fn iter(&self) -> Iter<'_, K, V, C> {
        Iter::new(self, self.first_leaf())
    }

    /// Ordered scan over the half-open key interval `[start, end)`.
    ///
    /// Descends once to the leaf containing `start`, then walks `next`
    /// links until a key reaches `end`.
    pub fn range<'a>(&'a self, start: &K, end: &'a K) -> Range<'a, K, V, C> {
        let mut id = self.root;
        for _ in 0..self.height {
            let node = self.internals.get(id);
            id = node.children[node.child_slot(start, &self.cmp)];
        }
        let slot = match self.leaves.get(id).slot_of(start, &self.cmp) {
            Ok(slot) => slot,
            Err(slot) => slot,
        };
        Range::new(self, id, slot, end)
    }

    /// Insert an entry, resolving key collisions with a caller predicate.
    ///
    /// ## Input
    /// - `key` / `value`: Entry to store
    /// - `journal`: Caller-owned traversal journal (reset and reused here)
    /// - `on_conflict`: Called as `(incoming, existing)` when an entry with
    ///   an equal key already exists; returning `true` replaces the stored
    ///   value in place, `false` leaves the tree untouched. Must not have
    ///   observable side effects on the tree.
    ///
    /// ## Output
    /// - `Ok(InsertOutcome::Inserted)`: Key was absent; entry stored
    /// - `Ok(InsertOutcome::Replaced)`: Collision, predicate accepted
    /// - `Ok(InsertOutcome::Kept)`: Collision, predicate declined
    /// - `Err(ReedError::AllocationFailed)`: Node or journal allocation
    ///   failed; ordering and chain invariants still hold, but the failure
    ///   path may be left under-occupied
    ///
    /// ## Performance
    /// - O(log n) descent plus O(order) in-node shifting; allocates only
    ///   when a node splits or the journal grows
    pub fn insert<F>(
        &mut self,
        key: K,
        value: V,
        journal: &mut Journal,
        on_conflict: F,
    ) -> ReedResult<InsertOutcome>
    where
        F: FnOnce(&V, &V) -> bool,
    {
        let (leaf_id, slot) = self.descend(&key, journal)?;
        match slot {
            Ok(slot) => {
                let leaf = self.leaves.get_mut(leaf_id);
                if on_conflict(&value, &leaf.values[slot]) {
                    leaf.values[slot] = value;
                    Ok(InsertOutcome::Replaced)
                } else {
                    Ok(InsertOutcome::Kept)
                }
            }
            Err(pos) => {
                self.leaf_insert(leaf_id, pos, key, value, journal)?;
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    /// Delete an entry, letting a caller guard inspect it first.
    ///
    /// ## Input
    /// - `key`: Key to remove
    /// - `journal`: Caller-owned traversal journal (reset and reused here)
    /// - `guard`: Called with the stored value; returning `true` removes the
    ///   entry, `false` leaves the tree untouched. Must not have observable
    ///   side effects on the tree.
    ///
    /// ## Output
    /// - `Ok(DeleteOutcome::Removed)`: Entry existed and was removed
    /// - `Ok(DeleteOutcome::Kept)`: Entry existed, guard declined
    /// - `Ok(DeleteOutcome::NotFound)`: No entry with an equal key
    /// - `Err(ReedError::AllocationFailed)`: Journal allocation failed
    ///
    /// ## Performance
    /// - O(log n) descent plus O(order) per rebalanced level
    pub fn delete<F>(
        &mut self,
        key: &K,
        journal: &mut Journal,
        guard: F,
    ) -> ReedResult<DeleteOutcome>
    where
        F: FnOnce(&V) -> bool,
    {
        let (leaf_id, slot) = self.descend(key, journal)?;
        let Ok(slot) = slot else {
            return Ok(DeleteOutcome::NotFound);
        };
        if !guard(&self.leaves.get(leaf_id).values[slot]) {
            return Ok(DeleteOutcome::Kept);
        }
        self.leaf_delete(leaf_id, slot, journal)?;
        Ok(DeleteOutcome::Removed)
    }

    // ------------------------------------------------------------------
    // Descent
    // ------------------------------------------------------------------

    /// Read-only descent to the leaf and slot holding `key`.
    fn locate(&self, key: &K) -> Option<(NodeId, usize)> {
        let mut id = self.root;
        for _ in 0..self.height {
            let node = self.internals.get(id);
            id = node.children[node.child_slot(key, &self.cmp)];
        }
        self.leaves
            .get(id)
            .slot_of(key, &self.cmp)
            .ok()
            .map(|slot| (id, slot))
    }

    /// Journaled descent: records one frame per internal level (none for
    /// the leaf), resetting the journal first.
    ///
    /// Returns the leaf id and `Ok(slot)` for a key match or `Err(slot)`
    /// with the insertion position.
    fn descend(
        &self,
        key: &K,
        journal: &mut Journal,
    ) -> ReedResult<(NodeId, Result<usize, usize>)> {
        journal.clear();
        let mut id = self.root;
        for _ in 0..self.height {
            let node = self.internals.get(id);
            let slot = node.child_slot(key, &self.cmp);
            journal.frames.push(Frame { node: id, slot })?;
            id = node.children[slot];
        }
        Ok((id, self.leaves.get(id).slot_of(key, &self.cmp)))
    }

    /// Leftmost leaf of the tree.
    pub(crate) fn first_leaf(&self) -> NodeId {
        let mut id = self.root;
        for _ in 0..self.height {
            id = self.internals.get(id).children[0];
        }
        id
    }

    // ------------------------------------------------------------------
    // Separator maintenance (journal-consuming)
    // ------------------------------------------------------------------

    /// Rewrite the nearest ancestor separator governing the descended
    /// subtree's minimum to `new_key`.
    ///
    /// Pops frames until one descended through a non-leftmost slot; that
    /// frame's `keys[slot - 1]` is the separator. An emptied journal means
    /// the subtree is the leftmost of the whole tree and no separator
    /// names its minimum.
    fn update_min_separator(&mut self, new_key: K, journal: &mut Journal) {
        while let Some(frame) = journal.frames.pop() {
            if frame.slot != 0 {
                self.internals.get_mut(frame.node).keys[frame.slot - 1] = new_key;
                return;
            }
        }
    }

    /// Nearest ancestor separator between the descended subtree and its
    /// left neighbour: the first frame with a non-leftmost slot.
    fn left_separator(journal: &mut Journal) -> Option<(NodeId, usize)> {
        while let Some(frame) = journal.frames.pop() {
            if frame.slot != 0 {
                return Some((frame.node, frame.slot - 1));
            }
        }
        None
    }

    /// Nearest ancestor separator between the descended subtree and its
    /// right neighbour: the first frame with a non-rightmost slot.
    fn right_separator(&self, journal: &mut Journal) -> Option<(NodeId, usize)> {
        while let Some(frame) = journal.frames.pop() {
            if frame.slot != self.internals.get(frame.node).keys.len() {
                return Some((frame.node, frame.slot));
            }
        }
        None
    }

    /// Both separators of [`left_separator`](Self::left_separator) and
    /// [`right_separator`](Self::right_separator) in one destructive pass.
    fn both_separators(
        &self,
        journal: &mut Journal,
    ) -> (Option<(NodeId, usize)>, Option<(NodeId, usize)>) {
        let mut left = None;
        let mut right = None;
        while left.is_none() || right.is_none() {
            let Some(frame) = journal.frames.pop() else {
                break;
            };
            if left.is_none() && frame.slot != 0 {
                left = Some((frame.node, frame.slot - 1));
            }
            if right.is_none() && frame.slot != self.internals.get(frame.node).keys.len() {
                right = Some((frame.node, frame.slot));
            }
        }
        (left, right)
    }

    // ------------------------------------------------------------------
    // Insert path
    // ------------------------------------------------------------------

    /// Place a fresh entry at `pos` of a leaf, rebalancing if it is full.
    fn leaf_insert(
        &mut self,
        leaf_id: NodeId,
        pos: usize,
        key: K,
        value: V,
        journal: &mut Journal,
    ) -> ReedResult<()> {
        let order = self.order.max_keys();
        let m = self.leaves.get(leaf_id).keys.len();

        if m < order {
            let leaf = self.leaves.get_mut(leaf_id);
            leaf.keys.insert(pos, key);
            leaf.values.insert(pos, value);
            return Ok(());
        }

        let prev = self.leaves.get(leaf_id).prev;
        let next = self.leaves.get(leaf_id).next;

        // Full leaf: lend an entry to a sibling before splitting.
        if let Some(prev_id) = prev {
            if self.leaves.get(prev_id).keys.len() < order {
                // The leaf's minimum moves left. A governed leaf only
                // receives keys above its separator, so pos >= 1 here.
                let (prev_node, leaf) = self.leaves.two_mut(prev_id, leaf_id);
                prev_node.keys.push(leaf.keys.remove(0));
                prev_node.values.push(leaf.values.remove(0));
                leaf.keys.insert(pos - 1, key);
                leaf.values.insert(pos - 1, value);
                let new_min = leaf.keys[0].clone();
                trace!("leaf {} lends its minimum to previous {}", leaf_id, prev_id);
                self.update_min_separator(new_min, journal);
                return Ok(());
            }
        }
        if let Some(next_id) = next {
            if self.leaves.get(next_id).keys.len() < order {
                let (leaf, next_node) = self.leaves.two_mut(leaf_id, next_id);
                if pos == order {
                    // the new entry itself becomes the next leaf's minimum
                    next_node.keys.insert(0, key);
                    next_node.values.insert(0, value);
                } else {
                    next_node.keys.insert(0, leaf.keys.remove(order - 1));
                    next_node.values.insert(0, leaf.values.remove(order - 1));
                    leaf.keys.insert(pos, key);
                    leaf.values.insert(pos, value);
                }
                let next_min = next_node.keys[0].clone();
                trace!("leaf {} lends its maximum to next {}", leaf_id, next_id);
                let (mid, mid_slot) = self
                    .right_separator(journal)
                    .expect("a leaf with a next sibling has a non-rightmost ancestor");
                self.internals.get_mut(mid).keys[mid_slot] = next_min;
                return Ok(());
            }
        }

        self.leaf_split(leaf_id, pos, key, value, journal)
    }

    /// Split a full leaf around an incoming entry and propagate the new
    /// right leaf's minimum upward as a separator.
    fn leaf_split(
        &mut self,
        leaf_id: NodeId,
        pos: usize,
        key: K,
        value: V,
        journal: &mut Journal,
    ) -> ReedResult<()> {
        let keep = self.order.leaf_split_keep();
        let next = self.leaves.get(leaf_id).next;
        let new_leaf = LeafNode::with_capacity(self.order, Some(leaf_id), next)?;
        let new_id = self.leaves.insert(new_leaf)?;
        debug!("leaf {} splits; new right leaf {}", leaf_id, new_id);

        self.leaves.get_mut(leaf_id).next = Some(new_id);
        if let Some(next_id) = next {
            self.leaves.get_mut(next_id).prev = Some(new_id);
        }

        {
            let (leaf, right) = self.leaves.two_mut(leaf_id, new_id);
            if pos >= keep {
                // new entry lands in the right node
                right.keys.extend(leaf.keys.drain(keep..));
                right.values.extend(leaf.values.drain(keep..));
                right.keys.insert(pos - keep, key);
                right.values.insert(pos - keep, value);
            } else {
                // new entry lands in the left node
                right.keys.extend(leaf.keys.drain(keep - 1..));
                right.values.extend(leaf.values.drain(keep - 1..));
                leaf.keys.insert(pos, key);
                leaf.values.insert(pos, value);
            }
        }

        let separator = self.leaves.get(new_id).keys[0].clone();
        self.propagate_split(leaf_id, new_id, separator, journal)
    }

    /// Thread a freshly split-off right node into the ancestors.
    ///
    /// Walks the journal upward. A parent with room absorbs the separator
    /// and the new child handle; a full parent splits in turn, promoting
    /// one separator to the next level. An emptied journal means the root
    /// itself split and the tree grows by one level.
    fn propagate_split(
        &mut self,
        mut left_id: NodeId,
        mut right_id: NodeId,
        mut separator: K,
        journal: &mut Journal,
    ) -> ReedResult<()> {
        let order = self.order.max_keys();
        let keep = self.order.internal_split_keep();

        loop {
            let Some(frame) = journal.frames.pop() else {
                let mut new_root = InternalNode::with_capacity(self.order, None, None)?;
                new_root.keys.push(separator);
                new_root.children.push(left_id);
                new_root.children.push(right_id);
                self.root = self.internals.insert(new_root)?;
                self.height += 1;
                debug!("root split; height now {}", self.height);
                return Ok(());
            };
            let parent_id = frame.node;
            let pslot = frame.slot;
            let m = self.internals.get(parent_id).keys.len();

            if m < order {
                let parent = self.internals.get_mut(parent_id);
                parent.keys.insert(pslot, separator);
                parent.children.insert(pslot + 1, right_id);
                return Ok(());
            }

            // Full parent: split it and keep propagating.
            let next = self.internals.get(parent_id).next;
            let new_node = InternalNode::with_capacity(self.order, Some(parent_id), next)?;
            let new_id = self.internals.insert(new_node)?;
            debug!("internal {} splits; new right node {}", parent_id, new_id);

            self.internals.get_mut(parent_id).next = Some(new_id);
            if let Some(next_id) = next {
                self.internals.get_mut(next_id).prev = Some(new_id);
            }

            let promoted;
            {
                let (parent, right) = self.internals.two_mut(parent_id, new_id);
                match pslot.cmp(&keep) {
                    Ordering::Less => {
                        // incoming separator stays left; the left node's
                        // last key is promoted
                        right.keys.extend(parent.keys.drain(keep..));
                        right.children.extend(parent.children.drain(keep..));
                        promoted = parent.keys.remove(keep - 1);
                        parent.keys.insert(pslot, separator);
                        parent.children.insert(pslot + 1, right_id);
                    }
                    Ordering::Greater => {
                        // incoming separator lands inside the right node
                        right.keys.extend(parent.keys.drain(keep + 1..));
                        right.children.extend(parent.children.drain(keep + 1..));
                        promoted = parent.keys.remove(keep);
                        let front = pslot - keep;
                        right.keys.insert(front - 1, separator);
                        right.children.insert(front, right_id);
                    }
                    Ordering::Equal => {
                        // incoming separator is itself promoted; the new
                        // child leads the right node
                        right.keys.extend(parent.keys.drain(keep..));
                        right.children.extend(parent.children.drain(keep + 1..));
                        right.children.insert(0, right_id);
                        promoted = separator;
                    }
                }
            }

            left_id = parent_id;
            right_id = new_id;
            separator = promoted;
        }
    }

    // ------------------------------------------------------------------
    // Delete path
    // ------------------------------------------------------------------

    /// Remove the entry at `slot` of a leaf, rebalancing on underflow.
    fn leaf_delete(&mut self, leaf_id: NodeId, slot: usize, journal: &mut Journal) -> ReedResult<()> {
        let min_keys = self.order.leaf_min_keys();
        let m = self.leaves.get(leaf_id).keys.len();

        if m != min_keys || journal.is_empty() {
            // No underflow possible (or the leaf is the root).
            let leaf = self.leaves.get_mut(leaf_id);
            leaf.keys.remove(slot);
            leaf.values.remove(slot);
            let new_min = if slot == 0 {
                leaf.keys.first().cloned()
            } else {
                None
            };
            if let Some(new_min) = new_min {
                self.update_min_separator(new_min, journal);
            }
            return Ok(());
        }

        let prev = self.leaves.get(leaf_id).prev;
        let next = self.leaves.get(leaf_id).next;

        // 1. Borrow from the previous leaf, levelling the two loads.
        if let Some(prev_id) = prev {
            let prev_len = self.leaves.get(prev_id).keys.len();
            if prev_len > min_keys {
                let sum = (min_keys - 1) + prev_len;
                let left_target = sum - sum / 2;
                let (prev_node, leaf) = self.leaves.two_mut(prev_id, leaf_id);
                leaf.keys.remove(slot);
                leaf.values.remove(slot);
                leaf.keys.splice(0..0, prev_node.keys.drain(left_target..));
                leaf.values
                    .splice(0..0, prev_node.values.drain(left_target..));
                let new_min = leaf.keys[0].clone();
                trace!("leaf {} borrows from previous {}", leaf_id, prev_id);
                self.update_min_separator(new_min, journal);
                return Ok(());
            }
        }

        // 2. Borrow from the next leaf.
        if let Some(next_id) = next {
            let next_len = self.leaves.get(next_id).keys.len();
            if next_len > min_keys {
                let sum = (min_keys - 1) + next_len;
                let grab = sum / 2 - (min_keys - 1);
                let (leaf, next_node) = self.leaves.two_mut(leaf_id, next_id);
                leaf.keys.remove(slot);
                leaf.values.remove(slot);
                leaf.keys.extend(next_node.keys.drain(..grab));
                leaf.values.extend(next_node.values.drain(..grab));
                let leaf_min = leaf.keys[0].clone();
                let next_min = next_node.keys[0].clone();
                trace!("leaf {} borrows from next {}", leaf_id, next_id);
                if slot != 0 || prev.is_none() {
                    let (mid, mid_slot) = self
                        .right_separator(journal)
                        .expect("a leaf with a next sibling has a non-rightmost ancestor");
                    self.internals.get_mut(mid).keys[mid_slot] = next_min;
                } else {
                    // The deleted key was this leaf's minimum, so the
                    // separators of both this leaf and the next one move.
                    let (left_sep, right_sep) = self.both_separators(journal);
                    let (lid, lslot) = left_sep
                        .expect("a leaf with a previous sibling has a non-leftmost ancestor");
                    self.internals.get_mut(lid).keys[lslot] = leaf_min;
                    let (rid, rslot) = right_sep
                        .expect("a leaf with a next sibling has a non-rightmost ancestor");
                    self.internals.get_mut(rid).keys[rslot] = next_min;
                }
                return Ok(());
            }
        }

        // 3. Both siblings minimal or absent: merge. Prefer the previous
        //    sibling; the merged leaf ends with 2 * min - 1 entries.
        if let Some(prev_id) = prev {
            {
                let (prev_node, leaf) = self.leaves.two_mut(prev_id, leaf_id);
                leaf.keys.remove(slot);
                leaf.values.remove(slot);
                prev_node.keys.append(&mut leaf.keys);
                prev_node.values.append(&mut leaf.values);
                prev_node.next = next;
            }
            if let Some(next_id) = next {
                self.leaves.get_mut(next_id).prev = Some(prev_id);
            }
            debug!("leaf {} merges into previous {}", leaf_id, prev_id);
            self.leaves.remove(leaf_id);
        } else {
            let next_id = next.expect("a non-root leaf has at least one sibling");
            {
                let (leaf, next_node) = self.leaves.two_mut(leaf_id, next_id);
                leaf.keys.remove(slot);
                leaf.values.remove(slot);
                next_node.keys.splice(0..0, leaf.keys.drain(..));
                next_node.values.splice(0..0, leaf.values.drain(..));
                next_node.prev = None;
            }
            // The next leaf's separator must take the merged minimum, but
            // the removal propagation below still needs the journal intact:
            // consult a copy.
            let mut copy = journal.try_clone()?;
            let merged_min = self.leaves.get(next_id).keys[0].clone();
            let (mid, mid_slot) = self
                .right_separator(&mut copy)
                .expect("a leaf with a next sibling has a non-rightmost ancestor");
            self.internals.get_mut(mid).keys[mid_slot] = merged_min;
            debug!("leaf {} merges into next {}", leaf_id, next_id);
            self.leaves.remove(leaf_id);
        }

        self.propagate_removal(journal)
    }

    /// Remove the separator and child handle of a merged-away node from its
    /// ancestors, rebalancing internal nodes on the way up.
    fn propagate_removal(&mut self, journal: &mut Journal) -> ReedResult<()> {
        let min_keys = self.order.internal_min_keys();

        loop {
            let frame = journal
                .frames
                .pop()
                .expect("removal propagation starts below the root");
            let node_id = frame.node;
            let slot = frame.slot;
            let m = self.internals.get(node_id).keys.len();

            if journal.is_empty() {
                // Reached the root.
                if m == 1 {
                    self.root = self.internals.get(node_id).children[1 - slot];
                    self.height -= 1;
                    self.internals.remove(node_id);
                    debug!("root collapses; height now {}", self.height);
                } else {
                    Self::excise(self.internals.get_mut(node_id), slot);
                }
                return Ok(());
            }

            if m > min_keys {
                // Enough keys remain; shed the separator and finish.
                if slot != 0 {
                    Self::excise(self.internals.get_mut(node_id), slot);
                } else {
                    let promoted = {
                        let node = self.internals.get_mut(node_id);
                        node.children.remove(0);
                        node.keys.remove(0)
                    };
                    // the surviving first child's minimum moves up to the
                    // ancestor separator naming this subtree, if any does
                    if let Some((mid, mid_slot)) = Self::left_separator(journal) {
                        self.internals.get_mut(mid).keys[mid_slot] = promoted;
                    }
                }
                return Ok(());
            }

            let prev = self.internals.get(node_id).prev;
            let next = self.internals.get(node_id).next;

            // 1. Borrow from the previous internal node, rotating entries
            //    through the ancestor separator.
            if let Some(prev_id) = prev {
                let prev_len = self.internals.get(prev_id).keys.len();
                if prev_len > min_keys {
                    let (mid, mid_slot) = Self::left_separator(journal)
                        .expect("a node with a previous sibling has a non-leftmost ancestor");
                    let sum = prev_len + (min_keys - 1);
                    let right_target = sum / 2;
                    let left_target = sum - right_target;
                    let descending = if slot != 0 {
                        Some(self.internals.get(mid).keys[mid_slot].clone())
                    } else {
                        None
                    };
                    let rising;
                    {
                        let (prev_node, node) = self.internals.two_mut(prev_id, node_id);
                        if slot != 0 {
                            node.keys.remove(slot - 1);
                            node.children.remove(slot);
                        } else {
                            // the dead child led the node; its old separator
                            // dies with it and the first key stays in place
                            node.children.remove(0);
                        }
                        if let Some(descending) = descending {
                            node.keys.insert(0, descending);
                        }
                        node.keys
                            .splice(0..0, prev_node.keys.drain(left_target + 1..));
                        node.children
                            .splice(0..0, prev_node.children.drain(left_target + 1..));
                        rising = prev_node.keys.remove(left_target);
                    }
                    trace!("internal {} borrows from previous {}", node_id, prev_id);
                    self.internals.get_mut(mid).keys[mid_slot] = rising;
                    return Ok(());
                }
            }

            // 2. Borrow from the next internal node.
            if let Some(next_id) = next {
                let next_len = self.internals.get(next_id).keys.len();
                if next_len > min_keys {
                    let sum = next_len + (min_keys - 1);
                    let grab = sum / 2 + 1 - min_keys;
                    let mid;
                    let mid_slot;
                    if slot != 0 {
                        let found = self
                            .right_separator(journal)
                            .expect("a node with a next sibling has a non-rightmost ancestor");
                        mid = found.0;
                        mid_slot = found.1;
                        Self::excise(self.internals.get_mut(node_id), slot);
                    } else {
                        let (left_sep, right_sep) = self.both_separators(journal);
                        let found = right_sep
                            .expect("a node with a next sibling has a non-rightmost ancestor");
                        mid = found.0;
                        mid_slot = found.1;
                        let first_key = {
                            let node = self.internals.get_mut(node_id);
                            node.children.remove(0);
                            node.keys.remove(0)
                        };
                        if let Some((lid, lslot)) = left_sep {
                            self.internals.get_mut(lid).keys[lslot] = first_key;
                        }
                    }
                    let descending = self.internals.get(mid).keys[mid_slot].clone();
                    let rising;
                    {
                        let (node, next_node) = self.internals.two_mut(node_id, next_id);
                        node.keys.push(descending);
                        node.keys.extend(next_node.keys.drain(..grab - 1));
                        rising = next_node.keys.remove(0);
                        node.children.extend(next_node.children.drain(..grab));
                    }
                    trace!("internal {} borrows from next {}", node_id, next_id);
                    self.internals.get_mut(mid).keys[mid_slot] = rising;
                    return Ok(());
                }
            }

            // 3. Merge with an adjacent node, pulling the parent separator
            //    down as the join key. The parent frame decides direction
            //    and is pushed back for the next round of the loop.
            let mut parent = journal
                .frames
                .pop()
                .expect("a non-root internal node has a parent frame");
            if parent.slot != 0 {
                // Merge this node into its previous sibling (same parent).
                let prev_id = prev.expect("a non-leftmost child has a previous sibling");
                let join_key = self.internals.get(parent.node).keys[parent.slot - 1].clone();
                {
                    let (prev_node, node) = self.internals.two_mut(prev_id, node_id);
                    if slot != 0 {
                        node.keys.remove(slot - 1);
                        node.children.remove(slot);
                        prev_node.keys.push(join_key);
                    } else {
                        // the dead child led the node: its first key becomes
                        // the join boundary and the parent separator dies in
                        // the upcoming excision
                        node.children.remove(0);
                    }
                    prev_node.keys.append(&mut node.keys);
                    prev_node.children.append(&mut node.children);
                    prev_node.next = next;
                }
                if let Some(next_id) = next {
                    self.internals.get_mut(next_id).prev = Some(prev_id);
                }
                debug!("internal {} merges into previous {}", node_id, prev_id);
                self.internals.remove(node_id);
                journal.frames.push(parent)?;
            } else {
                // Leftmost child: merge the next sibling (same parent) into
                // this node and shift the parent frame one slot right so the
                // next round removes the dead sibling's entry.
                let next_id = next.expect("a leftmost child has a right sibling under its parent");
                let join_key = self.internals.get(parent.node).keys[parent.slot].clone();
                if slot != 0 {
                    Self::excise(self.internals.get_mut(node_id), slot);
                } else {
                    if prev.is_some() {
                        // an ancestor separator still names this subtree's
                        // minimum; fix it on a journal copy, the original
                        // keeps feeding the propagation
                        let first_key = self.internals.get(node_id).keys[0].clone();
                        let mut copy = journal.try_clone()?;
                        let (lid, lslot) = Self::left_separator(&mut copy)
                            .expect("a node with a previous sibling has a non-leftmost ancestor");
                        self.internals.get_mut(lid).keys[lslot] = first_key;
                    }
                    let node = self.internals.get_mut(node_id);
                    node.keys.remove(0);
                    node.children.remove(0);
                }
                let next_next = self.internals.get(next_id).next;
                {
                    let (node, next_node) = self.internals.two_mut(node_id, next_id);
                    node.keys.push(join_key);
                    node.keys.append(&mut next_node.keys);
                    node.children.append(&mut next_node.children);
                    node.next = next_next;
                }
                if let Some(nn) = next_next {
                    self.internals.get_mut(nn).prev = Some(node_id);
                }
                debug!("internal {} absorbs next {}", node_id, next_id);
                self.internals.remove(next_id);
                parent.slot += 1;
                journal.frames.push(parent)?;
            }
        }
    }

    /// Drop the separator and child handle recorded by a descent slot.
    ///
    /// For a non-leftmost slot the separator is `keys[slot - 1]`; for the
    /// leftmost slot both the first key and the first child go.
    fn excise(node: &mut InternalNode<K>, slot: usize) {
        if slot != 0 {
            node.keys.remove(slot - 1);
            node.children.remove(slot);
        } else {
            node.keys.remove(0);
            node.children.remove(0);
        }
    }
}
