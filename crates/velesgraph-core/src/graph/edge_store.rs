//! Fixed-capacity edge storage used while a graph is being refined.
//!
//! Every node owns a [`FixedEdgeSlice`] of exactly `range` slots. Valid
//! entries are left-aligned; everything after the first sentinel is a
//! sentinel too, so the length is found with a binary search.
//!
//! # Access protocol
//!
//! The [`EdgeArena`] wraps each slice in its own mutex:
//!
//! - **Phase 1** (generation + pruning) hands out `&mut` slices through
//!   [`EdgeArena::par_slices_mut`]. Each worker owns its node exclusively and
//!   never touches the lock.
//! - **Phase 2** (reverse-edge repair) goes through [`EdgeArena::lock`].
//!   Callers hold at most one slice lock at a time.

use parking_lot::{Mutex, MutexGuard};
use rayon::prelude::*;

use super::adjacency::AdjacencyGraph;
use super::neighbor::{Neighbor, NodeId};

/// `range` neighbor slots for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedEdgeSlice {
    slots: Box<[Neighbor]>,
}

impl FixedEdgeSlice {
    /// An all-sentinel slice.
    #[must_use]
    pub fn new(range: usize) -> Self {
        Self {
            slots: vec![Neighbor::SENTINEL; range].into_boxed_slice(),
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of valid entries (index of the first sentinel).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.partition_point(|n| !n.is_sentinel())
    }

    /// Returns true if no slot is in use.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if every slot is in use.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// The valid prefix.
    #[must_use]
    pub fn valid(&self) -> &[Neighbor] {
        &self.slots[..self.len()]
    }

    /// All slots, sentinels included.
    #[must_use]
    pub fn slots(&self) -> &[Neighbor] {
        &self.slots
    }

    /// Returns true if `id` is among the valid entries.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.valid().iter().any(|n| n.id == id)
    }

    /// Overwrites the slice with `accepted`, left-aligned, sentinel-filling
    /// the remainder. Entries beyond the capacity are dropped.
    pub fn fill(&mut self, accepted: &[Neighbor]) {
        let n = accepted.len().min(self.slots.len());
        self.slots[..n].copy_from_slice(&accepted[..n]);
        self.slots[n..].fill(Neighbor::SENTINEL);
    }

    /// Appends `neighbor` at the first sentinel slot.
    ///
    /// Returns false, leaving the slice untouched, when it is full.
    pub fn push(&mut self, neighbor: Neighbor) -> bool {
        let len = self.len();
        if len == self.slots.len() {
            return false;
        }
        self.slots[len] = neighbor;
        true
    }

    /// Returns true if no valid entry follows a sentinel.
    #[must_use]
    pub fn is_monotone(&self) -> bool {
        let len = self.len();
        self.slots[len..].iter().all(Neighbor::is_sentinel)
    }
}

/// Per-node fixed slices with one lock each.
#[derive(Debug)]
pub struct EdgeArena {
    range: usize,
    slices: Vec<Mutex<FixedEdgeSlice>>,
}

impl EdgeArena {
    /// Allocates `nodes` all-sentinel slices of `range` slots.
    #[must_use]
    pub fn new(nodes: usize, range: usize) -> Self {
        Self {
            range,
            slices: (0..nodes)
                .map(|_| Mutex::new(FixedEdgeSlice::new(range)))
                .collect(),
        }
    }

    /// Loads an existing graph, keeping at most `range` entries per node.
    #[must_use]
    pub fn from_graph(graph: &AdjacencyGraph, range: usize) -> Self {
        let mut arena = Self::new(graph.len(), range);
        arena
            .par_slices_mut()
            .enumerate()
            .for_each(|(node, slice)| slice.fill(graph.neighbors(node as NodeId)));
        arena
    }

    /// Slot count per node.
    #[must_use]
    pub fn range(&self) -> usize {
        self.range
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Returns true if the arena has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Exclusive, lock-free access to every slice, indexed by node id.
    pub fn par_slices_mut(
        &mut self,
    ) -> impl IndexedParallelIterator<Item = &mut FixedEdgeSlice> + '_ {
        self.slices.par_iter_mut().map(Mutex::get_mut)
    }

    /// Locks the slice of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn lock(&self, node: NodeId) -> MutexGuard<'_, FixedEdgeSlice> {
        self.slices[node as usize].lock()
    }

    /// Copies the valid entries of every slice into an adjacency graph
    /// without consuming the arena.
    #[must_use]
    pub fn snapshot(&mut self) -> AdjacencyGraph {
        let lists = self
            .par_slices_mut()
            .map(|slice| slice.valid().to_vec())
            .collect();
        AdjacencyGraph::from_lists(lists)
    }

    /// Trims every slice at its first sentinel and releases the arena.
    #[must_use]
    pub fn compact(self) -> AdjacencyGraph {
        let lists = self
            .slices
            .into_par_iter()
            .map(|slice| slice.into_inner().valid().to_vec())
            .collect();
        AdjacencyGraph::from_lists(lists)
    }
}
