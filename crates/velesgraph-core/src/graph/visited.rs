//! Generation-stamped visited marker.
//!
//! `clear()` bumps a generation counter instead of zeroing the array, so a
//! worker can reuse one set across thousands of nodes.

use super::neighbor::NodeId;

/// Per-worker visited set over `[0, N)`.
#[derive(Debug, Clone)]
pub struct VisitedSet {
    marks: Vec<u16>,
    generation: u16,
}

impl VisitedSet {
    /// A set able to hold ids `0..capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            marks: vec![0; capacity],
            generation: 1,
        }
    }

    /// Forgets every mark. Full memset only once every `u16::MAX - 1` calls.
    pub fn clear(&mut self) {
        if self.generation == u16::MAX {
            self.marks.fill(0);
            self.generation = 1;
        } else {
            self.generation += 1;
        }
    }

    /// Marks `id`. Returns `true` if it was not marked yet.
    #[inline]
    pub fn insert(&mut self, id: NodeId) -> bool {
        let slot = &mut self.marks[id as usize];
        if *slot == self.generation {
            false
        } else {
            *slot = self.generation;
            true
        }
    }

    /// Returns true if `id` is marked.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.marks[id as usize] == self.generation
    }

    /// Number of ids the set can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.marks.len()
    }
}
