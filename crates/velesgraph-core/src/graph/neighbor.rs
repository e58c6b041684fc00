//! Neighbor entries and bounded candidate pools.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Dense node identifier in `[0, N)`.
pub type NodeId = u32;

/// Distance value marking an unused slot in fixed-capacity storage.
///
/// Real distances are non-negative, so this never collides with one.
pub const SENTINEL_DISTANCE: f32 = -1.0;

/// A weighted edge target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Target node.
    pub id: NodeId,
    /// Distance from the owning node to `id`.
    pub distance: f32,
}

impl Neighbor {
    /// The unused-slot marker.
    pub const SENTINEL: Self = Self {
        id: NodeId::MAX,
        distance: SENTINEL_DISTANCE,
    };

    /// Creates a neighbor entry.
    #[inline]
    #[must_use]
    pub const fn new(id: NodeId, distance: f32) -> Self {
        Self { id, distance }
    }

    /// Returns true for the unused-slot marker.
    #[inline]
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.distance < 0.0
    }
}

/// Ascending by distance, ties broken by id so sorts are reproducible.
#[inline]
pub(crate) fn by_distance(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id))
}

/// Sorts ascending by distance and drops repeated ids, keeping the closest.
pub(crate) fn sort_dedup(pool: &mut Vec<Neighbor>) {
    pool.sort_by(by_distance);
    let mut seen = rustc_hash::FxHashSet::default();
    pool.retain(|n| seen.insert(n.id));
}

/// A pool entry with an "expanded yet?" marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Node id.
    pub id: NodeId,
    /// Distance to the pool's target (node being refined, or a query).
    pub distance: f32,
    /// `true` while the entry has not been expanded.
    pub flag: bool,
}

impl Candidate {
    /// A fresh, unexpanded candidate.
    #[inline]
    #[must_use]
    pub const fn new(id: NodeId, distance: f32) -> Self {
        Self {
            id,
            distance,
            flag: true,
        }
    }
}

impl From<Candidate> for Neighbor {
    fn from(c: Candidate) -> Self {
        Self::new(c.id, c.distance)
    }
}

/// Inserts `candidate` into `pool`, kept sorted ascending and bounded to
/// `capacity` entries.
///
/// Returns the insertion index, or `None` when the candidate is no better
/// than every entry of a full pool or its id is already present at the same
/// distance. When the pool was full, its previous worst entry is discarded.
pub fn insert_into_pool(
    pool: &mut Vec<Candidate>,
    capacity: usize,
    candidate: Candidate,
) -> Option<usize> {
    let pos = pool.partition_point(|c| c.distance <= candidate.distance);
    if pos >= capacity {
        return None;
    }

    let duplicate = pool[..pos]
        .iter()
        .rev()
        .take_while(|c| c.distance == candidate.distance)
        .any(|c| c.id == candidate.id);
    if duplicate {
        return None;
    }

    pool.insert(pos, candidate);
    pool.truncate(capacity);
    Some(pos)
}

/// Total order on `f32` for heaps.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OrderedDistance(pub f32);

impl PartialEq for OrderedDistance {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for OrderedDistance {}

impl PartialOrd for OrderedDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
