//! Graph storage: neighbor entries, the refinement-time edge arena, the
//! finished adjacency lists and the per-worker visited set.

mod adjacency;
mod edge_store;
mod neighbor;
mod visited;

#[cfg(test)]
mod adjacency_tests;
#[cfg(test)]
mod edge_store_tests;

pub use adjacency::{AdjacencyGraph, DegreeStats};
pub use edge_store::{EdgeArena, FixedEdgeSlice};
pub use neighbor::{insert_into_pool, Candidate, Neighbor, NodeId, SENTINEL_DISTANCE};
pub use visited::VisitedSet;

pub(crate) use neighbor::{by_distance, sort_dedup, OrderedDistance};
