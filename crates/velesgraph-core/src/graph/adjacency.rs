//! Finished, variable-length adjacency lists.
//!
//! [`AdjacencyGraph`] is what goes in (the externally built initial graph)
//! and what comes out of every refinement run. The router reads it, and
//! connectivity repair or persistence downstream consume it as is.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::neighbor::{by_distance, Neighbor, NodeId};
use crate::distance::DistanceFunction;
use crate::error::{Error, Result};
use crate::vectors::VectorSet;

/// Weighted out-edges of every node, indexed by [`NodeId`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyGraph {
    lists: Vec<Vec<Neighbor>>,
}

/// Out-degree summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegreeStats {
    /// Smallest out-degree.
    pub min: usize,
    /// Largest out-degree.
    pub max: usize,
    /// Average out-degree.
    pub mean: f64,
    /// Total number of edges.
    pub edges: usize,
}

impl AdjacencyGraph {
    /// A graph of `nodes` isolated nodes.
    #[must_use]
    pub fn new(nodes: usize) -> Self {
        Self {
            lists: vec![Vec::new(); nodes],
        }
    }

    /// Wraps ready-made lists.
    #[must_use]
    pub fn from_lists(lists: Vec<Vec<Neighbor>>) -> Self {
        Self { lists }
    }

    /// Builds a weighted graph from id-only lists, computing each edge weight
    /// with `distance`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphSizeMismatch`] if `ids` does not have one list per
    /// vector, and [`Error::NodeOutOfRange`] for an id outside the set.
    pub fn from_ids<D: DistanceFunction + ?Sized>(
        vectors: &VectorSet,
        distance: &D,
        ids: &[Vec<NodeId>],
    ) -> Result<Self> {
        if ids.len() != vectors.len() {
            return Err(Error::GraphSizeMismatch {
                graph: ids.len(),
                base: vectors.len(),
            });
        }

        let mut lists = Vec::with_capacity(ids.len());
        for (node, row) in ids.iter().enumerate() {
            let origin = vectors.get(node as NodeId);
            let mut list = Vec::with_capacity(row.len());
            for &id in row {
                if id as usize >= vectors.len() {
                    return Err(Error::NodeOutOfRange {
                        id,
                        len: vectors.len(),
                    });
                }
                list.push(Neighbor::new(id, distance.distance(origin, vectors.get(id))));
            }
            lists.push(list);
        }
        Ok(Self { lists })
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Out-edges of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[inline]
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> &[Neighbor] {
        &self.lists[node as usize]
    }

    /// Ids of the out-edges of `node`.
    pub fn neighbor_ids(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors(node).iter().map(|n| n.id)
    }

    /// Replaces the out-edges of `node`.
    pub fn set_neighbors(&mut self, node: NodeId, neighbors: Vec<Neighbor>) {
        self.lists[node as usize] = neighbors;
    }

    /// Total number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    /// Iterates over `(node, out-edges)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[Neighbor])> {
        self.lists
            .iter()
            .enumerate()
            .map(|(node, list)| (node as NodeId, list.as_slice()))
    }

    /// Min/max/mean out-degree. All zero for an empty graph.
    #[must_use]
    pub fn degree_stats(&self) -> DegreeStats {
        let edges = self.edge_count();
        let min = self.lists.iter().map(Vec::len).min().unwrap_or(0);
        let max = self.lists.iter().map(Vec::len).max().unwrap_or(0);
        let mean = if self.lists.is_empty() {
            0.0
        } else {
            edges as f64 / self.lists.len() as f64
        };
        DegreeStats {
            min,
            max,
            mean,
            edges,
        }
    }

    /// Checks the structural invariants of a refined graph: every id in
    /// range, no self loops, no repeated target in a list, no sentinel
    /// entries, and at most `max_degree` edges per node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphInvariant`] describing the first violation.
    pub fn validate(&self, max_degree: usize) -> Result<()> {
        let n = self.lists.len();
        let mut seen = FxHashSet::default();
        for (node, list) in self.iter() {
            if list.len() > max_degree {
                return Err(Error::GraphInvariant(format!(
                    "node {node} has {} edges, bound is {max_degree}",
                    list.len()
                )));
            }
            seen.clear();
            for neighbor in list {
                if neighbor.is_sentinel() {
                    return Err(Error::GraphInvariant(format!(
                        "node {node} holds a sentinel entry"
                    )));
                }
                if neighbor.id as usize >= n {
                    return Err(Error::GraphInvariant(format!(
                        "node {node} points to {} outside [0, {n})",
                        neighbor.id
                    )));
                }
                if neighbor.id == node {
                    return Err(Error::GraphInvariant(format!("node {node} has a self loop")));
                }
                if !seen.insert(neighbor.id) {
                    return Err(Error::GraphInvariant(format!(
                        "node {node} lists {} twice",
                        neighbor.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Sorts every list ascending by distance.
    pub fn sort_by_distance(&mut self) {
        for list in &mut self.lists {
            list.sort_by(by_distance);
        }
    }

    /// Id-only view, the shape on-disk graph formats store.
    #[must_use]
    pub fn to_id_lists(&self) -> Vec<Vec<NodeId>> {
        self.lists
            .iter()
            .map(|list| list.iter().map(|n| n.id).collect())
            .collect()
    }
}
