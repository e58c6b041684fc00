//! Candidate generation.
//!
//! A generator fills a per-worker pool with plausible neighbors of one node,
//! weighted by their distance to it. The node itself never enters its own
//! pool; repeated ids are removed by the caller before pruning.
//!
//! The NN-descent driver in [`nn_descent`] works on the whole graph at once
//! and is run separately by the refinement orchestrator.

mod greedy;
pub mod nn_descent;
mod propagation;


use serde::{Deserialize, Serialize};

use crate::distance::{DistanceFunction, Evaluator};
use crate::graph::{AdjacencyGraph, Candidate, Neighbor, NodeId, VisitedSet};

pub use nn_descent::NnDescentParams;

/// How a node's candidate pool is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum CandidateStrategy {
    /// Beam search towards the node from the entry point.
    Greedy {
        /// Beam width (`L`).
        beam: usize,
    },
    /// Neighbors of neighbors of the node, then of random alternate seeds.
    Propagation {
        /// Pool size to stop at (`L`).
        limit: usize,
        /// Alternate seeds tried when the node's own walk falls short.
        n_try: usize,
    },
    /// The node's current adjacency list.
    ExistingNeighbors,
}

/// Per-worker scratch reused across nodes.
///
/// Build with [`new`](Self::new): the visited set must cover every node id.
#[derive(Debug)]
pub struct GeneratorScratch {
    /// Visited marks, cleared per node.
    pub visited: VisitedSet,
    /// Bounded beam for greedy traversal.
    pub beam: Vec<Candidate>,
    /// Output pool.
    pub pool: Vec<Neighbor>,
}

impl GeneratorScratch {
    /// Scratch sized for a graph of `nodes` nodes.
    #[must_use]
    pub fn new(nodes: usize) -> Self {
        Self {
            visited: VisitedSet::new(nodes),
            beam: Vec::new(),
            pool: Vec::new(),
        }
    }

    /// Resets marks and buffers before the next node.
    pub fn reset(&mut self) {
        self.visited.clear();
        self.beam.clear();
        self.pool.clear();
    }
}

impl CandidateStrategy {
    /// Fills `scratch.pool` with candidates for `node` over `graph`.
    ///
    /// `entry` seeds the greedy traversal and `seed` drives every
    /// pseudo-random choice, mixed with the node id so the outcome does not
    /// depend on scheduling.
    #[allow(clippy::too_many_arguments)]
    pub fn generate<D: DistanceFunction + ?Sized>(
        &self,
        node: NodeId,
        graph: &AdjacencyGraph,
        entry: NodeId,
        seed: u64,
        scratch: &mut GeneratorScratch,
        eval: &mut Evaluator<'_, D>,
    ) {
        match *self {
            Self::Greedy { beam } => greedy::generate(node, graph, entry, beam, seed, scratch, eval),
            Self::Propagation { limit, n_try } => {
                propagation::generate(node, graph, limit, n_try, seed, scratch, eval);
            }
            Self::ExistingNeighbors => {
                scratch
                    .pool
                    .extend(graph.neighbors(node).iter().filter(|n| n.id != node));
            }
        }
    }
}

/// Per-node random stream.
pub(crate) fn node_rng(seed: u64, node: NodeId) -> rand::rngs::StdRng {
    use rand::SeedableRng;
    rand::rngs::StdRng::seed_from_u64(seed ^ u64::from(node).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
