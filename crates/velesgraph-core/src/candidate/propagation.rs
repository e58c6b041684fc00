//! Two-hop propagation.

use rand::Rng;

use super::{node_rng, GeneratorScratch};
use crate::distance::{DistanceFunction, Evaluator};
use crate::graph::{AdjacencyGraph, Neighbor, NodeId};

pub(super) fn generate<D: DistanceFunction + ?Sized>(
    node: NodeId,
    graph: &AdjacencyGraph,
    limit: usize,
    n_try: usize,
    seed: u64,
    scratch: &mut GeneratorScratch,
    eval: &mut Evaluator<'_, D>,
) {
    let GeneratorScratch { visited, pool, .. } = scratch;
    visited.insert(node);

    expand(node, node, graph, limit, visited, pool, eval);

    let n = graph.len();
    let mut rng = node_rng(seed, node);
    for _ in 0..n_try {
        if pool.len() >= limit || n <= 1 {
            break;
        }
        let alternate = rng.gen_range(0..n) as NodeId;
        expand(node, alternate, graph, limit, visited, pool, eval);
    }
}

/// Collects unvisited neighbors of `from`'s neighbors, weighted from `node`.
fn expand<D: DistanceFunction + ?Sized>(
    node: NodeId,
    from: NodeId,
    graph: &AdjacencyGraph,
    limit: usize,
    visited: &mut crate::graph::VisitedSet,
    pool: &mut Vec<Neighbor>,
    eval: &mut Evaluator<'_, D>,
) {
    for hop in graph.neighbor_ids(from) {
        for id in graph.neighbor_ids(hop) {
            if pool.len() >= limit {
                return;
            }
            if !visited.insert(id) {
                continue;
            }
            pool.push(Neighbor::new(id, eval.between(node, id)));
        }
    }
}
