//! Greedy beam traversal towards a base node.
//!
//! Same walk as the query router, with the node's own vector as the query.
//! Every evaluated node lands in the output pool, not only the final beam.

use rand::Rng;

use super::{node_rng, GeneratorScratch};
use crate::distance::{DistanceFunction, Evaluator};
use crate::graph::{insert_into_pool, AdjacencyGraph, Candidate, Neighbor, NodeId};

pub(super) fn generate<D: DistanceFunction + ?Sized>(
    node: NodeId,
    graph: &AdjacencyGraph,
    entry: NodeId,
    beam_width: usize,
    seed: u64,
    scratch: &mut GeneratorScratch,
    eval: &mut Evaluator<'_, D>,
) {
    let n = graph.len();
    let width = beam_width.min(n);
    if width == 0 {
        return;
    }

    let GeneratorScratch {
        visited,
        beam,
        pool,
    } = scratch;

    let mut seeds: Vec<NodeId> = Vec::with_capacity(width);
    for id in graph.neighbor_ids(entry) {
        if seeds.len() == width {
            break;
        }
        if visited.insert(id) {
            seeds.push(id);
        }
    }
    let mut rng = node_rng(seed, node);
    while seeds.len() < width {
        let id = rng.gen_range(0..n) as NodeId;
        if visited.insert(id) {
            seeds.push(id);
        }
    }

    for id in seeds {
        let distance = eval.between(node, id);
        beam.push(Candidate::new(id, distance));
        if id != node {
            pool.push(Neighbor::new(id, distance));
        }
    }
    beam.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));

    let mut k = 0;
    while k < beam.len() {
        let mut nk = width;

        if beam[k].flag {
            beam[k].flag = false;
            let current = beam[k].id;

            for id in graph.neighbor_ids(current) {
                if !visited.insert(id) {
                    continue;
                }
                let distance = eval.between(node, id);
                if id != node {
                    pool.push(Neighbor::new(id, distance));
                }
                if let Some(pos) = insert_into_pool(beam, width, Candidate::new(id, distance)) {
                    nk = nk.min(pos);
                }
            }
        }

        if nk <= k {
            k = nk;
        } else {
            k += 1;
        }
    }
}
