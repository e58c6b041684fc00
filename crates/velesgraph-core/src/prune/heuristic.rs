//! Relative-neighborhood occlusion.
//!
//! A candidate `c` is redundant when some already accepted `a` is strictly
//! closer to `c` than the node is: a route through `a` reaches `c` anyway.

use crate::distance::{DistanceFunction, Evaluator};
use crate::graph::{Neighbor, NodeId};

pub(super) fn select<D: DistanceFunction + ?Sized>(
    node: NodeId,
    pool: &[Neighbor],
    range: usize,
    max_candidates: Option<usize>,
    eval: &mut Evaluator<'_, D>,
) -> Vec<Neighbor> {
    let examined = max_candidates.map_or(pool.len(), |c| c.min(pool.len()));
    let mut accepted: Vec<Neighbor> = Vec::with_capacity(range);

    for candidate in &pool[..examined] {
        if accepted.len() >= range {
            break;
        }
        if candidate.id == node {
            continue;
        }
        let occluded = accepted
            .iter()
            .any(|a| a.id == candidate.id || eval.between(a.id, candidate.id) < candidate.distance);
        if !occluded {
            accepted.push(*candidate);
        }
    }

    accepted
}
