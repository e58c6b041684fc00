//! Occlusion-count ranking.
//!
//! Every candidate is scored by how many closer candidates occlude it
//! (`d(a, c) < d(n, c)`). The `range` least occluded entries survive, ties
//! going to the closer one, and are returned closest first.

use crate::distance::{DistanceFunction, Evaluator};
use crate::graph::{by_distance, Neighbor, NodeId};

pub(super) fn select<D: DistanceFunction + ?Sized>(
    node: NodeId,
    pool: &[Neighbor],
    range: usize,
    eval: &mut Evaluator<'_, D>,
) -> Vec<Neighbor> {
    let candidates: Vec<Neighbor> = pool.iter().filter(|c| c.id != node).copied().collect();
    if candidates.len() <= range {
        return candidates;
    }

    let mut scored: Vec<(usize, Neighbor)> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let occluders = candidates[..i]
                .iter()
                .filter(|a| eval.between(a.id, c.id) < c.distance)
                .count();
            (occluders, *c)
        })
        .collect();

    scored.sort_by(|(ca, a), (cb, b)| ca.cmp(cb).then_with(|| by_distance(a, b)));
    let mut kept: Vec<Neighbor> = scored.into_iter().take(range).map(|(_, n)| n).collect();
    kept.sort_by(by_distance);
    kept
}
