//! Alpha-relaxed occlusion.
//!
//! The pool is visited from the farthest entry to the nearest. A candidate is
//! skipped when `alpha * d(a, c) < d(n, c)` for some kept `a`; skipped entries
//! wait in a min-heap and backfill any free slots closest first, so the
//! result always holds `min(range, |pool|)` entries.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::distance::{DistanceFunction, Evaluator};
use crate::graph::{Neighbor, NodeId, OrderedDistance};

pub(super) fn select<D: DistanceFunction + ?Sized>(
    node: NodeId,
    pool: &[Neighbor],
    range: usize,
    alpha: f32,
    eval: &mut Evaluator<'_, D>,
) -> Vec<Neighbor> {
    let mut accepted: Vec<Neighbor> = Vec::with_capacity(range);
    let mut skipped: BinaryHeap<Reverse<(OrderedDistance, NodeId)>> = BinaryHeap::new();

    for candidate in pool.iter().rev() {
        if candidate.id == node {
            continue;
        }
        let occluded = accepted
            .iter()
            .any(|a| alpha * eval.between(a.id, candidate.id) < candidate.distance);
        if occluded {
            skipped.push(Reverse((OrderedDistance(candidate.distance), candidate.id)));
        } else {
            accepted.push(*candidate);
        }
        if accepted.len() == range {
            break;
        }
    }

    while accepted.len() < range {
        let Some(Reverse((OrderedDistance(distance), id))) = skipped.pop() else {
            break;
        };
        accepted.push(Neighbor::new(id, distance));
    }

    accepted
}
