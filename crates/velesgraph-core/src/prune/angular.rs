//! Angle-based diversification.
//!
//! The cosine of ∠(a, n, c) comes from the law of cosines over the three
//! pairwise distances, so no coordinates are needed. Edges that leave the
//! node in nearly the same direction as a kept edge are dropped.

use crate::distance::{DistanceFunction, Evaluator};
use crate::graph::{Neighbor, NodeId};

/// Cosine of the angle at `n` given `|nc|`, `|na|` and `|ac|`.
///
/// With `squared` set the inputs are already squared lengths. Returns `None`
/// when `c` or `a` coincides with `n` and the angle is undefined.
#[inline]
pub(crate) fn cosine_at_node(nc: f32, na: f32, ac: f32, squared: bool) -> Option<f32> {
    let (nc2, na2, ac2) = if squared {
        (nc, na, ac)
    } else {
        (nc * nc, na * na, ac * ac)
    };
    let denom = 2.0 * (nc2 * na2).sqrt();
    if denom <= 0.0 {
        return None;
    }
    Some((nc2 + na2 - ac2) / denom)
}

pub(super) fn select<D: DistanceFunction + ?Sized>(
    node: NodeId,
    pool: &[Neighbor],
    range: usize,
    cos_threshold: f32,
    eval: &mut Evaluator<'_, D>,
) -> Vec<Neighbor> {
    let squared = eval.is_squared();
    let mut accepted: Vec<Neighbor> = Vec::with_capacity(range);

    for candidate in pool {
        if accepted.len() >= range {
            break;
        }
        if candidate.id == node {
            continue;
        }
        let occluded = accepted.iter().any(|a| {
            if a.id == candidate.id {
                return true;
            }
            let ac = eval.between(a.id, candidate.id);
            cosine_at_node(candidate.distance, a.distance, ac, squared)
                .is_some_and(|cos| cos > cos_threshold)
        });
        if !occluded {
            accepted.push(*candidate);
        }
    }

    accepted
}
