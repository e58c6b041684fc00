//! Edge pruning policies.
//!
//! A policy reads a candidate pool for one node and keeps at most `range`
//! entries. Every policy sorts the pool ascending by distance first, skips the
//! node itself, and expects the pool to be free of repeated ids.
//!
//! | Policy        | Families     | Rule                                            |
//! |---------------|--------------|-------------------------------------------------|
//! | `Naive`       | KGraph       | closest `range` entries                         |
//! | `Heuristic`   | NSG, FANNG   | reject `c` if an accepted `a` has `d(a,c) < d(n,c)` |
//! | `Angular`     | SSG          | reject `c` if ∠(a, n, c) is below the threshold |
//! | `Alpha`       | VAMANA       | relaxed occlusion, farthest first, backfilled   |
//! | `Diversified` | DPG          | lowest occlusion count wins                     |

mod alpha;
mod angular;
mod diversified;
mod heuristic;
mod naive;


use serde::{Deserialize, Serialize};

use crate::distance::{DistanceFunction, Evaluator};
use crate::graph::{by_distance, Neighbor, NodeId};

/// Edge selection rule, chosen per graph family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PruneStrategy {
    /// Keep the closest entries.
    Naive,
    /// Relative-neighborhood occlusion, optionally examining only the
    /// `max_candidates` closest entries.
    Heuristic {
        /// Examination cap (`C`).
        max_candidates: Option<usize>,
    },
    /// Minimum angle between kept edges.
    Angular {
        /// `cos(A)` for the configured angle `A`.
        cos_threshold: f32,
    },
    /// Alpha-relaxed occlusion.
    Alpha {
        /// Relaxation factor, `>= 1`.
        alpha: f32,
    },
    /// Occlusion-count ranking.
    Diversified,
}

impl PruneStrategy {
    /// Angular policy for an angle given in degrees.
    #[must_use]
    pub fn angular(degrees: f32) -> Self {
        Self::Angular {
            cos_threshold: (degrees / 180.0 * std::f32::consts::PI).cos(),
        }
    }

    /// Selects at most `range` neighbors of `node` from `pool`.
    ///
    /// `pool` is sorted in place. Its distances are measured from `node`.
    pub fn prune<D: DistanceFunction + ?Sized>(
        &self,
        node: NodeId,
        pool: &mut [Neighbor],
        range: usize,
        eval: &mut Evaluator<'_, D>,
    ) -> Vec<Neighbor> {
        pool.sort_by(by_distance);
        if range == 0 {
            return Vec::new();
        }

        match *self {
            Self::Naive => naive::select(node, pool, range),
            Self::Heuristic { max_candidates } => {
                heuristic::select(node, pool, range, max_candidates, eval)
            }
            Self::Angular { cos_threshold } => angular::select(node, pool, range, cos_threshold, eval),
            Self::Alpha { alpha } => alpha::select(node, pool, range, alpha, eval),
            Self::Diversified => diversified::select(node, pool, range, eval),
        }
    }
}
