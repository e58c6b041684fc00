//! Refinement counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::repair::RepairTally;
use super::GraphFamily;

/// What a refinement run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineStats {
    /// Family that was refined.
    pub family: GraphFamily,
    /// Full generate/prune/repair passes run (0 for NN-descent).
    pub passes: usize,
    /// Distance evaluations across all workers.
    pub distance_evaluations: u64,
    /// Reverse edges appended during repair.
    pub reverse_edges_added: u64,
    /// Reverse edges skipped because they already existed.
    pub duplicates_skipped: u64,
    /// Full slices re-pruned during repair.
    pub overflow_reprunes: u64,
    /// Edges of the input graph.
    pub edges_before: usize,
    /// Edges of the refined graph.
    pub edges_after: usize,
}

/// Shared accumulators. Workers flush into them once per node.
#[derive(Debug, Default)]
pub(crate) struct StatCounters {
    distance_evaluations: AtomicU64,
    reverse_edges_added: AtomicU64,
    duplicates_skipped: AtomicU64,
    overflow_reprunes: AtomicU64,
}

impl StatCounters {
    #[inline]
    pub(crate) fn add_evaluations(&self, count: u64) {
        if count > 0 {
            self.distance_evaluations.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub(crate) fn absorb(&self, tally: &RepairTally) {
        self.reverse_edges_added
            .fetch_add(tally.added, Ordering::Relaxed);
        self.duplicates_skipped
            .fetch_add(tally.duplicates, Ordering::Relaxed);
        self.overflow_reprunes
            .fetch_add(tally.overflows, Ordering::Relaxed);
    }

    pub(crate) fn into_stats(self, family: GraphFamily, passes: usize) -> RefineStats {
        RefineStats {
            family,
            passes,
            distance_evaluations: self.distance_evaluations.into_inner(),
            reverse_edges_added: self.reverse_edges_added.into_inner(),
            duplicates_skipped: self.duplicates_skipped.into_inner(),
            overflow_reprunes: self.overflow_reprunes.into_inner(),
            edges_before: 0,
            edges_after: 0,
        }
    }
}
