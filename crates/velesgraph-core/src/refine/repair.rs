//! Reverse-edge repair.
//!
//! For every kept edge `node → des`, `des` is offered the edge back. A slice
//! with room gets it appended; a full one is re-pruned with the owning
//! family's rule over its entries plus the newcomer.
//!
//! The lock on `des` is held from the duplicate scan through the append or
//! the overwrite, so concurrent offers to one node serialize. Only one lock
//! is held at a time and pruning takes none.

use crate::distance::{DistanceFunction, Evaluator};
use crate::graph::{EdgeArena, Neighbor, NodeId};
use crate::prune::PruneStrategy;

/// Per-node repair outcome.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RepairTally {
    /// Reverse edges appended to a slice with room.
    pub added: u64,
    /// Reverse edges already present.
    pub duplicates: u64,
    /// Full slices re-pruned.
    pub overflows: u64,
}

/// Offers every edge in `out_edges` back to its target.
pub(crate) fn repair<D: DistanceFunction + ?Sized>(
    node: NodeId,
    out_edges: &[Neighbor],
    arena: &EdgeArena,
    prune: &PruneStrategy,
    eval: &mut Evaluator<'_, D>,
) -> RepairTally {
    let range = arena.range();
    let mut tally = RepairTally::default();

    for edge in out_edges {
        let des = edge.id;
        let reverse = Neighbor::new(node, edge.distance);

        let mut slice = arena.lock(des);
        if slice.contains(node) {
            tally.duplicates += 1;
        } else if slice.push(reverse) {
            tally.added += 1;
        } else {
            let mut temp = Vec::with_capacity(range + 1);
            temp.extend_from_slice(slice.valid());
            temp.push(reverse);
            let kept = prune.prune(des, &mut temp, range, eval);
            slice.fill(&kept);
            tally.overflows += 1;
        }
    }

    tally
}
