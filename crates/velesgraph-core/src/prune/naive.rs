use crate::graph::{Neighbor, NodeId};

pub(super) fn select(node: NodeId, pool: &[Neighbor], range: usize) -> Vec<Neighbor> {
    pool.iter()
        .filter(|c| c.id != node)
        .take(range)
        .copied()
        .collect()
}
