//! Tests for `edge_store` module

use super::adjacency::AdjacencyGraph;
use super::edge_store::*;
use super::neighbor::Neighbor;
use rayon::prelude::*;

fn ids(slice: &FixedEdgeSlice) -> Vec<u32> {
    slice.valid().iter().map(|n| n.id).collect()
}

#[test]
fn test_new_slice_is_all_sentinel() {
    let slice = FixedEdgeSlice::new(4);

    assert_eq!(slice.capacity(), 4);
    assert!(slice.is_empty());
    assert!(slice.slots().iter().all(Neighbor::is_sentinel));
}

#[test]
fn test_fill_left_aligns_and_terminates() {
    let mut slice = FixedEdgeSlice::new(4);

    slice.fill(&[Neighbor::new(3, 1.0), Neighbor::new(1, 2.0)]);

    assert_eq!(slice.len(), 2);
    assert_eq!(ids(&slice), vec![3, 1]);
    assert!(slice.slots()[2].is_sentinel());
    assert!(slice.is_monotone());
}

#[test]
fn test_fill_shorter_clears_previous_tail() {
    let mut slice = FixedEdgeSlice::new(3);
    slice.fill(&[
        Neighbor::new(1, 1.0),
        Neighbor::new(2, 2.0),
        Neighbor::new(3, 3.0),
    ]);

    slice.fill(&[Neighbor::new(9, 0.5)]);

    assert_eq!(ids(&slice), vec![9]);
    assert!(slice.is_monotone());
}

#[test]
fn test_fill_truncates_to_capacity() {
    let mut slice = FixedEdgeSlice::new(2);
    let many: Vec<Neighbor> = (0..5).map(|i| Neighbor::new(i, i as f32)).collect();

    slice.fill(&many);

    assert!(slice.is_full());
    assert_eq!(ids(&slice), vec![0, 1]);
}

#[test]
fn test_push_uses_first_sentinel_slot() {
    let mut slice = FixedEdgeSlice::new(2);

    assert!(slice.push(Neighbor::new(4, 1.0)));
    assert!(slice.push(Neighbor::new(5, 2.0)));
    assert!(!slice.push(Neighbor::new(6, 3.0)));

    assert_eq!(ids(&slice), vec![4, 5]);
    assert!(slice.contains(5));
    assert!(!slice.contains(6));
}

#[test]
fn test_arena_par_slices_mut_and_compact() {
    let mut arena = EdgeArena::new(3, 2);

    arena
        .par_slices_mut()
        .enumerate()
        .for_each(|(node, slice)| {
            let target = ((node + 1) % 3) as u32;
            slice.fill(&[Neighbor::new(target, 1.0)]);
        });

    let graph = arena.compact();
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.neighbors(2), &[Neighbor::new(0, 1.0)]);
}

#[test]
fn test_arena_lock_and_snapshot() {
    let mut arena = EdgeArena::new(2, 3);

    assert!(arena.lock(0).push(Neighbor::new(1, 0.5)));
    let snapshot = arena.snapshot();

    assert_eq!(snapshot.neighbors(0), &[Neighbor::new(1, 0.5)]);
    assert!(snapshot.neighbors(1).is_empty());
    // The arena is still usable after a snapshot
    assert_eq!(arena.lock(0).len(), 1);
}

#[test]
fn test_arena_from_graph_truncates_to_range() {
    let graph = AdjacencyGraph::from_lists(vec![
        vec![
            Neighbor::new(1, 1.0),
            Neighbor::new(2, 2.0),
            Neighbor::new(3, 3.0),
        ],
        vec![],
        vec![],
        vec![],
    ]);

    let arena = EdgeArena::from_graph(&graph, 2);

    assert_eq!(arena.range(), 2);
    assert_eq!(arena.len(), 4);
    let compacted = arena.compact();
    assert_eq!(compacted.neighbors(0).len(), 2);
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Fill(Vec<u32>),
        Push(u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            proptest::collection::vec(0u32..100, 0..8).prop_map(Op::Fill),
            (0u32..100).prop_map(Op::Push),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: no valid entry ever follows a sentinel
        #[test]
        fn prop_slice_stays_monotone(
            range in 1usize..8,
            ops in proptest::collection::vec(op_strategy(), 0..20)
        ) {
            let mut slice = FixedEdgeSlice::new(range);
            for op in ops {
                match op {
                    Op::Fill(ids) => {
                        let entries: Vec<Neighbor> =
                            ids.iter().map(|&id| Neighbor::new(id, id as f32)).collect();
                        slice.fill(&entries);
                    }
                    Op::Push(id) => {
                        slice.push(Neighbor::new(id, 1.0));
                    }
                }
                prop_assert!(slice.is_monotone());
                prop_assert!(slice.len() <= range);
            }
        }
    }
}
