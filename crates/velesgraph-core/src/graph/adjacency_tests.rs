//! Tests for `adjacency` module

use super::adjacency::*;
use super::neighbor::Neighbor;
use crate::distance::absolute_difference;
use crate::vectors::VectorSet;

fn line(n: usize) -> VectorSet {
    VectorSet::from_flat((0..n).map(|i| i as f32).collect(), 1).expect("valid vectors")
}

#[test]
fn test_from_ids_computes_weights() {
    let vectors = line(3);

    let graph =
        AdjacencyGraph::from_ids(&vectors, &absolute_difference, &[vec![2], vec![0, 2], vec![]])
            .expect("valid graph");

    assert_eq!(graph.neighbors(0), &[Neighbor::new(2, 2.0)]);
    assert_eq!(graph.neighbor_ids(1).collect::<Vec<_>>(), vec![0, 2]);
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn test_from_ids_rejects_size_mismatch() {
    let vectors = line(3);

    let err = AdjacencyGraph::from_ids(&vectors, &absolute_difference, &[vec![1]]).unwrap_err();

    assert_eq!(err.code(), "VGRAPH-003");
}

#[test]
fn test_from_ids_rejects_out_of_range_id() {
    let vectors = line(2);

    let err =
        AdjacencyGraph::from_ids(&vectors, &absolute_difference, &[vec![7], vec![]]).unwrap_err();

    assert_eq!(err.code(), "VGRAPH-004");
}

#[test]
fn test_degree_stats() {
    let graph = AdjacencyGraph::from_lists(vec![
        vec![Neighbor::new(1, 1.0), Neighbor::new(2, 2.0)],
        vec![Neighbor::new(0, 1.0)],
        vec![],
    ]);

    let stats = graph.degree_stats();

    assert_eq!(stats.min, 0);
    assert_eq!(stats.max, 2);
    assert_eq!(stats.edges, 3);
    assert!((stats.mean - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_degree_stats_empty_graph() {
    let stats = AdjacencyGraph::default().degree_stats();
    assert_eq!(stats.edges, 0);
    assert!(stats.mean.abs() < f64::EPSILON);
}

#[test]
fn test_validate_accepts_well_formed_graph() {
    let graph = AdjacencyGraph::from_lists(vec![
        vec![Neighbor::new(1, 1.0)],
        vec![Neighbor::new(0, 1.0)],
    ]);
    assert!(graph.validate(1).is_ok());
}

#[test]
fn test_validate_reports_violations() {
    let too_many = AdjacencyGraph::from_lists(vec![
        vec![Neighbor::new(1, 1.0), Neighbor::new(2, 1.0)],
        vec![],
        vec![],
    ]);
    let self_loop = AdjacencyGraph::from_lists(vec![vec![Neighbor::new(0, 0.0)]]);
    let duplicate = AdjacencyGraph::from_lists(vec![
        vec![Neighbor::new(1, 1.0), Neighbor::new(1, 1.0)],
        vec![],
    ]);
    let out_of_range = AdjacencyGraph::from_lists(vec![vec![Neighbor::new(5, 1.0)]]);
    let sentinel = AdjacencyGraph::from_lists(vec![vec![Neighbor::SENTINEL]]);

    assert!(too_many.validate(1).is_err());
    assert!(self_loop.validate(4).is_err());
    assert!(duplicate.validate(4).is_err());
    assert!(out_of_range.validate(4).is_err());
    let err = sentinel.validate(4).unwrap_err();
    assert_eq!(err.code(), "VGRAPH-006");
    assert!(!err.is_recoverable());
}

#[test]
fn test_sort_by_distance_and_id_lists() {
    let mut graph = AdjacencyGraph::from_lists(vec![
        vec![Neighbor::new(2, 3.0), Neighbor::new(1, 1.0)],
        vec![],
        vec![],
    ]);

    graph.sort_by_distance();

    assert_eq!(graph.to_id_lists(), vec![vec![1, 2], vec![], vec![]]);
}

#[test]
fn test_graph_serializes_to_json() {
    let graph = AdjacencyGraph::from_lists(vec![vec![Neighbor::new(1, 0.5)], vec![]]);

    let json = serde_json::to_string(&graph).expect("serialize");
    let back: AdjacencyGraph = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(back, graph);
}
