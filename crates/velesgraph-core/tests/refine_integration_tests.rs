//! End-to-end refinement tests over random datasets.
//!
//! ```bash
//! cargo test -p velesgraph-core --test refine_integration_tests
//! ```

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

mod common;

use common::{knn_graph, medoid, random_vectors, METRIC};
use velesgraph_core::{GraphFamily, NodeId, ParallelConfig, RefineParams, Refiner};

const N: usize = 200;
const DIM: usize = 8;

fn params_for(family: GraphFamily) -> RefineParams {
    let base = RefineParams {
        seed: 42,
        ..RefineParams::default()
    };
    match family {
        GraphFamily::Nsg => RefineParams {
            r: Some(16),
            l: Some(40),
            c: Some(100),
            ..base
        },
        GraphFamily::Ssg => RefineParams {
            r: Some(16),
            l: Some(40),
            angle: Some(60.0),
            n_try: Some(5),
            ..base
        },
        GraphFamily::Vamana => RefineParams {
            r: Some(16),
            l: Some(40),
            alpha: Some(1.2),
            ..base
        },
        GraphFamily::Fanng => RefineParams {
            r: Some(16),
            ..base
        },
        GraphFamily::Kgraph | GraphFamily::Dpg => RefineParams {
            k: Some(10),
            ..base
        },
        GraphFamily::Efanna => RefineParams {
            k: Some(10),
            l: Some(20),
            r: Some(20),
            s: Some(5),
            iter: Some(4),
            ..base
        },
    }
}

const FAMILIES: [GraphFamily; 7] = [
    GraphFamily::Nsg,
    GraphFamily::Ssg,
    GraphFamily::Vamana,
    GraphFamily::Fanng,
    GraphFamily::Kgraph,
    GraphFamily::Dpg,
    GraphFamily::Efanna,
];

#[test]
fn test_every_family_respects_degree_bound() {
    // Arrange
    common::init_tracing();
    let base = random_vectors(N, DIM, 7);
    let initial = knn_graph(&base, 20);
    let entry = medoid(&base);

    for family in FAMILIES {
        let refiner = Refiner::new(family, &params_for(family))
            .expect("valid params")
            .with_parallelism(ParallelConfig {
                chunk_size: 16,
                num_threads: 0,
            });

        // Act
        let output = refiner
            .refine(&base, &METRIC, &initial, Some(entry))
            .expect("refine");

        // Assert
        let max_degree = refiner.plan().max_degree();
        assert_eq!(output.graph.len(), N, "{family}");
        output
            .graph
            .validate(max_degree)
            .unwrap_or_else(|e| panic!("{family}: {e}"));
        assert!(output.stats.edges_after <= N * max_degree, "{family}");
        assert_eq!(output.stats.family, family);
    }
}

#[test]
fn test_kgraph_keeps_exactly_k_closest() {
    let base = random_vectors(N, DIM, 11);
    let initial = knn_graph(&base, 20);
    let expected = knn_graph(&base, 10);

    let output = Refiner::new(GraphFamily::Kgraph, &params_for(GraphFamily::Kgraph))
        .expect("valid params")
        .refine(&base, &METRIC, &initial, None)
        .expect("refine");

    assert_eq!(output.graph.to_id_lists(), expected.to_id_lists());
}

#[test]
fn test_occlusion_pruning_is_idempotent() {
    // A FANNG graph is a fixed point of its own pruning rule.
    let base = random_vectors(N, DIM, 13);
    let initial = knn_graph(&base, 20);
    let refiner =
        Refiner::new(GraphFamily::Fanng, &params_for(GraphFamily::Fanng)).expect("valid params");

    let once = refiner
        .refine(&base, &METRIC, &initial, None)
        .expect("first run");
    let twice = refiner
        .refine(&base, &METRIC, &once.graph, None)
        .expect("second run");

    assert_eq!(once.graph, twice.graph);
}

#[test]
fn test_repair_closes_edges_when_range_is_unbounded() {
    // With R >= N - 1 no slice can overflow, so every kept edge gets its
    // reverse.
    let n = 60;
    let base = random_vectors(n, 4, 17);
    let initial = knn_graph(&base, 8);
    let params = RefineParams {
        r: Some(n),
        l: Some(20),
        ..RefineParams::default()
    };

    let output = Refiner::new(GraphFamily::Nsg, &params)
        .expect("valid params")
        .refine(&base, &METRIC, &initial, Some(medoid(&base)))
        .expect("refine");

    for (node, list) in output.graph.iter() {
        for edge in list {
            assert!(
                output.graph.neighbors(edge.id).iter().any(|nb| nb.id == node),
                "edge {node} -> {} has no reverse",
                edge.id
            );
        }
    }
    assert_eq!(output.stats.overflow_reprunes, 0);
}

#[test]
fn test_repair_reprunes_full_slices_within_the_bound() {
    // R = 4 with a 12-NN input forces reverse edges into full slices.
    common::init_tracing();
    let n = 100;
    let base = random_vectors(n, 4, 37);
    let initial = knn_graph(&base, 12);
    let params = RefineParams {
        r: Some(4),
        l: Some(20),
        ..RefineParams::default()
    };

    let output = Refiner::new(GraphFamily::Nsg, &params)
        .expect("valid params")
        .with_parallelism(ParallelConfig {
            chunk_size: 1,
            num_threads: 4,
        })
        .refine(&base, &METRIC, &initial, Some(medoid(&base)))
        .expect("refine");

    assert!(output.stats.overflow_reprunes > 0);
    output.graph.validate(4).expect("valid graph");
    let mut one_way = 0;
    for (node, list) in output.graph.iter() {
        for edge in list {
            let back = output.graph.neighbors(edge.id);
            if !back.iter().any(|nb| nb.id == node) {
                // A missing reverse edge means `edge.id` was re-pruned, which
                // never leaves a list empty.
                one_way += 1;
                assert!(!back.is_empty(), "{} lost every edge", edge.id);
            }
        }
    }
    assert!(one_way > 0);
}

#[test]
fn test_nsg_nodes_are_never_isolated() {
    let base = random_vectors(N, DIM, 19);
    let initial = knn_graph(&base, 20);

    let output = Refiner::new(GraphFamily::Nsg, &params_for(GraphFamily::Nsg))
        .expect("valid params")
        .refine(&base, &METRIC, &initial, Some(medoid(&base)))
        .expect("refine");

    let stats = output.graph.degree_stats();
    assert!(stats.min >= 1);
    assert!(stats.max <= 16);
    assert!(output.stats.reverse_edges_added > 0);
}

#[test]
fn test_entry_free_families_are_deterministic() {
    let base = random_vectors(N, DIM, 23);
    let initial = knn_graph(&base, 20);

    for family in [GraphFamily::Fanng, GraphFamily::Dpg, GraphFamily::Kgraph] {
        let refiner = Refiner::new(family, &params_for(family)).expect("valid params");
        let a = refiner
            .refine(&base, &METRIC, &initial, None)
            .expect("first run");
        let b = refiner
            .refine(&base, &METRIC, &initial, None)
            .expect("second run");
        assert_eq!(a.graph, b.graph, "{family}");
    }
}

#[test]
fn test_efanna_improves_a_random_graph() {
    // Arrange: every node starts with 10 arbitrary neighbors.
    let base = random_vectors(N, DIM, 29);
    let lists: Vec<Vec<NodeId>> = (0..N as NodeId)
        .map(|i| (1..=10).map(|j| (i + j * 17) % N as NodeId).collect())
        .collect();
    let initial =
        velesgraph_core::AdjacencyGraph::from_ids(&base, &METRIC, &lists).expect("initial");
    let exact = knn_graph(&base, 10);
    let params = RefineParams {
        iter: Some(8),
        ..params_for(GraphFamily::Efanna)
    };

    // Act
    let output = Refiner::new(GraphFamily::Efanna, &params)
        .expect("valid params")
        .refine(&base, &METRIC, &initial, None)
        .expect("refine");

    // Assert
    let before: f64 = (0..N as NodeId)
        .map(|i| common::recall(initial.neighbors(i), exact.neighbors(i)))
        .sum::<f64>()
        / N as f64;
    let after: f64 = (0..N as NodeId)
        .map(|i| common::recall(output.graph.neighbors(i), exact.neighbors(i)))
        .sum::<f64>()
        / N as f64;
    assert!(after > before, "recall {before} -> {after}");
    assert!(after >= 0.7, "recall {after}");
    assert!(output.stats.distance_evaluations > 0);
    assert_eq!(output.stats.passes, 0);
}

#[test]
fn test_graph_survives_json_round_trip() {
    let base = random_vectors(50, DIM, 31);
    let initial = knn_graph(&base, 8);
    let params = RefineParams {
        r: Some(6),
        l: Some(16),
        ..RefineParams::default()
    };
    let output = Refiner::new(GraphFamily::Nsg, &params)
        .expect("valid params")
        .refine(&base, &METRIC, &initial, Some(0))
        .expect("refine");

    let json = serde_json::to_string(&output.graph).expect("serialize");
    let restored: velesgraph_core::AdjacencyGraph =
        serde_json::from_str(&json).expect("deserialize");

    assert_eq!(restored, output.graph);
    assert!(serde_json::to_string(&output.stats).expect("stats").contains("\"nsg\""));
}
