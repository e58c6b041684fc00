//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::cast_possible_truncation)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use velesgraph_core::{
    AdjacencyGraph, DistanceFunction, DistanceMetric, Neighbor, NodeId, VectorSet,
};

/// Routes library logs to the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const METRIC: DistanceMetric = DistanceMetric::SquaredEuclidean;

/// Uniform random vectors in `[0, 1)^dim`.
pub fn random_vectors(count: usize, dim: usize, seed: u64) -> VectorSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..count * dim).map(|_| rng.gen::<f32>()).collect();
    VectorSet::from_flat(data, dim).expect("valid vectors")
}

/// The `k` nearest base rows to `query`, nearest first.
pub fn brute_force(base: &VectorSet, query: &[f32], k: usize, skip: Option<NodeId>) -> Vec<Neighbor> {
    let mut all: Vec<Neighbor> = (0..base.len() as NodeId)
        .filter(|&id| Some(id) != skip)
        .map(|id| Neighbor::new(id, METRIC.distance(query, base.get(id))))
        .collect();
    all.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
    all.truncate(k);
    all
}

/// Exact k-NN graph.
pub fn knn_graph(base: &VectorSet, k: usize) -> AdjacencyGraph {
    let lists = (0..base.len() as NodeId)
        .map(|id| brute_force(base, base.get(id), k, Some(id)))
        .collect();
    AdjacencyGraph::from_lists(lists)
}

/// Node closest to the centroid.
pub fn medoid(base: &VectorSet) -> NodeId {
    let dim = base.dim();
    let mut centroid = vec![0.0f32; dim];
    for row in base.iter() {
        for (c, x) in centroid.iter_mut().zip(row) {
            *c += x;
        }
    }
    let n = base.len() as f32;
    for c in &mut centroid {
        *c /= n;
    }
    brute_force(base, &centroid, 1, None)[0].id
}

/// Fraction of `truth` ids present in `found`.
pub fn recall(found: &[Neighbor], truth: &[Neighbor]) -> f64 {
    if truth.is_empty() {
        return 1.0;
    }
    let hits = truth
        .iter()
        .filter(|t| found.iter().any(|f| f.id == t.id))
        .count();
    hits as f64 / truth.len() as f64
}
