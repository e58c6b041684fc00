//! Distance functions.
//!
//! The refinement engine and the router only ever call
//! [`DistanceFunction::distance`]. Any `Fn(&[f32], &[f32]) -> f32` closure
//! qualifies, which keeps toy datasets in tests short; production callers use
//! [`DistanceMetric`], backed by the SIMD kernels in [`crate::simd`].

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;
use crate::simd;
use crate::vectors::VectorSet;

/// A pure, deterministic, non-negative distance between two vectors.
///
/// Implementations must be cheap to share across worker threads.
pub trait DistanceFunction: Send + Sync {
    /// Distance between `a` and `b`. Lower is closer.
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;

    /// Whether [`distance`](Self::distance) returns a squared Euclidean-style
    /// quantity.
    ///
    /// The angular pruning test derives cosines from pairwise distances and
    /// needs to know whether to square them first.
    fn is_squared(&self) -> bool {
        false
    }
}

impl<F> DistanceFunction for F
where
    F: Fn(&[f32], &[f32]) -> f32 + Send + Sync,
{
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        self(a, b)
    }
}

/// Built-in distance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Squared L2. Ranking-equivalent to L2 without the square root; the
    /// metric most ANN graph builders use internally.
    #[default]
    SquaredEuclidean,
    /// L2 norm of the difference.
    Euclidean,
    /// `1 - cosine_similarity`, in `[0, 2]`.
    Cosine,
}

impl DistanceFunction for DistanceMetric {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::SquaredEuclidean => simd::squared_l2(a, b),
            Self::Euclidean => simd::l2(a, b),
            Self::Cosine => (1.0 - simd::cosine_similarity(a, b)).max(0.0),
        }
    }

    fn is_squared(&self) -> bool {
        matches!(self, Self::SquaredEuclidean)
    }
}

/// L1 distance. On 1-D toy datasets this is the Euclidean distance.
#[must_use]
pub fn absolute_difference(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// A per-worker view of a vector set that counts distance evaluations.
///
/// Workers own one evaluator each and flush the count into shared
/// statistics once per node.
pub struct Evaluator<'a, D: ?Sized> {
    vectors: &'a VectorSet,
    distance: &'a D,
    evaluations: u64,
}

impl<'a, D: DistanceFunction + ?Sized> Evaluator<'a, D> {
    /// Creates an evaluator with a zero count.
    #[must_use]
    pub fn new(vectors: &'a VectorSet, distance: &'a D) -> Self {
        Self {
            vectors,
            distance,
            evaluations: 0,
        }
    }

    /// Distance between rows `a` and `b`.
    #[inline]
    pub fn between(&mut self, a: NodeId, b: NodeId) -> f32 {
        self.evaluations += 1;
        self.distance
            .distance(self.vectors.get(a), self.vectors.get(b))
    }

    /// See [`DistanceFunction::is_squared`].
    #[must_use]
    pub fn is_squared(&self) -> bool {
        self.distance.is_squared()
    }

    /// Evaluations since the last [`take_evaluations`](Self::take_evaluations).
    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Returns the count and resets it.
    pub fn take_evaluations(&mut self) -> u64 {
        std::mem::take(&mut self.evaluations)
    }
}
