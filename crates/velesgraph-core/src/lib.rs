//! # `VelesGraph` Core
//!
//! Concurrent refinement of approximate-nearest-neighbor proximity graphs,
//! and the greedy beam-search router that queries them.
//!
//! ## Features
//!
//! - **Seven graph families**: NSG, SSG, VAMANA, FANNG, KGraph, DPG and
//!   EFANNA (NN-descent), selected by configuration
//! - **Pluggable strategies**: candidate generators and pruning policies are
//!   plain enums, composed per family into a [`RefinePlan`]
//! - **Parallel by default**: rayon over node ids, per-node locks during
//!   reverse-edge repair, a fixed-capacity edge arena that never grows past
//!   `R`
//! - **Explicit SIMD** distance kernels (`wide::f32x8`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use velesgraph_core::{
//!     DistanceMetric, GraphConfig, Refiner, SearchRouter, VectorSet,
//! };
//!
//! let config = GraphConfig::load()?;
//! let base = VectorSet::from_flat(data, 128)?;
//!
//! // Refine a k-NN graph built elsewhere
//! let refiner = Refiner::from_config(&config)?;
//! let output = refiner.refine(&base, &DistanceMetric::SquaredEuclidean, &knn, Some(entry))?;
//!
//! // Query it
//! let router = SearchRouter::new(&output.graph, &base, &DistanceMetric::SquaredEuclidean)?;
//! let top = router.search(&query, &[entry], &config.search)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// Node ids are u32 and counters u64; `as` conversions between them and usize
// are bounded by the node count.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::derive_partial_eq_without_eq)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::float_cmp)]

pub mod candidate;
pub mod config;
pub mod distance;
pub mod error;
#[cfg(test)]
mod error_tests;
pub mod graph;
pub mod prune;
pub mod refine;
pub mod search;
pub mod simd;
pub mod vectors;

pub use candidate::{CandidateStrategy, GeneratorScratch, NnDescentParams};
pub use config::{ConfigError, GraphConfig, ParallelConfig, RefineParams, SearchParams};
pub use distance::{DistanceFunction, DistanceMetric, Evaluator};
pub use error::{Error, Result};
pub use graph::{
    AdjacencyGraph, Candidate, DegreeStats, EdgeArena, FixedEdgeSlice, Neighbor, NodeId,
    VisitedSet, SENTINEL_DISTANCE,
};
pub use prune::PruneStrategy;
pub use refine::{GraphFamily, PrunePlan, RefineOutput, RefinePlan, RefineStats, Refiner};
pub use search::SearchRouter;
pub use vectors::VectorSet;
