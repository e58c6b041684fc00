//! Graph refinement.
//!
//! A [`Refiner`] turns an initial graph into a refined one following the
//! plan of its [`GraphFamily`]:
//!
//! ```text
//! Phase 1: generate + prune   (parallel over nodes, exclusive slices)
//!    ── barrier: snapshot of every node's out-edges ──
//! Phase 2: reverse-edge repair (parallel over nodes, per-slice locks)
//! Compact: trim slices at the first sentinel → AdjacencyGraph
//! ```
//!
//! VAMANA runs the whole sequence twice, the second pass over the output
//! of the first. EFANNA replaces it with NN-descent.
//!
//! # Example
//!
//! ```rust,ignore
//! use velesgraph_core::{AdjacencyGraph, DistanceMetric, GraphFamily, RefineParams, Refiner};
//!
//! let params = RefineParams { r: Some(32), l: Some(64), ..RefineParams::default() };
//! let refiner = Refiner::new(GraphFamily::Nsg, &params)?;
//! let output = refiner.refine(&vectors, &DistanceMetric::SquaredEuclidean, &knn_graph, Some(entry))?;
//! println!("{} edges", output.stats.edges_after);
//! ```

mod repair;
mod stats;


use std::borrow::Cow;
use std::fmt;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use stats::RefineStats;

use crate::candidate::nn_descent::NnDescent;
use crate::candidate::{CandidateStrategy, GeneratorScratch, NnDescentParams};
use crate::config::{require_positive, ConfigError, GraphConfig, ParallelConfig, RefineParams};
use crate::distance::{DistanceFunction, Evaluator};
use crate::error::{Error, Result};
use crate::graph::{sort_dedup, AdjacencyGraph, EdgeArena, NodeId};
use crate::prune::PruneStrategy;
use crate::vectors::VectorSet;
use stats::StatCounters;

/// Supported proximity-graph families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphFamily {
    /// Navigating spreading-out graph.
    #[default]
    Nsg,
    /// Satellite system graph.
    Ssg,
    /// DiskANN's graph.
    Vamana,
    /// Occlusion-pruned k-NN graph.
    Fanng,
    /// Plain k-NN graph.
    Kgraph,
    /// Diversified proximity graph.
    Dpg,
    /// NN-descent refined k-NN graph.
    Efanna,
}

impl GraphFamily {
    /// Lower-case name, as used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nsg => "nsg",
            Self::Ssg => "ssg",
            Self::Vamana => "vamana",
            Self::Fanng => "fanng",
            Self::Kgraph => "kgraph",
            Self::Dpg => "dpg",
            Self::Efanna => "efanna",
        }
    }

    /// Resolves the family's strategies from `params`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a key the family needs is missing or
    /// out of range.
    pub fn plan(self, params: &RefineParams) -> std::result::Result<RefinePlan, ConfigError> {
        params.validate_for(self)?;

        let plan = match self {
            Self::Nsg => RefinePlan::Prune(PrunePlan {
                candidate: CandidateStrategy::Greedy {
                    beam: require_positive("L_refine", params.l)?,
                },
                passes: vec![PruneStrategy::Heuristic {
                    max_candidates: params.c,
                }],
                range: require_positive("R", params.r)?,
                repair: true,
                merge_existing: true,
            }),
            Self::Ssg => RefinePlan::Prune(PrunePlan {
                candidate: CandidateStrategy::Propagation {
                    limit: require_positive("L_refine", params.l)?,
                    n_try: require_positive("n_try", params.n_try)?,
                },
                passes: vec![PruneStrategy::angular(params.require_angle()?)],
                range: require_positive("R", params.r)?,
                repair: true,
                merge_existing: true,
            }),
            Self::Vamana => RefinePlan::Prune(PrunePlan {
                candidate: CandidateStrategy::Greedy {
                    beam: require_positive("L_refine", params.l)?,
                },
                passes: vec![
                    PruneStrategy::Alpha { alpha: 1.0 },
                    PruneStrategy::Alpha {
                        alpha: params.require_alpha()?,
                    },
                ],
                range: require_positive("R", params.r)?,
                repair: true,
                merge_existing: false,
            }),
            Self::Fanng => RefinePlan::Prune(PrunePlan {
                candidate: CandidateStrategy::ExistingNeighbors,
                passes: vec![PruneStrategy::Heuristic {
                    max_candidates: None,
                }],
                range: require_positive("R", params.r)?,
                repair: false,
                merge_existing: false,
            }),
            Self::Kgraph => RefinePlan::Prune(PrunePlan {
                candidate: CandidateStrategy::ExistingNeighbors,
                passes: vec![PruneStrategy::Naive],
                range: require_positive("K", params.k)?,
                repair: false,
                merge_existing: false,
            }),
            Self::Dpg => RefinePlan::Prune(PrunePlan {
                candidate: CandidateStrategy::ExistingNeighbors,
                passes: vec![PruneStrategy::Diversified],
                range: require_positive("K", params.k)? / 2,
                repair: false,
                merge_existing: false,
            }),
            Self::Efanna => RefinePlan::NnDescent(NnDescentParams {
                k: require_positive("K", params.k)?,
                pool_size: require_positive("L_refine", params.l)?,
                reverse_cap: require_positive("R", params.r)?,
                sample: require_positive("S", params.s)?,
                iterations: require_positive("ITER", params.iter)?,
                seed: params.seed,
            }),
        };
        Ok(plan)
    }
}

impl fmt::Display for GraphFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strategies of a generate/prune/repair family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrunePlan {
    /// Candidate pool source.
    pub candidate: CandidateStrategy,
    /// One pruning rule per pass; each pass refines the previous output.
    pub passes: Vec<PruneStrategy>,
    /// Out-degree bound.
    pub range: usize,
    /// Whether reverse edges are repaired after pruning.
    pub repair: bool,
    /// Whether the node's current neighbors join its candidate pool.
    pub merge_existing: bool,
}

/// Resolved refinement procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RefinePlan {
    /// Candidate generation, pruning and optional repair.
    Prune(PrunePlan),
    /// Iterative local joins.
    NnDescent(NnDescentParams),
}

impl RefinePlan {
    /// Out-degree bound of the refined graph.
    #[must_use]
    pub fn max_degree(&self) -> usize {
        match self {
            Self::Prune(plan) => plan.range,
            Self::NnDescent(params) => params.k,
        }
    }

    /// Whether an entry point must be supplied.
    #[must_use]
    pub fn needs_entry(&self) -> bool {
        matches!(
            self,
            Self::Prune(PrunePlan {
                candidate: CandidateStrategy::Greedy { .. },
                ..
            })
        )
    }
}

/// A refined graph and what it took to build it.
#[derive(Debug, Clone)]
pub struct RefineOutput {
    /// The refined graph.
    pub graph: AdjacencyGraph,
    /// Run counters.
    pub stats: RefineStats,
}

/// Runs a family's refinement plan.
#[derive(Debug, Clone)]
pub struct Refiner {
    family: GraphFamily,
    plan: RefinePlan,
    parallel: ParallelConfig,
    seed: u64,
}

impl Refiner {
    /// Creates a refiner with default scheduling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `params` lacks a key the family needs.
    pub fn new(family: GraphFamily, params: &RefineParams) -> Result<Self> {
        Ok(Self {
            family,
            plan: family.plan(params)?,
            parallel: ParallelConfig::default(),
            seed: params.seed,
        })
    }

    /// Creates a refiner from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the configuration is invalid.
    pub fn from_config(config: &GraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.family, &config.refine)?.with_parallelism(config.parallel.clone()))
    }

    /// Overrides chunk size and thread count.
    #[must_use]
    pub fn with_parallelism(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// The family being refined.
    #[must_use]
    pub fn family(&self) -> GraphFamily {
        self.family
    }

    /// The resolved plan.
    #[must_use]
    pub fn plan(&self) -> &RefinePlan {
        &self.plan
    }

    /// Refines `initial` over `vectors`.
    ///
    /// `entry` seeds greedy candidate generation (NSG, VAMANA) and is
    /// ignored by the other families.
    ///
    /// # Errors
    ///
    /// Fails before any parallel work when `initial` does not match
    /// `vectors`, references an unknown node, or `entry` is missing or out
    /// of range for a family that needs it.
    #[tracing::instrument(skip_all, fields(family = %self.family, nodes = vectors.len()))]
    pub fn refine<D: DistanceFunction + ?Sized>(
        &self,
        vectors: &VectorSet,
        distance: &D,
        initial: &AdjacencyGraph,
        entry: Option<NodeId>,
    ) -> Result<RefineOutput> {
        let entry = self.check_inputs(vectors, initial, entry)?;

        if self.parallel.num_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.parallel.num_threads)
                .build()
                .map_err(|e| Error::Config(format!("cannot build worker pool: {e}")))?;
            Ok(pool.install(|| self.run(vectors, distance, initial, entry)))
        } else {
            Ok(self.run(vectors, distance, initial, entry))
        }
    }

    fn check_inputs(
        &self,
        vectors: &VectorSet,
        initial: &AdjacencyGraph,
        entry: Option<NodeId>,
    ) -> Result<NodeId> {
        let n = vectors.len();
        if initial.len() != n {
            return Err(Error::GraphSizeMismatch {
                graph: initial.len(),
                base: n,
            });
        }
        for (_, list) in initial.iter() {
            if let Some(bad) = list.iter().find(|nb| nb.id as usize >= n) {
                return Err(Error::NodeOutOfRange { id: bad.id, len: n });
            }
        }

        match entry {
            Some(id) if id as usize >= n => Err(Error::NodeOutOfRange { id, len: n }),
            Some(id) => Ok(id),
            None if self.plan.needs_entry() && n > 0 => Err(Error::Config(format!(
                "family '{}' needs an entry point",
                self.family
            ))),
            None => Ok(0),
        }
    }

    fn run<D: DistanceFunction + ?Sized>(
        &self,
        vectors: &VectorSet,
        distance: &D,
        initial: &AdjacencyGraph,
        entry: NodeId,
    ) -> RefineOutput {
        let started = Instant::now();
        let counters = StatCounters::default();

        tracing::info!(
            max_degree = self.plan.max_degree(),
            chunk_size = self.parallel.chunk_size,
            "Refinement started"
        );

        let (graph, passes) = match &self.plan {
            RefinePlan::NnDescent(params) => {
                let (graph, evaluations) = NnDescent::new(
                    vectors,
                    distance,
                    initial,
                    *params,
                    self.parallel.chunk_size,
                )
                .run();
                counters.add_evaluations(evaluations);
                (graph, 0)
            }
            RefinePlan::Prune(plan) => {
                let mut current = Cow::Borrowed(initial);
                for (pass, prune) in plan.passes.iter().enumerate() {
                    let next =
                        self.run_pass(pass, plan, prune, &current, vectors, distance, entry, &counters);
                    current = Cow::Owned(next);
                }
                let mut graph = current.into_owned();
                if plan.passes.len() > 1 {
                    graph.sort_by_distance();
                }
                (graph, plan.passes.len())
            }
        };

        let mut stats = counters.into_stats(self.family, passes);
        stats.edges_before = initial.edge_count();
        stats.edges_after = graph.edge_count();

        let isolated = graph.iter().filter(|(_, list)| list.is_empty()).count();
        if isolated > 0 && graph.len() > 1 {
            tracing::warn!(isolated, "Refined graph has nodes without out-edges");
        }
        tracing::info!(
            edges_before = stats.edges_before,
            edges_after = stats.edges_after,
            distance_evaluations = stats.distance_evaluations,
            reverse_edges_added = stats.reverse_edges_added,
            overflow_reprunes = stats.overflow_reprunes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Refinement finished"
        );

        RefineOutput { graph, stats }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_pass<D: DistanceFunction + ?Sized>(
        &self,
        pass: usize,
        plan: &PrunePlan,
        prune: &PruneStrategy,
        graph: &AdjacencyGraph,
        vectors: &VectorSet,
        distance: &D,
        entry: NodeId,
        counters: &StatCounters,
    ) -> AdjacencyGraph {
        let n = vectors.len();
        let chunk = self.parallel.chunk_size.max(1);
        let seed = self.seed ^ pass as u64;
        let mut arena = EdgeArena::new(n, plan.range);

        arena
            .par_slices_mut()
            .enumerate()
            .with_min_len(chunk)
            .for_each_init(
                || (GeneratorScratch::new(n), Evaluator::new(vectors, distance)),
                |(scratch, eval), (node, slice)| {
                    let node = node as NodeId;
                    scratch.reset();
                    plan.candidate
                        .generate(node, graph, entry, seed, scratch, eval);
                    if plan.merge_existing {
                        scratch
                            .pool
                            .extend(graph.neighbors(node).iter().filter(|nb| nb.id != node));
                    }
                    sort_dedup(&mut scratch.pool);
                    let kept = prune.prune(node, &mut scratch.pool, plan.range, eval);
                    slice.fill(&kept);
                    counters.add_evaluations(eval.take_evaluations());
                },
            );
        tracing::debug!(pass, ?prune, "Candidate generation and pruning finished");

        if plan.repair {
            let snapshot = arena.snapshot();
            let shared = &arena;
            (0..n)
                .into_par_iter()
                .with_min_len(chunk)
                .for_each_init(
                    || Evaluator::new(vectors, distance),
                    |eval, node| {
                        let node = node as NodeId;
                        let tally =
                            repair::repair(node, snapshot.neighbors(node), shared, prune, eval);
                        counters.absorb(&tally);
                        counters.add_evaluations(eval.take_evaluations());
                    },
                );
            tracing::debug!(pass, "Reverse-edge repair finished");
        }

        arena.compact()
    }
}
