//! Greedy beam search over a finished graph.
//!
//! The router keeps a pool of at most `L` candidates sorted by distance to the
//! query and a cursor `k`. The entry under the cursor is expanded once; when a
//! neighbor lands at or before the cursor the scan resumes from there,
//! otherwise the cursor advances. The walk stops when the cursor runs off the
//! pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use velesgraph_core::{DistanceMetric, SearchParams, SearchRouter};
//!
//! let router = SearchRouter::new(&graph, &base, &DistanceMetric::SquaredEuclidean)?;
//! let params = SearchParams { l: Some(100), k: Some(10) };
//! let top = router.search(&query, &[entry], &params)?;
//! ```


use std::fmt;

use rand::Rng;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::candidate::node_rng;
use crate::config::{SearchParams, DEFAULT_SEED};
use crate::distance::DistanceFunction;
use crate::error::{Error, Result};
use crate::graph::{insert_into_pool, AdjacencyGraph, Candidate, Neighbor, NodeId};
use crate::vectors::VectorSet;

/// Routes queries over a graph built on `base`.
///
/// Stateless between calls; share one router across threads.
#[derive(Clone, Copy)]
pub struct SearchRouter<'a, D: ?Sized> {
    graph: &'a AdjacencyGraph,
    base: &'a VectorSet,
    distance: &'a D,
    seed: u64,
}

// No `D: Debug` bound: distance closures and fn items are not `Debug`.
impl<D: ?Sized> fmt::Debug for SearchRouter<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchRouter")
            .field("nodes", &self.graph.len())
            .field("dim", &self.base.dim())
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl<'a, D: DistanceFunction + ?Sized> SearchRouter<'a, D> {
    /// Creates a router.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphSizeMismatch`] when `graph` and `base` disagree on
    /// the node count.
    pub fn new(graph: &'a AdjacencyGraph, base: &'a VectorSet, distance: &'a D) -> Result<Self> {
        if graph.len() != base.len() {
            return Err(Error::GraphSizeMismatch {
                graph: graph.len(),
                base: base.len(),
            });
        }
        Ok(Self {
            graph,
            base,
            distance,
            seed: DEFAULT_SEED,
        })
    }

    /// Sets the seed used to pad seed pools with random nodes.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builds an initial pool from `entries`, padded with random distinct
    /// nodes up to `min(l, N)` and sorted by distance to `query`.
    ///
    /// # Errors
    ///
    /// Fails on a dimension mismatch or an entry id outside the graph.
    pub fn seed_pool(&self, query: &[f32], entries: &[NodeId], l: usize) -> Result<Vec<Candidate>> {
        let mut rng = node_rng(self.seed, 0);
        self.seed_pool_with(query, entries, l, &mut rng)
    }

    fn seed_pool_with<R: Rng>(
        &self,
        query: &[f32],
        entries: &[NodeId],
        l: usize,
        rng: &mut R,
    ) -> Result<Vec<Candidate>> {
        self.check_query(query)?;
        let n = self.base.len();
        if let Some(&bad) = entries.iter().find(|&&id| id as usize >= n) {
            return Err(Error::NodeOutOfRange { id: bad, len: n });
        }

        let target = l.min(n);
        let mut chosen = FxHashSet::default();
        let mut ids = Vec::with_capacity(target);
        for &id in entries {
            if ids.len() == target {
                break;
            }
            if chosen.insert(id) {
                ids.push(id);
            }
        }
        while ids.len() < target {
            let id = rng.gen_range(0..n) as NodeId;
            if chosen.insert(id) {
                ids.push(id);
            }
        }

        let mut pool: Vec<Candidate> = ids
            .into_iter()
            .map(|id| Candidate::new(id, self.distance.distance(query, self.base.get(id))))
            .collect();
        pool.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        Ok(pool)
    }

    /// Runs the beam search from a seeded `pool` and returns the `k` closest
    /// nodes found, nearest first.
    ///
    /// `pool` is sorted and truncated to `l`; its ids count as visited.
    ///
    /// # Errors
    ///
    /// Fails when `k` or `l` is zero, `l < k`, the query has the wrong
    /// dimension, or a pool id is outside the graph.
    pub fn route(
        &self,
        query: &[f32],
        mut pool: Vec<Candidate>,
        l: usize,
        k: usize,
    ) -> Result<Vec<Neighbor>> {
        check_widths(l, k)?;
        self.check_query(query)?;
        let n = self.base.len();
        if let Some(bad) = pool.iter().find(|c| c.id as usize >= n) {
            return Err(Error::NodeOutOfRange { id: bad.id, len: n });
        }

        pool.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        pool.truncate(l);
        let mut visited: FxHashSet<NodeId> = pool.iter().map(|c| c.id).collect();

        let mut cursor = 0;
        while cursor < pool.len() {
            let mut resume = l;

            if pool[cursor].flag {
                pool[cursor].flag = false;
                let current = pool[cursor].id;

                for id in self.graph.neighbor_ids(current) {
                    if !visited.insert(id) {
                        continue;
                    }
                    let distance = self.distance.distance(query, self.base.get(id));
                    if let Some(pos) = insert_into_pool(&mut pool, l, Candidate::new(id, distance)) {
                        resume = resume.min(pos);
                    }
                }
            }

            if resume <= cursor {
                cursor = resume;
            } else {
                cursor += 1;
            }
        }

        pool.truncate(k);
        Ok(pool.into_iter().map(Neighbor::from).collect())
    }

    /// Seeds a pool from `entries` and routes `query`.
    ///
    /// # Errors
    ///
    /// Fails when `params` lacks `L_search` or `K_search`, or on any error of
    /// [`seed_pool`](Self::seed_pool) or [`route`](Self::route).
    pub fn search(
        &self,
        query: &[f32],
        entries: &[NodeId],
        params: &SearchParams,
    ) -> Result<Vec<Neighbor>> {
        let (l, k) = params.resolve()?;
        let pool = self.seed_pool(query, entries, l)?;
        self.route(query, pool, l, k)
    }

    /// Routes every row of `queries` in parallel.
    ///
    /// Query `i` pads its seed pool from its own random stream, so results do
    /// not depend on scheduling.
    ///
    /// # Errors
    ///
    /// Parameters and dimensions are checked once up front; the batch fails
    /// as a whole.
    #[tracing::instrument(skip_all, fields(queries = queries.len()))]
    pub fn route_batch(
        &self,
        queries: &VectorSet,
        entries: &[NodeId],
        params: &SearchParams,
    ) -> Result<Vec<Vec<Neighbor>>> {
        let (l, k) = params.resolve()?;
        self.base.ensure_same_dim(queries)?;

        let results = (0..queries.len())
            .into_par_iter()
            .map(|i| {
                let query = queries.get(i as NodeId);
                let mut rng = node_rng(self.seed, i as NodeId);
                let pool = self.seed_pool_with(query, entries, l, &mut rng)?;
                self.route(query, pool, l, k)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(l, k, "Batch routing finished");
        Ok(results)
    }

    fn check_query(&self, query: &[f32]) -> Result<()> {
        if query.len() != self.base.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.base.dim(),
                actual: query.len(),
            });
        }
        Ok(())
    }
}

fn check_widths(l: usize, k: usize) -> Result<()> {
    if k == 0 || l == 0 {
        return Err(Error::Config("L_search and K_search must be positive".into()));
    }
    if l < k {
        return Err(Error::Config(format!(
            "L_search ({l}) must be >= K_search ({k})"
        )));
    }
    Ok(())
}
