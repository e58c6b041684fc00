//! NN-descent: iterative local joins over a k-NN graph.
//!
//! Every node keeps a bounded neighbor pool. Each round
//!
//! 1. **join**: for every node, pairs of its sampled neighbors are compared
//!    and each is offered to the other's pool;
//! 2. **update**: pools are sorted and truncated, a fresh sample of at most
//!    `S` unexpanded entries is split into `new`/`old` lists, and reverse
//!    samples (`n` appears in `m`'s sample, so `m` goes to `n`'s reverse
//!    list) are merged in, capped at `R`.
//!
//! # Locking
//!
//! Pool locks are taken one at a time during joins. Reverse-list locks are
//! taken one at a time during updates. The "is `n` already worse than `m`'s
//! worst entry" check in the update reads a snapshot of worst distances taken
//! before any list is written, so no pool is read while another thread
//! reshapes it.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::node_rng;
use crate::distance::DistanceFunction;
use crate::graph::{AdjacencyGraph, Candidate, Neighbor, NodeId};
use crate::vectors::VectorSet;

/// Parameters of an NN-descent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NnDescentParams {
    /// Neighbors kept per node in the output (`K`).
    pub k: usize,
    /// Pool capacity (`L`), at least `k`.
    pub pool_size: usize,
    /// Reverse-sample cap (`R`).
    pub reverse_cap: usize,
    /// Fresh entries sampled per round (`S`).
    pub sample: usize,
    /// Number of rounds (`ITER`).
    pub iterations: usize,
    /// Seed for sampling.
    pub seed: u64,
}

#[derive(Debug, Default)]
struct JoinLists {
    nn_new: Vec<NodeId>,
    nn_old: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct ReverseLists {
    rnn_new: Vec<NodeId>,
    rnn_old: Vec<NodeId>,
}

/// Offers `(id, distance)` to a bounded pool.
///
/// A single scan rejects repeated ids and finds the current worst entry,
/// which is replaced when the pool is full and the newcomer is closer.
fn offer(pool: &mut Vec<Candidate>, capacity: usize, id: NodeId, distance: f32) {
    let mut worst = 0;
    for (i, c) in pool.iter().enumerate() {
        if c.id == id {
            return;
        }
        if c.distance > pool[worst].distance {
            worst = i;
        }
    }

    if pool.len() < capacity {
        pool.push(Candidate::new(id, distance));
    } else if capacity > 0 && distance < pool[worst].distance {
        pool[worst] = Candidate::new(id, distance);
    }
}

/// Reverse-list insert with random replacement once the list holds `cap`.
fn push_capped<R: Rng>(list: &mut Vec<NodeId>, cap: usize, id: NodeId, rng: &mut R) {
    if list.len() < cap {
        list.push(id);
    } else if cap > 0 {
        let slot = rng.gen_range(0..cap);
        list[slot] = id;
    }
}

/// Shared state of one NN-descent run.
pub struct NnDescent<'a, D: ?Sized> {
    vectors: &'a VectorSet,
    distance: &'a D,
    params: NnDescentParams,
    chunk_size: usize,
    pools: Vec<Mutex<Vec<Candidate>>>,
    sample_sizes: Vec<usize>,
    lists: Vec<JoinLists>,
    reverse: Vec<Mutex<ReverseLists>>,
    evaluations: AtomicU64,
}

impl<'a, D: DistanceFunction + ?Sized> NnDescent<'a, D> {
    /// Seeds pools from `initial` and samples `2S` random ids per node as
    /// the first `new` list.
    ///
    /// `initial` must have one list per vector with in-range ids.
    #[must_use]
    pub fn new(
        vectors: &'a VectorSet,
        distance: &'a D,
        initial: &AdjacencyGraph,
        params: NnDescentParams,
        chunk_size: usize,
    ) -> Self {
        let n = vectors.len();
        let chunk_size = chunk_size.max(1);

        let pools = (0..n)
            .into_par_iter()
            .with_min_len(chunk_size)
            .map(|node| {
                let node = node as NodeId;
                let mut entries: Vec<Neighbor> = initial
                    .neighbors(node)
                    .iter()
                    .filter(|nb| nb.id != node)
                    .copied()
                    .collect();
                crate::graph::sort_dedup(&mut entries);
                entries.truncate(params.pool_size);
                let mut pool = Vec::with_capacity(params.pool_size);
                pool.extend(entries.into_iter().map(|nb| Candidate::new(nb.id, nb.distance)));
                Mutex::new(pool)
            })
            .collect();

        let lists = (0..n)
            .into_par_iter()
            .with_min_len(chunk_size)
            .map(|node| {
                let mut rng = node_rng(params.seed, node as NodeId);
                let amount = (2 * params.sample).min(n);
                let nn_new = rand::seq::index::sample(&mut rng, n, amount)
                    .into_iter()
                    .map(|id| id as NodeId)
                    .collect();
                JoinLists {
                    nn_new,
                    nn_old: Vec::new(),
                }
            })
            .collect();

        Self {
            vectors,
            distance,
            params,
            chunk_size,
            pools,
            sample_sizes: vec![params.sample; n],
            lists,
            reverse: (0..n).map(|_| Mutex::new(ReverseLists::default())).collect(),
            evaluations: AtomicU64::new(0),
        }
    }

    /// Runs every round and returns the sorted pools truncated to `K`.
    #[must_use]
    pub fn run(mut self) -> (AdjacencyGraph, u64) {
        for round in 0..self.params.iterations {
            self.join();
            self.update(round);
            tracing::debug!(
                round,
                distance_evaluations = self.evaluations.load(Ordering::Relaxed),
                "NN-descent round finished"
            );
        }
        self.finish()
    }

    fn join(&self) {
        let pool_size = self.params.pool_size;
        self.lists
            .par_iter()
            .with_min_len(self.chunk_size)
            .for_each(|lists| {
                let mut evaluations = 0u64;
                let mut compare = |i: NodeId, j: NodeId| {
                    if i == j {
                        return;
                    }
                    let d = self
                        .distance
                        .distance(self.vectors.get(i), self.vectors.get(j));
                    evaluations += 1;
                    offer(&mut self.pools[i as usize].lock(), pool_size, j, d);
                    offer(&mut self.pools[j as usize].lock(), pool_size, i, d);
                };

                for &i in &lists.nn_new {
                    for &j in &lists.nn_new {
                        if i < j {
                            compare(i, j);
                        }
                    }
                    for &j in &lists.nn_old {
                        compare(i, j);
                    }
                }

                self.evaluations.fetch_add(evaluations, Ordering::Relaxed);
            });
    }

    fn update(&mut self, round: usize) {
        let pool_size = self.params.pool_size;
        let sample = self.params.sample;
        let cap = self.params.reverse_cap;
        let seed = self.params.seed ^ (round as u64 + 1).wrapping_mul(0xA076_1D64_78BD_642F);

        self.lists.par_iter_mut().for_each(|lists| {
            lists.nn_new.clear();
            lists.nn_old.clear();
        });

        // Sort, truncate and pick the sample window; record each worst entry.
        let worst: Vec<f32> = self
            .pools
            .par_iter_mut()
            .zip(self.sample_sizes.par_iter_mut())
            .with_min_len(self.chunk_size)
            .map(|(pool, m)| {
                let pool = pool.get_mut();
                pool.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
                pool.truncate(pool_size);

                let window = (*m + sample).min(pool.len());
                let mut fresh = 0;
                let mut l = 0;
                while l < window && fresh < sample {
                    if pool[l].flag {
                        fresh += 1;
                    }
                    l += 1;
                }
                *m = l;

                pool.last().map_or(f32::NEG_INFINITY, |c| c.distance)
            })
            .collect();

        let reverse = &self.reverse;
        self.pools
            .par_iter_mut()
            .zip(self.lists.par_iter_mut())
            .zip(self.sample_sizes.par_iter())
            .enumerate()
            .with_min_len(self.chunk_size)
            .for_each(|(node, ((pool, lists), &m))| {
                let node = node as NodeId;
                let mut rng = node_rng(seed, node);
                for entry in pool.get_mut().iter_mut().take(m) {
                    let farther = entry.distance > worst[entry.id as usize];
                    if entry.flag {
                        lists.nn_new.push(entry.id);
                        if farther {
                            push_capped(&mut reverse[entry.id as usize].lock().rnn_new, cap, node, &mut rng);
                        }
                        entry.flag = false;
                    } else {
                        lists.nn_old.push(entry.id);
                        if farther {
                            push_capped(&mut reverse[entry.id as usize].lock().rnn_old, cap, node, &mut rng);
                        }
                    }
                }
            });

        self.lists
            .par_iter_mut()
            .zip(self.reverse.par_iter_mut())
            .enumerate()
            .with_min_len(self.chunk_size)
            .for_each(|(node, (lists, reverse))| {
                let reverse = reverse.get_mut();
                let mut rng = node_rng(seed.rotate_left(17), node as NodeId);

                if reverse.rnn_new.len() > cap {
                    reverse.rnn_new.shuffle(&mut rng);
                    reverse.rnn_new.truncate(cap);
                }
                lists.nn_new.append(&mut reverse.rnn_new);

                if reverse.rnn_old.len() > cap {
                    reverse.rnn_old.shuffle(&mut rng);
                    reverse.rnn_old.truncate(cap);
                }
                lists.nn_old.append(&mut reverse.rnn_old);
                lists.nn_old.truncate(2 * cap);
            });
    }

    fn finish(self) -> (AdjacencyGraph, u64) {
        let k = self.params.k;
        let evaluations = self.evaluations.into_inner();
        let lists = self
            .pools
            .into_par_iter()
            .map(|pool| {
                let mut pool = pool.into_inner();
                pool.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
                pool.truncate(k);
                pool.into_iter().map(Neighbor::from).collect::<Vec<_>>()
            })
            .collect();
        (AdjacencyGraph::from_lists(lists), evaluations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_offer_fills_then_replaces_worst() {
        let mut pool = Vec::new();
        offer(&mut pool, 2, 1, 3.0);
        offer(&mut pool, 2, 2, 1.0);
        offer(&mut pool, 2, 3, 2.0);

        let mut ids: Vec<NodeId> = pool.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_offer_rejects_repeated_id_and_worse_entry() {
        let mut pool = vec![Candidate::new(1, 1.0), Candidate::new(2, 2.0)];

        offer(&mut pool, 2, 2, 0.5);
        offer(&mut pool, 2, 9, 5.0);

        assert_eq!(pool, vec![Candidate::new(1, 1.0), Candidate::new(2, 2.0)]);
    }

    #[test]
    fn test_push_capped_never_grows_past_cap() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut list = Vec::new();
        for id in 0..10 {
            push_capped(&mut list, 3, id, &mut rng);
        }
        assert_eq!(list.len(), 3);

        let mut empty = Vec::new();
        push_capped(&mut empty, 0, 1, &mut rng);
        assert!(empty.is_empty());
    }
}
