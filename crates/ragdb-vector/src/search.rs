//! Partitioned cosine similarity with a bounded top-k per query.
//!
//! Queries and candidates are cut into blocks; every (query block,
//! candidate block) pair is scored on the rayon pool with a min-heap of
//! `topk` entries per query. The per-block lists of a query are then merged
//! into one global top-k.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rayon::prelude::*;

pub use ragdb_core::config::{DEFAULT_CANDIDATE_BLOCK, DEFAULT_QUERY_BLOCK};

/// Candidate position in the searched sequence and its score.
#[derive(Debug, Clone, Copy)]
pub struct ScoredIndex {
    pub index: usize,
    pub score: f64,
}

impl PartialEq for ScoredIndex {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for ScoredIndex {}

impl PartialOrd for ScoredIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScoredIndex {
    /// Higher score ranks higher; on equal scores the lower index wins.
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.index.cmp(&self.index))
    }
}

pub fn norm(v: &[f64]) -> f64 { v.iter().map(|x| x * x).sum::<f64>().sqrt() }

pub fn norms<V>(vectors: &[V]) -> Vec<f64>
where
    V: AsRef<[f64]> + Sync,
{
    vectors.par_iter().map(|v| norm(v.as_ref())).collect()
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

/// Cosine similarity from precomputed norms; 0.0 when either norm is zero.
pub fn cosine(a: &[f64], b: &[f64], norm_a: f64, norm_b: f64) -> f64 {
    let denom = norm_a * norm_b;
    if denom == 0.0 {
        return 0.0;
    }
    dot(a, b) / denom
}

/// Top `topk` candidates for every query, each list sorted by descending score.
///
/// Returns one list per query. Vectors of unequal length are compared over
/// their common prefix.
pub fn cosine_top_k<Q, C>(
    queries: &[Q],
    candidates: &[C],
    topk: usize,
    query_block: usize,
    candidate_block: usize,
) -> Vec<Vec<ScoredIndex>>
where
    Q: AsRef<[f64]> + Sync,
    C: AsRef<[f64]> + Sync,
{
    if topk == 0 || candidates.is_empty() {
        return vec![Vec::new(); queries.len()];
    }
    let topk = topk.min(candidates.len());
    let query_block = query_block.max(1);
    let candidate_block = candidate_block.max(1);
    let query_norms = norms(queries);
    let candidate_norms = norms(candidates);

    let units: Vec<(usize, usize)> = (0..queries.len())
        .step_by(query_block)
        .flat_map(|q| (0..candidates.len()).step_by(candidate_block).map(move |c| (q, c)))
        .collect();

    let partials: Vec<(usize, Vec<Vec<ScoredIndex>>)> = units
        .par_iter()
        .map(|&(q_start, c_start)| {
            let q_end = (q_start + query_block).min(queries.len());
            let c_end = (c_start + candidate_block).min(candidates.len());
            let lists = (q_start..q_end)
                .map(|q| {
                    block_top_k(
                        queries[q].as_ref(),
                        query_norms[q],
                        &candidates[c_start..c_end],
                        &candidate_norms[c_start..c_end],
                        c_start,
                        topk,
                    )
                })
                .collect();
            (q_start, lists)
        })
        .collect();

    let mut merged: Vec<Vec<ScoredIndex>> = vec![Vec::new(); queries.len()];
    for (q_start, lists) in partials {
        for (offset, list) in lists.into_iter().enumerate() {
            merged[q_start + offset].extend(list);
        }
    }
    for list in &mut merged {
        list.sort_unstable_by(|a, b| b.cmp(a));
        list.truncate(topk);
    }
    tracing::trace!(queries = queries.len(), candidates = candidates.len(), units = units.len(), topk, "cosine top-k");
    merged
}

fn block_top_k<C>(
    query: &[f64],
    query_norm: f64,
    block: &[C],
    block_norms: &[f64],
    offset: usize,
    topk: usize,
) -> Vec<ScoredIndex>
where
    C: AsRef<[f64]>,
{
    let mut heap: BinaryHeap<Reverse<ScoredIndex>> = BinaryHeap::with_capacity(topk.min(block.len()) + 1);
    for (j, (candidate, &candidate_norm)) in block.iter().zip(block_norms).enumerate() {
        let scored = ScoredIndex { index: offset + j, score: cosine(query, candidate.as_ref(), query_norm, candidate_norm) };
        if heap.len() < topk {
            heap.push(Reverse(scored));
        } else if heap.peek().is_some_and(|Reverse(min)| scored > *min) {
            heap.pop();
            heap.push(Reverse(scored));
        }
    }
    heap.into_iter().map(|Reverse(scored)| scored).collect()
}
