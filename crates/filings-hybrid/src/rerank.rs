use std::collections::HashMap;
use tracing::debug;

use filings_core::traits::RelevanceScorer;
use filings_core::{Chunk, ChunkId};

use crate::error::{ModelStage, Result, RetrievalError};

/// Borrowed id -> chunk view, see [`filings_core::ChunkCatalog::lookup`].
pub type ChunkLookup<'a> = HashMap<&'a str, &'a Chunk>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reranked {
    /// Best first, at most `top_m`.
    pub ids: Vec<ChunkId>,
    /// Candidates with no chunk in the lookup, in input order.
    pub dropped: Vec<ChunkId>,
}

/// Re-score candidates with `scorer` and keep the best `top_m`.
///
/// Ids missing from `lookup` are dropped before scoring. With nothing left the
/// scorer is never called. All remaining pairs go to the scorer in a single
/// call; equal scores keep candidate order.
pub fn rerank_candidates(
    scorer: &dyn RelevanceScorer,
    query: &str,
    candidate_ids: &[ChunkId],
    lookup: &ChunkLookup<'_>,
    top_m: usize,
) -> Result<Reranked> {
    let mut valid: Vec<(&ChunkId, &Chunk)> = Vec::with_capacity(candidate_ids.len());
    let mut dropped = Vec::new();
    for id in candidate_ids {
        match lookup.get(id.as_str()) {
            Some(chunk) => valid.push((id, *chunk)),
            None => dropped.push(id.clone()),
        }
    }
    if !dropped.is_empty() {
        debug!(dropped = dropped.len(), "candidates missing from catalog");
    }
    if valid.is_empty() {
        return Ok(Reranked { ids: Vec::new(), dropped });
    }

    let texts: Vec<&str> = valid.iter().map(|(_, c)| c.text.as_str()).collect();
    let scores = scorer.score_pairs(query, &texts).map_err(|e| RetrievalError::model(ModelStage::Reranking, e))?;
    if scores.len() != valid.len() {
        return Err(RetrievalError::ScoreCountMismatch { expected: valid.len(), got: scores.len() });
    }

    let mut order: Vec<usize> = (0..valid.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order.truncate(top_m);
    debug!(scored = valid.len(), kept = order.len(), top_m, "reranked");
    Ok(Reranked { ids: order.into_iter().map(|i| valid[i].0.clone()).collect(), dropped })
}

pub fn rerank(
    scorer: &dyn RelevanceScorer,
    query: &str,
    candidate_ids: &[ChunkId],
    lookup: &ChunkLookup<'_>,
    top_m: usize,
) -> Result<Vec<ChunkId>> {
    rerank_candidates(scorer, query, candidate_ids, lookup, top_m).map(|r| r.ids)
}
