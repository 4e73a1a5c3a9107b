use tracing::debug;

use filings_core::traits::{Embedder, LexicalIndex, VectorIndex};
use filings_core::ChunkId;

use crate::candidates::{lexical_search, semantic_search, SourceResult};
use crate::error::{Result, RetrievalError};
use crate::fusion::reciprocal_rank_fusion;

/// Fused candidate list plus the per-source results it came from.
#[derive(Debug, Clone)]
pub struct HybridCandidates {
    pub ids: Vec<ChunkId>,
    pub lexical: SourceResult,
    pub semantic: SourceResult,
}

/// Query both sources for `top_k` each, fuse with RRF(`rrf_k`) and keep the
/// first `top_k`. The semantic ranking is fused first, so it wins score ties.
///
/// Fails with [`RetrievalError::BackendsUnavailable`] only when both sources
/// returned errors; empty indexes and empty rankings are an empty success.
pub fn hybrid_search(
    lexical: &dyn LexicalIndex,
    vector: &dyn VectorIndex,
    embedder: &dyn Embedder,
    query: &str,
    top_k: usize,
    rrf_k: u32,
) -> Result<HybridCandidates> {
    let lexical = lexical_search(lexical, query, top_k);
    let semantic = semantic_search(vector, embedder, query, top_k)?;

    if let (Some(l), Some(s)) = (lexical.outcome.reason(), semantic.outcome.reason()) {
        return Err(RetrievalError::BackendsUnavailable { lexical: l.to_string(), semantic: s.to_string() });
    }

    let mut ids = reciprocal_rank_fusion(&[semantic.ids.clone(), lexical.ids.clone()], rrf_k);
    ids.truncate(top_k);
    debug!(lexical = lexical.ids.len(), semantic = semantic.ids.len(), fused = ids.len(), "hybrid candidates");
    Ok(HybridCandidates { ids, lexical, semantic })
}
