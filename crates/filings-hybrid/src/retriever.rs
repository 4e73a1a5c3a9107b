use std::sync::Arc;
use tracing::{debug, instrument};

use filings_core::config::RetrievalSettings;
use filings_core::traits::{Embedder, LexicalIndex, RelevanceScorer, VectorIndex};
use filings_core::{Chunk, ChunkCatalog, ChunkId};

use crate::candidates::SourceOutcome;
use crate::error::Result;
use crate::hybrid::hybrid_search;
use crate::rerank::rerank_candidates;

/// What happened inside one retrieval call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalReport {
    pub lexical: SourceOutcome,
    pub semantic: SourceOutcome,
    pub lexical_hits: usize,
    pub semantic_hits: usize,
    pub fused: usize,
    /// Fused candidates that had no chunk in the catalog.
    pub dropped_ids: Vec<ChunkId>,
    pub returned: usize,
}

/// Hybrid search followed by precision reranking.
pub struct Retriever<L, V>
where
    L: LexicalIndex,
    V: VectorIndex,
{
    lexical: L,
    vector: V,
    embedder: Arc<dyn Embedder>,
    scorer: Arc<dyn RelevanceScorer>,
    settings: RetrievalSettings,
}

impl<L, V> Retriever<L, V>
where
    L: LexicalIndex,
    V: VectorIndex,
{
    pub fn new(lexical: L, vector: V, embedder: Arc<dyn Embedder>, scorer: Arc<dyn RelevanceScorer>, settings: RetrievalSettings) -> Self {
        Self { lexical, vector, embedder, scorer, settings }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Up to `top_m` chunks from `catalog`, most relevant first.
    pub fn retrieve(&self, query: &str, catalog: &ChunkCatalog) -> Result<Vec<Chunk>> {
        self.retrieve_with_report(query, catalog).map(|(chunks, _)| chunks)
    }

    #[instrument(skip(self, catalog), fields(top_k = self.settings.top_k, top_m = self.settings.top_m))]
    pub fn retrieve_with_report(&self, query: &str, catalog: &ChunkCatalog) -> Result<(Vec<Chunk>, RetrievalReport)> {
        let lookup = catalog.lookup();
        let candidates = hybrid_search(
            &self.lexical,
            &self.vector,
            self.embedder.as_ref(),
            query,
            self.settings.top_k,
            self.settings.rrf_k,
        )?;
        let reranked = rerank_candidates(self.scorer.as_ref(), query, &candidates.ids, &lookup, self.settings.top_m)?;
        let chunks: Vec<Chunk> = reranked.ids.iter().filter_map(|id| lookup.get(id.as_str()).map(|c| (*c).clone())).collect();

        let report = RetrievalReport {
            lexical_hits: candidates.lexical.ids.len(),
            semantic_hits: candidates.semantic.ids.len(),
            lexical: candidates.lexical.outcome,
            semantic: candidates.semantic.outcome,
            fused: candidates.ids.len(),
            dropped_ids: reranked.dropped,
            returned: chunks.len(),
        };
        debug!(?report, "retrieval finished");
        Ok((chunks, report))
    }
}
