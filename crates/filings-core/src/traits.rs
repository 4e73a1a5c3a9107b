//! Narrow interfaces to the collaborators the retrieval pipeline depends on.
//!
//! Implementations live in `filings-text`, `filings-vector` and
//! `filings-embed`; tests substitute their own.

use crate::types::ChunkId;

/// Dense text embedding. Vectors must be L2-normalized and produced by the
/// same function at index time and at query time.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Term-statistics ranking over a fixed corpus.
pub trait LexicalIndex: Send + Sync {
    /// Top `top_k` chunk ids by descending score, positive scores only.
    fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<ChunkId>>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Nearest-neighbour lookup with cosine (normalized dot product) semantics.
pub trait VectorIndex: Send + Sync {
    /// Ids of the `k` nearest vectors, most similar first.
    fn nearest_neighbors(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<ChunkId>>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pairwise (query, passage) relevance model. Higher is more relevant; the
/// scale is only meaningful within one call.
pub trait RelevanceScorer: Send + Sync {
    fn score_pairs(&self, query: &str, texts: &[&str]) -> anyhow::Result<Vec<f32>>;
}
