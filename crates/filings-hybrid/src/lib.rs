//! filings-hybrid
//!
//! Two-stage retrieval over filing chunks: lexical and semantic candidates
//! fused by reciprocal rank, then reordered by a pairwise relevance model.

pub mod candidates;
pub mod citations;
pub mod error;
pub mod fusion;
pub mod hybrid;
pub mod rerank;
pub mod retriever;

pub use candidates::{lexical_search, semantic_search, SourceOutcome, SourceResult};
pub use citations::{cited_sources, extract_citations, format_context, format_source_label, MAX_CONTEXT_CHUNKS};
pub use error::{ModelStage, Result, RetrievalError};
pub use fusion::{fused_scores, reciprocal_rank_fusion};
pub use hybrid::{hybrid_search, HybridCandidates};
pub use rerank::{rerank, rerank_candidates, ChunkLookup, Reranked};
pub use retriever::{RetrievalReport, Retriever};
