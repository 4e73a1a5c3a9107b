//! First-stage candidate sources.
//!
//! An index that holds nothing contributes an empty ranking. An index that
//! errors also contributes nothing but is marked unavailable; the other
//! source still runs. A query embedding failure is different: it means the
//! model is broken, and it propagates.

use tracing::{debug, warn};

use filings_core::traits::{Embedder, LexicalIndex, VectorIndex};
use filings_core::ChunkId;

use crate::error::{ModelStage, Result, RetrievalError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Ok,
    Unavailable(String),
}

impl SourceOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, SourceOutcome::Ok)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            SourceOutcome::Ok => None,
            SourceOutcome::Unavailable(reason) => Some(reason),
        }
    }
}

/// Ranked ids from one source, best first, with how the source fared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResult {
    pub ids: Vec<ChunkId>,
    pub outcome: SourceOutcome,
}

impl SourceResult {
    fn ok(ids: Vec<ChunkId>) -> Self {
        Self { ids, outcome: SourceOutcome::Ok }
    }

    fn unavailable(reason: impl Into<String>) -> Self {
        Self { ids: Vec::new(), outcome: SourceOutcome::Unavailable(reason.into()) }
    }
}

pub fn lexical_search(index: &dyn LexicalIndex, query: &str, top_k: usize) -> SourceResult {
    if index.is_empty() {
        debug!("lexical index is empty");
        return SourceResult::ok(Vec::new());
    }
    match index.search(query, top_k) {
        Ok(ids) => {
            debug!(hits = ids.len(), top_k, "lexical search");
            SourceResult::ok(ids)
        }
        Err(e) => {
            warn!(error = %e, "lexical search failed; continuing without lexical candidates");
            SourceResult::unavailable(format!("{e:#}"))
        }
    }
}

pub fn semantic_search(index: &dyn VectorIndex, embedder: &dyn Embedder, query: &str, top_k: usize) -> Result<SourceResult> {
    if index.is_empty() {
        debug!("vector index is empty");
        return Ok(SourceResult::ok(Vec::new()));
    }
    let query_vec = embedder.embed(query).map_err(|e| RetrievalError::model(ModelStage::Embedding, e))?;
    match index.nearest_neighbors(&query_vec, top_k) {
        Ok(ids) => {
            debug!(hits = ids.len(), top_k, "semantic search");
            Ok(SourceResult::ok(ids))
        }
        Err(e) => {
            warn!(error = %e, "vector search failed; continuing without semantic candidates");
            Ok(SourceResult::unavailable(format!("{e:#}")))
        }
    }
}
