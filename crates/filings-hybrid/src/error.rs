use std::fmt;
use thiserror::Error;

/// Pipeline stage whose model failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStage {
    Embedding,
    Reranking,
}

impl fmt::Display for ModelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStage::Embedding => f.write_str("embedding"),
            ModelStage::Reranking => f.write_str("reranking"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("{stage} model unavailable: {source:#}")]
    ModelUnavailable { stage: ModelStage, source: anyhow::Error },

    #[error("no retrieval source available (lexical: {lexical}; semantic: {semantic})")]
    BackendsUnavailable { lexical: String, semantic: String },

    #[error("reranker returned {got} scores for {expected} candidates")]
    ScoreCountMismatch { expected: usize, got: usize },
}

impl RetrievalError {
    pub(crate) fn model(stage: ModelStage, source: anyhow::Error) -> Self {
        RetrievalError::ModelUnavailable { stage, source }
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
