//! filings-embed
//!
//! Local transformer models behind the `Embedder` and `RelevanceScorer`
//! traits, deterministic stand-ins for tests, and lazy once-only handles.
//!
//! `APP_USE_FAKE_EMBEDDINGS=1` swaps the bi-encoder for [`HashEmbedder`] and
//! `APP_USE_FAKE_RERANKER=1` swaps the cross-encoder for [`TermOverlapScorer`].

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use filings_core::config::ModelSettings;
use filings_core::traits::{Embedder, RelevanceScorer};

pub mod bert_embedder;
pub mod cross_encoder;
pub mod device;
pub mod hash_embedder;
pub mod lazy;
pub mod model_files;
pub mod overlap_scorer;
pub mod pool;
pub mod tokenize;

pub use bert_embedder::{BertEmbedder, Pooling};
pub use cross_encoder::CrossEncoder;
pub use hash_embedder::HashEmbedder;
pub use lazy::LazyModel;
pub use overlap_scorer::TermOverlapScorer;
pub use pool::masked_mean_l2;

/// Dimension of the default bi-encoder (bge-large-en-v1.5), also used by the fake.
pub const DEFAULT_EMBEDDING_DIM: usize = 1024;

fn flag(name: &str) -> bool {
    std::env::var(name).ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_embedder(settings: &ModelSettings) -> Result<Box<dyn Embedder>> {
    if flag("APP_USE_FAKE_EMBEDDINGS") {
        info!("using HashEmbedder");
        return Ok(Box::new(HashEmbedder::new(DEFAULT_EMBEDDING_DIM)));
    }
    let dir = model_files::resolve_model_dir(settings.embedding_model_dir.as_deref(), "APP_EMBEDDING_MODEL_DIR", "bge-large-en-v1.5")?;
    Ok(Box::new(BertEmbedder::load(&dir, settings.max_len, Pooling::Cls)?))
}

pub fn get_default_scorer(settings: &ModelSettings) -> Result<Box<dyn RelevanceScorer>> {
    if flag("APP_USE_FAKE_RERANKER") {
        info!("using TermOverlapScorer");
        return Ok(Box::new(TermOverlapScorer));
    }
    let dir = model_files::resolve_model_dir(settings.reranker_model_dir.as_deref(), "APP_RERANKER_MODEL_DIR", "ms-marco-MiniLM-L-12-v2")?;
    Ok(Box::new(CrossEncoder::load(&dir, settings.max_len)?))
}

/// Bi-encoder loaded on first use.
pub fn lazy_embedder(settings: ModelSettings) -> LazyModel<dyn Embedder> {
    LazyModel::new("embedder", move || get_default_embedder(&settings).map(Arc::from))
}

/// Cross-encoder loaded on first use.
pub fn lazy_scorer(settings: ModelSettings) -> LazyModel<dyn RelevanceScorer> {
    LazyModel::new("reranker", move || get_default_scorer(&settings).map(Arc::from))
}
