//! Models that load on first use, exactly once per handle.
//!
//! Initialization runs under the cell's internal lock; concurrent first
//! callers wait for the one loader instead of loading twice. Once loaded,
//! calls go straight to the shared model with no locking. A failed load
//! leaves the cell empty so a later call can retry.

use anyhow::Result;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{info, warn};

use filings_core::traits::{Embedder, RelevanceScorer};

type Loader<T> = Box<dyn Fn() -> Result<Arc<T>> + Send + Sync>;

pub struct LazyModel<T: ?Sized> {
    name: &'static str,
    cell: OnceCell<Arc<T>>,
    loader: Loader<T>,
}

impl<T: ?Sized> LazyModel<T> {
    pub fn new<F>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Self { name, cell: OnceCell::new(), loader: Box::new(loader) }
    }

    pub fn get(&self) -> Result<&Arc<T>> {
        self.cell.get_or_try_init(|| {
            info!(model = self.name, "initializing model");
            (self.loader)().map_err(|e| {
                warn!(model = self.name, error = %e, "model initialization failed");
                e.context(format!("failed to initialize {}", self.name))
            })
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl Embedder for LazyModel<dyn Embedder> {
    /// Forces the model to load. A load failure reads as 0 here; the error
    /// itself surfaces from the next `embed_batch` call.
    fn dim(&self) -> usize {
        self.get().map(|m| m.dim()).unwrap_or(0)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.get()?.embed_batch(texts)
    }
}

impl RelevanceScorer for LazyModel<dyn RelevanceScorer> {
    fn score_pairs(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>> {
        self.get()?.score_pairs(query, texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HashEmbedder, TermOverlapScorer};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn loads_once_under_concurrent_first_access() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let lazy: Arc<LazyModel<dyn Embedder>> = Arc::new(LazyModel::new("hash", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Ok(Arc::new(HashEmbedder::new(16)) as Arc<dyn Embedder>)
        }));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let lazy = Arc::clone(&lazy);
                thread::spawn(move || lazy.embed(&format!("query {i}")).unwrap().len())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 16);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(lazy.is_loaded());
    }

    #[test]
    fn does_not_load_until_used() {
        let lazy: LazyModel<dyn RelevanceScorer> =
            LazyModel::new("overlap", || Ok(Arc::new(TermOverlapScorer) as Arc<dyn RelevanceScorer>));
        assert!(!lazy.is_loaded());
        let scores = lazy.score_pairs("revenue", &["revenue grew"]).unwrap();
        assert_eq!(scores.len(), 1);
        assert!(lazy.is_loaded());
    }

    #[test]
    fn failed_load_is_an_error_and_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let lazy: LazyModel<dyn RelevanceScorer> = LazyModel::new("broken", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("weights missing"))
        });
        let err = lazy.score_pairs("q", &["t"]).unwrap_err();
        assert!(format!("{err:#}").contains("weights missing"));
        assert!(lazy.score_pairs("q", &["t"]).is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(!lazy.is_loaded());
    }
}
