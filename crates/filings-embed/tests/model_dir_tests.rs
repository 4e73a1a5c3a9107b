use filings_core::config::ModelSettings;
use filings_core::traits::RelevanceScorer;
use filings_embed::{get_default_embedder, get_default_scorer, lazy_scorer};

// Own test binary: the env flags below must not race the fake-model tests.

fn missing_dirs() -> ModelSettings {
    ModelSettings {
        embedding_model_dir: Some("/nonexistent/filings/embedder".to_string()),
        reranker_model_dir: Some("/nonexistent/filings/reranker".to_string()),
        max_len: 128,
    }
}

#[test]
fn missing_model_dirs_are_errors() {
    std::env::remove_var("APP_USE_FAKE_EMBEDDINGS");
    std::env::remove_var("APP_USE_FAKE_RERANKER");
    std::env::remove_var("APP_EMBEDDING_MODEL_DIR");
    std::env::remove_var("APP_RERANKER_MODEL_DIR");

    let settings = missing_dirs();
    assert!(get_default_scorer(&settings).is_err());
    assert!(get_default_embedder(&settings).is_err());

    let lazy = lazy_scorer(settings);
    let err = lazy.score_pairs("revenue", &["revenue grew"]).expect_err("no reranker on disk");
    assert!(format!("{err:#}").contains("reranker"));
    assert!(!lazy.is_loaded());
}
