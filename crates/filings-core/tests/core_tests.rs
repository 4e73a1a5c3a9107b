use tempfile::TempDir;

use filings_core::chunker::{Chunker, ChunkingConfig};
use filings_core::config::Config;
use filings_core::{Chunk, ChunkCatalog, ChunkStrategy, Section};

fn section(text: &str) -> Section {
    Section {
        company: "ACME".to_string(),
        year: 2024,
        section: "Item 1A".to_string(),
        section_name: "Risk Factors".to_string(),
        text: text.to_string(),
    }
}

#[test]
fn chunk_sections_single_small_section() {
    let chunker = Chunker::new(ChunkingConfig::default()).expect("chunker");
    let chunks = chunker.chunk_sections(&[section("We face significant competition.")]);

    assert_eq!(chunks.len(), 1, "one small section becomes one chunk");
    assert_eq!(chunks[0].company, "ACME");
    assert_eq!(chunks[0].section, "Item 1A");
    assert_eq!(chunks[0].text, "We face significant competition.");
}

#[test]
fn chunk_sections_section_aware_tags_strategy() {
    let config = ChunkingConfig { chunk_size: 512, overlap: 50, strategy: ChunkStrategy::SectionAware };
    let chunker = Chunker::new(config).expect("chunker");
    let chunks = chunker.chunk_sections(&[section("Cybersecurity threats.\n\nRegulation changes.")]);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].strategy, ChunkStrategy::SectionAware);
}

#[test]
fn catalog_keeps_first_of_duplicate_ids() {
    let catalog = ChunkCatalog::new(vec![
        Chunk::with_id("c1", "first", "ACME", 2024, "Item 1"),
        Chunk::with_id("c2", "second", "ACME", 2024, "Item 1"),
        Chunk::with_id("c1", "shadowed", "ACME", 2024, "Item 1"),
    ]);
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.get("c1").map(|c| c.text.as_str()), Some("first"));
    assert!(catalog.get("missing").is_none());
    assert_eq!(catalog.lookup().len(), 2);
}

#[test]
fn catalog_json_round_trip_and_metadata() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("processed/chunks.json");
    let meta = tmp.path().join("processed/chunks_metadata.json");
    let long_text = "x".repeat(500);
    let catalog = ChunkCatalog::new(vec![Chunk::new(long_text, "NFLX", 2023, "Item 7", 0, ChunkStrategy::Fixed)]);

    catalog.save_json(&path).expect("save");
    catalog.save_metadata(&meta).expect("metadata");

    let loaded = ChunkCatalog::load_json(&path).expect("load");
    assert_eq!(loaded.chunks(), catalog.chunks());

    let rows: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&meta).unwrap()).unwrap();
    let preview = rows[0]["text_preview"].as_str().unwrap();
    assert_eq!(preview.len(), 200);
    assert_eq!(rows[0]["strategy"], "fixed");
}

#[test]
fn config_merges_toml_and_env() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[retrieval]\ntop_k = 20\n\n[bm25]\nk1 = 1.2\n")?;
        jail.set_env("RUST_ENV", "test");
        jail.set_env("APP_RETRIEVAL__TOP_M", "3");
        let config = Config::load().map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.retrieval.top_k, 20);
        assert_eq!(settings.retrieval.top_m, 3);
        assert_eq!(settings.retrieval.rrf_k, 60);
        assert_eq!(settings.bm25.k1, 1.2);
        assert_eq!(settings.bm25.b, 0.75);
        let top_k: usize = config.get("retrieval.top_k").map_err(|e| e.to_string())?;
        assert_eq!(top_k, 20);
        Ok(())
    });
}

#[test]
fn config_rejects_invalid_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[retrieval]\ntop_k = 0\n")?;
        jail.set_env("RUST_ENV", "test");
        let config = Config::load().map_err(|e| e.to_string())?;
        assert!(config.settings().is_err());
        Ok(())
    });
}

#[test]
fn production_requires_model_dirs() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", "")?;
        jail.set_env("RUST_ENV", "prod");
        assert!(Config::load().is_err());
        jail.set_env("APP_MODELS__EMBEDDING_MODEL_DIR", "/models/bge");
        jail.set_env("APP_MODELS__RERANKER_MODEL_DIR", "/models/ms-marco");
        assert!(Config::load().is_ok());
        Ok(())
    });
}
