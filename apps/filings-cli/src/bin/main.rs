use anyhow::Context;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use filings_core::chunker::Chunker;
use filings_core::config::{expand_path, Config, Settings};
use filings_core::traits::{Embedder, LexicalIndex, RelevanceScorer};
use filings_core::{ChunkCatalog, ChunkStrategy, Section};
use filings_embed::{get_default_embedder, lazy_embedder, lazy_scorer, DEFAULT_EMBEDDING_DIM};
use filings_hybrid::{format_context, format_source_label, Retriever, MAX_CONTEXT_CHUNKS};
use filings_text::{Bm25Index, TantivyLexicalIndex};
use filings_vector::LanceVectorIndex;

const USAGE: &str = "Usage: filings-cli <ingest <sections.json> [--strategy fixed|section_aware] | query \"<question>\" [--lexical bm25|tantivy] [--context]>";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).map(String::as_str)
}

fn metadata_path(catalog_path: &Path) -> PathBuf {
    catalog_path.with_file_name("chunk_metadata.json")
}

fn ingest(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let Some(input) = args.first() else { eprintln!("{USAGE}"); std::process::exit(1) };
    let mut chunking = settings.chunking;
    if let Some(s) = flag_value(args, "--strategy") {
        chunking.strategy = s.parse::<ChunkStrategy>()?;
    }

    let raw = std::fs::read_to_string(input).with_context(|| format!("reading sections from {input}"))?;
    let sections: Vec<Section> = serde_json::from_str(&raw).context("parsing sections JSON")?;
    info!(sections = sections.len(), strategy = %chunking.strategy, "chunking");
    let chunks = Chunker::new(chunking)?.chunk_sections(&sections);
    let catalog = ChunkCatalog::new(chunks);

    let catalog_path = expand_path(&settings.data.catalog_path);
    catalog.save_json(&catalog_path)?;
    catalog.save_metadata(&metadata_path(&catalog_path))?;
    info!(chunks = catalog.len(), path = %catalog_path.display(), "catalog saved");

    let tantivy_dir = expand_path(&settings.data.tantivy_dir);
    TantivyLexicalIndex::create_in_dir(&tantivy_dir, catalog.chunks())?;
    info!(path = %tantivy_dir.display(), "tantivy index written");

    let embedder = get_default_embedder(&settings.models)?;
    let texts: Vec<String> = catalog.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).context("embedding chunks")?;

    let lancedb_dir = expand_path(&settings.data.lancedb_dir);
    if lancedb_dir.exists() { std::fs::remove_dir_all(&lancedb_dir)?; }
    let mut index = LanceVectorIndex::open(&lancedb_dir, &settings.data.table, embedder.dim())?;
    let written = index.write_chunks(catalog.chunks(), &embeddings)?;
    println!("Ingest complete: {} chunks, {} vectors in '{}'", catalog.len(), written, settings.data.table);
    Ok(())
}

fn query(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let Some(question) = args.first() else { eprintln!("{USAGE}"); std::process::exit(1) };
    let catalog_path = expand_path(&settings.data.catalog_path);
    let catalog = ChunkCatalog::load_json(&catalog_path)
        .with_context(|| format!("loading catalog from {} (run ingest first)", catalog_path.display()))?;

    // Tantivy scores with its own fixed BM25 parameters; bm25.* settings only
    // apply to the in-memory index.
    match flag_value(args, "--lexical").unwrap_or("bm25") {
        "bm25" => run_query(Bm25Index::new(catalog.chunks(), settings.bm25), settings, &catalog, question, args),
        "tantivy" => run_query(TantivyLexicalIndex::open(&expand_path(&settings.data.tantivy_dir))?, settings, &catalog, question, args),
        other => anyhow::bail!("unknown lexical engine '{other}' (expected bm25 or tantivy)"),
    }
}

fn run_query<L: LexicalIndex>(lexical: L, settings: &Settings, catalog: &ChunkCatalog, question: &str, args: &[String]) -> anyhow::Result<()> {
    // The vector dimension only matters when the table is created.
    let vector = LanceVectorIndex::open(&expand_path(&settings.data.lancedb_dir), &settings.data.table, DEFAULT_EMBEDDING_DIM)?;
    let embedder: Arc<dyn Embedder> = Arc::new(lazy_embedder(settings.models.clone()));
    let scorer: Arc<dyn RelevanceScorer> = Arc::new(lazy_scorer(settings.models.clone()));
    let retriever = Retriever::new(lexical, vector, embedder, scorer, settings.retrieval);

    let (chunks, report) = retriever.retrieve_with_report(question, catalog)?;
    for (source, outcome) in [("lexical", &report.lexical), ("semantic", &report.semantic)] {
        if let Some(reason) = outcome.reason() { warn!(source, reason, "source unavailable"); }
    }
    if chunks.is_empty() {
        println!("No matching passages.");
        return Ok(());
    }
    if args.iter().any(|a| a == "--context") {
        println!("{}", format_context(question, &chunks, MAX_CONTEXT_CHUNKS));
        return Ok(());
    }
    for (i, chunk) in chunks.iter().enumerate() {
        let preview: String = chunk.text.chars().take(300).collect();
        println!("{}\n  {}\n", format_source_label(i + 1, chunk), preview);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => ingest(&settings, &args)?,
        "query" => query(&settings, &args)?,
        _ => { eprintln!("Unknown command: {}\n{USAGE}", cmd); std::process::exit(1); }
    }
    Ok(())
}
