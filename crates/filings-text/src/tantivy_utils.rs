//! Tantivy-backed lexical index.
//!
//! Chunk texts are run through [`tokenize`] before indexing and stored as a
//! space-joined token stream analyzed by a whitespace tokenizer, so index and
//! query tokenization are identical to the in-memory BM25 index. Tantivy's
//! own BM25 parameters (k1 = 1.2, b = 0.75) apply.

use std::path::Path;

use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, STORED, STRING};
use tantivy::tokenizer::{TextAnalyzer, WhitespaceTokenizer};
use tantivy::{doc, Index, IndexReader, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info};

use filings_core::traits::LexicalIndex;
use filings_core::{Chunk, ChunkId};

use crate::tokenize::tokenize;

const TOKENIZER_NAME: &str = "filings_pretokenized";
const WRITER_HEAP_BYTES: usize = 50_000_000;

pub fn build_schema() -> Schema {
    let mut schema_builder = Schema::builder();
    schema_builder.add_text_field("chunk_id", STRING | STORED);
    let text_field_indexing = TextFieldIndexing::default()
        .set_tokenizer(TOKENIZER_NAME)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
    schema_builder.add_text_field("tokens", text_options);
    schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
    let tokenizer = TextAnalyzer::builder(WhitespaceTokenizer::default()).build();
    index.tokenizers().register(TOKENIZER_NAME, tokenizer);
}

pub struct TantivyLexicalIndex {
    index: Index,
    reader: IndexReader,
    id_field: Field,
    tokens_field: Field,
}

impl TantivyLexicalIndex {
    /// Build an in-memory index over `chunks`.
    pub fn in_ram(chunks: &[Chunk]) -> Result<Self> {
        let index = Index::create_in_ram(build_schema());
        Self::build(index, chunks)
    }

    /// Build an index under `index_dir`, replacing whatever was there.
    pub fn create_in_dir(index_dir: &Path, chunks: &[Chunk]) -> Result<Self> {
        if index_dir.exists() { std::fs::remove_dir_all(index_dir)?; }
        std::fs::create_dir_all(index_dir)?;
        let index = Index::create_in_dir(index_dir, build_schema())?;
        Self::build(index, chunks)
    }

    /// Open an index previously written by [`Self::create_in_dir`].
    pub fn open(index_dir: &Path) -> Result<Self> {
        let index = Index::open_in_dir(index_dir)?;
        Self::from_index(index)
    }

    fn build(index: Index, chunks: &[Chunk]) -> Result<Self> {
        register_tokenizer(&index);
        let schema = index.schema();
        let id_field = schema.get_field("chunk_id")?;
        let tokens_field = schema.get_field("tokens")?;
        let mut index_writer = index.writer::<TantivyDocument>(WRITER_HEAP_BYTES)?;
        for c in chunks {
            index_writer.add_document(doc!(
                id_field => c.chunk_id.clone(),
                tokens_field => tokenize(&c.text).join(" "),
            ))?;
        }
        index_writer.commit()?;
        info!(chunks = chunks.len(), "built tantivy lexical index");
        Self::from_index(index)
    }

    fn from_index(index: Index) -> Result<Self> {
        register_tokenizer(&index);
        let schema = index.schema();
        let id_field = schema.get_field("chunk_id")?;
        let tokens_field = schema.get_field("tokens")?;
        let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
        Ok(Self { index, reader, id_field, tokens_field })
    }

    fn build_query(&self, tokens: &[String]) -> BooleanQuery {
        let clauses: Vec<(Occur, Box<dyn Query>)> = tokens
            .iter()
            .map(|t| {
                let term = Term::from_field_text(self.tokens_field, t);
                (Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
            })
            .collect();
        BooleanQuery::new(clauses)
    }
}

impl LexicalIndex for TantivyLexicalIndex {
    fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<ChunkId>> {
        let tokens = tokenize(query);
        if tokens.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&self.build_query(&tokens), &TopDocs::with_limit(top_k))?;
        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            if score <= 0.0 { continue; }
            let doc: TantivyDocument = searcher.doc(addr)?;
            if let Some(id) = doc.get_first(self.id_field).and_then(|v| v.as_str()) {
                hits.push(id.to_string());
            }
        }
        debug!(query, hits = hits.len(), "tantivy lexical search");
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.reader.searcher().num_docs() as usize
    }
}

impl std::fmt::Debug for TantivyLexicalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivyLexicalIndex").field("schema", &self.index.schema()).finish()
    }
}
