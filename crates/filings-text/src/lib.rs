//! filings-text
//!
//! Lexical retrieval: the shared tokenizer, an in-memory Okapi BM25 index and
//! a Tantivy-backed index over the same token stream.

pub mod bm25;
pub mod tantivy_utils;
pub mod tokenize;

pub use bm25::Bm25Index;
pub use tantivy_utils::TantivyLexicalIndex;
pub use tokenize::tokenize;
