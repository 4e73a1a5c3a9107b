//! filings-vector
//!
//! Semantic (dense vector) indexes: an exact in-memory index and a
//! LanceDB-backed store persisted next to the chunk catalog.

pub mod flat;
pub mod schema;
pub mod store;

pub use flat::FlatVectorIndex;
pub use store::{LanceVectorIndex, LanceVectorStore};
