//! filings-core
//!
//! Shared data model, error types, collaborator traits, configuration and
//! chunking for the filings retrieval workspace.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod catalog;
pub mod chunker;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use catalog::ChunkCatalog;
pub use error::{Error, Result};
pub use types::{Chunk, ChunkId, ChunkStrategy, Section};
