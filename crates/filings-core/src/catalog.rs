//! The chunk catalog: every chunk of one corpus snapshot, addressable by id.

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::types::{Chunk, ChunkId, ChunkStrategy};

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct ChunkCatalog {
    chunks: Vec<Chunk>,
    by_id: HashMap<ChunkId, usize>,
}

impl ChunkCatalog {
    /// Build a catalog, keeping the first chunk seen for each id.
    pub fn new(chunks: Vec<Chunk>) -> Self {
        let mut kept = Vec::with_capacity(chunks.len());
        let mut by_id = HashMap::with_capacity(chunks.len());
        let mut duplicates = 0usize;
        for chunk in chunks {
            if by_id.contains_key(&chunk.chunk_id) {
                duplicates += 1;
                continue;
            }
            by_id.insert(chunk.chunk_id.clone(), kept.len());
            kept.push(chunk);
        }
        if duplicates > 0 {
            warn!(duplicates, "dropped chunks with duplicate ids from catalog");
        }
        Self { chunks: kept, by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Chunk> {
        self.by_id.get(id).map(|&i| &self.chunks[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Borrowed id → chunk map for one retrieval call.
    pub fn lookup(&self) -> HashMap<&str, &Chunk> {
        self.chunks.iter().map(|c| (c.chunk_id.as_str(), c)).collect()
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let chunks: Vec<Chunk> = serde_json::from_str(&data)?;
        info!(path = %path.display(), chunks = chunks.len(), "loaded chunk catalog");
        Ok(Self::new(chunks))
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(&self.chunks)?)?;
        Ok(())
    }

    /// Write provenance and a short text preview of every chunk, for inspection.
    pub fn save_metadata(&self, path: &Path) -> Result<()> {
        let rows: Vec<ChunkMetadata<'_>> = self.chunks.iter().map(ChunkMetadata::from).collect();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&rows)?)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct ChunkMetadata<'a> {
    chunk_id: &'a str,
    company: &'a str,
    year: i32,
    section: &'a str,
    strategy: ChunkStrategy,
    text_preview: String,
}

impl<'a> From<&'a Chunk> for ChunkMetadata<'a> {
    fn from(c: &'a Chunk) -> Self {
        Self {
            chunk_id: &c.chunk_id,
            company: &c.company,
            year: c.year,
            section: &c.section,
            strategy: c.strategy,
            text_preview: c.text.chars().take(PREVIEW_CHARS).collect(),
        }
    }
}
