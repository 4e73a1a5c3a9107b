//! Domain types shared by the lexical, semantic and hybrid engines.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type ChunkId = String;

/// Number of hex characters kept from the provenance digest.
const CHUNK_ID_LEN: usize = 12;

/// Which chunking method produced a chunk. Informational only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    #[default]
    Fixed,
    SectionAware,
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => f.write_str("fixed"),
            Self::SectionAware => f.write_str("section_aware"),
        }
    }
}

impl std::str::FromStr for ChunkStrategy {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(Self::Fixed),
            "section_aware" | "section-aware" => Ok(Self::SectionAware),
            other => Err(crate::error::Error::InvalidConfig(format!("unknown chunking strategy '{other}'"))),
        }
    }
}

/// A parsed section of a filing, the input of the chunker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub company: String,
    pub year: i32,
    /// Short item label, e.g. `Item 1A`.
    pub section: String,
    #[serde(default)]
    pub section_name: String,
    pub text: String,
}

/// An immutable unit of retrievable text plus its provenance.
///
/// - `chunk_id`: stable identifier, unique within one corpus snapshot
/// - `company`/`year`/`section`: where the text came from, used for citations
/// - `strategy`: the chunking method that produced it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    pub text: String,
    pub company: String,
    pub year: i32,
    pub section: String,
    #[serde(default)]
    pub strategy: ChunkStrategy,
}

impl Chunk {
    /// Build a chunk whose id is derived from provenance and a content hash.
    ///
    /// `position` is the ordinal of the chunk inside its section; it keeps ids
    /// distinct when a section repeats the same text.
    pub fn new(
        text: impl Into<String>,
        company: impl Into<String>,
        year: i32,
        section: impl Into<String>,
        position: usize,
        strategy: ChunkStrategy,
    ) -> Self {
        let text = text.into();
        let company = company.into();
        let section = section.into();
        let chunk_id = derive_chunk_id(&company, year, &section, position, &text);
        Self { chunk_id, text, company, year, section, strategy }
    }

    /// Build a chunk with a caller-supplied identifier.
    pub fn with_id(
        chunk_id: impl Into<ChunkId>,
        text: impl Into<String>,
        company: impl Into<String>,
        year: i32,
        section: impl Into<String>,
    ) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            text: text.into(),
            company: company.into(),
            year,
            section: section.into(),
            strategy: ChunkStrategy::default(),
        }
    }

    /// Citation label in the `COMPANY 10-K YEAR, SECTION` form.
    pub fn source_label(&self) -> String {
        format!("{} 10-K {}, {}", self.company, self.year, self.section)
    }
}

pub fn derive_chunk_id(company: &str, year: i32, section: &str, position: usize, text: &str) -> ChunkId {
    let content_hash = blake3::hash(text.as_bytes());
    let raw = format!("{company}-{year}-{section}-{position}-{}", content_hash.to_hex());
    let mut id = blake3::hash(raw.as_bytes()).to_hex().to_string();
    id.truncate(CHUNK_ID_LEN);
    id
}
