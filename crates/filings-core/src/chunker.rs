//! Splits parsed filing sections into retrievable chunks.
//!
//! Word counts (whitespace split) stand in for model token counts.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkStrategy, Section};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub strategy: ChunkStrategy,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 512, overlap: 50, strategy: ChunkStrategy::Fixed }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be positive".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Where a chunk's text came from.
#[derive(Debug, Clone, Copy)]
pub struct Provenance<'a> {
    pub company: &'a str,
    pub year: i32,
    pub section: &'a str,
}

impl<'a> From<&'a Section> for Provenance<'a> {
    fn from(s: &'a Section) -> Self {
        Self { company: &s.company, year: s.year, section: &s.section }
    }
}

#[derive(Debug, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn chunk_sections(&self, sections: &[Section]) -> Vec<Chunk> {
        let mut all_chunks = Vec::new();
        for (i, section) in sections.iter().enumerate() {
            let chunks = match self.config.strategy {
                ChunkStrategy::Fixed => chunk_fixed(&section.text, self.config.chunk_size, self.config.overlap, section.into()),
                ChunkStrategy::SectionAware => chunk_section_aware(&section.text, self.config.chunk_size, section.into()),
            };
            debug!(company = %section.company, year = section.year, section = %section.section, chunks = chunks.len(), "chunked section {}/{}", i + 1, sections.len());
            all_chunks.extend(chunks);
        }
        info!(sections = sections.len(), chunks = all_chunks.len(), strategy = %self.config.strategy, "chunking complete");
        all_chunks
    }
}

/// Fixed windows of `chunk_size` words advancing by `chunk_size - overlap`.
///
/// A text that already fits is returned verbatim as a single chunk.
pub fn chunk_fixed(text: &str, chunk_size: usize, overlap: usize, provenance: Provenance<'_>) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for (position, window) in fixed_windows(text, chunk_size, overlap).into_iter().enumerate() {
        chunks.push(Chunk::new(window, provenance.company, provenance.year, provenance.section, position, ChunkStrategy::Fixed));
    }
    chunks
}

fn fixed_windows(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= chunk_size {
        return vec![text.to_string()];
    }
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        windows.push(words[start..end].join(" "));
        if end >= words.len() { break; }
        start += step;
    }
    windows
}

/// Merge blank-line separated paragraphs up to `chunk_size` words without
/// splitting a paragraph, unless the paragraph alone exceeds `chunk_size`.
pub fn chunk_section_aware(text: &str, chunk_size: usize, provenance: Provenance<'_>) -> Vec<Chunk> {
    const OVERSIZED_OVERLAP: usize = 50;

    let paragraphs: Vec<&str> = text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()).collect();
    let mut texts: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for paragraph in paragraphs {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if !current.is_empty() && current.len() + words.len() > chunk_size {
            texts.push(current.join(" "));
            current.clear();
        }
        if words.len() > chunk_size {
            if !current.is_empty() {
                texts.push(current.join(" "));
                current.clear();
            }
            texts.extend(fixed_windows(paragraph, chunk_size, OVERSIZED_OVERLAP.min(chunk_size.saturating_sub(1))));
        } else {
            current.extend(words);
        }
    }
    if !current.is_empty() {
        texts.push(current.join(" "));
    }

    texts
        .into_iter()
        .enumerate()
        .map(|(position, t)| Chunk::new(t, provenance.company, provenance.year, provenance.section, position, ChunkStrategy::SectionAware))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prov() -> Provenance<'static> {
        Provenance { company: "ACME", year: 2024, section: "Item 7" }
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn fixed_short_text_is_one_chunk() {
        let chunks = chunk_fixed("Revenue increased  15%.", 512, 50, prov());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Revenue increased  15%.");
        assert_eq!(chunks[0].strategy, ChunkStrategy::Fixed);
    }

    #[test]
    fn fixed_windows_overlap() {
        let chunks = chunk_fixed(&words(25), 10, 2, prov());
        // starts at 0, 8, 16; the third window reaches the last word
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].text.starts_with("w0 "));
        assert!(chunks[1].text.starts_with("w8 "));
        assert!(chunks[2].text.ends_with("w24"));
        let ids: std::collections::HashSet<_> = chunks.iter().map(|c| c.chunk_id.clone()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn section_aware_merges_small_paragraphs() {
        let text = "alpha beta gamma\n\ndelta epsilon\n\n\n\nzeta";
        let chunks = chunk_section_aware(text, 512, prov());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "alpha beta gamma delta epsilon zeta");
        assert_eq!(chunks[0].strategy, ChunkStrategy::SectionAware);
    }

    #[test]
    fn section_aware_flushes_at_limit_and_splits_oversized() {
        let text = format!("{}\n\n{}\n\n{}", words(6), words(6), words(25));
        let chunks = chunk_section_aware(&text, 10, prov());
        // 6 | 6 | oversized 25 split into fixed windows (overlap clamped to 9 → step 1)
        assert_eq!(chunks[0].text.split_whitespace().count(), 6);
        assert_eq!(chunks[1].text.split_whitespace().count(), 6);
        assert!(chunks.len() > 3);
        assert!(chunks.iter().all(|c| c.strategy == ChunkStrategy::SectionAware));
    }

    #[test]
    fn section_aware_empty_text() {
        assert!(chunk_section_aware("  \n\n ", 512, prov()).is_empty());
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        assert!(Chunker::new(ChunkingConfig { chunk_size: 10, overlap: 10, strategy: ChunkStrategy::Fixed }).is_err());
    }
}
