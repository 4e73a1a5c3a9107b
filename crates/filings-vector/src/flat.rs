use anyhow::{anyhow, Result};
use tracing::debug;

use filings_core::traits::{Embedder, VectorIndex};
use filings_core::{Chunk, ChunkId};

const EMBED_BATCH: usize = 64;

/// Exact nearest-neighbour search by cosine similarity.
///
/// Vectors are L2-normalized on the way in, so similarity is a dot product.
#[derive(Debug, Clone)]
pub struct FlatVectorIndex {
    dim: usize,
    ids: Vec<ChunkId>,
    vectors: Vec<Vec<f32>>,
}

impl FlatVectorIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, ids: Vec::new(), vectors: Vec::new() }
    }

    /// Embed every chunk with `embedder` and index the result.
    ///
    /// The dimension is read after the first batch embeds, so a model that
    /// fails to load reports its own error rather than a zero-width index.
    pub fn build(embedder: &dyn Embedder, chunks: &[Chunk]) -> Result<Self> {
        let mut index: Option<Self> = None;
        for batch in chunks.chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = embedder.embed_batch(&texts)?;
            if embeddings.len() != batch.len() {
                return Err(anyhow!("embedder returned {} vectors for {} texts", embeddings.len(), batch.len()));
            }
            let index = index.get_or_insert_with(|| Self::new(embedder.dim()));
            for (chunk, vector) in batch.iter().zip(embeddings) {
                index.insert(chunk.chunk_id.clone(), vector)?;
            }
        }
        let index = index.unwrap_or_else(|| Self::new(embedder.dim()));
        debug!(vectors = index.ids.len(), dim = index.dim, "built flat vector index");
        Ok(index)
    }

    pub fn insert(&mut self, id: ChunkId, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(anyhow!("vector for '{}' has dim {}, index expects {}", id, vector.len(), self.dim));
        }
        self.ids.push(id);
        self.vectors.push(normalized(vector));
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

fn normalized(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v { *x /= norm; }
    }
    v
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl VectorIndex for FlatVectorIndex {
    fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<Vec<ChunkId>> {
        if self.ids.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(anyhow!("query has dim {}, index expects {}", query.len(), self.dim));
        }
        let q = normalized(query.to_vec());
        let mut scored: Vec<(usize, f32)> = self.vectors.iter().map(|v| dot(v, &q)).enumerate().collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        Ok(scored.into_iter().map(|(i, _)| self.ids[i].clone()).collect())
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_cosine() {
        let mut idx = FlatVectorIndex::new(2);
        idx.insert("east".into(), vec![1.0, 0.0]).unwrap();
        idx.insert("north".into(), vec![0.0, 5.0]).unwrap();
        idx.insert("northeast".into(), vec![3.0, 3.0]).unwrap();
        let hits = idx.nearest_neighbors(&[0.1, 1.0], 2).unwrap();
        assert_eq!(hits, vec!["north".to_string(), "northeast".to_string()]);
    }

    #[test]
    fn empty_index_and_zero_k() {
        let idx = FlatVectorIndex::new(3);
        assert!(idx.nearest_neighbors(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
        assert!(idx.is_empty());
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut idx = FlatVectorIndex::new(2);
        assert!(idx.insert("bad".into(), vec![1.0, 2.0, 3.0]).is_err());
        idx.insert("ok".into(), vec![1.0, 0.0]).unwrap();
        assert!(idx.nearest_neighbors(&[1.0], 1).is_err());
    }

    /// Reports dim 0 like a lazy model whose weights never loaded.
    struct UnloadableEmbedder;

    impl Embedder for UnloadableEmbedder {
        fn dim(&self) -> usize {
            0
        }
        fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(anyhow!("weights missing"))
        }
    }

    #[test]
    fn build_surfaces_the_embedder_error() {
        let chunks = vec![Chunk::with_id("c1", "revenue grew", "AAPL", 2023, "Item 7")];
        let err = FlatVectorIndex::build(&UnloadableEmbedder, &chunks).unwrap_err();
        assert!(err.to_string().contains("weights missing"));
    }
}
