use anyhow::{anyhow, Result};
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use filings_core::traits::VectorIndex;
use filings_core::{Chunk, ChunkId};

use crate::schema::build_chunk_schema;

const INSERT_BATCH: usize = 1000;

/// Chunk vectors persisted in a LanceDB table, searched by cosine distance.
pub struct LanceVectorStore {
    db: Connection,
    table_name: String,
    dim: i32,
}

impl LanceVectorStore {
    pub async fn connect(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
        let dim = i32::try_from(dim).map_err(|_| anyhow!("embedding dim {} does not fit the vector column", dim))?;
        let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
        Ok(Self { db, table_name: table_name.to_string(), dim })
    }

    async fn table_exists(&self) -> Result<bool> {
        Ok(self.db.table_names().execute().await?.contains(&self.table_name))
    }

    pub async fn count(&self) -> Result<usize> {
        if !self.table_exists().await? {
            return Ok(0);
        }
        let table = self.db.open_table(&self.table_name).execute().await?;
        Ok(table.count_rows(None).await?)
    }

    /// Append `chunks` with their `embeddings` (same order, same length).
    pub async fn write_chunks(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        if chunks.is_empty() {
            info!("no chunks to write");
            return Ok(0);
        }
        if chunks.len() != embeddings.len() {
            return Err(anyhow!("{} chunks but {} embeddings", chunks.len(), embeddings.len()));
        }
        info!(chunks = chunks.len(), table = %self.table_name, "writing chunk vectors");
        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
            .progress_chars("#>-"));
        let mut written = 0usize;
        for (batch_chunks, batch_vectors) in chunks.chunks(INSERT_BATCH).zip(embeddings.chunks(INSERT_BATCH)) {
            self.insert_batch(batch_chunks, batch_vectors).await?;
            written += batch_chunks.len();
            pb.set_position(written as u64);
        }
        pb.finish_with_message("done");
        info!(written, "vector table updated");
        Ok(written)
    }

    async fn insert_batch(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
        let record_batch = self.to_record_batch(chunks, vectors)?;
        let schema = record_batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
        if self.table_exists().await? {
            self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
        } else {
            self.db.create_table(&self.table_name, reader).execute().await?;
        }
        Ok(())
    }

    fn to_record_batch(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<RecordBatch> {
        for (chunk, v) in chunks.iter().zip(vectors) {
            if v.len() != self.dim as usize {
                return Err(anyhow!("vector for '{}' has dim {}, table expects {}", chunk.chunk_id, v.len(), self.dim));
            }
        }
        let vectors = vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
        let batch = RecordBatch::try_new(build_chunk_schema(self.dim), vec![
            Arc::new(string_column(chunks, |c| c.chunk_id.as_str())),
            Arc::new(string_column(chunks, |c| c.company.as_str())),
            Arc::new(Int32Array::from(chunks.iter().map(|c| c.year).collect::<Vec<_>>())),
            Arc::new(string_column(chunks, |c| c.section.as_str())),
            Arc::new(string_column(chunks, |c| c.text.as_str())),
            Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, self.dim)),
        ])?;
        Ok(batch)
    }

    /// Top `k` chunk ids with cosine similarity (1 - distance), best first.
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<(ChunkId, f32)>> {
        let table = self.db.open_table(&self.table_name).execute().await?;
        let mut stream = table
            .vector_search(query.to_vec())?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await?;
        let mut hits = Vec::new();
        while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
            let ids = batch
                .column_by_name("chunk_id")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| anyhow!("chunk_id column missing from search results"))?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| anyhow!("_distance column missing from search results"))?;
            for i in 0..batch.num_rows() {
                let distance = if distances.is_null(i) { f32::INFINITY } else { distances.value(i) };
                hits.push((ids.value(i).to_string(), 1.0 - distance));
            }
        }
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits.truncate(k);
        debug!(hits = hits.len(), "lance vector search");
        Ok(hits)
    }
}

fn string_column<F>(chunks: &[Chunk], field: F) -> StringArray
where
    F: Fn(&Chunk) -> &str,
{
    StringArray::from(chunks.iter().map(field).collect::<Vec<_>>())
}

/// Blocking [`VectorIndex`] over a [`LanceVectorStore`].
///
/// Owns its runtime, so it must not be used from inside another tokio runtime.
pub struct LanceVectorIndex {
    runtime: tokio::runtime::Runtime,
    store: LanceVectorStore,
    rows: usize,
}

impl LanceVectorIndex {
    pub fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let store = runtime.block_on(LanceVectorStore::connect(db_path, table_name, dim))?;
        let rows = runtime.block_on(store.count())?;
        debug!(rows, table = table_name, "opened lance vector index");
        Ok(Self { runtime, store, rows })
    }

    pub fn write_chunks(&mut self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        let written = self.runtime.block_on(self.store.write_chunks(chunks, embeddings))?;
        self.rows = self.runtime.block_on(self.store.count())?;
        Ok(written)
    }
}

impl VectorIndex for LanceVectorIndex {
    fn nearest_neighbors(&self, query: &[f32], k: usize) -> Result<Vec<ChunkId>> {
        if self.rows == 0 || k == 0 {
            return Ok(Vec::new());
        }
        let hits = self.runtime.block_on(self.store.search(query, k))?;
        Ok(hits.into_iter().map(|(id, _)| id).collect())
    }

    fn len(&self) -> usize {
        self.rows
    }
}
