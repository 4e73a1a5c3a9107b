//! In-memory Okapi BM25 over tokenized chunk texts.
//!
//! IDF is `ln((N - n + 0.5) / (n + 0.5))`; terms whose IDF comes out negative
//! (present in more than half the corpus) are floored at `epsilon * mean_idf`.

use std::collections::HashMap;

use filings_core::config::Bm25Settings;
use filings_core::traits::LexicalIndex;
use filings_core::{Chunk, ChunkId};
use tracing::debug;

use crate::tokenize::tokenize;

pub struct Bm25Index {
    ids: Vec<ChunkId>,
    doc_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<f32>,
    avgdl: f32,
    idf: HashMap<String, f32>,
    settings: Bm25Settings,
}

impl Bm25Index {
    pub fn new(chunks: &[Chunk], settings: Bm25Settings) -> Self {
        Self::from_texts(chunks.iter().map(|c| (c.chunk_id.clone(), c.text.as_str())), settings)
    }

    pub fn from_texts<'a, I>(docs: I, settings: Bm25Settings) -> Self
    where
        I: IntoIterator<Item = (ChunkId, &'a str)>,
    {
        let mut ids = Vec::new();
        let mut doc_freqs = Vec::new();
        let mut doc_lens = Vec::new();
        let mut containing: HashMap<String, u32> = HashMap::new();
        let mut total_len = 0usize;

        for (id, text) in docs {
            let tokens = tokenize(text);
            total_len += tokens.len();
            doc_lens.push(tokens.len() as f32);
            let mut freqs: HashMap<String, u32> = HashMap::new();
            for t in tokens {
                *freqs.entry(t).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *containing.entry(term.clone()).or_insert(0) += 1;
            }
            ids.push(id);
            doc_freqs.push(freqs);
        }

        let n = ids.len() as f32;
        let avgdl = if ids.is_empty() { 0.0 } else { total_len as f32 / n };
        let mut idf: HashMap<String, f32> = HashMap::with_capacity(containing.len());
        let mut idf_sum = 0.0f32;
        let mut negative = Vec::new();
        for (term, df) in containing {
            let df = df as f32;
            let value = ((n - df + 0.5) / (df + 0.5)).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term.clone());
            }
            idf.insert(term, value);
        }
        if !idf.is_empty() {
            let floor = settings.epsilon * idf_sum / idf.len() as f32;
            for term in negative {
                idf.insert(term, floor);
            }
        }
        debug!(docs = ids.len(), terms = idf.len(), avgdl, "built bm25 index");

        Self { ids, doc_freqs, doc_lens, avgdl, idf, settings }
    }

    /// Score of every indexed document against the query tokens, in corpus order.
    pub fn score(&self, query_tokens: &[String]) -> Vec<f32> {
        let Bm25Settings { k1, b, .. } = self.settings;
        let mut scores = vec![0.0f32; self.ids.len()];
        if self.avgdl == 0.0 {
            return scores;
        }
        for q in query_tokens {
            let Some(&idf) = self.idf.get(q) else { continue };
            for (i, freqs) in self.doc_freqs.iter().enumerate() {
                let tf = freqs.get(q).copied().unwrap_or(0) as f32;
                if tf == 0.0 { continue; }
                let norm = 1.0 - b + b * self.doc_lens[i] / self.avgdl;
                scores[i] += idf * (tf * (k1 + 1.0)) / (tf + k1 * norm);
            }
        }
        scores
    }

    pub fn ids(&self) -> &[ChunkId] {
        &self.ids
    }
}

impl LexicalIndex for Bm25Index {
    fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<ChunkId>> {
        let scores = self.score(&tokenize(query));
        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().filter(|&(_, s)| s > 0.0).collect();
        // stable: equal scores keep corpus order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_k);
        Ok(ranked.into_iter().map(|(i, _)| self.ids[i].clone()).collect())
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}
