use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::Instant;

use candle_core::{Device, Tensor};
use candle_transformers::models::bert::BertModel;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use filings_core::traits::Embedder;

use crate::device::select_device;
use crate::model_files::{load_bert_config, load_tokenizer, load_weights};
use crate::pool::{cls_l2, masked_mean_l2};
use crate::tokenize::{batch_to_tensors, configure_truncation, pad_id};

/// How token states collapse into one sentence vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pooling {
    /// `[CLS]` state (BGE family).
    Cls,
    /// Mean over attended tokens.
    Mean,
}

const BATCH_SIZE: usize = 32;

/// BERT-family bi-encoder producing unit-length vectors.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    pad_id: u32,
    dim: usize,
    pooling: Pooling,
}

impl BertEmbedder {
    pub fn load(model_dir: &Path, max_len: usize, pooling: Pooling) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading embedding model");
        let mut tokenizer = load_tokenizer(model_dir)?;
        configure_truncation(&mut tokenizer, max_len)?;
        let config = load_bert_config(model_dir)?;
        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let pad_id = pad_id(&tokenizer);
        info!(dim = config.hidden_size, "embedding model loaded");
        Ok(Self { model, tokenizer, device, pad_id, dim: config.hidden_size, pooling })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let encodings = texts
            .iter()
            .map(|t| self.tokenizer.encode(t.as_str(), true))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let batch = batch_to_tensors(&encodings, self.pad_id, &self.device)?;
        let hidden: Tensor = self.model.forward(&batch.input_ids, &batch.type_ids, Some(&batch.attention_mask))?;
        let pooled = match self.pooling {
            Pooling::Cls => cls_l2(&hidden)?,
            Pooling::Mean => masked_mean_l2(&hidden, &batch.attention_mask)?,
        };
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        for v in &vectors {
            if v.len() != self.dim {
                return Err(anyhow!("embedding has dim {}, expected {}", v.len(), self.dim));
            }
        }
        Ok(vectors)
    }
}

impl Embedder for BertEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            out.extend(self.embed_chunk(chunk)?);
        }
        let elapsed = start.elapsed();
        debug!(texts = texts.len(), ms = elapsed.as_millis() as u64, "embedded batch");
        if texts.len() == 1 && elapsed.as_millis() > 100 { warn!(ms = elapsed.as_millis() as u64, "slow query embedding"); }
        Ok(out)
    }
}
