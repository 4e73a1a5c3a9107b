//! Cross-encoder relevance model: BERT over the `[CLS] query [SEP] passage [SEP]`
//! pair, tanh pooler on the first token, one-logit classifier head.

use anyhow::{anyhow, Result};
use std::path::Path;

use candle_core::{Device, Tensor};
use candle_nn::{linear, Linear, Module};
use candle_transformers::models::bert::BertModel;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use filings_core::traits::RelevanceScorer;

use crate::device::select_device;
use crate::model_files::{load_bert_config, load_tokenizer, load_weights};
use crate::tokenize::{batch_to_tensors, configure_truncation, pad_id};

const BATCH_SIZE: usize = 16;

pub struct CrossEncoder {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    pad_id: u32,
}

impl CrossEncoder {
    /// Load a `BertForSequenceClassification` checkpoint with a single label.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading cross-encoder");
        let mut tokenizer = load_tokenizer(model_dir)?;
        configure_truncation(&mut tokenizer, max_len)?;
        let config = load_bert_config(model_dir)?;
        let vb = load_weights(model_dir, &device)?;
        let hidden = config.hidden_size;
        let bert = BertModel::load(vb.pp("bert"), &config)?;
        let pooler = linear(hidden, hidden, vb.pp("bert").pp("pooler").pp("dense"))?;
        let classifier = linear(hidden, 1, vb.pp("classifier"))?;
        let pad_id = pad_id(&tokenizer);
        info!("cross-encoder loaded");
        Ok(Self { bert, pooler, classifier, tokenizer, device, pad_id })
    }

    fn score_chunk(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>> {
        let encodings = texts
            .iter()
            .map(|t| self.tokenizer.encode((query, *t), true))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let batch = batch_to_tensors(&encodings, self.pad_id, &self.device)?;
        let hidden: Tensor = self.bert.forward(&batch.input_ids, &batch.type_ids, Some(&batch.attention_mask))?;
        let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?.squeeze(1)?;
        Ok(logits.to_device(&Device::Cpu)?.to_vec1::<f32>()?)
    }
}

impl RelevanceScorer for CrossEncoder {
    fn score_pairs(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            scores.extend(self.score_chunk(query, chunk)?);
        }
        debug!(pairs = texts.len(), "cross-encoder scored pairs");
        Ok(scores)
    }
}
