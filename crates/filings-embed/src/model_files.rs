//! Locating and loading local transformer checkpoints.
//!
//! A model directory holds `config.json`, `tokenizer.json` and either
//! `model.safetensors` or `pytorch_model.bin`.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::Config as BertConfig;
use tokenizers::Tokenizer;
use tracing::info;

use filings_core::config::expand_path;

/// First existing directory among: the configured one, `$env_var`, `models/<default_name>`.
pub fn resolve_model_dir(configured: Option<&str>, env_var: &str, default_name: &str) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { info!(dir = %p.display(), "using configured model dir"); return Ok(p); }
    }
    if let Ok(dir) = std::env::var(env_var) {
        let p = expand_path(&dir);
        if p.exists() { info!(dir = %p.display(), "using {}", env_var); return Ok(p); }
    }
    let fallback = Path::new("models").join(default_name);
    if fallback.exists() { info!(dir = %fallback.display(), "using default model dir"); return Ok(fallback); }
    Err(anyhow!("Could not locate model directory for {} (set {} or models.*_model_dir)", default_name, env_var))
}

pub fn load_tokenizer(model_dir: &Path) -> Result<Tokenizer> {
    let tokenizer_path = model_dir.join("tokenizer.json");
    Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))
}

pub fn load_bert_config(model_dir: &Path) -> Result<BertConfig> {
    let config_path = model_dir.join("config.json");
    let raw = std::fs::read_to_string(&config_path)
        .map_err(|e| anyhow!("Failed to read {}: {}", config_path.display(), e))?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the weights file is treated as read-only for the process lifetime.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle)?;
        let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
        return Ok(VarBuilder::from_tensors(weights_map, DType::F32, device));
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}
