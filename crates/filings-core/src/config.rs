//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_RETRIEVAL__TOP_K=20`). Data
//! paths go through [`expand_path`] so `~` and `${VAR}` work in them.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, env_name };
        config.validate_for_env()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// All typed settings; absent keys take their defaults.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self) -> anyhow::Result<()> {
        match self.env_name.as_str() {
            "prod" | "production" => {
                let settings = self.settings()?;
                if settings.models.embedding_model_dir.is_none() || settings.models.reranker_model_dir.is_none() {
                    anyhow::bail!("production requires models.embedding_model_dir and models.reranker_model_dir");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub bm25: Bm25Settings,
    pub chunking: ChunkingConfig,
    pub models: ModelSettings,
    pub data: DataSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.retrieval.validate()?;
        self.bm25.validate()?;
        self.chunking.validate()
    }
}

/// Sizes and constants of the hybrid retrieval pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Shortlist size requested from each source and kept after fusion.
    pub top_k: usize,
    /// Final number of chunks kept after reranking.
    pub top_m: usize,
    /// Reciprocal rank fusion dampening constant.
    pub rrf_k: u32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 10, top_m: 5, rrf_k: 60 }
    }
}

impl RetrievalSettings {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be positive".into()));
        }
        if self.top_m == 0 {
            return Err(Error::InvalidConfig("retrieval.top_m must be positive".into()));
        }
        if self.rrf_k == 0 {
            return Err(Error::InvalidConfig("retrieval.rrf_k must be positive".into()));
        }
        Ok(())
    }
}

/// Okapi BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Settings {
    /// Term frequency saturation.
    pub k1: f32,
    /// Document length normalization, in `[0, 1]`.
    pub b: f32,
    /// Floor for negative IDF values, as a fraction of the mean IDF.
    pub epsilon: f32,
}

impl Default for Bm25Settings {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75, epsilon: 0.25 }
    }
}

impl Bm25Settings {
    pub fn validate(&self) -> Result<()> {
        if self.k1.is_nan() || self.k1 < 0.0 {
            return Err(Error::InvalidConfig(format!("bm25.k1 must be non-negative, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::InvalidConfig(format!("bm25.b must be within [0, 1], got {}", self.b)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Directory with `config.json`, `tokenizer.json` and weights of the bi-encoder.
    pub embedding_model_dir: Option<String>,
    /// Directory with `config.json`, `tokenizer.json` and weights of the cross-encoder.
    pub reranker_model_dir: Option<String>,
    /// Token budget per encoded input.
    pub max_len: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self { embedding_model_dir: None, reranker_model_dir: None, max_len: 512 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub catalog_path: String,
    pub lancedb_dir: String,
    /// On-disk Tantivy index, the alternative lexical engine.
    pub tantivy_dir: String,
    pub table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            catalog_path: "data/processed/chunks.json".to_string(),
            lancedb_dir: "data/indexes/lancedb".to_string(),
            tantivy_dir: "data/indexes/tantivy".to_string(),
            table: "sec_10k_filings".to_string(),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.retrieval, RetrievalSettings { top_k: 10, top_m: 5, rrf_k: 60 });
        assert_eq!(s.bm25.k1, 1.5);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let mut r = RetrievalSettings::default();
        r.top_m = 0;
        assert!(r.validate().is_err());
        let r = RetrievalSettings { rrf_k: 0, ..RetrievalSettings::default() };
        assert!(r.validate().is_err());
    }

    #[test]
    fn bm25_bounds() {
        assert!(Bm25Settings { b: 1.2, ..Bm25Settings::default() }.validate().is_err());
        assert!(Bm25Settings { k1: -0.1, ..Bm25Settings::default() }.validate().is_err());
        assert!(Bm25Settings { k1: f32::NAN, ..Bm25Settings::default() }.validate().is_err());
    }

    #[test]
    fn expand_path_substitutes_env_vars() {
        std::env::set_var("FILINGS_CONFIG_TEST_ROOT", "/srv/filings");
        assert_eq!(expand_path("${FILINGS_CONFIG_TEST_ROOT}/chunks.json"), PathBuf::from("/srv/filings/chunks.json"));
        assert_eq!(expand_path("data/chunks.json"), PathBuf::from("data/chunks.json"));
    }
}
