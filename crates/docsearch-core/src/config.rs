//! Layered configuration and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_FUSION__LEXICAL_WEIGHT=0.5`) into a
//! typed [`Settings`]. `OPENAI_API_KEY` is honoured as `embedding.api_key`.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Separator preference order for recursive splitting; the final fallback is a
/// hard character split.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_chars: 1000, overlap_chars: 200 }
    }
}

impl ChunkingConfig {
    pub fn new(max_chars: usize, overlap_chars: usize) -> Result<Self> {
        let config = Self { max_chars, overlap_chars };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(Error::InvalidConfig("chunking.max_chars must be greater than zero".into()));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap_chars ({}) must be smaller than chunking.max_chars ({})",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

/// Weighted reciprocal-rank fusion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub lexical_weight: f32,
    pub semantic_weight: f32,
    pub rrf_k: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self { lexical_weight: 0.3, semantic_weight: 0.7, rrf_k: 60.0 }
    }
}

impl FusionConfig {
    pub fn new(lexical_weight: f32, semantic_weight: f32) -> Result<Self> {
        let config = Self { lexical_weight, semantic_weight, ..Self::default() };
        config.validate()?;
        Ok(config)
    }

    pub fn with_rrf_k(mut self, rrf_k: f32) -> Result<Self> {
        self.rrf_k = rrf_k;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, w) in [("lexical_weight", self.lexical_weight), ("semantic_weight", self.semantic_weight)] {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidConfig(format!("fusion.{name} must be a finite non-negative number, got {w}")));
            }
        }
        if self.lexical_weight + self.semantic_weight <= 0.0 {
            return Err(Error::InvalidConfig("fusion weights must not both be zero".into()));
        }
        if !self.rrf_k.is_finite() || self.rrf_k < 0.0 {
            return Err(Error::InvalidConfig(format!("fusion.rrf_k must be a finite non-negative number, got {}", self.rrf_k)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    L2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Depth of the lexical list fed into fusion.
    pub lexical_k: usize,
    /// Depth of the semantic list fed into fusion.
    pub semantic_k: usize,
    /// Default number of fused results.
    pub top_k: usize,
    pub metric: DistanceMetric,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { lexical_k: 3, semantic_k: 3, top_k: 3, metric: DistanceMetric::Cosine }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lexical_k == 0 || self.semantic_k == 0 || self.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval depths must be greater than zero".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Hashing,
    OpenAi,
    Local,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    pub model: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    /// Vector dimension for providers that let the caller choose it.
    pub dim: Option<usize>,
    pub model_dir: Option<String>,
    pub batch_size: usize,
    pub concurrency: usize,
    pub timeout_secs: u64,
    /// Keep chunk vectors in memory so re-indexing a changed corpus only
    /// embeds new chunks.
    pub memoize: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Hashing,
            model: None,
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            dim: None,
            model_dir: None,
            batch_size: 64,
            concurrency: 4,
            timeout_secs: 30,
            memoize: true,
        }
    }
}

impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("dim", &self.dim)
            .field("model_dir", &self.model_dir)
            .field("batch_size", &self.batch_size)
            .field("concurrency", &self.concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .field("memoize", &self.memoize)
            .finish()
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.concurrency == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size and embedding.concurrency must be greater than zero".into()));
        }
        if self.dim == Some(0) {
            return Err(Error::InvalidConfig("embedding.dim must be greater than zero".into()));
        }
        if self.provider == ProviderKind::OpenAi && self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(Error::InvalidConfig("embedding.api_key is required for the openai provider (or set OPENAI_API_KEY)".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub raw_txt_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { raw_txt_dir: "./data/txt".to_string() }
    }
}

/// Fully resolved, validated settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub fusion: FusionConfig,
    pub embedding: EmbeddingConfig,
    pub data: DataConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.retrieval.validate()?;
        self.fusion.validate()?;
        self.embedding.validate()
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "embedding.api_key".into()))
            .merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    /// Wraps an explicit figment (tests, embedding hosts).
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self.figment.extract()?;
        settings.validate()?;
        Ok(settings)
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
