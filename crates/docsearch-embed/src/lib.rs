//! docsearch-embed
//!
//! Embedding providers behind [`docsearch_core::Embedder`]: a deterministic
//! feature-hashing embedder, an OpenAI-compatible HTTP client and a local
//! BGE-M3 model on candle.
pub mod device;
pub mod hashing;
pub mod local;
pub mod openai;
pub mod pool;
pub mod tokenize;

use std::sync::Arc;
use tracing::info;

use docsearch_core::config::ProviderKind;
use docsearch_core::{Embedder, Result, Settings};

pub use hashing::HashingEmbedder;
pub use local::LocalModelEmbedder;
pub use openai::OpenAiEmbedder;
pub use pool::masked_mean_l2;

/// Builds the provider selected by `embedding.provider`.
///
/// The OpenAI client is blocking; construct it outside of an async context.
pub fn embedder_from_settings(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let config = &settings.embedding;
    config.validate()?;
    let embedder: Arc<dyn Embedder> = match config.provider {
        ProviderKind::Hashing => Arc::new(HashingEmbedder::new(config.dim.unwrap_or(hashing::DEFAULT_HASHING_DIM))),
        ProviderKind::OpenAi => Arc::new(OpenAiEmbedder::from_config(config)?),
        ProviderKind::Local => Arc::new(LocalModelEmbedder::new(config.model_dir.as_deref())?),
    };
    info!(embedder = embedder.embedder_id(), "embedding provider ready");
    Ok(embedder)
}
