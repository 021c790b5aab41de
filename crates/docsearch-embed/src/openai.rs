//! OpenAI-compatible `/embeddings` client.
//!
//! The credential is sent only as a bearer header. Error messages are built
//! from status codes and response bodies, never from the request.
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use docsearch_core::config::EmbeddingConfig;
use docsearch_core::{EmbedError, Embedder, Error, Result};

pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_OPENAI_DIM: usize = 1536;

pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    /// Sent as `dimensions` only when explicitly configured.
    requested_dim: Option<usize>,
    dim: usize,
    id: String,
    key_digest: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Err(Error::InvalidConfig("embedding.api_key is required for the openai provider (or set OPENAI_API_KEY)".into())),
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::provider("openai", EmbedError::Network(e.to_string())))?;
        let model = config.model.clone().unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
        let dim = config.dim.unwrap_or(DEFAULT_OPENAI_DIM);
        let key_digest = blake3::hash(api_key.as_bytes()).to_hex()[..16].to_string();
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            id: format!("openai:{model}:d{dim}"),
            model,
            api_key,
            requested_dim: config.dim,
            dim,
            key_digest,
        })
    }

    fn map_status(status: StatusCode, body: String) -> EmbedError {
        let detail = format!("HTTP {}: {}", status.as_u16(), body.chars().take(300).collect::<String>());
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EmbedError::Auth(detail),
            StatusCode::TOO_MANY_REQUESTS => EmbedError::RateLimited(detail),
            _ => EmbedError::Provider(detail),
        }
    }
}

impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn fingerprint(&self) -> String { format!("{}@{}#key:{}", self.id, self.endpoint, self.key_digest) }

    fn dim(&self) -> usize { self.dim }

    #[instrument(skip_all, fields(model = %self.model, batch = texts.len()))]
    fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let request = EmbeddingRequest { model: &self.model, input: texts, dimensions: self.requested_dim };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| EmbedError::Network(e.without_url().to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Self::map_status(status, body));
        }
        let mut parsed: EmbeddingResponse = response.json().map_err(|e| EmbedError::MalformedResponse(e.without_url().to_string()))?;
        if parsed.data.len() != texts.len() {
            return Err(EmbedError::CountMismatch { expected: texts.len(), got: parsed.data.len() });
        }
        parsed.data.sort_by_key(|d| d.index);
        let mut vectors = Vec::with_capacity(parsed.data.len());
        for (position, item) in parsed.data.into_iter().enumerate() {
            if item.index != position {
                return Err(EmbedError::MalformedResponse(format!("missing embedding for input {position}")));
            }
            if item.embedding.len() != self.dim {
                return Err(EmbedError::DimensionMismatch { expected: self.dim, got: item.embedding.len() });
            }
            vectors.push(item.embedding);
        }
        debug!(vectors = vectors.len(), "received embeddings");
        Ok(vectors)
    }
}
