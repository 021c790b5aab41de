use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{info, warn};

use docsearch_core::config::expand_path;
use docsearch_core::{EmbedError, Embedder, Error, Result};

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

const MAX_TOKENS: usize = 256;

/// BGE-M3 (XLM-RoBERTa) running locally through candle.
pub struct LocalModelEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    id: String,
    fingerprint: String,
}

fn load_err(msg: impl std::fmt::Display) -> Error { Error::provider("local", EmbedError::Provider(msg.to_string())) }

impl LocalModelEmbedder {
    pub fn new(model_dir: Option<&str>) -> Result<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir(model_dir)?;
        info!(dir = %model_dir.display(), "loading BGE-M3 model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| load_err(format!("failed to load tokenizer from {}: {e}", tokenizer_path.display())))?;
        let config_raw = std::fs::read_to_string(model_dir.join("config.json"))?;
        let config: XLMRobertaConfig = serde_json::from_str(&config_raw).map_err(load_err)?;
        let dim = serde_json::from_str::<serde_json::Value>(&config_raw)
            .ok()
            .and_then(|v| v.get("hidden_size").and_then(|h| h.as_u64()))
            .ok_or_else(|| load_err("config.json has no hidden_size"))? as usize;
        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin")).map_err(load_err)?;
        let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb).map_err(load_err)?;
        let name = model_dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "bge-m3".into());
        let id = format!("local:{name}:d{dim}");
        let fingerprint = model_fingerprint(&id, &model_dir, &config_raw);
        info!(dim, %fingerprint, "model loaded");
        Ok(Self { model, tokenizer, device, dim, id, fingerprint })
    }

    fn forward(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbedError> {
        let inputs = tokenize_batch(&self.tokenizer, texts, MAX_TOKENS, &self.device)?;
        let pooled = self
            .model
            .forward(&inputs.input_ids, &inputs.attention_mask, &inputs.token_type_ids, None, None, None)
            .and_then(|hidden| masked_mean_l2(&hidden, &inputs.attention_mask))
            .and_then(|emb| emb.to_device(&Device::Cpu)?.to_vec2::<f32>());
        pooled.map_err(|e| EmbedError::Provider(e.to_string()))
    }
}

impl Embedder for LocalModelEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn fingerprint(&self) -> String { self.fingerprint.clone() }

    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let vectors = self.forward(texts)?;
        if start.elapsed().as_millis() > 100 * texts.len() as u128 { warn!(batch = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "slow embedding"); }
        Ok(vectors)
    }
}

/// Configured directory first, then `APP_MODEL_DIR` / `MODEL_DIR`, then the
/// conventional `models/bge-m3` locations.
fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    let candidates = configured
        .map(expand_path)
        .into_iter()
        .chain(["APP_MODEL_DIR", "MODEL_DIR"].into_iter().filter_map(|var| std::env::var(var).ok()).map(expand_path))
        .chain([Path::new("../models/bge-m3").to_path_buf(), Path::new("models/bge-m3").to_path_buf()]);
    for dir in candidates {
        if dir.exists() { return Ok(dir); }
    }
    Err(Error::InvalidConfig("could not locate the BGE-M3 model directory; set embedding.model_dir or APP_MODEL_DIR".into()))
}

/// Identity of a loaded model: the full resolved directory plus a digest of
/// its `config.json`, so equally named directories never collide.
fn model_fingerprint(id: &str, model_dir: &Path, config_raw: &str) -> String {
    let dir = std::fs::canonicalize(model_dir).unwrap_or_else(|_| model_dir.to_path_buf());
    let digest = blake3::hash(config_raw.as_bytes()).to_hex();
    format!("{id}@{}#config:{}", dir.display(), &digest[..16])
}
