use candle_core::{DType, Device, Tensor};
use tokenizers::Tokenizer;

use docsearch_core::EmbedError;

/// XLM-RoBERTa `<pad>` id.
pub const PAD_ID: u32 = 1;

pub struct BatchInputs {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

/// Tokenizes `texts` into `[B, T]` tensors, truncating to `max_len` and padding
/// to the longest row.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<BatchInputs, EmbedError> {
    let mut rows: Vec<(Vec<u32>, Vec<u32>)> = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| EmbedError::Provider(format!("tokenization failed: {e}")))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        ids.truncate(max_len);
        mask.truncate(max_len);
        rows.push((ids, mask));
    }
    let width = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut flat_ids = Vec::with_capacity(rows.len() * width);
    let mut flat_mask = Vec::with_capacity(rows.len() * width);
    for (mut ids, mut mask) in rows {
        ids.resize(width, PAD_ID);
        mask.resize(width, 0);
        flat_ids.extend(ids);
        flat_mask.extend(mask);
    }
    let shape = (texts.len(), width);
    let to_err = |e: candle_core::Error| EmbedError::Provider(e.to_string());
    Ok(BatchInputs {
        input_ids: Tensor::from_vec(flat_ids, shape, device).map_err(to_err)?,
        attention_mask: Tensor::from_vec(flat_mask, shape, device).map_err(to_err)?,
        token_type_ids: Tensor::zeros(shape, DType::I64, device).map_err(to_err)?,
    })
}
