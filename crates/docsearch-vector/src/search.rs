use std::sync::Arc;
use tracing::instrument;

use docsearch_core::config::DistanceMetric;
use docsearch_core::types::top_k_by_score;
use docsearch_core::{EmbedError, Embedder, Error, RankedResult, Result, SearchHit};

use crate::index::{normalize, EmbeddingIndex};

impl EmbeddingIndex {
    /// Exact nearest neighbours of `query`. Cosine scores are similarities in
    /// `[-1, 1]`; L2 scores are `1 / (1 + distance)`. Ties keep corpus order.
    pub fn search_vec(&self, query: &[f32], k: usize) -> Result<RankedResult> {
        if query.len() != self.dim {
            return Err(Error::provider(&self.fingerprint, EmbedError::DimensionMismatch { expected: self.dim, got: query.len() }));
        }
        if k == 0 || self.is_empty() { return Ok(Vec::new()); }
        let mut q = query.to_vec();
        if self.metric == DistanceMetric::Cosine { normalize(&mut q); }
        let scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, v)| {
                let score = match self.metric {
                    DistanceMetric::Cosine => v.iter().zip(&q).map(|(a, b)| a * b).sum::<f32>(),
                    DistanceMetric::L2 => 1.0 / (1.0 + v.iter().zip(&q).map(|(a, b)| (a - b) * (a - b)).sum::<f32>().sqrt()),
                };
                (i, score)
            })
            .collect();
        Ok(top_k_by_score(scored, k)
            .into_iter()
            .enumerate()
            .filter_map(|(rank, (order, score))| self.corpus.get(order).map(|chunk| SearchHit::vector(chunk.clone(), score, rank + 1)))
            .collect())
    }

    /// Embeds `text` with one provider call and searches for it.
    #[instrument(skip(self, embedder), fields(chunks = self.len()))]
    pub async fn query(&self, text: &str, embedder: &Arc<dyn Embedder>, k: usize) -> Result<RankedResult> {
        if k == 0 || self.is_empty() { return Ok(Vec::new()); }
        let provider = embedder.embedder_id().to_string();
        let embedder = Arc::clone(embedder);
        let text = text.to_string();
        let vector = tokio::task::spawn_blocking(move || embedder.embed_one(&text))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
            .map_err(|e| Error::provider(provider, e))?;
        self.search_vec(&vector, k)
    }
}
