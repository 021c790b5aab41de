use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use docsearch_core::config::{DistanceMetric, EmbeddingConfig, RetrievalConfig};
use docsearch_core::{Corpus, EmbedError, Embedder, Error, Result};

use crate::cache::{hash_content, CacheEntry, EmbeddingMemo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub batch_size: usize,
    /// Maximum number of provider batches in flight.
    pub concurrency: usize,
    pub metric: DistanceMetric,
}

impl Default for BuildOptions {
    fn default() -> Self { Self { batch_size: 64, concurrency: 4, metric: DistanceMetric::Cosine } }
}

impl BuildOptions {
    pub fn from_config(embedding: &EmbeddingConfig, retrieval: &RetrievalConfig) -> Self {
        Self { batch_size: embedding.batch_size.max(1), concurrency: embedding.concurrency.max(1), metric: retrieval.metric }
    }
}

/// One dense vector per chunk of a [`Corpus`], searched exhaustively.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    pub(crate) corpus: Corpus,
    /// Row-major, `corpus.len() * dim`. Unit length under cosine.
    pub(crate) vectors: Vec<f32>,
    pub(crate) dim: usize,
    pub(crate) metric: DistanceMetric,
    pub(crate) fingerprint: String,
}

impl EmbeddingIndex {
    /// Embeds every chunk and assembles the index. Fails as a whole if any
    /// provider batch fails; vectors are always matched to chunks by batch
    /// position, never by completion order.
    #[instrument(skip_all, fields(chunks = corpus.len(), embedder = embedder.embedder_id()))]
    pub async fn build(corpus: &Corpus, embedder: Arc<dyn Embedder>, options: BuildOptions, memo: Option<&EmbeddingMemo>) -> Result<Self> {
        let dim = embedder.dim();
        let fingerprint = embedder.fingerprint();
        let provider = embedder.embedder_id().to_string();
        if dim == 0 {
            return Err(Error::InvalidConfig(format!("embedder '{provider}' reports a zero vector dimension")));
        }
        let hashes: Vec<String> = corpus.iter().map(|c| hash_content(&c.text)).collect();
        let mut slots: Vec<Option<Vec<f32>>> = match memo {
            Some(m) => m.get_many(&fingerprint, &hashes),
            None => vec![None; corpus.len()],
        };
        let misses: Vec<usize> = slots.iter().enumerate().filter(|(_, v)| v.is_none()).map(|(i, _)| i).collect();
        let memo_hits = corpus.len() - misses.len();

        let batches: Vec<Vec<usize>> = misses.chunks(options.batch_size.max(1)).map(<[usize]>::to_vec).collect();
        let batch_count = batches.len();
        let mut results = stream::iter(batches.into_iter().map(|positions| {
            let embedder = Arc::clone(&embedder);
            let texts: Vec<String> = positions.iter().map(|&i| corpus[i].text.clone()).collect();
            async move {
                let joined = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts)).await;
                (positions, joined)
            }
        }))
        .buffered(options.concurrency.max(1));

        while let Some((positions, joined)) = results.next().await {
            let vectors = joined.map_err(|e| Error::Task(e.to_string()))?.map_err(|e| Error::provider(&provider, e))?;
            if vectors.len() != positions.len() {
                return Err(Error::provider(&provider, EmbedError::CountMismatch { expected: positions.len(), got: vectors.len() }));
            }
            for (position, vector) in positions.into_iter().zip(vectors) {
                if vector.len() != dim {
                    return Err(Error::provider(&provider, EmbedError::DimensionMismatch { expected: dim, got: vector.len() }));
                }
                slots[position] = Some(vector);
            }
        }
        drop(results);

        if let Some(m) = memo {
            m.put_many(&fingerprint, misses.iter().filter_map(|&i| slots[i].clone().map(|vector| CacheEntry { content_hash: hashes[i].clone(), vector })));
        }

        let mut vectors = Vec::with_capacity(corpus.len() * dim);
        for (i, slot) in slots.into_iter().enumerate() {
            let mut v = slot.ok_or_else(|| Error::provider(&provider, EmbedError::MalformedResponse(format!("no vector for chunk {i}"))))?;
            if options.metric == DistanceMetric::Cosine { normalize(&mut v); }
            vectors.extend(v);
        }
        debug!(batches = batch_count, memo_hits, "embedding batches complete");
        info!(chunks = corpus.len(), dim, embedded = misses.len(), memo_hits, "built embedding index");
        Ok(Self { corpus: corpus.clone(), vectors, dim, metric: options.metric, fingerprint })
    }

    pub fn len(&self) -> usize { self.corpus.len() }

    pub fn is_empty(&self) -> bool { self.corpus.is_empty() }

    pub fn dim(&self) -> usize { self.dim }

    pub fn metric(&self) -> DistanceMetric { self.metric }

    pub fn corpus(&self) -> &Corpus { &self.corpus }

    /// Fingerprint of the embedder the index was built with.
    pub fn fingerprint(&self) -> &str { &self.fingerprint }

    pub fn vector(&self, source_order: usize) -> Option<&[f32]> {
        let start = source_order.checked_mul(self.dim)?;
        self.vectors.get(start..start + self.dim)
    }
}

pub(crate) fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 { for x in v.iter_mut() { *x /= norm; } }
}
