//! Memoized index construction keyed by corpus content, embedder identity and
//! distance metric.
//!
//! Each key owns a `OnceCell`; concurrent callers for the same key await the
//! same build. A failed build drops its slot so the next call retries.
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use docsearch_core::config::{DistanceMetric, EmbeddingConfig};
use docsearch_core::{Corpus, Embedder, Error, Result};
use docsearch_text::LexicalIndex;
use docsearch_vector::{BuildOptions, EmbeddingIndex, EmbeddingMemo};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub content_hash: String,
    pub embedder_fingerprint: String,
    pub metric: DistanceMetric,
}

impl CacheKey {
    pub fn new(corpus: &Corpus, embedder: &dyn Embedder, metric: DistanceMetric) -> Self {
        Self { content_hash: corpus.content_hash(), embedder_fingerprint: embedder.fingerprint(), metric }
    }
}

/// Both indexes over one corpus, immutable and shared between queries.
#[derive(Debug)]
pub struct BuiltIndexes {
    pub key: CacheKey,
    pub corpus: Corpus,
    pub lexical: LexicalIndex,
    pub semantic: EmbeddingIndex,
}

type Slot = Arc<OnceCell<Arc<BuiltIndexes>>>;

#[derive(Debug, Default)]
pub struct IndexCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    memo: Option<Arc<EmbeddingMemo>>,
    builds: AtomicUsize,
}

impl IndexCache {
    pub fn new() -> Self { Self::default() }

    /// Also memoizes chunk vectors across corpora, so a changed corpus only
    /// embeds chunks that were not seen before with the same embedder.
    pub fn with_memo(memo: Arc<EmbeddingMemo>) -> Self { Self { memo: Some(memo), ..Self::default() } }

    /// A cache with a fresh memo when `embedding.memoize` is set.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        if config.memoize { Self::with_memo(Arc::new(EmbeddingMemo::new())) } else { Self::new() }
    }

    pub fn memo(&self) -> Option<&Arc<EmbeddingMemo>> { self.memo.as_ref() }

    /// Returns the indexes for `(corpus, embedder, metric)`, building them at most once.
    #[instrument(skip_all, fields(chunks = corpus.len(), embedder = embedder.embedder_id()))]
    pub async fn get_or_build(&self, corpus: &Corpus, embedder: &Arc<dyn Embedder>, options: BuildOptions) -> Result<Arc<BuiltIndexes>> {
        let key = CacheKey::new(corpus, embedder.as_ref(), options.metric);
        let slot = Arc::clone(self.slots.lock().entry(key.clone()).or_default());
        if let Some(built) = slot.get() {
            debug!(content_hash = %key.content_hash, "index cache hit");
            return Ok(Arc::clone(built));
        }
        match slot.get_or_try_init(|| self.build(key.clone(), corpus, embedder, options)).await {
            Ok(built) => {
                self.slots.lock().entry(key.clone()).or_insert_with(|| Arc::clone(&slot));
                Ok(Arc::clone(built))
            }
            Err(err) => {
                let mut slots = self.slots.lock();
                if slots.get(&key).is_some_and(|current| Arc::ptr_eq(current, &slot) && !current.initialized()) {
                    slots.remove(&key);
                }
                Err(err)
            }
        }
    }

    async fn build(&self, key: CacheKey, corpus: &Corpus, embedder: &Arc<dyn Embedder>, options: BuildOptions) -> Result<Arc<BuiltIndexes>> {
        info!(content_hash = %key.content_hash, chunks = corpus.len(), "building indexes");
        let lexical_corpus = corpus.clone();
        let lexical = tokio::task::spawn_blocking(move || LexicalIndex::build(&lexical_corpus));
        let semantic = EmbeddingIndex::build(corpus, Arc::clone(embedder), options, self.memo.as_deref());
        let (lexical, semantic) = tokio::join!(lexical, semantic);
        let lexical = lexical.map_err(|e| Error::Task(e.to_string()))?;
        let semantic = semantic?;
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(BuiltIndexes { key, corpus: corpus.clone(), lexical, semantic }))
    }

    /// Drops the entry for `key`. Returns whether a built entry was removed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.slots.lock().remove(key).is_some_and(|slot| slot.initialized())
    }

    /// Drops every entry except `key`.
    pub fn retain(&self, key: &CacheKey) {
        self.slots.lock().retain(|k, _| k == key);
    }

    pub fn clear(&self) { self.slots.lock().clear(); }

    /// Number of built entries.
    pub fn len(&self) -> usize { self.slots.lock().values().filter(|slot| slot.initialized()).count() }

    /// Number of slots held, including ones whose build is still running.
    pub fn slot_count(&self) -> usize { self.slots.lock().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn contains(&self, key: &CacheKey) -> bool { self.slots.lock().get(key).is_some_and(|slot| slot.initialized()) }

    /// Successful builds performed over the cache's lifetime.
    pub fn build_count(&self) -> usize { self.builds.load(Ordering::SeqCst) }
}
