use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use docsearch_core::config::Settings;
use docsearch_core::{ingest, Corpus, Embedder, Error, RankedResult, RawDocument, RecursiveChunker, Result};
use docsearch_vector::BuildOptions;

use crate::cache::{BuiltIndexes, IndexCache};
use crate::fusion::{fuse, list_depth};

/// Fused ranking plus the per-method rankings it was computed from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResponse {
    pub fused: RankedResult,
    pub lexical: RankedResult,
    pub semantic: RankedResult,
}

pub struct HybridSearchEngine {
    embedder: Arc<dyn Embedder>,
    settings: Settings,
    chunker: RecursiveChunker,
    cache: Arc<IndexCache>,
    current: RwLock<Option<Arc<BuiltIndexes>>>,
}

impl HybridSearchEngine {
    pub fn new(embedder: Arc<dyn Embedder>, settings: Settings, cache: Arc<IndexCache>) -> Result<Self> {
        settings.retrieval.validate()?;
        settings.fusion.validate()?;
        let chunker = RecursiveChunker::new(settings.chunking)?;
        Ok(Self { embedder, settings, chunker, cache, current: RwLock::new(None) })
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn cache(&self) -> &Arc<IndexCache> { &self.cache }

    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }

    /// Chunks raw documents into a corpus without indexing it.
    pub fn ingest<I>(&self, documents: I) -> Corpus
    where
        I: IntoIterator<Item = RawDocument>,
    {
        ingest(documents, &self.chunker)
    }

    /// Makes `corpus` the searchable one, building its indexes unless cached.
    /// Cache entries for other corpora are evicted.
    pub async fn load_corpus(&self, corpus: Corpus) -> Result<Arc<BuiltIndexes>> {
        let options = BuildOptions::from_config(&self.settings.embedding, &self.settings.retrieval);
        let built = self.cache.get_or_build(&corpus, &self.embedder, options).await?;
        self.cache.retain(&built.key);
        *self.current.write() = Some(Arc::clone(&built));
        info!(chunks = built.corpus.len(), "corpus loaded");
        Ok(built)
    }

    pub async fn index_documents<I>(&self, documents: I) -> Result<Arc<BuiltIndexes>>
    where
        I: IntoIterator<Item = RawDocument>,
    {
        let corpus = self.ingest(documents);
        self.load_corpus(corpus).await
    }

    pub fn current(&self) -> Option<Arc<BuiltIndexes>> { self.current.read().clone() }

    /// Runs both retrievers concurrently and fuses their rankings into at most
    /// `k` hits. Fails with [`Error::EmptyCorpus`] when nothing is indexed.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, k: usize) -> Result<SearchResponse> {
        let built = match self.current() {
            Some(built) if !built.corpus.is_empty() => built,
            _ => return Err(Error::EmptyCorpus),
        };
        let retrieval = &self.settings.retrieval;
        let (lexical_k, semantic_k) = (list_depth(retrieval.lexical_k, k), list_depth(retrieval.semantic_k, k));

        let lexical_built = Arc::clone(&built);
        let lexical_query = query.to_string();
        let lexical = tokio::task::spawn_blocking(move || lexical_built.lexical.query(&lexical_query, lexical_k));
        let semantic = built.semantic.query(query, &self.embedder, semantic_k);
        let (lexical, semantic) = tokio::join!(lexical, semantic);
        let lexical = lexical.map_err(|e| Error::Task(e.to_string()))?;
        let semantic = semantic?;

        let fused = fuse(&lexical, &semantic, &self.settings.fusion, k);
        Ok(SearchResponse { fused, lexical, semantic })
    }
}
