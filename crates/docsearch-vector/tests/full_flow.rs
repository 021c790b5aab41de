use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use docsearch_core::config::DistanceMetric;
use docsearch_core::{ingest_texts, Corpus, EmbedError, Embedder, Error, RecursiveChunker, SourceKind};
use docsearch_embed::HashingEmbedder;
use docsearch_vector::{BuildOptions, EmbeddingIndex, EmbeddingMemo};

fn corpus(texts: &[&str]) -> Corpus { ingest_texts(texts.iter().copied(), &RecursiveChunker::default()) }

/// Embeds "item N" as the N-th unit vector. Batches holding low item numbers
/// finish last so completion order is the reverse of submission order.
struct OneHot {
    dim: usize,
    calls: AtomicUsize,
    texts_seen: AtomicUsize,
}

impl OneHot {
    fn new(dim: usize) -> Self { Self { dim, calls: AtomicUsize::new(0), texts_seen: AtomicUsize::new(0) } }

    fn item(text: &str) -> usize { text.trim_start_matches("item ").parse().unwrap_or(0) }
}

impl Embedder for OneHot {
    fn embedder_id(&self) -> &str { "one-hot" }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts_seen.fetch_add(texts.len(), Ordering::SeqCst);
        let first = texts.first().map(|t| Self::item(t)).unwrap_or(0);
        std::thread::sleep(Duration::from_millis(((self.dim - first) * 3) as u64));
        Ok(texts.iter().map(|t| { let mut v = vec![0.0; self.dim]; v[Self::item(t) % self.dim] = 1.0; v }).collect())
    }
}

struct Failing;

impl Embedder for Failing {
    fn embedder_id(&self) -> &str { "failing" }
    fn dim(&self) -> usize { 4 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.iter().any(|t| t.contains("poison")) { return Err(EmbedError::RateLimited("slow down".into())); }
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0, 0.0]).collect())
    }
}

struct Short;

impl Embedder for Short {
    fn embedder_id(&self) -> &str { "short" }
    fn dim(&self) -> usize { 4 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0, 0.0, 0.0]).collect())
    }
}

struct Dimensionless;

impl Embedder for Dimensionless {
    fn embedder_id(&self) -> &str { "dimensionless" }
    fn dim(&self) -> usize { 0 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> { Ok(texts.iter().map(|_| Vec::new()).collect()) }
}

fn items(n: usize) -> Vec<String> { (0..n).map(|i| format!("item {i}")).collect() }

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn vectors_follow_chunks_despite_completion_order() {
    let texts = items(12);
    let corpus = ingest_texts(texts.clone(), &RecursiveChunker::default());
    let embedder = Arc::new(OneHot::new(12));
    let options = BuildOptions { batch_size: 2, concurrency: 4, metric: DistanceMetric::Cosine };
    let index = EmbeddingIndex::build(&corpus, embedder.clone(), options, None).await.expect("build");
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 6);
    for i in 0..12 {
        let v = index.vector(i).expect("vector");
        assert_eq!(v[i], 1.0, "chunk {i} carries its own vector");
    }
    let hits = index.search_vec(&index.vector(7).expect("vector").to_vec(), 1).expect("search");
    assert_eq!(hits[0].chunk.text, "item 7");
}

#[tokio::test(flavor = "multi_thread")]
async fn cat_scenario_prefers_related_chunk() {
    let corpus = corpus(&["The cat sat on the mat.", "Quantum entanglement links particles."]);
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
    let index = EmbeddingIndex::build(&corpus, embedder.clone(), BuildOptions::default(), None).await.expect("build");
    let hits = index.query("cat", &embedder, 3).await.expect("query");
    assert_eq!(hits.len(), 2, "k larger than the corpus returns every chunk");
    assert_eq!(hits[0].source_order(), 0);
    assert_eq!(hits[0].source, SourceKind::Vector);
    assert_eq!(hits.iter().map(|h| h.semantic_rank).collect::<Vec<_>>(), vec![Some(1), Some(2)]);
    assert!(hits[0].score >= hits[1].score);
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_failure_fails_the_whole_build() {
    let corpus = corpus(&["fine", "also fine", "poison pill", "fine again"]);
    let options = BuildOptions { batch_size: 1, ..BuildOptions::default() };
    let memo = EmbeddingMemo::new();
    let err = EmbeddingIndex::build(&corpus, Arc::new(Failing), options, Some(&memo)).await.unwrap_err();
    match err {
        Error::EmbeddingProvider { provider, source } => {
            assert_eq!(provider, "failing");
            assert!(matches!(source, EmbedError::RateLimited(_)));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(memo.is_empty(), "nothing from a failed build is memoized");
}

#[tokio::test(flavor = "multi_thread")]
async fn count_and_dimension_mismatches_are_rejected() {
    let corpus = corpus(&["a", "b"]);
    let err = EmbeddingIndex::build(&corpus, Arc::new(Short), BuildOptions::default(), None).await.unwrap_err();
    assert!(matches!(err, Error::EmbeddingProvider { source: EmbedError::CountMismatch { expected: 2, got: 1 }, .. }), "{err:?}");

    let index = EmbeddingIndex::build(&corpus, Arc::new(Failing), BuildOptions::default(), None).await.expect("build");
    let err = index.search_vec(&[1.0, 0.0], 1).unwrap_err();
    assert!(matches!(err, Error::EmbeddingProvider { source: EmbedError::DimensionMismatch { expected: 4, got: 2 }, .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_dimension_embedder_is_rejected_at_build() {
    let err = EmbeddingIndex::build(&corpus(&["a", "b"]), Arc::new(Dimensionless), BuildOptions::default(), None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)), "{err:?}");

    let err = EmbeddingIndex::build(&Corpus::default(), Arc::new(Dimensionless), BuildOptions::default(), None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)), "empty corpus is rejected too: {err:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn memo_skips_already_embedded_chunks() {
    let memo = EmbeddingMemo::new();
    let embedder = Arc::new(OneHot::new(8));
    let first = ingest_texts(items(4), &RecursiveChunker::default());
    EmbeddingIndex::build(&first, embedder.clone(), BuildOptions::default(), Some(&memo)).await.expect("build");
    assert_eq!(embedder.texts_seen.load(Ordering::SeqCst), 4);
    assert_eq!(memo.len(), 4);

    let second = ingest_texts(items(6), &RecursiveChunker::default());
    let index = EmbeddingIndex::build(&second, embedder.clone(), BuildOptions::default(), Some(&memo)).await.expect("rebuild");
    assert_eq!(embedder.texts_seen.load(Ordering::SeqCst), 6, "only the two new chunks were embedded");
    assert_eq!(index.vector(5).expect("vector")[5], 1.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn ties_keep_corpus_order_and_l2_scores_are_bounded() {
    let corpus = corpus(&["same words", "different entirely", "same words"]);
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(32));
    let options = BuildOptions { metric: DistanceMetric::L2, ..BuildOptions::default() };
    let index = EmbeddingIndex::build(&corpus, embedder.clone(), options, None).await.expect("build");
    let hits = index.query("same words", &embedder, 3).await.expect("query");
    assert_eq!(hits.iter().map(|h| h.source_order()).collect::<Vec<_>>(), vec![0, 2, 1]);
    assert!((hits[0].score - 1.0).abs() < 1e-6, "identical vector has distance 0");
    assert!(hits.iter().all(|h| h.score > 0.0 && h.score <= 1.0));
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_corpus_builds_without_provider_calls() {
    let embedder = Arc::new(OneHot::new(4));
    let index = EmbeddingIndex::build(&Corpus::default(), embedder.clone(), BuildOptions::default(), None).await.expect("build");
    assert!(index.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}
