use std::collections::HashMap;
use tantivy::tokenizer::TextAnalyzer;
use tracing::{info, instrument};

use docsearch_core::Corpus;

use crate::tokenizer::{build_analyzer, tokenize};

/// Okapi BM25 free parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
	pub k1: f32,
	pub b: f32,
}

impl Bm25Params {
	pub const K1: f32 = 1.5;
	pub const B: f32 = 0.75;
}

impl Default for Bm25Params {
	fn default() -> Self { Self { k1: Self::K1, b: Self::B } }
}

/// In-memory BM25 index over the chunks of one [`Corpus`]. Read-only after
/// [`LexicalIndex::build`].
#[derive(Clone)]
pub struct LexicalIndex {
	pub(crate) corpus: Corpus,
	/// term -> (source_order, term frequency)
	pub(crate) postings: HashMap<String, Vec<(usize, u32)>>,
	pub(crate) doc_lens: Vec<u32>,
	pub(crate) avg_len: f32,
	pub(crate) params: Bm25Params,
	pub(crate) analyzer: TextAnalyzer,
}

impl LexicalIndex {
	#[instrument(skip_all, fields(chunks = corpus.len()))]
	pub fn build(corpus: &Corpus) -> Self { Self::with_params(corpus, Bm25Params::default()) }

	pub fn with_params(corpus: &Corpus, params: Bm25Params) -> Self {
		let mut analyzer = build_analyzer();
		let mut postings: HashMap<String, Vec<(usize, u32)>> = HashMap::new();
		let mut doc_lens = Vec::with_capacity(corpus.len());
		for chunk in corpus.iter() {
			let terms = tokenize(&mut analyzer, &chunk.text);
			doc_lens.push(terms.len() as u32);
			let mut tf: HashMap<String, u32> = HashMap::new();
			for term in terms { *tf.entry(term).or_default() += 1; }
			for (term, freq) in tf { postings.entry(term).or_default().push((chunk.source_order, freq)); }
		}
		// Postings are filled in corpus order; keep them sorted for stable scoring.
		for list in postings.values_mut() { list.sort_unstable_by_key(|(doc, _)| *doc); }
		let total: u64 = doc_lens.iter().map(|&l| u64::from(l)).sum();
		let avg_len = if doc_lens.is_empty() { 0.0 } else { total as f32 / doc_lens.len() as f32 };
		info!(chunks = corpus.len(), terms = postings.len(), avg_len, "built lexical index");
		Self { corpus: corpus.clone(), postings, doc_lens, avg_len, params, analyzer }
	}

	pub fn len(&self) -> usize { self.doc_lens.len() }

	pub fn is_empty(&self) -> bool { self.doc_lens.is_empty() }

	pub fn corpus(&self) -> &Corpus { &self.corpus }

	pub fn params(&self) -> Bm25Params { self.params }

	/// Number of chunks containing `term` (already normalized).
	pub fn doc_freq(&self, term: &str) -> usize { self.postings.get(term).map_or(0, Vec::len) }

	pub(crate) fn idf(&self, doc_freq: usize) -> f32 {
		let n = self.doc_lens.len() as f32;
		let df = doc_freq as f32;
		(1.0 + (n - df + 0.5) / (df + 0.5)).ln()
	}
}

impl std::fmt::Debug for LexicalIndex {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LexicalIndex")
			.field("chunks", &self.doc_lens.len())
			.field("terms", &self.postings.len())
			.field("avg_len", &self.avg_len)
			.field("params", &self.params)
			.finish()
	}
}
