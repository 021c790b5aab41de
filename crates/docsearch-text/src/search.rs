use tracing::{debug, instrument};

use docsearch_core::types::top_k_by_score;
use docsearch_core::{RankedResult, SearchHit};

use crate::index::LexicalIndex;
use crate::tokenizer::tokenize;

impl LexicalIndex {
	/// Scores every chunk against `text` and returns the top `k` with a nonzero
	/// score, highest first, ties in corpus order. Repeated query terms count
	/// once per occurrence.
	#[instrument(skip(self), fields(chunks = self.len()))]
	pub fn query(&self, text: &str, k: usize) -> RankedResult {
		if k == 0 || self.is_empty() { return Vec::new(); }
		let mut analyzer = self.analyzer.clone();
		let terms = tokenize(&mut analyzer, text);
		let scores = self.score_terms(&terms);
		let scored: Vec<(usize, f32)> = scores.into_iter().enumerate().filter(|(_, s)| *s > 0.0).collect();
		debug!(terms = terms.len(), matched = scored.len(), "lexical query scored");
		top_k_by_score(scored, k)
			.into_iter()
			.enumerate()
			.filter_map(|(rank, (order, score))| self.corpus.get(order).map(|chunk| SearchHit::text(chunk.clone(), score, rank + 1)))
			.collect()
	}

	/// Raw BM25 score of every chunk, indexed by source order.
	pub fn score_terms(&self, terms: &[String]) -> Vec<f32> {
		let mut scores = vec![0.0f32; self.len()];
		let (k1, b) = (self.params.k1, self.params.b);
		for term in terms {
			let Some(postings) = self.postings.get(term) else { continue };
			let idf = self.idf(postings.len());
			for &(doc, tf) in postings {
				let tf = tf as f32;
				let len_ratio = if self.avg_len > 0.0 { self.doc_lens[doc] as f32 / self.avg_len } else { 1.0 };
				scores[doc] += idf * tf * (k1 + 1.0) / (tf + k1 * (1.0 - b + b * len_ratio));
			}
		}
		scores
	}
}
