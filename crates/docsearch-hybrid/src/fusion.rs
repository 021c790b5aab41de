//! Weighted reciprocal rank fusion.
//!
//! `score(d) = wL / (rrf_k + rankL(d)) + wS / (rrf_k + rankS(d))` with 1-based
//! ranks; a list that does not contain `d` contributes nothing. Only ranks are
//! used, so BM25 and cosine scores never need to be comparable.
use std::collections::HashMap;

use docsearch_core::{Chunk, FusionConfig, RankedResult, SearchHit, SourceKind};

/// Contribution of a single list entry at 1-based `rank`.
pub fn rrf_score(weight: f32, rrf_k: f32, rank: usize) -> f32 { weight / (rrf_k + rank as f32) }

/// Depth to request from each underlying index for a final `k`.
pub fn list_depth(list_k: usize, k: usize) -> usize { list_k.max(k) }

struct Candidate {
    chunk: Chunk,
    lexical_rank: Option<usize>,
    semantic_rank: Option<usize>,
}

impl Candidate {
    fn new(chunk: &Chunk) -> Self { Self { chunk: chunk.clone(), lexical_rank: None, semantic_rank: None } }

    fn best_rank(&self) -> usize { self.lexical_rank.unwrap_or(usize::MAX).min(self.semantic_rank.unwrap_or(usize::MAX)) }
}

/// Merges two rankings into at most `k` hits. Order: fused score descending,
/// then the best rank held in either list, then corpus order. Candidates whose
/// fused score is zero (only present in a zero-weight list) are dropped.
pub fn fuse(lexical: &[SearchHit], semantic: &[SearchHit], config: &FusionConfig, k: usize) -> RankedResult {
    let mut candidates: HashMap<usize, Candidate> = HashMap::new();
    for (pos, hit) in lexical.iter().enumerate() {
        let c = candidates.entry(hit.source_order()).or_insert_with(|| Candidate::new(&hit.chunk));
        if c.lexical_rank.is_none() { c.lexical_rank = Some(pos + 1); }
    }
    for (pos, hit) in semantic.iter().enumerate() {
        let c = candidates.entry(hit.source_order()).or_insert_with(|| Candidate::new(&hit.chunk));
        if c.semantic_rank.is_none() { c.semantic_rank = Some(pos + 1); }
    }

    let mut scored: Vec<(f32, Candidate)> = candidates
        .into_values()
        .map(|c| {
            let score = c.lexical_rank.map_or(0.0, |r| rrf_score(config.lexical_weight, config.rrf_k, r))
                + c.semantic_rank.map_or(0.0, |r| rrf_score(config.semantic_weight, config.rrf_k, r));
            (score, c)
        })
        .filter(|(score, _)| *score > 0.0)
        .collect();
    scored.sort_by(|(sa, a), (sb, b)| {
        sb.total_cmp(sa)
            .then_with(|| a.best_rank().cmp(&b.best_rank()))
            .then_with(|| a.chunk.source_order.cmp(&b.chunk.source_order))
    });
    scored.truncate(k);
    scored
        .into_iter()
        .map(|(score, c)| SearchHit { chunk: c.chunk, score, source: SourceKind::Fused, lexical_rank: c.lexical_rank, semantic_rank: c.semantic_rank })
        .collect()
}

/// Convenience for comparing rankings by corpus position.
pub fn source_orders(hits: &[SearchHit]) -> Vec<usize> { hits.iter().map(SearchHit::source_order).collect() }
