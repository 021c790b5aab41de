//! Domain types shared by the lexical and vector engines.

use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

/// Raw text extracted from one source, before chunking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub text: String,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// An independently indexed segment of a source document.
///
/// - `document_id`: identity of the [`RawDocument`] the chunk came from
/// - `chunk_index`: position within the parent document
/// - `source_order`: position within the corpus; used as the final tie-breaker
/// - `text`: the chunk payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub document_id: String,
    pub chunk_index: usize,
    pub source_order: usize,
    pub text: String,
}

/// The searchable universe at a point in time.
///
/// Immutable and cheap to clone; a new corpus replaces the old one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    chunks: Arc<[Chunk]>,
}

impl Corpus {
    /// Builds a corpus, renumbering `source_order` to match each chunk's position.
    pub fn from_chunks(chunks: impl IntoIterator<Item = Chunk>) -> Self {
        let chunks: Vec<Chunk> = chunks
            .into_iter()
            .enumerate()
            .map(|(order, mut chunk)| {
                chunk.source_order = order;
                chunk
            })
            .collect();
        Self { chunks: chunks.into() }
    }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }

    pub fn get(&self, source_order: usize) -> Option<&Chunk> { self.chunks.get(source_order) }

    pub fn len(&self) -> usize { self.chunks.len() }

    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    /// Stable digest of the corpus content (document ids and chunk texts, in order).
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.chunks.len() as u64).to_le_bytes());
        for chunk in self.chunks.iter() {
            for field in [chunk.document_id.as_bytes(), chunk.text.as_bytes()] {
                hasher.update(&(field.len() as u64).to_le_bytes());
                hasher.update(field);
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

impl Deref for Corpus {
    type Target = [Chunk];

    fn deref(&self) -> &[Chunk] { &self.chunks }
}

/// Indicates which engine produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Text,
    Vector,
    Fused,
}

/// A ranked chunk returned by any engine.
///
/// `score` is engine-specific but higher is always better. `lexical_rank` and
/// `semantic_rank` are the 1-based positions the chunk held in the per-method
/// rankings, which makes fused scores explainable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
    pub source: SourceKind,
    pub lexical_rank: Option<usize>,
    pub semantic_rank: Option<usize>,
}

impl SearchHit {
    pub fn text(chunk: Chunk, score: f32, rank: usize) -> Self {
        Self { chunk, score, source: SourceKind::Text, lexical_rank: Some(rank), semantic_rank: None }
    }

    pub fn vector(chunk: Chunk, score: f32, rank: usize) -> Self {
        Self { chunk, score, source: SourceKind::Vector, lexical_rank: None, semantic_rank: Some(rank) }
    }

    pub fn source_order(&self) -> usize { self.chunk.source_order }
}

/// Ordered hits, highest relevance first.
pub type RankedResult = Vec<SearchHit>;

/// Sorts `(source_order, score)` pairs by score descending, breaking ties by
/// corpus order, and keeps the first `k`.
pub fn top_k_by_score(mut scored: Vec<(usize, f32)>, k: usize) -> Vec<(usize, f32)> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(doc: &str, text: &str) -> Chunk {
        Chunk { document_id: doc.to_string(), chunk_index: 0, source_order: 99, text: text.to_string() }
    }

    #[test]
    fn from_chunks_renumbers_source_order() {
        let corpus = Corpus::from_chunks(vec![chunk("a", "x"), chunk("b", "y")]);
        let orders: Vec<usize> = corpus.iter().map(|c| c.source_order).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn content_hash_tracks_ids_and_text() {
        let a = Corpus::from_chunks(vec![chunk("a", "x"), chunk("b", "y")]);
        let same = Corpus::from_chunks(vec![chunk("a", "x"), chunk("b", "y")]);
        let other_text = Corpus::from_chunks(vec![chunk("a", "x"), chunk("b", "z")]);
        let other_id = Corpus::from_chunks(vec![chunk("a", "x"), chunk("c", "y")]);
        // Length framing keeps field boundaries distinct.
        let shifted = Corpus::from_chunks(vec![chunk("a", "xb"), chunk("", "y")]);
        assert_eq!(a.content_hash(), same.content_hash());
        assert_ne!(a.content_hash(), other_text.content_hash());
        assert_ne!(a.content_hash(), other_id.content_hash());
        assert_ne!(a.content_hash(), shifted.content_hash());
    }

    #[test]
    fn top_k_breaks_ties_by_order() {
        let ranked = top_k_by_score(vec![(2, 1.0), (0, 0.5), (1, 1.0)], 2);
        assert_eq!(ranked, vec![(1, 1.0), (2, 1.0)]);
    }
}
