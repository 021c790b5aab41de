//! In-memory embedding memo keyed by `(content_hash, embedder fingerprint)`.
//!
//! The memo is consulted before calling a provider and written through once a
//! build succeeds, so rebuilding a corpus that shares chunks with an earlier
//! one only embeds the new text.
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub content_hash: String,
    pub vector: Vec<f32>,
}

type MemoKey = (String, String);

#[derive(Debug, Default)]
pub struct EmbeddingMemo {
    entries: RwLock<HashMap<MemoKey, Arc<[f32]>>>,
}

pub fn hash_content(s: &str) -> String { blake3::hash(s.as_bytes()).to_hex().to_string() }

impl EmbeddingMemo {
    pub fn new() -> Self { Self::default() }

    /// Looks up every hash; the result is aligned with `hashes`.
    pub fn get_many(&self, fingerprint: &str, hashes: &[String]) -> Vec<Option<Vec<f32>>> {
        let entries = self.entries.read();
        hashes
            .iter()
            .map(|h| entries.get(&(fingerprint.to_string(), h.clone())).map(|v| v.to_vec()))
            .collect()
    }

    pub fn put_many(&self, fingerprint: &str, new_entries: impl IntoIterator<Item = CacheEntry>) {
        let mut entries = self.entries.write();
        for e in new_entries {
            entries.insert((fingerprint.to_string(), e.content_hash), e.vector.into());
        }
    }

    pub fn len(&self) -> usize { self.entries.read().len() }

    pub fn is_empty(&self) -> bool { self.entries.read().is_empty() }

    pub fn clear(&self) { self.entries.write().clear(); }
}
