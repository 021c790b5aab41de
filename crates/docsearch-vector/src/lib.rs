//! docsearch-vector
//!
//! Flat (exact) embedding index built through any [`docsearch_core::Embedder`],
//! with an optional in-memory embedding memo.
pub mod cache;
pub mod index;
pub mod search;

pub use cache::{CacheEntry, EmbeddingMemo};
pub use index::{BuildOptions, EmbeddingIndex};
