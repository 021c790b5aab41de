//! docsearch-hybrid
//!
//! Ties the lexical and embedding indexes together: a single-flight index
//! cache, weighted reciprocal rank fusion and the [`HybridSearchEngine`]
//! facade.
pub mod cache;
pub mod engine;
pub mod fusion;

pub use cache::{BuiltIndexes, CacheKey, IndexCache};
pub use engine::{HybridSearchEngine, SearchResponse};
pub use fusion::{fuse, rrf_score};
