//! Shared data model, configuration, errors and the chunker for docsearch.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! The embedding capability lives here as a trait so that index crates and
//! provider crates only meet through it.

pub mod chunker;
pub mod config;
pub mod error;
pub mod ingest;
pub mod traits;
pub mod types;

pub use chunker::RecursiveChunker;
pub use config::{ChunkingConfig, FusionConfig, Settings};
pub use error::{EmbedError, Error, Result};
pub use ingest::{ingest, ingest_texts};
pub use traits::Embedder;
pub use types::{Chunk, Corpus, RankedResult, RawDocument, SearchHit, SourceKind};
