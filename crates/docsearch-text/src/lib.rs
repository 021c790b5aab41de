//! docsearch-text
//!
//! BM25 lexical ranking over a chunked corpus. Tokenization reuses tantivy's
//! analyzer pipeline; scoring is done here so that `k1`/`b` stay tunable.
pub mod index;
pub mod search;
pub mod tokenizer;

pub use index::{Bm25Params, LexicalIndex};
