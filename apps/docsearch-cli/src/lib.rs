//! Command-line host for the docsearch retrieval core.
//!
//! ```bash
//! docsearch chunks --data-dir ./data/txt
//! docsearch search "purify water" -k 5 --method all
//! docsearch repl --data-dir ./data/txt
//! ```
pub mod cli;
pub mod commands;
pub mod output;
