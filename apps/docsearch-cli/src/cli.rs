use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use docsearch_core::config::ProviderKind;

/// Hybrid (BM25 + embedding) search over a directory of extracted text files.
#[derive(Parser, Debug)]
#[command(name = "docsearch", version, about)]
pub struct Cli {
    /// Enable verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Index the corpus and run one query
    Search {
        /// Search query
        query: String,
        #[command(flatten)]
        corpus: CorpusArgs,
        #[command(flatten)]
        query_opts: QueryArgs,
    },
    /// Index the corpus once and answer queries read from stdin
    Repl {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[command(flatten)]
        query_opts: QueryArgs,
    },
    /// Show how the corpus is chunked
    Chunks {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Number of chunks to preview
        #[arg(long, default_value = "5")]
        preview: usize,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// Directory of .txt files (default: data.raw_txt_dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Only read the first N files
    #[arg(long)]
    pub limit_files: Option<usize>,

    /// Override embedding.provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Number of fused results (default: retrieval.top_k)
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Which ranking(s) to print
    #[arg(long, value_enum, default_value_t = Method::Hybrid)]
    pub method: Method,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    Hybrid,
    Lexical,
    Semantic,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    Hashing,
    Openai,
    Local,
}

impl From<ProviderArg> for ProviderKind {
    fn from(p: ProviderArg) -> Self {
        match p {
            ProviderArg::Hashing => ProviderKind::Hashing,
            ProviderArg::Openai => ProviderKind::OpenAi,
            ProviderArg::Local => ProviderKind::Local,
        }
    }
}
