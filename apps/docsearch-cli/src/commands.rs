use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

use docsearch_core::config::{expand_path, Config, Settings};
use docsearch_core::ingest::load_text_dir_limited;
use docsearch_core::{ingest, RawDocument, RecursiveChunker};
use docsearch_embed::embedder_from_settings;
use docsearch_hybrid::{HybridSearchEngine, IndexCache};

use crate::cli::{Command, CorpusArgs, QueryArgs};
use crate::output::{format_chunk_preview, format_human, format_json};

pub fn run(command: Command) -> Result<()> {
    let config = Config::load().context("loading configuration")?;
    match command {
        Command::Search { query, corpus, query_opts } => {
            let (settings, documents) = prepare(&config, &corpus)?;
            with_engine(settings, documents, |engine| async move {
                print_results(&engine, &query, &query_opts).await
            })
        }
        Command::Repl { corpus, query_opts } => {
            let (settings, documents) = prepare(&config, &corpus)?;
            with_engine(settings, documents, |engine| async move { repl(&engine, &query_opts).await })
        }
        Command::Chunks { corpus, preview } => {
            let (settings, documents) = prepare(&config, &corpus)?;
            let count = documents.len();
            let chunker = RecursiveChunker::new(settings.chunking)?;
            let corpus = ingest(documents, &chunker);
            print!("{}", format_chunk_preview(&corpus, count, preview));
            Ok(())
        }
    }
}

fn prepare(config: &Config, args: &CorpusArgs) -> Result<(Settings, Vec<RawDocument>)> {
    let mut settings = config.settings().context("invalid configuration")?;
    if let Some(provider) = args.provider {
        settings.embedding.provider = provider.into();
        settings.embedding.validate()?;
    }
    let data_dir: PathBuf = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => expand_path(&settings.data.raw_txt_dir),
    };
    let documents = load_text_dir_limited(&data_dir, args.limit_files.unwrap_or(usize::MAX))
        .with_context(|| format!("reading {}", data_dir.display()))?;
    info!(dir = %data_dir.display(), documents = documents.len(), "loaded documents");
    Ok((settings, documents))
}

/// Builds the embedder before entering the runtime (the HTTP client is
/// blocking) and indexes the documents before handing the engine to `f`.
fn with_engine<F, Fut>(settings: Settings, documents: Vec<RawDocument>, f: F) -> Result<()>
where
    F: FnOnce(Arc<HybridSearchEngine>) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let embedder = embedder_from_settings(&settings).context("creating embedding provider")?;
    let cache = Arc::new(IndexCache::from_config(&settings.embedding));
    let engine = Arc::new(HybridSearchEngine::new(embedder, settings, cache)?);
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let result = runtime.block_on(async {
        let built = engine.index_documents(documents).await.context("building indexes")?;
        eprintln!("Indexed {} chunks", built.corpus.len());
        f(Arc::clone(&engine)).await
    });
    drop(runtime);
    result
}

async fn print_results(engine: &HybridSearchEngine, query: &str, opts: &QueryArgs) -> Result<()> {
    let k = opts.k.unwrap_or(engine.settings().retrieval.top_k);
    let response = engine.search(query, k).await?;
    if opts.json {
        println!("{}", format_json(query, &response, opts.method)?);
    } else {
        println!("{}", format_human(query, &response, opts.method));
    }
    Ok(())
}

async fn repl(engine: &HybridSearchEngine, opts: &QueryArgs) -> Result<()> {
    let answered = read_queries(engine, opts, BufReader::new(tokio::io::stdin())).await?;
    info!(answered, "repl finished");
    Ok(())
}

/// Answers one query per line until EOF or a quit command. Returns the number
/// of queries that were answered.
async fn read_queries<R>(engine: &HybridSearchEngine, opts: &QueryArgs, reader: R) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut answered = 0;
    loop {
        print!("query> ");
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let query = line.trim();
        if query.is_empty() { continue; }
        if matches!(query, ":q" | "quit" | "exit") { break; }
        match print_results(engine, query, opts).await {
            Ok(()) => answered += 1,
            Err(err) => eprintln!("error: {err:#}"),
        }
    }
    Ok(answered)
}
