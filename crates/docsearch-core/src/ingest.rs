//! Corpus ingestion: raw text blocks in, chunked [`Corpus`] out.
//!
//! Text extraction happens upstream; [`load_text_dir`] covers the common case
//! of a directory of already-extracted `.txt` files.
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::chunker::RecursiveChunker;
use crate::error::Result;
use crate::types::{Chunk, Corpus, RawDocument};

/// Chunks every document and concatenates the chunks, in input order, into a
/// corpus. Documents that yield no chunks are skipped with a warning.
pub fn ingest<I>(documents: I, chunker: &RecursiveChunker) -> Corpus
where
    I: IntoIterator<Item = RawDocument>,
{
    let mut chunks = Vec::new();
    let mut doc_count = 0usize;
    for doc in documents {
        doc_count += 1;
        let pieces = chunker.split_text(&doc.text);
        if pieces.is_empty() {
            warn!(document_id = %doc.id, "no text could be extracted; skipping document");
            continue;
        }
        chunks.extend(pieces.into_iter().enumerate().map(|(chunk_index, text)| Chunk {
            document_id: doc.id.clone(),
            chunk_index,
            source_order: 0,
            text,
        }));
    }
    let corpus = Corpus::from_chunks(chunks);
    info!(documents = doc_count, chunks = corpus.len(), "ingested corpus");
    corpus
}

/// Ingests anonymous text blocks; ids are assigned as `doc-<n>` in input order.
pub fn ingest_texts<I, S>(blocks: I, chunker: &RecursiveChunker) -> Corpus
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ingest(blocks.into_iter().enumerate().map(|(i, text)| RawDocument::new(format!("doc-{i}"), text)), chunker)
}

/// Reads every `.txt` file under `data_dir` (sorted by path). The document id
/// is the path relative to `data_dir`.
pub fn load_text_dir(data_dir: &Path) -> Result<Vec<RawDocument>> {
    load_text_dir_limited(data_dir, usize::MAX)
}

pub fn load_text_dir_limited(data_dir: &Path, limit: usize) -> Result<Vec<RawDocument>> {
    let mut files = list_txt_files(data_dir);
    if files.is_empty() {
        warn!(dir = %data_dir.display(), "no .txt files found");
        return Ok(vec![]);
    }
    if files.len() > limit {
        info!(limit, found = files.len(), "limiting ingestion to the first files");
        files.truncate(limit);
    }
    let mut documents = Vec::with_capacity(files.len());
    for file_path in &files {
        let text = read_file_content(file_path)?;
        let id = file_path.strip_prefix(data_dir).unwrap_or(file_path).to_string_lossy().replace('\\', "/");
        documents.push(RawDocument { id, text });
    }
    Ok(documents)
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
        .map(|e| e.path().to_path_buf())
        .collect();
    txt_files.sort();
    txt_files
}
