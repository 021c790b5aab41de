use std::fmt::Write;

use docsearch_core::{Corpus, SearchHit};
use docsearch_hybrid::SearchResponse;

use crate::cli::Method;

pub const PREVIEW_CHARS: usize = 200;

pub fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}

fn write_hits(out: &mut String, title: &str, hits: &[SearchHit]) {
    let _ = writeln!(out, "\n{title} ({} results)", hits.len());
    if hits.is_empty() {
        let _ = writeln!(out, "  (no matches)");
    }
    for (i, hit) in hits.iter().enumerate() {
        let ranks = match (hit.lexical_rank, hit.semantic_rank) {
            (Some(l), Some(s)) => format!("  [bm25 #{l}, semantic #{s}]"),
            (Some(l), None) => format!("  [bm25 #{l}]"),
            (None, Some(s)) => format!("  [semantic #{s}]"),
            (None, None) => String::new(),
        };
        let _ = writeln!(out, "  {}. score={:.4}  {}#{}{}", i + 1, hit.score, hit.chunk.document_id, hit.chunk.chunk_index, ranks);
        let _ = writeln!(out, "     {}", snippet(&hit.chunk.text, PREVIEW_CHARS));
    }
}

pub fn format_human(query: &str, response: &SearchResponse, method: Method) -> String {
    let mut out = format!("Query: \"{query}\"\n");
    if matches!(method, Method::Hybrid | Method::All) { write_hits(&mut out, "Hybrid", &response.fused); }
    if matches!(method, Method::Lexical | Method::All) { write_hits(&mut out, "Lexical (BM25)", &response.lexical); }
    if matches!(method, Method::Semantic | Method::All) { write_hits(&mut out, "Semantic", &response.semantic); }
    out
}

pub fn format_json(query: &str, response: &SearchResponse, method: Method) -> serde_json::Result<String> {
    let mut value = serde_json::json!({ "query": query });
    if matches!(method, Method::Hybrid | Method::All) { value["fused"] = serde_json::to_value(&response.fused)?; }
    if matches!(method, Method::Lexical | Method::All) { value["lexical"] = serde_json::to_value(&response.lexical)?; }
    if matches!(method, Method::Semantic | Method::All) { value["semantic"] = serde_json::to_value(&response.semantic)?; }
    serde_json::to_string_pretty(&value)
}

/// Chunk counts per document followed by the first `preview` chunks.
pub fn format_chunk_preview(corpus: &Corpus, documents: usize, preview: usize) -> String {
    let mut out = format!("{} documents -> {} chunks\n", documents, corpus.len());
    let mut per_doc: Vec<(&str, usize)> = Vec::new();
    for chunk in corpus.iter() {
        match per_doc.last_mut() {
            Some((id, n)) if *id == chunk.document_id => *n += 1,
            _ => per_doc.push((chunk.document_id.as_str(), 1)),
        }
    }
    for (id, n) in per_doc { let _ = writeln!(out, "  {id}: {n} chunks"); }
    for chunk in corpus.iter().take(preview) {
        let _ = writeln!(out, "\nChunk {} ({}#{}, {} chars)", chunk.source_order + 1, chunk.document_id, chunk.chunk_index, chunk.text.chars().count());
        let _ = writeln!(out, "  {}", snippet(&chunk.text, PREVIEW_CHARS));
    }
    if corpus.len() > preview {
        let _ = writeln!(out, "\n... and {} more segments", corpus.len() - preview);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsearch_core::{ingest_texts, RecursiveChunker};

    #[test]
    fn snippet_truncates_on_char_boundary() {
        assert_eq!(snippet("ééé", 2), "éé...");
        assert_eq!(snippet("short\n\ntext", 200), "short text");
    }

    #[test]
    fn preview_lists_counts_and_first_chunks() {
        let corpus = ingest_texts(["alpha", "beta"], &RecursiveChunker::default());
        let text = format_chunk_preview(&corpus, 2, 1);
        assert!(text.starts_with("2 documents -> 2 chunks"));
        assert!(text.contains("doc-1: 1 chunks"));
        assert!(text.contains("Chunk 1 (doc-0#0, 5 chars)"));
        assert!(!text.contains("Chunk 2"));
        assert!(text.ends_with("... and 1 more segments\n"));

        let all = format_chunk_preview(&corpus, 2, 5);
        assert!(!all.contains("more segments"));
    }

    #[test]
    fn human_output_respects_method() {
        let corpus = ingest_texts(["The cat sat"], &RecursiveChunker::default());
        let hit = SearchHit::text(corpus[0].clone(), 0.5, 1);
        let response = SearchResponse { fused: vec![], lexical: vec![hit], semantic: vec![] };
        let lexical = format_human("cat", &response, Method::Lexical);
        assert!(lexical.contains("Lexical (BM25) (1 results)"));
        assert!(lexical.contains("[bm25 #1]"));
        assert!(!lexical.contains("Hybrid"));
        let json = format_json("cat", &response, Method::All).expect("json");
        assert!(json.contains("\"lexical\""));
    }
}
