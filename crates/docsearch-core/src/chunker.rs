//! Recursive character chunking with exact overlap.
//!
//! Text is split on the first separator of [`DEFAULT_SEPARATORS`] that occurs in
//! it; any piece still longer than the body budget is split again with the
//! remaining separators, and finally on character boundaries. Pieces keep their
//! trailing separator so that concatenating them reproduces the input. Pieces
//! are then packed greedily into bodies and every chunk after the first is
//! prefixed with the last `overlap_chars` characters of the previous chunk.
//!
//! All lengths are counted in `char`s.

use tracing::debug;

use crate::config::{ChunkingConfig, DEFAULT_SEPARATORS};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    config: ChunkingConfig,
    separators: Vec<String>,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self { config: ChunkingConfig::default(), separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect() }
    }
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, ..Self::default() })
    }

    pub fn config(&self) -> ChunkingConfig { self.config }

    /// Splits `text` into ordered chunk texts.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let max = self.config.max_chars;
        if char_len(text) <= max {
            return vec![text.to_string()];
        }
        let budget = max - self.config.overlap_chars;
        let mut pieces = Vec::new();
        split_recursive(text, 0, &self.separators, budget, &mut pieces);
        self.merge(text, &pieces, budget)
    }

    /// Packs contiguous pieces greedily into bodies. The first body may use the
    /// full `max_chars`; later ones leave room for the overlap prefix.
    fn merge(&self, text: &str, pieces: &[(usize, usize)], budget: usize) -> Vec<String> {
        let mut chunks: Vec<String> = Vec::new();
        // (start, end, chars) of the body being filled
        let mut body: Option<(usize, usize, usize)> = None;
        for &(start, end) in pieces {
            let piece_chars = char_len(&text[start..end]);
            let limit = if chunks.is_empty() { self.config.max_chars } else { budget };
            body = match body {
                Some((s, _, chars)) if chars + piece_chars <= limit => Some((s, end, chars + piece_chars)),
                Some((s, e, _)) => {
                    self.push_chunk(&mut chunks, &text[s..e]);
                    Some((start, end, piece_chars))
                }
                None => Some((start, end, piece_chars)),
            };
        }
        if let Some((s, e, _)) = body {
            self.push_chunk(&mut chunks, &text[s..e]);
        }
        chunks
    }

    fn push_chunk(&self, chunks: &mut Vec<String>, body: &str) {
        if body.trim().is_empty() {
            return;
        }
        let chunk = match chunks.last() {
            Some(prev) => format!("{}{}", tail_chars(prev, self.config.overlap_chars), body),
            None => body.to_string(),
        };
        chunks.push(chunk);
    }
}

/// Appends byte ranges (relative to the original text) covering `text`, each at
/// most `budget` chars long.
fn split_recursive(text: &str, offset: usize, separators: &[String], budget: usize, out: &mut Vec<(usize, usize)>) {
    if char_len(text) <= budget {
        out.push((offset, offset + text.len()));
        return;
    }
    let Some((idx, sep)) = separators.iter().enumerate().find(|(_, sep)| text.contains(sep.as_str())) else {
        debug!(chars = char_len(text), budget, "no separator splits piece; using hard character split");
        hard_split(text, offset, budget, out);
        return;
    };
    let narrower = &separators[idx + 1..];
    let mut start = 0usize;
    for piece in text.split_inclusive(sep.as_str()) {
        split_recursive(piece, offset + start, narrower, budget, out);
        start += piece.len();
    }
}

fn char_len(s: &str) -> usize { s.chars().count() }

/// Last `n` chars of `s` (all of `s` when shorter).
fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

fn hard_split(text: &str, offset: usize, budget: usize, out: &mut Vec<(usize, usize)>) {
    let mut start = 0usize;
    let mut count = 0usize;
    for (idx, _) in text.char_indices() {
        if count == budget {
            out.push((offset + start, offset + idx));
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push((offset + start, offset + text.len()));
    }
}
