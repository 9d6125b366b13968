//! Splits document text into chunks for embedding and retrieval.
//! Paragraph boundaries (blank lines) delimit chunks; optionally, long paragraphs
//! are split further at line breaks, then spaces, then character counts.

use serde::{Deserialize, Serialize};

/// Default minimum significance: chunks must be longer than this many characters.
pub const DEFAULT_MIN_CHARS: usize = 30;

/// A chunk of document text, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk within the document (0, 1, 2, …).
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Pieces whose trimmed character count is `<= min_chars` are discarded.
    pub min_chars: usize,
    /// Split paragraphs longer than this. `None` keeps paragraphs whole.
    pub max_chars: Option<usize>,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            max_chars: None,
        }
    }
}

/// Splits on paragraph boundaries, trims, and drops pieces of `min_length` characters or fewer.
pub fn split_into_chunks(text: &str, min_length: usize) -> Vec<Chunk> {
    chunk_text(
        text,
        &ChunkOptions {
            min_chars: min_length,
            max_chars: None,
        },
    )
}

/// Chunks `text` according to `options`. Deterministic; order follows the source text.
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Vec<Chunk> {
    let mut pieces = Vec::new();
    for para in paragraphs(text) {
        match options.max_chars {
            Some(max) if max > 0 && para.chars().count() > max => {
                pieces.extend(split_long_text(para, max));
            }
            _ => pieces.push(para),
        }
    }
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| p.chars().count() > options.min_chars)
        .enumerate()
        .map(|(index, text)| Chunk {
            index,
            text: text.to_string(),
        })
        .collect()
}

/// Slices of `text` separated by one or more whitespace-only lines.
fn paragraphs(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                result.push(&text[s..end]);
            }
        } else {
            start.get_or_insert(line_start);
            end = offset;
        }
    }
    if let Some(s) = start {
        result.push(&text[s..end]);
    }
    result
}

fn split_long_text(text: &str, max_chars: usize) -> Vec<&str> {
    let mut result = Vec::new();
    let mut remaining = text.trim();
    while !remaining.is_empty() {
        if remaining.chars().count() <= max_chars {
            result.push(remaining);
            break;
        }
        let (chunk, rest) = try_split_at_boundary(remaining, max_chars);
        result.push(chunk);
        remaining = rest;
    }
    result
}

/// Prefer split at \n; else at last space within max_chars; else hard cut.
fn try_split_at_boundary(text: &str, max_chars: usize) -> (&str, &str) {
    let hard_cut = byte_offset_of_char(text, max_chars);
    let segment = &text[..byte_offset_of_char(text, max_chars + 1)];
    if let Some(pos) = segment.rfind('\n').filter(|&p| p > 0) {
        return (text[..pos].trim_end(), text[pos + 1..].trim_start());
    }
    if let Some(pos) = segment.rfind(' ').filter(|&p| p > 0) {
        return (text[..pos].trim_end(), text[pos + 1..].trim_start());
    }
    (&text[..hard_cut], text[hard_cut..].trim_start())
}

/// Byte offset of the `n`th character, or the text length when it has fewer.
fn byte_offset_of_char(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}
