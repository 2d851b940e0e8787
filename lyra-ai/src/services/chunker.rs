//! Lyric line parsing and batch chunking

use crate::models::Batch;

/// Extract lyric lines from file contents: trimmed, blank lines dropped
pub fn parse_lyric_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `lines` into consecutive batches of at most `batch_size` lines
///
/// Batch indices start at 1. Concatenating the batches' lines reproduces
/// `lines` exactly. Produces `ceil(len / batch_size)` batches; an empty input
/// produces none. A `batch_size` of 0 is treated as 1.
pub fn chunk_lines(lines: &[String], batch_size: usize) -> Vec<Batch> {
    lines
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(i, chunk)| Batch::new(i + 1, chunk.to_vec()))
        .collect()
}
