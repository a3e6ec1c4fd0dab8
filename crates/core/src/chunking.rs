use crate::models::{PipelineOptions, TextChunk};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
    pub separator: &'static str,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::from(&PipelineOptions::default())
    }
}

impl From<&PipelineOptions> for ChunkingConfig {
    fn from(value: &PipelineOptions) -> Self {
        Self {
            max_chars: value.chunk_max_chars,
            overlap_chars: value.chunk_overlap_chars,
            separator: value.separator,
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits document text into chunks of at most `max_chars` characters, cutting
/// on `separator` and repeating up to `overlap_chars` of trailing pieces at the
/// start of the next chunk.
///
/// Text that already fits is returned untouched as a single chunk. Blank text
/// yields no chunks.
pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    if char_len(text) <= config.max_chars {
        return vec![text.to_string()];
    }

    let pieces = text
        .split(config.separator)
        .filter(|piece| !piece.is_empty())
        .flat_map(|piece| hard_split(piece, config))
        .collect::<Vec<_>>();

    merge_pieces(&pieces, config)
}

/// Cuts a single separator-free piece that is longer than a chunk into
/// overlapping windows.
fn hard_split(piece: &str, config: ChunkingConfig) -> Vec<String> {
    if char_len(piece) <= config.max_chars {
        return vec![piece.to_string()];
    }

    let chars: Vec<char> = piece.chars().collect();
    let stride = config.max_chars.saturating_sub(config.overlap_chars).max(1);
    let mut windows = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + config.max_chars).min(chars.len());
        windows.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += stride;
    }

    debug!(chars = chars.len(), windows = windows.len(), "hard split oversized line");
    windows
}

fn merge_pieces(pieces: &[String], config: ChunkingConfig) -> Vec<String> {
    let separator_len = char_len(config.separator);
    let mut chunks = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;
    let joiner = |current: &VecDeque<&str>| if current.is_empty() { 0 } else { separator_len };

    for piece in pieces {
        let len = char_len(piece);

        if total + len + joiner(&current) > config.max_chars && !current.is_empty() {
            if let Some(chunk) = join_pieces(&current, config.separator) {
                chunks.push(chunk);
            }

            while total > config.overlap_chars
                || (total > 0 && total + len + joiner(&current) > config.max_chars)
            {
                let Some(front) = current.pop_front() else {
                    break;
                };
                total = total.saturating_sub(char_len(front) + joiner(&current));
            }
        }

        current.push_back(piece);
        total += len + if current.len() > 1 { separator_len } else { 0 };
    }

    if let Some(chunk) = join_pieces(&current, config.separator) {
        chunks.push(chunk);
    }

    chunks
}

fn join_pieces(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn build_chunks(text: &str, config: ChunkingConfig) -> Vec<TextChunk> {
    split_text(text, config)
        .into_iter()
        .enumerate()
        .map(|(index, text)| TextChunk {
            chunk_id: make_chunk_id(index as u64, &text),
            chunk_index: index as u64,
            text,
        })
        .collect()
}

fn make_chunk_id(index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_lines(count: usize, width: usize) -> Vec<String> {
        (0..count)
            .map(|index| {
                let label = format!("line {index:03} ");
                format!("{label}{}", "x".repeat(width - label.len()))
            })
            .collect()
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_text("", ChunkingConfig::default()).is_empty());
        assert!(split_text(" \n\t\n", ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn short_text_is_a_single_untouched_chunk() {
        let text = "Invoices are due on the 1st of each month.\nLate fees apply after 5 days.";
        assert_eq!(split_text(text, ChunkingConfig::default()), vec![text.to_string()]);

        let exact = "a".repeat(1_000);
        assert_eq!(split_text(&exact, ChunkingConfig::default()), vec![exact.clone()]);
    }

    #[test]
    fn long_text_overlaps_on_line_boundaries() {
        let lines = numbered_lines(30, 99);
        let text = lines.join("\n");
        let chunks = split_text(&text, ChunkingConfig::default());

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1_000);
        }

        // ten 99-char lines plus nine separators fill the first chunk exactly
        assert!(chunks[0].starts_with(&lines[0]));
        assert!(chunks[0].ends_with(&lines[9]));
        // the last two lines (199 chars) are carried over as overlap
        assert!(chunks[1].starts_with(&format!("{}\n{}", lines[8], lines[9])));

        for pair in chunks.windows(2) {
            let carried = pair[1].lines().next().unwrap_or_default();
            assert!(pair[0].contains(carried));
        }
    }

    #[test]
    fn every_line_is_kept() {
        let lines = numbered_lines(40, 57);
        let chunks = split_text(&lines.join("\n"), ChunkingConfig::default());
        for line in &lines {
            assert!(chunks.iter().any(|chunk| chunk.contains(line.as_str())));
        }
    }

    #[test]
    fn oversized_line_is_cut_with_overlap() {
        let text: String = (0..2_500).map(|index| char::from(b'a' + (index % 26) as u8)).collect();
        let chunks = split_text(&text, ChunkingConfig::default());

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 1_000));
        let tail: String = chunks[0].chars().skip(800).collect();
        assert!(chunks[1].starts_with(&tail));
    }

    #[test]
    fn multibyte_text_is_measured_in_characters() {
        let line = "é".repeat(600);
        let text = format!("{line}\n{line}");
        let chunks = split_text(&text, ChunkingConfig::default());
        assert_eq!(chunks, vec![line.clone(), line]);
    }

    #[test]
    fn chunk_ids_are_stable_and_indexed() {
        let text = numbered_lines(30, 99).join("\n");
        let first = build_chunks(&text, ChunkingConfig::default());
        let second = build_chunks(&text, ChunkingConfig::default());

        assert_eq!(first, second);
        assert_eq!(first[1].chunk_index, 1);
        assert_ne!(first[0].chunk_id, first[1].chunk_id);
    }
}
