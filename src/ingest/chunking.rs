//! Character-budget semantic chunking.
//!
//! Chunk boundaries prefer the coarsest structure available in the text — paragraph
//! breaks, then line breaks, sentences, and words — and only fall back to hard splits
//! when a single unit exceeds the budget. The budget counts characters, not bytes, so
//! multi-byte text is measured the same way the stored `content` column reads.

use semchunk_rs::Chunker;

use super::types::ChunkingError;

/// Split text into ordered chunks of at most `max_chars` characters.
///
/// Returns an empty vector when the input is all whitespace. The chunks, stripped of
/// boundary whitespace, concatenate back to the original text's non-whitespace
/// content in order.
pub fn chunk_text(text: &str, max_chars: usize) -> Result<Vec<String>, ChunkingError> {
    if max_chars == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let chunker = Chunker::new(
        max_chars,
        Box::new(|segment: &str| segment.chars().count()),
    );
    Ok(chunker.chunk(text))
}
