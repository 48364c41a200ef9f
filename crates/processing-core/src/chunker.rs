//! Text chunking for on-screen readability.

/// Split `text` on whitespace into chunks of exactly `words_per_chunk`
/// words; the last chunk holds the remainder. Empty input gives no chunks.
///
/// A chunk size of zero is treated as one word per chunk.
pub fn chunk(text: &str, words_per_chunk: usize) -> Vec<String> {
    let size = words_per_chunk.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    words.chunks(size).map(|c| c.join(" ")).collect()
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
