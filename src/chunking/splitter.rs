//! Recursive character splitter.
//!
//! Splits on the coarsest separator present in the text (paragraph, line,
//! word, then single characters), recursing into any piece that is still too
//! large, and greedily merges the small pieces back into chunks of at most
//! `chunk_size` characters. Consecutive chunks share up to `chunk_overlap`
//! characters of trailing/leading pieces. Lengths are counted in `char`s.

use std::collections::VecDeque;

/// Separators tried in order; the empty separator splits into characters.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Hierarchical text splitter with overlap.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl RecursiveSplitter {
    /// Create a splitter. An overlap not smaller than the chunk size is
    /// clamped below it so that every merge step makes progress.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_separators(mut self, separators: &[&str]) -> Self {
        self.separators = separators.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into ordered, whitespace-trimmed, non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(text, &separators)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&str] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }

            if finer.is_empty() {
                // Atomic unit larger than a chunk; emit it whole
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }

        chunks
    }

    /// Greedily combine pieces into chunks, carrying an overlap window forward.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window);

                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            total += len;
        }

        push_joined(&mut chunks, &window);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split on `separator`, attaching each separator to the piece that follows it.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();

    if let Some(first) = parts.next() {
        pieces.push(first.to_string());
    }
    for part in parts {
        pieces.push(format!("{}{}", separator, part));
    }

    pieces.retain(|p| !p.is_empty());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("token{:04}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Longest prefix of `next` (up to `max` chars) that `prev` ends with.
    fn shared_overlap(prev: &str, next: &str, max: usize) -> usize {
        (1..=max.min(next.len()))
            .rev()
            .find(|&k| next.is_char_boundary(k) && prev.ends_with(&next[..k]))
            .unwrap_or(0)
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = RecursiveSplitter::new(1000, 200);
        assert_eq!(splitter.split("Short text."), vec!["Short text."]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        let splitter = RecursiveSplitter::new(1000, 200);
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n\n  ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let text = numbered_words(600);
        let splitter = RecursiveSplitter::new(1000, 200);
        let chunks = splitter.split(&text);

        assert!(chunks.len() > 4);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1000, "chunk too long: {}", chunk.len());
        }
        for pair in chunks.windows(2) {
            let overlap = shared_overlap(&pair[0], &pair[1], 200);
            assert!(overlap >= 150 && overlap <= 200, "overlap was {}", overlap);
        }
    }

    #[test]
    fn test_chunks_cover_text_in_order() {
        let text = numbered_words(600);
        let chunks = RecursiveSplitter::new(1000, 200).split(&text);

        let mut previous_end = 0;
        let mut search_from = 0;
        for chunk in &chunks {
            let start = text[search_from..]
                .find(chunk.as_str())
                .map(|i| i + search_from)
                .expect("chunk must be a substring of the input");
            // No gap between consecutive chunks
            assert!(start <= previous_end);
            previous_end = start + chunk.len();
            search_from = start + 1;
        }
        assert_eq!(previous_end, text.len());

        assert!(chunks[0].starts_with("token0000"));
        assert!(chunks.last().unwrap().ends_with("token0599"));
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let para_a = "a".repeat(300);
        let para_b = "b".repeat(300);
        let para_c = "c".repeat(300);
        let text = format!("{}\n\n{}\n\n{}", para_a, para_b, para_c);

        let chunks = RecursiveSplitter::new(700, 0).split(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], format!("{}\n\n{}", para_a, para_b));
        assert_eq!(chunks[1], para_c);
    }

    #[test]
    fn test_falls_back_to_characters() {
        let text = "x".repeat(2500);
        let chunks = RecursiveSplitter::new(1000, 200).split(&text);

        assert!(chunks.iter().all(|c| c.chars().count() <= 1000));
        assert_eq!(chunks[0].len(), 1000);
        assert_eq!(chunks[1].len(), 1000);
    }

    #[test]
    fn test_multibyte_text_counts_chars() {
        let text = "é".repeat(1500);
        let chunks = RecursiveSplitter::new(1000, 0).split(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 1000);
        assert_eq!(chunks[1].chars().count(), 500);
    }

    #[test]
    fn test_deterministic() {
        let text = format!("{}\n\n{}", numbered_words(300), numbered_words(250));
        let splitter = RecursiveSplitter::new(1000, 200);
        assert_eq!(splitter.split(&text), splitter.split(&text));
    }

    #[test]
    fn test_overlap_clamped_below_size() {
        let splitter = RecursiveSplitter::new(10, 50);
        assert_eq!(splitter.chunk_overlap(), 9);
        let chunks = splitter.split(&"y".repeat(40));
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a b  c", " "),
            vec!["a", " b", " ", " c"]
        );
        assert_eq!(split_keeping_separator("ab", ""), vec!["a", "b"]);
    }
}
