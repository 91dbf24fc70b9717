//! Context assembly for grounded prompts.

use crate::vector_store::SearchResult;
use tracing::warn;

/// Delimiter placed between retrieved chunks in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// A context block ready to be placed in the prompt.
#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    pub text: String,
    /// Number of retrieved chunks that made it into `text`.
    pub used: usize,
    /// Number of retrieved chunks left out to stay within the budget.
    pub dropped: usize,
}

/// Join retrieved chunk texts in rank order, bounded by `max_chars`.
///
/// Chunks are added until the next one would push the block past the
/// budget. The first chunk is always kept and cut at a char boundary if it
/// alone exceeds the budget. No deduplication or re-ranking.
pub fn assemble_context(results: &[SearchResult], max_chars: usize) -> AssembledContext {
    let mut text = String::new();
    let mut length = 0usize;
    let mut used = 0usize;

    for result in results {
        let chunk_text = result.chunk.text.as_str();
        let chunk_len = chunk_text.chars().count();

        if used == 0 {
            if chunk_len > max_chars {
                warn!(
                    "Chunk {} is {} chars, truncating to {}",
                    result.chunk.id, chunk_len, max_chars
                );
                text.extend(chunk_text.chars().take(max_chars));
                length = max_chars;
            } else {
                text.push_str(chunk_text);
                length = chunk_len;
            }
            used = 1;
            continue;
        }

        let separator_len = CONTEXT_SEPARATOR.chars().count();
        if length + separator_len + chunk_len > max_chars {
            break;
        }

        text.push_str(CONTEXT_SEPARATOR);
        text.push_str(chunk_text);
        length += separator_len + chunk_len;
        used += 1;
    }

    let dropped = results.len() - used;
    if dropped > 0 {
        warn!(
            "Context budget of {} chars reached, dropped {} of {} retrieved chunks",
            max_chars,
            dropped,
            results.len()
        );
    }

    AssembledContext {
        text,
        used,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::StoredChunk;

    fn result(id: &str, text: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk: StoredChunk::new(id.to_string(), text.to_string(), String::new(), vec![], 0),
            score,
        }
    }

    #[test]
    fn test_joins_in_rank_order() {
        let results = vec![result("chunk_3", "third", 0.9), result("chunk_1", "first", 0.5)];
        let context = assemble_context(&results, 24_000);

        assert_eq!(context.text, "third\n\n---\n\nfirst");
        assert_eq!(context.used, 2);
        assert_eq!(context.dropped, 0);
    }

    #[test]
    fn test_empty_results_give_empty_context() {
        let context = assemble_context(&[], 24_000);
        assert!(context.text.is_empty());
        assert_eq!(context.used, 0);
    }

    #[test]
    fn test_stops_before_exceeding_budget() {
        let results = vec![
            result("chunk_1", &"a".repeat(40), 0.9),
            result("chunk_2", &"b".repeat(40), 0.8),
            result("chunk_3", &"c".repeat(5), 0.7),
        ];
        let context = assemble_context(&results, 60);

        assert_eq!(context.text, "a".repeat(40));
        assert_eq!(context.used, 1);
        assert_eq!(context.dropped, 2);
    }

    #[test]
    fn test_oversized_first_chunk_truncated_on_char_boundary() {
        let results = vec![result("chunk_1", &"é".repeat(30), 0.9)];
        let context = assemble_context(&results, 10);

        assert_eq!(context.text, "é".repeat(10));
        assert_eq!(context.used, 1);
    }
}
