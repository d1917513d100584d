//! Shared merge pass: fold undersized chunks into their next neighbour.
//!
//! The pass walks the chunk sequence once, holding at most one pending
//! undersized chunk. Content is joined with a blank line; id and metadata
//! combination is family-specific and supplied by the caller.

use lexrag_core::chunk::{Chunk, ChunkMetadata};
use lexrag_core::char_len;

/// Separator inserted between merged chunk bodies.
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Merge chunks smaller than `min_size` into their successors, never
/// producing a chunk larger than `max_size`.
///
/// `combine` derives the merged chunk's id and metadata from the pending
/// (left) and current (right) chunks; the content join is handled here.
///
/// Guarantees over the output:
/// - every chunk is at least `min_size` long, except possibly the last;
/// - no chunk produced *by merging* exceeds `max_size` (a chunk that
///   arrived oversized is passed through untouched);
/// - a trailing undersized chunk is flushed, never dropped.
pub fn merge_undersized<F>(
    chunks: Vec<Chunk>,
    min_size: usize,
    max_size: usize,
    combine: F,
) -> Vec<Chunk>
where
    F: Fn(&Chunk, &Chunk) -> (String, ChunkMetadata),
{
    let mut result = Vec::with_capacity(chunks.len());
    let mut pending: Option<Chunk> = None;

    for chunk in chunks {
        match pending.take() {
            None => {
                if chunk.len() >= min_size {
                    result.push(chunk);
                } else {
                    pending = Some(chunk);
                }
            }
            Some(held) => {
                let merged_len = held.len() + char_len(CHUNK_SEPARATOR) + chunk.len();
                if merged_len <= max_size {
                    let (id, metadata) = combine(&held, &chunk);
                    let content =
                        format!("{}{}{}", held.content, CHUNK_SEPARATOR, chunk.content);
                    let merged = Chunk {
                        id,
                        content,
                        metadata,
                    };
                    if merged.len() < min_size {
                        pending = Some(merged);
                    } else {
                        result.push(merged);
                    }
                } else {
                    // Merging would overflow: flush the held chunk as-is and
                    // restart the pending logic on the current one.
                    result.push(held);
                    if chunk.len() >= min_size {
                        result.push(chunk);
                    } else {
                        pending = Some(chunk);
                    }
                }
            }
        }
    }

    // A trailing undersized chunk is kept regardless of size.
    if let Some(held) = pending {
        result.push(held);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexrag_core::chunk::ViolationMetadata;

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            content: content.to_string(),
            metadata: ChunkMetadata::Violation(ViolationMetadata {
                category: "test".into(),
                title: None,
                url: None,
            }),
        }
    }

    /// Combine that keeps the left chunk's metadata and concatenates ids.
    fn keep_left(a: &Chunk, b: &Chunk) -> (String, ChunkMetadata) {
        (format!("{}+{}", a.id, b.id), a.metadata.clone())
    }

    fn lens(chunks: &[Chunk]) -> Vec<usize> {
        chunks.iter().map(Chunk::len).collect()
    }

    #[test]
    fn large_chunks_pass_through() {
        let input = vec![chunk("a", &"x".repeat(150)), chunk("b", &"y".repeat(200))];
        let out = merge_undersized(input, 100, 2000, keep_left);
        assert_eq!(lens(&out), vec![150, 200]);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn small_chunk_merges_into_next() {
        let input = vec![chunk("a", &"x".repeat(80)), chunk("b", &"y".repeat(150))];
        let out = merge_undersized(input, 100, 2000, keep_left);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a+b");
        // 80 + separator (2) + 150
        assert_eq!(out[0].len(), 232);
        assert!(out[0].content.contains("\n\n"));
    }

    #[test]
    fn chain_of_small_chunks_accumulates() {
        let input = vec![
            chunk("a", &"x".repeat(30)),
            chunk("b", &"y".repeat(30)),
            chunk("c", &"z".repeat(40)),
        ];
        let out = merge_undersized(input, 100, 2000, keep_left);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a+b+c");
        assert_eq!(out[0].len(), 30 + 2 + 30 + 2 + 40);
    }

    #[test]
    fn overflow_flushes_pending_unmerged() {
        let input = vec![chunk("a", &"x".repeat(80)), chunk("b", &"y".repeat(1950))];
        let out = merge_undersized(input, 100, 2000, keep_left);
        // 80 + 2 + 1950 > 2000, so both survive separately.
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "a");
        assert_eq!(out[0].len(), 80);
        assert_eq!(out[1].id, "b");
    }

    #[test]
    fn trailing_small_chunk_is_flushed() {
        let input = vec![chunk("a", &"x".repeat(150)), chunk("b", &"y".repeat(10))];
        let out = merge_undersized(input, 100, 2000, keep_left);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].id, "b");
        assert_eq!(out[1].len(), 10);
    }

    #[test]
    fn single_small_chunk_survives() {
        let out = merge_undersized(vec![chunk("a", "short")], 100, 2000, keep_left);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out = merge_undersized(vec![], 100, 2000, keep_left);
        assert!(out.is_empty());
    }

    #[test]
    fn all_outputs_meet_min_except_last() {
        let input = vec![
            chunk("a", &"x".repeat(20)),
            chunk("b", &"y".repeat(30)),
            chunk("c", &"z".repeat(120)),
            chunk("d", &"w".repeat(40)),
            chunk("e", &"v".repeat(15)),
        ];
        let out = merge_undersized(input, 100, 2000, keep_left);
        for c in &out[..out.len() - 1] {
            assert!(c.len() >= 100, "chunk {} below min: {}", c.id, c.len());
        }
    }

    #[test]
    fn merge_never_exceeds_max() {
        let input: Vec<Chunk> = (0..20)
            .map(|i| chunk(&format!("c{i}"), &"x".repeat(90)))
            .collect();
        let out = merge_undersized(input, 100, 200, keep_left);
        for c in &out {
            assert!(c.len() <= 200, "chunk {} over max: {}", c.id, c.len());
        }
    }
}
