use vlist::Range;

use crate::{ChunkState, ChunkStore};

/// Chunk-aligned spans of `range` that are neither loaded nor loading, merged.
///
/// Spans are clipped to the store's total once it is known.
pub fn calculate_missing_ranges<T>(store: &ChunkStore<T>, range: Range) -> Vec<Range> {
    let range = Range::new(range.start, range.end);
    let total = store.total();
    if total > 0 && range.start >= total {
        return Vec::new();
    }
    let gaps = store
        .chunks_in(range)
        .filter(|&chunk| store.chunk_state(chunk) == ChunkState::Absent)
        .map(|chunk| store.chunk_bounds(chunk))
        .filter(|bounds| total == 0 || bounds.start < total);
    merge_ranges(gaps)
}

/// Sorts `ranges` and merges every overlapping or touching pair.
///
/// The output is sorted, disjoint and non-adjacent, so merging it again is a no-op.
pub fn merge_ranges(ranges: impl IntoIterator<Item = Range>) -> Vec<Range> {
    let mut ranges: Vec<Range> = ranges
        .into_iter()
        .map(|r| Range::new(r.start, r.end))
        .collect();
    ranges.sort_unstable_by_key(|r| (r.start, r.end));

    let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if last.is_adjacent_or_overlapping(&range) => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}
