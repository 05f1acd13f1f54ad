use std::collections::{BTreeMap, HashMap, HashSet};

use vlist::Range;

use crate::Item;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChunkState {
    Absent,
    Loading,
    Loaded,
}

/// Counts reported by [`ChunkStore::merge_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Previously empty slots that were filled.
    pub added: usize,
    /// Occupied slots the caller allowed to be overwritten.
    pub replaced: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct ChunkMeta {
    filled: usize,
    touched: u64,
}

/// Sparse item storage partitioned into fixed-size chunks.
///
/// Items live at their absolute index, so growing or shrinking `total` never relocates an
/// item below the new bound. A chunk is [`ChunkState::Loaded`] once every slot it covers
/// (up to `total`, when known) is filled.
#[derive(Clone, Debug)]
pub struct ChunkStore<T = Item> {
    chunk_size: usize,
    items: BTreeMap<usize, T>,
    chunks: HashMap<usize, ChunkMeta>,
    loading: HashSet<usize>,
    total: usize,
    clock: u64,
}

impl<T> ChunkStore<T> {
    /// `chunk_size` is clamped to at least one item.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            items: BTreeMap::new(),
            chunks: HashMap::new(),
            loading: HashSet::new(),
            total: 0,
            clock: 0,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_of(&self, index: usize) -> usize {
        index / self.chunk_size
    }

    /// Index span of `chunk`, clipped to `total` once a total is known.
    pub fn chunk_bounds(&self, chunk: usize) -> Range {
        let start = chunk * self.chunk_size;
        let mut end = start + self.chunk_size - 1;
        if self.total > start {
            end = end.min(self.total - 1);
        }
        Range { start, end }
    }

    /// Chunks intersecting `range`.
    pub fn chunks_in(&self, range: Range) -> std::ops::RangeInclusive<usize> {
        self.chunk_of(range.start)..=self.chunk_of(range.end)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Sets the logical item count. Items at or past the new total are dropped.
    pub fn set_total(&mut self, total: usize) {
        if self.loaded_end() > total {
            let dropped = self.items.split_off(&total);
            for index in dropped.into_keys() {
                self.forget_slot(index);
            }
        }
        self.total = total;
    }

    /// Number of filled slots.
    pub fn cached_count(&self) -> usize {
        self.items.len()
    }

    /// One past the highest filled index, `0` when empty.
    pub fn loaded_end(&self) -> usize {
        self.items.keys().next_back().map_or(0, |&last| last + 1)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(&index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(&index)
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        self.items.contains_key(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.items.iter().map(|(&index, item)| (index, item))
    }

    pub fn chunk_state(&self, chunk: usize) -> ChunkState {
        if self.loading.contains(&chunk) {
            return ChunkState::Loading;
        }
        let filled = self.chunks.get(&chunk).map_or(0, |meta| meta.filled);
        if filled > 0 && filled >= self.chunk_bounds(chunk).len() {
            ChunkState::Loaded
        } else {
            ChunkState::Absent
        }
    }

    pub fn mark_loading(&mut self, chunk: usize) {
        self.loading.insert(chunk);
    }

    pub fn clear_loading(&mut self, chunk: usize) {
        self.loading.remove(&chunk);
    }

    /// Drops every loading mark.
    pub fn clear_all_loading(&mut self) {
        self.loading.clear();
    }

    pub fn loading_count(&self) -> usize {
        self.loading.len()
    }

    /// Writes `items` starting at `offset`, overwriting whatever is there.
    ///
    /// Returns the number of items written.
    pub fn set_range(&mut self, items: impl IntoIterator<Item = T>, offset: usize) -> usize {
        let stats = self.merge_with(items, offset, |_| true);
        stats.added + stats.replaced
    }

    /// Writes `items` starting at `offset`, keeping occupied slots unless `can_overwrite`
    /// allows replacing them.
    pub fn merge_with(
        &mut self,
        items: impl IntoIterator<Item = T>,
        offset: usize,
        can_overwrite: impl Fn(&T) -> bool,
    ) -> MergeStats {
        let stamp = self.tick();
        let mut stats = MergeStats::default();
        for (i, item) in items.into_iter().enumerate() {
            let index = offset + i;
            if self.total > 0 && index >= self.total {
                break;
            }
            match self.items.get_mut(&index) {
                Some(existing) => {
                    if can_overwrite(existing) {
                        *existing = item;
                        stats.replaced += 1;
                    }
                }
                None => {
                    self.items.insert(index, item);
                    stats.added += 1;
                    self.chunks.entry(index / self.chunk_size).or_default().filled += 1;
                }
            }
            if let Some(meta) = self.chunks.get_mut(&(index / self.chunk_size)) {
                meta.touched = stamp;
            }
        }
        stats
    }

    /// Marks every chunk in `range` as recently used.
    pub fn touch_range(&mut self, range: Range) {
        let stamp = self.tick();
        for chunk in self.chunks_in(range) {
            if let Some(meta) = self.chunks.get_mut(&chunk) {
                meta.touched = stamp;
            }
        }
    }

    /// Removes the item at `index` and shifts every later item down by one.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        let removed = self.items.remove(&index)?;
        let tail = self.items.split_off(&index);
        self.items
            .extend(tail.into_iter().map(|(i, item)| (i - 1, item)));
        if self.total > 0 {
            self.total -= 1;
        }
        self.rebuild_chunk_meta();
        Some(removed)
    }

    /// Evicts least-recently-touched chunks until at most `max_cached` items remain.
    ///
    /// Chunks intersecting `[keep.start - buffer, keep.end + buffer]` and chunks with a load
    /// in flight are never evicted. Returns the number of items removed.
    pub fn evict(&mut self, keep: Option<Range>, buffer: usize, max_cached: usize) -> usize {
        if self.items.len() <= max_cached {
            return 0;
        }
        let protected = keep.map(|keep| Range {
            start: keep.start.saturating_sub(buffer),
            end: keep.end.saturating_add(buffer),
        });

        let mut candidates: Vec<(u64, usize)> = self
            .chunks
            .iter()
            .filter(|&(chunk, meta)| {
                meta.filled > 0
                    && !self.loading.contains(chunk)
                    && !protected.is_some_and(|p| {
                        let bounds = self.chunk_bounds(*chunk);
                        bounds.start <= p.end && p.start <= bounds.end
                    })
            })
            .map(|(&chunk, meta)| (meta.touched, chunk))
            .collect();
        candidates.sort_unstable();

        let mut removed = 0;
        for (_, chunk) in candidates {
            if self.items.len() <= max_cached {
                break;
            }
            let bounds = self.chunk_bounds(chunk);
            let evicted: Vec<usize> = self
                .items
                .range(bounds.start..=bounds.end)
                .map(|(&index, _)| index)
                .collect();
            for index in &evicted {
                self.items.remove(index);
            }
            removed += evicted.len();
            self.chunks.remove(&chunk);
        }
        if removed > 0 {
            vdebug!(removed, cached = self.items.len(), "chunk store eviction");
        }
        removed
    }

    /// Drops every item and all loading marks. `total` is kept.
    pub fn clear(&mut self) {
        self.items.clear();
        self.chunks.clear();
        self.loading.clear();
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn forget_slot(&mut self, index: usize) {
        let chunk = index / self.chunk_size;
        if let Some(meta) = self.chunks.get_mut(&chunk) {
            meta.filled = meta.filled.saturating_sub(1);
            if meta.filled == 0 {
                self.chunks.remove(&chunk);
            }
        }
    }

    fn rebuild_chunk_meta(&mut self) {
        let touched: HashMap<usize, u64> = self
            .chunks
            .iter()
            .map(|(&chunk, meta)| (chunk, meta.touched))
            .collect();
        self.chunks.clear();
        for &index in self.items.keys() {
            let chunk = index / self.chunk_size;
            let meta = self.chunks.entry(chunk).or_default();
            meta.filled += 1;
            meta.touched = touched.get(&chunk).copied().unwrap_or(0);
        }
    }
}
