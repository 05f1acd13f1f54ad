use std::cmp;

use crate::compression::CompressionCache;
use crate::options::check_viewport;
use crate::range::{for_each_placement, render_range, visible_range};
use crate::snapshot::{capture_snapshot, restore_snapshot};
use crate::{
    Align, CompressionMap, CompressionState, ConfigError, HeightIndex, ItemPlacement, ItemSize,
    ListOptions, Range, ScrollDirection, ScrollSnapshot,
};

/// A headless, owned geometry state for one virtual list.
///
/// This type holds no UI objects and never reads a clock or a scroll container. The host drives
/// it by reporting viewport extent and scroll position, then asks for the visible and render
/// ranges. When `count × size` exceeds `max_extent` the list exposes a compressed scroll space
/// of exactly `max_extent` pixels; every query here already accounts for that.
#[derive(Clone, Debug)]
pub struct VirtualList {
    options: ListOptions,
    heights: HeightIndex,
    compression: CompressionCache,
    state: CompressionState,
    viewport: f64,
    scroll: f64,
    direction: Option<ScrollDirection>,
}

impl VirtualList {
    /// Builds a list from options, validating sizes and extents.
    pub fn new(options: ListOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let heights = HeightIndex::new(options.item_size.clone(), options.count)?;
        vdebug!(
            count = options.count,
            overscan = options.overscan,
            max_extent = options.max_extent,
            "VirtualList::new"
        );
        let mut list = Self {
            viewport: options.viewport_extent,
            scroll: 0.0,
            heights,
            compression: CompressionCache::default(),
            state: CompressionState::IDENTITY,
            direction: None,
            options,
        };
        list.refresh_compression();
        list.scroll = list.map().clamp_scroll(list.options.initial_offset);
        Ok(list)
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    pub fn count(&self) -> usize {
        self.options.count
    }

    pub fn height_index(&self) -> &HeightIndex {
        &self.heights
    }

    /// Changes the item count, rebuilding the height index and compression state.
    ///
    /// The scroll position is re-clamped into the new scroll space.
    pub fn set_count(&mut self, count: usize) -> Result<(), ConfigError> {
        if self.options.count == count {
            return Ok(());
        }
        self.heights.rebuild(count)?;
        self.options.count = count;
        self.refresh_compression();
        self.scroll = self.map().clamp_scroll(self.scroll);
        Ok(())
    }

    /// Replaces the item size source.
    ///
    /// Call this (or [`Self::invalidate_sizes`]) whenever item sizes may have changed.
    pub fn set_item_size(&mut self, item_size: ItemSize) -> Result<(), ConfigError> {
        self.heights.set_item_size(item_size.clone())?;
        self.options.item_size = item_size;
        self.compression.invalidate();
        self.refresh_compression();
        self.scroll = self.map().clamp_scroll(self.scroll);
        Ok(())
    }

    /// Re-reads every size from the current size function.
    pub fn invalidate_sizes(&mut self) -> Result<(), ConfigError> {
        self.heights.rebuild(self.options.count)?;
        self.compression.invalidate();
        self.refresh_compression();
        self.scroll = self.map().clamp_scroll(self.scroll);
        Ok(())
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        self.options.overscan = overscan;
    }

    pub fn set_max_extent(&mut self, max_extent: f64) -> Result<(), ConfigError> {
        if !(max_extent.is_finite() && max_extent > 0.0) {
            return Err(ConfigError::InvalidMaxExtent(max_extent));
        }
        self.options.max_extent = max_extent;
        self.compression.invalidate();
        self.refresh_compression();
        self.scroll = self.map().clamp_scroll(self.scroll);
        Ok(())
    }

    pub fn viewport_extent(&self) -> f64 {
        self.viewport
    }

    pub fn set_viewport_extent(&mut self, extent: f64) -> Result<(), ConfigError> {
        check_viewport(extent)?;
        self.viewport = extent;
        self.options.viewport_extent = extent;
        self.scroll = self.map().clamp_scroll(self.scroll);
        Ok(())
    }

    pub fn scroll_position(&self) -> f64 {
        self.scroll
    }

    /// Applies a scroll position reported by the host, clamped into `[0, max_scroll]`.
    ///
    /// Returns the applied position.
    pub fn set_scroll_position(&mut self, position: f64) -> f64 {
        let next = self.map().clamp_scroll(position);
        self.direction = match next.partial_cmp(&self.scroll) {
            Some(cmp::Ordering::Greater) => Some(ScrollDirection::Forward),
            Some(cmp::Ordering::Less) => Some(ScrollDirection::Backward),
            _ => self.direction,
        };
        self.scroll = next;
        vtrace!(position = next, "set_scroll_position");
        next
    }

    pub fn scroll_direction(&self) -> Option<ScrollDirection> {
        self.direction
    }

    pub fn compression_state(&self) -> CompressionState {
        self.state
    }

    pub fn is_compressed(&self) -> bool {
        self.state.is_compressed
    }

    /// Extent of the scroll space the host should size its scroll container to.
    pub fn scroll_extent(&self) -> f64 {
        self.map().scroll_extent()
    }

    /// Sum of all item sizes, regardless of compression.
    pub fn total_size(&self) -> f64 {
        self.heights.total_size()
    }

    pub fn max_scroll(&self) -> f64 {
        self.map().max_scroll()
    }

    /// The scroll-position ↔ index mapping for the current state.
    pub fn map(&self) -> CompressionMap<'_> {
        CompressionMap::new(&self.heights, self.state, self.viewport)
    }

    pub fn item_offset(&self, index: usize) -> Option<f64> {
        (index < self.options.count).then(|| self.heights.offset(index))
    }

    pub fn item_size(&self, index: usize) -> Option<f64> {
        (index < self.options.count).then(|| self.heights.size(index))
    }

    pub fn index_at_offset(&self, offset: f64) -> Option<usize> {
        (self.options.count > 0).then(|| self.heights.index_at_offset(offset))
    }

    /// Items intersecting the viewport at the current scroll position.
    ///
    /// Returns `None` for an empty list.
    pub fn visible_range(&self) -> Option<Range> {
        self.visible_range_for(self.scroll)
    }

    pub fn visible_range_for(&self, scroll: f64) -> Option<Range> {
        if self.options.count == 0 {
            return None;
        }
        Some(visible_range(scroll, &self.map()))
    }

    /// The visible range expanded by `overscan` items on each side.
    pub fn render_range(&self) -> Option<Range> {
        self.render_range_for(self.scroll)
    }

    pub fn render_range_for(&self, scroll: f64) -> Option<Range> {
        let visible = self.visible_range_for(scroll)?;
        Some(render_range(
            visible,
            self.options.overscan,
            self.options.count,
        ))
    }

    /// Calls `f` for every item in the render range with its scroll-space placement.
    pub fn for_each_rendered_item(&self, f: impl FnMut(ItemPlacement)) {
        let Some(range) = self.render_range() else {
            return;
        };
        for_each_placement(self.scroll, range, &self.map(), f);
    }

    /// Collects rendered item placements into `out` (clears `out` first).
    pub fn collect_rendered_items(&self, out: &mut Vec<ItemPlacement>) {
        out.clear();
        self.for_each_rendered_item(|it| out.push(it));
    }

    /// Scroll position that would bring `index` into view, without applying it.
    pub fn scroll_to_index_position(&self, index: usize, align: Align) -> f64 {
        self.map().to_position(index, align, self.scroll)
    }

    /// Scrolls to `index` and returns the applied position.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> f64 {
        let position = self.scroll_to_index_position(index, align);
        self.set_scroll_position(position)
    }

    /// Captures the current position as an item-relative snapshot.
    pub fn scroll_snapshot(&self) -> ScrollSnapshot {
        capture_snapshot(self.scroll, &self.map())
    }

    /// Restores a snapshot under the current sizes and compression state.
    ///
    /// Returns the applied position.
    pub fn restore_scroll(&mut self, snapshot: ScrollSnapshot) -> f64 {
        let position = restore_snapshot(snapshot, &self.map());
        self.set_scroll_position(position)
    }

    fn refresh_compression(&mut self) {
        self.state = self.compression.get(&self.heights, self.options.max_extent);
    }
}
