use crate::{Align, CompressionState, HeightIndex};

/// Index-space slack used when flooring fractional indexes, so a position that maps back onto
/// an item boundary through floating point does not land on the previous item.
pub(crate) const INDEX_EPSILON: f64 = 1e-6;

const BISECT_STEPS: usize = 64;

/// Computes the compression state for the current item sizes.
///
/// Pure in `(heights, max_extent)`; [`CompressionCache`] memoizes it by item count.
pub fn compression_state(heights: &HeightIndex, max_extent: f64) -> CompressionState {
    let actual_height = heights.total_size();
    if heights.total() == 0 || actual_height <= max_extent {
        return CompressionState {
            is_compressed: false,
            actual_height,
            virtual_height: actual_height,
            ratio: 1.0,
        };
    }
    CompressionState {
        is_compressed: true,
        actual_height,
        virtual_height: max_extent,
        ratio: max_extent / actual_height,
    }
}

/// Memoizes [`compression_state`] keyed by item count.
///
/// Owners call [`Self::invalidate`] when sizes change without the count changing.
#[derive(Clone, Debug, Default)]
pub struct CompressionCache {
    key: Option<usize>,
    state: CompressionState,
}

impl CompressionCache {
    /// Returns the cached state, recomputing it when the item count changed.
    pub fn get(&mut self, heights: &HeightIndex, max_extent: f64) -> CompressionState {
        if self.key != Some(heights.total()) {
            self.state = compression_state(heights, max_extent);
            self.key = Some(heights.total());
            vdebug!(
                total = heights.total(),
                compressed = self.state.is_compressed,
                ratio = self.state.ratio,
                "compression state recomputed"
            );
        }
        self.state
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }
}

/// Bidirectional mapping between scroll positions and item indexes.
///
/// Uncompressed lists map through the height index directly. Compressed lists map scroll
/// position linearly onto the index space, except inside the last viewport's worth of scroll
/// where the estimate is blended toward the exact "last items" window so the final item is
/// reachable at max scroll.
#[derive(Clone, Copy, Debug)]
pub struct CompressionMap<'a> {
    heights: &'a HeightIndex,
    state: CompressionState,
    viewport: f64,
}

impl<'a> CompressionMap<'a> {
    pub fn new(heights: &'a HeightIndex, state: CompressionState, viewport: f64) -> Self {
        Self {
            heights,
            state,
            viewport: viewport.max(0.0),
        }
    }

    pub fn heights(&self) -> &'a HeightIndex {
        self.heights
    }

    pub fn state(&self) -> CompressionState {
        self.state
    }

    pub fn viewport(&self) -> f64 {
        self.viewport
    }

    /// Extent of the scroll space the host sees.
    pub fn scroll_extent(&self) -> f64 {
        if self.state.is_compressed {
            self.state.virtual_height
        } else {
            self.heights.total_size()
        }
    }

    pub fn max_scroll(&self) -> f64 {
        (self.scroll_extent() - self.viewport).max(0.0)
    }

    pub fn clamp_scroll(&self, scroll: f64) -> f64 {
        if scroll.is_nan() {
            return 0.0;
        }
        scroll.clamp(0.0, self.max_scroll())
    }

    /// Fractional index of the item at the top of the viewport for `scroll`.
    pub fn to_index(&self, scroll: f64) -> f64 {
        let total = self.heights.total();
        if total == 0 {
            return 0.0;
        }
        let scroll = self.clamp_scroll(scroll);
        if !self.state.is_compressed {
            return self.heights.exact_index_at_offset(scroll);
        }

        let linear = scroll / self.state.virtual_height * total as f64;
        if self.viewport <= 0.0 {
            return linear;
        }
        let distance_from_bottom = self.max_scroll() - scroll;
        if distance_from_bottom > self.viewport {
            return linear;
        }
        let t = (1.0 - distance_from_bottom / self.viewport).clamp(0.0, 1.0);
        let bottom = self.bottom_window_start();
        linear + (bottom - linear) * t
    }

    /// Integer index of the item at the top of the viewport for `scroll`.
    pub fn index_at(&self, scroll: f64) -> usize {
        floor_index(self.to_index(scroll), self.heights.total())
    }

    /// Scroll position that puts `index` at the requested alignment, clamped to
    /// `[0, max_scroll]`.
    ///
    /// `current` is only consulted for [`Align::Auto`].
    pub fn to_position(&self, index: usize, align: Align, current: f64) -> f64 {
        let total = self.heights.total();
        if total == 0 {
            return 0.0;
        }
        let index = index.min(total - 1);
        let start = self.heights.offset(index);
        let size = self.heights.size(index);
        let view = self.viewport;

        // Target content offset for the viewport's top edge.
        let top = match align {
            Align::Start => start,
            Align::Center => start - (view - size) / 2.0,
            Align::End => start + size - view,
            Align::Auto => {
                let current = self.clamp_scroll(current);
                let cur_top = self.heights.offset_at_exact_index(self.to_index(current));
                if start >= cur_top && start + size <= cur_top + view {
                    return current;
                } else if start < cur_top {
                    start
                } else {
                    start + size - view
                }
            }
        };
        self.position_for_content_offset(top)
    }

    /// Scroll position whose viewport top sits at content offset `offset`.
    pub fn position_for_content_offset(&self, offset: f64) -> f64 {
        if !self.state.is_compressed {
            return self.clamp_scroll(offset);
        }
        let exact = self.heights.exact_index_at_offset(offset.max(0.0));
        self.position_for_exact_index(exact)
    }

    /// Inverse of [`Self::to_index`].
    ///
    /// Outside the bottom band the compressed mapping is linear. Inside it the blend is
    /// monotonic, so the smallest position reaching `exact` is found by bisection.
    pub fn position_for_exact_index(&self, exact: f64) -> f64 {
        let total = self.heights.total();
        if total == 0 {
            return 0.0;
        }
        if !self.state.is_compressed {
            return self.clamp_scroll(self.heights.offset_at_exact_index(exact));
        }

        let max_scroll = self.max_scroll();
        let linear = self.clamp_scroll(exact / total as f64 * self.state.virtual_height);
        let band_start = (max_scroll - self.viewport).max(0.0);
        if self.viewport <= 0.0 || linear < band_start {
            return linear;
        }
        if self.to_index(max_scroll) <= exact {
            return max_scroll;
        }

        let (mut lo, mut hi) = (band_start, max_scroll);
        for _ in 0..BISECT_STEPS {
            let mid = lo + (hi - lo) / 2.0;
            if self.to_index(mid) >= exact {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    }

    /// Fractional index at which the last viewport's worth of items begins.
    fn bottom_window_start(&self) -> f64 {
        let offset = (self.state.actual_height - self.viewport).max(0.0);
        self.heights.exact_index_at_offset(offset)
    }
}

pub(crate) fn floor_index(exact: f64, total: usize) -> usize {
    if total == 0 || exact.is_nan() || exact <= 0.0 {
        return 0;
    }
    ((exact + INDEX_EPSILON) as usize).min(total - 1)
}

/// Splits a fractional index into the item index and the fraction of it scrolled past.
///
/// Fractions within [`INDEX_EPSILON`] of an item boundary snap to the boundary.
pub(crate) fn split_index(exact: f64, total: usize) -> (usize, f64) {
    let index = floor_index(exact, total);
    let within = exact - index as f64;
    if within < INDEX_EPSILON {
        (index, 0.0)
    } else {
        (index, within.min(1.0))
    }
}
