use crate::compression::split_index;
use crate::{Align, CompressionMap, ItemPlacement, Range};

/// Items intersecting the viewport at `scroll`.
///
/// Starts at the item under the viewport's top edge and walks forward accumulating real item
/// sizes until the viewport is covered, so the cost is proportional to the number of visible
/// items rather than the list length.
pub fn visible_range(scroll: f64, map: &CompressionMap<'_>) -> Range {
    let heights = map.heights();
    let total = heights.total();
    if total == 0 {
        return Range::EMPTY;
    }

    let exact = map.to_index(scroll);
    let (start, within) = split_index(exact, total);
    let view = map.viewport();

    let mut covered = heights.size(start) * (1.0 - within);
    let mut end = start;
    while covered < view && end + 1 < total {
        end += 1;
        covered += heights.size(end);
    }
    Range { start, end }
}

/// Expands `visible` by `overscan` items on each side, clamped to `[0, total - 1]`.
pub fn render_range(visible: Range, overscan: usize, total: usize) -> Range {
    if total == 0 {
        return Range::EMPTY;
    }
    let last = total - 1;
    Range {
        start: visible.start.saturating_sub(overscan).min(last),
        end: visible.end.saturating_add(overscan).min(last),
    }
}

/// Clamped scroll position that brings `index` into view with the given alignment.
pub fn scroll_to_position(index: usize, align: Align, current: f64, map: &CompressionMap<'_>) -> f64 {
    map.to_position(index, align, current)
}

/// Calls `f` with the scroll-space placement of every index in `range`.
///
/// Uncompressed lists place items at their content offsets. Compressed lists anchor the item
/// under the viewport's top edge at `scroll` and lay the rest out at their real sizes relative
/// to it.
pub fn for_each_placement(
    scroll: f64,
    range: Range,
    map: &CompressionMap<'_>,
    mut f: impl FnMut(ItemPlacement),
) {
    let heights = map.heights();
    let total = heights.total();
    if total == 0 {
        return;
    }
    let Some(range) = range.clamp_to(total) else {
        return;
    };

    let scroll = map.clamp_scroll(scroll);
    let base = if map.state().is_compressed {
        // Content offset that currently sits at the viewport's top edge.
        let top = heights.offset_at_exact_index(map.to_index(scroll));
        scroll - top
    } else {
        0.0
    };

    for index in range.start..=range.end {
        f(ItemPlacement {
            index,
            offset: base + heights.offset(index),
            size: heights.size(index),
        });
    }
}
