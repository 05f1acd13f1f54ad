use crate::CompressionMap;
use crate::compression::split_index;

/// A scroll position expressed as "item `index`, `offset_in_item` pixels into it".
///
/// Unlike a raw scroll offset this survives changes to item sizes and to the compression
/// state: restoring lands on the same logical item, with the same fraction of it scrolled past
/// where the item's size allows.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollSnapshot {
    pub index: usize,
    /// Distance from the item's start to the viewport's top edge, in content pixels.
    pub offset_in_item: f64,
}

/// Captures the item at the viewport's top edge for `scroll`.
pub fn capture_snapshot(scroll: f64, map: &CompressionMap<'_>) -> ScrollSnapshot {
    let heights = map.heights();
    let total = heights.total();
    if total == 0 {
        return ScrollSnapshot::default();
    }
    let exact = map.to_index(scroll);
    let (index, within) = split_index(exact, total);
    ScrollSnapshot {
        index,
        offset_in_item: within * heights.size(index),
    }
}

/// Scroll position that restores `snapshot` under the current sizes and compression state.
pub fn restore_snapshot(snapshot: ScrollSnapshot, map: &CompressionMap<'_>) -> f64 {
    let heights = map.heights();
    let total = heights.total();
    if total == 0 {
        return 0.0;
    }
    let index = snapshot.index.min(total - 1);
    let size = heights.size(index);
    let within = if size > 0.0 {
        (snapshot.offset_in_item / size).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let exact = index as f64 + within;
    if map.state().is_compressed {
        map.position_for_exact_index(exact)
    } else {
        map.clamp_scroll(heights.offset(index) + within * size)
    }
}
