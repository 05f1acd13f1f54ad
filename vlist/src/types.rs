/// An inclusive interval of item indexes.
///
/// A list with no items still reports the canonical `Range { start: 0, end: 0 }`; callers pair a
/// range with the list's item count to tell "one item" from "no items".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub start: usize,
    pub end: usize, // inclusive
}

impl Range {
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    /// Creates a range, swapping the bounds if they are given in descending order.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }

    /// Returns `true` when the two ranges overlap or touch end-to-start.
    pub fn is_adjacent_or_overlapping(&self, other: &Range) -> bool {
        self.start <= other.end.saturating_add(1) && other.start <= self.end.saturating_add(1)
    }

    /// Clamps the range into `[0, count - 1]`. Returns `None` when nothing remains.
    pub fn clamp_to(&self, count: usize) -> Option<Range> {
        if count == 0 || self.start >= count {
            return None;
        }
        Some(Range {
            start: self.start,
            end: self.end.min(count - 1),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
    /// Keeps the current position when the item is fully visible, otherwise scrolls the nearest
    /// edge into view.
    Auto,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    Forward,
    Backward,
}

/// The mapping between the real content extent and the scroll extent exposed to the host.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressionState {
    pub is_compressed: bool,
    /// Sum of all item sizes.
    pub actual_height: f64,
    /// `min(actual_height, max_extent)`.
    pub virtual_height: f64,
    /// `virtual_height / actual_height`, or `1.0` when not compressed.
    pub ratio: f64,
}

impl CompressionState {
    pub const IDENTITY: Self = Self {
        is_compressed: false,
        actual_height: 0.0,
        virtual_height: 0.0,
        ratio: 1.0,
    };
}

impl Default for CompressionState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Where a rendered item sits in scroll space.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemPlacement {
    pub index: usize,
    /// Start offset in scroll space. In a compressed list this is relative to the virtual
    /// scroll extent, so it can be used directly as the item's translate.
    pub offset: f64,
    pub size: f64,
}

impl ItemPlacement {
    pub fn end(&self) -> f64 {
        self.offset + self.size
    }
}
