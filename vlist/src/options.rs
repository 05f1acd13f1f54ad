use std::sync::Arc;

use crate::ConfigError;

/// Default host limit on a scrollable extent, in pixels.
///
/// Browsers and most native toolkits stop honoring element sizes somewhere in the tens of
/// millions of pixels; beyond this the list switches to a compressed scroll space.
pub const DEFAULT_MAX_EXTENT: f64 = 16_000_000.0;

/// Per-item size source in the scroll axis.
#[derive(Clone)]
pub enum ItemSize {
    /// Every item has the same size.
    Fixed(f64),
    /// Size of the item at a given index. Must be finite and positive.
    Fn(Arc<dyn Fn(usize) -> f64 + Send + Sync>),
}

impl ItemSize {
    pub fn from_fn(f: impl Fn(usize) -> f64 + Send + Sync + 'static) -> Self {
        Self::Fn(Arc::new(f))
    }
}

impl std::fmt::Debug for ItemSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            Self::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

/// Configuration for [`crate::VirtualList`].
///
/// Cheap to clone: the size function lives behind an `Arc`.
#[derive(Clone, Debug)]
pub struct ListOptions {
    pub count: usize,
    pub item_size: ItemSize,
    /// Extra items rendered on each side of the visible range.
    pub overscan: usize,
    /// Largest scroll extent the host can address.
    pub max_extent: f64,
    pub viewport_extent: f64,
    /// Scroll position applied by `VirtualList::new`.
    pub initial_offset: f64,
}

impl ListOptions {
    /// Options for a list of `count` items that all have the same `size`.
    pub fn new(count: usize, size: f64) -> Self {
        Self::with_item_size(count, ItemSize::Fixed(size))
    }

    /// Options for a list whose item sizes come from `size(index)`.
    pub fn with_size_fn(count: usize, size: impl Fn(usize) -> f64 + Send + Sync + 'static) -> Self {
        Self::with_item_size(count, ItemSize::from_fn(size))
    }

    pub fn with_item_size(count: usize, item_size: ItemSize) -> Self {
        Self {
            count,
            item_size,
            overscan: 3,
            max_extent: DEFAULT_MAX_EXTENT,
            viewport_extent: 0.0,
            initial_offset: 0.0,
        }
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_max_extent(mut self, max_extent: f64) -> Self {
        self.max_extent = max_extent;
        self
    }

    pub fn with_viewport_extent(mut self, viewport_extent: f64) -> Self {
        self.viewport_extent = viewport_extent;
        self
    }

    pub fn with_initial_offset(mut self, initial_offset: f64) -> Self {
        self.initial_offset = initial_offset;
        self
    }

    /// Checks the scalar fields. Item sizes are checked when the height index is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_extent.is_finite() && self.max_extent > 0.0) {
            return Err(ConfigError::InvalidMaxExtent(self.max_extent));
        }
        check_viewport(self.viewport_extent)
    }
}

pub(crate) fn check_viewport(extent: f64) -> Result<(), ConfigError> {
    if extent.is_finite() && extent >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidViewport(extent))
    }
}

/// Tuning for [`crate::VelocityTracker`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VelocityOptions {
    /// A gap between samples longer than this starts a new gesture.
    pub stale_gap_ms: f64,
    /// Samples needed since the last reset before the estimate is trusted.
    pub min_samples: usize,
}

impl Default for VelocityOptions {
    fn default() -> Self {
        Self {
            stale_gap_ms: 100.0,
            min_samples: 3,
        }
    }
}

impl VelocityOptions {
    pub fn with_stale_gap_ms(mut self, stale_gap_ms: f64) -> Self {
        self.stale_gap_ms = stale_gap_ms;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_samples < 2 || self.min_samples > crate::velocity::CAPACITY {
            return Err(ConfigError::InvalidMinSamples(self.min_samples));
        }
        Ok(())
    }
}
