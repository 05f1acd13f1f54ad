//! A headless geometry engine for very large virtual lists.
//!
//! For the paged item cache that feeds a list (chunked storage, deduplicated loads,
//! velocity-gated scheduling, placeholders), see the `vlist-data` crate.
//!
//! This crate covers the math a list needs to render millions of rows at interactive frame
//! rates:
//!
//! - [`HeightIndex`]: prefix sums over item sizes with `O(log n)` offset → index lookup
//!   (`O(1)` for fixed-size items).
//! - [`CompressionMap`]: when `count × size` exceeds a host limit on scrollable extent
//!   (e.g. 16M pixels), scroll space is compressed so every item stays addressable and the
//!   last item is exactly reachable at max scroll.
//! - [`visible_range`] / [`render_range`] / [`scroll_to_position`]: range math on top of both.
//! - [`ScrollSnapshot`]: item-relative scroll capture that survives size and compression
//!   changes.
//! - [`VelocityTracker`]: a fixed-size ring buffer estimating scroll speed.
//!
//! [`VirtualList`] owns all of the above for one list instance. It is UI-agnostic: a host
//! supplies the viewport extent and scroll position and renders the returned ranges.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod compression;
mod error;
mod height_index;
mod list;
mod options;
mod range;
mod snapshot;
mod types;
mod velocity;

#[cfg(test)]
mod tests;

pub use compression::{CompressionCache, CompressionMap, compression_state};
pub use error::ConfigError;
pub use height_index::HeightIndex;
pub use list::VirtualList;
pub use options::{DEFAULT_MAX_EXTENT, ItemSize, ListOptions, VelocityOptions};
pub use range::{for_each_placement, render_range, scroll_to_position, visible_range};
pub use snapshot::{ScrollSnapshot, capture_snapshot, restore_snapshot};
pub use types::{Align, CompressionState, ItemPlacement, Range, ScrollDirection};
pub use velocity::{CAPACITY as VELOCITY_CAPACITY, VelocitySample, VelocityTracker};
