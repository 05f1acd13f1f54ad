//! A sparse, paged item cache for [`vlist`] lists.
//!
//! Items are fetched page by page from a [`PagingAdapter`] and held in a [`ChunkStore`] keyed
//! by absolute index, so a list of millions of rows only keeps what is near the viewport.
//!
//! - [`DataManager`]: range requests split into chunks, with at most one fetch in flight per
//!   chunk, eviction of least-recently-used chunks, and lifecycle events.
//! - [`LoadScheduler`]: velocity gating. Fast flings defer loading, moderate speeds preload
//!   ahead, slow scrolling loads exactly the render range.
//! - [`PlaceholderSynthesizer`]: stand-in items shaped like the real ones.
//! - [`ScrollController`]: the scroll handler tying a [`vlist::VirtualList`] to all of the
//!   above.
//!
//! Everything runs in one single-threaded scheduling domain; loads are `futures` tasks the
//! host spawns on its own local executor.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod adapter;
mod chunk_store;
mod controller;
mod error;
mod events;
mod manager;
mod options;
mod placeholder;
mod ranges;
mod scheduler;


pub use adapter::{Item, PagingAdapter, ReadFuture, ReadParams, ReadResponse, VecAdapter};
pub use chunk_store::{ChunkState, ChunkStore, MergeStats};
pub use controller::ScrollController;
pub use error::{AdapterError, DataConfigError, DataError, LoadContext};
pub use events::{DataEvent, EventBus, EventKind, SubscriptionId};
pub use manager::DataManager;
pub use options::{DataOptions, PlaceholderOptions, SchedulerOptions};
pub use placeholder::{
    FieldKind, FieldShape, PLACEHOLDER_FLAG, PlaceholderSynthesizer, is_placeholder,
};
pub use ranges::{calculate_missing_ranges, merge_ranges};
pub use scheduler::{LoadPlan, LoadScheduler, ScrollSample, VelocityZone, widen};
