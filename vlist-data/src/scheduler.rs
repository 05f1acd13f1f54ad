use vlist::{Range, ScrollDirection};

use crate::{DataConfigError, SchedulerOptions};

/// Speed band of one scroll sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VelocityZone {
    /// Too fast (or no reliable estimate yet): defer loading.
    Cancel,
    /// Fast: load ahead in the scroll direction.
    Preload,
    Normal,
}

/// What the scroll handler should load for one sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadPlan {
    /// The deferred range, released because the scroll slowed down.
    pub flush: Option<Range>,
    /// The range for this sample.
    pub load: Option<Range>,
}

impl LoadPlan {
    pub fn is_empty(&self) -> bool {
        self.flush.is_none() && self.load.is_none()
    }

    pub fn ranges(&self) -> impl Iterator<Item = Range> {
        self.flush.into_iter().chain(self.load)
    }
}

/// Input describing the scroll state at one sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSample {
    pub render: Range,
    /// Absolute speed in px/ms.
    pub velocity: f64,
    pub reliable: bool,
    pub direction: Option<ScrollDirection>,
    pub count: usize,
}

/// Velocity gating for range loads.
///
/// The cancel check runs first: while the scroll is in the cancel zone, only the latest render
/// range is remembered as pending (a newer one replaces it). The first sample out of the cancel
/// zone releases it, then the sample's own range is handled by the preload or normal zone. A
/// scroll sample requesting the same range as the previous request is suppressed.
#[derive(Clone, Debug, Default)]
pub struct LoadScheduler {
    options: SchedulerOptions,
    pending: Option<Range>,
    last_issued: Option<Range>,
    zone: Option<VelocityZone>,
}

impl LoadScheduler {
    pub fn new(options: SchedulerOptions) -> Result<Self, DataConfigError> {
        options.validate()?;
        Ok(Self {
            options,
            ..Self::default()
        })
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    pub fn pending(&self) -> Option<Range> {
        self.pending
    }

    pub fn last_issued(&self) -> Option<Range> {
        self.last_issued
    }

    /// Zone of the most recent sample.
    pub fn zone(&self) -> Option<VelocityZone> {
        self.zone
    }

    pub fn classify(&self, velocity: f64, reliable: bool) -> VelocityZone {
        if !reliable || velocity > self.options.cancel_threshold {
            VelocityZone::Cancel
        } else if velocity > self.options.preload_threshold {
            VelocityZone::Preload
        } else {
            VelocityZone::Normal
        }
    }

    pub fn on_scroll(&mut self, sample: ScrollSample) -> LoadPlan {
        let zone = self.classify(sample.velocity, sample.reliable);
        self.zone = Some(zone);

        if zone == VelocityZone::Cancel {
            vtrace!(render = ?sample.render, velocity = sample.velocity, "load deferred");
            self.pending = Some(sample.render);
            return LoadPlan::default();
        }

        let request = match zone {
            VelocityZone::Preload => {
                widen(sample.render, self.options.preload_ahead, sample.direction, sample.count)
            }
            _ => sample.render,
        };
        let flush = self
            .pending
            .take()
            .filter(|pending| !covers(request, *pending) && self.last_issued != Some(*pending));
        let load = self.issue(request);
        if flush.is_some() {
            vdebug!(range = ?flush, "pending range flushed");
        }
        LoadPlan { flush, load }
    }

    /// The view stopped scrolling: releases the pending range, if any.
    pub fn on_idle(&mut self) -> Option<Range> {
        let pending = self.pending.take()?;
        vdebug!(range = ?pending, "pending range flushed on idle");
        self.issue(pending)
    }

    /// A range that should load now regardless of velocity (resize, jump, new data).
    ///
    /// Always issued, even when equal to the last issued range: the data behind it may have
    /// been cleared or failed since. Loaded chunks cost nothing to request again.
    pub fn on_settled(&mut self, render: Range) -> Range {
        self.pending = None;
        self.last_issued = Some(render);
        render
    }

    /// Forgets the pending and last-issued ranges.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_issued = None;
        self.zone = None;
    }

    fn issue(&mut self, range: Range) -> Option<Range> {
        if self.last_issued == Some(range) {
            return None;
        }
        self.last_issued = Some(range);
        Some(range)
    }
}

/// Extends `range` by `ahead` items in the scroll direction, clamped to `count`.
pub fn widen(
    range: Range,
    ahead: usize,
    direction: Option<ScrollDirection>,
    count: usize,
) -> Range {
    let last = count.saturating_sub(1);
    match direction {
        Some(ScrollDirection::Forward) => Range {
            start: range.start,
            end: range.end.saturating_add(ahead).min(last).max(range.end),
        },
        Some(ScrollDirection::Backward) => Range {
            start: range.start.saturating_sub(ahead),
            end: range.end,
        },
        None => range,
    }
}

fn covers(outer: Range, inner: Range) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}
