use crate::{ConfigError, ScrollDirection, VelocityOptions};

/// Ring buffer capacity of [`VelocityTracker`].
pub const CAPACITY: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VelocitySample {
    pub position: f64,
    pub time: f64,
}

/// Scroll speed estimate over a fixed window of recent samples.
///
/// Samples are written into a fixed array in place; nothing allocates after construction.
/// The estimate is `(newest.position - oldest.position) / (newest.time - oldest.time)` across
/// the buffered window and is only reliable once `min_samples` have been seen since the last
/// reset. A sample arriving more than `stale_gap_ms` after the previous one starts a new
/// gesture: the buffer is cleared and velocity drops to zero.
#[derive(Clone, Debug)]
pub struct VelocityTracker {
    options: VelocityOptions,
    samples: [VelocitySample; CAPACITY],
    head: usize, // next write slot
    len: usize,
    velocity: f64, // signed, px/ms
}

impl Default for VelocityTracker {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl VelocityTracker {
    pub fn new(options: VelocityOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            options,
            samples: [VelocitySample::default(); CAPACITY],
            head: 0,
            len: 0,
            velocity: 0.0,
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            options: VelocityOptions::default(),
            samples: [VelocitySample::default(); CAPACITY],
            head: 0,
            len: 0,
            velocity: 0.0,
        }
    }

    pub fn options(&self) -> &VelocityOptions {
        &self.options
    }

    /// Records a scroll position observed at `now_ms`.
    pub fn update(&mut self, position: f64, now_ms: f64) {
        let sample = VelocitySample {
            position,
            time: now_ms,
        };
        let Some(prev) = self.newest() else {
            self.push(sample);
            self.velocity = 0.0;
            return;
        };

        if now_ms - prev.time > self.options.stale_gap_ms {
            vtrace!(gap_ms = now_ms - prev.time, "velocity: stale gap, reset");
            self.clear();
            self.push(sample);
            return;
        }

        self.push(sample);
        let oldest = self.oldest().unwrap_or(sample);
        let dt = sample.time - oldest.time;
        if dt > 0.0 {
            self.velocity = (sample.position - oldest.position) / dt;
        }
    }

    /// Starts a fresh baseline at `position`, e.g. when the view goes idle.
    pub fn reset_baseline(&mut self, position: f64, now_ms: f64) {
        self.clear();
        self.push(VelocitySample {
            position,
            time: now_ms,
        });
    }

    /// Absolute speed in pixels per millisecond.
    pub fn velocity(&self) -> f64 {
        self.velocity.abs()
    }

    /// Signed speed; positive values scroll toward the end of the list.
    pub fn signed_velocity(&self) -> f64 {
        self.velocity
    }

    pub fn direction(&self) -> Option<ScrollDirection> {
        if self.velocity > 0.0 {
            Some(ScrollDirection::Forward)
        } else if self.velocity < 0.0 {
            Some(ScrollDirection::Backward)
        } else {
            None
        }
    }

    pub fn is_reliable(&self) -> bool {
        self.len >= self.options.min_samples
    }

    pub fn sample_count(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.velocity = 0.0;
    }

    fn push(&mut self, sample: VelocitySample) {
        self.samples[self.head] = sample;
        self.head = (self.head + 1) % CAPACITY;
        self.len = (self.len + 1).min(CAPACITY);
    }

    fn newest(&self) -> Option<VelocitySample> {
        if self.len == 0 {
            return None;
        }
        Some(self.samples[(self.head + CAPACITY - 1) % CAPACITY])
    }

    fn oldest(&self) -> Option<VelocitySample> {
        if self.len == 0 {
            return None;
        }
        Some(self.samples[(self.head + CAPACITY - self.len) % CAPACITY])
    }
}
