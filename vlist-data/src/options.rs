use crate::DataConfigError;

/// Placeholder synthesis settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceholderOptions {
    pub enabled: bool,
    /// Number of loaded items inspected to infer the item shape.
    pub sample_size: usize,
    /// Character repeated to mask string fields.
    pub mask_char: char,
    /// Vary string lengths per index inside the observed `[min, max]`.
    pub randomize: bool,
    pub seed: u64,
}

impl Default for PlaceholderOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_size: 20,
            mask_char: '█',
            randomize: true,
            seed: 0x5eed_1157,
        }
    }
}

impl PlaceholderOptions {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_mask_char(mut self, mask_char: char) -> Self {
        self.mask_char = mask_char;
        self
    }

    pub fn with_randomize(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), DataConfigError> {
        if self.sample_size == 0 {
            return Err(DataConfigError::ZeroSampleSize);
        }
        Ok(())
    }
}

/// Configuration for [`crate::DataManager`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataOptions {
    /// Items per chunk: the unit of load dedup and eviction.
    pub chunk_size: usize,
    /// Items requested by `load_more` and the initial load.
    pub page_size: usize,
    pub max_cached_items: usize,
    /// Items kept on each side of the committed range when evicting.
    pub eviction_buffer: usize,
    /// Field holding an item's identity, used by `update_item` / `remove_item`.
    pub id_field: String,
    pub placeholders: PlaceholderOptions,
}

impl Default for DataOptions {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            page_size: 100,
            max_cached_items: 10_000,
            eviction_buffer: 500,
            id_field: "id".to_owned(),
            placeholders: PlaceholderOptions::default(),
        }
    }
}

impl DataOptions {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_cached_items(mut self, max_cached_items: usize) -> Self {
        self.max_cached_items = max_cached_items;
        self
    }

    pub fn with_eviction_buffer(mut self, eviction_buffer: usize) -> Self {
        self.eviction_buffer = eviction_buffer;
        self
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn with_placeholders(mut self, placeholders: PlaceholderOptions) -> Self {
        self.placeholders = placeholders;
        self
    }

    pub fn validate(&self) -> Result<(), DataConfigError> {
        if self.chunk_size == 0 {
            return Err(DataConfigError::ZeroChunkSize);
        }
        if self.page_size == 0 {
            return Err(DataConfigError::ZeroPageSize);
        }
        if self.id_field.is_empty() {
            return Err(DataConfigError::EmptyIdField);
        }
        self.placeholders.validate()
    }
}

/// Velocity gating thresholds for [`crate::LoadScheduler`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerOptions {
    /// Above this speed (px/ms) loads are deferred.
    pub cancel_threshold: f64,
    /// Above this speed (px/ms) requests are widened in the scroll direction.
    pub preload_threshold: f64,
    /// Items added ahead of the render range in the preload zone.
    pub preload_ahead: usize,
    /// Time without scroll samples after which the view counts as idle.
    pub idle_timeout_ms: f64,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            cancel_threshold: 25.0,
            preload_threshold: 2.0,
            preload_ahead: 50,
            idle_timeout_ms: 150.0,
        }
    }
}

impl SchedulerOptions {
    pub fn with_cancel_threshold(mut self, cancel_threshold: f64) -> Self {
        self.cancel_threshold = cancel_threshold;
        self
    }

    pub fn with_preload_threshold(mut self, preload_threshold: f64) -> Self {
        self.preload_threshold = preload_threshold;
        self
    }

    pub fn with_preload_ahead(mut self, preload_ahead: usize) -> Self {
        self.preload_ahead = preload_ahead;
        self
    }

    pub fn with_idle_timeout_ms(mut self, idle_timeout_ms: f64) -> Self {
        self.idle_timeout_ms = idle_timeout_ms;
        self
    }

    pub fn validate(&self) -> Result<(), DataConfigError> {
        let (preload, cancel) = (self.preload_threshold, self.cancel_threshold);
        if !(preload.is_finite() && cancel.is_finite()) || preload < 0.0 || preload > cancel {
            return Err(DataConfigError::InvalidThresholds { preload, cancel });
        }
        if !(self.idle_timeout_ms.is_finite() && self.idle_timeout_ms > 0.0) {
            return Err(DataConfigError::InvalidIdleTimeout(self.idle_timeout_ms));
        }
        Ok(())
    }
}
