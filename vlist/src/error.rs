use thiserror::Error;

/// Invalid list configuration. Raised synchronously when a list is built or rebuilt.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("item size must be finite and positive, got {size} for index {index}")]
    InvalidItemSize { index: usize, size: f64 },
    #[error("max extent must be finite and positive, got {0}")]
    InvalidMaxExtent(f64),
    #[error("viewport extent must be finite and non-negative, got {0}")]
    InvalidViewport(f64),
    #[error("velocity min samples must be between 2 and the tracker capacity, got {0}")]
    InvalidMinSamples(usize),
}
