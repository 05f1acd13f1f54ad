use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Failure reported by a [`crate::PagingAdapter`].
///
/// Cloneable so one failed fetch can be observed by every deduplicated requester.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct AdapterError {
    message: String,
    #[source]
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl AdapterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The operation a load was issued for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadContext {
    EnsureRange,
    LoadMore,
    Reload,
    InitialLoad,
}

impl LoadContext {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnsureRange => "ensure_range",
            Self::LoadMore => "load_more",
            Self::Reload => "reload",
            Self::InitialLoad => "initial_load",
        }
    }
}

impl fmt::Display for LoadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid data-engine configuration. Raised synchronously at construction.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DataConfigError {
    #[error("chunk size must be positive")]
    ZeroChunkSize,
    #[error("page size must be positive")]
    ZeroPageSize,
    #[error("placeholder sample size must be positive")]
    ZeroSampleSize,
    #[error("id field name must not be empty")]
    EmptyIdField,
    #[error("preload threshold {preload} px/ms exceeds cancel threshold {cancel} px/ms")]
    InvalidThresholds { preload: f64, cancel: f64 },
    #[error("idle timeout must be finite and positive, got {0}")]
    InvalidIdleTimeout(f64),
    #[error(transparent)]
    Geometry(#[from] vlist::ConfigError),
}

#[derive(Clone, Debug, Error)]
pub enum DataError {
    #[error("{context} failed: {source}")]
    Adapter {
        context: LoadContext,
        #[source]
        source: AdapterError,
    },
    #[error(transparent)]
    Config(#[from] DataConfigError),
}

impl DataError {
    /// The failing operation, for adapter errors.
    pub fn context(&self) -> Option<LoadContext> {
        match self {
            Self::Adapter { context, .. } => Some(*context),
            Self::Config(_) => None,
        }
    }
}
