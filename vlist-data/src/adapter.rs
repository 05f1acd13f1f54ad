use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};

use crate::AdapterError;

/// One record of the list. Items are JSON-shaped so placeholders can mirror their fields.
pub type Item = serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadParams {
    pub offset: usize,
    pub limit: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadResponse {
    pub items: Vec<Item>,
    /// Total number of items the source currently holds.
    pub total: usize,
    /// When `None`, inferred from `cached < total`.
    pub has_more: Option<bool>,
}

pub type ReadFuture = LocalBoxFuture<'static, Result<ReadResponse, AdapterError>>;

/// A source of pages, supplied by the embedder.
///
/// `read` may be called again for a disjoint range while earlier reads are pending. Timeouts
/// and retries are the adapter's business; failures are surfaced as-is.
pub trait PagingAdapter: 'static {
    fn read(&self, params: ReadParams) -> ReadFuture;
}

impl<A: PagingAdapter + ?Sized> PagingAdapter for Rc<A> {
    fn read(&self, params: ReadParams) -> ReadFuture {
        (**self).read(params)
    }
}

impl<A: PagingAdapter + ?Sized> PagingAdapter for Box<A> {
    fn read(&self, params: ReadParams) -> ReadFuture {
        (**self).read(params)
    }
}

/// A fully in-memory source. Every read resolves immediately.
#[derive(Clone, Debug, Default)]
pub struct VecAdapter {
    items: Rc<Vec<Item>>,
}

impl VecAdapter {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: Rc::new(items),
        }
    }

    /// Serializes typed records into items.
    #[cfg(feature = "serde")]
    pub fn from_records<T: serde::Serialize>(
        records: impl IntoIterator<Item = T>,
    ) -> Result<Self, serde_json::Error> {
        let items = records
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(items))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PagingAdapter for VecAdapter {
    fn read(&self, params: ReadParams) -> ReadFuture {
        let total = self.items.len();
        let start = params.offset.min(total);
        let end = params.offset.saturating_add(params.limit).min(total);
        future::ready(Ok(ReadResponse {
            items: self.items[start..end].to_vec(),
            total,
            has_more: Some(end < total),
        }))
        .boxed_local()
    }
}
