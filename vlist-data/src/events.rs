use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use vlist::Range;

use crate::{DataError, LoadContext};

/// Lifecycle notifications of a [`crate::DataManager`].
#[derive(Clone, Debug)]
pub enum DataEvent {
    /// Emitted right before the adapter is called.
    LoadStart { offset: usize, limit: usize },
    /// The adapter resolved; `count` items were returned.
    LoadEnd { offset: usize, count: usize },
    Error {
        error: DataError,
        context: LoadContext,
    },
    /// The committed render range changed.
    RangeChange { range: Range },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    LoadStart,
    LoadEnd,
    Error,
    RangeChange,
}

impl DataEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::LoadStart { .. } => EventKind::LoadStart,
            Self::LoadEnd { .. } => EventKind::LoadEnd,
            Self::Error { .. } => EventKind::Error,
            Self::RangeChange { .. } => EventKind::RangeChange,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&DataEvent)>;

/// Fire-and-observe fan-out.
///
/// Handlers run in subscription order. A handler may subscribe, unsubscribe or call back into
/// the manager while an event is being delivered; the set of handlers for that event is fixed
/// when emission starts. A panicking handler is logged and skipped.
#[derive(Default)]
pub struct EventBus {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(SubscriptionId, Option<EventKind>, Handler)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to every event.
    pub fn subscribe(&self, handler: impl Fn(&DataEvent) + 'static) -> SubscriptionId {
        self.insert(None, Rc::new(handler))
    }

    /// Subscribes to events of one kind.
    pub fn subscribe_kind(
        &self,
        kind: EventKind,
        handler: impl Fn(&DataEvent) + 'static,
    ) -> SubscriptionId {
        self.insert(Some(kind), Rc::new(handler))
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(sub, _, _)| *sub != id);
        handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    pub fn emit(&self, event: &DataEvent) {
        let kind = event.kind();
        let targets: Vec<Handler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, filter, _)| filter.is_none_or(|k| k == kind))
            .map(|(_, _, handler)| handler.clone())
            .collect();
        vtrace!(?kind, handlers = targets.len(), "emit");
        for handler in targets {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                vwarn!(?kind, "event handler panicked");
            }
        }
    }

    fn insert(&self, kind: Option<EventKind>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.handlers.borrow_mut().push((id, kind, handler));
        id
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}
