use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture, Shared};
use serde_json::Value;
use vlist::Range;

use crate::{
    AdapterError, ChunkState, ChunkStore, DataConfigError, DataError, DataEvent, DataOptions,
    EventBus, EventKind, Item, LoadContext, PagingAdapter, PlaceholderSynthesizer, ReadFuture,
    ReadParams, ReadResponse, SubscriptionId, calculate_missing_ranges, is_placeholder,
};

/// Resolves to `true` when the response was merged, `false` when it was dropped as stale.
type LoadFuture = Shared<LocalBoxFuture<'static, Result<bool, DataError>>>;

#[derive(Clone)]
struct InFlight {
    id: u64,
    future: LoadFuture,
}

/// A load registered as in flight whose adapter call has not been made yet.
struct ClaimedLoad {
    span: Range,
    context: LoadContext,
    read_tx: oneshot::Sender<ReadFuture>,
    future: LoadFuture,
}

struct State {
    store: ChunkStore,
    placeholders: PlaceholderSynthesizer,
    in_flight: HashMap<usize, InFlight>,
    next_load: u64,
    // Bumped by `clear`/`reset`; completions from an older generation are dropped.
    generation: u64,
    total_known: bool,
    has_more: bool,
    error: Option<DataError>,
    committed: Option<Range>,
    keep: Option<Range>,
}

struct Inner<A> {
    adapter: A,
    options: DataOptions,
    events: EventBus,
    state: RefCell<State>,
}

/// Sparse, paged item cache in front of a [`PagingAdapter`].
///
/// `DataManager` is a cheap handle (`Clone` shares the same cache) for a single-threaded
/// scheduling domain. Range requests are split into fixed-size chunks; chunks already loaded
/// are served from memory, chunks already loading are joined, and the remaining gaps are
/// merged and fetched with one adapter call each. At most one fetch per chunk is in flight.
///
/// Loads are futures. They complete (merge results, update `total`, evict, emit events) when
/// polled; [`crate::ScrollController`] spawns them on a [`futures::task::LocalSpawn`].
/// A load whose future is dropped is picked up by the next request touching its chunks.
///
/// Adapter failures are recorded as [`Self::error`], emitted as [`DataEvent::Error`] and
/// returned from the request's future. They do not affect other in-flight loads.
pub struct DataManager<A> {
    inner: Rc<Inner<A>>,
}

impl<A> Clone for DataManager<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A> std::fmt::Debug for DataManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("DataManager")
            .field("total", &state.store.total())
            .field("cached", &state.store.cached_count())
            .field("in_flight", &state.in_flight.len())
            .field("has_more", &state.has_more)
            .finish()
    }
}

impl<A: PagingAdapter> DataManager<A> {
    pub fn new(adapter: A, options: DataOptions) -> Result<Self, DataConfigError> {
        options.validate()?;
        vdebug!(
            chunk_size = options.chunk_size,
            page_size = options.page_size,
            max_cached = options.max_cached_items,
            "DataManager::new"
        );
        let state = State {
            store: ChunkStore::new(options.chunk_size),
            placeholders: PlaceholderSynthesizer::new(
                options.placeholders.clone(),
                options.id_field.clone(),
            ),
            in_flight: HashMap::new(),
            next_load: 0,
            generation: 0,
            total_known: false,
            has_more: true,
            error: None,
            committed: None,
            keep: None,
        };
        Ok(Self {
            inner: Rc::new(Inner {
                adapter,
                options,
                events: EventBus::new(),
                state: RefCell::new(state),
            }),
        })
    }

    pub fn options(&self) -> &DataOptions {
        &self.inner.options
    }

    pub fn adapter(&self) -> &A {
        &self.inner.adapter
    }

    /// Makes sure items `start..=end` are loaded or loading.
    ///
    /// The returned future resolves once every chunk of the range has settled, with the first
    /// adapter error encountered, if any.
    pub fn ensure_range(
        &self,
        start: usize,
        end: usize,
    ) -> LocalBoxFuture<'static, Result<(), DataError>> {
        self.ensure(Range::new(start, end), LoadContext::EnsureRange)
    }

    /// Loads the first page.
    pub fn load_initial(&self) -> LocalBoxFuture<'static, Result<(), DataError>> {
        let page = self.first_page();
        match page {
            Some(page) => self.ensure(page, LoadContext::InitialLoad),
            None => future::ready(Ok(())).boxed_local(),
        }
    }

    /// Fetches the page after the cached tail.
    ///
    /// Resolves to `false` without calling the adapter when the tail already reaches
    /// `total` or another load is in flight.
    pub fn load_more(&self) -> LocalBoxFuture<'static, Result<bool, DataError>> {
        let claimed = {
            let mut state = self.inner.state.borrow_mut();
            if !state.in_flight.is_empty() || state.store.loading_count() > 0 {
                vtrace!("load_more skipped: load in flight");
                return future::ready(Ok(false)).boxed_local();
            }
            let start = state.store.loaded_end();
            let total = state.store.total();
            if state.total_known && start >= total {
                vtrace!(start, total, "load_more skipped: end of data");
                return future::ready(Ok(false)).boxed_local();
            }
            let mut end = start + self.inner.options.page_size - 1;
            if state.total_known {
                end = end.min(total - 1);
            }
            self.claim_load(&mut state, Range { start, end }, LoadContext::LoadMore)
        };
        self.issue_load(claimed).boxed_local()
    }

    /// Drops the cache and loads the first page again.
    pub fn reload(&self) -> LocalBoxFuture<'static, Result<(), DataError>> {
        self.reset();
        match self.first_page() {
            Some(page) => self.ensure(page, LoadContext::Reload),
            None => future::ready(Ok(())).boxed_local(),
        }
    }

    fn first_page(&self) -> Option<Range> {
        let state = self.inner.state.borrow();
        let end = self.inner.options.page_size - 1;
        if !state.total_known {
            return Some(Range { start: 0, end });
        }
        Range { start: 0, end }.clamp_to(state.store.total())
    }

    fn ensure(
        &self,
        requested: Range,
        context: LoadContext,
    ) -> LocalBoxFuture<'static, Result<(), DataError>> {
        let mut waits: Vec<LoadFuture> = Vec::new();
        let claimed = {
            let mut state = self.inner.state.borrow_mut();
            let range = if state.total_known {
                match requested.clamp_to(state.store.total()) {
                    Some(range) => range,
                    None => return future::ready(Ok(())).boxed_local(),
                }
            } else {
                requested
            };
            state.keep = Some(range);
            state.store.touch_range(range);

            let mut joined: Vec<u64> = Vec::new();
            for chunk in state.store.chunks_in(range) {
                if let Some(load) = state.in_flight.get(&chunk) {
                    if !joined.contains(&load.id) {
                        joined.push(load.id);
                        waits.push(load.future.clone());
                    }
                }
            }
            // Every gap is registered in flight before any event handler can run, so a
            // handler requesting the same chunks joins these loads.
            calculate_missing_ranges(&state.store, range)
                .into_iter()
                .map(|gap| self.claim_load(&mut state, gap, context))
                .collect::<Vec<_>>()
        };
        if !waits.is_empty() {
            vtrace!(joined = waits.len(), "joined in-flight loads");
        }
        for load in claimed {
            waits.push(self.issue_load(load));
        }
        async move {
            for result in future::join_all(waits).await {
                result?;
            }
            Ok::<(), DataError>(())
        }
        .boxed_local()
    }

    /// Marks the chunks of `span` loading and registers a shared completion for them.
    ///
    /// The completion waits for the adapter future handed over by [`Self::issue_load`].
    fn claim_load(&self, state: &mut State, span: Range, context: LoadContext) -> ClaimedLoad {
        let id = state.next_load;
        state.next_load += 1;
        let generation = state.generation;
        let (read_tx, read_rx) = oneshot::channel::<ReadFuture>();

        let weak = Rc::downgrade(&self.inner);
        let future = async move {
            let result = match read_rx.await {
                Ok(read) => read.await,
                Err(_) => Err(AdapterError::new("load dropped before the adapter was called")),
            };
            match weak.upgrade() {
                Some(inner) => inner.finish_load(id, generation, span, context, result),
                None => Ok(false),
            }
        }
        .boxed_local()
        .shared();

        for chunk in state.store.chunks_in(span) {
            state.store.mark_loading(chunk);
            state.in_flight.insert(
                chunk,
                InFlight {
                    id,
                    future: future.clone(),
                },
            );
        }
        ClaimedLoad {
            span,
            context,
            read_tx,
            future,
        }
    }

    /// Emits `LoadStart` and calls the adapter for a claimed load.
    fn issue_load(&self, load: ClaimedLoad) -> LoadFuture {
        let params = ReadParams {
            offset: load.span.start,
            limit: load.span.len(),
        };
        vdebug!(offset = params.offset, limit = params.limit, context = %load.context, "load issued");
        self.inner.events.emit(&DataEvent::LoadStart {
            offset: params.offset,
            limit: params.limit,
        });
        let read = self.inner.adapter.read(params);
        // The receiver lives inside `load.future`, which we still hold.
        let _ = load.read_tx.send(read);
        load.future
    }

    /// Item at `index`: the loaded item, a placeholder for an unloaded index below `total`,
    /// or `None`.
    pub fn get_item(&self, index: usize) -> Option<Item> {
        let state = self.inner.state.borrow();
        self.item_or_placeholder(&state, index)
    }

    /// Items `start..=end`, clipped to `total`.
    pub fn get_items_in_range(&self, start: usize, end: usize) -> Vec<Option<Item>> {
        let state = self.inner.state.borrow();
        let Some(range) = Range::new(start, end).clamp_to(state.store.total()) else {
            return Vec::new();
        };
        (range.start..=range.end)
            .map(|index| self.item_or_placeholder(&state, index))
            .collect()
    }

    fn item_or_placeholder(&self, state: &State, index: usize) -> Option<Item> {
        if let Some(item) = state.store.get(index) {
            return Some(item.clone());
        }
        (self.inner.options.placeholders.enabled && index < state.store.total())
            .then(|| state.placeholders.generate(index))
    }

    /// Swaps loaded items into a host-held row buffer whose first row is item `start`.
    ///
    /// Only empty rows and placeholder rows are written. Returns how many placeholders were
    /// replaced.
    pub fn fill_rows(&self, rows: &mut [Option<Item>], start: usize) -> usize {
        let state = self.inner.state.borrow();
        let mut replaced = 0;
        let mut offset = 0;
        while offset < rows.len() {
            let run: Vec<Item> = (offset..rows.len())
                .map_while(|i| state.store.get(start + i).cloned())
                .collect();
            if run.is_empty() {
                offset += 1;
                continue;
            }
            replaced += PlaceholderSynthesizer::replace(rows, &run, offset);
            offset += run.len();
        }
        replaced
    }

    pub fn is_item_loaded(&self, index: usize) -> bool {
        self.inner.state.borrow().store.is_loaded(index)
    }

    pub fn chunk_state(&self, chunk: usize) -> ChunkState {
        self.inner.state.borrow().store.chunk_state(chunk)
    }

    pub fn total(&self) -> usize {
        self.inner.state.borrow().store.total()
    }

    /// `false` until a load has reported a total (or items were set directly).
    pub fn is_total_known(&self) -> bool {
        self.inner.state.borrow().total_known
    }

    pub fn cached(&self) -> usize {
        self.inner.state.borrow().store.cached_count()
    }

    pub fn is_loading(&self) -> bool {
        let state = self.inner.state.borrow();
        !state.in_flight.is_empty() || state.store.loading_count() > 0
    }

    pub fn has_more(&self) -> bool {
        self.inner.state.borrow().has_more
    }

    /// The most recent adapter failure, until the next `reload`/`reset`.
    pub fn error(&self) -> Option<DataError> {
        self.inner.state.borrow().error.clone()
    }

    /// Writes `items` starting at `offset`, growing `total` to fit.
    pub fn set_items(&self, items: Vec<Item>, offset: usize) {
        let mut state = self.inner.state.borrow_mut();
        let end = offset + items.len();
        if self.inner.options.placeholders.enabled && !state.placeholders.is_analyzed() {
            state.placeholders.analyze(&items);
        }
        if end > state.store.total() {
            state.store.set_total(end);
        }
        state.total_known = true;
        state.store.set_range(items, offset);
    }

    /// Shallow-merges the object `patch` into the loaded item whose id field equals `id`.
    ///
    /// Returns `false` when no loaded item has that id or either side is not an object.
    pub fn update_item(&self, id: &Value, patch: Item) -> bool {
        let Value::Object(fields) = patch else {
            return false;
        };
        let mut state = self.inner.state.borrow_mut();
        let Some(index) = self.find_index(&state, id) else {
            return false;
        };
        let Some(Value::Object(item)) = state.store.get_mut(index) else {
            return false;
        };
        item.extend(fields);
        true
    }

    /// Removes the loaded item whose id field equals `id`; later items shift down by one.
    ///
    /// Loads in flight at that moment are discarded when they complete; request their ranges
    /// again to refill them.
    pub fn remove_item(&self, id: &Value) -> bool {
        let mut state = self.inner.state.borrow_mut();
        let Some(index) = self.find_index(&state, id) else {
            return false;
        };
        if state.store.remove_at(index).is_none() {
            return false;
        }
        if !state.in_flight.is_empty() || state.store.loading_count() > 0 {
            // In-flight spans were computed against the old positions.
            state.in_flight.clear();
            state.store.clear_all_loading();
            state.generation += 1;
            vdebug!(generation = state.generation, "in-flight loads dropped after removal");
        }
        true
    }

    fn find_index(&self, state: &State, id: &Value) -> Option<usize> {
        let field = self.inner.options.id_field.as_str();
        state
            .store
            .iter()
            .find(|(_, item)| item.get(field) == Some(id))
            .map(|(index, _)| index)
    }

    /// Drops cached items and forgets in-flight loads. `total` is kept.
    pub fn clear(&self) {
        let mut state = self.inner.state.borrow_mut();
        state.store.clear();
        state.in_flight.clear();
        state.generation += 1;
        vdebug!(generation = state.generation, "cache cleared");
    }

    /// Returns to the freshly constructed state.
    pub fn reset(&self) {
        self.clear();
        let mut state = self.inner.state.borrow_mut();
        state.store.set_total(0);
        state.total_known = false;
        state.has_more = true;
        state.error = None;
        state.committed = None;
        state.keep = None;
        state.placeholders.reset();
    }

    /// Evicts least-recently-used chunks outside the last requested range. Returns the
    /// number of items removed.
    pub fn evict(&self) -> usize {
        let mut state = self.inner.state.borrow_mut();
        let keep = state.keep;
        let options = &self.inner.options;
        state
            .store
            .evict(keep, options.eviction_buffer, options.max_cached_items)
    }

    /// Records the render range the host is showing. Emits [`DataEvent::RangeChange`] and
    /// returns `true` when it differs from the previous one.
    pub fn commit_range(&self, range: Range) -> bool {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.committed == Some(range) {
                return false;
            }
            state.committed = Some(range);
        }
        self.inner.events.emit(&DataEvent::RangeChange { range });
        true
    }

    pub fn committed_range(&self) -> Option<Range> {
        self.inner.state.borrow().committed
    }

    pub fn subscribe(&self, handler: impl Fn(&DataEvent) + 'static) -> SubscriptionId {
        self.inner.events.subscribe(handler)
    }

    pub fn subscribe_kind(
        &self,
        kind: EventKind,
        handler: impl Fn(&DataEvent) + 'static,
    ) -> SubscriptionId {
        self.inner.events.subscribe_kind(kind, handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }
}

impl<A> Inner<A> {
    fn finish_load(
        &self,
        id: u64,
        generation: u64,
        span: Range,
        context: LoadContext,
        result: Result<ReadResponse, AdapterError>,
    ) -> Result<bool, DataError> {
        let mut state = self.state.borrow_mut();
        if state.generation != generation {
            vdebug!(offset = span.start, "stale load dropped");
            return Ok(false);
        }
        for chunk in state.store.chunks_in(span) {
            let owned = state.in_flight.get(&chunk).is_none_or(|load| load.id == id);
            if owned {
                state.in_flight.remove(&chunk);
                state.store.clear_loading(chunk);
            }
        }

        match result {
            Ok(response) => {
                let count = response.items.len();
                state.store.set_total(response.total);
                state.total_known = true;
                if self.options.placeholders.enabled && !state.placeholders.is_analyzed() {
                    state.placeholders.analyze(&response.items);
                }
                state
                    .store
                    .merge_with(response.items, span.start, is_placeholder);
                let inferred = state.store.cached_count() < response.total;
                state.has_more = response.has_more.unwrap_or(inferred);

                let keep = state.keep;
                let evicted = state.store.evict(
                    keep,
                    self.options.eviction_buffer,
                    self.options.max_cached_items,
                );
                if evicted > 0 {
                    vdebug!(evicted, "evicted after load");
                }
                drop(state);

                vdebug!(offset = span.start, count, %context, "load finished");
                self.events.emit(&DataEvent::LoadEnd {
                    offset: span.start,
                    count,
                });
                Ok(true)
            }
            Err(source) => {
                let error = DataError::Adapter { context, source };
                state.error = Some(error.clone());
                drop(state);

                vwarn!(offset = span.start, %context, %error, "load failed");
                self.events.emit(&DataEvent::Error {
                    error: error.clone(),
                    context,
                });
                Err(error)
            }
        }
    }
}
