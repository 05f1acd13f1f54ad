use futures::task::{LocalSpawn, LocalSpawnExt};
use vlist::{Align, Range, VelocityOptions, VelocityTracker, VirtualList};

use crate::{
    DataConfigError, DataError, DataManager, LoadPlan, LoadScheduler, PagingAdapter,
    SchedulerOptions, ScrollSample,
};

/// A framework-neutral scroll handler that keeps a [`VirtualList`] and a [`DataManager`] in
/// step.
///
/// This type does not hold any UI objects. Hosts drive it by calling:
/// - `on_viewport_extent` / `on_scroll` when UI events occur
/// - `tick(now_ms)` each frame or timer tick (count sync and idle detection)
///
/// Range loads are spawned on `S`; their outcome reaches the host through the manager's
/// events and queries.
pub struct ScrollController<A, S> {
    list: VirtualList,
    velocity: VelocityTracker,
    scheduler: LoadScheduler,
    data: DataManager<A>,
    spawner: S,
    last_sample_ms: Option<f64>,
    idle: bool,
}

impl<A: PagingAdapter, S: LocalSpawn> ScrollController<A, S> {
    pub fn new(list: VirtualList, data: DataManager<A>, spawner: S) -> Self {
        Self {
            list,
            velocity: VelocityTracker::default(),
            scheduler: LoadScheduler::default(),
            data,
            spawner,
            last_sample_ms: None,
            idle: true,
        }
    }

    pub fn with_options(
        list: VirtualList,
        data: DataManager<A>,
        spawner: S,
        scheduler: SchedulerOptions,
        velocity: VelocityOptions,
    ) -> Result<Self, DataConfigError> {
        let mut controller = Self::new(list, data, spawner);
        controller.scheduler = LoadScheduler::new(scheduler)?;
        controller.velocity = VelocityTracker::new(velocity)?;
        Ok(controller)
    }

    pub fn list(&self) -> &VirtualList {
        &self.list
    }

    pub fn data(&self) -> &DataManager<A> {
        &self.data
    }

    pub fn velocity(&self) -> &VelocityTracker {
        &self.velocity
    }

    pub fn scheduler(&self) -> &LoadScheduler {
        &self.scheduler
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Kicks off the initial load, or loads the current range when data is already known.
    pub fn start(&mut self) -> Result<Option<Range>, DataError> {
        if !self.data.is_total_known() {
            let load = self.data.load_initial();
            self.spawn(async move {
                let _ = load.await;
            });
            return Ok(None);
        }
        self.sync_count()?;
        Ok(self.refresh())
    }

    pub fn on_viewport_extent(&mut self, extent: f64) -> Result<Option<Range>, DataError> {
        self.list
            .set_viewport_extent(extent)
            .map_err(DataConfigError::from)?;
        Ok(self.refresh())
    }

    /// Call this when the UI reports a scroll position change.
    ///
    /// Returns the committed render range.
    pub fn on_scroll(&mut self, position: f64, now_ms: f64) -> Result<Option<Range>, DataError> {
        self.sync_count()?;
        let applied = self.list.set_scroll_position(position);
        self.velocity.update(applied, now_ms);
        self.last_sample_ms = Some(now_ms);
        self.idle = false;

        let Some(render) = self.list.render_range() else {
            return Ok(None);
        };
        self.data.commit_range(render);
        let plan = self.scheduler.on_scroll(ScrollSample {
            render,
            velocity: self.velocity.velocity(),
            reliable: self.velocity.is_reliable(),
            direction: self
                .velocity
                .direction()
                .or(self.list.scroll_direction()),
            count: self.list.count(),
        });
        self.run(plan);
        Ok(Some(render))
    }

    /// Advances the controller.
    ///
    /// Picks up a changed item count and fires [`Self::on_idle`] once no scroll sample has
    /// arrived for `idle_timeout_ms`. Returns the range loaded by this tick, if any.
    pub fn tick(&mut self, now_ms: f64) -> Result<Option<Range>, DataError> {
        let resized = self.sync_count()?;
        let timeout = self.scheduler.options().idle_timeout_ms;
        let went_idle = !self.idle
            && self
                .last_sample_ms
                .is_some_and(|last| now_ms - last >= timeout);
        if went_idle {
            return Ok(self.on_idle(now_ms));
        }
        if resized {
            return Ok(self.refresh());
        }
        Ok(None)
    }

    /// Scrolling stopped: starts a fresh velocity baseline and releases the deferred range.
    pub fn on_idle(&mut self, now_ms: f64) -> Option<Range> {
        self.idle = true;
        self.velocity
            .reset_baseline(self.list.scroll_position(), now_ms);
        let flushed = self.scheduler.on_idle();
        if let Some(range) = flushed {
            self.spawn_ensure(range);
        }
        flushed
    }

    /// Jumps to `index` and loads the destination immediately.
    pub fn scroll_to_index(&mut self, index: usize, align: Align, now_ms: f64) -> Option<Range> {
        let position = self.list.scroll_to_index(index, align);
        self.velocity.reset_baseline(position, now_ms);
        self.refresh()
    }

    /// Commits and loads the current render range, bypassing velocity gating.
    ///
    /// Also the way to retry a range whose load failed.
    pub fn refresh(&mut self) -> Option<Range> {
        let render = self.list.render_range()?;
        self.data.commit_range(render);
        let range = self.scheduler.on_settled(render);
        self.spawn_ensure(range);
        Some(render)
    }

    /// Drops cached data and reloads the first page and the current render range.
    ///
    /// The list keeps its count and scroll position while the new total is unknown.
    pub fn reload(&mut self) -> Option<Range> {
        self.scheduler.reset();
        let load = self.data.reload();
        self.spawn(async move {
            let _ = load.await;
        });
        self.refresh()
    }

    fn sync_count(&mut self) -> Result<bool, DataError> {
        let total = self.data.total();
        if !self.data.is_total_known() || total == self.list.count() {
            return Ok(false);
        }
        self.list.set_count(total).map_err(DataConfigError::from)?;
        vdebug!(count = total, "list count synced");
        Ok(true)
    }

    fn run(&self, plan: LoadPlan) {
        for range in plan.ranges() {
            self.spawn_ensure(range);
        }
    }

    fn spawn_ensure(&self, range: Range) {
        vtrace!(start = range.start, end = range.end, "ensure_range");
        let load = self.data.ensure_range(range.start, range.end);
        // Failures are recorded and emitted by the manager.
        self.spawn(async move {
            let _ = load.await;
        });
    }

    fn spawn(&self, future: impl std::future::Future<Output = ()> + 'static) {
        if self.spawner.spawn_local(future).is_err() {
            vwarn!("executor rejected a load; it will not run");
        }
    }
}
