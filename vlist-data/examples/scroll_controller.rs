use futures::executor::LocalPool;
use serde_json::json;
use vlist::{ListOptions, VirtualList};
use vlist_data::{DataEvent, DataManager, DataOptions, ScrollController, VecAdapter, is_placeholder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: a headless scroll loop over a paged source.
    //
    // A host would:
    // - forward scroll events to `on_scroll(position, now_ms)`
    // - call `tick(now_ms)` from a frame loop or timer
    // - render rows from `data().get_items_in_range(..)` (placeholders fill the gaps)
    // - drive the executor that runs the spawned loads
    let items = (0..100_000)
        .map(|i| json!({ "id": i, "title": format!("row {i}"), "done": i % 3 == 0 }))
        .collect();
    let data = DataManager::new(
        VecAdapter::new(items),
        DataOptions::default().with_chunk_size(100),
    )?;
    data.subscribe(|event| match event {
        DataEvent::LoadStart { offset, limit } => println!("  load {offset}+{limit}"),
        DataEvent::Error { error, .. } => println!("  error: {error}"),
        _ => {}
    });

    let list = VirtualList::new(
        ListOptions::new(0, 32.0)
            .with_viewport_extent(640.0)
            .with_overscan(3),
    )?;
    let mut pool = LocalPool::new();
    let mut controller = ScrollController::new(list, data, pool.spawner());

    controller.start()?;
    pool.run_until_stalled();
    controller.tick(0.0)?;
    pool.run_until_stalled();

    // A fling: loads are deferred while the view moves fast, then flushed once it settles.
    let mut now_ms = 0.0;
    let mut position = 0.0;
    for _ in 0..20 {
        now_ms += 16.0;
        position += 2_400.0;
        let range = controller.on_scroll(position, now_ms)?;
        pool.run_until_stalled();
        println!(
            "t={now_ms:>4} render={range:?} zone={:?}",
            controller.scheduler().zone()
        );
    }
    while !controller.is_idle() {
        now_ms += 16.0;
        controller.tick(now_ms)?;
    }
    pool.run_until_stalled();

    let render = controller.list().render_range().unwrap_or_default();
    let rows = controller.data().get_items_in_range(render.start, render.end);
    let placeholders = rows
        .iter()
        .flatten()
        .filter(|row| is_placeholder(row))
        .count();
    println!(
        "settled at {render:?}: {} rows, {placeholders} placeholders, {} cached",
        rows.len(),
        controller.data().cached()
    );
    Ok(())
}
