// Example: a list taller than the host can scroll, with snapshot restore across a resize.
use vlist::{Align, ItemSize, ListOptions, VirtualList};

fn main() -> Result<(), vlist::ConfigError> {
    let mut list =
        VirtualList::new(ListOptions::new(5_000_000, 40.0).with_viewport_extent(720.0))?;
    let state = list.compression_state();
    println!(
        "compressed={} actual={} virtual={} ratio={}",
        state.is_compressed, state.actual_height, state.virtual_height, state.ratio
    );

    list.scroll_to_index(2_500_000, Align::Center);
    println!("middle: offset={} visible={:?}", list.scroll_position(), list.visible_range());

    let max = list.max_scroll();
    list.set_scroll_position(max);
    println!("bottom: visible={:?}", list.visible_range());

    // Text got bigger: every row is now 56px. Keep the same rows on screen.
    list.set_scroll_position(max / 3.0);
    let snapshot = list.scroll_snapshot();
    list.set_item_size(ItemSize::Fixed(56.0))?;
    list.restore_scroll(snapshot);
    println!("snapshot={snapshot:?} visible={:?}", list.visible_range());
    Ok(())
}
