// Example: variable sizes, rendered placements and scroll-to helpers.
use vlist::{Align, ListOptions, VirtualList};

fn main() -> Result<(), vlist::ConfigError> {
    let mut list = VirtualList::new(
        ListOptions::with_size_fn(10_000, |i| if i % 5 == 0 { 48.0 } else { 24.0 })
            .with_viewport_extent(480.0)
            .with_overscan(2),
    )?;

    list.set_scroll_position(12_345.0);
    let mut items = Vec::new();
    list.collect_rendered_items(&mut items);
    println!("total_size={}", list.total_size());
    println!("visible_range={:?}", list.visible_range());
    println!("render_range={:?}", list.render_range());
    println!("first_rendered={:?}", items.first());

    let off = list.scroll_to_index(9_999, Align::End);
    println!("after scroll_to_index: offset={off} visible={:?}", list.visible_range());
    Ok(())
}
