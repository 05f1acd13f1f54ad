use crate::*;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 11
    }

    fn range(&mut self, start: u64, end_exclusive: u64) -> u64 {
        start + self.next_u64() % (end_exclusive - start)
    }
}

fn random_sizes(rng: &mut Lcg, count: usize) -> Vec<f64> {
    (0..count).map(|_| rng.range(1, 120) as f64).collect()
}

fn list_from_sizes(sizes: Vec<f64>, viewport: f64) -> VirtualList {
    let count = sizes.len();
    VirtualList::new(
        ListOptions::with_size_fn(count, move |i| sizes[i]).with_viewport_extent(viewport),
    )
    .unwrap()
}

fn expected_visible(sizes: &[f64], scroll: f64, viewport: f64) -> Range {
    let mut prefix = Vec::with_capacity(sizes.len() + 1);
    let mut acc = 0.0;
    prefix.push(acc);
    for s in sizes {
        acc += s;
        prefix.push(acc);
    }
    let last = sizes.len() - 1;
    let scroll = scroll.clamp(0.0, (acc - viewport).max(0.0));
    let start = (0..sizes.len())
        .rev()
        .find(|&i| prefix[i] <= scroll)
        .unwrap_or(0);
    let end = (start..sizes.len())
        .find(|&j| prefix[j + 1] - scroll >= viewport)
        .unwrap_or(last);
    Range { start, end }
}

#[test]
fn fixed_height_index_lookups() {
    let h = HeightIndex::new(ItemSize::Fixed(40.0), 10).unwrap();
    assert_eq!(h.total_size(), 400.0);
    assert_eq!(h.offset(3), 120.0);
    assert_eq!(h.size(3), 40.0);
    assert_eq!(h.size(10), 0.0);
    assert_eq!(h.index_at_offset(0.0), 0);
    assert_eq!(h.index_at_offset(39.9), 0);
    assert_eq!(h.index_at_offset(40.0), 1);
    assert_eq!(h.index_at_offset(-25.0), 0);
    assert_eq!(h.index_at_offset(10_000.0), 9);
}

#[test]
fn variable_height_index_lookups() {
    let h = HeightIndex::new(ItemSize::from_fn(|i| (i + 1) as f64 * 10.0), 4).unwrap();
    // sizes = [10, 20, 30, 40], starts = [0, 10, 30, 60]
    assert_eq!(h.total_size(), 100.0);
    assert_eq!(h.offset(2), 30.0);
    assert_eq!(h.size(2), 30.0);
    assert_eq!(h.index_at_offset(9.99), 0);
    assert_eq!(h.index_at_offset(10.0), 1);
    assert_eq!(h.index_at_offset(59.0), 2);
    assert_eq!(h.index_at_offset(60.0), 3);
    assert_eq!(h.index_at_offset(100.0), 3);
    assert_eq!(h.index_at_offset(-1.0), 0);
}

#[test]
fn empty_height_index_is_well_defined() {
    let fixed = HeightIndex::new(ItemSize::Fixed(40.0), 0).unwrap();
    assert_eq!(fixed.total_size(), 0.0);
    assert_eq!(fixed.index_at_offset(123.0), 0);

    let var = HeightIndex::new(ItemSize::from_fn(|_| 7.0), 0).unwrap();
    assert_eq!(var.total_size(), 0.0);
    assert_eq!(var.index_at_offset(123.0), 0);
}

#[test]
fn offset_index_inverse_holds_for_fixed_and_variable_sizes() {
    let mut rng = Lcg::new(7);
    let sizes = random_sizes(&mut rng, 500);
    let var = HeightIndex::new(
        ItemSize::from_fn({
            let sizes = sizes.clone();
            move |i| sizes[i]
        }),
        sizes.len(),
    )
    .unwrap();
    let fixed = HeightIndex::new(ItemSize::Fixed(33.0), 500).unwrap();

    for index in 0..500 {
        assert_eq!(var.index_at_offset(var.offset(index)), index);
        let inside = var.offset(index) + var.size(index) - 0.5;
        assert_eq!(var.index_at_offset(inside), index);

        assert_eq!(fixed.index_at_offset(fixed.offset(index)), index);
        assert_eq!(fixed.index_at_offset(fixed.offset(index) + 32.5), index);
    }
}

#[test]
fn rebuild_tracks_total_changes() {
    let mut h = HeightIndex::new(ItemSize::from_fn(|_| 5.0), 3).unwrap();
    assert_eq!(h.total_size(), 15.0);
    h.rebuild(10).unwrap();
    assert_eq!(h.total_size(), 50.0);
    assert_eq!(h.index_at_offset(49.0), 9);
    h.rebuild(1).unwrap();
    assert_eq!(h.total_size(), 5.0);
    assert_eq!(h.index_at_offset(49.0), 0);
}

#[test]
fn invalid_sizes_are_configuration_errors() {
    let err = VirtualList::new(ListOptions::new(10, 0.0)).unwrap_err();
    assert_eq!(err, ConfigError::InvalidItemSize { index: 0, size: 0.0 });

    let err = VirtualList::new(ListOptions::with_size_fn(10, |i| {
        if i == 4 { f64::NAN } else { 10.0 }
    }))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidItemSize { index: 4, .. }));

    let err = VirtualList::new(ListOptions::new(10, 10.0).with_max_extent(0.0)).unwrap_err();
    assert_eq!(err, ConfigError::InvalidMaxExtent(0.0));

    let err = VirtualList::new(ListOptions::new(10, 10.0).with_viewport_extent(-1.0)).unwrap_err();
    assert_eq!(err, ConfigError::InvalidViewport(-1.0));
}

#[test]
fn failed_size_change_keeps_previous_sizes() {
    let mut list = VirtualList::new(ListOptions::new(10, 10.0)).unwrap();
    assert!(list.set_item_size(ItemSize::Fixed(-3.0)).is_err());
    assert_eq!(list.total_size(), 100.0);
    assert_eq!(list.item_size(0), Some(10.0));
}

#[test]
fn large_fixed_list_is_compressed() {
    let list = VirtualList::new(ListOptions::new(1_000_000, 40.0)).unwrap();
    let state = list.compression_state();
    assert!(state.is_compressed);
    assert_eq!(state.actual_height, 40_000_000.0);
    assert_eq!(state.virtual_height, 16_000_000.0);
    assert_eq!(state.ratio, 16_000_000.0 / 40_000_000.0);
    assert_eq!(state.ratio, 0.4);
    assert_eq!(list.scroll_extent(), 16_000_000.0);
}

#[test]
fn small_list_is_not_compressed() {
    let list = VirtualList::new(ListOptions::new(100, 40.0)).unwrap();
    let state = list.compression_state();
    assert!(!state.is_compressed);
    assert_eq!(state.actual_height, 4000.0);
    assert_eq!(state.virtual_height, 4000.0);
    assert_eq!(state.ratio, 1.0);
}

#[test]
fn compression_cache_recomputes_only_on_count_change() {
    let heights = HeightIndex::new(ItemSize::Fixed(10.0), 100).unwrap();
    let mut cache = CompressionCache::default();
    let a = cache.get(&heights, 500.0);
    assert!(a.is_compressed);

    // Same count, different extent: the cached state is returned until invalidated.
    let b = cache.get(&heights, 50_000.0);
    assert_eq!(a, b);
    cache.invalidate();
    assert!(!cache.get(&heights, 50_000.0).is_compressed);
}

#[test]
fn empty_list_maps_to_zero() {
    let list = VirtualList::new(ListOptions::new(0, 40.0).with_viewport_extent(500.0)).unwrap();
    assert_eq!(list.compression_state(), CompressionState::IDENTITY);
    assert_eq!(list.map().to_index(1000.0), 0.0);
    assert_eq!(list.map().to_position(10, Align::End, 0.0), 0.0);
    assert_eq!(list.visible_range(), None);
    assert_eq!(list.render_range(), None);
    assert_eq!(list.max_scroll(), 0.0);
}

#[test]
fn last_item_is_reachable_at_max_scroll_when_compressed() {
    for &(count, size, viewport) in &[
        (1_000_000usize, 40.0f64, 600.0f64),
        (5_000_000, 48.0, 900.0),
        (123_457, 200.0, 720.0),
    ] {
        let mut list = VirtualList::new(
            ListOptions::new(count, size).with_viewport_extent(viewport),
        )
        .unwrap();
        assert!(list.is_compressed());
        let max = list.max_scroll();
        list.set_scroll_position(max);
        let visible = list.visible_range().unwrap();
        assert_eq!(visible.end, count - 1, "count={count}");
    }
}

#[test]
fn last_item_is_reachable_with_variable_sizes_when_compressed() {
    let mut rng = Lcg::new(99);
    let sizes = random_sizes(&mut rng, 5_000);
    let mut list = VirtualList::new(
        ListOptions::with_size_fn(5_000, move |i| sizes[i])
            .with_viewport_extent(300.0)
            .with_max_extent(20_000.0),
    )
    .unwrap();
    assert!(list.is_compressed());
    let max = list.max_scroll();
    list.set_scroll_position(max);
    assert_eq!(list.visible_range().unwrap().end, 4_999);
}

#[test]
fn compressed_mapping_is_linear_outside_the_bottom_band() {
    let list =
        VirtualList::new(ListOptions::new(1_000_000, 40.0).with_viewport_extent(600.0)).unwrap();
    let map = list.map();
    assert_eq!(map.to_index(8_000_000.0), 500_000.0);
    assert_eq!(map.index_at(4_000_000.0), 250_000);
}

#[test]
fn compressed_mapping_is_monotonic_through_the_bottom_band() {
    let list =
        VirtualList::new(ListOptions::new(1_000_000, 40.0).with_viewport_extent(600.0)).unwrap();
    let map = list.map();
    let max = map.max_scroll();
    let mut prev = map.to_index(max - 2_000.0);
    let mut s = max - 2_000.0;
    while s <= max {
        let cur = map.to_index(s);
        assert!(cur >= prev, "to_index must not decrease (s={s})");
        prev = cur;
        s += 7.5;
    }
}

#[test]
fn visible_range_matches_brute_force() {
    let mut rng = Lcg::new(1234);
    for _ in 0..20 {
        let count = rng.range(1, 300) as usize;
        let sizes = random_sizes(&mut rng, count);
        let viewport = rng.range(0, 800) as f64 + 0.5;
        let list = list_from_sizes(sizes.clone(), viewport);
        for _ in 0..50 {
            let scroll = rng.range(0, 40_000) as f64;
            let got = list.visible_range_for(scroll).unwrap();
            assert_eq!(got, expected_visible(&sizes, scroll, viewport));
        }
    }
}

#[test]
fn render_range_adds_overscan_and_clamps() {
    let visible = Range { start: 2, end: 5 };
    assert_eq!(render_range(visible, 3, 100), Range { start: 0, end: 8 });
    assert_eq!(render_range(visible, 3, 7), Range { start: 0, end: 6 });
    assert_eq!(render_range(Range::EMPTY, 3, 0), Range::EMPTY);

    let mut list = VirtualList::new(
        ListOptions::new(100, 10.0)
            .with_viewport_extent(50.0)
            .with_overscan(2),
    )
    .unwrap();
    list.set_scroll_position(200.0);
    assert_eq!(list.visible_range(), Some(Range { start: 20, end: 24 }));
    assert_eq!(list.render_range(), Some(Range { start: 18, end: 26 }));
}

#[test]
fn scroll_to_index_alignments() {
    let mut list =
        VirtualList::new(ListOptions::new(100, 40.0).with_viewport_extent(400.0)).unwrap();
    assert_eq!(list.scroll_to_index_position(10, Align::Start), 400.0);
    assert_eq!(list.scroll_to_index_position(10, Align::Center), 220.0);
    assert_eq!(list.scroll_to_index_position(10, Align::End), 40.0);
    assert_eq!(list.scroll_to_index_position(99, Align::Start), 3_600.0);
    assert_eq!(list.scroll_to_index_position(0, Align::End), 0.0);

    // Item 5 spans [200, 240), fully inside [0, 400).
    assert_eq!(list.scroll_to_index_position(5, Align::Auto), 0.0);
    assert_eq!(list.scroll_to_index_position(20, Align::Auto), 440.0);

    let applied = list.scroll_to_index(30, Align::Start);
    assert_eq!(applied, 1_200.0);
    assert_eq!(list.scroll_position(), 1_200.0);
    assert_eq!(list.scroll_direction(), Some(ScrollDirection::Forward));
    assert_eq!(list.scroll_to_index_position(25, Align::Auto), 1_000.0);
}

#[test]
fn scroll_to_index_lands_on_item_when_compressed() {
    let mut list =
        VirtualList::new(ListOptions::new(1_000_000, 40.0).with_viewport_extent(600.0)).unwrap();
    let pos = list.scroll_to_index(500_000, Align::Start);
    assert_eq!(pos, 8_000_000.0);
    assert_eq!(list.visible_range().unwrap().start, 500_000);

    list.scroll_to_index(999_999, Align::End);
    assert_eq!(list.scroll_position(), list.max_scroll());
    assert_eq!(list.visible_range().unwrap().end, 999_999);

    // Inside the bottom band the inverse is solved numerically.
    list.scroll_to_index(999_980, Align::Start);
    assert_eq!(list.visible_range().unwrap().start, 999_980);
}

#[test]
fn snapshot_round_trip_uncompressed() {
    let mut rng = Lcg::new(42);
    let sizes = random_sizes(&mut rng, 400);
    let mut list = list_from_sizes(sizes, 500.0);
    for _ in 0..100 {
        let scroll = rng.range(0, 30_000) as f64 + 0.25;
        list.set_scroll_position(scroll);
        let before = list.visible_range();
        let snapshot = list.scroll_snapshot();
        list.set_scroll_position(0.0);
        list.restore_scroll(snapshot);
        assert_eq!(list.visible_range(), before);
    }
}

#[test]
fn snapshot_round_trip_compressed() {
    let mut rng = Lcg::new(4242);
    let mut list =
        VirtualList::new(ListOptions::new(2_000_000, 32.0).with_viewport_extent(700.0)).unwrap();
    assert!(list.is_compressed());
    let max = list.max_scroll() as u64;
    for _ in 0..200 {
        let scroll = rng.range(0, max) as f64 + 0.5;
        list.set_scroll_position(scroll);
        let before = list.visible_range();
        let snapshot = list.scroll_snapshot();
        list.set_scroll_position(0.0);
        list.restore_scroll(snapshot);
        assert_eq!(list.visible_range(), before, "scroll={scroll}");
    }

    // Bottom band.
    let max = list.max_scroll();
    list.set_scroll_position(max - 100.0);
    let before = list.visible_range();
    let snapshot = list.scroll_snapshot();
    list.set_scroll_position(0.0);
    list.restore_scroll(snapshot);
    assert_eq!(list.visible_range(), before);
}

#[test]
fn snapshot_survives_size_changes() {
    let mut list =
        VirtualList::new(ListOptions::new(100, 40.0).with_viewport_extent(400.0)).unwrap();
    list.set_scroll_position(1_010.0);
    let snapshot = list.scroll_snapshot();
    assert_eq!(snapshot.index, 25);
    assert_eq!(snapshot.offset_in_item, 10.0);

    list.set_item_size(ItemSize::Fixed(50.0)).unwrap();
    let applied = list.restore_scroll(snapshot);
    assert_eq!(applied, 1_260.0);
    assert_eq!(list.visible_range().unwrap().start, 25);
}

#[test]
fn snapshot_crosses_the_compression_boundary() {
    let mut list =
        VirtualList::new(ListOptions::new(100_000, 40.0).with_viewport_extent(600.0)).unwrap();
    assert!(!list.is_compressed());
    list.set_scroll_position(2_000_020.0);
    let snapshot = list.scroll_snapshot();
    assert_eq!(snapshot.index, 50_000);
    assert_eq!(snapshot.offset_in_item, 20.0);

    // Growing the list past the host limit switches to compressed scroll space.
    list.set_count(1_000_000).unwrap();
    assert!(list.is_compressed());
    list.restore_scroll(snapshot);
    assert_eq!(list.visible_range().unwrap().start, 50_000);
    let back = list.scroll_snapshot();
    assert_eq!(back.index, 50_000);
    assert!((back.offset_in_item - 20.0).abs() < 1e-3);

    list.set_count(100_000).unwrap();
    assert!(!list.is_compressed());
    list.restore_scroll(back);
    assert!((list.scroll_position() - 2_000_020.0).abs() < 1e-3);
}

#[test]
fn rendered_items_are_contiguous_in_scroll_space() {
    let mut list = VirtualList::new(
        ListOptions::new(1_000_000, 40.0)
            .with_viewport_extent(600.0)
            .with_overscan(2),
    )
    .unwrap();
    list.set_scroll_position(5_000_010.0);
    let mut items = Vec::new();
    list.collect_rendered_items(&mut items);
    assert!(!items.is_empty());
    for pair in items.windows(2) {
        assert!((pair[0].end() - pair[1].offset).abs() < 1e-6);
    }

    // The item under the top edge straddles the scroll position.
    let top = list.visible_range().unwrap().start;
    let placement = items.iter().find(|p| p.index == top).unwrap();
    assert!(placement.offset <= 5_000_010.0 + 1e-6);
    assert!(placement.end() > 5_000_010.0);
}

#[test]
fn scroll_position_is_clamped_and_tracks_direction() {
    let mut list =
        VirtualList::new(ListOptions::new(10, 10.0).with_viewport_extent(40.0)).unwrap();
    assert_eq!(list.set_scroll_position(1_000.0), 60.0);
    assert_eq!(list.scroll_direction(), Some(ScrollDirection::Forward));
    assert_eq!(list.set_scroll_position(-5.0), 0.0);
    assert_eq!(list.scroll_direction(), Some(ScrollDirection::Backward));

    list.set_scroll_position(60.0);
    list.set_count(5).unwrap();
    assert_eq!(list.scroll_position(), 10.0);
}

#[test]
fn velocity_is_estimated_over_the_window_and_reset_after_a_stale_gap() {
    let mut tracker = VelocityTracker::default();
    tracker.update(0.0, 0.0);
    assert!(!tracker.is_reliable());
    tracker.update(100.0, 20.0);
    assert!(!tracker.is_reliable());
    tracker.update(200.0, 40.0);
    assert!(tracker.is_reliable());
    assert!((tracker.velocity() - 5.0).abs() < 1e-9);
    assert_eq!(tracker.direction(), Some(ScrollDirection::Forward));

    tracker.update(205.0, 400.0);
    assert_eq!(tracker.velocity(), 0.0);
    assert!(!tracker.is_reliable());
    assert_eq!(tracker.sample_count(), 1);
}

#[test]
fn velocity_reports_absolute_speed() {
    let mut tracker = VelocityTracker::default();
    for (i, pos) in [1_000.0, 900.0, 800.0, 700.0].into_iter().enumerate() {
        tracker.update(pos, i as f64 * 10.0);
    }
    assert!((tracker.velocity() - 10.0).abs() < 1e-9);
    assert!((tracker.signed_velocity() + 10.0).abs() < 1e-9);
    assert_eq!(tracker.direction(), Some(ScrollDirection::Backward));
}

#[test]
fn velocity_window_wraps_without_growing() {
    let mut tracker = VelocityTracker::default();
    // Accelerating scroll: later samples should dominate once old ones fall out.
    for i in 0..20u32 {
        let t = i as f64 * 10.0;
        let speed = if i < 10 { 1.0 } else { 4.0 };
        let pos = if i < 10 { t } else { 90.0 + (t - 90.0) * speed };
        tracker.update(pos, t);
    }
    assert_eq!(tracker.sample_count(), VELOCITY_CAPACITY);
    assert!((tracker.velocity() - 4.0).abs() < 1e-9);
}

#[test]
fn velocity_soft_reset_starts_a_new_baseline() {
    let mut tracker = VelocityTracker::default();
    tracker.update(0.0, 0.0);
    tracker.update(50.0, 10.0);
    tracker.update(100.0, 20.0);
    assert!(tracker.is_reliable());

    tracker.reset_baseline(100.0, 30.0);
    assert_eq!(tracker.velocity(), 0.0);
    assert!(!tracker.is_reliable());
    tracker.update(110.0, 40.0);
    tracker.update(120.0, 50.0);
    assert!(tracker.is_reliable());
    assert!((tracker.velocity() - 1.0).abs() < 1e-9);
}

#[test]
fn velocity_options_are_validated() {
    assert!(VelocityTracker::new(VelocityOptions::default().with_min_samples(1)).is_err());
    assert!(VelocityTracker::new(VelocityOptions::default().with_min_samples(64)).is_err());
    let t = VelocityTracker::new(VelocityOptions::default().with_stale_gap_ms(250.0)).unwrap();
    assert_eq!(t.options().stale_gap_ms, 250.0);
}

#[test]
fn example_basic_smoke_large_count() {
    let mut list = VirtualList::new(
        ListOptions::with_size_fn(200_000, |i| if i % 10 == 0 { 64.0 } else { 32.0 })
            .with_viewport_extent(480.0),
    )
    .unwrap();
    let target = list.scroll_to_index(123_456, Align::Center);
    assert!(target > 0.0);
    let visible = list.visible_range().unwrap();
    assert!(visible.contains(123_456));
}

#[test]
fn options_debug_hides_the_size_function() {
    let fixed = ListOptions::new(3, 12.5);
    assert!(format!("{fixed:?}").contains("Fixed(12.5)"));
    let variable = ListOptions::with_size_fn(3, |i| 10.0 + i as f64);
    assert!(format!("{variable:?}").contains("Fn(..)"));
    let shared = variable.clone();
    assert_eq!(format!("{shared:?}"), format!("{variable:?}"));
}
