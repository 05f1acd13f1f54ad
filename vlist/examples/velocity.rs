// Example: feeding scroll samples into the velocity tracker.
use vlist::VelocityTracker;

fn main() {
    let mut tracker = VelocityTracker::default();
    let mut position = 0.0;
    for frame in 0..12 {
        let now_ms = frame as f64 * 16.0;
        position += 80.0;
        tracker.update(position, now_ms);
        println!(
            "t={now_ms:>5} velocity={:.2}px/ms reliable={} direction={:?}",
            tracker.velocity(),
            tracker.is_reliable(),
            tracker.direction()
        );
    }

    // The finger lifted and came back later: a new gesture.
    tracker.update(position + 10.0, 1_000.0);
    println!("after pause: velocity={} reliable={}", tracker.velocity(), tracker.is_reliable());
}
