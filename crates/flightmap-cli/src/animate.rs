//! Fixed-interval animation loop.
//!
//! Stands in for a display repaint: every tick delivers the frame the
//! controller last requested.

use flightmap_core::{FrameQueue, MapHandle, RouteMapController};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::interval;

/// Drive the controller until `max_frames` glyph frames were emitted, the
/// controller stops requesting frames, or shutdown fires. Returns the number
/// of frames emitted.
pub async fn run_animation_loop<M: MapHandle>(
    controller: &mut RouteMapController<M, FrameQueue>,
    period: Duration,
    max_frames: Option<usize>,
    mut shutdown: broadcast::Receiver<()>,
) -> usize {
    let mut ticker = interval(period);
    let mut emitted = 0;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Animation loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let Some(token) = controller.frames_mut().take_due() else {
                    tracing::info!("No frame requested, animation loop idle");
                    break;
                };
                let Some(frame) = controller.on_frame(token) else {
                    continue;
                };

                emitted += 1;
                tracing::debug!(
                    "Glyph leg {} point {} at ({:.4}, {:.4}) bearing {:?}",
                    frame.cursor.segment_index,
                    frame.cursor.point_index,
                    frame.position.latitude,
                    frame.position.longitude,
                    frame.bearing.map(|b| (b * 10.0).round() / 10.0)
                );

                if max_frames.is_some_and(|max| emitted >= max) {
                    break;
                }
            }
        }
    }

    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightmap_core::{Airport, AirportCache, Coordinate, HeadlessMap, MapConfig, SegmentCodes};

    fn controller() -> RouteMapController<HeadlessMap, FrameQueue> {
        let cache = AirportCache::new();
        cache.merge([
            Airport::new("JFK", 40.6413, -73.7781),
            Airport::new("LHR", 51.47, -0.4543),
        ]);
        let config = MapConfig {
            arc_steps: 10,
            ..MapConfig::default()
        };
        let map = HeadlessMap::loaded("style", Coordinate::new(0.0, 0.0), 1.0);
        RouteMapController::new(map, FrameQueue::new(), config, cache)
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_max_frames() {
        let mut controller = controller();
        controller.apply_data(vec![SegmentCodes::new("JFK", "LHR")], Vec::new());
        let (_tx, rx) = broadcast::channel(1);

        let emitted = run_animation_loop(&mut controller, Duration::from_millis(16), Some(25), rx).await;

        assert_eq!(emitted, 25);
        // 11 points per loop: frame 25 was the third point of the third pass.
        assert_eq!(controller.animator().cursor().point_index, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_controller_returns_immediately() {
        let mut controller = controller();
        controller.apply_data(Vec::new(), Vec::new());
        let (_tx, rx) = broadcast::channel(1);

        let emitted = run_animation_loop(&mut controller, Duration::from_millis(16), None, rx).await;

        assert_eq!(emitted, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ends_an_endless_loop() {
        let mut controller = controller();
        controller.apply_data(vec![SegmentCodes::new("JFK", "LHR")], Vec::new());
        let (tx, rx) = broadcast::channel(1);
        tx.send(()).unwrap();

        let emitted = run_animation_loop(&mut controller, Duration::from_millis(16), None, rx).await;

        assert!(emitted <= 1);
    }
}
