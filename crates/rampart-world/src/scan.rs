//! Background neighborhood scan.
//!
//! A low-priority thread periodically compares the wanted chunk set around
//! the viewer against the coordinates currently tracked, and enqueues only
//! the deltas: coordinates to activate and coordinates to deactivate. It
//! never generates or meshes anything itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use rustc_hash::FxHashSet;

use rampart_voxel::ChunkCoord;

use crate::state::StateMap;
use crate::viewer::ViewerTracker;

/// Neighborhood shape and scan cadence.
#[derive(Clone, Copy, Debug)]
pub struct ScanConfig {
    /// Horizontal neighborhood width in chunks (centered on the viewer).
    pub render_distance: i32,
    /// Vertical chunk layers, counted up from world layer 0.
    pub y_render_distance: i32,
    /// Time between scans; the scan runs well below frame cadence.
    pub interval: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            render_distance: 8,
            y_render_distance: 1,
            interval: Duration::from_millis(300),
        }
    }
}

/// The wanted chunk set around a viewer chunk: a square of `render_distance`
/// columns in x/z and a tower of `y_render_distance` layers anchored at
/// world layer 0 (terrain lives near the ground plane; viewer height does
/// not move the tower).
pub fn wanted_set(viewer_chunk: ChunkCoord, config: &ScanConfig) -> FxHashSet<ChunkCoord> {
    let half = config.render_distance / 2;
    let mut wanted = FxHashSet::default();
    for x in -half..half.max(1) {
        for z in -half..half.max(1) {
            for y in 0..config.y_render_distance.max(1) {
                wanted.insert(ChunkCoord::new(viewer_chunk.x + x, y, viewer_chunk.z + z));
            }
        }
    }
    wanted
}

/// Handle to the running scan thread.
pub struct NeighborhoodScanner {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl NeighborhoodScanner {
    /// Spawns the scan thread.
    ///
    /// Activation candidates go to `activations`, stale coordinates to
    /// `deactivations`. The scheduler re-checks both at consume time, so a
    /// delta that is out of date by the time it is processed is harmless.
    pub fn spawn(
        config: ScanConfig,
        viewer: Arc<ViewerTracker>,
        states: Arc<StateMap>,
        activations: Sender<ChunkCoord>,
        deactivations: Sender<ChunkCoord>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("chunk-scan".into())
            .spawn(move || {
                // Coordinates sent for activation that, as far as this thread
                // knows, have not yet entered the state map. Bounds re-sends
                // while the scheduler works through its per-tick budget.
                let mut enqueued: FxHashSet<ChunkCoord> = FxHashSet::default();

                while !stop_flag.load(Ordering::Relaxed) {
                    let wanted = wanted_set(viewer.chunk_coord(), &config);

                    enqueued.retain(|coord| wanted.contains(coord) && !states.contains(*coord));

                    for &coord in &wanted {
                        if !states.contains(coord) && enqueued.insert(coord) {
                            if activations.send(coord).is_err() {
                                return; // scheduler gone
                            }
                        }
                    }

                    for coord in states.tracked() {
                        if !wanted.contains(&coord) && deactivations.send(coord).is_err() {
                            return;
                        }
                    }

                    std::thread::sleep(config.interval);
                }
            })
            .expect("failed to spawn chunk scan thread");

        Self {
            stop,
            thread: Some(thread),
        }
    }

    /// Stops and joins the scan thread.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for NeighborhoodScanner {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wanted_set_shape() {
        let config = ScanConfig {
            render_distance: 4,
            y_render_distance: 2,
            interval: Duration::from_millis(1),
        };
        let wanted = wanted_set(ChunkCoord::new(10, 5, -3), &config);

        // 4×4 columns × 2 layers.
        assert_eq!(wanted.len(), 32);
        assert!(wanted.contains(&ChunkCoord::new(10, 0, -3)), "own column");
        assert!(wanted.contains(&ChunkCoord::new(8, 1, -5)), "far corner");
        assert!(
            !wanted.contains(&ChunkCoord::new(10, 5, -3)),
            "tower is anchored at layer 0, not at the viewer"
        );
        assert!(!wanted.contains(&ChunkCoord::new(12, 0, -3)), "outside +x");
    }

    #[test]
    fn test_minimum_neighborhood_is_one_chunk_column() {
        let config = ScanConfig {
            render_distance: 1,
            y_render_distance: 1,
            interval: Duration::from_millis(1),
        };
        let wanted = wanted_set(ChunkCoord::new(0, 0, 0), &config);
        assert_eq!(wanted.len(), 1);
        assert!(wanted.contains(&ChunkCoord::new(0, 0, 0)));
    }

    #[test]
    fn test_scanner_emits_activations_then_deactivations() {
        let config = ScanConfig {
            render_distance: 2,
            y_render_distance: 1,
            interval: Duration::from_millis(2),
        };
        let viewer = Arc::new(ViewerTracker::new());
        let states = Arc::new(StateMap::new());
        let (act_tx, act_rx) = crossbeam_channel::unbounded();
        let (deact_tx, deact_rx) = crossbeam_channel::unbounded();

        let mut scanner = NeighborhoodScanner::spawn(
            config,
            Arc::clone(&viewer),
            Arc::clone(&states),
            act_tx,
            deact_tx,
        );

        // All four wanted coordinates arrive as activation deltas.
        let mut seen = FxHashSet::default();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while seen.len() < 4 {
            if let Ok(coord) = act_rx.recv_timeout(Duration::from_millis(50)) {
                seen.insert(coord);
            }
            assert!(std::time::Instant::now() < deadline, "timed out on activations");
        }
        assert_eq!(seen, wanted_set(viewer.chunk_coord(), &config));

        // Track one coordinate, then move the viewer far away: it must come
        // back as a deactivation delta.
        let tracked = *seen.iter().next().expect("non-empty");
        states.try_begin_generation(tracked);
        viewer.update_position([1000.0, 0.0, 1000.0]);

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            if let Ok(coord) = deact_rx.recv_timeout(Duration::from_millis(50))
                && coord == tracked
            {
                break;
            }
            assert!(std::time::Instant::now() < deadline, "timed out on deactivation");
        }

        scanner.stop();
    }

    #[test]
    fn test_scanner_does_not_resend_tracked_coords() {
        let config = ScanConfig {
            render_distance: 2,
            y_render_distance: 1,
            interval: Duration::from_millis(2),
        };
        let viewer = Arc::new(ViewerTracker::new());
        let states = Arc::new(StateMap::new());
        for coord in wanted_set(viewer.chunk_coord(), &config) {
            states.try_begin_generation(coord);
        }
        let (act_tx, act_rx) = crossbeam_channel::unbounded();
        let (deact_tx, _deact_rx) = crossbeam_channel::unbounded();

        let mut scanner =
            NeighborhoodScanner::spawn(config, viewer, Arc::clone(&states), act_tx, deact_tx);
        std::thread::sleep(Duration::from_millis(50));
        scanner.stop();

        assert!(
            act_rx.try_recv().is_err(),
            "already-tracked coordinates are not re-enqueued"
        );
    }
}
