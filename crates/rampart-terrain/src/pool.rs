//! Background generation pool: runs a [`VoxelSource`] on worker threads.
//!
//! Tasks carry only a coordinate; the source is shared read-only. Each task
//! has a cancellation flag checked before and after the (expensive) generate
//! call, so chunks that leave the active neighborhood mid-generation are
//! dropped instead of delivered.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use rampart_voxel::{ChunkCoord, ChunkVoxels};

use crate::source::VoxelSource;

/// A fully generated chunk ready for insertion into the store.
pub struct GeneratedChunk {
    pub coord: ChunkCoord,
    pub voxels: ChunkVoxels,
    /// Worker-side generation time, for profiling.
    pub elapsed_us: u64,
}

struct GenerationTask {
    coord: ChunkCoord,
    cancelled: Arc<AtomicBool>,
}

/// Thread pool generating chunks through a shared [`VoxelSource`].
pub struct GenerationPool {
    task_sender: Option<Sender<GenerationTask>>,
    result_receiver: Receiver<GeneratedChunk>,
    workers: Vec<JoinHandle<()>>,
    active: Arc<DashMap<ChunkCoord, Arc<AtomicBool>, FxBuildHasher>>,
    in_flight: Arc<AtomicUsize>,
    budget: usize,
}

impl GenerationPool {
    /// Spawns `worker_count` generation threads.
    ///
    /// `budget` caps in-flight tasks; excess submissions are rejected rather
    /// than queued without bound.
    pub fn new(worker_count: usize, budget: usize, source: Arc<dyn VoxelSource>) -> Self {
        let (task_tx, task_rx) = crossbeam_channel::bounded::<GenerationTask>(budget);
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let rx = task_rx.clone();
            let tx = result_tx.clone();
            let source = Arc::clone(&source);
            let in_flight = Arc::clone(&in_flight);

            workers.push(
                std::thread::Builder::new()
                    .name("chunk-gen-worker".into())
                    .spawn(move || {
                        while let Ok(task) = rx.recv() {
                            if task.cancelled.load(Ordering::Relaxed) {
                                in_flight.fetch_sub(1, Ordering::Relaxed);
                                continue;
                            }

                            let start = std::time::Instant::now();
                            let voxels = source.generate(task.coord);
                            let elapsed_us = start.elapsed().as_micros() as u64;

                            if !task.cancelled.load(Ordering::Relaxed) {
                                let _ = tx.send(GeneratedChunk {
                                    coord: task.coord,
                                    voxels,
                                    elapsed_us,
                                });
                            }
                            in_flight.fetch_sub(1, Ordering::Relaxed);
                        }
                    })
                    .expect("failed to spawn generation worker thread"),
            );
        }

        Self {
            task_sender: Some(task_tx),
            result_receiver: result_rx,
            workers,
            active: Arc::new(DashMap::with_hasher(FxBuildHasher)),
            in_flight,
            budget,
        }
    }

    /// Sensible worker count: leave headroom for the main and render threads.
    pub fn recommended_workers() -> usize {
        num_cpus::get().saturating_sub(2).max(1)
    }

    /// Submits a coordinate for generation.
    ///
    /// Returns `false` if the coordinate is already pending, the budget is
    /// exhausted, or the pool has shut down.
    pub fn submit(&self, coord: ChunkCoord) -> bool {
        let Some(sender) = &self.task_sender else {
            return false;
        };
        if self.in_flight.load(Ordering::Relaxed) >= self.budget {
            return false;
        }
        if self.active.contains_key(&coord) {
            return false;
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        self.active.insert(coord, Arc::clone(&cancelled));
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        if sender.try_send(GenerationTask { coord, cancelled }).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            self.active.remove(&coord);
            return false;
        }
        true
    }

    /// Best-effort cancellation of a pending or running task.
    ///
    /// A task that already finished is unaffected; its result still arrives
    /// and the caller discards it at commit time.
    pub fn cancel(&self, coord: ChunkCoord) {
        if let Some((_, cancelled)) = self.active.remove(&coord) {
            cancelled.store(true, Ordering::Relaxed);
            tracing::debug!(?coord, "generation cancelled");
        }
    }

    /// Drains every completed chunk without blocking.
    pub fn drain_completed(&self) -> Vec<GeneratedChunk> {
        let mut results = Vec::new();
        while let Ok(chunk) = self.result_receiver.try_recv() {
            self.active.remove(&chunk.coord);
            results.push(chunk);
        }
        results
    }

    /// Returns `true` if the coordinate has an uncancelled task outstanding.
    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.active.contains_key(&coord)
    }

    /// Tasks queued or executing right now.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Closes the task channel and joins all workers.
    pub fn shutdown(&mut self) {
        self.task_sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for GenerationPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rampart_voxel::{BlockId, PackedVoxel};

    use super::*;
    use crate::source::UniformSource;

    fn stone_source() -> Arc<dyn VoxelSource> {
        let mut voxels = ChunkVoxels::new_empty();
        voxels.set_interior(0, 0, 0, PackedVoxel::EMPTY.with_block_id(BlockId(1)));
        Arc::new(UniformSource(voxels))
    }

    fn drain_until(pool: &GenerationPool, count: usize) -> Vec<GeneratedChunk> {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        let mut results = Vec::new();
        while results.len() < count {
            results.extend(pool.drain_completed());
            assert!(
                std::time::Instant::now() < deadline,
                "timed out waiting for {count} generated chunks"
            );
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        results
    }

    #[test]
    fn test_generates_submitted_coordinates() {
        let pool = GenerationPool::new(4, 64, stone_source());
        let coords: Vec<ChunkCoord> = (0..16).map(|i| ChunkCoord::new(i, 0, i)).collect();
        for &coord in &coords {
            assert!(pool.submit(coord), "submit {coord:?}");
        }

        let results = drain_until(&pool, coords.len());
        let mut got: Vec<ChunkCoord> = results.iter().map(|r| r.coord).collect();
        got.sort();
        let mut expected = coords.clone();
        expected.sort();
        assert_eq!(got, expected);
        assert_eq!(pool.in_flight_count(), 0);
    }

    #[test]
    fn test_duplicate_submission_rejected_while_pending() {
        let pool = GenerationPool::new(1, 8, stone_source());
        let coord = ChunkCoord::new(5, 0, 5);
        assert!(pool.submit(coord));
        // Either still queued or already finished; a second submit while
        // pending must be refused.
        if pool.is_pending(coord) {
            assert!(!pool.submit(coord));
        }
        drain_until(&pool, 1);
    }

    #[test]
    fn test_budget_rejects_excess() {
        let pool = GenerationPool::new(1, 2, stone_source());
        let mut accepted = 0;
        for i in 0..50 {
            if pool.submit(ChunkCoord::new(i, 0, 0)) {
                accepted += 1;
            }
        }
        assert!(accepted < 50, "budget must bound instant submissions");
    }

    /// Source slow enough to pin a worker while the test races it.
    struct SlowSource;

    impl VoxelSource for SlowSource {
        fn generate(&self, _coord: ChunkCoord) -> ChunkVoxels {
            std::thread::sleep(std::time::Duration::from_millis(50));
            ChunkVoxels::new_empty()
        }
    }

    #[test]
    fn test_cancelled_before_start_never_delivers() {
        // A single worker busy on the first task guarantees the second is
        // still queued when we cancel it.
        let pool = GenerationPool::new(1, 8, Arc::new(SlowSource));
        let first = ChunkCoord::new(0, 0, 0);
        let victim = ChunkCoord::new(1, 0, 0);
        assert!(pool.submit(first));
        assert!(pool.submit(victim));
        pool.cancel(victim);

        std::thread::sleep(std::time::Duration::from_millis(200));
        let results = pool.drain_completed();
        assert!(
            results.iter().all(|r| r.coord != victim),
            "cancelled-before-start task must not deliver"
        );
        assert!(!pool.is_pending(victim));
    }
}
