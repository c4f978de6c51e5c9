//! Asynchronous meshing pipeline: worker threads build chunk surfaces from
//! owned snapshots and deliver them over a channel.
//!
//! Jobs carry a padded snapshot, so workers never lock world data. Results
//! are drained on the main loop, which re-checks coordinate membership and
//! revision before committing — a stale result is discarded there, never
//! applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use rampart_voxel::{BlockRegistry, ChunkCoord, ChunkVoxels};

use crate::builder::MeshBuilder;
use crate::lod::LodLevel;
use crate::surface::ChunkSurfaces;

/// A self-contained meshing job that can run on any worker thread.
pub struct MeshJob {
    /// Coordinate the result will be committed to.
    pub coord: ChunkCoord,
    /// Padded snapshot of the chunk and its neighbor boundaries.
    pub voxels: ChunkVoxels,
    /// Distance coarsening; `None` is the full-detail reference path.
    pub lod: Option<LodLevel>,
    /// Bucket block species into LOD stand-ins (only meaningful with `lod`).
    pub bucket_species: bool,
    /// Chunk data revision at snapshot time, echoed back for stale detection.
    pub revision: u64,
}

/// A completed meshing job.
pub struct MeshResult {
    pub coord: ChunkCoord,
    pub surfaces: ChunkSurfaces,
    pub revision: u64,
}

/// Thread-pool meshing pipeline.
///
/// `submit` is non-blocking and refuses work past the in-flight budget;
/// `drain_results` is called once per tick by the consumer.
pub struct MeshingPipeline {
    job_sender: Option<crossbeam_channel::Sender<MeshJob>>,
    result_receiver: crossbeam_channel::Receiver<MeshResult>,
    workers: Vec<JoinHandle<()>>,
    budget: usize,
    in_flight: Arc<AtomicUsize>,
}

impl MeshingPipeline {
    /// Spawns `worker_count` meshing threads sharing the registry.
    ///
    /// `budget` caps in-flight jobs, bounding snapshot memory.
    pub fn new(worker_count: usize, budget: usize, registry: Arc<BlockRegistry>) -> Self {
        let (job_tx, job_rx) = crossbeam_channel::bounded::<MeshJob>(budget);
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let rx = job_rx.clone();
            let tx = result_tx.clone();
            let registry = Arc::clone(&registry);
            let in_flight = Arc::clone(&in_flight);

            workers.push(
                std::thread::Builder::new()
                    .name("chunk-mesh-worker".into())
                    .spawn(move || {
                        let builder = MeshBuilder::new(&registry);
                        while let Ok(job) = rx.recv() {
                            let surfaces = match job.lod {
                                Some(level) => {
                                    builder.build_lod(job.voxels, level, job.bucket_species)
                                }
                                None => builder.build(job.voxels),
                            };
                            let _ = tx.send(MeshResult {
                                coord: job.coord,
                                surfaces,
                                revision: job.revision,
                            });
                            in_flight.fetch_sub(1, Ordering::Relaxed);
                        }
                    })
                    .expect("failed to spawn mesh worker thread"),
            );
        }

        tracing::debug!(worker_count, budget, "meshing pipeline started");
        Self {
            job_sender: Some(job_tx),
            result_receiver: result_rx,
            workers,
            budget,
            in_flight,
        }
    }

    /// Submits a job. Returns `false` when the budget is exhausted or the
    /// pipeline has shut down.
    pub fn submit(&self, job: MeshJob) -> bool {
        let Some(sender) = &self.job_sender else {
            return false;
        };
        if self.in_flight.load(Ordering::Relaxed) >= self.budget {
            return false;
        }
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if sender.send(job).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Drains every finished result without blocking.
    pub fn drain_results(&self) -> Vec<MeshResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            results.push(result);
        }
        results
    }

    /// Jobs queued or executing right now.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Closes the job channel and joins all workers.
    pub fn shutdown(&mut self) {
        self.job_sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for MeshingPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
