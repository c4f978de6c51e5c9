//! The chunk scheduler: drives generate → mesh → upload around the viewer.
//!
//! A background scan thread supplies coordinate deltas; `tick`, called once
//! per frame on the render-affinity thread, does all the committing. Worker
//! pools only ever see owned snapshots and hand results back over channels,
//! so the ordering guarantee is structural: voxels are inserted into the
//! store before the meshing job for that coordinate is created, and a result
//! is only committed after re-checking that its coordinate is still wanted
//! at the same data revision.

use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use rustc_hash::FxHashMap;

use rampart_mesh::{MeshJob, MeshingPipeline};
use rampart_terrain::{GenerationPool, VoxelSource};
use rampart_voxel::{BlockRegistry, ChunkCoord, ChunkStore};

use crate::scan::{NeighborhoodScanner, ScanConfig};
use crate::sink::{HandlePool, RenderSink};
use crate::state::{ChunkState, StateMap};
use crate::viewer::ViewerTracker;

/// Scheduler tuning.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// Neighborhood shape and scan cadence.
    pub scan: ScanConfig,
    /// Coordinates promoted from the activation queue per tick; caps
    /// frame-time impact of a fresh neighborhood.
    pub max_activations_per_tick: usize,
    /// Generation worker threads.
    pub generation_workers: usize,
    /// Meshing worker threads.
    pub meshing_workers: usize,
    /// In-flight budget for each worker pool.
    pub queue_budget: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            max_activations_per_tick: 6,
            generation_workers: 2,
            meshing_workers: 2,
            queue_budget: 64,
        }
    }
}

/// Counters from one scheduler tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickStats {
    /// Coordinates promoted into generation.
    pub promoted: usize,
    /// Generated volumes inserted into the store.
    pub generated: usize,
    /// Mesh results committed and uploaded.
    pub committed: usize,
    /// Coordinates deactivated and recycled.
    pub deactivated: usize,
    /// Stale generation or mesh results dropped at commit time.
    pub discarded: usize,
}

impl TickStats {
    /// Accumulates another tick's counters.
    pub fn merge(&mut self, other: TickStats) {
        self.promoted += other.promoted;
        self.generated += other.generated;
        self.committed += other.committed;
        self.deactivated += other.deactivated;
        self.discarded += other.discarded;
    }
}

/// Owns the scan thread, the worker pools, and the per-coordinate state.
pub struct ChunkScheduler {
    config: SchedulerConfig,
    store: Arc<ChunkStore>,
    states: Arc<StateMap>,
    viewer: Arc<ViewerTracker>,
    _scanner: NeighborhoodScanner,
    activations: Receiver<ChunkCoord>,
    deactivations: Receiver<ChunkCoord>,
    generation: GenerationPool,
    meshing: MeshingPipeline,
    handles: HandlePool,
    /// Data revision per coordinate; bumped on every store insert so stale
    /// mesh results are recognizable at commit time.
    revisions: FxHashMap<ChunkCoord, u64>,
    /// Coordinates whose meshing submission was refused by the budget.
    mesh_backlog: VecDeque<ChunkCoord>,
}

impl ChunkScheduler {
    /// Builds the scheduler and starts its scan thread and worker pools.
    pub fn new(
        config: SchedulerConfig,
        registry: Arc<BlockRegistry>,
        source: Arc<dyn VoxelSource>,
    ) -> Self {
        let store = Arc::new(ChunkStore::new());
        let states = Arc::new(StateMap::new());
        let viewer = Arc::new(ViewerTracker::new());
        let (act_tx, act_rx) = crossbeam_channel::unbounded();
        let (deact_tx, deact_rx) = crossbeam_channel::unbounded();

        let scanner = NeighborhoodScanner::spawn(
            config.scan,
            Arc::clone(&viewer),
            Arc::clone(&states),
            act_tx,
            deact_tx,
        );
        let generation =
            GenerationPool::new(config.generation_workers, config.queue_budget, source);
        let meshing = MeshingPipeline::new(config.meshing_workers, config.queue_budget, registry);

        tracing::info!(
            render_distance = config.scan.render_distance,
            generation_workers = config.generation_workers,
            meshing_workers = config.meshing_workers,
            "chunk scheduler started"
        );

        Self {
            config,
            store,
            states,
            viewer,
            _scanner: scanner,
            activations: act_rx,
            deactivations: deact_rx,
            generation,
            meshing,
            handles: HandlePool::new(),
            revisions: FxHashMap::default(),
            mesh_backlog: VecDeque::new(),
        }
    }

    /// The shared chunk store.
    pub fn store(&self) -> Arc<ChunkStore> {
        Arc::clone(&self.store)
    }

    /// The shared viewer tracker; publish the camera position here.
    pub fn viewer(&self) -> Arc<ViewerTracker> {
        Arc::clone(&self.viewer)
    }

    /// The coordinate's lifecycle state, if tracked.
    pub fn state(&self, coord: ChunkCoord) -> Option<ChunkState> {
        self.states.state(coord)
    }

    /// Runs one scheduling tick on the render-affinity thread.
    pub fn tick(&mut self, sink: &mut impl RenderSink) -> TickStats {
        let mut stats = TickStats::default();

        // 1. Deactivations first, so freed handles are poolable this tick.
        while let Ok(coord) = self.deactivations.try_recv() {
            self.deactivate(coord, sink, &mut stats);
        }

        // 2. Retry meshing submissions the budget refused earlier.
        for _ in 0..self.mesh_backlog.len() {
            let Some(coord) = self.mesh_backlog.pop_front() else {
                break;
            };
            if self.states.state(coord) == Some(ChunkState::PendingMesh) {
                self.try_submit_mesh(coord);
            }
        }

        // 3. Promote a bounded number of new coordinates into generation.
        while stats.promoted < self.config.max_activations_per_tick {
            let Ok(coord) = self.activations.try_recv() else {
                break;
            };
            if !self.states.try_begin_generation(coord) {
                continue; // already tracked; scanner raced a previous tick
            }
            if self.generation.submit(coord) {
                stats.promoted += 1;
            } else {
                // Pool saturated: back out; the scanner will re-enqueue.
                self.states.remove(coord);
                break;
            }
        }

        // 4. Completed generations: store first, then hand off to meshing.
        for generated in self.generation.drain_completed() {
            if self.states.state(generated.coord) != Some(ChunkState::PendingGeneration) {
                tracing::debug!(coord = ?generated.coord, "dropping stale generation result");
                stats.discarded += 1;
                continue;
            }
            self.store.insert_voxels(generated.coord, generated.voxels);
            *self.revisions.entry(generated.coord).or_insert(0) += 1;
            self.states.mark_pending_mesh(generated.coord);
            stats.generated += 1;
            self.try_submit_mesh(generated.coord);
        }

        // 5. Completed meshes: re-check membership and revision, then commit.
        for result in self.meshing.drain_results() {
            let current = self.revisions.get(&result.coord).copied().unwrap_or(0);
            if self.states.state(result.coord) != Some(ChunkState::Meshing)
                || result.revision != current
            {
                tracing::debug!(coord = ?result.coord, "dropping stale mesh result");
                stats.discarded += 1;
                continue;
            }
            let handle = self
                .store
                .mesh_handle(result.coord)
                .unwrap_or_else(|| self.handles.acquire());
            self.store.bind_mesh(result.coord, handle);
            sink.upload(handle, &result.surfaces, result.coord.world_min());
            self.states.activate(result.coord);
            stats.committed += 1;
        }

        stats
    }

    /// Deactivates every tracked coordinate and clears all cached data
    /// (world reset / render-distance change).
    pub fn clear(&mut self, sink: &mut impl RenderSink) {
        let mut stats = TickStats::default();
        for coord in self.states.tracked() {
            self.deactivate(coord, sink, &mut stats);
        }
        self.store.clear();
        self.revisions.clear();
        self.mesh_backlog.clear();
        tracing::info!(recycled = stats.deactivated, "chunk scheduler cleared");
    }

    fn deactivate(&mut self, coord: ChunkCoord, sink: &mut impl RenderSink, stats: &mut TickStats) {
        if self.states.remove(coord).is_none() {
            return; // duplicate delta from an earlier scan
        }
        self.generation.cancel(coord);
        self.store.remove_voxels(coord);
        self.revisions.remove(&coord);
        if let Some(handle) = self.store.take_mesh(coord) {
            sink.retire(handle);
            self.handles.release(handle);
        }
        stats.deactivated += 1;
    }

    /// Claims the meshing slot for a PendingMesh coordinate and submits its
    /// snapshot; a budget refusal requeues it for a later tick.
    fn try_submit_mesh(&mut self, coord: ChunkCoord) {
        let Some(voxels) = self.store.padded_snapshot(coord) else {
            return; // voxels vanished; the deactivation path owns this coord
        };
        if !self.states.try_begin_meshing(coord) {
            return;
        }
        let revision = self.revisions.get(&coord).copied().unwrap_or(0);
        let job = MeshJob {
            coord,
            voxels,
            lod: None,
            bucket_species: false,
            revision,
        };
        if !self.meshing.submit(job) {
            self.states.requeue_mesh(coord);
            self.mesh_backlog.push_back(coord);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
