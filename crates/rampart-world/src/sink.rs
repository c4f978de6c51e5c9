//! The renderer/physics hand-off boundary and the mesh handle pool.

use rampart_mesh::ChunkSurfaces;
use rampart_voxel::MeshHandle;

/// The renderer/physics collaborator.
///
/// Implementations own the actual GPU/physics resources behind each
/// [`MeshHandle`]. The scheduler calls these only from the thread that runs
/// its tick (the render-affinity thread); worker threads never touch a sink.
pub trait RenderSink {
    /// (Re)populates a handle with the chunk's surfaces and collision data,
    /// positioned at `transform` (the chunk's world minimum corner).
    fn upload(&mut self, handle: MeshHandle, surfaces: &ChunkSurfaces, transform: [f32; 3]);

    /// Clears a handle's geometry and hides it; the handle returns to the
    /// pool for reuse.
    fn retire(&mut self, handle: MeshHandle);
}

/// Free-list of recycled mesh handles.
///
/// Deactivated chunks return their handle here instead of destroying
/// renderer resources; the next activation reuses it with a new transform.
#[derive(Default)]
pub struct HandlePool {
    free: Vec<MeshHandle>,
    next: u32,
}

impl HandlePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a pooled handle, or mints a fresh one.
    pub fn acquire(&mut self) -> MeshHandle {
        self.free.pop().unwrap_or_else(|| {
            let handle = MeshHandle(self.next);
            self.next += 1;
            handle
        })
    }

    /// Returns a handle for reuse.
    pub fn release(&mut self, handle: MeshHandle) {
        self.free.push(handle);
    }

    /// Handles currently waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Total handles ever minted.
    pub fn minted(&self) -> u32 {
        self.next
    }
}

/// Recording sink for tests and headless runs.
#[derive(Default)]
pub struct RecordingSink {
    /// `(handle, transform, quad_count, had_collision)` per upload, in order.
    pub uploads: Vec<(MeshHandle, [f32; 3], usize, bool)>,
    /// Retired handles in order.
    pub retired: Vec<MeshHandle>,
}

impl RenderSink for RecordingSink {
    fn upload(&mut self, handle: MeshHandle, surfaces: &ChunkSurfaces, transform: [f32; 3]) {
        self.uploads.push((
            handle,
            transform,
            surfaces.quad_count(),
            surfaces.collision.is_some(),
        ));
    }

    fn retire(&mut self, handle: MeshHandle) {
        self.retired.push(handle);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
