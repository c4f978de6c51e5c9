//! Concurrent chunk storage: the single authority for which chunks exist.
//!
//! Voxel volumes and mesh handles are keyed by [`ChunkCoord`] in sharded
//! concurrent maps, so generation workers can insert distinct chunks in
//! parallel while the scheduler and mesher read. No global lock serializes
//! unrelated chunks; same-coordinate write ordering is the scheduler's job
//! (it keeps at most one in-flight write per coordinate).

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};

use crate::chunk::{CHUNK_SIZE, CSP, ChunkVoxels};

/// A chunk's position on the chunk grid (world position / [`CHUNK_SIZE`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinate offset by `(dx, dy, dz)` chunk steps.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// The world-space position of this chunk's minimum corner.
    pub fn world_min(self) -> [f32; 3] {
        [
            self.x as f32 * CHUNK_SIZE as f32,
            self.y as f32 * CHUNK_SIZE as f32,
            self.z as f32 * CHUNK_SIZE as f32,
        ]
    }
}

/// Non-owning reference to a renderer-side mesh/collision resource.
///
/// The renderer collaborator owns the actual geometry; the store only
/// associates a coordinate with the handle currently showing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// Concurrent map of chunk coordinate → voxel volume, plus the coordinate →
/// mesh-handle association.
pub struct ChunkStore {
    voxels: DashMap<ChunkCoord, ChunkVoxels, FxBuildHasher>,
    meshes: DashMap<ChunkCoord, MeshHandle, FxBuildHasher>,
}

impl ChunkStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            voxels: DashMap::with_hasher(FxBuildHasher),
            meshes: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Returns `true` if voxel data exists for the coordinate.
    ///
    /// Lookup only — never triggers generation.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.voxels.contains_key(&coord)
    }

    /// Clones out the chunk's voxel volume, or `None` if absent.
    pub fn snapshot(&self, coord: ChunkCoord) -> Option<ChunkVoxels> {
        self.voxels.get(&coord).map(|entry| entry.clone())
    }

    /// Inserts or replaces the chunk's voxel volume.
    ///
    /// Safe to call concurrently for distinct coordinates from multiple
    /// generation workers.
    pub fn insert_voxels(&self, coord: ChunkCoord, voxels: ChunkVoxels) {
        self.voxels.insert(coord, voxels);
    }

    /// Removes and returns the chunk's voxel volume.
    pub fn remove_voxels(&self, coord: ChunkCoord) -> Option<ChunkVoxels> {
        self.voxels.remove(&coord).map(|(_, v)| v)
    }

    /// Edits the chunk's voxels in place (block break/place, damage updates).
    ///
    /// Returns `false` if the chunk is not loaded.
    pub fn update_voxels(&self, coord: ChunkCoord, edit: impl FnOnce(&mut ChunkVoxels)) -> bool {
        match self.voxels.get_mut(&coord) {
            Some(mut entry) => {
                edit(&mut entry);
                true
            }
            None => false,
        }
    }

    /// Number of chunks with voxel data.
    pub fn loaded_count(&self) -> usize {
        self.voxels.len()
    }

    /// Associates a mesh handle with a coordinate.
    pub fn bind_mesh(&self, coord: ChunkCoord, handle: MeshHandle) {
        self.meshes.insert(coord, handle);
    }

    /// Returns the mesh handle currently bound to a coordinate.
    pub fn mesh_handle(&self, coord: ChunkCoord) -> Option<MeshHandle> {
        self.meshes.get(&coord).map(|entry| *entry)
    }

    /// Removes and returns the coordinate's mesh handle (for pooling).
    pub fn take_mesh(&self, coord: ChunkCoord) -> Option<MeshHandle> {
        self.meshes.remove(&coord).map(|(_, h)| h)
    }

    /// Drops all voxel and mesh entries (world reset / render-distance change).
    pub fn clear(&self) {
        self.voxels.clear();
        self.meshes.clear();
    }

    /// Builds the meshing-time padded volume for a chunk: the local volume
    /// with its padding shell refreshed from the 26 neighbors.
    ///
    /// A missing neighbor leaves the local chunk's own cells in place at
    /// those padded positions — the generation-time padding, or whatever the
    /// volume last held. At world edges this visually mirrors the boundary
    /// instead of crashing; accepted approximation, see DESIGN.md.
    ///
    /// Returns `None` if the chunk itself has no voxel data.
    pub fn padded_snapshot(&self, coord: ChunkCoord) -> Option<ChunkVoxels> {
        let mut snapshot = self.snapshot(coord)?;

        for dy in -1i32..=1 {
            for dz in -1i32..=1 {
                for dx in -1i32..=1 {
                    if (dx, dy, dz) == (0, 0, 0) {
                        continue;
                    }
                    let Some(neighbor) = self.voxels.get(&coord.offset(dx, dy, dz)) else {
                        continue;
                    };
                    for y in shell_range(dy) {
                        for z in shell_range(dz) {
                            for x in shell_range(dx) {
                                let sx = wrap_axis(x, dx);
                                let sy = wrap_axis(y, dy);
                                let sz = wrap_axis(z, dz);
                                snapshot.set_at(x, y, z, neighbor.get_at(sx, sy, sz));
                            }
                        }
                    }
                }
            }
        }

        Some(snapshot)
    }
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Padded coordinate range belonging to a neighbor offset along one axis.
fn shell_range(delta: i32) -> std::ops::RangeInclusive<usize> {
    match delta {
        -1 => 0..=0,
        0 => 1..=CHUNK_SIZE,
        _ => (CSP - 1)..=(CSP - 1),
    }
}

/// Maps a padded coordinate into the neighbor chunk's own padded space.
fn wrap_axis(padded: usize, delta: i32) -> usize {
    (padded as i32 - delta * CHUNK_SIZE as i32) as usize
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
