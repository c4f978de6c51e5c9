//! The voxel generation contract.

use rampart_voxel::{ChunkCoord, ChunkVoxels};

/// Produces raw voxel volumes for chunk coordinates.
///
/// Implementations must fill the full padded volume (`CSP³`, flattened
/// `x + z*CSP + y*CSP²`) including the one-voxel shell, and must be pure
/// functions of the coordinate: the same coordinate always yields the same
/// volume, so generation can run on any worker thread in any order.
pub trait VoxelSource: Send + Sync {
    /// Generates the padded voxel volume for one chunk.
    fn generate(&self, coord: ChunkCoord) -> ChunkVoxels;
}

/// A source that returns the same volume for every coordinate.
///
/// Test and benchmark fixture.
pub struct UniformSource(pub ChunkVoxels);

impl VoxelSource for UniformSource {
    fn generate(&self, _coord: ChunkCoord) -> ChunkVoxels {
        self.0.clone()
    }
}
