//! Terrain generation: the voxel source contract, the default heightmap
//! generator, and the background generation pool.

pub mod heightmap;
pub mod pool;
pub mod source;

pub use heightmap::{HeightmapParams, HeightmapSource, TerrainPalette};
pub use pool::{GeneratedChunk, GenerationPool};
pub use source::{UniformSource, VoxelSource};
