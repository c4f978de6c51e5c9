//! Voxel data model: packed per-voxel state, the block type registry, padded
//! chunk volumes, and the concurrent chunk store.

pub mod chunk;
pub mod packed;
pub mod registry;
pub mod store;

pub use chunk::{CHUNK_SIZE, CSP, CSP2, CSP3, ChunkVoxels, padded_index, padded_pos};
pub use packed::{
    BLOCK_BREAK_DAMAGE_THRESHOLD, PackedVoxel, SlopeKind, pack_damage_byte, pack_slope_byte,
};
pub use registry::{
    BlockDef, BlockId, BlockRegistry, BlockSpecies, BlockType, DamageType, FaceTextures,
    RegistryError,
};
pub use store::{ChunkCoord, ChunkStore, MeshHandle};
