//! Chunk meshing: binary-plane face culling, greedy quad merging, sloped
//! block geometry, surface batching, and the async meshing pipeline.

pub mod builder;
pub mod extract;
pub mod face_dir;
pub mod greedy;
pub mod lod;
pub mod pipeline;
mod slope;
pub mod surface;
pub mod vertex;

pub use builder::MeshBuilder;
pub use extract::{ExtractedFaces, FacePlanes, extract_faces};
pub use face_dir::{CUBE_AXIS, CUBE_VERTS, FaceDir};
pub use greedy::{BitPlane, GreedyQuad, PLANE_MASK, greedy_mesh_plane};
pub use lod::{LodLevel, coarsen_for_grouping};
pub use pipeline::{MeshJob, MeshResult, MeshingPipeline};
pub use surface::{ChunkSurfaces, MaterialKind, QuadInfo, SurfaceKind, SurfaceMesh, surface_kind};
pub use vertex::{RenderVertex, interleave};
