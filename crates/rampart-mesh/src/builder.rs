//! Chunk mesh building: extraction → greedy merge → quad emission → slope
//! pass → surface assembly.
//!
//! The builder is a pure function of a padded voxel snapshot and the block
//! registry; it touches no shared state and can run on any worker thread.

use rampart_voxel::{BlockRegistry, ChunkVoxels, PackedVoxel, padded_pos};

use crate::extract::extract_faces;
use crate::face_dir::{CUBE_AXIS, CUBE_VERTS, FaceDir};
use crate::greedy::{GreedyQuad, greedy_mesh_plane};
use crate::lod::{LodLevel, coarsen_for_grouping};
use crate::slope::emit_slope;
use crate::surface::{ChunkSurfaces, QuadInfo, SurfaceBuilder, SurfaceKind, surface_kind, unified_collision};

/// Builds categorized chunk surfaces from padded voxel snapshots.
///
/// Holds only a registry reference; construct one per meshing context and
/// pass it explicitly (no process-wide state).
pub struct MeshBuilder<'a> {
    registry: &'a BlockRegistry,
}

impl<'a> MeshBuilder<'a> {
    /// Creates a builder over the given registry.
    pub fn new(registry: &'a BlockRegistry) -> Self {
        Self { registry }
    }

    /// Full-detail build: faces group by their exact packed word, so damage
    /// levels and slope flags never merge.
    pub fn build(&self, voxels: ChunkVoxels) -> ChunkSurfaces {
        self.build_inner(voxels, |info| info)
    }

    /// Distance build: the packed word is coarsened before grouping to trade
    /// fidelity for merge opportunities (see [`LodLevel`]).
    pub fn build_lod(
        &self,
        voxels: ChunkVoxels,
        level: LodLevel,
        bucket_species: bool,
    ) -> ChunkSurfaces {
        self.build_inner(voxels, |info| {
            coarsen_for_grouping(info, level, bucket_species, self.registry)
        })
    }

    fn build_inner(
        &self,
        mut voxels: ChunkVoxels,
        coarsen: impl Fn(PackedVoxel) -> PackedVoxel,
    ) -> ChunkSurfaces {
        let extracted = extract_faces(&mut voxels, coarsen);

        let mut builders = [
            SurfaceBuilder::new(SurfaceKind::Terrain),
            SurfaceBuilder::new(SurfaceKind::GrassTop),
            SurfaceBuilder::new(SurfaceKind::Emissive),
            SurfaceBuilder::new(SurfaceKind::Glow),
        ];
        let mut quads = Vec::new();

        for face in FaceDir::ALL {
            for (info, layers) in &extracted.planes[face.index()] {
                for (&layer, rows) in layers {
                    let mut plane = *rows;
                    for quad in greedy_mesh_plane(&mut plane) {
                        let kind = surface_kind(self.registry, *info, face);
                        self.emit_quad(&mut builders[kind.index()], face, layer, quad, *info);
                        quads.push(QuadInfo { dir: face, kind });
                    }
                }
            }
        }

        for &(index, info) in &extracted.slopes {
            let (px, py, pz) = padded_pos(index);
            let pos = [px as i32 - 1, py as i32 - 1, pz as i32 - 1];
            emit_slope(&mut builders, self.registry, pos, info);
        }

        let surfaces = builders.map(SurfaceBuilder::finish);
        let collision = unified_collision(&surfaces);
        ChunkSurfaces {
            surfaces,
            collision,
            quads,
        }
    }

    /// Emits one merged quad: plane coordinates back to 3-D via the per-face
    /// permutation, four corners scaled from the canonical cube tables, two
    /// triangles, flat normal, and metadata with the UV repeat scale.
    fn emit_quad(
        &self,
        builder: &mut SurfaceBuilder,
        face: FaceDir,
        layer: usize,
        quad: GreedyQuad,
        info: PackedVoxel,
    ) {
        let (col, row) = (quad.col as f32, quad.row as f32);
        let (k, k1) = (layer as f32, layer as f32 + 1.0);
        let (w, h) = (quad.width as f32, quad.height as f32);

        // Plane (row, col) → chunk space, with +axis faces shifted one voxel
        // out along their axis.
        let offset = match face {
            FaceDir::NegY => [col, k, row],
            FaceDir::PosY => [col, k1, row],
            FaceDir::NegX => [k, row, col],
            FaceDir::PosX => [k1, row, col],
            FaceDir::NegZ => [col, row, k],
            FaceDir::PosZ => [col, row, k1],
        };
        let extent = match face {
            FaceDir::NegY | FaceDir::PosY => [w, 0.0, h],
            FaceDir::NegX | FaceDir::PosX => [0.0, h, w],
            FaceDir::NegZ | FaceDir::PosZ => [w, h, 0.0],
        };
        // The top face's UV repeat is transposed relative to every other face.
        let uv_scale = match face {
            FaceDir::PosY => [h, w],
            _ => [w, h],
        };

        let corners = CUBE_AXIS[face.index()].map(|c| {
            let unit = CUBE_VERTS[c];
            [
                offset[0] + unit[0] * extent[0],
                offset[1] + unit[1] * extent[1],
                offset[2] + unit[2] * extent[2],
            ]
        });

        let layer_index = self.registry.texture_layers(info.block_id())[face.index()];
        let metadata = [
            f32::from(layer_index),
            uv_scale[0],
            uv_scale[1],
            f32::from(info.damage_byte()),
        ]
        .map(|component| component / 255.0);

        let uvs = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
        builder.push_quad(corners, face.normal(), uvs, metadata);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
