//! Surface categories and mesh assembly.
//!
//! Each chunk build emits up to four categorized surfaces sharing one
//! material each, plus a unified triangle list the physics collaborator can
//! turn into a collision shape. Vertices are accumulated quad-by-quad and
//! deduplicated into an index buffer at the end of the build.

use rustc_hash::FxHashMap;

use rampart_voxel::{BlockRegistry, PackedVoxel};

use crate::face_dir::FaceDir;

/// The four output mesh partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SurfaceKind {
    /// Generic opaque terrain.
    Terrain = 0,
    /// Undamaged grass-block top faces (wind/displacement shading).
    GrassTop = 1,
    /// Lava: emissive material, carries no per-vertex metadata.
    Emissive = 2,
    /// Ore: glow/damage-pulse material.
    Glow = 3,
}

impl SurfaceKind {
    /// All categories in output order.
    pub const ALL: [SurfaceKind; 4] = [
        Self::Terrain,
        Self::GrassTop,
        Self::Emissive,
        Self::Glow,
    ];

    /// The array slot for this category.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The material each category is tagged with for the renderer.
    pub fn material(self) -> MaterialKind {
        match self {
            Self::Terrain | Self::GrassTop => MaterialKind::Terrain,
            Self::Emissive => MaterialKind::Lava,
            Self::Glow => MaterialKind::DamagePulse,
        }
    }
}

/// Material tag handed to the renderer alongside each surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialKind {
    Terrain,
    Lava,
    DamagePulse,
}

/// Picks the output surface for one face of one block.
///
/// Lava always renders emissive; gold ore glows; an undamaged grass block's
/// top face goes to the grass surface; everything else is plain terrain.
pub fn surface_kind(registry: &BlockRegistry, info: PackedVoxel, face: FaceDir) -> SurfaceKind {
    let id = Some(info.block_id());
    if id == registry.lava() {
        SurfaceKind::Emissive
    } else if id == registry.gold_ore() {
        SurfaceKind::Glow
    } else if face == FaceDir::PosY && !info.is_damaged() && id == registry.grass() {
        SurfaceKind::GrassTop
    } else {
        SurfaceKind::Terrain
    }
}

/// One finished surface: parallel vertex attribute arrays plus triangle
/// indices.
///
/// `metadata` is empty for the emissive category and one entry per vertex
/// otherwise: `[texture_layer, uv_repeat_x, uv_repeat_y, damage_byte] / 255`
/// packed into a normalized color.
#[derive(Clone, Debug, Default)]
pub struct SurfaceMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub metadata: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    /// Vertex count before deduplication (4 per quad, 3 per lone triangle).
    pub unindexed_vertex_count: usize,
}

impl SurfaceMesh {
    /// Returns `true` if the surface holds no geometry.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Per-quad record kept for statistics and tests.
#[derive(Clone, Copy, Debug)]
pub struct QuadInfo {
    pub dir: FaceDir,
    pub kind: SurfaceKind,
}

/// The complete mesh output for one chunk.
pub struct ChunkSurfaces {
    /// One mesh per [`SurfaceKind`], indexed by `SurfaceKind::index()`.
    pub surfaces: [SurfaceMesh; 4],
    /// Unified triangle list (positions only, unindexed) for collision shape
    /// generation. `None` when the chunk produced no geometry at all — an
    /// empty chunk gets no collision shape rather than a degenerate one.
    pub collision: Option<Vec<[f32; 3]>>,
    /// One record per greedy quad emitted by the cube pass.
    pub quads: Vec<QuadInfo>,
}

impl ChunkSurfaces {
    /// Returns `true` if every surface is empty.
    pub fn is_empty(&self) -> bool {
        self.surfaces.iter().all(SurfaceMesh::is_empty)
    }

    /// Number of cube-pass quads emitted for a face direction.
    pub fn quad_count_for(&self, dir: FaceDir) -> usize {
        self.quads.iter().filter(|q| q.dir == dir).count()
    }

    /// Total cube-pass quad count.
    pub fn quad_count(&self) -> usize {
        self.quads.len()
    }
}

// ---------------------------------------------------------------------------
// Accumulation
// ---------------------------------------------------------------------------

/// Bit-exact vertex identity for deduplication.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    position: [u32; 3],
    normal: [u32; 3],
    uv: [u32; 2],
    metadata: [u32; 4],
}

fn key_of(position: [f32; 3], normal: [f32; 3], uv: [f32; 2], metadata: [f32; 4]) -> VertexKey {
    VertexKey {
        position: position.map(f32::to_bits),
        normal: normal.map(f32::to_bits),
        uv: uv.map(f32::to_bits),
        metadata: metadata.map(f32::to_bits),
    }
}

/// Accumulates one surface's raw quads/triangles, deduplicating identical
/// vertices into a shared index buffer as they arrive.
pub(crate) struct SurfaceBuilder {
    mesh: SurfaceMesh,
    with_metadata: bool,
    seen: FxHashMap<VertexKey, u32>,
}

impl SurfaceBuilder {
    pub(crate) fn new(kind: SurfaceKind) -> Self {
        Self {
            mesh: SurfaceMesh::default(),
            with_metadata: kind != SurfaceKind::Emissive,
            seen: FxHashMap::default(),
        }
    }

    fn push_vertex(
        &mut self,
        position: [f32; 3],
        normal: [f32; 3],
        uv: [f32; 2],
        metadata: [f32; 4],
    ) -> u32 {
        self.mesh.unindexed_vertex_count += 1;
        let key = key_of(position, normal, uv, metadata);
        if let Some(&index) = self.seen.get(&key) {
            return index;
        }
        let index = self.mesh.positions.len() as u32;
        self.mesh.positions.push(position);
        self.mesh.normals.push(normal);
        self.mesh.uvs.push(uv);
        if self.with_metadata {
            self.mesh.metadata.push(metadata);
        }
        self.seen.insert(key, index);
        index
    }

    /// Adds a quad as 4 vertices and 2 triangles: `(0,1,2)` and `(0,2,3)`.
    pub(crate) fn push_quad(
        &mut self,
        corners: [[f32; 3]; 4],
        normal: [f32; 3],
        uvs: [[f32; 2]; 4],
        metadata: [f32; 4],
    ) {
        let idx = [
            self.push_vertex(corners[0], normal, uvs[0], metadata),
            self.push_vertex(corners[1], normal, uvs[1], metadata),
            self.push_vertex(corners[2], normal, uvs[2], metadata),
            self.push_vertex(corners[3], normal, uvs[3], metadata),
        ];
        self.mesh
            .indices
            .extend_from_slice(&[idx[0], idx[1], idx[2], idx[0], idx[2], idx[3]]);
    }

    /// Adds a lone triangle (used by the slope pass).
    pub(crate) fn push_triangle(
        &mut self,
        corners: [[f32; 3]; 3],
        normal: [f32; 3],
        uvs: [[f32; 2]; 3],
        metadata: [f32; 4],
    ) {
        let idx = [
            self.push_vertex(corners[0], normal, uvs[0], metadata),
            self.push_vertex(corners[1], normal, uvs[1], metadata),
            self.push_vertex(corners[2], normal, uvs[2], metadata),
        ];
        self.mesh.indices.extend_from_slice(&idx);
    }

    pub(crate) fn finish(self) -> SurfaceMesh {
        self.mesh
    }
}

/// Expands every surface's indexed triangles into one flat position list for
/// collision-shape generation.
pub(crate) fn unified_collision(surfaces: &[SurfaceMesh; 4]) -> Option<Vec<[f32; 3]>> {
    let total: usize = surfaces.iter().map(|s| s.indices.len()).sum();
    if total == 0 {
        return None;
    }
    let mut triangles = Vec::with_capacity(total);
    for surface in surfaces {
        for &index in &surface.indices {
            triangles.push(surface.positions[index as usize]);
        }
    }
    Some(triangles)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
