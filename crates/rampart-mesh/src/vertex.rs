//! Interleaved vertex layout for the renderer hand-off.
//!
//! The host renderer consumes plain attribute arrays; this mirror packs them
//! into one byte-castable struct for engines that want a single interleaved
//! buffer instead.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use crate::surface::SurfaceMesh;

/// One interleaved render vertex: position, normal, UV, metadata color.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RenderVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// `[texture_layer, uv_repeat_x, uv_repeat_y, damage] / 255`; all zero on
    /// the emissive surface, which carries no metadata.
    pub metadata: [f32; 4],
}

const_assert_eq!(std::mem::size_of::<RenderVertex>(), 48);
const_assert_eq!(std::mem::align_of::<RenderVertex>(), 4);

/// Interleaves a surface's attribute arrays into render vertices.
pub fn interleave(surface: &SurfaceMesh) -> Vec<RenderVertex> {
    let mut vertices = Vec::with_capacity(surface.positions.len());
    for i in 0..surface.positions.len() {
        vertices.push(RenderVertex {
            position: surface.positions[i],
            normal: surface.normals[i],
            uv: surface.uvs[i],
            metadata: surface.metadata.get(i).copied().unwrap_or([0.0; 4]),
        });
    }
    vertices
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
