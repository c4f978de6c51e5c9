//! Individual geometry for sloped voxels.
//!
//! Slopes never enter the greedy pass; each one is meshed alone from the
//! unit cube's corners with kind-specific vertical pulls on the top face,
//! then rotated by the packed yaw (and flip) and translated into place.
//! The per-(kind, face) triangle table below is the crux of slope
//! correctness; the winding and UV flips are deliberate and asymmetric.

use glam::{Quat, Vec3};

use rampart_voxel::{BlockRegistry, PackedVoxel, SlopeKind};

use crate::face_dir::{CUBE_AXIS, CUBE_VERTS, FaceDir};
use crate::surface::{SurfaceBuilder, surface_kind};

const INV_SQRT_2: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Normal of a Side slope's slanted top, before yaw/flip (facing −Z).
const SLOPE_NORMAL: Vec3 = Vec3::new(0.0, INV_SQRT_2, -INV_SQRT_2);

/// Normal of a Corner/InvCorner slope's slanted top, before yaw/flip.
const SLOPE_CORNER_NORMAL: Vec3 = Vec3::new(INV_SQRT_2, INV_SQRT_2, -INV_SQRT_2);

const UV_A: [f32; 2] = [0.0, 0.0];
const UV_B: [f32; 2] = [0.0, 1.0];
const UV_C: [f32; 2] = [1.0, 1.0];
const UV_D: [f32; 2] = [1.0, 0.0];

/// Emits one sloped voxel's triangles into the surface builders.
///
/// `pos` is the voxel's unpadded chunk-local position.
pub(crate) fn emit_slope(
    builders: &mut [SurfaceBuilder; 4],
    registry: &BlockRegistry,
    pos: [i32; 3],
    info: PackedVoxel,
) {
    let kind = info.slope_kind();
    let side = kind == SlopeKind::Side;
    let corner = kind == SlopeKind::Corner;
    let inv_corner = kind == SlopeKind::InvCorner;

    let yaw = Quat::from_rotation_y(info.slope_rotation_radians());
    // A half-turn about the forward axis; at π the axis sign is irrelevant.
    let flip_rot = Quat::from_rotation_z(std::f32::consts::PI);
    let flip = info.slope_flip();

    let base = Vec3::new(pos[0] as f32, pos[1] as f32, pos[2] as f32) + Vec3::splat(0.5);
    let damage = f32::from(info.damage_byte());
    let layers = registry.texture_layers(info.block_id());

    for face in FaceDir::ALL {
        // A Side slope is a ramp: its back face does not exist.
        if side && face == FaceDir::NegZ {
            continue;
        }
        let fi = face.index();

        let mut verts = [Vec3::ZERO; 4];
        for (c, vert) in verts.iter_mut().enumerate() {
            let mut p = Vec3::from(CUBE_VERTS[CUBE_AXIS[fi][c]]) - Vec3::splat(0.5);
            if face == FaceDir::PosY {
                // Pull top corners down to shape the ramp.
                if side && c < 2 {
                    p.y -= 1.0;
                }
                if corner && c < 3 {
                    p.y -= 1.0;
                }
                if inv_corner && c == 1 {
                    p.y -= 1.0;
                }
            }
            p = yaw * p;
            if flip {
                p = flip_rot * p;
            }
            *vert = p + base;
        }

        let mut normal = Vec3::from(face.normal());
        if flip {
            normal = flip_rot * normal;
        }
        normal = yaw * normal;

        let metadata =
            [f32::from(layers[fi]), 1.0, 1.0, damage].map(|component| component / 255.0);
        let builder = &mut builders[surface_kind(registry, info, face).index()];

        let tri1 = [verts[0], verts[1], verts[2]];
        let tri2 = [verts[0], verts[2], verts[3]];
        let push = |builder: &mut SurfaceBuilder, tri: [Vec3; 3], uvs: [[f32; 2]; 3], n: Vec3| {
            builder.push_triangle(tri.map(|v| v.to_array()), n.to_array(), uvs, metadata);
        };

        match face {
            FaceDir::PosY => {
                // An InvCorner keeps one flat half of its top.
                if inv_corner {
                    push(builder, tri2, [UV_A, UV_C, UV_D], normal);
                }
                let mut slant = if corner || inv_corner {
                    SLOPE_CORNER_NORMAL
                } else {
                    SLOPE_NORMAL
                };
                if flip {
                    slant = flip_rot * slant;
                }
                slant = yaw * slant;
                if side || inv_corner {
                    push(builder, tri1, [UV_A, UV_B, UV_C], slant);
                }
                if !inv_corner {
                    push(builder, tri2, [UV_A, UV_C, UV_D], slant);
                }
            }
            FaceDir::NegX => {
                push(builder, tri1, [UV_A, UV_B, UV_C], normal);
                if inv_corner {
                    push(builder, tri2, [UV_A, UV_C, UV_D], normal);
                }
            }
            FaceDir::PosX => {
                // The ramp cuts this face to one triangle on the far edge.
                if side || inv_corner {
                    let tri = [verts[1], verts[2], verts[3]];
                    push(builder, tri, [UV_C, UV_B, UV_A], normal);
                }
            }
            FaceDir::NegZ => {
                if inv_corner {
                    push(builder, tri1, [UV_A, UV_B, UV_C], normal);
                }
            }
            FaceDir::PosZ => {
                if side || inv_corner {
                    push(builder, tri1, [UV_A, UV_B, UV_C], normal);
                    push(builder, tri2, [UV_A, UV_C, UV_D], normal);
                }
                if corner {
                    let tri = [verts[1], verts[2], verts[3]];
                    push(builder, tri, [UV_C, UV_B, UV_A], normal);
                }
            }
            FaceDir::NegY => {
                push(builder, tri1, [UV_A, UV_B, UV_C], normal);
                if !corner {
                    push(builder, tri2, [UV_A, UV_C, UV_D], normal);
                }
            }
        }
    }
}

/// Triangle counts per face for each slope kind, before yaw/flip.
///
/// Face order matches [`FaceDir::ALL`]. Kept alongside the emission code as
/// the authoritative budget; the builder tests assert against it.
#[cfg(test)]
pub(crate) fn expected_triangles(kind: SlopeKind) -> [usize; 6] {
    match kind {
        SlopeKind::None => [2; 6],
        // bottom, top, left, right, back, front
        SlopeKind::Side => [2, 2, 1, 1, 0, 2],
        SlopeKind::Corner => [1, 1, 1, 0, 0, 1],
        SlopeKind::InvCorner => [2, 2, 2, 1, 1, 2],
    }
}
