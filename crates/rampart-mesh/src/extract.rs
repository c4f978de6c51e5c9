//! Face extraction over the padded chunk volume.
//!
//! One pass over the 32³ snapshot builds three axis-aligned bit planes
//! (solid occupancy per padded column), then a shift-and-mask step turns
//! them into the six face masks, and a trailing-zero walk files every face
//! bit into per-(block info, layer) binary planes ready for greedy merging.

use rustc_hash::FxHashMap;

use rampart_voxel::{CHUNK_SIZE, CSP, CSP2, ChunkVoxels, PackedVoxel, padded_index};

use crate::greedy::BitPlane;

/// Binary planes for one face direction, grouped by exact packed block info
/// and by layer along the face's axis.
///
/// Grouping by the full packed word is what keeps differing damage levels or
/// slope flags from merging into one greedy run.
pub type FacePlanes = FxHashMap<PackedVoxel, FxHashMap<usize, BitPlane>>;

/// Output of the extraction pass.
pub struct ExtractedFaces {
    /// Face planes indexed by [`crate::face_dir::FaceDir`] order.
    pub planes: [FacePlanes; 6],
    /// Sloped voxels found strictly inside the unpadded region, in scan
    /// order, keyed by padded linear index. Slopes never enter the binary
    /// planes; they are meshed individually.
    pub slopes: Vec<(usize, PackedVoxel)>,
}

/// Runs the extraction pass over a padded snapshot.
///
/// The snapshot is canonicalized in place (empty cells forced to the all-zero
/// word, guarding against the sloped-air artifact on stale padding).
/// `coarsen` is applied to each face's owning block info just before
/// grouping; the identity function yields the exact full-detail grouping.
pub fn extract_faces(
    voxels: &mut ChunkVoxels,
    coarsen: impl Fn(PackedVoxel) -> PackedVoxel,
) -> ExtractedFaces {
    let mut axis_cols = vec![0u32; CSP2 * 3];
    let mut slopes = Vec::new();

    for x in 0..CSP {
        for y in 0..CSP {
            for z in 0..CSP {
                let idx = padded_index(x, y, z);
                let info = voxels.get(idx).canonicalized();
                voxels.set(idx, info);

                if info.is_sloped() {
                    // Padding-shell slopes belong to the neighbor chunk; adding
                    // them here would duplicate geometry in world space.
                    let interior = (1..=CHUNK_SIZE).contains(&x)
                        && (1..=CHUNK_SIZE).contains(&y)
                        && (1..=CHUNK_SIZE).contains(&z);
                    if interior {
                        slopes.push((idx, info));
                    }
                    continue;
                }

                if !info.is_empty() {
                    axis_cols[x + z * CSP] |= 1 << y;
                    axis_cols[z + y * CSP + CSP2] |= 1 << x;
                    axis_cols[x + y * CSP + CSP2 * 2] |= 1 << z;
                }
            }
        }
    }

    // Solid-to-air transitions along each column give the two face masks per
    // axis: descending (−axis faces) and ascending (+axis faces).
    let mut face_masks = vec![0u32; CSP2 * 6];
    for axis in 0..3 {
        for i in 0..CSP2 {
            let col = axis_cols[axis * CSP2 + i];
            face_masks[CSP2 * (axis * 2) + i] = col & !(col << 1);
            face_masks[CSP2 * (axis * 2 + 1) + i] = col & !(col >> 1);
        }
    }

    let mut planes: [FacePlanes; 6] = Default::default();
    for (face, face_planes) in planes.iter_mut().enumerate() {
        for j in 0..CHUNK_SIZE {
            for i in 0..CHUNK_SIZE {
                // Skip the first padded row/column, then strip the padding
                // bits off both column ends.
                let col_idx = (i + 1) + (j + 1) * CSP;
                let mut col = face_masks[face * CSP2 + col_idx] >> 1;
                col &= !(1u32 << CHUNK_SIZE);

                while col != 0 {
                    let k = col.trailing_zeros() as usize;
                    col &= col - 1;

                    let (vx, vy, vz) = match face {
                        0 | 1 => (i, k, j), // bottom/top: xz plane, layer y
                        2 | 3 => (k, j, i), // left/right: zy plane, layer x
                        _ => (i, j, k),     // back/front: xy plane, layer z
                    };
                    let info = coarsen(voxels.get_at(vx + 1, vy + 1, vz + 1));

                    let rows = face_planes
                        .entry(info)
                        .or_default()
                        .entry(k)
                        .or_insert([0u32; CHUNK_SIZE]);
                    rows[j] |= 1 << i;
                }
            }
        }
    }

    ExtractedFaces { planes, slopes }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rampart_voxel::{BlockId, SlopeKind};

    use super::*;

    fn stone() -> PackedVoxel {
        PackedVoxel::EMPTY.with_block_id(BlockId(1))
    }

    fn face_bit_count(extracted: &ExtractedFaces, face: usize) -> u32 {
        extracted.planes[face]
            .values()
            .flat_map(|layers| layers.values())
            .flat_map(|rows| rows.iter())
            .map(|row| row.count_ones())
            .sum()
    }

    #[test]
    fn test_isolated_voxel_extracts_six_unit_faces() {
        let mut voxels = ChunkVoxels::new_empty();
        voxels.set_interior(5, 5, 5, stone());

        let extracted = extract_faces(&mut voxels, |v| v);
        for face in 0..6 {
            assert_eq!(face_bit_count(&extracted, face), 1, "face {face}");
            let layers = extracted.planes[face].get(&stone()).expect("stone plane");
            assert_eq!(layers.len(), 1, "face {face} has one layer");
            assert!(layers.contains_key(&5), "face {face} layer is 5");
        }
        assert!(extracted.slopes.is_empty());
    }

    #[test]
    fn test_fully_occluded_volume_extracts_nothing() {
        // Every cell solid, padding included: no air-to-solid transition
        // survives the padding strip.
        let mut voxels = ChunkVoxels::new_filled(stone());
        let extracted = extract_faces(&mut voxels, |v| v);
        for face in 0..6 {
            assert_eq!(face_bit_count(&extracted, face), 0, "face {face}");
        }
    }

    #[test]
    fn test_unpadded_full_chunk_exposes_boundary_faces() {
        // Solid interior with air padding: each of the six boundary planes
        // is exposed, 30×30 bits apiece.
        let mut voxels = ChunkVoxels::new_empty();
        for y in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    voxels.set_interior(x, y, z, stone());
                }
            }
        }
        let extracted = extract_faces(&mut voxels, |v| v);
        for face in 0..6 {
            assert_eq!(
                face_bit_count(&extracted, face),
                (CHUNK_SIZE * CHUNK_SIZE) as u32,
                "face {face}"
            );
        }
    }

    #[test]
    fn test_interior_slopes_collected_padded_slopes_dropped() {
        let mut voxels = ChunkVoxels::new_empty();
        let ramp = stone().with_slope(SlopeKind::Side, 1, false);
        voxels.set_interior(3, 3, 3, ramp);
        voxels.set_at(0, 10, 10, ramp); // padding shell

        let extracted = extract_faces(&mut voxels, |v| v);
        assert_eq!(extracted.slopes.len(), 1);
        assert_eq!(extracted.slopes[0].0, padded_index(4, 4, 4));
        assert_eq!(extracted.slopes[0].1, ramp);
    }

    #[test]
    fn test_sloped_voxels_do_not_occlude_neighbors() {
        // A cube next to a ramp still draws the shared face: slopes never
        // enter the occupancy planes.
        let mut voxels = ChunkVoxels::new_empty();
        voxels.set_interior(5, 5, 5, stone());
        voxels.set_interior(6, 5, 5, stone().with_slope(SlopeKind::Side, 0, false));

        let extracted = extract_faces(&mut voxels, |v| v);
        // +X face of the cube at x=5 must still be present.
        let layers = extracted.planes[3].get(&stone()).expect("stone plane");
        let rows = layers.get(&5).expect("layer x=5");
        assert_eq!(rows[5] & (1 << 5), 1 << 5, "face against the ramp survives");
    }

    #[test]
    fn test_sloped_air_padding_is_canonicalized() {
        // Stale slope bits on an empty cell must not produce geometry.
        let mut voxels = ChunkVoxels::new_empty();
        let dirty_air = PackedVoxel::EMPTY.with_slope(SlopeKind::Corner, 2, true);
        voxels.set_at(0, 4, 4, dirty_air);
        voxels.set_interior(2, 2, 2, dirty_air); // interior dirty air too

        let extracted = extract_faces(&mut voxels, |v| v);
        assert!(extracted.slopes.is_empty(), "air never slopes");
        for face in 0..6 {
            assert_eq!(face_bit_count(&extracted, face), 0, "face {face}");
        }
        assert_eq!(voxels.get_at(0, 4, 4), PackedVoxel::EMPTY);
    }

    #[test]
    fn test_coarsen_changes_grouping_key() {
        let mut voxels = ChunkVoxels::new_empty();
        let worn = stone().with_damage(0b001, 9);
        let fresh = stone();
        voxels.set_interior(0, 0, 0, worn);
        voxels.set_interior(1, 0, 0, fresh);

        // Exact grouping keeps the two words apart.
        let exact = extract_faces(&mut voxels.clone(), |v| v);
        assert_eq!(exact.planes[1].len(), 2, "damage splits the group");

        // Coarsening to the bare id merges them.
        let merged = extract_faces(&mut voxels, |v| {
            PackedVoxel::EMPTY.with_block_id(v.block_id())
        });
        assert_eq!(merged.planes[1].len(), 1, "bare-id grouping merges");
    }
}
