//! Level-of-detail coarsening of packed block info before face grouping.
//!
//! Faces only merge into one greedy quad when their packed words are
//! identical, so distant chunks deliberately coarsen the word before
//! grouping: fewer distinct keys, bigger merges, fewer triangles. Fidelity
//! is traded away exactly as far as each tier states and no further.

use rampart_voxel::{BlockRegistry, PackedVoxel};

/// Detail tier for a distant chunk's mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LodLevel {
    /// Nearest tier: damage amounts are zeroed (damage type flags kept) so
    /// blocks differing only by wear still merge.
    #[default]
    None,
    /// Grouping by bare block id; damage and slope bits dropped.
    Half,
    /// Same grouping as [`LodLevel::Half`]; kept distinct for callers that
    /// step detail with distance.
    Quarter,
    /// Grouping by bare block id.
    Eighth,
    /// Coarsest: every solid block becomes the LOD grass stand-in.
    Sixteenth,
}

/// Coarsens one voxel's packed word for grouping at the given tier.
///
/// With `bucket_species` set, tiers short of [`LodLevel::Sixteenth`] also
/// rewrite the block id to its species' LOD stand-in (dirt/stone/leaves get
/// their own; everything else becomes LOD grass), which collapses whole
/// hillsides into single-key planes.
pub fn coarsen_for_grouping(
    voxel: PackedVoxel,
    level: LodLevel,
    bucket_species: bool,
    registry: &BlockRegistry,
) -> PackedVoxel {
    let mut info = match level {
        LodLevel::None => {
            if voxel.is_damaged() {
                voxel.with_damage(voxel.damage_type_flags(), 0)
            } else {
                voxel
            }
        }
        LodLevel::Half | LodLevel::Eighth => PackedVoxel::EMPTY.with_block_id(voxel.block_id()),
        LodLevel::Quarter => voxel,
        LodLevel::Sixteenth => {
            let stand_in = registry.lod_grass().unwrap_or(voxel.block_id());
            PackedVoxel::EMPTY.with_block_id(stand_in)
        }
    };

    if bucket_species && level != LodLevel::Sixteenth {
        info = PackedVoxel::EMPTY.with_block_id(registry.lod_stand_in(info.block_id()));
    }
    info
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rampart_voxel::{BlockDef, BlockId, BlockSpecies, FaceTextures, SlopeKind};

    use super::*;

    fn named(name: &str, species: BlockSpecies) -> BlockDef {
        BlockDef {
            name: name.to_string(),
            species,
            textures: FaceTextures::Uniform(format!("{name}.png")),
        }
    }

    fn registry() -> BlockRegistry {
        BlockRegistry::build(vec![
            BlockDef::air(),
            named("stone", BlockSpecies::Stone),
            named("dirt", BlockSpecies::Dirt),
            named("lod_grass", BlockSpecies::Grass),
            named("lod_stone", BlockSpecies::Stone),
            named("lod_dirt", BlockSpecies::Dirt),
            named("lod_leaves", BlockSpecies::Leaves),
        ])
        .expect("fixture registry")
    }

    #[test]
    fn test_none_zeroes_damage_amount_keeps_flags() {
        let reg = registry();
        let worn = PackedVoxel::EMPTY
            .with_block_id(BlockId(1))
            .with_damage(0b011, 17);
        let coarse = coarsen_for_grouping(worn, LodLevel::None, false, &reg);
        assert_eq!(coarse.damage_amount(), 0);
        assert_eq!(coarse.damage_type_flags(), 0b011);
        assert_eq!(coarse.block_id(), BlockId(1));
    }

    #[test]
    fn test_none_leaves_undamaged_word_alone() {
        let reg = registry();
        let sloped = PackedVoxel::EMPTY
            .with_block_id(BlockId(1))
            .with_slope(SlopeKind::Side, 2, false);
        assert_eq!(
            coarsen_for_grouping(sloped, LodLevel::None, false, &reg),
            sloped
        );
    }

    #[test]
    fn test_half_strips_to_bare_id() {
        let reg = registry();
        let worn = PackedVoxel::EMPTY
            .with_block_id(BlockId(2))
            .with_damage(0b111, 31)
            .with_slope(SlopeKind::Corner, 1, true);
        let coarse = coarsen_for_grouping(worn, LodLevel::Half, false, &reg);
        assert_eq!(coarse, PackedVoxel::EMPTY.with_block_id(BlockId(2)));
    }

    #[test]
    fn test_sixteenth_rewrites_to_lod_grass() {
        let reg = registry();
        let stone = PackedVoxel::EMPTY.with_block_id(BlockId(1));
        let coarse = coarsen_for_grouping(stone, LodLevel::Sixteenth, false, &reg);
        assert_eq!(
            coarse.block_id(),
            reg.lod_grass().expect("fixture declares lod_grass")
        );
    }

    #[test]
    fn test_species_bucketing_maps_to_stand_ins() {
        let reg = registry();
        let stone = PackedVoxel::EMPTY.with_block_id(reg.lookup("stone").expect("stone"));
        let dirt = PackedVoxel::EMPTY.with_block_id(reg.lookup("dirt").expect("dirt"));

        let stone_lod = coarsen_for_grouping(stone, LodLevel::Half, true, &reg);
        let dirt_lod = coarsen_for_grouping(dirt, LodLevel::Half, true, &reg);
        assert_eq!(stone_lod.block_id(), reg.lookup("lod_stone").expect("lod_stone"));
        assert_eq!(dirt_lod.block_id(), reg.lookup("lod_dirt").expect("lod_dirt"));
    }
}
