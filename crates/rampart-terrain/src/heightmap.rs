//! Noise-based heightmap terrain: the default [`VoxelSource`].
//!
//! Fills padded volumes directly from world-space noise, so a chunk's
//! padding shell holds exactly what its neighbor will generate for the same
//! world cells — seams are correct at generation time. Layering is stone
//! below, a dirt band, grass at the surface, ore pockets in the stone, and
//! lava below a fixed floor depth. One-voxel grass steps become Side slopes
//! so hillsides mesh as ramps instead of stairs.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use rampart_voxel::{
    BlockId, BlockRegistry, CHUNK_SIZE, CSP, ChunkCoord, ChunkVoxels, PackedVoxel, SlopeKind,
    padded_index,
};

use crate::source::VoxelSource;

/// Tuning for the heightmap terrain.
#[derive(Clone, Copy, Debug)]
pub struct HeightmapParams {
    /// World seed; the same seed always generates the same world.
    pub seed: u32,
    /// fBm octave count for the surface heightfield.
    pub octaves: usize,
    /// Horizontal frequency applied to world coordinates.
    pub frequency: f64,
    /// Half-range of terrain height around `ground_level`.
    pub amplitude: f64,
    /// World height the terrain undulates around.
    pub ground_level: i32,
    /// Stone starts this many voxels below the surface.
    pub dirt_depth: i32,
    /// World height below which solid ground is lava instead of stone.
    pub lava_depth: i32,
    /// Frequency of the 3-D ore noise.
    pub ore_frequency: f64,
    /// Ore noise threshold; higher means rarer pockets.
    pub ore_threshold: f64,
    /// Turn one-voxel grass steps into Side slopes.
    pub carve_slopes: bool,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 4,
            frequency: 0.015,
            amplitude: 18.0,
            ground_level: 12,
            dirt_depth: 4,
            lava_depth: -24,
            ore_frequency: 0.11,
            ore_threshold: 0.62,
            carve_slopes: true,
        }
    }
}

/// The block ids the generator writes, resolved from a registry once.
#[derive(Clone, Copy, Debug)]
pub struct TerrainPalette {
    pub stone: BlockId,
    pub dirt: BlockId,
    pub grass: BlockId,
    pub gold_ore: Option<BlockId>,
    pub lava: Option<BlockId>,
}

impl TerrainPalette {
    /// Resolves the palette by name; stone, dirt, and grass are required.
    pub fn from_registry(registry: &BlockRegistry) -> Option<Self> {
        Some(Self {
            stone: registry.lookup("stone")?,
            dirt: registry.lookup("dirt")?,
            grass: registry.lookup("grass")?,
            gold_ore: registry.gold_ore(),
            lava: registry.lava(),
        })
    }
}

/// Seeded heightmap terrain generator.
pub struct HeightmapSource {
    params: HeightmapParams,
    palette: TerrainPalette,
    surface: Fbm<Perlin>,
    ore: Perlin,
}

impl HeightmapSource {
    /// Creates a generator for the given tuning and block palette.
    pub fn new(params: HeightmapParams, palette: TerrainPalette) -> Self {
        Self {
            surface: Fbm::<Perlin>::new(params.seed).set_octaves(params.octaves),
            ore: Perlin::new(params.seed.wrapping_add(1)),
            params,
            palette,
        }
    }

    /// Terrain height at a world column; ground is solid for `wy < height`.
    fn surface_height(&self, wx: i64, wz: i64) -> i32 {
        let sample = self.surface.get([
            wx as f64 * self.params.frequency,
            wz as f64 * self.params.frequency,
        ]);
        self.params.ground_level + (sample * self.params.amplitude).floor() as i32
    }

    fn is_ore_pocket(&self, wx: i64, wy: i64, wz: i64) -> bool {
        let f = self.params.ore_frequency;
        self.ore
            .get([wx as f64 * f, wy as f64 * f, wz as f64 * f])
            > self.params.ore_threshold
    }

    /// Slope rotation facing a one-voxel drop, or `None` when the step
    /// pattern is not a clean single-direction ramp.
    ///
    /// Quarter-turn mapping: the unrotated Side slope descends toward −Z;
    /// successive turns face −X, +Z, +X.
    fn step_rotation(&self, wx: i64, wz: i64, height: i32) -> Option<u8> {
        let drops = [
            (self.surface_height(wx, wz - 1), 0u8), // −Z
            (self.surface_height(wx - 1, wz), 1),   // −X
            (self.surface_height(wx, wz + 1), 2),   // +Z
            (self.surface_height(wx + 1, wz), 3),   // +X
        ];
        let mut rotation = None;
        for (neighbor_height, turns) in drops {
            if neighbor_height == height - 1 {
                if rotation.is_some() {
                    return None; // two-sided step, keep the cube
                }
                rotation = Some(turns);
            } else if neighbor_height < height - 1 {
                return None; // cliff, a single ramp can't span it
            }
        }
        rotation
    }
}

impl VoxelSource for HeightmapSource {
    fn generate(&self, coord: ChunkCoord) -> ChunkVoxels {
        let mut voxels = ChunkVoxels::new_empty();
        let base_x = i64::from(coord.x) * CHUNK_SIZE as i64 - 1;
        let base_y = i64::from(coord.y) * CHUNK_SIZE as i64 - 1;
        let base_z = i64::from(coord.z) * CHUNK_SIZE as i64 - 1;

        for px in 0..CSP {
            let wx = base_x + px as i64;
            for pz in 0..CSP {
                let wz = base_z + pz as i64;
                let height = self.surface_height(wx, wz);

                for py in 0..CSP {
                    let wy = base_y + py as i64;
                    if wy >= i64::from(height) {
                        continue;
                    }

                    let voxel = if let (true, Some(lava)) =
                        (wy < i64::from(self.params.lava_depth), self.palette.lava)
                    {
                        PackedVoxel::EMPTY.with_block_id(lava)
                    } else if wy < i64::from(height - self.params.dirt_depth) {
                        let id = match self.palette.gold_ore {
                            Some(ore) if self.is_ore_pocket(wx, wy, wz) => ore,
                            _ => self.palette.stone,
                        };
                        PackedVoxel::EMPTY.with_block_id(id)
                    } else if wy < i64::from(height) - 1 {
                        PackedVoxel::EMPTY.with_block_id(self.palette.dirt)
                    } else {
                        let grass = PackedVoxel::EMPTY.with_block_id(self.palette.grass);
                        match self
                            .params
                            .carve_slopes
                            .then(|| self.step_rotation(wx, wz, height))
                            .flatten()
                        {
                            Some(turns) => grass.with_slope(SlopeKind::Side, turns, false),
                            None => grass,
                        }
                    };
                    voxels.set(padded_index(px, py, pz), voxel);
                }
            }
        }
        voxels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rampart_voxel::{BlockDef, BlockSpecies, CSP3, FaceTextures};

    use super::*;

    fn registry() -> BlockRegistry {
        let named = |name: &str, species| BlockDef {
            name: name.to_string(),
            species,
            textures: FaceTextures::Uniform(format!("{name}.png")),
        };
        BlockRegistry::build(vec![
            BlockDef::air(),
            named("stone", BlockSpecies::Stone),
            named("dirt", BlockSpecies::Dirt),
            named("grass", BlockSpecies::Grass),
            named("gold_ore", BlockSpecies::GoldOre),
            named("lava", BlockSpecies::Lava),
        ])
        .expect("fixture registry")
    }

    fn source(seed: u32) -> HeightmapSource {
        let reg = registry();
        let palette = TerrainPalette::from_registry(&reg).expect("palette resolves");
        HeightmapSource::new(
            HeightmapParams {
                seed,
                ..Default::default()
            },
            palette,
        )
    }

    #[test]
    fn test_same_seed_generates_identical_chunks() {
        let a = source(42).generate(ChunkCoord::new(3, 0, -2));
        let b = source(42).generate(ChunkCoord::new(3, 0, -2));
        assert_eq!(a.raw(), b.raw());
    }

    #[test]
    fn test_different_seeds_generate_different_chunks() {
        let a = source(1).generate(ChunkCoord::new(0, 0, 0));
        let b = source(2).generate(ChunkCoord::new(0, 0, 0));
        assert_ne!(a.raw(), b.raw());
    }

    #[test]
    fn test_padding_matches_neighbor_interior() {
        // The +X padding shell of one chunk covers the same world cells as
        // the first interior plane of the next chunk over.
        let src = source(7);
        let left = src.generate(ChunkCoord::new(0, 0, 0));
        let right = src.generate(ChunkCoord::new(1, 0, 0));

        for py in 0..CSP {
            for pz in 0..CSP {
                assert_eq!(
                    left.get_at(CSP - 1, py, pz),
                    right.get_at(1, py, pz),
                    "seam mismatch at padded y={py} z={pz}"
                );
            }
        }
    }

    #[test]
    fn test_column_layering_grass_over_dirt_over_stone() {
        let reg = registry();
        let palette = TerrainPalette::from_registry(&reg).expect("palette resolves");
        let src = source(11);
        let chunk = src.generate(ChunkCoord::new(0, 0, 0));

        let mut found_column = false;
        'search: for px in 1..=CHUNK_SIZE {
            for pz in 1..=CHUNK_SIZE {
                // Find a column whose surface lies inside this chunk.
                for py in (1..=CHUNK_SIZE).rev() {
                    let v = chunk.get_at(px, py, pz);
                    if v.is_empty() {
                        continue;
                    }
                    if v.block_id() != palette.grass {
                        continue 'search;
                    }
                    if py >= 3 {
                        assert_eq!(chunk.get_at(px, py - 1, pz).block_id(), palette.dirt);
                    }
                    found_column = true;
                    break 'search;
                }
            }
        }
        assert!(found_column, "expected at least one surface column in the chunk");
    }

    #[test]
    fn test_slopes_only_on_grass_and_only_side_kind() {
        let reg = registry();
        let palette = TerrainPalette::from_registry(&reg).expect("palette resolves");
        let src = source(5);

        let mut sloped = 0usize;
        for cx in -2..=2 {
            for cz in -2..=2 {
                let chunk = src.generate(ChunkCoord::new(cx, 0, cz));
                for index in 0..CSP3 {
                    let v = chunk.get(index);
                    if v.is_sloped() {
                        sloped += 1;
                        assert_eq!(v.slope_kind(), SlopeKind::Side);
                        assert_eq!(v.block_id(), palette.grass);
                        assert!(!v.slope_flip());
                    }
                }
            }
        }
        assert!(sloped > 0, "rolling terrain should produce some ramps");
    }
}
