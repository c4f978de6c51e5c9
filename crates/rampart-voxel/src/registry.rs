//! Block type registry: maps compact [`BlockId`] values to species, fragility,
//! and baked texture-array layers.
//!
//! The registry is built once at engine startup from declarative
//! [`BlockDef`]s. Block 0 must be the empty/air type — every bit-packing
//! assumption downstream depends on id 0 meaning "no block", so a registry
//! that violates this refuses to build.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::packed::{BLOCK_BREAK_DAMAGE_THRESHOLD, PackedVoxel};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compact block identifier stored in the low 16 bits of every voxel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The empty/air block.
    pub const EMPTY: BlockId = BlockId(0);
}

/// Behavioral grouping for a block type.
///
/// A block's species determines its resistance to damage (fragility) and is
/// the grouping key for LOD block bucketing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockSpecies {
    Air,
    Lava,
    Stone,
    Porcelain,
    Dirt,
    Grass,
    Gravel,
    Wood,
    Leaves,
    Brick,
    GoldOre,
}

impl BlockSpecies {
    /// How easily blocks of this species take damage.
    ///
    /// Incoming damage is scaled by this factor before being stored; 0 means
    /// invincible.
    pub fn fragility(self) -> f32 {
        match self {
            Self::Air => 0.0,
            Self::Lava => 0.0,
            Self::Stone => 0.25,
            Self::Porcelain => 0.8,
            Self::Dirt => 1.2,
            Self::Grass => 1.3,
            Self::Gravel => 1.0,
            Self::Wood => 0.6,
            Self::Leaves => 31.0,
            Self::Brick => 0.4,
            Self::GoldOre => 0.5,
        }
    }
}

/// The kind of damage applied to a block, stored as a flag bit so multiple
/// kinds can accumulate on one voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageType {
    Physical,
    Fire,
    Acid,
}

impl DamageType {
    /// The bit this damage type occupies inside the 3-bit type-flag field.
    pub fn flag(self) -> u8 {
        match self {
            Self::Physical => 0b001,
            Self::Fire => 0b010,
            Self::Acid => 0b100,
        }
    }
}

/// Declarative texture assignment for a block's six faces.
///
/// Face order is fixed: bottom, top, left, right, back, front
/// (−Y, +Y, −X, +X, −Z, +Z).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum FaceTextures {
    /// One texture on all six faces.
    Uniform(String),
    /// Distinct bottom and top; `mid` fills the four side faces.
    Capped {
        bottom: String,
        top: String,
        mid: String,
    },
    /// All six faces listed explicitly in face order.
    PerFace([String; 6]),
}

impl FaceTextures {
    /// Expands the declaration into six per-face texture names.
    fn expand(&self) -> [&str; 6] {
        match self {
            Self::Uniform(t) => [t; 6].map(|s| s.as_str()),
            Self::Capped { bottom, top, mid } => [bottom, top, mid, mid, mid, mid].map(String::as_str),
            Self::PerFace(faces) => {
                [&faces[0], &faces[1], &faces[2], &faces[3], &faces[4], &faces[5]]
                    .map(String::as_str)
            }
        }
    }
}

/// Declarative input to [`BlockRegistry::build`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockDef {
    /// Unique human-readable key (e.g. "stone", "gold_ore").
    pub name: String,
    /// Behavioral grouping.
    pub species: BlockSpecies,
    /// Texture declaration, resolved to texture-array layers at build time.
    pub textures: FaceTextures,
}

impl BlockDef {
    /// The canonical air definition that must sit at index 0.
    pub fn air() -> Self {
        Self {
            name: "air".to_string(),
            species: BlockSpecies::Air,
            textures: FaceTextures::Uniform(String::new()),
        }
    }
}

/// A fully resolved registry entry.
#[derive(Clone, Debug)]
pub struct BlockType {
    /// Unique name, as declared.
    pub name: String,
    /// Behavioral grouping.
    pub species: BlockSpecies,
    /// Per-face indices into the shared texture array, baked once at build.
    pub texture_layers: [u16; 6],
}

/// Errors that can occur while building the registry.
///
/// All of these are fatal misconfigurations: the engine must refuse to start
/// rather than mesh with a broken block table.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Index 0 was not the empty/air block.
    #[error("block 0 must be the empty/air block, got {0:?}")]
    EmptyBlockNotFirst(String),
    /// Two definitions share one name.
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    /// More block types than a 16-bit id can address.
    #[error("block registry is full (max 65536 types)")]
    RegistryFull,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable catalog of block types, built once and shared read-only by the
/// meshing and scheduling threads.
///
/// Constructed explicitly and passed by reference (no process-wide
/// singleton), so tests can run against fixture registries.
pub struct BlockRegistry {
    /// Dense array where `index == BlockId.0`.
    types: Vec<BlockType>,
    /// Reverse lookup: name → id.
    name_to_id: FxHashMap<String, BlockId>,
    /// Number of distinct texture layers referenced by all blocks.
    texture_layer_count: u16,
    lava: Option<BlockId>,
    grass: Option<BlockId>,
    gold_ore: Option<BlockId>,
    lod_grass: Option<BlockId>,
    lod_stone: Option<BlockId>,
    lod_dirt: Option<BlockId>,
    lod_leaves: Option<BlockId>,
}

impl BlockRegistry {
    /// Builds the registry, baking each block's texture names into shared
    /// texture-array layer indices.
    ///
    /// Layers are assigned to distinct texture names in declaration order, so
    /// the resulting indices are stable for a given block table.
    ///
    /// # Errors
    ///
    /// [`RegistryError::EmptyBlockNotFirst`] if `defs[0]` is missing or not
    /// an [`BlockSpecies::Air`] block, [`RegistryError::DuplicateName`] on a
    /// name collision, [`RegistryError::RegistryFull`] past 65 536 entries.
    pub fn build(defs: Vec<BlockDef>) -> Result<Self, RegistryError> {
        match defs.first() {
            Some(first) if first.species == BlockSpecies::Air => {}
            Some(first) => return Err(RegistryError::EmptyBlockNotFirst(first.name.clone())),
            None => return Err(RegistryError::EmptyBlockNotFirst("<empty table>".into())),
        }
        if defs.len() > usize::from(u16::MAX) + 1 {
            return Err(RegistryError::RegistryFull);
        }

        let mut layer_lookup: FxHashMap<String, u16> = FxHashMap::default();
        let mut name_to_id: FxHashMap<String, BlockId> = FxHashMap::default();
        let mut types = Vec::with_capacity(defs.len());

        for (index, def) in defs.into_iter().enumerate() {
            if name_to_id.contains_key(&def.name) {
                return Err(RegistryError::DuplicateName(def.name));
            }

            let mut layers = [0u16; 6];
            for (face, tex) in def.textures.expand().into_iter().enumerate() {
                if tex.is_empty() {
                    continue; // air has no textures; layer 0 is never sampled for it
                }
                let next = layer_lookup.len() as u16;
                layers[face] = *layer_lookup.entry(tex.to_string()).or_insert(next);
            }

            name_to_id.insert(def.name.clone(), BlockId(index as u16));
            types.push(BlockType {
                name: def.name,
                species: def.species,
                texture_layers: layers,
            });
        }

        let find = |name: &str| name_to_id.get(name).copied();
        let registry = Self {
            texture_layer_count: layer_lookup.len() as u16,
            lava: find("lava"),
            grass: find("grass"),
            gold_ore: find("gold_ore"),
            lod_grass: find("lod_grass"),
            lod_stone: find("lod_stone"),
            lod_dirt: find("lod_dirt"),
            lod_leaves: find("lod_leaves"),
            types,
            name_to_id,
        };
        tracing::info!(
            blocks = registry.types.len(),
            texture_layers = registry.texture_layer_count,
            "block registry built"
        );
        Ok(registry)
    }

    /// Returns the resolved entry for an id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range — ids are only produced by this
    /// registry, so an unknown id is a programming error.
    pub fn get(&self, id: BlockId) -> &BlockType {
        &self.types[usize::from(id.0)]
    }

    /// Returns the id for a block name, or `None` if unknown.
    pub fn lookup(&self, name: &str) -> Option<BlockId> {
        self.name_to_id.get(name).copied()
    }

    /// Returns the species for an id.
    pub fn species(&self, id: BlockId) -> BlockSpecies {
        self.get(id).species
    }

    /// Returns the fragility constant for an id's species.
    pub fn fragility(&self, id: BlockId) -> f32 {
        self.species(id).fragility()
    }

    /// Returns the six baked texture-array layers for an id.
    pub fn texture_layers(&self, id: BlockId) -> [u16; 6] {
        self.get(id).texture_layers
    }

    /// Number of distinct texture layers the block table references.
    pub fn texture_layer_count(&self) -> u16 {
        self.texture_layer_count
    }

    /// Total number of registered types (including air).
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if only air is registered.
    pub fn is_empty(&self) -> bool {
        self.types.len() <= 1
    }

    /// The lava block id, if the table declares one.
    pub fn lava(&self) -> Option<BlockId> {
        self.lava
    }

    /// The grass block id, if the table declares one.
    pub fn grass(&self) -> Option<BlockId> {
        self.grass
    }

    /// The gold-ore block id, if the table declares one.
    pub fn gold_ore(&self) -> Option<BlockId> {
        self.gold_ore
    }

    /// The LOD stand-in a species coarsens to at distance.
    ///
    /// Falls back to the LOD grass stand-in for species without a dedicated
    /// stand-in, and to the block's own id when the table declares none.
    pub fn lod_stand_in(&self, id: BlockId) -> BlockId {
        let stand_in = match self.species(id) {
            BlockSpecies::Dirt => self.lod_dirt,
            BlockSpecies::Stone => self.lod_stone,
            BlockSpecies::Leaves => self.lod_leaves,
            _ => self.lod_grass,
        };
        stand_in.or(self.lod_grass).unwrap_or(id)
    }

    /// The coarsest LOD stand-in (used when whole chunks collapse to one type).
    pub fn lod_grass(&self) -> Option<BlockId> {
        self.lod_grass
    }

    /// Applies damage to a voxel, scaled by its block's fragility.
    ///
    /// The scaled amount saturates at [`BLOCK_BREAK_DAMAGE_THRESHOLD`] and the
    /// damage type's flag bit is accumulated. Fragility 0 (invincible) leaves
    /// the voxel unchanged. Air is never damaged.
    pub fn apply_damage(&self, voxel: PackedVoxel, kind: DamageType, raw_amount: f32) -> PackedVoxel {
        if voxel.is_empty() {
            return voxel;
        }
        let fragility = self.fragility(voxel.block_id());
        if fragility == 0.0 {
            return voxel;
        }
        let scaled = (raw_amount * fragility).round().max(0.0) as u32;
        let amount = (u32::from(voxel.damage_amount()) + scaled)
            .min(u32::from(BLOCK_BREAK_DAMAGE_THRESHOLD)) as u8;
        let flags = voxel.damage_type_flags() | kind.flag();
        voxel.with_damage(flags, amount)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
