//! Bit-packed per-voxel state: block id, damage, and slope shape in one `u32`.
//!
//! Layout (low to high):
//! - bits 0..=15 — block id, 0 = empty/air
//! - bits 16..=23 — damage byte: 5-bit amount + 3 type flag bits
//! - bits 24..=31 — slope byte: 2-bit kind, 2-bit rotation, 1 flip bit
//!
//! Every operation is total and allocation-free, and each write touches only
//! its own field (mask-and-or read-modify-write), so packing one field never
//! disturbs another.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::registry::BlockId;

/// Bit offset of the damage byte inside the packed word.
pub const DAMAGE_BITS_OFFSET: u32 = 16;

/// Bit offset of the slope byte inside the packed word.
pub const SLOPE_BITS_OFFSET: u32 = 24;

/// Damage amount at which a block counts as destroyed (5 bits maxed out).
pub const BLOCK_BREAK_DAMAGE_THRESHOLD: u8 = 31;

/// The shape a sloped voxel takes instead of a full cube.
///
/// Stored in the low 2 bits of the slope byte. `None` is a plain cube and the
/// only kind that participates in greedy meshing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SlopeKind {
    /// Full cube, no slope geometry.
    #[default]
    None = 0,
    /// Simple ramp: the top face slants down and the back face is omitted.
    Side = 1,
    /// Ramp with one top corner pulled down; several faces collapse to one triangle.
    Corner = 2,
    /// Inverted corner: mostly a cube with an extra slanted triangle on top.
    InvCorner = 3,
}

impl SlopeKind {
    /// Decodes a kind from the low 2 bits of a slope byte.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            1 => Self::Side,
            2 => Self::Corner,
            3 => Self::InvCorner,
            _ => Self::None,
        }
    }
}

/// One voxel's complete packed state.
///
/// A zeroed word is the canonical empty voxel. Callers must keep the
/// invariant that an empty voxel (block id 0) carries no damage or slope
/// bits; [`PackedVoxel::canonicalized`] enforces it where untrusted data
/// enters the mesher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedVoxel(pub u32);

impl PackedVoxel {
    /// The canonical empty voxel (air, no damage, no slope).
    pub const EMPTY: PackedVoxel = PackedVoxel(0);

    /// Packs every field into a fresh voxel.
    pub fn pack(
        id: BlockId,
        damage_flags: u8,
        damage_amount: u8,
        kind: SlopeKind,
        quarter_turns: u8,
        flip: bool,
    ) -> Self {
        Self(u32::from(id.0))
            .with_damage(damage_flags, damage_amount)
            .with_slope(kind, quarter_turns, flip)
    }

    /// Returns the block id stored in the low 16 bits.
    pub fn block_id(self) -> BlockId {
        BlockId((self.0 & 0xffff) as u16)
    }

    /// Replaces the block id, leaving damage and slope bits untouched.
    pub fn with_block_id(self, id: BlockId) -> Self {
        Self((self.0 & !0xffff) | u32::from(id.0))
    }

    /// Returns the raw damage byte (type flags and amount together).
    pub fn damage_byte(self) -> u8 {
        ((self.0 >> DAMAGE_BITS_OFFSET) & 0xff) as u8
    }

    /// Returns the 5-bit damage amount (0–31).
    pub fn damage_amount(self) -> u8 {
        self.damage_byte() & 0x1f
    }

    /// Returns the 3 damage type flag bits (physical/fire/acid).
    pub fn damage_type_flags(self) -> u8 {
        self.damage_byte() >> 5
    }

    /// Replaces the damage byte, leaving block id and slope bits untouched.
    pub fn with_damage(self, type_flags: u8, amount: u8) -> Self {
        let byte = u32::from(pack_damage_byte(type_flags, amount));
        Self((self.0 & !(0xff << DAMAGE_BITS_OFFSET)) | (byte << DAMAGE_BITS_OFFSET))
    }

    /// Returns the raw slope byte (kind, rotation, and flip together).
    pub fn slope_byte(self) -> u8 {
        ((self.0 >> SLOPE_BITS_OFFSET) & 0xff) as u8
    }

    /// Returns the slope kind stored in the low 2 bits of the slope byte.
    pub fn slope_kind(self) -> SlopeKind {
        SlopeKind::from_bits(self.slope_byte())
    }

    /// Returns the slope rotation in quarter turns (0–3).
    pub fn slope_rotation(self) -> u8 {
        (self.slope_byte() >> 2) & 0b11
    }

    /// Returns the slope rotation as radians about +Y.
    pub fn slope_rotation_radians(self) -> f32 {
        f32::from(self.slope_rotation()) * FRAC_PI_2
    }

    /// Returns whether the slope is flipped about the forward axis.
    pub fn slope_flip(self) -> bool {
        (self.slope_byte() >> 4) & 1 == 1
    }

    /// Replaces the slope byte, leaving block id and damage bits untouched.
    pub fn with_slope(self, kind: SlopeKind, quarter_turns: u8, flip: bool) -> Self {
        let byte = u32::from(pack_slope_byte(kind, quarter_turns, flip));
        Self((self.0 & !(0xff << SLOPE_BITS_OFFSET)) | (byte << SLOPE_BITS_OFFSET))
    }

    /// Returns `true` if the block id is 0 (air).
    pub fn is_empty(self) -> bool {
        self.block_id().0 == 0
    }

    /// Returns `true` if the voxel has non-cube geometry.
    pub fn is_sloped(self) -> bool {
        self.slope_kind() != SlopeKind::None
    }

    /// Returns `true` if the voxel carries any damage amount.
    pub fn is_damaged(self) -> bool {
        self.damage_amount() > 0
    }

    /// Returns `true` if the damage amount has reached the break threshold.
    pub fn is_destroyed(self) -> bool {
        self.damage_amount() >= BLOCK_BREAK_DAMAGE_THRESHOLD
    }

    /// Returns the voxel with the empty invariant enforced: an empty block id
    /// clears the whole word.
    ///
    /// Guards against stale slope/damage bits riding along on air cells
    /// (the sloped-air artifact) when snapshots cross chunk boundaries.
    pub fn canonicalized(self) -> Self {
        if self.is_empty() { Self::EMPTY } else { self }
    }
}

/// Packs damage type flags and amount into a damage byte.
pub fn pack_damage_byte(type_flags: u8, amount: u8) -> u8 {
    ((type_flags & 0b111) << 5) | (amount & 0x1f)
}

/// Packs slope kind, rotation, and flip into a slope byte.
pub fn pack_slope_byte(kind: SlopeKind, quarter_turns: u8, flip: bool) -> u8 {
    (kind as u8) | ((quarter_turns & 0b11) << 2) | (u8::from(flip) << 4)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
