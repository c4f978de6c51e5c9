//! Per-coordinate lifecycle state machine.
//!
//! A coordinate's only legal path is
//! `Inactive → PendingGeneration → PendingMesh → Meshing → Active → Inactive`
//! (absence from the map is Inactive). Every transition helper is atomic
//! under the map's shard lock and refuses illegal moves, so in particular a
//! coordinate can never be meshed twice concurrently: only one caller ever
//! wins the `PendingMesh → Meshing` step.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::FxBuildHasher;

use rampart_voxel::ChunkCoord;

/// Lifecycle stage of an in-flight or active chunk coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Queued or running voxel generation.
    PendingGeneration,
    /// Voxels stored; waiting for a meshing slot.
    PendingMesh,
    /// A meshing task owns this coordinate.
    Meshing,
    /// Mesh committed and uploaded.
    Active,
}

/// Concurrent coordinate → state map with transition enforcement.
pub struct StateMap {
    states: DashMap<ChunkCoord, ChunkState, FxBuildHasher>,
}

impl StateMap {
    /// Creates an empty map (every coordinate Inactive).
    pub fn new() -> Self {
        Self {
            states: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Returns the coordinate's state, or `None` for Inactive.
    pub fn state(&self, coord: ChunkCoord) -> Option<ChunkState> {
        self.states.get(&coord).map(|entry| *entry)
    }

    /// Returns `true` if the coordinate is anywhere in the pipeline.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.states.contains_key(&coord)
    }

    /// `Inactive → PendingGeneration`. Fails if the coordinate is already
    /// tracked in any state.
    pub fn try_begin_generation(&self, coord: ChunkCoord) -> bool {
        match self.states.entry(coord) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(ChunkState::PendingGeneration);
                true
            }
        }
    }

    /// `PendingGeneration → PendingMesh`. Fails from any other state.
    pub fn mark_pending_mesh(&self, coord: ChunkCoord) -> bool {
        self.transition(coord, ChunkState::PendingGeneration, ChunkState::PendingMesh)
    }

    /// `PendingMesh → Meshing`. At most one caller ever wins this for a
    /// given pass; it is the single-flight guarantee for mesh builds.
    pub fn try_begin_meshing(&self, coord: ChunkCoord) -> bool {
        self.transition(coord, ChunkState::PendingMesh, ChunkState::Meshing)
    }

    /// `Meshing → PendingMesh`, for a meshing slot that could not be
    /// submitted (budget refusal). The coordinate becomes claimable again.
    pub fn requeue_mesh(&self, coord: ChunkCoord) -> bool {
        self.transition(coord, ChunkState::Meshing, ChunkState::PendingMesh)
    }

    /// `Meshing → Active`. Fails from any other state, so a result whose
    /// coordinate was deactivated mid-build cannot commit.
    pub fn activate(&self, coord: ChunkCoord) -> bool {
        self.transition(coord, ChunkState::Meshing, ChunkState::Active)
    }

    /// `* → Inactive`: removes the coordinate entirely.
    pub fn remove(&self, coord: ChunkCoord) -> Option<ChunkState> {
        self.states.remove(&coord).map(|(_, state)| state)
    }

    /// Snapshot of every tracked coordinate (scan-thread read).
    pub fn tracked(&self) -> Vec<ChunkCoord> {
        self.states.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of tracked coordinates.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Drops all state (world reset).
    pub fn clear(&self) {
        self.states.clear();
    }

    fn transition(&self, coord: ChunkCoord, from: ChunkState, to: ChunkState) -> bool {
        match self.states.get_mut(&coord) {
            Some(mut entry) if *entry == from => {
                *entry = to;
                true
            }
            _ => false,
        }
    }
}

impl Default for StateMap {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn coord() -> ChunkCoord {
        ChunkCoord::new(1, 0, -2)
    }

    #[test]
    fn test_happy_path_transitions() {
        let states = StateMap::new();
        let c = coord();
        assert!(states.try_begin_generation(c));
        assert_eq!(states.state(c), Some(ChunkState::PendingGeneration));
        assert!(states.mark_pending_mesh(c));
        assert!(states.try_begin_meshing(c));
        assert!(states.activate(c));
        assert_eq!(states.state(c), Some(ChunkState::Active));
        assert_eq!(states.remove(c), Some(ChunkState::Active));
        assert_eq!(states.state(c), None);
    }

    #[test]
    fn test_active_cannot_reenter_mesh_without_generation() {
        let states = StateMap::new();
        let c = coord();
        states.try_begin_generation(c);
        states.mark_pending_mesh(c);
        states.try_begin_meshing(c);
        states.activate(c);

        // Active → PendingMesh is not a legal move in any form.
        assert!(!states.mark_pending_mesh(c));
        assert!(!states.try_begin_meshing(c));
        assert!(!states.requeue_mesh(c));

        // The only way forward is through Inactive and regeneration.
        assert!(!states.try_begin_generation(c));
        states.remove(c);
        assert!(states.try_begin_generation(c));
    }

    #[test]
    fn test_meshing_claim_is_single_flight() {
        let states = StateMap::new();
        let c = coord();
        states.try_begin_generation(c);
        states.mark_pending_mesh(c);

        assert!(states.try_begin_meshing(c), "first claim wins");
        assert!(!states.try_begin_meshing(c), "second claim must lose");
    }

    #[test]
    fn test_requeue_returns_coordinate_to_claimable() {
        let states = StateMap::new();
        let c = coord();
        states.try_begin_generation(c);
        states.mark_pending_mesh(c);
        states.try_begin_meshing(c);

        assert!(states.requeue_mesh(c));
        assert_eq!(states.state(c), Some(ChunkState::PendingMesh));
        assert!(states.try_begin_meshing(c), "claimable again after requeue");
    }

    #[test]
    fn test_skipping_generation_is_rejected() {
        let states = StateMap::new();
        let c = coord();
        assert!(!states.mark_pending_mesh(c), "untracked coordinate");
        assert!(!states.try_begin_meshing(c));
        assert!(!states.activate(c));

        states.try_begin_generation(c);
        assert!(!states.try_begin_meshing(c), "must pass through PendingMesh");
        assert!(!states.activate(c), "must pass through Meshing");
    }

    #[test]
    fn test_concurrent_meshing_claims_one_winner() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let states = Arc::new(StateMap::new());
        let c = coord();
        states.try_begin_generation(c);
        states.mark_pending_mesh(c);

        let wins = Arc::new(AtomicUsize::new(0));
        let mut threads = Vec::new();
        for _ in 0..8 {
            let states = Arc::clone(&states);
            let wins = Arc::clone(&wins);
            threads.push(std::thread::spawn(move || {
                if states.try_begin_meshing(c) {
                    wins.fetch_add(1, Ordering::Relaxed);
                }
            }));
        }
        for thread in threads {
            thread.join().expect("claim thread panicked");
        }
        assert_eq!(wins.load(Ordering::Relaxed), 1, "exactly one claim may win");
    }
}
