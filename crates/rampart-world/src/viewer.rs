//! Shared viewer position.
//!
//! Written by the main thread every frame, read by the background scan
//! thread at its own cadence. A plain mutex is right here: the critical
//! section is a 12-byte copy.

use std::sync::Mutex;

use rampart_voxel::{CHUNK_SIZE, ChunkCoord};

/// Mutex-guarded viewer world position.
pub struct ViewerTracker {
    position: Mutex<[f32; 3]>,
}

impl ViewerTracker {
    /// Creates a tracker at the world origin.
    pub fn new() -> Self {
        Self {
            position: Mutex::new([0.0; 3]),
        }
    }

    /// Publishes the viewer's current world position.
    pub fn update_position(&self, position: [f32; 3]) {
        *self.position.lock().expect("viewer position lock poisoned") = position;
    }

    /// Reads the last published world position.
    pub fn position(&self) -> [f32; 3] {
        *self.position.lock().expect("viewer position lock poisoned")
    }

    /// The chunk coordinate containing the viewer.
    pub fn chunk_coord(&self) -> ChunkCoord {
        let [x, y, z] = self.position();
        ChunkCoord::new(
            (x / CHUNK_SIZE as f32).floor() as i32,
            (y / CHUNK_SIZE as f32).floor() as i32,
            (z / CHUNK_SIZE as f32).floor() as i32,
        )
    }
}

impl Default for ViewerTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
