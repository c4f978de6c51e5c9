//! Face directions and the canonical cube tables used by quad emission.
//!
//! The direction order is fixed and load-bearing: the index doubles as the
//! face-mask slot during extraction and as the texture face index in the
//! block registry (0=bottom 1=top 2=left 3=right 4=back 5=front).

/// One of the six axis-aligned directions a cube face can point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaceDir {
    /// −Y (bottom).
    NegY = 0,
    /// +Y (top).
    PosY = 1,
    /// −X (left).
    NegX = 2,
    /// +X (right).
    PosX = 3,
    /// −Z (back).
    NegZ = 4,
    /// +Z (front).
    PosZ = 5,
}

impl FaceDir {
    /// All six directions in mask/texture order.
    pub const ALL: [FaceDir; 6] = [
        Self::NegY,
        Self::PosY,
        Self::NegX,
        Self::PosX,
        Self::NegZ,
        Self::PosZ,
    ];

    /// Direction for a face-mask slot (0–5).
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index]
    }

    /// The face-mask / texture-face index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The unit outward normal.
    pub fn normal(self) -> [f32; 3] {
        match self {
            Self::NegY => [0.0, -1.0, 0.0],
            Self::PosY => [0.0, 1.0, 0.0],
            Self::NegX => [-1.0, 0.0, 0.0],
            Self::PosX => [1.0, 0.0, 0.0],
            Self::NegZ => [0.0, 0.0, -1.0],
            Self::PosZ => [0.0, 0.0, 1.0],
        }
    }
}

/// The eight corners of the unit cube, in the index order the face table
/// below refers to.
pub const CUBE_VERTS: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];

/// Corner indices for each face. The `(0,1,2)`/`(0,2,3)` triangle split winds
/// clockwise when viewed from outside the cube, which is the front-face
/// convention the host renderer expects. Row order matches [`FaceDir`].
pub const CUBE_AXIS: [[usize; 4]; 6] = [
    [0, 4, 5, 1], // bottom
    [2, 3, 7, 6], // top
    [6, 4, 0, 2], // left
    [3, 1, 5, 7], // right
    [2, 0, 1, 3], // back
    [7, 5, 4, 6], // front
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        for dir in FaceDir::ALL {
            assert_eq!(FaceDir::from_index(dir.index()), dir);
        }
    }

    #[test]
    fn test_face_corners_lie_on_their_plane() {
        // Every corner of a face shares the coordinate the face is
        // perpendicular to.
        for dir in FaceDir::ALL {
            let (axis, plane) = match dir {
                FaceDir::NegY => (1, 0.0),
                FaceDir::PosY => (1, 1.0),
                FaceDir::NegX => (0, 0.0),
                FaceDir::PosX => (0, 1.0),
                FaceDir::NegZ => (2, 0.0),
                FaceDir::PosZ => (2, 1.0),
            };
            for &corner in &CUBE_AXIS[dir.index()] {
                assert_eq!(
                    CUBE_VERTS[corner][axis], plane,
                    "{dir:?} corner {corner} is off its plane"
                );
            }
        }
    }

    #[test]
    fn test_face_windings_are_consistently_clockwise() {
        // Clockwise from outside means the CCW cross product of the first
        // triangle's edges points against the face normal, for every face.
        for dir in FaceDir::ALL {
            let corners = CUBE_AXIS[dir.index()].map(|c| CUBE_VERTS[c]);
            let edge_a = [
                corners[1][0] - corners[0][0],
                corners[1][1] - corners[0][1],
                corners[1][2] - corners[0][2],
            ];
            let edge_b = [
                corners[2][0] - corners[0][0],
                corners[2][1] - corners[0][1],
                corners[2][2] - corners[0][2],
            ];
            let cross = [
                edge_a[1] * edge_b[2] - edge_a[2] * edge_b[1],
                edge_a[2] * edge_b[0] - edge_a[0] * edge_b[2],
                edge_a[0] * edge_b[1] - edge_a[1] * edge_b[0],
            ];
            let normal = dir.normal();
            let dot = cross[0] * normal[0] + cross[1] * normal[1] + cross[2] * normal[2];
            assert!(dot < 0.0, "{dir:?} winding flipped against the table convention");
        }
    }
}
