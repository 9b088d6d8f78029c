//! Pieces module - shape offsets, quarter-turn rotation and the rank table
//!
//! Each shape has one canonical offset table (orientation 0). Other
//! orientations are always recomputed from that table, never from a previously
//! rotated copy, so any sequence of turns is exactly reversible.
//!
//! There are no wall kicks: a rotation that would overlap a wall or a filled
//! cell is rejected by the engine, not nudged into place.

use crate::rng::SimpleRng;
use crate::types::{
    Orientation, ShapeId, MAX_RANK, RANK_NAMES, RANK_RADII,
};

/// Offset of a single block relative to the piece origin
pub type BlockOffset = (i8, i8);

/// Shape of a piece - 4 block offsets from the piece origin
pub type PieceShape = [BlockOffset; 4];

/// Canonical (orientation 0) offsets for a shape
pub fn shape_offsets(shape: ShapeId) -> PieceShape {
    match shape {
        ShapeId::I => [(0, 1), (1, 1), (2, 1), (3, 1)],
        ShapeId::O => [(0, 0), (1, 0), (0, 1), (1, 1)],
        ShapeId::T => [(0, 1), (1, 1), (2, 1), (1, 0)],
        ShapeId::S => [(1, 0), (2, 0), (0, 1), (1, 1)],
        ShapeId::Z => [(0, 0), (1, 0), (1, 1), (2, 1)],
        ShapeId::J => [(0, 0), (0, 1), (1, 1), (2, 1)],
        ShapeId::L => [(2, 0), (0, 1), (1, 1), (2, 1)],
    }
}

/// Apply the fixed rotation matrix for `orientation` to every offset.
///
/// One clockwise quarter turn maps `(dx, dy)` to `(-dy, dx)` (y grows
/// downward), applied `orientation.quarter_turns()` times.
pub fn rotate(offsets: &PieceShape, orientation: Orientation) -> PieceShape {
    let mut out = *offsets;
    for block in out.iter_mut() {
        let (dx, dy) = *block;
        *block = match orientation {
            Orientation::North => (dx, dy),
            Orientation::East => (-dy, dx),
            Orientation::South => (-dx, -dy),
            Orientation::West => (dy, -dx),
        };
    }
    out
}

/// Offsets for a shape in a given orientation
pub fn oriented_offsets(shape: ShapeId, orientation: Orientation) -> PieceShape {
    rotate(&shape_offsets(shape), orientation)
}

/// The set of shapes a falling-block game may spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceCatalog {
    shapes: Vec<ShapeId>,
}

impl PieceCatalog {
    /// Build a catalog from a non-empty, de-duplicated shape list.
    ///
    /// Configuration validation guarantees non-emptiness.
    pub fn new(shapes: &[ShapeId]) -> Self {
        assert!(!shapes.is_empty(), "piece catalog must not be empty");
        let mut list: Vec<ShapeId> = Vec::with_capacity(shapes.len());
        for &s in shapes {
            if !list.contains(&s) {
                list.push(s);
            }
        }
        Self { shapes: list }
    }

    pub fn shapes(&self) -> &[ShapeId] {
        &self.shapes
    }

    pub fn contains(&self, shape: ShapeId) -> bool {
        self.shapes.contains(&shape)
    }

    /// Pick a shape uniformly at random
    pub fn pick(&self, rng: &mut SimpleRng) -> ShapeId {
        let i = rng.next_range(self.shapes.len() as u32) as usize;
        self.shapes[i]
    }
}

impl Default for PieceCatalog {
    fn default() -> Self {
        Self::new(&ShapeId::ALL)
    }
}

/// Rank of the body produced by merging two bodies of `rank`.
///
/// The top rank wraps to 0.
pub fn rank_up(rank: u8) -> u8 {
    (rank + 1) % (MAX_RANK + 1)
}

pub fn rank_radius(rank: u8) -> f32 {
    RANK_RADII[rank as usize]
}

pub fn rank_name(rank: u8) -> &'static str {
    RANK_NAMES[rank as usize]
}
