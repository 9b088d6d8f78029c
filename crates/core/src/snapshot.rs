//! Read-only snapshots handed to renderers.
//!
//! Snapshots are owned copies; holding one never borrows the engine.

use serde::Serialize;

use crate::falling::{Phase, Piece};
use crate::physics::{BodyId, Vec2};
use crate::types::{Cell, Orientation, PlayerId, ShapeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ActiveSnapshot {
    pub shape: ShapeId,
    pub orientation: Orientation,
    pub x: i8,
    pub y: i8,
    pub blocks: [(i8, i8); 4],
}

impl From<Piece> for ActiveSnapshot {
    fn from(value: Piece) -> Self {
        Self {
            shape: value.shape,
            orientation: value.orientation,
            x: value.x,
            y: value.y,
            blocks: value.blocks(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub player: PlayerId,
    pub width: u8,
    pub height: u8,
    /// Row-major cells, `width * height` long
    pub cells: Vec<Cell>,
    pub active: Option<ActiveSnapshot>,
    pub ghost: Option<[(i8, i8); 4]>,
    pub phase: Phase,
    pub score: u32,
    pub lines_cleared: u32,
}

impl BoardSnapshot {
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.width as usize + x]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallingSnapshot {
    pub boards: Vec<BoardSnapshot>,
    pub terminal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub owner: PlayerId,
    pub rank: u8,
    pub position: Vec2,
    pub radius: f32,
    pub has_collided: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewSnapshot {
    pub owner: PlayerId,
    pub rank: u8,
    pub x: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeSnapshot {
    pub bodies: Vec<BodySnapshot>,
    pub preview: Option<PreviewSnapshot>,
    pub active_player: PlayerId,
    pub scores: Vec<u32>,
    pub side_terminal: Vec<bool>,
    pub terminal: bool,
}
