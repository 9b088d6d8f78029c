//! Events emitted by the engines for presentation layers (sound cues, flashes,
//! score popups). Engines queue them during `advance`/`apply_action`; hosts
//! drain them with `take_events`.

use serde::Serialize;

use crate::physics::BodyId;
use crate::types::{PlayerId, ShapeId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RulesEvent {
    /// A new falling piece entered the board
    Spawned { player: PlayerId, shape: ShapeId },
    /// A falling piece was committed to the grid
    Locked { player: PlayerId, shape: ShapeId },
    /// One clearing pass removed `lines` rows
    LinesCleared {
        player: PlayerId,
        lines: u8,
        points: u32,
    },
    /// A merge preview was released into the field
    Dropped {
        player: PlayerId,
        body: BodyId,
        rank: u8,
    },
    /// `parents` (both of `rank`) merged into `child`; `player` was credited.
    /// The parent ids are retired and never resolve again.
    Merged {
        player: PlayerId,
        rank: u8,
        parents: [BodyId; 2],
        child: BodyId,
        points: u32,
    },
    /// A player's side reached its terminal state
    GameOver { player: PlayerId },
}
