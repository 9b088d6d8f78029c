//! Shared types module - plain data and tuning constants
//!
//! This crate defines the vocabulary shared by both arcade games and the host
//! application: piece shapes, orientations, decoded player actions, player
//! handles, and the cell tags stored in a grid. Nothing here has behavior beyond
//! small conversions, so it can be used from rules code, renderers and input
//! decoders alike.
//!
//! # Falling-block defaults
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `BOARD_WIDTH` | 10 | Columns (indexed 0-9) |
//! | `BOARD_HEIGHT` | 20 | Rows (indexed 0-19, row 0 on top) |
//! | `DROP_INTERVAL_MS` | 1000 | Gravity interval |
//! | `OVERFLOW_ROWS` | 1 | Rows at the top that end the game when occupied after a lock |
//!
//! # Merge defaults
//!
//! Ranks run from 0 (Cherry) to [`MAX_RANK`] (Melon). Merging two bodies of
//! the top rank wraps back to rank 0.
//!
//! # Examples
//!
//! ```
//! use tile_arcade_types::{Action, Orientation, PlayerId, ShapeId, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! let shape = ShapeId::from_str("t").unwrap();
//! assert_eq!(shape, ShapeId::T);
//!
//! assert_eq!(Orientation::North.rotate_cw(), Orientation::East);
//! assert_eq!(Action::from_str("hardDrop"), Some(Action::HardDrop));
//! assert_eq!(PlayerId::One.other(), PlayerId::Two);
//!
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

use serde::{Deserialize, Serialize};

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Largest accepted board dimension. Coordinates are `i8`, so this keeps
/// `origin + offset` arithmetic well inside range.
pub const MAX_BOARD_DIM: u8 = 64;

/// Gravity interval in milliseconds (one row per second)
pub const DROP_INTERVAL_MS: u32 = 1000;

/// Rows at the top of the board that count as overflow after a lock
pub const OVERFLOW_ROWS: u8 = 1;

/// Points per line-clear event, indexed by `lines - 1`
pub const LINE_CLEAR_POINTS: [u32; 4] = [100, 300, 600, 1000];

/// Highest merge rank. Ranks are `0..=MAX_RANK`.
pub const MAX_RANK: u8 = 8;

/// Number of merge ranks
pub const RANK_COUNT: usize = MAX_RANK as usize + 1;

/// Display names for the merge ranks, smallest first
pub const RANK_NAMES: [&str; RANK_COUNT] = [
    "Cherry",
    "Strawberry",
    "Grape",
    "Orange",
    "Apple",
    "Pear",
    "Peach",
    "Pineapple",
    "Melon",
];

/// Merge points indexed by the rank of the two bodies being merged
pub const RANK_POINTS: [u32; RANK_COUNT] = [1, 3, 6, 10, 15, 21, 28, 36, 45];

/// Body radius per rank, in field units
pub const RANK_RADII: [f32; RANK_COUNT] = [10.0, 14.0, 19.0, 24.0, 30.0, 37.0, 44.0, 52.0, 62.0];

/// Merge field width in field units
pub const FIELD_WIDTH: f32 = 400.0;

/// Merge field height in field units (y grows downward, 0 is the top)
pub const FIELD_HEIGHT: f32 = 600.0;

/// Bodies that have collided and sit above this y overflow their side
pub const OVERFLOW_LINE_Y: f32 = 100.0;

/// Height at which a released preview enters the field
pub const SPAWN_Y: f32 = 40.0;

/// Cooldown after a drop before the next preview appears
pub const DROP_COOLDOWN_MS: u32 = 500;

/// Numerator of the chain repulsion impulse (`strength / distance^2`)
pub const CHAIN_IMPULSE_STRENGTH: f32 = 5000.0;

/// Horizontal nudge applied to the preview by `MoveLeft`/`MoveRight`
pub const POINTER_STEP: f32 = 10.0;

/// The seven falling-block shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeId {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl ShapeId {
    /// Every shape, in catalog order
    pub const ALL: [ShapeId; 7] = [
        ShapeId::I,
        ShapeId::O,
        ShapeId::T,
        ShapeId::S,
        ShapeId::Z,
        ShapeId::J,
        ShapeId::L,
    ];

    /// Parse a shape from its letter (case-insensitive)
    ///
    /// ```
    /// use tile_arcade_types::ShapeId;
    ///
    /// assert_eq!(ShapeId::from_str("I"), Some(ShapeId::I));
    /// assert_eq!(ShapeId::from_str("z"), Some(ShapeId::Z));
    /// assert_eq!(ShapeId::from_str("q"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "i" => Some(ShapeId::I),
            "o" => Some(ShapeId::O),
            "t" => Some(ShapeId::T),
            "s" => Some(ShapeId::S),
            "z" => Some(ShapeId::Z),
            "j" => Some(ShapeId::J),
            "l" => Some(ShapeId::L),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeId::I => "i",
            ShapeId::O => "o",
            ShapeId::T => "t",
            ShapeId::S => "s",
            ShapeId::Z => "z",
            ShapeId::J => "j",
            ShapeId::L => "l",
        }
    }
}

/// Quarter-turn orientation of a falling piece
///
/// - **North**: spawn orientation (0 turns)
/// - **East**: one clockwise turn
/// - **South**: two turns
/// - **West**: three turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    North,
    East,
    South,
    West,
}

impl Orientation {
    /// Rotate clockwise (90°)
    ///
    /// ```
    /// use tile_arcade_types::Orientation;
    ///
    /// assert_eq!(Orientation::West.rotate_cw(), Orientation::North);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }

    /// Rotate counter-clockwise (270° clockwise)
    pub fn rotate_ccw(&self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 3)
    }

    /// Number of clockwise quarter turns from North (0..=3)
    pub fn quarter_turns(&self) -> u8 {
        match self {
            Orientation::North => 0,
            Orientation::East => 1,
            Orientation::South => 2,
            Orientation::West => 3,
        }
    }

    /// Build from a turn count; wraps modulo 4
    pub fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Orientation::North,
            1 => Orientation::East,
            2 => Orientation::South,
            _ => Orientation::West,
        }
    }
}

/// Decoded player action
///
/// The host input layer turns raw device events into these values. Each engine
/// interprets the subset that makes sense for it and ignores the rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Move the active piece (or the merge preview) left
    MoveLeft,
    /// Move the active piece (or the merge preview) right
    MoveRight,
    /// Rotate the active piece one quarter turn clockwise
    RotateCw,
    /// Apply one gravity step immediately
    SoftDrop,
    /// Drop the active piece to its landing row and lock it
    HardDrop,
    /// Place the merge preview at field x
    PointerMove(f32),
    /// Release the merge preview into the field
    Release,
}

impl Action {
    /// Parse a discrete action name (case-insensitive).
    ///
    /// `PointerMove` carries a coordinate and has no name form.
    ///
    /// ```
    /// use tile_arcade_types::Action;
    ///
    /// assert_eq!(Action::from_str("moveLeft"), Some(Action::MoveLeft));
    /// assert_eq!(Action::from_str("RELEASE"), Some(Action::Release));
    /// assert_eq!(Action::from_str("hold"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(Action::MoveLeft),
            "moveright" => Some(Action::MoveRight),
            "rotatecw" => Some(Action::RotateCw),
            "softdrop" => Some(Action::SoftDrop),
            "harddrop" => Some(Action::HardDrop),
            "release" => Some(Action::Release),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::MoveLeft => "moveLeft",
            Action::MoveRight => "moveRight",
            Action::RotateCw => "rotateCw",
            Action::SoftDrop => "softDrop",
            Action::HardDrop => "hardDrop",
            Action::PointerMove(_) => "pointerMove",
            Action::Release => "release",
        }
    }
}

/// Seat of a player in a one- or two-player game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const BOTH: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    /// Zero-based seat index
    pub fn index(&self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PlayerId::One),
            1 => Some(PlayerId::Two),
            _ => None,
        }
    }

    /// The opposing seat
    pub fn other(&self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }
}

/// Tag stored in an occupied grid cell
///
/// Renderers map it to a color or sprite; the rules never inspect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellValue {
    Shape(ShapeId),
    Rank(u8),
}

/// A cell on a grid (`None` = empty)
pub type Cell = Option<CellValue>;

/// Name of the ledger event fired when `lines` rows clear in one pass
///
/// Counts outside `1..=4` have no event.
pub fn line_clear_event(lines: usize) -> Option<&'static str> {
    match lines {
        1 => Some("line_clear_1"),
        2 => Some("line_clear_2"),
        3 => Some("line_clear_3"),
        4 => Some("line_clear_4"),
        _ => None,
    }
}

/// Name of the ledger event fired for each merge
pub const MERGE_EVENT: &str = "merge";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_is_cyclic_of_order_four() {
        let mut o = Orientation::North;
        for _ in 0..4 {
            o = o.rotate_cw();
        }
        assert_eq!(o, Orientation::North);
        assert_eq!(Orientation::North.rotate_ccw(), Orientation::West);
        assert_eq!(Orientation::from_quarter_turns(6), Orientation::South);
    }

    #[test]
    fn rank_tables_cover_every_rank() {
        assert_eq!(RANK_NAMES.len(), RANK_COUNT);
        assert_eq!(RANK_POINTS[2], 6);
        assert!(RANK_RADII.windows(2).all(|w| w[0] < w[1]));
        assert!(RANK_POINTS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn line_clear_event_names() {
        assert_eq!(line_clear_event(0), None);
        assert_eq!(line_clear_event(1), Some("line_clear_1"));
        assert_eq!(line_clear_event(4), Some("line_clear_4"));
        assert_eq!(line_clear_event(5), None);
    }

    #[test]
    fn action_names_roundtrip_for_discrete_actions() {
        for action in [
            Action::MoveLeft,
            Action::MoveRight,
            Action::RotateCw,
            Action::SoftDrop,
            Action::HardDrop,
            Action::Release,
        ] {
            assert_eq!(Action::from_str(action.as_str()), Some(action));
        }
        assert_eq!(Action::from_str("pointerMove"), None);
    }
}
