//! Falling-piece engine - spawn, move, rotate, lock and line-clear
//!
//! Each seated player owns an independent [`PlayerBoard`]: a grid, at most one
//! active piece, a gravity accumulator, a ledger, and a phase in the cycle
//!
//! ```text
//! Spawning -> Falling -> Locking -> LineClearing -> Spawning ...
//!                                                \-> GameOver
//! ```
//!
//! A phase transition always runs to completion inside the call that started
//! it, so between calls a board is either `Falling` or `GameOver`.
//!
//! Collision is all-or-nothing: a candidate position or orientation that hits
//! a wall, the floor, or a filled cell is discarded and the piece stays put.

use arrayvec::ArrayVec;
use serde::Serialize;

use crate::config::{ConfigError, FallingConfig};
use crate::events::RulesEvent;
use crate::grid::Grid;
use crate::pieces::{oriented_offsets, PieceCatalog, PieceShape};
use crate::rng::SimpleRng;
use crate::rules::RulesEngine;
use crate::scoring::ScoringLedger;
use crate::snapshot::{BoardSnapshot, FallingSnapshot};
use crate::types::{line_clear_event, Action, CellValue, Orientation, PlayerId, ShapeId};

/// State of one board's piece cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Spawning,
    Falling,
    Locking,
    LineClearing,
    GameOver,
}

/// Active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub shape: ShapeId,
    pub orientation: Orientation,
    pub x: i8,
    pub y: i8,
}

impl Piece {
    pub fn new(shape: ShapeId, origin: (i8, i8)) -> Self {
        Self {
            shape,
            orientation: Orientation::North,
            x: origin.0,
            y: origin.1,
        }
    }

    /// Block offsets for the current orientation
    pub fn offsets(&self) -> PieceShape {
        oriented_offsets(self.shape, self.orientation)
    }

    /// Absolute board positions of the four blocks
    pub fn blocks(&self) -> [(i8, i8); 4] {
        self.offsets().map(|(dx, dy)| (self.x + dx, self.y + dy))
    }

    /// True if every block is on the board and on an empty cell
    pub fn fits(&self, grid: &Grid) -> bool {
        self.blocks().iter().all(|&(x, y)| !grid.is_occupied(x, y))
    }

    pub fn moved(&self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn rotated_cw(&self) -> Self {
        Self {
            orientation: self.orientation.rotate_cw(),
            ..*self
        }
    }
}

/// One player's grid and piece cycle
#[derive(Debug, Clone)]
pub struct PlayerBoard {
    player: PlayerId,
    grid: Grid,
    active: Option<Piece>,
    phase: Phase,
    drop_timer_ms: u32,
    ledger: ScoringLedger,
    lines_cleared: u32,
}

impl PlayerBoard {
    fn new(player: PlayerId, grid: Grid, ledger: ScoringLedger) -> Self {
        Self {
            player,
            grid,
            active: None,
            phase: Phase::Spawning,
            drop_timer_ms: 0,
            ledger,
            lines_cleared: 0,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active(&self) -> Option<Piece> {
        self.active
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ledger(&self) -> &ScoringLedger {
        &self.ledger
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Where the active piece would land if hard-dropped
    pub fn ghost(&self) -> Option<Piece> {
        let mut piece = self.active?;
        while piece.moved(0, 1).fits(&self.grid) {
            piece = piece.moved(0, 1);
        }
        Some(piece)
    }

    fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            player: self.player,
            width: self.grid.width(),
            height: self.grid.height(),
            cells: self.grid.cells().to_vec(),
            active: self.active.map(Into::into),
            ghost: self.ghost().map(|p| p.blocks()),
            phase: self.phase,
            score: self.ledger.total(),
            lines_cleared: self.lines_cleared,
        }
    }
}

/// Falling-block rules engine for one or two players
#[derive(Debug, Clone)]
pub struct FallingPieceEngine {
    boards: ArrayVec<PlayerBoard, 2>,
    catalog: PieceCatalog,
    rng: SimpleRng,
    drop_interval_ms: u32,
    overflow_rows: u8,
    spawn_origin: (i8, i8),
    events: Vec<RulesEvent>,
}

impl FallingPieceEngine {
    /// Build an engine and spawn the first piece on every board
    pub fn new(config: &FallingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let catalog = PieceCatalog::new(&config.shape_ids()?);

        let mut boards = ArrayVec::new();
        for player in PlayerId::BOTH.into_iter().take(config.players as usize) {
            boards.push(PlayerBoard::new(
                player,
                Grid::new(config.width, config.height),
                ScoringLedger::new(config.scoring.clone()),
            ));
        }

        let mut engine = Self {
            boards,
            catalog,
            rng: SimpleRng::new(config.seed),
            drop_interval_ms: config.drop_interval_ms,
            overflow_rows: config.overflow_rows,
            spawn_origin: ((config.width / 2) as i8 - 2, 0),
            events: Vec::new(),
        };

        for idx in 0..engine.boards.len() {
            engine.spawn_random(idx);
        }
        log::debug!(
            "falling engine ready: {} board(s) {}x{}, drop every {}ms",
            engine.boards.len(),
            config.width,
            config.height,
            config.drop_interval_ms
        );
        Ok(engine)
    }

    pub fn boards(&self) -> &[PlayerBoard] {
        &self.boards
    }

    pub fn board(&self, player: PlayerId) -> Option<&PlayerBoard> {
        self.boards.get(player.index())
    }

    pub fn catalog(&self) -> &PieceCatalog {
        &self.catalog
    }

    pub fn spawn_origin(&self) -> (i8, i8) {
        self.spawn_origin
    }

    pub fn drop_interval_ms(&self) -> u32 {
        self.drop_interval_ms
    }

    /// Block positions of a player's active piece (for rendering)
    pub fn active_blocks(&self, player: PlayerId) -> Option<[(i8, i8); 4]> {
        self.board(player)?.active.map(|p| p.blocks())
    }

    /// Landing position of a player's active piece (for rendering)
    pub fn ghost_blocks(&self, player: PlayerId) -> Option<[(i8, i8); 4]> {
        self.board(player)?.ghost().map(|p| p.blocks())
    }

    pub fn snapshot(&self) -> FallingSnapshot {
        FallingSnapshot {
            boards: self.boards.iter().map(PlayerBoard::snapshot).collect(),
            terminal: self.is_terminal(),
        }
    }

    /// Replace a player's active piece with a fresh `shape` at the spawn origin.
    ///
    /// `shape` must be in the catalog. A finished board ignores the request.
    /// Returns false when the spawn was blocked (the board is then over).
    pub fn spawn_shape(&mut self, player: PlayerId, shape: ShapeId) -> bool {
        assert!(
            self.catalog.contains(shape),
            "shape {:?} is not in the piece catalog",
            shape
        );
        let idx = player.index();
        if idx >= self.boards.len() || self.boards[idx].is_over() {
            return false;
        }
        self.spawn(idx, shape)
    }

    fn spawn_random(&mut self, idx: usize) -> bool {
        let shape = self.catalog.pick(&mut self.rng);
        self.spawn(idx, shape)
    }

    fn spawn(&mut self, idx: usize, shape: ShapeId) -> bool {
        let origin = self.spawn_origin;
        let board = &mut self.boards[idx];
        board.phase = Phase::Spawning;
        board.active = None;
        board.drop_timer_ms = 0;

        let piece = Piece::new(shape, origin);
        if !piece.fits(&board.grid) {
            log::debug!("{:?}: spawn of {:?} blocked, game over", board.player, shape);
            board.phase = Phase::GameOver;
            self.events.push(RulesEvent::GameOver {
                player: board.player,
            });
            return false;
        }

        board.active = Some(piece);
        board.phase = Phase::Falling;
        log::trace!("{:?}: spawned {:?}", board.player, shape);
        self.events.push(RulesEvent::Spawned {
            player: board.player,
            shape,
        });
        true
    }

    /// Try to replace the active piece with `candidate`; no partial moves.
    fn try_place(&mut self, idx: usize, candidate: impl FnOnce(Piece) -> Piece) -> bool {
        let board = &mut self.boards[idx];
        let Some(active) = board.active else {
            return false;
        };
        let next = candidate(active);
        if next.fits(&board.grid) {
            board.active = Some(next);
            true
        } else {
            false
        }
    }

    /// One gravity step: fall one row, or lock if the row below is blocked.
    /// Returns true if the piece locked.
    fn gravity_step(&mut self, idx: usize) -> bool {
        if self.boards[idx].active.is_none() {
            return false;
        }
        if self.try_place(idx, |p| p.moved(0, 1)) {
            return false;
        }
        self.lock(idx);
        true
    }

    fn hard_drop(&mut self, idx: usize) {
        if self.boards[idx].active.is_none() {
            return;
        }
        while self.try_place(idx, |p| p.moved(0, 1)) {}
        self.lock(idx);
    }

    /// Commit the active piece, clear full rows, then spawn or end the board
    fn lock(&mut self, idx: usize) {
        let board = &mut self.boards[idx];
        let Some(piece) = board.active.take() else {
            return;
        };

        board.phase = Phase::Locking;
        for (x, y) in piece.blocks() {
            board.grid.set(x, y, CellValue::Shape(piece.shape));
        }
        self.events.push(RulesEvent::Locked {
            player: board.player,
            shape: piece.shape,
        });

        board.phase = Phase::LineClearing;
        let cleared = board.grid.clear_full_rows();
        if cleared > 0 {
            board.lines_cleared += cleared as u32;
            let points = line_clear_event(cleared)
                .map(|name| board.ledger.add_event(name, 1))
                .unwrap_or(0);
            log::debug!(
                "{:?}: cleared {} row(s) for {} points",
                board.player,
                cleared,
                points
            );
            self.events.push(RulesEvent::LinesCleared {
                player: board.player,
                lines: cleared as u8,
                points,
            });
        }

        let overflowed = (0..self.overflow_rows as usize).any(|y| board.grid.row_has_occupant(y));
        if overflowed {
            log::debug!("{:?}: lock reached the overflow band, game over", board.player);
            board.phase = Phase::GameOver;
            self.events.push(RulesEvent::GameOver {
                player: board.player,
            });
            return;
        }

        self.spawn_random(idx);
    }

    pub fn take_events(&mut self) -> Vec<RulesEvent> {
        std::mem::take(&mut self.events)
    }
}

impl RulesEngine for FallingPieceEngine {
    fn advance(&mut self, dt_ms: u32) {
        for idx in 0..self.boards.len() {
            let board = &mut self.boards[idx];
            if board.active.is_none() {
                continue;
            }
            board.drop_timer_ms = board.drop_timer_ms.saturating_add(dt_ms);
            if board.drop_timer_ms >= self.drop_interval_ms {
                board.drop_timer_ms = 0;
                log::trace!("{:?}: gravity step", board.player);
                self.gravity_step(idx);
            }
        }
    }

    fn apply_action(&mut self, player: PlayerId, action: Action) {
        let idx = player.index();
        if idx >= self.boards.len() || self.boards[idx].active.is_none() {
            return;
        }
        match action {
            Action::MoveLeft => {
                self.try_place(idx, |p| p.moved(-1, 0));
            }
            Action::MoveRight => {
                self.try_place(idx, |p| p.moved(1, 0));
            }
            Action::RotateCw => {
                self.try_place(idx, |p| p.rotated_cw());
            }
            Action::SoftDrop => {
                self.gravity_step(idx);
            }
            Action::HardDrop => self.hard_drop(idx),
            Action::PointerMove(_) | Action::Release => {}
        }
    }

    fn is_terminal(&self) -> bool {
        self.boards.iter().all(PlayerBoard::is_over)
    }

    fn player_count(&self) -> usize {
        self.boards.len()
    }

    fn score(&self, player: PlayerId) -> u32 {
        self.board(player).map(|b| b.ledger.total()).unwrap_or(0)
    }

    fn take_events(&mut self) -> Vec<RulesEvent> {
        FallingPieceEngine::take_events(self)
    }
}

#[cfg(test)]
impl FallingPieceEngine {
    pub(crate) fn grid_mut(&mut self, player: PlayerId) -> &mut Grid {
        &mut self.boards[player.index()].grid
    }
}
