//! Core rules - pure, deterministic, and testable
//!
//! This crate holds the rule logic for two arcade games behind one facade.
//! It does no rendering, input polling, or I/O, and never integrates physics.
//!
//! - **Deterministic**: the same seed and action stream reproduce a game
//! - **Testable**: every rule runs headless; the merge engine talks to physics
//!   through [`PhysicsPort`], with [`ScriptedPhysics`] for tests and tools
//!
//! # Module Structure
//!
//! - [`grid`]: fixed-size cell grid with row compaction
//! - [`pieces`]: tetromino offsets, rotation, the piece catalog and rank table
//! - [`scoring`]: per-player ledger of named point rules
//! - [`falling`]: falling-block engine (spawn, gravity, lock, line clear)
//! - [`merge`]: merge-resolution engine (drops, same-rank merges, overflow)
//! - [`physics`]: the physics port and an in-memory scripted port
//! - [`rules`]: the [`RulesEngine`] trait both engines implement
//!
//! # Example
//!
//! ```
//! use tile_arcade_core::{FallingConfig, FallingPieceEngine, RulesEngine};
//! use tile_arcade_core::types::{Action, PlayerId};
//!
//! let mut engine = FallingPieceEngine::new(&FallingConfig::default()).unwrap();
//! engine.apply_action(PlayerId::One, Action::MoveLeft);
//! engine.apply_action(PlayerId::One, Action::HardDrop);
//! engine.advance(16);
//! assert!(!engine.is_terminal());
//! ```

pub mod config;
pub mod events;
pub mod falling;
pub mod grid;
pub mod merge;
pub mod physics;
pub mod pieces;
pub mod rng;
pub mod rules;
pub mod scoring;
pub mod snapshot;

pub use tile_arcade_types as types;

pub use config::{ConfigError, FallingConfig, MergeConfig};
pub use events::RulesEvent;
pub use falling::{FallingPieceEngine, Phase, Piece, PlayerBoard};
pub use grid::Grid;
pub use merge::{Body, MergeResolutionEngine, Preview};
pub use physics::{BodyId, PhysicsPort, ScriptedPhysics, ShapeHandle, Vec2};
pub use pieces::{rank_up, PieceCatalog};
pub use rng::SimpleRng;
pub use rules::RulesEngine;
pub use scoring::{Player, ScoringLedger};
pub use snapshot::{BoardSnapshot, FallingSnapshot, MergeSnapshot};
