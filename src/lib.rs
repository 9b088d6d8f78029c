//! Tile arcade (workspace facade crate).
//!
//! Re-exports the member crates under stable paths
//! (`tile_arcade::{core, engine, types}`) so hosts and tests depend on one package.

pub use tile_arcade_core as core;
pub use tile_arcade_engine as engine;
pub use tile_arcade_types as types;
