//! Rules facade - the contract every game engine implements
//!
//! The host loop drives an engine with exactly three calls per frame:
//! `advance(dt)` once, `apply_action` for each decoded input, then
//! `is_terminal()`. Everything else on the trait is read-only.

use crate::events::RulesEvent;
use crate::types::{Action, PlayerId};

pub trait RulesEngine {
    /// Advance game time by `dt_ms` milliseconds
    fn advance(&mut self, dt_ms: u32);

    /// Apply a decoded action from `player`.
    ///
    /// Requests that cannot be honored (blocked move, cooldown, wrong seat,
    /// finished side) leave the state unchanged.
    fn apply_action(&mut self, player: PlayerId, action: Action);

    /// True once the game has ended
    fn is_terminal(&self) -> bool;

    /// Number of seated players (1 or 2)
    fn player_count(&self) -> usize;

    /// Ledger total for a player; 0 for an empty seat
    fn score(&self, player: PlayerId) -> u32;

    /// Drain queued presentation events
    fn take_events(&mut self) -> Vec<RulesEvent>;
}
