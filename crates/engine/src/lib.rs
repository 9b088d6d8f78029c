//! Arcade session - the host-facing wrapper around one running game
//!
//! A session pairs an engine with the roster of players that sit at it. The
//! host loop calls `tick` once per frame and `apply_action` for each decoded
//! input. Points earned since the previous call are added onto the roster, so
//! a player who arrives with a running total keeps it and gains this game's
//! points on top. `scores()` and `final_scores()` report this game alone.
//!
//! `stop()` is the coarse cancellation hook: it is checked at the next tick
//! boundary, after which the session ignores further input and its final
//! scores become available.

use serde::Serialize;

use tile_arcade_core::{
    ConfigError, FallingConfig, FallingPieceEngine, MergeConfig, MergeResolutionEngine,
    PhysicsPort, Player, RulesEngine, RulesEvent, ScriptedPhysics,
};
use tile_arcade_types::{Action, PlayerId};

/// The game being played, dispatched statically
#[derive(Debug)]
pub enum Game<P: PhysicsPort = ScriptedPhysics> {
    Falling(FallingPieceEngine),
    Merge(MergeResolutionEngine<P>),
}

impl<P: PhysicsPort> Game<P> {
    pub fn name(&self) -> &'static str {
        match self {
            Game::Falling(_) => "falling",
            Game::Merge(_) => "merge",
        }
    }

    pub fn as_falling(&self) -> Option<&FallingPieceEngine> {
        match self {
            Game::Falling(engine) => Some(engine),
            Game::Merge(_) => None,
        }
    }

    pub fn as_merge(&self) -> Option<&MergeResolutionEngine<P>> {
        match self {
            Game::Merge(engine) => Some(engine),
            Game::Falling(_) => None,
        }
    }

    pub fn as_merge_mut(&mut self) -> Option<&mut MergeResolutionEngine<P>> {
        match self {
            Game::Merge(engine) => Some(engine),
            Game::Falling(_) => None,
        }
    }
}

impl<P: PhysicsPort> RulesEngine for Game<P> {
    fn advance(&mut self, dt_ms: u32) {
        match self {
            Game::Falling(engine) => engine.advance(dt_ms),
            Game::Merge(engine) => engine.advance(dt_ms),
        }
    }

    fn apply_action(&mut self, player: PlayerId, action: Action) {
        match self {
            Game::Falling(engine) => engine.apply_action(player, action),
            Game::Merge(engine) => engine.apply_action(player, action),
        }
    }

    fn is_terminal(&self) -> bool {
        match self {
            Game::Falling(engine) => engine.is_terminal(),
            Game::Merge(engine) => engine.is_terminal(),
        }
    }

    fn player_count(&self) -> usize {
        match self {
            Game::Falling(engine) => engine.player_count(),
            Game::Merge(engine) => engine.player_count(),
        }
    }

    fn score(&self, player: PlayerId) -> u32 {
        match self {
            Game::Falling(engine) => engine.score(player),
            Game::Merge(engine) => engine.score(player),
        }
    }

    fn take_events(&mut self) -> Vec<RulesEvent> {
        match self {
            Game::Falling(engine) => RulesEngine::take_events(engine),
            Game::Merge(engine) => RulesEngine::take_events(engine),
        }
    }
}

/// Score record handed to the external profile store when a game ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalScore {
    pub player_name: String,
    pub score: u32,
}

#[derive(Debug)]
pub struct ArcadeSession<P: PhysicsPort = ScriptedPhysics> {
    game: Game<P>,
    players: Vec<Player>,
    /// Game total already credited to each seat's `Player`
    synced: Vec<u32>,
    running: bool,
}

impl ArcadeSession<ScriptedPhysics> {
    /// Seat `players` at a falling-block game; the roster decides the board count
    pub fn falling(players: Vec<Player>, config: FallingConfig) -> Result<Self, ConfigError> {
        let config = FallingConfig {
            players: seat_count(&players),
            ..config
        };
        let engine = FallingPieceEngine::new(&config)?;
        Ok(Self::with_game(Game::Falling(engine), players))
    }
}

impl<P: PhysicsPort> ArcadeSession<P> {
    /// Seat `players` at a merge game driven by `physics`
    pub fn merge(players: Vec<Player>, config: MergeConfig, physics: P) -> Result<Self, ConfigError> {
        let config = MergeConfig {
            players: seat_count(&players),
            ..config
        };
        let engine = MergeResolutionEngine::new(&config, physics)?;
        Ok(Self::with_game(Game::Merge(engine), players))
    }

    fn with_game(game: Game<P>, players: Vec<Player>) -> Self {
        log::debug!(
            "session started: {} game, players {:?}",
            game.name(),
            players.iter().map(|p| p.name.as_str()).collect::<Vec<_>>()
        );
        let players_len = players.len();
        let mut session = Self {
            game,
            players,
            synced: vec![0; players_len],
            running: true,
        };
        session.sync_scores();
        session
    }

    pub fn game(&self) -> &Game<P> {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game<P> {
        &mut self.game
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Advance the game unless it has been stopped or has ended
    pub fn tick(&mut self, dt_ms: u32) {
        if !self.running || self.game.is_terminal() {
            return;
        }
        self.game.advance(dt_ms);
        self.sync_scores();
        if self.game.is_terminal() {
            log::debug!("{} game finished", self.game.name());
        }
    }

    pub fn apply_action(&mut self, player: PlayerId, action: Action) {
        if !self.running {
            return;
        }
        self.game.apply_action(player, action);
        self.sync_scores();
    }

    /// Request cancellation; honored at the next tick boundary
    pub fn stop(&mut self) {
        if self.running {
            log::debug!("{} game stopped by host", self.game.name());
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_terminal(&self) -> bool {
        self.game.is_terminal()
    }

    /// This game's totals, in seat order
    pub fn scores(&self) -> Vec<u32> {
        self.seats().map(|seat| self.game.score(seat)).collect()
    }

    fn seats(&self) -> impl Iterator<Item = PlayerId> {
        PlayerId::BOTH.into_iter().take(self.players.len())
    }

    pub fn take_events(&mut self) -> Vec<RulesEvent> {
        self.game.take_events()
    }

    /// Score records for the profile store, once the game ended or was stopped
    pub fn final_scores(&self) -> Option<Vec<FinalScore>> {
        if self.running && !self.game.is_terminal() {
            return None;
        }
        Some(
            self.players
                .iter()
                .zip(self.seats())
                .map(|(p, seat)| FinalScore {
                    player_name: p.name.clone(),
                    score: self.game.score(seat),
                })
                .collect(),
        )
    }

    fn sync_scores(&mut self) {
        for (idx, (player, synced)) in self.players.iter_mut().zip(&mut self.synced).enumerate() {
            let Some(seat) = PlayerId::from_index(idx) else {
                continue;
            };
            let total = self.game.score(seat);
            player.update_score(total.saturating_sub(*synced));
            *synced = total;
        }
    }
}

fn seat_count(players: &[Player]) -> u8 {
    u8::try_from(players.len()).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_arcade_core::types::ShapeId;

    fn roster(names: &[&str]) -> Vec<Player> {
        names.iter().map(|n| Player::new(*n)).collect()
    }

    #[test]
    fn test_roster_sets_player_count() {
        let session = ArcadeSession::falling(roster(&["ann", "bo"]), FallingConfig::default()).unwrap();
        assert_eq!(session.game().player_count(), 2);
        assert_eq!(session.scores(), vec![0, 0]);
        assert_eq!(session.game().name(), "falling");
    }

    #[test]
    fn test_empty_or_oversized_roster_is_rejected() {
        assert!(matches!(
            ArcadeSession::falling(vec![], FallingConfig::default()),
            Err(ConfigError::UnsupportedPlayers(0))
        ));
        assert!(matches!(
            ArcadeSession::merge(roster(&["a", "b", "c"]), MergeConfig::default(), ScriptedPhysics::new()),
            Err(ConfigError::UnsupportedPlayers(3))
        ));
    }

    #[test]
    fn test_final_scores_only_after_end() {
        let mut session = ArcadeSession::falling(roster(&["ann"]), FallingConfig::default()).unwrap();
        assert!(session.final_scores().is_none());

        session.stop();
        assert!(!session.is_running());
        let scores = session.final_scores().unwrap();
        assert_eq!(
            scores,
            vec![FinalScore {
                player_name: "ann".into(),
                score: 0
            }]
        );
        let json = serde_json::to_string(&scores[0]).unwrap();
        assert_eq!(json, r#"{"player_name":"ann","score":0}"#);
    }

    #[test]
    fn test_stopped_session_ignores_input() {
        let mut session = ArcadeSession::falling(roster(&["ann"]), FallingConfig::default()).unwrap();
        let before = session.game().as_falling().unwrap().active_blocks(PlayerId::One);
        session.stop();
        session.apply_action(PlayerId::One, Action::MoveLeft);
        session.tick(5000);
        let after = session.game().as_falling().unwrap().active_blocks(PlayerId::One);
        assert_eq!(before, after);
    }

    #[test]
    fn test_falling_session_runs_to_game_over() {
        let config = FallingConfig {
            shapes: vec!["O".into()],
            ..FallingConfig::default()
        };
        let mut session = ArcadeSession::falling(roster(&["ann"]), config).unwrap();
        for _ in 0..100 {
            if session.is_terminal() {
                break;
            }
            session.apply_action(PlayerId::One, Action::HardDrop);
        }
        assert!(session.is_terminal());
        assert!(session.is_running());
        assert!(session.final_scores().is_some());
        let shape = session.game().as_falling().unwrap().catalog().shapes()[0];
        assert_eq!(shape, ShapeId::O);
    }

    #[test]
    fn test_returning_player_keeps_prior_total() {
        let ann = Player {
            name: "ann".into(),
            score: 50,
        };
        let mut session = ArcadeSession::merge(vec![ann], MergeConfig::default(), ScriptedPhysics::new()).unwrap();
        let engine = session.game_mut().as_merge_mut().unwrap();
        let a = engine.place_body(PlayerId::One, 3, tile_arcade_core::Vec2::new(100.0, 500.0));
        let b = engine.place_body(PlayerId::One, 3, tile_arcade_core::Vec2::new(140.0, 500.0));
        let (sa, sb) = (engine.body(a).unwrap().shape, engine.body(b).unwrap().shape);
        engine.physics_mut().queue_collision(sa, sb);

        session.tick(16);
        // later ticks with no new points must not credit anything again
        session.tick(16);
        session.stop();

        assert_eq!(session.players()[0].score, 60);
        assert_eq!(session.scores(), vec![10]);
        assert_eq!(
            session.final_scores(),
            Some(vec![FinalScore {
                player_name: "ann".into(),
                score: 10
            }])
        );
    }

    #[test]
    fn test_merge_scores_reach_roster() {
        let mut session =
            ArcadeSession::merge(roster(&["ann"]), MergeConfig::default(), ScriptedPhysics::new()).unwrap();
        let engine = session.game_mut().as_merge_mut().unwrap();
        let a = engine.place_body(PlayerId::One, 3, tile_arcade_core::Vec2::new(100.0, 500.0));
        let b = engine.place_body(PlayerId::One, 3, tile_arcade_core::Vec2::new(140.0, 500.0));
        let (sa, sb) = (engine.body(a).unwrap().shape, engine.body(b).unwrap().shape);
        engine.physics_mut().queue_collision(sa, sb);

        session.tick(16);
        assert_eq!(session.scores(), vec![10]);
        assert_eq!(session.players()[0].score, 10);
        let events = session.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, RulesEvent::Merged { rank: 3, points: 10, .. })));
    }
}
