//! Headless soak runner (default binary).
//!
//! Plays seeded games back to back with a pseudo-random action source and
//! prints one JSON line per game with the final score records.
//! Merge games run on `ScriptedPhysics`: bodies are stacked onto the floor
//! every tick and touching bodies are reported as contacts.
//!
//! Environment:
//! - `ARCADE_GAME`: `falling` (default) or `merge`
//! - `ARCADE_SEED`: first seed (default 1); game `i` uses `seed + i`
//! - `ARCADE_PLAYERS`: 1 or 2 (default 1)
//! - `ARCADE_GAMES`: number of games (default 10)
//! - `ARCADE_CONFIG`: optional path to a JSON engine config
//! - `RUST_LOG`: log filter

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use tile_arcade::core::{
    FallingConfig, MergeConfig, MergeResolutionEngine, PhysicsPort, Player, RulesEvent,
    ScriptedPhysics, ShapeHandle, SimpleRng, Vec2,
};
use tile_arcade::engine::{ArcadeSession, FinalScore};
use tile_arcade::types::{Action, PlayerId};

const TICK_MS: u32 = 16;
const MAX_TICKS: u32 = 100_000;
/// Gap under which two scripted bodies count as touching
const TOUCH_SLACK: f32 = 0.5;

const FALLING_ACTIONS: [Action; 5] = [
    Action::MoveLeft,
    Action::MoveRight,
    Action::RotateCw,
    Action::SoftDrop,
    Action::HardDrop,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum GameKind {
    Falling,
    Merge,
}

#[derive(Debug, Clone)]
struct SoakConfig {
    game: GameKind,
    seed: u32,
    players: u8,
    games: u32,
    config_path: Option<PathBuf>,
}

impl SoakConfig {
    fn from_env() -> Result<Self> {
        let game = match env::var("ARCADE_GAME").ok().as_deref() {
            None | Some("falling") => GameKind::Falling,
            Some("merge") => GameKind::Merge,
            Some(other) => bail!("ARCADE_GAME must be `falling` or `merge`, got {:?}", other),
        };
        let seed = env::var("ARCADE_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let players = env::var("ARCADE_PLAYERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let games = env::var("ARCADE_GAMES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        let config_path = env::var_os("ARCADE_CONFIG").map(PathBuf::from);

        Ok(Self {
            game,
            seed,
            players,
            games,
            config_path,
        })
    }

    fn read_config(&self) -> Result<Option<String>> {
        let Some(path) = &self.config_path else {
            return Ok(None);
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        Ok(Some(text))
    }

    fn roster(&self) -> Vec<Player> {
        (1..=self.players).map(|i| Player::new(format!("player{}", i))).collect()
    }
}

#[derive(Debug, Serialize)]
struct GameReport {
    game: GameKind,
    seed: u32,
    ticks: u32,
    /// True when the tick cap stopped the game before it ended
    stopped: bool,
    events: EventTally,
    scores: Vec<FinalScore>,
}

/// Counts of the events drained from a session, one pass per tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
struct EventTally {
    locks: u32,
    lines: u32,
    drops: u32,
    merges: u32,
}

impl EventTally {
    fn drain<P: PhysicsPort>(&mut self, session: &mut ArcadeSession<P>) {
        for event in session.take_events() {
            log::trace!("{:?}", event);
            match event {
                RulesEvent::Locked { .. } => self.locks += 1,
                RulesEvent::LinesCleared { lines, .. } => self.lines += lines as u32,
                RulesEvent::Dropped { .. } => self.drops += 1,
                RulesEvent::Merged { .. } => self.merges += 1,
                RulesEvent::Spawned { .. } | RulesEvent::GameOver { .. } => {}
            }
        }
    }
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_default_env().try_init();

    let soak = SoakConfig::from_env()?;
    let json = soak.read_config()?;
    log::info!(
        "soak: {} {:?} game(s) from seed {}",
        soak.games,
        soak.game,
        soak.seed
    );

    for i in 0..soak.games {
        let seed = soak.seed.wrapping_add(i);
        let report = match soak.game {
            GameKind::Falling => {
                let base = match &json {
                    Some(text) => FallingConfig::from_json_str(text)?,
                    None => FallingConfig::default(),
                };
                play_falling(FallingConfig { seed, ..base }, soak.roster())?
            }
            GameKind::Merge => {
                let base = match &json {
                    Some(text) => MergeConfig::from_json_str(text)?,
                    None => MergeConfig::default(),
                };
                play_merge(MergeConfig { seed, ..base }, soak.roster())?
            }
        };
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(())
}

fn play_falling(config: FallingConfig, roster: Vec<Player>) -> Result<GameReport> {
    let seed = config.seed;
    let mut session = ArcadeSession::falling(roster, config)?;
    let mut actions = SimpleRng::new(seed ^ 0x9e37_79b9);
    let mut tally = EventTally::default();

    let mut ticks = 0;
    while !session.is_terminal() && ticks < MAX_TICKS {
        falling_step(&mut session, &mut actions, &mut tally);
        ticks += 1;
    }
    finish(session, GameKind::Falling, seed, ticks, tally)
}

/// One random action per seat, one tick, then drain the event queue
fn falling_step(session: &mut ArcadeSession, actions: &mut SimpleRng, tally: &mut EventTally) {
    for seat in PlayerId::BOTH.into_iter().take(session.players().len()) {
        let pick = actions.next_range(FALLING_ACTIONS.len() as u32) as usize;
        session.apply_action(seat, FALLING_ACTIONS[pick]);
    }
    session.tick(TICK_MS);
    tally.drain(session);
}

fn play_merge(config: MergeConfig, roster: Vec<Player>) -> Result<GameReport> {
    let seed = config.seed;
    let mut session = ArcadeSession::merge(roster, config, ScriptedPhysics::new())?;
    let mut actions = SimpleRng::new(seed ^ 0x9e37_79b9);
    let mut tally = EventTally::default();

    let mut ticks = 0;
    while !session.is_terminal() && ticks < MAX_TICKS {
        merge_step(&mut session, &mut actions, &mut tally)?;
        ticks += 1;
    }
    finish(session, GameKind::Merge, seed, ticks, tally)
}

/// Drop at a random x when a preview is up, settle the field, tick, then
/// drain the event queue
fn merge_step(
    session: &mut ArcadeSession,
    actions: &mut SimpleRng,
    tally: &mut EventTally,
) -> Result<()> {
    let engine = session
        .game_mut()
        .as_merge_mut()
        .context("merge session without a merge engine")?;
    if engine.preview().is_some() {
        let seat = engine.active_player();
        let x = actions.next_f32() * engine.config().width;
        session.apply_action(seat, Action::PointerMove(x));
        session.apply_action(seat, Action::Release);
    }
    if let Some(engine) = session.game_mut().as_merge_mut() {
        settle(engine);
    }
    session.tick(TICK_MS);
    tally.drain(session);
    Ok(())
}

/// Stack every live body onto the floor in creation order and report the
/// resulting contacts to the scripted physics.
fn settle(engine: &mut MergeResolutionEngine<ScriptedPhysics>) {
    let floor = engine.config().height;
    let bodies: Vec<(ShapeHandle, f32, f32)> = engine
        .live_bodies()
        .map(|b| (b.shape, b.position.x, b.radius()))
        .collect();

    let mut settled: Vec<(ShapeHandle, Vec2, f32)> = Vec::with_capacity(bodies.len());
    for (shape, x, r) in bodies {
        let mut y = floor - r;
        for (_, p, r2) in &settled {
            let reach = r + r2;
            let dx = (x - p.x).abs();
            if dx < reach {
                y = y.min(p.y - (reach * reach - dx * dx).sqrt());
            }
        }
        settled.push((shape, Vec2::new(x, y), r));
    }

    let physics = engine.physics_mut();
    // only this tick's contacts matter; drop last tick's request log
    physics.clear_log();
    for (shape, position, _) in &settled {
        physics.set_position(*shape, *position);
    }
    for (i, (a, pa, ra)) in settled.iter().enumerate() {
        for (b, pb, rb) in &settled[i + 1..] {
            if pa.distance(*pb) <= ra + rb + TOUCH_SLACK {
                physics.queue_collision(*a, *b);
            }
        }
    }
}

fn finish<P: PhysicsPort>(
    mut session: ArcadeSession<P>,
    game: GameKind,
    seed: u32,
    ticks: u32,
    events: EventTally,
) -> Result<GameReport> {
    let stopped = !session.is_terminal();
    if stopped {
        log::warn!("seed {}: no game over after {} ticks, stopping", seed, ticks);
        session.stop();
    }
    let scores = session
        .final_scores()
        .context("session neither finished nor stopped")?;
    Ok(GameReport {
        game,
        seed,
        ticks,
        stopped,
        events,
        scores,
    })
}
