//! Merge-resolution engine - same-rank merges, chain impulses, drop turns
//!
//! The engine owns the set of live bodies and a lookup from physics shape to
//! body. Each `advance`:
//!
//! 1. counts down the drop cooldown and spawns the next preview when it ends
//! 2. refreshes body positions from the physics layer
//! 3. drains contact pairs and resolves them in order
//! 4. checks every side for overflow
//!
//! Resolving a pair latches `has_collided` on both bodies. Equal ranks merge:
//! both parents leave the live set and the simulation, one child of the next
//! rank (wrapping at the top rank) appears at their midpoint, nearby bodies get
//! a repulsion impulse, and the player holding the turn is credited. A parent
//! consumed earlier in the same batch no longer resolves, so each touching
//! pair merges at most once.
//!
//! A side overflows when one of its bodies sits above the overflow line after
//! having touched another body. Bodies that were only just released and
//! have not touched anything yet never count.

use std::collections::{BTreeMap, HashMap};

use arrayvec::ArrayVec;

use crate::config::{ConfigError, MergeConfig};
use crate::events::RulesEvent;
use crate::physics::{BodyId, PhysicsPort, ShapeHandle, Vec2};
use crate::pieces::{rank_name, rank_radius, rank_up};
use crate::rng::SimpleRng;
use crate::rules::RulesEngine;
use crate::scoring::ScoringLedger;
use crate::snapshot::{BodySnapshot, MergeSnapshot, PreviewSnapshot};
use crate::types::{Action, PlayerId, MERGE_EVENT};

/// Distances below this are treated as coincident during chain propagation
const COINCIDENT_EPSILON: f32 = 1e-3;

/// A live body in the field. A body is alive exactly while the engine holds
/// it; merged parents are dropped and only their ids survive in the event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub owner: PlayerId,
    pub rank: u8,
    pub position: Vec2,
    pub shape: ShapeHandle,
    pub has_collided: bool,
}

impl Body {
    pub fn radius(&self) -> f32 {
        rank_radius(self.rank)
    }

    fn snapshot(&self) -> BodySnapshot {
        BodySnapshot {
            id: self.id,
            owner: self.owner,
            rank: self.rank,
            position: self.position,
            radius: self.radius(),
            has_collided: self.has_collided,
        }
    }
}

/// The next body waiting to be released
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preview {
    pub owner: PlayerId,
    pub rank: u8,
    pub x: f32,
}

/// Merge rules engine over an external physics layer
#[derive(Debug)]
pub struct MergeResolutionEngine<P: PhysicsPort> {
    physics: P,
    config: MergeConfig,
    bodies: BTreeMap<BodyId, Body>,
    shape_to_body: HashMap<ShapeHandle, BodyId>,
    next_body_id: u32,
    preview: Option<Preview>,
    cooldown_ms: u32,
    active_player: PlayerId,
    ledgers: ArrayVec<ScoringLedger, 2>,
    side_terminal: [bool; 2],
    rng: SimpleRng,
    events: Vec<RulesEvent>,
}

impl<P: PhysicsPort> MergeResolutionEngine<P> {
    /// Build an engine and show the first preview to player one
    pub fn new(config: &MergeConfig, physics: P) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut ledgers = ArrayVec::new();
        for _ in 0..config.players {
            ledgers.push(ScoringLedger::new(config.scoring.clone()));
        }

        let mut engine = Self {
            physics,
            config: config.clone(),
            bodies: BTreeMap::new(),
            shape_to_body: HashMap::new(),
            next_body_id: 0,
            preview: None,
            cooldown_ms: 0,
            active_player: PlayerId::One,
            ledgers,
            side_terminal: [false; 2],
            rng: SimpleRng::new(config.seed),
            events: Vec::new(),
        };
        engine.spawn_preview();
        log::debug!(
            "merge engine ready: {} player(s), field {}x{}, overflow at y={}",
            config.players,
            config.width,
            config.height,
            config.overflow_line_y
        );
        Ok(engine)
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn preview(&self) -> Option<Preview> {
        self.preview
    }

    pub fn active_player(&self) -> PlayerId {
        self.active_player
    }

    pub fn cooldown_ms(&self) -> u32 {
        self.cooldown_ms
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Live bodies in creation order
    pub fn live_bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn live_count(&self) -> usize {
        self.bodies.len()
    }

    /// Body registered for a physics shape
    pub fn body_for_shape(&self, shape: ShapeHandle) -> Option<BodyId> {
        self.shape_to_body.get(&shape).copied()
    }

    pub fn ledger(&self, player: PlayerId) -> Option<&ScoringLedger> {
        self.ledgers.get(player.index())
    }

    pub fn side_terminal(&self, player: PlayerId) -> bool {
        player.index() < self.ledgers.len() && self.side_terminal[player.index()]
    }

    /// In a finished two-player game, the side that did not overflow
    pub fn winner(&self) -> Option<PlayerId> {
        if self.ledgers.len() != 2 {
            return None;
        }
        match (self.side_terminal[0], self.side_terminal[1]) {
            (true, false) => Some(PlayerId::Two),
            (false, true) => Some(PlayerId::One),
            _ => None,
        }
    }

    /// Horizontal strip a player's preview is confined to
    pub fn side_bounds(&self, player: PlayerId) -> (f32, f32) {
        if self.ledgers.len() == 1 {
            return (0.0, self.config.width);
        }
        let half = self.config.side_width();
        let min = half * player.index() as f32;
        (min, min + half)
    }

    fn clamp_x(&self, player: PlayerId, rank: u8, x: f32) -> f32 {
        let (min, max) = self.side_bounds(player);
        let r = rank_radius(rank);
        x.clamp(min + r, max - r)
    }

    pub fn snapshot(&self) -> MergeSnapshot {
        MergeSnapshot {
            bodies: self.bodies.values().map(Body::snapshot).collect(),
            preview: self.preview.map(|p| PreviewSnapshot {
                owner: p.owner,
                rank: p.rank,
                x: p.x,
            }),
            active_player: self.active_player,
            scores: self.ledgers.iter().map(ScoringLedger::total).collect(),
            side_terminal: self.side_terminal[..self.ledgers.len()].to_vec(),
            terminal: self.is_terminal(),
        }
    }

    /// Add a live body directly, outside the preview/turn protocol.
    ///
    /// Used by hosts to seed a field and by tests.
    pub fn place_body(&mut self, owner: PlayerId, rank: u8, position: Vec2) -> BodyId {
        assert!(
            rank <= crate::types::MAX_RANK,
            "rank {} exceeds the rank table",
            rank
        );
        let id = BodyId(self.next_body_id);
        self.next_body_id += 1;
        let shape = self.physics.add_body(position, rank_radius(rank));
        self.bodies.insert(
            id,
            Body {
                id,
                owner,
                rank,
                position,
                shape,
                has_collided: false,
            },
        );
        self.shape_to_body.insert(shape, id);
        id
    }

    fn remove_body(&mut self, id: BodyId) {
        if let Some(body) = self.bodies.remove(&id) {
            self.shape_to_body.remove(&body.shape);
            self.physics.remove_body(body.shape);
        }
    }

    fn spawn_preview(&mut self) {
        let player = self.active_player;
        let rank = self.rng.next_range(self.config.spawn_rank_max as u32 + 1) as u8;
        let (min, max) = self.side_bounds(player);
        self.preview = Some(Preview {
            owner: player,
            rank,
            x: (min + max) * 0.5,
        });
        log::trace!("{:?}: preview rank {}", player, rank);
    }

    fn move_preview(&mut self, to: impl FnOnce(f32) -> f32) {
        if let Some(preview) = self.preview {
            let x = self.clamp_x(preview.owner, preview.rank, to(preview.x));
            self.preview = Some(Preview { x, ..preview });
        }
    }

    /// Release the preview, start the cooldown and pass the turn
    fn release(&mut self) {
        let Some(preview) = self.preview.take() else {
            return;
        };
        let id = self.place_body(
            preview.owner,
            preview.rank,
            Vec2::new(preview.x, self.config.spawn_y),
        );
        self.cooldown_ms = self.config.drop_cooldown_ms;
        if self.ledgers.len() == 2 {
            self.active_player = self.active_player.other();
        }
        log::debug!(
            "{:?}: dropped {:?} rank {} at x={}",
            preview.owner,
            id,
            preview.rank,
            preview.x
        );
        self.events.push(RulesEvent::Dropped {
            player: preview.owner,
            body: id,
            rank: preview.rank,
        });
        if self.cooldown_ms == 0 {
            self.spawn_preview();
        }
    }

    /// Resolve one contact pair reported by the physics layer.
    ///
    /// Returns the merged child, if the pair merged.
    pub fn resolve_collision(&mut self, a: ShapeHandle, b: ShapeHandle) -> Option<BodyId> {
        let (Some(&a), Some(&b)) = (self.shape_to_body.get(&a), self.shape_to_body.get(&b)) else {
            return None;
        };
        if a == b {
            return None;
        }

        for id in [a, b] {
            if let Some(body) = self.bodies.get_mut(&id) {
                body.has_collided = true;
                if let Some(p) = self.physics.position(body.shape) {
                    body.position = p;
                }
            }
        }

        let (body_a, body_b) = (*self.bodies.get(&a)?, *self.bodies.get(&b)?);
        if body_a.rank != body_b.rank {
            return None;
        }
        Some(self.merge(body_a, body_b))
    }

    fn merge(&mut self, a: Body, b: Body) -> BodyId {
        self.remove_body(a.id);
        self.remove_body(b.id);

        let rank = rank_up(a.rank);
        let point = a.position.midpoint(b.position);
        let child = self.place_body(a.owner, rank, point);
        self.propagate_chain(child, point);

        let scorer = self.active_player;
        let weight = self.config.rank_points[a.rank as usize];
        let points = self
            .ledgers
            .get_mut(scorer.index())
            .map(|ledger| ledger.add_event(MERGE_EVENT, weight))
            .unwrap_or(0);

        log::debug!(
            "merged {:?}+{:?} ({}) into {:?} ({}), {} points to {:?}",
            a.id,
            b.id,
            rank_name(a.rank),
            child,
            rank_name(rank),
            points,
            scorer
        );
        self.events.push(RulesEvent::Merged {
            player: scorer,
            rank: a.rank,
            parents: [a.id, b.id],
            child,
            points,
        });
        child
    }

    /// Push bodies overlapping the merged child away from the merge point.
    ///
    /// Magnitude falls off with the square of the distance.
    fn propagate_chain(&mut self, child: BodyId, point: Vec2) {
        let Some(child_radius) = self.bodies.get(&child).map(Body::radius) else {
            return;
        };
        let strength = self.config.chain_impulse_strength;

        for body in self.bodies.values() {
            if body.id == child {
                continue;
            }
            let d = body.position.distance(point);
            if d >= body.radius() + child_radius {
                continue;
            }
            let direction = if d > COINCIDENT_EPSILON {
                (body.position - point).scale(1.0 / d)
            } else {
                Vec2::new(0.0, -1.0)
            };
            let magnitude = strength / d.max(1.0).powi(2);
            self.physics
                .apply_impulse(body.shape, direction.scale(magnitude));
        }
    }

    fn check_overflow(&mut self) {
        for player in PlayerId::BOTH.into_iter().take(self.ledgers.len()) {
            if self.side_terminal[player.index()] {
                continue;
            }
            let line = self.config.overflow_line_y;
            let overflowing = self
                .bodies
                .values()
                .any(|b| b.owner == player && b.has_collided && b.position.y < line);
            if overflowing {
                log::debug!("{:?}: body above the overflow line, side is over", player);
                self.side_terminal[player.index()] = true;
                self.events.push(RulesEvent::GameOver { player });
            }
        }
        if self.is_terminal() {
            self.preview = None;
        }
    }

    pub fn take_events(&mut self) -> Vec<RulesEvent> {
        std::mem::take(&mut self.events)
    }
}

impl<P: PhysicsPort> RulesEngine for MergeResolutionEngine<P> {
    fn advance(&mut self, dt_ms: u32) {
        if self.is_terminal() {
            return;
        }

        if self.cooldown_ms > 0 {
            self.cooldown_ms = self.cooldown_ms.saturating_sub(dt_ms);
            if self.cooldown_ms == 0 && self.preview.is_none() {
                self.spawn_preview();
            }
        }

        for body in self.bodies.values_mut() {
            if let Some(p) = self.physics.position(body.shape) {
                body.position = p;
            }
        }

        for (a, b) in self.physics.poll_collisions() {
            self.resolve_collision(a, b);
        }

        self.check_overflow();
    }

    fn apply_action(&mut self, player: PlayerId, action: Action) {
        if self.is_terminal() || player != self.active_player {
            return;
        }
        match action {
            Action::PointerMove(x) if x.is_finite() => self.move_preview(|_| x),
            Action::PointerMove(_) => {}
            Action::MoveLeft => {
                let step = self.config.pointer_step;
                self.move_preview(|x| x - step);
            }
            Action::MoveRight => {
                let step = self.config.pointer_step;
                self.move_preview(|x| x + step);
            }
            Action::Release => self.release(),
            Action::RotateCw | Action::SoftDrop | Action::HardDrop => {}
        }
    }

    fn is_terminal(&self) -> bool {
        self.side_terminal[..self.ledgers.len()].iter().any(|&t| t)
    }

    fn player_count(&self) -> usize {
        self.ledgers.len()
    }

    fn score(&self, player: PlayerId) -> u32 {
        self.ledger(player).map(ScoringLedger::total).unwrap_or(0)
    }

    fn take_events(&mut self) -> Vec<RulesEvent> {
        MergeResolutionEngine::take_events(self)
    }
}
