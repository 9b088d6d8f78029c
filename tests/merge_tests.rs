//! Merge engine tests - drops, merge chains and overflow through the public API

use tile_arcade::core::{
    MergeConfig, MergeResolutionEngine, RulesEngine, RulesEvent, ScriptedPhysics, Vec2,
};
use tile_arcade::types::{Action, PlayerId, MAX_RANK, RANK_POINTS};

type Engine = MergeResolutionEngine<ScriptedPhysics>;

fn engine_with(config: MergeConfig) -> Engine {
    MergeResolutionEngine::new(&config, ScriptedPhysics::new()).unwrap()
}

fn collide(engine: &mut Engine, a: tile_arcade::core::BodyId, b: tile_arcade::core::BodyId) {
    let sa = engine.body(a).unwrap().shape;
    let sb = engine.body(b).unwrap().shape;
    engine.physics_mut().queue_collision(sa, sb);
}

#[test]
fn test_merge_chain_across_ticks() {
    let mut engine = engine_with(MergeConfig::default());
    let a = engine.place_body(PlayerId::One, 0, Vec2::new(100.0, 580.0));
    let b = engine.place_body(PlayerId::One, 0, Vec2::new(120.0, 580.0));
    let c = engine.place_body(PlayerId::One, 1, Vec2::new(140.0, 570.0));

    collide(&mut engine, a, b);
    engine.advance(16);
    assert_eq!(engine.live_count(), 2);
    let child = engine
        .live_bodies()
        .find(|body| body.id != c)
        .map(|body| body.id)
        .unwrap();
    assert_eq!(engine.body(child).unwrap().rank, 1);

    collide(&mut engine, child, c);
    engine.advance(16);
    assert_eq!(engine.live_count(), 1);
    assert_eq!(engine.live_bodies().next().unwrap().rank, 2);
    assert_eq!(engine.score(PlayerId::One), RANK_POINTS[0] + RANK_POINTS[1]);

    let merged: Vec<_> = engine
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            RulesEvent::Merged { rank, points, .. } => Some((rank, points)),
            _ => None,
        })
        .collect();
    assert_eq!(merged, vec![(0, 1), (1, 3)]);
}

#[test]
fn test_top_rank_merge_wraps_and_scores() {
    let mut engine = engine_with(MergeConfig::default());
    let a = engine.place_body(PlayerId::One, MAX_RANK, Vec2::new(100.0, 500.0));
    let b = engine.place_body(PlayerId::One, MAX_RANK, Vec2::new(220.0, 500.0));
    collide(&mut engine, a, b);
    engine.advance(16);

    let child = engine.live_bodies().next().unwrap();
    assert_eq!(child.rank, 0);
    assert_eq!(child.position, Vec2::new(160.0, 500.0));
    assert!(!child.has_collided);
    assert_eq!(engine.score(PlayerId::One), RANK_POINTS[MAX_RANK as usize]);
}

#[test]
fn test_custom_rank_points_table() {
    let mut engine = engine_with(MergeConfig {
        rank_points: vec![2, 4, 8, 16, 32, 64, 128, 256, 512],
        ..MergeConfig::default()
    });
    let a = engine.place_body(PlayerId::One, 4, Vec2::new(100.0, 500.0));
    let b = engine.place_body(PlayerId::One, 4, Vec2::new(150.0, 500.0));
    collide(&mut engine, a, b);
    engine.advance(16);
    assert_eq!(engine.score(PlayerId::One), 32);
}

#[test]
fn test_cooldown_gates_next_preview() {
    let mut engine = engine_with(MergeConfig {
        drop_cooldown_ms: 100,
        ..MergeConfig::default()
    });
    engine.apply_action(PlayerId::One, Action::Release);
    assert!(engine.preview().is_none());
    assert_eq!(engine.cooldown_ms(), 100);

    engine.advance(99);
    assert!(engine.preview().is_none());
    engine.advance(1);
    assert!(engine.preview().is_some());

    engine.apply_action(PlayerId::One, Action::Release);
    assert_eq!(engine.live_count(), 2);
}

#[test]
fn test_nudges_move_preview_by_step() {
    let mut engine = engine_with(MergeConfig {
        spawn_rank_max: 0,
        ..MergeConfig::default()
    });
    let x0 = engine.preview().unwrap().x;
    engine.apply_action(PlayerId::One, Action::MoveLeft);
    assert_eq!(engine.preview().unwrap().x, x0 - 10.0);
    engine.apply_action(PlayerId::One, Action::MoveRight);
    engine.apply_action(PlayerId::One, Action::MoveRight);
    assert_eq!(engine.preview().unwrap().x, x0 + 10.0);

    // non-merge actions are ignored
    engine.apply_action(PlayerId::One, Action::RotateCw);
    engine.apply_action(PlayerId::One, Action::HardDrop);
    assert_eq!(engine.preview().unwrap().x, x0 + 10.0);
    assert_eq!(engine.live_count(), 0);
}

#[test]
fn test_dropped_body_owned_by_dropper() {
    let mut engine = engine_with(MergeConfig {
        players: 2,
        ..MergeConfig::default()
    });
    engine.apply_action(PlayerId::One, Action::Release);
    let body = *engine.live_bodies().next().unwrap();
    assert_eq!(body.owner, PlayerId::One);
    assert!(body.position.x < 200.0);

    let events = engine.take_events();
    assert_eq!(
        events,
        vec![RulesEvent::Dropped {
            player: PlayerId::One,
            body: body.id,
            rank: body.rank
        }]
    );
}

#[test]
fn test_two_player_overflow_ends_match() {
    let mut engine = engine_with(MergeConfig {
        players: 2,
        ..MergeConfig::default()
    });
    let a = engine.place_body(PlayerId::One, 0, Vec2::new(50.0, 90.0));
    let b = engine.place_body(PlayerId::One, 5, Vec2::new(60.0, 140.0));
    collide(&mut engine, a, b);
    engine.advance(16);

    assert!(engine.is_terminal());
    assert!(engine.side_terminal(PlayerId::One));
    assert!(!engine.side_terminal(PlayerId::Two));
    assert_eq!(engine.winner(), Some(PlayerId::Two));

    let snapshot = engine.snapshot();
    assert!(snapshot.terminal);
    assert_eq!(snapshot.side_terminal, vec![true, false]);
    assert!(snapshot.preview.is_none());
}

#[test]
fn test_snapshot_lists_bodies_in_creation_order() {
    let mut engine = engine_with(MergeConfig::default());
    let a = engine.place_body(PlayerId::One, 2, Vec2::new(100.0, 500.0));
    let b = engine.place_body(PlayerId::One, 6, Vec2::new(300.0, 500.0));
    let snapshot = engine.snapshot();
    let ids: Vec<_> = snapshot.bodies.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![a, b]);
    assert_eq!(snapshot.bodies[1].radius, 44.0);
    assert_eq!(snapshot.scores, vec![0]);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["bodies"][0]["rank"], 2);
    assert_eq!(json["active_player"], "One");
}
