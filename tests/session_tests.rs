//! Session tests - host loop, roster sync and score hand-off

use tile_arcade::core::{FallingConfig, MergeConfig, Player, RulesEngine, ScriptedPhysics, Vec2};
use tile_arcade::engine::{ArcadeSession, FinalScore, Game};
use tile_arcade::types::{Action, PlayerId};

fn roster(names: &[&str]) -> Vec<Player> {
    names.iter().map(|n| Player::new(*n)).collect()
}

#[test]
fn test_falling_session_syncs_scores_to_roster() {
    let config = FallingConfig {
        width: 4,
        height: 8,
        shapes: vec!["I".into()],
        ..FallingConfig::default()
    };
    let mut session = ArcadeSession::falling(roster(&["ann", "bo"]), config).unwrap();

    session.apply_action(PlayerId::One, Action::HardDrop);
    session.apply_action(PlayerId::One, Action::HardDrop);
    session.apply_action(PlayerId::Two, Action::HardDrop);

    assert_eq!(session.scores(), vec![200, 100]);
    assert_eq!(session.players()[0].name, "ann");
    assert_eq!(session.players()[1].score, 100);
}

#[test]
fn test_tick_drives_gravity_until_stopped() {
    let mut session = ArcadeSession::falling(roster(&["ann"]), FallingConfig::default()).unwrap();
    let y = |s: &ArcadeSession| {
        s.game()
            .as_falling()
            .unwrap()
            .board(PlayerId::One)
            .unwrap()
            .active()
            .unwrap()
            .y
    };
    let y0 = y(&session);
    session.tick(1000);
    assert_eq!(y(&session), y0 + 1);

    session.stop();
    session.tick(1000);
    assert_eq!(y(&session), y0 + 1);
    assert!(!session.is_terminal());
}

#[test]
fn test_final_scores_after_game_over() {
    let config = FallingConfig {
        shapes: vec!["O".into()],
        ..FallingConfig::default()
    };
    let mut session = ArcadeSession::falling(roster(&["ann"]), config).unwrap();
    while !session.is_terminal() {
        assert!(session.final_scores().is_none());
        session.apply_action(PlayerId::One, Action::HardDrop);
    }
    assert_eq!(
        session.final_scores(),
        Some(vec![FinalScore {
            player_name: "ann".into(),
            score: 0
        }])
    );
}

#[test]
fn test_merge_session_alternates_turns() {
    let mut session = ArcadeSession::merge(
        roster(&["ann", "bo"]),
        MergeConfig::default(),
        ScriptedPhysics::new(),
    )
    .unwrap();

    session.apply_action(PlayerId::One, Action::Release);
    session.apply_action(PlayerId::One, Action::Release);
    let merge = session.game().as_merge().unwrap();
    assert_eq!(merge.live_count(), 1);
    assert_eq!(merge.active_player(), PlayerId::Two);

    session.tick(500);
    session.apply_action(PlayerId::Two, Action::Release);
    let merge = session.game().as_merge().unwrap();
    assert_eq!(merge.live_count(), 2);
    assert_eq!(merge.active_player(), PlayerId::One);
    let owners: Vec<_> = merge.live_bodies().map(|b| b.owner).collect();
    assert_eq!(owners, vec![PlayerId::One, PlayerId::Two]);
}

#[test]
fn test_merge_session_ends_on_overflow() {
    let mut session = ArcadeSession::merge(
        roster(&["ann", "bo"]),
        MergeConfig::default(),
        ScriptedPhysics::new(),
    )
    .unwrap();

    if let Game::Merge(engine) = session.game_mut() {
        let a = engine.place_body(PlayerId::Two, 0, Vec2::new(300.0, 20.0));
        let b = engine.place_body(PlayerId::Two, 1, Vec2::new(300.0, 44.0));
        let (sa, sb) = (engine.body(a).unwrap().shape, engine.body(b).unwrap().shape);
        engine.physics_mut().queue_collision(sa, sb);
    }
    session.tick(16);

    assert!(session.is_terminal());
    assert_eq!(session.game().as_merge().unwrap().winner(), Some(PlayerId::One));
    let names: Vec<_> = session
        .final_scores()
        .unwrap()
        .into_iter()
        .map(|s| s.player_name)
        .collect();
    assert_eq!(names, vec!["ann", "bo"]);

    // the finished game no longer advances
    session.tick(16);
    assert_eq!(session.game().player_count(), 2);
}
