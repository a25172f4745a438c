mod common;

use common::*;
use onemore_engine::data::{LimitBreakDef, StatusInflict, TargetShape};
use onemore_engine::{Action, ActionError, BattleEvent, Catalog, CombatantSpec, Outcome, StatusKind};

fn limits() -> Catalog {
    let mut final_heaven = LimitBreakDef::new("final_heaven", 200.0);
    final_heaven.instant_kill_threshold = Some(0.25);

    let mut duet = LimitBreakDef::new("inferno_duet", 100.0);
    duet.duo_partner = Some("ann".into());
    duet.duo_bonus = 1.5;
    duet.ignores_defense = true;

    let mut stop = LimitBreakDef::new("stop_time", 50.0);
    stop.stop_time_turns = 2;
    stop.self_heal_percent = 20.0;
    stop.self_buffs = vec![StatusInflict::new(StatusKind::SpeedUp, 100.0, 3)];

    let mut cross = LimitBreakDef::new("cross_slash", 100.0);
    cross.target = TargetShape::AllEnemies;
    cross.grants_extra_turn = true;

    Catalog::new()
        .with_limit_break(final_heaven)
        .with_limit_break(duet)
        .with_limit_break(stop)
        .with_limit_break(cross)
}

fn joker(limit: &str) -> CombatantSpec {
    let mut joker = spec("joker", 200, stats(10, 0, 0, 0, 50));
    joker.limit_breaks = vec![limit.to_string()];
    joker
}

fn fill_gauge(b: &mut onemore_engine::Battle, id: &str) {
    b.combatant_mut(id).expect("combatant").flags.limit_gauge = 100.0;
}

#[test]
fn limit_break_requires_a_full_gauge() {
    let mut b = battle(
        vec![joker("final_heaven")],
        vec![spec("boss", 1000, stats(0, 0, 0, 0, 1))],
        limits(),
        vec![0.99],
    );
    start(&mut b);

    let err = b
        .submit(Action::limit_break("joker", "final_heaven", None, &["boss"]))
        .expect_err("gauge empty");
    assert_eq!(err, ActionError::LimitNotReady("joker".into()));
    assert_eq!(hp(&b, "boss"), 1000);
}

#[test]
fn instant_kill_below_threshold() {
    let mut boss = spec("boss", 1000, stats(0, 0, 0, 0, 1));
    boss.hp = Some(200);
    let mut b = battle(vec![joker("final_heaven")], vec![boss], limits(), vec![0.99]);
    fill_gauge(&mut b, "joker");
    start(&mut b);

    let shown = act(&mut b, Action::limit_break("joker", "final_heaven", None, &["boss"]));
    assert!(shown.result.flags.instant_kill);
    assert!(shown.result.flags.killed);
    assert_eq!(shown.result.damage_dealt, 200);
    assert_eq!(hp(&b, "boss"), 0);
    assert_eq!(b.combatant("joker").expect("joker").flags.limit_gauge, 0.0);
    assert_eq!(b.outcome(), Some(Outcome::Victory));

    let line = shown
        .events
        .iter()
        .find(|e| matches!(e, BattleEvent::LimitBreak { .. }))
        .map(|e| e.to_string())
        .expect("limit event");
    insta::assert_snapshot!(line, @"[LIMIT][joker] final_heaven");
}

#[test]
fn duo_limit_needs_both_gauges() {
    let mut b = battle(
        vec![joker("inferno_duet"), spec("ann", 200, stats(10, 0, 0, 0, 20))],
        vec![spec("boss", 1000, stats(0, 40, 0, 0, 1))],
        limits(),
        vec![0.99],
    );
    fill_gauge(&mut b, "joker");
    start(&mut b);

    let err = b
        .submit(Action::limit_break("joker", "inferno_duet", Some("ann"), &["boss"]))
        .expect_err("partner gauge empty");
    assert_eq!(err, ActionError::DuoPartnerNotReady("ann".into()));
    assert_eq!(b.combatant("joker").expect("joker").flags.limit_gauge, 100.0);

    fill_gauge(&mut b, "ann");
    let shown = act(&mut b, Action::limit_break("joker", "inferno_duet", Some("ann"), &["boss"]));
    // (100 + 2 * 10) * 1.5, defense ignored.
    assert_eq!(shown.result.damage_dealt, 180);
    assert_eq!(b.combatant("ann").expect("ann").flags.limit_gauge, 0.0);
    assert_eq!(lines_containing(&b, "[LIMIT][joker+ann] inferno_duet"), 1);
}

#[test]
fn stop_time_skips_enemy_turns_and_buffs_the_user() {
    let mut hurt = joker("stop_time");
    hurt.hp = Some(100);
    let mut b = battle(
        vec![hurt],
        vec![
            spec("e1", 500, stats(0, 0, 0, 0, 10)),
            spec("e2", 500, stats(0, 0, 0, 0, 5)),
        ],
        limits(),
        vec![0.99],
    );
    fill_gauge(&mut b, "joker");
    start(&mut b);

    let shown = act(&mut b, Action::limit_break("joker", "stop_time", None, &["e1"]));
    assert_eq!(shown.result.damage_dealt, 70);
    assert_eq!(hp(&b, "joker"), 140);
    assert!(b.combatant("joker").expect("joker").has_status(StatusKind::SpeedUp));

    let turn = start(&mut b);
    assert_eq!(turn.actor, "joker");
    assert_eq!(turn.round, 2);
    assert_eq!(lines_containing(&b, "skipped (TimeStopped)"), 2);

    act(&mut b, Action::guard("joker"));
    assert_eq!(start(&mut b).actor, "e1");
}

#[test]
fn cross_slash_grants_an_extra_turn() {
    let mut b = battle(
        vec![joker("cross_slash")],
        vec![spec("e1", 500, stats(0, 0, 0, 0, 1))],
        limits(),
        vec![0.99],
    );
    fill_gauge(&mut b, "joker");
    start(&mut b);

    let shown = act(&mut b, Action::limit_break("joker", "cross_slash", None, &[]));
    assert!(shown.result.extra_turn_granted);
    assert!(start(&mut b).bonus);
}

#[test]
fn damage_fills_the_gauge() {
    let mut b = battle(
        vec![spec("joker", 500, stats(0, 0, 0, 0, 1))],
        vec![spec("brute", 500, stats(100, 0, 0, 0, 50))],
        Catalog::new(),
        vec![0.99],
    );
    assert_eq!(start(&mut b).actor, "brute");
    act(&mut b, Action::attack("brute", "joker"));

    // 100 damage taken at 0.8 per point, 100 dealt at 0.2 per point.
    assert_eq!(b.combatant("joker").expect("joker").flags.limit_gauge, 80.0);
    assert_eq!(b.combatant("brute").expect("brute").flags.limit_gauge, 20.0);
}
