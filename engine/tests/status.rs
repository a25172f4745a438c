mod common;

use common::*;
use onemore_engine::data::{SkillDef, StatusInflict, TargetShape};
use onemore_engine::status::{ApplyOutcome, Remaining};
use onemore_engine::{
    Action, ActionError, BattleEvent, Catalog, Combatant, Dice, Element, Side, StatusKind, StatusManager,
};

fn dummy(resist: f64) -> Combatant {
    let mut spec = spec("dummy", 100, stats(20, 20, 20, 20, 10));
    if resist > 0.0 {
        spec.status_resist.insert(StatusKind::Poison, resist);
    }
    spec.to_combatant(Side::Enemy)
}

#[test]
fn applied_status_expires_after_its_duration() {
    let statuses = StatusManager::new();
    let mut c = dummy(0.0);
    let mut dice = Dice::from_scripted(vec![0.5]);

    let outcome = statuses.apply_status(&mut c, StatusKind::Poison, 3, 0, "src", &mut dice);
    assert_eq!(outcome, ApplyOutcome::Applied);
    statuses.tick(&mut c, false);
    statuses.tick(&mut c, false);
    assert!(c.has_status(StatusKind::Poison));

    let report = statuses.tick(&mut c, false);
    assert_eq!(report.expired, vec![StatusKind::Poison]);
    assert!(!c.has_status(StatusKind::Poison));

    let line = BattleEvent::StatusExpired {
        target: c.id.clone(),
        kind: report.expired[0],
    }
    .to_string();
    insta::assert_snapshot!(line, @"[COND][dummy] is no longer Poison");
}

#[test]
fn reapplying_refreshes_the_single_instance() {
    let statuses = StatusManager::new();
    let mut c = dummy(0.0);
    let mut dice = Dice::from_scripted(vec![0.5]);

    statuses.apply_status(&mut c, StatusKind::Poison, 3, 0, "src", &mut dice);
    statuses.tick(&mut c, false);
    let again = statuses.apply_status(&mut c, StatusKind::Poison, 3, 0, "src", &mut dice);

    assert_eq!(again, ApplyOutcome::Refreshed);
    assert_eq!(c.statuses.len(), 1);
    assert_eq!(c.status(StatusKind::Poison).map(|s| s.remaining), Some(Remaining::Turns(3)));
}

#[test]
fn resistance_roll_blocks_application() {
    let statuses = StatusManager::new();
    let mut c = dummy(60.0);

    let mut lucky = Dice::from_scripted(vec![0.5]);
    assert_eq!(
        statuses.apply_status(&mut c, StatusKind::Poison, 3, 0, "src", &mut lucky),
        ApplyOutcome::Resisted
    );
    let mut unlucky = Dice::from_scripted(vec![0.7]);
    assert_eq!(
        statuses.apply_status(&mut c, StatusKind::Poison, 3, 0, "src", &mut unlucky),
        ApplyOutcome::Applied
    );
}

#[test]
fn indefinite_status_survives_ticks_until_cured() {
    let statuses = StatusManager::new();
    let mut c = dummy(0.0);
    statuses.force_status(&mut c, StatusKind::Silence, -1, 0, "src");
    for _ in 0..10 {
        statuses.tick(&mut c, false);
    }
    assert!(c.has_status(StatusKind::Silence));
    assert_eq!(statuses.cure(&mut c, &[StatusKind::Silence]), vec![StatusKind::Silence]);
    assert!(c.statuses.is_empty());
}

#[test]
fn stat_modifiers_feed_effective_stats() {
    let statuses = StatusManager::new();
    let mut c = dummy(0.0);
    statuses.force_status(&mut c, StatusKind::AttackUp, 3, 0, "src");
    statuses.force_status(&mut c, StatusKind::DefenseDown, 3, 0, "src");

    let eff = c.effective_stats();
    assert_eq!(eff.attack, 25);
    assert_eq!(eff.defense, 15);
    assert_eq!(c.base.attack, 20);

    let removed = statuses.cure_debuffs(&mut c);
    assert_eq!(removed, vec![StatusKind::DefenseDown]);
    assert!(c.has_status(StatusKind::AttackUp));
}

#[test]
fn periodic_damage_ticks_at_turn_start() {
    let statuses = StatusManager::new();
    let mut c = dummy(0.0);
    statuses.force_status(&mut c, StatusKind::Poison, 3, 0, "src");

    let report = statuses.tick(&mut c, true);
    assert_eq!(report.damaged, vec![(StatusKind::Poison, 8)]);
    assert_eq!(c.health.hp, 92);
    assert_eq!(c.status(StatusKind::Poison).map(|s| s.remaining), Some(Remaining::Turns(3)));
}

#[test]
fn poison_can_kill_before_the_turn() {
    let mut victim = spec("victim", 100, stats(0, 0, 0, 0, 50));
    victim.hp = Some(5);
    let mut b = battle(
        vec![spec("joker", 100, stats(10, 0, 0, 0, 10))],
        vec![victim, spec("other", 100, stats(0, 0, 0, 0, 1))],
        Catalog::new(),
        vec![0.99],
    );
    StatusManager::new().force_status(b.combatant_mut("victim").expect("victim"), StatusKind::Poison, 3, 0, "joker");

    let turn = start(&mut b);
    assert_eq!(turn.actor, "joker");
    assert!(!b.combatant("victim").expect("victim").is_alive());
    assert_eq!(lines_containing(&b, "[TURN][victim] skipped (Dead)"), 1);
}

#[test]
fn sleeping_combatants_lose_their_turn() {
    let mut b = battle(
        vec![spec("joker", 100, stats(10, 0, 0, 0, 10))],
        vec![spec("shadow", 100, stats(0, 0, 0, 0, 50))],
        Catalog::new(),
        vec![0.99],
    );
    StatusManager::new().force_status(b.combatant_mut("shadow").expect("shadow"), StatusKind::Sleep, 1, 0, "joker");

    assert_eq!(start(&mut b).actor, "joker");
    assert_eq!(lines_containing(&b, "[TURN][shadow] skipped (Incapacitated)"), 1);
}

#[test]
fn silence_blocks_skills_but_not_attacks() {
    let mut joker = spec("joker", 100, stats(10, 0, 50, 0, 10));
    joker.skills = vec!["agi".into()];
    let mut b = battle(
        vec![joker],
        vec![spec("shadow", 100, stats(0, 0, 0, 0, 1))],
        Catalog::new().with_skill(SkillDef::damage("agi", Element::Fire, 100.0)),
        vec![0.99],
    );
    StatusManager::new().force_status(b.combatant_mut("joker").expect("joker"), StatusKind::Silence, 2, 0, "shadow");
    start(&mut b);

    let err = b.submit(Action::skill("joker", "agi", &["shadow"])).expect_err("silenced");
    assert_eq!(err, ActionError::Silenced("joker".into()));
    act(&mut b, Action::attack("joker", "shadow"));
}

#[test]
fn support_skill_rolls_inflict_then_resistance() {
    let dormina = SkillDef::support(
        "dormina",
        TargetShape::SingleEnemy,
        vec![StatusInflict::new(StatusKind::Sleep, 50.0, 2)],
    );
    let mut joker = spec("joker", 100, stats(10, 0, 50, 0, 10));
    joker.skills = vec!["dormina".into()];
    let mut b = battle(
        vec![joker],
        vec![spec("shadow", 100, stats(0, 0, 0, 0, 1))],
        Catalog::new().with_skill(dormina),
        vec![0.4],
    );
    start(&mut b);

    let shown = act(&mut b, Action::skill("joker", "dormina", &["shadow"]));
    assert_eq!(shown.result.outcomes[0].statuses_applied, vec![StatusKind::Sleep]);
    assert!(b.combatant("shadow").expect("shadow").has_status(StatusKind::Sleep));
}
