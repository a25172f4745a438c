mod common;

use common::*;
use onemore_engine::{Action, ActionError, Catalog, CombatantSpec, Outcome};

const SUMMONS: &str = r#"{
  "summons": [
    { "id": "pixie", "name": "Pixie", "mp_cost": 10, "cooldown_turns": 2, "target": "all_allies",
      "effect": { "heal": { "flat": 30 } } },
    { "id": "wisp", "name": "Wisp", "cooldown_turns": 3,
      "persistent": { "duration_turns": 2, "max_hp": 50, "stats": { "attack": 10, "speed": 5 },
                      "dies_with_summoner": true } },
    { "id": "golem", "name": "Golem",
      "persistent": { "duration_turns": 5, "max_hp": 80, "stats": { "speed": 5 } } },
    { "id": "frost", "name": "Frost",
      "persistent": { "duration_turns": 3, "max_hp": 40,
                      "passive": { "damage": { "element": "ice", "amount": 15 } } } }
  ]
}"#;

fn catalog() -> Catalog {
    Catalog::from_json(SUMMONS).expect("summon catalog")
}

fn summoner(hp: i32, speed: i32) -> CombatantSpec {
    let mut joker = spec("joker", 100, stats(10, 0, 0, 0, speed));
    joker.hp = Some(hp);
    joker.max_mp = 20;
    joker.summons = vec!["pixie".into(), "wisp".into(), "golem".into(), "frost".into()];
    joker
}

#[test]
fn instant_summon_resolves_and_goes_on_cooldown() {
    let mut b = battle(
        vec![summoner(50, 50), spec("ann", 100, stats(10, 0, 0, 0, 20))],
        vec![spec("shadow", 500, stats(0, 0, 0, 0, 1))],
        catalog(),
        vec![0.99],
    );
    start(&mut b);

    let shown = act(&mut b, Action::summon("joker", "pixie", &[]));
    assert_eq!(shown.result.healing_done, 30);
    assert_eq!(hp(&b, "joker"), 80);
    assert_eq!(b.combatant("joker").expect("joker").health.mp, 10);
    assert_eq!(b.summon_cooldown("joker", "pixie"), 2);

    advance_to(&mut b, "joker");
    let err = b.submit(Action::summon("joker", "pixie", &[])).expect_err("cooling down");
    assert_eq!(
        err,
        ActionError::SummonOnCooldown {
            summon: "pixie".into(),
            turns: 1
        }
    );
}

#[test]
fn persistent_summon_joins_then_expires() {
    let mut b = battle(
        vec![summoner(100, 50)],
        vec![spec("shadow", 500, stats(0, 0, 0, 0, 1))],
        catalog(),
        vec![0.99],
    );
    start(&mut b);
    act(&mut b, Action::summon("joker", "wisp", &[]));

    let wisp = b.combatant("joker:wisp").expect("summon on the field");
    assert_eq!(wisp.summoned_by.as_deref(), Some("joker"));
    let called = b
        .log_lines()
        .iter()
        .find(|l| l.starts_with("[SUMMON]"))
        .expect("summon line");
    insta::assert_snapshot!(called, @"[SUMMON][joker] calls wisp as joker:wisp");

    let turn = advance_to(&mut b, "joker");
    assert_eq!(turn.round, 2);
    act(&mut b, Action::guard("joker"));
    assert_eq!(start(&mut b).actor, "joker:wisp");
    act(&mut b, Action::attack("joker:wisp", "shadow"));

    let turn = advance_to(&mut b, "joker");
    assert_eq!(turn.round, 3);
    assert!(b.combatant("joker:wisp").is_none());
    assert_eq!(lines_containing(&b, "[SUMMON][joker:wisp] leaves (Expired)"), 1);
}

#[test]
fn one_instance_per_summoner() {
    let mut b = battle(
        vec![summoner(100, 50)],
        vec![spec("shadow", 500, stats(0, 0, 0, 0, 1))],
        catalog(),
        vec![0.99],
    );
    start(&mut b);
    act(&mut b, Action::summon("joker", "golem", &[]));

    advance_to(&mut b, "joker");
    let err = b.submit(Action::summon("joker", "golem", &[])).expect_err("already out");
    assert_eq!(err, ActionError::SummonAlreadyActive("golem".into()));
}

#[test]
fn bound_summon_leaves_when_its_summoner_falls() {
    let mut b = battle(
        vec![summoner(10, 50), spec("ann", 100, stats(10, 0, 0, 0, 1))],
        vec![spec("shadow", 500, stats(100, 0, 0, 0, 10))],
        catalog(),
        vec![0.99],
    );
    start(&mut b);
    act(&mut b, Action::summon("joker", "wisp", &[]));

    assert_eq!(start(&mut b).actor, "shadow");
    act(&mut b, Action::attack("shadow", "joker"));
    assert!(b.combatant("joker:wisp").is_none());
    assert_eq!(lines_containing(&b, "[SUMMON][joker:wisp] leaves (SummonerFell)"), 1);
    assert_eq!(b.outcome(), None);
}

#[test]
fn summons_alone_do_not_keep_a_side_in_the_fight() {
    let mut b = battle(
        vec![summoner(10, 50)],
        vec![spec("shadow", 500, stats(100, 0, 0, 0, 10))],
        catalog(),
        vec![0.99],
    );
    start(&mut b);
    act(&mut b, Action::summon("joker", "golem", &[]));
    start(&mut b);
    act(&mut b, Action::attack("shadow", "joker"));

    assert!(b.combatant("joker:golem").is_some_and(|g| g.is_alive()));
    assert_eq!(b.outcome(), Some(Outcome::Defeat));
}

#[test]
fn passive_summon_damage_ticks_each_round() {
    let mut b = battle(
        vec![summoner(100, 50)],
        vec![spec("shadow", 500, stats(0, 0, 0, 0, 1))],
        catalog(),
        vec![0.99],
    );
    start(&mut b);
    act(&mut b, Action::summon("joker", "frost", &[]));
    start(&mut b);
    act(&mut b, Action::attack("shadow", "joker"));

    let turn = start(&mut b);
    assert_eq!(turn.round, 2);
    assert_eq!(hp(&b, "shadow"), 485);
    assert_eq!(lines_containing(&b, "[DMG][joker:frost] 15 → shadow [Ice] hp=485"), 1);
}
