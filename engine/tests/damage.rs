mod common;

use common::*;
use onemore_engine::data::{FixedDamage, ItemDef, SkillDef, TargetShape};
use onemore_engine::element::{Affinity, Element};
use onemore_engine::{Action, BattleConfig, BattleEvent, Catalog, Inventory, StatusKind, StatusManager};

fn fire_catalog() -> Catalog {
    Catalog::new()
        .with_skill(SkillDef::damage("agi", Element::Fire, 100.0))
        .with_skill(SkillDef::damage("garu", Element::Wind, 100.0))
        .with_skill(SkillDef::damage("frei", Element::Nuclear, 100.0))
}

fn caster() -> onemore_engine::CombatantSpec {
    let mut joker = spec("joker", 200, stats(50, 0, 100, 0, 10));
    joker.skills = vec!["agi".into(), "garu".into(), "frei".into()];
    joker
}

fn affinity_target(affinity: Affinity) -> onemore_engine::CombatantSpec {
    let mut shadow = spec("shadow", 300, stats(0, 0, 0, 0, 1));
    shadow.hp = Some(100);
    shadow.affinities.insert(Element::Fire, affinity);
    shadow
}

#[test]
fn basic_attack_uses_simple_formula() {
    let mut b = battle(
        vec![spec("joker", 100, stats(50, 0, 0, 0, 10))],
        vec![spec("shadow", 100, stats(0, 20, 0, 0, 1))],
        Catalog::new(),
        vec![0.99],
    );
    assert_eq!(start(&mut b).actor, "joker");

    let shown = act(&mut b, Action::attack("joker", "shadow"));
    assert_eq!(shown.result.damage_dealt, 40);
    assert!(!shown.result.flags.critical);
    assert!(!shown.result.extra_turn_granted);
    assert_eq!(hp(&b, "shadow"), 60);

    let line = shown
        .events
        .iter()
        .find(|e| matches!(e, BattleEvent::Damage { .. }))
        .map(|e| e.to_string())
        .expect("damage event");
    insta::assert_snapshot!(line, @"[DMG][joker] 40 → shadow [Physical] hp=60");
}

#[test]
fn weakness_knocks_down_and_grants_one_more() {
    let mut b = battle(
        vec![caster()],
        vec![weak_to(spec("shadow", 300, stats(0, 0, 0, 0, 1)), Element::Fire)],
        fire_catalog(),
        vec![0.99],
    );
    start(&mut b);

    let shown = act(&mut b, Action::skill("joker", "agi", &["shadow"]));
    assert_eq!(shown.result.damage_dealt, 150);
    assert!(shown.result.flags.hit_weakness);
    assert!(shown.result.flags.caused_knockdown);
    assert!(shown.result.extra_turn_granted);
    assert!(b.combatant("shadow").expect("shadow").flags.knocked_down);
    assert!(b.all_out_attack_available());

    let bonus = start(&mut b);
    assert_eq!(bonus.actor, "joker");
    assert!(bonus.bonus);
}

#[test]
fn critical_hit_multiplies_and_knocks_down() {
    let mut b = battle(
        vec![spec("joker", 100, stats(50, 0, 0, 0, 10))],
        vec![spec("shadow", 200, stats(0, 20, 0, 0, 1))],
        Catalog::new(),
        vec![0.0],
    );
    start(&mut b);

    let shown = act(&mut b, Action::attack("joker", "shadow"));
    assert!(shown.result.flags.critical);
    assert_eq!(shown.result.damage_dealt, 60);
    assert!(shown.result.flags.caused_knockdown);
    assert!(shown.result.extra_turn_granted);
}

#[test]
fn missed_skill_deals_nothing() {
    let mut shaky = SkillDef::damage("agi", Element::Fire, 100.0);
    shaky.accuracy = 50.0;
    let mut b = battle(
        vec![caster()],
        vec![spec("shadow", 300, stats(0, 0, 0, 0, 1))],
        Catalog::new().with_skill(shaky),
        vec![0.9],
    );
    start(&mut b);

    let shown = act(&mut b, Action::skill("joker", "agi", &["shadow"]));
    assert!(shown.result.flags.missed);
    assert_eq!(shown.result.damage_dealt, 0);
    assert_eq!(hp(&b, "shadow"), 300);
    assert_eq!(lines_containing(&b, "[MISS][joker] misses shadow"), 1);
}

#[test]
fn resisted_hit_is_halved_without_knockdown() {
    let mut b = battle(
        vec![caster()],
        vec![affinity_target(Affinity::Resist)],
        fire_catalog(),
        vec![0.99],
    );
    start(&mut b);

    let shown = act(&mut b, Action::skill("joker", "agi", &["shadow"]));
    assert_eq!(shown.result.damage_dealt, 50);
    assert!(shown.result.flags.resisted);
    assert!(!shown.result.flags.caused_knockdown);
}

#[test]
fn null_absorb_and_reflect_move_hp_the_right_way() {
    let mut nulled = battle(vec![caster()], vec![affinity_target(Affinity::Null)], fire_catalog(), vec![0.99]);
    start(&mut nulled);
    let shown = act(&mut nulled, Action::skill("joker", "agi", &["shadow"]));
    assert!(shown.result.flags.nullified);
    assert_eq!(hp(&nulled, "shadow"), 100);

    let mut absorbed = battle(vec![caster()], vec![affinity_target(Affinity::Absorb)], fire_catalog(), vec![0.99]);
    start(&mut absorbed);
    let shown = act(&mut absorbed, Action::skill("joker", "agi", &["shadow"]));
    assert!(shown.result.flags.absorbed);
    assert_eq!(shown.result.healing_done, 0);
    assert_eq!(hp(&absorbed, "shadow"), 200);

    let mut reflected = battle(vec![caster()], vec![affinity_target(Affinity::Reflect)], fire_catalog(), vec![0.99]);
    start(&mut reflected);
    let shown = act(&mut reflected, Action::skill("joker", "agi", &["shadow"]));
    assert!(shown.result.flags.reflected);
    assert_eq!(hp(&reflected, "shadow"), 100);
    assert_eq!(hp(&reflected, "joker"), 100);
}

#[test]
fn technical_bonus_and_nuclear_consumes_burn() {
    let mut b = battle(
        vec![caster()],
        vec![spec("shadow", 1000, stats(0, 0, 0, 0, 1))],
        fire_catalog(),
        vec![0.99],
    );
    let statuses = StatusManager::new();
    statuses.force_status(b.combatant_mut("shadow").expect("shadow"), StatusKind::Burn, 5, 0, "test");

    start(&mut b);
    let wind = act(&mut b, Action::skill("joker", "garu", &["shadow"]));
    assert!(wind.result.flags.technical);
    assert_eq!(wind.result.damage_dealt, 150);
    assert!(b.combatant("shadow").expect("shadow").has_status(StatusKind::Burn));

    advance_to(&mut b, "joker");
    let nuke = act(&mut b, Action::skill("joker", "frei", &["shadow"]));
    assert!(nuke.result.flags.technical);
    assert!(!b.combatant("shadow").expect("shadow").has_status(StatusKind::Burn));
}

#[test]
fn charge_is_spent_on_the_next_physical_hit() {
    let mut b = battle(
        vec![spec("joker", 100, stats(50, 0, 0, 0, 10))],
        vec![spec("shadow", 500, stats(0, 20, 0, 0, 1))],
        Catalog::new(),
        vec![0.99],
    );
    let statuses = StatusManager::new();
    statuses.force_status(b.combatant_mut("joker").expect("joker"), StatusKind::Charge, -1, 0, "joker");

    start(&mut b);
    let shown = act(&mut b, Action::attack("joker", "shadow"));
    assert_eq!(shown.result.damage_dealt, 100);
    assert!(!b.combatant("joker").expect("joker").has_status(StatusKind::Charge));
}

#[test]
fn multi_target_weakness_grants_a_single_one_more() {
    let maragi = SkillDef::damage("maragi", Element::Fire, 100.0).with_target(TargetShape::AllEnemies);
    let mut joker = spec("joker", 200, stats(0, 0, 100, 0, 10));
    joker.skills = vec!["maragi".into()];
    let enemies = ["a", "b", "c"]
        .iter()
        .map(|id| weak_to(spec(id, 300, stats(0, 0, 0, 0, 1)), Element::Fire))
        .collect();
    let mut b = battle(vec![joker], enemies, Catalog::new().with_skill(maragi), vec![0.99]);
    start(&mut b);

    let shown = act(&mut b, Action::skill("joker", "maragi", &[]));
    let one_mores = shown
        .events
        .iter()
        .filter(|e| matches!(e, BattleEvent::OneMore { .. }))
        .count();
    assert_eq!(one_mores, 1);
    assert_eq!(shown.result.outcomes.len(), 3);
    assert!(shown.result.outcomes.iter().all(|o| o.flags.caused_knockdown));
}

#[test]
fn thrown_item_skips_the_formula() {
    let molotov = ItemDef {
        target: TargetShape::SingleEnemy,
        heal: None,
        damage: Some(FixedDamage {
            element: Element::Fire,
            amount: 60,
        }),
        ..ItemDef::potion("molotov", 0)
    };
    let mut b = battle_with(
        vec![spec("joker", 100, stats(10, 0, 0, 0, 10))],
        vec![weak_to(spec("shadow", 300, stats(0, 99, 0, 99, 1)), Element::Fire)],
        Catalog::new().with_item(molotov),
        Inventory::new().with("molotov", 2),
        BattleConfig::default(),
        vec![0.0],
    );
    start(&mut b);

    let shown = act(&mut b, Action::item("joker", "molotov", &["shadow"]));
    assert_eq!(shown.result.damage_dealt, 90);
    assert!(!shown.result.flags.critical);
    assert_eq!(b.inventory().count("molotov"), 1);
}

#[test]
fn killing_a_weak_target_grants_no_one_more() {
    let mut b = battle(
        vec![caster()],
        vec![
            weak_to(spec("shadow", 100, stats(0, 0, 0, 0, 1)), Element::Fire),
            spec("pixie", 300, stats(0, 0, 0, 0, 1)),
        ],
        fire_catalog(),
        vec![0.99],
    );
    start(&mut b);

    let shown = act(&mut b, Action::skill("joker", "agi", &["shadow"]));
    assert!(shown.result.flags.hit_weakness);
    assert!(shown.result.flags.killed);
    assert!(!shown.result.flags.caused_knockdown);
    assert!(!shown.result.extra_turn_granted);
    assert!(!shown.events.iter().any(|e| matches!(e, BattleEvent::OneMore { .. })));
    assert_ne!(start(&mut b).actor, "joker");
}
