mod common;

use common::*;
use onemore_engine::combat::actions::StolenLoot;
use onemore_engine::data::{EnemyRewards, GoldSteal, LootEntry};
use onemore_engine::steal::steal_chance;
use onemore_engine::{Action, ActionError, Catalog, CombatantSpec, Outcome};

fn mark(hp: i32) -> CombatantSpec {
    let mut mark = spec("mark", hp, stats(0, 0, 0, 0, 1));
    mark.rewards = Some(EnemyRewards {
        exp: 40,
        gold: 100,
        steal: vec![LootEntry {
            item: "gem".into(),
            chance: 90.0,
        }],
        steal_gold: Some(GoldSteal {
            amount: 250,
            chance: 90.0,
        }),
        ..EnemyRewards::default()
    });
    mark
}

fn thief() -> CombatantSpec {
    spec("thief", 100, stats(50, 0, 0, 0, 50))
}

#[test]
fn steal_takes_each_entry_once() {
    let mut b = battle(vec![thief()], vec![mark(500)], Catalog::new(), vec![0.0]);

    start(&mut b);
    let first = act(&mut b, Action::steal("thief", "mark"));
    assert_eq!(first.result.stolen, Some(StolenLoot::Item("gem".into())));
    assert_eq!(b.inventory().count("gem"), 1);

    advance_to(&mut b, "thief");
    let second = act(&mut b, Action::steal("thief", "mark"));
    assert_eq!(second.result.stolen, Some(StolenLoot::Gold(250)));

    advance_to(&mut b, "thief");
    let err = b.submit(Action::steal("thief", "mark")).expect_err("picked clean");
    assert_eq!(err, ActionError::NothingToSteal("mark".into()));
}

#[test]
fn failed_steal_leaves_the_entry_in_place() {
    let mut b = battle(vec![thief()], vec![mark(500)], Catalog::new(), vec![0.99]);
    start(&mut b);

    let shown = act(&mut b, Action::steal("thief", "mark"));
    assert_eq!(shown.result.stolen, None);
    assert_eq!(lines_containing(&b, "[STEAL][thief] failed on mark"), 1);
    assert_eq!(b.inventory().count("gem"), 0);
}

#[test]
fn mug_steals_even_when_the_hit_kills() {
    let mut b = battle(vec![thief()], vec![mark(10)], Catalog::new(), vec![0.0]);
    start(&mut b);

    let shown = act(&mut b, Action::mug("thief", "mark"));
    assert!(shown.result.flags.killed);
    assert_eq!(shown.result.stolen, Some(StolenLoot::Item("gem".into())));
    assert_eq!(b.outcome(), Some(Outcome::Victory));

    let report = b.shutdown();
    assert_eq!(report.rewards.stolen_items, vec!["gem".to_string()]);
    assert_eq!(report.rewards.exp, 40);
    assert_eq!(report.rewards.gold, 100);
}

#[test]
fn steal_chance_adds_luck_and_clamps() {
    assert_eq!(steal_chance(50.0, 10), 60.0);
    assert_eq!(steal_chance(90.0, 30), 95.0);
    assert_eq!(steal_chance(0.0, 0), 1.0);
}
