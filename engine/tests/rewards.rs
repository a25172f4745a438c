mod common;

use common::*;
use onemore_engine::combat::actions::StolenLoot;
use onemore_engine::data::{EnemyRewards, LootEntry};
use onemore_engine::life::LifeState;
use onemore_engine::rewards::compute_rewards;
use onemore_engine::{Action, Catalog, CombatantSpec, Dice, Outcome, Roster, Side};

fn enemy(id: &str, exp: u64, gold: u64, drop_chance: f64) -> CombatantSpec {
    let mut e = spec(id, 10, stats(0, 0, 0, 0, 1));
    e.rewards = Some(EnemyRewards {
        exp,
        gold,
        drops: vec![LootEntry {
            item: format!("{}_horn", id),
            chance: drop_chance,
        }],
        ..EnemyRewards::default()
    });
    e
}

fn roster(party: &[CombatantSpec], enemies: &[CombatantSpec]) -> Roster {
    let mut roster = Roster::new();
    for p in party {
        roster.insert(p.to_combatant(Side::Party)).expect("party member");
    }
    for e in enemies {
        roster.insert(e.to_combatant(Side::Enemy)).expect("enemy");
    }
    roster
}

fn defeat(roster: &mut Roster, id: &str, state: LifeState) {
    let c = roster.get_mut(id).expect("combatant");
    c.health.hp = 0;
    c.health.state = state;
}

#[test]
fn victory_pays_out_defeated_enemies_only() {
    let party = [spec("joker", 100, stats(0, 0, 0, 0, 1)), spec("ann", 100, stats(0, 0, 0, 0, 1))];
    let enemies = [enemy("bicorn", 30, 50, 100.0), enemy("pixie", 20, 10, 0.0)];
    let mut roster = roster(&party, &enemies);
    defeat(&mut roster, "bicorn", LifeState::Dead);
    roster.get_mut("pixie").expect("pixie").health.state = LifeState::Fled;
    defeat(&mut roster, "ann", LifeState::Dead);

    let stolen = [StolenLoot::Gold(75)];
    let rewards = compute_rewards(&roster, Outcome::Victory, &stolen, &mut Dice::from_scripted(vec![0.5]));
    assert_eq!(rewards.exp, 30);
    assert_eq!(rewards.gold, 50);
    assert_eq!(rewards.drops, vec!["bicorn_horn".to_string()]);
    assert_eq!(rewards.stolen_gold, 75);

    let joker = rewards.party.iter().find(|p| p.id == "joker").expect("joker delta");
    let ann = rewards.party.iter().find(|p| p.id == "ann").expect("ann delta");
    assert_eq!(joker.exp_gained, 30);
    assert_eq!(ann.exp_gained, 0);
}

#[test]
fn defeat_keeps_only_stolen_loot() {
    let party = [spec("joker", 100, stats(0, 0, 0, 0, 1))];
    let enemies = [enemy("bicorn", 30, 50, 100.0)];
    let mut roster = roster(&party, &enemies);
    defeat(&mut roster, "joker", LifeState::Dead);

    let stolen = [StolenLoot::Item("gem".into())];
    let rewards = compute_rewards(&roster, Outcome::Defeat, &stolen, &mut Dice::from_seed(1));
    assert_eq!(rewards.exp, 0);
    assert_eq!(rewards.gold, 0);
    assert!(rewards.drops.is_empty());
    assert_eq!(rewards.stolen_items, vec!["gem".to_string()]);
}

#[test]
fn battle_report_writes_back_to_character_records() {
    let mut joker = spec("joker", 100, stats(50, 0, 0, 0, 10));
    joker.hp = Some(70);
    let mut b = battle(vec![joker.clone()], vec![enemy("bicorn", 30, 50, 0.0)], Catalog::new(), vec![0.99]);
    start(&mut b);
    act(&mut b, Action::attack("joker", "bicorn"));
    assert_eq!(b.outcome(), Some(Outcome::Victory));

    let report = b.shutdown();
    assert_eq!(report.rounds, 1);
    assert_eq!(report.score.damage_by_party, 10);
    let delta = report.rewards.party.first().expect("joker delta");
    joker.write_back(delta);
    assert_eq!(joker.hp, Some(70));
    assert_eq!(joker.exp, 30);
}
