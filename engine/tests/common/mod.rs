#![allow(dead_code)]

use onemore_engine::element::{Affinity, Element};
use onemore_engine::{
    Action, Battle, BattleConfig, Catalog, CombatantSpec, Dice, Inventory, Presentation, Stats,
    TurnStart,
};

pub fn stats(attack: i32, defense: i32, magic_attack: i32, magic_defense: i32, speed: i32) -> Stats {
    Stats {
        attack,
        defense,
        magic_attack,
        magic_defense,
        speed,
        luck: 0,
    }
}

pub fn spec(id: &str, hp: i32, stats: Stats) -> CombatantSpec {
    CombatantSpec::new(id, id, hp, stats)
}

pub fn weak_to(mut spec: CombatantSpec, element: Element) -> CombatantSpec {
    spec.affinities.insert(element, Affinity::Weak);
    spec
}

pub fn battle(
    party: Vec<CombatantSpec>,
    enemies: Vec<CombatantSpec>,
    catalog: Catalog,
    rolls: Vec<f64>,
) -> Battle {
    battle_with(party, enemies, catalog, Inventory::new(), BattleConfig::default(), rolls)
}

pub fn battle_with(
    party: Vec<CombatantSpec>,
    enemies: Vec<CombatantSpec>,
    catalog: Catalog,
    inventory: Inventory,
    config: BattleConfig,
    rolls: Vec<f64>,
) -> Battle {
    Battle::initialize(&party, &enemies, catalog, inventory, config)
        .expect("valid setup")
        .with_dice(Dice::from_scripted(rolls))
}

pub fn start(battle: &mut Battle) -> TurnStart {
    battle
        .next_turn()
        .expect("next turn")
        .expect("battle still running")
}

pub fn act(battle: &mut Battle, action: Action) -> Presentation {
    let shown = battle.submit(action).expect("action accepted");
    battle.presentation_complete().expect("presentation ack");
    shown
}

/// Guard with everyone until it is `who`'s turn.
pub fn advance_to(battle: &mut Battle, who: &str) -> TurnStart {
    loop {
        let turn = start(battle);
        if turn.actor == who {
            return turn;
        }
        act(battle, Action::guard(&turn.actor));
    }
}

pub fn hp(battle: &Battle, id: &str) -> i32 {
    battle.combatant(id).expect("combatant exists").health.hp
}

pub fn lines_containing(battle: &Battle, needle: &str) -> usize {
    battle.log_lines().iter().filter(|l| l.contains(needle)).count()
}
