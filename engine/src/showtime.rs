//! Probability-triggered pair attacks with pair-scoped cooldowns.

use indexmap::IndexMap;

use crate::Dice;
use crate::combat::damage::AttackProfile;
use crate::combatant::{CombatantId, Roster, Stats};
use crate::data::{Catalog, ShowtimeDef, ShowtimeTrigger};

/// Order-independent key for a pair of combatants.
pub fn pair_key(a: &str, b: &str) -> (CombatantId, CombatantId) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShowtimeTracker {
    cooldowns: IndexMap<(CombatantId, CombatantId), u32>,
}

impl ShowtimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cooldown(&self, a: &str, b: &str) -> u32 {
        self.cooldowns.get(&pair_key(a, b)).copied().unwrap_or(0)
    }

    pub fn on_cooldown(&self, a: &str, b: &str) -> bool {
        self.cooldown(a, b) > 0
    }

    pub fn start_cooldown(&mut self, def: &ShowtimeDef) {
        if def.cooldown_turns > 0 {
            self.cooldowns.insert(
                pair_key(&def.members[0], &def.members[1]),
                def.cooldown_turns,
            );
        }
    }

    /// Once per round.
    pub fn tick_round(&mut self) {
        for turns in self.cooldowns.values_mut() {
            *turns = turns.saturating_sub(1);
        }
        self.cooldowns.retain(|_, turns| *turns > 0);
    }
}

pub fn is_eligible(def: &ShowtimeDef, roster: &Roster, tracker: &ShowtimeTracker) -> bool {
    let [a, b] = &def.members;
    let (Some(first), Some(second)) = (roster.get(a), roster.get(b)) else {
        return false;
    };
    if !first.can_act() || !second.can_act() || tracker.on_cooldown(a, b) {
        return false;
    }
    let floor = def.min_hp_percent;
    match def.trigger {
        ShowtimeTrigger::Healthy => {
            first.health.hp_fraction() > floor && second.health.hp_fraction() > floor
        }
        ShowtimeTrigger::Desperate => {
            first.health.hp_fraction() <= floor || second.health.hp_fraction() <= floor
        }
    }
}

/// Roll every eligible pair at its trigger chance, in catalog order.
pub fn roll_triggers(
    catalog: &Catalog,
    roster: &Roster,
    tracker: &ShowtimeTracker,
    dice: &mut Dice,
) -> Vec<String> {
    let mut fired = Vec::new();
    for def in catalog.showtimes() {
        if is_eligible(def, roster, tracker) && dice.percent(def.trigger_chance) {
            fired.push(def.id.clone());
        }
    }
    fired
}

/// Half the pair's summed attack and magic attack.
pub fn combined_power(first: &Stats, second: &Stats) -> f64 {
    (first.attack + first.magic_attack + second.attack + second.magic_attack) as f64 / 2.0
}

/// `(base_power + combined) * power_multiplier`, less half the matching defense.
pub fn base_damage(profile: &AttackProfile, combined: f64, defender: &Stats) -> f64 {
    let raw = (profile.base_power + combined) * profile.power_multiplier;
    if profile.ignores_defense {
        return raw;
    }
    let def = if profile.element.is_physical() {
        defender.defense
    } else {
        defender.magic_defense
    };
    raw - def as f64 / 2.0
}
