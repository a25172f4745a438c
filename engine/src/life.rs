use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeState {
    Alive,
    Dead,
    /// Left the battle; no longer targetable and grants no rewards.
    Fled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub state: LifeState,
}

/// What a single damage application did to a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageTaken {
    pub dealt: i32,
    pub killed: bool,
}

impl Health {
    pub fn new(max_hp: i32, max_mp: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            mp: max_mp,
            max_mp,
            state: LifeState::Alive,
        }
    }

    /// Snapshot with current pools below max. `hp == 0` starts dead.
    pub fn with_current(hp: i32, max_hp: i32, mp: i32, max_mp: i32) -> Self {
        let hp = hp.clamp(0, max_hp);
        Self {
            hp,
            max_hp,
            mp: mp.clamp(0, max_mp),
            max_mp,
            state: if hp > 0 { LifeState::Alive } else { LifeState::Dead },
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.state, LifeState::Alive)
    }

    pub fn is_dead(&self) -> bool {
        matches!(self.state, LifeState::Dead)
    }

    pub fn hp_fraction(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        self.hp as f64 / self.max_hp as f64
    }

    pub fn mp_fraction(&self) -> f64 {
        if self.max_mp <= 0 {
            return 0.0;
        }
        self.mp as f64 / self.max_mp as f64
    }
}

/// Apply damage and handle the drop-to-0 transition.
pub fn apply_damage(health: &mut Health, dmg: i32) -> DamageTaken {
    if !health.is_alive() || dmg <= 0 {
        return DamageTaken::default();
    }
    let before = health.hp;
    health.hp = (health.hp - dmg).max(0);
    let killed = before > 0 && health.hp == 0;
    if killed {
        health.state = LifeState::Dead;
    }
    DamageTaken {
        dealt: before - health.hp,
        killed,
    }
}

/// Healing on a living target, capped at max HP. Returns the HP actually restored.
pub fn heal(health: &mut Health, amount: i32) -> i32 {
    if amount <= 0 || !health.is_alive() {
        return 0;
    }
    let before = health.hp;
    health.hp = (health.hp + amount).min(health.max_hp);
    health.hp - before
}

/// Bring a dead target back with `amount` HP (at least 1). Living targets are untouched.
pub fn revive(health: &mut Health, amount: i32) -> bool {
    if !health.is_dead() {
        return false;
    }
    health.hp = amount.clamp(1, health.max_hp.max(1));
    health.state = LifeState::Alive;
    true
}

pub fn restore_mp(health: &mut Health, amount: i32) -> i32 {
    if amount <= 0 || !health.is_alive() {
        return 0;
    }
    let before = health.mp;
    health.mp = (health.mp + amount).min(health.max_mp);
    health.mp - before
}

/// Whether `mp`/`hp` costs are affordable. HP costs may never bring the payer to 0.
pub fn can_afford(health: &Health, mp: i32, hp: i32) -> bool {
    health.mp >= mp && (hp <= 0 || health.hp > hp)
}

/// Deduct a cost that `can_afford` has already accepted.
pub fn spend(health: &mut Health, mp: i32, hp: i32) {
    health.mp -= mp.max(0);
    health.hp -= hp.max(0);
}
