use crate::combatant::{Combatant, GuardState};
use crate::config::GuardConfig;
use crate::life::{heal, restore_mp};

/// Raise a guard. Advanced guarders remove more damage.
pub fn raise(actor: &mut Combatant, config: &GuardConfig) -> f64 {
    let reduction = if actor.advanced_guard {
        config.advanced_reduction
    } else {
        config.reduction
    };
    actor.flags.guard = Some(GuardState {
        reduction,
        fresh: true,
    });
    reduction
}

/// Called at the end of each of the guarder's turns. The guard survives the turn it
/// was raised on and drops at the end of the next one. Returns true when it drops.
pub fn end_turn(actor: &mut Combatant) -> bool {
    match actor.flags.guard.as_mut() {
        Some(guard) if guard.fresh => {
            guard.fresh = false;
            false
        }
        Some(_) => {
            actor.flags.guard = None;
            true
        }
        None => false,
    }
}

pub fn reduction(target: &Combatant) -> Option<f64> {
    target.flags.guard.map(|g| g.reduction)
}

/// Per-round upkeep while guarding: small HP/MP regen and limit gauge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GuardRegen {
    pub hp: i32,
    pub mp: i32,
    pub gauge_ready: bool,
}

pub fn tick_round(actor: &mut Combatant, config: &GuardConfig) -> Option<GuardRegen> {
    if !actor.is_guarding() || !actor.is_alive() {
        return None;
    }
    let hp_amount = crate::to_points(actor.health.max_hp as f64 * config.hp_regen_percent / 100.0);
    let mp_amount = crate::to_points(actor.health.max_mp as f64 * config.mp_regen_percent / 100.0);
    let hp = heal(&mut actor.health, hp_amount);
    let mp = restore_mp(&mut actor.health, mp_amount);
    let gauge_ready = actor.add_gauge(config.gauge_gain);
    Some(GuardRegen { hp, mp, gauge_ready })
}
