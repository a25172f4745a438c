//! Baton pass: hand an unused bonus turn to an ally with stacking bonuses.

use crate::combatant::{Combatant, Roster};
use crate::config::BatonConfig;
use crate::error::ActionError;

pub fn can_pass(actor: &Combatant) -> bool {
    actor.is_alive() && actor.flags.has_extra_turn
}

pub fn can_receive(actor: &Combatant, target: &Combatant) -> bool {
    target.is_alive()
        && target.id != actor.id
        && target.side == actor.side
        && !target.flags.has_acted
        && target.can_act()
}

/// `1 + step * level`.
pub fn damage_multiplier(config: &BatonConfig, level: u32) -> f64 {
    1.0 + config.damage_step * level as f64
}

pub fn heal_multiplier(config: &BatonConfig, level: u32) -> f64 {
    1.0 + config.heal_step * level as f64
}

/// Critical rate bonus in percent.
pub fn crit_bonus(config: &BatonConfig, level: u32) -> f64 {
    config.crit_step * level as f64
}

pub fn validate(roster: &Roster, actor: &Combatant, to: &str) -> Result<(), ActionError> {
    if !can_pass(actor) {
        return Err(ActionError::NoExtraTurn(actor.id.clone()));
    }
    let target = roster
        .get(to)
        .ok_or_else(|| ActionError::UnknownCombatant(to.to_string()))?;
    if !can_receive(actor, target) {
        return Err(ActionError::CannotReceivePass(to.to_string()));
    }
    Ok(())
}

/// Transfer the actor's extra turn. Returns the receiver's new pass level.
///
/// The receiver's level stacks on top of the passer's, so a chain of passes
/// keeps climbing for the rest of the round.
pub fn execute(roster: &mut Roster, actor_id: &str, to: &str) -> Option<u32> {
    let passer_level = {
        let actor = roster.get_mut(actor_id)?;
        actor.flags.has_extra_turn = false;
        actor.flags.has_acted = true;
        actor.flags.baton_level
    };
    let target = roster.get_mut(to)?;
    target.flags.has_extra_turn = true;
    target.flags.baton_level = target.flags.baton_level.max(passer_level) + 1;
    Some(target.flags.baton_level)
}

/// Round start: every pass level returns to 0.
pub fn reset_round(roster: &mut Roster) {
    for c in roster.iter_mut() {
        c.flags.baton_level = 0;
    }
}
