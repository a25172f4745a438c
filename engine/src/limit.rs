//! Limit gauge accrual and limit-break validation and damage.

use crate::combat::damage::AttackProfile;
use crate::combatant::{Combatant, CombatantId, Roster, Stats};
use crate::config::LimitConfig;
use crate::data::LimitBreakDef;
use crate::error::ActionError;

pub const GAUGE_MAX: f64 = 100.0;

pub fn from_damage_taken(config: &LimitConfig, dealt: i32) -> f64 {
    dealt.max(0) as f64 * config.taken_rate
}

pub fn from_damage_dealt(config: &LimitConfig, dealt: i32, critical: bool) -> f64 {
    let mut gain = dealt.max(0) as f64 * config.dealt_rate;
    if critical {
        gain += config.crit_bonus;
    }
    gain
}

/// The actor must know the limit break and hold a full gauge.
pub fn check_ready(actor: &Combatant, limit_id: &str) -> Result<(), ActionError> {
    if !actor.limit_breaks.iter().any(|l| l == limit_id) {
        return Err(ActionError::NotKnown {
            actor: actor.id.clone(),
            id: limit_id.to_string(),
        });
    }
    if !actor.limit_ready() {
        return Err(ActionError::LimitNotReady(actor.id.clone()));
    }
    Ok(())
}

/// Resolve the duo partner for `def`. Solo limits ignore `requested`; duo limits
/// require their named partner, alive, able to act and with a full gauge.
pub fn resolve_partner(
    roster: &Roster,
    actor: &Combatant,
    def: &LimitBreakDef,
    requested: Option<&str>,
) -> Result<Option<CombatantId>, ActionError> {
    let Some(named) = def.duo_partner.as_deref() else {
        return Ok(None);
    };
    if let Some(req) = requested {
        if req != named {
            return Err(ActionError::DuoPartnerNotReady(req.to_string()));
        }
    }
    let partner = roster
        .get(named)
        .ok_or_else(|| ActionError::DuoPartnerNotReady(named.to_string()))?;
    if partner.id == actor.id
        || partner.side != actor.side
        || !partner.can_act()
        || !partner.limit_ready()
    {
        return Err(ActionError::DuoPartnerNotReady(named.to_string()));
    }
    Ok(Some(partner.id.clone()))
}

/// Empty both gauges.
pub fn consume(roster: &mut Roster, actor: &str, partner: Option<&str>) {
    for id in std::iter::once(actor).chain(partner) {
        if let Some(c) = roster.get_mut(id) {
            c.flags.limit_gauge = 0.0;
        }
    }
}

/// `(base_power + 2 * attack) * power_multiplier * duo_bonus`, less half the
/// defender's matching defense unless the limit ignores it.
pub fn base_damage(profile: &AttackProfile, attacker: &Stats, defender: &Stats, duo_bonus: f64) -> f64 {
    let raw = (profile.base_power + 2.0 * attacker.attack as f64) * profile.power_multiplier * duo_bonus;
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
