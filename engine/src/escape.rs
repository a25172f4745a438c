use serde::Deserialize;

use crate::combatant::{Roster, Side};
use crate::config::BattleConfig;

pub const MIN_ESCAPE_CHANCE: f64 = 10.0;
pub const MAX_ESCAPE_CHANCE: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EscapeRules {
    /// 50% base, adjusted by speed ratio and party HP.
    #[default]
    Standard,
    /// 25% base with no situational adjustment.
    BossAware,
}

impl EscapeRules {
    pub fn base_chance(self) -> f64 {
        match self {
            EscapeRules::Standard => 50.0,
            EscapeRules::BossAware => 25.0,
        }
    }
}

/// Battle-scoped escape bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscapeState {
    pub failed_attempts: u32,
}

pub fn is_forbidden(config: &BattleConfig) -> bool {
    config.boss || config.pinned_down
}

/// Escape chance in percent for `side`. 0 when forbidden, otherwise clamped to [10, 95].
pub fn escape_chance(config: &BattleConfig, roster: &Roster, side: Side, state: &EscapeState) -> f64 {
    if is_forbidden(config) {
        return 0.0;
    }
    let mut chance = config.escape.base_chance();
    if config.escape == EscapeRules::Standard {
        let ours = roster.average_speed(side);
        let theirs = roster.average_speed(side.opponent());
        if ours > 0.0 && theirs > 0.0 {
            let ratio = ours / theirs;
            chance += ((ratio - 1.0) * 25.0).clamp(-25.0, 25.0);
        }
        let hp = roster.average_hp_fraction(side);
        if hp < 0.5 {
            chance -= (0.5 - hp) * 50.0;
        }
    }
    chance += 10.0 * state.failed_attempts as f64;
    chance.clamp(MIN_ESCAPE_CHANCE, MAX_ESCAPE_CHANCE)
}
