use serde::Deserialize;

use crate::combat::damage::DamageFormula;
use crate::combat::technical::TechnicalCombo;
use crate::escape::EscapeRules;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub reduction: f64,
    pub advanced_reduction: f64,
    /// Percent of max HP restored each round while guarding.
    pub hp_regen_percent: f64,
    pub mp_regen_percent: f64,
    pub gauge_gain: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            reduction: 0.5,
            advanced_reduction: 0.75,
            hp_regen_percent: 5.0,
            mp_regen_percent: 5.0,
            gauge_gain: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    pub taken_rate: f64,
    pub dealt_rate: f64,
    pub crit_bonus: f64,
    pub ally_death_bonus: f64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            taken_rate: 0.8,
            dealt_rate: 0.2,
            crit_bonus: 10.0,
            ally_death_bonus: 30.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatonConfig {
    pub damage_step: f64,
    pub heal_step: f64,
    /// Critical rate in percent added per level.
    pub crit_step: f64,
}

impl Default for BatonConfig {
    fn default() -> Self {
        Self {
            damage_step: 0.5,
            heal_step: 0.5,
            crit_step: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AllOutConfig {
    pub attack_multiplier: f64,
    /// When false only the party can open an all-out attack window.
    pub symmetric: bool,
}

impl Default for AllOutConfig {
    fn default() -> Self {
        Self {
            attack_multiplier: 2.0,
            symmetric: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub seed: u64,
    pub formula: DamageFormula,
    /// Percent.
    pub base_crit_rate: f64,
    pub crit_multiplier: f64,
    pub boss: bool,
    pub pinned_down: bool,
    pub escape: EscapeRules,
    pub guard: GuardConfig,
    pub limit: LimitConfig,
    pub baton: BatonConfig,
    pub all_out: AllOutConfig,
    pub technicals: Vec<TechnicalCombo>,
    /// Used by simulation drivers; the engine itself never stops on round count.
    pub max_rounds: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            formula: DamageFormula::default(),
            base_crit_rate: 5.0,
            crit_multiplier: 1.5,
            boss: false,
            pinned_down: false,
            escape: EscapeRules::default(),
            guard: GuardConfig::default(),
            limit: LimitConfig::default(),
            baton: BatonConfig::default(),
            all_out: AllOutConfig::default(),
            technicals: TechnicalCombo::default_table(),
            max_rounds: 30,
        }
    }
}
