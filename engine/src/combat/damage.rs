//! Damage formulas and the fixed-order modifier pipeline applied after them.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::combatant::{Combatant, Stats};
use crate::config::BattleConfig;
use crate::data::{LimitBreakDef, ShowtimeDef, SkillDef, StatusInflict};
use crate::element::{Affinity, Element};

/// Inputs every formula sees. Formulas are pure functions of this value.
#[derive(Debug, Clone)]
pub struct FormulaInput<'a> {
    pub attacker: Stats,
    pub defender: Stats,
    /// Defender stats before status modifiers.
    pub defender_base: Stats,
    pub attacker_level: u32,
    pub defender_level: u32,
    pub profile: &'a AttackProfile,
    pub is_critical: bool,
}

impl FormulaInput<'_> {
    pub fn offense(&self) -> f64 {
        if self.profile.element.is_physical() {
            self.attacker.attack as f64
        } else {
            self.attacker.magic_attack as f64
        }
    }

    pub fn defense(&self) -> f64 {
        if self.profile.ignores_defense {
            return 0.0;
        }
        if self.profile.element.is_physical() {
            self.defender.defense as f64
        } else {
            self.defender.magic_defense as f64
        }
    }

    fn base_defense(&self) -> f64 {
        if self.profile.ignores_defense {
            return 0.0;
        }
        if self.profile.element.is_physical() {
            self.defender_base.defense as f64
        } else {
            self.defender_base.magic_defense as f64
        }
    }

    /// `base_power / 100 * power_multiplier`.
    pub fn power_scale(&self) -> f64 {
        self.profile.base_power / 100.0 * self.profile.power_multiplier
    }
}

/// User-supplied formula hook.
#[derive(Clone)]
pub struct CustomFormula(Arc<dyn Fn(&FormulaInput<'_>) -> f64 + Send + Sync>);

impl CustomFormula {
    pub fn new(f: impl Fn(&FormulaInput<'_>) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageFormula {
    /// `(off - def / 2) * power`
    #[default]
    Simple,
    /// `off^2 / def * power`
    Persona,
    Ff7,
    Ff8,
    Ff9,
    Pokemon,
    #[serde(skip)]
    Custom(CustomFormula),
}

impl fmt::Debug for DamageFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DamageFormula::Simple => f.write_str("Simple"),
            DamageFormula::Persona => f.write_str("Persona"),
            DamageFormula::Ff7 => f.write_str("Ff7"),
            DamageFormula::Ff8 => f.write_str("Ff8"),
            DamageFormula::Ff9 => f.write_str("Ff9"),
            DamageFormula::Pokemon => f.write_str("Pokemon"),
            DamageFormula::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl DamageFormula {
    pub fn custom(f: impl Fn(&FormulaInput<'_>) -> f64 + Send + Sync + 'static) -> Self {
        DamageFormula::Custom(CustomFormula::new(f))
    }

    /// Base damage before affinity, baton, critical, technical and guard modifiers.
    pub fn base_damage(&self, input: &FormulaInput<'_>) -> f64 {
        let off = input.offense();
        let def = input.defense();
        let scale = input.power_scale();
        let level = input.attacker_level as f64;
        match self {
            DamageFormula::Simple => (off - def / 2.0) * scale,
            DamageFormula::Persona => off * off / def.max(1.0) * scale,
            DamageFormula::Ff7 => {
                let base = off + ((off + level) / 32.0) * ((off * level) / 32.0);
                let power = 16.0 * scale;
                power * (512.0 - def.min(511.0)) * base / (16.0 * 512.0)
            }
            DamageFormula::Ff8 => {
                (off * off / 16.0 + off) * (265.0 - def.min(264.0)) / 256.0 * scale
            }
            DamageFormula::Ff9 => {
                let base = (off * scale - def).max(1.0);
                let bonus = 1.0 + (level + off) / 32.0;
                base * bonus
            }
            DamageFormula::Pokemon => {
                // Critical hits ignore the defender's raised defense.
                let def = if input.is_critical {
                    def.min(input.base_defense())
                } else {
                    def
                };
                let power = input.profile.base_power * input.profile.power_multiplier;
                ((2.0 * level / 5.0 + 2.0) * power * off / def.max(1.0)) / 50.0 + 2.0
            }
            DamageFormula::Custom(hook) => (hook.0)(input),
        }
    }
}

/// A single attack's parameters, whatever produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackProfile {
    pub label: String,
    pub element: Element,
    pub base_power: f64,
    pub power_multiplier: f64,
    pub hit_count: u32,
    /// Percent.
    pub accuracy: f64,
    /// Percent added to the base critical rate.
    pub crit_bonus: f64,
    pub ignores_defense: bool,
    /// Skip the defender's affinity table entirely.
    pub pierces_immunity: bool,
    pub instant_kill_threshold: Option<f64>,
    pub inflicts: Vec<StatusInflict>,
}

impl AttackProfile {
    pub fn basic_attack() -> Self {
        Self {
            label: "Attack".to_string(),
            element: Element::Physical,
            base_power: 100.0,
            power_multiplier: 1.0,
            hit_count: 1,
            accuracy: 100.0,
            crit_bonus: 0.0,
            ignores_defense: false,
            pierces_immunity: false,
            instant_kill_threshold: None,
            inflicts: Vec::new(),
        }
    }

    pub fn from_skill(skill: &SkillDef) -> Self {
        Self {
            label: skill.name.clone(),
            element: skill.element,
            base_power: skill.base_power,
            power_multiplier: skill.power_multiplier,
            hit_count: skill.hit_count.max(1),
            accuracy: skill.accuracy,
            crit_bonus: skill.crit_bonus,
            ignores_defense: false,
            pierces_immunity: false,
            instant_kill_threshold: None,
            inflicts: skill.inflicts.clone(),
        }
    }

    pub fn from_limit(limit: &LimitBreakDef) -> Self {
        Self {
            label: limit.name.clone(),
            element: limit.element,
            base_power: limit.base_power,
            power_multiplier: limit.power_multiplier,
            hit_count: limit.hit_count.max(1),
            accuracy: 100.0,
            crit_bonus: limit.crit_bonus,
            ignores_defense: limit.ignores_defense,
            pierces_immunity: limit.pierces_immunity,
            instant_kill_threshold: limit.instant_kill_threshold,
            inflicts: limit.inflicts.clone(),
        }
    }

    pub fn from_showtime(showtime: &ShowtimeDef) -> Self {
        Self {
            label: showtime.name.clone(),
            element: showtime.element,
            base_power: showtime.base_power,
            power_multiplier: showtime.power_multiplier,
            hit_count: 1,
            accuracy: 100.0,
            crit_bonus: showtime.crit_bonus,
            ignores_defense: showtime.ignores_defense,
            pierces_immunity: false,
            instant_kill_threshold: showtime.instant_kill_threshold,
            inflicts: Vec::new(),
        }
    }
}

/// Multipliers that sit between the base formula and the final clamp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitModifiers {
    pub baton_level: u32,
    pub critical: bool,
    pub technical: Option<f64>,
    /// Fraction removed by the defender's guard.
    pub guard_reduction: Option<f64>,
    /// Charge / Concentrate bonus multiplier.
    pub charge: Option<f64>,
}

/// Where a computed hit ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalDamage {
    Damage(i32),
    Nullified,
    /// Heals the defender by this much.
    Absorbed(i32),
    /// Damages the attacker by this much.
    Reflected(i32),
}

impl FinalDamage {
    pub fn amount(self) -> i32 {
        match self {
            FinalDamage::Damage(n) | FinalDamage::Absorbed(n) | FinalDamage::Reflected(n) => n,
            FinalDamage::Nullified => 0,
        }
    }
}

/// Apply the modifier pipeline in order: affinity, baton pass, critical, technical,
/// guard, charge, then clamp to at least 1 on every path that moves HP.
pub fn finalize_damage(
    base: f64,
    affinity: Affinity,
    mods: &HitModifiers,
    config: &BattleConfig,
) -> FinalDamage {
    let affinity_scale = match affinity {
        Affinity::Immune | Affinity::Null => return FinalDamage::Nullified,
        Affinity::Absorb | Affinity::Reflect => 1.0,
        other => other.multiplier(),
    };
    let mut amount = base.max(0.0) * affinity_scale;
    amount *= crate::baton::damage_multiplier(&config.baton, mods.baton_level);
    if mods.critical {
        amount *= config.crit_multiplier;
    }
    if let Some(tech) = mods.technical {
        amount *= tech;
    }
    if let Some(reduction) = mods.guard_reduction {
        if affinity.deals_damage() {
            amount *= (1.0 - reduction).max(0.0);
        }
    }
    if let Some(charge) = mods.charge {
        amount *= charge;
    }
    let points = crate::to_points(amount).max(1);
    match affinity {
        Affinity::Absorb => FinalDamage::Absorbed(points),
        Affinity::Reflect => FinalDamage::Reflected(points),
        _ => FinalDamage::Damage(points),
    }
}

/// Critical chance in percent for one hit.
pub fn crit_chance(config: &BattleConfig, profile: &AttackProfile, baton_level: u32) -> f64 {
    config.base_crit_rate + profile.crit_bonus + crate::baton::crit_bonus(&config.baton, baton_level)
}

/// Affinity a hit resolves against, honoring immunity piercing.
pub fn resolve_affinity(defender: &Combatant, profile: &AttackProfile) -> Affinity {
    if profile.pierces_immunity {
        return Affinity::Normal;
    }
    defender.affinity(profile.element)
}

/// Instant kill fires when the target's HP fraction is at or below the threshold
/// and the hit would otherwise move HP downward.
pub fn instant_kill_applies(target: &Combatant, profile: &AttackProfile, affinity: Affinity) -> bool {
    match profile.instant_kill_threshold {
        Some(threshold) => affinity.deals_damage() && target.health.hp_fraction() <= threshold,
        None => false,
    }
}

/// Knocked-down and incapacitated targets cannot dodge.
pub fn hit_chance(defender: &Combatant, profile: &AttackProfile) -> f64 {
    if defender.flags.knocked_down || !defender.can_act() {
        return 100.0;
    }
    profile.accuracy
}
