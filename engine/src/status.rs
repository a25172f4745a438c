use serde::{Deserialize, Serialize};

use crate::Dice;
use crate::combatant::Combatant;
use crate::life::{apply_damage, heal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Burn,
    Freeze,
    Shock,
    Sleep,
    Stun,
    Petrify,
    Poison,
    Confuse,
    Fear,
    Charm,
    Silence,
    Regen,
    Reflect,
    AttackUp,
    AttackDown,
    DefenseUp,
    DefenseDown,
    SpeedUp,
    SpeedDown,
    Charge,
    Concentrate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Buff,
    Debuff,
    Neutral,
}

impl StatusKind {
    pub fn category(self) -> StatusCategory {
        use StatusKind::*;
        match self {
            Regen | Reflect | AttackUp | DefenseUp | SpeedUp => StatusCategory::Buff,
            Charge | Concentrate => StatusCategory::Neutral,
            _ => StatusCategory::Debuff,
        }
    }

    /// Ailments are the debuffs that are not plain stat reductions.
    pub fn is_ailment(self) -> bool {
        use StatusKind::*;
        self.category() == StatusCategory::Debuff
            && !matches!(self, AttackDown | DefenseDown | SpeedDown)
    }

    pub fn prevents_action(self) -> bool {
        use StatusKind::*;
        matches!(self, Sleep | Stun | Freeze | Petrify | Shock)
    }

    pub fn is_periodic(self) -> bool {
        matches!(self, StatusKind::Poison | StatusKind::Burn | StatusKind::Regen)
    }

    /// Magnitude used when an application does not specify one.
    pub fn default_power(self) -> i32 {
        use StatusKind::*;
        match self {
            Poison | Regen => 8,
            Burn => 6,
            AttackUp | AttackDown | DefenseUp | DefenseDown | SpeedUp | SpeedDown => 25,
            Charge | Concentrate => 150,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remaining {
    Turns(u32),
    Indefinite,
}

impl Remaining {
    /// Negative turn counts mean "until cured".
    pub fn from_turns(turns: i32) -> Self {
        if turns < 0 {
            Remaining::Indefinite
        } else {
            Remaining::Turns(turns as u32)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInstance {
    pub kind: StatusKind,
    pub remaining: Remaining,
    pub power: i32,
    pub source: String,
}

impl StatusInstance {
    pub fn category(&self) -> StatusCategory {
        self.kind.category()
    }

    pub fn effective_power(&self) -> i32 {
        if self.power > 0 {
            self.power
        } else {
            self.kind.default_power()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Refreshed,
    Resisted,
    /// Target is not alive.
    Ignored,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub damaged: Vec<(StatusKind, i32)>,
    pub healed: Vec<(StatusKind, i32)>,
    pub expired: Vec<StatusKind>,
    pub killed: bool,
}

/// Active-effect bookkeeping. Instances live on the combatant; this type owns the rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusManager;

impl StatusManager {
    pub fn new() -> Self {
        Self
    }

    /// Roll the target's resistance for `kind`; on failure create or refresh its single instance.
    pub fn apply_status(
        &self,
        target: &mut Combatant,
        kind: StatusKind,
        duration: i32,
        power: i32,
        source: &str,
        dice: &mut Dice,
    ) -> ApplyOutcome {
        if !target.is_alive() {
            return ApplyOutcome::Ignored;
        }
        let resist = target.status_resistance(kind);
        if resist > 0.0 && dice.percent(resist) {
            tracing::trace!(target = %target.id, ?kind, resist, "status resisted");
            return ApplyOutcome::Resisted;
        }
        self.force_status(target, kind, duration, power, source)
    }

    /// Apply without a resistance roll (self-buffs, guaranteed effects).
    pub fn force_status(
        &self,
        target: &mut Combatant,
        kind: StatusKind,
        duration: i32,
        power: i32,
        source: &str,
    ) -> ApplyOutcome {
        if !target.is_alive() {
            return ApplyOutcome::Ignored;
        }
        let remaining = Remaining::from_turns(duration);
        if let Some(existing) = target.statuses.iter_mut().find(|s| s.kind == kind) {
            existing.remaining = remaining;
            existing.power = power;
            existing.source = source.to_string();
            return ApplyOutcome::Refreshed;
        }
        target.statuses.push(StatusInstance {
            kind,
            remaining,
            power,
            source: source.to_string(),
        });
        ApplyOutcome::Applied
    }

    /// Turn-start ticks fire periodic damage and healing; end-of-round ticks age every
    /// instance by one turn and drop the ones that reach 0.
    pub fn tick(&self, target: &mut Combatant, is_turn_start: bool) -> TickReport {
        let mut report = TickReport::default();
        if !target.is_alive() {
            return report;
        }

        if is_turn_start {
            let periodic: Vec<(StatusKind, i32)> = target
                .statuses
                .iter()
                .filter(|s| s.kind.is_periodic())
                .map(|s| (s.kind, s.effective_power()))
                .collect();
            for (kind, pct) in periodic {
                let amount = crate::to_points(target.health.max_hp as f64 * pct as f64 / 100.0)
                    .max(1);
                if kind == StatusKind::Regen {
                    let healed = heal(&mut target.health, amount);
                    report.healed.push((kind, healed));
                } else {
                    let taken = apply_damage(&mut target.health, amount);
                    report.damaged.push((kind, taken.dealt));
                    if taken.killed {
                        report.killed = true;
                        target.on_death();
                        break;
                    }
                }
            }
            return report;
        }

        for inst in target.statuses.iter_mut() {
            if let Remaining::Turns(n) = &mut inst.remaining {
                *n = n.saturating_sub(1);
            }
        }
        target.statuses.retain(|inst| {
            let done = inst.remaining == Remaining::Turns(0);
            if done {
                report.expired.push(inst.kind);
            }
            !done
        });
        report
    }

    pub fn cure(&self, target: &mut Combatant, kinds: &[StatusKind]) -> Vec<StatusKind> {
        let mut removed = Vec::new();
        target.statuses.retain(|inst| {
            let hit = kinds.contains(&inst.kind);
            if hit {
                removed.push(inst.kind);
            }
            !hit
        });
        removed
    }

    pub fn cure_debuffs(&self, target: &mut Combatant) -> Vec<StatusKind> {
        let mut removed = Vec::new();
        target.statuses.retain(|inst| {
            let hit = inst.category() == StatusCategory::Debuff;
            if hit {
                removed.push(inst.kind);
            }
            !hit
        });
        removed
    }

    /// Remove and return a one-shot instance such as Charge.
    pub fn consume(&self, target: &mut Combatant, kind: StatusKind) -> Option<StatusInstance> {
        let idx = target.statuses.iter().position(|s| s.kind == kind)?;
        Some(target.statuses.remove(idx))
    }
}
