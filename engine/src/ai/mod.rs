//! Priority-ordered decision making for AI-controlled combatants.
//!
//! [`decide`] is a pure function of the actor, read-only views of both sides,
//! and what the shared [`WeaknessMemory`] has observed. The only state it
//! touches is the dice, and only for the `Random` target rule and Berserk.
//!
//! Branches are tried strictly in this order:
//!
//! 1. emergency skill
//! 2. defend
//! 3. flee
//! 4. technical opportunity
//! 5. known or probable weakness
//! 6. scripted pattern
//! 7. archetype fallback

pub mod memory;
pub mod targeting;

use serde::{Deserialize, Serialize};

use crate::Dice;
use crate::combat::actions::{Action, Command};
use crate::combat::technical::{self, TechnicalCombo};
use crate::combatant::{Combatant, CombatantId};
use crate::data::{Catalog, SkillDef, SkillKind, TargetShape};
use crate::element::Element;
use crate::life::can_afford;
use crate::status::{StatusCategory, StatusKind};

pub use memory::WeaknessMemory;
pub use targeting::TargetPriority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Aggressive,
    Defensive,
    #[default]
    Balanced,
    Tactical,
    Berserk,
    Supportive,
    Cowardly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiProfile {
    pub archetype: Archetype,
    pub target_priority: TargetPriority,
    pub emergency_skill: Option<String>,
    /// HP fractions.
    pub emergency_threshold: f64,
    pub defend_threshold: f64,
    /// Guard when opponents outnumber allies by at least this ratio.
    pub outnumbered_ratio: f64,
    pub can_flee: bool,
    pub flee_threshold: f64,
    pub exploit_technicals: bool,
    pub exploit_weaknesses: bool,
    /// Skill ids cycled by turn count; `attack` and `guard` are also accepted.
    pub pattern: Vec<String>,
}

impl Default for AiProfile {
    fn default() -> Self {
        Self {
            archetype: Archetype::Balanced,
            target_priority: TargetPriority::LowestHp,
            emergency_skill: None,
            emergency_threshold: 0.25,
            defend_threshold: 0.2,
            outnumbered_ratio: 4.0,
            can_flee: false,
            flee_threshold: 0.15,
            exploit_technicals: true,
            exploit_weaknesses: true,
            pattern: Vec::new(),
        }
    }
}

impl AiProfile {
    pub fn with_archetype(archetype: Archetype) -> Self {
        Self {
            archetype,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Attack,
    Skill,
    Guard,
    Flee,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub kind: DecisionKind,
    pub skill: Option<String>,
    pub target: Option<CombatantId>,
    pub reasoning: String,
}

impl Decision {
    fn attack(target: &Combatant, reasoning: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Attack,
            skill: None,
            target: Some(target.id.clone()),
            reasoning: reasoning.into(),
        }
    }

    fn skill(skill: &SkillDef, target: Option<&Combatant>, reasoning: impl Into<String>) -> Self {
        let target = if skill.target.is_single() {
            target.map(|t| t.id.clone())
        } else {
            None
        };
        Self {
            kind: DecisionKind::Skill,
            skill: Some(skill.id.clone()),
            target,
            reasoning: reasoning.into(),
        }
    }

    fn guard(reasoning: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Guard,
            skill: None,
            target: None,
            reasoning: reasoning.into(),
        }
    }

    fn flee(reasoning: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Flee,
            skill: None,
            target: None,
            reasoning: reasoning.into(),
        }
    }

    pub fn to_action(&self, actor: &str) -> Action {
        let command = match self.kind {
            DecisionKind::Attack => Command::BasicAttack {
                target: self.target.clone().unwrap_or_default(),
            },
            DecisionKind::Skill => Command::UseSkill {
                skill: self.skill.clone().unwrap_or_default(),
                targets: self.target.iter().cloned().collect(),
            },
            DecisionKind::Guard => Command::Guard,
            DecisionKind::Flee => Command::Escape,
        };
        Action::new(actor, command)
    }
}

/// Read-only battle knowledge the decision may consult.
#[derive(Debug, Clone, Copy)]
pub struct AiContext<'a> {
    pub catalog: &'a Catalog,
    pub technicals: &'a [TechnicalCombo],
    pub memory: &'a WeaknessMemory,
}

/// Choose an action for `actor`. `allies` are the actor's living teammates
/// (the actor included) and `enemies` the living opponents.
pub fn decide(
    actor: &Combatant,
    allies: &[&Combatant],
    enemies: &[&Combatant],
    ctx: &AiContext<'_>,
    dice: &mut Dice,
) -> Decision {
    let default_profile = AiProfile::default();
    let profile = actor.ai.as_ref().unwrap_or(&default_profile);
    let decision = decide_with(profile, actor, allies, enemies, ctx, dice);
    tracing::debug!(actor = %actor.id, kind = ?decision.kind, reasoning = %decision.reasoning, "ai decision");
    decision
}

fn decide_with(
    profile: &AiProfile,
    actor: &Combatant,
    allies: &[&Combatant],
    enemies: &[&Combatant],
    ctx: &AiContext<'_>,
    dice: &mut Dice,
) -> Decision {
    let skills = worth_casting(usable_skills(actor, ctx.catalog), enemies, ctx);
    let hp = actor.health.hp_fraction();
    let standing: Vec<&Combatant> = enemies
        .iter()
        .copied()
        .filter(|e| !e.flags.knocked_down)
        .collect();

    if let Some(id) = profile.emergency_skill.as_deref() {
        if hp < profile.emergency_threshold {
            if let Some(skill) = skills.iter().find(|s| s.id == id) {
                let target = if skill.target.hits_enemies() {
                    targeting::select(profile.target_priority, enemies, dice)
                } else {
                    Some(actor)
                };
                return Decision::skill(skill, target, "emergency skill");
            }
        }
    }

    let has_heal = skills.iter().any(|s| s.kind == SkillKind::Heal);
    if hp < profile.defend_threshold && !has_heal {
        return Decision::guard("low HP and no healing");
    }
    if !allies.is_empty() && enemies.len() as f64 >= allies.len() as f64 * profile.outnumbered_ratio {
        return Decision::guard("heavily outnumbered");
    }

    if profile.can_flee && hp < profile.flee_threshold {
        return Decision::flee("HP below flee threshold");
    }

    if profile.exploit_technicals {
        if let Some(decision) = technical_opportunity(profile, &skills, enemies, ctx, dice) {
            return decision;
        }
    }

    if profile.exploit_weaknesses {
        if let Some(decision) = weakness_scan(profile, &skills, &standing, ctx, dice) {
            return decision;
        }
    }

    if let Some(decision) = scripted(profile, actor, &skills, enemies, dice) {
        return decision;
    }

    archetype_fallback(profile, actor, &skills, allies, enemies, dice)
}

/// Known skills the actor could pay for right now.
fn usable_skills<'c>(actor: &Combatant, catalog: &'c Catalog) -> Vec<&'c SkillDef> {
    if actor.has_status(StatusKind::Silence) {
        return Vec::new();
    }
    actor
        .skills
        .iter()
        .filter_map(|id| catalog.skill(id).ok())
        .filter(|s| can_afford(&actor.health, s.mp_cost, s.hp_cost_for(actor.health.max_hp)))
        .collect()
}

/// Drop attack skills every enemy is known to shrug off, reflect or absorb.
fn worth_casting<'c>(
    skills: Vec<&'c SkillDef>,
    enemies: &[&Combatant],
    ctx: &AiContext<'_>,
) -> Vec<&'c SkillDef> {
    skills
        .into_iter()
        .filter(|s| {
            !is_attack_skill(s)
                || enemies.is_empty()
                || enemies.iter().any(|e| {
                    ctx.memory
                        .known(&e.id, s.element)
                        .is_none_or(|a| a.deals_damage())
                })
        })
        .collect()
}

fn is_attack_skill(skill: &SkillDef) -> bool {
    skill.kind == SkillKind::Damage && skill.is_offensive()
}

fn skill_strength(skill: &SkillDef) -> f64 {
    skill.base_power * skill.power_multiplier * skill.hit_count.max(1) as f64
}

fn strongest<'c>(skills: &[&'c SkillDef]) -> Option<&'c SkillDef> {
    let mut best: Option<&'c SkillDef> = None;
    for &s in skills.iter().filter(|s| is_attack_skill(s)) {
        if best.is_none_or(|b| skill_strength(s) > skill_strength(b)) {
            best = Some(s);
        }
    }
    best
}

fn technical_opportunity(
    profile: &AiProfile,
    skills: &[&SkillDef],
    enemies: &[&Combatant],
    ctx: &AiContext<'_>,
    dice: &mut Dice,
) -> Option<Decision> {
    for &skill in skills.iter().filter(|s| is_attack_skill(s)) {
        let open: Vec<&Combatant> = enemies
            .iter()
            .copied()
            .filter(|e| technical::can_trigger(ctx.technicals, e, skill.element))
            .collect();
        if let Some(target) = targeting::select(profile.target_priority, &open, dice) {
            return Some(Decision::skill(
                skill,
                Some(target),
                format!("technical on {} with {:?}", target.id, skill.element),
            ));
        }
    }
    let open: Vec<&Combatant> = enemies
        .iter()
        .copied()
        .filter(|e| technical::can_trigger(ctx.technicals, e, Element::Physical))
        .collect();
    let target = targeting::select(profile.target_priority, &open, dice)?;
    Some(Decision::attack(target, format!("technical attack on {}", target.id)))
}

fn weakness_scan(
    profile: &AiProfile,
    skills: &[&SkillDef],
    standing: &[&Combatant],
    ctx: &AiContext<'_>,
    dice: &mut Dice,
) -> Option<Decision> {
    let attack_skills: Vec<&SkillDef> = skills.iter().copied().filter(|s| is_attack_skill(s)).collect();

    for &skill in &attack_skills {
        let weak: Vec<&Combatant> = standing
            .iter()
            .copied()
            .filter(|e| ctx.memory.is_weak(&e.id, skill.element))
            .collect();
        if let Some(target) = targeting::select(profile.target_priority, &weak, dice) {
            return Some(Decision::skill(
                skill,
                Some(target),
                format!("known weakness of {} to {:?}", target.id, skill.element),
            ));
        }
    }
    let weak_to_physical: Vec<&Combatant> = standing
        .iter()
        .copied()
        .filter(|e| ctx.memory.is_weak(&e.id, Element::Physical))
        .collect();
    if let Some(target) = targeting::select(profile.target_priority, &weak_to_physical, dice) {
        return Some(Decision::attack(target, format!("known physical weakness of {}", target.id)));
    }

    for &skill in attack_skills.iter().filter(|s| s.element != Element::Almighty) {
        let untested: Vec<&Combatant> = standing
            .iter()
            .copied()
            .filter(|e| !ctx.memory.tested(&e.id, skill.element))
            .collect();
        if let Some(target) = targeting::select(profile.target_priority, &untested, dice) {
            return Some(Decision::skill(
                skill,
                Some(target),
                format!("probing {} with {:?}", target.id, skill.element),
            ));
        }
    }
    None
}

fn scripted(
    profile: &AiProfile,
    actor: &Combatant,
    skills: &[&SkillDef],
    enemies: &[&Combatant],
    dice: &mut Dice,
) -> Option<Decision> {
    if profile.pattern.is_empty() {
        return None;
    }
    let step = actor.flags.turns_taken.saturating_sub(1) as usize % profile.pattern.len();
    let entry = profile.pattern[step].as_str();
    let reasoning = format!("pattern step {}", step);
    match entry {
        "guard" => Some(Decision::guard(reasoning)),
        "attack" => {
            let target = targeting::select(profile.target_priority, enemies, dice)?;
            Some(Decision::attack(target, reasoning))
        }
        id => {
            let skill = skills.iter().copied().find(|s| s.id == id)?;
            let target = if skill.target.hits_enemies() {
                targeting::select(profile.target_priority, enemies, dice)
            } else {
                Some(actor)
            };
            Some(Decision::skill(skill, target, reasoning))
        }
    }
}

fn archetype_fallback(
    profile: &AiProfile,
    actor: &Combatant,
    skills: &[&SkillDef],
    allies: &[&Combatant],
    enemies: &[&Combatant],
    dice: &mut Dice,
) -> Decision {
    let hp = actor.health.hp_fraction();
    let heal = skills.iter().copied().find(|s| s.kind == SkillKind::Heal);
    let priority = profile.target_priority;

    let basic = |dice: &mut Dice, reasoning: &str| -> Decision {
        match targeting::select(priority, enemies, dice) {
            Some(target) => Decision::attack(target, reasoning),
            None => Decision::guard("no target"),
        }
    };

    match profile.archetype {
        Archetype::Aggressive => match strongest(skills) {
            Some(skill) => {
                let target = targeting::select(priority, enemies, dice);
                Decision::skill(skill, target, "aggressive: strongest skill")
            }
            None => basic(dice, "aggressive: attack"),
        },
        Archetype::Defensive => {
            if hp < 0.5 {
                if let Some(skill) = heal {
                    return Decision::skill(skill, Some(actor), "defensive: self heal");
                }
                return Decision::guard("defensive: brace");
            }
            basic(dice, "defensive: attack")
        }
        Archetype::Balanced => {
            if let Some(skill) = heal {
                let hurt: Vec<&Combatant> = allies
                    .iter()
                    .copied()
                    .filter(|a| a.health.hp_fraction() < 0.5)
                    .collect();
                if let Some(target) = targeting::select(TargetPriority::LowestHp, &hurt, dice) {
                    return Decision::skill(skill, Some(target), "balanced: heal ally");
                }
            }
            match strongest(skills) {
                Some(skill) if actor.health.mp_fraction() > 0.5 => {
                    let target = targeting::select(priority, enemies, dice);
                    Decision::skill(skill, target, "balanced: skill while MP holds")
                }
                _ => basic(dice, "balanced: attack"),
            }
        }
        Archetype::Tactical => {
            let Some(target) = targeting::select(TargetPriority::MostVulnerable, enemies, dice) else {
                return Decision::guard("no target");
            };
            if !target.has_any_ailment() {
                let inflicter = skills.iter().copied().find(|s| {
                    s.target.hits_enemies() && s.inflicts.iter().any(|i| i.kind.is_ailment())
                });
                if let Some(skill) = inflicter {
                    return Decision::skill(skill, Some(target), "tactical: set up ailment");
                }
            }
            match strongest(skills) {
                Some(skill) => Decision::skill(skill, Some(target), "tactical: press the vulnerable"),
                None => Decision::attack(target, "tactical: attack the vulnerable"),
            }
        }
        Archetype::Berserk => match targeting::select(TargetPriority::Random, enemies, dice) {
            Some(target) => Decision::attack(target, "berserk"),
            None => Decision::guard("no target"),
        },
        Archetype::Supportive => {
            if let Some(skill) = heal {
                let hurt: Vec<&Combatant> = allies
                    .iter()
                    .copied()
                    .filter(|a| a.health.hp_fraction() < 0.7)
                    .collect();
                if let Some(target) = targeting::select(TargetPriority::LowestHp, &hurt, dice) {
                    return Decision::skill(skill, Some(target), "supportive: heal");
                }
            }
            for &skill in skills.iter().filter(|s| s.kind == SkillKind::Support) {
                if !matches!(skill.target, TargetShape::SingleAlly | TargetShape::AllAllies | TargetShape::User) {
                    continue;
                }
                let buffs: Vec<StatusKind> = skill
                    .inflicts
                    .iter()
                    .map(|i| i.kind)
                    .filter(|k| k.category() == StatusCategory::Buff)
                    .collect();
                let lacking = allies
                    .iter()
                    .copied()
                    .find(|a| buffs.iter().any(|k| !a.has_status(*k)));
                if let Some(target) = lacking {
                    return Decision::skill(skill, Some(target), "supportive: buff");
                }
            }
            basic(dice, "supportive: attack")
        }
        Archetype::Cowardly => {
            if hp < 0.5 {
                if profile.can_flee {
                    return Decision::flee("cowardly: run");
                }
                return Decision::guard("cowardly: hide");
            }
            match targeting::select(TargetPriority::LowestHp, enemies, dice) {
                Some(target) => Decision::attack(target, "cowardly: pick on the weakest"),
                None => Decision::guard("no target"),
            }
        }
    }
}
