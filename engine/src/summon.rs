//! Summon cooldowns and the lifecycle of persistent summoned combatants.

use indexmap::IndexMap;

use crate::combatant::{BattleFlags, Combatant, CombatantId, Roster};
use crate::data::{PersistentSummon, SummonDef};
use crate::error::ActionError;
use crate::events::DismissReason;
use crate::life::{Health, can_afford};

pub fn instance_id(summoner: &str, summon: &str) -> CombatantId {
    format!("{}:{}", summoner, summon)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSummon {
    pub summoner: CombatantId,
    pub summon: String,
    pub remaining: u32,
    pub dies_with_summoner: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SummonRegistry {
    cooldowns: IndexMap<(CombatantId, String), u32>,
    active: IndexMap<CombatantId, ActiveSummon>,
}

impl SummonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cooldown(&self, summoner: &str, summon: &str) -> u32 {
        self.cooldowns
            .get(&(summoner.to_string(), summon.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_active(&self, instance: &str) -> bool {
        self.active.contains_key(instance)
    }

    pub fn active(&self) -> impl Iterator<Item = (&CombatantId, &ActiveSummon)> {
        self.active.iter()
    }

    /// Every check that must pass before any cost is paid.
    pub fn validate(&self, actor: &Combatant, def: &SummonDef) -> Result<(), ActionError> {
        if !actor.summons.iter().any(|s| s == &def.id) {
            return Err(ActionError::NotKnown {
                actor: actor.id.clone(),
                id: def.id.clone(),
            });
        }
        let turns = self.cooldown(&actor.id, &def.id);
        if turns > 0 {
            return Err(ActionError::SummonOnCooldown {
                summon: def.id.clone(),
                turns,
            });
        }
        if def.persistent.is_some() && self.is_active(&instance_id(&actor.id, &def.id)) {
            return Err(ActionError::SummonAlreadyActive(def.id.clone()));
        }
        if actor.health.mp < def.mp_cost {
            return Err(ActionError::InsufficientMp {
                need: def.mp_cost,
                have: actor.health.mp,
            });
        }
        if !can_afford(&actor.health, 0, def.hp_cost) {
            return Err(ActionError::InsufficientHp {
                need: def.hp_cost,
                have: actor.health.hp,
            });
        }
        Ok(())
    }

    pub fn start_cooldown(&mut self, summoner: &str, def: &SummonDef) {
        if def.cooldown_turns > 0 {
            self.cooldowns
                .insert((summoner.to_string(), def.id.clone()), def.cooldown_turns);
        }
    }

    /// Build the transient combatant for a persistent summon and start tracking it.
    pub fn spawn(&mut self, summoner: &Combatant, def: &SummonDef, spec: &PersistentSummon) -> Combatant {
        let id = instance_id(&summoner.id, &def.id);
        self.active.insert(
            id.clone(),
            ActiveSummon {
                summoner: summoner.id.clone(),
                summon: def.id.clone(),
                remaining: spec.duration_turns,
                dies_with_summoner: spec.dies_with_summoner,
            },
        );
        Combatant {
            id,
            name: def.name.clone(),
            side: summoner.side,
            level: summoner.level,
            health: Health::new(spec.max_hp.max(1), spec.max_mp),
            base: spec.stats,
            affinities: spec.affinities.clone(),
            status_resist: IndexMap::new(),
            statuses: Vec::new(),
            skills: spec.skills.clone(),
            limit_breaks: Vec::new(),
            summons: Vec::new(),
            advanced_guard: false,
            ai: spec.ai.clone(),
            rewards: None,
            summoned_by: Some(summoner.id.clone()),
            flags: BattleFlags {
                // Joins the turn order from the next round.
                has_acted: true,
                ..BattleFlags::default()
            },
        }
    }

    /// Round end: cooldowns tick down and every persistent summon ages one turn.
    /// Returns the instances whose duration ran out.
    pub fn tick_round(&mut self) -> Vec<CombatantId> {
        for turns in self.cooldowns.values_mut() {
            *turns = turns.saturating_sub(1);
        }
        self.cooldowns.retain(|_, turns| *turns > 0);

        let mut expired = Vec::new();
        for (id, active) in self.active.iter_mut() {
            active.remaining = active.remaining.saturating_sub(1);
            if active.remaining == 0 {
                expired.push(id.clone());
            }
        }
        expired
    }

    /// Instances that must leave now: fallen summons, and summons bound to a fallen summoner.
    pub fn casualties(&self, roster: &Roster) -> Vec<(CombatantId, DismissReason)> {
        let mut out = Vec::new();
        for (id, active) in &self.active {
            let alive = roster.get(id).is_some_and(|c| c.is_alive());
            if !alive {
                out.push((id.clone(), DismissReason::Defeated));
                continue;
            }
            let summoner_alive = roster.get(&active.summoner).is_some_and(|c| c.is_alive());
            if active.dies_with_summoner && !summoner_alive {
                out.push((id.clone(), DismissReason::SummonerFell));
            }
        }
        out
    }

    /// Stop tracking `instance` and take it out of the roster.
    pub fn dismiss(&mut self, roster: &mut Roster, instance: &str) -> Option<Combatant> {
        self.active.shift_remove(instance);
        roster.remove(instance)
    }
}
