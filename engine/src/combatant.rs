//! Battle-scoped combatants and the roster that owns them.
//!
//! A [`Combatant`] is created from an external [`CombatantSpec`] snapshot at
//! battle start and lives only as long as the [`Roster`] holding it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ai::AiProfile;
use crate::data::EnemyRewards;
use crate::element::{Affinity, Element};
use crate::error::SetupError;
use crate::life::Health;
use crate::rewards::PartyDelta;
use crate::status::{StatusInstance, StatusKind};

pub type CombatantId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Party,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Party => Side::Enemy,
            Side::Enemy => Side::Party,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Party => "party",
            Side::Enemy => "enemy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub magic_attack: i32,
    #[serde(default)]
    pub magic_defense: i32,
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub luck: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardState {
    /// Fraction of incoming damage removed, e.g. 0.5.
    pub reduction: f64,
    /// Set on the turn the guard was raised; the guard drops at the end of the next turn.
    pub fresh: bool,
}

/// Flags that only exist for the duration of a battle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BattleFlags {
    pub knocked_down: bool,
    pub has_extra_turn: bool,
    pub has_acted: bool,
    pub guard: Option<GuardState>,
    /// 0..=100.
    pub limit_gauge: f64,
    pub baton_level: u32,
    pub turns_taken: u32,
}

#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub level: u32,
    pub health: Health,
    pub base: Stats,
    pub affinities: IndexMap<Element, Affinity>,
    /// Chance in percent to shrug off each status kind.
    pub status_resist: IndexMap<StatusKind, f64>,
    pub statuses: Vec<StatusInstance>,
    pub skills: Vec<String>,
    pub limit_breaks: Vec<String>,
    pub summons: Vec<String>,
    pub advanced_guard: bool,
    pub ai: Option<AiProfile>,
    pub rewards: Option<EnemyRewards>,
    /// Present for transient summoned combatants.
    pub summoned_by: Option<CombatantId>,
    pub flags: BattleFlags,
}

impl Combatant {
    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.statuses.iter().any(|s| s.kind == kind)
    }

    pub fn status(&self, kind: StatusKind) -> Option<&StatusInstance> {
        self.statuses.iter().find(|s| s.kind == kind)
    }

    pub fn has_any_ailment(&self) -> bool {
        self.statuses.iter().any(|s| s.kind.is_ailment())
    }

    /// The single place that decides whether this combatant may take an action.
    pub fn can_act(&self) -> bool {
        self.is_alive() && !self.statuses.iter().any(|s| s.kind.prevents_action())
    }

    pub fn limit_ready(&self) -> bool {
        self.flags.limit_gauge >= 100.0
    }

    pub fn is_guarding(&self) -> bool {
        self.flags.guard.is_some()
    }

    /// Affinity table lookup, with the Reflect status overriding every magic element.
    pub fn affinity(&self, element: Element) -> Affinity {
        if element == Element::Almighty {
            return Affinity::Normal;
        }
        if element.is_magic() && self.has_status(StatusKind::Reflect) {
            return Affinity::Reflect;
        }
        self.affinities.get(&element).copied().unwrap_or_default()
    }

    /// Base stats adjusted by active stat-modifying statuses.
    pub fn effective_stats(&self) -> Stats {
        let mut stats = self.base;
        for inst in &self.statuses {
            let pct = inst.effective_power() as f64 / 100.0;
            let scale = |v: i32, up: bool| -> i32 {
                let f = if up { 1.0 + pct } else { (1.0 - pct).max(0.0) };
                crate::to_points(v as f64 * f)
            };
            match inst.kind {
                StatusKind::AttackUp | StatusKind::AttackDown => {
                    let up = inst.kind == StatusKind::AttackUp;
                    stats.attack = scale(stats.attack, up);
                    stats.magic_attack = scale(stats.magic_attack, up);
                }
                StatusKind::DefenseUp | StatusKind::DefenseDown => {
                    let up = inst.kind == StatusKind::DefenseUp;
                    stats.defense = scale(stats.defense, up);
                    stats.magic_defense = scale(stats.magic_defense, up);
                }
                StatusKind::SpeedUp | StatusKind::SpeedDown => {
                    stats.speed = scale(stats.speed, inst.kind == StatusKind::SpeedUp);
                }
                _ => {}
            }
        }
        stats
    }

    pub fn status_resistance(&self, kind: StatusKind) -> f64 {
        self.status_resist.get(&kind).copied().unwrap_or(0.0)
    }

    /// Clear everything that does not survive a knock-out.
    pub(crate) fn on_death(&mut self) {
        self.statuses.clear();
        self.flags.knocked_down = false;
        self.flags.has_extra_turn = false;
        self.flags.guard = None;
        self.flags.baton_level = 0;
    }

    pub(crate) fn add_gauge(&mut self, amount: f64) -> bool {
        if !self.is_alive() || amount <= 0.0 {
            return false;
        }
        let was_ready = self.limit_ready();
        self.flags.limit_gauge = (self.flags.limit_gauge + amount).min(100.0);
        !was_ready && self.limit_ready()
    }
}

/// External stat snapshot a combatant is created from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantSpec {
    pub id: CombatantId,
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u32,
    pub max_hp: i32,
    /// Current HP; defaults to `max_hp`.
    #[serde(default)]
    pub hp: Option<i32>,
    #[serde(default)]
    pub max_mp: i32,
    #[serde(default)]
    pub mp: Option<i32>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub affinities: IndexMap<Element, Affinity>,
    #[serde(default)]
    pub status_resist: IndexMap<StatusKind, f64>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub limit_breaks: Vec<String>,
    #[serde(default)]
    pub summons: Vec<String>,
    #[serde(default)]
    pub advanced_guard: bool,
    #[serde(default)]
    pub ai: Option<AiProfile>,
    #[serde(default)]
    pub rewards: Option<EnemyRewards>,
    #[serde(default)]
    pub exp: u64,
}

fn default_level() -> u32 {
    1
}

impl CombatantSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_hp: i32, stats: Stats) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level: 1,
            max_hp,
            hp: None,
            max_mp: 0,
            mp: None,
            stats,
            affinities: IndexMap::new(),
            status_resist: IndexMap::new(),
            skills: Vec::new(),
            limit_breaks: Vec::new(),
            summons: Vec::new(),
            advanced_guard: false,
            ai: None,
            rewards: None,
            exp: 0,
        }
    }

    pub fn to_combatant(&self, side: Side) -> Combatant {
        Combatant {
            id: self.id.clone(),
            name: self.name.clone(),
            side,
            level: self.level,
            health: Health::with_current(
                self.hp.unwrap_or(self.max_hp),
                self.max_hp,
                self.mp.unwrap_or(self.max_mp),
                self.max_mp,
            ),
            base: self.stats,
            affinities: self.affinities.clone(),
            status_resist: self.status_resist.clone(),
            statuses: Vec::new(),
            skills: self.skills.clone(),
            limit_breaks: self.limit_breaks.clone(),
            summons: self.summons.clone(),
            advanced_guard: self.advanced_guard,
            ai: self.ai.clone(),
            rewards: self.rewards.clone(),
            summoned_by: None,
            flags: BattleFlags::default(),
        }
    }

    /// Persist a party member's end-of-battle pools and experience.
    pub fn write_back(&mut self, delta: &PartyDelta) {
        if delta.id != self.id {
            return;
        }
        self.hp = Some(delta.hp.clamp(0, self.max_hp));
        self.mp = Some(delta.mp.clamp(0, self.max_mp));
        self.exp += delta.exp_gained;
    }
}

/// Every combatant in one battle, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: IndexMap<CombatantId, Combatant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, combatant: Combatant) -> Result<(), SetupError> {
        if self.members.contains_key(&combatant.id) {
            return Err(SetupError::DuplicateId(combatant.id));
        }
        self.members.insert(combatant.id.clone(), combatant);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Combatant> {
        self.members.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Combatant> {
        self.members.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Combatant> {
        self.members.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.members.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.members.values_mut()
    }

    pub fn side(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.members.values().filter(move |c| c.side == side)
    }

    pub fn living(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.side(side).filter(|c| c.is_alive())
    }

    pub fn living_ids(&self, side: Side) -> Vec<CombatantId> {
        self.living(side).map(|c| c.id.clone()).collect()
    }

    pub fn all_defeated(&self, side: Side) -> bool {
        self.living(side).next().is_none()
    }

    /// Every non-summoned member is dead or has fled.
    pub fn principals_defeated(&self, side: Side) -> bool {
        self.side(side)
            .filter(|c| c.summoned_by.is_none())
            .all(|c| !c.is_alive())
    }

    /// Dead-or-knocked-down for every member, with at least one living and down.
    pub fn all_down_or_dead(&self, side: Side) -> bool {
        let mut any_down = false;
        for c in self.side(side) {
            if c.is_alive() {
                if !c.flags.knocked_down {
                    return false;
                }
                any_down = true;
            }
        }
        any_down
    }

    pub fn average_speed(&self, side: Side) -> f64 {
        average(self.living(side).map(|c| c.effective_stats().speed as f64))
    }

    pub fn average_hp_fraction(&self, side: Side) -> f64 {
        average(self.living(side).map(|c| c.health.hp_fraction()))
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0u32), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}
