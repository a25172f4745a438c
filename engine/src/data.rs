//! Immutable records supplied by the data provider, keyed by string id.
//!
//! The engine only reads these; runtime state lives on [`crate::Combatant`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ai::AiProfile;
use crate::combatant::{CombatantId, Stats};
use crate::element::{Affinity, Element};
use crate::error::DataError;
use crate::status::StatusKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetShape {
    #[default]
    SingleEnemy,
    AllEnemies,
    SingleAlly,
    AllAllies,
    User,
}

impl TargetShape {
    pub fn hits_enemies(self) -> bool {
        matches!(self, TargetShape::SingleEnemy | TargetShape::AllEnemies)
    }

    pub fn is_single(self) -> bool {
        matches!(self, TargetShape::SingleEnemy | TargetShape::SingleAlly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    #[default]
    Damage,
    Heal,
    Revive,
    Support,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusInflict {
    pub kind: StatusKind,
    /// Percent chance the inflict roll lands before the target's resistance roll.
    #[serde(default = "hundred")]
    pub chance: f64,
    /// Turns; negative for "until cured".
    #[serde(default = "default_duration")]
    pub duration: i32,
    #[serde(default)]
    pub power: i32,
}

impl StatusInflict {
    pub fn new(kind: StatusKind, chance: f64, duration: i32) -> Self {
        Self {
            kind,
            chance,
            duration,
            power: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct HealSpec {
    #[serde(default)]
    pub flat: i32,
    /// Percent of the target's max HP.
    #[serde(default)]
    pub percent: f64,
    /// Added fraction of the caster's magic attack.
    #[serde(default)]
    pub magic_scaling: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: SkillKind,
    #[serde(default)]
    pub element: Element,
    #[serde(default)]
    pub target: TargetShape,
    #[serde(default = "hundred")]
    pub base_power: f64,
    #[serde(default = "one")]
    pub power_multiplier: f64,
    #[serde(default)]
    pub mp_cost: i32,
    /// Percent of the user's max HP.
    #[serde(default)]
    pub hp_cost_percent: f64,
    #[serde(default = "one_hit")]
    pub hit_count: u32,
    #[serde(default = "hundred")]
    pub accuracy: f64,
    #[serde(default)]
    pub crit_bonus: f64,
    #[serde(default)]
    pub inflicts: Vec<StatusInflict>,
    #[serde(default)]
    pub heal: Option<HealSpec>,
    #[serde(default = "default_revive")]
    pub revive_percent: f64,
    #[serde(default)]
    pub cures: Vec<StatusKind>,
    #[serde(default)]
    pub cure_debuffs: bool,
}

impl SkillDef {
    pub fn damage(id: &str, element: Element, base_power: f64) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            kind: SkillKind::Damage,
            element,
            target: TargetShape::SingleEnemy,
            base_power,
            power_multiplier: 1.0,
            mp_cost: 0,
            hp_cost_percent: 0.0,
            hit_count: 1,
            accuracy: 100.0,
            crit_bonus: 0.0,
            inflicts: Vec::new(),
            heal: None,
            revive_percent: default_revive(),
            cures: Vec::new(),
            cure_debuffs: false,
        }
    }

    pub fn healing(id: &str, heal: HealSpec) -> Self {
        Self {
            kind: SkillKind::Heal,
            target: TargetShape::SingleAlly,
            heal: Some(heal),
            ..Self::damage(id, Element::Almighty, 0.0)
        }
    }

    pub fn support(id: &str, target: TargetShape, inflicts: Vec<StatusInflict>) -> Self {
        Self {
            kind: SkillKind::Support,
            target,
            inflicts,
            ..Self::damage(id, Element::Almighty, 0.0)
        }
    }

    pub fn with_mp_cost(mut self, mp: i32) -> Self {
        self.mp_cost = mp;
        self
    }

    pub fn with_target(mut self, target: TargetShape) -> Self {
        self.target = target;
        self
    }

    pub fn with_inflict(mut self, inflict: StatusInflict) -> Self {
        self.inflicts.push(inflict);
        self
    }

    pub fn is_offensive(&self) -> bool {
        self.target.hits_enemies()
    }

    /// HP paid by a user with `max_hp`; at least 1 when the skill costs HP at all.
    pub fn hp_cost_for(&self, max_hp: i32) -> i32 {
        if self.hp_cost_percent <= 0.0 {
            return 0;
        }
        crate::to_points(max_hp as f64 * self.hp_cost_percent / 100.0).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedDamage {
    #[serde(default)]
    pub element: Element,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    #[serde(default = "ally_target")]
    pub target: TargetShape,
    #[serde(default)]
    pub heal: Option<HealSpec>,
    #[serde(default)]
    pub restore_mp: i32,
    /// Percent of max HP restored to a dead target.
    #[serde(default)]
    pub revive_percent: Option<f64>,
    #[serde(default)]
    pub cures: Vec<StatusKind>,
    #[serde(default)]
    pub cure_debuffs: bool,
    #[serde(default)]
    pub damage: Option<FixedDamage>,
    #[serde(default)]
    pub inflicts: Vec<StatusInflict>,
}

impl ItemDef {
    pub fn potion(id: &str, flat: i32) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            target: TargetShape::SingleAlly,
            heal: Some(HealSpec {
                flat,
                ..HealSpec::default()
            }),
            restore_mp: 0,
            revive_percent: None,
            cures: Vec::new(),
            cure_debuffs: false,
            damage: None,
            inflicts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitBreakDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub element: Element,
    #[serde(default = "all_enemies")]
    pub target: TargetShape,
    #[serde(default = "hundred")]
    pub base_power: f64,
    #[serde(default = "one")]
    pub power_multiplier: f64,
    #[serde(default = "one_hit")]
    pub hit_count: u32,
    #[serde(default)]
    pub crit_bonus: f64,
    #[serde(default)]
    pub ignores_defense: bool,
    #[serde(default)]
    pub pierces_immunity: bool,
    /// Fraction of max HP at or below which a hit kills outright.
    #[serde(default)]
    pub instant_kill_threshold: Option<f64>,
    /// Named partner for duo variants; both gauges must be full.
    #[serde(default)]
    pub duo_partner: Option<CombatantId>,
    #[serde(default = "default_duo_bonus")]
    pub duo_bonus: f64,
    #[serde(default)]
    pub inflicts: Vec<StatusInflict>,
    #[serde(default)]
    pub grants_extra_turn: bool,
    #[serde(default)]
    pub self_heal_percent: f64,
    #[serde(default)]
    pub self_buffs: Vec<StatusInflict>,
    /// The opposing side loses this many of its next turns.
    #[serde(default)]
    pub stop_time_turns: u32,
}

impl LimitBreakDef {
    pub fn new(id: &str, base_power: f64) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            element: Element::Physical,
            target: TargetShape::SingleEnemy,
            base_power,
            power_multiplier: 1.0,
            hit_count: 1,
            crit_bonus: 0.0,
            ignores_defense: false,
            pierces_immunity: false,
            instant_kill_threshold: None,
            duo_partner: None,
            duo_bonus: default_duo_bonus(),
            inflicts: Vec::new(),
            grants_extra_turn: false,
            self_heal_percent: 0.0,
            self_buffs: Vec::new(),
            stop_time_turns: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShowtimeTrigger {
    /// Both members must be above the HP floor.
    #[default]
    Healthy,
    /// At least one member must be at or below the HP floor.
    Desperate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowtimeDef {
    pub id: String,
    pub name: String,
    pub members: [CombatantId; 2],
    /// Percent chance per round once eligible.
    #[serde(default = "default_showtime_chance")]
    pub trigger_chance: f64,
    /// Fraction of max HP.
    #[serde(default)]
    pub min_hp_percent: f64,
    #[serde(default)]
    pub trigger: ShowtimeTrigger,
    #[serde(default = "default_showtime_cooldown")]
    pub cooldown_turns: u32,
    #[serde(default = "hundred")]
    pub base_power: f64,
    #[serde(default = "one")]
    pub power_multiplier: f64,
    #[serde(default = "all_enemies")]
    pub target: TargetShape,
    #[serde(default = "almighty")]
    pub element: Element,
    #[serde(default)]
    pub crit_bonus: f64,
    #[serde(default)]
    pub ignores_defense: bool,
    #[serde(default)]
    pub instant_kill_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SummonEffect {
    #[serde(default)]
    pub damage: Option<FixedDamage>,
    #[serde(default)]
    pub heal: Option<HealSpec>,
    #[serde(default)]
    pub inflicts: Vec<StatusInflict>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentSummon {
    pub duration_turns: u32,
    pub max_hp: i32,
    #[serde(default)]
    pub max_mp: i32,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub affinities: IndexMap<Element, Affinity>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Ticks once per round while the summon is on the field.
    #[serde(default)]
    pub passive: SummonEffect,
    #[serde(default)]
    pub dies_with_summoner: bool,
    #[serde(default)]
    pub ai: Option<AiProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummonDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mp_cost: i32,
    #[serde(default)]
    pub hp_cost: i32,
    #[serde(default)]
    pub cooldown_turns: u32,
    #[serde(default = "all_enemies")]
    pub target: TargetShape,
    /// One-shot effect for instant summons.
    #[serde(default)]
    pub effect: SummonEffect,
    /// When present the summon joins the roster instead of resolving instantly.
    #[serde(default)]
    pub persistent: Option<PersistentSummon>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item: String,
    /// Percent.
    pub chance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoldSteal {
    pub amount: u64,
    pub chance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EnemyRewards {
    #[serde(default)]
    pub exp: u64,
    #[serde(default)]
    pub gold: u64,
    #[serde(default)]
    pub drops: Vec<LootEntry>,
    #[serde(default)]
    pub steal: Vec<LootEntry>,
    #[serde(default)]
    pub steal_gold: Option<GoldSteal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    skills: Vec<SkillDef>,
    #[serde(default)]
    items: Vec<ItemDef>,
    #[serde(default)]
    limit_breaks: Vec<LimitBreakDef>,
    #[serde(default)]
    showtimes: Vec<ShowtimeDef>,
    #[serde(default)]
    summons: Vec<SummonDef>,
}

/// All data records available to one battle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "CatalogFile")]
pub struct Catalog {
    skills: IndexMap<String, SkillDef>,
    items: IndexMap<String, ItemDef>,
    limit_breaks: IndexMap<String, LimitBreakDef>,
    showtimes: IndexMap<String, ShowtimeDef>,
    summons: IndexMap<String, SummonDef>,
}

impl From<CatalogFile> for Catalog {
    fn from(file: CatalogFile) -> Self {
        let mut catalog = Catalog::default();
        for s in file.skills {
            catalog = catalog.with_skill(s);
        }
        for i in file.items {
            catalog = catalog.with_item(i);
        }
        for l in file.limit_breaks {
            catalog = catalog.with_limit_break(l);
        }
        for s in file.showtimes {
            catalog = catalog.with_showtime(s);
        }
        for s in file.summons {
            catalog = catalog.with_summon(s);
        }
        catalog
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skill(mut self, skill: SkillDef) -> Self {
        self.skills.insert(skill.id.clone(), skill);
        self
    }

    pub fn with_item(mut self, item: ItemDef) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    pub fn with_limit_break(mut self, limit: LimitBreakDef) -> Self {
        self.limit_breaks.insert(limit.id.clone(), limit);
        self
    }

    pub fn with_showtime(mut self, showtime: ShowtimeDef) -> Self {
        self.showtimes.insert(showtime.id.clone(), showtime);
        self
    }

    pub fn with_summon(mut self, summon: SummonDef) -> Self {
        self.summons.insert(summon.id.clone(), summon);
        self
    }

    pub fn skill(&self, id: &str) -> Result<&SkillDef, DataError> {
        self.skills
            .get(id)
            .ok_or_else(|| DataError::MissingSkill(id.to_string()))
    }

    pub fn item(&self, id: &str) -> Result<&ItemDef, DataError> {
        self.items
            .get(id)
            .ok_or_else(|| DataError::MissingItem(id.to_string()))
    }

    pub fn limit_break(&self, id: &str) -> Result<&LimitBreakDef, DataError> {
        self.limit_breaks
            .get(id)
            .ok_or_else(|| DataError::MissingLimitBreak(id.to_string()))
    }

    pub fn showtime(&self, id: &str) -> Result<&ShowtimeDef, DataError> {
        self.showtimes
            .get(id)
            .ok_or_else(|| DataError::MissingShowtime(id.to_string()))
    }

    pub fn summon(&self, id: &str) -> Result<&SummonDef, DataError> {
        self.summons
            .get(id)
            .ok_or_else(|| DataError::MissingSummon(id.to_string()))
    }

    pub fn showtimes(&self) -> impl Iterator<Item = &ShowtimeDef> {
        self.showtimes.values()
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

fn hundred() -> f64 {
    100.0
}

fn one() -> f64 {
    1.0
}

fn one_hit() -> u32 {
    1
}

fn default_duration() -> i32 {
    3
}

fn default_revive() -> f64 {
    50.0
}

fn default_duo_bonus() -> f64 {
    1.5
}

fn default_showtime_chance() -> f64 {
    30.0
}

fn default_showtime_cooldown() -> u32 {
    5
}

fn ally_target() -> TargetShape {
    TargetShape::SingleAlly
}

fn all_enemies() -> TargetShape {
    TargetShape::AllEnemies
}

fn almighty() -> Element {
    Element::Almighty
}
