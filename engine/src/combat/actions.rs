use serde::{Deserialize, Serialize};

use crate::combatant::CombatantId;
use crate::status::StatusKind;

/// What the acting combatant chose to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    BasicAttack {
        target: CombatantId,
    },
    UseSkill {
        skill: String,
        #[serde(default)]
        targets: Vec<CombatantId>,
    },
    UseItem {
        item: String,
        #[serde(default)]
        targets: Vec<CombatantId>,
    },
    Guard,
    Escape,
    AllOutAttack,
    UseLimitBreak {
        limit: String,
        #[serde(default)]
        partner: Option<CombatantId>,
        #[serde(default)]
        targets: Vec<CombatantId>,
    },
    UseSummon {
        summon: String,
        #[serde(default)]
        targets: Vec<CombatantId>,
    },
    BatonPass {
        to: CombatantId,
    },
    Steal {
        target: CombatantId,
    },
    Mug {
        target: CombatantId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    BasicAttack,
    Skill,
    Item,
    Guard,
    Escape,
    AllOutAttack,
    LimitBreak,
    Summon,
    BatonPass,
    Steal,
    Mug,
    Showtime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub actor: CombatantId,
    pub command: Command,
}

impl Action {
    pub fn new(actor: impl Into<String>, command: Command) -> Self {
        Self {
            actor: actor.into(),
            command,
        }
    }

    pub fn attack(actor: &str, target: &str) -> Self {
        Self::new(
            actor,
            Command::BasicAttack {
                target: target.to_string(),
            },
        )
    }

    pub fn skill(actor: &str, skill: &str, targets: &[&str]) -> Self {
        Self::new(
            actor,
            Command::UseSkill {
                skill: skill.to_string(),
                targets: targets.iter().map(|t| t.to_string()).collect(),
            },
        )
    }

    pub fn item(actor: &str, item: &str, targets: &[&str]) -> Self {
        Self::new(
            actor,
            Command::UseItem {
                item: item.to_string(),
                targets: targets.iter().map(|t| t.to_string()).collect(),
            },
        )
    }

    pub fn guard(actor: &str) -> Self {
        Self::new(actor, Command::Guard)
    }

    pub fn escape(actor: &str) -> Self {
        Self::new(actor, Command::Escape)
    }

    pub fn all_out_attack(actor: &str) -> Self {
        Self::new(actor, Command::AllOutAttack)
    }

    pub fn limit_break(actor: &str, limit: &str, partner: Option<&str>, targets: &[&str]) -> Self {
        Self::new(
            actor,
            Command::UseLimitBreak {
                limit: limit.to_string(),
                partner: partner.map(str::to_string),
                targets: targets.iter().map(|t| t.to_string()).collect(),
            },
        )
    }

    pub fn summon(actor: &str, summon: &str, targets: &[&str]) -> Self {
        Self::new(
            actor,
            Command::UseSummon {
                summon: summon.to_string(),
                targets: targets.iter().map(|t| t.to_string()).collect(),
            },
        )
    }

    pub fn baton_pass(actor: &str, to: &str) -> Self {
        Self::new(actor, Command::BatonPass { to: to.to_string() })
    }

    pub fn steal(actor: &str, target: &str) -> Self {
        Self::new(
            actor,
            Command::Steal {
                target: target.to_string(),
            },
        )
    }

    pub fn mug(actor: &str, target: &str) -> Self {
        Self::new(
            actor,
            Command::Mug {
                target: target.to_string(),
            },
        )
    }

    pub fn kind(&self) -> ActionKind {
        match self.command {
            Command::BasicAttack { .. } => ActionKind::BasicAttack,
            Command::UseSkill { .. } => ActionKind::Skill,
            Command::UseItem { .. } => ActionKind::Item,
            Command::Guard => ActionKind::Guard,
            Command::Escape => ActionKind::Escape,
            Command::AllOutAttack => ActionKind::AllOutAttack,
            Command::UseLimitBreak { .. } => ActionKind::LimitBreak,
            Command::UseSummon { .. } => ActionKind::Summon,
            Command::BatonPass { .. } => ActionKind::BatonPass,
            Command::Steal { .. } => ActionKind::Steal,
            Command::Mug { .. } => ActionKind::Mug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HitFlags {
    pub hit_weakness: bool,
    pub critical: bool,
    pub resisted: bool,
    pub absorbed: bool,
    pub nullified: bool,
    pub reflected: bool,
    pub missed: bool,
    pub caused_knockdown: bool,
    pub technical: bool,
    pub guarded: bool,
    pub instant_kill: bool,
    pub killed: bool,
}

impl HitFlags {
    pub fn merge(&mut self, other: HitFlags) {
        self.hit_weakness |= other.hit_weakness;
        self.critical |= other.critical;
        self.resisted |= other.resisted;
        self.absorbed |= other.absorbed;
        self.nullified |= other.nullified;
        self.reflected |= other.reflected;
        self.missed |= other.missed;
        self.caused_knockdown |= other.caused_knockdown;
        self.technical |= other.technical;
        self.guarded |= other.guarded;
        self.instant_kill |= other.instant_kill;
        self.killed |= other.killed;
    }
}

/// Everything that happened to one target during an action.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub target: CombatantId,
    pub damage: i32,
    pub healing: i32,
    pub flags: HitFlags,
    pub statuses_applied: Vec<StatusKind>,
    pub statuses_resisted: Vec<StatusKind>,
    pub statuses_cured: Vec<StatusKind>,
}

impl TargetOutcome {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            ..Self::default()
        }
    }
}

/// Loot taken by a steal or mug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StolenLoot {
    Item(String),
    Gold(u64),
}

/// The complete, immutable result of one resolved action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub actor: CombatantId,
    pub kind: ActionKind,
    pub outcomes: Vec<TargetOutcome>,
    pub damage_dealt: i32,
    pub healing_done: i32,
    pub flags: HitFlags,
    pub extra_turn_granted: bool,
    pub stolen: Option<StolenLoot>,
    pub escaped: Option<bool>,
    /// The action hit a data fault and did nothing.
    pub no_op: bool,
}

impl ActionResult {
    pub(crate) fn finish(
        actor: &str,
        kind: ActionKind,
        outcomes: Vec<TargetOutcome>,
        extra_turn_granted: bool,
    ) -> Self {
        let mut flags = HitFlags::default();
        let mut damage_dealt = 0;
        let mut healing_done = 0;
        for o in &outcomes {
            flags.merge(o.flags);
            damage_dealt += o.damage;
            healing_done += o.healing;
        }
        Self {
            actor: actor.to_string(),
            kind,
            outcomes,
            damage_dealt,
            healing_done,
            flags,
            extra_turn_granted,
            stolen: None,
            escaped: None,
            no_op: false,
        }
    }

    pub(crate) fn no_op(actor: &str, kind: ActionKind) -> Self {
        let mut result = Self::finish(actor, kind, Vec::new(), false);
        result.no_op = true;
        result
    }

    pub fn outcome_for(&self, target: &str) -> Option<&TargetOutcome> {
        self.outcomes.iter().find(|o| o.target == target)
    }
}
