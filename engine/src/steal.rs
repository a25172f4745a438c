use indexmap::{IndexMap, IndexSet};

use crate::Dice;
use crate::combat::actions::StolenLoot;
use crate::combatant::{Combatant, CombatantId};

pub const MIN_STEAL_CHANCE: f64 = 1.0;
pub const MAX_STEAL_CHANCE: f64 = 95.0;

/// Enemy base chance plus thief luck, in percent, clamped to [1, 95].
pub fn steal_chance(base: f64, thief_luck: i32) -> f64 {
    (base + thief_luck as f64).clamp(MIN_STEAL_CHANCE, MAX_STEAL_CHANCE)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StealAttempt {
    Stole(StolenLoot),
    Failed,
    NothingLeft,
}

/// What has already been taken from each enemy this battle.
#[derive(Debug, Clone, Default)]
pub struct StealLedger {
    items: IndexMap<CombatantId, IndexSet<String>>,
    gold: IndexSet<CombatantId>,
}

#[derive(Debug, Clone, PartialEq)]
enum Candidate {
    Item { item: String, chance: f64 },
    Gold { amount: u64, chance: f64 },
}

impl StealLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_stolen_item(&self, target: &str, item: &str) -> bool {
        self.items.get(target).is_some_and(|set| set.contains(item))
    }

    pub fn has_stolen_gold(&self, target: &str) -> bool {
        self.gold.contains(target)
    }

    /// Items come first in table order; gold is attempted once every item is gone.
    fn next_candidate(&self, target: &Combatant) -> Option<Candidate> {
        let rewards = target.rewards.as_ref()?;
        for entry in &rewards.steal {
            if !self.has_stolen_item(&target.id, &entry.item) {
                return Some(Candidate::Item {
                    item: entry.item.clone(),
                    chance: entry.chance,
                });
            }
        }
        match rewards.steal_gold {
            Some(g) if !self.has_stolen_gold(&target.id) && g.amount > 0 => Some(Candidate::Gold {
                amount: g.amount,
                chance: g.chance,
            }),
            _ => None,
        }
    }

    pub fn has_anything_left(&self, target: &Combatant) -> bool {
        self.next_candidate(target).is_some()
    }

    pub fn attempt(&mut self, thief: &Combatant, target: &Combatant, dice: &mut Dice) -> StealAttempt {
        let Some(candidate) = self.next_candidate(target) else {
            return StealAttempt::NothingLeft;
        };
        let luck = thief.effective_stats().luck;
        match candidate {
            Candidate::Item { item, chance } => {
                if !dice.percent(steal_chance(chance, luck)) {
                    return StealAttempt::Failed;
                }
                self.items
                    .entry(target.id.clone())
                    .or_default()
                    .insert(item.clone());
                StealAttempt::Stole(StolenLoot::Item(item))
            }
            Candidate::Gold { amount, chance } => {
                if !dice.percent(steal_chance(chance, luck)) {
                    return StealAttempt::Failed;
                }
                self.gold.insert(target.id.clone());
                StealAttempt::Stole(StolenLoot::Gold(amount))
            }
        }
    }
}
