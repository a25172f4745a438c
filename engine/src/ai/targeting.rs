use serde::{Deserialize, Serialize};

use crate::Dice;
use crate::combatant::Combatant;

/// Rule for picking one target out of a candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetPriority {
    #[default]
    LowestHp,
    HighestHp,
    LowestDefense,
    WeakestLevel,
    /// Ailing targets first, lowest HP breaks ties.
    MostVulnerable,
    Random,
}

/// Ties go to the earliest candidate, so results follow roster order.
pub fn select<'a>(
    priority: TargetPriority,
    candidates: &[&'a Combatant],
    dice: &mut Dice,
) -> Option<&'a Combatant> {
    if candidates.is_empty() {
        return None;
    }
    match priority {
        TargetPriority::LowestHp => min_by_key(candidates, |c| c.health.hp as i64),
        TargetPriority::HighestHp => min_by_key(candidates, |c| -(c.health.hp as i64)),
        TargetPriority::LowestDefense => {
            min_by_key(candidates, |c| c.effective_stats().defense as i64)
        }
        TargetPriority::WeakestLevel => min_by_key(candidates, |c| c.level as i64),
        TargetPriority::MostVulnerable => {
            let ailing: Vec<&'a Combatant> = candidates
                .iter()
                .copied()
                .filter(|c| c.has_any_ailment() || c.flags.knocked_down)
                .collect();
            if ailing.is_empty() {
                min_by_key(candidates, |c| c.health.hp as i64)
            } else {
                min_by_key(&ailing, |c| c.health.hp as i64)
            }
        }
        TargetPriority::Random => dice.pick(candidates).copied(),
    }
}

fn min_by_key<'a>(candidates: &[&'a Combatant], key: impl Fn(&Combatant) -> i64) -> Option<&'a Combatant> {
    let mut best: Option<(&'a Combatant, i64)> = None;
    for &c in candidates {
        let k = key(c);
        if best.is_none_or(|(_, b)| k < b) {
            best = Some((c, k));
        }
    }
    best.map(|(c, _)| c)
}
