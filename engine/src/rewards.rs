//! End-of-battle scoring and loot.
//!
//! The engine never ranks a battle. [`RewardsTracker`] only counts raw events,
//! and [`compute_rewards`] turns the final roster into EXP, gold, drops and the
//! per-member deltas written back to the external character records.

use serde::Serialize;

use crate::Dice;
use crate::battle::Outcome;
use crate::combat::actions::StolenLoot;
use crate::combatant::{CombatantId, Roster, Side};
use crate::events::{BattleEvent, BattleObserver};
use crate::life::LifeState;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreCard {
    pub weakness_hits: u32,
    pub criticals: u32,
    pub technicals: u32,
    pub knockdowns: u32,
    pub one_mores: u32,
    pub all_out_attacks: u32,
    pub baton_passes: u32,
    pub showtimes: u32,
    pub limit_breaks: u32,
    pub items_used: u32,
    pub damage_by_party: i64,
    pub damage_by_enemies: i64,
}

/// Event-stream observer that fills a [`ScoreCard`].
#[derive(Debug, Clone, Default)]
pub struct RewardsTracker {
    card: ScoreCard,
}

impl RewardsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn card(&self) -> &ScoreCard {
        &self.card
    }

    pub fn record(&mut self, event: &BattleEvent) {
        let card = &mut self.card;
        match event {
            BattleEvent::WeaknessHit { .. } => card.weakness_hits += 1,
            BattleEvent::CriticalHit { .. } => card.criticals += 1,
            BattleEvent::Technical { .. } => card.technicals += 1,
            BattleEvent::KnockedDown { .. } => card.knockdowns += 1,
            BattleEvent::OneMore { .. } => card.one_mores += 1,
            BattleEvent::AllOutAttack { .. } => card.all_out_attacks += 1,
            BattleEvent::BatonPass { .. } => card.baton_passes += 1,
            BattleEvent::Showtime { .. } => card.showtimes += 1,
            BattleEvent::LimitBreak { .. } => card.limit_breaks += 1,
            BattleEvent::ItemUsed { .. } => card.items_used += 1,
            BattleEvent::Damage { side, amount, .. } => match side {
                Side::Party => card.damage_by_party += *amount as i64,
                Side::Enemy => card.damage_by_enemies += *amount as i64,
            },
            _ => {}
        }
    }
}

impl BattleObserver for RewardsTracker {
    fn on_event(&mut self, event: &BattleEvent) {
        self.record(event);
    }
}

/// End-of-battle pools and experience for one party member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyDelta {
    pub id: CombatantId,
    pub hp: i32,
    pub mp: i32,
    pub exp_gained: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BattleRewards {
    pub exp: u64,
    pub gold: u64,
    pub drops: Vec<String>,
    pub stolen_items: Vec<String>,
    pub stolen_gold: u64,
    pub party: Vec<PartyDelta>,
}

/// EXP, gold and drops come only from enemies that were defeated, never from
/// ones that fled, and only on victory. Stolen loot is kept whatever the outcome.
pub fn compute_rewards(
    roster: &Roster,
    outcome: Outcome,
    stolen: &[StolenLoot],
    dice: &mut Dice,
) -> BattleRewards {
    let mut rewards = BattleRewards::default();
    for loot in stolen {
        match loot {
            StolenLoot::Item(item) => rewards.stolen_items.push(item.clone()),
            StolenLoot::Gold(g) => rewards.stolen_gold += g,
        }
    }

    if outcome == Outcome::Victory {
        for enemy in roster.side(Side::Enemy) {
            if enemy.health.state != LifeState::Dead || enemy.summoned_by.is_some() {
                continue;
            }
            let Some(table) = enemy.rewards.as_ref() else {
                continue;
            };
            rewards.exp += table.exp;
            rewards.gold += table.gold;
            for drop in &table.drops {
                if dice.percent(drop.chance) {
                    rewards.drops.push(drop.item.clone());
                }
            }
        }
    }

    for member in roster.side(Side::Party).filter(|c| c.summoned_by.is_none()) {
        let exp_gained = if member.is_alive() { rewards.exp } else { 0 };
        rewards.party.push(PartyDelta {
            id: member.id.clone(),
            hp: member.health.hp,
            mp: member.health.mp,
            exp_gained,
        });
    }
    rewards
}
