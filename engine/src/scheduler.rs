//! Speed-ordered turn queue and round bookkeeping.

use indexmap::IndexMap;

use crate::combatant::{CombatantId, Roster, Side};

#[derive(Debug, Clone, Default)]
pub struct TurnScheduler {
    order: Vec<CombatantId>,
    round: u32,
    /// Individual turns each side still has to sit out.
    stopped: IndexMap<Side, u32>,
}

impl TurnScheduler {
    pub fn new(roster: &Roster) -> Self {
        let mut scheduler = Self::default();
        scheduler.recompute(roster);
        scheduler
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn order(&self) -> &[CombatantId] {
        &self.order
    }

    pub(crate) fn advance_round(&mut self) -> u32 {
        self.round += 1;
        self.round
    }

    /// Stable sort by descending effective speed; ties keep roster order.
    pub fn recompute(&mut self, roster: &Roster) {
        let mut entries: Vec<(i32, CombatantId)> = roster
            .iter()
            .map(|c| (c.effective_stats().speed, c.id.clone()))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        self.order = entries.into_iter().map(|(_, id)| id).collect();
    }

    /// Extra-turn holders go first, otherwise the fastest living combatant that
    /// has not acted this round.
    pub fn next_candidate(&self, roster: &Roster) -> Option<CombatantId> {
        let living = |id: &&CombatantId| roster.get(id).is_some_and(|c| c.is_alive());
        if let Some(id) = self
            .order
            .iter()
            .filter(living)
            .find(|id| roster.get(id).is_some_and(|c| c.flags.has_extra_turn))
        {
            return Some(id.clone());
        }
        self.order
            .iter()
            .filter(living)
            .find(|id| roster.get(id).is_some_and(|c| !c.flags.has_acted))
            .cloned()
    }

    pub fn stop_side(&mut self, side: Side, turns: u32) {
        if turns == 0 {
            return;
        }
        *self.stopped.entry(side).or_insert(0) += turns;
    }

    pub fn stopped_turns(&self, side: Side) -> u32 {
        self.stopped.get(&side).copied().unwrap_or(0)
    }

    /// Spend one stopped turn for `side`, if any remain.
    pub fn consume_stop(&mut self, side: Side) -> bool {
        match self.stopped.get_mut(&side) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }
}
