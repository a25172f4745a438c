//! One More, knockdown and the all-out attack window.

use crate::combatant::{Combatant, Roster, Side};

/// Per-battle momentum state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Momentum {
    /// Side allowed to take the all-out attack, while the window is open.
    window: Option<Side>,
}

impl Momentum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_out_available(&self) -> bool {
        self.window.is_some()
    }

    pub fn available_for(&self, side: Side) -> bool {
        self.window == Some(side)
    }

    pub fn close(&mut self) {
        self.window = None;
    }

    /// Re-evaluate the window after an action by `actor_side`. Returns true when it opens.
    pub fn refresh(&mut self, roster: &Roster, actor_side: Side, symmetric: bool) -> bool {
        if !symmetric && actor_side != Side::Party {
            return false;
        }
        if roster.all_down_or_dead(actor_side.opponent()) {
            let opened = self.window != Some(actor_side);
            self.window = Some(actor_side);
            return opened;
        }
        false
    }

    /// Close the window once its side's opponents are no longer all down or dead.
    pub fn revalidate(&mut self, roster: &Roster) {
        if let Some(side) = self.window {
            if !roster.all_down_or_dead(side.opponent()) {
                self.window = None;
            }
        }
    }
}

/// Tracks the at-most-one extra turn an action may grant its actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OneMoreGate {
    granted: bool,
}

impl OneMoreGate {
    /// A gate that never grants, for attacks no single actor owns.
    pub fn spent() -> Self {
        Self { granted: true }
    }

    pub fn granted(&self) -> bool {
        self.granted
    }

    /// Grant the actor an extra turn unless this action already did.
    pub fn grant(&mut self, actor: &mut Combatant) -> bool {
        if self.granted || !actor.is_alive() {
            return false;
        }
        self.granted = true;
        actor.flags.has_extra_turn = true;
        true
    }
}

/// Knock down a living, standing target. Returns whether the state changed.
pub fn knock_down(target: &mut Combatant) -> bool {
    if !target.is_alive() || target.flags.knocked_down {
        return false;
    }
    target.flags.knocked_down = true;
    true
}

pub fn stand_up(target: &mut Combatant) -> bool {
    let was = target.flags.knocked_down;
    target.flags.knocked_down = false;
    was
}

/// Flat all-out attack damage one ally contributes to each downed enemy.
pub fn all_out_share(ally: &Combatant, attack_multiplier: f64) -> i32 {
    crate::to_points(ally.effective_stats().attack as f64 * attack_multiplier).max(1)
}
