//! The battle orchestrator: the single external entry point.
//!
//! A [`Battle`] owns one instance of every subsystem and walks a small phase
//! machine. [`Battle::next_turn`] picks the next actor (running round
//! boundaries, turn-start ticks and skips on the way), [`Battle::submit`]
//! resolves that actor's action synchronously, and the battle then waits in
//! [`BattlePhase::AwaitingPresentation`] until the caller signals
//! [`Battle::presentation_complete`]. Nothing here ever blocks or sleeps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ai::{self, AiContext, Decision, WeaknessMemory};
use crate::baton;
use crate::combat::actions::{Action, ActionResult};
use crate::combat::momentum;
use crate::combat::resolver::BattleState;
use crate::combatant::{Combatant, CombatantId, CombatantSpec, Roster, Side};
use crate::config::BattleConfig;
use crate::data::Catalog;
use crate::error::{ActionError, SetupError};
use crate::events::{BattleEvent, BattleObserver, SkipReason};
use crate::guard;
use crate::inventory::Inventory;
use crate::rewards::{BattleRewards, RewardsTracker, ScoreCard, compute_rewards};
use crate::showtime;

/// Consecutive rounds without a single action before the battle is aborted.
pub const STALEMATE_ROUNDS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat,
    Escaped,
    Aborted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Victory => "victory",
            Outcome::Defeat => "defeat",
            Outcome::Escaped => "escaped",
            Outcome::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattlePhase {
    /// Waiting for `next_turn`.
    Ready,
    AwaitingAction(CombatantId),
    AwaitingPresentation,
    Finished(Outcome),
}

/// The actor whose turn just began, plus everything that happened on the way.
#[derive(Debug, Clone, Serialize)]
pub struct TurnStart {
    pub actor: CombatantId,
    pub round: u32,
    /// One More or baton-pass turn.
    pub bonus: bool,
    pub events: Vec<BattleEvent>,
}

/// What the presentation layer should play for one resolved action.
#[derive(Debug, Clone, Serialize)]
pub struct Presentation {
    pub actor: CombatantId,
    pub result: ActionResult,
    pub events: Vec<BattleEvent>,
}

/// Final outcome, rewards and log, produced by [`Battle::shutdown`].
#[derive(Debug, Clone, Serialize)]
pub struct BattleReport {
    pub outcome: Outcome,
    pub rounds: u32,
    pub rewards: BattleRewards,
    pub score: ScoreCard,
    pub log: Vec<String>,
}

pub struct Battle {
    state: BattleState,
    phase: BattlePhase,
    bonus_turn: bool,
    observers: Vec<Box<dyn BattleObserver>>,
    memory: WeaknessMemory,
    tracker: RewardsTracker,
    log: Vec<String>,
    idle_rounds: u32,
    acted_this_round: bool,
}

impl fmt::Debug for Battle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Battle")
            .field("phase", &self.phase)
            .field("round", &self.round())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Battle {
    /// Build a battle from external stat snapshots. Every skill, limit break and
    /// summon a combatant references must exist in `catalog`.
    pub fn initialize(
        party: &[CombatantSpec],
        enemies: &[CombatantSpec],
        catalog: Catalog,
        inventory: Inventory,
        config: BattleConfig,
    ) -> Result<Self, SetupError> {
        if party.is_empty() {
            return Err(SetupError::EmptySide(Side::Party.label()));
        }
        if enemies.is_empty() {
            return Err(SetupError::EmptySide(Side::Enemy.label()));
        }
        let mut roster = Roster::new();
        for (side, specs) in [(Side::Party, party), (Side::Enemy, enemies)] {
            for spec in specs {
                if spec.max_hp <= 0 {
                    return Err(SetupError::NoHitPoints(spec.id.clone()));
                }
                for skill in &spec.skills {
                    catalog.skill(skill)?;
                }
                for limit in &spec.limit_breaks {
                    catalog.limit_break(limit)?;
                }
                for summon in &spec.summons {
                    catalog.summon(summon)?;
                }
                roster.insert(spec.to_combatant(side))?;
            }
        }
        tracing::debug!(combatants = roster.len(), seed = config.seed, "battle initialized");
        Ok(Self {
            state: BattleState::new(roster, catalog, inventory, config),
            phase: BattlePhase::Ready,
            bonus_turn: false,
            observers: Vec::new(),
            memory: WeaknessMemory::new(),
            tracker: RewardsTracker::new(),
            log: Vec::new(),
            idle_rounds: 0,
            acted_this_round: false,
        })
    }

    /// Replace the seeded dice, e.g. with scripted rolls in tests.
    pub fn with_dice(mut self, dice: crate::Dice) -> Self {
        self.state.dice = dice;
        self
    }

    pub fn subscribe(&mut self, observer: impl BattleObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn phase(&self) -> &BattlePhase {
        &self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            BattlePhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn round(&self) -> u32 {
        self.state.scheduler.round()
    }

    pub fn turn_order(&self) -> &[CombatantId] {
        self.state.scheduler.order()
    }

    pub fn current_actor(&self) -> Option<&str> {
        match &self.phase {
            BattlePhase::AwaitingAction(id) => Some(id),
            _ => None,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.state.roster
    }

    pub fn combatant(&self, id: &str) -> Option<&Combatant> {
        self.state.roster.get(id)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.state.inventory
    }

    pub fn config(&self) -> &BattleConfig {
        &self.state.config
    }

    pub fn memory(&self) -> &WeaknessMemory {
        &self.memory
    }

    pub fn score(&self) -> &ScoreCard {
        self.tracker.card()
    }

    pub fn all_out_attack_available(&self) -> bool {
        self.state.momentum.all_out_available()
    }

    pub fn showtime_cooldown(&self, a: &str, b: &str) -> u32 {
        self.state.showtimes.cooldown(a, b)
    }

    pub fn summon_cooldown(&self, summoner: &str, summon: &str) -> u32 {
        self.state.summons.cooldown(summoner, summon)
    }

    pub fn escape_attempts(&self) -> u32 {
        self.state.escape.failed_attempts
    }

    /// Every event so far, one bracket-tagged line each.
    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    /// Mutable access for harnesses that need to stage a scenario.
    pub fn combatant_mut(&mut self, id: &str) -> Option<&mut Combatant> {
        self.state.roster.get_mut(id)
    }

    /// Advance to the next actor. Returns `None` once the battle is over.
    pub fn next_turn(&mut self) -> Result<Option<TurnStart>, ActionError> {
        match &self.phase {
            BattlePhase::Finished(_) => return Ok(None),
            BattlePhase::AwaitingPresentation => {
                return Err(ActionError::WrongPhase("awaiting presentation"));
            }
            BattlePhase::AwaitingAction(id) => {
                return Ok(Some(TurnStart {
                    actor: id.clone(),
                    round: self.round(),
                    bonus: self.bonus_turn,
                    events: Vec::new(),
                }));
            }
            BattlePhase::Ready => {}
        }

        loop {
            if let Some(outcome) = self.state.outcome() {
                self.conclude(outcome);
                self.flush();
                return Ok(None);
            }
            if self.round() == 0 {
                self.begin_round();
                continue;
            }
            let Some(id) = self.state.scheduler.next_candidate(&self.state.roster) else {
                self.end_round();
                if self.is_finished() {
                    self.flush();
                    return Ok(None);
                }
                continue;
            };
            if let Some(turn) = self.try_start_turn(id) {
                return Ok(Some(turn));
            }
        }
    }

    /// Turn-start processing for one candidate. `None` means the turn was lost.
    fn try_start_turn(&mut self, id: CombatantId) -> Option<TurnStart> {
        let statuses = self.state.statuses;
        let c = self.state.roster.get_mut(&id)?;
        let bonus = c.flags.has_extra_turn;
        let side = c.side;

        if !bonus {
            if self.state.scheduler.consume_stop(side) {
                c.flags.has_acted = true;
                self.state.emit(BattleEvent::TurnSkipped {
                    actor: id,
                    reason: SkipReason::TimeStopped,
                });
                return None;
            }
            let report = statuses.tick(c, true);
            for (kind, amount) in report.damaged.iter().chain(&report.healed) {
                self.state.events.push(BattleEvent::StatusTick {
                    target: id.clone(),
                    kind: *kind,
                    amount: *amount,
                });
            }
            if report.killed {
                self.state.handle_death(&id);
                self.state.cleanup_summons();
                self.state.emit(BattleEvent::TurnSkipped {
                    actor: id,
                    reason: SkipReason::Dead,
                });
                return None;
            }
        }

        let c = self.state.roster.get_mut(&id)?;
        if c.flags.knocked_down {
            momentum::stand_up(c);
            c.flags.has_acted = true;
            c.flags.has_extra_turn = false;
            self.state.momentum.revalidate(&self.state.roster);
            self.state.emit(BattleEvent::StoodUp { target: id.clone() });
            self.state.emit(BattleEvent::TurnSkipped {
                actor: id,
                reason: SkipReason::KnockedDown,
            });
            return None;
        }
        if !c.can_act() {
            c.flags.has_acted = true;
            c.flags.has_extra_turn = false;
            self.state.emit(BattleEvent::TurnSkipped {
                actor: id,
                reason: SkipReason::Incapacitated,
            });
            return None;
        }

        c.flags.turns_taken += 1;
        self.acted_this_round = true;
        self.bonus_turn = bonus;
        tracing::debug!(actor = %id, round = self.round(), bonus, "turn start");
        self.state.emit(BattleEvent::TurnStarted {
            actor: id.clone(),
            bonus,
        });
        self.phase = BattlePhase::AwaitingAction(id.clone());
        let events = self.flush();
        Some(TurnStart {
            actor: id,
            round: self.round(),
            bonus,
            events,
        })
    }

    /// Round teardown: flags, guards, status aging, cooldowns and summons.
    fn end_round(&mut self) {
        if self.acted_this_round {
            self.idle_rounds = 0;
        } else {
            self.idle_rounds += 1;
            if self.idle_rounds >= STALEMATE_ROUNDS {
                tracing::warn!(rounds = self.idle_rounds, "stalemate");
                self.conclude(Outcome::Aborted);
                return;
            }
        }
        self.acted_this_round = false;

        let state = &mut self.state;
        let statuses = state.statuses;
        for c in state.roster.iter_mut() {
            c.flags.has_acted = false;
            c.flags.has_extra_turn = false;
            if momentum::stand_up(c) && c.is_alive() {
                state.events.push(BattleEvent::StoodUp { target: c.id.clone() });
            }
            if let Some(regen) = guard::tick_round(c, &state.config.guard) {
                state.events.push(BattleEvent::GuardRegen {
                    actor: c.id.clone(),
                    hp: regen.hp,
                    mp: regen.mp,
                });
                if regen.gauge_ready {
                    state.events.push(BattleEvent::LimitGaugeReady { actor: c.id.clone() });
                }
            }
            for kind in statuses.tick(c, false).expired {
                state.events.push(BattleEvent::StatusExpired {
                    target: c.id.clone(),
                    kind,
                });
            }
        }
        state.momentum.revalidate(&state.roster);
        state.showtimes.tick_round();
        state.tick_summon_passives();
        state.expire_summons();
        baton::reset_round(&mut state.roster);
        self.begin_round();
    }

    fn begin_round(&mut self) {
        let round = self.state.scheduler.advance_round();
        self.state.emit(BattleEvent::RoundStarted { round });
        self.state.scheduler.recompute(&self.state.roster);

        let fired = showtime::roll_triggers(
            &self.state.catalog,
            &self.state.roster,
            &self.state.showtimes,
            &mut self.state.dice,
        );
        for id in fired {
            if self.state.outcome().is_some() {
                break;
            }
            self.state.perform_showtime(&id);
        }
        self.flush();
    }

    /// Resolve the current actor's action.
    pub fn submit(&mut self, action: Action) -> Result<Presentation, ActionError> {
        match &self.phase {
            BattlePhase::AwaitingAction(id) if *id == action.actor => {}
            BattlePhase::AwaitingAction(_) => return Err(ActionError::NotActorsTurn(action.actor)),
            BattlePhase::Ready => return Err(ActionError::WrongPhase("no turn in progress")),
            BattlePhase::AwaitingPresentation => {
                return Err(ActionError::WrongPhase("awaiting presentation"));
            }
            BattlePhase::Finished(_) => return Err(ActionError::WrongPhase("battle finished")),
        }

        let result = self.state.execute(&action)?;
        if let Some(c) = self.state.roster.get_mut(&action.actor) {
            guard::end_turn(c);
            c.flags.has_acted = true;
        }

        match self.state.outcome() {
            Some(outcome) => self.conclude(outcome),
            None => self.phase = BattlePhase::AwaitingPresentation,
        }
        let events = self.flush();
        Ok(Presentation {
            actor: action.actor,
            result,
            events,
        })
    }

    /// The presentation layer finished playing the last action.
    pub fn presentation_complete(&mut self) -> Result<(), ActionError> {
        match self.phase {
            BattlePhase::AwaitingPresentation => {
                self.phase = BattlePhase::Ready;
                Ok(())
            }
            BattlePhase::Finished(_) => Ok(()),
            _ => Err(ActionError::WrongPhase("nothing to present")),
        }
    }

    /// Let the AI choose for whoever's turn it is.
    pub fn ai_decide(&mut self) -> Option<Decision> {
        let BattlePhase::AwaitingAction(id) = &self.phase else {
            return None;
        };
        let state = &mut self.state;
        let actor = state.roster.get(id)?;
        let allies: Vec<&Combatant> = state.roster.living(actor.side).collect();
        let enemies: Vec<&Combatant> = state.roster.living(actor.side.opponent()).collect();
        let ctx = AiContext {
            catalog: &state.catalog,
            technicals: &state.config.technicals,
            memory: &self.memory,
        };
        Some(ai::decide(actor, &allies, &enemies, &ctx, &mut state.dice))
    }

    /// End the battle now, e.g. from a round cap in a simulation driver.
    pub fn abort(&mut self) {
        if !self.is_finished() {
            self.conclude(Outcome::Aborted);
            self.flush();
        }
    }

    /// Discard battle state and hand back the outcome, rewards and log.
    pub fn shutdown(mut self) -> BattleReport {
        let outcome = self.outcome().unwrap_or(Outcome::Aborted);
        let state = &mut self.state;
        let rewards = compute_rewards(&state.roster, outcome, &state.stolen, &mut state.dice);
        BattleReport {
            outcome,
            rounds: state.scheduler.round(),
            rewards,
            score: self.tracker.card().clone(),
            log: self.log,
        }
    }

    fn conclude(&mut self, outcome: Outcome) {
        tracing::debug!(%outcome, round = self.round(), "battle ended");
        self.phase = BattlePhase::Finished(outcome);
        self.state.emit(BattleEvent::BattleEnded { outcome });
    }

    /// Deliver pending events to the built-in trackers, observers and log.
    fn flush(&mut self) -> Vec<BattleEvent> {
        let events = self.state.take_events();
        for event in &events {
            self.memory.observe(event);
            self.tracker.record(event);
            for observer in self.observers.iter_mut() {
                observer.on_event(event);
            }
            self.log.push(event.to_string());
        }
        events
    }
}
