//! The event stream every resolved action produces.
//!
//! Presentation and telemetry consumers either register a [`BattleObserver`]
//! or read the events returned with each [`crate::Presentation`]. Each event
//! renders as a one-line, tag-prefixed battle log entry.

use std::fmt;

use serde::Serialize;

use crate::battle::Outcome;
use crate::combat::actions::{ActionKind, StolenLoot};
use crate::combatant::{CombatantId, Side};
use crate::element::Element;
use crate::status::StatusKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    KnockedDown,
    Incapacitated,
    TimeStopped,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissReason {
    Expired,
    Defeated,
    SummonerFell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    RoundStarted {
        round: u32,
    },
    TurnStarted {
        actor: CombatantId,
        bonus: bool,
    },
    TurnSkipped {
        actor: CombatantId,
        reason: SkipReason,
    },
    ActionResolved {
        actor: CombatantId,
        kind: ActionKind,
        damage: i32,
        healing: i32,
    },
    Damage {
        source: CombatantId,
        target: CombatantId,
        amount: i32,
        element: Element,
        side: Side,
        hp_after: i32,
        /// Flat all-out damage; reveals nothing about affinities.
        all_out: bool,
    },
    Healed {
        target: CombatantId,
        amount: i32,
        hp_after: i32,
    },
    Absorbed {
        target: CombatantId,
        element: Element,
        amount: i32,
    },
    Nullified {
        target: CombatantId,
        element: Element,
    },
    Reflected {
        source: CombatantId,
        target: CombatantId,
        element: Element,
        amount: i32,
    },
    Missed {
        source: CombatantId,
        target: CombatantId,
    },
    Revived {
        target: CombatantId,
        hp: i32,
    },
    Defeated {
        target: CombatantId,
        side: Side,
    },
    StatusApplied {
        target: CombatantId,
        kind: StatusKind,
    },
    StatusResisted {
        target: CombatantId,
        kind: StatusKind,
    },
    StatusExpired {
        target: CombatantId,
        kind: StatusKind,
    },
    StatusCured {
        target: CombatantId,
        kind: StatusKind,
    },
    StatusTick {
        target: CombatantId,
        kind: StatusKind,
        amount: i32,
    },
    WeaknessHit {
        attacker: CombatantId,
        target: CombatantId,
        element: Element,
    },
    CriticalHit {
        attacker: CombatantId,
        target: CombatantId,
    },
    KnockedDown {
        target: CombatantId,
    },
    StoodUp {
        target: CombatantId,
    },
    OneMore {
        actor: CombatantId,
    },
    Technical {
        attacker: CombatantId,
        target: CombatantId,
        status: StatusKind,
        element: Element,
    },
    AllOutAttackAvailable {
        side: Side,
    },
    AllOutAttack {
        side: Side,
        participants: usize,
        damage: i32,
    },
    BatonPass {
        from: CombatantId,
        to: CombatantId,
        level: u32,
    },
    LimitGaugeReady {
        actor: CombatantId,
    },
    LimitBreak {
        actor: CombatantId,
        partner: Option<CombatantId>,
        limit: String,
    },
    TimeStopped {
        side: Side,
        turns: u32,
    },
    Showtime {
        showtime: String,
        members: [CombatantId; 2],
        damage: i32,
    },
    Guarding {
        actor: CombatantId,
        reduction: f64,
    },
    GuardRegen {
        actor: CombatantId,
        hp: i32,
        mp: i32,
    },
    EscapeAttempt {
        actor: CombatantId,
        chance: f64,
        success: bool,
    },
    Fled {
        actor: CombatantId,
    },
    Stolen {
        thief: CombatantId,
        target: CombatantId,
        loot: StolenLoot,
    },
    StealFailed {
        thief: CombatantId,
        target: CombatantId,
    },
    ItemUsed {
        actor: CombatantId,
        item: String,
    },
    Summoned {
        summoner: CombatantId,
        summon: String,
        instance: Option<CombatantId>,
    },
    SummonDismissed {
        instance: CombatantId,
        reason: DismissReason,
    },
    Diagnostic {
        message: String,
    },
    BattleEnded {
        outcome: Outcome,
    },
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BattleEvent::*;
        match self {
            RoundStarted { round } => write!(f, "[ROUND] {}", round),
            TurnStarted { actor, bonus } => {
                if *bonus {
                    write!(f, "[TURN][{}] bonus turn", actor)
                } else {
                    write!(f, "[TURN][{}]", actor)
                }
            }
            TurnSkipped { actor, reason } => write!(f, "[TURN][{}] skipped ({:?})", actor, reason),
            ActionResolved {
                actor,
                kind,
                damage,
                healing,
            } => write!(
                f,
                "[ACTION][{}] {:?} dmg={} heal={}",
                actor, kind, damage, healing
            ),
            Damage {
                source,
                target,
                amount,
                element,
                hp_after,
                ..
            } => write!(
                f,
                "[DMG][{}] {} → {} [{:?}] hp={}",
                source, amount, target, element, hp_after
            ),
            Healed {
                target,
                amount,
                hp_after,
            } => write!(f, "[HEAL][{}] +{} hp={}", target, amount, hp_after),
            Absorbed {
                target,
                element,
                amount,
            } => write!(f, "[DMG][{}] absorbs {:?} +{}", target, element, amount),
            Nullified { target, element } => write!(f, "[DMG][{}] nullifies {:?}", target, element),
            Reflected {
                source,
                target,
                amount,
                ..
            } => write!(f, "[DMG][{}] reflects {} back to {}", target, amount, source),
            Missed { source, target } => write!(f, "[MISS][{}] misses {}", source, target),
            Revived { target, hp } => write!(f, "[STATE][{}] revived with {} HP", target, hp),
            Defeated { target, .. } => write!(f, "[STATE][{}] is defeated", target),
            StatusApplied { target, kind } => write!(f, "[COND][{}] gains {:?}", target, kind),
            StatusResisted { target, kind } => write!(f, "[COND][{}] resists {:?}", target, kind),
            StatusExpired { target, kind } => {
                write!(f, "[COND][{}] is no longer {:?}", target, kind)
            }
            StatusCured { target, kind } => write!(f, "[COND][{}] cured of {:?}", target, kind),
            StatusTick {
                target,
                kind,
                amount,
            } => write!(f, "[COND][{}] {:?} tick {}", target, kind, amount),
            WeaknessHit {
                attacker,
                target,
                element,
            } => write!(f, "[WEAK][{}] hits {} with {:?}", attacker, target, element),
            CriticalHit { attacker, target } => write!(f, "[CRIT][{}] on {}", attacker, target),
            KnockedDown { target } => write!(f, "[DOWN][{}]", target),
            StoodUp { target } => write!(f, "[UP][{}]", target),
            OneMore { actor } => write!(f, "[ONE MORE][{}]", actor),
            Technical {
                attacker,
                target,
                status,
                element,
            } => write!(
                f,
                "[TECHNICAL][{}] {:?} on {:?} {}",
                attacker, element, status, target
            ),
            AllOutAttackAvailable { side } => write!(f, "[ALL-OUT] ready for {}", side.label()),
            AllOutAttack {
                side,
                participants,
                damage,
            } => write!(
                f,
                "[ALL-OUT] {} x{} dmg={}",
                side.label(),
                participants,
                damage
            ),
            BatonPass { from, to, level } => {
                write!(f, "[BATON][{}] → {} level={}", from, to, level)
            }
            LimitGaugeReady { actor } => write!(f, "[LIMIT][{}] gauge full", actor),
            LimitBreak {
                actor,
                partner,
                limit,
            } => match partner {
                Some(p) => write!(f, "[LIMIT][{}+{}] {}", actor, p, limit),
                None => write!(f, "[LIMIT][{}] {}", actor, limit),
            },
            TimeStopped { side, turns } => {
                write!(f, "[LIMIT] {} loses {} turns", side.label(), turns)
            }
            Showtime {
                showtime,
                members,
                damage,
            } => write!(
                f,
                "[SHOWTIME][{}+{}] {} dmg={}",
                members[0], members[1], showtime, damage
            ),
            Guarding { actor, reduction } => {
                write!(f, "[GUARD][{}] -{}%", actor, (reduction * 100.0).round())
            }
            GuardRegen { actor, hp, mp } => write!(f, "[GUARD][{}] +{} HP +{} MP", actor, hp, mp),
            EscapeAttempt {
                actor,
                chance,
                success,
            } => write!(
                f,
                "[ESCAPE][{}] {:.0}% → {}",
                actor,
                chance,
                if *success { "SUCCESS" } else { "FAIL" }
            ),
            Fled { actor } => write!(f, "[ESCAPE][{}] fled", actor),
            Stolen {
                thief,
                target,
                loot,
            } => match loot {
                StolenLoot::Item(item) => write!(f, "[STEAL][{}] took {} from {}", thief, item, target),
                StolenLoot::Gold(g) => write!(f, "[STEAL][{}] took {}G from {}", thief, g, target),
            },
            StealFailed { thief, target } => write!(f, "[STEAL][{}] failed on {}", thief, target),
            ItemUsed { actor, item } => write!(f, "[ITEM][{}] uses {}", actor, item),
            Summoned {
                summoner,
                summon,
                instance,
            } => match instance {
                Some(id) => write!(f, "[SUMMON][{}] calls {} as {}", summoner, summon, id),
                None => write!(f, "[SUMMON][{}] calls {}", summoner, summon),
            },
            SummonDismissed { instance, reason } => {
                write!(f, "[SUMMON][{}] leaves ({:?})", instance, reason)
            }
            Diagnostic { message } => write!(f, "[DIAG] {}", message),
            BattleEnded { outcome } => write!(f, "[END] {}", outcome),
        }
    }
}

/// Receives every event as the battle emits it.
pub trait BattleObserver {
    fn on_event(&mut self, event: &BattleEvent);
}

impl<F> BattleObserver for F
where
    F: FnMut(&BattleEvent),
{
    fn on_event(&mut self, event: &BattleEvent) {
        self(event)
    }
}
