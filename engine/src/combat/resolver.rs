//! Action resolution: validate, pay, then resolve every target in a fixed order.
//!
//! [`BattleState::execute`] never mutates anything before validation has
//! passed. Data faults found after validation turn the action into a no-op and
//! surface a `Diagnostic` event instead of an error.

use crate::Dice;
use crate::ai::targeting::{self, TargetPriority};
use crate::baton;
use crate::battle::Outcome;
use crate::combat::actions::{Action, ActionKind, ActionResult, Command, StolenLoot, TargetOutcome};
use crate::combat::damage::{
    AttackProfile, FinalDamage, FormulaInput, HitModifiers, crit_chance, finalize_damage, hit_chance,
    instant_kill_applies, resolve_affinity,
};
use crate::combat::momentum::{self, Momentum, OneMoreGate};
use crate::combat::technical;
use crate::combatant::{Combatant, CombatantId, Roster, Side};
use crate::config::BattleConfig;
use crate::data::{
    Catalog, FixedDamage, HealSpec, ItemDef, LimitBreakDef, SkillDef, SkillKind, StatusInflict, SummonDef,
    SummonEffect, TargetShape,
};
use crate::element::{Affinity, Element};
use crate::error::{ActionError, DataError};
use crate::escape::{self, EscapeState};
use crate::events::{BattleEvent, DismissReason};
use crate::guard;
use crate::inventory::Inventory;
use crate::life::{LifeState, apply_damage, can_afford, heal, restore_mp, revive, spend};
use crate::limit;
use crate::scheduler::TurnScheduler;
use crate::showtime::{self, ShowtimeTracker};
use crate::status::{ApplyOutcome, StatusKind, StatusManager};
use crate::steal::{StealAttempt, StealLedger};
use crate::summon::{self, SummonRegistry};

/// Everything one battle owns. The orchestrator wraps this with phase handling.
#[derive(Debug)]
pub struct BattleState {
    pub(crate) roster: Roster,
    pub(crate) catalog: Catalog,
    pub(crate) config: BattleConfig,
    pub(crate) dice: Dice,
    pub(crate) statuses: StatusManager,
    pub(crate) inventory: Inventory,
    pub(crate) steals: StealLedger,
    pub(crate) stolen: Vec<StolenLoot>,
    pub(crate) escape: EscapeState,
    pub(crate) momentum: Momentum,
    pub(crate) summons: SummonRegistry,
    pub(crate) showtimes: ShowtimeTracker,
    pub(crate) scheduler: TurnScheduler,
    pub(crate) escaped: bool,
    pub(crate) events: Vec<BattleEvent>,
}

/// A validated action with every lookup already done.
enum Plan {
    Attack(CombatantId),
    Skill {
        skill: SkillDef,
        targets: Vec<CombatantId>,
    },
    Item {
        item: ItemDef,
        targets: Vec<CombatantId>,
    },
    Guard,
    Escape,
    Flee,
    AllOut,
    Limit {
        def: LimitBreakDef,
        partner: Option<CombatantId>,
        targets: Vec<CombatantId>,
    },
    Summon {
        def: SummonDef,
        targets: Vec<CombatantId>,
    },
    Baton(CombatantId),
    Steal(CombatantId),
    Mug(CombatantId),
    Fault(DataError),
}

#[derive(Debug, Clone, Copy)]
enum BaseSource {
    Formula,
    Limit { duo_bonus: f64 },
    Showtime { combined: f64 },
    Fixed(i32),
}

struct Strike<'p> {
    attacker: &'p str,
    profile: &'p AttackProfile,
    base: BaseSource,
    baton_level: u32,
    charge: Option<f64>,
    feeds_gauge: bool,
}

impl BattleState {
    pub(crate) fn new(roster: Roster, catalog: Catalog, inventory: Inventory, config: BattleConfig) -> Self {
        let scheduler = TurnScheduler::new(&roster);
        let dice = Dice::from_seed(config.seed);
        Self {
            roster,
            catalog,
            config,
            dice,
            statuses: StatusManager::new(),
            inventory,
            steals: StealLedger::new(),
            stolen: Vec::new(),
            escape: EscapeState::default(),
            momentum: Momentum::new(),
            summons: SummonRegistry::new(),
            showtimes: ShowtimeTracker::new(),
            scheduler,
            escaped: false,
            events: Vec::new(),
        }
    }

    pub(crate) fn emit(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub(crate) fn take_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn fault(&mut self, error: DataError) {
        tracing::warn!(%error, "data fault");
        self.emit(BattleEvent::Diagnostic {
            message: error.to_string(),
        });
    }

    /// Battle-terminal check, run after every resolved action.
    pub(crate) fn outcome(&self) -> Option<Outcome> {
        if self.escaped {
            return Some(Outcome::Escaped);
        }
        if self.roster.principals_defeated(Side::Party) {
            return Some(Outcome::Defeat);
        }
        if self.roster.principals_defeated(Side::Enemy) {
            return Some(Outcome::Victory);
        }
        None
    }

    /// Validate and resolve one action. On `Err` nothing has changed.
    pub fn execute(&mut self, action: &Action) -> Result<ActionResult, ActionError> {
        let actor = self
            .roster
            .get(&action.actor)
            .ok_or_else(|| ActionError::UnknownCombatant(action.actor.clone()))?;
        if !actor.can_act() {
            return Err(ActionError::ActorCannotAct(actor.id.clone()));
        }
        let plan = self.plan(actor, &action.command)?;
        let actor_id = action.actor.clone();
        let kind = action.kind();
        let side = actor.side;
        tracing::debug!(actor = %actor_id, ?kind, "resolving action");

        if kind != ActionKind::AllOutAttack {
            self.momentum.close();
        }
        if kind != ActionKind::BatonPass {
            if let Some(c) = self.roster.get_mut(&actor_id) {
                c.flags.has_extra_turn = false;
            }
        }

        let result = match plan {
            Plan::Attack(target) => self.run_attack(&actor_id, &target, ActionKind::BasicAttack),
            Plan::Skill { skill, targets } => self.run_skill(&actor_id, &skill, &targets),
            Plan::Item { item, targets } => self.run_item(&actor_id, &item, &targets),
            Plan::Guard => self.run_guard(&actor_id),
            Plan::Escape => self.run_escape(&actor_id, side),
            Plan::Flee => self.run_flee(&actor_id),
            Plan::AllOut => self.run_all_out(&actor_id, side),
            Plan::Limit {
                def,
                partner,
                targets,
            } => self.run_limit(&actor_id, &def, partner.as_deref(), &targets),
            Plan::Summon { def, targets } => self.run_summon(&actor_id, &def, &targets),
            Plan::Baton(to) => self.run_baton(&actor_id, &to),
            Plan::Steal(target) => self.run_steal(&actor_id, &target, ActionKind::Steal),
            Plan::Mug(target) => self.run_mug(&actor_id, &target),
            Plan::Fault(error) => {
                self.fault(error);
                ActionResult::no_op(&actor_id, kind)
            }
        };

        self.after_action(side);
        self.emit(BattleEvent::ActionResolved {
            actor: actor_id,
            kind,
            damage: result.damage_dealt,
            healing: result.healing_done,
        });
        Ok(result)
    }

    fn after_action(&mut self, side: Side) {
        self.cleanup_summons();
        if self
            .momentum
            .refresh(&self.roster, side, self.config.all_out.symmetric)
        {
            self.emit(BattleEvent::AllOutAttackAvailable { side });
        }
    }

    // ---- validation ----

    fn plan(&self, actor: &Combatant, command: &Command) -> Result<Plan, ActionError> {
        match command {
            Command::BasicAttack { target } => {
                self.opponent_target(actor, target)?;
                Ok(Plan::Attack(target.clone()))
            }
            Command::UseSkill { skill, targets } => {
                if !actor.skills.iter().any(|s| s == skill) {
                    return Err(ActionError::NotKnown {
                        actor: actor.id.clone(),
                        id: skill.clone(),
                    });
                }
                if actor.has_status(StatusKind::Silence) {
                    return Err(ActionError::Silenced(actor.id.clone()));
                }
                let def = match self.catalog.skill(skill) {
                    Ok(def) => def,
                    Err(e) => return Ok(Plan::Fault(e)),
                };
                let hp_cost = def.hp_cost_for(actor.health.max_hp);
                if actor.health.mp < def.mp_cost {
                    return Err(ActionError::InsufficientMp {
                        need: def.mp_cost,
                        have: actor.health.mp,
                    });
                }
                if !can_afford(&actor.health, 0, hp_cost) {
                    return Err(ActionError::InsufficientHp {
                        need: hp_cost,
                        have: actor.health.hp,
                    });
                }
                let wants_dead = def.kind == SkillKind::Revive;
                let targets = self.resolve_targets(actor, def.target, targets, wants_dead)?;
                Ok(Plan::Skill {
                    skill: def.clone(),
                    targets,
                })
            }
            Command::UseItem { item, targets } => {
                if self.inventory.count(item) == 0 {
                    return Err(ActionError::OutOfItem(item.clone()));
                }
                let def = match self.catalog.item(item) {
                    Ok(def) => def,
                    Err(e) => return Ok(Plan::Fault(e)),
                };
                let wants_dead = def.revive_percent.is_some();
                let targets = self.resolve_targets(actor, def.target, targets, wants_dead)?;
                Ok(Plan::Item {
                    item: def.clone(),
                    targets,
                })
            }
            Command::Guard => Ok(Plan::Guard),
            Command::Escape => {
                if actor.side == Side::Party && actor.summoned_by.is_none() {
                    if escape::is_forbidden(&self.config) {
                        return Err(ActionError::EscapeForbidden);
                    }
                    Ok(Plan::Escape)
                } else {
                    Ok(Plan::Flee)
                }
            }
            Command::AllOutAttack => {
                if !self.momentum.available_for(actor.side)
                    || !self.roster.all_down_or_dead(actor.side.opponent())
                {
                    return Err(ActionError::AllOutAttackUnavailable);
                }
                Ok(Plan::AllOut)
            }
            Command::UseLimitBreak {
                limit,
                partner,
                targets,
            } => {
                limit::check_ready(actor, limit)?;
                let def = match self.catalog.limit_break(limit) {
                    Ok(def) => def,
                    Err(e) => return Ok(Plan::Fault(e)),
                };
                let partner = limit::resolve_partner(&self.roster, actor, def, partner.as_deref())?;
                let targets = self.resolve_targets(actor, def.target, targets, false)?;
                Ok(Plan::Limit {
                    def: def.clone(),
                    partner,
                    targets,
                })
            }
            Command::UseSummon { summon, targets } => {
                if !actor.summons.iter().any(|s| s == summon) {
                    return Err(ActionError::NotKnown {
                        actor: actor.id.clone(),
                        id: summon.clone(),
                    });
                }
                let def = match self.catalog.summon(summon) {
                    Ok(def) => def,
                    Err(e) => return Ok(Plan::Fault(e)),
                };
                self.summons.validate(actor, def)?;
                let targets = if def.persistent.is_some() {
                    if self.roster.contains(&summon::instance_id(&actor.id, &def.id)) {
                        return Err(ActionError::SummonAlreadyActive(def.id.clone()));
                    }
                    Vec::new()
                } else {
                    self.resolve_targets(actor, def.target, targets, false)?
                };
                Ok(Plan::Summon {
                    def: def.clone(),
                    targets,
                })
            }
            Command::BatonPass { to } => {
                baton::validate(&self.roster, actor, to)?;
                Ok(Plan::Baton(to.clone()))
            }
            Command::Steal { target } => {
                let victim = self.opponent_target(actor, target)?;
                if !self.steals.has_anything_left(victim) {
                    return Err(ActionError::NothingToSteal(target.clone()));
                }
                Ok(Plan::Steal(target.clone()))
            }
            Command::Mug { target } => {
                self.opponent_target(actor, target)?;
                Ok(Plan::Mug(target.clone()))
            }
        }
    }

    fn opponent_target(&self, actor: &Combatant, target: &str) -> Result<&Combatant, ActionError> {
        let t = self
            .roster
            .get(target)
            .ok_or_else(|| ActionError::UnknownCombatant(target.to_string()))?;
        if t.side == actor.side || !t.is_alive() {
            return Err(ActionError::InvalidTarget(target.to_string()));
        }
        Ok(t)
    }

    fn ally_target(&self, actor: &Combatant, target: &str, wants_dead: bool) -> Result<CombatantId, ActionError> {
        let t = self
            .roster
            .get(target)
            .ok_or_else(|| ActionError::UnknownCombatant(target.to_string()))?;
        let state_ok = if wants_dead {
            t.health.is_dead()
        } else {
            t.is_alive()
        };
        if t.side != actor.side || !state_ok {
            return Err(ActionError::InvalidTarget(target.to_string()));
        }
        Ok(t.id.clone())
    }

    /// Expand a target shape into concrete ids. `wants_dead` flips ally shapes
    /// to fallen allies for revives.
    fn resolve_targets(
        &self,
        actor: &Combatant,
        shape: TargetShape,
        requested: &[CombatantId],
        wants_dead: bool,
    ) -> Result<Vec<CombatantId>, ActionError> {
        let targets = match shape {
            TargetShape::SingleEnemy => {
                let first = requested.first().ok_or(ActionError::MissingTarget)?;
                vec![self.opponent_target(actor, first)?.id.clone()]
            }
            TargetShape::AllEnemies => self.roster.living_ids(actor.side.opponent()),
            TargetShape::SingleAlly => match requested.first() {
                Some(first) => vec![self.ally_target(actor, first, wants_dead)?],
                None if !wants_dead => vec![actor.id.clone()],
                None => return Err(ActionError::MissingTarget),
            },
            TargetShape::AllAllies => self
                .roster
                .side(actor.side)
                .filter(|c| if wants_dead { c.health.is_dead() } else { c.is_alive() })
                .map(|c| c.id.clone())
                .collect(),
            TargetShape::User => vec![actor.id.clone()],
        };
        if targets.is_empty() {
            return Err(ActionError::MissingTarget);
        }
        Ok(targets)
    }

    // ---- shared pieces ----

    fn baton_level(&self, id: &str) -> u32 {
        self.roster.get(id).map(|c| c.flags.baton_level).unwrap_or(0)
    }

    fn feed_gauge(&mut self, id: &str, amount: f64) {
        if let Some(c) = self.roster.get_mut(id) {
            if c.add_gauge(amount) {
                self.events.push(BattleEvent::LimitGaugeReady { actor: id.to_string() });
            }
        }
    }

    /// Death bookkeeping shared by every damage path.
    pub(crate) fn handle_death(&mut self, id: &str) {
        let Some(c) = self.roster.get_mut(id) else {
            return;
        };
        c.on_death();
        let side = c.side;
        self.emit(BattleEvent::Defeated {
            target: id.to_string(),
            side,
        });
        let allies: Vec<CombatantId> = self
            .roster
            .living(side)
            .filter(|a| a.id != id)
            .map(|a| a.id.clone())
            .collect();
        let bonus = self.config.limit.ally_death_bonus;
        for ally in allies {
            self.feed_gauge(&ally, bonus);
        }
    }

    /// One-shot Charge or Concentrate bonus for the next hit of `element`.
    fn take_charge(&mut self, actor: &str, element: Element) -> Option<f64> {
        let kind = if element.is_physical() {
            StatusKind::Charge
        } else if element.is_magic() {
            StatusKind::Concentrate
        } else {
            return None;
        };
        let statuses = self.statuses;
        let c = self.roster.get_mut(actor)?;
        let inst = statuses.consume(c, kind)?;
        Some(1.0 + inst.effective_power() as f64 / 100.0)
    }

    fn inflict(&mut self, source: &str, target_id: &str, inflict: &StatusInflict, out: &mut TargetOutcome) {
        if inflict.chance < 100.0 && !self.dice.percent(inflict.chance) {
            return;
        }
        let statuses = self.statuses;
        let Some(target) = self.roster.get_mut(target_id) else {
            return;
        };
        let applied = statuses.apply_status(
            target,
            inflict.kind,
            inflict.duration,
            inflict.power,
            source,
            &mut self.dice,
        );
        let target = target_id.to_string();
        match applied {
            ApplyOutcome::Applied | ApplyOutcome::Refreshed => {
                out.statuses_applied.push(inflict.kind);
                self.emit(BattleEvent::StatusApplied {
                    target,
                    kind: inflict.kind,
                });
            }
            ApplyOutcome::Resisted => {
                out.statuses_resisted.push(inflict.kind);
                self.emit(BattleEvent::StatusResisted {
                    target,
                    kind: inflict.kind,
                });
            }
            ApplyOutcome::Ignored => {}
        }
    }

    fn cure(&mut self, target_id: &str, kinds: &[StatusKind], debuffs: bool, out: &mut TargetOutcome) {
        let statuses = self.statuses;
        let Some(target) = self.roster.get_mut(target_id) else {
            return;
        };
        let mut removed = statuses.cure(target, kinds);
        if debuffs {
            removed.extend(statuses.cure_debuffs(target));
        }
        for kind in removed {
            out.statuses_cured.push(kind);
            self.events.push(BattleEvent::StatusCured {
                target: target_id.to_string(),
                kind,
            });
        }
    }

    fn heal_target(&mut self, caster: &str, target_id: &str, spec: &HealSpec, out: &mut TargetOutcome) {
        let (magic, level) = match self.roster.get(caster) {
            Some(c) => (c.effective_stats().magic_attack as f64, c.flags.baton_level),
            None => (0.0, 0),
        };
        let multiplier = baton::heal_multiplier(&self.config.baton, level);
        let Some(target) = self.roster.get_mut(target_id) else {
            return;
        };
        let raw = spec.flat as f64
            + target.health.max_hp as f64 * spec.percent / 100.0
            + magic * spec.magic_scaling;
        let healed = heal(&mut target.health, crate::to_points(raw * multiplier));
        let hp_after = target.health.hp;
        out.healing += healed;
        self.emit(BattleEvent::Healed {
            target: target_id.to_string(),
            amount: healed,
            hp_after,
        });
    }

    fn revive_target(&mut self, target_id: &str, percent: f64, out: &mut TargetOutcome) {
        let Some(target) = self.roster.get_mut(target_id) else {
            return;
        };
        let amount = crate::to_points(target.health.max_hp as f64 * percent / 100.0).max(1);
        if revive(&mut target.health, amount) {
            let hp = target.health.hp;
            out.healing += hp;
            self.emit(BattleEvent::Revived {
                target: target_id.to_string(),
                hp,
            });
        }
    }

    /// Resolve every hit of `strike` against one target.
    ///
    /// Per hit: hit roll, critical roll, base damage, modifier pipeline, then
    /// the post-damage triggers (technical consumption, gauges, knockdown and
    /// One More). Status inflicts roll once after the last hit if any landed.
    fn strike(&mut self, strike: &Strike<'_>, target_id: &str, gate: &mut OneMoreGate) -> TargetOutcome {
        let mut out = TargetOutcome::new(target_id);
        let profile = strike.profile;
        let mut landed = false;

        for _ in 0..profile.hit_count.max(1) {
            let (Some(attacker), Some(target)) = (self.roster.get(strike.attacker), self.roster.get(target_id))
            else {
                self.fault(DataError::StaleCombatant(target_id.to_string()));
                break;
            };
            if !target.is_alive() || !attacker.is_alive() {
                break;
            }
            let attacker_side = attacker.side;

            let accuracy = hit_chance(target, profile);
            if accuracy < 100.0 && !self.dice.percent(accuracy) {
                out.flags.missed = true;
                self.emit(BattleEvent::Missed {
                    source: strike.attacker.to_string(),
                    target: target_id.to_string(),
                });
                continue;
            }

            let affinity = resolve_affinity(target, profile);
            let critical = !matches!(strike.base, BaseSource::Fixed(_))
                && affinity.deals_damage()
                && self
                    .dice
                    .percent(crit_chance(&self.config, profile, strike.baton_level));
            let tech = if affinity.deals_damage() {
                technical::detect(&self.config.technicals, target, profile.element)
            } else {
                None
            };
            let guard_reduction = guard::reduction(target);
            let was_down = target.flags.knocked_down;

            let instant = instant_kill_applies(target, profile, affinity);
            let final_damage = if instant {
                FinalDamage::Damage(target.health.max_hp)
            } else {
                let attacker_stats = attacker.effective_stats();
                let defender_stats = target.effective_stats();
                let base = match strike.base {
                    BaseSource::Formula => {
                        let input = FormulaInput {
                            attacker: attacker_stats,
                            defender: defender_stats,
                            defender_base: target.base,
                            attacker_level: attacker.level,
                            defender_level: target.level,
                            profile,
                            is_critical: critical,
                        };
                        self.config.formula.base_damage(&input)
                    }
                    BaseSource::Limit { duo_bonus } => {
                        limit::base_damage(profile, &attacker_stats, &defender_stats, duo_bonus)
                    }
                    BaseSource::Showtime { combined } => {
                        showtime::base_damage(profile, combined, &defender_stats)
                    }
                    BaseSource::Fixed(amount) => amount as f64,
                };
                let mods = HitModifiers {
                    baton_level: strike.baton_level,
                    critical,
                    technical: tech.map(|t| t.multiplier),
                    guard_reduction,
                    charge: strike.charge,
                };
                finalize_damage(base, affinity, &mods, &self.config)
            };

            match final_damage {
                FinalDamage::Damage(amount) => {
                    landed = true;
                    let Some(target) = self.roster.get_mut(target_id) else {
                        break;
                    };
                    let taken = apply_damage(&mut target.health, amount);
                    let hp_after = target.health.hp;
                    out.damage += taken.dealt;
                    out.flags.instant_kill |= instant;
                    self.emit(BattleEvent::Damage {
                        source: strike.attacker.to_string(),
                        target: target_id.to_string(),
                        amount: taken.dealt,
                        element: profile.element,
                        side: attacker_side,
                        hp_after,
                        all_out: false,
                    });
                    if affinity == Affinity::Weak {
                        out.flags.hit_weakness = true;
                        self.emit(BattleEvent::WeaknessHit {
                            attacker: strike.attacker.to_string(),
                            target: target_id.to_string(),
                            element: profile.element,
                        });
                    }
                    if affinity == Affinity::Resist {
                        out.flags.resisted = true;
                    }
                    if critical {
                        out.flags.critical = true;
                        self.emit(BattleEvent::CriticalHit {
                            attacker: strike.attacker.to_string(),
                            target: target_id.to_string(),
                        });
                    }
                    if guard_reduction.is_some() {
                        out.flags.guarded = true;
                    }
                    if let Some(tech) = tech {
                        out.flags.technical = true;
                        self.emit(BattleEvent::Technical {
                            attacker: strike.attacker.to_string(),
                            target: target_id.to_string(),
                            status: tech.status,
                            element: profile.element,
                        });
                        if tech.consumes_status && !taken.killed {
                            self.cure(target_id, &[tech.status], false, &mut out);
                        }
                    }

                    if strike.feeds_gauge {
                        let gain = limit::from_damage_dealt(&self.config.limit, taken.dealt, critical);
                        self.feed_gauge(strike.attacker, gain);
                    }
                    if taken.killed {
                        out.flags.killed = true;
                        self.handle_death(target_id);
                        continue;
                    }
                    let gain = limit::from_damage_taken(&self.config.limit, taken.dealt);
                    self.feed_gauge(target_id, gain);

                    if (affinity == Affinity::Weak || critical) && !was_down {
                        let downed = self
                            .roster
                            .get_mut(target_id)
                            .is_some_and(momentum::knock_down);
                        if !downed {
                            continue;
                        }
                        out.flags.caused_knockdown = true;
                        self.emit(BattleEvent::KnockedDown {
                            target: target_id.to_string(),
                        });
                        if let Some(attacker) = self.roster.get_mut(strike.attacker) {
                            if gate.grant(attacker) {
                                self.emit(BattleEvent::OneMore {
                                    actor: strike.attacker.to_string(),
                                });
                            }
                        }
                    }
                }
                FinalDamage::Nullified => {
                    out.flags.nullified = true;
                    self.emit(BattleEvent::Nullified {
                        target: target_id.to_string(),
                        element: profile.element,
                    });
                }
                FinalDamage::Absorbed(amount) => {
                    out.flags.absorbed = true;
                    let healed = match self.roster.get_mut(target_id) {
                        Some(t) => heal(&mut t.health, amount),
                        None => 0,
                    };
                    self.emit(BattleEvent::Absorbed {
                        target: target_id.to_string(),
                        element: profile.element,
                        amount: healed,
                    });
                }
                FinalDamage::Reflected(amount) => {
                    out.flags.reflected = true;
                    let Some(attacker) = self.roster.get_mut(strike.attacker) else {
                        break;
                    };
                    let taken = apply_damage(&mut attacker.health, amount);
                    self.emit(BattleEvent::Reflected {
                        source: strike.attacker.to_string(),
                        target: target_id.to_string(),
                        element: profile.element,
                        amount: taken.dealt,
                    });
                    if taken.killed {
                        self.handle_death(strike.attacker);
                        break;
                    }
                }
            }
        }

        if landed {
            for inflict in &profile.inflicts {
                if self.roster.get(target_id).is_some_and(|t| t.is_alive()) {
                    self.inflict(strike.attacker, target_id, inflict, &mut out);
                }
            }
        }
        out
    }

    fn fixed_profile(label: &str, damage: FixedDamage, inflicts: &[StatusInflict]) -> AttackProfile {
        AttackProfile {
            label: label.to_string(),
            element: damage.element,
            inflicts: inflicts.to_vec(),
            ..AttackProfile::basic_attack()
        }
    }

    /// Damage, healing or statuses from an item-like effect that skips the formula.
    fn apply_effect(
        &mut self,
        source: &str,
        label: &str,
        effect: &SummonEffect,
        targets: &[CombatantId],
        gate: &mut OneMoreGate,
    ) -> Vec<TargetOutcome> {
        let mut outcomes = Vec::new();
        for target in targets {
            if let Some(damage) = effect.damage {
                let profile = Self::fixed_profile(label, damage, &effect.inflicts);
                let strike = Strike {
                    attacker: source,
                    profile: &profile,
                    base: BaseSource::Fixed(damage.amount),
                    baton_level: 0,
                    charge: None,
                    feeds_gauge: false,
                };
                outcomes.push(self.strike(&strike, target, gate));
                continue;
            }
            let mut out = TargetOutcome::new(target);
            if let Some(spec) = effect.heal {
                self.heal_target(source, target, &spec, &mut out);
            }
            for inflict in &effect.inflicts {
                self.inflict(source, target, inflict, &mut out);
            }
            outcomes.push(out);
        }
        outcomes
    }

    // ---- per-command resolution ----

    fn run_attack(&mut self, actor: &str, target: &str, kind: ActionKind) -> ActionResult {
        let profile = AttackProfile::basic_attack();
        let charge = self.take_charge(actor, profile.element);
        let strike = Strike {
            attacker: actor,
            profile: &profile,
            base: BaseSource::Formula,
            baton_level: self.baton_level(actor),
            charge,
            feeds_gauge: true,
        };
        let mut gate = OneMoreGate::default();
        let out = self.strike(&strike, target, &mut gate);
        ActionResult::finish(actor, kind, vec![out], gate.granted())
    }

    fn run_skill(&mut self, actor: &str, skill: &SkillDef, targets: &[CombatantId]) -> ActionResult {
        if let Some(c) = self.roster.get_mut(actor) {
            let hp_cost = skill.hp_cost_for(c.health.max_hp);
            spend(&mut c.health, skill.mp_cost, hp_cost);
        }
        let mut gate = OneMoreGate::default();
        let mut outcomes = Vec::new();
        match skill.kind {
            SkillKind::Damage => {
                let profile = AttackProfile::from_skill(skill);
                let charge = self.take_charge(actor, profile.element);
                let strike = Strike {
                    attacker: actor,
                    profile: &profile,
                    base: BaseSource::Formula,
                    baton_level: self.baton_level(actor),
                    charge,
                    feeds_gauge: true,
                };
                for target in targets {
                    outcomes.push(self.strike(&strike, target, &mut gate));
                }
            }
            SkillKind::Heal => {
                let spec = skill.heal.unwrap_or_default();
                for target in targets {
                    let mut out = TargetOutcome::new(target);
                    self.heal_target(actor, target, &spec, &mut out);
                    self.cure(target, &skill.cures, skill.cure_debuffs, &mut out);
                    for inflict in &skill.inflicts {
                        self.inflict(actor, target, inflict, &mut out);
                    }
                    outcomes.push(out);
                }
            }
            SkillKind::Revive => {
                for target in targets {
                    let mut out = TargetOutcome::new(target);
                    self.revive_target(target, skill.revive_percent, &mut out);
                    outcomes.push(out);
                }
            }
            SkillKind::Support => {
                for target in targets {
                    let mut out = TargetOutcome::new(target);
                    self.cure(target, &skill.cures, skill.cure_debuffs, &mut out);
                    for inflict in &skill.inflicts {
                        self.inflict(actor, target, inflict, &mut out);
                    }
                    outcomes.push(out);
                }
            }
        }
        ActionResult::finish(actor, ActionKind::Skill, outcomes, gate.granted())
    }

    fn run_item(&mut self, actor: &str, item: &ItemDef, targets: &[CombatantId]) -> ActionResult {
        self.inventory.take(&item.id);
        self.emit(BattleEvent::ItemUsed {
            actor: actor.to_string(),
            item: item.id.clone(),
        });
        let mut gate = OneMoreGate::default();
        let mut outcomes = Vec::new();
        for target in targets {
            if let Some(damage) = item.damage {
                let profile = Self::fixed_profile(&item.name, damage, &item.inflicts);
                let strike = Strike {
                    attacker: actor,
                    profile: &profile,
                    base: BaseSource::Fixed(damage.amount),
                    baton_level: 0,
                    charge: None,
                    feeds_gauge: true,
                };
                outcomes.push(self.strike(&strike, target, &mut gate));
                continue;
            }
            let mut out = TargetOutcome::new(target);
            if let Some(percent) = item.revive_percent {
                self.revive_target(target, percent, &mut out);
            }
            if let Some(spec) = item.heal {
                self.heal_target(actor, target, &spec, &mut out);
            }
            if item.restore_mp > 0 {
                if let Some(t) = self.roster.get_mut(target) {
                    restore_mp(&mut t.health, item.restore_mp);
                }
            }
            self.cure(target, &item.cures, item.cure_debuffs, &mut out);
            for inflict in &item.inflicts {
                self.inflict(actor, target, inflict, &mut out);
            }
            outcomes.push(out);
        }
        ActionResult::finish(actor, ActionKind::Item, outcomes, gate.granted())
    }

    fn run_guard(&mut self, actor: &str) -> ActionResult {
        if let Some(c) = self.roster.get_mut(actor) {
            let reduction = guard::raise(c, &self.config.guard);
            self.events.push(BattleEvent::Guarding {
                actor: actor.to_string(),
                reduction,
            });
        }
        ActionResult::finish(actor, ActionKind::Guard, Vec::new(), false)
    }

    fn run_escape(&mut self, actor: &str, side: Side) -> ActionResult {
        let chance = escape::escape_chance(&self.config, &self.roster, side, &self.escape);
        let success = self.dice.percent(chance);
        if success {
            self.escaped = true;
        } else {
            self.escape.failed_attempts += 1;
        }
        self.emit(BattleEvent::EscapeAttempt {
            actor: actor.to_string(),
            chance,
            success,
        });
        let mut result = ActionResult::finish(actor, ActionKind::Escape, Vec::new(), false);
        result.escaped = Some(success);
        result
    }

    /// Enemies and summons leave individually; they grant nothing once gone.
    fn run_flee(&mut self, actor: &str) -> ActionResult {
        if let Some(c) = self.roster.get_mut(actor) {
            c.health.state = LifeState::Fled;
            c.on_death();
            self.events.push(BattleEvent::Fled {
                actor: actor.to_string(),
            });
        }
        let mut result = ActionResult::finish(actor, ActionKind::Escape, Vec::new(), false);
        result.escaped = Some(true);
        result
    }

    fn run_all_out(&mut self, actor: &str, side: Side) -> ActionResult {
        let multiplier = self.config.all_out.attack_multiplier;
        let shares: Vec<i32> = self
            .roster
            .living(side)
            .map(|ally| momentum::all_out_share(ally, multiplier))
            .collect();
        let total: i32 = shares.iter().sum();
        let downed: Vec<CombatantId> = self
            .roster
            .living(side.opponent())
            .filter(|c| c.flags.knocked_down)
            .map(|c| c.id.clone())
            .collect();

        let mut outcomes = Vec::new();
        let mut dealt_total = 0;
        for target in &downed {
            let mut out = TargetOutcome::new(target);
            let Some(t) = self.roster.get_mut(target) else {
                continue;
            };
            momentum::stand_up(t);
            let taken = apply_damage(&mut t.health, total);
            let hp_after = t.health.hp;
            out.damage = taken.dealt;
            dealt_total += taken.dealt;
            self.emit(BattleEvent::Damage {
                source: actor.to_string(),
                target: target.clone(),
                amount: taken.dealt,
                element: Element::Physical,
                side,
                hp_after,
                all_out: true,
            });
            if taken.killed {
                out.flags.killed = true;
                self.handle_death(target);
            } else {
                self.emit(BattleEvent::StoodUp {
                    target: target.clone(),
                });
            }
            outcomes.push(out);
        }
        let gain = limit::from_damage_dealt(&self.config.limit, dealt_total, false);
        self.feed_gauge(actor, gain);
        self.momentum.close();
        self.emit(BattleEvent::AllOutAttack {
            side,
            participants: shares.len(),
            damage: dealt_total,
        });
        ActionResult::finish(actor, ActionKind::AllOutAttack, outcomes, false)
    }

    fn run_limit(
        &mut self,
        actor: &str,
        def: &LimitBreakDef,
        partner: Option<&str>,
        targets: &[CombatantId],
    ) -> ActionResult {
        limit::consume(&mut self.roster, actor, partner);
        self.emit(BattleEvent::LimitBreak {
            actor: actor.to_string(),
            partner: partner.map(str::to_string),
            limit: def.id.clone(),
        });
        let profile = AttackProfile::from_limit(def);
        let duo_bonus = if partner.is_some() { def.duo_bonus } else { 1.0 };
        let strike = Strike {
            attacker: actor,
            profile: &profile,
            base: BaseSource::Limit { duo_bonus },
            baton_level: self.baton_level(actor),
            charge: None,
            feeds_gauge: false,
        };
        let mut gate = OneMoreGate::default();
        let mut outcomes = Vec::new();
        for target in targets {
            outcomes.push(self.strike(&strike, target, &mut gate));
        }

        let mut own = TargetOutcome::new(actor);
        if def.self_heal_percent > 0.0 {
            let spec = HealSpec {
                percent: def.self_heal_percent,
                ..HealSpec::default()
            };
            self.heal_target(actor, actor, &spec, &mut own);
        }
        let statuses = self.statuses;
        for buff in &def.self_buffs {
            if let Some(c) = self.roster.get_mut(actor) {
                let applied = statuses.force_status(c, buff.kind, buff.duration, buff.power, actor);
                if applied != ApplyOutcome::Ignored {
                    own.statuses_applied.push(buff.kind);
                    self.events.push(BattleEvent::StatusApplied {
                        target: actor.to_string(),
                        kind: buff.kind,
                    });
                }
            }
        }
        if own.healing > 0 || !own.statuses_applied.is_empty() {
            outcomes.push(own);
        }

        if def.grants_extra_turn {
            if let Some(c) = self.roster.get_mut(actor) {
                if gate.grant(c) {
                    self.events.push(BattleEvent::OneMore {
                        actor: actor.to_string(),
                    });
                }
            }
        }
        if def.stop_time_turns > 0 {
            if let Some(side) = self.roster.get(actor).map(|c| c.side.opponent()) {
                self.scheduler.stop_side(side, def.stop_time_turns);
                self.emit(BattleEvent::TimeStopped {
                    side,
                    turns: def.stop_time_turns,
                });
            }
        }
        ActionResult::finish(actor, ActionKind::LimitBreak, outcomes, gate.granted())
    }

    fn run_summon(&mut self, actor: &str, def: &SummonDef, targets: &[CombatantId]) -> ActionResult {
        let Some(summoner) = self.roster.get_mut(actor) else {
            self.fault(DataError::StaleCombatant(actor.to_string()));
            return ActionResult::no_op(actor, ActionKind::Summon);
        };
        spend(&mut summoner.health, def.mp_cost, def.hp_cost);
        let summoner = summoner.clone();
        self.summons.start_cooldown(actor, def);

        let mut gate = OneMoreGate::default();
        let outcomes = match &def.persistent {
            Some(spec) => {
                let spawned = self.summons.spawn(&summoner, def, spec);
                let instance = spawned.id.clone();
                if let Err(e) = self.roster.insert(spawned) {
                    self.emit(BattleEvent::Diagnostic {
                        message: e.to_string(),
                    });
                    return ActionResult::no_op(actor, ActionKind::Summon);
                }
                self.scheduler.recompute(&self.roster);
                self.emit(BattleEvent::Summoned {
                    summoner: actor.to_string(),
                    summon: def.id.clone(),
                    instance: Some(instance),
                });
                Vec::new()
            }
            None => {
                self.emit(BattleEvent::Summoned {
                    summoner: actor.to_string(),
                    summon: def.id.clone(),
                    instance: None,
                });
                self.apply_effect(actor, &def.name, &def.effect, targets, &mut gate)
            }
        };
        ActionResult::finish(actor, ActionKind::Summon, outcomes, gate.granted())
    }

    fn run_baton(&mut self, actor: &str, to: &str) -> ActionResult {
        if let Some(level) = baton::execute(&mut self.roster, actor, to) {
            self.emit(BattleEvent::BatonPass {
                from: actor.to_string(),
                to: to.to_string(),
                level,
            });
        }
        ActionResult::finish(actor, ActionKind::BatonPass, Vec::new(), false)
    }

    fn run_steal(&mut self, actor: &str, target: &str, kind: ActionKind) -> ActionResult {
        let mut result = ActionResult::finish(actor, kind, Vec::new(), false);
        self.attempt_steal(actor, target, &mut result);
        result
    }

    /// Attack, then steal whether or not the attack killed.
    fn run_mug(&mut self, actor: &str, target: &str) -> ActionResult {
        let mut result = self.run_attack(actor, target, ActionKind::Mug);
        self.attempt_steal(actor, target, &mut result);
        result
    }

    fn attempt_steal(&mut self, actor: &str, target: &str, result: &mut ActionResult) {
        let (Some(thief), Some(victim)) = (self.roster.get(actor), self.roster.get(target)) else {
            return;
        };
        match self.steals.attempt(thief, victim, &mut self.dice) {
            StealAttempt::Stole(loot) => {
                if let StolenLoot::Item(item) = &loot {
                    self.inventory.add(item, 1);
                }
                self.stolen.push(loot.clone());
                self.emit(BattleEvent::Stolen {
                    thief: actor.to_string(),
                    target: target.to_string(),
                    loot: loot.clone(),
                });
                result.stolen = Some(loot);
            }
            StealAttempt::Failed => self.emit(BattleEvent::StealFailed {
                thief: actor.to_string(),
                target: target.to_string(),
            }),
            StealAttempt::NothingLeft => {}
        }
    }

    // ---- round-level hooks used by the orchestrator ----

    /// Resolve a triggered showtime. Members share one attack; nobody earns a bonus turn.
    pub(crate) fn perform_showtime(&mut self, id: &str) -> Option<ActionResult> {
        let def = match self.catalog.showtime(id) {
            Ok(def) => def.clone(),
            Err(e) => {
                self.fault(e);
                return None;
            }
        };
        let [a, b] = &def.members;
        let (first, second) = (self.roster.get(a)?, self.roster.get(b)?);
        let combined = showtime::combined_power(&first.effective_stats(), &second.effective_stats());
        let side = first.side;
        let targets: Vec<CombatantId> = match def.target {
            TargetShape::SingleEnemy => {
                let living: Vec<&Combatant> = self.roster.living(side.opponent()).collect();
                targeting::select(TargetPriority::LowestHp, &living, &mut self.dice)
                    .map(|c| vec![c.id.clone()])
                    .unwrap_or_default()
            }
            _ => self.roster.living_ids(side.opponent()),
        };

        let profile = AttackProfile::from_showtime(&def);
        let strike = Strike {
            attacker: a,
            profile: &profile,
            base: BaseSource::Showtime { combined },
            baton_level: 0,
            charge: None,
            feeds_gauge: false,
        };
        let mut gate = OneMoreGate::spent();
        let outcomes: Vec<TargetOutcome> = targets
            .iter()
            .map(|t| self.strike(&strike, t, &mut gate))
            .collect();
        self.showtimes.start_cooldown(&def);
        let result = ActionResult::finish(a, ActionKind::Showtime, outcomes, false);
        self.emit(BattleEvent::Showtime {
            showtime: def.id.clone(),
            members: def.members.clone(),
            damage: result.damage_dealt,
        });
        self.after_action(side);
        Some(result)
    }

    /// Passive effects of every persistent summon, once per round.
    pub(crate) fn tick_summon_passives(&mut self) {
        let active: Vec<(CombatantId, String)> = self
            .summons
            .active()
            .map(|(id, a)| (id.clone(), a.summon.clone()))
            .collect();
        for (instance, summon_id) in active {
            let Some(side) = self.roster.get(&instance).filter(|c| c.is_alive()).map(|c| c.side) else {
                continue;
            };
            let def = match self.catalog.summon(&summon_id) {
                Ok(def) => def.clone(),
                Err(e) => {
                    self.fault(e);
                    continue;
                }
            };
            let Some(spec) = def.persistent.as_ref() else {
                continue;
            };
            let passive = &spec.passive;
            if passive.damage.is_none() && passive.heal.is_none() && passive.inflicts.is_empty() {
                continue;
            }
            // Healing passives support the summoner's side; everything else hits the opponents.
            let toward = if passive.heal.is_some() { side } else { side.opponent() };
            let targets = self.roster.living_ids(toward);
            let mut gate = OneMoreGate::spent();
            self.apply_effect(&instance, &def.name, passive, &targets, &mut gate);
        }
        self.cleanup_summons();
    }

    /// Age persistent summons and dismiss the ones whose time is up.
    pub(crate) fn expire_summons(&mut self) {
        for instance in self.summons.tick_round() {
            self.summons.dismiss(&mut self.roster, &instance);
            self.emit(BattleEvent::SummonDismissed {
                instance,
                reason: DismissReason::Expired,
            });
        }
        self.scheduler.recompute(&self.roster);
    }

    /// Remove fallen summons and summons whose summoner fell.
    pub(crate) fn cleanup_summons(&mut self) {
        let casualties = self.summons.casualties(&self.roster);
        if casualties.is_empty() {
            return;
        }
        for (instance, reason) in casualties {
            if reason == DismissReason::SummonerFell {
                if let Some(c) = self.roster.get_mut(&instance) {
                    c.health.hp = 0;
                    c.health.state = LifeState::Dead;
                    c.on_death();
                }
            }
            self.summons.dismiss(&mut self.roster, &instance);
            self.emit(BattleEvent::SummonDismissed { instance, reason });
        }
        self.scheduler.recompute(&self.roster);
    }
}
