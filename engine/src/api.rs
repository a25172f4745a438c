//! Simulation helpers: load an encounter and let the AI play both sides.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::battle::{Battle, BattleReport, Outcome};
use crate::combat::actions::Action;
use crate::combatant::{CombatantSpec, Side};
use crate::config::BattleConfig;
use crate::content;
use crate::data::Catalog;
use crate::inventory::Inventory;
use crate::rewards::{BattleRewards, ScoreCard};

/// One battle's worth of input: both sides, the party inventory and tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct EncounterSetup {
    #[serde(default)]
    pub name: String,
    pub party: Vec<CombatantSpec>,
    pub enemies: Vec<CombatantSpec>,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub config: BattleConfig,
    /// Records for this encounter; the built-in catalog when absent.
    #[serde(default)]
    pub catalog: Option<Catalog>,
}

impl EncounterSetup {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse encounter JSON")
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("failed to parse encounter YAML")
    }

    /// YAML for `.yaml`/`.yml`, JSON otherwise.
    pub fn from_text(text: &str, path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(text),
            _ => Self::from_json(text),
        }
    }

    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read encounter: {}", path))?;
        Self::from_text(&text, Path::new(path))
            .with_context(|| format!("failed to load encounter: {}", path))
    }

    pub fn builtin(id: &str) -> Result<Self> {
        let encounters = content::builtin_encounters();
        let text = encounters
            .get(id)
            .ok_or_else(|| anyhow!("unknown built-in encounter '{}'", id))?;
        Self::from_json(text).with_context(|| format!("built-in encounter '{}'", id))
    }

    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(catalog) => Ok(catalog.clone()),
            None => content::builtin_catalog().context("failed to parse built-in catalog"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Built-in encounter id.
    pub encounter: Option<String>,
    pub encounter_path: Option<String>,
    /// Overrides the encounter's own seed.
    pub seed: Option<u64>,
    pub max_rounds: Option<u32>,
}

impl SimulationConfig {
    fn setup(&self) -> Result<EncounterSetup> {
        let mut setup = match (&self.encounter, &self.encounter_path) {
            (Some(_), Some(_)) => bail!("set either encounter or encounter_path, not both"),
            (Some(id), None) => EncounterSetup::builtin(id)?,
            (None, Some(path)) => EncounterSetup::load(path)?,
            (None, None) => bail!("no encounter given"),
        };
        if let Some(seed) = self.seed {
            setup.config.seed = seed;
        }
        if let Some(max_rounds) = self.max_rounds {
            setup.config.max_rounds = max_rounds;
        }
        Ok(setup)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub encounter: String,
    pub outcome: Outcome,
    pub rounds: u32,
    pub rewards: BattleRewards,
    pub score: ScoreCard,
    pub log: Vec<String>,
}

impl SimulationResult {
    pub fn from_report(encounter: &str, report: BattleReport) -> Self {
        Self {
            encounter: encounter.to_string(),
            outcome: report.outcome,
            rounds: report.rounds,
            rewards: report.rewards,
            score: report.score,
            log: report.log,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ManySummary {
    pub samples: u32,
    pub victories: u32,
    pub defeats: u32,
    pub escapes: u32,
    pub aborted: u32,
    pub victory_rate: f64,
    pub avg_rounds: f64,
}

pub fn simulate_battle(cfg: SimulationConfig) -> Result<SimulationResult> {
    let setup = cfg.setup()?;
    let report = run_battle(&setup, setup.config.seed)?;
    Ok(SimulationResult::from_report(&setup.name, report))
}

/// Run `samples` battles with seeds `seed`, `seed + 1`, ...
pub fn simulate_many(cfg: SimulationConfig, samples: u32) -> Result<ManySummary> {
    let setup = cfg.setup()?;
    run_many(&setup, samples)
}

pub fn run_many(setup: &EncounterSetup, samples: u32) -> Result<ManySummary> {
    if samples == 0 {
        bail!("samples must be at least 1");
    }
    let base = setup.config.seed;
    let mut summary = ManySummary {
        samples,
        ..ManySummary::default()
    };
    let mut total_rounds = 0u64;
    for i in 0..samples {
        let report = run_battle(setup, base.wrapping_add(i as u64))?;
        total_rounds += report.rounds as u64;
        match report.outcome {
            Outcome::Victory => summary.victories += 1,
            Outcome::Defeat => summary.defeats += 1,
            Outcome::Escaped => summary.escapes += 1,
            Outcome::Aborted => summary.aborted += 1,
        }
    }
    summary.victory_rate = summary.victories as f64 / samples as f64;
    summary.avg_rounds = total_rounds as f64 / samples as f64;
    tracing::debug!(samples, victories = summary.victories, "simulation batch done");
    Ok(summary)
}

/// Drive one battle to the end with the AI choosing for every combatant.
pub fn run_battle(setup: &EncounterSetup, seed: u64) -> Result<BattleReport> {
    let mut config = setup.config.clone();
    config.seed = seed;
    let max_rounds = config.max_rounds;
    let mut battle = Battle::initialize(
        &setup.party,
        &setup.enemies,
        setup.catalog()?,
        setup.inventory.clone(),
        config,
    )?;

    while let Some(turn) = battle.next_turn()? {
        if max_rounds > 0 && battle.round() > max_rounds {
            battle.abort();
            break;
        }
        let action = choose_action(&mut battle, &turn.actor);
        submit_with_fallback(&mut battle, &turn.actor, action)?;
        battle.presentation_complete()?;
    }
    Ok(battle.shutdown())
}

/// Party members take an open all-out attack or a ready limit break before
/// asking the AI.
fn choose_action(battle: &mut Battle, actor: &str) -> Action {
    let Some(c) = battle.combatant(actor) else {
        return Action::guard(actor);
    };
    if c.side == Side::Party && battle.all_out_attack_available() {
        return Action::all_out_attack(actor);
    }
    if c.limit_ready() {
        if let Some(limit) = c.limit_breaks.first() {
            let target = battle
                .roster()
                .living(c.side.opponent())
                .min_by_key(|e| e.health.hp)
                .map(|e| e.id.clone());
            let targets: Vec<&str> = target.as_deref().into_iter().collect();
            return Action::limit_break(actor, limit, None, &targets);
        }
    }
    match battle.ai_decide() {
        Some(decision) => decision.to_action(actor),
        None => Action::guard(actor),
    }
}

/// A rejected choice falls back to a basic attack, then to guarding.
fn submit_with_fallback(battle: &mut Battle, actor: &str, action: Action) -> Result<()> {
    let rejected = match battle.submit(action) {
        Ok(_) => return Ok(()),
        Err(e) => e,
    };
    tracing::debug!(actor, error = %rejected, "action rejected, falling back");

    let target = battle.combatant(actor).and_then(|c| {
        battle
            .roster()
            .living(c.side.opponent())
            .next()
            .map(|e| e.id.clone())
    });
    if let Some(target) = target {
        if battle.submit(Action::attack(actor, &target)).is_ok() {
            return Ok(());
        }
    }
    battle
        .submit(Action::guard(actor))
        .with_context(|| format!("{} could not take any action", actor))?;
    Ok(())
}
