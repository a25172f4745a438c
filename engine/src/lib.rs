use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod ai;
pub mod api;
pub mod baton;
pub mod battle;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod content;
pub mod data;
pub mod element;
pub mod error;
pub mod escape;
pub mod events;
pub mod guard;
pub mod inventory;
pub mod life;
pub mod limit;
pub mod rewards;
pub mod scheduler;
pub mod showtime;
pub mod status;
pub mod steal;
pub mod summon;

pub use battle::{Battle, BattlePhase, BattleReport, Outcome, Presentation, TurnStart};
pub use combat::actions::{Action, ActionKind, ActionResult, Command, HitFlags, TargetOutcome};
pub use combatant::{Combatant, CombatantId, CombatantSpec, Roster, Side, Stats};
pub use config::BattleConfig;
pub use data::Catalog;
pub use element::{Affinity, Element};
pub use error::{ActionError, DataError, SetupError};
pub use events::{BattleEvent, BattleObserver};
pub use inventory::Inventory;
pub use status::{StatusKind, StatusManager};

/// Seedable source for every probability roll in a battle.
///
/// All rolls are unit rolls in `[0, 1)`; a check with probability `p`
/// succeeds when the roll is strictly below `p`.
pub struct Dice {
    source: RollSource,
}

enum RollSource {
    Seeded(ChaCha8Rng),
    Scripted { values: Vec<f64>, next: usize },
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: RollSource::Seeded(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Replays `values` in order, cycling when exhausted. Used to pin outcomes in tests.
    pub fn from_scripted(values: Vec<f64>) -> Self {
        Self {
            source: RollSource::Scripted { values, next: 0 },
        }
    }

    pub fn unit(&mut self) -> f64 {
        match &mut self.source {
            RollSource::Seeded(rng) => rng.gen_range(0.0..1.0),
            RollSource::Scripted { values, next } => {
                if values.is_empty() {
                    return 0.0;
                }
                let v = values[*next % values.len()];
                *next += 1;
                v.clamp(0.0, 0.999_999)
            }
        }
    }

    /// Probability in `[0, 1]`.
    pub fn chance(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        self.unit() < probability
    }

    /// Probability in percent, `[0, 100]`.
    pub fn percent(&mut self, pct: f64) -> bool {
        self.chance(pct / 100.0)
    }

    /// Uniform integer in `lo..=hi`.
    pub fn range(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo + 1) as f64;
        lo + (self.unit() * span).floor() as i32
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range(0, items.len() as i32 - 1) as usize;
        items.get(idx)
    }
}

impl std::fmt::Debug for Dice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            RollSource::Seeded(_) => f.write_str("Dice(seeded)"),
            RollSource::Scripted { values, next } => {
                write!(f, "Dice(scripted {:?} @{})", values, next)
            }
        }
    }
}

/// Round a computed amount to the nearest whole point.
pub(crate) fn to_points(value: f64) -> i32 {
    if value.is_finite() {
        value.round() as i32
    } else {
        0
    }
}
