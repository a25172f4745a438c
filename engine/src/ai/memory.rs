use indexmap::IndexMap;

use crate::combatant::CombatantId;
use crate::element::{Affinity, Element};
use crate::events::{BattleEvent, BattleObserver};

/// Affinities discovered by watching hits land. Shared by both sides; an entry
/// only records what the event stream has actually revealed.
#[derive(Debug, Clone, Default)]
pub struct WeaknessMemory {
    known: IndexMap<CombatantId, IndexMap<Element, Affinity>>,
}

impl WeaknessMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A weakness always overwrites; anything else only fills a blank.
    pub fn record(&mut self, target: &str, element: Element, affinity: Affinity) {
        let entry = self.known.entry(target.to_string()).or_default();
        if affinity == Affinity::Weak || !entry.contains_key(&element) {
            entry.insert(element, affinity);
        }
    }

    pub fn known(&self, target: &str, element: Element) -> Option<Affinity> {
        self.known.get(target)?.get(&element).copied()
    }

    pub fn is_weak(&self, target: &str, element: Element) -> bool {
        self.known(target, element) == Some(Affinity::Weak)
    }

    pub fn tested(&self, target: &str, element: Element) -> bool {
        self.known(target, element).is_some()
    }

    pub fn observe(&mut self, event: &BattleEvent) {
        match event {
            BattleEvent::Damage {
                target,
                element,
                all_out: false,
                ..
            } => self.record(target, *element, Affinity::Normal),
            BattleEvent::WeaknessHit {
                target, element, ..
            } => self.record(target, *element, Affinity::Weak),
            BattleEvent::Nullified { target, element } => {
                self.record(target, *element, Affinity::Null)
            }
            BattleEvent::Absorbed {
                target, element, ..
            } => self.record(target, *element, Affinity::Absorb),
            BattleEvent::Reflected {
                target, element, ..
            } => self.record(target, *element, Affinity::Reflect),
            _ => {}
        }
    }
}

impl BattleObserver for WeaknessMemory {
    fn on_event(&mut self, event: &BattleEvent) {
        self.observe(event);
    }
}
