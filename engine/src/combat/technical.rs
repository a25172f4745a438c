use serde::Deserialize;

use crate::combatant::Combatant;
use crate::element::Element;
use crate::status::StatusKind;

/// A status + element pairing that earns bonus damage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TechnicalCombo {
    pub status: StatusKind,
    pub elements: Vec<Element>,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Elements whose technical hit removes the enabling status.
    #[serde(default)]
    pub consumes_with: Vec<Element>,
}

fn default_multiplier() -> f64 {
    1.5
}

impl TechnicalCombo {
    fn new(status: StatusKind, elements: &[Element]) -> Self {
        Self {
            status,
            elements: elements.to_vec(),
            multiplier: default_multiplier(),
            consumes_with: Vec::new(),
        }
    }

    fn consumed_by(mut self, elements: &[Element]) -> Self {
        self.consumes_with = elements.to_vec();
        self
    }

    pub fn default_table() -> Vec<TechnicalCombo> {
        use Element::*;
        use StatusKind::*;
        vec![
            TechnicalCombo::new(Burn, &[Wind, Nuclear]).consumed_by(&[Nuclear]),
            TechnicalCombo::new(Freeze, &[Physical, Gun, Nuclear]).consumed_by(&[Nuclear]),
            TechnicalCombo::new(Shock, &[Physical, Gun, Nuclear]).consumed_by(&[Nuclear]),
            TechnicalCombo::new(Sleep, &[Physical, Gun]),
            TechnicalCombo::new(Confuse, &[Psychic]),
            TechnicalCombo::new(Fear, &[Psychic]),
            TechnicalCombo::new(Charm, &[Psychic]),
        ]
    }
}

/// A detected technical on one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechnicalHit {
    pub status: StatusKind,
    pub multiplier: f64,
    pub consumes_status: bool,
}

/// First combo in table order that matches an active status on `target`.
pub fn detect(table: &[TechnicalCombo], target: &Combatant, element: Element) -> Option<TechnicalHit> {
    table.iter().find_map(|combo| {
        if combo.elements.contains(&element) && target.has_status(combo.status) {
            Some(TechnicalHit {
                status: combo.status,
                multiplier: combo.multiplier,
                consumes_status: combo.consumes_with.contains(&element),
            })
        } else {
            None
        }
    })
}

/// Whether any combo in the table could fire on `target` with `element`.
pub fn can_trigger(table: &[TechnicalCombo], target: &Combatant, element: Element) -> bool {
    detect(table, target, element).is_some()
}
