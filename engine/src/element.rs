use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    #[default]
    Physical,
    Gun,
    Fire,
    Ice,
    Electric,
    Wind,
    Psychic,
    Nuclear,
    Bless,
    Curse,
    Almighty,
}

impl Element {
    /// Physical and gun damage use Attack/Defense; everything else the magic pair.
    pub fn is_physical(self) -> bool {
        matches!(self, Element::Physical | Element::Gun)
    }

    pub fn is_magic(self) -> bool {
        !self.is_physical() && self != Element::Almighty
    }

    pub fn all() -> [Element; 11] {
        use Element::*;
        [
            Physical, Gun, Fire, Ice, Electric, Wind, Psychic, Nuclear, Bless, Curse, Almighty,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Affinity {
    #[default]
    Normal,
    Weak,
    Resist,
    Immune,
    Absorb,
    Null,
    Reflect,
}

impl Affinity {
    /// Damage multiplier. Absorb is negative: the hit becomes healing.
    /// Reflect is 0 for the defender; the resolver bounces the hit back.
    pub fn multiplier(self) -> f64 {
        match self {
            Affinity::Normal => 1.0,
            Affinity::Weak => 1.5,
            Affinity::Resist => 0.5,
            Affinity::Immune | Affinity::Null | Affinity::Reflect => 0.0,
            Affinity::Absorb => -1.0,
        }
    }

    /// Whether a hit with this affinity lands on the defender as damage.
    pub fn deals_damage(self) -> bool {
        matches!(self, Affinity::Normal | Affinity::Weak | Affinity::Resist)
    }
}
