use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Party-scoped item counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: IndexMap<String, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, item: &str, count: u32) -> Self {
        self.add(item, count);
        self
    }

    pub fn count(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    pub fn add(&mut self, item: &str, count: u32) {
        *self.items.entry(item.to_string()).or_insert(0) += count;
    }

    /// Remove one. Returns false when none are left.
    pub fn take(&mut self, item: &str) -> bool {
        match self.items.get_mut(item) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.items.iter()
    }
}
