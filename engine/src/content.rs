use indexmap::IndexMap;

use crate::data::Catalog;

pub const CATALOG_JSON: &str = include_str!("../content/catalog.json");

pub fn builtin_catalog() -> serde_json::Result<Catalog> {
    Catalog::from_json(CATALOG_JSON)
}

pub fn builtin_encounters() -> IndexMap<&'static str, &'static str> {
    IndexMap::from([
        (
            "shadow_ambush",
            include_str!("../content/encounters/shadow_ambush.json"),
        ),
        (
            "gatekeeper",
            include_str!("../content/encounters/gatekeeper.json"),
        ),
    ])
}
