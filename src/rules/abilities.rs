//! Static ability catalog
//!
//! Abilities are opaque to the compiler: it only needs a label, optional
//! body-part requirements and a disabled flag. Everything else rides along in
//! `data` and is copied into the actor untouched.

use crate::core::types::JsonMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog entry for one ability
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityDefinition {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Body parts that must be functional to use the ability
    #[serde(default)]
    pub requires_parts: Vec<String>,
    /// Ability ships disabled (e.g. not yet supported by the rules)
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_reason: Option<String>,
    /// Remaining catalog fields
    #[serde(default)]
    pub data: JsonMap,
}

/// Lookup of ability definitions by key
pub trait AbilityCatalog: Send + Sync {
    fn ability_def(&self, key: &str) -> Option<AbilityDefinition>;
}

/// Catalog held in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticAbilityCatalog {
    abilities: BTreeMap<String, AbilityDefinition>,
}

impl StaticAbilityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: AbilityDefinition) {
        self.abilities.insert(definition.key.clone(), definition);
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

impl FromIterator<AbilityDefinition> for StaticAbilityCatalog {
    fn from_iter<I: IntoIterator<Item = AbilityDefinition>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for definition in iter {
            catalog.insert(definition);
        }
        catalog
    }
}

impl AbilityCatalog for StaticAbilityCatalog {
    fn ability_def(&self, key: &str) -> Option<AbilityDefinition> {
        self.abilities.get(key.trim()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_trims_key() {
        let catalog: StaticAbilityCatalog = [AbilityDefinition {
            key: "howl".into(),
            label: "Howl".into(),
            ..Default::default()
        }]
        .into_iter()
        .collect();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.ability_def(" howl ").map(|d| d.label), Some("Howl".into()));
        assert!(catalog.ability_def("roar").is_none());
    }
}
