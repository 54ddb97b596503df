//! Blueprint schema types for JSON deserialization.
//!
//! A blueprint describes a creature archetype: its anatomy, natural attacks,
//! abilities and progression. Sections that authors write in many shapes
//! (attacks, progression, attributes) stay as loose JSON here and are
//! normalized by the synthesizers.

use crate::core::types::JsonMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Schema version assumed when a document does not declare one
pub const DEFAULT_VERSION: u32 = 1;

fn default_version() -> u32 {
    DEFAULT_VERSION
}

/// Whole numbers written as `3`, `3.0` or `"3"`
fn loose_u32(value: &Value) -> Option<u32> {
    crate::core::types::as_number(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n.floor().min(u32::MAX as f64) as u32)
}

fn de_loose_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    loose_u32(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a whole number, got {}", value)))
}

fn de_opt_loose_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(loose_u32(&value))
}

/// A migrated and validated creature blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintDocument {
    /// Unique identifier
    pub key: String,
    /// Human-readable name
    pub label: String,
    /// Creature level (1 or higher)
    #[serde(deserialize_with = "de_loose_u32")]
    pub level: u32,
    /// Schema version, bumped by migration
    #[serde(default = "default_version", deserialize_with = "de_loose_u32")]
    pub version: u32,
    /// Attribute scores (name -> number or `{value}`)
    pub attributes: JsonMap,
    /// Body parts (name -> material and quality)
    pub anatomy: BTreeMap<String, AnatomyPart>,
    /// Raw attack descriptors, in authored order
    #[serde(default)]
    pub attacks: Vec<Value>,
    /// Ability references
    #[serde(default)]
    pub abilities: Vec<AbilityRef>,
    /// Heterogeneous progression section
    pub progression: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub loot: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BlueprintDocument {
    /// Level clamped to the valid range
    pub fn effective_level(&self) -> u32 {
        self.level.max(1)
    }
}

/// One anatomical part of a blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnatomyPart {
    /// Material the part is made of
    #[serde(default, alias = "material")]
    pub material_key: String,
    /// Material quality; level-derived when absent
    #[serde(
        default,
        deserialize_with = "de_opt_loose_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub quality: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Reference to an ability from the static catalog
///
/// Authors either name the ability or give an object carrying the key and
/// per-creature overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AbilityRef {
    Key(String),
    Entry(JsonMap),
}

impl AbilityRef {
    /// Catalog key, if the reference has one
    pub fn key(&self) -> Option<&str> {
        let key = match self {
            AbilityRef::Key(key) => Some(key.as_str()),
            AbilityRef::Entry(map) => map.get("key").and_then(Value::as_str),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }

    /// Override fields (empty for bare keys)
    pub fn overrides(&self) -> JsonMap {
        match self {
            AbilityRef::Key(_) => JsonMap::new(),
            AbilityRef::Entry(map) => {
                let mut overrides = map.clone();
                overrides.remove("key");
                overrides
            }
        }
    }
}

/// Lightweight projection used for blueprint pickers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintSummary {
    pub key: String,
    pub label: String,
    pub tags: Vec<String>,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl From<&BlueprintDocument> for BlueprintSummary {
    fn from(doc: &BlueprintDocument) -> Self {
        Self {
            key: doc.key.clone(),
            label: doc.label.clone(),
            tags: doc.tags.clone(),
            level: doc.effective_level(),
            category: doc.category.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal_blueprint() {
        let doc: BlueprintDocument = serde_json::from_value(json!({
            "key": "dire_wolf",
            "label": "Dire Wolf",
            "level": 4,
            "attributes": { "strength": 3 },
            "anatomy": { "head": { "materialKey": "hide", "quality": 2 } },
            "progression": {}
        }))
        .unwrap();

        assert_eq!(doc.version, DEFAULT_VERSION);
        assert!(doc.attacks.is_empty());
        assert_eq!(doc.anatomy["head"].material_key, "hide");
        assert_eq!(doc.anatomy["head"].quality, Some(2));
    }

    #[test]
    fn test_anatomy_accepts_material_alias() {
        let part: AnatomyPart =
            serde_json::from_value(json!({ "material": "bone", "category": "limb" })).unwrap();
        assert_eq!(part.material_key, "bone");
        assert_eq!(part.quality, None);
        assert_eq!(part.category.as_deref(), Some("limb"));
    }

    #[test]
    fn test_ability_ref_shapes() {
        let refs: Vec<AbilityRef> = serde_json::from_value(json!([
            "howl",
            { "key": "pack_tactics", "label": "Pack Hunter" },
            { "label": "no key" }
        ]))
        .unwrap();

        assert_eq!(refs[0].key(), Some("howl"));
        assert!(refs[0].overrides().is_empty());
        assert_eq!(refs[1].key(), Some("pack_tactics"));
        assert_eq!(refs[1].overrides().get("label"), Some(&json!("Pack Hunter")));
        assert!(!refs[1].overrides().contains_key("key"));
        assert_eq!(refs[2].key(), None);
    }

    #[test]
    fn test_loose_numbers() {
        let doc: BlueprintDocument = serde_json::from_value(json!({
            "key": "k", "label": "L", "level": "3", "version": 2.0,
            "attributes": {}, "progression": {},
            "anatomy": { "head": { "materialKey": "hide", "quality": 2.0 },
                         "tail": { "materialKey": "hide", "quality": "odd" } }
        }))
        .unwrap();
        assert_eq!(doc.level, 3);
        assert_eq!(doc.version, 2);
        assert_eq!(doc.anatomy["head"].quality, Some(2));
        assert_eq!(doc.anatomy["tail"].quality, None);
    }

    #[test]
    fn test_effective_level_is_at_least_one() {
        let mut doc: BlueprintDocument = serde_json::from_value(json!({
            "key": "k", "label": "L", "level": 0,
            "attributes": {}, "anatomy": {}, "progression": {}
        }))
        .unwrap();
        assert_eq!(doc.effective_level(), 1);
        doc.level = 7;
        assert_eq!(BlueprintSummary::from(&doc).level, 7);
    }
}
