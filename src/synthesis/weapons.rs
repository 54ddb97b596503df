//! Natural weapon records derived from blueprint attacks

use super::health::default_quality;
use super::inference::{explicit_parts, normalize_parts, PartInference};
use crate::blueprints::BlueprintDocument;
use crate::core::types::{as_number, as_text, serialize_number, JsonMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Material of weapons that name no usable anatomy part
pub const NATURAL_MATERIAL: &str = "natural";

/// Weapon type unless the attack says otherwise
pub const NATURAL_KIND: &str = "natural";

/// One natural attack as stored on the actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaturalWeaponRecord {
    pub id: String,
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_die: Option<String>,
    pub grade: u32,
    pub traits: BTreeSet<String>,
    pub material: String,
    pub quality: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    pub requires_parts: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_number"
    )]
    pub power_per_rank: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_number"
    )]
    pub durability_per_rank: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_attr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_attr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<String>,
}

fn serialize_opt_number<S>(n: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match n {
        Some(n) => serialize_number(n, serializer),
        None => serializer.serialize_none(),
    }
}

fn text(map: &JsonMap, key: &str) -> Option<String> {
    map.get(key).and_then(as_text)
}

/// `traits` as an array or a comma-separated string
fn traits(map: &JsonMap) -> BTreeSet<String> {
    match map.get("traits") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(as_text)
            .map(|t| t.to_lowercase())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => BTreeSet::new(),
    }
}

/// Turns raw attack descriptors into `NaturalWeaponRecord`s
pub struct NaturalWeaponSynthesizer<'a> {
    inference: &'a dyn PartInference,
}

impl<'a> NaturalWeaponSynthesizer<'a> {
    pub fn new(inference: &'a dyn PartInference) -> Self {
        Self { inference }
    }

    /// One record per attack, in authored order
    pub fn synthesize(&self, blueprint: &BlueprintDocument) -> Vec<NaturalWeaponRecord> {
        blueprint
            .attacks
            .iter()
            .enumerate()
            .filter_map(|(index, attack)| self.record(blueprint, index, attack))
            .collect()
    }

    fn record(
        &self,
        blueprint: &BlueprintDocument,
        index: usize,
        attack: &Value,
    ) -> Option<NaturalWeaponRecord> {
        let owned;
        let map = match attack {
            Value::Object(map) => map,
            Value::String(key) if !key.trim().is_empty() => {
                let mut map = JsonMap::new();
                map.insert("key".to_string(), Value::String(key.clone()));
                owned = map;
                &owned
            }
            _ => return None,
        };

        let key = text(map, "weaponKey")
            .or_else(|| text(map, "key"))
            .unwrap_or_else(|| format!("attack_{}", index))
            .to_lowercase();
        let label = text(map, "label").unwrap_or_else(|| key.clone());

        let mut requires_parts = explicit_parts(map);
        if requires_parts.is_empty() {
            let name = format!("{} {}", text(map, "weaponKey").unwrap_or_default(), label);
            requires_parts = normalize_parts(self.inference.infer(&name.to_lowercase()));
        }

        let anatomy_part = requires_parts
            .iter()
            .find_map(|part| blueprint.anatomy.get(part));
        let level_quality = default_quality(blueprint.effective_level());

        let material = text(map, "material")
            .or_else(|| anatomy_part.map(|p| p.material_key.trim().to_string()))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| NATURAL_MATERIAL.to_string());
        let quality = map
            .get("quality")
            .and_then(as_number)
            .map(|q| q.floor().max(1.0) as u32)
            .or_else(|| anatomy_part.and_then(|p| p.quality))
            .unwrap_or(level_quality)
            .max(1);
        let grade = map
            .get("grade")
            .and_then(as_number)
            .map(|g| g.floor().max(1.0) as u32)
            .unwrap_or(1);

        Some(NaturalWeaponRecord {
            id: format!("{}.{}", blueprint.key, key),
            label,
            kind: text(map, "type").unwrap_or_else(|| NATURAL_KIND.to_string()),
            damage_die: text(map, "damageDie"),
            grade,
            traits: traits(map),
            material,
            quality,
            family: text(map, "family"),
            requires_parts,
            power_per_rank: map.get("powerPerRank").and_then(as_number),
            durability_per_rank: map.get("durabilityPerRank").and_then(as_number),
            attack_attr: text(map, "attackAttr"),
            impact_attr: text(map, "impactAttr"),
            notes: text(map, "notes"),
            effect_id: text(map, "effectId"),
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::inference::{KeywordPartInference, NoInference};
    use serde_json::json;

    fn blueprint(attacks: Value) -> BlueprintDocument {
        serde_json::from_value(json!({
            "key": "dire_wolf",
            "label": "Dire Wolf",
            "level": 5,
            "attributes": {},
            "progression": {},
            "anatomy": {
                "head": { "materialKey": "bone", "quality": 3 },
                "chest": { "materialKey": "hide" }
            },
            "attacks": attacks
        }))
        .unwrap()
    }

    #[test]
    fn test_infers_parts_from_spanish_label() {
        let inference = KeywordPartInference::default();
        let bp = blueprint(json!([{ "key": "mordisco", "label": "Mordisco", "damageDie": "d8" }]));

        let weapons = NaturalWeaponSynthesizer::new(&inference).synthesize(&bp);
        assert_eq!(weapons.len(), 1);

        let bite = &weapons[0];
        assert_eq!(bite.requires_parts, vec!["head"]);
        assert_eq!(bite.id, "dire_wolf.mordisco");
        assert_eq!(bite.material, "bone");
        assert_eq!(bite.quality, 3);
        assert_eq!(bite.grade, 1);
        assert_eq!(bite.kind, "natural");
        assert_eq!(bite.damage_die.as_deref(), Some("d8"));
    }

    #[test]
    fn test_explicit_parts_are_kept() {
        let inference = KeywordPartInference::default();
        let bp = blueprint(json!([{ "weaponKey": "Bite", "label": "Bite", "requiresParts": ["chest"] }]));

        let weapons = NaturalWeaponSynthesizer::new(&inference).synthesize(&bp);
        assert_eq!(weapons[0].key, "bite");
        assert_eq!(weapons[0].requires_parts, vec!["chest"]);
        assert_eq!(weapons[0].material, "hide");
        // chest has no quality: level 5 -> 2
        assert_eq!(weapons[0].quality, 2);
    }

    #[test]
    fn test_defaults_without_match() {
        let bp = blueprint(json!([{ "label": "Psychic Wail" }, "slam", 42]));

        let weapons = NaturalWeaponSynthesizer::new(&NoInference).synthesize(&bp);
        assert_eq!(weapons.len(), 2);
        assert_eq!(weapons[0].key, "attack_0");
        assert!(weapons[0].requires_parts.is_empty());
        assert_eq!(weapons[0].material, NATURAL_MATERIAL);
        assert_eq!(weapons[1].key, "slam");
        assert_eq!(weapons[1].label, "slam");
    }

    #[test]
    fn test_traits_and_optional_fields() {
        let inference = KeywordPartInference::default();
        let bp = blueprint(json!([
            { "key": "tail", "traits": "Reach, sweep,reach", "powerPerRank": 1.5, "grade": 3 },
            { "key": "claw", "traits": ["Rend"] }
        ]));

        let weapons = NaturalWeaponSynthesizer::new(&inference).synthesize(&bp);
        let tail = &weapons[0];
        assert_eq!(tail.traits.iter().collect::<Vec<_>>(), vec!["reach", "sweep"]);
        assert_eq!(tail.grade, 3);
        assert_eq!(tail.power_per_rank, Some(1.5));

        let value = serde_json::to_value(tail).unwrap();
        assert_eq!(value["powerPerRank"], json!(1.5));
        assert_eq!(value["type"], json!("natural"));
        assert!(value.get("damageDie").is_none());
        assert!(value.get("durabilityPerRank").is_none());

        assert!(weapons[1].traits.contains("rend"));
        assert_eq!(weapons[1].requires_parts, vec!["bracers"]);
    }
}
