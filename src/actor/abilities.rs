//! Ability entries written onto the actor
//!
//! Each referenced ability starts from whatever the actor already has, then
//! the catalog definition is laid over it, then the blueprint's per-creature
//! overrides. Abilities the actor has that the blueprint does not mention are
//! left alone.

use crate::blueprints::AbilityRef;
use crate::core::types::{as_text, JsonMap};
use crate::rules::abilities::AbilityCatalog;
use crate::synthesis::inference::{explicit_parts, normalize_parts, PartInference};
use serde_json::Value;

const REQUIREMENT_ALIASES: &[&str] = &["requiresPart", "requires"];

/// Merged ability map plus keys the catalog does not know
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbilityMerge {
    pub abilities: JsonMap,
    pub missing: Vec<String>,
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

pub fn merge_abilities(
    refs: &[AbilityRef],
    catalog: &dyn AbilityCatalog,
    inference: &dyn PartInference,
    existing: Option<&JsonMap>,
) -> AbilityMerge {
    let mut merge = AbilityMerge {
        abilities: existing.cloned().unwrap_or_default(),
        missing: Vec::new(),
    };

    for ability in refs {
        let Some(key) = ability.key() else {
            continue;
        };
        let overrides = ability.overrides();
        let definition = catalog.ability_def(key);
        if definition.is_none() && !merge.missing.iter().any(|m| m == key) {
            merge.missing.push(key.to_string());
        }

        let mut entry = merge
            .abilities
            .get(key)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        if let Some(def) = &definition {
            entry.extend(def.data.clone());
            entry.insert("label".to_string(), Value::String(def.label.clone()));
            if let Some(description) = &def.description {
                entry.insert("description".to_string(), Value::String(description.clone()));
            }
        }
        entry.extend(overrides.clone());
        entry.insert("key".to_string(), Value::String(key.to_string()));

        let label = entry
            .get("label")
            .and_then(as_text)
            .unwrap_or_else(|| key.to_string());
        entry.insert("label".to_string(), Value::String(label.clone()));

        let mut parts = explicit_parts(&overrides);
        if parts.is_empty() {
            if let Some(def) = &definition {
                parts = normalize_parts(&def.requires_parts);
            }
        }
        if parts.is_empty() {
            parts = normalize_parts(inference.infer(&label.to_lowercase()));
        }
        for alias in REQUIREMENT_ALIASES {
            entry.remove(*alias);
        }
        entry.insert(
            "requiresParts".to_string(),
            Value::Array(parts.into_iter().map(Value::String).collect()),
        );

        let disabled = definition.as_ref().is_some_and(|d| d.disabled)
            || truthy(overrides.get("disabled"))
            || truthy(overrides.get("manuallyDisabled"));
        let reason = overrides
            .get("disabledReason")
            .and_then(as_text)
            .or_else(|| definition.as_ref().and_then(|d| d.disabled_reason.clone()));

        entry.remove("disabled");
        if disabled {
            entry.insert("manuallyDisabled".to_string(), Value::Bool(true));
            match reason {
                Some(reason) => entry.insert("disabledReason".to_string(), Value::String(reason)),
                None => entry.remove("disabledReason"),
            };
        } else {
            entry.remove("manuallyDisabled");
            entry.remove("disabledReason");
        }

        merge.abilities.insert(key.to_string(), Value::Object(entry));
    }

    merge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::abilities::{AbilityDefinition, StaticAbilityCatalog};
    use crate::synthesis::inference::KeywordPartInference;
    use serde_json::json;

    fn catalog() -> StaticAbilityCatalog {
        let mut catalog = StaticAbilityCatalog::new();
        catalog.insert(AbilityDefinition {
            key: "howl".into(),
            label: "Howl".into(),
            requires_parts: vec!["Head".into()],
            data: json!({ "range": 30 }).as_object().unwrap().clone(),
            ..Default::default()
        });
        catalog.insert(AbilityDefinition {
            key: "web".into(),
            label: "Web Spray".into(),
            disabled: true,
            disabled_reason: Some("Not supported yet".into()),
            ..Default::default()
        });
        catalog.insert(AbilityDefinition {
            key: "rend".into(),
            label: "Garra desgarradora".into(),
            ..Default::default()
        });
        catalog
    }

    fn refs(value: Value) -> Vec<AbilityRef> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_definition_then_overrides() {
        let inference = KeywordPartInference::default();
        let merge = merge_abilities(
            &refs(json!(["howl", { "key": "rend", "label": "Zarpazo", "range": 5 }])),
            &catalog(),
            &inference,
            None,
        );

        let howl = &merge.abilities["howl"];
        assert_eq!(howl["label"], json!("Howl"));
        assert_eq!(howl["range"], json!(30));
        assert_eq!(howl["requiresParts"], json!(["head"]));
        assert!(howl.get("manuallyDisabled").is_none());

        let rend = &merge.abilities["rend"];
        assert_eq!(rend["label"], json!("Zarpazo"));
        assert_eq!(rend["range"], json!(5));
        assert_eq!(rend["requiresParts"], json!(["bracers"]));
        assert!(merge.missing.is_empty());
    }

    #[test]
    fn test_disabled_flags() {
        let inference = KeywordPartInference::default();
        let existing = json!({
            "howl": { "key": "howl", "manuallyDisabled": true, "disabledReason": "stale", "uses": 2 }
        });

        let merge = merge_abilities(
            &refs(json!(["howl", "web", { "key": "rend", "disabled": true }])),
            &catalog(),
            &inference,
            existing.as_object(),
        );

        let howl = &merge.abilities["howl"];
        assert!(howl.get("manuallyDisabled").is_none());
        assert!(howl.get("disabledReason").is_none());
        assert_eq!(howl["uses"], json!(2));

        let web = &merge.abilities["web"];
        assert_eq!(web["manuallyDisabled"], json!(true));
        assert_eq!(web["disabledReason"], json!("Not supported yet"));

        let rend = &merge.abilities["rend"];
        assert_eq!(rend["manuallyDisabled"], json!(true));
        assert!(rend.get("disabled").is_none());
        assert!(rend.get("disabledReason").is_none());
    }

    #[test]
    fn test_unknown_abilities_and_existing_only_entries() {
        let inference = KeywordPartInference::default();
        let existing = json!({ "swim": { "key": "swim", "label": "Swim" } });

        let merge = merge_abilities(
            &refs(json!([{ "key": "tail_lash", "requires": "Chest" }, "tail_lash", { "label": "no key" }])),
            &catalog(),
            &inference,
            existing.as_object(),
        );

        assert_eq!(merge.missing, vec!["tail_lash"]);
        assert_eq!(merge.abilities["swim"], existing["swim"]);

        let lash = &merge.abilities["tail_lash"];
        assert_eq!(lash["label"], json!("tail_lash"));
        assert_eq!(lash["requiresParts"], json!(["chest"]));
        assert!(lash.get("requires").is_none());
    }
}
