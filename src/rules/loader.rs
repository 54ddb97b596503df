//! Load material tables and ability catalogs from TOML files

use crate::core::error::{ForgeError, Result};
use crate::core::types::JsonMap;
use crate::rules::abilities::{AbilityDefinition, StaticAbilityCatalog};
use crate::rules::materials::{MaterialProfile, MaterialTable};
use std::fs;
use std::path::Path;

/// Ability fields the catalog understands; anything else goes to `data`
const ABILITY_FIELDS: &[&str] = &[
    "label",
    "description",
    "requires_parts",
    "disabled",
    "disabled_reason",
];

fn number(table: &toml::Table, key: &str) -> Option<f64> {
    table
        .get(key)
        .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
}

fn text(table: &toml::Table, key: &str) -> Option<String> {
    table
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Load a material table from a TOML file
pub fn load_material_table(path: &Path) -> Result<MaterialTable> {
    let content = fs::read_to_string(path)?;
    parse_material_table(&content)
}

/// Parse `[materials.<key>]` sections
pub fn parse_material_table(content: &str) -> Result<MaterialTable> {
    let toml: toml::Table = content.parse()?;
    let mut table = MaterialTable::new();

    let Some(materials) = toml.get("materials").and_then(|v| v.as_table()) else {
        return Ok(table);
    };

    for (key, entry) in materials {
        let entry = entry
            .as_table()
            .ok_or_else(|| ForgeError::Config(format!("material '{}' must be a table", key)))?;

        let base_durability = number(entry, "base_durability").ok_or_else(|| {
            ForgeError::Config(format!("material '{}' is missing base_durability", key))
        })?;

        table.insert(MaterialProfile {
            key: key.clone(),
            label: text(entry, "label").unwrap_or_else(|| key.clone()),
            category: text(entry, "category"),
            base_durability,
            durability_per_quality: number(entry, "durability_per_quality").unwrap_or(0.0),
            base_potency: number(entry, "base_potency").unwrap_or(0.0),
            potency_per_quality: number(entry, "potency_per_quality").unwrap_or(0.0),
        });
    }

    Ok(table)
}

/// Load an ability catalog from a TOML file
pub fn load_ability_catalog(path: &Path) -> Result<StaticAbilityCatalog> {
    let content = fs::read_to_string(path)?;
    parse_ability_catalog(&content)
}

/// Parse `[abilities.<key>]` sections
pub fn parse_ability_catalog(content: &str) -> Result<StaticAbilityCatalog> {
    let toml: toml::Table = content.parse()?;
    let mut catalog = StaticAbilityCatalog::new();

    let Some(abilities) = toml.get("abilities").and_then(|v| v.as_table()) else {
        return Ok(catalog);
    };

    for (key, entry) in abilities {
        let entry = entry
            .as_table()
            .ok_or_else(|| ForgeError::Config(format!("ability '{}' must be a table", key)))?;

        let requires_parts = entry
            .get("requires_parts")
            .and_then(|v| v.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.as_str())
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let mut data = JsonMap::new();
        for (field, value) in entry {
            if !ABILITY_FIELDS.contains(&field.as_str()) {
                data.insert(field.clone(), serde_json::to_value(value)?);
            }
        }

        catalog.insert(AbilityDefinition {
            key: key.clone(),
            label: text(entry, "label").unwrap_or_else(|| key.clone()),
            description: text(entry, "description"),
            requires_parts,
            disabled: entry
                .get("disabled")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            disabled_reason: text(entry, "disabled_reason"),
            data,
        });
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::abilities::AbilityCatalog;
    use crate::rules::materials::MaterialFormulas;
    use serde_json::json;

    #[test]
    fn test_parse_materials() {
        let table = parse_material_table(
            r#"
[materials.obsidian]
label = "Obsidian"
category = "mineral"
base_durability = 18
durability_per_quality = 2.5
potency_per_quality = 1
"#,
        )
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.durability("obsidian", 3), Ok(23.0));
        assert_eq!(table.potency("obsidian", 3), Ok(2.0));
    }

    #[test]
    fn test_material_requires_base_durability() {
        let result = parse_material_table("[materials.mud]\nlabel = \"Mud\"\n");
        assert!(matches!(result, Err(ForgeError::Config(_))));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            parse_material_table("[materials"),
            Err(ForgeError::TomlError(_))
        ));
    }

    #[test]
    fn test_parse_abilities() {
        let catalog = parse_ability_catalog(
            r#"
[abilities.howl]
label = "Howl"
requires_parts = ["Head"]
cost = 2

[abilities.burrow]
label = "Burrow"
disabled = true
disabled_reason = "Terrain rules pending"
"#,
        )
        .unwrap();

        let howl = catalog.ability_def("howl").unwrap();
        assert_eq!(howl.requires_parts, vec!["head".to_string()]);
        assert_eq!(howl.data.get("cost"), Some(&json!(2)));
        assert!(!howl.disabled);

        let burrow = catalog.ability_def("burrow").unwrap();
        assert!(burrow.disabled);
        assert_eq!(burrow.disabled_reason.as_deref(), Some("Terrain rules pending"));
    }

    #[test]
    fn test_missing_section_is_empty() {
        assert!(parse_ability_catalog("title = \"none\"").unwrap().is_empty());
    }
}
