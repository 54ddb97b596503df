//! Progression normalization
//!
//! Authors write progression sections in whatever shape is convenient: a bare
//! level, a single node, a list of keyed entries or a map of key -> level or
//! node. Each section is first converted once into a small tagged union; the
//! builder then works only with those unions.
//!
//! Resistances and weapons have extra conventions:
//! - resistances take a nested `byType` map, and a top-level `level` fills
//!   every canonical resistance not set explicitly;
//! - weapons merge `attack.byWeapon` / `attack.weapons`, and a scalar
//!   `attack.level` is broadcast to every weapon the creature attacks with.

use super::track::{EntryInput, NodeInput, TrackNode};
use crate::blueprints::BlueprintDocument;
use crate::core::types::{as_number, as_text, slugify, JsonMap};
use crate::rules::rank::RankCurve;
use serde_json::Value;
use std::collections::BTreeMap;

/// Progression categories, in patch order
pub const CATEGORIES: &[&str] = &[
    "skills",
    "maneuvers",
    "aptitudes",
    "relics",
    "armor",
    "defense",
    "resistances",
    "weapons",
];

/// Resistance keys filled by a top-level resistance `level`
pub const CANONICAL_RESISTANCES: &[&str] = &[
    "poison",
    "infection",
    "affliction",
    "curse",
    "alteration",
    "water",
    "fire",
    "earth",
    "air",
    "light",
    "dark",
];

/// Key a scalar or single-node section is stored under
pub fn default_key(category: &str) -> Option<&'static str> {
    match category {
        "defense" => Some("evasion"),
        _ => None,
    }
}

/// Key -> node for one category
pub type TrackMap = BTreeMap<String, TrackNode>;

/// One normalized progression section
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressionSection {
    /// A bare level
    Level(f64),
    /// A single node-shaped object, with its fields read as keyed entries
    Node(NodeInput, Vec<(String, EntryInput)>),
    /// Keyed entries, in authored order
    Entries(Vec<(String, EntryInput)>),
}

impl ProgressionSection {
    /// Normalize loose JSON; `None` for null or unusable values
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Object(map) if NodeInput::is_node_shaped(map) => {
                Some(ProgressionSection::Node(
                    NodeInput::from_map(map),
                    map_entries(map, false),
                ))
            }
            Value::Object(map) => Some(ProgressionSection::Entries(map_entries(map, false))),
            Value::Array(items) => Some(ProgressionSection::Entries(keyed_entries(items, false))),
            other => as_number(other).map(ProgressionSection::Level),
        }
    }
}

fn normalize_key(key: &str, lowercase: bool) -> Option<String> {
    let key = key.trim();
    if key.is_empty() {
        None
    } else if lowercase {
        Some(key.to_lowercase())
    } else {
        Some(key.to_string())
    }
}

/// `{key: number | object}` pairs, skipping nulls and unusable values
fn map_entries(map: &JsonMap, lowercase: bool) -> Vec<(String, EntryInput)> {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .filter_map(|(k, v)| Some((normalize_key(k, lowercase)?, EntryInput::from_value(v)?)))
        .collect()
}

/// `[{key, ...}]` items; items without a key are skipped
fn keyed_entries(items: &[Value], lowercase: bool) -> Vec<(String, EntryInput)> {
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let key = item.get("key").or_else(|| item.get("id")).and_then(as_text)?;
            Some((
                normalize_key(&key, lowercase)?,
                EntryInput::Node(NodeInput::from_map(item)),
            ))
        })
        .collect()
}

fn entries_of(value: &Value, lowercase: bool) -> Vec<(String, EntryInput)> {
    match value {
        Value::Object(map) => map_entries(map, lowercase),
        Value::Array(items) => keyed_entries(items, lowercase),
        _ => Vec::new(),
    }
}

/// Normalized resistance section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResistanceSection {
    pub entries: Vec<(String, EntryInput)>,
    pub by_type: Vec<(String, EntryInput)>,
    pub backfill_level: Option<f64>,
}

impl ResistanceSection {
    pub fn from_value(value: &Value) -> Self {
        let mut section = Self::default();
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    match key.as_str() {
                        "byType" => section.by_type = entries_of(value, true),
                        "level" => section.backfill_level = as_number(value),
                        k if super::track::META_KEYS.contains(&k) => {}
                        _ => {
                            if let (Some(key), Some(entry)) =
                                (normalize_key(key, true), EntryInput::from_value(value))
                            {
                                section.entries.push((key, entry));
                            }
                        }
                    }
                }
            }
            Value::Array(items) => section.entries = keyed_entries(items, true),
            other => section.backfill_level = as_number(other),
        }
        section
    }
}

/// Normalized weapon proficiency sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeaponSection {
    pub entries: Vec<(String, EntryInput)>,
    pub by_weapon: Vec<(String, EntryInput)>,
    pub broadcast_level: Option<f64>,
}

impl WeaponSection {
    /// Read `weapons` and `attack` from the progression object
    pub fn from_progression(progression: &JsonMap) -> Self {
        let mut section = Self::default();
        let mut weapons_level = None;

        match progression.get("weapons") {
            Some(Value::Object(map)) if NodeInput::is_node_shaped(map) => {
                weapons_level = NodeInput::from_map(map).level;
            }
            Some(value @ (Value::Object(_) | Value::Array(_))) => {
                section.entries = entries_of(value, true);
            }
            Some(other) => weapons_level = as_number(other),
            None => {}
        }

        match progression.get("attack") {
            Some(Value::Object(attack)) => {
                if let Some(by_weapon) = attack.get("byWeapon").or_else(|| attack.get("weapons")) {
                    section.by_weapon = entries_of(by_weapon, true);
                }
                section.broadcast_level = attack.get("level").and_then(as_number);
            }
            Some(other) => section.broadcast_level = as_number(other),
            None => {}
        }

        if section.broadcast_level.is_none() {
            section.broadcast_level = weapons_level;
        }
        section
    }
}

/// Weapon keys a creature's attacks resolve to, deduplicated in order
///
/// Uses `weaponKey`, then `key`, then the slugified `label`, then
/// `attack_{i}`.
pub fn attack_weapon_keys(attacks: &[Value]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for (i, attack) in attacks.iter().enumerate() {
        let key = match attack {
            Value::Object(map) => map
                .get("weaponKey")
                .and_then(as_text)
                .or_else(|| map.get("key").and_then(as_text))
                .map(|k| k.to_lowercase())
                .or_else(|| {
                    map.get("label")
                        .and_then(as_text)
                        .map(|l| slugify(&l))
                        .filter(|s| !s.is_empty())
                }),
            Value::String(s) => normalize_key(s, true),
            _ => None,
        }
        .unwrap_or_else(|| format!("attack_{}", i));

        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Canonical progression, one track map per non-empty category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressionPatch {
    categories: BTreeMap<String, TrackMap>,
}

impl ProgressionPatch {
    pub fn get(&self, category: &str) -> Option<&TrackMap> {
        self.categories.get(category)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Iterate nodes of every category
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &str, &TrackNode)> {
        self.categories.iter().flat_map(|(category, map)| {
            map.iter()
                .map(move |(key, node)| (category.as_str(), key.as_str(), node))
        })
    }

    fn insert(&mut self, category: &str, map: TrackMap) {
        if !map.is_empty() {
            self.categories.insert(category.to_string(), map);
        }
    }

    /// `progression.<category>` patch entries, in `CATEGORIES` order
    pub fn entries(&self) -> Vec<(String, Value)> {
        CATEGORIES
            .iter()
            .filter_map(|category| {
                let map = self.categories.get(*category)?;
                let value = serde_json::to_value(map).ok()?;
                Some((format!("progression.{}", category), value))
            })
            .collect()
    }
}

/// Builds the canonical progression for a blueprint
pub struct ProgressionPatchBuilder<'a> {
    ranks: &'a dyn RankCurve,
}

impl<'a> ProgressionPatchBuilder<'a> {
    pub fn new(ranks: &'a dyn RankCurve) -> Self {
        Self { ranks }
    }

    pub fn build(&self, blueprint: &BlueprintDocument) -> ProgressionPatch {
        let mut patch = ProgressionPatch::default();
        let Some(progression) = blueprint.progression.as_object() else {
            return patch;
        };

        for category in CATEGORIES {
            let map = match *category {
                "resistances" => progression
                    .get("resistances")
                    .map(|v| self.apply_resistances(&ResistanceSection::from_value(v)))
                    .unwrap_or_default(),
                "weapons" => self.apply_weapons(
                    &WeaponSection::from_progression(progression),
                    &blueprint.attacks,
                ),
                _ => progression
                    .get(*category)
                    .and_then(ProgressionSection::from_value)
                    .map(|section| {
                        let mut target = TrackMap::new();
                        self.apply_simple_group(
                            &mut target,
                            category,
                            &section,
                            default_key(category),
                        );
                        target
                    })
                    .unwrap_or_default(),
            };
            patch.insert(category, map);
        }

        patch
    }

    /// Apply one section to `target`
    ///
    /// A bare level or a single node goes under `default_key` when one is
    /// given, or under the category name when `target` is still empty.
    /// Otherwise each keyed entry, or each field of a single node, becomes its
    /// own node.
    pub fn apply_simple_group(
        &self,
        target: &mut TrackMap,
        category: &str,
        section: &ProgressionSection,
        default_key: Option<&str>,
    ) {
        let single = match section {
            ProgressionSection::Level(level) => Some(NodeInput::with_level(*level)),
            ProgressionSection::Node(input, _) => Some(input.clone()),
            ProgressionSection::Entries(_) => None,
        };

        if let Some(input) = single {
            if default_key.is_some() || target.is_empty() {
                let key = default_key.unwrap_or(category);
                target.insert(key.to_string(), input.build(self.ranks));
                return;
            }
        }

        match section {
            ProgressionSection::Entries(entries) | ProgressionSection::Node(_, entries) => {
                for (key, entry) in entries {
                    target.insert(key.clone(), entry.build(self.ranks));
                }
            }
            ProgressionSection::Level(_) => {}
        }
    }

    fn apply_resistances(&self, section: &ResistanceSection) -> TrackMap {
        let mut target = TrackMap::new();
        for (key, entry) in section.entries.iter().chain(&section.by_type) {
            target.insert(key.clone(), entry.build(self.ranks));
        }

        if let Some(level) = section.backfill_level {
            for key in CANONICAL_RESISTANCES {
                if !target.contains_key(*key) {
                    target.insert(key.to_string(), NodeInput::with_level(level).build(self.ranks));
                }
            }
        }
        target
    }

    fn apply_weapons(&self, section: &WeaponSection, attacks: &[Value]) -> TrackMap {
        let mut target = TrackMap::new();
        for (key, entry) in section.entries.iter().chain(&section.by_weapon) {
            target.insert(key.clone(), entry.build(self.ranks));
        }

        if let Some(level) = section.broadcast_level {
            let keys = attack_weapon_keys(attacks);
            if keys.is_empty() {
                if target.is_empty() {
                    target.insert("natural".to_string(), NodeInput::with_level(level).build(self.ranks));
                }
            } else {
                for key in keys {
                    if !target.contains_key(&key) {
                        target.insert(key, NodeInput::with_level(level).build(self.ranks));
                    }
                }
            }
        }
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::rank::ThresholdRankCurve;
    use serde_json::json;

    fn blueprint(progression: Value, attacks: Value) -> BlueprintDocument {
        serde_json::from_value(json!({
            "key": "wolf",
            "label": "Wolf",
            "level": 3,
            "attributes": {},
            "anatomy": {},
            "progression": progression,
            "attacks": attacks
        }))
        .unwrap()
    }

    fn build(progression: Value, attacks: Value) -> ProgressionPatch {
        let curve = ThresholdRankCurve::default();
        ProgressionPatchBuilder::new(&curve).build(&blueprint(progression, attacks))
    }

    #[test]
    fn test_section_shapes() {
        assert_eq!(
            ProgressionSection::from_value(&json!(3)),
            Some(ProgressionSection::Level(3.0))
        );
        assert!(matches!(
            ProgressionSection::from_value(&json!({ "level": 2, "progress": 1 })),
            Some(ProgressionSection::Node(..))
        ));
        assert!(matches!(
            ProgressionSection::from_value(&json!({ "stealth": 2, "tracking": null })),
            Some(ProgressionSection::Entries(e)) if e.len() == 1
        ));
        assert!(matches!(
            ProgressionSection::from_value(&json!([{ "key": "stealth", "level": 1 }, { "level": 4 }])),
            Some(ProgressionSection::Entries(e)) if e.len() == 1
        ));
        assert_eq!(ProgressionSection::from_value(&Value::Null), None);
    }

    #[test]
    fn test_simple_groups() {
        let patch = build(
            json!({
                "skills": { "stealth": 4, "tracking": { "level": 2, "progress": 3, "category": "survival" } },
                "defense": { "level": 6 },
                "armor": 2,
                "maneuvers": [{ "key": "trip", "level": 1 }]
            }),
            json!([]),
        );

        let skills = patch.get("skills").unwrap();
        assert_eq!(skills["stealth"].level, 4.0);
        assert_eq!(skills["stealth"].rank, 2);
        assert_eq!(skills["tracking"].progress, 3.0);
        assert_eq!(skills["tracking"].category.as_deref(), Some("survival"));

        assert_eq!(patch.get("defense").unwrap()["evasion"].level, 6.0);
        assert_eq!(patch.get("armor").unwrap()["armor"].level, 2.0);
        assert_eq!(patch.get("maneuvers").unwrap()["trip"].rank, 1);

        assert!(patch.get("relics").is_none());
        assert!(patch.get("aptitudes").is_none());
    }

    #[test]
    fn test_resistance_backfill_keeps_explicit_entries() {
        let patch = build(json!({ "resistances": { "fire": { "level": 5 }, "level": 2 } }), json!([]));
        let resistances = patch.get("resistances").unwrap();

        assert_eq!(resistances["fire"].level, 5.0);
        for key in CANONICAL_RESISTANCES.iter().filter(|k| **k != "fire") {
            assert_eq!(resistances[*key].level, 2.0, "{}", key);
        }
        assert_eq!(resistances.len(), CANONICAL_RESISTANCES.len());
    }

    #[test]
    fn test_resistance_by_type_and_arrays() {
        let patch = build(
            json!({ "resistances": { "Poison": 1, "byType": { "poison": 3, "acid": 2 } } }),
            json!([]),
        );
        let resistances = patch.get("resistances").unwrap();
        assert_eq!(resistances["poison"].level, 3.0);
        assert_eq!(resistances["acid"].level, 2.0);
        assert_eq!(resistances.len(), 2);

        let patch = build(json!({ "resistances": [{ "key": "curse", "level": 4 }] }), json!([]));
        assert_eq!(patch.get("resistances").unwrap()["curse"].level, 4.0);
    }

    #[test]
    fn test_weapon_broadcast_to_attacks() {
        let patch = build(
            json!({ "weapons": { "bite": 5 }, "attack": { "level": 2 } }),
            json!([
                { "weaponKey": "Bite", "label": "Mordisco" },
                { "label": "Garra Afilada" },
                {}
            ]),
        );
        let weapons = patch.get("weapons").unwrap();

        assert_eq!(weapons["bite"].level, 5.0);
        assert_eq!(weapons["garra_afilada"].level, 2.0);
        assert_eq!(weapons["attack_2"].level, 2.0);
        assert_eq!(weapons.len(), 3);
    }

    #[test]
    fn test_weapon_by_weapon_merge() {
        let patch = build(
            json!({ "weapons": { "bite": 1 }, "attack": { "byWeapon": { "bite": 4, "tail": 2 } } }),
            json!([]),
        );
        let weapons = patch.get("weapons").unwrap();
        assert_eq!(weapons["bite"].level, 4.0);
        assert_eq!(weapons["tail"].level, 2.0);
    }

    #[test]
    fn test_weapon_broadcast_without_attacks() {
        let patch = build(json!({ "attack": { "level": 3 } }), json!([]));
        let weapons = patch.get("weapons").unwrap();
        assert_eq!(weapons.len(), 1);
        assert_eq!(weapons["natural"].level, 3.0);

        let patch = build(json!({ "attack": 3, "weapons": { "club": 1 } }), json!([]));
        let weapons = patch.get("weapons").unwrap();
        assert!(!weapons.contains_key("natural"));
    }

    #[test]
    fn test_every_node_rank_matches_level() {
        let curve = ThresholdRankCurve::default();
        let patch = build(
            json!({
                "skills": { "a": 1, "b": { "rank": 4 }, "c": { "level": 11, "rank": 1 } },
                "resistances": { "level": 7 },
                "attack": { "level": 15 }
            }),
            json!([{ "key": "slam" }]),
        );

        let mut count = 0;
        for (_, _, node) in patch.nodes() {
            assert_eq!(node.rank, curve.rank_for_level(node.level));
            count += 1;
        }
        assert_eq!(count, 3 + CANONICAL_RESISTANCES.len() + 1);
    }

    #[test]
    fn test_patch_entries_skip_empty_categories() {
        let patch = build(json!({ "skills": {}, "armor": 1 }), json!([]));
        let entries = patch.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "progression.armor");
        assert_eq!(entries[0].1["armor"]["level"], json!(1));
    }

    #[test]
    fn test_non_object_progression_is_empty() {
        assert!(build(json!(5), json!([])).is_empty());
    }

    #[test]
    fn test_single_node_into_populated_target() {
        let curve = ThresholdRankCurve::default();
        let builder = ProgressionPatchBuilder::new(&curve);
        let mut target = TrackMap::new();
        target.insert("stealth".into(), EntryInput::Level(1.0).build(&curve));

        let section = ProgressionSection::from_value(&json!({ "level": 4, "progress": 2 })).unwrap();
        builder.apply_simple_group(&mut target, "skills", &section, None);
        // Populated target: every field is read as its own entry
        assert_eq!(target["level"].level, 4.0);
        assert_eq!(target["progress"].level, 2.0);
        assert_eq!(target["stealth"].level, 1.0);
        assert_eq!(target.len(), 3);

        builder.apply_simple_group(&mut target, "defense", &section, Some("evasion"));
        assert_eq!(target["evasion"].level, 4.0);
    }
}
