//! Per-part health derived from anatomy materials
//!
//! Each anatomy part gets a durability pool sized by its material and
//! quality. Synthesis is pure: material formula failures are replaced by the
//! configured fallback and reported back to the caller instead of logged.

use crate::blueprints::BlueprintDocument;
use crate::core::types::{as_number, number_value, serialize_number, JsonMap};
use crate::rules::materials::{MaterialError, MaterialFormulas};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Health record of one body part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPart {
    pub label: String,
    pub material: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub quality: u32,
    #[serde(serialize_with = "serialize_number")]
    pub max: f64,
    #[serde(serialize_with = "serialize_number")]
    pub value: f64,
    #[serde(serialize_with = "serialize_number")]
    pub potency: f64,
}

/// A part whose material formula failed and got fallback numbers
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialFallback {
    pub part: String,
    pub material: String,
    pub error: MaterialError,
}

/// Output of one synthesis pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthSynthesis {
    pub parts: BTreeMap<String, HealthPart>,
    pub fallbacks: Vec<MaterialFallback>,
}

/// Default quality for parts that do not state one: ceil(level / 3), at least 1
pub fn default_quality(level: u32) -> u32 {
    level.div_ceil(3).max(1)
}

/// Derives `HealthPart`s from a blueprint's anatomy
pub struct AnatomyHealthSynthesizer<'a> {
    materials: &'a dyn MaterialFormulas,
    fallback_durability: f64,
    fallback_potency: f64,
}

impl<'a> AnatomyHealthSynthesizer<'a> {
    pub fn new(materials: &'a dyn MaterialFormulas) -> Self {
        Self {
            materials,
            fallback_durability: 10.0,
            fallback_potency: 0.0,
        }
    }

    /// Override the numbers used when a material formula fails
    pub fn with_fallbacks(mut self, durability: f64, potency: f64) -> Self {
        self.fallback_durability = durability;
        self.fallback_potency = potency;
        self
    }

    pub fn synthesize(&self, blueprint: &BlueprintDocument) -> HealthSynthesis {
        let level_quality = default_quality(blueprint.effective_level());
        let mut synthesis = HealthSynthesis::default();

        for (key, part) in &blueprint.anatomy {
            let quality = part.quality.unwrap_or(level_quality).max(1);
            let material = part.material_key.trim().to_string();

            let max = match checked_durability(self.materials, &material, quality) {
                Ok(max) => max,
                Err(error) => {
                    synthesis.fallbacks.push(MaterialFallback {
                        part: key.clone(),
                        material: material.clone(),
                        error,
                    });
                    self.fallback_durability
                }
            };

            let potency = match checked_potency(self.materials, &material, quality) {
                Ok(potency) => potency,
                Err(error) => {
                    // One report per part is enough when both formulas fail
                    if !synthesis.fallbacks.iter().any(|f| &f.part == key) {
                        synthesis.fallbacks.push(MaterialFallback {
                            part: key.clone(),
                            material: material.clone(),
                            error,
                        });
                    }
                    self.fallback_potency
                }
            };

            synthesis.parts.insert(
                key.clone(),
                HealthPart {
                    label: key.clone(),
                    material,
                    category: part.category.clone(),
                    quality,
                    max,
                    value: max,
                    potency,
                },
            );
        }

        synthesis
    }
}

/// Durability must be finite and positive whatever the formula source
fn checked_durability(
    materials: &dyn MaterialFormulas,
    material: &str,
    quality: u32,
) -> Result<f64, MaterialError> {
    let value = materials.durability(material, quality)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MaterialError::InvalidResult {
            material: material.to_string(),
            value,
        })
    }
}

fn checked_potency(
    materials: &dyn MaterialFormulas,
    material: &str,
    quality: u32,
) -> Result<f64, MaterialError> {
    let value = materials.potency(material, quality)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MaterialError::InvalidResult {
            material: material.to_string(),
            value,
        })
    }
}

/// Merge freshly derived parts into the actor's current health parts
///
/// For every part in either set: `max` comes from the derivation when there
/// is one, otherwise from the existing record. `value` keeps the existing
/// value clamped to `0..=max`, or starts at `max` for new parts. Extra fields
/// on existing records are kept.
pub fn merge_health_parts(
    derived: &BTreeMap<String, HealthPart>,
    existing: Option<&JsonMap>,
) -> JsonMap {
    let empty = JsonMap::new();
    let existing = existing.unwrap_or(&empty);
    let mut merged = JsonMap::new();

    for (key, part) in derived {
        let previous = existing.get(key).and_then(Value::as_object);
        let mut record = previous.cloned().unwrap_or_default();

        if let Ok(Value::Object(fields)) = serde_json::to_value(part) {
            record.extend(fields);
        }

        let value = previous
            .and_then(|p| p.get("value"))
            .and_then(as_number)
            .map_or(part.max, |v| v.clamp(0.0, part.max.max(0.0)));
        record.insert("value".to_string(), number_value(value));

        merged.insert(key.clone(), Value::Object(record));
    }

    for (key, previous) in existing {
        if derived.contains_key(key) {
            continue;
        }
        let mut record = previous.clone();
        if let Some(fields) = record.as_object_mut() {
            let max = fields.get("max").and_then(as_number);
            let value = fields.get("value").and_then(as_number);
            if let (Some(max), Some(value)) = (max, value) {
                fields.insert("value".to_string(), number_value(value.clamp(0.0, max.max(0.0))));
            }
        }
        merged.insert(key.clone(), record);
    }

    merged
}
