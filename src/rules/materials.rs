//! Material formulas: durability and potency per material and quality

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a material formula could not produce a value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterialError {
    #[error("unknown material '{0}'")]
    UnknownMaterial(String),

    #[error("formula for '{material}' produced invalid value {value}")]
    InvalidResult { material: String, value: f64 },
}

/// Durability/potency formulas keyed by material
pub trait MaterialFormulas: Send + Sync {
    /// Maximum durability of a part made of `material` at `quality`
    fn durability(&self, material: &str, quality: u32) -> Result<f64, MaterialError>;

    /// Potency bonus granted by `material` at `quality`
    fn potency(&self, material: &str, quality: u32) -> Result<f64, MaterialError>;
}

/// Linear formula parameters for one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProfile {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Durability at quality 1
    pub base_durability: f64,
    /// Durability added per quality step above 1
    pub durability_per_quality: f64,
    /// Potency at quality 1
    #[serde(default)]
    pub base_potency: f64,
    /// Potency added per quality step above 1
    #[serde(default)]
    pub potency_per_quality: f64,
}

impl MaterialProfile {
    fn steps(quality: u32) -> f64 {
        quality.max(1).saturating_sub(1) as f64
    }

    pub fn durability_at(&self, quality: u32) -> f64 {
        self.base_durability + self.durability_per_quality * Self::steps(quality)
    }

    pub fn potency_at(&self, quality: u32) -> f64 {
        self.base_potency + self.potency_per_quality * Self::steps(quality)
    }
}

// key, label, category, base durability, durability/quality, base potency, potency/quality
const BUILTIN_MATERIALS: &[(&str, &str, &str, f64, f64, f64, f64)] = &[
    ("flesh", "Flesh", "organic", 8.0, 3.0, 0.0, 0.5),
    ("hide", "Hide", "organic", 10.0, 4.0, 0.0, 1.0),
    ("fur", "Fur", "organic", 9.0, 3.0, 0.0, 0.5),
    ("feather", "Feather", "organic", 6.0, 2.0, 1.0, 0.5),
    ("bone", "Bone", "organic", 12.0, 5.0, 1.0, 1.0),
    ("chitin", "Chitin", "organic", 14.0, 5.0, 1.0, 1.0),
    ("scale", "Scale", "organic", 16.0, 6.0, 1.0, 1.5),
    ("horn", "Horn", "organic", 15.0, 5.0, 2.0, 1.0),
    ("wood", "Wood", "vegetal", 12.0, 4.0, 0.0, 0.5),
    ("stone", "Stone", "mineral", 20.0, 8.0, 2.0, 1.0),
    ("iron", "Iron", "metal", 24.0, 10.0, 3.0, 1.5),
    ("crystal", "Crystal", "mineral", 10.0, 6.0, 4.0, 2.0),
    ("ectoplasm", "Ectoplasm", "spectral", 6.0, 4.0, 3.0, 2.0),
];

/// Table-driven `MaterialFormulas` implementation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTable {
    materials: BTreeMap<String, MaterialProfile>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the stock materials
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for &(key, label, category, base_d, per_d, base_p, per_p) in BUILTIN_MATERIALS {
            table.insert(MaterialProfile {
                key: key.to_string(),
                label: label.to_string(),
                category: Some(category.to_string()),
                base_durability: base_d,
                durability_per_quality: per_d,
                base_potency: base_p,
                potency_per_quality: per_p,
            });
        }
        table
    }

    /// Add or replace a material (keys are case-insensitive)
    pub fn insert(&mut self, profile: MaterialProfile) {
        self.materials
            .insert(profile.key.trim().to_lowercase(), profile);
    }

    pub fn get(&self, material: &str) -> Option<&MaterialProfile> {
        self.materials.get(&material.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Overlay another table on top of this one
    pub fn extend(&mut self, other: MaterialTable) {
        self.materials.extend(other.materials);
    }

    fn profile(&self, material: &str) -> Result<&MaterialProfile, MaterialError> {
        self.get(material)
            .ok_or_else(|| MaterialError::UnknownMaterial(material.to_string()))
    }
}

impl MaterialFormulas for MaterialTable {
    fn durability(&self, material: &str, quality: u32) -> Result<f64, MaterialError> {
        let value = self.profile(material)?.durability_at(quality);
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(MaterialError::InvalidResult {
                material: material.to_string(),
                value,
            })
        }
    }

    fn potency(&self, material: &str, quality: u32) -> Result<f64, MaterialError> {
        let value = self.profile(material)?.potency_at(quality);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(MaterialError::InvalidResult {
                material: material.to_string(),
                value,
            })
        }
    }
}
