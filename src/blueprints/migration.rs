//! Schema migrations for raw blueprint documents
//!
//! Migrations form a linear chain. Each step runs only while the document's
//! version is below the step's target and stamps the target version when it
//! finishes, so running the chain on a current document changes nothing.
//! Versions newer than the chain knows about pass through untouched.

use super::schema::DEFAULT_VERSION;
use serde_json::Value;

/// A single upgrade: takes a document below `target` and returns it upgraded
pub struct MigrationStep {
    pub target: u32,
    pub description: &'static str,
    pub apply: fn(Value) -> Value,
}

/// Ordered migration chain
pub const MIGRATIONS: &[MigrationStep] = &[MigrationStep {
    target: 2,
    description: "rename anatomy part 'boots' to 'patas'",
    apply: rename_boots_to_patas,
}];

/// Version the chain produces
pub fn current_version() -> u32 {
    MIGRATIONS
        .iter()
        .map(|step| step.target)
        .max()
        .unwrap_or(DEFAULT_VERSION)
}

/// Declared version of a raw document (defaults to 1)
pub fn document_version(doc: &Value) -> u32 {
    doc.get("version")
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.floor() as u32)
        .unwrap_or(DEFAULT_VERSION)
}

/// Run every pending migration step on `raw`
pub fn migrate(raw: &Value) -> Value {
    let mut doc = raw.clone();
    for step in MIGRATIONS {
        if document_version(&doc) < step.target {
            doc = (step.apply)(doc);
            if let Some(map) = doc.as_object_mut() {
                map.insert("version".to_string(), Value::from(step.target));
            }
        }
    }
    doc
}

fn rename_boots_to_patas(mut doc: Value) -> Value {
    if let Some(anatomy) = doc.get_mut("anatomy").and_then(Value::as_object_mut) {
        // A null `patas` counts as absent
        let patas_free = anatomy.get("patas").map_or(true, Value::is_null);
        if anatomy.contains_key("boots") && patas_free {
            if let Some(part) = anatomy.remove("boots") {
                anatomy.insert("patas".to_string(), part);
            }
        }
    }
    doc
}
