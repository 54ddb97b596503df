//! Structural validation of migrated blueprints
//!
//! Only presence is checked here. Field shapes are handled by the
//! synthesizers, which fall back to safe defaults on odd input.

use super::schema::BlueprintDocument;
use crate::core::error::{ForgeError, Result};
use serde_json::Value;

/// Fields every blueprint must carry, in reporting order
pub const REQUIRED_FIELDS: &[&str] = &["key", "label", "level", "attributes", "progression", "anatomy"];

/// Fail with `InvalidBlueprint` naming the first missing field
pub fn validate(doc: &Value) -> Result<()> {
    let key = doc.get("key").and_then(Value::as_str);

    for field in REQUIRED_FIELDS {
        match doc.get(*field) {
            None | Some(Value::Null) => return Err(ForgeError::invalid_blueprint(key, field)),
            Some(_) => {}
        }
    }

    Ok(())
}

/// Validate, then convert the raw document into its typed form
pub fn into_document(doc: Value) -> Result<BlueprintDocument> {
    validate(&doc)?;
    let key = doc
        .get("key")
        .and_then(Value::as_str)
        .map(str::to_string);

    serde_json::from_value(doc).map_err(|e| ForgeError::MalformedBlueprint {
        key: key.unwrap_or_else(|| crate::core::error::UNKNOWN_BLUEPRINT_KEY.to_string()),
        reason: e.to_string(),
    })
}
