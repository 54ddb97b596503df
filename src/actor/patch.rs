//! Flat path -> value patch applied to an actor document in one step

use crate::core::error::Result;
use crate::core::types::JsonMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Dotted-path update set (`"health.parts" -> {...}`)
///
/// Paths are kept sorted so serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorPatch(BTreeMap<String, Value>);

impl ActorPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: impl Into<String>, value: Value) {
        self.0.insert(path.into(), value);
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Write every path into `document`
    ///
    /// Missing or non-object intermediate segments are replaced by objects;
    /// the final segment is overwritten.
    pub fn apply_to(&self, document: &mut Value) {
        for (path, value) in &self.0 {
            let segments: Vec<&str> = path.split('.').collect();
            let current = std::mem::take(document);
            *document = insert_path(current, &segments, value.clone());
        }
    }
}

fn insert_path(target: Value, segments: &[&str], value: Value) -> Value {
    let Some((head, rest)) = segments.split_first() else {
        return value;
    };
    let mut map = match target {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    };
    let child = map.remove(*head).unwrap_or(Value::Null);
    map.insert(head.to_string(), insert_path(child, rest, value));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_nested_paths() {
        let mut patch = ActorPatch::new();
        patch.set("name", json!("Dire Wolf"));
        patch.set("health.parts", json!({ "head": { "value": 3 } }));
        patch.set("progression.skills", json!({ "stealth": { "level": 2 } }));

        let mut doc = json!({
            "name": "New Creature",
            "health": { "parts": { "tail": {} }, "notes": "keep" },
            "progression": 7
        });
        patch.apply_to(&mut doc);

        assert_eq!(doc["name"], json!("Dire Wolf"));
        assert_eq!(doc["health"]["parts"], json!({ "head": { "value": 3 } }));
        assert_eq!(doc["health"]["notes"], json!("keep"));
        assert_eq!(doc["progression"]["skills"]["stealth"]["level"], json!(2));
    }

    #[test]
    fn test_serialization_is_sorted() {
        let mut a = ActorPatch::new();
        a.set("level", json!(3));
        a.set("anatomy", json!({}));

        let mut b = ActorPatch::new();
        b.set("anatomy", json!({}));
        b.set("level", json!(3));

        assert_eq!(a.to_json_string().unwrap(), b.to_json_string().unwrap());
        assert_eq!(a.to_json_string().unwrap(), r#"{"anatomy":{},"level":3}"#);
    }
}
