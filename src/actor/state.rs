//! Read-only view of an actor document

use crate::core::types::{ActorId, JsonMap};
use serde_json::Value;

/// Current actor data as loaded from an `ActorStore`
#[derive(Debug, Clone, PartialEq)]
pub struct ActorState {
    pub id: ActorId,
    pub data: Value,
}

impl ActorState {
    pub fn new(id: ActorId, data: Value) -> Self {
        Self { id, data }
    }

    /// Value at a dotted path, if every segment exists
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.data, |value, segment| value.get(segment))
    }

    pub fn name(&self) -> Option<&str> {
        self.data.get("name").and_then(Value::as_str)
    }

    pub fn health_parts(&self) -> Option<&JsonMap> {
        self.get_path("health.parts").and_then(Value::as_object)
    }

    pub fn abilities(&self) -> Option<&JsonMap> {
        self.data.get("abilities").and_then(Value::as_object)
    }
}
