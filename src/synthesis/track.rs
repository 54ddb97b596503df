//! Canonical progression track nodes

use crate::core::types::{as_number, as_text, serialize_number, JsonMap};
use crate::rules::rank::RankCurve;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys that make an object look like a single track node
pub const META_KEYS: &[&str] = &["level", "rank", "progress", "fails", "category", "notes"];

/// One progression entry: level plus derived rank and practice counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackNode {
    #[serde(serialize_with = "serialize_number")]
    pub level: f64,
    pub rank: u32,
    #[serde(serialize_with = "serialize_number")]
    pub progress: f64,
    #[serde(serialize_with = "serialize_number")]
    pub fails: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Authored node fields before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInput {
    pub level: Option<f64>,
    pub rank: Option<u32>,
    pub progress: Option<f64>,
    pub fails: Option<f64>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl NodeInput {
    pub fn with_level(level: f64) -> Self {
        Self {
            level: Some(level),
            ..Default::default()
        }
    }

    /// Read the node fields of `map`, ignoring anything else
    pub fn from_map(map: &JsonMap) -> Self {
        Self {
            level: map.get("level").and_then(as_number),
            rank: map
                .get("rank")
                .and_then(as_number)
                .filter(|r| *r >= 0.0)
                .map(|r| r.floor() as u32),
            progress: map.get("progress").and_then(as_number),
            fails: map.get("fails").and_then(as_number),
            category: map.get("category").and_then(as_text),
            notes: map.get("notes").and_then(as_text),
        }
    }

    /// True when every key of `map` is a node field
    pub fn is_node_shaped(map: &JsonMap) -> bool {
        !map.is_empty() && map.keys().all(|k| META_KEYS.contains(&k.as_str()))
    }

    /// Build the canonical node
    ///
    /// `rank` is always recomputed from `level`. An input that gives a rank but
    /// no level gets the lowest level reaching that rank.
    pub fn build(&self, ranks: &dyn RankCurve) -> TrackNode {
        let level = self
            .level
            .or_else(|| self.rank.map(|r| ranks.min_level_for_rank(r)))
            .unwrap_or(0.0)
            .max(0.0);

        TrackNode {
            level,
            rank: ranks.rank_for_level(level),
            progress: self.progress.unwrap_or(0.0).max(0.0),
            fails: self.fails.unwrap_or(0.0).max(0.0),
            category: self.category.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// Value of one keyed progression entry
#[derive(Debug, Clone, PartialEq)]
pub enum EntryInput {
    Level(f64),
    Node(NodeInput),
}

impl EntryInput {
    /// Numbers become levels, objects become nodes; anything else is dropped
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(EntryInput::Node(NodeInput::from_map(map))),
            other => as_number(other).map(EntryInput::Level),
        }
    }

    pub fn build(&self, ranks: &dyn RankCurve) -> TrackNode {
        match self {
            EntryInput::Level(level) => NodeInput::with_level(*level).build(ranks),
            EntryInput::Node(input) => input.build(ranks),
        }
    }
}
