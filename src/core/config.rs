//! Compiler configuration with documented defaults
//!
//! Every tunable constant the pipeline relies on lives here. Values can be
//! loaded from a TOML file and selectively overridden from the environment.

use crate::core::error::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the blueprint compiler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    // === CONTENT SOURCE ===
    /// Root of the blueprint pack: a directory path or an http(s) base URL
    pub content_root: String,

    /// Path of the index document, relative to `content_root`
    ///
    /// Blueprint paths listed in the index are resolved relative to the
    /// directory containing the index.
    pub index_path: String,

    /// Seconds before cached index/summary data expires
    ///
    /// `None` keeps cached data until `BlueprintStore::invalidate` is called.
    pub cache_ttl_secs: Option<u64>,

    // === MATERIAL FALLBACKS ===
    /// Durability used when a material formula fails
    pub fallback_durability: f64,

    /// Potency used when a material formula fails
    pub fallback_potency: f64,

    // === NAMING POLICY ===
    /// Name the host gives to freshly created actors
    ///
    /// An actor still carrying this name is renamed after its blueprint.
    pub default_actor_name: String,

    /// Placeholder name replaced by the blueprint label (case-insensitive)
    pub placeholder_name: String,

    // === PROGRESSION ===
    /// Minimum level for each rank, ascending
    ///
    /// Rank N is reached at `rank_thresholds[N - 1]`. Levels below the first
    /// threshold are rank 0.
    pub rank_thresholds: Vec<f64>,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            content_root: "data/bestiary".to_string(),
            index_path: "index.json".to_string(),
            cache_ttl_secs: None,

            fallback_durability: 10.0,
            fallback_potency: 0.0,

            default_actor_name: "Actor".to_string(),
            placeholder_name: "New Creature".to_string(),

            // Triangular curve: 1, 3, 6, 10, 15, 21, 28
            rank_thresholds: vec![1.0, 3.0, 6.0, 10.0, 15.0, 21.0, 28.0],
        }
    }
}

impl ForgeConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ForgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Apply `FORGE_CONTENT_ROOT` and `FORGE_CACHE_TTL_SECS` if set
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(root) = std::env::var("FORGE_CONTENT_ROOT") {
            self.content_root = root;
        }
        if let Ok(ttl) = std::env::var("FORGE_CACHE_TTL_SECS") {
            let secs = ttl
                .trim()
                .parse::<u64>()
                .map_err(|e| ForgeError::Config(format!("FORGE_CACHE_TTL_SECS: {}", e)))?;
            self.cache_ttl_secs = Some(secs);
        }
        self.validate()?;
        Ok(self)
    }

    /// Cache lifetime as a `Duration`
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.content_root.trim().is_empty() {
            return Err(ForgeError::Config("content_root must not be empty".into()));
        }

        if !(self.fallback_durability.is_finite() && self.fallback_durability > 0.0) {
            return Err(ForgeError::Config(format!(
                "fallback_durability ({}) must be a positive number",
                self.fallback_durability
            )));
        }

        if !self.fallback_potency.is_finite() {
            return Err(ForgeError::Config("fallback_potency must be finite".into()));
        }

        if self.rank_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ForgeError::Config(
                "rank_thresholds must be strictly ascending".into(),
            ));
        }

        Ok(())
    }
}
