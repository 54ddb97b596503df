use thiserror::Error;

/// Placeholder used in error messages when a blueprint carries no key.
pub const UNKNOWN_BLUEPRINT_KEY: &str = "<unknown>";

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Blueprint index unavailable at {path}: {reason}")]
    IndexUnavailable { path: String, reason: String },

    #[error("Unknown blueprint key: {0}")]
    UnknownBlueprintKey(String),

    #[error("Failed to fetch blueprint '{key}' from {path}: {reason}")]
    BlueprintFetchFailed {
        key: String,
        path: String,
        reason: String,
    },

    #[error("Invalid blueprint '{key}': missing field '{field}'")]
    InvalidBlueprint { key: String, field: String },

    #[error("Malformed blueprint '{key}': {reason}")]
    MalformedBlueprint { key: String, reason: String },

    #[error("Actor not found: {0}")]
    ActorNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Content source error: {0}")]
    Content(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl ForgeError {
    pub fn invalid_blueprint(key: Option<&str>, field: &str) -> Self {
        ForgeError::InvalidBlueprint {
            key: key.unwrap_or(UNKNOWN_BLUEPRINT_KEY).to_string(),
            field: field.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;
