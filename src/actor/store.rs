//! Actor persistence port and its in-memory and JSON-file adapters

use super::patch::ActorPatch;
use super::state::ActorState;
use crate::core::error::{ForgeError, Result};
use crate::core::types::ActorId;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Host document store holding actors
#[async_trait]
pub trait ActorStore: Send + Sync {
    /// Current state of the actor
    async fn load_actor(&self, id: &ActorId) -> Result<ActorState>;

    /// Apply every path of `patch` as one update
    async fn apply_patch(&self, id: &ActorId, patch: &ActorPatch) -> Result<()>;
}

/// Actors kept in memory; records every applied patch
#[derive(Default)]
pub struct MemoryActorStore {
    actors: Mutex<HashMap<ActorId, Value>>,
    applied: Mutex<Vec<(ActorId, ActorPatch)>>,
}

impl MemoryActorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: ActorId, data: Value) {
        self.actors.lock().await.insert(id, data);
    }

    pub async fn get(&self, id: &ActorId) -> Option<Value> {
        self.actors.lock().await.get(id).cloned()
    }

    /// Patches applied so far, oldest first
    pub async fn applied_patches(&self) -> Vec<(ActorId, ActorPatch)> {
        self.applied.lock().await.clone()
    }
}

#[async_trait]
impl ActorStore for MemoryActorStore {
    async fn load_actor(&self, id: &ActorId) -> Result<ActorState> {
        let data = self
            .get(id)
            .await
            .ok_or_else(|| ForgeError::ActorNotFound(id.to_string()))?;
        Ok(ActorState::new(id.clone(), data))
    }

    async fn apply_patch(&self, id: &ActorId, patch: &ActorPatch) -> Result<()> {
        {
            let mut actors = self.actors.lock().await;
            let data = actors
                .get_mut(id)
                .ok_or_else(|| ForgeError::ActorNotFound(id.to_string()))?;
            patch.apply_to(data);
        }
        self.applied.lock().await.push((id.clone(), patch.clone()));
        Ok(())
    }
}

/// One `<id>.json` file per actor in a directory
///
/// Writes go to a sibling temp file that is then renamed over the actor file;
/// readers never see a half-applied patch.
#[derive(Debug, Clone)]
pub struct JsonFileActorStore {
    dir: PathBuf,
}

impl JsonFileActorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store and id addressing a single actor file
    pub fn for_file(path: &Path) -> Result<(Self, ActorId)> {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ForgeError::Persistence(format!("Not an actor file: {}", path.display())))?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok((Self::new(dir), ActorId::new(id)))
    }

    fn path_for(&self, id: &ActorId) -> Result<PathBuf> {
        let id = id.as_str();
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(ForgeError::Persistence(format!("Invalid actor id: {:?}", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

#[async_trait]
impl ActorStore for JsonFileActorStore {
    async fn load_actor(&self, id: &ActorId) -> Result<ActorState> {
        let path = self.path_for(id)?;
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ForgeError::ActorNotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let data: Value = serde_json::from_str(&text)?;
        Ok(ActorState::new(id.clone(), data))
    }

    async fn apply_patch(&self, id: &ActorId, patch: &ActorPatch) -> Result<()> {
        let mut actor = self.load_actor(id).await?;
        patch.apply_to(&mut actor.data);

        let path = self.path_for(id)?;
        let tmp = path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(&actor.data)?;

        tokio::fs::write(&tmp, text)
            .await
            .map_err(|e| ForgeError::Persistence(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| ForgeError::Persistence(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(actor = %id, path = %path.display(), paths = patch.len(), "Actor file updated");
        Ok(())
    }
}
