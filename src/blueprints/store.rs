//! Blueprint store: index lookup, fetching and caching.
//!
//! The store owns its cache. The index and the summary list are fetched
//! lazily on first use and kept until `invalidate` is called or the optional
//! TTL expires. Individual documents are fetched on every request.

use super::migration::migrate;
use super::schema::{BlueprintDocument, BlueprintSummary};
use super::source::{resolve_relative, ContentSource};
use super::validation::into_document;
use crate::core::error::{ForgeError, Result};
use crate::core::types::collate;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Creature key -> document path (relative to the index)
pub type BlueprintIndex = BTreeMap<String, String>;

struct Cached<T> {
    value: Arc<T>,
    loaded_at: Instant,
}

impl<T> Cached<T> {
    fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
            loaded_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Option<Duration>) -> bool {
        ttl.map_or(true, |ttl| self.loaded_at.elapsed() < ttl)
    }
}

/// Cached index and summaries for one store
#[derive(Default)]
pub struct BlueprintCache {
    index: Option<Cached<BlueprintIndex>>,
    summaries: Option<Cached<Vec<BlueprintSummary>>>,
    ttl: Option<Duration>,
}

impl BlueprintCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            index: None,
            summaries: None,
            ttl,
        }
    }

    fn index(&self) -> Option<Arc<BlueprintIndex>> {
        self.index
            .as_ref()
            .filter(|c| c.is_fresh(self.ttl))
            .map(|c| Arc::clone(&c.value))
    }

    fn summaries(&self) -> Option<Arc<Vec<BlueprintSummary>>> {
        self.summaries
            .as_ref()
            .filter(|c| c.is_fresh(self.ttl))
            .map(|c| Arc::clone(&c.value))
    }

    /// Drop everything cached
    pub fn invalidate(&mut self) {
        self.index = None;
        self.summaries = None;
    }
}

/// Fetches blueprints from a content source and turns them into trusted documents
pub struct BlueprintStore {
    source: Arc<dyn ContentSource>,
    index_path: String,
    cache: Mutex<BlueprintCache>,
}

impl BlueprintStore {
    /// Create a store reading `index_path` from `source`
    pub fn new(source: Arc<dyn ContentSource>, index_path: impl Into<String>) -> Self {
        Self {
            source,
            index_path: index_path.into(),
            cache: Mutex::new(BlueprintCache::default()),
        }
    }

    /// Expire cached data after `ttl`
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache = Mutex::new(BlueprintCache::new(ttl));
        self
    }

    /// Drop the cached index and summaries
    pub async fn invalidate(&self) {
        self.cache.lock().await.invalidate();
        tracing::debug!("Blueprint cache invalidated");
    }

    /// Load the key -> path index, fetching it on first use
    pub async fn load_index(&self) -> Result<Arc<BlueprintIndex>> {
        if let Some(index) = self.cache.lock().await.index() {
            return Ok(index);
        }

        tracing::debug!(
            source = %self.source.describe(),
            path = %self.index_path,
            "Fetching blueprint index"
        );

        let unavailable = |reason: String| ForgeError::IndexUnavailable {
            path: self.index_path.clone(),
            reason,
        };

        let text = self
            .source
            .fetch_text(&self.index_path)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let index: BlueprintIndex =
            serde_json::from_str(&text).map_err(|e| unavailable(e.to_string()))?;

        tracing::info!(entries = index.len(), "Blueprint index loaded");

        let cached = Cached::new(index);
        let index = Arc::clone(&cached.value);
        self.cache.lock().await.index = Some(cached);
        Ok(index)
    }

    /// Fetch, migrate and validate the blueprint registered under `key`
    pub async fn get_blueprint_by_key(&self, key: &str) -> Result<BlueprintDocument> {
        let index = self.load_index().await?;
        let relative = index
            .get(key)
            .ok_or_else(|| ForgeError::UnknownBlueprintKey(key.to_string()))?;
        let path = resolve_relative(&self.index_path, relative);

        let fetch_failed = |reason: String| ForgeError::BlueprintFetchFailed {
            key: key.to_string(),
            path: path.clone(),
            reason,
        };

        let text = self
            .source
            .fetch_text(&path)
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;
        let raw: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| fetch_failed(e.to_string()))?;

        let document = into_document(migrate(&raw))?;

        if document.key != key {
            tracing::debug!(
                index_key = key,
                document_key = %document.key,
                "Blueprint key differs from its index entry"
            );
        }

        Ok(document)
    }

    /// Summaries of every indexed blueprint, sorted by label
    ///
    /// Blueprints that fail to load are logged and left out.
    pub async fn list_summaries(&self) -> Result<Arc<Vec<BlueprintSummary>>> {
        if let Some(summaries) = self.cache.lock().await.summaries() {
            return Ok(summaries);
        }

        let index = self.load_index().await?;
        let mut summaries = Vec::with_capacity(index.len());

        for key in index.keys() {
            match self.get_blueprint_by_key(key).await {
                Ok(document) => summaries.push(BlueprintSummary::from(&document)),
                Err(e) => tracing::warn!(key = %key, error = %e, "Skipping blueprint in summary list"),
            }
        }

        summaries.sort_by(|a, b| collate(&a.label, &b.label).then_with(|| a.key.cmp(&b.key)));

        tracing::info!(
            loaded = summaries.len(),
            indexed = index.len(),
            "Blueprint summaries built"
        );

        let cached = Cached::new(summaries);
        let summaries = Arc::clone(&cached.value);
        self.cache.lock().await.summaries = Some(cached);
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprints::source::MemoryContentSource;
    use serde_json::json;

    fn blueprint(key: &str, label: &str) -> String {
        json!({
            "key": key,
            "label": label,
            "level": 3,
            "attributes": {},
            "progression": {},
            "anatomy": { "boots": { "materialKey": "hide" } },
            "tags": ["beast"]
        })
        .to_string()
    }

    fn pack() -> Arc<MemoryContentSource> {
        let source = Arc::new(MemoryContentSource::new());
        source.insert(
            "index.json",
            json!({
                "wolf": "creatures/wolf.json",
                "aguila": "creatures/aguila.json",
                "broken": "creatures/broken.json",
                "ghost": "creatures/ghost.json"
            })
            .to_string(),
        );
        source.insert("creatures/wolf.json", blueprint("wolf", "Wolf"));
        source.insert("creatures/aguila.json", blueprint("aguila", "Águila"));
        source.insert("creatures/broken.json", r#"{"key":"broken","label":"Broken"}"#);
        source
    }

    #[tokio::test]
    async fn test_index_is_cached() {
        let source = pack();
        let store = BlueprintStore::new(source.clone(), "index.json");

        store.load_index().await.unwrap();
        store.load_index().await.unwrap();
        assert_eq!(source.fetch_count(), 1);

        store.invalidate().await;
        store.load_index().await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let source = pack();
        let store =
            BlueprintStore::new(source.clone(), "index.json").with_ttl(Some(Duration::ZERO));

        store.load_index().await.unwrap();
        store.load_index().await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_index() {
        let store = BlueprintStore::new(Arc::new(MemoryContentSource::new()), "index.json");
        assert!(matches!(
            store.load_index().await,
            Err(ForgeError::IndexUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_blueprint_migrates_and_validates() {
        let store = BlueprintStore::new(pack(), "index.json");

        let wolf = store.get_blueprint_by_key("wolf").await.unwrap();
        assert_eq!(wolf.version, 2);
        assert!(wolf.anatomy.contains_key("patas"));
        assert!(!wolf.anatomy.contains_key("boots"));

        assert!(matches!(
            store.get_blueprint_by_key("dragon").await,
            Err(ForgeError::UnknownBlueprintKey(k)) if k == "dragon"
        ));
        assert!(matches!(
            store.get_blueprint_by_key("ghost").await,
            Err(ForgeError::BlueprintFetchFailed { .. })
        ));
        assert!(matches!(
            store.get_blueprint_by_key("broken").await,
            Err(ForgeError::InvalidBlueprint { field, .. }) if field == "level"
        ));
    }

    #[tokio::test]
    async fn test_summaries_skip_failures_and_sort() {
        let source = pack();
        let store = BlueprintStore::new(source.clone(), "index.json");

        let summaries = store.list_summaries().await.unwrap();
        let labels: Vec<&str> = summaries.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Águila", "Wolf"]);
        assert_eq!(summaries[1].tags, vec!["beast".to_string()]);

        let fetches = source.fetch_count();
        store.list_summaries().await.unwrap();
        assert_eq!(source.fetch_count(), fetches);
    }
}
