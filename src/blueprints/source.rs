//! Content sources that blueprint documents are fetched from
//!
//! The store only needs "give me the text at this relative path". The pack
//! can live on disk, behind an HTTP server, or in memory for tests.

use crate::core::error::{ForgeError, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// Read-only access to a blueprint pack
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the text stored at `path` (relative to the pack root)
    async fn fetch_text(&self, path: &str) -> Result<String>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Pack stored in a local directory
pub struct FsContentSource {
    root: PathBuf,
}

impl FsContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentSource for FsContentSource {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let full = self.root.join(path.trim_start_matches('/'));
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| ForgeError::Content(format!("{}: {}", full.display(), e)))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Pack served over HTTP(S)
pub struct HttpContentSource {
    client: Client,
    base: Url,
}

impl HttpContentSource {
    /// Create a source rooted at `base_url`
    ///
    /// A trailing slash is added if missing so relative paths resolve inside
    /// the base directory rather than replacing its last segment.
    pub fn new(base_url: &str) -> Result<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&normalized)
            .map_err(|e| ForgeError::Config(format!("invalid content URL '{}': {}", base_url, e)))?;
        Ok(Self {
            client: Client::new(),
            base,
        })
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ForgeError::Content(format!("{}: {}", path, e)))?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ForgeError::Content(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(ForgeError::Content(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ForgeError::Content(format!("{}: {}", url, e)))
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

/// In-memory pack, mainly for tests and embedding
///
/// Counts fetches so callers can observe caching behaviour.
#[derive(Default)]
pub struct MemoryContentSource {
    files: RwLock<HashMap<String, String>>,
    fetches: AtomicUsize,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&self, path: impl Into<String>, content: impl Into<String>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), content.into());
        }
    }

    /// Remove a file, returning whether it existed
    pub fn remove(&self, path: &str) -> bool {
        self.files
            .write()
            .map(|mut files| files.remove(path).is_some())
            .unwrap_or(false)
    }

    /// Number of `fetch_text` calls served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for MemoryContentSource {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let files = self
            .files
            .read()
            .map_err(|_| ForgeError::Content("memory source lock poisoned".into()))?;
        files
            .get(path)
            .cloned()
            .ok_or_else(|| ForgeError::Content(format!("{}: not found", path)))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Pick a source for `root`: HTTP for http(s) URLs, filesystem otherwise
pub fn source_for_root(root: &str) -> Result<Arc<dyn ContentSource>> {
    if root.starts_with("http://") || root.starts_with("https://") {
        Ok(Arc::new(HttpContentSource::new(root)?))
    } else {
        Ok(Arc::new(FsContentSource::new(root)))
    }
}

/// Resolve `relative` against the directory containing `base`
///
/// Absolute paths and URLs are returned unchanged. `.` and `..` segments are
/// collapsed; `..` never climbs above the pack root.
pub fn resolve_relative(base: &str, relative: &str) -> String {
    if relative.starts_with('/') || relative.contains("://") {
        return relative.to_string();
    }

    let mut segments: Vec<&str> = base.split('/').collect();
    // Drop the file name of the base document
    segments.pop();

    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments
        .into_iter()
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_relative("index.json", "wolf.json"), "wolf.json");
        assert_eq!(
            resolve_relative("packs/index.json", "creatures/wolf.json"),
            "packs/creatures/wolf.json"
        );
        assert_eq!(
            resolve_relative("packs/index.json", "./creatures/../wolf.json"),
            "packs/wolf.json"
        );
        assert_eq!(resolve_relative("index.json", "../../escape.json"), "escape.json");
        assert_eq!(resolve_relative("index.json", "/abs/wolf.json"), "/abs/wolf.json");
    }

    #[tokio::test]
    async fn test_memory_source_counts_fetches() {
        let source = MemoryContentSource::new();
        source.insert("a.json", "{}");

        assert_eq!(source.fetch_text("a.json").await.unwrap(), "{}");
        assert!(source.fetch_text("missing.json").await.is_err());
        assert_eq!(source.fetch_count(), 2);

        assert!(source.remove("a.json"));
        assert!(source.fetch_text("a.json").await.is_err());
    }

    #[tokio::test]
    async fn test_fs_source_reads_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.json"), r#"{"wolf":"wolf.json"}"#).unwrap();

        let source = FsContentSource::new(dir.path());
        let text = source.fetch_text("index.json").await.unwrap();
        assert!(text.contains("wolf"));
        assert!(source.fetch_text("nope.json").await.is_err());
    }

    #[test]
    fn test_http_source_normalizes_base() {
        let source = HttpContentSource::new("https://content.example.com/bestiary").unwrap();
        assert_eq!(source.describe(), "https://content.example.com/bestiary/");
        assert!(HttpContentSource::new("not a url").is_err());
    }
}
