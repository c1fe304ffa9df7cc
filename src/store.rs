//! Collaborator seams: the bookmark store, the settings store and the tab
//! launcher, plus JSON-file and in-memory implementations.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use serde_json::{Map, Value};
use tracing::debug;

use crate::bookmarks::{find_node, remove_node, BookmarkNode, Removal};
use crate::error::{Result, TimelineError};

#[allow(async_fn_in_trait)]
pub trait BookmarkStore {
    /// Root nodes of the bookmark tree.
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>>;

    /// A single node by ID.
    async fn get(&self, id: &str) -> Result<BookmarkNode>;

    async fn remove(&self, id: &str) -> Result<()>;
}

/// Key/value preference storage.
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    /// Values for the requested keys; absent keys are omitted.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    /// Merge `values` into the stored record.
    async fn set(&self, values: Map<String, Value>) -> Result<()>;
}

/// Opens URLs in a new tab.
#[allow(async_fn_in_trait)]
pub trait Launcher {
    async fn open_url(&self, url: &str) -> Result<()>;
}

fn store_error(err: anyhow::Error) -> TimelineError {
    TimelineError::StoreUnavailable(format!("{:#}", err))
}

/// Bookmark tree persisted as a JSON array of root nodes.
#[derive(Debug, Clone)]
pub struct JsonBookmarkStore {
    path: PathBuf,
}

impl JsonBookmarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_tree(&self) -> anyhow::Result<Vec<BookmarkNode>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read bookmarks from {:?}", self.path))?;
        let tree: Vec<BookmarkNode> = serde_json::from_str(&content)
            .with_context(|| format!("Malformed bookmark tree in {:?}", self.path))?;
        Ok(tree)
    }

    async fn write_tree(&self, tree: &[BookmarkNode]) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(tree)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write bookmarks to {:?}", self.path))?;
        Ok(())
    }
}

impl BookmarkStore for JsonBookmarkStore {
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>> {
        let tree = self.read_tree().await.map_err(store_error)?;
        debug!("Read bookmark tree from {:?}", self.path);
        Ok(tree)
    }

    async fn get(&self, id: &str) -> Result<BookmarkNode> {
        let tree = self.read_tree().await.map_err(store_error)?;
        find_node(&tree, id)
            .cloned()
            .ok_or_else(|| TimelineError::NotFound(id.to_string()))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let delete_failed = |reason: String| TimelineError::DeleteFailed {
            id: id.to_string(),
            reason,
        };

        let mut tree = self
            .read_tree()
            .await
            .map_err(|e| delete_failed(format!("{:#}", e)))?;
        match remove_node(&mut tree, id) {
            Removal::Removed => {}
            Removal::NotFound => return Err(delete_failed("no such bookmark".to_string())),
            Removal::FolderNotEmpty => return Err(delete_failed("folder is not empty".to_string())),
        }
        self.write_tree(&tree)
            .await
            .map_err(|e| delete_failed(format!("{:#}", e)))?;
        debug!("Removed bookmark {} from {:?}", id, self.path);
        Ok(())
    }
}

/// Preferences persisted as one JSON object. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> anyhow::Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read settings from {:?}", self.path))
            }
        };
        let values: Map<String, Value> = serde_json::from_str(&content)
            .with_context(|| format!("Malformed settings in {:?}", self.path))?;
        Ok(values)
    }
}

impl SettingsStore for JsonSettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let all = self
            .read_all()
            .await
            .map_err(|e| TimelineError::Settings(format!("{:#}", e)))?;
        Ok(select_keys(all, keys))
    }

    async fn set(&self, values: Map<String, Value>) -> Result<()> {
        let mut all = self
            .read_all()
            .await
            .map_err(|e| TimelineError::Settings(format!("{:#}", e)))?;
        all.extend(values);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&all)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

fn select_keys(mut all: Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    let mut selected = Map::new();
    for key in keys {
        if let Some(value) = all.remove(*key) {
            selected.insert(key.to_string(), value);
        }
    }
    selected
}

/// In-memory bookmark tree with switchable failures.
#[derive(Debug, Default)]
pub struct MemoryBookmarkStore {
    tree: Mutex<Vec<BookmarkNode>>,
    fail_reads: bool,
    fail_removes: bool,
}

impl MemoryBookmarkStore {
    pub fn new(tree: Vec<BookmarkNode>) -> Self {
        Self {
            tree: Mutex::new(tree),
            ..Default::default()
        }
    }

    /// Every read reports the store as unavailable.
    pub fn unavailable() -> Self {
        Self {
            fail_reads: true,
            ..Default::default()
        }
    }

    pub fn failing_removes(mut self) -> Self {
        self.fail_removes = true;
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<BookmarkNode>>> {
        self.tree
            .lock()
            .map_err(|_| TimelineError::StoreUnavailable("bookmark tree lock poisoned".to_string()))
    }
}

impl BookmarkStore for MemoryBookmarkStore {
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>> {
        if self.fail_reads {
            return Err(TimelineError::StoreUnavailable("store offline".to_string()));
        }
        Ok(self.lock()?.clone())
    }

    async fn get(&self, id: &str) -> Result<BookmarkNode> {
        if self.fail_reads {
            return Err(TimelineError::StoreUnavailable("store offline".to_string()));
        }
        find_node(&self.lock()?, id)
            .cloned()
            .ok_or_else(|| TimelineError::NotFound(id.to_string()))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        if self.fail_removes {
            return Err(TimelineError::DeleteFailed {
                id: id.to_string(),
                reason: "store is read-only".to_string(),
            });
        }
        let mut tree = self.lock()?;
        match remove_node(&mut tree, id) {
            Removal::Removed => Ok(()),
            Removal::NotFound => Err(TimelineError::NotFound(id.to_string())),
            Removal::FolderNotEmpty => Err(TimelineError::DeleteFailed {
                id: id.to_string(),
                reason: "folder is not empty".to_string(),
            }),
        }
    }
}

/// In-memory settings record.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<Map<String, Value>>,
    offline: bool,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }

    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            values: Mutex::new(values),
            offline: false,
        }
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl SettingsStore for MemorySettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        if self.offline {
            return Err(TimelineError::Settings("settings store offline".to_string()));
        }
        Ok(select_keys(self.snapshot(), keys))
    }

    async fn set(&self, values: Map<String, Value>) -> Result<()> {
        if self.offline {
            return Err(TimelineError::Settings("settings store offline".to_string()));
        }
        let mut stored = self
            .values
            .lock()
            .map_err(|_| TimelineError::Settings("settings lock poisoned".to_string()))?;
        stored.extend(values);
        Ok(())
    }
}

/// Remembers every URL it was asked to open.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    opened: Mutex<Vec<String>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Launcher for RecordingLauncher {
    async fn open_url(&self, url: &str) -> Result<()> {
        self.opened
            .lock()
            .map_err(|_| TimelineError::Launch {
                url: url.to_string(),
                reason: "launcher lock poisoned".to_string(),
            })?
            .push(url.to_string());
        Ok(())
    }
}

/// Prints URLs instead of opening them; used by the command-line harness.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutLauncher;

impl Launcher for StdoutLauncher {
    async fn open_url(&self, url: &str) -> Result<()> {
        println!("🔗 {}", url);
        Ok(())
    }
}
