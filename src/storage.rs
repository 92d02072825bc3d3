//! Durable key-value persistence for tool results
//!
//! `StateStore` is the boundary to the external persistence collaborator.
//! The shipped file store writes one pretty-printed JSON document per key
//! under a state directory; the in-memory store backs tests.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::errors::{Result, ToolError};

/// Key-value persistence boundary
pub trait StateStore: Send + Sync {
    /// Load the document stored under `key`, if any
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Store `value` under `key`, overwriting any previous document
    fn save(&self, key: &str, value: &serde_json::Value) -> Result<()>;
}

/// JSON-file-backed store
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        if !dir.exists() {
            fs::create_dir_all(&dir)
                .map_err(|e| ToolError::Storage(format!("Failed to create state directory: {e}")))?;
        }

        Ok(Self { dir })
    }

    /// Create a store under the user's home directory
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ToolError::Storage("Could not determine home directory".to_string()))?;

        Self::new(home.join(".contextbuddy").join("state"))
    }

    fn file_path(&self, key: &str) -> PathBuf {
        // Keys are namespaced with '/'; flatten to a single file name.
        let name: String = key
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '-',
                other => other,
            })
            .collect();

        self.dir.join(format!("{name}.json"))
    }
}

impl StateStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let path = self.file_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| ToolError::Storage(format!("Failed to read {}: {e}", path.display())))?;

        let value = serde_json::from_str(&contents)
            .map_err(|e| ToolError::Storage(format!("Failed to parse {}: {e}", path.display())))?;

        Ok(Some(value))
    }

    fn save(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let path = self.file_path(key);

        let json = serde_json::to_string_pretty(value)
            .map_err(|e| ToolError::Storage(format!("Failed to serialize state: {e}")))?;

        fs::write(&path, json)
            .map_err(|e| ToolError::Storage(format!("Failed to write {}: {e}", path.display())))?;

        Ok(())
    }
}

/// In-memory store for tests and embedded use
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn save(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}
