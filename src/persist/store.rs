use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Key under which the schema itself is saved.
pub const SCHEMA_KEY: &str = "form-schema";

/// Synchronous key-value collaborator used for values, step position and
/// the schema. Reads happen once at initialization; writes follow every
/// mutation.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read store file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Store file '{path}' is not a JSON object: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

// ============================================================================
// Storage keys
// ============================================================================

/// The pair of keys one form instance writes to. Persisted and temporary
/// sessions use different prefixes so they never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub values: String,
    pub step: String,
}

impl StorageKeys {
    pub fn single_step(persist: bool) -> Self {
        let prefix = key_prefix(persist);
        Self {
            values: format!("{}-form-data", prefix),
            step: format!("{}-step-data", prefix),
        }
    }

    pub fn multi_step(persist: bool) -> Self {
        let prefix = key_prefix(persist);
        Self {
            values: format!("{}-multistep-form-data", prefix),
            step: format!("{}-multistep-step-data", prefix),
        }
    }
}

fn key_prefix(persist: bool) -> &'static str {
    if persist { "kyc" } else { "temp" }
}

/// Navigator position as stored: `{"currentStep": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepData {
    pub current_step: u32,
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store. Clones share the same map, so a caller can keep a
/// handle while a form owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        match self.entries.lock() {
            Ok(map) => map.get(key).cloned(),
            Err(e) => {
                warn!("memory store lock poisoned: {}", e);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: Value) {
        match self.entries.lock() {
            Ok(mut map) => {
                map.insert(key.to_string(), value);
            }
            Err(e) => warn!("memory store lock poisoned: {}", e),
        }
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// All keys live in one JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.display().to_string(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) {
        let json = match serde_json::to_string_pretty(&self.entries) {
            Ok(j) => j,
            Err(e) => {
                warn!("failed to serialize store: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, json) {
            warn!("failed to write store file '{}': {}", self.path.display(), e);
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
        self.flush();
    }
}
