//! Token and tenant storage.
//!
//! The gateway only reads from a [`CredentialStore`]; login and logout flows
//! write to the backing storage elsewhere.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

/// Read-only string key-value lookup.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Walk `keys` in order and return the first non-empty value with its key.
pub fn lookup_first<'k>(
    store: &dyn CredentialStore,
    keys: &'k [String],
) -> Option<(&'k str, String)> {
    keys.iter().find_map(|key| {
        store
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .map(|v| (key.as_str(), v))
    })
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().remove(key)
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

/// JSON object file, re-read on every lookup so external login and logout
/// are picked up without restarting.
///
/// A missing file reads as empty. Non-string values are ignored.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Option<serde_json::Map<String, serde_json::Value>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read credential file");
                return None;
            }
        };

        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            Ok(_) => {
                warn!(path = %self.path.display(), "Credential file is not a JSON object");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to parse credential file");
                None
            }
        }
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load()?
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

/// Environment variables: `widget_os_token` is read from `WIDGET_OS_TOKEN`.
#[derive(Debug, Clone, Default)]
pub struct EnvStore {
    prefix: String,
}

impl EnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `prefix` to every variable name (e.g. `WOS_` -> `WOS_TOKEN`).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn var_name(&self, key: &str) -> String {
        let normalized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{normalized}", self.prefix)
    }
}

impl CredentialStore for EnvStore {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(self.var_name(key)).ok()
    }
}
