use std::{collections::BTreeMap, sync::RwLock};

use thiserror::Error;

pub use touchpoint_core::WritabilityProbe;

/// Installer configuration (`config.ini`) as exposed by the host manipulator.
pub trait ConfigStore {
    /// Returns true if `key` is present.
    fn contains(&self, key: &str) -> bool;

    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Inserts or replaces `key`.
    fn set(&mut self, key: &str, value: &str);

    /// Removes `key`, returning its previous value.
    fn remove(&mut self, key: &str) -> Option<String>;

    /// Snapshot of all entries, sorted by key.
    fn entries(&self) -> BTreeMap<String, String>;

    /// Writes the configuration back to its backing store.
    fn persist(&mut self, with_backup: bool) -> Result<(), PlatformError>;
}

/// Process-wide properties visible to other consumers in the same process.
pub trait SystemProperties: Send + Sync {
    /// Returns the property value for `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Sets `key` for the remainder of the process.
    fn set(&self, key: &str, value: &str);
}

/// Errors emitted by platform backends.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Backing data could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    /// Operation is not supported on this backend.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Configuration held only in memory. `persist` records the call and never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryConfig {
    entries: BTreeMap<String, String>,
    persist_calls: Vec<bool>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backup flags passed to each `persist` call, oldest first.
    pub fn persist_calls(&self) -> &[bool] {
        &self.persist_calls
    }
}

impl<K, V> FromIterator<(K, V)> for MemoryConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            persist_calls: Vec::new(),
        }
    }
}

impl ConfigStore for MemoryConfig {
    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    fn entries(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }

    fn persist(&mut self, with_backup: bool) -> Result<(), PlatformError> {
        self.persist_calls.push(with_backup);
        Ok(())
    }
}

/// Property table owned by its creator rather than the process.
#[derive(Debug, Default)]
pub struct MapProperties {
    values: RwLock<BTreeMap<String, String>>,
}

impl MapProperties {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V> FromIterator<(K, V)> for MapProperties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl SystemProperties for MapProperties {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        values.insert(key.to_string(), value.to_string());
    }
}
