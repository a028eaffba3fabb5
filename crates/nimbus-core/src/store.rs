//! Best-effort persistence for small named records.
//!
//! The dashboard keeps exactly two records between sessions: the favorites
//! list and the last active location. Both are opaque serialized snapshots
//! stored as JSON files under the config directory. Loads degrade to absence
//! on any failure and saves are fire-and-forget; persistence problems are
//! logged, never surfaced to the user.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Record name for the favorites list.
pub const FAVORITES_KEY: &str = "favorites";

/// Record name for the last active location.
pub const LAST_LOCATION_KEY: &str = "last-location";

/// Durable key-value store backed by JSON files.
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Create a store rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a store under the default user config directory.
    pub fn open_default() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nimbus")
            .join("state");
        Self::new(dir)
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Load a record, returning `None` when it is absent or unreadable.
    ///
    /// A missing file, an I/O failure, and malformed JSON all degrade to
    /// absence; the caller cannot distinguish them and should not need to.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.record_path(key);
        if !path.exists() {
            return None;
        }

        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to read record {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Record {} is malformed, treating as absent: {}", key, e);
                None
            }
        }
    }

    /// Save a record, returning whether the write succeeded.
    ///
    /// Callers are free to ignore the result; failures are logged here.
    /// Writes are idempotent, re-saving the same value is harmless.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> bool {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!("Failed to create state directory: {}", e);
            return false;
        }

        let json = match serde_json::to_string_pretty(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize record {}: {}", key, e);
                return false;
            }
        };

        match fs::write(self.record_path(key), json) {
            Ok(()) => {
                tracing::debug!("Saved record {}", key);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to write record {}: {}", key, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());

        let value = vec!["Berlin".to_string(), "Hamburg".to_string()];
        assert!(store.save(FAVORITES_KEY, &value));

        let loaded: Option<Vec<String>> = store.load(FAVORITES_KEY);
        assert_eq!(loaded, Some(value));
    }

    #[test]
    fn test_load_absent_record() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());

        let loaded: Option<Vec<String>> = store.load(LAST_LOCATION_KEY);
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_malformed_record_degrades_to_absent() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());

        fs::create_dir_all(dir.path()).unwrap();
        fs::write(dir.path().join("favorites.json"), "{not json").unwrap();

        let loaded: Option<Vec<String>> = store.load(FAVORITES_KEY);
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());

        let value = "geo-52.52-13.41".to_string();
        assert!(store.save(LAST_LOCATION_KEY, &value));
        assert!(store.save(LAST_LOCATION_KEY, &value));

        let loaded: Option<String> = store.load(LAST_LOCATION_KEY);
        assert_eq!(loaded, Some(value));
    }

    #[test]
    fn test_save_overwrites_previous_value() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());

        assert!(store.save(FAVORITES_KEY, &vec!["a"]));
        assert!(store.save(FAVORITES_KEY, &vec!["b", "c"]));

        let loaded: Option<Vec<String>> = store.load(FAVORITES_KEY);
        assert_eq!(loaded, Some(vec!["b".to_string(), "c".to_string()]));
    }
}
