//! Local key-value storage for persisted JSON documents.

use crate::error::{StorageError, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;

/// A durable string store keyed by stable names.
pub trait Storage {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete the value stored under `key`.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Load a JSON document, falling back to `T::default()`.
///
/// Missing keys, unreadable storage and malformed JSON all yield the
/// default; the latter two are logged. Field-level merging with defaults is
/// left to the type's serde attributes, so a record with one bad field still
/// keeps the others.
pub fn load_or_default<T>(storage: &dyn Storage, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read from storage");
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring malformed stored data");
            T::default()
        }
    }
}

/// Serialize and store a document. Failures are logged and swallowed.
///
/// Returns whether the write succeeded.
pub fn save_best_effort<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) -> bool {
    let result = serde_json::to_string(value)
        .map_err(StorageError::from)
        .and_then(|json| storage.set(key, &json));

    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to save to storage");
            false
        }
    }
}

/// SQLite-backed store with a single key-value table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> StorageResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl Storage for SqliteStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-memory store, used in tests and when no durable store can be opened.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail, as a full or unavailable store would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Seed a raw value, bypassing the failure switch.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl Storage for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.get() {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::models::{CategoryStats, UserProgress};

    #[test]
    fn test_sqlite_set_get_remove() {
        let store = SqliteStore::in_memory().unwrap();

        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_load_missing_returns_default() {
        let store = MemoryStore::new();
        let progress: UserProgress = load_or_default(&store, "progress");
        assert_eq!(progress, UserProgress::default());
    }

    #[test]
    fn test_load_malformed_returns_default() {
        let store = MemoryStore::new();
        store.insert_raw("progress", "{not json");
        let progress: UserProgress = load_or_default(&store, "progress");
        assert_eq!(progress, UserProgress::default());

        store.insert_raw("progress", r#"{"quizzesTaken": "many"}"#);
        let progress: UserProgress = load_or_default(&store, "progress");
        assert_eq!(progress, UserProgress::default());
    }

    #[test]
    fn test_roundtrip_with_missing_category() {
        let store = SqliteStore::in_memory().unwrap();
        let mut progress = UserProgress::default();
        progress.quizzes_taken = 2;
        progress.category_stats[Category::DroitsDevoirs] = CategoryStats { attempts: 9, correct: 6 };
        assert!(save_best_effort(&store, "progress", &progress));

        // Drop one category from the stored document.
        let raw = store.get("progress").unwrap().unwrap();
        let mut json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        json["categoryStats"]
            .as_object_mut()
            .unwrap()
            .remove("vivre-societe");
        store.set("progress", &json.to_string()).unwrap();

        let reloaded: UserProgress = load_or_default(&store, "progress");
        assert_eq!(reloaded.quizzes_taken, 2);
        assert_eq!(
            reloaded.category_stats[Category::DroitsDevoirs],
            CategoryStats { attempts: 9, correct: 6 }
        );
        assert_eq!(
            reloaded.category_stats[Category::VivreSociete],
            CategoryStats::default()
        );
    }

    #[test]
    fn test_null_category_stats_keep_history() {
        let store = MemoryStore::new();
        store.insert_raw("progress", r#"{"quizzesTaken": 7, "bestScore": 35, "categoryStats": null}"#);

        let progress: UserProgress = load_or_default(&store, "progress");

        assert_eq!(progress.quizzes_taken, 7);
        assert_eq!(progress.best_score, 35);
        assert_eq!(progress.category_stats[Category::DroitsDevoirs], CategoryStats::default());
    }

    #[test]
    fn test_failed_write_is_swallowed() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(!save_best_effort(&store, "progress", &UserProgress::default()));
        assert_eq!(store.get("progress").unwrap(), None);
    }
}
