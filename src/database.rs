use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
}

/// String blob storage keyed by name.
///
/// The planner only ever reads and replaces whole values, so this is all it
/// needs from a backend.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    /// Insert or replace the value under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;

    /// Remove `key`; missing keys are ignored
    fn delete(&self, key: &str) -> Result<(), DatabaseError>;

    /// Apply several writes at once. `None` deletes the key.
    /// Either every entry is applied or none is.
    fn write_batch(&self, entries: &[(&str, Option<String>)]) -> Result<(), DatabaseError>;
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        debug!("Opened database at {}", db_path.display());

        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Open a private in-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn now() -> String {
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, Self::now()],
        )?;
        debug!("Wrote {} bytes under '{}'", value.len(), key);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
    }

    fn write_batch(&self, entries: &[(&str, Option<String>)]) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Self::now();
        for (key, value) in entries {
            match value {
                Some(value) => {
                    tx.execute(
                        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                        rusqlite::params![key, value, now],
                    )?;
                }
                None => {
                    tx.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
                }
            }
        }
        tx.commit()?;
        debug!("Committed batch of {} writes", entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_key() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get("nothing").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let db = Database::open_in_memory().unwrap();
        db.set("k", "one").unwrap();
        db.set("k", "two").unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("two"));

        db.delete("k").unwrap();
        assert_eq!(db.get("k").unwrap(), None);
        // deleting again is fine
        db.delete("k").unwrap();
    }

    #[test]
    fn test_write_batch_sets_and_deletes() {
        let db = Database::open_in_memory().unwrap();
        db.set("a", "old").unwrap();
        db.set("b", "gone soon").unwrap();

        db.write_batch(&[("a", Some("new".to_string())), ("b", None), ("c", Some("fresh".to_string()))])
            .unwrap();

        assert_eq!(db.get("a").unwrap().as_deref(), Some("new"));
        assert_eq!(db.get("b").unwrap(), None);
        assert_eq!(db.get("c").unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_new_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("planner.db");
        let db = Database::new(path.to_str().unwrap()).unwrap();
        db.set("k", "v").unwrap();
        drop(db);

        let reopened = Database::new(path.to_str().unwrap()).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
    }
}
