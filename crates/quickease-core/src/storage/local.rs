//! SQLite-backed local cache.
//!
//! Mirrors the small amount of state the client keeps between runs:
//! - The auth token bundle
//! - The earned-badge set (mirror of the backend's)
//! - Serialized session state (timer, badge queue, pending settings)
//! - Per-note cached date metadata

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::data_dir;
use crate::backend::{AuthTokens, Note};
use crate::error::{CoreError, DatabaseError};

const TOKENS_KEY: &str = "auth_tokens";
const EARNED_KEY: &str = "earned_badges";
const SESSION_KEY: &str = "session_state";

pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    /// Open the cache at `<data_dir>/quickease.db`, creating it if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        Self::open_at(&data_dir()?.join("quickease.db"))
    }

    /// Open the cache at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory cache.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS note_dates (
                note_id    INTEGER PRIMARY KEY,
                created_at TEXT NOT NULL
            );",
        )
    }

    // ── Key-value ────────────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        match self.kv_get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| DatabaseError::CorruptValue {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(value).map_err(|e| DatabaseError::CorruptValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.kv_set(key, &raw)
    }

    // ── Typed helpers ────────────────────────────────────────────────

    pub fn auth_tokens(&self) -> Result<Option<AuthTokens>, DatabaseError> {
        self.get_json(TOKENS_KEY)
    }

    pub fn save_auth_tokens(&self, tokens: &AuthTokens) -> Result<(), DatabaseError> {
        self.set_json(TOKENS_KEY, tokens)
    }

    pub fn earned_badges(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(self.get_json(EARNED_KEY)?.unwrap_or_default())
    }

    pub fn save_earned_badges<'a, I>(&self, ids: I) -> Result<(), DatabaseError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let ids: Vec<&String> = ids.into_iter().collect();
        self.set_json(EARNED_KEY, &ids)
    }

    /// Serialized session state, decoded by the caller's type.
    pub fn session_state<T: DeserializeOwned>(&self) -> Result<Option<T>, DatabaseError> {
        self.get_json(SESSION_KEY)
    }

    pub fn save_session_state<T: Serialize>(&self, state: &T) -> Result<(), DatabaseError> {
        self.set_json(SESSION_KEY, state)
    }

    /// Cache creation dates of notes that carry one.
    pub fn record_note_dates(&self, notes: &[Note]) -> Result<usize, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "INSERT OR REPLACE INTO note_dates (note_id, created_at) VALUES (?1, ?2)",
        )?;
        let mut written = 0;
        for note in notes {
            if let Some(created_at) = note.created_at {
                stmt.execute(params![note.id, created_at.to_rfc3339()])?;
                written += 1;
            }
        }
        Ok(written)
    }

    pub fn note_date(&self, note_id: i64) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        let raw = self
            .conn
            .query_row(
                "SELECT created_at FROM note_dates WHERE note_id = ?1",
                params![note_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| DatabaseError::CorruptValue {
                    key: format!("note_dates/{note_id}"),
                    message: e.to_string(),
                })
        })
        .transpose()
    }

    /// Drop everything tied to the logged-in user.
    pub fn clear_session(&self) -> Result<(), DatabaseError> {
        self.kv_delete(TOKENS_KEY)?;
        self.kv_delete(EARNED_KEY)?;
        self.kv_delete(SESSION_KEY)?;
        self.conn.execute("DELETE FROM note_dates", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn kv_store() {
        let store = LocalStore::open_memory().unwrap();
        assert!(store.kv_get("test").unwrap().is_none());
        store.kv_set("test", "hello").unwrap();
        assert_eq!(store.kv_get("test").unwrap().unwrap(), "hello");
        store.kv_delete("test").unwrap();
        assert!(store.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn tokens_and_badges_roundtrip() {
        let store = LocalStore::open_memory().unwrap();
        let tokens = AuthTokens {
            access: "acc".into(),
            refresh: "ref".into(),
        };
        store.save_auth_tokens(&tokens).unwrap();
        assert_eq!(store.auth_tokens().unwrap(), Some(tokens));

        let ids = vec!["first-note".to_string(), "perfect-quiz-1".to_string()];
        store.save_earned_badges(&ids).unwrap();
        assert_eq!(store.earned_badges().unwrap(), ids);
    }

    #[test]
    fn corrupt_value_is_reported() {
        let store = LocalStore::open_memory().unwrap();
        store.kv_set(TOKENS_KEY, "{not json").unwrap();
        assert!(matches!(
            store.auth_tokens(),
            Err(DatabaseError::CorruptValue { .. })
        ));
    }

    #[test]
    fn note_dates_skip_undated_notes() {
        let store = LocalStore::open_memory().unwrap();
        let when = Utc.with_ymd_and_hms(2026, 2, 14, 8, 30, 0).unwrap();
        let notes = vec![
            Note {
                id: 1,
                title: "Dated".into(),
                created_at: Some(when),
            },
            Note {
                id: 2,
                title: "Undated".into(),
                created_at: None,
            },
        ];
        assert_eq!(store.record_note_dates(&notes).unwrap(), 1);
        assert_eq!(store.note_date(1).unwrap(), Some(when));
        assert_eq!(store.note_date(2).unwrap(), None);
    }

    #[test]
    fn clear_session_forgets_user_state() {
        let store = LocalStore::open_memory().unwrap();
        store
            .save_auth_tokens(&AuthTokens {
                access: "a".into(),
                refresh: "r".into(),
            })
            .unwrap();
        store.save_earned_badges(&["first-note".to_string()]).unwrap();
        store.kv_set("unrelated", "kept").unwrap();
        store.clear_session().unwrap();
        assert!(store.auth_tokens().unwrap().is_none());
        assert!(store.earned_badges().unwrap().is_empty());
        assert_eq!(store.kv_get("unrelated").unwrap().as_deref(), Some("kept"));
    }
}
