//! SQLite-backed preference store.
//!
//! Preferences live in a single key/value table. Values are JSON-encoded
//! [`PrefValue`]s so keys written by other versions survive a round trip.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

use super::{data_dir, PrefValue, PreferenceStore, Preferences, Transform};
use crate::error::{CoreError, StorageError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database holding the review preferences.
///
/// Every edit runs in an `IMMEDIATE` transaction on a blocking worker. The
/// worker finishes the transaction even if the awaiting future is dropped.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open the store at `<data_dir>/smartreview.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or the database cannot be opened.
    pub fn open_default() -> Result<Self, CoreError> {
        let path = data_dir()?.join("smartreview.db");
        Ok(Self::open(path)?)
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| StorageError::TaskFailed("connection mutex poisoned".into()))?;
            f(&mut *conn)
        })
        .await?
    }
}

fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS review_prefs (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )
}

fn load(conn: &Connection) -> Result<Preferences, StorageError> {
    let mut stmt = conn.prepare("SELECT key, value FROM review_prefs")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut prefs = Preferences::new();
    for row in rows {
        let (key, raw) = row?;
        let value: PrefValue =
            serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                key: key.clone(),
                message: e.to_string(),
            })?;
        prefs.insert_raw(key, value);
    }
    Ok(prefs)
}

fn write_changes(
    tx: &Transaction<'_>,
    before: &Preferences,
    after: &Preferences,
) -> Result<(), StorageError> {
    for (key, value) in after.iter() {
        if before.get_raw(key) == Some(value) {
            continue;
        }
        let encoded = serde_json::to_string(value).map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        tx.execute(
            "INSERT OR REPLACE INTO review_prefs (key, value) VALUES (?1, ?2)",
            params![key, encoded],
        )?;
    }

    for (key, _) in before.iter() {
        if after.get_raw(key).is_none() {
            tx.execute("DELETE FROM review_prefs WHERE key = ?1", params![key])?;
        }
    }
    Ok(())
}

#[async_trait]
impl PreferenceStore for SqliteStore {
    async fn read(&self) -> Result<Preferences, StorageError> {
        self.with_conn(|conn| load(conn)).await
    }

    async fn edit(&self, transform: Transform) -> Result<(), StorageError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let before = load(&tx)?;
            let mut after = before.clone();
            transform(&mut after)?;
            write_changes(&tx, &before, &after)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::keys;

    #[tokio::test]
    async fn edit_and_read_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.read().await.unwrap().is_empty());

        store
            .edit(Box::new(|prefs| {
                prefs.set(keys::LAUNCH_COUNT, 7);
                prefs.set(keys::SENTIMENT_POSITIVE, true);
                Ok(())
            }))
            .await
            .unwrap();

        let prefs = store.read().await.unwrap();
        assert_eq!(prefs.get(keys::LAUNCH_COUNT).unwrap(), Some(7));
        assert_eq!(prefs.get(keys::SENTIMENT_POSITIVE).unwrap(), Some(true));
    }

    #[tokio::test]
    async fn removed_keys_are_deleted() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .edit(Box::new(|prefs| {
                prefs.set(keys::PASSIVE_SHOWN_COUNT, 1);
                prefs.set(keys::OPT_OUT, false);
                Ok(())
            }))
            .await
            .unwrap();
        store
            .edit(Box::new(|prefs| {
                prefs.remove(keys::PASSIVE_SHOWN_COUNT);
                Ok(())
            }))
            .await
            .unwrap();

        let prefs = store.read().await.unwrap();
        assert!(!prefs.contains(keys::PASSIVE_SHOWN_COUNT));
        assert!(prefs.contains(keys::OPT_OUT));
    }

    #[tokio::test]
    async fn failed_transform_rolls_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store
            .edit(Box::new(|prefs| {
                prefs.set(keys::OPT_OUT, true);
                Err(StorageError::QueryFailed("abort".into()))
            }))
            .await;
        assert!(result.is_err());
        assert!(store.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .edit(Box::new(|prefs| {
                    prefs.set(keys::PROMPT_COUNT, 3);
                    Ok(())
                }))
                .await
                .unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let prefs = reopened.read().await.unwrap();
        assert_eq!(prefs.get(keys::PROMPT_COUNT).unwrap(), Some(3));
    }

    #[tokio::test]
    async fn unknown_keys_survive_edits() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO review_prefs (key, value) VALUES ('added_later', '\"v2\"')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        store
            .edit(Box::new(|prefs| {
                prefs.set(keys::LAUNCH_COUNT, 1);
                Ok(())
            }))
            .await
            .unwrap();

        let prefs = store.read().await.unwrap();
        assert_eq!(
            prefs.get_raw("added_later"),
            Some(&PrefValue::Text("v2".into()))
        );
    }

    #[tokio::test]
    async fn undecodable_value_is_corrupt() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO review_prefs (key, value) VALUES ('launch_count', 'not json')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let err = store.read().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == "launch_count"));
    }
}
