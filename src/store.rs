use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{Connection, params};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("visit store unavailable: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("visit store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("visit store mutex poisoned")]
    Poisoned,
}

/// Durable append-only list keyed by name. One serialized record per entry;
/// insertion order is authoritative and reads return newest first.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Prepend one payload to the list under `list_key`.
    async fn prepend(&self, list_key: &str, payload: &str) -> Result<(), StoreError>;

    /// Newest-first payloads under `list_key`, at most `limit` of them.
    async fn recent(&self, list_key: &str, limit: usize) -> Result<Vec<String>, StoreError>;

    /// Number of entries under `list_key`.
    async fn len(&self, list_key: &str) -> Result<usize, StoreError>;
}

pub type DynVisitStore = Arc<dyn VisitStore>;

/// SQLite-backed list store. Rows are only ever inserted; descending id is
/// the list order. AUTOINCREMENT keeps ids monotonic even if an external
/// job prunes old rows.
pub struct SqliteVisitStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVisitStore {
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS visits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                list_key TEXT NOT NULL,
                payload TEXT NOT NULL,
                recorded_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            CREATE INDEX IF NOT EXISTS idx_visits_list ON visits(list_key, id DESC);
            "#,
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl VisitStore for SqliteVisitStore {
    async fn prepend(&self, list_key: &str, payload: &str) -> Result<(), StoreError> {
        let conn = Arc::clone(&self.conn);
        let list_key = list_key.to_string();
        let payload = payload.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            conn.execute(
                "INSERT INTO visits (list_key, payload) VALUES (?1, ?2)",
                params![list_key, payload],
            )?;
            Ok(())
        })
        .await?
    }

    async fn recent(&self, list_key: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let conn = Arc::clone(&self.conn);
        let list_key = list_key.to_string();
        tokio::task::spawn_blocking(move || -> Result<Vec<String>, StoreError> {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            let mut stmt = conn.prepare(
                "SELECT payload FROM visits WHERE list_key = ?1 ORDER BY id DESC LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![list_key, limit as i64], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(rows)
        })
        .await?
    }

    async fn len(&self, list_key: &str) -> Result<usize, StoreError> {
        let conn = Arc::clone(&self.conn);
        let list_key = list_key.to_string();
        tokio::task::spawn_blocking(move || -> Result<usize, StoreError> {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM visits WHERE list_key = ?1",
                params![list_key],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepend_returns_newest_first() {
        let store = SqliteVisitStore::open_in_memory().unwrap();
        store.prepend("visits", "first").await.unwrap();
        store.prepend("visits", "second").await.unwrap();
        store.prepend("visits", "third").await.unwrap();

        let recent = store.recent("visits", 10).await.unwrap();
        assert_eq!(recent, vec!["third", "second", "first"]);
        assert_eq!(store.len("visits").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn recent_respects_limit() {
        let store = SqliteVisitStore::open_in_memory().unwrap();
        for i in 0..5 {
            store.prepend("visits", &format!("v{i}")).await.unwrap();
        }
        let recent = store.recent("visits", 2).await.unwrap();
        assert_eq!(recent, vec!["v4", "v3"]);
    }

    #[tokio::test]
    async fn lists_are_isolated_by_key() {
        let store = SqliteVisitStore::open_in_memory().unwrap();
        store.prepend("a", "only-a").await.unwrap();
        store.prepend("b", "only-b").await.unwrap();

        assert_eq!(store.recent("a", 10).await.unwrap(), vec!["only-a"]);
        assert_eq!(store.recent("b", 10).await.unwrap(), vec!["only-b"]);
        assert_eq!(store.len("a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visits.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteVisitStore::open(path).unwrap();
            store.prepend("visits", "persisted").await.unwrap();
        }

        let store = SqliteVisitStore::open(path).unwrap();
        assert_eq!(store.recent("visits", 10).await.unwrap(), vec!["persisted"]);
    }
}
