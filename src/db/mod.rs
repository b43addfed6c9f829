//! Database module for the session store
//!
//! Provides SQLite storage for the single-table key-value layout.

pub mod schema;

use crate::error::{CoreError, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Database manager around a single SQLite connection
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and make sure `table` exists
    pub fn new(db_path: PathBuf, table: &str) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        schema::init_db(&conn, table)?;

        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory SQLite database (tests, throwaway runs)
    pub fn open_in_memory(table: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_db(&conn, table)?;

        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool
    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| CoreError::Store("database connection mutex poisoned".to_string()))?;
            f(&guard).map_err(CoreError::from)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("data").join("sessions.db");

        let db = Database::new(db_path.clone(), "Session-test");
        assert!(db.is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn test_rejects_bad_table_name() {
        assert!(Database::open_in_memory("Session; DROP TABLE x").is_err());
    }

    #[tokio::test]
    async fn test_with_conn_runs_query() {
        let db = Database::open_in_memory("Session-test").unwrap();
        let count: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM \"Session-test\"", [], |r| r.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
