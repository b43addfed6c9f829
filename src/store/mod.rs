//! SessionStore — the key-value table the session handler talks to.
//!
//! Uses enum dispatch to support multiple backends without trait objects.
//! - `Db` variant — SQLite table (backend = "sqlite")
//! - `Memory` variant — in-process table (backend = "memory", and the fake used in tests)
//!
//! Every method is exactly one round trip against the table. Items of other
//! entity kinds sharing the table (`__typename` other than `Session`) are
//! invisible to reads and never touched by updates.

pub mod memory;
mod sqlite;

pub use memory::MemoryTable;

use crate::config::{Backend, Config};
use crate::db::Database;
use crate::error::Result;
use crate::session::Session;
use std::sync::Arc;

/// Attribute changes applied by an update: the new owner and the new `updatedAt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub user_id: Option<String>,
    pub updated_at: String,
}

/// Storage backend for session items
#[derive(Clone)]
pub enum SessionStore {
    /// SQLite database backend
    Db { db: Arc<Database>, table: String },
    /// In-memory backend
    Memory(Arc<MemoryTable>),
}

impl SessionStore {
    /// Build the backend selected in the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let table = config.table.table_name();
        match config.table.backend {
            Backend::Sqlite => {
                let db = Database::new(config.db_path(), &table)?;
                tracing::info!(
                    "Using SQLite table {} at {}",
                    table,
                    config.db_path().display()
                );
                Ok(SessionStore::Db {
                    db: Arc::new(db),
                    table,
                })
            }
            Backend::Memory => {
                tracing::info!("Using in-memory table {} (data is lost on restart)", table);
                Ok(SessionStore::Memory(Arc::new(MemoryTable::new())))
            }
        }
    }

    /// Full-item overwrite keyed by `session.id`
    pub async fn put_item(&self, session: &Session) -> Result<()> {
        match self {
            SessionStore::Db { db, table } => sqlite::put_item(db, table, session).await,
            SessionStore::Memory(t) => t.put_item(session),
        }
    }

    /// Point get. `Ok(None)` means no item has this id.
    pub async fn get_item(&self, id: &str) -> Result<Option<Session>> {
        match self {
            SessionStore::Db { db, table } => sqlite::get_item(db, table, id).await,
            SessionStore::Memory(t) => t.get_item(id),
        }
    }

    /// Set `userId`/`updatedAt`, creating a partial item when `id` is unknown.
    /// Returns `Ok(false)` and writes nothing when `id` belongs to another entity kind.
    pub async fn upsert_attributes(&self, id: &str, update: &SessionUpdate) -> Result<bool> {
        match self {
            SessionStore::Db { db, table } => sqlite::upsert_attributes(db, table, id, update).await,
            SessionStore::Memory(t) => t.upsert_attributes(id, update),
        }
    }

    /// Set `userId`/`updatedAt` on an existing session item only.
    /// Returns `Ok(false)` and writes nothing when `id` is unknown or not a session.
    pub async fn update_attributes(&self, id: &str, update: &SessionUpdate) -> Result<bool> {
        match self {
            SessionStore::Db { db, table } => sqlite::update_attributes(db, table, id, update).await,
            SessionStore::Memory(t) => t.update_attributes(id, update),
        }
    }

    /// Short backend name for logs
    pub fn backend_name(&self) -> &'static str {
        match self {
            SessionStore::Db { .. } => "sqlite",
            SessionStore::Memory(_) => "memory",
        }
    }
}
