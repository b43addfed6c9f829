//! In-memory session table.
//!
//! Volatile: everything is lost when the process exits. Also the fake the
//! handler tests inject, so it counts calls and can be told to fail.

use super::SessionUpdate;
use crate::error::{CoreError, Result};
use crate::session::Session;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// In-process key-value table keyed by session id
#[derive(Default)]
pub struct MemoryTable {
    items: RwLock<HashMap<String, Session>>,
    /// When set, every call fails with this message
    failure: RwLock<Option<String>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail (`None` restores normal operation)
    pub fn set_failure(&self, message: Option<&str>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = message.map(str::to_string);
        }
    }

    /// Number of point reads attempted so far
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of writes attempted so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Total round trips attempted so far
    pub fn call_count(&self) -> usize {
        self.read_count() + self.write_count()
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(super) fn put_item(&self, session: &Session) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        self.items
            .write()
            .map_err(|_| poisoned())?
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    pub(super) fn get_item(&self, id: &str) -> Result<Option<Session>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        Ok(self
            .items
            .read()
            .map_err(|_| poisoned())?
            .get(id)
            .filter(|s| s.is_session_kind())
            .cloned())
    }

    pub(super) fn upsert_attributes(&self, id: &str, update: &SessionUpdate) -> Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let mut items = self.items.write().map_err(|_| poisoned())?;
        match items.get_mut(id) {
            Some(existing) if !existing.is_session_kind() => return Ok(false),
            Some(existing) => apply(existing, update),
            None => {
                items.insert(
                    id.to_string(),
                    Session {
                        id: id.to_string(),
                        created_at: None,
                        updated_at: update.updated_at.clone(),
                        user_id: update.user_id.clone(),
                        typename: None,
                    },
                );
            }
        }
        Ok(true)
    }

    pub(super) fn update_attributes(&self, id: &str, update: &SessionUpdate) -> Result<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let mut items = self.items.write().map_err(|_| poisoned())?;
        match items.get_mut(id) {
            Some(existing) if existing.is_session_kind() => {
                apply(existing, update);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.read().map_err(|_| poisoned())?.as_deref() {
            Some(message) => Err(CoreError::Store(message.to_string())),
            None => Ok(()),
        }
    }
}

fn apply(session: &mut Session, update: &SessionUpdate) {
    session.user_id = update.user_id.clone();
    session.updated_at = update.updated_at.clone();
}

fn poisoned() -> CoreError {
    CoreError::Store("memory table lock poisoned".to_string())
}
