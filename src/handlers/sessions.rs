//! Session handling logic
//!
//! One entry point, [`SessionHandler::handle`], routes on the HTTP method:
//!
//! | Method | Operation |
//! |--------|-----------|
//! | POST   | create a session, optional `userId` |
//! | GET    | read the session named by the `sessionId` path parameter |
//! | PATCH  | set `userId` and `updatedAt` on that session |
//! | other  | 400 `Invalid input` |
//!
//! Store failures are logged and answered with a generic 500; the
//! underlying error never reaches the client.

use crate::config::UpdateMode;
use crate::error::{CoreError, Result};
use crate::event::{ApiGatewayEvent, ApiResponse};
use crate::session::{format_timestamp, Clock, Session, SystemClock};
use crate::store::{SessionStore, SessionUpdate};
use std::sync::Arc;

const SESSION_ID_PARAM: &str = "sessionId";
const USER_ID_PARAM: &str = "userId";

pub const MSG_SESSION_ID_REQUIRED: &str = "Session ID is required";
pub const MSG_SESSION_NOT_FOUND: &str = "Session not found";
pub const MSG_INVALID_INPUT: &str = "Invalid input";
pub const MSG_CREATE_FAILED: &str = "Error creating session";
pub const MSG_GET_FAILED: &str = "Error getting session";
pub const MSG_UPDATE_FAILED: &str = "Error updating session";
pub const MSG_UPDATED: &str = "Session updated successfully!";

/// Session handler for business logic
#[derive(Clone)]
pub struct SessionHandler {
    store: SessionStore,
    clock: Arc<dyn Clock>,
    update_mode: UpdateMode,
}

impl SessionHandler {
    pub fn new(store: SessionStore) -> Self {
        SessionHandler {
            store,
            clock: Arc::new(SystemClock),
            update_mode: UpdateMode::default(),
        }
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_update_mode(mut self, update_mode: UpdateMode) -> Self {
        self.update_mode = update_mode;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Translate one request into exactly one store operation
    pub async fn handle(&self, event: &ApiGatewayEvent) -> ApiResponse {
        tracing::debug!(
            "EVENT: {}",
            serde_json::to_string(event).unwrap_or_default()
        );

        let session_id = event
            .path_parameter(SESSION_ID_PARAM)
            .filter(|id| !id.is_empty());
        let user_id = event.param(USER_ID_PARAM);

        match event.method().as_str() {
            "POST" => self.handle_create(user_id).await,
            "GET" => match session_id {
                Some(id) => self.handle_get(id).await,
                None => ApiResponse::message(400, MSG_SESSION_ID_REQUIRED),
            },
            "PATCH" => match session_id {
                Some(id) => self.handle_update(id, user_id).await,
                None => ApiResponse::message(400, MSG_SESSION_ID_REQUIRED),
            },
            other => {
                tracing::debug!("Rejecting unsupported method {:?}", other);
                ApiResponse::message(400, MSG_INVALID_INPUT)
            }
        }
    }

    async fn handle_create(&self, user_id: Option<String>) -> ApiResponse {
        match self.create(user_id).await {
            Ok(session) => ApiResponse::json(200, &session),
            Err(e) => {
                tracing::error!("Error creating session: {}", e);
                ApiResponse::message(500, MSG_CREATE_FAILED)
            }
        }
    }

    async fn handle_get(&self, session_id: &str) -> ApiResponse {
        match self.get(session_id).await {
            Ok(Some(session)) => ApiResponse::json(200, &session),
            Ok(None) => ApiResponse::message(404, MSG_SESSION_NOT_FOUND),
            Err(e) => {
                tracing::error!("Error getting session {}: {}", session_id, e);
                ApiResponse::message(500, MSG_GET_FAILED)
            }
        }
    }

    async fn handle_update(&self, session_id: &str, user_id: Option<String>) -> ApiResponse {
        let result = match self.update_mode {
            UpdateMode::Upsert => self.upsert(session_id, user_id).await,
            UpdateMode::UpdateOnly => self.update_existing(session_id, user_id).await,
        };

        match result {
            Ok(()) => ApiResponse::json(200, &MSG_UPDATED),
            Err(CoreError::NotFound(..)) => ApiResponse::message(404, MSG_SESSION_NOT_FOUND),
            Err(e) => {
                tracing::error!("Error updating session {}: {}", session_id, e);
                ApiResponse::message(500, MSG_UPDATE_FAILED)
            }
        }
    }

    /// Start a new session. `createdAt == updatedAt` on the returned record.
    pub async fn create(&self, user_id: Option<String>) -> Result<Session> {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Session::new(id, user_id, self.clock.now());

        self.store.put_item(&session).await?;
        tracing::info!(
            "Created session {} ({})",
            session.id,
            if session.is_anonymous() { "anonymous" } else { "signed in" }
        );
        Ok(session)
    }

    /// Fetch a session; `Ok(None)` when no item has this id
    pub async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        if session_id.is_empty() {
            return Err(CoreError::Validation(MSG_SESSION_ID_REQUIRED.to_string()));
        }
        self.store.get_item(session_id).await
    }

    /// Set the session's user and bump `updatedAt`, writing a partial item
    /// if the id is unknown. Last write wins. Ids held by another entity kind
    /// are reported as `NotFound` and left untouched.
    pub async fn upsert(&self, session_id: &str, user_id: Option<String>) -> Result<()> {
        let update = self.update_for(session_id, user_id)?;
        if self.store.upsert_attributes(session_id, &update).await? {
            tracing::debug!("Upserted session {}", session_id);
            Ok(())
        } else {
            tracing::debug!("Id {} belongs to another entity kind", session_id);
            Err(CoreError::NotFound("Session", session_id.to_string()))
        }
    }

    /// Like [`upsert`](Self::upsert) but fails with `NotFound` for unknown ids
    /// instead of writing anything.
    pub async fn update_existing(&self, session_id: &str, user_id: Option<String>) -> Result<()> {
        let update = self.update_for(session_id, user_id)?;
        if self.store.update_attributes(session_id, &update).await? {
            tracing::debug!("Updated session {}", session_id);
            Ok(())
        } else {
            Err(CoreError::NotFound("Session", session_id.to_string()))
        }
    }

    fn update_for(&self, session_id: &str, user_id: Option<String>) -> Result<SessionUpdate> {
        if session_id.is_empty() {
            return Err(CoreError::Validation(MSG_SESSION_ID_REQUIRED.to_string()));
        }
        Ok(SessionUpdate {
            user_id,
            updated_at: format_timestamp(self.clock.now()),
        })
    }
}
