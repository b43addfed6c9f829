//! Sessionstore - session record service for the storefront
//!
//! Every visitor gets a server-side session record (`id`, `userId`,
//! `createdAt`, `updatedAt`); the front end starts one, reads it back, and
//! attaches the signed-in user to it later. This crate provides:
//! - The session handler: method-routed create/read/update against one table
//! - Two table backends: SQLite (durable) and in-memory
//! - A Lambda function entry point (gateway event in, proxy response out)
//! - An HTTP server for running the handler directly
//!
//! # Usage
//!
//! As a library:
//! ```ignore
//! use sessionstore::{ApiGatewayEvent, Config, Core};
//!
//! let core = Core::new(Config::default()).unwrap();
//! let response = core.handler().handle(&ApiGatewayEvent::new("POST")).await;
//! ```
//!
//! As a standalone server (CLI):
//! ```text
//! sessionstore --config ~/.sessionstore/config.toml
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod event;
pub mod handlers;
pub mod lambda;
pub mod session;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use error::{CoreError, Result};
pub use event::{ApiGatewayEvent, ApiResponse};
pub use handlers::SessionHandler;
pub use session::Session;
pub use store::SessionStore;

/// Core service: configuration plus the handler wired to its store
pub struct Core {
    /// Configuration
    pub config: Config,

    handler: SessionHandler,
}

impl Core {
    /// Create a new Core instance with the store selected by `config`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let store = SessionStore::from_config(&config)?;
        Ok(Self::with_store(config, store))
    }

    /// Create a Core instance around an existing store (tests, embedding)
    pub fn with_store(config: Config, store: SessionStore) -> Self {
        let handler = SessionHandler::new(store).with_update_mode(config.session.update_mode);
        Core { config, handler }
    }

    /// The session handler
    pub fn handler(&self) -> &SessionHandler {
        &self.handler
    }

    /// Run one invocation from a raw gateway event (JSON)
    pub async fn invoke(&self, event_json: &str) -> Result<ApiResponse> {
        let event: ApiGatewayEvent = serde_json::from_str(event_json)?;
        Ok(self.handler.handle(&event).await)
    }

    /// Serve Lambda invocations from the Runtime API (blocks until shutdown)
    pub async fn run_lambda(&self) -> Result<()> {
        tracing::info!(
            "Starting Lambda runtime (table {}, backend {})",
            self.config.table.table_name(),
            self.handler.store().backend_name()
        );
        lambda::run(self.handler.clone())
            .await
            .map_err(|e| CoreError::Api(format!("Lambda runtime failed: {}", e)))
    }

    /// Start the HTTP API server (blocks until shutdown)
    pub async fn start_api_server(&self) -> Result<()> {
        let addr = self.config.server_addr();
        tracing::info!(
            "Starting API server on {} (table {}, backend {})",
            addr,
            self.config.table.table_name(),
            self.handler.store().backend_name()
        );
        api::serve(addr, self.handler.clone(), self.config.server.api_key.clone()).await
    }
}
