//! HTTP API module for the session store
//!
//! Serves the session handler over plain HTTP for local development and
//! container deployments.

mod auth;
pub mod routes;

use crate::error::{CoreError, Result};
use crate::handlers::SessionHandler;

use axum::{middleware, routing::{any, get}, Router};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Session handler (owns the store client)
    pub handler: SessionHandler,
    pub api_key: Option<String>,
}

/// Start the HTTP API server
pub async fn serve(addr: SocketAddr, handler: SessionHandler, api_key: Option<String>) -> Result<()> {
    let state = AppState { handler, api_key };
    let app = create_router(state);

    // Check if port is already in use (another instance running)
    if tokio::net::TcpStream::connect(addr).await.is_ok() {
        tracing::error!(
            "Port {} is already in use — another sessionstore instance may be running. \
             Use `curl http://{}/health` to check.",
            addr.port(),
            addr
        );
        return Err(CoreError::Api(format!("Port {} already in use", addr.port())));
    }

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CoreError::Api(e.to_string()))?;

    Ok(())
}

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    // Preflight for the browser storefront; the handler adds the same headers itself
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let session_routes = Router::new()
        .route("/session", any(routes::session_collection))
        .route("/session/:session_id", any(routes::session_item))
        .route("/sessions", any(routes::session_collection))
        .route("/sessions/:session_id", any(routes::session_item))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        // Health check (public, no auth required)
        .route("/health", get(routes::health))
        .merge(session_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryTable, SessionStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(api_key: Option<&str>) -> (Router, Arc<MemoryTable>) {
        let table = Arc::new(MemoryTable::new());
        let state = AppState {
            handler: SessionHandler::new(SessionStore::Memory(table.clone())),
            api_key: api_key.map(str::to_string),
        };
        (create_router(state), table)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(None);
        let (status, body) = send(&app, request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "memory");
    }

    #[tokio::test]
    async fn test_create_read_update_over_http() {
        let (app, _) = app(None);

        let (status, created) = send(&app, request("POST", "/session?userId=u1")).await;
        assert_eq!(status, StatusCode::OK);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["userId"], "u1");

        let (status, fetched) = send(&app, request("GET", &format!("/session/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, message) = send(
            &app,
            request("PATCH", &format!("/sessions/{}?userId=u2", id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message, "Session updated successfully!");

        let (_, fetched) = send(&app, request("GET", &format!("/session/{}", id))).await;
        assert_eq!(fetched["userId"], "u2");
        assert_eq!(fetched["createdAt"], created["createdAt"]);
    }

    #[tokio::test]
    async fn test_create_with_json_body() {
        let (app, _) = app(None);
        let request = Request::builder()
            .method("POST")
            .uri("/session")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"userId":"u7"}"#))
            .unwrap();

        let (status, created) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["userId"], "u7");
    }

    #[tokio::test]
    async fn test_get_without_id_and_bad_method() {
        let (app, table) = app(None);

        let (status, body) = send(&app, request("GET", "/session")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Session ID is required");

        let (status, body) = send(&app, request("DELETE", "/session/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid input");

        assert_eq!(table.call_count(), 0);
    }

    #[tokio::test]
    async fn test_responses_carry_cors_headers() {
        let (app, _) = app(None);
        let response = app
            .clone()
            .oneshot(request("GET", "/session"))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_api_key_required() {
        let (app, table) = app(Some("secret"));

        let (status, _) = send(&app, request("POST", "/session")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let wrong = Request::builder()
            .method("POST")
            .uri("/session")
            .header("Authorization", "Bearer nope")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, wrong).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid API key");
        assert_eq!(table.call_count(), 0);

        let right = Request::builder()
            .method("POST")
            .uri("/session")
            .header("Authorization", "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, right).await;
        assert_eq!(status, StatusCode::OK);

        // Health stays public
        let (status, _) = send(&app, request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
