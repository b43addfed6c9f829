//! Authentication middleware for API key validation

use super::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// Authentication middleware
///
/// If `api_key` is configured in AppState, validates the Authorization header.
/// Expected format: `Authorization: Bearer <api_key>`
///
/// If no `api_key` is configured, all requests are allowed (the gateway in
/// front of the function is expected to do the checking).
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected_key) = &state.api_key else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    match auth_header.map(bearer_token) {
        Some(Some(provided_key)) if provided_key == expected_key.as_str() => next.run(request).await,
        Some(Some(_)) => unauthorized("Invalid API key"),
        Some(None) => {
            unauthorized("Invalid Authorization header format. Expected: Bearer <api_key>")
        }
        None => unauthorized("API key required. Set Authorization: Bearer <api_key>"),
    }
}

/// Token part of a `Bearer <token>` header value
fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Headers", "*"),
        ],
        Json(serde_json::json!({ "message": message })),
    )
        .into_response()
}
