//! HTTP route handlers for the API
//!
//! The session routes do no work of their own: they repackage the request
//! as a gateway event, run the shared [`SessionHandler`](crate::handlers::SessionHandler)
//! and copy its response back out.

use super::AppState;
use crate::event::{ApiGatewayEvent, ApiResponse, HttpContext, RequestContext};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;

// ============================================================================
// Health Check
// ============================================================================

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.handler.store().backend_name(),
    }))
}

// ============================================================================
// Sessions
// ============================================================================

/// `/session` — create (POST); other methods fall through to the handler's routing
pub async fn session_collection(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    let event = to_event(method, uri, None, query, body);
    into_http(state.handler.handle(&event).await)
}

/// `/session/:session_id` — read (GET) and update (PATCH)
pub async fn session_item(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Path(session_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: String,
) -> Response {
    let event = to_event(method, uri, Some(session_id), query, body);
    into_http(state.handler.handle(&event).await)
}

fn to_event(
    method: Method,
    uri: Uri,
    session_id: Option<String>,
    query: HashMap<String, String>,
    body: String,
) -> ApiGatewayEvent {
    ApiGatewayEvent {
        request_context: RequestContext {
            http: HttpContext {
                method: method.as_str().to_string(),
                path: Some(uri.path().to_string()),
            },
        },
        path_parameters: session_id
            .map(|id| HashMap::from([("sessionId".to_string(), id)])),
        query_string_parameters: (!query.is_empty()).then_some(query),
        body: (!body.is_empty()).then_some(body),
        is_base64_encoded: false,
    }
}

fn into_http(response: ApiResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http = (status, response.body).into_response();

    for (name, value) in &response.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                http.headers_mut().insert(name, value);
            }
            _ => tracing::warn!("Dropping invalid response header {}: {}", name, value),
        }
    }

    http
}
