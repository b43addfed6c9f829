//! Invocation types for the session handler.
//!
//! The handler speaks the API Gateway HTTP API (payload v2) proxy shape:
//! only the fields it reads are modeled, everything else in the event is
//! ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Inbound HTTP-shaped request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayEvent {
    #[serde(default)]
    pub request_context: RequestContext,

    /// Route parameters, e.g. `sessionId`. Absent when the route has none.
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,

    /// Query string parameters. Absent when the request has no query string.
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default)]
    pub http: HttpContext,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpContext {
    #[serde(default)]
    pub method: String,

    #[serde(default)]
    pub path: Option<String>,
}

impl ApiGatewayEvent {
    /// Build an event for `method` with no parameters
    pub fn new(method: &str) -> Self {
        ApiGatewayEvent {
            request_context: RequestContext {
                http: HttpContext {
                    method: method.to_string(),
                    path: None,
                },
            },
            ..Default::default()
        }
    }

    pub fn with_path_parameter(mut self, key: &str, value: &str) -> Self {
        self.path_parameters
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_query_parameter(mut self, key: &str, value: &str) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Upper-cased request method
    pub fn method(&self) -> String {
        self.request_context.http.method.to_ascii_uppercase()
    }

    pub fn path_parameter(&self, key: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|p| p.get(key))
            .map(String::as_str)
    }

    pub fn query_parameter(&self, key: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|q| q.get(key))
            .map(String::as_str)
    }

    /// Look up `key` in the query string, then in a JSON object body.
    /// Empty strings count as absent.
    pub fn param(&self, key: &str) -> Option<String> {
        if let Some(value) = self.query_parameter(key).filter(|v| !v.is_empty()) {
            return Some(value.to_string());
        }

        // Base64 bodies are not decoded; clients of this API send plain JSON
        if self.is_base64_encoded {
            tracing::debug!("Skipping base64-encoded body while looking up {}", key);
            return None;
        }

        let body: serde_json::Value = serde_json::from_str(self.body.as_deref()?).ok()?;
        body.get(key)
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Outbound proxy response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ApiResponse {
    /// JSON response; every response carries the permissive CORS headers
    pub fn json<T: Serialize>(status_code: u16, body: &T) -> Self {
        let body = serde_json::to_string(body).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize response body: {}", e);
            String::from("null")
        });

        let headers = [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Headers", "*"),
            ("Content-Type", "application/json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        ApiResponse {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    /// `{"message": ...}` body
    pub fn message(status_code: u16, message: &str) -> Self {
        Self::json(status_code, &serde_json::json!({ "message": message }))
    }

    /// Parse the body back as JSON (tests, CLI output)
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_gateway_event() {
        let raw = r#"{
            "version": "2.0",
            "routeKey": "GET /session/{sessionId}",
            "rawPath": "/session/abc",
            "requestContext": {
                "accountId": "123456789012",
                "http": { "method": "GET", "path": "/session/abc", "sourceIp": "1.2.3.4" }
            },
            "pathParameters": { "sessionId": "abc" },
            "isBase64Encoded": false
        }"#;

        let event: ApiGatewayEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.method(), "GET");
        assert_eq!(event.path_parameter("sessionId"), Some("abc"));
        assert!(event.query_string_parameters.is_none());
        assert_eq!(event.param("userId"), None);
    }

    #[test]
    fn test_param_prefers_query_then_body() {
        let event = ApiGatewayEvent::new("post")
            .with_query_parameter("userId", "from-query")
            .with_body(r#"{"userId":"from-body"}"#);
        assert_eq!(event.method(), "POST");
        assert_eq!(event.param("userId").as_deref(), Some("from-query"));

        let event = ApiGatewayEvent::new("POST").with_body(r#"{"userId":"from-body"}"#);
        assert_eq!(event.param("userId").as_deref(), Some("from-body"));

        let event = ApiGatewayEvent::new("POST").with_query_parameter("userId", "");
        assert_eq!(event.param("userId"), None);

        let event = ApiGatewayEvent::new("POST").with_body("not json");
        assert_eq!(event.param("userId"), None);
    }

    #[test]
    fn test_base64_body_is_not_read() {
        let mut event = ApiGatewayEvent::new("POST").with_body(r#"{"userId":"u1"}"#);
        event.is_base64_encoded = true;
        assert_eq!(event.param("userId"), None);

        // Query string still applies
        let event = event.with_query_parameter("userId", "u2");
        assert_eq!(event.param("userId").as_deref(), Some("u2"));
    }

    #[test]
    fn test_response_shape() {
        let response = ApiResponse::message(400, "Invalid input");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["statusCode"], 400);
        assert_eq!(json["headers"]["Access-Control-Allow-Origin"], "*");
        assert_eq!(json["headers"]["Access-Control-Allow-Headers"], "*");
        assert_eq!(json["body"], r#"{"message":"Invalid input"}"#);
        assert_eq!(json["isBase64Encoded"], false);
    }
}
