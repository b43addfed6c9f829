//! Lambda runtime integration.
//!
//! Polls the Lambda Runtime API for gateway events and answers each one
//! with the session handler's proxy response.

use crate::event::{ApiGatewayEvent, ApiResponse};
use crate::handlers::SessionHandler;
use lambda_runtime::{service_fn, Error, LambdaEvent};

/// Set by the Lambda execution environment
pub const RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

/// Whether the process runs inside a Lambda execution environment
pub fn is_lambda_environment() -> bool {
    std::env::var_os(RUNTIME_API_ENV).is_some()
}

/// Handle one invocation. Handler failures are already folded into the
/// response, so this never returns `Err`.
pub async fn handle_event(
    handler: &SessionHandler,
    event: LambdaEvent<ApiGatewayEvent>,
) -> Result<ApiResponse, Error> {
    let (payload, context) = event.into_parts();
    tracing::debug!(request_id = %context.request_id, "Handling invocation");
    Ok(handler.handle(&payload).await)
}

/// Serve invocations until the runtime shuts the process down
pub async fn run(handler: SessionHandler) -> Result<(), Error> {
    lambda_runtime::run(service_fn(move |event: LambdaEvent<ApiGatewayEvent>| {
        let handler = handler.clone();
        async move { handle_event(&handler, event).await }
    }))
    .await
}
