use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use crate::config::GatewayConfig;
use crate::errors::GatewayError;
use crate::models::AssistantRequest;
use crate::service::assistant_service::AssistantService;

use super::{error_response, origin_decision, raw_origin, with_cors};

/// POST `/api/nova/assistant` — the chat-driven outfit flow. The orchestrator
/// is infallible past this point: engine trouble comes back as a `clarify`
/// reply, so the only error statuses here are the origin and body checks.
pub async fn assistant_handler(
    State(svc): State<AssistantService>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let config = GatewayConfig::from_env();
    let decision = origin_decision(&headers, &config);
    if !decision.is_allowed() {
        info!("[nova] assistant rejected origin");
        let err = GatewayError::OriginRejected { origin: raw_origin(&headers) };
        return error_response(&err, "", &decision);
    }

    let request: AssistantRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            info!("[nova] assistant malformed body: {e}");
            return error_response(&GatewayError::invalid_body(e.to_string()), "", &decision);
        }
    };
    if request.message.trim().is_empty() {
        let err = GatewayError::invalid_body("message cannot be empty");
        return error_response(&err, "", &decision);
    }

    let reply = svc.respond(request).await;
    with_cors(Json(reply).into_response(), &decision)
}
