pub mod assistant_routes;
pub mod nova_routes;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::config::GatewayConfig;
use crate::errors::GatewayError;
use crate::origin::{OriginDecision, OriginPolicy};

const ALLOW_HEADERS: &str = "content-type, x-fitfi-tier, x-fitfi-uid";
const ALLOW_METHODS: &str = "POST, OPTIONS";

/// Resolves the request's `Origin` header against the configured allow-list.
pub(crate) fn origin_decision(headers: &HeaderMap, config: &GatewayConfig) -> OriginDecision {
    let policy = OriginPolicy::new(config.allowed_origins.clone());
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    policy.resolve(origin)
}

/// CORS preflight reply. Always 204 with the computed headers, regardless of
/// origin validity: the browser needs them to make its own decision.
pub(crate) fn preflight(decision: &OriginDecision) -> Response {
    let mut resp = StatusCode::NO_CONTENT.into_response();
    let headers = resp.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        allow_origin_value(decision),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    resp
}

/// Stamps `Access-Control-Allow-Origin` on a response; used on every
/// non-preflight path, success or failure.
pub(crate) fn with_cors(mut resp: Response, decision: &OriginDecision) -> Response {
    resp.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        allow_origin_value(decision),
    );
    resp
}

/// Maps a classified error to its response: 403 for rejected origins (fails
/// closed before any body parsing), 400 plain text for malformed input, and
/// 500 JSON `{error, traceId}` for anything internal that happens before a
/// stream starts. CORS is stamped on every path.
pub(crate) fn error_response(
    err: &GatewayError,
    trace_id: &str,
    decision: &OriginDecision,
) -> Response {
    let resp = if err.is_origin_rejected() {
        (StatusCode::FORBIDDEN, "Forbidden: origin not allowed").into_response()
    } else if err.is_bad_request() {
        (StatusCode::BAD_REQUEST, "Bad request").into_response()
    } else {
        let body = serde_json::json!({
            "error": err.to_string(),
            "traceId": trace_id,
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    };
    with_cors(resp, decision)
}

/// The raw `Origin` header, for error reporting.
pub(crate) fn raw_origin(headers: &HeaderMap) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("<missing>")
        .to_string()
}

/// True when the client's `Accept` header admits an SSE response.
pub(crate) fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("text/event-stream"))
}

fn allow_origin_value(decision: &OriginDecision) -> HeaderValue {
    // Allow-list entries are operator-supplied; a value that cannot be a
    // header falls back to an explicit non-origin rather than reflection.
    HeaderValue::from_str(decision.allow_header())
        .unwrap_or_else(|_| HeaderValue::from_static("null"))
}
