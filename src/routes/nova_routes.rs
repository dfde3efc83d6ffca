use std::convert::Infallible;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::{stream, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::errors::GatewayError;
use crate::models::{
    ChatMessage, FallbackResponse, Mode, NovaRequest, Role, StreamEvent,
};
use crate::origin::OriginDecision;
use crate::relay::{self, RelayRequest};
use crate::router;

use super::{
    accepts_event_stream, error_response, origin_decision, preflight, raw_origin, with_cors,
};

/// Comment heartbeat cadence while a stream is idle.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

const FALLBACK_CONTENT: &str = "Nova (fallback): streaming niet actief.";

/// OPTIONS — CORS preflight, short-circuits before any other processing.
/// Shared by the gateway and assistant endpoints.
pub async fn preflight_handler(headers: HeaderMap) -> Response {
    let config = GatewayConfig::from_env();
    let decision = origin_decision(&headers, &config);
    preflight(&decision)
}

/// GET `/api/nova` — health probe: reports whether an upstream key is present
/// without revealing it.
pub async fn health_handler(headers: HeaderMap) -> Response {
    let config = GatewayConfig::from_env();
    let decision = origin_decision(&headers, &config);
    if !decision.is_allowed() {
        let err = GatewayError::OriginRejected { origin: raw_origin(&headers) };
        return error_response(&err, "", &decision);
    }
    let body = serde_json::json!({
        "ok": true,
        "service": "nova",
        "hasKey": config.api_key.is_some(),
    });
    with_cors(Json(body).into_response(), &decision)
}

/// POST `/api/nova` — the streaming gateway. Relays one upstream chat
/// completion as the gateway's own SSE vocabulary, or answers with the JSON
/// fallback when the client does not consume event streams.
pub async fn nova_handler(headers: HeaderMap, body: Bytes) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let config = GatewayConfig::from_env();

    let decision = origin_decision(&headers, &config);
    if !decision.is_allowed() {
        info!("[nova] {trace_id} rejected origin");
        let err = GatewayError::OriginRejected { origin: raw_origin(&headers) };
        return error_response(&err, &trace_id, &decision);
    }

    let request: NovaRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            info!("[nova] {trace_id} malformed body: {e}");
            return error_response(&GatewayError::invalid_body(e.to_string()), &trace_id, &decision);
        }
    };
    if request.messages.is_empty() {
        info!("[nova] {trace_id} empty message list");
        return error_response(&GatewayError::EmptyMessages, &trace_id, &decision);
    }

    let mode = Mode::parse_lossy(&request.mode);
    let route = router::route(mode, &config);
    let wants_stream = accepts_event_stream(&headers) && request.stream != Some(false);

    // Key check comes before the fallback so a misconfigured deploy surfaces
    // as an error, not as a quiet placeholder reply.
    let Some(api_key) = config.api_key.clone() else {
        error!("[nova] {trace_id} missing OPENAI_API_KEY");
        if wants_stream {
            let events = vec![
                StreamEvent::Error {
                    message: "missing OPENAI_API_KEY".to_string(),
                    detail: None,
                    trace_id: trace_id.clone(),
                },
                StreamEvent::Done,
            ];
            return sse_response(stream::iter(events), &decision);
        }
        return error_response(&GatewayError::MissingApiKey, &trace_id, &decision);
    };

    if !wants_stream {
        let fallback = FallbackResponse {
            model: route.model,
            content: FALLBACK_CONTENT.to_string(),
            trace_id,
        };
        return with_cors(Json(fallback).into_response(), &decision);
    }

    // The system message is synthesized here; anything the caller labeled
    // `system` is dropped rather than trusted.
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(ChatMessage::system(route.system_prompt));
    messages.extend(
        request
            .messages
            .into_iter()
            .filter(|m| m.role != Role::System),
    );

    let relay_request = RelayRequest {
        mode,
        model: route.model,
        messages,
        trace_id,
        api_key,
        upstream_url: config.upstream_url,
    };

    // Single-producer channel: the relay task is the only writer, and the
    // capacity of one read-then-forward couples outbound delivery to the
    // upstream read loop.
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(relay::run(relay_request, tx));
    sse_response(ReceiverStream::new(rx), &decision)
}

// ── Response shaping ─────────────────────────────────────────────────────────

/// Encodes one gateway event as an SSE `data:` record payload.
fn encode(event: &StreamEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("[nova] failed to encode stream event: {e}");
            None
        }
    }
}

/// Wraps a gateway event stream as the SSE response: `data: <json>` records,
/// a 15s `:ping` comment heartbeat while idle, and the streaming headers on
/// top of the computed CORS origin.
fn sse_response<S>(events: S, decision: &OriginDecision) -> Response
where
    S: Stream<Item = StreamEvent> + Send + 'static,
{
    let records = events
        .filter_map(|event| async move { encode(&event) })
        .map(|data| Ok::<_, Infallible>(Event::default().data(data)));

    let sse = Sse::new(records).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("ping"),
    );

    let mut resp = sse.into_response();
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream; charset=utf-8"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-transform"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    with_cors(resp, decision)
}
