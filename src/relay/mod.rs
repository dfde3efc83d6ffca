//! Streaming relay between the upstream LLM provider and the browser.
//!
//! The relay runs as a spawned task and is the single producer on a bounded
//! channel; the HTTP layer drains that channel into the outbound SSE body.
//! Backpressure is the channel itself: the next upstream chunk is only read
//! once the previous events have been handed off. When the client disconnects
//! the receiver drops, the next send fails, and the task returns — releasing
//! the upstream connection with it.

mod decoder;

pub use decoder::SseDecoder;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::errors::GatewayError;
use crate::models::{ChatMessage, Mode, StreamEvent};

/// Upstream response body preview carried in `error` events.
const ERROR_DETAIL_MAX_CHARS: usize = 300;

const TEMPERATURE: f64 = 0.7;

/// Everything the relay needs for one upstream call. `messages` already
/// carries the synthesized system message at the front. No Debug: the api
/// key must not end up in logs.
pub struct RelayRequest {
    pub mode: Mode,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub trace_id: String,
    pub api_key: String,
    pub upstream_url: String,
}

// ── State machine ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayState {
    Idle,
    Connecting,
    Streaming,
    Closing(Close),
}

/// How a relay ended. `Error` still terminates with a `done` event; on
/// `Cancelled` the client is gone and nothing more can be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Close {
    Done,
    Error,
    Cancelled,
}

fn transition(state: &mut RelayState, next: RelayState, trace_id: &str) {
    debug!("[nova] {trace_id} relay {state:?} -> {next:?}");
    *state = next;
}

/// Sends one event to the outbound channel. `false` means the client has
/// disconnected and the relay should stop.
async fn send(tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> bool {
    tx.send(event).await.is_ok()
}

// ── Relay task ───────────────────────────────────────────────────────────────

/// Drives one request end to end: `meta` first, then either the streamed
/// chunks or a classified error, always terminated by exactly one `done`.
pub async fn run(request: RelayRequest, tx: mpsc::Sender<StreamEvent>) {
    let mut state = RelayState::Idle;

    // Idle → Connecting: meta goes out before the upstream call resolves so
    // the client can render a typing indicator without waiting on the
    // provider's latency.
    transition(&mut state, RelayState::Connecting, &request.trace_id);
    let meta = StreamEvent::Meta {
        mode: request.mode,
        model: request.model.clone(),
        trace_id: request.trace_id.clone(),
    };
    if !send(&tx, meta).await {
        transition(&mut state, RelayState::Closing(Close::Cancelled), &request.trace_id);
        return;
    }

    let close = match connect(&request).await {
        Ok(response) => {
            transition(&mut state, RelayState::Streaming, &request.trace_id);
            pump(response.bytes_stream().boxed(), &tx, &request.trace_id).await
        }
        Err(GatewayError::UpstreamRejected { status, detail }) => {
            warn!("[nova] {} upstream error {status}: {detail}", request.trace_id);
            emit_error(&tx, "upstream error", Some(detail), &request.trace_id).await
        }
        Err(err) => {
            warn!("[nova] {} {err}", request.trace_id);
            emit_error(&tx, "network error", None, &request.trace_id).await
        }
    };
    transition(&mut state, RelayState::Closing(close), &request.trace_id);
}

/// One upstream chat-completion call. A fresh client per request: the gateway
/// holds no cross-request connection pool, so rotated credentials and DNS
/// changes apply immediately.
async fn connect(request: &RelayRequest) -> Result<reqwest::Response, GatewayError> {
    let body = serde_json::json!({
        "model": request.model,
        "messages": request.messages,
        "stream": true,
        "temperature": TEMPERATURE,
    });

    let response = reqwest::Client::new()
        .post(&request.upstream_url)
        .bearer_auth(&request.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| GatewayError::UpstreamNetwork { message: e.to_string() })?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(GatewayError::UpstreamRejected {
            status: status.as_u16(),
            detail: truncate(&detail),
        });
    }
    Ok(response)
}

/// Reads the upstream byte stream to completion, forwarding each decoded
/// delta as a `chunk` event. Returns how the stream closed; the terminating
/// `done` (and any `error`) is emitted here.
async fn pump<S, E>(mut upstream: S, tx: &mpsc::Sender<StreamEvent>, trace_id: &str) -> Close
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut decoder = SseDecoder::new();

    while let Some(item) = upstream.next().await {
        match item {
            Ok(chunk) => {
                for delta in decoder.push(&chunk) {
                    if !send(tx, StreamEvent::Chunk { delta }).await {
                        return Close::Cancelled;
                    }
                }
            }
            Err(e) => {
                warn!("[nova] {trace_id} mid-stream transport error: {e}");
                return emit_error(tx, "network error", None, trace_id).await;
            }
        }
    }

    if send(tx, StreamEvent::Done).await {
        Close::Done
    } else {
        Close::Cancelled
    }
}

/// Emits a classified `error` event immediately followed by the terminating
/// `done`. No raw exception text leaves the gateway.
async fn emit_error(
    tx: &mpsc::Sender<StreamEvent>,
    message: &str,
    detail: Option<String>,
    trace_id: &str,
) -> Close {
    let error = StreamEvent::Error {
        message: message.to_string(),
        detail,
        trace_id: trace_id.to_string(),
    };
    if !send(tx, error).await {
        return Close::Cancelled;
    }
    if !send(tx, StreamEvent::Done).await {
        return Close::Cancelled;
    }
    Close::Error
}

fn truncate(text: &str) -> String {
    text.chars().take(ERROR_DETAIL_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn record(content: &str) -> Bytes {
        Bytes::from(format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{content}\"}}}}]}}\n\n"
        ))
    }

    async fn collect(
        chunks: Vec<Result<Bytes, &'static str>>,
    ) -> (Vec<StreamEvent>, Close) {
        let (tx, mut rx) = mpsc::channel(1);
        let upstream = stream::iter(chunks);
        let pump_task =
            tokio::spawn(async move { pump(upstream, &tx, "trace-test").await });

        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        (events, pump_task.await.unwrap())
    }

    fn deltas(events: &[StreamEvent]) -> String {
        events
            .iter()
            .filter_map(|ev| match ev {
                StreamEvent::Chunk { delta } => Some(delta.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn concatenation_law_holds() {
        let (events, close) = collect(vec![
            Ok(record("Draag ")),
            Ok(record("een ")),
            Ok(record("blazer")),
            Ok(Bytes::from_static(b"data: [DONE]\n\n")),
        ])
        .await;

        assert_eq!(close, Close::Done);
        assert_eq!(deltas(&events), "Draag een blazer");
        assert_eq!(events.last(), Some(&StreamEvent::Done));
        let done_count = events.iter().filter(|e| **e == StreamEvent::Done).count();
        assert_eq!(done_count, 1);
    }

    #[tokio::test]
    async fn malformed_fragment_does_not_interrupt_delivery() {
        let (events, close) = collect(vec![
            Ok(record("a")),
            Ok(Bytes::from_static(b"data: not-json\n\n")),
            Ok(record("b")),
        ])
        .await;

        assert_eq!(close, Close::Done);
        assert_eq!(deltas(&events), "ab");
    }

    #[tokio::test]
    async fn transport_error_yields_error_then_done_and_nothing_after() {
        let (events, close) =
            collect(vec![Ok(record("deel")), Err("connection reset")]).await;

        assert_eq!(close, Close::Error);
        assert_eq!(deltas(&events), "deel");

        let n = events.len();
        assert!(matches!(
            events[n - 2],
            StreamEvent::Error { ref message, .. } if message == "network error"
        ));
        assert_eq!(events[n - 1], StreamEvent::Done);
    }

    #[tokio::test]
    async fn delta_split_across_reads_is_reassembled() {
        let full = record("café");
        let cut = full.len() - 4;
        let (events, close) = collect(vec![
            Ok(full.slice(..cut)),
            Ok(full.slice(cut..)),
        ])
        .await;

        assert_eq!(close, Close::Done);
        assert_eq!(deltas(&events), "café");
    }

    #[tokio::test]
    async fn client_disconnect_stops_the_pump() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let upstream =
            stream::iter(vec![Ok::<_, &'static str>(record("a")), Ok(record("b"))]);
        let close = pump(upstream, &tx, "trace-test").await;
        assert_eq!(close, Close::Cancelled);
    }
}
