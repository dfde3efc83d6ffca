//! Incremental decoder for the upstream provider's SSE byte stream.
//!
//! Raw chunks are buffered until a full newline-terminated record is
//! available, so a multi-byte UTF-8 sequence split across chunk boundaries is
//! carried over intact. Anything that is not a `data:` record with a parsable
//! JSON payload is dropped without terminating the stream.

use serde_json::Value;

/// The upstream end-of-stream sentinel. Consumed, never forwarded.
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one raw chunk and returns the content deltas completed by it,
    /// in upstream order. Incomplete trailing bytes stay buffered.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut deltas = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            // A complete line is always a whole UTF-8 sequence; invalid bytes
            // mean a corrupt record, which is dropped like any other
            // malformed fragment.
            if let Ok(text) = std::str::from_utf8(&line) {
                if let Some(delta) = decode_record(text) {
                    deltas.push(delta);
                }
            }
        }
        deltas
    }
}

/// Extracts the incremental text delta from one SSE record, if it carries one.
fn decode_record(line: &str) -> Option<String> {
    let payload = line.trim().strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == DONE_SENTINEL {
        return None;
    }
    let value: Value = serde_json::from_str(payload).ok()?;
    let delta = value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()?;
    if delta.is_empty() {
        None
    } else {
        Some(delta.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str) -> String {
        format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{content}\"}}}}]}}\n")
    }

    #[test]
    fn decodes_records_in_order() {
        let mut dec = SseDecoder::new();
        let input = format!("{}{}", record("Hal"), record("lo"));
        assert_eq!(dec.push(input.as_bytes()), vec!["Hal", "lo"]);
    }

    #[test]
    fn partial_record_waits_for_newline() {
        let mut dec = SseDecoder::new();
        let full = record("hoi");
        let (head, tail) = full.as_bytes().split_at(10);
        assert!(dec.push(head).is_empty());
        assert_eq!(dec.push(tail), vec!["hoi"]);
    }

    #[test]
    fn multibyte_utf8_split_across_chunks_survives() {
        let mut dec = SseDecoder::new();
        let full = record("caf\\u00e9 ☕");
        let bytes = full.as_bytes();
        // Split inside the multi-byte ☕ sequence
        let cut = full.find('☕').unwrap() + 1;
        assert!(dec.push(&bytes[..cut]).is_empty());
        assert_eq!(dec.push(&bytes[cut..]), vec!["café ☕"]);
    }

    #[test]
    fn done_sentinel_is_consumed_not_forwarded() {
        let mut dec = SseDecoder::new();
        let input = format!("{}data: [DONE]\n{}", record("a"), record("b"));
        assert_eq!(dec.push(input.as_bytes()), vec!["a", "b"]);
    }

    #[test]
    fn malformed_record_between_valid_ones_is_dropped() {
        let mut dec = SseDecoder::new();
        let input = format!("{}data: not-json\n{}", record("a"), record("b"));
        assert_eq!(dec.push(input.as_bytes()), vec!["a", "b"]);
    }

    #[test]
    fn comments_and_foreign_fields_are_ignored() {
        let mut dec = SseDecoder::new();
        let input = format!(":keep-alive\nevent: message\n\n{}", record("x"));
        assert_eq!(dec.push(input.as_bytes()), vec!["x"]);
    }

    #[test]
    fn crlf_line_endings_are_handled() {
        let mut dec = SseDecoder::new();
        let input = record("x").replace('\n', "\r\n");
        assert_eq!(dec.push(input.as_bytes()), vec!["x"]);
    }

    #[test]
    fn empty_delta_is_not_emitted() {
        let mut dec = SseDecoder::new();
        let input = format!("{}{}", record(""), record("y"));
        assert_eq!(dec.push(input.as_bytes()), vec!["y"]);
    }
}
