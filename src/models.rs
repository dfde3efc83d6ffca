use serde::{Deserialize, Serialize};

// ── Conversation mode ────────────────────────────────────────────────────────

/// The declared purpose of a conversation. Selects the upstream model and the
/// persona prompt; immutable for the lifetime of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Outfits,
    Archetype,
    Shop,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Outfits => "outfits",
            Mode::Archetype => "archetype",
            Mode::Shop => "shop",
        }
    }

    /// Coerces a caller-declared mode string. Unknown values fall back to
    /// `Outfits`; this never fails.
    pub fn parse_lossy(s: &str) -> Mode {
        match s.trim().to_lowercase().as_str() {
            "archetype" => Mode::Archetype,
            "shop" => Mode::Shop,
            _ => Mode::Outfits,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Chat messages ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
}

// ── Gateway wire types ───────────────────────────────────────────────────────

/// POST body of the gateway endpoint.
#[derive(Debug, Deserialize)]
pub struct NovaRequest {
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub stream: Option<bool>,
}

/// Single-shot JSON reply when the client does not consume SSE.
#[derive(Debug, Serialize)]
pub struct FallbackResponse {
    pub model: String,
    pub content: String,
    #[serde(rename = "traceId")]
    pub trace_id: String,
}

/// The gateway's own SSE event vocabulary, independent of the upstream
/// provider's event shape. Every stream terminates with exactly one `Done`,
/// and an `Error` is always immediately followed by `Done`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Meta {
        mode: Mode,
        model: String,
        #[serde(rename = "traceId")]
        trace_id: String,
    },
    Chunk {
        delta: String,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        #[serde(rename = "traceId")]
        trace_id: String,
    },
    Done,
}

// ── Parsed user utterances ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "outfit.request")]
    OutfitRequest,
    #[serde(rename = "outfit.refine")]
    OutfitRefine,
    #[serde(rename = "info.capabilities")]
    Capabilities,
    #[serde(rename = "smalltalk")]
    Smalltalk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleLevel {
    #[serde(rename = "casual")]
    Casual,
    #[serde(rename = "smart casual")]
    SmartCasual,
    #[serde(rename = "formeel")]
    Formeel,
}

impl StyleLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleLevel::Casual => "casual",
            StyleLevel::SmartCasual => "smart casual",
            StyleLevel::Formeel => "formeel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Lente,
    Zomer,
    Herfst,
    Winter,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Lente => "lente",
            Season::Zomer => "zomer",
            Season::Herfst => "herfst",
            Season::Winter => "winter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Neutral,
}

/// Classification of a single inbound utterance plus its extracted slots.
/// Produced once per utterance; immutable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuery {
    pub intent: Intent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_level: Option<StyleLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    pub colors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

impl ParsedQuery {
    /// A query with the given intent and no slots.
    pub fn bare(intent: Intent) -> Self {
        Self {
            intent,
            style_level: None,
            season: None,
            occasion: None,
            colors: Vec::new(),
            gender: None,
        }
    }

    /// True when at least one slot was extracted from the utterance.
    pub fn has_signal(&self) -> bool {
        self.style_level.is_some()
            || self.season.is_some()
            || self.occasion.is_some()
            || !self.colors.is_empty()
    }
}

// ── Chat-assistant types ─────────────────────────────────────────────────────

/// User style profile as known to the recommendation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub archetypes: Vec<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self { gender: Gender::Neutral, archetypes: Vec::new() }
    }
}

/// POST body of the chat-assistant endpoint.
#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
    pub profile: Option<Profile>,
    pub gender: Option<Gender>,
    pub season: Option<Season>,
}

/// A catalog item returned by the external recommendation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub affiliate_url: Option<String>,
    #[serde(default)]
    pub archetype: Option<String>,
}

/// Display-ready outfit suggestion, annotated with the parsed slots as tags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitCard {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

/// Reply union of the chat-assistant endpoint.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AssistantReply {
    Outfits { reply: String, outfits: Vec<OutfitCard> },
    Text { reply: String },
    Clarify { reply: String, options: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_is_coerced_to_outfits() {
        assert_eq!(Mode::parse_lossy("outfits"), Mode::Outfits);
        assert_eq!(Mode::parse_lossy("Archetype"), Mode::Archetype);
        assert_eq!(Mode::parse_lossy("shop"), Mode::Shop);
        assert_eq!(Mode::parse_lossy("styling"), Mode::Outfits);
        assert_eq!(Mode::parse_lossy(""), Mode::Outfits);
    }

    #[test]
    fn stream_events_serialize_with_type_tag() {
        let meta = StreamEvent::Meta {
            mode: Mode::Outfits,
            model: "gpt-4o".to_string(),
            trace_id: "t-1".to_string(),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "meta");
        assert_eq!(json["mode"], "outfits");
        assert_eq!(json["traceId"], "t-1");

        let done = serde_json::to_value(StreamEvent::Done).unwrap();
        assert_eq!(done, serde_json::json!({"type": "done"}));
    }

    #[test]
    fn error_event_omits_empty_detail() {
        let err = StreamEvent::Error {
            message: "upstream error".to_string(),
            detail: None,
            trace_id: "t-2".to_string(),
        };
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("detail"));
    }
}
