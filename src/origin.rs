//! Origin allow-list enforcement.
//!
//! Every response path carries `Access-Control-Allow-Origin`: the caller's own
//! origin when it is recognized, otherwise the fixed default front-end origin.
//! An unrecognized origin is never reflected back and `*` is never emitted.

/// Immutable allow-list policy, built from configuration at request entry.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    origins: Vec<String>,
}

/// Outcome of checking one request's `Origin` header. Both variants carry the
/// header value to emit, so every response path sets CORS the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    Allowed(String),
    Rejected(String),
}

impl OriginDecision {
    /// The `Access-Control-Allow-Origin` value for this response.
    pub fn allow_header(&self) -> &str {
        match self {
            OriginDecision::Allowed(origin) => origin,
            OriginDecision::Rejected(default) => default,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, OriginDecision::Allowed(_))
    }
}

impl OriginPolicy {
    pub fn new(origins: Vec<String>) -> Self {
        Self { origins }
    }

    fn default_origin(&self) -> &str {
        self.origins.first().map(String::as_str).unwrap_or("")
    }

    /// Checks a request's declared origin against the allow-list. Deploy
    /// previews (`https://*.netlify.app`) are accepted alongside the fixed
    /// members.
    pub fn resolve(&self, origin: Option<&str>) -> OriginDecision {
        let Some(origin) = origin else {
            return OriginDecision::Rejected(self.default_origin().to_string());
        };

        if self.origins.iter().any(|o| o == origin) {
            return OriginDecision::Allowed(origin.to_string());
        }
        if is_preview_origin(origin) {
            return OriginDecision::Allowed(origin.to_string());
        }
        OriginDecision::Rejected(self.default_origin().to_string())
    }
}

fn is_preview_origin(origin: &str) -> bool {
    let host = origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"));
    match host {
        Some(host) => {
            let host = host.split(['/', ':']).next().unwrap_or("");
            host.ends_with(".netlify.app") && host.len() > ".netlify.app".len()
        }
        None => false,
    }
}
