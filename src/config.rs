use crate::models::Mode;

const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_ENGINE_URL: &str = "http://localhost:8090";

/// Front-end origins allowed by default when `NOVA_ALLOWED_ORIGINS` is unset.
/// The first entry doubles as the fallback CORS origin for rejected callers.
const DEFAULT_ORIGINS: [&str; 4] = [
    "https://www.fitfi.ai",
    "https://fitfi.ai",
    "https://fitfi.netlify.app",
    "http://localhost:5173",
];

/// Runtime configuration, read from the environment on every request so that
/// rotated credentials and model overrides take effect without a restart.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub upstream_url: String,
    pub model_outfits: Option<String>,
    pub model_archetype: Option<String>,
    pub model_shop: Option<String>,
    pub allowed_origins: Vec<String>,
    pub engine_url: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let allowed_origins = match std::env::var("NOVA_ALLOWED_ORIGINS") {
            Ok(csv) => {
                let origins: Vec<String> = csv
                    .split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect();
                if origins.is_empty() {
                    DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect()
                } else {
                    origins
                }
            }
            Err(_) => DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            upstream_url: std::env::var("NOVA_UPSTREAM_URL")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string()),
            model_outfits: std::env::var("NOVA_MODEL_OUTFITS").ok(),
            model_archetype: std::env::var("NOVA_MODEL_ARCHETYPE").ok(),
            model_shop: std::env::var("NOVA_MODEL_SHOP").ok(),
            allowed_origins,
            engine_url: std::env::var("NOVA_ENGINE_URL")
                .unwrap_or_else(|_| DEFAULT_ENGINE_URL.to_string()),
        }
    }

    /// Configured model override for a mode, if any.
    pub fn model_override(&self, mode: Mode) -> Option<&str> {
        match mode {
            Mode::Outfits => self.model_outfits.as_deref(),
            Mode::Archetype => self.model_archetype.as_deref(),
            Mode::Shop => self.model_shop.as_deref(),
        }
    }
}
