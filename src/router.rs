use crate::config::GatewayConfig;
use crate::models::Mode;

/// Default models per mode. Outfit composition is the heavier generation task,
/// so it gets the more capable model.
const DEFAULT_MODEL_OUTFITS: &str = "gpt-4o";
const DEFAULT_MODEL_ARCHETYPE: &str = "gpt-4o-mini";
const DEFAULT_MODEL_SHOP: &str = "gpt-4o-mini";

const BASE_PROMPT: &str = "Je bent Nova, premium AI-stylist. Antwoord NL, kort en \
    duidelijk. Geen generieke welkomsttekst na een vraag. Max. 1 verduidelijking.";

/// Resolved model plus persona prompt for one request.
#[derive(Debug, Clone)]
pub struct RouteDecision {
    pub model: String,
    pub system_prompt: String,
}

/// Maps a conversation mode to an upstream model and persona instruction.
/// Model overrides come from the environment (`NOVA_MODEL_*`); the persona is
/// a shared base instruction plus a mode-specific block.
pub fn route(mode: Mode, config: &GatewayConfig) -> RouteDecision {
    let default_model = match mode {
        Mode::Outfits => DEFAULT_MODEL_OUTFITS,
        Mode::Archetype => DEFAULT_MODEL_ARCHETYPE,
        Mode::Shop => DEFAULT_MODEL_SHOP,
    };
    let model = config
        .model_override(mode)
        .unwrap_or(default_model)
        .to_string();

    let mode_block = match mode {
        Mode::Outfits => " Geef 3 outfits met titel, 1-2 bullets en 1 zin \"waarom\".",
        Mode::Archetype => " Leg archetype uit in 3 bullets + 1 do/don't.",
        Mode::Shop => " Geef 3-5 shoprichtingen met filters (fit, materiaal, kleur).",
    };

    RouteDecision {
        model,
        system_prompt: format!("{BASE_PROMPT}{mode_block}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_without_overrides() -> GatewayConfig {
        GatewayConfig {
            api_key: None,
            upstream_url: String::new(),
            model_outfits: None,
            model_archetype: None,
            model_shop: None,
            allowed_origins: vec![],
            engine_url: String::new(),
        }
    }

    #[test]
    fn outfits_gets_the_larger_default_model() {
        let cfg = config_without_overrides();
        assert_eq!(route(Mode::Outfits, &cfg).model, "gpt-4o");
        assert_eq!(route(Mode::Archetype, &cfg).model, "gpt-4o-mini");
        assert_eq!(route(Mode::Shop, &cfg).model, "gpt-4o-mini");
    }

    #[test]
    fn env_override_takes_precedence() {
        let mut cfg = config_without_overrides();
        cfg.model_shop = Some("gpt-4.1-nano".to_string());
        assert_eq!(route(Mode::Shop, &cfg).model, "gpt-4.1-nano");
        assert_eq!(route(Mode::Outfits, &cfg).model, "gpt-4o");
    }

    #[test]
    fn persona_combines_base_and_mode_block() {
        let cfg = config_without_overrides();
        let outfits = route(Mode::Outfits, &cfg).system_prompt;
        assert!(outfits.starts_with("Je bent Nova"));
        assert!(outfits.contains("3 outfits"));

        let shop = route(Mode::Shop, &cfg).system_prompt;
        assert!(shop.starts_with("Je bent Nova"));
        assert!(shop.contains("shoprichtingen"));
    }
}
