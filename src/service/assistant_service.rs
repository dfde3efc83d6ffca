use std::sync::Arc;

use tracing::warn;

use crate::engine::{current_season, RecommendationEngine};
use crate::models::{
    AssistantReply, AssistantRequest, Intent, OutfitCard, ParsedQuery, Product, Profile,
};
use crate::nlu;

const OUTFIT_COUNT: usize = 3;

const CAPABILITIES_REPLY: &str = "Je kunt me vragen om outfits voor een gelegenheid, \
    kleur of seizoen. Probeer: \"Outfit voor kantoor in zwart.\"";
const SMALLTALK_REPLY: &str =
    "Hey! Waar heb je zin in vandaag: een outfitadvies, of iets specifieks zoeken?";
const CLARIFY_REPLY: &str = "Ik kon zo snel geen passende outfits vinden. Zal ik het \
    met een van deze richtingen proberen?";
const CLARIFY_OPTIONS: [&str; 3] = [
    "Outfit voor kantoor in zwart",
    "Casual weekend look met sneakers",
    "Zomerse outfit in beige",
];

/// Orchestrates the chat-assistant flow: parse the utterance, answer the
/// conversational intents directly, and turn outfit intents into a
/// recommendation-engine call. Infallible: engine trouble degrades to a
/// clarify reply, never to an HTTP error.
#[derive(Clone)]
pub struct AssistantService {
    engine: Arc<dyn RecommendationEngine>,
}

impl AssistantService {
    pub fn new(engine: Arc<dyn RecommendationEngine>) -> Self {
        Self { engine }
    }

    pub async fn respond(&self, request: AssistantRequest) -> AssistantReply {
        let query = nlu::parse(&request.message);
        match query.intent {
            Intent::Capabilities => AssistantReply::Text { reply: CAPABILITIES_REPLY.to_string() },
            Intent::Smalltalk => AssistantReply::Text { reply: SMALLTALK_REPLY.to_string() },
            Intent::OutfitRequest | Intent::OutfitRefine => self.outfits(&request, &query).await,
        }
    }

    async fn outfits(&self, request: &AssistantRequest, query: &ParsedQuery) -> AssistantReply {
        let profile = resolve_profile(request, query);
        let season = query
            .season
            .or(request.season)
            .unwrap_or_else(current_season);

        match self.engine.recommend(&profile, OUTFIT_COUNT, season).await {
            Ok(products) if !products.is_empty() => {
                let tags = slot_tags(query);
                let outfits = products
                    .into_iter()
                    .map(|p| outfit_card(p, &tags))
                    .collect();
                AssistantReply::Outfits { reply: outfit_reply(query), outfits }
            }
            Ok(_) => {
                warn!("[nova] recommendation engine returned no items");
                clarify()
            }
            Err(e) => {
                warn!("[nova] recommendation engine failed, degrading to clarify: {e}");
                clarify()
            }
        }
    }
}

/// Explicit profile wins, then a supplied or parsed gender, then the neutral
/// default.
fn resolve_profile(request: &AssistantRequest, query: &ParsedQuery) -> Profile {
    if let Some(profile) = &request.profile {
        return profile.clone();
    }
    if let Some(gender) = request.gender.or(query.gender) {
        return Profile { gender, ..Profile::default() };
    }
    Profile::default()
}

/// The parsed slots, rendered as display tags on every card.
fn slot_tags(query: &ParsedQuery) -> Vec<String> {
    let mut tags = Vec::new();
    if let Some(level) = query.style_level {
        tags.push(level.as_str().to_string());
    }
    if let Some(occasion) = &query.occasion {
        tags.push(occasion.clone());
    }
    if let Some(season) = query.season {
        tags.push(season.as_str().to_string());
    }
    tags.extend(query.colors.iter().cloned());
    tags
}

fn outfit_card(product: Product, tags: &[String]) -> OutfitCard {
    OutfitCard {
        id: product.id,
        title: product.name,
        description: product.brand,
        image_url: product.image_url,
        tags: tags.to_vec(),
    }
}

fn outfit_reply(query: &ParsedQuery) -> String {
    let mut bits = Vec::new();
    if let Some(occasion) = &query.occasion {
        bits.push(format!("voor {occasion}"));
    }
    if !query.colors.is_empty() {
        bits.push(format!("in {}", query.colors.join(" & ")));
    }
    if bits.is_empty() {
        "Ik heb outfits gevonden die bij je stijl passen. Wil je er een opslaan of \
         meer variaties zien?"
            .to_string()
    } else {
        format!(
            "Ik heb outfits {} voor je gevonden. Wil je er een opslaan of meer \
             variaties zien?",
            bits.join(" ")
        )
    }
}

fn clarify() -> AssistantReply {
    AssistantReply::Clarify {
        reply: CLARIFY_REPLY.to_string(),
        options: CLARIFY_OPTIONS.iter().map(|o| o.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GatewayError;
    use crate::models::Season;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEngine {
        products: Vec<Product>,
        calls: AtomicUsize,
    }

    impl FixedEngine {
        fn returning(products: Vec<Product>) -> Arc<Self> {
            Arc::new(Self { products, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl RecommendationEngine for FixedEngine {
        async fn recommend(
            &self,
            _profile: &Profile,
            count: usize,
            _season: Season,
        ) -> Result<Vec<Product>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.products.iter().take(count).cloned().collect())
        }
    }

    struct FailingEngine;

    #[async_trait]
    impl RecommendationEngine for FailingEngine {
        async fn recommend(
            &self,
            _profile: &Profile,
            _count: usize,
            _season: Season,
        ) -> Result<Vec<Product>, GatewayError> {
            Err(GatewayError::EngineUnavailable { message: "down".to_string() })
        }
    }

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            brand: Some("FitFi".to_string()),
            price: Some(89.0),
            image_url: None,
            affiliate_url: None,
            archetype: Some("casual_chic".to_string()),
        }
    }

    fn request(message: &str) -> AssistantRequest {
        AssistantRequest {
            message: message.to_string(),
            profile: None,
            gender: None,
            season: None,
        }
    }

    #[tokio::test]
    async fn capabilities_gets_a_canned_reply_without_engine_call() {
        let engine = FixedEngine::returning(vec![product("p1", "Blazer")]);
        let svc = AssistantService::new(engine.clone());

        let reply = svc.respond(request("wat kan je")).await;
        match reply {
            AssistantReply::Text { reply } => assert!(reply.contains("outfits")),
            other => panic!("expected text reply, got {other:?}"),
        }
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn smalltalk_gets_a_canned_reply_without_engine_call() {
        let engine = FixedEngine::returning(vec![]);
        let svc = AssistantService::new(engine.clone());

        let reply = svc.respond(request("hoi")).await;
        assert!(matches!(reply, AssistantReply::Text { .. }));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn outfit_request_maps_products_to_tagged_cards() {
        let engine =
            FixedEngine::returning(vec![product("p1", "Blazer"), product("p2", "Chino")]);
        let svc = AssistantService::new(engine);

        let reply = svc
            .respond(request("smart casual zwart voor kantoor in zomer"))
            .await;
        match reply {
            AssistantReply::Outfits { reply, outfits } => {
                assert!(reply.contains("voor kantoor"));
                assert_eq!(outfits.len(), 2);
                let tags = &outfits[0].tags;
                assert!(tags.contains(&"smart casual".to_string()));
                assert!(tags.contains(&"kantoor".to_string()));
                assert!(tags.contains(&"zomer".to_string()));
                assert!(tags.contains(&"zwart".to_string()));
            }
            other => panic!("expected outfits reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn engine_failure_degrades_to_clarify_with_options() {
        let svc = AssistantService::new(Arc::new(FailingEngine));

        let reply = svc.respond(request("outfit voor kantoor")).await;
        match reply {
            AssistantReply::Clarify { options, .. } => {
                assert_eq!(options.len(), 3);
                assert!(options.iter().all(|o| !o.is_empty()));
            }
            other => panic!("expected clarify reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_items_also_degrades_to_clarify() {
        let svc = AssistantService::new(FixedEngine::returning(vec![]));

        let reply = svc.respond(request("outfit in bordeaux")).await;
        assert!(matches!(reply, AssistantReply::Clarify { .. }));
    }
}
