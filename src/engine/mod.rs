//! External collaborator seams: the outfit recommendation engine and the
//! current-season helper. The gateway calls these through narrow interfaces
//! and never implements the scoring itself.

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use tracing::error;

use crate::errors::GatewayError;
use crate::models::{Product, Profile, Season};

/// Narrow interface to the external recommendation engine:
/// `(profile, count, season) -> products`.
#[async_trait]
pub trait RecommendationEngine: Send + Sync {
    async fn recommend(
        &self,
        profile: &Profile,
        count: usize,
        season: Season,
    ) -> Result<Vec<Product>, GatewayError>;
}

/// HTTP client for the recommendation service.
#[derive(Debug, Clone)]
pub struct HttpRecommendationEngine {
    base_url: String,
}

impl HttpRecommendationEngine {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }
}

#[async_trait]
impl RecommendationEngine for HttpRecommendationEngine {
    async fn recommend(
        &self,
        profile: &Profile,
        count: usize,
        season: Season,
    ) -> Result<Vec<Product>, GatewayError> {
        let url = format!("{}/recommendations", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "profile": profile,
            "count": count,
            "season": season,
        });

        let response = reqwest::Client::new()
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("[nova] recommendation engine unreachable: {e}");
                GatewayError::EngineUnavailable { message: e.to_string() }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            error!("[nova] recommendation engine returned {status}");
            return Err(GatewayError::EngineUnavailable {
                message: format!("engine returned {status}"),
            });
        }

        response.json::<Vec<Product>>().await.map_err(|e| {
            error!("[nova] recommendation engine sent an invalid body: {e}");
            GatewayError::EngineUnavailable { message: e.to_string() }
        })
    }
}

/// Northern-hemisphere season for a calendar month (1-12).
pub fn season_for_month(month: u32) -> Season {
    match month {
        3..=5 => Season::Lente,
        6..=8 => Season::Zomer,
        9..=11 => Season::Herfst,
        _ => Season::Winter,
    }
}

/// The season right now, used when the utterance does not name one.
pub fn current_season() -> Season {
    season_for_month(Utc::now().month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_map_to_northern_hemisphere_seasons() {
        assert_eq!(season_for_month(1), Season::Winter);
        assert_eq!(season_for_month(3), Season::Lente);
        assert_eq!(season_for_month(5), Season::Lente);
        assert_eq!(season_for_month(6), Season::Zomer);
        assert_eq!(season_for_month(8), Season::Zomer);
        assert_eq!(season_for_month(9), Season::Herfst);
        assert_eq!(season_for_month(11), Season::Herfst);
        assert_eq!(season_for_month(12), Season::Winter);
    }
}
