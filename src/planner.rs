//! Route planning pipeline
//!
//! geocode start and end → route → narrate → extract waypoints. Each stage
//! runs once, in order; the first failure ends the plan.

use std::sync::Arc;

use crate::config::{Config, NavigationConfig};
use crate::poi::extract;
use crate::prompt::narrative_prompt;
use crate::providers::{
    Geocoder, NarrativeClient, NarrativeGenerator, NominatimGeocoder, OpenRouteServiceRouter,
    Router,
};
use crate::session::RouteSession;
use crate::{Error, Result};

/// Tuning for a plan
#[derive(Debug, Clone, Copy)]
pub struct PlannerOptions {
    /// Points of interest to ask for
    pub poi_count: usize,
    /// Maximum route points included in the prompt
    pub max_prompt_points: usize,
    /// Trigger distance in degrees
    pub threshold: f64,
}

impl From<&NavigationConfig> for PlannerOptions {
    fn from(config: &NavigationConfig) -> Self {
        Self {
            poi_count: config.poi_count,
            max_prompt_points: config.max_prompt_points,
            threshold: config.threshold,
        }
    }
}

/// Builds route sessions from two place names
pub struct Planner {
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn Router>,
    narrator: Arc<dyn NarrativeGenerator>,
    options: PlannerOptions,
}

impl Planner {
    /// Create a planner from its collaborators
    #[must_use]
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        router: Arc<dyn Router>,
        narrator: Arc<dyn NarrativeGenerator>,
        options: PlannerOptions,
    ) -> Self {
        Self {
            geocoder,
            router,
            narrator,
            options,
        }
    }

    /// Create a planner using the configured HTTP services
    ///
    /// # Errors
    ///
    /// Returns error if a required API key is missing
    pub fn from_config(config: &Config) -> Result<Self> {
        let geocoder = NominatimGeocoder::new(&config.geocoder, config.http)?;

        let ors_key = crate::providers::require_key(
            config.api_keys.openrouteservice.as_ref(),
            "ORS_API_KEY",
        )?;
        let router = OpenRouteServiceRouter::new(ors_key, &config.router, config.http)?;

        let llm_key = crate::providers::llm_key(config)?;
        let narrator = NarrativeClient::new(llm_key, &config.llm, config.http)?;

        Ok(Self::new(
            Arc::new(geocoder),
            Arc::new(router),
            Arc::new(narrator),
            PlannerOptions::from(&config.navigation),
        ))
    }

    /// The geocoder, for place suggestions
    #[must_use]
    pub fn geocoder(&self) -> &dyn Geocoder {
        self.geocoder.as_ref()
    }

    /// Plan a narrated route between two place names
    ///
    /// # Errors
    ///
    /// Returns error if either name is empty or any collaborator fails
    pub async fn plan(&self, start: &str, end: &str) -> Result<RouteSession> {
        let (start, end) = (start.trim(), end.trim());
        if start.is_empty() || end.is_empty() {
            return Err(Error::InvalidInput(
                "both start and end locations are required".to_string(),
            ));
        }

        tracing::info!(start, end, "planning route");

        let start_coords = self.geocoder.geocode(start).await?;
        let end_coords = self.geocoder.geocode(end).await?;
        tracing::debug!(%start_coords, %end_coords, "locations resolved");

        let route = self.router.route(start_coords, end_coords).await?;
        tracing::info!(points = route.len(), "route generated");

        let prompt = narrative_prompt(
            &route,
            self.options.poi_count,
            self.options.max_prompt_points,
        );
        let narrative = self.narrator.complete(&prompt).await?;

        let extraction = extract(&narrative);
        if extraction.is_empty() {
            tracing::warn!("narrative contained no usable points of interest");
        } else {
            tracing::info!(
                waypoints = extraction.waypoints.len(),
                skipped = extraction.skipped,
                "points of interest extracted"
            );
        }

        Ok(RouteSession::new(
            start,
            end,
            route,
            narrative,
            extraction,
            self.options.threshold,
        ))
    }
}
