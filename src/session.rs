//! Navigation session state
//!
//! A `RouteSession` holds everything produced for one planned route: the
//! route itself, the extracted waypoints, the simulated position, and any
//! audio synthesized so far. The caller owns it and replaces it wholesale
//! when a new route is planned, so a failed plan never disturbs the current
//! one.

use serde::Serialize;
use uuid::Uuid;

use crate::geo::{Coordinate, NavigationCursor, Route};
use crate::poi::{AudioClip, Extraction, Waypoint, trigger, trigger_indices};
use crate::providers::SpeechSynthesizer;
use crate::{Error, Result};

/// State of one planned route
#[derive(Debug)]
pub struct RouteSession {
    id: Uuid,
    start_label: String,
    end_label: String,
    route: Route,
    narrative: String,
    waypoints: Vec<Waypoint>,
    skipped: usize,
    cursor: NavigationCursor,
    threshold: f64,
}

/// Serializable overview of a session
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    /// Session identifier
    pub id: Uuid,
    /// Start location as entered
    pub start: String,
    /// End location as entered
    pub end: String,
    /// Number of route points
    pub route_points: usize,
    /// Current cursor index
    pub position_index: usize,
    /// Coordinate at the cursor
    pub position: Coordinate,
    /// Trigger distance in degrees
    pub threshold: f64,
    /// Narrative blocks dropped for unusable coordinates
    pub skipped: usize,
    /// Extracted waypoints
    pub waypoints: Vec<WaypointSummary>,
}

/// Serializable overview of a waypoint
#[derive(Debug, Serialize)]
pub struct WaypointSummary {
    /// Position in the narrative
    pub index: usize,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Narrative text
    pub description: String,
    /// Whether audio has been synthesized
    pub has_audio: bool,
    /// Whether the current position is within the trigger distance
    pub reached: bool,
}

impl RouteSession {
    /// Create a session positioned at the start of `route`
    #[must_use]
    pub fn new(
        start_label: impl Into<String>,
        end_label: impl Into<String>,
        route: Route,
        narrative: impl Into<String>,
        extraction: Extraction,
        threshold: f64,
    ) -> Self {
        let cursor = NavigationCursor::new(route.len());
        Self {
            id: Uuid::new_v4(),
            start_label: start_label.into(),
            end_label: end_label.into(),
            route,
            narrative: narrative.into(),
            waypoints: extraction.waypoints,
            skipped: extraction.skipped,
            cursor,
            threshold,
        }
    }

    /// Session identifier
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Start location as entered
    #[must_use]
    pub fn start_label(&self) -> &str {
        &self.start_label
    }

    /// End location as entered
    #[must_use]
    pub fn end_label(&self) -> &str {
        &self.end_label
    }

    /// The planned route
    #[must_use]
    pub const fn route(&self) -> &Route {
        &self.route
    }

    /// Raw narrator text the waypoints were parsed from
    #[must_use]
    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    /// Extracted waypoints in route order
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Narrative blocks dropped for unusable coordinates
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Trigger distance in degrees
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Simulated position cursor
    #[must_use]
    pub const fn cursor(&self) -> NavigationCursor {
        self.cursor
    }

    /// Coordinate at the cursor
    #[must_use]
    pub fn position(&self) -> Coordinate {
        self.route.points()[self.cursor.index()]
    }

    /// Jump to route point `index` and return the indices of reached waypoints
    ///
    /// # Errors
    ///
    /// Returns error if `index` is outside the route; the position is unchanged
    pub fn move_to(&mut self, index: usize) -> Result<Vec<usize>> {
        self.cursor.set(index)?;
        Ok(self.reached_indices())
    }

    /// Move forward `step` points (stopping at the end)
    pub fn step_forward(&mut self, step: usize) -> Vec<usize> {
        self.cursor.advance(step);
        self.reached_indices()
    }

    /// Move back `step` points (stopping at the start)
    pub fn step_back(&mut self, step: usize) -> Vec<usize> {
        self.cursor.retreat(step);
        self.reached_indices()
    }

    /// Waypoints within the trigger distance of the current position
    ///
    /// Nothing is remembered between calls; a waypoint fires every time
    /// the position is near it.
    #[must_use]
    pub fn reached(&self) -> Vec<&Waypoint> {
        trigger(self.position(), &self.waypoints, self.threshold)
    }

    /// Indices of waypoints within the trigger distance of the current position
    #[must_use]
    pub fn reached_indices(&self) -> Vec<usize> {
        trigger_indices(self.position(), &self.waypoints, self.threshold)
    }

    /// Audio for waypoint `index`, synthesizing it on first request
    ///
    /// # Errors
    ///
    /// Returns error if the waypoint doesn't exist or synthesis fails; a
    /// failed synthesis leaves the waypoint without audio so it can be retried
    pub async fn audio_for(
        &self,
        index: usize,
        synthesizer: &dyn SpeechSynthesizer,
    ) -> Result<&AudioClip> {
        let waypoint = self
            .waypoints
            .get(index)
            .ok_or_else(|| Error::NotFound(format!("waypoint {index}")))?;

        if let Some(clip) = waypoint.audio() {
            return Ok(clip);
        }

        let clip = synthesizer.synthesize(waypoint.description()).await?;
        tracing::debug!(waypoint = index, bytes = clip.len(), "audio cached");
        waypoint.set_audio(clip);

        waypoint
            .audio()
            .ok_or_else(|| Error::Tts(format!("audio for waypoint {index} was not stored")))
    }

    /// Serializable overview
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        let reached = self.reached_indices();
        SessionSummary {
            id: self.id,
            start: self.start_label.clone(),
            end: self.end_label.clone(),
            route_points: self.route.len(),
            position_index: self.cursor.index(),
            position: self.position(),
            threshold: self.threshold,
            skipped: self.skipped,
            waypoints: self
                .waypoints
                .iter()
                .enumerate()
                .map(|(index, w)| WaypointSummary {
                    index,
                    lat: w.lat(),
                    lon: w.lon(),
                    description: w.description().to_string(),
                    has_audio: w.audio().is_some(),
                    reached: reached.contains(&index),
                })
                .collect(),
        }
    }
}
