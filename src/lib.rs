//! Route Narrator - points of interest along a driving route, spoken as you reach them
//!
//! This library provides the pieces of the narrator pipeline:
//! - Geocoding, routing, narrative (LLM) and speech collaborators
//! - Waypoint extraction from the narrator's free-text answer
//! - Proximity triggering against a simulated position
//! - A caller-owned navigation session
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                        CLI                           │
//! │    plan  │  navigate  │  extract  │  suggest  │ ...  │
//! └─────────────────────────┬────────────────────────────┘
//!                           │
//! ┌─────────────────────────▼────────────────────────────┐
//! │                  Planner / RouteSession              │
//! │  prompt  │  extract  │  trigger  │  cursor  │ audio  │
//! └─────────────────────────┬────────────────────────────┘
//!                           │
//! ┌─────────────────────────▼────────────────────────────┐
//! │                     Providers                        │
//! │ Nominatim │ OpenRouteService │ Gemini/OpenAI │ TTS   │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod geo;
pub mod planner;
pub mod poi;
pub mod prompt;
pub mod providers;
pub mod retry;
pub mod session;
pub mod setup;

pub use config::Config;
pub use error::{Error, Result};
pub use geo::{Coordinate, NavigationCursor, Route};
pub use planner::{Planner, PlannerOptions};
pub use poi::{
    AudioClip, DEFAULT_TRIGGER_THRESHOLD, Extraction, Waypoint, extract, extract_waypoints,
    planar_distance, trigger, trigger_indices,
};
pub use providers::{Geocoder, NarrativeGenerator, Place, Router, SpeechSynthesizer};
pub use retry::RetryPolicy;
pub use session::{RouteSession, SessionSummary, WaypointSummary};
