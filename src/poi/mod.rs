//! Points of interest along a route
//!
//! Waypoints are parsed out of the narrator's free-text response and fire
//! when the simulated position comes close enough to them.

mod extract;
mod trigger;

use std::sync::OnceLock;

use base64::Engine;
use serde::Serialize;

use crate::geo::Coordinate;

pub use extract::{Extraction, extract, extract_waypoints};
pub use trigger::{DEFAULT_TRIGGER_THRESHOLD, planar_distance, trigger, trigger_indices};

/// Synthesized speech for a waypoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    bytes: Vec<u8>,
    mime: String,
}

impl AudioClip {
    /// Wrap raw audio bytes
    #[must_use]
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Wrap MP3 bytes
    #[must_use]
    pub fn mp3(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "audio/mpeg")
    }

    /// Raw audio bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// MIME type of the audio
    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the clip holds no audio
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Render as a `data:` URI suitable for embedding in HTML audio elements
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{encoded}", self.mime)
    }
}

/// One point of interest along a route
///
/// Coordinates are fixed once parsed. Audio is attached lazily, at most once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    lat: f64,
    lon: f64,
    description: String,
    #[serde(skip)]
    audio: OnceLock<AudioClip>,
}

impl Waypoint {
    /// Create a waypoint without audio
    #[must_use]
    pub fn new(lat: f64, lon: f64, description: impl Into<String>) -> Self {
        Self {
            lat,
            lon,
            description: description.into(),
            audio: OnceLock::new(),
        }
    }

    /// Latitude in degrees
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }

    /// Location as a coordinate
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    /// Narrative text for this waypoint (may be empty)
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Synthesized audio, if it has been produced
    #[must_use]
    pub fn audio(&self) -> Option<&AudioClip> {
        self.audio.get()
    }

    /// Attach synthesized audio
    ///
    /// Returns `false` and keeps the existing clip if audio was already set.
    pub fn set_audio(&self, clip: AudioClip) -> bool {
        self.audio.set(clip).is_ok()
    }
}
