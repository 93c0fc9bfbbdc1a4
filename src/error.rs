//! Error types for the route narrator

use std::time::Duration;

use thiserror::Error;

/// Result type alias for narrator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while planning or navigating a narrated route
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid user input (empty location names, bad arguments)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Geocoding error
    #[error("geocoding error: {0}")]
    Geocode(String),

    /// Routing error
    #[error("routing error: {0}")]
    Routing(String),

    /// Narrative generation (LLM) error
    #[error("narrative error: {0}")]
    Narrative(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// A collaborator call did not finish in time
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Name of the operation that timed out
        operation: &'static str,
        /// Configured limit
        after: Duration,
    },

    /// Navigation cursor moved outside the route
    #[error("position {index} is outside the route (length {len})")]
    CursorOutOfRange {
        /// Requested index
        index: usize,
        /// Route length
        len: usize,
    },

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
