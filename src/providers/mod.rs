//! External collaborators
//!
//! Each collaborator sits behind a narrow trait so the planner and session
//! never touch HTTP directly. Every request attempt carries an explicit
//! deadline and every failure is typed per collaborator; retries, when
//! configured, happen here and nowhere else.
//!
//! Available implementations:
//! - Nominatim for geocoding and place suggestions
//! - `OpenRouteService` for driving routes
//! - Gemini or `OpenAI` for the route narrative
//! - `OpenAI` or `ElevenLabs` for speech

mod geocoder;
mod narrative;
mod router;
mod speech;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{Config, LlmProvider, TtsProviderKind};
use crate::geo::{Coordinate, Route};
use crate::poi::AudioClip;
use crate::{Error, Result};

pub use geocoder::NominatimGeocoder;
pub use narrative::NarrativeClient;
pub use router::OpenRouteServiceRouter;
pub use speech::TextToSpeech;

/// A geocoding match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Human-readable name of the match
    pub name: String,
    /// Location of the match
    pub coordinate: Coordinate,
}

/// Resolves place names to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a name to its best match
    ///
    /// Returns `Error::NotFound` when nothing matches.
    async fn geocode(&self, name: &str) -> Result<Coordinate>;

    /// Up to `limit` candidate places for a partial query (autocomplete)
    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Place>>;
}

/// Produces a driving route between two points
#[async_trait]
pub trait Router: Send + Sync {
    /// Route from `start` to `end`
    async fn route(&self, start: Coordinate, end: Coordinate) -> Result<Route>;
}

/// Completes a prompt with free text
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Complete `prompt`
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Converts text to audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`
    async fn synthesize(&self, text: &str) -> Result<AudioClip>;
}

/// Build an HTTP client with the given per-request timeout
///
/// # Errors
///
/// Returns error if the TLS backend cannot be initialized
pub fn http_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?)
}

/// Expose a configured key, or fail naming the variable that provides it
///
/// # Errors
///
/// Returns `Error::Config` if the key is not configured
pub fn require_key<'a>(key: Option<&'a SecretString>, env_var: &str) -> Result<&'a str> {
    key.map(|k| k.expose_secret())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Error::Config(format!("missing API key: set {env_var}")))
}

/// Key for the configured narrative provider
///
/// # Errors
///
/// Returns `Error::Config` if the provider's key is not configured
pub fn llm_key(config: &Config) -> Result<&str> {
    match config.llm.provider {
        LlmProvider::Gemini => require_key(config.api_keys.gemini.as_ref(), "GEMINI_API_KEY"),
        LlmProvider::OpenAi => require_key(config.api_keys.openai.as_ref(), "OPENAI_API_KEY"),
    }
}

/// Build the configured speech synthesizer
///
/// # Errors
///
/// Returns `Error::Config` if the provider's key is not configured
pub fn speech_from_config(config: &Config) -> Result<TextToSpeech> {
    let key = match config.tts.provider {
        TtsProviderKind::OpenAi => require_key(config.api_keys.openai.as_ref(), "OPENAI_API_KEY")?,
        TtsProviderKind::ElevenLabs => {
            require_key(config.api_keys.elevenlabs.as_ref(), "ELEVENLABS_API_KEY")?
        }
    };
    TextToSpeech::new(key, &config.tts, config.http)
}

/// Read an error response into a short message
async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", truncate(body, 300))
    }
}

/// Decode a JSON body, reporting an unreadable one as `fail`
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    service: &str,
    fail: fn(String) -> Error,
) -> Result<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| fail(format!("{service} response could not be read: {e}")))?;
    parse_json(&body, service, fail)
}

fn parse_json<T: DeserializeOwned>(
    body: &[u8],
    service: &str,
    fail: fn(String) -> Error,
) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        let snippet = String::from_utf8_lossy(body);
        fail(format!(
            "unexpected {service} response ({e}): {}",
            truncate(snippet.trim(), 120)
        ))
    })
}

fn truncate(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(i, _)| &text[..i])
}
