//! TOML configuration file loading
//!
//! Supports `~/.config/route-narrator/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults
//! and environment variables take precedence over it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NarratorConfigFile {
    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Narrative (LLM) configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Text-to-speech configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// Geocoding service configuration
    #[serde(default)]
    pub geocoder: GeocoderFileConfig,

    /// Routing service configuration
    #[serde(default)]
    pub router: RouterFileConfig,

    /// Waypoint and trigger tuning
    #[serde(default)]
    pub navigation: NavigationFileConfig,

    /// Timeouts and retries for outbound calls
    #[serde(default)]
    pub http: HttpFileConfig,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiKeysFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openrouteservice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevenlabs: Option<String>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LlmFileConfig {
    /// Provider ("gemini" or "openai")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Model identifier (e.g. "gemini-1.5-flash-8b")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Text-to-speech configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TtsFileConfig {
    /// Provider ("openai" or "elevenlabs")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Voice identifier (e.g. "alloy", or an ElevenLabs voice ID)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Speed multiplier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

/// Geocoding service configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeocoderFileConfig {
    /// Nominatim base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// User-Agent sent to Nominatim (required by its usage policy)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Routing service configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RouterFileConfig {
    /// OpenRouteService base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Routing profile (e.g. "driving-car")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Waypoint and trigger tuning
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NavigationFileConfig {
    /// Trigger distance in degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Number of points of interest to ask for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poi_count: Option<usize>,

    /// Maximum route points included in the prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_prompt_points: Option<usize>,

    /// Directory where synthesized audio is written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_dir: Option<String>,
}

/// Timeouts and retries for outbound calls
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HttpFileConfig {
    /// Per-call timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Retries on rate limits and server errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

/// Load the TOML config file from the standard path
///
/// Returns `NarratorConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> NarratorConfigFile {
    config_file_path().map_or_else(NarratorConfigFile::default, |path| {
        load_config_file_from(&path)
    })
}

/// Load a TOML config file from an explicit path, falling back to defaults
pub fn load_config_file_from(path: &Path) -> NarratorConfigFile {
    if !path.exists() {
        return NarratorConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                NarratorConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            NarratorConfigFile::default()
        }
    }
}

/// Serialize and write a config file, creating parent directories
///
/// # Errors
///
/// Returns error if the directory or file cannot be written
pub fn write_config_file(path: &Path, config: &NarratorConfigFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml = toml::to_string_pretty(config)
        .map_err(|e| crate::Error::Config(format!("failed to serialize config: {e}")))?;
    std::fs::write(path, toml)?;

    Ok(())
}

/// Return the config file path: `~/.config/route-narrator/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("route-narrator").join("config.toml"))
}
