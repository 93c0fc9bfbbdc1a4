//! Configuration management for the route narrator

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::poi::DEFAULT_TRIGGER_THRESHOLD;
use crate::{Error, Result};

use file::NarratorConfigFile;

/// Route narrator configuration
#[derive(Debug)]
pub struct Config {
    /// API keys
    pub api_keys: ApiKeys,

    /// Geocoding service
    pub geocoder: GeocoderConfig,

    /// Routing service
    pub router: RouterConfig,

    /// Narrative generation
    pub llm: LlmConfig,

    /// Speech synthesis
    pub tts: TtsConfig,

    /// Waypoint and trigger tuning
    pub navigation: NavigationConfig,

    /// Timeouts and retries for every outbound call
    pub http: HttpConfig,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `OpenRouteService` key (routing)
    pub openrouteservice: Option<SecretString>,

    /// Google Gemini key (narrative)
    pub gemini: Option<SecretString>,

    /// `OpenAI` key (narrative and TTS)
    pub openai: Option<SecretString>,

    /// `ElevenLabs` key (optional TTS)
    pub elevenlabs: Option<SecretString>,
}

/// Geocoding service configuration
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Nominatim base URL
    pub base_url: String,

    /// User-Agent identifying this application
    pub user_agent: String,
}

/// Routing service configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// `OpenRouteService` base URL
    pub base_url: String,

    /// Routing profile
    pub profile: String,
}

/// Narrative (LLM) backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// Google Gemini `generateContent`
    Gemini,
    /// `OpenAI` chat completions
    OpenAi,
}

impl LlmProvider {
    /// Parse a provider name, case-insensitively
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    /// Model used when none is configured
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-1.5-flash-8b",
            Self::OpenAi => "gpt-4o-mini",
        }
    }
}

/// Narrative generation configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Backend
    pub provider: LlmProvider,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,
}

/// Speech synthesis backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProviderKind {
    /// `OpenAI` `/v1/audio/speech`
    OpenAi,
    /// `ElevenLabs` text-to-speech
    ElevenLabs,
}

impl TtsProviderKind {
    /// Parse a provider name, case-insensitively
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "elevenlabs" => Some(Self::ElevenLabs),
            _ => None,
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Backend
    pub provider: TtsProviderKind,

    /// Model identifier
    pub model: String,

    /// Voice identifier
    pub voice: String,

    /// Speed multiplier (`OpenAI` only, 0.25 to 4.0)
    pub speed: f32,
}

/// Waypoint and trigger tuning
#[derive(Debug, Clone)]
pub struct NavigationConfig {
    /// Trigger distance in degrees
    pub threshold: f64,

    /// Number of points of interest requested from the narrator
    pub poi_count: usize,

    /// Maximum route points included in the narrator prompt
    pub max_prompt_points: usize,

    /// Where synthesized audio is written, if anywhere
    pub audio_dir: Option<PathBuf>,
}

/// Timeouts and retries for outbound calls
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    /// Per-call timeout
    pub timeout: Duration,

    /// Retries on rate limits and server errors (0 = single attempt)
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 0,
        }
    }
}

impl Config {
    /// Load configuration from the config file and process environment
    ///
    /// # Errors
    ///
    /// Returns error if a setting has an invalid value
    pub fn load() -> Result<Self> {
        let file = file::load_config_file();
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed config file and an environment lookup
    ///
    /// Environment values take precedence over file values.
    ///
    /// # Errors
    ///
    /// Returns error if a setting has an invalid value
    pub fn from_sources<F>(file: NarratorConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, fallback: Option<String>| {
            env(key).filter(|v| !v.trim().is_empty()).or(fallback)
        };

        let api_keys = ApiKeys {
            openrouteservice: pick("ORS_API_KEY", file.api_keys.openrouteservice)
                .map(SecretString::from),
            gemini: pick("GEMINI_API_KEY", file.api_keys.gemini).map(SecretString::from),
            openai: pick("OPENAI_API_KEY", file.api_keys.openai).map(SecretString::from),
            elevenlabs: pick("ELEVENLABS_API_KEY", file.api_keys.elevenlabs)
                .map(SecretString::from),
        };

        let geocoder = GeocoderConfig {
            base_url: pick("NOMINATIM_URL", file.geocoder.url)
                .unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string()),
            user_agent: pick("NARRATOR_USER_AGENT", file.geocoder.user_agent).unwrap_or_else(
                || format!("route-narrator/{}", env!("CARGO_PKG_VERSION")),
            ),
        };

        let router = RouterConfig {
            base_url: pick("ORS_URL", file.router.url)
                .unwrap_or_else(|| "https://api.openrouteservice.org".to_string()),
            profile: file.router.profile.unwrap_or_else(|| "driving-car".to_string()),
        };

        let llm_provider = match pick("NARRATOR_LLM_PROVIDER", file.llm.provider) {
            Some(name) => LlmProvider::from_name(&name)
                .ok_or_else(|| Error::Config(format!("unknown LLM provider: {name}")))?,
            None => LlmProvider::Gemini,
        };
        let llm = LlmConfig {
            provider: llm_provider,
            model: pick("NARRATOR_LLM_MODEL", file.llm.model)
                .unwrap_or_else(|| llm_provider.default_model().to_string()),
            temperature: file.llm.temperature.unwrap_or(0.8),
        };

        let tts_provider = match pick("NARRATOR_TTS_PROVIDER", file.tts.provider) {
            Some(name) => TtsProviderKind::from_name(&name)
                .ok_or_else(|| Error::Config(format!("unknown TTS provider: {name}")))?,
            None => TtsProviderKind::OpenAi,
        };
        let tts = TtsConfig {
            provider: tts_provider,
            model: pick("NARRATOR_TTS_MODEL", file.tts.model).unwrap_or_else(|| {
                match tts_provider {
                    TtsProviderKind::OpenAi => "tts-1",
                    TtsProviderKind::ElevenLabs => "eleven_monolingual_v1",
                }
                .to_string()
            }),
            voice: pick("NARRATOR_TTS_VOICE", file.tts.voice).unwrap_or_else(|| {
                match tts_provider {
                    TtsProviderKind::OpenAi => "alloy",
                    // ElevenLabs "Rachel"
                    TtsProviderKind::ElevenLabs => "21m00Tcm4TlvDq8ikWAM",
                }
                .to_string()
            }),
            speed: file.tts.speed.unwrap_or(1.0),
        };

        let navigation = NavigationConfig {
            threshold: parse_env(&env, "NARRATOR_THRESHOLD")?
                .or(file.navigation.threshold)
                .unwrap_or(DEFAULT_TRIGGER_THRESHOLD),
            poi_count: parse_env(&env, "NARRATOR_POI_COUNT")?
                .or(file.navigation.poi_count)
                .unwrap_or(5),
            max_prompt_points: file.navigation.max_prompt_points.unwrap_or(50),
            audio_dir: pick("NARRATOR_AUDIO_DIR", file.navigation.audio_dir).map(PathBuf::from),
        };

        let http = HttpConfig {
            timeout: Duration::from_secs(
                parse_env(&env, "NARRATOR_TIMEOUT_SECS")?
                    .or(file.http.timeout_secs)
                    .unwrap_or(30),
            ),
            max_retries: parse_env(&env, "NARRATOR_MAX_RETRIES")?
                .or(file.http.max_retries)
                .unwrap_or(0),
        };

        let config = Self {
            api_keys,
            geocoder,
            router,
            llm,
            tts,
            navigation,
            http,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        let threshold = self.navigation.threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(Error::Config(format!(
                "trigger threshold must be positive, got {threshold}"
            )));
        }
        if self.navigation.poi_count == 0 {
            return Err(Error::Config("poi_count must be at least 1".to_string()));
        }
        if self.navigation.max_prompt_points < 2 {
            return Err(Error::Config(
                "max_prompt_points must be at least 2".to_string(),
            ));
        }
        if self.http.timeout.is_zero() {
            return Err(Error::Config("timeout must be non-zero".to_string()));
        }
        if !(0.25..=4.0).contains(&self.tts.speed) {
            return Err(Error::Config(format!(
                "TTS speed must be between 0.25 and 4.0, got {}",
                self.tts.speed
            )));
        }
        Ok(())
    }
}

fn parse_env<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid value for {key}: {v}")))
        })
        .transpose()
}
