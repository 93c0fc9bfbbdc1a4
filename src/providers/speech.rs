//! Text-to-speech (TTS) synthesis

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::{SpeechSynthesizer, error_body, http_client};
use crate::config::{HttpConfig, TtsConfig, TtsProviderKind};
use crate::poi::AudioClip;
use crate::retry::{RetryPolicy, send_with_retry};
use crate::{Error, Result};

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    speed: f32,
    model: String,
    provider: TtsProviderKind,
    retry: RetryPolicy,
}

impl TextToSpeech {
    /// Create a TTS instance for the configured provider
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: &str, config: &TtsConfig, http: HttpConfig) -> Result<Self> {
        match config.provider {
            TtsProviderKind::OpenAi => Self::new_openai_with_model(
                api_key,
                config.voice.clone(),
                config.speed,
                config.model.clone(),
                http,
            ),
            TtsProviderKind::ElevenLabs => Self::new_elevenlabs_with_model(
                api_key,
                config.voice.clone(),
                config.model.clone(),
                http,
            ),
        }
    }

    /// Create a new TTS instance using `OpenAI` with custom model
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai_with_model(
        api_key: &str,
        voice: String,
        speed: f32,
        model: String,
        http: HttpConfig,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: http_client(http.timeout, concat!("route-narrator/", env!("CARGO_PKG_VERSION")))?,
            api_key: SecretString::from(api_key.to_string()),
            voice,
            speed,
            model,
            provider: TtsProviderKind::OpenAi,
            retry: RetryPolicy::for_http(http),
        })
    }

    /// Create a new TTS instance using `ElevenLabs` with custom model
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs_with_model(
        api_key: &str,
        voice_id: String,
        model: String,
        http: HttpConfig,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: http_client(http.timeout, concat!("route-narrator/", env!("CARGO_PKG_VERSION")))?,
            api_key: SecretString::from(api_key.to_string()),
            voice: voice_id,
            speed: 1.0, // ElevenLabs doesn't use speed in the same way
            model,
            provider: TtsProviderKind::ElevenLabs,
            retry: RetryPolicy::for_http(http),
        })
    }

    /// Synthesize using `OpenAI` TTS
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = send_with_retry(&self.retry, "tts", || {
            self.client
                .post(OPENAI_SPEECH_URL)
                .bearer_auth(self.api_key.expose_secret())
                .json(&request)
                .send()
        })
        .await?;

        if !response.status().is_success() {
            return Err(Error::Tts(format!(
                "OpenAI TTS error {}",
                error_body(response).await
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Tts(format!("audio could not be read: {e}")))?;
        Ok(audio.to_vec())
    }

    /// Synthesize using `ElevenLabs` TTS
    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("{ELEVENLABS_API_URL}/{}", self.voice);

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = send_with_retry(&self.retry, "tts", || {
            self.client
                .post(&url)
                .header("xi-api-key", self.api_key.expose_secret())
                .json(&request)
                .send()
        })
        .await?;

        if !response.status().is_success() {
            return Err(Error::Tts(format!(
                "ElevenLabs TTS error {}",
                error_body(response).await
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Tts(format!("audio could not be read: {e}")))?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for TextToSpeech {
    /// Synthesize text to MP3 audio
    async fn synthesize(&self, text: &str) -> Result<AudioClip> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("nothing to speak".to_string()));
        }

        let audio = match self.provider {
            TtsProviderKind::OpenAi => {
                self.synthesize_openai(text).await?
            }
            TtsProviderKind::ElevenLabs => {
                self.synthesize_elevenlabs(text).await?
            }
        };

        if audio.is_empty() {
            return Err(Error::Tts("provider returned empty audio".to_string()));
        }

        tracing::debug!(provider = ?self.provider, bytes = audio.len(), "speech synthesized");
        Ok(AudioClip::mp3(audio))
    }
}
