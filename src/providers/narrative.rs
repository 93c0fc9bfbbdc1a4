//! Route narrative generation via an LLM

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{NarrativeGenerator, error_body, http_client, read_json};
use crate::config::{HttpConfig, LlmConfig, LlmProvider};
use crate::retry::{RetryPolicy, send_with_retry};
use crate::{Error, Result};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Gemini `generateContent` request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

/// Gemini `generateContent` response
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

/// `OpenAI` chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// `OpenAI` chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Narrative generator for a configured LLM backend
pub struct NarrativeClient {
    client: reqwest::Client,
    api_key: SecretString,
    provider: LlmProvider,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl NarrativeClient {
    /// Create a narrative client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: &str, config: &LlmConfig, http: HttpConfig) -> Result<Self> {
        if api_key.is_empty() {
            let name = match config.provider {
                LlmProvider::Gemini => "Gemini",
                LlmProvider::OpenAi => "OpenAI",
            };
            return Err(Error::Config(format!(
                "{name} API key required for narrative generation"
            )));
        }

        Ok(Self {
            client: http_client(http.timeout, concat!("route-narrator/", env!("CARGO_PKG_VERSION")))?,
            api_key: SecretString::from(api_key.to_string()),
            provider: config.provider,
            model: config.model.clone(),
            temperature: config.temperature,
            retry: RetryPolicy::for_http(http),
        })
    }

    /// Complete using Gemini
    async fn complete_gemini(&self, prompt: &str) -> Result<String> {
        let url = format!("{GEMINI_API_URL}/{}:generateContent", self.model);
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
            },
        };

        let response = send_with_retry(&self.retry, "narrative", || {
            self.client
                .post(&url)
                .header("x-goog-api-key", self.api_key.expose_secret())
                .json(&request)
                .send()
        })
        .await?;

        if !response.status().is_success() {
            return Err(Error::Narrative(format!(
                "Gemini error {}",
                error_body(response).await
            )));
        }

        let result: GeminiResponse = read_json(response, "Gemini", Error::Narrative).await?;
        gemini_text(result)
    }

    /// Complete using `OpenAI`
    async fn complete_openai(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = send_with_retry(&self.retry, "narrative", || {
            self.client
                .post(OPENAI_API_URL)
                .bearer_auth(self.api_key.expose_secret())
                .json(&request)
                .send()
        })
        .await?;

        if !response.status().is_success() {
            return Err(Error::Narrative(format!(
                "OpenAI error {}",
                error_body(response).await
            )));
        }

        let result: ChatResponse = read_json(response, "OpenAI", Error::Narrative).await?;
        openai_text(result)
    }
}

#[async_trait]
impl NarrativeGenerator for NarrativeClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(provider = ?self.provider, model = %self.model, "requesting narrative");

        let text = match self.provider {
            LlmProvider::Gemini => self.complete_gemini(prompt).await?,
            LlmProvider::OpenAi => self.complete_openai(prompt).await?,
        };

        tracing::debug!(chars = text.len(), "narrative received");
        Ok(text)
    }
}

fn gemini_text(response: GeminiResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    non_empty(text, "Gemini")
}

fn openai_text(response: ChatResponse) -> Result<String> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    non_empty(text, "OpenAI")
}

fn non_empty(text: String, provider: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(Error::Narrative(format!("{provider} returned no text")));
    }
    Ok(text.trim().to_string())
}
