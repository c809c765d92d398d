use crate::LlmProvider;
use digest_core::{CoreError, LlmError};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const PROVIDER: &str = "openai";
const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 20;

/// Sampling parameters sent with every completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub seed: i64,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.15,
            top_p: 1.0,
            presence_penalty: 0.0,
            frequency_penalty: 0.1,
            seed: 42,
            max_tokens: 8000,
            timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub seed: i64,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    pub fn into_content(self) -> Result<String, CoreError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                CoreError::Llm(LlmError::InvalidResponseFormat {
                    provider: PROVIDER.to_string(),
                })
            })
    }
}

/// Maps a failed chat-completions status to an `LlmError`.
pub fn status_error(status: StatusCode, retry_after: Option<u64>, model: &str) -> CoreError {
    let provider = PROVIDER.to_string();
    let error = match status.as_u16() {
        429 => LlmError::RateLimitExceeded {
            provider,
            retry_after: retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS),
        },
        401 | 403 => LlmError::InvalidApiKey { provider },
        404 => LlmError::ModelNotAvailable {
            model: model.to_string(),
        },
        400 | 413 | 422 => LlmError::InvalidPrompt {
            reason: format!("rejected with status {status}"),
        },
        408 => LlmError::RequestTimeout { provider },
        _ if status.is_server_error() => LlmError::ServiceUnavailable { provider },
        code => {
            return CoreError::RequestFailed {
                message: format!("chat completion failed with status {code}"),
                status_code: Some(code),
            }
        }
    };
    CoreError::Llm(error)
}

/// Chat-completions client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    settings: ChatSettings,
    http: Client,
}

impl OpenAiProvider {
    pub fn new(api_key: &str) -> Result<Self, CoreError> {
        Self::with_settings(api_key, OPENAI_API_URL, ChatSettings::default())
    }

    pub fn with_settings(
        api_key: &str,
        base_url: &str,
        settings: ChatSettings,
    ) -> Result<Self, CoreError> {
        if api_key.trim().is_empty() {
            return Err(CoreError::Llm(LlmError::InvalidApiKey {
                provider: PROVIDER.to_string(),
            }));
        }

        let http = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            settings,
            http,
        })
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn build_request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
            presence_penalty: self.settings.presence_penalty,
            frequency_penalty: self.settings.frequency_penalty,
            seed: self.settings.seed,
            max_tokens: self.settings.max_tokens,
        }
    }
}

impl LlmProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, CoreError> {
        if prompt.trim().is_empty() {
            return Err(CoreError::Llm(LlmError::InvalidPrompt {
                reason: "prompt is empty".to_string(),
            }));
        }

        debug!(
            model = %self.settings.model,
            prompt_chars = prompt.chars().count(),
            "OpenAI chat request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI request failed: {}", e);
                if e.is_timeout() {
                    CoreError::Llm(LlmError::RequestTimeout {
                        provider: PROVIDER.to_string(),
                    })
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            error!("OpenAI API error ({}): {}", status, body);
            return Err(status_error(status, retry_after, &self.settings.model));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse OpenAI response: {}", e);
            CoreError::Llm(LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
            })
        })?;

        let content = chat.into_content()?;
        info!(
            model = %self.settings.model,
            completion_chars = content.chars().count(),
            "OpenAI completion received"
        );
        Ok(content)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
