//! OpenRouter chat-completions scorer.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};

use super::{ChatCompletion, ExternalScorer};
use super::prompts::render_quantify_prompt;
use crate::config::ScoringConfig;
use crate::error::{RbsError, Result};

/// Everything the scorer needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct ScorerSettings {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub site_url: String,
    pub app_name: String,
    pub timeout: Duration,
}

impl ScorerSettings {
    /// Combine scoring config with an already-resolved API key.
    #[must_use]
    pub fn from_config(config: &ScoringConfig, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: api_key.into(),
            model: config.model.clone(),
            site_url: config.site_url.clone(),
            app_name: config.app_name.clone(),
            timeout: config.timeout,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

pub struct OpenRouterScorer {
    client: reqwest::blocking::Client,
    settings: ScorerSettings,
}

impl OpenRouterScorer {
    pub fn new(settings: ScorerSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(RbsError::MissingConfig("scorer API key is empty".to_string()));
        }
        if settings.endpoint.trim().is_empty() {
            return Err(RbsError::Config(
                "scorer endpoint is empty; set [scoring].endpoint".to_string(),
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout.max(Duration::from_secs(1)))
            .build()
            .map_err(|err| RbsError::Config(format!("scorer http client: {err}")))?;
        Ok(Self { client, settings })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.settings.model
    }
}

impl ChatCompletion for OpenRouterScorer {
    fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .header("HTTP-Referer", &self.settings.site_url)
            .header("X-Title", &self.settings.app_name)
            .json(&request)
            .send()
            .map_err(|err| RbsError::Transport(format!("scorer request failed: {err}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RbsError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }
        if !status.is_success() {
            return Err(RbsError::Transport(format!("scorer HTTP {status}")));
        }

        let body: ChatResponse = response
            .json()
            .map_err(|err| RbsError::MalformedScore(format!("scorer response parse: {err}")))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| RbsError::MalformedScore("scorer response had no content".to_string()))
    }
}

impl ExternalScorer for OpenRouterScorer {
    fn score_raw(&self, review: &str) -> Result<String> {
        self.complete(&render_quantify_prompt(review))
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
