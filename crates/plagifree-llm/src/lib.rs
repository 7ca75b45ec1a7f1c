//! Rewriting engine backed by an OpenAI-compatible chat completions API.

use std::time::Duration;

use async_trait::async_trait;
use plagifree_core::config::RewriterConfig;
use plagifree_core::{PlagiError, PlagiResult, RewriteEngine};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct ChatCompletionsEngine {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsEngine {
    pub fn new(config: &RewriterConfig) -> PlagiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlagiError::InternalError(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

fn first_content(response: ChatResponse) -> PlagiResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| PlagiError::Upstream("rewriting engine returned no choices".to_string()))
}

#[async_trait]
impl RewriteEngine for ChatCompletionsEngine {
    async fn rewrite(&self, text: &str, system_instructions: &str) -> PlagiResult<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_instructions,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PlagiError::Upstream(format!("rewriting engine unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            tracing::warn!(%status, model = %self.model, "chat completion rejected");
            return Err(PlagiError::Upstream(format!(
                "rewriting engine returned {status}: {message}"
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| PlagiError::Upstream(format!("malformed rewriting engine response: {e}")))?;

        first_content(parsed)
    }
}
