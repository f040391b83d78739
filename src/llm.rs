use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::tokens::Truncator;

const SYSTEM_PROMPT: &str = "You are an expert summarizer. Create concise bullet-point summary in the language that matches the text provided.";
const TEMPERATURE: f32 = 0.3;

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat-completion client that turns article text into a bullet summary.
pub struct Summarizer {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_input_tokens: usize,
    max_tokens: u32,
    truncator: Arc<Truncator>,
}

impl Summarizer {
    pub fn new(config: &Config, truncator: Arc<Truncator>) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", config.api_base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_input_tokens: config.max_input_tokens,
            max_tokens: config.max_tokens,
            truncator,
        }
    }

    /// Response tokens requested for a caller's `max_length`, never above the
    /// configured cap.
    pub fn response_cap(&self, max_length: u32) -> u32 {
        max_length.min(self.max_tokens).max(1)
    }

    pub async fn summarize(&self, text: &str, max_length: u32) -> Result<String> {
        let truncated = self.truncator.truncate(text, self.max_input_tokens);
        info!("Truncated text length: {} tokens", self.truncator.count(&truncated));

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                Message {
                    role: "user".into(),
                    content: format!("Summarize this text:\n\n{truncated}"),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: self.response_cap(max_length),
        };

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(generation_failed)?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            error!("summarization API returned {status}: {detail}");
            return Err(AppError::LlmError(format!("API Error: {status} {detail}").trim().to_string()));
        }

        let reply: ChatResponse = res.json().await.map_err(generation_failed)?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                error!("summarization API returned no choices");
                AppError::LlmError("Summary generation failed".to_string())
            })
    }
}

fn generation_failed(err: reqwest::Error) -> AppError {
    error!("summarization request failed: {err}");
    AppError::LlmError("Summary generation failed".to_string())
}
