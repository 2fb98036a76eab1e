//! OpenAI chat-completions adapter
//!
//! Bearer-token auth; the model's text sits at `choices[0].message.content`.
//! The connectivity probe lists models with the same auth header, which is
//! the cheapest call that still validates the key.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    api_error, parse_model_output, ProviderClient, ProviderError, ProviderKind, CONNECTION_OK,
    MAX_TOKENS, TEMPERATURE,
};
use crate::analysis::AnalysisResult;
use crate::prompt::SYSTEM_PROMPT;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(http: Client, api_key: &str, model: Option<&str>, base_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            model: model
                .unwrap_or(ProviderKind::OpenAi.default_model())
                .to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    async fn test_connection(&self) -> Result<&'static str, ProviderError> {
        let url = format!("{}/v1/models", self.base_url);
        debug!("Probing OpenAI at {url}");

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error("OpenAI API connection failed", response).await);
        }

        Ok(CONNECTION_OK)
    }

    async fn analyze(&self, prompt: &str) -> Result<AnalysisResult, ProviderError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(model = %self.model, "Requesting OpenAI analysis");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error("OpenAI API request failed", response).await);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse("OpenAI"))?;

        parse_model_output("OpenAI", &content)
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }
}
