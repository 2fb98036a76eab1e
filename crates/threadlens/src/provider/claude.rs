//! Claude messages adapter
//!
//! API-key header plus a pinned version header; the model's text sits at
//! `content[0].text`. The connectivity probe reuses the messages endpoint
//! with a tiny token budget.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    api_error, parse_model_output, ProviderClient, ProviderError, ProviderKind, CONNECTION_OK,
    MAX_TOKENS,
};
use crate::analysis::AnalysisResult;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const API_VERSION: &str = "2023-06-01";

/// Token budget for the connectivity probe
const PROBE_MAX_TOKENS: u32 = 10;

pub struct ClaudeClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

impl ClaudeClient {
    pub fn new(http: Client, api_key: &str, model: Option<&str>, base_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            model: model
                .unwrap_or(ProviderKind::Claude.default_model())
                .to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn send_message(
        &self,
        prompt: &str,
        max_tokens: u32,
        fallback: &str,
    ) -> Result<String, ProviderError> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let url = format!("{}/v1/messages", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(fallback, response).await);
        }

        let reply: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        reply
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or(ProviderError::EmptyResponse("Claude"))
    }
}

#[async_trait]
impl ProviderClient for ClaudeClient {
    async fn test_connection(&self) -> Result<&'static str, ProviderError> {
        debug!(model = %self.model, "Probing Claude");
        self.send_message("Hello", PROBE_MAX_TOKENS, "Claude API connection failed")
            .await?;
        Ok(CONNECTION_OK)
    }

    async fn analyze(&self, prompt: &str) -> Result<AnalysisResult, ProviderError> {
        debug!(model = %self.model, "Requesting Claude analysis");
        let content = self
            .send_message(prompt, MAX_TOKENS, "Claude API request failed")
            .await?;
        parse_model_output("Claude", &content)
    }

    fn name(&self) -> &'static str {
        "Claude"
    }
}
