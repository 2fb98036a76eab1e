//! Gemini generateContent adapter
//!
//! Auth rides in the query string rather than a header, and the model's text
//! is nested at `candidates[0].content.parts[0].text`. There is no separate
//! probe endpoint, so the connectivity test sends a one-word prompt.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    api_error, parse_model_output, ProviderClient, ProviderError, ProviderKind, CONNECTION_OK,
    MAX_TOKENS, TEMPERATURE,
};
use crate::analysis::AnalysisResult;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(http: Client, api_key: &str, model: Option<&str>, base_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            model: model
                .unwrap_or(ProviderKind::Gemini.default_model())
                .to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn generate(
        &self,
        request: &GenerateContentRequest,
        fallback: &str,
    ) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(fallback, response).await);
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        generated
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or(ProviderError::EmptyResponse("Gemini"))
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    async fn test_connection(&self) -> Result<&'static str, ProviderError> {
        debug!(model = %self.model, "Probing Gemini");
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "Hello".to_string(),
                }],
            }],
            generation_config: None,
        };

        self.generate(&request, "Gemini API connection failed")
            .await?;
        Ok(CONNECTION_OK)
    }

    async fn analyze(&self, prompt: &str) -> Result<AnalysisResult, ProviderError> {
        debug!(model = %self.model, "Requesting Gemini analysis");
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_TOKENS,
            }),
        };

        let content = self.generate(&request, "Gemini API request failed").await?;
        parse_model_output("Gemini", &content)
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}
