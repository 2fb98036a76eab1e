//! LLM provider abstraction
//!
//! One uniform contract over three structurally different HTTP APIs. Each
//! adapter owns its provider's authentication scheme, request/response
//! envelope, and the JSON path where the model's text is nested; everything
//! past that boundary sees only [`ProviderClient`] and [`ProviderError`].

pub mod claude;
pub mod gemini;
pub mod openai;

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::AnalysisResult;

/// Message returned by every successful connectivity probe
pub const CONNECTION_OK: &str = "Connection successful";

/// Sampling temperature for analysis requests
pub(crate) const TEMPERATURE: f32 = 0.3;

/// Token budget for analysis responses
pub(crate) const MAX_TOKENS: u32 = 2000;

/// Errors surfaced by provider adapters
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure reaching the provider
    #[error("{0}")]
    Connection(String),

    /// Non-success HTTP status; message taken from the provider's error
    /// body when it parses, else a generic per-provider fallback
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Success envelope with no model text in it
    #[error("No content received from {0}")]
    EmptyResponse(&'static str),

    /// Model text did not parse as a valid analysis document
    #[error("Invalid response format from {provider}: {detail}")]
    InvalidResponseFormat {
        provider: &'static str,
        detail: String,
    },
}

/// Named provider backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Claude,
}

impl ProviderKind {
    pub fn all() -> [ProviderKind; 3] {
        [ProviderKind::OpenAi, ProviderKind::Gemini, ProviderKind::Claude]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Claude => "claude",
        }
    }

    /// Model used when the request does not name one
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-3.5-turbo",
            ProviderKind::Gemini => "gemini-pro",
            ProviderKind::Claude => "claude-3-haiku-20240307",
        }
    }

    /// Models the settings UI offers for this provider
    pub fn models(self) -> &'static [&'static str] {
        match self {
            ProviderKind::OpenAi => &["gpt-4", "gpt-4-turbo", "gpt-3.5-turbo"],
            ProviderKind::Gemini => &["gemini-pro", "gemini-pro-vision"],
            ProviderKind::Claude => &["claude-3-opus", "claude-3-sonnet", "claude-3-haiku"],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            "claude" => Ok(ProviderKind::Claude),
            other => Err(other.to_string()),
        }
    }
}

/// Uniform contract implemented by the three provider adapters
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Cheap connectivity probe using the configured credentials
    async fn test_connection(&self) -> Result<&'static str, ProviderError>;

    /// Send the analysis prompt and parse the model's reply
    async fn analyze(&self, prompt: &str) -> Result<AnalysisResult, ProviderError>;

    /// Provider name for logging and error text
    fn name(&self) -> &'static str;
}

/// Error body shape shared by all three providers: `{"error": {"message"}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Turn a non-success response into an [`ProviderError::Api`], preferring
/// the provider's own error message over the generic fallback.
pub(crate) async fn api_error(fallback: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let message = response
        .json::<ApiErrorEnvelope>()
        .await
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|body| body.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string());

    ProviderError::Api { status, message }
}

/// Parse raw model text as an analysis document, never returning partial
/// data on failure.
pub(crate) fn parse_model_output(
    provider: &'static str,
    raw: &str,
) -> Result<AnalysisResult, ProviderError> {
    AnalysisResult::from_model_output(raw).map_err(|source| {
        tracing::warn!("Failed to parse {provider} response as analysis JSON: {source}");
        ProviderError::InvalidResponseFormat {
            provider,
            detail: source.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_round_trips_names() {
        for kind in ProviderKind::all() {
            assert_eq!(kind.as_str().parse::<ProviderKind>(), Ok(kind));
        }
        assert_eq!("mistral".parse::<ProviderKind>(), Err("mistral".to_string()));
    }

    #[test]
    fn test_provider_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&ProviderKind::OpenAi).unwrap(),
            r#""openai""#
        );
        let kind: ProviderKind = serde_json::from_str(r#""claude""#).unwrap();
        assert_eq!(kind, ProviderKind::Claude);
    }

    #[test]
    fn test_default_models_are_in_catalog_family() {
        assert!(ProviderKind::OpenAi.models().contains(&"gpt-3.5-turbo"));
        assert!(ProviderKind::Gemini.models().contains(&"gemini-pro"));
        assert!(ProviderKind::Claude.default_model().starts_with("claude-3-haiku"));
    }

    #[test]
    fn test_parse_model_output_rejects_prose() {
        let err = parse_model_output("OpenAI", "Sure! Here is the analysis:").unwrap_err();
        match err {
            ProviderError::InvalidResponseFormat { provider, .. } => assert_eq!(provider, "OpenAI"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
