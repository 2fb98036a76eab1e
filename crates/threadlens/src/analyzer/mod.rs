//! Analysis orchestration
//!
//! Ties the pipeline together: validate the request credential, resolve the
//! named provider to an adapter, build the prompt, run the analysis, and
//! cache the result per thread. The first failing stage short-circuits the
//! rest and its error is surfaced unchanged.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::AnalysisResult;
use crate::cache::AnalysisCache;
use crate::config::{EndpointsConfig, ServerConfig};
use crate::error::ThreadlensError;
use crate::extractor::NormalizedMessage;
use crate::prompt::build_analysis_prompt;
use crate::provider::{
    claude, gemini, openai, ClaudeClient, GeminiClient, OpenAiClient, ProviderClient, ProviderError,
    ProviderKind,
};

/// Credential and model selection carried by each request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub ai_provider: String,
    pub api_key: String,
    #[serde(default)]
    pub selected_model: Option<String>,
}

/// Errors surfaced at the orchestrator boundary
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// Missing provider or API key; user-fixable
    #[error("{0}")]
    Configuration(String),

    /// Provider name did not resolve to a known adapter
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Extraction produced nothing to analyze
    #[error("No messages found in thread")]
    NoMessages,

    /// Provider adapter failure, passed through unchanged
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Orchestrates extraction output through a provider adapter into the cache.
pub struct Analyzer {
    http: reqwest::Client,
    endpoints: EndpointsConfig,
    cache: Arc<AnalysisCache>,
}

impl Analyzer {
    /// Build an analyzer with a shared outbound client carrying the
    /// configured connect/request timeouts.
    pub fn new(
        server: &ServerConfig,
        endpoints: EndpointsConfig,
        cache: Arc<AnalysisCache>,
    ) -> Result<Self, ThreadlensError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(server.connect_timeout_secs))
            .timeout(Duration::from_secs(server.request_timeout_secs))
            .build()
            .map_err(|e| ThreadlensError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoints,
            cache,
        })
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Analyze a thread's messages and cache the result under its id.
    pub async fn analyze_thread(
        &self,
        thread_id: &str,
        messages: &[NormalizedMessage],
        settings: &Settings,
    ) -> Result<AnalysisResult, AnalyzeError> {
        let kind = resolve_provider(&settings.ai_provider, &settings.api_key)?;

        if messages.is_empty() {
            return Err(AnalyzeError::NoMessages);
        }

        let client = self.client_for(kind, &settings.api_key, settings.selected_model.as_deref());
        let prompt = build_analysis_prompt(messages);
        debug!(
            provider = client.name(),
            message_count = messages.len(),
            "Analyzing thread {thread_id}"
        );

        let analysis = client.analyze(&prompt).await?;

        self.cache.insert(thread_id, analysis.clone());
        info!(provider = client.name(), "Cached analysis for thread {thread_id}");

        Ok(analysis)
    }

    /// Run the named provider's connectivity probe.
    pub async fn test_connection(
        &self,
        provider: &str,
        api_key: &str,
        model: Option<&str>,
    ) -> Result<&'static str, AnalyzeError> {
        let kind = resolve_provider(provider, api_key)?;
        let client = self.client_for(kind, api_key, model);
        Ok(client.test_connection().await?)
    }

    fn client_for(
        &self,
        kind: ProviderKind,
        api_key: &str,
        model: Option<&str>,
    ) -> Box<dyn ProviderClient> {
        match kind {
            ProviderKind::OpenAi => Box::new(OpenAiClient::new(
                self.http.clone(),
                api_key,
                model,
                self.endpoints
                    .openai
                    .as_deref()
                    .unwrap_or(openai::DEFAULT_BASE_URL),
            )),
            ProviderKind::Gemini => Box::new(GeminiClient::new(
                self.http.clone(),
                api_key,
                model,
                self.endpoints
                    .gemini
                    .as_deref()
                    .unwrap_or(gemini::DEFAULT_BASE_URL),
            )),
            ProviderKind::Claude => Box::new(ClaudeClient::new(
                self.http.clone(),
                api_key,
                model,
                self.endpoints
                    .claude
                    .as_deref()
                    .unwrap_or(claude::DEFAULT_BASE_URL),
            )),
        }
    }
}

/// Credential completeness, then provider resolution. Checked before any
/// client is built so a bad request never touches the network.
fn resolve_provider(provider: &str, api_key: &str) -> Result<ProviderKind, AnalyzeError> {
    if provider.trim().is_empty() || api_key.trim().is_empty() {
        return Err(AnalyzeError::Configuration(
            "AI provider and API key are required".to_string(),
        ));
    }

    provider
        .parse()
        .map_err(AnalyzeError::UnsupportedProvider)
}
