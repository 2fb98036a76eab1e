//! HTTP surface for the browser extension
//!
//! Exposes the extension message contract over localhost: connectivity
//! tests, thread info, extraction, analysis, and cached-result reads. All
//! bodies are camelCase JSON and responses follow the `{success, …}`
//! envelope the extension expects.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::analyzer::{AnalyzeError, Analyzer, Settings};
use crate::cache::AnalysisCache;
use crate::config::Config;
use crate::error::{Result, ThreadlensError};
use crate::extractor::{DomSnapshot, NormalizedMessage};
use crate::provider::ProviderKind;

/// Shared application state for all handlers
pub struct AppState {
    pub analyzer: Analyzer,
    pub cache: Arc<AnalysisCache>,
}

/// The analysis daemon
pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start the daemon and listen for requests until shutdown.
    pub async fn serve(&self) -> Result<()> {
        let cache = Arc::new(AnalysisCache::new(self.config.cache.capacity));
        let analyzer = Analyzer::new(
            &self.config.server,
            self.config.endpoints.clone(),
            cache.clone(),
        )?;

        let state = Arc::new(AppState { analyzer, cache });
        let app = create_router(state);

        let addr: SocketAddr = self
            .config
            .server
            .listen_addr
            .parse()
            .map_err(|e| ThreadlensError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Starting threadlens daemon on {addr}");

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ThreadlensError::Server(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ThreadlensError::Server(format!("Server error: {e}")))?;

        tracing::info!("threadlens daemon shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/providers", get(providers_handler))
        .route("/api/test-connection", post(test_connection_handler))
        .route("/api/thread-info", post(thread_info_handler))
        .route("/api/extract", post(extract_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/analysis/{thread_id}", get(analysis_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PageSnapshot {
    html: String,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestConnectionRequest {
    provider: String,
    api_key: String,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    messages: Option<Vec<NormalizedMessage>>,
    #[serde(default)]
    page: Option<PageSnapshot>,
    settings: Settings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderInfo {
    id: &'static str,
    default_model: &'static str,
    models: &'static [&'static str],
}

/// Health check endpoint - returns JSON status
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Model catalog for the settings UI
async fn providers_handler() -> Json<Vec<ProviderInfo>> {
    let catalog = ProviderKind::all()
        .into_iter()
        .map(|kind| ProviderInfo {
            id: kind.as_str(),
            default_model: kind.default_model(),
            models: kind.models(),
        })
        .collect();
    Json(catalog)
}

async fn test_connection_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TestConnectionRequest>,
) -> Response<Body> {
    match state
        .analyzer
        .test_connection(&request.provider, &request.api_key, request.model.as_deref())
        .await
    {
        Ok(result) => Json(serde_json::json!({"success": true, "result": result})).into_response(),
        Err(error) => analyze_error_response(&error),
    }
}

async fn thread_info_handler(Json(page): Json<PageSnapshot>) -> Json<serde_json::Value> {
    let thread_id = DomSnapshot::parse(&page.html, &page.url).thread_id();
    Json(serde_json::json!({
        "threadId": thread_id,
        "isInThread": thread_id.is_some(),
    }))
}

/// Expose the extraction stage on its own, mostly for the extension's
/// pre-flight checks and for debugging selector drift.
async fn extract_handler(Json(page): Json<PageSnapshot>) -> Json<serde_json::Value> {
    let snapshot = DomSnapshot::parse(&page.html, &page.url);
    Json(serde_json::json!({
        "success": true,
        "threadId": snapshot.thread_id(),
        "messages": snapshot.messages(),
    }))
}

async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Response<Body> {
    let (thread_id, messages) = match (request.messages, request.page) {
        (Some(messages), None) => match request.thread_id {
            Some(thread_id) => (thread_id, messages),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "threadId is required when messages are supplied",
                );
            }
        },
        (None, Some(page)) => {
            // Extract synchronously and drop the snapshot before awaiting
            // the provider call; the parsed document is not Send.
            let (derived, messages) = {
                let snapshot = DomSnapshot::parse(&page.html, &page.url);
                (snapshot.thread_id(), snapshot.messages())
            };
            match request.thread_id.or(derived) {
                Some(thread_id) => (thread_id, messages),
                None => {
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        "No conversation detected in page",
                    );
                }
            }
        }
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Exactly one of messages or page must be provided",
            );
        }
    };

    match state
        .analyzer
        .analyze_thread(&thread_id, &messages, &request.settings)
        .await
    {
        Ok(analysis) => {
            Json(serde_json::json!({"success": true, "analysis": analysis})).into_response()
        }
        Err(error) => analyze_error_response(&error),
    }
}

/// Cached analysis for one thread; the side panel's data source.
async fn analysis_handler(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Response<Body> {
    match state.cache.get(&thread_id) {
        Some(entry) => Json(entry).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            &format!("No analysis cached for thread {thread_id}"),
        ),
    }
}

fn analyze_error_response(error: &AnalyzeError) -> Response<Body> {
    let status = match error {
        AnalyzeError::Configuration(_)
        | AnalyzeError::UnsupportedProvider(_)
        | AnalyzeError::NoMessages => StatusCode::BAD_REQUEST,
        AnalyzeError::Provider(_) => StatusCode::BAD_GATEWAY,
    };
    error_response(status, &error.to_string())
}

fn error_response(status: StatusCode, message: &str) -> Response<Body> {
    (
        status,
        Json(serde_json::json!({"success": false, "error": message})),
    )
        .into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
