//! HTTP surface of the service.
//!
//! Every handler is a short, sequential pipeline over the fetcher, formatter,
//! search and advisor. Errors always leave as `{"error": "..."}`.

use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::fetcher::{normalize_repo_identifier, ExclusionSet, FetchBudget, RepoData, RepoFetcher, RepoSource};
use crate::formatter::{estimate_tokens, format_repo_data, structure_listing};
use crate::github::GitHubClient;
use crate::llm::{Advisor, GeminiClient, Generation, TextGenerator};
use crate::search::search;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

const HOME_MESSAGE: &str = "TalkToCode Backend API is running. Use /ingest, /analyze_codebase, /analyze_structure, /search, /ask, or /get_repo_data with POST requests.";

/// Request body for `/ingest` and `/get_repo_data`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IngestRequest {
    /// GitHub URL or `owner/name`
    pub repo_url: Option<String>,
    /// Case-insensitive substrings to skip
    pub exclude: Option<Vec<String>>,
    /// Accepted for compatibility; the configured byte budget applies
    pub max_size_kb: Option<u64>,
}

/// Request body carrying previously fetched data
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RepoDataRequest {
    /// Data returned by an earlier fetch, as sent
    pub repo_data: Option<Value>,
}

/// Request body for `/search`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Data returned by an earlier fetch, as sent
    pub repo_data: Option<Value>,
    /// Keyword matched case-insensitively
    pub keyword: Option<String>,
}

/// Request body for `/ask`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AskRequest {
    /// Data returned by an earlier fetch, as sent
    pub repo_data: Option<Value>,
    /// Question about the repository
    pub query: Option<String>,
    /// Prior conversation, passed through verbatim
    pub history: Option<String>,
}

/// Response of `/ingest`
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub status: String,
    pub files_analyzed: usize,
    pub estimated_tokens: usize,
    pub summary: String,
    pub suggestions: String,
    pub repo_data: RepoData,
}

/// Response of `/get_repo_data`
#[derive(Debug, Serialize, Deserialize)]
pub struct RepoDataResponse {
    pub status: String,
    pub repo_data: RepoData,
    pub files_analyzed: usize,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current status
    pub status: String,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
    /// Service uptime in seconds
    pub uptime: u64,
}

/// Error leaving the API as `{"error": message}` with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// 400 with the given message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// 500 with the given message
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match err {
            ServiceError::Generation(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    fetcher: RepoFetcher,
    advisor: Advisor,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Wires explicit upstream implementations
    pub fn new(config: Config, source: Arc<dyn RepoSource>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher: RepoFetcher::new(source),
            advisor: Advisor::new(generator),
            started_at: Utc::now(),
        }
    }

    /// Wires the GitHub and Gemini clients described by `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let source = GitHubClient::new(&config.github, config.api_keys.github_token.clone())?;
        let generator = GeminiClient::new(&config.gemini, config.api_keys.gemini_api_key.clone())?;
        Ok(Self::new(config, Arc::new(source), Arc::new(generator)))
    }

    fn budget(&self) -> FetchBudget {
        self.config.fetch.budget()
    }

    async fn fetch(&self, repo_url: &str, exclude: Option<Vec<String>>) -> std::result::Result<RepoData, ApiError> {
        let repo = normalize_repo_identifier(repo_url);
        info!("Processing URL: {}", repo_url);
        let exclusions = ExclusionSet::new(exclude.unwrap_or_default());
        self.fetcher
            .fetch(&repo, &self.budget(), &exclusions)
            .await
            .map_err(|e| {
                error!("Failed to fetch {}: {}", repo, e);
                ApiError::internal("Failed to fetch repo data")
            })
    }
}

/// Builds the router with permissive CORS and HTTP tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/ingest", post(ingest))
        .route("/analyze_codebase", post(analyze_codebase))
        .route("/analyze_structure", post(analyze_structure))
        .route("/search", post(search_repo))
        .route("/ask", post(ask))
        .route("/get_repo_data", post(get_repo_data))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `repo_data` counts as missing only when absent, `null` or `{}`
fn provided(value: Option<Value>) -> Option<Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    })
}

fn decode_repo_data(value: Value) -> std::result::Result<RepoData, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::bad_request(format!("Invalid repo_data: {}", e)))
}

fn response_text(kind: &str, generation: Generation) -> String {
    if let Generation::Failed { status, .. } = &generation {
        warn!("{} generation failed upstream with HTTP {}", kind, status);
    }
    generation.into_response_text()
}

async fn home() -> Json<Value> {
    Json(json!({ "message": HOME_MESSAGE }))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "talktocode".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime: (Utc::now() - state.started_at).num_seconds().max(0) as u64,
    })
}

async fn ingest(
    State(state): State<AppState>,
    payload: std::result::Result<Json<IngestRequest>, JsonRejection>,
) -> std::result::Result<Json<IngestResponse>, ApiError> {
    let Json(request) = payload?;
    let repo_url = non_empty(request.repo_url).ok_or_else(|| ApiError::bad_request("Missing repo_url"))?;
    if let Some(kb) = request.max_size_kb {
        debug!(
            "max_size_kb={} requested; applying configured budget of {} bytes",
            kb,
            state.budget().max_bytes
        );
    }

    let repo_data = state.fetch(&repo_url, request.exclude).await?;
    let formatted = format_repo_data(&repo_data);
    let summary = state.advisor.summarize(&formatted).await?;
    let suggestions = state.advisor.suggest(&formatted).await?;

    Ok(Json(IngestResponse {
        status: "success".to_string(),
        files_analyzed: repo_data.files_analyzed(),
        estimated_tokens: estimate_tokens(&formatted),
        summary: response_text("Summary", summary),
        suggestions: response_text("Suggestion", suggestions),
        repo_data,
    }))
}

async fn analyze_codebase(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RepoDataRequest>, JsonRejection>,
) -> std::result::Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let repo_data = provided(request.repo_data).ok_or_else(|| ApiError::bad_request("Missing repo_data"))?;
    let repo_data = decode_repo_data(repo_data)?;

    let summary = state.advisor.summarize(&format_repo_data(&repo_data)).await?;
    Ok(Json(json!({ "analysis": response_text("Analysis", summary) })))
}

async fn analyze_structure(
    payload: std::result::Result<Json<RepoDataRequest>, JsonRejection>,
) -> std::result::Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let repo_data = provided(request.repo_data).ok_or_else(|| ApiError::bad_request("Missing repo_data"))?;
    let repo_data = decode_repo_data(repo_data)?;

    Ok(Json(json!({ "structure": structure_listing(&repo_data) })))
}

async fn search_repo(
    payload: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> std::result::Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let (Some(repo_data), Some(keyword)) = (provided(request.repo_data), non_empty(request.keyword)) else {
        return Err(ApiError::bad_request("Missing repo_data or keyword"));
    };
    let repo_data = decode_repo_data(repo_data)?;

    Ok(Json(json!({ "results": search(&repo_data, &keyword) })))
}

async fn ask(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> std::result::Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let (Some(repo_data), Some(query)) = (provided(request.repo_data), non_empty(request.query)) else {
        return Err(ApiError::bad_request("Missing repo_data or query"));
    };
    let repo_data = decode_repo_data(repo_data)?;

    let history = request.history.unwrap_or_default();
    let answer = state
        .advisor
        .ask(&format_repo_data(&repo_data), &query, &history)
        .await?;
    Ok(Json(json!({ "answer": response_text("Answer", answer) })))
}

async fn get_repo_data(
    State(state): State<AppState>,
    payload: std::result::Result<Json<IngestRequest>, JsonRejection>,
) -> std::result::Result<Json<RepoDataResponse>, ApiError> {
    let Json(request) = payload?;
    let repo_url = non_empty(request.repo_url).ok_or_else(|| ApiError::bad_request("Missing repo_url"))?;

    let repo_data = state.fetch(&repo_url, request.exclude).await?;
    Ok(Json(RepoDataResponse {
        status: "success".to_string(),
        files_analyzed: repo_data.files_analyzed(),
        repo_data,
    }))
}
