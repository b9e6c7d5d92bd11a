//! Read-only JSON API consumed by the dashboard
//!
//! Handlers parse and validate query parameters, then hand the work to
//! tokio's blocking pool: the engine and stores are synchronous. Errors are
//! rendered as `{"error": "..."}` with a status derived from [`CompareError`].

use crate::cache::SingleFlightCache;
use crate::compare::{compare_each_workload, CompareResult, ComparisonEngine};
use crate::config::{Config, DailyConfig};
use crate::daily::{daily, daily_summary, search};
use crate::error::CompareError;
use crate::status;
use crate::store::BenchmarkStore;
use crate::workload::Workload;
use anyhow::Context;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Store shared by every handler
pub type SharedStore = Arc<dyn BenchmarkStore>;

/// Cache key of one comparison: `(old_commit, new_commit, workload)`
pub type CompareKey = (String, String, Workload);

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    engine: Arc<ComparisonEngine<SharedStore>>,
    cache: Arc<SingleFlightCache<CompareKey, CompareResult>>,
    daily: Arc<DailyConfig>,
}

impl AppState {
    pub fn new(store: SharedStore, config: &Config) -> Self {
        Self {
            engine: Arc::new(ComparisonEngine::new(store, config.engine.clone())),
            cache: Arc::new(SingleFlightCache::new(config.cache.ttl())),
            daily: Arc::new(config.daily.clone()),
        }
    }

    pub fn engine(&self) -> &ComparisonEngine<SharedStore> {
        &self.engine
    }

    fn store(&self) -> SharedStore {
        Arc::clone(self.engine.store())
    }

    /// Comparison for one workload, served from the cache when fresh
    ///
    /// Branch and tag names are resolved first; the cache is keyed by commit.
    pub fn cached_compare(
        &self,
        old_ref: &str,
        new_ref: &str,
        workload: Workload,
    ) -> crate::Result<Arc<CompareResult>> {
        let (old_commit, new_commit) = self.engine.resolve_pair(old_ref, new_ref)?;
        self.cached_compare_commits(&old_commit, &new_commit, workload)
    }

    fn cached_compare_commits(
        &self,
        old_commit: &str,
        new_commit: &str,
        workload: Workload,
    ) -> crate::Result<Arc<CompareResult>> {
        let key = (old_commit.to_string(), new_commit.to_string(), workload);
        self.cache.get_or_try_insert_with(key, || {
            tracing::debug!(old_commit, new_commit, %workload, "comparison cache miss");
            self.engine.compare_commits(old_commit, new_commit, workload)
        })
    }
}

/// HTTP status for an engine error
pub fn status_for(err: &CompareError) -> StatusCode {
    match err {
        CompareError::NotFound(_) => StatusCode::NOT_FOUND,
        CompareError::InvalidInput(_) | CompareError::InsufficientSamples { .. } => {
            StatusCode::BAD_REQUEST
        }
        CompareError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CompareError::Parse(_) | CompareError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error response: `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<CompareError> for ApiError {
    fn from(err: CompareError) -> Self {
        Self {
            status: status_for(&err),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.message, "request rejected");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Run `work` on the blocking pool
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub old: Option<String>,
    pub new: Option<String>,
    pub workload: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CompareError::invalid_input(format!("missing query parameter `{}`", name)).into())
}

/// `GET /macrobench/compare?old=&new=[&workload=]`
async fn compare_handler(
    State(state): State<AppState>,
    Query(params): Query<CompareQuery>,
) -> Result<Response, ApiError> {
    let old_ref = required(params.old, "old")?;
    let new_ref = required(params.new, "new")?;
    let workload = params
        .workload
        .filter(|w| !w.is_empty())
        .map(|w| w.parse::<Workload>())
        .transpose()?;

    match workload {
        Some(workload) => {
            let result = blocking(move || state.cached_compare(&old_ref, &new_ref, workload)).await?;
            Ok(Json(CompareResult::clone(&result)).into_response())
        }
        None => {
            let comparisons = blocking(move || {
                let (old_commit, new_commit) = state.engine.resolve_pair(&old_ref, &new_ref)?;
                compare_each_workload(&old_commit, &new_commit, state.engine.config(), |workload| {
                    state
                        .cached_compare_commits(&old_commit, &new_commit, workload)
                        .map(|result| CompareResult::clone(&result))
                })
            })
            .await?;
            Ok(Json(comparisons).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub workloads: Option<String>,
}

/// `GET /daily?workloads=`
async fn daily_handler(
    State(state): State<AppState>,
    Query(params): Query<DailyQuery>,
) -> Result<Response, ApiError> {
    let workloads = Workload::parse_list(params.workloads.as_deref().unwrap_or_default())?;
    let data = blocking(move || {
        daily(
            &state.store(),
            &workloads,
            &state.daily,
            state.engine.config(),
            Utc::now(),
        )
    })
    .await?;
    Ok(Json(data).into_response())
}

/// `GET /daily/summary?workloads=`
async fn daily_summary_handler(
    State(state): State<AppState>,
    Query(params): Query<DailyQuery>,
) -> Result<Response, ApiError> {
    let workloads = Workload::parse_list(params.workloads.as_deref().unwrap_or_default())?;
    let summary = blocking(move || {
        daily_summary(
            &state.store(),
            &workloads,
            &state.daily,
            state.engine.config(),
            Utc::now(),
        )
    })
    .await?;
    Ok(Json(summary).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub git_ref: Option<String>,
}

/// `GET /search?git_ref=`: summaries of one ref on every workload
async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let git_ref = required(params.git_ref, "git_ref")?;
    let result = blocking(move || {
        let commit = state.engine.resolve_ref(&git_ref)?;
        search(&state.store(), &commit, state.engine.config())
    })
    .await?;
    Ok(Json(result).into_response())
}

async fn workloads_handler() -> Json<[Workload; 7]> {
    Json(Workload::ALL)
}

async fn refs_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let refs = blocking(move || state.store().refs()).await?;
    Ok(Json(refs).into_response())
}

async fn queue_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let executions = blocking(move || state.store().executions()).await?;
    Ok(Json(status::queue(&executions)).into_response())
}

async fn recent_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let executions = blocking(move || state.store().executions()).await?;
    Ok(Json(status::recent(&executions)).into_response())
}

async fn stats_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let executions = blocking(move || state.store().executions()).await?;
    Ok(Json(status::stats(&executions, Utc::now())).into_response())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/macrobench/compare", get(compare_handler))
        .route("/daily", get(daily_handler))
        .route("/daily/summary", get(daily_summary_handler))
        .route("/search", get(search_handler))
        .route("/workloads", get(workloads_handler))
        .route("/vitess/refs", get(refs_handler))
        .route("/queue", get(queue_handler))
        .route("/recent", get(recent_handler))
        .route("/status/stats", get(stats_handler))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("shutdown signal received");
}

/// Bind `listen` and serve until Ctrl-C
pub async fn serve(listen: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("server stopped");
    Ok(())
}
