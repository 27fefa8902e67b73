//! HTTP trigger
//!
//! `POST /` (or `/analyze`) takes `{"query": "..."}` and answers with the
//! analysis outcome as JSON. The function-URL envelope `{"body": "<json>"}`
//! is unwrapped first, so payloads built for the hosted function work as-is.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ranker_core::{MarketDataSource, RankerConfig, RankingPipeline, SymbolDirectory};
use ranker_llm::LLMProvider;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Builds a market source with its own session for one request
pub type SourceFactory =
    Arc<dyn Fn() -> ranker_core::Result<Arc<dyn MarketDataSource>> + Send + Sync>;

/// Shared, read-only request context
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn LLMProvider>,
    pub directory: Arc<SymbolDirectory>,
    pub config: Arc<RankerConfig>,
    pub sources: SourceFactory,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(analyze))
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn analyze(State(state): State<AppState>, body: String) -> Response {
    let query = match query_from_body(&body) {
        Ok(query) => query,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let source = match (state.sources)() {
        Ok(source) => source,
        Err(e) => {
            error!("Could not create market client: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let pipeline = RankingPipeline::new(
        Arc::clone(&state.provider),
        source,
        Arc::clone(&state.directory),
        &state.config,
    );

    match pipeline.analyze(&query).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            error!("Analysis failed for '{}': {}", query, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Pull the query out of a request body, unwrapping a `{"body": ...}` envelope
fn query_from_body(raw: &str) -> Result<String, String> {
    let payload: Value =
        serde_json::from_str(raw).map_err(|e| format!("request body is not JSON: {e}"))?;

    let unwrapped: Option<Value> = match payload.get("body") {
        Some(Value::String(inner)) => Some(
            serde_json::from_str(inner).map_err(|e| format!("envelope body is not JSON: {e}"))?,
        ),
        Some(inner @ Value::Object(_)) => Some(inner.clone()),
        _ => None,
    };
    let payload = unwrapped.unwrap_or(payload);

    match payload.get("query").and_then(Value::as_str).map(str::trim) {
        Some(query) if !query.is_empty() => Ok(query.to_string()),
        _ => Err("request must carry a non-empty \"query\" string".to_string()),
    }
}
