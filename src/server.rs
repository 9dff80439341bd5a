//! Thin HTTP boundary over the AI core.
//!
//! Routing is deliberately minimal: auth, org-membership checks, and
//! content CRUD live in the surrounding dashboard, not here. These
//! handlers translate requests into core invocations and core failures
//! into generic error bodies.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::agent::model::{Message, ModelRequest};
use crate::agent::{AgentLoop, EditRequest, ModelClient};
use crate::document::DocumentSink;
use crate::persistence::progress_store::SqliteProgressStore;
use crate::workflow::brand::{self, BrandRepo};
use crate::workflow::fetch::ContentFetcher;
use crate::{AppError, GlobalConfig, Result};

/// Shared application state injected into every handler.
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<GlobalConfig>,
    /// Model gateway client.
    pub model: Arc<dyn ModelClient>,
    /// Website content fetcher for the brand workflow.
    pub fetcher: Arc<dyn ContentFetcher>,
    /// Brand settings persistence.
    pub brand_repo: Arc<dyn BrandRepo>,
    /// Progress store (engine writes, status route reads).
    pub progress: Arc<SqliteProgressStore>,
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/organizations/{organization_id}/content/edit",
            post(edit_content),
        )
        .route(
            "/api/organizations/{organization_id}/brand/analyze",
            post(analyze_brand),
        )
        .route(
            "/api/organizations/{organization_id}/brand/progress",
            get(brand_progress),
        )
        .route("/api/debug/preview", post(debug_preview))
        .with_state(state)
}

/// Serve the API until the cancellation token fires.
///
/// # Errors
///
/// Returns `AppError::Http` if the server fails to bind or serve.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let bind = SocketAddr::from(([127, 0, 0, 1], state.config.http_port));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Http(format!("failed to bind on {bind}: {err}")))?;

    info!(%bind, "starting HTTP API");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Http(format!("server error: {err}")))?;

    info!("HTTP API shut down");
    Ok(())
}

/// Handler for `GET /health` — returns 200 OK with a plain-text body.
async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct EditBody {
    instruction: String,
    current_markdown: String,
    #[serde(default)]
    selected_text: Option<String>,
}

async fn edit_content(
    State(state): State<Arc<AppState>>,
    Path(organization_id): Path<String>,
    Json(body): Json<EditBody>,
) -> Response {
    if body.instruction.trim().is_empty() {
        return validation_failed("instruction must not be empty");
    }

    // Live UI sync is the dashboard's concern; here each intermediate
    // edit is only traced as it lands.
    let sink: Arc<dyn DocumentSink> = Arc::new(|markdown: &str| {
        debug!(bytes = markdown.len(), "document updated by agent");
    });

    let agent = AgentLoop::new(state.model.as_ref(), state.config.agent.turn_ceiling);
    let request = EditRequest {
        instruction: body.instruction,
        current_markdown: body.current_markdown,
        selected_text: body.selected_text,
        organization_id,
    };

    match agent.run(request, sink).await {
        Ok(markdown) => Json(json!({ "markdown": markdown })).into_response(),
        Err(err) => {
            error!(%err, "content edit failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to edit content" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeBody {
    url: String,
}

async fn analyze_brand(
    State(state): State<Arc<AppState>>,
    Path(organization_id): Path<String>,
    Json(body): Json<AnalyzeBody>,
) -> Response {
    if !is_valid_url(&body.url) {
        return validation_failed("url must be a valid http(s) URL");
    }

    // Fire and forget: the workflow survives this request and publishes
    // its progress through the store. Concurrent triggers for the same
    // organization race on the record; deduping is the caller's job.
    let model = Arc::clone(&state.model);
    let fetcher = Arc::clone(&state.fetcher);
    let repo = Arc::clone(&state.brand_repo);
    let progress = Arc::clone(&state.progress);
    let ttl = state.config.progress_ttl();
    tokio::spawn(async move {
        if let Err(err) = brand::analyze_brand(
            model,
            fetcher,
            repo,
            progress.as_ref(),
            ttl,
            &organization_id,
            &body.url,
        )
        .await
        {
            error!(%err, organization_id, "brand analysis failed");
        }
    });

    (StatusCode::ACCEPTED, Json(json!({ "status": "started" }))).into_response()
}

async fn brand_progress(
    State(state): State<Arc<AppState>>,
    Path(organization_id): Path<String>,
) -> Response {
    match state.progress.get(&brand::progress_key(&organization_id)).await {
        Ok(Some(progress)) => Json(progress).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no analysis in progress" })),
        )
            .into_response(),
        Err(err) => {
            error!(%err, "progress lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to read progress" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct PreviewBody {
    prompt: String,
}

/// Debug/preview path: streams a raw model response through the decoder
/// and returns the final accumulated text.
async fn debug_preview(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PreviewBody>,
) -> Response {
    if body.prompt.trim().is_empty() {
        return validation_failed("prompt must not be empty");
    }

    let request = ModelRequest {
        system: "You are a helpful assistant.".to_owned(),
        messages: vec![Message::user(body.prompt)],
        tools: Vec::new(),
        scope: None,
    };
    let on_update = Box::new(|text: &str| {
        debug!(chars = text.len(), "preview text so far");
    });

    match state.model.stream_text(request, on_update).await {
        Ok(text) => Json(json!({ "text": text })).into_response(),
        Err(err) => {
            error!(%err, "preview stream failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to generate preview" })),
            )
                .into_response()
        }
    }
}

fn validation_failed(detail: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Validation failed", "details": detail })),
    )
        .into_response()
}

/// Minimal URL shape check for the analyze endpoint.
///
/// Full URL parsing is the fetcher's concern; this only rejects obvious
/// garbage before a workflow run is spawned.
fn is_valid_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) => !host.is_empty() && !host.starts_with('/') && !url.contains(char::is_whitespace),
        None => false,
    }
}
