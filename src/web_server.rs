use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    serve, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::formatter::RenderedOutcome;
use crate::language::{detect_language, Language};
use crate::navigator::Navigator;
use crate::outcome::ClassificationOutcome;

// Shared application state. The navigator (and its catalog) is read-only.
#[derive(Clone)]
pub struct AppState {
    navigator: Arc<Navigator>,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub language: Language,
    pub outcome: ClassificationOutcome,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub outcome: ClassificationOutcome,
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct LangParam {
    pub lang: Option<Language>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub key: String,
    pub title: String,
    pub category: String,
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn services_handler(
    State(state): State<AppState>,
    Query(params): Query<LangParam>,
) -> Json<Vec<ServiceSummary>> {
    let lang = params.lang.unwrap_or(Language::Ar);
    let services = state
        .navigator
        .catalog()
        .iter()
        .map(|svc| ServiceSummary {
            key: svc.key.clone(),
            title: svc.title(lang).to_string(),
            category: svc.category.clone(),
        })
        .collect();
    Json(services)
}

async fn classify_handler(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, (StatusCode, String)> {
    if request.query.trim().is_empty() {
        warn!("Rejected empty classify request");
        return Err((StatusCode::BAD_REQUEST, "query must not be empty".to_string()));
    }
    let language = detect_language(&request.query);
    let outcome = state.navigator.classify(&request.query).await;
    Ok(Json(ClassifyResponse { language, outcome }))
}

async fn render_handler(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Json<RenderedOutcome> {
    Json(state.navigator.format_for(&request.outcome, request.language))
}

pub fn router(navigator: Arc<Navigator>) -> Router {
    let state = AppState { navigator };
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/services", get(services_handler))
        .route("/api/classify", post(classify_handler))
        .route("/api/render", post(render_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(port: u16, navigator: Arc<Navigator>) -> Result<()> {
    let app = router(navigator);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
