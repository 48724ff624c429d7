use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    error::{AppError, AppResult},
    middleware::{make_span_with_request_id, request_id_middleware},
    models::UserId,
    services::MovieCatalog,
    views::Views,
};

pub mod pages;
pub mod recommendations;

/// Shared application state
pub struct AppState {
    pub catalog: Arc<dyn MovieCatalog>,
    pub views: Views,
}

impl AppState {
    pub fn new(catalog: Arc<dyn MovieCatalog>, views: Views) -> Self {
        Self { catalog, views }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/process", post(pages::process))
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/recommendations/:user_id",
        get(recommendations::user_recommendations),
    )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Parses a user identifier received as text
pub fn parse_user_id(raw: Option<&str>) -> AppResult<UserId> {
    let raw = raw.ok_or_else(|| AppError::InvalidInput("missing field 'user_id'".to_string()))?;
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("user_id '{}' is not an integer", raw)))
}
