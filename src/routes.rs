use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{gateway, pump};
use crate::AppState;

pub fn create_router(app: AppState) -> Router {
    Router::new()
        .route(
            "/api/pump/control",
            post(pump::control).fallback(method_not_allowed),
        )
        .route(
            "/api/pump/feedback",
            post(pump::feedback).fallback(method_not_allowed),
        )
        .route(
            "/api/pump/status",
            get(pump::status).fallback(method_not_allowed),
        )
        .route(
            "/api/pump/history",
            get(pump::history).fallback(method_not_allowed),
        )
        .route(
            "/api/gateway/status",
            get(gateway::status).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

async fn method_not_allowed() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}
