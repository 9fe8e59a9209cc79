use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/github", get(crate::api::github::github_data))
        .route("/api/track", post(crate::api::track::record_visit))
        .route("/api/contact", post(crate::api::contact::send_message))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
