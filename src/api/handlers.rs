//! HTTP request handlers

use super::AppState;
use crate::telegram::{handle_update, Update};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Create the webhook router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/telegram/webhook", post(receive_update))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn receive_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    if !secret_matches(state.secret.as_deref(), &headers) {
        tracing::warn!(update_id = update.update_id, "Rejected webhook call with bad secret");
        return StatusCode::UNAUTHORIZED;
    }

    handle_update(&state.client, &state.manager, update).await;
    StatusCode::OK
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "active_sessions": state.manager.active_sessions().await,
    }))
}

/// Without a configured secret every caller is accepted
fn secret_matches(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected)
}
