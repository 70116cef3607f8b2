use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::startup::AppState;

/// Liveness probe. Reports the store as unhealthy only when persistence is
/// enabled and the database does not answer.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_status = match &state.store {
        Some(store) => store.health_check().await.map(|_| "ok"),
        None => Ok("disabled"),
    };

    match store_status {
        Ok(persistence) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "completion-service",
                "version": env!("CARGO_PKG_VERSION"),
                "model": state.provider.model(),
                "persistence": persistence
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "completion-service",
                "error": e.to_string()
            })),
        ),
    }
}

/// Readiness probe.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match &state.store {
        Some(store) => match store.health_check().await {
            Ok(_) => StatusCode::OK,
            Err(_) => StatusCode::SERVICE_UNAVAILABLE,
        },
        None => StatusCode::OK,
    }
}
