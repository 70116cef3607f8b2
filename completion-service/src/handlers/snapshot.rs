use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::models::{TextSnapshot, UNKNOWN_USER_ID};
use crate::startup::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshotRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveSnapshotResponse {
    pub status: String,
}

/// Stores the full document text. Both fields are optional and the body
/// itself may be empty.
#[tracing::instrument(skip(state, body))]
pub async fn save_snapshot(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveSnapshotResponse>, AppError> {
    let request = parse_body(&body)?;

    let store = state.store.as_ref().ok_or_else(|| {
        AppError::DatabaseError(anyhow::anyhow!("snapshot storage is disabled"))
    })?;

    let snapshot = TextSnapshot::new(
        request
            .user_id
            .unwrap_or_else(|| UNKNOWN_USER_ID.to_string()),
        request.text.unwrap_or_default(),
    );

    store.record_snapshot(&snapshot).await.map_err(|e| {
        tracing::error!(user_id = %snapshot.user_id, error = %e, "Failed to save snapshot");
        e
    })?;

    Ok(Json(SaveSnapshotResponse {
        status: "success".to_string(),
    }))
}

fn parse_body(body: &[u8]) -> Result<SaveSnapshotRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SaveSnapshotRequest::default());
    }

    serde_json::from_slice::<Option<SaveSnapshotRequest>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid snapshot body: {}", e)))
}
