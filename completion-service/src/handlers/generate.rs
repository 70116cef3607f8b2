//! Completion and chat-continuation endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::future::Future;
use std::time::Instant;
use validator::Validate;

use crate::models::{ChatMessage, CompletionLog, UNKNOWN_USER_ID};
use crate::services::metrics::observe_provider_call;
use crate::services::prompt::context_before_cursor;
use crate::services::ProviderError;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextRequest {
    pub text: String,
    pub cursor_position: i64,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateTextResponse {
    pub response: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateChatRequest {
    #[validate(length(min = 1, message = "chat_history must contain at least one message"))]
    pub chat_history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateChatResponse {
    pub response: String,
    pub chat_history: Vec<ChatMessage>,
}

/// Continues the document from the cursor position.
#[tracing::instrument(skip(state, request), fields(cursor = request.cursor_position))]
pub async fn generate_text(
    State(state): State<AppState>,
    Json(request): Json<GenerateTextRequest>,
) -> Result<Json<GenerateTextResponse>, AppError> {
    let user_id = request
        .user_id
        .unwrap_or_else(|| UNKNOWN_USER_ID.to_string());
    let context = context_before_cursor(&request.text, request.cursor_position);

    let reply = timed_provider_call(
        "generate_text",
        state.provider.model(),
        state.provider.complete(
            &state.generation.system_prompt,
            context,
            state.generation.completion_max_tokens,
        ),
    )
    .await?;
    let suggestion = reply.trim().to_string();

    // Logging is best-effort and must not hold up or fail the response. The
    // store counts its own failures.
    if let Some(store) = state.store.clone() {
        let entry = CompletionLog::new(user_id, context, suggestion.clone());
        tokio::spawn(async move {
            if let Err(e) = store.record_completion(&entry).await {
                tracing::error!(
                    user_id = %entry.user_id,
                    error = %e,
                    "Failed to record completion log"
                );
            }
        });
    }

    Ok(Json(GenerateTextResponse {
        response: suggestion,
    }))
}

/// Appends one assistant turn to the caller's chat history.
#[tracing::instrument(skip(state, request), fields(history_len = request.chat_history.len()))]
pub async fn generate_chat_no_text(
    State(state): State<AppState>,
    Json(request): Json<GenerateChatRequest>,
) -> Result<Json<GenerateChatResponse>, AppError> {
    request.validate()?;

    let mut chat_history = request.chat_history;
    let reply = timed_provider_call(
        "generate_chat",
        state.provider.model(),
        state
            .provider
            .continue_chat(&chat_history, state.generation.chat_max_tokens),
    )
    .await?;
    let assistant_message = reply.trim().to_string();

    chat_history.push(ChatMessage::assistant(assistant_message.clone()));

    Ok(Json(GenerateChatResponse {
        response: assistant_message,
        chat_history,
    }))
}

/// Awaits a provider call, recording latency and collapsing any failure into
/// a caller-visible upstream error.
async fn timed_provider_call<F>(operation: &str, model: &str, call: F) -> Result<String, AppError>
where
    F: Future<Output = Result<String, ProviderError>>,
{
    let start = Instant::now();
    let result = call.await;
    observe_provider_call(
        operation,
        model,
        start.elapsed().as_secs_f64(),
        result.is_ok(),
    );

    result.map_err(|e| {
        tracing::error!(operation, model, error = %e, "Provider call failed");
        AppError::Upstream(e.to_string())
    })
}
