// src/api/mod.rs

//! HTTP surface. Thin by design: handlers validate, delegate to the agent
//! and sync engine, and shape JSON responses.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::config::CONFIG;
use crate::state::AppState;
use crate::sync::state::SyncSource;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/sync/email", post(sync_email))
        .route("/api/sync/crm", post(sync_crm))
        .route("/api/status/{user_id}", get(status))
        .route("/api/tasks/{user_id}", get(tasks))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    user_id: i64,
    message: String,
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> impl IntoResponse {
    let history = match state
        .chat_log
        .recent(req.user_id, CONFIG.chat_history_limit)
        .await
    {
        Ok(history) => history,
        Err(err) => {
            error!(user_id = req.user_id, "failed to load chat history: {err:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "failed to load chat history"})),
            );
        }
    };

    let outcome = state.agent.converse(req.user_id, &req.message, &history).await;

    let (reply, is_error) = match (&outcome.response, &outcome.error) {
        (Some(response), _) => (response.clone(), false),
        (None, Some(err)) => (err.clone(), true),
        (None, None) => ("No response generated.".to_string(), true),
    };

    // Transcript rows are best-effort; a logging failure must not eat the reply
    if let Err(err) = state
        .chat_log
        .append(req.user_id, "user", &req.message, false)
        .await
    {
        error!(user_id = req.user_id, "failed to persist user turn: {err:#}");
    }
    if let Err(err) = state
        .chat_log
        .append(req.user_id, "assistant", &reply, is_error)
        .await
    {
        error!(user_id = req.user_id, "failed to persist assistant turn: {err:#}");
    }

    if is_error {
        (StatusCode::OK, Json(json!({"error": reply})))
    } else {
        (StatusCode::OK, Json(json!({"response": reply})))
    }
}

#[derive(Debug, Deserialize)]
struct SyncRequest {
    user_id: i64,
}

async fn sync_email(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> impl IntoResponse {
    start_sync(state, req.user_id, SyncSource::Email)
}

async fn sync_crm(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> impl IntoResponse {
    start_sync(state, req.user_id, SyncSource::Crm)
}

/// Kick off a full sync in the background. The tracker is the arbiter of
/// concurrency; this check only shapes the response.
fn start_sync(state: AppState, user_id: i64, source: SyncSource) -> impl IntoResponse {
    if state.tracker.is_syncing(user_id, source) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"status": "already_running", "source": source.as_str()})),
        );
    }

    info!(user_id, source = %source, "starting background sync");
    let sync = state.sync.clone();
    tokio::spawn(async move {
        if let Err(err) = sync.run_full_sync(user_id, source).await {
            error!(user_id, source = %source, "background sync failed: {err:#}");
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({"status": "started", "source": source.as_str()})),
    )
}

async fn tasks(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    match state.tasks.list_for_user(user_id).await {
        Ok(tasks) => (StatusCode::OK, Json(json!({"tasks": tasks}))),
        Err(err) => {
            error!(user_id, "failed to list tasks: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "failed to list tasks"})),
            )
        }
    }
}

async fn status(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    let email_count = state.records.email_count(user_id).await.unwrap_or(0);
    let contact_count = state.records.contact_count(user_id).await.unwrap_or(0);
    let caps = state.registry.capabilities(user_id);

    Json(json!({
        "user_id": user_id,
        "emails": email_count,
        "contacts": contact_count,
        "connected": {
            "email": caps.email.is_some(),
            "calendar": caps.calendar.is_some(),
            "crm": caps.crm.is_some(),
        },
        "sync": {
            "email": state.tracker.snapshot(user_id, SyncSource::Email),
            "crm": state.tracker.snapshot(user_id, SyncSource::Crm),
        },
    }))
}
