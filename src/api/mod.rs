//! Management surface: log inspection, replay, export/import, and
//! configuration swaps.
//!
//! Served on its own port so management calls are never captured and
//! relayed like webhook traffic. The config endpoints accept any
//! config-shaped JSON value and replace the live config wholesale,
//! with no merging or partial-field updates.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::model::GatewayConfig;
use crate::config::sources::sha256_hex;
use crate::config::ConfigVersion;
use crate::gateway::replay;
use crate::server::AppState;
use crate::store::{now_ms, LogEntry};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root_redirect))
        .route("/dashboard", get(dashboard))
        .route("/api/logs", get(list_logs).delete(clear_logs))
        .route("/api/logs/download", get(download_logs))
        .route("/api/logs/upload", post(upload_logs))
        .route("/api/logs/{id}", get(get_log))
        .route("/api/logs/{id}/replay", post(replay_log))
        .route("/api/config", get(get_config).put(put_config))
        .route("/api/config/download", get(download_config))
        .route("/api/config/upload", post(upload_config))
        .route("/api/version", get(version))
}

async fn root_redirect() -> Redirect {
    Redirect::to("/dashboard")
}

async fn dashboard() -> Html<&'static str> {
    Html(include_str!("dashboard.html"))
}

#[derive(Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct LogsPage {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub requests: Vec<LogEntry>,
}

async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Json<LogsPage> {
    let limit = query.limit.unwrap_or(100);
    let offset = query.offset.unwrap_or(0);

    Json(LogsPage {
        total: state.log.count().await,
        limit,
        offset,
        requests: state.log.get_all(limit, offset).await,
    })
}

async fn download_logs(State(state): State<Arc<AppState>>) -> Response {
    let total = state.log.count().await;
    let logs = state.log.get_all(10_000, 0).await;
    let exported_at = now_ms();

    let body = serde_json::to_string_pretty(&json!({
        "exportedAt": exported_at,
        "total": total,
        "logs": logs,
    }))
    .unwrap_or_else(|_| "{}".into());

    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"hookpit-logs-{exported_at}.json\""),
            ),
        ],
        body,
    )
        .into_response()
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LogImport {
    pub logs: Vec<LogEntry>,
}

async fn upload_logs(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LogImport>,
) -> Json<serde_json::Value> {
    let imported = state.log.import(payload.logs).await;

    Json(json!({
        "message": format!("Successfully imported {imported} log entries"),
        "imported": imported,
        "total": state.log.count().await,
    }))
}

async fn get_log(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.log.get(&id).await {
        Some(entry) => Json(entry).into_response(),
        None => not_found(),
    }
}

async fn replay_log(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match replay::replay(state, &id).await {
        Ok(receipt) => Json(json!({
            "message": "Request replayed successfully",
            "originalId": receipt.original_id,
            "replayId": receipt.replay_id,
            "status": receipt.status,
            "response": receipt.response,
        }))
        .into_response(),
        Err(crate::error::HookpitError::EntryNotFound { .. }) => not_found(),
        Err(e) => {
            tracing::error!(id = %id, error = %e, "replay failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn clear_logs(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.log.clear().await;
    Json(json!({ "message": "Logs cleared successfully" }))
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<GatewayConfig> {
    let guard = state.config.read().await;
    Json((*guard.config).clone())
}

/// Whole-value swap of the live config. Dispatches already running
/// keep their snapshot.
async fn swap_config(state: &Arc<AppState>, new: GatewayConfig, source: &str) {
    let version = serde_json::to_string(&new)
        .map(|s| ConfigVersion::Hash(sha256_hex(s.as_bytes())))
        .unwrap_or_else(|_| ConfigVersion::Hash(String::new()));

    let mut loaded = state.config.write().await;
    loaded.config = Arc::new(new);
    loaded.version = version;
    loaded.source_name = source.to_string();
    loaded.loaded_at = Instant::now();
    drop(loaded);

    tracing::info!(source = %source, "configuration replaced");
}

async fn put_config(
    State(state): State<Arc<AppState>>,
    Json(new): Json<GatewayConfig>,
) -> Json<serde_json::Value> {
    swap_config(&state, new.clone(), "api").await;
    Json(json!({
        "message": "Configuration updated successfully",
        "config": new,
    }))
}

async fn upload_config(
    State(state): State<Arc<AppState>>,
    Json(new): Json<GatewayConfig>,
) -> Json<serde_json::Value> {
    swap_config(&state, new.clone(), "upload").await;
    Json(json!({
        "message": "Configuration uploaded and applied successfully",
        "config": new,
    }))
}

async fn download_config(State(state): State<Arc<AppState>>) -> Response {
    let config = {
        let guard = state.config.read().await;
        (*guard.config).clone()
    };

    let body = serde_json::to_string_pretty(&config).unwrap_or_else(|_| "{}".into());

    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"hookpit-config-{}.json\"", now_ms()),
            ),
        ],
        body,
    )
        .into_response()
}

async fn version() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
    }))
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Request not found" })),
    )
        .into_response()
}
