//! Re-execution of a previously captured request.
//!
//! [`replay`] synthesizes a fresh [`InboundRequest`](super::InboundRequest)
//! from a stored log entry and re-enters the dispatch pipeline exactly
//! as if it were a live call: a new pending entry is created under a
//! collision-free correlation id and the configured response mode
//! applies unchanged. The original entry is never mutated.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde_json::Value;

use crate::error::HookpitError;
use crate::server::AppState;
use crate::store::LogEntry;

use super::{complete, InboundRequest};

/// What the replay caller gets back for confirmation.
#[derive(Debug)]
pub struct ReplayReceipt {
    pub original_id: String,
    pub replay_id: String,
    /// Status the response-strategy selector produced.
    pub status: u16,
    /// Terminal response body, parsed as JSON when possible.
    pub response: Value,
}

pub async fn replay(state: Arc<AppState>, original_id: &str) -> Result<ReplayReceipt, HookpitError> {
    let entry = state
        .log
        .get(original_id)
        .await
        .ok_or_else(|| HookpitError::EntryNotFound {
            id: original_id.to_string(),
        })?;

    // UUID-backed, so it can never collide with a live or prior replay id.
    let replay_id = format!("replay-{}", uuid::Uuid::new_v4());

    let inbound = InboundRequest::from_entry(&entry, replay_id.clone())?;

    state
        .log
        .append(LogEntry::from_inbound(&inbound, &replay_id))
        .await;
    state.stats.replayed.fetch_add(1, Ordering::Relaxed);

    let config = {
        let guard = state.config.read().await;
        Arc::clone(&guard.config)
    };

    tracing::info!(
        original_id = %original_id,
        replay_id = %replay_id,
        method = %inbound.method,
        url = %inbound.original_url,
        "replaying captured request"
    );

    let response = complete(state, inbound, config).await;
    let status = response.status().as_u16();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    let response_value = serde_json::from_slice(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));

    Ok(ReplayReceipt {
        original_id: original_id.to_string(),
        replay_id,
        status,
        response: response_value,
    })
}
